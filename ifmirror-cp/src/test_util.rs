//! Test doubles shared by unit and integration tests.

use crate::dataplane::{Dataplane, DeviceError, HostHandles};
use ifmirror_api::HostType;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct MockState {
    creates: u32,
    deletes: u32,
    fail_next_create: Option<i32>,
    fail_next_delete: Option<i32>,
}

/// Shared view into a [`MockDataplane`], usable after the mock has been
/// moved into a service. Failure injections are one-shot.
#[derive(Clone)]
pub struct MockHandle(Arc<Mutex<MockState>>);

impl MockHandle {
    pub fn creates(&self) -> u32 {
        self.0.lock().unwrap().creates
    }

    pub fn deletes(&self) -> u32 {
        self.0.lock().unwrap().deletes
    }

    pub fn fail_next_create(&self, code: i32) {
        self.0.lock().unwrap().fail_next_create = Some(code);
    }

    pub fn fail_next_delete(&self, code: i32) {
        self.0.lock().unwrap().fail_next_delete = Some(code);
    }
}

/// Scriptable dataplane: a fixed valid-phy set, injectable failure codes,
/// and call counters for churn assertions.
pub struct MockDataplane {
    valid: HashSet<u32>,
    state: Arc<Mutex<MockState>>,
    next_vif: u32,
}

impl MockDataplane {
    pub fn new(valid: impl IntoIterator<Item = u32>) -> Self {
        MockDataplane {
            valid: valid.into_iter().collect(),
            state: Arc::new(Mutex::new(MockState::default())),
            next_vif: 0,
        }
    }

    pub fn handle(&self) -> MockHandle {
        MockHandle(Arc::clone(&self.state))
    }
}

impl Dataplane for MockDataplane {
    fn phy_is_valid(&self, phy_id: u32) -> bool {
        self.valid.contains(&phy_id)
    }

    fn create_host(
        &mut self,
        phy_id: u32,
        _host_type: HostType,
        _host_name: &str,
        _netns: &str,
    ) -> Result<HostHandles, DeviceError> {
        let mut state = self.state.lock().unwrap();
        if let Some(code) = state.fail_next_create.take() {
            return Err(DeviceError::new(code, "injected create failure"));
        }
        state.creates += 1;
        self.next_vif += 1;
        Ok(HostHandles {
            host_id: 1000 + phy_id,
            vif_id: self.next_vif,
        })
    }

    fn delete_host(&mut self, _phy_id: u32) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        if let Some(code) = state.fail_next_delete.take() {
            return Err(DeviceError::new(code, "injected delete failure"));
        }
        state.deletes += 1;
        Ok(())
    }
}
