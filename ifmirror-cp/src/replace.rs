//! Replace-transaction bookkeeping.
//!
//! `begin` snapshots the live phy ids as pending removal; every create or
//! delete seen while active clears its phy from the set; `end` hands back
//! the leftovers for deletion. At most one transaction is active per
//! process, and an agent that never calls `end` blocks the next `begin`
//! indefinitely.

use ifmirror_api::ApiError;
use std::collections::HashSet;

#[derive(Debug, Default)]
pub struct ReplaceTransaction {
    active: bool,
    pending: HashSet<u32>,
}

impl ReplaceTransaction {
    pub fn new() -> Self {
        ReplaceTransaction::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Snapshot `live` as pending removal and activate. No device is
    /// touched here.
    pub fn begin(&mut self, live: impl IntoIterator<Item = u32>) -> Result<(), ApiError> {
        if self.active {
            return Err(ApiError::AlreadyActive);
        }
        self.pending = live.into_iter().collect();
        self.active = true;
        Ok(())
    }

    /// A create or delete touched this phy; it is no longer a straggler.
    pub fn reassert(&mut self, phy_id: u32) {
        if self.active {
            self.pending.remove(&phy_id);
        }
    }

    /// Deactivate and return the phys that were never re-asserted.
    pub fn end(&mut self) -> Result<Vec<u32>, ApiError> {
        if !self.active {
            return Err(ApiError::NotActive);
        }
        self.active = false;
        Ok(self.pending.drain().collect())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
