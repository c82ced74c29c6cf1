//! Pair lifecycle management.
//!
//! Owns the registry, the replace transaction, the default namespace and
//! the dataplane backend. Every mutation flows through here: the registry
//! commits only after the backend call succeeds, so a pair exists exactly
//! when its kernel device does.

use crate::audit::PairAuditLogger;
use crate::dataplane::Dataplane;
use crate::netns::DefaultNs;
use crate::pair::{InterfacePair, PairRegistry};
use crate::replace::ReplaceTransaction;
use ifmirror_api::{ApiError, HostType};
use tracing::{info, warn};

pub struct PairManager {
    registry: PairRegistry,
    replace: ReplaceTransaction,
    default_ns: DefaultNs,
    dataplane: Box<dyn Dataplane>,
    audit: PairAuditLogger,
}

impl PairManager {
    pub fn new(dataplane: Box<dyn Dataplane>, audit: PairAuditLogger) -> Self {
        PairManager {
            registry: PairRegistry::new(),
            replace: ReplaceTransaction::new(),
            default_ns: DefaultNs::new(),
            dataplane,
            audit,
        }
    }

    /// Create a pair for `phy_id`. An empty `netns` resolves to the current
    /// default and is frozen into the record. During an active replace
    /// transaction a create against an already-live phy is a no-op success
    /// that re-asserts the pair instead of an `AlreadyPaired` error.
    pub fn create_pair(
        &mut self,
        phy_id: u32,
        host_type: HostType,
        host_name: &str,
        netns: &str,
    ) -> Result<(), ApiError> {
        if !self.dataplane.phy_is_valid(phy_id) {
            return Err(ApiError::InvalidIndex);
        }
        if self.registry.contains(phy_id) {
            if self.replace.is_active() {
                self.replace.reassert(phy_id);
                return Ok(());
            }
            return Err(ApiError::AlreadyPaired);
        }

        let netns = self.default_ns.resolve(netns).to_string();
        let handles = self
            .dataplane
            .create_host(phy_id, host_type, host_name, &netns)
            .map_err(|e| {
                warn!(phy_id, error = %e, "mirror device create failed");
                ApiError::Device(e.code)
            })?;

        self.registry.insert(InterfacePair {
            phy_id,
            host_id: handles.host_id,
            vif_id: handles.vif_id,
            host_type,
            host_name: host_name.to_string(),
            netns: netns.clone(),
        });
        self.replace.reassert(phy_id);

        self.audit.pair_created(phy_id, host_name, &netns);
        info!(phy_id, host_id = handles.host_id, vif_id = handles.vif_id, "pair created");
        Ok(())
    }

    /// Delete the pair for `phy_id`. The record stays in the registry when
    /// the backend refuses to remove the device.
    pub fn delete_pair(&mut self, phy_id: u32) -> Result<(), ApiError> {
        if !self.registry.contains(phy_id) {
            return Err(ApiError::NotFound);
        }

        self.dataplane.delete_host(phy_id).map_err(|e| {
            warn!(phy_id, error = %e, "mirror device delete failed");
            ApiError::Device(e.code)
        })?;

        self.registry.remove(phy_id);
        self.replace.reassert(phy_id);

        self.audit.pair_deleted(phy_id);
        info!(phy_id, "pair deleted");
        Ok(())
    }

    pub fn get(&self, phy_id: u32) -> Option<&InterfacePair> {
        self.registry.get(phy_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InterfacePair> {
        self.registry.iter()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Start a replace transaction: snapshot the live phys as pending
    /// removal. No device is touched until `replace_end`.
    pub fn replace_begin(&mut self) -> Result<(), ApiError> {
        self.replace.begin(self.registry.phy_ids()).map_err(|e| {
            // A transaction abandoned by a crashed agent sits here forever
            // and blocks every new begin.
            warn!("replace begin rejected, a transaction is already active");
            e
        })?;

        let pending = self.replace.pending_len();
        self.audit.replace_begun(pending);
        info!(pending, "replace transaction begun");
        Ok(())
    }

    /// Finish a replace transaction: delete every pair that was live at
    /// begin and never re-asserted. The sweep continues past individual
    /// delete failures; the first failure code is reported.
    pub fn replace_end(&mut self) -> Result<(), ApiError> {
        let stale = self.replace.end()?;

        let mut result = Ok(());
        let mut removed = 0usize;
        for phy_id in stale {
            match self.delete_pair(phy_id) {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(phy_id, code = e.code(), "stale pair sweep failed");
                    if result.is_ok() {
                        result = Err(e);
                    }
                }
            }
        }

        self.audit.replace_ended(removed);
        info!(removed, "replace transaction ended");
        result
    }

    pub fn set_default_ns(&mut self, name: &str) {
        self.default_ns.set(name);
        self.audit.default_ns_set(name);
        info!(netns = name, "default namespace set");
    }

    pub fn default_ns(&self) -> &str {
        self.default_ns.get()
    }
}
