//! Control-plane audit trail.
//!
//! Pair and namespace mutations are recorded under the dedicated `audit`
//! tracing target so operators can filter them from normal daemon output
//! (e.g. `RUST_LOG=warn,audit=info`).

use tracing::info;

/// Audit recorder with domain-specific events.
#[derive(Debug, Default, Clone)]
pub struct PairAuditLogger;

impl PairAuditLogger {
    pub fn new() -> Self {
        PairAuditLogger
    }

    pub fn pair_created(&self, phy_id: u32, host_name: &str, netns: &str) {
        info!(target: "audit", phy_id, host_name, netns, "pair created");
    }

    pub fn pair_deleted(&self, phy_id: u32) {
        info!(target: "audit", phy_id, "pair deleted");
    }

    pub fn replace_begun(&self, pending: usize) {
        info!(target: "audit", pending, "replace transaction begun");
    }

    pub fn replace_ended(&self, removed: usize) {
        info!(target: "audit", removed, "replace transaction ended");
    }

    pub fn default_ns_set(&self, netns: &str) {
        info!(target: "audit", netns, "default namespace set");
    }
}
