//! Dataplane collaborator: phy validity and mirror-device lifecycle.
//!
//! The registry drives exactly one backend call per mutation and commits
//! only when that call succeeds, so the registry and the kernel device set
//! stay in lockstep.

pub mod tap;

pub use tap::{PhyInterface, TapBackend};

use ifmirror_api::HostType;
use thiserror::Error;

/// Host-side identifiers assigned when a mirror device is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostHandles {
    /// Kernel ifindex of the mirror device.
    pub host_id: u32,
    /// Correlation handle for the virtual interface.
    pub vif_id: u32,
}

/// Device operation failure, carried to the agent as a negative result
/// code.
#[derive(Debug, Error)]
#[error("{msg} (code {code})")]
pub struct DeviceError {
    pub code: i32,
    pub msg: String,
}

impl DeviceError {
    pub fn new(code: i32, msg: impl Into<String>) -> Self {
        DeviceError {
            code,
            msg: msg.into(),
        }
    }

    /// Map an I/O error to its negative errno; EIO when the error carries
    /// no OS code.
    pub fn from_io(err: &std::io::Error) -> Self {
        let errno = err.raw_os_error().unwrap_or(nix::libc::EIO);
        DeviceError::new(-errno, err.to_string())
    }
}

/// External collaborator owning the kernel side of each pair.
pub trait Dataplane: Send {
    /// Whether `phy_id` names a currently-valid dataplane interface.
    fn phy_is_valid(&self, phy_id: u32) -> bool;

    /// Create the mirror device for `phy_id` inside `netns` (empty means
    /// the current namespace).
    fn create_host(
        &mut self,
        phy_id: u32,
        host_type: HostType,
        host_name: &str,
        netns: &str,
    ) -> Result<HostHandles, DeviceError>;

    /// Destroy the mirror device for `phy_id`.
    fn delete_host(&mut self, phy_id: u32) -> Result<(), DeviceError>;
}
