//! Tap/tun mirror devices backed by /dev/net/tun.
//!
//! Each mirror is created with a TUNSETIFF ioctl and kept alive by holding
//! its fd; dropping the fd removes the (non-persistent) device. Creation
//! inside a named namespace switches the thread into the target via
//! /run/netns and back when done.

use super::{Dataplane, DeviceError, HostHandles};
use ifmirror_api::HostType;
use nix::libc;
use nix::sched::{CloneFlags, setns};
use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use tracing::{debug, warn};

/// TUN device flags from linux/if_tun.h.
const IFF_TUN: libc::c_short = 0x0001;
const IFF_TAP: libc::c_short = 0x0002;
const IFF_NO_PI: libc::c_short = 0x1000;

/// ioctl request code for TUNSETIFF.
const TUNSETIFF: libc::c_ulong = 0x400454ca;

/// ifreq structure for TUN device configuration.
#[repr(C)]
struct IfReq {
    ifr_name: [libc::c_char; libc::IFNAMSIZ],
    ifr_flags: libc::c_short,
    _pad: [u8; 22], // padding to match kernel struct size
}

/// One configured dataplane interface the daemon may mirror.
#[derive(Debug, Clone)]
pub struct PhyInterface {
    pub id: u32,
    pub name: String,
}

struct HostDevice {
    // Held open for the lifetime of the pair; the kernel removes the
    // device when the fd closes.
    #[allow(dead_code)]
    file: File,
    handles: HostHandles,
}

/// Mirror-device backend: validates phys against the configured interface
/// table and owns one tun fd per live pair.
pub struct TapBackend {
    phys: HashMap<u32, PhyInterface>,
    devices: HashMap<u32, HostDevice>,
    next_vif: u32,
}

impl TapBackend {
    pub fn new(phys: impl IntoIterator<Item = PhyInterface>) -> Self {
        let phys: HashMap<u32, PhyInterface> =
            phys.into_iter().map(|phy| (phy.id, phy)).collect();
        for phy in phys.values() {
            debug!(id = phy.id, name = %phy.name, "dataplane interface registered");
        }
        TapBackend {
            phys,
            devices: HashMap::new(),
            next_vif: 0,
        }
    }

    fn open_tun(host_type: HostType, host_name: &str) -> io::Result<File> {
        let name_bytes = host_name.as_bytes();
        if name_bytes.is_empty() || name_bytes.len() >= libc::IFNAMSIZ {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "mirror device name empty or too long",
            ));
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/net/tun")?;

        let flavor = match host_type {
            HostType::Tap => IFF_TAP,
            HostType::Tun => IFF_TUN,
        };
        let mut ifr = IfReq {
            ifr_name: [0; libc::IFNAMSIZ],
            ifr_flags: flavor | IFF_NO_PI,
            _pad: [0; 22],
        };
        for (i, &b) in name_bytes.iter().enumerate() {
            ifr.ifr_name[i] = b as libc::c_char;
        }

        let ret = unsafe { libc::ioctl(file.as_raw_fd(), TUNSETIFF as _, &ifr) };
        if ret < 0 {
            return Err(io::Error::last_os_error());
        }

        Ok(file)
    }

    fn ifindex(name: &str) -> io::Result<u32> {
        let index = nix::net::if_::if_nametoindex(name).map_err(io::Error::from)?;
        Ok(index)
    }
}

impl Dataplane for TapBackend {
    fn phy_is_valid(&self, phy_id: u32) -> bool {
        self.phys.contains_key(&phy_id)
    }

    fn create_host(
        &mut self,
        phy_id: u32,
        host_type: HostType,
        host_name: &str,
        netns: &str,
    ) -> Result<HostHandles, DeviceError> {
        // The guard keeps the thread inside the target namespace until the
        // device exists and its ifindex is read.
        let _guard = if netns.is_empty() {
            None
        } else {
            Some(NetnsGuard::enter(netns).map_err(|e| DeviceError::from_io(&e))?)
        };

        let file = Self::open_tun(host_type, host_name).map_err(|e| DeviceError::from_io(&e))?;
        let host_id = Self::ifindex(host_name).map_err(|e| DeviceError::from_io(&e))?;

        self.next_vif += 1;
        let handles = HostHandles {
            host_id,
            vif_id: self.next_vif,
        };
        self.devices.insert(phy_id, HostDevice { file, handles });

        debug!(
            phy_id,
            host_id = handles.host_id,
            name = host_name,
            kind = host_type.as_str(),
            "mirror device created"
        );
        Ok(handles)
    }

    fn delete_host(&mut self, phy_id: u32) -> Result<(), DeviceError> {
        match self.devices.remove(&phy_id) {
            Some(dev) => {
                debug!(phy_id, host_id = dev.handles.host_id, "mirror device removed");
                Ok(())
            }
            None => Err(DeviceError::new(
                -libc::ENODEV,
                format!("no mirror device for phy {phy_id}"),
            )),
        }
    }
}

/// Switches the calling thread into a named network namespace and restores
/// the original one on drop.
struct NetnsGuard {
    orig: File,
}

impl NetnsGuard {
    fn enter(name: &str) -> io::Result<NetnsGuard> {
        let orig = File::open("/proc/self/ns/net")?;
        let target = File::open(format!("/run/netns/{name}"))?;
        setns(&target, CloneFlags::CLONE_NEWNET).map_err(io::Error::from)?;
        Ok(NetnsGuard { orig })
    }
}

impl Drop for NetnsGuard {
    fn drop(&mut self) {
        if let Err(e) = setns(&self.orig, CloneFlags::CLONE_NEWNET) {
            warn!(error = %e, "failed to restore network namespace");
        }
    }
}
