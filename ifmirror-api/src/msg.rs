//! Control-plane message set.
//!
//! Every message starts with a common header (`msg_id`, `context`); the
//! context is an opaque agent-chosen value echoed verbatim in every reply
//! and detail message. A kind's wire id is the daemon's runtime base plus
//! its offset in [`MsgKind::ALL`]; only the lookup exchange has a fixed id.

use crate::error::ApiError;
use crate::wire::{HOST_NAME_LEN, MSG_NAME_LEN, NETNS_LEN, Reader, Writer};

/// Reserved id for the name-to-id resolution exchange. The assigned block
/// starts above it.
pub const MSG_LOOKUP_ID: u16 = 0;

/// Byte length of the common message header.
pub const HEADER_LEN: usize = 6;

/// Message kinds in block order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum MsgKind {
    PairAddDel,
    PairAddDelReply,
    PairGet,
    PairDetails,
    PairGetReply,
    DefaultNsSet,
    DefaultNsSetReply,
    DefaultNsGet,
    DefaultNsGetReply,
    ReplaceBegin,
    ReplaceBeginReply,
    ReplaceEnd,
    ReplaceEndReply,
}

impl MsgKind {
    pub const ALL: [MsgKind; 13] = [
        MsgKind::PairAddDel,
        MsgKind::PairAddDelReply,
        MsgKind::PairGet,
        MsgKind::PairDetails,
        MsgKind::PairGetReply,
        MsgKind::DefaultNsSet,
        MsgKind::DefaultNsSetReply,
        MsgKind::DefaultNsGet,
        MsgKind::DefaultNsGetReply,
        MsgKind::ReplaceBegin,
        MsgKind::ReplaceBeginReply,
        MsgKind::ReplaceEnd,
        MsgKind::ReplaceEndReply,
    ];

    /// Registered protocol name, used in the lookup exchange.
    pub fn name(self) -> &'static str {
        match self {
            MsgKind::PairAddDel => "pair_add_del",
            MsgKind::PairAddDelReply => "pair_add_del_reply",
            MsgKind::PairGet => "pair_get",
            MsgKind::PairDetails => "pair_details",
            MsgKind::PairGetReply => "pair_get_reply",
            MsgKind::DefaultNsSet => "default_ns_set",
            MsgKind::DefaultNsSetReply => "default_ns_set_reply",
            MsgKind::DefaultNsGet => "default_ns_get",
            MsgKind::DefaultNsGetReply => "default_ns_get_reply",
            MsgKind::ReplaceBegin => "replace_begin",
            MsgKind::ReplaceBeginReply => "replace_begin_reply",
            MsgKind::ReplaceEnd => "replace_end",
            MsgKind::ReplaceEndReply => "replace_end_reply",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }

    /// Offset of this kind within the assigned block.
    pub fn offset(self) -> u16 {
        self as u16
    }

    pub fn from_offset(off: u16) -> Option<Self> {
        Self::ALL.get(off as usize).copied()
    }
}

/// Kernel-side flavor of a mirror device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostType {
    Tap,
    Tun,
}

impl HostType {
    /// Wire values: 0 = TAP, 1 = TUN. Any other value maps to TAP, not an
    /// error.
    pub fn from_wire(v: u8) -> Self {
        if v == 1 { HostType::Tun } else { HostType::Tap }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            HostType::Tap => 0,
            HostType::Tun => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HostType::Tap => "tap",
            HostType::Tun => "tun",
        }
    }
}

/// Common message header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub msg_id: u16,
    pub context: u32,
}

impl Header {
    /// Split a frame into its header and body.
    pub fn decode(frame: &[u8]) -> Result<(Header, &[u8]), ApiError> {
        let mut r = Reader::new(frame);
        let msg_id = r.u16()?;
        let context = r.u32()?;
        Ok((Header { msg_id, context }, &frame[HEADER_LEN..]))
    }
}

fn header(w: &mut Writer, msg_id: u16, context: u32) {
    w.u16(msg_id);
    w.u32(context);
}

/// Request: create or destroy one interface pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairAddDel {
    pub phy_id: u32,
    pub is_add: bool,
    pub host_type: HostType,
    pub host_name: String,
    pub netns: String,
}

impl PairAddDel {
    pub fn decode(body: &[u8]) -> Result<Self, ApiError> {
        let mut r = Reader::new(body);
        Ok(PairAddDel {
            phy_id: r.u32()?,
            is_add: r.u8()? != 0,
            host_type: HostType::from_wire(r.u8()?),
            host_name: r.string(HOST_NAME_LEN)?,
            netns: r.string(NETNS_LEN)?,
        })
    }

    pub fn encode(&self, msg_id: u16, context: u32) -> Vec<u8> {
        let mut w = Writer::with_capacity(HEADER_LEN + 6 + HOST_NAME_LEN + NETNS_LEN);
        header(&mut w, msg_id, context);
        w.u32(self.phy_id);
        w.u8(self.is_add as u8);
        w.u8(self.host_type.to_wire());
        w.string(&self.host_name, HOST_NAME_LEN);
        w.string(&self.netns, NETNS_LEN);
        w.into_vec()
    }
}

/// Detail message: one live pair, emitted during enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairDetails {
    pub phy_id: u32,
    pub host_id: u32,
    pub vif_id: u32,
    pub host_type: HostType,
    pub host_name: String,
    pub netns: String,
}

impl PairDetails {
    pub fn decode(body: &[u8]) -> Result<Self, ApiError> {
        let mut r = Reader::new(body);
        Ok(PairDetails {
            phy_id: r.u32()?,
            host_id: r.u32()?,
            vif_id: r.u32()?,
            host_type: HostType::from_wire(r.u8()?),
            host_name: r.string(HOST_NAME_LEN)?,
            netns: r.string(NETNS_LEN)?,
        })
    }

    pub fn encode(&self, msg_id: u16, context: u32) -> Vec<u8> {
        let mut w = Writer::with_capacity(HEADER_LEN + 13 + HOST_NAME_LEN + NETNS_LEN);
        header(&mut w, msg_id, context);
        w.u32(self.phy_id);
        w.u32(self.host_id);
        w.u32(self.vif_id);
        w.u8(self.host_type.to_wire());
        w.string(&self.host_name, HOST_NAME_LEN);
        w.string(&self.netns, NETNS_LEN);
        w.into_vec()
    }
}

/// Reply carrying only a result code. Shared layout of the add/del, ns-set
/// and replace replies; the message id tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetvalReply {
    pub retval: i32,
}

impl RetvalReply {
    pub fn decode(body: &[u8]) -> Result<Self, ApiError> {
        let mut r = Reader::new(body);
        Ok(RetvalReply { retval: r.i32()? })
    }

    pub fn encode(&self, msg_id: u16, context: u32) -> Vec<u8> {
        let mut w = Writer::with_capacity(HEADER_LEN + 4);
        header(&mut w, msg_id, context);
        w.i32(self.retval);
        w.into_vec()
    }
}

/// Completion reply closing a pair enumeration stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PairGetReply {
    pub retval: i32,
    /// Number of detail messages that preceded this reply.
    pub count: u32,
}

impl PairGetReply {
    pub fn decode(body: &[u8]) -> Result<Self, ApiError> {
        let mut r = Reader::new(body);
        Ok(PairGetReply {
            retval: r.i32()?,
            count: r.u32()?,
        })
    }

    pub fn encode(&self, msg_id: u16, context: u32) -> Vec<u8> {
        let mut w = Writer::with_capacity(HEADER_LEN + 8);
        header(&mut w, msg_id, context);
        w.i32(self.retval);
        w.u32(self.count);
        w.into_vec()
    }
}

/// Request: overwrite the process default namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultNsSet {
    pub netns: String,
}

impl DefaultNsSet {
    pub fn decode(body: &[u8]) -> Result<Self, ApiError> {
        let mut r = Reader::new(body);
        Ok(DefaultNsSet {
            netns: r.string(NETNS_LEN)?,
        })
    }

    pub fn encode(&self, msg_id: u16, context: u32) -> Vec<u8> {
        let mut w = Writer::with_capacity(HEADER_LEN + NETNS_LEN);
        header(&mut w, msg_id, context);
        w.string(&self.netns, NETNS_LEN);
        w.into_vec()
    }
}

/// Reply to a default-namespace read. Carries no result code, only the
/// echoed context and the current name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultNsGetReply {
    pub netns: String,
}

impl DefaultNsGetReply {
    pub fn decode(body: &[u8]) -> Result<Self, ApiError> {
        let mut r = Reader::new(body);
        Ok(DefaultNsGetReply {
            netns: r.string(NETNS_LEN)?,
        })
    }

    pub fn encode(&self, msg_id: u16, context: u32) -> Vec<u8> {
        let mut w = Writer::with_capacity(HEADER_LEN + NETNS_LEN);
        header(&mut w, msg_id, context);
        w.string(&self.netns, NETNS_LEN);
        w.into_vec()
    }
}

/// Request on the reserved id: resolve a message name to its assigned id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgLookup {
    pub name: String,
}

impl MsgLookup {
    pub fn decode(body: &[u8]) -> Result<Self, ApiError> {
        let mut r = Reader::new(body);
        Ok(MsgLookup {
            name: r.string(MSG_NAME_LEN)?,
        })
    }

    pub fn encode(&self, context: u32) -> Vec<u8> {
        let mut w = Writer::with_capacity(HEADER_LEN + MSG_NAME_LEN);
        header(&mut w, MSG_LOOKUP_ID, context);
        w.string(&self.name, MSG_NAME_LEN);
        w.into_vec()
    }
}

/// Reply to [`MsgLookup`], sent on the reserved id as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MsgLookupReply {
    pub retval: i32,
    /// Assigned id of the requested message; 0 when `retval` is an error.
    pub msg_id: u16,
}

impl MsgLookupReply {
    pub fn decode(body: &[u8]) -> Result<Self, ApiError> {
        let mut r = Reader::new(body);
        Ok(MsgLookupReply {
            retval: r.i32()?,
            msg_id: r.u16()?,
        })
    }

    pub fn encode(&self, context: u32) -> Vec<u8> {
        let mut w = Writer::with_capacity(HEADER_LEN + 6);
        header(&mut w, MSG_LOOKUP_ID, context);
        w.i32(self.retval);
        w.u16(self.msg_id);
        w.into_vec()
    }
}

/// Encode a request that has no body (pair_get, default_ns_get,
/// replace_begin, replace_end).
pub fn encode_empty(msg_id: u16, context: u32) -> Vec<u8> {
    let mut w = Writer::with_capacity(HEADER_LEN);
    header(&mut w, msg_id, context);
    w.into_vec()
}
