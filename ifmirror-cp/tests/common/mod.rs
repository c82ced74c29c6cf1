//! Shared test utilities for ifmirror-cp integration tests.

#![allow(dead_code)]

use ifmirror_api::msg::{Header, MsgKind, PairAddDel, PairDetails, PairGetReply, RetvalReply};
use ifmirror_api::{HostType, msg};
use ifmirror_cp::api::{ApiService, MsgTable};
use ifmirror_cp::audit::PairAuditLogger;
use ifmirror_cp::manager::PairManager;
use ifmirror_cp::test_util::{MockDataplane, MockHandle};

/// Message-id base every test service registers at.
pub const BASE: u16 = 256;

/// Build a service over a mock dataplane with the given valid phy ids.
pub fn service_with(valid: &[u32]) -> (ApiService, MockHandle) {
    let mock = MockDataplane::new(valid.iter().copied());
    let handle = mock.handle();
    let manager = PairManager::new(Box::new(mock), PairAuditLogger::new());
    (ApiService::new(MsgTable::new(BASE), manager), handle)
}

/// Assigned wire id of a message kind under [`BASE`].
pub fn id(kind: MsgKind) -> u16 {
    BASE + kind.offset()
}

pub fn add_frame(phy_id: u32, host_type: HostType, name: &str, netns: &str, ctx: u32) -> Vec<u8> {
    PairAddDel {
        phy_id,
        is_add: true,
        host_type,
        host_name: name.to_string(),
        netns: netns.to_string(),
    }
    .encode(id(MsgKind::PairAddDel), ctx)
}

pub fn del_frame(phy_id: u32, ctx: u32) -> Vec<u8> {
    PairAddDel {
        phy_id,
        is_add: false,
        host_type: HostType::Tap,
        host_name: String::new(),
        netns: String::new(),
    }
    .encode(id(MsgKind::PairAddDel), ctx)
}

pub fn empty_frame(kind: MsgKind, ctx: u32) -> Vec<u8> {
    msg::encode_empty(id(kind), ctx)
}

/// Expect exactly one retval reply of `kind` echoing `ctx`; return its code.
pub fn single_retval(replies: &[Vec<u8>], kind: MsgKind, ctx: u32) -> i32 {
    assert_eq!(replies.len(), 1, "expected a single reply");
    let (header, body) = Header::decode(&replies[0]).unwrap();
    assert_eq!(header.msg_id, id(kind));
    assert_eq!(header.context, ctx);
    RetvalReply::decode(body).unwrap().retval
}

/// Decode an enumeration reply sequence into its details plus completion.
pub fn decode_enumeration(replies: &[Vec<u8>], ctx: u32) -> (Vec<PairDetails>, PairGetReply) {
    assert!(!replies.is_empty(), "enumeration always has a completion");

    let mut details = Vec::new();
    for frame in &replies[..replies.len() - 1] {
        let (header, body) = Header::decode(frame).unwrap();
        assert_eq!(header.msg_id, id(MsgKind::PairDetails));
        assert_eq!(header.context, ctx);
        details.push(PairDetails::decode(body).unwrap());
    }

    let (header, body) = Header::decode(replies.last().unwrap()).unwrap();
    assert_eq!(header.msg_id, id(MsgKind::PairGetReply));
    assert_eq!(header.context, ctx);
    (details, PairGetReply::decode(body).unwrap())
}
