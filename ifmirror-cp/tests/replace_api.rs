//! Protocol-level tests of the replace transaction bracket.

mod common;

use common::*;
use ifmirror_api::msg::MsgKind;
use ifmirror_api::{ApiError, HostType};

#[test]
fn test_bulk_reconcile_sweeps_only_stragglers() {
    let (mut service, handle) = service_with(&[1, 2, 3]);
    for phy in [1, 2, 3] {
        let replies = service.handle(&add_frame(phy, HostType::Tap, &format!("tap{phy}"), "", phy));
        assert_eq!(single_retval(&replies, MsgKind::PairAddDelReply, phy), 0);
    }

    let replies = service.handle(&empty_frame(MsgKind::ReplaceBegin, 10));
    assert_eq!(single_retval(&replies, MsgKind::ReplaceBeginReply, 10), 0);

    // The agent re-asserts 1 and 2 by re-issuing their creates; both are
    // no-op successes with zero device churn.
    for phy in [1, 2] {
        let replies = service.handle(&add_frame(phy, HostType::Tap, &format!("tap{phy}"), "", 11));
        assert_eq!(single_retval(&replies, MsgKind::PairAddDelReply, 11), 0);
    }
    assert_eq!(handle.creates(), 3);

    let replies = service.handle(&empty_frame(MsgKind::ReplaceEnd, 12));
    assert_eq!(single_retval(&replies, MsgKind::ReplaceEndReply, 12), 0);

    // Only 3 was swept; 1 and 2 kept their original records.
    let replies = service.handle(&empty_frame(MsgKind::PairGet, 13));
    let (details, completion) = decode_enumeration(&replies, 13);
    assert_eq!(completion.count, 2);
    let mut phys: Vec<u32> = details.iter().map(|d| d.phy_id).collect();
    phys.sort_unstable();
    assert_eq!(phys, vec![1, 2]);
    assert_eq!(handle.deletes(), 1);
}

#[test]
fn test_replace_empty_pending_set_succeeds() {
    let (mut service, _) = service_with(&[]);
    let replies = service.handle(&empty_frame(MsgKind::ReplaceBegin, 1));
    assert_eq!(single_retval(&replies, MsgKind::ReplaceBeginReply, 1), 0);
    let replies = service.handle(&empty_frame(MsgKind::ReplaceEnd, 2));
    assert_eq!(single_retval(&replies, MsgKind::ReplaceEndReply, 2), 0);
}

#[test]
fn test_begin_while_active_rejected() {
    let (mut service, _) = service_with(&[]);
    let replies = service.handle(&empty_frame(MsgKind::ReplaceBegin, 1));
    assert_eq!(single_retval(&replies, MsgKind::ReplaceBeginReply, 1), 0);

    let replies = service.handle(&empty_frame(MsgKind::ReplaceBegin, 2));
    assert_eq!(
        single_retval(&replies, MsgKind::ReplaceBeginReply, 2),
        ApiError::AlreadyActive.code()
    );
}

#[test]
fn test_end_while_inactive_rejected() {
    let (mut service, _) = service_with(&[]);
    let replies = service.handle(&empty_frame(MsgKind::ReplaceEnd, 3));
    assert_eq!(
        single_retval(&replies, MsgKind::ReplaceEndReply, 3),
        ApiError::NotActive.code()
    );
}

#[test]
fn test_delete_during_bracket_counts_as_reassertion() {
    let (mut service, handle) = service_with(&[1, 2]);
    for phy in [1, 2] {
        service.handle(&add_frame(phy, HostType::Tap, &format!("tap{phy}"), "", 0));
    }

    service.handle(&empty_frame(MsgKind::ReplaceBegin, 1));
    let replies = service.handle(&del_frame(1, 2));
    assert_eq!(single_retval(&replies, MsgKind::PairAddDelReply, 2), 0);
    let replies = service.handle(&empty_frame(MsgKind::ReplaceEnd, 3));
    assert_eq!(single_retval(&replies, MsgKind::ReplaceEndReply, 3), 0);

    // The explicit delete was not swept a second time.
    assert_eq!(handle.deletes(), 2);
    assert!(service.manager().is_empty());
}

#[test]
fn test_sweep_failure_reported_but_transaction_ends() {
    let (mut service, handle) = service_with(&[1]);
    service.handle(&add_frame(1, HostType::Tap, "tap1", "", 0));

    service.handle(&empty_frame(MsgKind::ReplaceBegin, 1));
    handle.fail_next_delete(-16);
    let replies = service.handle(&empty_frame(MsgKind::ReplaceEnd, 2));
    assert_eq!(single_retval(&replies, MsgKind::ReplaceEndReply, 2), -16);

    // The failed pair is still live and a fresh bracket can be opened.
    assert!(service.manager().get(1).is_some());
    let replies = service.handle(&empty_frame(MsgKind::ReplaceBegin, 3));
    assert_eq!(single_retval(&replies, MsgKind::ReplaceBeginReply, 3), 0);
}
