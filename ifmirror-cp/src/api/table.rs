//! Message-id registration table.
//!
//! Ids are assigned at startup as one contiguous block starting at a
//! configured base, not as fixed constants. Agents resolve names to ids
//! through the reserved lookup exchange (id 0) before sending anything
//! else; the daemon resolves inbound ids back to kinds by offset.

use ifmirror_api::msg::MsgKind;

#[derive(Debug, Clone, Copy)]
pub struct MsgTable {
    base: u16,
}

impl MsgTable {
    /// Register the full message set starting at `base`. The base must sit
    /// above the reserved lookup id; config validation enforces that.
    pub fn new(base: u16) -> Self {
        debug_assert!(base > ifmirror_api::MSG_LOOKUP_ID);
        MsgTable { base }
    }

    pub fn base(&self) -> u16 {
        self.base
    }

    /// Assigned wire id of a message kind.
    pub fn id(&self, kind: MsgKind) -> u16 {
        self.base + kind.offset()
    }

    /// Resolve a registered name to its assigned id.
    pub fn lookup(&self, name: &str) -> Option<u16> {
        MsgKind::from_name(name).map(|kind| self.id(kind))
    }

    /// Resolve an inbound wire id back to its kind.
    pub fn kind_of(&self, msg_id: u16) -> Option<MsgKind> {
        MsgKind::from_offset(msg_id.checked_sub(self.base)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_is_contiguous() {
        let table = MsgTable::new(256);
        for (i, kind) in MsgKind::ALL.iter().enumerate() {
            assert_eq!(table.id(*kind), 256 + i as u16);
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let table = MsgTable::new(100);
        assert_eq!(table.lookup("pair_add_del"), Some(100));
        assert_eq!(table.lookup("replace_end_reply"), Some(112));
        assert_eq!(table.lookup("no_such_message"), None);
    }

    #[test]
    fn test_kind_of_inbound_id() {
        let table = MsgTable::new(100);
        assert_eq!(table.kind_of(100), Some(MsgKind::PairAddDel));
        assert_eq!(table.kind_of(104), Some(MsgKind::PairGetReply));
        // Below the base and past the block both miss.
        assert_eq!(table.kind_of(99), None);
        assert_eq!(table.kind_of(100 + MsgKind::ALL.len() as u16), None);
    }
}
