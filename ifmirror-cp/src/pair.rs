//! Interface-pair registry.
//!
//! Pairs live in an arena of slots with a free-list; a dense phy-to-slot
//! map gives O(1) lookup while slot indices stay stable across unrelated
//! insert/remove. Iteration walks slot order and skips holes, so no live
//! pair is skipped and none is observed twice within one pass.

use ifmirror_api::HostType;
use std::collections::HashMap;

/// One live binding between a dataplane interface and its kernel mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfacePair {
    /// Dataplane-side interface id; unique among live pairs.
    pub phy_id: u32,
    /// Kernel ifindex of the mirror device.
    pub host_id: u32,
    /// Virtual-interface correlation handle assigned by the backend.
    pub vif_id: u32,
    pub host_type: HostType,
    pub host_name: String,
    /// Namespace the mirror device lives in; resolved from the process
    /// default at creation time and frozen afterwards.
    pub netns: String,
}

/// Slot-stable pool of pairs indexed by phy id.
#[derive(Debug, Default)]
pub struct PairRegistry {
    slots: Vec<Option<InterfacePair>>,
    free: Vec<usize>,
    by_phy: HashMap<u32, usize>,
}

impl PairRegistry {
    pub fn new() -> Self {
        PairRegistry::default()
    }

    /// Insert a pair. Returns false and leaves the registry unchanged if
    /// the phy id is already paired.
    pub fn insert(&mut self, pair: InterfacePair) -> bool {
        if self.by_phy.contains_key(&pair.phy_id) {
            return false;
        }
        let phy_id = pair.phy_id;
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(pair);
                slot
            }
            None => {
                self.slots.push(Some(pair));
                self.slots.len() - 1
            }
        };
        self.by_phy.insert(phy_id, slot);
        true
    }

    /// Remove and return the pair for a phy id; its slot goes back on the
    /// free-list.
    pub fn remove(&mut self, phy_id: u32) -> Option<InterfacePair> {
        let slot = self.by_phy.remove(&phy_id)?;
        let pair = self.slots[slot].take();
        self.free.push(slot);
        pair
    }

    pub fn get(&self, phy_id: u32) -> Option<&InterfacePair> {
        self.by_phy
            .get(&phy_id)
            .and_then(|&slot| self.slots[slot].as_ref())
    }

    pub fn contains(&self, phy_id: u32) -> bool {
        self.by_phy.contains_key(&phy_id)
    }

    /// Live pairs in slot order. A fresh call restarts from the first slot.
    pub fn iter(&self) -> impl Iterator<Item = &InterfacePair> {
        self.slots.iter().filter_map(|slot| slot.as_ref())
    }

    /// Phy ids of all live pairs.
    pub fn phy_ids(&self) -> Vec<u32> {
        self.iter().map(|p| p.phy_id).collect()
    }

    pub fn len(&self) -> usize {
        self.by_phy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_phy.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(phy_id: u32) -> InterfacePair {
        InterfacePair {
            phy_id,
            host_id: 1000 + phy_id,
            vif_id: phy_id,
            host_type: HostType::Tap,
            host_name: format!("tap{phy_id}"),
            netns: String::new(),
        }
    }

    #[test]
    fn test_insert_get_remove() {
        let mut reg = PairRegistry::new();
        assert!(reg.is_empty());

        assert!(reg.insert(pair(5)));
        assert_eq!(reg.len(), 1);
        assert!(reg.contains(5));
        assert_eq!(reg.get(5).unwrap().host_name, "tap5");
        assert!(reg.get(6).is_none());

        let removed = reg.remove(5).unwrap();
        assert_eq!(removed.phy_id, 5);
        assert!(reg.is_empty());
        assert!(reg.remove(5).is_none());
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut reg = PairRegistry::new();
        assert!(reg.insert(pair(1)));
        let mut dup = pair(1);
        dup.host_name = "other".to_string();
        assert!(!reg.insert(dup));
        // Original record untouched.
        assert_eq!(reg.get(1).unwrap().host_name, "tap1");
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_slot_reuse_keeps_other_slots_stable() {
        let mut reg = PairRegistry::new();
        for phy in [1, 2, 3] {
            assert!(reg.insert(pair(phy)));
        }
        reg.remove(2);
        // The freed slot is reused by the next insert.
        assert!(reg.insert(pair(9)));
        assert_eq!(reg.len(), 3);

        let phys: Vec<u32> = reg.iter().map(|p| p.phy_id).collect();
        // Slot order: 9 landed in the hole left by 2.
        assert_eq!(phys, vec![1, 9, 3]);
    }

    #[test]
    fn test_iter_skips_holes() {
        let mut reg = PairRegistry::new();
        for phy in 0..5 {
            reg.insert(pair(phy));
        }
        reg.remove(0);
        reg.remove(3);

        let phys: Vec<u32> = reg.iter().map(|p| p.phy_id).collect();
        assert_eq!(phys, vec![1, 2, 4]);
        assert_eq!(reg.len(), 3);
    }
}
