use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::bitstring::ChannelKey;

use super::MomentumChannel;

/// Flat storage for the momentum-channel DAG, addressed by bit-string
/// key (spec.md §9 "Recursive tree as a shared DAG": "Represent the
/// tree as an arena of nodes addressed by bit-string keys ... Lifetime
/// = longest-holder via reference counting or a single-owner 'tree
/// container' with flat storage is preferred").
///
/// `get_or_insert` is what lets two different branchings discover they
/// already share a descendant: both ask the arena for the same
/// bit-string and get back the same `Rc`.
#[derive(Default)]
pub struct ChannelArena {
    channels: HashMap<ChannelKey, Rc<RefCell<MomentumChannel>>>,
}

impl ChannelArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert(&mut self, key: ChannelKey) -> Rc<RefCell<MomentumChannel>> {
        self.channels
            .entry(key)
            .or_insert_with(|| MomentumChannel::new(key))
            .clone()
    }

    pub fn get(&self, key: &ChannelKey) -> Option<Rc<RefCell<MomentumChannel>>> {
        self.channels.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &ChannelKey> {
        self.channels.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shares_channel_for_same_key() {
        let mut arena = ChannelArena::new();
        let k = ChannelKey::external(0, 4, 2);
        let a = arena.get_or_insert(k);
        let b = arena.get_or_insert(k);
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(arena.len(), 1);
    }
}
