//! Bit-string channel keys (spec.md §3, §9 "Bit-string as key").
//!
//! A fixed-width bit-vector over the external particles: bit `i` set iff
//! external particle `i`'s momentum flows through the channel. Up to 64
//! external particles are supported, which comfortably covers any
//! tree-level process this crate is meant for; `u64` keeps comparison,
//! hashing and popcount free instead of reaching for a heap-allocated
//! bitset the way a general-purpose library might.

use std::fmt;

/// A bit-string channel key.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct ChannelKey {
    bits: u64,
    /// Total number of external particles (N_in + N_out), needed to
    /// classify a channel as external / time-like / space-like.
    n_external: u8,
    /// Number of incoming particles (1 for a decay, 2 for scattering).
    n_incoming: u8,
}

impl ChannelKey {
    /// Construct the key for a single external particle `index`.
    pub fn external(index: u8, n_external: u8, n_incoming: u8) -> Self {
        Self {
            bits: 1u64 << index,
            n_external,
            n_incoming,
        }
    }

    /// Construct the key for the union of two disjoint channels.
    pub fn union(a: &ChannelKey, b: &ChannelKey) -> Self {
        debug_assert_eq!(a.n_external, b.n_external);
        debug_assert_eq!(a.bits & b.bits, 0, "channels must partition distinct legs");
        Self {
            bits: a.bits | b.bits,
            n_external: a.n_external,
            n_incoming: a.n_incoming,
        }
    }

    /// The complement channel (all external legs not in `self`).
    pub fn complement(&self) -> Self {
        let mask = if self.n_external == 64 {
            u64::MAX
        } else {
            (1u64 << self.n_external) - 1
        };
        Self {
            bits: (!self.bits) & mask,
            n_external: self.n_external,
            n_incoming: self.n_incoming,
        }
    }

    /// The full set of all external legs (the root channel).
    pub fn root(n_external: u8, n_incoming: u8) -> Self {
        let mask = if n_external == 64 {
            u64::MAX
        } else {
            (1u64 << n_external) - 1
        };
        Self {
            bits: mask,
            n_external,
            n_incoming,
        }
    }

    /// Number of legs set in this channel.
    pub fn popcount(&self) -> u32 {
        self.bits.count_ones()
    }

    /// Whether incoming leg 0 participates in this channel.
    pub fn first_incoming_set(&self) -> bool {
        self.bits & 1 != 0
    }

    /// External / on-shell iff popcount is 1 or N−1 (spec.md §3).
    pub fn is_external(&self) -> bool {
        self.popcount() == 1 || self.popcount() == (self.n_external as u32 - 1)
    }

    /// Time-like (s-channel): the first incoming bit is not set, or the
    /// channel's popcount is N−1 (spec.md §3).
    pub fn is_timelike(&self) -> bool {
        !self.first_incoming_set() || self.popcount() == (self.n_external as u32 - 1)
    }

    /// Space-like (t-channel): exactly one incoming bit set and the
    /// channel is off-shell (spec.md §3).
    pub fn is_spacelike(&self) -> bool {
        let incoming_mask = if self.n_incoming == 64 {
            u64::MAX
        } else {
            (1u64 << self.n_incoming) - 1
        };
        (self.bits & incoming_mask).count_ones() == 1 && !self.is_external()
    }

    /// Raw bit pattern, for hashing/serialization.
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Does this channel contain external leg `index`?
    pub fn contains(&self, index: u8) -> bool {
        self.bits & (1u64 << index) != 0
    }
}

impl fmt::Display for ChannelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:0width$b}", self.bits, width = self.n_external as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_and_complement() {
        let a = ChannelKey::external(0, 4, 2);
        let b = ChannelKey::external(1, 4, 2);
        let ab = ChannelKey::union(&a, &b);
        assert_eq!(ab.popcount(), 2);
        let comp = ab.complement();
        assert_eq!(comp.popcount(), 2);
        assert_eq!(ChannelKey::union(&ab, &comp), ChannelKey::root(4, 2));
    }

    #[test]
    fn external_classification() {
        // 2 -> 2 process: legs 0,1 incoming, 2,3 outgoing.
        let leg = ChannelKey::external(2, 4, 2);
        assert!(leg.is_external());
        let internal = ChannelKey::union(
            &ChannelKey::external(0, 4, 2),
            &ChannelKey::external(2, 4, 2),
        );
        assert!(internal.is_spacelike());
        assert!(!internal.is_timelike());
    }
}
