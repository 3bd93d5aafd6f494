//! The channel DAG (spec.md §3 "Momentum channel" / "Particle channel",
//! §9 "Recursive tree as a shared DAG").
//!
//! Different branchings can share a descendant momentum channel keyed
//! by the same bit-string, so the tree is really an arena of nodes
//! addressed by [`crate::bitstring::ChannelKey`] and linked by
//! `Rc`/`Weak` rather than owned recursively — a node may have more
//! than one parent, and nothing here relies on drop order the way a
//! `Box`-owned tree would.

mod arena;
mod momentum;
mod particle;

pub use arena::ChannelArena;
pub use momentum::MomentumChannel;
pub use particle::ParticleChannel;

/// Three-state generation status of a momentum channel (spec.md §4.3).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum GenerationStatus {
    #[default]
    Reset,
    SSet,
    PSet,
}

impl GenerationStatus {
    /// Move to `next`, logging (not failing) on an out-of-order
    /// transition (spec.md §4.3 "mis-ordered transitions log warnings
    /// but are not fatal").
    pub fn advance_to(&mut self, next: GenerationStatus) {
        use GenerationStatus::*;
        let in_order = next == Reset
            || matches!(
                (*self, next),
                (Reset, SSet) | (SSet, PSet) | (SSet, SSet) | (PSet, PSet)
            );
        if !in_order {
            log::warn!("out-of-order channel status transition {self:?} -> {next:?}");
        }
        *self = next;
    }
}
