//! Branchings: 1→2 decompositions of a momentum channel (spec.md §3
//! "Branching", §4.5 "s-type Branching", §4.6 "t-type Branching").
//!
//! Grounded on `include/Camgen/s_branch.h`, which covers both the
//! s-type and t-type momentum branching classes in the Camgen source:
//! a branching owns the kinematics of one node of the decomposition
//! tree and two non-owning references to the particle channels it
//! produces (spec.md §5 "Branchings hold non-owning pointers to
//! particle channels").

mod s_branch;
mod t_branch;

pub use s_branch::SBranch;
pub use t_branch::TBranch;

use std::cell::RefCell;
use std::rc::Rc;

use enum_dispatch::enum_dispatch;
use noisy_float::prelude::*;
use rand::RngCore;

use crate::channel::{MomentumChannel, ParticleChannel};
use crate::error::Result;

/// Common contract of the two branching kinds (spec.md §4.5, §4.6).
#[enum_dispatch]
pub trait Branch {
    /// Draw daughter masses and kinematics, set both daughters'
    /// momentum channels, and return the branching weight.
    fn generate(&mut self, rng: &mut dyn RngCore) -> Result<N64>;

    /// Recompute the branching weight for the daughters' momenta as
    /// they currently stand (spec.md §4.5 `evaluate_branching_weight`).
    fn evaluate_branching_weight(&self) -> Result<N64>;

    /// The two outgoing particle channels.
    fn daughters(&self) -> (Rc<RefCell<ParticleChannel>>, Rc<RefCell<ParticleChannel>>);

    /// The incoming momentum channel, if it has not been dropped from
    /// the arena.
    fn incoming(&self) -> Option<Rc<RefCell<MomentumChannel>>>;
}

/// A branching of one of the two kinds enumerated in spec.md §3.
#[enum_dispatch(Branch)]
#[derive(Clone)]
pub enum Branching {
    SBranch(SBranch),
    TBranch(TBranch),
}

pub(crate) fn kinematically_forbidden(s: N64, s1: N64, s2: N64) -> crate::error::PhaseSpaceError {
    crate::error::PhaseSpaceError::KinematicallyForbidden {
        s: s.raw(),
        s1: s1.raw(),
        s2: s2.raw(),
    }
}
