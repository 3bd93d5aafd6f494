//! A multi-channel phase-space sampler for tree-level scattering and
//! decay processes.
//!
//! A process is built as a DAG of [momentum channels](channel), each
//! bit-string keyed by the set of external legs it spans. Internal
//! nodes own a [`mixture::Mixture`] over candidate
//! [branchings](branching), and every invariant-mass degree of freedom
//! is drawn from one of the closed set of
//! [value samplers](sampler::Sampler), optionally wrapped in an
//! [adaptive grid](sampler::Adaptive). [`process::ProcessGenerator`]
//! ties the pieces together: it owns the DAG, the
//! [initial-state sampler](initial_state), the running
//! [cross-section estimate](process::CrossSectionEstimator), and drives
//! one [event](event::Event) at a time out of a caller-supplied
//! [model](model), matrix element, and helicity/colour sampler.
//!
//! ## Most relevant modules
//!
//! - [prelude] re-exports the types most callers need
//! - [process] contains [`process::ProcessGenerator`], the main entry point
//! - [model] the traits an external model/matrix-element plugs into
//! - [config] run configuration
//! - [event] the generated event record

/// Isotropic angular sampling for two-body decay kinematics.
pub mod angular;
/// Bit-string channel keys.
pub mod bitstring;
/// Branchings: 1→2 decompositions of a momentum channel.
pub mod branching;
/// The momentum/particle channel DAG.
pub mod channel;
/// Run configuration.
pub mod config;
/// Invariant-mass / pT / pseudorapidity cuts.
pub mod cuts;
/// Error types.
pub mod error;
/// The generated event record.
pub mod event;
/// Beam and parton-level initial-state sampling.
pub mod initial_state;
/// The Källén function and two-body phase-space factors.
pub mod kallen;
/// Multi-channel mixture selector.
pub mod mixture;
/// The opaque externally-supplied model / matrix element / PDF traits.
pub mod model;
/// Four-momenta with the Minkowski metric.
pub mod momentum;
/// Most important exports.
pub mod prelude;
/// The top-level process generator.
pub mod process;
/// One-dimensional value samplers for an invariant mass or angle.
pub mod sampler;

use lazy_static::lazy_static;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
lazy_static! {
    pub static ref VERSION_MAJOR: u32 = env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap();
    pub static ref VERSION_MINOR: u32 = env!("CARGO_PKG_VERSION_MINOR").parse().unwrap();
    pub static ref VERSION_PATCH: u32 = env!("CARGO_PKG_VERSION_PATCH").parse().unwrap();
}
pub const GIT_REV: Option<&str> = option_env!("VERGEN_GIT_SHA_SHORT");
pub const GIT_BRANCH: Option<&str> = option_env!("VERGEN_GIT_BRANCH");
