//! Error types for the phase-space sampler.
//!
//! Following the propagation policy of spec.md §7: a failure at any layer
//! aborts the *current event* with weight zero rather than the run. Hard
//! errors (this module) are reserved for configuration-time problems and
//! numerical failures that a caller should actually see; routine
//! kinematic rejections are folded into [`PhaseSpaceError`] too so that
//! `?` composes the way `cres`'s fallible traits do, but callers at the
//! process-generator level (see [`crate::process`]) catch them and turn
//! them into a zero-weight event instead of aborting the run.

use thiserror::Error;

/// Errors produced while sampling or reweighting phase space.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhaseSpaceError {
    /// The requested `[xmin, xmax]` range does not admit a normalizable
    /// density (spec.md §4.1 `set_bounds` failure mode).
    #[error("density is not normalizable on [{xmin}, {xmax}]")]
    NotNormalizable {
        /// Lower bound that was rejected.
        xmin: f64,
        /// Upper bound that was rejected.
        xmax: f64,
    },

    /// An externally supplied value fell outside the sampler's bounds
    /// (spec.md §4.1 `evaluate_weight` failure mode).
    #[error("value {x} is outside bounds [{xmin}, {xmax}]")]
    OutOfRange {
        /// The offending value.
        x: f64,
        /// Lower bound.
        xmin: f64,
        /// Upper bound.
        xmax: f64,
    },

    /// The Källén function evaluated to a negative number: the requested
    /// three invariants do not correspond to physical momenta (spec.md
    /// §4.5 step 2, §4.6 step 1).
    #[error("kinematically forbidden: lambda({s}, {s1}, {s2}) < 0")]
    KinematicallyForbidden { s: f64, s1: f64, s2: f64 },

    /// A momentum or weight computation produced NaN or infinity
    /// (spec.md §7 "Numerical failure").
    #[error("numerical failure in {0}")]
    NumericalFailure(&'static str),

    /// `refresh_params()` discovered that cuts or beam energy leave no
    /// kinematically allowed phase space at all (spec.md §7
    /// "Misconfiguration").
    #[error("process phase space is empty under the current configuration")]
    EmptyPhaseSpace,

    /// A rejection loop (e.g. hit-and-miss daughter-mass sampling, spec.md
    /// §9 Open Question 1) exceeded `max_init_rejects` without producing
    /// a kinematically allowed event.
    #[error("rejection loop aborted after {tried} attempts")]
    RejectionLimitExceeded { tried: u32 },

    /// A particle name in a process-specification string did not match
    /// any species known to the model (spec.md §6).
    #[error("unknown particle {0:?}")]
    UnknownParticle(String),

    /// The process-specification string `"a,b > c,d,..."` could not be
    /// parsed.
    #[error("failed to parse process specification: {0}")]
    ProcessParseError(String),

    /// A sub-generator or channel pair was requested that no longer
    /// exists (e.g. [`crate::mixture::Mixture::replace`] given an
    /// unknown entry).
    #[error("no such channel in mixture")]
    NoSuchChannel,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PhaseSpaceError>;
