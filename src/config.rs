//! Run configuration (spec.md §6 "Configuration options").
//!
//! Mirrors the way `cres`'s CLI options (`opt_cres.rs`) are grouped into
//! small `#[derive(Parser)]` structs and a resampler is built from a
//! `#[derive(Builder)]` struct (`resampler.rs::DefaultResampler`): here a
//! single [`Config`], captured once by a [`crate::process::ProcessGenerator`]
//! at construction, replaces the global mutable MC configuration singleton
//! of the original implementation (spec.md §9).

use derive_builder::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Initial-state family (spec.md §6).
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Default, Display, EnumString,
    Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum InitialState {
    /// Both beam momenta fixed, no PDF convolution.
    #[default]
    Partonic,
    /// e+e- collider.
    EpEm,
    /// proton-proton.
    Pp,
    /// proton-antiproton.
    PpBar,
    /// antiproton-proton.
    PBarP,
    /// antiproton-antiproton.
    PBarPBar,
}

/// Top-level phase-space generator family (spec.md §6).
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Default, Display, EnumString,
    Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum PhaseSpaceGeneratorKind {
    Uniform,
    #[default]
    Recursive,
    RecursiveBackwardS,
    RecursiveBackwardSHat,
}

/// Adaptive-grid leaf-weight estimator (spec.md §3 "Adaptive grid",
/// §6 `grid_mode`).
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Default, Display, EnumString,
    Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum GridMode {
    Cumulant,
    #[default]
    Variance,
    Maximum,
}

/// Two-mass sampling strategy in an s-branching (spec.md §4.5, §6).
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Default, Display, EnumString,
    Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
pub enum SPairGenerationMode {
    #[default]
    Asymmetric,
    Symmetric,
    HitAndMiss,
}

/// Burn-in schedule: `(iterations, batch_size)` (spec.md §6
/// `channel_init` / `grid_init`).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BurnIn {
    pub iterations: u32,
    pub batch_size: u32,
}

impl Default for BurnIn {
    fn default() -> Self {
        Self {
            iterations: 1000,
            batch_size: 100,
        }
    }
}

/// Default power-law exponents for the various propagator kinds
/// (spec.md §6).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefaultExponents {
    pub s_hat: f64,
    pub timelike: f64,
    pub spacelike: f64,
    pub auxiliary: f64,
}

impl Default for DefaultExponents {
    fn default() -> Self {
        Self {
            s_hat: 1.0,
            timelike: 1.2,
            spacelike: 1.0,
            auxiliary: 1.0,
        }
    }
}

/// Full run configuration (spec.md §6).
#[derive(Clone, Debug, Builder, Serialize, Deserialize)]
#[builder(setter(into), default)]
pub struct Config {
    pub initial_state: InitialState,
    pub phase_space_generator: PhaseSpaceGeneratorKind,
    pub grid_mode: GridMode,
    pub s_pair_generation_mode: SPairGenerationMode,
    pub channel_init: BurnIn,
    pub grid_init: BurnIn,
    /// Events per subprocess cross-section estimate.
    pub subprocess_events: u32,
    /// Mixture adaptation batch; `0` disables mixture adaptation.
    pub auto_channel_adapt: u32,
    /// Grid adaptation batch; `0` disables grid adaptation.
    pub auto_grid_adapt: u32,
    /// Cap on rejected events during burn-in / a single event's
    /// rejection loop.
    pub max_init_rejects: u32,
    /// Maximum number of adaptive-grid leaves.
    pub grid_bins: u32,
    /// Minimum mixture weight retained after `adapt()`.
    pub multichannel_threshold: f64,
    /// Exponent ξ for mixture adaptation.
    pub multichannel_adaptivity: f64,
    pub default_exponents: DefaultExponents,
    /// Newton-Raphson steps for massive RAMBO-style rescaling.
    pub nr_iterations: u32,
    /// Highest-weight fraction discarded for stability, in `[0, 1]`.
    pub discard_weight_fraction: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            initial_state: InitialState::default(),
            phase_space_generator: PhaseSpaceGeneratorKind::default(),
            grid_mode: GridMode::default(),
            s_pair_generation_mode: SPairGenerationMode::default(),
            channel_init: BurnIn::default(),
            grid_init: BurnIn::default(),
            subprocess_events: 10_000,
            auto_channel_adapt: 1000,
            auto_grid_adapt: 1000,
            max_init_rejects: 10_000,
            grid_bins: 50,
            multichannel_threshold: 1e-3,
            multichannel_adaptivity: 0.5,
            default_exponents: DefaultExponents::default(),
            nr_iterations: 10,
            discard_weight_fraction: 0.0,
        }
    }
}

impl Config {
    /// Validate ranges that would otherwise silently misbehave; this is
    /// the "Misconfiguration" check of spec.md §7 applied to the static
    /// configuration rather than the kinematic bounds.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.multichannel_threshold > 0.0 && self.multichannel_threshold <= 1.0) {
            return Err(format!(
                "multichannel_threshold {} outside (0, 1]",
                self.multichannel_threshold
            ));
        }
        if !(0.0..=1.0).contains(&self.multichannel_adaptivity) {
            return Err(format!(
                "multichannel_adaptivity {} outside [0, 1]",
                self.multichannel_adaptivity
            ));
        }
        if !(0.0..=1.0).contains(&self.discard_weight_fraction) {
            return Err(format!(
                "discard_weight_fraction {} outside [0, 1]",
                self.discard_weight_fraction
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn rejects_bad_threshold() {
        let cfg = ConfigBuilder::default()
            .multichannel_threshold(2.0)
            .build()
            .unwrap();
        assert!(cfg.validate().is_err());
    }
}
