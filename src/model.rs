//! The opaque, externally-supplied parts of the process: particle
//! species data, matrix-element evaluation, helicity/colour sampling
//! and parton distributions (spec.md §9 "Template-specialized vertex
//! evaluation... becomes a virtual dispatch on a vertex kind tag"; §4.8
//! "helicity/color sample (external)", "call matrix element").
//!
//! This crate does not ship a model or a matrix-element generator: it
//! consumes them through the traits below, the same way `cres` treats
//! event storage as something implemented against its `EventFileReader`
//! trait rather than baked in (`src/traits.rs`).

use crate::momentum::FourMomentum;
use noisy_float::prelude::*;
use particle_id::ParticleID;
use serde::{Deserialize, Serialize};

/// Static data for one propagating species (spec.md §3 "Particle
/// channel": "specialized by a propagating particle species φ").
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleSpecies {
    pub pdg: ParticleID,
    pub mass: N64,
    pub width: N64,
    /// Lower bound on the invariant mass this species may carry (e.g. a
    /// sum of further-resolved daughter masses for a composite leg).
    pub mass_min: N64,
    /// Upper bound; `N64::max_value()`-like unbounded via `f64::INFINITY`
    /// for a species with no known composite ceiling.
    pub mass_max: N64,
}

impl ParticleSpecies {
    pub fn stable(pdg: ParticleID, mass: N64) -> Self {
        Self {
            pdg,
            mass,
            width: n64(0.0),
            mass_min: mass,
            mass_max: mass,
        }
    }

    pub fn resonance(pdg: ParticleID, mass: N64, width: N64) -> Self {
        Self {
            pdg,
            mass,
            width,
            mass_min: n64(0.0),
            mass_max: n64(f64::INFINITY),
        }
    }

    pub fn mass_sq(&self) -> N64 {
        self.mass * self.mass
    }

    /// Whether this species is effectively stable for sampling purposes
    /// (spec.md §4.4 "Dirac-delta for a stable narrow one").
    pub fn is_narrow(&self) -> bool {
        self.width <= n64(0.0) || self.width / self.mass < n64(1e-6)
    }
}

/// Particle content and couplings needed to set up the channel DAG: a
/// lookup from PDG id to [`ParticleSpecies`] plus the set of allowed
/// 1→2 vertices (spec.md §9 vertex-kind dispatch is left to the caller;
/// this crate only needs to know which splittings exist).
pub trait Model {
    fn species(&self, pdg: ParticleID) -> Option<ParticleSpecies>;

    /// All `(daughter_a, daughter_b)` pairs a given parent species may
    /// split into, directly or through a virtual intermediate.
    fn vertices_from(&self, parent: ParticleID) -> Vec<(ParticleID, ParticleID)>;
}

/// The opaque matrix-element evaluator (spec.md §4.8 step iv-v, §9
/// "matrix-element calls are opaque").
pub trait MatrixElement {
    /// `ρ_evt`: matrix element squared, symmetry and flux factors
    /// folded in, for the given external momenta (incoming first).
    fn evaluate(&self, incoming: &[FourMomentum], outgoing: &[FourMomentum]) -> N64;
}

/// Samples helicities and colour flows for the generated external
/// state and returns the associated weight `w_hel · w_col` (spec.md §6
/// "Event output": "color and anti-color tags per particle").
pub trait HelicityColourSampler {
    fn sample(
        &mut self,
        rng: &mut dyn rand::RngCore,
        species: &[ParticleSpecies],
    ) -> (N64, Vec<(i32, i32)>);
}

/// A parton distribution function, consulted by the initial-state
/// sampler for hadronic beams (spec.md §4.7 "Beam PDF evaluations
/// multiply into the event weight").
pub trait PartonDistribution {
    fn xf(&self, pdg: ParticleID, x: N64, q2: N64) -> N64;
}

/// A trivial PDF that always returns one, for partonic / leptonic
/// initial states where no convolution is needed.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoPdf;

impl PartonDistribution for NoPdf {
    fn xf(&self, _pdg: ParticleID, _x: N64, _q2: N64) -> N64 {
        n64(1.0)
    }
}
