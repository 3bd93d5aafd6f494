use std::cell::RefCell;
use std::rc::{Rc, Weak};

use noisy_float::prelude::*;
use rand::RngCore;

use super::MomentumChannel;
use crate::branching::{Branch, Branching};
use crate::error::Result;
use crate::mixture::Mixture;
use crate::model::ParticleSpecies;
use crate::sampler::{Sampler, ValueSampler};

/// A particle channel: a momentum channel specialized by a propagating
/// species, owning the value sampler for its invariant mass and the
/// mixture over its candidate outgoing branchings (spec.md §4.4).
pub struct ParticleChannel {
    name: String,
    species: Option<ParticleSpecies>,
    momentum_channel: Weak<RefCell<MomentumChannel>>,
    sampler: Sampler,
    branchings: Mixture<Branching>,
}

impl ParticleChannel {
    pub fn new(
        name: String,
        species: Option<ParticleSpecies>,
        momentum_channel: &Rc<RefCell<MomentumChannel>>,
        sampler: Sampler,
        xi: f64,
        prune_threshold: f64,
    ) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            name,
            species,
            momentum_channel: Rc::downgrade(momentum_channel),
            sampler,
            branchings: Mixture::new(Vec::new(), xi, prune_threshold),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn species(&self) -> Option<&ParticleSpecies> {
        self.species.as_ref()
    }

    pub fn momentum_channel(&self) -> Option<Rc<RefCell<MomentumChannel>>> {
        self.momentum_channel.upgrade()
    }

    pub fn is_leaf(&self) -> bool {
        self.branchings.is_empty()
    }

    pub fn branchings(&self) -> &Mixture<Branching> {
        &self.branchings
    }

    pub fn insert_branching(&mut self, branching: Branching) {
        self.branchings.insert(branching);
    }

    pub fn remove_branching(&mut self, idx: usize) -> Branching {
        self.branchings.remove(idx)
    }

    pub fn replace_branching(&mut self, idx: usize, branching: Branching) -> Branching {
        self.branchings.replace(idx, branching)
    }

    pub fn record_mixture(&mut self, idx: usize, contribution: N64) {
        self.branchings.record(idx, contribution);
    }

    pub fn adapt_mixture(&mut self) {
        self.branchings.adapt();
    }

    /// Optionally swap the value sampler (spec.md §4.4 `set_s_generator`,
    /// e.g. Breit-Wigner for a resonance, Dirac-delta for a stable
    /// narrow particle).
    pub fn set_sampler(&mut self, sampler: Sampler) {
        self.sampler = sampler;
    }

    pub fn sampler_bounds(&self) -> (N64, N64) {
        self.sampler.bounds()
    }

    pub fn restrict_sampler(&mut self, xmin: N64, xmax: N64) -> Result<()> {
        self.sampler.set_bounds(xmin, xmax)
    }

    /// Draw this channel's invariant mass from its own value sampler
    /// and set the owning momentum channel's `s` (spec.md §4.4
    /// `generate()`'s mass-sampling half, invoked by the parent
    /// branching's "sample daughter masses" step).
    pub fn generate_mass(&mut self, rng: &mut dyn RngCore) -> Result<(N64, N64)> {
        let (s, w) = self.sampler.generate(rng)?;
        if let Some(mc) = self.momentum_channel() {
            mc.borrow_mut().set_s(s);
        }
        Ok((s, w))
    }

    pub fn evaluate_mass_weight(&self, s: N64) -> Result<N64> {
        self.sampler.evaluate_weight(s)
    }

    /// Feed the realized event's integrand into this channel's grid, if
    /// its mass sampler is [`Sampler::Adaptive`] (spec.md §3 "Adaptive
    /// grid", §4.8 step viii).
    pub fn record_grid(&mut self, integrand: N64) {
        if let Sampler::Adaptive(grid) = &mut self.sampler {
            grid.record(integrand);
        }
    }

    /// Run one grid split/merge pass, if applicable (spec.md §6
    /// `auto_grid_adapt`).
    pub fn adapt_grid(&mut self) {
        if let Sampler::Adaptive(grid) = &mut self.sampler {
            grid.adapt();
        }
    }

    /// Recursively generate the rest of the subtree rooted at `this`,
    /// given that its own momentum has already been set by the parent
    /// branching (spec.md §2 data flow: "recursively each daughter
    /// particle channel either (a) is a leaf and stops or (b) ...
    /// selects a sub-branching").
    ///
    /// Returns the product of weights along the realized path. Every
    /// `(channel, branching index)` visited is appended to `path`, so
    /// the caller can feed the final event integrand back into each
    /// mixture's statistics (spec.md §3 "every event updates all
    /// generator statistics along the selected path").
    pub fn generate_subtree(
        this: &Rc<RefCell<ParticleChannel>>,
        rng: &mut dyn RngCore,
        path: &mut Vec<(Rc<RefCell<ParticleChannel>>, usize)>,
    ) -> Result<N64> {
        if this.borrow().is_leaf() {
            return Ok(n64(1.0));
        }
        let r = crate::sampler::unit_uniform(rng);
        let (idx, _alpha) = this.borrow().branchings.select(r);
        this.borrow_mut().branchings.alternative_mut(idx).generate(rng)?;

        // Multi-channel weight (spec.md §4.2 `evaluate_weight`, §4.8 step
        // vi): combine every alternative's weight at the realized
        // kinematics, `w_mix = (∑_k α_k·w_k⁻¹)⁻¹`, rather than returning
        // just the selected alternative's own weight. Alternatives for
        // which the realized point is undefined (e.g. kinematically
        // forbidden under that alternative) are dropped from the sum.
        let branching_weight = {
            let node = this.borrow();
            node.branchings.combined_weight(|i| {
                node.branchings.alternative(i).evaluate_branching_weight().ok()
            })
        };

        let (d1, d2) = this.borrow().branchings.alternative(idx).daughters();
        path.push((this.clone(), idx));
        let w1 = Self::generate_subtree(&d1, rng, path)?;
        let w2 = Self::generate_subtree(&d2, rng, path)?;
        Ok(branching_weight * w1 * w2)
    }
}
