use std::cell::RefCell;
use std::rc::{Rc, Weak};

use noisy_float::prelude::*;

use super::{GenerationStatus, ParticleChannel};
use crate::bitstring::ChannelKey;
use crate::kallen::sqrt_kallen;
use crate::momentum::FourMomentum;

/// One node of the channel DAG (spec.md §4.3).
///
/// Owns the momentum/invariant of the leg it represents and an ordered
/// list of [`ParticleChannel`]s — one per propagating species that
/// could carry this leg.
pub struct MomentumChannel {
    key: ChannelKey,
    p: FourMomentum,
    s: N64,
    s_min: N64,
    s_max: N64,
    status: GenerationStatus,
    particle_channels: Vec<Rc<RefCell<ParticleChannel>>>,
}

impl MomentumChannel {
    pub fn new(key: ChannelKey) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self {
            key,
            p: FourMomentum::new(),
            s: n64(0.0),
            s_min: n64(0.0),
            s_max: n64(f64::INFINITY),
            status: GenerationStatus::Reset,
            particle_channels: Vec::new(),
        }))
    }

    pub fn key(&self) -> ChannelKey {
        self.key
    }

    pub fn status(&self) -> GenerationStatus {
        self.status
    }

    pub fn momentum(&self) -> FourMomentum {
        self.p
    }

    pub fn s(&self) -> N64 {
        self.s
    }

    pub fn bounds(&self) -> (N64, N64) {
        (self.s_min, self.s_max)
    }

    pub fn particle_channels(&self) -> &[Rc<RefCell<ParticleChannel>>] {
        &self.particle_channels
    }

    pub fn add_particle_channel(&mut self, pc: Rc<RefCell<ParticleChannel>>) {
        self.particle_channels.push(pc);
    }

    /// Recompute `s` from the current four-momentum via the model's
    /// spacetime dot product (spec.md §4.3 `evaluate_s`).
    pub fn evaluate_s(&mut self) {
        self.s = self.p.dot(&self.p);
    }

    pub fn set_momentum(&mut self, p: FourMomentum) {
        self.p = p;
        self.evaluate_s();
        self.status.advance_to(GenerationStatus::PSet);
    }

    pub fn set_s(&mut self, s: N64) {
        self.s = s;
        self.status.advance_to(GenerationStatus::SSet);
    }

    pub fn reset(&mut self) {
        self.status = GenerationStatus::Reset;
    }

    /// Recompute `s⁻⁻` from the leaf-mass sum on each side of the
    /// branching that produces this channel and the Källén-function
    /// constraint against the other sub-partition (spec.md §4.3
    /// `refresh_s_min`).
    pub fn refresh_s_min(&mut self, leaf_mass_sum_sq: N64) {
        self.s_min = leaf_mass_sum_sq.max(n64(0.0));
    }

    /// Recompute `s⁺⁺` from `√ŝ` and the leaf masses of everything else
    /// in the process (spec.md §4.3 `refresh_s_max`).
    pub fn refresh_s_max(&mut self, sqrt_shat: N64, other_leaf_mass_sum: N64) {
        let d = sqrt_shat - other_leaf_mass_sum;
        self.s_max = if d > 0. { d * d } else { n64(0.0) };
    }

    /// Whether `s` lies within `[s⁻⁻, s⁺⁺]` (spec.md §8 invariant 1).
    pub fn s_in_bounds(&self) -> bool {
        self.s >= self.s_min && self.s <= self.s_max
    }

    /// The two-body momentum available in the rest frame of a channel
    /// with the given `s`, decaying to two sub-channels with invariants
    /// `s1`, `s2` (spec.md §4.3 "the Källén function λ(s,s1,s2) gates
    /// t-channel bounds").
    pub fn two_body_momentum(&self, s1: N64, s2: N64) -> Option<N64> {
        sqrt_kallen(self.s, s1, s2).map(|l| l / (n64(2.0) * self.s.sqrt()))
    }
}

/// A non-owning reference to a momentum channel, held by branchings
/// (spec.md §5 "Branchings hold non-owning pointers to particle
/// channels").
pub type WeakMomentumChannel = Weak<RefCell<MomentumChannel>>;
