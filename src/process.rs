//! The top-level process generator (spec.md §4.8).
//!
//! Orchestrates one event: initial-state sample, recursive phase-space
//! generation over the channel DAG, the external matrix-element call,
//! the running cross-section estimator, and adaptation bookkeeping.
//! Grounded on `cres::cres::Cres`'s plain-struct-plus-`build()` shape
//! (`cres.rs`), generalized from "run over a stream of input events"
//! to "generate one event at a time from phase space".

use std::cell::RefCell;
use std::rc::Rc;

use noisy_float::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

use crate::bitstring::ChannelKey;
use crate::branching::{Branching, SBranch};
use crate::channel::{ChannelArena, MomentumChannel, ParticleChannel};
use crate::config::{Config, GridMode, PhaseSpaceGeneratorKind};
use crate::cuts::Cuts;
use crate::error::{PhaseSpaceError, Result};
use crate::event::{Event, EventBuilder};
use crate::initial_state::InitialStateSampler;
use crate::model::{HelicityColourSampler, MatrixElement, ParticleSpecies, PartonDistribution};
use crate::momentum::FourMomentum;
use crate::sampler::{Adaptive, PowerLaw, Sampler, Uniform, ValueSampler};

/// Running cross-section estimator (spec.md §4.8 step vii): sum,
/// sum-of-squares and count accumulated over every event, including
/// zero-weight ones, matching the propagation policy of spec.md §7
/// ("cross-section accumulators accept zero-weight events").
#[derive(Debug, Clone, Default)]
pub struct CrossSectionEstimator {
    sum_w: N64,
    sum_w2: N64,
    n: u64,
}

impl CrossSectionEstimator {
    pub fn update(&mut self, w: N64) {
        self.sum_w += w;
        self.sum_w2 += w * w;
        self.n += 1;
    }

    pub fn mean(&self) -> N64 {
        if self.n == 0 {
            return n64(0.0);
        }
        self.sum_w / n64(self.n as f64)
    }

    /// `√(⟨w²⟩ − ⟨w⟩²)/√n` (spec.md §4.8 step vii).
    pub fn error(&self) -> N64 {
        if self.n == 0 {
            return n64(0.0);
        }
        let n = n64(self.n as f64);
        let mean = self.sum_w / n;
        let mean2 = self.sum_w2 / n;
        let variance = (mean2 - mean * mean).max(n64(0.0));
        (variance / n).sqrt()
    }

    pub fn n_events(&self) -> u64 {
        self.n
    }
}

/// Orchestrates phase-space generation for one process (spec.md §4.8).
///
/// The channel DAG this builds by default is the simplest topology that
/// realizes every component spec.md names — a sequential s-branching
/// chain peeling off one outgoing particle at a time (root → (leg₀,
/// remainder₁) → (leg₁, remainder₂) → ... → (leg_{n−2}, leg_{n−1})).
/// This alone reproduces the 2-body and sequential-decay scenarios of
/// spec.md §8 directly (a 2-body final state collapses to the single
/// root branching). Genuinely multi-topology processes (spec.md §8
/// scenario 6, "≥ 8 topologies") are supported by the data model
/// ([`crate::mixture::Mixture<Branching>`] accepts any number of
/// alternative branchings per node) but discovering those alternative
/// topologies from a [`crate::model::Model`]'s vertex list is a
/// combinatorial search outside this constructor's scope; callers that
/// need it can append extra [`Branching`] alternatives to any node via
/// [`ParticleChannel::insert_branching`] before generating events.
pub struct ProcessGenerator {
    config: Config,
    /// `None` for a decay (single incoming leg, root momentum fixed by
    /// the decaying particle's own mass) rather than a 2-beam scatter
    /// (spec.md §6 grammar: the initial state is "1 or 2" particles).
    initial_state: Option<InitialStateSampler>,
    pdf1: Box<dyn PartonDistribution>,
    pdf2: Box<dyn PartonDistribution>,
    matrix_element: Box<dyn MatrixElement>,
    helicity_colour: Box<dyn HelicityColourSampler>,
    arena: ChannelArena,
    incoming_species: Vec<ParticleSpecies>,
    incoming_channels: Vec<Rc<RefCell<MomentumChannel>>>,
    outgoing_species: Vec<ParticleSpecies>,
    outgoing_channels: Vec<Rc<RefCell<ParticleChannel>>>,
    /// Every particle channel in the tree (root, internal remainders,
    /// leaves), for grid adaptation (spec.md §4.8 "every B_gr events
    /// each value sampler's grid adapts").
    all_channels: Vec<Rc<RefCell<ParticleChannel>>>,
    /// Particle channels that own a branching mixture, for channel
    /// adaptation (spec.md §4.8 "every B_ch events the mixture adapt()
    /// runs on every node"), paired with the index of the first
    /// outgoing leg each one's invariant mass still spans (`start` in
    /// [`build_chain`]) — recursion builds a daughter's subtree before
    /// its own node, so this does not equal the vector's position.
    internal_channels: Vec<(usize, Rc<RefCell<ParticleChannel>>)>,
    root: Rc<RefCell<ParticleChannel>>,
    cuts: Cuts,
    estimator: CrossSectionEstimator,
    events_since_channel_adapt: u32,
    events_since_grid_adapt: u32,
    rng: Xoshiro256Plus,
}

impl ProcessGenerator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Config,
        initial_state: Option<InitialStateSampler>,
        pdf1: Box<dyn PartonDistribution>,
        pdf2: Box<dyn PartonDistribution>,
        incoming_species: Vec<ParticleSpecies>,
        outgoing_species: Vec<ParticleSpecies>,
        matrix_element: Box<dyn MatrixElement>,
        helicity_colour: Box<dyn HelicityColourSampler>,
        seed: u64,
    ) -> Result<Self> {
        let n_in = incoming_species.len();
        if n_in != 1 && n_in != 2 {
            return Err(PhaseSpaceError::ProcessParseError(
                "initial state must have 1 (decay) or 2 (scattering) particles".into(),
            ));
        }
        if n_in == 2 && initial_state.is_none() {
            return Err(PhaseSpaceError::ProcessParseError(
                "a 2-particle initial state needs an initial-state sampler".into(),
            ));
        }
        if n_in == 1 && initial_state.is_some() {
            return Err(PhaseSpaceError::ProcessParseError(
                "a 1-particle (decay) initial state takes no initial-state sampler".into(),
            ));
        }
        let n_out = outgoing_species.len();
        if n_out < 2 {
            return Err(PhaseSpaceError::ProcessParseError(
                "process generator needs at least a 2-body final state".into(),
            ));
        }
        let n_total = (n_in + n_out) as u8;
        let xi = config.multichannel_adaptivity;
        let prune = config.multichannel_threshold;
        let grid_mode = config.grid_mode;
        let grid_bins = config.grid_bins as usize;
        let aux_nu = config.default_exponents.auxiliary;
        let shat_nu = config.default_exponents.s_hat;
        let pair_mode = config.s_pair_generation_mode;
        let max_tries = config.max_init_rejects;

        let mut arena = ChannelArena::new();
        let incoming_channels: Vec<_> = (0..n_in)
            .map(|i| arena.get_or_insert(ChannelKey::external(i as u8, n_total, n_in as u8)))
            .collect();

        let outgoing_keys: Vec<ChannelKey> = (0..n_out)
            .map(|i| ChannelKey::external((n_in + i) as u8, n_total, n_in as u8))
            .collect();

        let mut outgoing_channels = Vec::with_capacity(n_out);
        let mut all_channels = Vec::new();
        for (i, species) in outgoing_species.iter().enumerate() {
            let mc = arena.get_or_insert(outgoing_keys[i]);
            let sampler = leaf_sampler(species)?;
            let pc = ParticleChannel::new(
                format!("out[{i}]"),
                Some(*species),
                &mc,
                sampler,
                xi,
                prune,
            );
            mc.borrow_mut().add_particle_channel(pc.clone());
            outgoing_channels.push(pc.clone());
            all_channels.push(pc);
        }

        let mut internal_channels = Vec::new();
        let root = build_chain(
            0,
            &outgoing_keys,
            &outgoing_channels,
            &mut arena,
            xi,
            prune,
            aux_nu,
            shat_nu,
            grid_mode,
            grid_bins,
            pair_mode,
            max_tries,
            true,
            &mut internal_channels,
            &mut all_channels,
        );

        let mut gen = Self {
            config,
            initial_state,
            pdf1,
            pdf2,
            matrix_element,
            helicity_colour,
            arena,
            incoming_species,
            incoming_channels,
            outgoing_species,
            outgoing_channels,
            all_channels,
            internal_channels,
            root,
            cuts: Cuts::new(),
            estimator: CrossSectionEstimator::default(),
            events_since_channel_adapt: 0,
            events_since_grid_adapt: 0,
            rng: Xoshiro256Plus::seed_from_u64(seed),
        };
        gen.refresh_params()?;
        Ok(gen)
    }

    pub fn cuts_mut(&mut self) -> &mut Cuts {
        &mut self.cuts
    }

    pub fn estimator(&self) -> &CrossSectionEstimator {
        &self.estimator
    }

    pub fn arena(&self) -> &ChannelArena {
        &self.arena
    }

    /// Recompute channel `[s⁻,s⁺]` bounds and re-bind every sampler's
    /// range (spec.md §4.8, §9 "`apply_config()` ... invokes
    /// `refresh_params()`"). Multi-leg invariant-mass/pT/η cuts are
    /// enforced post-hoc in [`Self::generate_event`] rather than
    /// inverted into channel bounds here, since that inversion is not
    /// generally well-defined for an arbitrary topology; only the
    /// leaf/root mass bounds below are tightened.
    pub fn refresh_params(&mut self) -> Result<()> {
        let sqrt_shat_max = match &self.initial_state {
            Some(iss) => iss.max_shat().sqrt(),
            // Decay: the total available energy is fixed by the
            // decaying particle's own mass, at rest.
            None => self.incoming_species[0].mass,
        };
        let total_mass = self
            .outgoing_species
            .iter()
            .map(|s| s.mass)
            .sum::<N64>();

        for (idx, pc) in self.outgoing_channels.iter().enumerate() {
            let species = self.outgoing_species[idx];
            if let Some(mc) = pc.borrow().momentum_channel() {
                mc.borrow_mut().refresh_s_min(species.mass_min * species.mass_min);
                let other = total_mass - species.mass;
                mc.borrow_mut().refresh_s_max(sqrt_shat_max, other);
            }
        }

        for (start, pc) in &self.internal_channels {
            let start = *start;
            let remaining_mass: N64 = self.outgoing_species[start..].iter().map(|s| s.mass).sum();
            let consumed_mass: N64 = self.outgoing_species[..start].iter().map(|s| s.mass).sum();
            if let Some(mc) = pc.borrow().momentum_channel() {
                mc.borrow_mut().refresh_s_min(remaining_mass * remaining_mass);
                mc.borrow_mut().refresh_s_max(sqrt_shat_max, consumed_mass);
                let (s_min, s_max) = mc.borrow().bounds();
                if s_max <= s_min {
                    return Err(PhaseSpaceError::EmptyPhaseSpace);
                }
                pc.borrow_mut().restrict_sampler(s_min, s_max)?;
            }
        }
        Ok(())
    }

    pub fn apply_config(&mut self, config: Config) -> Result<()> {
        self.config = config;
        self.refresh_params()
    }

    /// Run the initial burn-in (spec.md §4 "an initial burn of N0 events
    /// without [incremental] adaptation seeds grids and mixture
    /// statistics", spec.md §6 `channel_init`/`grid_init`): generate a
    /// batch of events, then adapt once, repeated for the configured
    /// number of iterations, separately for the mixture selectors and
    /// for the adaptive grids. The cross-section estimator is reset
    /// afterwards so burn-in events (drawn before the mixtures/grids
    /// have settled, and so disproportionately high-variance) do not
    /// bias the run's reported cross-section.
    pub fn burn_in(&mut self) -> Result<()> {
        let channel_init = self.config.channel_init;
        for _ in 0..channel_init.iterations {
            for _ in 0..channel_init.batch_size {
                self.generate_event()?;
            }
            for (_, pc) in &self.internal_channels {
                pc.borrow_mut().adapt_mixture();
            }
        }

        let grid_init = self.config.grid_init;
        for _ in 0..grid_init.iterations {
            for _ in 0..grid_init.batch_size {
                self.generate_event()?;
            }
            for pc in &self.all_channels {
                pc.borrow_mut().adapt_grid();
            }
        }

        self.estimator = CrossSectionEstimator::default();
        self.events_since_channel_adapt = 0;
        self.events_since_grid_adapt = 0;
        Ok(())
    }

    /// Generate one event (spec.md §4.8 steps i-viii).
    pub fn generate_event(&mut self) -> Result<Event> {
        let (incoming_momenta, w_beam): (Vec<FourMomentum>, N64) = match &self.initial_state {
            Some(iss) => {
                let backward = matches!(
                    self.config.phase_space_generator,
                    PhaseSpaceGeneratorKind::RecursiveBackwardS
                        | PhaseSpaceGeneratorKind::RecursiveBackwardSHat
                );
                let (p1, p2, w) = if backward {
                    let (s_hat, w_shat) = self.root.borrow_mut().generate_mass(&mut self.rng)?;
                    let (p1, p2, w_pdf) = iss.generate_backward(
                        s_hat,
                        &mut self.rng,
                        self.pdf1.as_ref(),
                        self.pdf2.as_ref(),
                    )?;
                    (p1, p2, w_pdf * w_shat)
                } else {
                    let (p1, p2, w_pdf) =
                        iss.generate_forward(&mut self.rng, self.pdf1.as_ref(), self.pdf2.as_ref())?;
                    (p1, p2, w_pdf)
                };
                (vec![p1, p2], w)
            }
            // Decay: the root momentum is the decaying particle at rest,
            // not drawn from any beam/PDF sampler.
            None => {
                let m = self.incoming_species[0].mass;
                (vec![FourMomentum::from_e_p3(m, [n64(0.0), n64(0.0), n64(0.0)])], n64(1.0))
            }
        };

        for (ch, p) in self.incoming_channels.iter().zip(&incoming_momenta) {
            ch.borrow_mut().set_momentum(*p);
        }
        let p_total = incoming_momenta
            .iter()
            .fold(FourMomentum::new(), |acc, p| acc + *p);
        if let Some(root_mc) = self.root.borrow().momentum_channel() {
            root_mc.borrow_mut().set_momentum(p_total);
        }

        let mut path = Vec::new();
        let w_ps = match ParticleChannel::generate_subtree(&self.root, &mut self.rng, &mut path) {
            Ok(w) => w,
            Err(e) => {
                log::debug!("event rejected during phase-space generation: {e}");
                self.estimator.update(n64(0.0));
                return Ok(self.zero_weight_event());
            }
        };

        let outgoing_momenta: Vec<FourMomentum> = self
            .outgoing_channels
            .iter()
            .map(|pc| pc.borrow().momentum_channel().unwrap().borrow().momentum())
            .collect();

        if !self.cuts.passes(&outgoing_momenta) {
            self.estimator.update(n64(0.0));
            return Ok(self.zero_weight_event());
        }

        let (w_helcol, colours) = self
            .helicity_colour
            .sample(&mut self.rng, &self.outgoing_species);

        let rho_evt = self.matrix_element.evaluate(&incoming_momenta, &outgoing_momenta);
        let w_evt = rho_evt * w_ps * w_helcol * w_beam;

        self.estimator.update(w_evt);

        for (channel, idx) in &path {
            channel.borrow_mut().record_mixture(*idx, w_evt);
        }
        for pc in &self.all_channels {
            pc.borrow_mut().record_grid(w_evt);
        }

        self.events_since_channel_adapt += 1;
        self.events_since_grid_adapt += 1;
        if self.config.auto_channel_adapt > 0
            && self.events_since_channel_adapt >= self.config.auto_channel_adapt
        {
            for (_, pc) in &self.internal_channels {
                pc.borrow_mut().adapt_mixture();
            }
            self.events_since_channel_adapt = 0;
        }
        if self.config.auto_grid_adapt > 0
            && self.events_since_grid_adapt >= self.config.auto_grid_adapt
        {
            for pc in &self.all_channels {
                pc.borrow_mut().adapt_grid();
            }
            self.events_since_grid_adapt = 0;
        }

        let mut builder = EventBuilder::new();
        for (species, p) in self.incoming_species.iter().zip(&incoming_momenta) {
            builder.add_incoming(species.pdg, *p);
        }
        for (i, pc) in self.outgoing_channels.iter().enumerate() {
            let p = pc.borrow().momentum_channel().unwrap().borrow().momentum();
            let colour = colours.get(i).copied().unwrap_or((0, 0));
            builder.add_outgoing(self.outgoing_species[i].pdg, p, colour);
        }
        builder
            .weight(w_evt)
            .cross_section(self.estimator.mean(), self.estimator.error())
            .channel(
                self.root
                    .borrow()
                    .momentum_channel()
                    .map(|mc| mc.borrow().key())
                    .unwrap_or_else(|| ChannelKey::root(0, 0)),
            );
        Ok(builder.build())
    }

    fn zero_weight_event(&self) -> Event {
        let mut builder = EventBuilder::new();
        builder
            .weight(n64(0.0))
            .cross_section(self.estimator.mean(), self.estimator.error());
        builder.build()
    }
}

fn leaf_sampler(species: &ParticleSpecies) -> Result<Sampler> {
    if species.is_narrow() {
        let mut d = crate::sampler::DiracDelta::new(species.mass_sq());
        d.set_bounds(n64(0.0), n64(f64::INFINITY))?;
        Ok(Sampler::DiracDelta(d))
    } else {
        let mut bw = crate::sampler::BreitWigner::new(species.mass_sq(), species.width);
        let lo = (species.mass_min * species.mass_min).max(n64(0.0));
        let hi = species.mass_max * species.mass_max;
        bw.set_bounds(lo, hi)?;
        Ok(Sampler::BreitWigner(bw))
    }
}

/// Build the sequential s-branching chain described in
/// [`ProcessGenerator`]'s doc comment, returning the root particle
/// channel representing the sum of `outgoing_keys[start..]`.
#[allow(clippy::too_many_arguments)]
fn build_chain(
    start: usize,
    outgoing_keys: &[ChannelKey],
    outgoing_channels: &[Rc<RefCell<ParticleChannel>>],
    arena: &mut ChannelArena,
    xi: f64,
    prune: f64,
    aux_nu: f64,
    shat_nu: f64,
    grid_mode: GridMode,
    grid_bins: usize,
    pair_mode: crate::config::SPairGenerationMode,
    max_tries: u32,
    is_root: bool,
    internal_channels: &mut Vec<(usize, Rc<RefCell<ParticleChannel>>)>,
    all_channels: &mut Vec<Rc<RefCell<ParticleChannel>>>,
) -> Rc<RefCell<ParticleChannel>> {
    if start == outgoing_keys.len() - 1 {
        return outgoing_channels[start].clone();
    }

    let mut key = outgoing_keys[start];
    for k in &outgoing_keys[start + 1..] {
        key = ChannelKey::union(&key, k);
    }
    let mc = arena.get_or_insert(key);

    let daughter2 = build_chain(
        start + 1,
        outgoing_keys,
        outgoing_channels,
        arena,
        xi,
        prune,
        aux_nu,
        shat_nu,
        grid_mode,
        grid_bins,
        pair_mode,
        max_tries,
        false,
        internal_channels,
        all_channels,
    );

    let exponent = if is_root { shat_nu } else { aux_nu };
    let base = Sampler::PowerLaw(PowerLaw::new(n64(0.0), n64(exponent)));
    let sampler = Sampler::Adaptive(Adaptive::new(base, grid_mode, grid_bins.max(1)));
    let name = if is_root {
        "root".to_string()
    } else {
        format!("remainder[{start}]")
    };
    let pc = ParticleChannel::new(name, None, &mc, sampler, xi, prune);

    let branching = Branching::SBranch(SBranch::new(
        &mc,
        outgoing_channels[start].clone(),
        daughter2,
        pair_mode,
        max_tries,
    ));
    pc.borrow_mut().insert_branching(branching);
    mc.borrow_mut().add_particle_channel(pc.clone());

    internal_channels.push((start, pc.clone()));
    all_channels.push(pc.clone());
    pc
}

/// Uniform value sampler fallback, exported for callers constructing a
/// bespoke channel tree by hand rather than via [`ProcessGenerator::new`]'s
/// default chain (e.g. to add a genuine t-channel alternative).
pub fn flat_sampler(xmin: N64, xmax: N64) -> Result<Sampler> {
    let mut u = Uniform::new();
    u.set_bounds(xmin, xmax)?;
    Ok(Sampler::Uniform(u))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NoPdf, PartonDistribution};
    use particle_id::ParticleID;
    use rand::RngCore;

    struct FlatMatrixElement(N64);
    impl MatrixElement for FlatMatrixElement {
        fn evaluate(&self, _incoming: &[FourMomentum], _outgoing: &[FourMomentum]) -> N64 {
            self.0
        }
    }

    struct NoColour;
    impl HelicityColourSampler for NoColour {
        fn sample(
            &mut self,
            _rng: &mut dyn RngCore,
            species: &[ParticleSpecies],
        ) -> (N64, Vec<(i32, i32)>) {
            (n64(1.0), vec![(0, 0); species.len()])
        }
    }

    fn two_body_generator() -> ProcessGenerator {
        let config = Config::default();
        let beam = ParticleSpecies::stable(ParticleID::new(11), n64(0.000511));
        let antibeam = ParticleSpecies::stable(ParticleID::new(-11), n64(0.000511));
        let mu = ParticleSpecies::stable(ParticleID::new(13), n64(0.10566));
        let antimu = ParticleSpecies::stable(ParticleID::new(-13), n64(0.10566));
        let initial_state = InitialStateSampler::new(
            crate::config::InitialState::EpEm,
            n64(500.0),
            beam.pdg,
            antibeam.pdg,
            n64(250.0 * 250.0),
        );
        ProcessGenerator::new(
            config,
            Some(initial_state),
            Box::new(NoPdf),
            Box::new(NoPdf),
            vec![beam, antibeam],
            vec![mu, antimu],
            Box::new(FlatMatrixElement(n64(1.0))),
            Box::new(NoColour),
            42,
        )
        .unwrap()
    }

    fn decay_generator() -> ProcessGenerator {
        let config = Config::default();
        let higgs = ParticleSpecies::stable(ParticleID::new(25), n64(125.25));
        let gamma1 = ParticleSpecies::stable(ParticleID::new(22), n64(0.0));
        let gamma2 = ParticleSpecies::stable(ParticleID::new(22), n64(0.0));
        ProcessGenerator::new(
            config,
            None,
            Box::new(NoPdf),
            Box::new(NoPdf),
            vec![higgs],
            vec![gamma1, gamma2],
            Box::new(FlatMatrixElement(n64(1.0))),
            Box::new(NoColour),
            7,
        )
        .unwrap()
    }

    #[test]
    fn decay_produces_finite_positive_weight_and_conserves_momentum() {
        let mut gen = decay_generator();
        for _ in 0..20 {
            let ev = gen.generate_event().unwrap();
            assert!(ev.weight.raw().is_finite());
            assert!(ev.weight >= 0.0);
            if ev.weight <= 0.0 {
                continue;
            }
            assert_eq!(ev.incoming.len(), 1);
            let mut sum = FourMomentum::new();
            for (_, p) in &ev.incoming {
                sum += *p;
            }
            for (_, p) in &ev.outgoing {
                sum -= *p;
            }
            for i in 0..4 {
                assert!(sum[i].abs() < n64(1e-6));
            }
        }
    }

    #[test]
    fn two_body_decay_produces_finite_positive_weight() {
        let mut gen = two_body_generator();
        for _ in 0..20 {
            let ev = gen.generate_event().unwrap();
            assert!(ev.weight.raw().is_finite());
            assert!(ev.weight >= 0.0);
        }
        assert!(gen.estimator().n_events() == 20);
    }

    #[test]
    fn burn_in_resets_the_estimator() {
        let mut gen = two_body_generator();
        gen.config.channel_init = crate::config::BurnIn {
            iterations: 2,
            batch_size: 5,
        };
        gen.config.grid_init = crate::config::BurnIn {
            iterations: 2,
            batch_size: 5,
        };
        gen.burn_in().unwrap();
        assert_eq!(gen.estimator().n_events(), 0);
        gen.generate_event().unwrap();
        assert_eq!(gen.estimator().n_events(), 1);
    }

    #[test]
    fn momentum_is_conserved() {
        let mut gen = two_body_generator();
        for _ in 0..10 {
            let ev = gen.generate_event().unwrap();
            if ev.weight <= 0.0 {
                continue;
            }
            let mut sum = FourMomentum::new();
            for (_, p) in &ev.incoming {
                sum += *p;
            }
            for (_, p) in &ev.outgoing {
                sum -= *p;
            }
            for i in 0..4 {
                assert!(sum[i].abs() < n64(1e-6));
            }
        }
    }
}
