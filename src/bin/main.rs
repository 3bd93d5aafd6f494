//! Thin demo CLI around [`phasegen::process::ProcessGenerator`].
//!
//! Takes a process-specification string ("e-,e+ > mu-,mu+", spec.md §6
//! grammar), a beam energy and event count, and reports the running
//! cross-section and its Monte Carlo error. Does not implement
//! Les-Houches output; see [`phasegen::event::Event`] for the in-memory
//! record this binary only prints to stdout.

mod opt;
use opt::Opt;

use std::str::FromStr;

use clap::Parser;
use env_logger::Env;
use log::{debug, info};
use nom::{
    character::complete::{alpha1, char, multispace0},
    multi::separated_list1,
    sequence::delimited,
    IResult,
};
use noisy_float::prelude::*;
use particle_id::ParticleID;
use rand::RngCore;

use phasegen::config::{Config, InitialState};
use phasegen::model::{HelicityColourSampler, MatrixElement, NoPdf, ParticleSpecies};
use phasegen::process::ProcessGenerator;

fn particle_name(input: &str) -> IResult<&str, &str> {
    delimited(
        multispace0,
        nom::branch::alt((
            nom::bytes::complete::tag("gamma"),
            nom::bytes::complete::tag("mu-"),
            nom::bytes::complete::tag("mu+"),
            nom::bytes::complete::tag("tau-"),
            nom::bytes::complete::tag("tau+"),
            nom::bytes::complete::tag("e-"),
            nom::bytes::complete::tag("e+"),
            alpha1,
        )),
        multispace0,
    )(input)
}

fn particle_list(input: &str) -> IResult<&str, Vec<&str>> {
    separated_list1(char(','), particle_name)(input)
}

/// Parse "a,b > c,d,..." into (initial, final) particle name lists
/// (spec.md §6 "Process specification").
fn parse_process(spec: &str) -> Result<(Vec<String>, Vec<String>), String> {
    let parts: Vec<&str> = spec.split('>').collect();
    if parts.len() != 2 {
        return Err(format!("expected exactly one '>' in {spec:?}"));
    }
    let (_, initial) = particle_list(parts[0])
        .map_err(|e| format!("failed to parse initial state {:?}: {e}", parts[0]))?;
    let (_, r#final) = particle_list(parts[1])
        .map_err(|e| format!("failed to parse final state {:?}: {e}", parts[1]))?;
    Ok((
        initial.into_iter().map(str::to_owned).collect(),
        r#final.into_iter().map(str::to_owned).collect(),
    ))
}

/// A small fixed particle table standing in for a real model plugin
/// (spec.md §9 treats `Model` as opaque; this is the toy/deterministic
/// stand-in SPEC_FULL.md's CLI section calls for).
struct DemoModel;

impl DemoModel {
    fn lookup(&self, name: &str) -> Option<ParticleSpecies> {
        let mev = |m: f64| n64(m);
        Some(match name {
            "e-" => ParticleSpecies::stable(ParticleID::new(11), mev(0.000_511)),
            "e+" => ParticleSpecies::stable(ParticleID::new(-11), mev(0.000_511)),
            "mu-" => ParticleSpecies::stable(ParticleID::new(13), mev(0.105_66)),
            "mu+" => ParticleSpecies::stable(ParticleID::new(-13), mev(0.105_66)),
            "tau-" => ParticleSpecies::stable(ParticleID::new(15), mev(1.776_86)),
            "tau+" => ParticleSpecies::stable(ParticleID::new(-15), mev(1.776_86)),
            "gamma" => ParticleSpecies::stable(ParticleID::new(22), mev(0.0)),
            "Z" => ParticleSpecies::resonance(ParticleID::new(23), mev(91.1876), mev(2.4952)),
            "W+" => ParticleSpecies::resonance(ParticleID::new(24), mev(80.379), mev(2.085)),
            "W-" => ParticleSpecies::resonance(ParticleID::new(-24), mev(80.379), mev(2.085)),
            _ => return None,
        })
    }
}

struct FlatMatrixElement;
impl MatrixElement for FlatMatrixElement {
    fn evaluate(
        &self,
        _incoming: &[phasegen::momentum::FourMomentum],
        _outgoing: &[phasegen::momentum::FourMomentum],
    ) -> N64 {
        n64(1.0)
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

fn main() {
    if let Err(err) = run() {
        eprintln!("ERROR: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let opt = Opt::parse();
    let env = Env::default().filter_or("PHASEGEN_LOG", &opt.loglevel);
    env_logger::init_from_env(env);
    debug!("settings: {opt:?}");

    let (initial_names, final_names) = parse_process(&opt.process)?;
    if initial_names.len() != 1 && initial_names.len() != 2 {
        return Err(format!(
            "initial state must have 1 (decay) or 2 (scattering) particles, got {}",
            initial_names.len()
        )
        .into());
    }
    if final_names.len() < 2 {
        return Err("final state must have at least two particles".into());
    }

    let model = DemoModel;
    let incoming: Vec<ParticleSpecies> = initial_names
        .iter()
        .map(|n| model.lookup(n).ok_or_else(|| format!("unknown particle {n:?}")))
        .collect::<Result<_, _>>()?;
    let outgoing: Vec<ParticleSpecies> = final_names
        .iter()
        .map(|n| model.lookup(n).ok_or_else(|| format!("unknown particle {n:?}")))
        .collect::<Result<_, _>>()?;

    let iss = if incoming.len() == 2 {
        let initial_state = InitialState::from_str(&opt.initial_state)
            .map_err(|_| format!("unknown initial state family {:?}", opt.initial_state))?;
        Some(phasegen::initial_state::InitialStateSampler::new(
            initial_state,
            n64(opt.sqrt_s),
            incoming[0].pdg,
            incoming[1].pdg,
            n64(opt.sqrt_s * opt.sqrt_s / 4.0),
        ))
    } else {
        None
    };

    let config = Config::default();
    let mut generator = ProcessGenerator::new(
        config,
        iss,
        Box::new(NoPdf),
        Box::new(NoPdf),
        incoming,
        outgoing,
        Box::new(FlatMatrixElement),
        Box::new(NoColour),
        opt.seed,
    )?;

    if let Some(pt) = opt.min_pt {
        for i in 0..final_names.len() {
            generator.cuts_mut().set_pt_min(i, n64(pt));
        }
    }
    if let Some(eta) = opt.max_eta {
        for i in 0..final_names.len() {
            generator.cuts_mut().set_eta_max(i, n64(eta));
        }
    }

    info!("running burn-in");
    generator.burn_in()?;

    info!(
        "generating {} events for {} at sqrt(s) = {} GeV",
        opt.n_events, opt.process, opt.sqrt_s
    );

    let mut n_rejected = 0u64;
    for i in 0..opt.n_events {
        let event = generator.generate_event()?;
        if event.weight <= 0.0 {
            n_rejected += 1;
        }
        if i < 3 {
            debug!(
                "event {i}: weight = {:e}, {} outgoing particles",
                event.weight,
                event.n_outgoing()
            );
        }
    }

    let estimator = generator.estimator();
    info!(
        "cross section: {:e} +- {:e} ({} events, {} rejected)",
        estimator.mean(),
        estimator.error(),
        estimator.n_events(),
        n_rejected
    );

    Ok(())
}
