use std::cell::RefCell;
use std::rc::{Rc, Weak};

use noisy_float::prelude::*;
use rand::RngCore;

use super::{kinematically_forbidden, Branch};
use crate::angular::{polar_azimuth_density, sample_polar_azimuth};
use crate::channel::{MomentumChannel, ParticleChannel};
use crate::config::SPairGenerationMode;
use crate::error::{PhaseSpaceError, Result};
use crate::kallen::sqrt_kallen;
use crate::momentum::FourMomentum;

/// Time-like 1→2 decay branching (spec.md §4.5), grounded on
/// `include/Camgen/s_branch.h`.
#[derive(Clone)]
pub struct SBranch {
    incoming: Weak<RefCell<MomentumChannel>>,
    daughter1: Rc<RefCell<ParticleChannel>>,
    daughter2: Rc<RefCell<ParticleChannel>>,
    mode: SPairGenerationMode,
    max_tries: u32,
}

impl SBranch {
    pub fn new(
        incoming: &Rc<RefCell<MomentumChannel>>,
        daughter1: Rc<RefCell<ParticleChannel>>,
        daughter2: Rc<RefCell<ParticleChannel>>,
        mode: SPairGenerationMode,
        max_tries: u32,
    ) -> Self {
        Self {
            incoming: Rc::downgrade(incoming),
            daughter1,
            daughter2,
            mode,
            max_tries,
        }
    }

    fn sample_masses(&mut self, rng: &mut dyn RngCore, s_in: N64) -> Result<(N64, N64, N64)> {
        match self.mode {
            SPairGenerationMode::Asymmetric => {
                let (s1, w1) = self.daughter1.borrow_mut().generate_mass(rng)?;
                let m1 = s1.max(n64(0.0)).sqrt();
                let remaining = s_in.sqrt() - m1;
                if remaining <= 0. {
                    return Err(kinematically_forbidden(s_in, s1, n64(0.0)));
                }
                let cap = remaining * remaining;
                // Re-derive from the channel's physical bounds (set once per
                // `refresh_params()` call) rather than the sampler's current
                // bounds, which this same restriction would otherwise shrink
                // monotonically across events and never widen back out.
                let physical_bounds = self
                    .daughter2
                    .borrow()
                    .momentum_channel()
                    .map(|mc| mc.borrow().bounds())
                    .unwrap_or_else(|| self.daughter2.borrow().sampler_bounds());
                self.daughter2
                    .borrow_mut()
                    .restrict_sampler(physical_bounds.0, physical_bounds.1.min(cap))?;
                let (s2, w2) = self.daughter2.borrow_mut().generate_mass(rng)?;
                Ok((s1, s2, w1 * w2))
            }
            SPairGenerationMode::Symmetric => {
                let (s1, w1) = self.daughter1.borrow_mut().generate_mass(rng)?;
                let (s2, w2) = self.daughter2.borrow_mut().generate_mass(rng)?;
                Ok((s1, s2, w1 * w2))
            }
            SPairGenerationMode::HitAndMiss => {
                for tried in 0..self.max_tries {
                    let (s1, w1) = self.daughter1.borrow_mut().generate_mass(rng)?;
                    let (s2, w2) = self.daughter2.borrow_mut().generate_mass(rng)?;
                    if sqrt_kallen(s_in, s1, s2).is_some() {
                        return Ok((s1, s2, w1 * w2));
                    }
                    if tried + 1 == self.max_tries {
                        return Err(PhaseSpaceError::RejectionLimitExceeded { tried: tried + 1 });
                    }
                }
                unreachable!()
            }
        }
    }
}

impl Branch for SBranch {
    fn generate(&mut self, rng: &mut dyn RngCore) -> Result<N64> {
        let incoming = self
            .incoming
            .upgrade()
            .ok_or(PhaseSpaceError::NoSuchChannel)?;
        let (s_in, p_in) = {
            let inc = incoming.borrow();
            (inc.s(), inc.momentum())
        };
        if s_in <= 0. {
            return Err(kinematically_forbidden(s_in, n64(0.0), n64(0.0)));
        }

        let (s1, s2, s_pair_weight) = self.sample_masses(rng, s_in)?;

        let sqrt_lambda = sqrt_kallen(s_in, s1, s2)
            .ok_or_else(|| kinematically_forbidden(s_in, s1, s2))?;
        let sqrt_s_in = s_in.sqrt();
        let mag = sqrt_lambda / (n64(2.0) * sqrt_s_in);

        let (cos_theta, phi) = sample_polar_azimuth(rng);
        let angle_weight = n64(1.0) / polar_azimuth_density();

        let m1 = s1.max(n64(0.0)).sqrt();
        let m2 = s2.max(n64(0.0)).sqrt();
        let p1_rest = FourMomentum::from_mass_mag_angles(m1, mag, cos_theta, phi);
        let p2_rest = FourMomentum::from_mass_mag_angles(m2, -mag, cos_theta, phi);

        let p1 = p1_rest.boost_from_rest_frame_of(&p_in);
        let p2 = p2_rest.boost_from_rest_frame_of(&p_in);

        let two_body_volume = sqrt_lambda / (n64(8.0) * std::f64::consts::PI * s_in);

        if let Some(mc) = self.daughter1.borrow().momentum_channel() {
            mc.borrow_mut().set_momentum(p1);
        }
        if let Some(mc) = self.daughter2.borrow().momentum_channel() {
            mc.borrow_mut().set_momentum(p2);
        }

        Ok(two_body_volume * s_pair_weight * angle_weight)
    }

    fn evaluate_branching_weight(&self) -> Result<N64> {
        let incoming = self
            .incoming
            .upgrade()
            .ok_or(PhaseSpaceError::NoSuchChannel)?;
        let s_in = incoming.borrow().s();
        let s1 = self
            .daughter1
            .borrow()
            .momentum_channel()
            .map(|mc| mc.borrow().s())
            .unwrap_or(n64(0.0));
        let s2 = self
            .daughter2
            .borrow()
            .momentum_channel()
            .map(|mc| mc.borrow().s())
            .unwrap_or(n64(0.0));
        let sqrt_lambda =
            sqrt_kallen(s_in, s1, s2).ok_or_else(|| kinematically_forbidden(s_in, s1, s2))?;
        let two_body_volume = sqrt_lambda / (n64(8.0) * std::f64::consts::PI * s_in);
        let w1 = self.daughter1.borrow().evaluate_mass_weight(s1)?;
        let w2 = self.daughter2.borrow().evaluate_mass_weight(s2)?;
        let angle_weight = n64(1.0) / polar_azimuth_density();
        Ok(two_body_volume * w1 * w2 * angle_weight)
    }

    fn daughters(&self) -> (Rc<RefCell<ParticleChannel>>, Rc<RefCell<ParticleChannel>>) {
        (self.daughter1.clone(), self.daughter2.clone())
    }

    fn incoming(&self) -> Option<Rc<RefCell<MomentumChannel>>> {
        self.incoming.upgrade()
    }
}

