use std::cell::RefCell;
use std::rc::{Rc, Weak};

use noisy_float::prelude::*;
use rand::RngCore;

use super::{kinematically_forbidden, Branch};
use crate::angular::{azimuth_density, sample_azimuth};
use crate::channel::{MomentumChannel, ParticleChannel};
use crate::error::{PhaseSpaceError, Result};
use crate::kallen::sqrt_kallen;
use crate::momentum::FourMomentum;

/// Space-like exchange branching (spec.md §4.6), grounded on the
/// t-type momentum branching covered by `include/Camgen/s_branch.h`.
///
/// The incoming space-like channel and its `recoil` companion (the
/// time-like system it is scattering against) together form a valid
/// time-like combined system, `p_in + p_recoil`; splitting that system
/// into the time-like daughter and the next space-like propagator is
/// then exactly the same back-to-back two-body kinematics as
/// [`super::SBranch`], just evaluated in the combined system's rest
/// frame. This is exact for the leading rung of a multiperipheral
/// ladder; `recoil`'s own further resolution is driven by whatever
/// other branching owns it, not by this one.
#[derive(Clone)]
pub struct TBranch {
    incoming: Weak<RefCell<MomentumChannel>>,
    recoil: Weak<RefCell<MomentumChannel>>,
    daughter_timelike: Rc<RefCell<ParticleChannel>>,
    daughter_spacelike: Rc<RefCell<ParticleChannel>>,
}

impl TBranch {
    pub fn new(
        incoming: &Rc<RefCell<MomentumChannel>>,
        recoil: &Rc<RefCell<MomentumChannel>>,
        daughter_timelike: Rc<RefCell<ParticleChannel>>,
        daughter_spacelike: Rc<RefCell<ParticleChannel>>,
    ) -> Self {
        Self {
            incoming: Rc::downgrade(incoming),
            recoil: Rc::downgrade(recoil),
            daughter_timelike,
            daughter_spacelike,
        }
    }

    fn combined(&self) -> Result<(FourMomentum, N64)> {
        let incoming = self.incoming.upgrade().ok_or(PhaseSpaceError::NoSuchChannel)?;
        let recoil = self.recoil.upgrade().ok_or(PhaseSpaceError::NoSuchChannel)?;
        let p = incoming.borrow().momentum() + recoil.borrow().momentum();
        let s = p.dot(&p);
        Ok((p, s))
    }
}

impl TBranch {
    /// Solve the 2→2 momentum-transfer relation for the polar cosine
    /// between the incoming channel's direction and the time-like
    /// daughter's, given the sampled space-like invariant `t` (spec.md
    /// §4.6 step 3: "the polar cosine is fixed by t").
    ///
    /// `t = (p_incoming - p3)² = s_in + m3² − 2 E_in E3 + 2 |p_in||p3| cos θ`,
    /// all four-momenta measured in the combined (incoming + recoil)
    /// rest frame, so `cos θ = (t − s_in − m3² + 2 E_in E3) / (2 |p_in||p3|)`.
    fn solve_cos_theta(
        p_inc_cm: &FourMomentum,
        s_in: N64,
        e3: N64,
        mag3: N64,
        m3_sq: N64,
        t: N64,
    ) -> Result<N64> {
        let mag_in = p_inc_cm.p3_norm();
        if mag_in <= 0. || mag3 <= 0. {
            return Err(kinematically_forbidden(s_in, m3_sq, t));
        }
        let cos_theta =
            (t - s_in - m3_sq + n64(2.0) * p_inc_cm.e() * e3) / (n64(2.0) * mag_in * mag3);
        if cos_theta < -1. || cos_theta > 1. {
            return Err(kinematically_forbidden(s_in, m3_sq, t));
        }
        Ok(cos_theta)
    }
}

impl Branch for TBranch {
    fn generate(&mut self, rng: &mut dyn RngCore) -> Result<N64> {
        let incoming = self
            .incoming
            .upgrade()
            .ok_or(PhaseSpaceError::NoSuchChannel)?;
        let (p_combined, s_combined) = self.combined()?;
        if s_combined <= 0. {
            return Err(kinematically_forbidden(s_combined, n64(0.0), n64(0.0)));
        }

        let (m3_sq, w3) = self.daughter_timelike.borrow_mut().generate_mass(rng)?;
        let (t, wt) = self.daughter_spacelike.borrow_mut().generate_mass(rng)?;

        let sqrt_lambda = sqrt_kallen(s_combined, m3_sq, t)
            .ok_or_else(|| kinematically_forbidden(s_combined, m3_sq, t))?;
        let sqrt_s = s_combined.sqrt();
        let mag = sqrt_lambda / (n64(2.0) * sqrt_s);
        let e3 = (m3_sq + mag * mag).sqrt();

        let s_in = incoming.borrow().s();
        let p_inc_cm = incoming.borrow().momentum().boost_to_rest_frame_of(&p_combined);
        let cos_theta = Self::solve_cos_theta(&p_inc_cm, s_in, e3, mag, m3_sq, t)?;
        let phi = sample_azimuth(rng);
        let angle_weight = n64(1.0) / azimuth_density();

        let beam_dir = normalize3(p_inc_cm.p3());
        let (perp1, perp2) = perpendicular_basis(beam_dir);
        let sin_theta = (n64(1.0) - cos_theta * cos_theta).max(n64(0.0)).sqrt();
        let dir = [
            cos_theta * beam_dir[0] + sin_theta * (phi.cos() * perp1[0] + phi.sin() * perp2[0]),
            cos_theta * beam_dir[1] + sin_theta * (phi.cos() * perp1[1] + phi.sin() * perp2[1]),
            cos_theta * beam_dir[2] + sin_theta * (phi.cos() * perp1[2] + phi.sin() * perp2[2]),
        ];

        let p3_rest = FourMomentum::from_e_p3(e3, [mag * dir[0], mag * dir[1], mag * dir[2]]);
        let p4_rest = FourMomentum::from_e_p3(
            sqrt_s - e3,
            [-mag * dir[0], -mag * dir[1], -mag * dir[2]],
        );

        let p3 = p3_rest.boost_from_rest_frame_of(&p_combined);
        let p4 = p4_rest.boost_from_rest_frame_of(&p_combined);

        let jacobian = sqrt_lambda / (n64(8.0) * std::f64::consts::PI * s_combined);

        if let Some(mc) = self.daughter_timelike.borrow().momentum_channel() {
            mc.borrow_mut().set_momentum(p3);
        }
        if let Some(mc) = self.daughter_spacelike.borrow().momentum_channel() {
            mc.borrow_mut().set_momentum(p4);
        }

        Ok(jacobian * w3 * wt * angle_weight)
    }

    fn evaluate_branching_weight(&self) -> Result<N64> {
        let (_p_combined, s_combined) = self.combined()?;
        let m3_sq = self
            .daughter_timelike
            .borrow()
            .momentum_channel()
            .map(|mc| mc.borrow().s())
            .unwrap_or(n64(0.0));
        let t = self
            .daughter_spacelike
            .borrow()
            .momentum_channel()
            .map(|mc| mc.borrow().s())
            .unwrap_or(n64(0.0));
        let sqrt_lambda = sqrt_kallen(s_combined, m3_sq, t)
            .ok_or_else(|| kinematically_forbidden(s_combined, m3_sq, t))?;
        let jacobian = sqrt_lambda / (n64(8.0) * std::f64::consts::PI * s_combined);
        let w3 = self.daughter_timelike.borrow().evaluate_mass_weight(m3_sq)?;
        let wt = self.daughter_spacelike.borrow().evaluate_mass_weight(t)?;
        let angle_weight = n64(1.0) / azimuth_density();
        Ok(jacobian * w3 * wt * angle_weight)
    }

    fn daughters(&self) -> (Rc<RefCell<ParticleChannel>>, Rc<RefCell<ParticleChannel>>) {
        (self.daughter_timelike.clone(), self.daughter_spacelike.clone())
    }

    fn incoming(&self) -> Option<Rc<RefCell<MomentumChannel>>> {
        self.incoming.upgrade()
    }
}

/// Normalize a 3-vector; a zero vector is mapped to the z-axis, which
/// only occurs if the incoming channel is exactly at rest in the
/// combined frame (a measure-zero edge case).
fn normalize3(v: [N64; 3]) -> [N64; 3] {
    let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
    if norm > 0. {
        [v[0] / norm, v[1] / norm, v[2] / norm]
    } else {
        [n64(0.0), n64(0.0), n64(1.0)]
    }
}

fn cross3(a: [N64; 3], b: [N64; 3]) -> [N64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// An arbitrary orthonormal pair spanning the plane perpendicular to
/// `axis`, used to place the azimuth angle around the incoming
/// direction since [`FourMomentum::from_mass_mag_angles`]'s implicit
/// z-axis has no relation to that direction.
fn perpendicular_basis(axis: [N64; 3]) -> ([N64; 3], [N64; 3]) {
    let seed = if axis[0].abs() < n64(0.9) {
        [n64(1.0), n64(0.0), n64(0.0)]
    } else {
        [n64(0.0), n64(1.0), n64(0.0)]
    };
    let perp1 = normalize3(cross3(axis, seed));
    let perp2 = cross3(axis, perp1);
    (perp1, perp2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstring::ChannelKey;
    use crate::sampler::{DiracDelta, Sampler};
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn orthonormal_basis_is_orthonormal() {
        let axis = normalize3([n64(0.3), n64(-0.7), n64(2.1)]);
        let (p1, p2) = perpendicular_basis(axis);
        let dot = |a: [N64; 3], b: [N64; 3]| a[0] * b[0] + a[1] * b[1] + a[2] * b[2];
        assert!((dot(axis, p1)).abs() < n64(1e-9));
        assert!((dot(axis, p2)).abs() < n64(1e-9));
        assert!((dot(p1, p2)).abs() < n64(1e-9));
        assert!((dot(p1, p1) - n64(1.0)).abs() < n64(1e-9));
        assert!((dot(p2, p2) - n64(1.0)).abs() < n64(1e-9));
    }

    fn fixed_mass_channel(key: ChannelKey, mass: N64) -> Rc<RefCell<ParticleChannel>> {
        let mc = MomentumChannel::new(key);
        let sampler = Sampler::DiracDelta(DiracDelta::new(mass * mass));
        ParticleChannel::new(format!("{key:?}"), None, &mc, sampler, 1.0, 0.0)
    }

    #[test]
    fn generate_conserves_momentum_and_is_on_shell() {
        let incoming_mc = MomentumChannel::new(ChannelKey::external(0, 4, 2));
        incoming_mc
            .borrow_mut()
            .set_momentum(FourMomentum::from_e_p3(n64(50.0), [n64(0.0), n64(0.0), n64(50.0)]));
        let recoil_mc = MomentumChannel::new(ChannelKey::external(1, 4, 2));
        recoil_mc.borrow_mut().set_momentum(FourMomentum::from_e_p3(
            n64(150.0),
            [n64(0.0), n64(0.0), n64(-50.0)],
        ));

        let daughter_timelike = fixed_mass_channel(ChannelKey::external(2, 4, 2), n64(1.0));
        let daughter_spacelike = fixed_mass_channel(ChannelKey::external(3, 4, 2), n64(0.0));
        let mut branch = TBranch::new(
            &incoming_mc,
            &recoil_mc,
            daughter_timelike.clone(),
            daughter_spacelike.clone(),
        );

        let mut rng = Xoshiro256Plus::seed_from_u64(42);
        let mut n_ok = 0;
        for _ in 0..50 {
            if let Ok(w) = branch.generate(&mut rng) {
                assert!(w.raw().is_finite());
                assert!(w >= 0.0);
                n_ok += 1;
                let p3 = daughter_timelike
                    .borrow()
                    .momentum_channel()
                    .unwrap()
                    .borrow()
                    .momentum();
                let p4 = daughter_spacelike
                    .borrow()
                    .momentum_channel()
                    .unwrap()
                    .borrow()
                    .momentum();
                let total_in = incoming_mc.borrow().momentum() + recoil_mc.borrow().momentum();
                let total_out = p3 + p4;
                for i in 0..4 {
                    assert!((total_in[i] - total_out[i]).abs() < n64(1e-6));
                }
            }
        }
        assert!(n_ok > 0);
    }
}
