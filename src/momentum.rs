//! Four-momenta with the mostly-minus metric used throughout the model
//! layer (spec.md §3: `s = p·p` "with the model's metric").
//!
//! Adapted from `cres`'s `FourVector` (`four_vector.rs`): same
//! `[N64; 4]` layout and operator overloads, plus the spacetime dot
//! product, boosts, and rotations that a Minkowski-metric momentum needs
//! and a purely spatial jet four-vector does not.

use noisy_float::prelude::*;
use serde::{Deserialize, Serialize};

/// A four-momentum, component 0 is energy.
#[derive(
    Deserialize, Serialize, PartialEq, Debug, Clone, Copy, Default,
)]
pub struct FourMomentum {
    p: [N64; 4],
}

impl FourMomentum {
    /// The zero momentum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct from energy and three-momentum.
    pub fn from_e_p3(e: N64, p3: [N64; 3]) -> Self {
        Self {
            p: [e, p3[0], p3[1], p3[2]],
        }
    }

    /// Energy component.
    pub fn e(&self) -> N64 {
        self.p[0]
    }

    /// Spatial three-momentum.
    pub fn p3(&self) -> [N64; 3] {
        [self.p[1], self.p[2], self.p[3]]
    }

    /// Magnitude of the spatial three-momentum.
    pub fn p3_norm(&self) -> N64 {
        self.p3_norm_sq().sqrt()
    }

    /// Squared magnitude of the spatial three-momentum.
    pub fn p3_norm_sq(&self) -> N64 {
        self.p[1] * self.p[1] + self.p[2] * self.p[2] + self.p[3] * self.p[3]
    }

    /// The Minkowski dot product `self · other` with signature (+,-,-,-).
    pub fn dot(&self, other: &FourMomentum) -> N64 {
        self.p[0] * other.p[0]
            - self.p[1] * other.p[1]
            - self.p[2] * other.p[2]
            - self.p[3] * other.p[3]
    }

    /// The invariant `s = p·p`.
    pub fn s(&self) -> N64 {
        self.dot(self)
    }

    /// The signed invariant mass `sgn(s)·sqrt(|s|)` (spec.md §3
    /// "Particle channel").
    pub fn signed_mass(&self) -> N64 {
        let s = self.s();
        if s >= 0. {
            s.sqrt()
        } else {
            -(-s).sqrt()
        }
    }

    /// Boost this momentum into the rest frame of `frame` (i.e. apply
    /// the Lorentz boost that takes `frame` to `(m,0,0,0)`), returning
    /// the boosted momentum.
    ///
    /// `frame` must be time-like (`frame.s() > 0`).
    pub fn boost_to_rest_frame_of(&self, frame: &FourMomentum) -> FourMomentum {
        let m = frame.s().sqrt();
        if m <= 0. {
            return *self;
        }
        let gamma = frame.e() / m;
        let beta = [
            frame.p[1] / frame.e(),
            frame.p[2] / frame.e(),
            frame.p[3] / frame.e(),
        ];
        let beta_sq: N64 = beta.iter().map(|b| *b * *b).sum();
        if beta_sq <= 1e-28 {
            return *self;
        }
        let p_dot_beta =
            self.p[1] * beta[0] + self.p[2] * beta[1] + self.p[3] * beta[2];
        let e = gamma * (self.p[0] - p_dot_beta);
        let coeff = (gamma - n64(1.0)) * p_dot_beta / beta_sq - gamma * self.p[0];
        let mut p3 = [n64(0.); 3];
        for i in 0..3 {
            p3[i] = self.p[i + 1] + coeff * beta[i];
        }
        FourMomentum::from_e_p3(e, p3)
    }

    /// Boost this momentum *from* the rest frame of `frame` into the
    /// frame in which `frame` itself is measured (the inverse of
    /// [`boost_to_rest_frame_of`](Self::boost_to_rest_frame_of)).
    pub fn boost_from_rest_frame_of(&self, frame: &FourMomentum) -> FourMomentum {
        let m = frame.s().sqrt();
        if m <= 0. {
            return *self;
        }
        let gamma = frame.e() / m;
        let beta = [
            -frame.p[1] / frame.e(),
            -frame.p[2] / frame.e(),
            -frame.p[3] / frame.e(),
        ];
        let beta_sq: N64 = beta.iter().map(|b| *b * *b).sum();
        if beta_sq <= 1e-28 {
            return *self;
        }
        let p_dot_beta =
            self.p[1] * beta[0] + self.p[2] * beta[1] + self.p[3] * beta[2];
        let e = gamma * (self.p[0] - p_dot_beta);
        let coeff = (gamma - n64(1.0)) * p_dot_beta / beta_sq - gamma * self.p[0];
        let mut p3 = [n64(0.); 3];
        for i in 0..3 {
            p3[i] = self.p[i + 1] + coeff * beta[i];
        }
        FourMomentum::from_e_p3(e, p3)
    }

    /// Construct a four-momentum with energy `e_in_frame`-consistent
    /// magnitude `mag`, pointing along the direction given by polar
    /// cosine `cos_theta` and azimuth `phi`, for a particle of mass
    /// `m`, measured in some rest frame.
    pub fn from_mass_mag_angles(
        m: N64,
        mag: N64,
        cos_theta: N64,
        phi: N64,
    ) -> FourMomentum {
        let sin_theta = (n64(1.0) - cos_theta * cos_theta).max(n64(0.)).sqrt();
        let e = (m * m + mag * mag).sqrt();
        let p3 = [
            mag * sin_theta * phi.cos(),
            mag * sin_theta * phi.sin(),
            mag * cos_theta,
        ];
        FourMomentum::from_e_p3(e, p3)
    }
}

impl std::ops::Index<usize> for FourMomentum {
    type Output = N64;

    fn index(&self, i: usize) -> &Self::Output {
        &self.p[i]
    }
}

impl std::ops::AddAssign for FourMomentum {
    fn add_assign(&mut self, rhs: FourMomentum) {
        for i in 0..4 {
            self.p[i] += rhs.p[i];
        }
    }
}

impl std::ops::SubAssign for FourMomentum {
    fn sub_assign(&mut self, rhs: FourMomentum) {
        for i in 0..4 {
            self.p[i] -= rhs.p[i];
        }
    }
}

impl std::ops::Add for FourMomentum {
    type Output = Self;

    fn add(mut self, rhs: FourMomentum) -> Self::Output {
        self += rhs;
        self
    }
}

impl std::ops::Sub for FourMomentum {
    type Output = Self;

    fn sub(mut self, rhs: FourMomentum) -> Self::Output {
        self -= rhs;
        self
    }
}

impl std::ops::Neg for FourMomentum {
    type Output = Self;

    fn neg(self) -> Self::Output {
        FourMomentum {
            p: self.p.map(|c| -c),
        }
    }
}

impl From<[N64; 4]> for FourMomentum {
    fn from(p: [N64; 4]) -> Self {
        FourMomentum { p }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rest_frame_roundtrip() {
        let frame = FourMomentum::from_e_p3(n64(10.0), [n64(1.0), n64(2.0), n64(3.0)]);
        let p = FourMomentum::from_e_p3(n64(4.0), [n64(0.5), n64(-0.3), n64(0.1)]);
        let boosted = p.boost_to_rest_frame_of(&frame);
        let back = boosted.boost_from_rest_frame_of(&frame);
        for i in 0..4 {
            assert!((back[i] - p[i]).abs() < n64(1e-8));
        }
    }

    #[test]
    fn s_is_mass_squared_at_rest() {
        let p = FourMomentum::from_e_p3(n64(5.0), [n64(0.), n64(0.), n64(0.)]);
        assert!((p.s() - n64(25.0)).abs() < n64(1e-10));
    }
}
