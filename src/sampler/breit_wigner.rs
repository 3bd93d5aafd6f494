use super::{not_normalizable, out_of_range, unit_uniform, ValueSampler};
use crate::error::Result;
use noisy_float::prelude::*;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// `ρ(s) = [(s − m₀²)² + (m₀Γ)²]⁻¹` (spec.md §3, §4.1).
///
/// Sampled via the tangent substitution `u ↔ arctan((s − m₀²)/(m₀Γ))`
/// (spec.md §4.1): always normalizable, even over an unbounded range,
/// since `arctan` is bounded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BreitWigner {
    m0_sq: N64,
    width: N64,
    xmin: N64,
    xmax: N64,
    /// `m0 * Gamma`, cached.
    scale: N64,
    /// `Z = ∫ ρ ds` over `[xmin, xmax]`.
    z: N64,
    theta_min: N64,
    theta_max: N64,
}

impl BreitWigner {
    pub fn new(m0_sq: N64, width: N64) -> Self {
        let scale = m0_sq.sqrt() * width;
        Self {
            m0_sq,
            width,
            xmin: n64(f64::NEG_INFINITY),
            xmax: n64(f64::INFINITY),
            scale,
            z: n64(0.0),
            theta_min: n64(0.0),
            theta_max: n64(0.0),
        }
    }

    fn theta(&self, x: N64) -> N64 {
        ((x - self.m0_sq) / self.scale).atan()
    }

    pub(crate) fn normalization(&self) -> N64 {
        self.z
    }
}

impl ValueSampler for BreitWigner {
    fn bounds(&self) -> (N64, N64) {
        (self.xmin, self.xmax)
    }

    fn set_bounds(&mut self, xmin: N64, xmax: N64) -> Result<()> {
        if xmax <= xmin || self.scale <= 0. {
            return Err(not_normalizable(xmin, xmax));
        }
        self.xmin = xmin;
        self.xmax = xmax;
        self.theta_min = self.theta(xmin);
        self.theta_max = self.theta(xmax);
        self.z = self.scale * (self.theta_max - self.theta_min);
        if !(self.z.raw().is_finite()) || self.z <= 0. {
            return Err(not_normalizable(xmin, xmax));
        }
        Ok(())
    }

    fn generate(&mut self, rng: &mut dyn RngCore) -> Result<(N64, N64)> {
        let u = unit_uniform(rng);
        let x = self.map(u);
        let w = self.evaluate_weight(x)?;
        Ok((x, w))
    }

    fn evaluate_weight(&self, x: N64) -> Result<N64> {
        if x < self.xmin || x > self.xmax {
            return Err(out_of_range(x, self.xmin, self.xmax));
        }
        Ok(self.z / self.density(x))
    }

    fn map(&self, u: N64) -> N64 {
        let theta = self.theta_min + u * (self.theta_max - self.theta_min);
        self.m0_sq + self.scale * theta.tan()
    }

    fn inverse_map(&self, x: N64) -> N64 {
        (self.theta(x) - self.theta_min) / (self.theta_max - self.theta_min)
    }

    fn density(&self, x: N64) -> N64 {
        let d = x - self.m0_sq;
        n64(1.0) / (d * d + self.scale * self.scale)
    }

    fn kind_tag(&self) -> &'static str {
        "breit_wigner"
    }
}

pub(crate) fn integrate_uniform_bw(
    u: &super::Uniform,
    bw: &BreitWigner,
    sqrt_shat: N64,
) -> N64 {
    use crate::kallen::sqrt_kallen;
    let (umin, umax) = u.bounds();
    let (bmin, bmax) = bw.bounds();
    const STEPS: usize = 48;
    let du = (umax - umin) / n64(STEPS as f64);
    let db = (bmax - bmin) / n64(STEPS as f64);
    let shat = sqrt_shat * sqrt_shat;
    let mut sum = n64(0.0);
    for i in 0..STEPS {
        let s1 = umin + (n64(i as f64) + n64(0.5)) * du;
        for j in 0..STEPS {
            let s2 = bmin + (n64(j as f64) + n64(0.5)) * db;
            if let Some(l) = sqrt_kallen(shat, s1, s2) {
                sum += bw.density(s2) * l;
            }
        }
    }
    sum * du * db / bw.z
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::tests::roundtrip_check;

    #[test]
    fn roundtrips() {
        let mut bw = BreitWigner::new(n64(80.0 * 80.0), n64(2.0));
        bw.set_bounds(n64(0.0), n64(20000.0)).unwrap();
        roundtrip_check(&bw, 20);
    }

    #[test]
    fn always_normalizable_on_infinite_range() {
        let mut bw = BreitWigner::new(n64(80.0 * 80.0), n64(2.0));
        assert!(bw
            .set_bounds(n64(f64::NEG_INFINITY), n64(f64::INFINITY))
            .is_ok());
    }

    #[test]
    fn peaks_at_pole() {
        let mut bw = BreitWigner::new(n64(100.0), n64(1.0));
        bw.set_bounds(n64(0.0), n64(400.0)).unwrap();
        assert!(bw.density(n64(100.0)) > bw.density(n64(300.0)));
    }
}
