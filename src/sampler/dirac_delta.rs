use super::{not_normalizable, out_of_range, ValueSampler};
use crate::error::Result;
use noisy_float::prelude::*;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// `δ(s − m₀²)` (spec.md §3, §4.1).
///
/// `generate()` always returns `m₀²` with a weight of one: the
/// branching that owns this sampler is expected to bypass it entirely
/// when running in backward-`s` mode (spec.md §4.1 "treated as 'exact'
/// by the parent branching"). The nominal weight of one keeps the
/// contract usable when a caller does ask for it directly, e.g. to
/// fill in a stable external mass.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiracDelta {
    m0_sq: N64,
    xmin: N64,
    xmax: N64,
}

impl DiracDelta {
    pub fn new(m0_sq: N64) -> Self {
        Self {
            m0_sq,
            xmin: n64(f64::NEG_INFINITY),
            xmax: n64(f64::INFINITY),
        }
    }

    pub fn m0_sq(&self) -> N64 {
        self.m0_sq
    }
}

impl ValueSampler for DiracDelta {
    fn bounds(&self) -> (N64, N64) {
        (self.xmin, self.xmax)
    }

    fn set_bounds(&mut self, xmin: N64, xmax: N64) -> Result<()> {
        if self.m0_sq < xmin || self.m0_sq > xmax {
            return Err(not_normalizable(xmin, xmax));
        }
        self.xmin = xmin;
        self.xmax = xmax;
        Ok(())
    }

    fn generate(&mut self, _rng: &mut dyn RngCore) -> Result<(N64, N64)> {
        Ok((self.m0_sq, n64(1.0)))
    }

    fn evaluate_weight(&self, x: N64) -> Result<N64> {
        if (x - self.m0_sq).abs() > 1e-9 {
            return Err(out_of_range(x, self.xmin, self.xmax));
        }
        Ok(n64(1.0))
    }

    fn map(&self, _u: N64) -> N64 {
        self.m0_sq
    }

    fn inverse_map(&self, _x: N64) -> N64 {
        n64(0.5)
    }

    fn density(&self, x: N64) -> N64 {
        if (x - self.m0_sq).abs() < 1e-9 {
            n64(f64::INFINITY)
        } else {
            n64(0.0)
        }
    }

    fn kind_tag(&self) -> &'static str {
        "dirac_delta"
    }
}

pub(crate) fn integrate_delta_delta(a: &DiracDelta, b: &DiracDelta, sqrt_shat: N64) -> N64 {
    use crate::kallen::sqrt_kallen;
    sqrt_kallen(sqrt_shat * sqrt_shat, a.m0_sq, b.m0_sq).unwrap_or(n64(0.0))
}

pub(crate) fn integrate_delta_uniform(
    d: &DiracDelta,
    u: &super::Uniform,
    sqrt_shat: N64,
) -> N64 {
    use crate::kallen::sqrt_kallen;
    let (umin, umax) = u.bounds();
    const STEPS: usize = 64;
    let dstep = (umax - umin) / n64(STEPS as f64);
    let shat = sqrt_shat * sqrt_shat;
    let mut sum = n64(0.0);
    for i in 0..STEPS {
        let s2 = umin + (n64(i as f64) + n64(0.5)) * dstep;
        if let Some(l) = sqrt_kallen(shat, d.m0_sq, s2) {
            sum += l;
        }
    }
    sum * dstep
}

pub(crate) fn integrate_delta_bw(
    d: &DiracDelta,
    bw: &super::BreitWigner,
    sqrt_shat: N64,
) -> N64 {
    use crate::kallen::sqrt_kallen;
    let (bmin, bmax) = bw.bounds();
    const STEPS: usize = 64;
    let dstep = (bmax - bmin) / n64(STEPS as f64);
    let shat = sqrt_shat * sqrt_shat;
    let mut sum = n64(0.0);
    for i in 0..STEPS {
        let s2 = bmin + (n64(i as f64) + n64(0.5)) * dstep;
        if let Some(l) = sqrt_kallen(shat, d.m0_sq, s2) {
            sum += bw.density(s2) * l;
        }
    }
    sum * dstep / bw.normalization()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_returns_pole() {
        let mut d = DiracDelta::new(n64(100.0));
        d.set_bounds(n64(0.0), n64(200.0)).unwrap();
        let mut rng = rand_xoshiro::Xoshiro256Plus::seed_from_u64(0);
        use rand::SeedableRng;
        let (x, w) = d.generate(&mut rng).unwrap();
        assert_eq!(x, n64(100.0));
        assert_eq!(w, n64(1.0));
    }

    #[test]
    fn rejects_pole_outside_range() {
        let mut d = DiracDelta::new(n64(100.0));
        assert!(d.set_bounds(n64(0.0), n64(50.0)).is_err());
    }
}
