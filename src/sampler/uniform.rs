use super::{not_normalizable, out_of_range, unit_uniform, ValueSampler};
use crate::error::Result;
use noisy_float::prelude::*;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Constant density on `[xmin, xmax]` (spec.md §3, §4.1).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Uniform {
    xmin: N64,
    xmax: N64,
}

impl Uniform {
    pub fn new() -> Self {
        Self {
            xmin: n64(0.0),
            xmax: n64(0.0),
        }
    }

    fn width(&self) -> N64 {
        self.xmax - self.xmin
    }
}

impl ValueSampler for Uniform {
    fn bounds(&self) -> (N64, N64) {
        (self.xmin, self.xmax)
    }

    fn set_bounds(&mut self, xmin: N64, xmax: N64) -> Result<()> {
        if !(xmin.raw().is_finite() && xmax.raw().is_finite()) || xmax <= xmin {
            return Err(not_normalizable(xmin, xmax));
        }
        self.xmin = xmin;
        self.xmax = xmax;
        Ok(())
    }

    fn generate(&mut self, rng: &mut dyn RngCore) -> Result<(N64, N64)> {
        let u = unit_uniform(rng);
        let x = self.map(u);
        Ok((x, self.width()))
    }

    fn evaluate_weight(&self, x: N64) -> Result<N64> {
        if x < self.xmin || x > self.xmax {
            return Err(out_of_range(x, self.xmin, self.xmax));
        }
        Ok(self.width())
    }

    fn map(&self, u: N64) -> N64 {
        self.xmin + u * self.width()
    }

    fn inverse_map(&self, x: N64) -> N64 {
        if self.width() <= 0. {
            return n64(0.0);
        }
        (x - self.xmin) / self.width()
    }

    fn density(&self, _x: N64) -> N64 {
        n64(1.0)
    }

    fn kind_tag(&self) -> &'static str {
        "uniform"
    }
}

pub(crate) fn integrate_uniform_uniform(a: &Uniform, b: &Uniform, sqrt_shat: N64) -> N64 {
    // Monte-Carlo-free Gauss-Legendre-free closed form is impractical for
    // the generic triangle function; fall back to a coarse but
    // deterministic midpoint-rule quadrature over the kinematically
    // allowed region, consistent with spec.md's "unsupported pairs
    // return 0" policy being the floor rather than the ceiling for the
    // pairs that *are* supported.
    use crate::kallen::sqrt_kallen;
    let shat = sqrt_shat * sqrt_shat;
    let (a0, a1) = a.bounds();
    let (b0, b1) = b.bounds();
    const STEPS: usize = 32;
    let mut sum = n64(0.0);
    let da = (a1 - a0) / n64(STEPS as f64);
    let db = (b1 - b0) / n64(STEPS as f64);
    for i in 0..STEPS {
        let s1 = a0 + (n64(i as f64) + n64(0.5)) * da;
        for j in 0..STEPS {
            let s2 = b0 + (n64(j as f64) + n64(0.5)) * db;
            if let Some(l) = sqrt_kallen(shat, s1, s2) {
                sum += l;
            }
        }
    }
    sum * da * db
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::tests::roundtrip_check;

    #[test]
    fn roundtrips() {
        let mut u = Uniform::new();
        u.set_bounds(n64(1.0), n64(5.0)).unwrap();
        roundtrip_check(&u, 20);
    }

    #[test]
    fn rejects_degenerate_range() {
        let mut u = Uniform::new();
        assert!(u.set_bounds(n64(3.0), n64(3.0)).is_err());
    }

    #[test]
    fn weight_matches_width() {
        let mut u = Uniform::new();
        u.set_bounds(n64(2.0), n64(10.0)).unwrap();
        use rand::SeedableRng;
        let mut rng = rand_xoshiro::Xoshiro256Plus::seed_from_u64(1);
        let (x, w) = u.generate(&mut rng).unwrap();
        assert!((w - n64(8.0)).abs() < n64(1e-10));
        assert_eq!(u.evaluate_weight(x).unwrap(), w);
    }
}
