use super::{not_normalizable, out_of_range, unit_uniform, ValueSampler};
use crate::error::Result;
use noisy_float::prelude::*;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// `1/cosh²(y)` with `s = m₀² cosh(2y)` (spec.md §3, §4.1).
///
/// Used for the partonic invariant mass / rapidity sampler (spec.md
/// §4.7): `y` is drawn uniformly on `[ymin, ymax]` with
/// `ymin = arccosh(xmin/m₀²)/2`, and `s` follows from the substitution.
/// Requires `xmin ≥ m₀² > 0`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InvCoshRapidity {
    m0_sq: N64,
    xmin: N64,
    xmax: N64,
    ymin: N64,
    ymax: N64,
}

impl InvCoshRapidity {
    pub fn new(m0_sq: N64) -> Self {
        Self {
            m0_sq,
            xmin: n64(0.0),
            xmax: n64(0.0),
            ymin: n64(0.0),
            ymax: n64(0.0),
        }
    }

    fn y_of(&self, x: N64) -> N64 {
        (x / self.m0_sq).acosh() / n64(2.0)
    }
}

impl ValueSampler for InvCoshRapidity {
    fn bounds(&self) -> (N64, N64) {
        (self.xmin, self.xmax)
    }

    fn set_bounds(&mut self, xmin: N64, xmax: N64) -> Result<()> {
        if xmax <= xmin || self.m0_sq <= 0. || xmin < self.m0_sq {
            return Err(not_normalizable(xmin, xmax));
        }
        self.xmin = xmin;
        self.xmax = xmax;
        self.ymin = self.y_of(xmin);
        self.ymax = self.y_of(xmax);
        if self.ymax <= self.ymin {
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
        let y = self.y_of(x);
        let ds_dy = n64(2.0) * self.m0_sq * (n64(2.0) * y).sinh();
        Ok((self.ymax - self.ymin) * ds_dy)
    }

    fn map(&self, u: N64) -> N64 {
        let y = self.ymin + u * (self.ymax - self.ymin);
        self.m0_sq * (n64(2.0) * y).cosh()
    }

    fn inverse_map(&self, x: N64) -> N64 {
        (self.y_of(x) - self.ymin) / (self.ymax - self.ymin)
    }

    fn density(&self, x: N64) -> N64 {
        let y = self.y_of(x);
        n64(1.0) / (y.cosh() * y.cosh())
    }

    fn kind_tag(&self) -> &'static str {
        "inv_cosh_rapidity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::tests::roundtrip_check;

    #[test]
    fn roundtrips() {
        let mut s = InvCoshRapidity::new(n64(100.0));
        s.set_bounds(n64(100.0), n64(10000.0)).unwrap();
        roundtrip_check(&s, 20);
    }

    #[test]
    fn rejects_xmin_below_pole() {
        let mut s = InvCoshRapidity::new(n64(100.0));
        assert!(s.set_bounds(n64(50.0), n64(10000.0)).is_err());
    }
}
