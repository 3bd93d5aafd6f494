use super::{not_normalizable, out_of_range, unit_uniform, ValueSampler};
use crate::error::Result;
use noisy_float::prelude::*;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// `ρ(s) = |s − m₀²|^−ν` (spec.md §3, §4.1).
///
/// The antiderivative of `|t|^−ν` away from the pole `t = 0` is
/// `G(d) = d^(1−ν) / (1−ν)` for `ν ≠ 1` and `ln(d)` for `ν = 1`; both
/// diverge as `d → 0`, so a range whose pole sits in its interior is
/// only normalizable for `ν < 1`, and a range extending to infinity
/// is only normalizable for `ν > 1`. `map`/`inverse_map` split the
/// domain at the pole and invert each branch separately, mirroring
/// `pl_s_generator`'s three regimes in `include/Camgen/s_gen.h`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PowerLaw {
    m0_sq: N64,
    nu: N64,
    xmin: N64,
    xmax: N64,
    /// Whether the pole lies inside `[xmin, xmax]`.
    straddles: bool,
    /// Normalization integral on the left branch (pole-inside case) or
    /// the sole branch (pole-outside case).
    left: N64,
    /// Normalization integral on the right branch (only used when
    /// `straddles`).
    right: N64,
    z: N64,
}

impl PowerLaw {
    pub fn new(m0_sq: N64, nu: N64) -> Self {
        Self {
            m0_sq,
            nu,
            xmin: n64(0.0),
            xmax: n64(0.0),
            straddles: false,
            left: n64(0.0),
            right: n64(0.0),
            z: n64(0.0),
        }
    }

    fn g(&self, d: N64) -> N64 {
        if d <= 0. {
            return n64(0.0);
        }
        if (self.nu - 1.0).abs() < 1e-12 {
            d.ln()
        } else {
            d.powf(n64(1.0) - self.nu) / (n64(1.0) - self.nu)
        }
    }

    fn g_inv(&self, y: N64) -> N64 {
        if (self.nu - 1.0).abs() < 1e-12 {
            y.exp()
        } else {
            (y * (n64(1.0) - self.nu)).powf(n64(1.0) / (n64(1.0) - self.nu))
        }
    }
}

impl ValueSampler for PowerLaw {
    fn bounds(&self) -> (N64, N64) {
        (self.xmin, self.xmax)
    }

    fn set_bounds(&mut self, xmin: N64, xmax: N64) -> Result<()> {
        if xmax <= xmin {
            return Err(not_normalizable(xmin, xmax));
        }
        let c = self.m0_sq;
        let straddles = xmin < c && c < xmax;
        let touches_pole = xmin == c || xmax == c || straddles;
        let infinite = !xmin.raw().is_finite() || !xmax.raw().is_finite();

        if touches_pole && self.nu >= 1.0 {
            return Err(not_normalizable(xmin, xmax));
        }
        if infinite && self.nu <= 1.0 {
            return Err(not_normalizable(xmin, xmax));
        }

        if straddles {
            self.left = self.g(c - xmin);
            self.right = self.g(xmax - c);
            self.z = self.left + self.right;
        } else {
            // single branch: sign(t) constant over the whole range
            let (lo, hi) = if xmax <= c {
                (c - xmax, c - xmin)
            } else {
                (xmin - c, xmax - c)
            };
            self.left = self.g(hi) - self.g(lo);
            self.right = n64(0.0);
            self.z = self.left;
        }
        self.straddles = straddles;
        if !self.z.raw().is_finite() || self.z <= 0. {
            return Err(not_normalizable(xmin, xmax));
        }
        self.xmin = xmin;
        self.xmax = xmax;
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
        let c = self.m0_sq;
        let target = u * self.z;
        if self.straddles {
            if target <= self.left {
                let d = self.g_inv(self.left - target);
                c - d
            } else {
                let d = self.g_inv(target - self.left);
                c + d
            }
        } else if self.xmax <= c {
            // descending branch: s in [xmin, xmax], distance from pole
            // decreases as s increases
            let (_, hi) = (c - self.xmax, c - self.xmin);
            let d = self.g_inv(self.g(hi) - target);
            c - d
        } else {
            let lo = self.xmin - c;
            let d = self.g_inv(target + self.g(lo));
            c + d
        }
    }

    fn inverse_map(&self, x: N64) -> N64 {
        let c = self.m0_sq;
        let target = if self.straddles {
            if x <= c {
                self.left - self.g(c - x)
            } else {
                self.left + self.g(x - c)
            }
        } else if self.xmax <= c {
            self.g(c - self.xmin) - self.g(c - x)
        } else {
            self.g(x - c) - self.g(self.xmin - c)
        };
        target / self.z
    }

    fn density(&self, x: N64) -> N64 {
        (x - self.m0_sq).abs().powf(-self.nu)
    }

    fn kind_tag(&self) -> &'static str {
        "power_law"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::tests::roundtrip_check;

    #[test]
    fn roundtrips_pole_outside() {
        let mut pl = PowerLaw::new(n64(0.0), n64(1.2));
        pl.set_bounds(n64(10.0), n64(1000.0)).unwrap();
        roundtrip_check(&pl, 20);
    }

    #[test]
    fn roundtrips_pole_inside() {
        let mut pl = PowerLaw::new(n64(50.0), n64(0.5));
        pl.set_bounds(n64(0.0), n64(100.0)).unwrap();
        roundtrip_check(&pl, 20);
    }

    #[test]
    fn rejects_nu_geq_one_with_pole_inside() {
        let mut pl = PowerLaw::new(n64(50.0), n64(1.0));
        assert!(pl.set_bounds(n64(0.0), n64(100.0)).is_err());
    }

    #[test]
    fn rejects_infinite_range_with_nu_leq_one() {
        let mut pl = PowerLaw::new(n64(0.0), n64(0.8));
        assert!(pl
            .set_bounds(n64(10.0), n64(f64::INFINITY))
            .is_err());
    }
}
