//! Uniform sampling on a `(D-2)`-sphere for decay angles (spec.md §4.5
//! step 3: "In general D: a uniform point on the (D−2)-sphere"),
//! grounded on `include/Camgen/uni_sphere.h`.
//!
//! The concrete momentum type in this crate ([`crate::momentum::FourMomentum`])
//! is always 4-dimensional, so only the `D = 4` case (a uniform point on
//! the ordinary 2-sphere, i.e. `cos θ` uniform on `[-1,1]`, `φ` uniform
//! on `[0, 2π]`) is wired into the branching kinematics; the general-`D`
//! sampler below is kept generic so a caller working in an effective
//! lower dimension (e.g. collinear/threshold limits) can still draw a
//! properly normalized angle.

use crate::sampler::unit_uniform;
use noisy_float::prelude::*;
use rand::RngCore;

/// Polar cosine and azimuth for an isotropic two-body decay in 4-D
/// (spec.md §4.5 step 3, `D = 4`).
pub fn sample_polar_azimuth(rng: &mut dyn RngCore) -> (N64, N64) {
    let cos_theta = n64(2.0) * unit_uniform(rng) - n64(1.0);
    let phi = n64(2.0) * std::f64::consts::PI * unit_uniform(rng);
    (cos_theta, phi)
}

/// Density of [`sample_polar_azimuth`]'s output with respect to `d(cos θ) dφ`:
/// constant, `1/(4π)`.
pub fn polar_azimuth_density() -> N64 {
    n64(1.0) / (n64(4.0) * std::f64::consts::PI)
}

/// Azimuth alone, uniform on `[0, 2π)` (spec.md §4.6 step 3: "azimuthal
/// angle uniform on [0,2π]; the polar cosine is fixed by t" — unlike
/// [`sample_polar_azimuth`], t-branching's polar cosine is solved from
/// the sampled momentum transfer rather than drawn independently).
pub fn sample_azimuth(rng: &mut dyn RngCore) -> N64 {
    n64(2.0) * std::f64::consts::PI * unit_uniform(rng)
}

/// Density of [`sample_azimuth`]'s output with respect to `dφ`:
/// constant, `1/(2π)`.
pub fn azimuth_density() -> N64 {
    n64(1.0) / (n64(2.0) * std::f64::consts::PI)
}

/// A uniformly distributed unit vector on the `(dim-1)`-sphere embedded
/// in `R^dim`, via normalized Gaussian coordinates (Marsaglia's method,
/// the same approach `uni_sphere.h` uses for arbitrary dimension).
pub fn sample_unit_sphere(dim: usize, rng: &mut dyn RngCore) -> Vec<N64> {
    let mut v: Vec<N64> = (0..dim).map(|_| standard_normal(rng)).collect();
    let norm = v.iter().map(|x| *x * *x).sum::<N64>().sqrt();
    if norm > 0. {
        for x in &mut v {
            *x /= norm;
        }
    } else {
        v[0] = n64(1.0);
    }
    v
}

/// Box-Muller standard normal variate.
fn standard_normal(rng: &mut dyn RngCore) -> N64 {
    let u1 = unit_uniform(rng).max(n64(1e-300));
    let u2 = unit_uniform(rng);
    (-n64(2.0) * u1.ln()).sqrt() * (n64(2.0) * std::f64::consts::PI * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    #[test]
    fn polar_azimuth_in_range() {
        let mut rng = Xoshiro256Plus::seed_from_u64(11);
        for _ in 0..200 {
            let (c, phi) = sample_polar_azimuth(&mut rng);
            assert!(c >= -1.0 && c <= 1.0);
            assert!(phi >= 0.0 && phi < 2.0 * std::f64::consts::PI);
        }
    }

    #[test]
    fn unit_sphere_is_normalized() {
        let mut rng = Xoshiro256Plus::seed_from_u64(5);
        for _ in 0..50 {
            let v = sample_unit_sphere(3, &mut rng);
            let norm_sq: N64 = v.iter().map(|x| *x * *x).sum();
            assert!((norm_sq - n64(1.0)).abs() < n64(1e-8));
        }
    }
}
