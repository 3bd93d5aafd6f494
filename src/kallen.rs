//! The Källén (triangle) function and the two-body phase-space factors
//! built from it.
//!
//! λ(a,b,c) = a² + b² + c² − 2(ab+bc+ca) governs the magnitude of the
//! back-to-back three-momentum in a 1→2 decay: |p| = √λ(s,s₁,s₂) / (2√s).

use noisy_float::prelude::*;

/// λ(a, b, c).
pub fn kallen(a: N64, b: N64, c: N64) -> N64 {
    a * a + b * b + c * c - n64(2.) * (a * b + b * c + c * a)
}

/// √λ(a, b, c), or `None` if λ < 0 (kinematically forbidden).
pub fn sqrt_kallen(a: N64, b: N64, c: N64) -> Option<N64> {
    let l = kallen(a, b, c);
    if l >= 0. {
        Some(l.sqrt())
    } else {
        None
    }
}

/// Magnitude of the common three-momentum of the two daughters in a
/// 1→2 decay with parent invariant `s` and daughter invariants `s1`,
/// `s2`, evaluated in the parent rest frame.
pub fn two_body_momentum(s: N64, s1: N64, s2: N64) -> Option<N64> {
    if s <= 0. {
        return None;
    }
    sqrt_kallen(s, s1, s2).map(|l| l / (n64(2.) * s.sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kallen_symmetric() {
        let a = n64(4.0);
        let b = n64(1.0);
        let c = n64(0.3);
        assert_eq!(kallen(a, b, c), kallen(b, c, a));
        assert_eq!(kallen(a, b, c), kallen(c, b, a));
    }

    #[test]
    fn kallen_vanishes_on_threshold() {
        // lambda(s, s1, s2) = 0 at the two-body threshold s = (sqrt(s1)+sqrt(s2))^2
        let s1 = n64(1.0);
        let s2 = n64(2.0);
        let s = (s1.sqrt() + s2.sqrt()).powi(2);
        let l = kallen(s, s1, s2);
        assert!(l.abs() < n64(1e-9));
    }

    #[test]
    fn negative_below_threshold() {
        let s1 = n64(1.0);
        let s2 = n64(2.0);
        let s = (s1.sqrt() + s2.sqrt()).powi(2) - n64(0.5);
        assert!(sqrt_kallen(s, s1, s2).is_none());
    }
}
