//! Invariant-mass / transverse-momentum / pseudorapidity cut surface
//! (spec.md §6 "Invariant-mass cut surface").

use std::collections::HashMap;

use noisy_float::prelude::*;

use crate::momentum::FourMomentum;

/// Registered cuts on the final-state momenta, indexed by outgoing
/// particle position. Propagated to channel bounds by
/// [`crate::process::ProcessGenerator::refresh_params`].
#[derive(Clone, Debug, Default)]
pub struct Cuts {
    /// Minimum invariant mass of a subset of outgoing legs, keyed by
    /// the sorted list of indices (spec.md §6 `set_m_min(i,j,...,m)`).
    m_min: HashMap<Vec<usize>, N64>,
    pt_min: HashMap<usize, N64>,
    eta_max: HashMap<usize, N64>,
}

impl Cuts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_m_min(&mut self, indices: &[usize], m: N64) {
        let mut key = indices.to_vec();
        key.sort_unstable();
        self.m_min.insert(key, m);
    }

    pub fn set_pt_min(&mut self, index: usize, pt: N64) {
        self.pt_min.insert(index, pt);
    }

    pub fn set_eta_max(&mut self, index: usize, eta: N64) {
        self.eta_max.insert(index, eta);
    }

    pub fn is_empty(&self) -> bool {
        self.m_min.is_empty() && self.pt_min.is_empty() && self.eta_max.is_empty()
    }

    /// Whether the given outgoing momenta (in generation order) survive
    /// every registered cut.
    pub fn passes(&self, outgoing: &[FourMomentum]) -> bool {
        for (i, pt_min) in &self.pt_min {
            let Some(p) = outgoing.get(*i) else { continue };
            if transverse_momentum(p) < *pt_min {
                return false;
            }
        }
        for (i, eta_max) in &self.eta_max {
            let Some(p) = outgoing.get(*i) else { continue };
            if pseudorapidity(p).abs() > *eta_max {
                return false;
            }
        }
        for (indices, m_min) in &self.m_min {
            let mut sum = FourMomentum::new();
            for &i in indices {
                let Some(p) = outgoing.get(i) else { continue };
                sum += *p;
            }
            if sum.signed_mass() < *m_min {
                return false;
            }
        }
        true
    }
}

fn transverse_momentum(p: &FourMomentum) -> N64 {
    let [px, py, _pz] = p.p3();
    (px * px + py * py).sqrt()
}

fn pseudorapidity(p: &FourMomentum) -> N64 {
    let [px, py, pz] = p.p3();
    let pt = (px * px + py * py).sqrt();
    let mag = (pt * pt + pz * pz).sqrt();
    if mag <= pz.abs() {
        return if pz >= 0. { n64(f64::INFINITY) } else { n64(f64::NEG_INFINITY) };
    }
    n64(0.5) * ((mag + pz) / (mag - pz)).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pt_cut_rejects_soft_particle() {
        let mut cuts = Cuts::new();
        cuts.set_pt_min(0, n64(10.0));
        let soft = FourMomentum::from_e_p3(n64(1.0), [n64(0.1), n64(0.1), n64(0.0)]);
        assert!(!cuts.passes(&[soft]));
    }

    #[test]
    fn empty_cuts_accept_everything() {
        let cuts = Cuts::new();
        let p = FourMomentum::from_e_p3(n64(1.0), [n64(0.0), n64(0.0), n64(0.0)]);
        assert!(cuts.passes(&[p]));
    }

    #[test]
    fn m_min_rejects_light_pair() {
        let mut cuts = Cuts::new();
        cuts.set_m_min(&[0, 1], n64(50.0));
        let p1 = FourMomentum::from_e_p3(n64(5.0), [n64(0.0), n64(0.0), n64(4.0)]);
        let p2 = FourMomentum::from_e_p3(n64(5.0), [n64(0.0), n64(0.0), n64(-4.0)]);
        assert!(!cuts.passes(&[p1, p2]));
    }
}
