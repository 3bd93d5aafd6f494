//! Multi-channel mixture selector (spec.md §3 "Mixture selector", §4.2).
//!
//! Grounded on the running cross-section bookkeeping in `a-maier-cres`'s
//! `DefaultResampler::resample` (`src/resampler.rs`): per-alternative
//! sum and event-count accumulators, folded into a weight update at the
//! end of a batch rather than after every draw.

use noisy_float::prelude::*;
use serde::{Deserialize, Serialize};

/// Running statistics for one alternative in a [`Mixture`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct ChannelStats {
    alpha: N64,
    hits: u64,
    /// `S_k`: accumulated `α_k · w_mix · ρ_evt` contributions (spec.md
    /// §4.2 `update(integrand)`).
    sum: N64,
}

impl ChannelStats {
    fn mean_contribution(&self) -> N64 {
        if self.hits == 0 {
            return n64(0.0);
        }
        self.sum / n64(self.hits as f64)
    }

    fn reset(&mut self) {
        self.hits = 0;
        self.sum = n64(0.0);
    }
}

/// A finite, ordered set of alternatives selected with adapting
/// probabilities `α_k` (spec.md §3 "Mixture selector").
///
/// `T` is whatever the mixture is choosing between — a branching, an
/// initial-state channel, anything with its own generation cost. The
/// mixture itself only owns the probabilities and statistics; the
/// caller drives generation of the chosen alternative.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mixture<T> {
    alternatives: Vec<T>,
    stats: Vec<ChannelStats>,
    /// Exponent `ξ ∈ [0,1]` controlling how aggressively weights track
    /// variance (spec.md §3: "update α_k proportional to a power ... of
    /// the running variance contribution").
    xi: N64,
    /// Alternatives with `α_k` below this threshold are pruned on
    /// adaptation.
    prune_threshold: N64,
}

impl<T> Mixture<T> {
    /// `xi` is `Config::multichannel_adaptivity`, `prune_threshold` is
    /// `Config::multichannel_threshold` (spec.md §6).
    pub fn new(alternatives: Vec<T>, xi: f64, prune_threshold: f64) -> Self {
        let n = alternatives.len().max(1);
        let alpha0 = n64(1.0) / n64(n as f64);
        let stats = (0..alternatives.len())
            .map(|_| ChannelStats {
                alpha: alpha0,
                ..Default::default()
            })
            .collect();
        Self {
            alternatives,
            stats,
            xi: n64(xi),
            prune_threshold: n64(prune_threshold),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    pub fn alternative(&self, idx: usize) -> &T {
        &self.alternatives[idx]
    }

    pub fn alternative_mut(&mut self, idx: usize) -> &mut T {
        &mut self.alternatives[idx]
    }

    pub fn weight(&self, idx: usize) -> N64 {
        self.stats[idx].alpha
    }

    /// Append a new alternative (spec.md §4.4 `insert_branching`),
    /// rebalancing every `α_k` back to a flat distribution — adaptation
    /// has not had a chance to learn anything about the newcomer yet.
    pub fn insert(&mut self, alternative: T) {
        self.alternatives.push(alternative);
        self.stats.push(ChannelStats::default());
        let n = n64(self.alternatives.len() as f64);
        for s in &mut self.stats {
            s.alpha = n64(1.0) / n;
        }
    }

    /// Remove the alternative at `idx` (spec.md §4.4
    /// `remove_branching`), renormalizing the remaining weights.
    pub fn remove(&mut self, idx: usize) -> T {
        let removed = self.alternatives.remove(idx);
        self.stats.remove(idx);
        let total: N64 = self.stats.iter().map(|s| s.alpha).sum();
        if total > 0. {
            for s in &mut self.stats {
                s.alpha /= total;
            }
        }
        removed
    }

    /// Swap in a new alternative at `idx`, keeping its current weight
    /// and statistics (spec.md §4.4 `replace_branching`).
    pub fn replace(&mut self, idx: usize, alternative: T) -> T {
        std::mem::replace(&mut self.alternatives[idx], alternative)
    }

    /// Choose an alternative by its current `α_k`, given a uniform
    /// variate `r ∈ [0,1)`. Returns the chosen index and the
    /// probability it was drawn with (needed for the multi-channel
    /// weight, spec.md §4.8).
    pub fn select(&self, r: N64) -> (usize, N64) {
        let mut cumulative = n64(0.0);
        for (i, stats) in self.stats.iter().enumerate() {
            cumulative += stats.alpha;
            if r < cumulative {
                return (i, stats.alpha);
            }
        }
        let last = self.stats.len() - 1;
        (last, self.stats[last].alpha)
    }

    /// The probability density spec.md §4.8 folds into the multi-channel
    /// weight for an alternative assumed already chosen.
    pub fn probability_of(&self, idx: usize) -> N64 {
        self.stats[idx].alpha
    }

    /// `w_mix = (∑_k α_k · w_k⁻¹(x))⁻¹` (spec.md §4.2 `evaluate_weight`):
    /// combine every alternative's weight at the point the selected one
    /// produced. `eval(i)` should return `None` when alternative `i`'s
    /// weight at `x` is undefined (e.g. `x` outside its support).
    pub fn combined_weight<F>(&self, eval: F) -> N64
    where
        F: Fn(usize) -> Option<N64>,
    {
        let mut denom = n64(0.0);
        for (i, stats) in self.stats.iter().enumerate() {
            if stats.alpha <= 0. {
                continue;
            }
            if let Some(w) = eval(i) {
                if w > 0. {
                    denom += stats.alpha / w;
                }
            }
        }
        if denom > 0. {
            n64(1.0) / denom
        } else {
            n64(0.0)
        }
    }

    /// Feed `α_k · w_mix · ρ_evt` for the realized path's alternative
    /// `idx` into its running mean (spec.md §4.2 `update(integrand)`,
    /// §3 "Lifecycle": "every event updates all generator statistics
    /// along the selected path").
    pub fn record(&mut self, idx: usize, contribution: N64) {
        let s = &mut self.stats[idx];
        s.sum += contribution;
        s.hits += 1;
    }

    /// `α_k ← (S_k/n_k)^ξ`, renormalize, then drop alternatives whose
    /// new weight falls below the prune threshold (spec.md §4.2
    /// `adapt()`).
    ///
    /// Pruned alternatives are removed from both `alternatives` and the
    /// parallel `stats` vector; callers that cache indices into a
    /// mixture across an `adapt()` call must re-resolve them.
    pub fn adapt(&mut self) {
        if self.alternatives.len() <= 1 {
            for s in &mut self.stats {
                s.reset();
            }
            return;
        }
        let raw: Vec<N64> = self
            .stats
            .iter()
            .map(|s| s.mean_contribution().powf(self.xi).max(n64(1e-300)))
            .collect();
        let total: N64 = raw.iter().copied().sum();
        for (s, r) in self.stats.iter_mut().zip(raw.iter()) {
            s.alpha = r / total;
        }

        if self
            .stats
            .iter()
            .any(|s| s.alpha < self.prune_threshold)
        {
            let keep: Vec<bool> = self
                .stats
                .iter()
                .map(|s| s.alpha >= self.prune_threshold)
                .collect();
            if keep.iter().any(|&k| k) {
                let old_stats = std::mem::take(&mut self.stats);
                let old_alts = std::mem::take(&mut self.alternatives);
                let mut kept_alts = Vec::with_capacity(old_alts.len());
                let mut kept_stats = Vec::with_capacity(old_stats.len());
                for (i, (alt, stat)) in old_alts.into_iter().zip(old_stats).enumerate() {
                    if keep[i] {
                        kept_alts.push(alt);
                        kept_stats.push(stat);
                    }
                }
                let total: N64 = kept_stats.iter().map(|s| s.alpha).sum();
                for s in &mut kept_stats {
                    s.alpha /= total;
                }
                self.alternatives = kept_alts;
                self.stats = kept_stats;
            }
        }

        for s in &mut self.stats {
            s.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        let m = Mixture::new(vec![1u8, 2, 3], 0.5, 1e-6);
        let total: N64 = (0..m.len()).map(|i| m.weight(i)).sum();
        assert!((total - n64(1.0)).abs() < n64(1e-12));
    }

    #[test]
    fn select_respects_cumulative_bounds() {
        let m = Mixture::new(vec!["a", "b"], 0.5, 1e-6);
        let (idx0, _) = m.select(n64(0.0));
        assert_eq!(idx0, 0);
        let (idx1, _) = m.select(n64(0.999));
        assert_eq!(idx1, 1);
    }

    #[test]
    fn adapt_favors_higher_variance_alternative() {
        let mut m = Mixture::new(vec!["low", "high"], 0.5, 1e-6);
        for _ in 0..20 {
            m.record(0, n64(1.0));
            m.record(1, n64(1.0));
        }
        for _ in 0..20 {
            m.record(1, n64(10.0));
        }
        m.adapt();
        assert!(m.weight(1) > m.weight(0));
    }
}
