//! Posterior sampling seam.
//!
//! MCMC and nested-sampling engines live outside this crate. The fit layer
//! hands an implementation its log-likelihood and a starting point; the
//! sampler returns per-variable chains that the fit folds into
//! [`Distribution`](crate::statistics::Distribution)s.

use serde::{Deserialize, Serialize};

/// Options forwarded verbatim to the posterior sampler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleOptions {
    /// Number of walkers or parallel chains (default: 100).
    pub walkers: usize,
    /// Posterior samples to keep after burn-in (default: 500).
    pub n_samples: usize,
    /// Steps discarded before collection starts (default: 500).
    pub burn_in: usize,
    /// Show sampling progress (default: true).
    pub progress: bool,
    /// Seed for deterministic sampling. `None` draws fresh entropy.
    pub seed: Option<u64>,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            walkers: 100,
            n_samples: 500,
            burn_in: 500,
            progress: true,
            seed: None,
        }
    }
}

/// Flattened posterior chains, one per fit variable.
#[derive(Debug, Clone)]
pub struct PosteriorChains {
    /// `chains[v]` holds every kept sample of variable `v`, walkers
    /// concatenated.
    pub chains: Vec<Vec<f64>>,
}

/// Posterior sampling collaborator.
///
/// Implementations receive the fit's log-likelihood, a starting point
/// (normally the maximum-likelihood solution), and the forwarded options,
/// and must return one chain per starting-point variable.
pub trait PosteriorSampler {
    /// Draw posterior samples of the fit variables.
    fn sample(
        &self,
        log_likelihood: &dyn Fn(&[f64]) -> f64,
        start: &[f64],
        options: &SampleOptions,
    ) -> PosteriorChains;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = SampleOptions::default();
        assert_eq!(options.walkers, 100);
        assert_eq!(options.n_samples, 500);
        assert_eq!(options.burn_in, 500);
        assert!(options.progress);
        assert_eq!(options.seed, None);
    }

    #[test]
    fn test_options_serialization_round_trip() {
        let options = SampleOptions {
            walkers: 8,
            n_samples: 50,
            burn_in: 10,
            progress: false,
            seed: Some(3),
        };
        let json = serde_json::to_string(&options).unwrap();
        let back: SampleOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(back.walkers, 8);
        assert_eq!(back.seed, Some(3));
    }
}
