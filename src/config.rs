//! Configuration for bootstrap resampling.

use crate::constants::DEFAULT_CONFIDENCE_INTERVAL;

/// Configuration options for the bootstrap resampling engine.
#[derive(Debug, Clone)]
pub struct BootstrapConfig {
    /// Initial number of bootstrap resamples per interval (default: 1,000).
    pub n_resamples: usize,

    /// Sampling frequency in observations (default: 1, every observation).
    ///
    /// Raising this thins the independent-sample estimate when successive
    /// observation windows are known to be strongly correlated.
    pub samples_freq: usize,

    /// Percentile bounds of the stored confidence interval
    /// (default: [2.5, 97.5]).
    pub confidence_interval: [f64; 2],

    /// Hard ceiling on resamples per interval (default: 100,000).
    ///
    /// A distribution still failing its normality test at this point is
    /// treated as normal and a convergence warning is recorded.
    pub max_resamples: usize,

    /// Multiplier on the independent-sample estimate (default: 1).
    ///
    /// The default draws the maximum number of truly independent samples
    /// per resample. Values above 1 tighten the resampled mean but the
    /// draws are no longer independent.
    pub bootstrap_multiplier: usize,

    /// Show a progress bar while resampling (default: true).
    ///
    /// Only has an effect when the `progress` feature is enabled.
    pub progress: bool,

    /// Optional deterministic seed for resampling (default: None).
    ///
    /// With a seed set, runs are reproducible and identical between the
    /// parallel and serial engines.
    pub seed: Option<u64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            n_resamples: 1_000,
            samples_freq: 1,
            confidence_interval: DEFAULT_CONFIDENCE_INTERVAL,
            max_resamples: 100_000, // Bounds the time spent on stubbornly non-normal intervals
            bootstrap_multiplier: 1,
            progress: true,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BootstrapConfig::default();
        assert_eq!(config.n_resamples, 1_000);
        assert_eq!(config.samples_freq, 1);
        assert_eq!(config.confidence_interval, [2.5, 97.5]);
        assert_eq!(config.max_resamples, 100_000);
        assert_eq!(config.bootstrap_multiplier, 1);
        assert!(config.progress);
        assert!(config.seed.is_none());
    }
}
