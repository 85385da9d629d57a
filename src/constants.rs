//! Numerical constants shared across the analysis pipeline.

/// Significance level for the normality tests on bootstrap distributions.
///
/// A distribution is treated as normal when the test p-value exceeds this.
pub const NORMALITY_ALPHA: f64 = 0.05;

/// Largest sample count handled by the Shapiro-Wilk test.
///
/// Above this the W statistic saturates and p-values become unreliable, so
/// the D'Agostino K-squared omnibus test takes over.
pub const SHAPIRO_MAX_SAMPLES: usize = 5000;

/// Minimum sample count for any normality test to run.
///
/// Below this a distribution is always reported as non-normal.
pub const MIN_NORMALITY_SAMPLES: usize = 3;

/// Number of resamples added per growth round while a bootstrap
/// distribution is still failing its normality test.
pub const RESAMPLE_GROWTH: usize = 100;

/// Default percentile bounds of the reported confidence interval, the
/// central 95% band.
pub const DEFAULT_CONFIDENCE_INTERVAL: [f64; 2] = [2.5, 97.5];

/// Denominator of the Einstein relation for a three-dimensional random
/// walk: MSD(t) = 2 d D t with d = 3.
pub const EINSTEIN_DENOMINATOR: f64 = 6.0;

/// ln(2 pi), used in Gaussian log-likelihoods.
pub const LOG_2PI: f64 = 1.837_877_066_409_345_3;

/// Hard cap on diagonal-loading rounds in the positive-definite repair.
///
/// The perturbation grows quadratically per round, so hitting this cap
/// implies non-finite input rather than slow convergence.
pub const MAX_REPAIR_ITERATIONS: usize = 100;
