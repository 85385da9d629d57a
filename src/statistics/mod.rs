//! Statistical methods for displacement analysis.
//!
//! This module provides the core statistical infrastructure for diffusivity:
//! - Quantile computation using efficient O(n) selection algorithms
//! - Adaptive bootstrap resampling of correlated displacement observations
//! - Sample distributions with online normality assessment
//! - Covariance repair to the nearest positive definite matrix

mod bootstrap;
mod covariance;
mod distribution;
mod normality;
mod quantile;

pub use bootstrap::{
    counter_rng_seed, mscd_bootstrap, msd_bootstrap, BootstrapResult, ConvergenceWarning,
};
pub use covariance::{diagonal_covariance, is_positive_definite, nearest_positive_definite};
pub use distribution::{Distribution, DistributionError};
pub use normality::{dagostino_k2, is_normal, shapiro_wilk, NormalityResult};
pub use quantile::{compute_percentile, percentile_sorted};
