//! # diffusivity
//!
//! Estimate diffusion coefficients from molecular dynamics displacements.
//!
//! This crate turns raw particle displacements into a diffusion coefficient
//! with honest uncertainty, outputting:
//! - Bootstrap-resampled mean squared displacement per time interval
//! - Per-interval uncertainties from distributions grown until their
//!   resampled means pass a normality test
//! - A generalized least squares Einstein fit through those estimates
//! - Optionally, a posterior distribution over the coefficient itself
//!
//! ## ⚠️ Common Pitfall: Correlated Observations
//!
//! Overlapping time windows of the same trajectory are *not* independent
//! samples. The per-interval resample counts here shrink with window
//! overlap so the quoted uncertainties stay honest; feeding pre-averaged
//! displacements (one value per particle) into [`DisplacementBlock`]
//! discards that correction and understates the error bars. Always supply
//! one displacement per particle *per observation window*.
//!
//! ## Quick Start
//!
//! ```ignore
//! use diffusivity::{estimate_diffusion, LengthUnit, TimeUnit, Units};
//!
//! // delta_t: one entry per time interval; displacements: one block per interval
//! let units = Units {
//!     time: TimeUnit::Picosecond,
//!     length: LengthUnit::Angstrom,
//! };
//! let model = estimate_diffusion(&delta_t, &displacements, units)?;
//!
//! let d = model.diffusion_coefficient();
//! println!("D = {:.4e} ± {:.4e} cm^2 s^-1", d.value, d.uncertainty);
//! ```
//!
//! The estimate above is a maximum likelihood point value. For credible
//! intervals, call [`DiffusionModel::sample`] with a [`PosteriorSampler`]
//! and read the resulting [`Distribution`].

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod constants;
mod thread_pool;
mod types;

// Functional modules
pub mod analysis;
pub mod output;
pub mod statistics;

// Re-exports for public API
pub use analysis::{
    DiffusionModel, DiffusionSummary, FitError, LengthUnit, PosteriorChains, PosteriorSampler,
    SampleOptions, StraightLineFit, TimeUnit, Units, VariableEstimate,
};
pub use config::BootstrapConfig;
pub use constants::DEFAULT_CONFIDENCE_INTERVAL;
pub use statistics::{
    mscd_bootstrap, msd_bootstrap, BootstrapResult, ConvergenceWarning, Distribution,
    DistributionError,
};
pub use types::{Displacement, DisplacementBlock};

/// Any failure from the end-to-end estimation pipeline.
#[derive(Debug)]
pub enum AnalysisError {
    /// Building or growing a resampled distribution failed.
    Distribution(DistributionError),
    /// Fitting the Einstein relation through the estimates failed.
    Fit(FitError),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::Distribution(e) => write!(f, "bootstrap resampling failed: {}", e),
            AnalysisError::Fit(e) => write!(f, "diffusion fit failed: {}", e),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalysisError::Distribution(e) => Some(e),
            AnalysisError::Fit(e) => Some(e),
        }
    }
}

impl From<DistributionError> for AnalysisError {
    fn from(e: DistributionError) -> Self {
        AnalysisError::Distribution(e)
    }
}

impl From<FitError> for AnalysisError {
    fn from(e: FitError) -> Self {
        AnalysisError::Fit(e)
    }
}

/// Convenience function for estimating a diffusion coefficient with the
/// default bootstrap configuration.
///
/// This resamples the mean squared displacement at every interval, then
/// fits the Einstein relation through the resulting estimates by
/// generalized least squares.
///
/// # Arguments
///
/// * `delta_t` - Time interval lengths, one per displacement block, in the
///   trajectory's time unit
/// * `displacements` - Per-interval displacement observations
/// * `units` - Time and length units of the trajectory, used to express the
///   coefficient in cm^2 s^-1
///
/// # Returns
///
/// A fitted [`DiffusionModel`]. Its [`diffusion_coefficient`] is available
/// immediately; call [`sample`] on it for a posterior distribution.
///
/// [`diffusion_coefficient`]: DiffusionModel::diffusion_coefficient
/// [`sample`]: DiffusionModel::sample
///
/// # Errors
///
/// Returns an error if a resampled distribution cannot be built or if too
/// few intervals survive resampling to fit a line.
pub fn estimate_diffusion(
    delta_t: &[f64],
    displacements: &[DisplacementBlock],
    units: Units,
) -> Result<DiffusionModel, AnalysisError> {
    let bootstrap = msd_bootstrap(delta_t, displacements, &BootstrapConfig::default())?;
    let model = DiffusionModel::from_bootstrap(&bootstrap, units)?;
    Ok(model)
}
