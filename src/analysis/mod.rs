//! Analysis module for diffusion estimation.
//!
//! This module turns resampled per-interval statistics into a diffusion
//! coefficient:
//!
//! 1. **Straight-line fit** ([`fit`]): generalized least squares under the
//!    repaired covariance, with a multivariate normal log-likelihood
//! 2. **Likelihood maximization** ([`optimize`]): bounded differential
//!    evolution giving the posterior sampler a well-conditioned start
//! 3. **Posterior seam** ([`sampler`]): collaborator trait for external
//!    MCMC and nested-sampling engines
//! 4. **Diffusion model** ([`diffusion`]): Einstein-relation coefficient
//!    with explicit unit conversion

mod diffusion;
mod fit;
mod optimize;
mod sampler;

pub use diffusion::{DiffusionModel, DiffusionSummary, LengthUnit, TimeUnit, Units};
pub use fit::{FitError, StraightLineFit, VariableEstimate};
pub use optimize::differential_evolution;
pub use sampler::{PosteriorChains, PosteriorSampler, SampleOptions};
