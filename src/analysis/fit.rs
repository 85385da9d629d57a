//! Weighted straight-line fitting of per-interval means.
//!
//! The resampled means at each time interval come with asymmetric
//! uncertainties; fitting the Einstein line to them takes a generalized
//! least squares estimate weighted by the repaired covariance of those
//! uncertainties. The same covariance drives a multivariate normal
//! log-likelihood handed to the optimizer and the posterior sampler.

use std::fmt;

use nalgebra::{Cholesky, DMatrix, DVector, Dyn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::analysis::optimize::differential_evolution;
use crate::analysis::sampler::{PosteriorSampler, SampleOptions};
use crate::constants::{DEFAULT_CONFIDENCE_INTERVAL, LOG_2PI};
use crate::statistics::{diagonal_covariance, nearest_positive_definite, Distribution};

/// Point estimate and one-sigma uncertainty of a fit variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariableEstimate {
    /// Estimated value.
    pub value: f64,
    /// One standard deviation uncertainty.
    pub uncertainty: f64,
}

/// Errors raised by the fit layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    /// Input arrays differ in length.
    LengthMismatch {
        /// Length of the abscissa array.
        abscissa: usize,
        /// Length of the ordinate array.
        ordinate: usize,
        /// Length of the uncertainty array.
        uncertainty: usize,
    },
    /// Fewer than two points were supplied.
    TooFewPoints {
        /// Number of points available.
        available: usize,
    },
    /// A posterior accessor was called before sampling.
    NotSampled,
}

impl fmt::Display for FitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FitError::LengthMismatch {
                abscissa,
                ordinate,
                uncertainty,
            } => write!(
                f,
                "input arrays must share a length (abscissa {}, ordinate {}, uncertainty {})",
                abscissa, ordinate, uncertainty
            ),
            FitError::TooFewPoints { available } => write!(
                f,
                "a straight line needs at least two points, got {}",
                available
            ),
            FitError::NotSampled => {
                write!(f, "posterior distributions are only available after sampling")
            }
        }
    }
}

impl std::error::Error for FitError {}

/// Weighted straight line fitted to `(abscissa, ordinate)` points.
///
/// The ordinate covariance is diagonal, built from the supplied one-sigma
/// uncertainties and repaired to positive definite when degenerate (for
/// example, intervals whose resampled spread collapsed to zero). Point
/// estimates come from the generalized least squares solution and are
/// available immediately; posterior distributions appear after
/// [`sample_posterior`](Self::sample_posterior).
#[derive(Debug, Clone)]
pub struct StraightLineFit {
    abscissa: DVector<f64>,
    ordinate: DVector<f64>,
    covariance: DMatrix<f64>,
    cholesky: Cholesky<f64, Dyn>,
    gradient: VariableEstimate,
    intercept: VariableEstimate,
    gradient_samples: Option<Distribution>,
    intercept_samples: Option<Distribution>,
}

impl StraightLineFit {
    /// Likelihood bounds used when the caller has no better box:
    /// non-negative gradient up to 100, intercept within ten ordinate
    /// units of zero.
    pub const DEFAULT_BOUNDS: [(f64, f64); 2] = [(0.0, 100.0), (-10.0, 10.0)];

    /// Fit a straight line to `ordinate` against `abscissa`, weighted by
    /// the per-point one-sigma `uncertainty`.
    ///
    /// # Errors
    ///
    /// [`FitError::LengthMismatch`] when the arrays differ in length,
    /// [`FitError::TooFewPoints`] below two points.
    pub fn new(
        abscissa: &[f64],
        ordinate: &[f64],
        uncertainty: &[f64],
    ) -> Result<Self, FitError> {
        if abscissa.len() != ordinate.len() || abscissa.len() != uncertainty.len() {
            return Err(FitError::LengthMismatch {
                abscissa: abscissa.len(),
                ordinate: ordinate.len(),
                uncertainty: uncertainty.len(),
            });
        }
        if abscissa.len() < 2 {
            return Err(FitError::TooFewPoints {
                available: abscissa.len(),
            });
        }

        let covariance = nearest_positive_definite(&diagonal_covariance(uncertainty));
        let cholesky = covariance
            .clone()
            .cholesky()
            .expect("Repaired covariance is positive definite");

        let abscissa = DVector::from_column_slice(abscissa);
        let ordinate = DVector::from_column_slice(ordinate);
        let (gradient, intercept) = generalized_least_squares(&abscissa, &ordinate, &cholesky);

        Ok(Self {
            abscissa,
            ordinate,
            covariance,
            cholesky,
            gradient,
            intercept,
            gradient_samples: None,
            intercept_samples: None,
        })
    }

    /// Fitted time-interval values.
    pub fn abscissa(&self) -> &[f64] {
        self.abscissa.as_slice()
    }

    /// Fitted ordinate values.
    pub fn ordinate(&self) -> &[f64] {
        self.ordinate.as_slice()
    }

    /// Repaired covariance used for weighting and the likelihood.
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Gradient point estimate.
    pub fn gradient(&self) -> VariableEstimate {
        self.gradient
    }

    /// Intercept point estimate.
    pub fn intercept(&self) -> VariableEstimate {
        self.intercept
    }

    /// Log-likelihood of `[gradient, intercept]` describing the data:
    /// the multivariate normal log-density of the residuals under the
    /// fit covariance, evaluated through the cached Cholesky factor.
    pub fn log_likelihood(&self, variables: &[f64]) -> f64 {
        let n = self.abscissa.len();
        let model = &self.abscissa * variables[0] + DVector::from_element(n, variables[1]);
        let residual = &self.ordinate - model;

        let z = self
            .cholesky
            .l()
            .solve_lower_triangular(&residual)
            .expect("Cholesky factor has a positive diagonal");
        let mahalanobis = z.dot(&z);
        let log_det = 2.0
            * self
                .cholesky
                .l()
                .diagonal()
                .iter()
                .map(|d| d.ln())
                .sum::<f64>();

        -0.5 * (n as f64 * LOG_2PI + log_det + mahalanobis)
    }

    /// Replace the point values with the maximum-likelihood solution
    /// found by differential evolution inside `bounds`.
    ///
    /// Sampling without this step is valid; the generalized least squares
    /// start may just sit further from the posterior mode. Uncertainties
    /// keep their least-squares values until sampling refines them.
    pub fn maximize_likelihood(&mut self, bounds: [(f64, f64); 2], seed: Option<u64>) {
        let seed = seed.unwrap_or_else(|| rand::rng().random());
        let optimum =
            differential_evolution(|variables| -self.log_likelihood(variables), &bounds, seed);
        self.gradient.value = optimum[0];
        self.intercept.value = optimum[1];
    }

    /// Draw posterior samples of both variables through the supplied
    /// sampler, starting from the current point estimates.
    ///
    /// The returned chains replace any previous posterior.
    ///
    /// # Panics
    ///
    /// Panics if the sampler returns a chain count other than two.
    pub fn sample_posterior(&mut self, sampler: &dyn PosteriorSampler, options: &SampleOptions) {
        let start = [self.gradient.value, self.intercept.value];
        let chains = {
            let fit = &*self;
            sampler.sample(&|variables| fit.log_likelihood(variables), &start, options)
        };
        assert_eq!(
            chains.chains.len(),
            2,
            "The sampler must return one chain per variable"
        );

        let mut chains = chains.chains.into_iter();
        let gradient_chain = chains.next().expect("Two chains are present");
        let intercept_chain = chains.next().expect("Two chains are present");

        self.gradient_samples = Some(
            Distribution::with_samples(gradient_chain, "gradient", DEFAULT_CONFIDENCE_INTERVAL)
                .expect("Default percentile bounds are valid"),
        );
        self.intercept_samples = Some(
            Distribution::with_samples(intercept_chain, "intercept", DEFAULT_CONFIDENCE_INTERVAL)
                .expect("Default percentile bounds are valid"),
        );
    }

    /// Posterior distribution of the gradient.
    ///
    /// # Errors
    ///
    /// [`FitError::NotSampled`] before [`sample_posterior`](Self::sample_posterior).
    pub fn gradient_distribution(&self) -> Result<&Distribution, FitError> {
        self.gradient_samples.as_ref().ok_or(FitError::NotSampled)
    }

    /// Posterior distribution of the intercept.
    ///
    /// # Errors
    ///
    /// [`FitError::NotSampled`] before [`sample_posterior`](Self::sample_posterior).
    pub fn intercept_distribution(&self) -> Result<&Distribution, FitError> {
        self.intercept_samples.as_ref().ok_or(FitError::NotSampled)
    }
}

/// Generalized least squares solution for `[gradient, intercept]`.
///
/// Solves `beta = (X^T S^-1 X)^-1 X^T S^-1 y` with `X = [t | 1]` through
/// Cholesky solves; variable uncertainties are the square roots of the
/// diagonal of `(X^T S^-1 X)^-1`.
fn generalized_least_squares(
    abscissa: &DVector<f64>,
    ordinate: &DVector<f64>,
    cholesky: &Cholesky<f64, Dyn>,
) -> (VariableEstimate, VariableEstimate) {
    let n = abscissa.len();
    let mut design = DMatrix::zeros(n, 2);
    design.set_column(0, abscissa);
    design.set_column(1, &DVector::from_element(n, 1.0));

    let mut sigma_inv_x = DMatrix::zeros(n, 2);
    sigma_inv_x.set_column(0, &cholesky.solve(&design.column(0).into_owned()));
    sigma_inv_x.set_column(1, &cholesky.solve(&design.column(1).into_owned()));
    let sigma_inv_y = cholesky.solve(ordinate);

    let xt_sigma_inv_x = design.transpose() * &sigma_inv_x;
    let xt_sigma_inv_y = design.transpose() * &sigma_inv_y;

    let normal = match xt_sigma_inv_x.clone().cholesky() {
        Some(c) => c,
        None => {
            // Degenerate abscissa; regularize rather than fail
            let regularized = xt_sigma_inv_x + DMatrix::identity(2, 2) * 1e-10;
            regularized
                .cholesky()
                .expect("Regularized normal equations should be positive definite")
        }
    };

    let beta = normal.solve(&xt_sigma_inv_y);
    let parameter_cov = normal.inverse();

    (
        VariableEstimate {
            value: beta[0],
            uncertainty: parameter_cov[(0, 0)].sqrt(),
        },
        VariableEstimate {
            value: beta[1],
            uncertainty: parameter_cov[(1, 1)].sqrt(),
        },
    )
}
