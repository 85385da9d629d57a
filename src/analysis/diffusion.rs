//! Diffusion coefficient from the Einstein relationship.
//!
//! The mean squared displacement of a three-dimensional random walk grows
//! linearly with time interval; the diffusion coefficient is the gradient
//! of that line divided by six. This module wraps the straight-line fit
//! with the unit bookkeeping needed to report the coefficient in cm²/s.

use serde::{Deserialize, Serialize};

use crate::analysis::fit::{FitError, StraightLineFit, VariableEstimate};
use crate::analysis::sampler::{PosteriorSampler, SampleOptions};
use crate::constants::{DEFAULT_CONFIDENCE_INTERVAL, EINSTEIN_DENOMINATOR};
use crate::statistics::{BootstrapResult, Distribution};

/// Unit tag attached to reported coefficients.
const COEFFICIENT_UNIT: &str = "cm^2 s^-1";

/// Time unit of the interval axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeUnit {
    /// 1e-15 s, the usual MD timestep scale.
    Femtosecond,
    /// 1e-12 s.
    Picosecond,
    /// 1e-9 s.
    Nanosecond,
}

impl TimeUnit {
    /// Seconds per unit.
    pub fn in_seconds(self) -> f64 {
        match self {
            TimeUnit::Femtosecond => 1e-15,
            TimeUnit::Picosecond => 1e-12,
            TimeUnit::Nanosecond => 1e-9,
        }
    }
}

/// Length unit of the displacement data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthUnit {
    /// 1e-8 cm.
    Angstrom,
    /// 1e-7 cm.
    Nanometer,
}

impl LengthUnit {
    /// Centimeters per unit.
    pub fn in_centimeters(self) -> f64 {
        match self {
            LengthUnit::Angstrom => 1e-8,
            LengthUnit::Nanometer => 1e-7,
        }
    }
}

/// Unit pair of the fitted data, fixing the conversion to cm²/s.
///
/// Passed explicitly at model construction; there is no ambient registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Units {
    /// Unit of the time-interval values.
    pub time: TimeUnit,
    /// Unit of the displacement lengths (the ordinate carries its square).
    pub length: LengthUnit,
}

impl Units {
    /// Conversion factor from length²/time to cm²/s.
    pub fn to_cm2_per_s(self) -> f64 {
        let length_cm = self.length.in_centimeters();
        length_cm * length_cm / self.time.in_seconds()
    }
}

/// Diffusion coefficient estimate over a straight-line fit of resampled
/// mean squared displacements.
///
/// The point estimate is available immediately from the weighted fit;
/// [`sample`](Self::sample) refines it into a full posterior distribution.
#[derive(Debug, Clone)]
pub struct DiffusionModel {
    fit: StraightLineFit,
    units: Units,
    diffusion: Option<Distribution>,
}

impl DiffusionModel {
    /// Fit the Einstein relationship to per-interval means and
    /// uncertainties expressed in `units`.
    ///
    /// # Errors
    ///
    /// Propagates [`FitError`] from the underlying fit validation.
    pub fn new(
        delta_t: &[f64],
        msd: &[f64],
        msd_error: &[f64],
        units: Units,
    ) -> Result<Self, FitError> {
        Ok(Self {
            fit: StraightLineFit::new(delta_t, msd, msd_error)?,
            units,
            diffusion: None,
        })
    }

    /// Fit directly from a bootstrap run.
    ///
    /// # Errors
    ///
    /// Propagates [`FitError`], for example when too few intervals
    /// survived the resampler's drop rule.
    pub fn from_bootstrap(result: &BootstrapResult, units: Units) -> Result<Self, FitError> {
        Self::new(&result.delta_t, &result.means, &result.errors, units)
    }

    /// Diffusion coefficient point estimate in cm²/s: the fitted gradient
    /// over six, unit-converted. The uncertainty scales with the
    /// gradient's.
    pub fn diffusion_coefficient(&self) -> VariableEstimate {
        let factor = self.units.to_cm2_per_s() / EINSTEIN_DENOMINATOR;
        let gradient = self.fit.gradient();
        VariableEstimate {
            value: gradient.value * factor,
            uncertainty: gradient.uncertainty * factor,
        }
    }

    /// Intercept of the fitted line, in the ordinate's native units.
    pub fn intercept_offset(&self) -> VariableEstimate {
        self.fit.intercept()
    }

    /// Underlying straight-line fit.
    pub fn fit(&self) -> &StraightLineFit {
        &self.fit
    }

    /// Units the data was supplied in.
    pub fn units(&self) -> Units {
        self.units
    }

    /// Sample the fit posterior and rebuild the coefficient as a
    /// distribution named `D`, tagged cm²/s.
    ///
    /// The likelihood is maximized first so the sampler starts at the
    /// mode; walkers, sample count and burn-in are forwarded verbatim.
    pub fn sample(&mut self, sampler: &dyn PosteriorSampler, options: &SampleOptions) {
        self.fit
            .maximize_likelihood(StraightLineFit::DEFAULT_BOUNDS, options.seed);
        self.fit.sample_posterior(sampler, options);

        let factor = self.units.to_cm2_per_s() / EINSTEIN_DENOMINATOR;
        let samples: Vec<f64> = self
            .fit
            .gradient_distribution()
            .expect("Sampling populated the gradient posterior")
            .samples()
            .iter()
            .map(|gradient| gradient * factor)
            .collect();

        self.diffusion = Some(
            Distribution::with_samples(samples, "D", DEFAULT_CONFIDENCE_INTERVAL)
                .expect("Default percentile bounds are valid")
                .with_unit(COEFFICIENT_UNIT),
        );
    }

    /// Posterior distribution of the diffusion coefficient.
    ///
    /// # Errors
    ///
    /// [`FitError::NotSampled`] before [`sample`](Self::sample) has run.
    pub fn diffusion_distribution(&self) -> Result<&Distribution, FitError> {
        self.diffusion.as_ref().ok_or(FitError::NotSampled)
    }

    /// Condensed, serializable view of the analysis.
    pub fn summary(&self) -> DiffusionSummary {
        DiffusionSummary {
            diffusion_coefficient: self.diffusion_coefficient(),
            intercept: self.intercept_offset(),
            posterior_median: self.diffusion.as_ref().and_then(|d| d.median()),
            posterior_interval: self.diffusion.as_ref().and_then(|d| d.con_int()),
            unit: COEFFICIENT_UNIT.to_string(),
            n_points: self.fit.abscissa().len(),
        }
    }
}

/// Summary of a diffusion analysis, suitable for reports and JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffusionSummary {
    /// Point estimate of the diffusion coefficient in cm²/s.
    pub diffusion_coefficient: VariableEstimate,
    /// Fitted intercept in ordinate units.
    pub intercept: VariableEstimate,
    /// Posterior median of the coefficient, once sampled.
    pub posterior_median: Option<f64>,
    /// Posterior confidence interval of the coefficient, once sampled.
    pub posterior_interval: Option<[f64; 2]>,
    /// Unit of the coefficient values.
    pub unit: String,
    /// Number of fitted time intervals.
    pub n_points: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::sampler::PosteriorChains;

    const FS_ANGSTROM: Units = Units {
        time: TimeUnit::Femtosecond,
        length: LengthUnit::Angstrom,
    };

    /// Sampler double that jitters a tight grid around the start.
    struct GridSampler;

    impl PosteriorSampler for GridSampler {
        fn sample(
            &self,
            _log_likelihood: &dyn Fn(&[f64]) -> f64,
            start: &[f64],
            options: &SampleOptions,
        ) -> PosteriorChains {
            let total = options.walkers * options.n_samples;
            let chains = start
                .iter()
                .map(|&center| {
                    (0..total)
                        .map(|i| center + (i as f64 / total as f64 - 0.5) * 1e-4)
                        .collect()
                })
                .collect();
            PosteriorChains { chains }
        }
    }

    fn linear_msd() -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let delta_t: Vec<f64> = (1..=8).map(|i| i as f64).collect();
        let msd: Vec<f64> = delta_t.iter().map(|t| 6.0 * t).collect();
        let err = vec![0.1; delta_t.len()];
        (delta_t, msd, err)
    }

    #[test]
    fn test_unit_factors() {
        assert!((FS_ANGSTROM.to_cm2_per_s() - 0.1).abs() < 1e-12);

        let ps_angstrom = Units {
            time: TimeUnit::Picosecond,
            length: LengthUnit::Angstrom,
        };
        assert!((ps_angstrom.to_cm2_per_s() - 1e-4).abs() < 1e-16);

        let ns_nanometer = Units {
            time: TimeUnit::Nanosecond,
            length: LengthUnit::Nanometer,
        };
        assert!((ns_nanometer.to_cm2_per_s() - 1e-5).abs() < 1e-17);
    }

    #[test]
    fn test_point_estimate_divides_gradient_by_six() {
        let (delta_t, msd, err) = linear_msd();
        let model = DiffusionModel::new(&delta_t, &msd, &err, FS_ANGSTROM).unwrap();

        // Gradient 6 in angstrom^2/fs: D = 6 / 6 * 0.1 = 0.1 cm^2/s
        let coefficient = model.diffusion_coefficient();
        assert!((coefficient.value - 0.1).abs() < 1e-6);
        assert!(coefficient.uncertainty > 0.0);
    }

    #[test]
    fn test_intercept_is_fit_native() {
        let delta_t = [1.0, 2.0, 3.0, 4.0];
        let msd: Vec<f64> = delta_t.iter().map(|t| 2.0 * t + 0.5).collect();
        let model = DiffusionModel::new(&delta_t, &msd, &[0.05; 4], FS_ANGSTROM).unwrap();

        assert!((model.intercept_offset().value - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_from_bootstrap_uses_surviving_intervals() {
        let result = BootstrapResult {
            delta_t: vec![1.0, 2.0, 3.0],
            means: vec![6.0, 12.0, 18.0],
            errors: vec![0.2, 0.3, 0.4],
            distributions: Vec::new(),
            warnings: Vec::new(),
        };

        let model = DiffusionModel::from_bootstrap(&result, FS_ANGSTROM).unwrap();

        assert_eq!(model.fit().abscissa(), &[1.0, 2.0, 3.0]);
        assert!((model.diffusion_coefficient().value - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_distribution_requires_sampling() {
        let (delta_t, msd, err) = linear_msd();
        let model = DiffusionModel::new(&delta_t, &msd, &err, FS_ANGSTROM).unwrap();

        assert_eq!(
            model.diffusion_distribution().unwrap_err(),
            FitError::NotSampled
        );
        let summary = model.summary();
        assert_eq!(summary.posterior_median, None);
        assert_eq!(summary.posterior_interval, None);
    }

    #[test]
    fn test_sampling_builds_named_distribution() {
        let (delta_t, msd, err) = linear_msd();
        let mut model = DiffusionModel::new(&delta_t, &msd, &err, FS_ANGSTROM).unwrap();
        let options = SampleOptions {
            walkers: 10,
            n_samples: 100,
            progress: false,
            seed: Some(29),
            ..SampleOptions::default()
        };

        model.sample(&GridSampler, &options);

        let diffusion = model.diffusion_distribution().unwrap();
        assert_eq!(diffusion.name(), "D");
        assert_eq!(diffusion.unit(), Some(COEFFICIENT_UNIT));
        assert_eq!(diffusion.size(), 1000);
        // Maximum likelihood lands near gradient 6, so D is near 0.1
        assert!((diffusion.median().unwrap() - 0.1).abs() < 0.01);

        let summary = model.summary();
        assert!(summary.posterior_median.is_some());
        assert!(summary.posterior_interval.is_some());
        assert_eq!(summary.n_points, 8);
    }
}
