//! Growable sample distributions with summary statistics.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_CONFIDENCE_INTERVAL;
use crate::statistics::normality::is_normal;
use crate::statistics::quantile::{compute_percentile, percentile_sorted};

/// Errors from constructing a [`Distribution`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DistributionError {
    /// Confidence interval percentiles must satisfy 0 <= low < high <= 100.
    InvalidCiBounds {
        /// Offending lower percentile.
        low: f64,
        /// Offending upper percentile.
        high: f64,
    },
}

impl std::fmt::Display for DistributionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionError::InvalidCiBounds { low, high } => write!(
                f,
                "confidence interval percentiles [{low}, {high}] must satisfy 0 <= low < high <= 100"
            ),
        }
    }
}

impl std::error::Error for DistributionError {}

/// A distribution described non-parametrically by its samples.
///
/// The distribution grows as samples are added; its summary statistics
/// (median, confidence interval, symmetric error estimate) and a
/// normality flag are recomputed on every addition. The error estimate
/// is the distance from the median to the upper confidence percentile,
/// which for a normal distribution with the default bounds is one
/// standard deviation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distribution {
    name: String,
    unit: Option<String>,
    samples: Vec<f64>,
    ci_points: [f64; 2],
    median: Option<f64>,
    con_int: Option<[f64; 2]>,
    error: Option<f64>,
    normal: bool,
    #[serde(skip)]
    sorted: Vec<f64>,
}

impl Distribution {
    /// Create an empty distribution with the default confidence bounds.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit: None,
            samples: Vec::new(),
            ci_points: DEFAULT_CONFIDENCE_INTERVAL,
            median: None,
            con_int: None,
            error: None,
            normal: false,
            sorted: Vec::new(),
        }
    }

    /// Create an empty distribution with explicit confidence bounds.
    pub fn with_ci_points(
        name: impl Into<String>,
        ci_points: [f64; 2],
    ) -> Result<Self, DistributionError> {
        let [low, high] = ci_points;
        if !(0.0..=100.0).contains(&low) || !(0.0..=100.0).contains(&high) || low >= high {
            return Err(DistributionError::InvalidCiBounds { low, high });
        }

        let mut distribution = Self::new(name);
        distribution.ci_points = ci_points;
        Ok(distribution)
    }

    /// Create a distribution seeded with samples.
    pub fn with_samples(
        samples: Vec<f64>,
        name: impl Into<String>,
        ci_points: [f64; 2],
    ) -> Result<Self, DistributionError> {
        let mut distribution = Self::with_ci_points(name, ci_points)?;
        distribution.samples = samples;
        distribution.update();
        Ok(distribution)
    }

    /// Attach a unit label, consuming and returning the distribution.
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Append samples and recompute all summary statistics.
    pub fn add_samples(&mut self, new_samples: &[f64]) {
        self.samples.extend_from_slice(new_samples);
        self.update();
    }

    /// Descriptive name of the distribution.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unit label, if one was attached.
    pub fn unit(&self) -> Option<&str> {
        self.unit.as_deref()
    }

    /// Number of stored samples.
    pub fn size(&self) -> usize {
        self.samples.len()
    }

    /// The raw samples.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Percentile bounds of the confidence interval.
    pub fn ci_points(&self) -> [f64; 2] {
        self.ci_points
    }

    /// Median of the samples, `None` while empty.
    pub fn median(&self) -> Option<f64> {
        self.median
    }

    /// Values at the confidence percentiles, `None` below two samples.
    pub fn con_int(&self) -> Option<[f64; 2]> {
        self.con_int
    }

    /// Distance from the median to the upper confidence percentile,
    /// `None` below two samples.
    pub fn error(&self) -> Option<f64> {
        self.error
    }

    /// Whether the samples currently pass their normality test.
    pub fn normal(&self) -> bool {
        self.normal
    }

    /// Value at an arbitrary percentile of the samples, `None` while empty.
    ///
    /// # Panics
    ///
    /// Panics if `p` is outside [0, 100].
    pub fn percentile(&self, p: f64) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut scratch = self.samples.clone();
        Some(compute_percentile(&mut scratch, p))
    }

    /// Recompute median, confidence interval, error, and normality.
    fn update(&mut self) {
        self.sorted.clear();
        self.sorted.extend_from_slice(&self.samples);
        self.sorted.sort_unstable_by(|a, b| a.total_cmp(b));

        if self.sorted.is_empty() {
            self.median = None;
            self.con_int = None;
            self.error = None;
            self.normal = false;
            return;
        }

        let median = percentile_sorted(&self.sorted, 50.0);
        self.median = Some(median);

        if self.sorted.len() > 1 {
            let low = percentile_sorted(&self.sorted, self.ci_points[0]);
            let high = percentile_sorted(&self.sorted, self.ci_points[1]);
            self.con_int = Some([low, high]);
            self.error = Some(high - median);
        } else {
            self.con_int = None;
            self.error = None;
        }

        self.normal = is_normal(&self.samples);
    }
}
