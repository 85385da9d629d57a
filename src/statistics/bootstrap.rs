//! Adaptive bootstrap resampling of displacement observations.
//!
//! Displacement observations at one time interval are heavily correlated:
//! overlapping windows of the same trajectory share most of their atoms'
//! motion. Averaging them directly would understate the uncertainty, so
//! the mean squared displacement is instead estimated by bootstrap:
//! each resample draws only as many observations as are approximately
//! independent, and resampling continues until the distribution of the
//! resampled means passes a normality test (or a hard ceiling is hit).

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(feature = "progress")]
use std::time::Duration;

use crate::config::BootstrapConfig;
use crate::constants::RESAMPLE_GROWTH;
use crate::statistics::distribution::{Distribution, DistributionError};
#[cfg(feature = "parallel")]
use crate::thread_pool;
use crate::types::DisplacementBlock;

/// Output of a bootstrap resampling run.
///
/// Intervals whose independent-sample estimate is one or less are dropped,
/// so the vectors here can be shorter than the input. All vectors share
/// the same length and ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BootstrapResult {
    /// Time intervals that survived the independence cut.
    pub delta_t: Vec<f64>,
    /// Median of the resampled observable at each interval.
    pub means: Vec<f64>,
    /// Distance from the median to the upper confidence percentile.
    pub errors: Vec<f64>,
    /// Full resampled distribution at each interval.
    pub distributions: Vec<Distribution>,
    /// Intervals that hit the resample ceiling.
    pub warnings: Vec<ConvergenceWarning>,
}

impl BootstrapResult {
    /// Lower and upper confidence bounds, mean minus and plus the
    /// uncertainty per interval.
    pub fn confidence_band(&self) -> (Vec<f64>, Vec<f64>) {
        let lower = self
            .means
            .iter()
            .zip(&self.errors)
            .map(|(m, e)| m - e)
            .collect();
        let upper = self
            .means
            .iter()
            .zip(&self.errors)
            .map(|(m, e)| m + e)
            .collect();
        (lower, upper)
    }
}

/// Record of an interval whose resampled distribution hit the resample
/// ceiling. The distribution is treated as normal regardless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvergenceWarning {
    /// Index into the input interval list.
    pub interval_index: usize,
    /// Time interval value.
    pub delta_t: f64,
    /// Resamples accumulated when the ceiling was hit.
    pub resamples: usize,
}

/// One interval's resampling work order.
struct IntervalPlan {
    index: usize,
    pool: Vec<f64>,
    n_samples: usize,
    normalization: f64,
}

/// Bootstrap the mean squared displacement at each time interval.
///
/// Each particle-observation pair contributes one squared displacement
/// to the interval's sample pool. The number of draws per resampled mean
/// is the approximate count of independent observations,
/// `max_obs / (max_obs - n_obs + 1) * n_particles / samples_freq`
/// truncated and scaled by the bootstrap multiplier; intervals where
/// that count is one or less carry no information and are dropped.
///
/// # Errors
///
/// Returns [`DistributionError::InvalidCiBounds`] when the configured
/// confidence interval is not an ordered pair of percentiles.
///
/// # Panics
///
/// Panics if `delta_t` and `displacements` differ in length or are
/// empty, or if `delta_t` is not strictly increasing.
pub fn msd_bootstrap(
    delta_t: &[f64],
    displacements: &[DisplacementBlock],
    config: &BootstrapConfig,
) -> Result<BootstrapResult, DistributionError> {
    check_interval_order(delta_t, displacements);
    assert!(config.samples_freq >= 1, "samples_freq must be at least 1");

    let max_obs = displacements[0].n_observations();
    let intervals = displacements
        .iter()
        .enumerate()
        .map(|(i, block)| IntervalPlan {
            index: i,
            pool: block.squared_displacements(),
            n_samples: window_ratio(max_obs, block.n_observations())
                .map(|ratio| {
                    (ratio * block.n_particles() as f64 / config.samples_freq as f64) as usize
                })
                .unwrap_or(0)
                * config.bootstrap_multiplier,
            normalization: 1.0,
        })
        .collect();

    run_bootstrap(delta_t, intervals, config)
}

/// Bootstrap the mean squared collective displacement of a particle
/// subset at each time interval.
///
/// The displacements of the particles named in `indices` are summed
/// before squaring, so each observation window contributes a single
/// collective value; an empty `indices` selects every particle. Unlike
/// [`msd_bootstrap`] the independent-sample estimate carries no particle
/// factor: the collective sum leaves one observation per window
/// regardless of subset size. Reported means and errors are normalized
/// by the subset size.
///
/// # Errors
///
/// Returns [`DistributionError::InvalidCiBounds`] when the configured
/// confidence interval is not an ordered pair of percentiles.
///
/// # Panics
///
/// Panics if `delta_t` and `displacements` differ in length or are
/// empty, if `delta_t` is not strictly increasing, or if an index is
/// out of range.
pub fn mscd_bootstrap(
    delta_t: &[f64],
    displacements: &[DisplacementBlock],
    indices: &[usize],
    config: &BootstrapConfig,
) -> Result<BootstrapResult, DistributionError> {
    check_interval_order(delta_t, displacements);
    assert!(config.samples_freq >= 1, "samples_freq must be at least 1");

    let subset_size = if indices.is_empty() {
        displacements[0].n_particles()
    } else {
        indices.len()
    };

    let max_obs = displacements[0].n_observations();
    let intervals = displacements
        .iter()
        .enumerate()
        .map(|(i, block)| IntervalPlan {
            index: i,
            pool: block.collective_squared_displacements(indices),
            n_samples: window_ratio(max_obs, block.n_observations())
                .map(|ratio| (ratio / config.samples_freq as f64) as usize)
                .unwrap_or(0)
                * config.bootstrap_multiplier,
            normalization: subset_size as f64,
        })
        .collect();

    run_bootstrap(delta_t, intervals, config)
}

/// Shared input validation: one block per interval, intervals in
/// strictly increasing order so the surviving output stays sorted.
fn check_interval_order(delta_t: &[f64], displacements: &[DisplacementBlock]) {
    assert!(
        !displacements.is_empty(),
        "At least one displacement block is required"
    );
    assert_eq!(
        delta_t.len(),
        displacements.len(),
        "One displacement block is required per time interval"
    );
    assert!(
        delta_t.windows(2).all(|pair| pair[0] < pair[1]),
        "Time intervals must increase strictly"
    );
}

/// Ratio of total observation windows to non-overlapping ones at an
/// interval. Truncating this (scaled by the per-window sample count)
/// gives the approximate number of independent observations.
///
/// Returns `None` when the interval has more observations than the
/// first one, which cannot happen for well-ordered input.
fn window_ratio(max_obs: usize, n_obs: usize) -> Option<f64> {
    let overlap = max_obs as i64 - n_obs as i64 + 1;
    if overlap < 1 {
        return None;
    }
    Some(max_obs as f64 / overlap as f64)
}

fn run_bootstrap(
    delta_t: &[f64],
    intervals: Vec<IntervalPlan>,
    config: &BootstrapConfig,
) -> Result<BootstrapResult, DistributionError> {
    let base_seed = config.seed.unwrap_or_else(|| rand::rng().random());

    let mut result = BootstrapResult {
        delta_t: Vec::new(),
        means: Vec::new(),
        errors: Vec::new(),
        distributions: Vec::new(),
        warnings: Vec::new(),
    };

    #[cfg(feature = "progress")]
    let bar = interval_progress_bar(intervals.len() as u64, config.progress);

    for plan in intervals {
        #[cfg(feature = "progress")]
        if let Some(bar) = &bar {
            bar.inc(1);
        }

        if plan.n_samples <= 1 {
            continue;
        }

        // Each interval gets its own seed stream; growth rounds continue
        // the counter so parallel and serial runs draw identically.
        let interval_seed = counter_rng_seed(base_seed, plan.index as u64);
        let mut drawn: u64 = 0;

        let initial = resample_means(
            &plan.pool,
            plan.n_samples,
            config.n_resamples,
            interval_seed,
            drawn,
        );
        drawn += config.n_resamples as u64;

        let mut distribution = Distribution::with_samples(
            initial,
            format!("delta_t_{}", plan.index),
            config.confidence_interval,
        )?;

        let growth_cap = config.max_resamples.saturating_sub(config.n_resamples);
        while !distribution.normal() && distribution.size() < growth_cap {
            let extra = resample_means(
                &plan.pool,
                plan.n_samples,
                RESAMPLE_GROWTH,
                interval_seed,
                drawn,
            );
            drawn += RESAMPLE_GROWTH as u64;
            distribution.add_samples(&extra);
        }

        if distribution.size() >= growth_cap {
            eprintln!(
                "[diffusivity] the resample ceiling was reached at interval {} \
                 (delta_t = {}); the distribution will be treated as normal",
                plan.index, delta_t[plan.index]
            );
            result.warnings.push(ConvergenceWarning {
                interval_index: plan.index,
                delta_t: delta_t[plan.index],
                resamples: distribution.size(),
            });
        }

        let median = distribution
            .median()
            .expect("resampled distribution holds at least one sample");
        let upper = distribution
            .percentile(config.confidence_interval[1])
            .expect("resampled distribution holds at least one sample");

        result.delta_t.push(delta_t[plan.index]);
        result.means.push(median / plan.normalization);
        result.errors.push((upper - median) / plan.normalization);
        result.distributions.push(distribution);
    }

    #[cfg(feature = "progress")]
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    Ok(result)
}

/// Draw `n_resamples` bootstrap means of `n_samples` observations each.
///
/// Every resampled mean seeds its own RNG from the shared counter, so
/// the output is identical whether or not the work is parallelized.
#[cfg(feature = "parallel")]
fn resample_means(
    pool: &[f64],
    n_samples: usize,
    n_resamples: usize,
    seed: u64,
    counter_offset: u64,
) -> Vec<f64> {
    thread_pool::install(|| {
        (0..n_resamples)
            .into_par_iter()
            .map(|j| {
                let mut rng = Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(
                    seed,
                    counter_offset + j as u64,
                ));
                bootstrap_mean(pool, n_samples, &mut rng)
            })
            .collect()
    })
}

/// Draw `n_resamples` bootstrap means of `n_samples` observations each.
///
/// Seeding matches the parallel version exactly.
#[cfg(not(feature = "parallel"))]
fn resample_means(
    pool: &[f64],
    n_samples: usize,
    n_resamples: usize,
    seed: u64,
    counter_offset: u64,
) -> Vec<f64> {
    let mut means = Vec::with_capacity(n_resamples);
    for j in 0..n_resamples {
        let mut rng =
            Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(seed, counter_offset + j as u64));
        means.push(bootstrap_mean(pool, n_samples, &mut rng));
    }
    means
}

/// Mean of `n_samples` draws with replacement from the pool.
fn bootstrap_mean<R: Rng>(pool: &[f64], n_samples: usize, rng: &mut R) -> f64 {
    let n = pool.len();
    let mut total = 0.0;
    for _ in 0..n_samples {
        total += pool[rng.random_range(0..n)];
    }
    total / n_samples as f64
}

/// Derive the RNG seed for a numbered resample from a base seed.
///
/// SplitMix64 hash of (base seed, counter): each resample index maps to
/// its own well-mixed seed, so draws match between the parallel and
/// serial engines and adjacent resamples share no stream structure.
#[inline]
pub fn counter_rng_seed(base_seed: u64, counter: u64) -> u64 {
    // SplitMix64, https://xoshiro.di.unimi.it/splitmix64.c
    let mut z = base_seed.wrapping_add(counter.wrapping_mul(0x9e3779b97f4a7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111eb);
    z ^ (z >> 31)
}

#[cfg(feature = "progress")]
fn interval_progress_bar(total: u64, enabled: bool) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let pb = ProgressBar::new(total.max(1));
    pb.set_style(
        ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} intervals ({percent:>3}%) | ETA {eta_precise}",
        )
        .expect("indicatif template"),
    );
    pb.enable_steady_tick(Duration::from_millis(200));
    Some(pb)
}
