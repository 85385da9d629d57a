//! Percentile computation over resampled observables.
//!
//! Percentiles follow the linear-interpolation ("R-7") definition, so the
//! values agree with what numpy-based analyses of the same data report.

/// Compute a single percentile from a mutable slice.
///
/// Uses `select_nth_unstable()` for O(n) expected time complexity.
/// The slice is partially reordered as a side effect.
///
/// # Arguments
///
/// * `data` - Mutable slice of samples (will be partially reordered)
/// * `p` - Percentile in [0, 100]
///
/// # Panics
///
/// Panics if `data` is empty or if `p` is outside [0, 100].
pub fn compute_percentile(data: &mut [f64], p: f64) -> f64 {
    assert!(!data.is_empty(), "Cannot compute percentile of empty slice");
    assert!(
        (0.0..=100.0).contains(&p),
        "Percentile must be in [0, 100]"
    );

    let n = data.len();

    if n == 1 {
        return data[0];
    }

    // R-7 definition: linear interpolation between order statistics
    let h = (n - 1) as f64 * (p / 100.0);
    let h_floor = h.floor() as usize;
    let h_frac = h - h.floor();

    if h_floor >= n - 1 {
        let (_, &mut max, _) = data.select_nth_unstable_by(n - 1, |a, b| a.total_cmp(b));
        return max;
    }

    let (_, &mut lower, upper) = data.select_nth_unstable_by(h_floor, |a, b| a.total_cmp(b));

    if h_frac == 0.0 {
        return lower;
    }

    // Minimum of the upper partition is the next order statistic
    let upper_min = upper
        .iter()
        .copied()
        .min_by(|a, b| a.total_cmp(b))
        .unwrap_or(lower);

    lower + h_frac * (upper_min - lower)
}

/// Compute a percentile from pre-sorted samples.
///
/// This is the cheap path when several percentiles are needed from the
/// same data: sort once and index repeatedly.
///
/// # Arguments
///
/// * `sorted` - Samples sorted in ascending order (not verified)
/// * `p` - Percentile in [0, 100]
///
/// # Panics
///
/// Panics if `sorted` is empty or if `p` is outside [0, 100].
pub fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    assert!(
        !sorted.is_empty(),
        "Cannot compute percentile of empty slice"
    );
    assert!(
        (0.0..=100.0).contains(&p),
        "Percentile must be in [0, 100]"
    );

    let n = sorted.len();
    let h = (n - 1) as f64 * (p / 100.0);
    let h_floor = h.floor() as usize;
    let h_frac = h - h.floor();

    if h_floor >= n - 1 {
        sorted[n - 1]
    } else if h_frac == 0.0 {
        sorted[h_floor]
    } else {
        sorted[h_floor] + h_frac * (sorted[h_floor + 1] - sorted[h_floor])
    }
}
