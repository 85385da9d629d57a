//! Normality tests for bootstrap distributions.
//!
//! Two complementary tests cover the sample sizes seen during adaptive
//! resampling: the Shapiro-Wilk W test (Royston's AS R94 approximation)
//! for up to 5,000 samples, and the D'Agostino K-squared omnibus test
//! for larger distributions where W loses its calibration.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

use crate::constants::{MIN_NORMALITY_SAMPLES, NORMALITY_ALPHA, SHAPIRO_MAX_SAMPLES};

/// Outcome of a normality test.
#[derive(Debug, Clone, Copy)]
pub struct NormalityResult {
    /// Test statistic: W for Shapiro-Wilk, K-squared for D'Agostino.
    pub statistic: f64,
    /// p-value under the null hypothesis of normality.
    pub p_value: f64,
}

// Royston (1995) polynomial coefficients, ascending order.
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// 6 / pi, for the exact n = 3 p-value.
const PI6: f64 = 1.909_859_317_102_744_3;
/// asin(sqrt(3/4)), the lower bound of asin(sqrt(W)) at n = 3.
const STQR: f64 = 1.047_197_551_196_597_9;
/// Censored p-value when W falls outside the approximation's support.
const SMALL_P: f64 = 1e-19;

/// Evaluate a polynomial with ascending coefficients at `x`.
fn poly(coefficients: &[f64], x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Decide whether samples may be treated as normally distributed.
///
/// Fewer than 3 samples are never considered normal. Up to
/// 5,000 samples are tested with Shapiro-Wilk, larger sets with
/// D'Agostino K-squared; in both cases the distribution passes when the
/// p-value exceeds 0.05.
pub fn is_normal(samples: &[f64]) -> bool {
    if samples.len() < MIN_NORMALITY_SAMPLES {
        return false;
    }

    let outcome = if samples.len() <= SHAPIRO_MAX_SAMPLES {
        shapiro_wilk(samples)
    } else {
        dagostino_k2(samples)
    };

    outcome.p_value > NORMALITY_ALPHA
}

/// Shapiro-Wilk W test using Royston's AS R94 approximation.
///
/// Valid for 3 to around 5,000 samples; beyond that the W statistic
/// saturates and the p-value loses accuracy.
///
/// Samples with zero range (a point mass) return a p-value of 0.
///
/// # Panics
///
/// Panics if fewer than 3 samples are supplied.
pub fn shapiro_wilk(samples: &[f64]) -> NormalityResult {
    let n = samples.len();
    assert!(
        n >= MIN_NORMALITY_SAMPLES,
        "Shapiro-Wilk requires at least 3 samples"
    );

    let mut x = samples.to_vec();
    x.sort_unstable_by(|a, b| a.total_cmp(b));

    let range = x[n - 1] - x[0];
    if range == 0.0 {
        return NormalityResult {
            statistic: 1.0,
            p_value: 0.0,
        };
    }

    let an = n as f64;
    let n2 = n / 2;
    let normal = Normal::new(0.0, 1.0).expect("unit normal is a valid distribution");

    // Normalized best linear unbiased coefficients for the upper half,
    // from Blom scores m_i = ppnd((i - 3/8) / (n + 1/4)).
    let mut a = vec![0.0; n2];
    if n == 3 {
        a[0] = std::f64::consts::FRAC_1_SQRT_2;
    } else {
        let an25 = an + 0.25;
        let mut summ2 = 0.0;
        for (i, ai) in a.iter_mut().enumerate() {
            *ai = normal.inverse_cdf(((i + 1) as f64 - 0.375) / an25);
            summ2 += *ai * *ai;
        }
        summ2 *= 2.0;
        let ssumm2 = summ2.sqrt();
        let rsn = 1.0 / an.sqrt();
        let a1 = poly(&C1, rsn) - a[0] / ssumm2;

        // The first one or two coefficients are replaced by polynomial
        // approximations; the rest are rescaled to keep unit norm.
        let (first_kept, fac) = if n > 5 {
            let a2 = -a[1] / ssumm2 + poly(&C2, rsn);
            let fac = ((summ2 - 2.0 * a[0] * a[0] - 2.0 * a[1] * a[1])
                / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
                .sqrt();
            a[1] = a2;
            (2, fac)
        } else {
            let fac = ((summ2 - 2.0 * a[0] * a[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
            (1, fac)
        };
        a[0] = a1;
        for ai in a.iter_mut().skip(first_kept) {
            *ai = -*ai / fac;
        }
    }

    // W is the squared correlation between the sorted data and the
    // antisymmetric coefficient vector (-a[i] in the lower half, +a[j]
    // mirrored in the upper half). Data is scaled by its range for
    // conditioning.
    let mut coefficient_sum = 0.0;
    let mut data_sum = 0.0;
    for (i, &xi) in x.iter().enumerate() {
        data_sum += xi / range;
        let j = n - 1 - i;
        if i != j {
            let sign = if i > j { 1.0 } else { -1.0 };
            coefficient_sum += sign * a[i.min(j)];
        }
    }
    let coefficient_mean = coefficient_sum / an;
    let data_mean = data_sum / an;

    let mut ssa = 0.0;
    let mut ssx = 0.0;
    let mut sax = 0.0;
    for (i, &xi) in x.iter().enumerate() {
        let j = n - 1 - i;
        let asa = if i != j {
            let sign = if i > j { 1.0 } else { -1.0 };
            sign * a[i.min(j)] - coefficient_mean
        } else {
            -coefficient_mean
        };
        let xsx = xi / range - data_mean;
        ssa += asa * asa;
        ssx += xsx * xsx;
        sax += asa * xsx;
    }

    let ssassx = (ssa * ssx).sqrt();
    let w1 = (ssassx - sax) * (ssassx + sax) / (ssa * ssx);
    let w = 1.0 - w1;

    // Significance of W
    if n == 3 {
        let p = (PI6 * (w.sqrt().asin() - STQR)).clamp(0.0, 1.0);
        return NormalityResult {
            statistic: w,
            p_value: p,
        };
    }

    let y = w1.ln();
    let log_n = an.ln();
    let z = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return NormalityResult {
                statistic: w,
                p_value: SMALL_P,
            };
        }
        let y = -(gamma - y).ln();
        (y - poly(&C3, an)) / poly(&C4, an).exp()
    } else {
        (y - poly(&C5, log_n)) / poly(&C6, log_n).exp()
    };

    NormalityResult {
        statistic: w,
        p_value: normal.sf(z),
    }
}

/// D'Agostino K-squared omnibus normality test.
///
/// Combines the skewness test of D'Agostino (1970) with the kurtosis
/// test of Anscombe and Glynn (1983); K-squared is chi-squared with two
/// degrees of freedom under the null.
///
/// # Panics
///
/// Panics if fewer than 8 samples are supplied; the skewness
/// approximation is not defined below that.
pub fn dagostino_k2(samples: &[f64]) -> NormalityResult {
    assert!(
        samples.len() >= 8,
        "D'Agostino K-squared requires at least 8 samples"
    );

    let z1 = skewness_statistic(samples);
    let z2 = kurtosis_statistic(samples);
    let k2 = z1 * z1 + z2 * z2;

    let chi2 = ChiSquared::new(2.0).expect("two degrees of freedom is a valid chi-squared");
    NormalityResult {
        statistic: k2,
        p_value: chi2.sf(k2),
    }
}

/// Biased central moments (m2, m3, m4) with the 1/n normalization.
fn central_moments(samples: &[f64]) -> (f64, f64, f64) {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;

    let mut m2 = 0.0;
    let mut m3 = 0.0;
    let mut m4 = 0.0;
    for &v in samples {
        let d = v - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    (m2 / n, m3 / n, m4 / n)
}

/// Normalized skewness test statistic, D'Agostino (1970).
fn skewness_statistic(samples: &[f64]) -> f64 {
    let n = samples.len() as f64;
    let (m2, m3, _) = central_moments(samples);
    let b1 = m3 / m2.powf(1.5);

    let y = b1 * (((n + 1.0) * (n + 3.0)) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    let y = if y == 0.0 { 1.0 } else { y };

    delta * (y / alpha + ((y / alpha) * (y / alpha) + 1.0).sqrt()).ln()
}

/// Normalized kurtosis test statistic, Anscombe and Glynn (1983).
fn kurtosis_statistic(samples: &[f64]) -> f64 {
    let n = samples.len() as f64;
    let (m2, _, m4) = central_moments(samples);
    let b2 = m4 / (m2 * m2);

    let e = 3.0 * (n - 1.0) / (n + 1.0);
    let var_b2 =
        24.0 * n * (n - 2.0) * (n - 3.0) / ((n + 1.0) * (n + 1.0) * (n + 3.0) * (n + 5.0));
    let x = (b2 - e) / var_b2.sqrt();

    let sqrt_beta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * ((6.0 * (n + 3.0) * (n + 5.0)) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());

    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();

    (term1 - term2) / (2.0 / (9.0 * a)).sqrt()
}
