//! Positive definite validation and repair for covariance matrices.
//!
//! Weighted fitting inverts the covariance matrix of the observations,
//! which is only possible when the matrix is positive definite. Estimated
//! covariances can fail that requirement through numerical noise; this
//! module substitutes the nearest positive definite matrix, following
//! Higham's projection (1988, 10.1016/0024-3795(88)90223-6) with
//! eigenvalue clipping in correlation space and a growing diagonal
//! loading as the fallback.

use nalgebra::{DMatrix, DVector};

use crate::constants::MAX_REPAIR_ITERATIONS;

/// Eigenvalue floor for the clipped correlation projection.
const EIGEN_FLOOR: f64 = 1e-15;

/// Check whether a matrix is positive definite via Cholesky decomposition.
pub fn is_positive_definite(matrix: &DMatrix<f64>) -> bool {
    matrix.clone().cholesky().is_some()
}

/// Build a diagonal covariance matrix from per-point standard errors.
pub fn diagonal_covariance(errors: &[f64]) -> DMatrix<f64> {
    DMatrix::from_diagonal(&DVector::from_iterator(
        errors.len(),
        errors.iter().map(|e| e * e),
    ))
}

/// Find the nearest positive definite matrix to the one given.
///
/// Already positive definite input is returned unchanged. Otherwise the
/// matrix is rescaled to correlation form, its eigenvalues are clipped at
/// a small positive floor, and the result is scaled back. If rounding
/// still defeats the Cholesky check, growing multiples of the identity
/// are added until it passes.
///
/// The substitution is reported on stderr, matching the non-fatal
/// warning semantics of the rest of the pipeline.
///
/// # Panics
///
/// Panics if the diagonal loading fails to converge, which only happens
/// for non-finite input.
pub fn nearest_positive_definite(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    if is_positive_definite(matrix) {
        return matrix.clone();
    }

    eprintln!(
        "[diffusivity] the estimated covariance matrix is not positive definite; \
         the nearest positive definite matrix will be used instead"
    );

    let mut repaired = clipped_correlation_projection(matrix);
    if is_positive_definite(&repaired) {
        return repaired;
    }

    // Perturbation floor: one ulp of the Frobenius norm of the input.
    let spacing = float_spacing(matrix.norm());
    let n = matrix.nrows();
    let mut k: usize = 1;
    while !is_positive_definite(&repaired) {
        assert!(
            k <= MAX_REPAIR_ITERATIONS,
            "positive definite repair did not converge for a {n}x{n} matrix"
        );
        let min_eig = smallest_eigenvalue(&repaired);
        let loading = -min_eig * (k * k) as f64 + spacing;
        for i in 0..n {
            repaired[(i, i)] += loading;
        }
        k += 1;
    }

    repaired
}

/// Project onto a positive semidefinite matrix by clipping the
/// eigenvalues of the associated correlation matrix.
fn clipped_correlation_projection(matrix: &DMatrix<f64>) -> DMatrix<f64> {
    let n = matrix.nrows();

    // Covariance to correlation; degenerate zero-variance rows map to
    // zero correlation and are handled by the diagonal loading later.
    let std: Vec<f64> = (0..n).map(|i| matrix[(i, i)].max(0.0).sqrt()).collect();
    let mut corr = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            let denom = std[i] * std[j];
            corr[(i, j)] = if denom > 0.0 { matrix[(i, j)] / denom } else { 0.0 };
        }
    }

    // Eigendecompose the symmetric part and clip.
    let sym = (&corr + corr.transpose()) * 0.5;
    let mut eigen = sym.symmetric_eigen();
    let clipped = eigen.eigenvalues.iter().any(|&l| l < EIGEN_FLOOR);
    if clipped {
        for l in eigen.eigenvalues.iter_mut() {
            if *l < EIGEN_FLOOR {
                *l = EIGEN_FLOOR;
            }
        }
        let rebuilt = &eigen.eigenvectors
            * DMatrix::from_diagonal(&eigen.eigenvalues)
            * eigen.eigenvectors.transpose();

        // Renormalize to unit diagonal before scaling back.
        let rebuilt_std: Vec<f64> = (0..n).map(|i| rebuilt[(i, i)].max(0.0).sqrt()).collect();
        for i in 0..n {
            for j in 0..n {
                let denom = rebuilt_std[i] * rebuilt_std[j];
                corr[(i, j)] = if denom > 0.0 { rebuilt[(i, j)] / denom } else { 0.0 };
            }
        }
    }

    // Correlation back to covariance with the original scales.
    let mut result = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            result[(i, j)] = corr[(i, j)] * std[i] * std[j];
        }
    }
    result
}

/// Smallest eigenvalue of the symmetric part of a matrix.
fn smallest_eigenvalue(matrix: &DMatrix<f64>) -> f64 {
    let sym = (matrix + matrix.transpose()) * 0.5;
    sym.symmetric_eigen()
        .eigenvalues
        .iter()
        .fold(f64::INFINITY, |acc, &l| acc.min(l))
}

/// Distance from `x` to the next representable f64 above it.
fn float_spacing(x: f64) -> f64 {
    f64::from_bits(x.to_bits() + 1) - x
}
