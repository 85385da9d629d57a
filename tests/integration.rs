//! End-to-end integration tests.

use diffusivity::{
    estimate_diffusion, msd_bootstrap, output, AnalysisError, BootstrapConfig, DiffusionModel,
    DiffusionSummary, Displacement, DisplacementBlock, FitError, LengthUnit, TimeUnit, Units,
};
use statrs::distribution::{ContinuousCDF, Normal};

const FS_ANGSTROM: Units = Units {
    time: TimeUnit::Femtosecond,
    length: LengthUnit::Angstrom,
};

/// Displacement blocks whose squared magnitudes average to
/// `gradient * delta_t` at every interval.
///
/// The pool values sit at normal scores around the target, so each
/// resampled mean is close to Gaussian and converges without growth.
fn linear_blocks(
    delta_t: &[f64],
    gradient: f64,
    n_particles: usize,
    n_observations: usize,
) -> Vec<DisplacementBlock> {
    let normal = Normal::new(0.0, 1.0).unwrap();
    let count = n_particles * n_observations;
    delta_t
        .iter()
        .map(|&t| {
            let data = (0..count)
                .map(|i| {
                    let position = (i as f64 + 0.625) / (count as f64 + 0.25);
                    let squared = gradient * t + 0.5 * normal.inverse_cdf(position);
                    Displacement::new(squared.sqrt(), 0.0, 0.0)
                })
                .collect();
            DisplacementBlock::from_vectors(data, n_particles, n_observations)
        })
        .collect()
}

/// Basic smoke test that the front-door API works.
#[test]
fn smoke_test() {
    let delta_t: Vec<f64> = (1..=8).map(|i| i as f64).collect();
    let blocks = linear_blocks(&delta_t, 6.0, 10, 6);

    let model = estimate_diffusion(&delta_t, &blocks, FS_ANGSTROM).expect("Pipeline should run");

    // Gradient 6 in A^2/fs maps to D = 0.1 cm^2/s.
    let d = model.diffusion_coefficient();
    assert!((d.value - 0.1).abs() < 0.02, "D = {}", d.value);
    assert!(d.uncertainty > 0.0 && d.uncertainty.is_finite());
    assert_eq!(model.summary().n_points, 8);
}

/// Seeded configuration gives reproducible bootstrap output.
#[test]
fn config_surface() {
    let delta_t = [1.0, 2.0, 3.0, 4.0];
    let blocks = linear_blocks(&delta_t, 6.0, 8, 5);
    let config = BootstrapConfig {
        n_resamples: 200,
        seed: Some(99),
        progress: false,
        ..Default::default()
    };

    let first = msd_bootstrap(&delta_t, &blocks, &config).unwrap();
    let second = msd_bootstrap(&delta_t, &blocks, &config).unwrap();

    assert_eq!(first.means, second.means);
    assert_eq!(first.errors, second.errors);
    assert!(first.distributions.iter().all(|d| d.size() >= 200));
}

/// Intervals without independent samples are dropped, and a fit needs
/// at least two survivors.
#[test]
fn too_few_intervals_error() {
    // One particle with one observation per interval: no interval keeps
    // more than one independent sample, so every interval is dropped.
    let delta_t = [1.0, 2.0, 3.0];
    let blocks = vec![
        DisplacementBlock::from_vectors(vec![Displacement::new(1.0, 0.0, 0.0)], 1, 1),
        DisplacementBlock::from_vectors(vec![Displacement::new(1.5, 0.0, 0.0)], 1, 1),
        DisplacementBlock::from_vectors(vec![Displacement::new(2.0, 0.0, 0.0)], 1, 1),
    ];

    let err = estimate_diffusion(&delta_t, &blocks, FS_ANGSTROM).unwrap_err();
    match err {
        AnalysisError::Fit(FitError::TooFewPoints { available }) => assert_eq!(available, 0),
        other => panic!("Expected a fit error, got {:?}", other),
    }
    assert!(format!("{}", err).contains("diffusion fit failed"));
}

/// Unit selection rescales the coefficient without touching the fit.
#[test]
fn unit_conversion_is_exact() {
    let delta_t: Vec<f64> = (1..=6).map(|i| i as f64).collect();
    let blocks = linear_blocks(&delta_t, 6.0, 8, 5);
    let config = BootstrapConfig {
        seed: Some(3),
        progress: false,
        ..Default::default()
    };
    let bootstrap = msd_bootstrap(&delta_t, &blocks, &config).unwrap();

    let fs_model = DiffusionModel::from_bootstrap(&bootstrap, FS_ANGSTROM).unwrap();
    let ps_model = DiffusionModel::from_bootstrap(
        &bootstrap,
        Units {
            time: TimeUnit::Picosecond,
            length: LengthUnit::Angstrom,
        },
    )
    .unwrap();

    // A^2/ps carries a factor 1e-3 relative to A^2/fs.
    let ratio = ps_model.diffusion_coefficient().value / fs_model.diffusion_coefficient().value;
    assert!((ratio - 1e-3).abs() < 1e-12, "ratio = {}", ratio);
}

/// Seeded full pipeline recovers the target gradient tightly.
#[test]
fn seeded_pipeline_recovers_gradient() {
    let delta_t: Vec<f64> = (1..=8).map(|i| i as f64).collect();
    let blocks = linear_blocks(&delta_t, 6.0, 10, 6);
    let config = BootstrapConfig {
        seed: Some(11),
        progress: false,
        ..Default::default()
    };

    let bootstrap = msd_bootstrap(&delta_t, &blocks, &config).unwrap();
    assert!(bootstrap.warnings.is_empty());
    assert_eq!(bootstrap.delta_t.len(), 8);

    let (lower, upper) = bootstrap.confidence_band();
    for i in 0..8 {
        assert!(lower[i] < bootstrap.means[i] && bootstrap.means[i] < upper[i]);
    }

    let model = DiffusionModel::from_bootstrap(&bootstrap, FS_ANGSTROM).unwrap();
    let d = model.diffusion_coefficient();
    assert!((d.value - 0.1).abs() < 0.005, "D = {}", d.value);
    assert!(model.intercept_offset().value.abs() < 0.5);
}

/// Summaries serialize to JSON and render for the terminal.
#[test]
fn result_serialization() {
    let delta_t = [1.0, 2.0, 3.0, 4.0];
    let blocks = linear_blocks(&delta_t, 6.0, 8, 5);
    let config = BootstrapConfig {
        seed: Some(21),
        progress: false,
        ..Default::default()
    };
    let bootstrap = msd_bootstrap(&delta_t, &blocks, &config).unwrap();
    let model = DiffusionModel::from_bootstrap(&bootstrap, FS_ANGSTROM).unwrap();
    let summary = model.summary();

    let json = output::json::to_json(&summary).expect("Should serialize");
    assert!(json.contains("diffusion_coefficient"));
    assert!(json.contains("\"n_points\":4"));

    let pretty = output::json::to_json_pretty(&summary).expect("Should serialize");
    assert!(pretty.contains('\n'));

    let back: DiffusionSummary = serde_json::from_str(&json).expect("Should deserialize");
    assert_eq!(back.n_points, 4);
    assert!((back.diffusion_coefficient.value - summary.diffusion_coefficient.value).abs() < 1e-15);

    let report = output::terminal::format_summary(&summary);
    assert!(report.contains("D:"));
    assert!(report.contains("Point estimate only"));
}
