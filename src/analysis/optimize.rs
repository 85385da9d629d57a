//! Bounded global minimization via differential evolution.
//!
//! The fit layer maximizes its likelihood inside parameter bounds before
//! posterior sampling, so the sampler starts at the mode rather than the
//! generalized least squares estimate. Differential evolution handles the
//! bounded, derivative-free setting with few knobs: the best/1/bin scheme
//! with a dithered mutation factor and binomial crossover.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Population members per parameter dimension.
const POPULATION_FACTOR: usize = 15;

/// Hard cap on generations.
const MAX_GENERATIONS: usize = 1000;

/// Binomial crossover probability.
const RECOMBINATION: f64 = 0.7;

/// Converged when the population energy spread falls below this fraction
/// of the mean energy magnitude.
const CONVERGENCE_TOL: f64 = 0.01;

/// Minimize `objective` inside `bounds` with differential evolution.
///
/// Candidate parameters are clamped to their bounds after mutation, so the
/// returned minimizer always lies inside the box. Deterministic for a
/// given seed.
///
/// # Panics
///
/// Panics if `bounds` is empty or any bound pair is not ordered.
pub fn differential_evolution<F>(objective: F, bounds: &[(f64, f64)], seed: u64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let dims = bounds.len();
    assert!(dims > 0, "At least one bounded parameter is required");
    for (low, high) in bounds {
        assert!(low < high, "Bounds must be ordered low < high");
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let pop_size = POPULATION_FACTOR * dims;

    let mut population: Vec<Vec<f64>> = (0..pop_size)
        .map(|_| {
            bounds
                .iter()
                .map(|&(low, high)| rng.random_range(low..high))
                .collect()
        })
        .collect();
    let mut energies: Vec<f64> = population.iter().map(|member| objective(member)).collect();
    let mut best = argmin(&energies);

    for _ in 0..MAX_GENERATIONS {
        // One dithered mutation factor per generation, shared by all members
        let mutation = rng.random_range(0.5..1.0);

        for i in 0..pop_size {
            let r1 = pick_excluding(&mut rng, pop_size, &[i, best]);
            let r2 = pick_excluding(&mut rng, pop_size, &[i, best, r1]);
            let forced = rng.random_range(0..dims);

            let mut trial = population[i].clone();
            for d in 0..dims {
                if d == forced || rng.random::<f64>() < RECOMBINATION {
                    let value =
                        population[best][d] + mutation * (population[r1][d] - population[r2][d]);
                    trial[d] = value.clamp(bounds[d].0, bounds[d].1);
                }
            }

            let trial_energy = objective(&trial);
            if trial_energy <= energies[i] {
                population[i] = trial;
                energies[i] = trial_energy;
                if trial_energy < energies[best] {
                    best = i;
                }
            }
        }

        if converged(&energies) {
            break;
        }
    }

    population[best].clone()
}

fn pick_excluding<R: Rng>(rng: &mut R, pop_size: usize, excluded: &[usize]) -> usize {
    loop {
        let candidate = rng.random_range(0..pop_size);
        if !excluded.contains(&candidate) {
            return candidate;
        }
    }
}

fn argmin(energies: &[f64]) -> usize {
    let mut best = 0;
    for (i, energy) in energies.iter().enumerate() {
        if *energy < energies[best] {
            best = i;
        }
    }
    best
}

fn converged(energies: &[f64]) -> bool {
    let n = energies.len() as f64;
    let mean = energies.iter().sum::<f64>() / n;
    let variance = energies.iter().map(|e| (e - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt() <= CONVERGENCE_TOL * mean.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recovers_quadratic_minimum() {
        let objective = |x: &[f64]| (x[0] - 3.0).powi(2) + (x[1] + 2.0).powi(2);
        let bounds = [(-10.0, 10.0), (-10.0, 10.0)];

        let result = differential_evolution(objective, &bounds, 42);

        assert!((result[0] - 3.0).abs() < 1e-2, "x = {}", result[0]);
        assert!((result[1] + 2.0).abs() < 1e-2, "y = {}", result[1]);
    }

    #[test]
    fn test_seeded_runs_are_identical() {
        let objective = |x: &[f64]| x[0].powi(2) + (x[1] - 1.0).powi(4);
        let bounds = [(-5.0, 5.0), (-5.0, 5.0)];

        let first = differential_evolution(objective, &bounds, 7);
        let second = differential_evolution(objective, &bounds, 7);

        assert_eq!(first, second);
    }

    #[test]
    fn test_minimum_on_bound_is_reachable() {
        // True minimum at 5 lies outside the box; the clamp pins the
        // population to the nearest boundary
        let objective = |x: &[f64]| (x[0] - 5.0).powi(2);
        let bounds = [(0.0, 1.0)];

        let result = differential_evolution(objective, &bounds, 11);

        assert!((result[0] - 1.0).abs() < 1e-3, "x = {}", result[0]);
    }

    #[test]
    fn test_stays_inside_bounds() {
        let objective = |x: &[f64]| -(x[0].powi(2) + x[1].powi(2));
        let bounds = [(-1.0, 2.0), (0.5, 3.0)];

        let result = differential_evolution(objective, &bounds, 13);

        assert!(result[0] >= -1.0 && result[0] <= 2.0);
        assert!(result[1] >= 0.5 && result[1] <= 3.0);
    }

    #[test]
    #[should_panic(expected = "Bounds must be ordered")]
    fn test_inverted_bounds_panic() {
        let _ = differential_evolution(|x: &[f64]| x[0], &[(1.0, 0.0)], 1);
    }
}
