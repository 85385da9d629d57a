//! Core data types for displacement observations.

use nalgebra::Vector3;

/// A single displacement observation in three dimensions, in the length
/// unit of the trajectory.
pub type Displacement = Vector3<f64>;

/// All displacement observations for one time interval.
///
/// Stores an `n_particles x n_observations` grid of three-dimensional
/// displacement vectors in particle-major order. Each observation is the
/// displacement of one particle over one realization of the interval;
/// overlapping windows of the same trajectory contribute separate
/// observations.
#[derive(Debug, Clone)]
pub struct DisplacementBlock {
    data: Vec<Displacement>,
    n_particles: usize,
    n_observations: usize,
}

impl DisplacementBlock {
    /// Create a block of zero displacements.
    pub fn zeros(n_particles: usize, n_observations: usize) -> Self {
        Self {
            data: vec![Displacement::zeros(); n_particles * n_observations],
            n_particles,
            n_observations,
        }
    }

    /// Create a block from a flat particle-major vector of displacements.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != n_particles * n_observations`.
    pub fn from_vectors(data: Vec<Displacement>, n_particles: usize, n_observations: usize) -> Self {
        assert_eq!(
            data.len(),
            n_particles * n_observations,
            "Displacement data must hold n_particles * n_observations vectors"
        );
        Self {
            data,
            n_particles,
            n_observations,
        }
    }

    /// Number of particles in the block.
    pub fn n_particles(&self) -> usize {
        self.n_particles
    }

    /// Number of displacement observations per particle.
    pub fn n_observations(&self) -> usize {
        self.n_observations
    }

    /// Displacement of one particle in one observation window.
    ///
    /// # Panics
    ///
    /// Panics if `particle` or `observation` is out of range.
    pub fn get(&self, particle: usize, observation: usize) -> &Displacement {
        assert!(particle < self.n_particles, "Particle index out of range");
        assert!(
            observation < self.n_observations,
            "Observation index out of range"
        );
        &self.data[particle * self.n_observations + observation]
    }

    /// Overwrite the displacement of one particle in one observation window.
    ///
    /// # Panics
    ///
    /// Panics if `particle` or `observation` is out of range.
    pub fn set(&mut self, particle: usize, observation: usize, value: Displacement) {
        assert!(particle < self.n_particles, "Particle index out of range");
        assert!(
            observation < self.n_observations,
            "Observation index out of range"
        );
        self.data[particle * self.n_observations + observation] = value;
    }

    /// Squared magnitude of every observation, particle-major.
    ///
    /// This is the sample pool for mean squared displacement resampling:
    /// one value per particle per observation window.
    pub fn squared_displacements(&self) -> Vec<f64> {
        self.data.iter().map(|d| d.norm_squared()).collect()
    }

    /// Squared magnitude of the summed displacement of `indices` at each
    /// observation window.
    ///
    /// The displacements of the selected particles are summed before
    /// squaring, which captures their collective (cross-correlated) motion.
    /// One value per observation window. An empty `indices` selects every
    /// particle.
    ///
    /// # Panics
    ///
    /// Panics if any index in `indices` is out of range.
    pub fn collective_squared_displacements(&self, indices: &[usize]) -> Vec<f64> {
        assert!(
            indices.iter().all(|&p| p < self.n_particles),
            "Particle index out of range"
        );

        let everyone: Vec<usize>;
        let selected = if indices.is_empty() {
            everyone = (0..self.n_particles).collect();
            &everyone[..]
        } else {
            indices
        };

        (0..self.n_observations)
            .map(|obs| {
                let mut sum = Displacement::zeros();
                for &particle in selected {
                    sum += self.data[particle * self.n_observations + obs];
                }
                sum.norm_squared()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_2x2() -> DisplacementBlock {
        // particle 0: (1,0,0), (0,2,0); particle 1: (0,0,3), (1,1,1)
        DisplacementBlock::from_vectors(
            vec![
                Displacement::new(1.0, 0.0, 0.0),
                Displacement::new(0.0, 2.0, 0.0),
                Displacement::new(0.0, 0.0, 3.0),
                Displacement::new(1.0, 1.0, 1.0),
            ],
            2,
            2,
        )
    }

    #[test]
    fn test_get_uses_particle_major_layout() {
        let block = block_2x2();
        assert_eq!(block.get(0, 1), &Displacement::new(0.0, 2.0, 0.0));
        assert_eq!(block.get(1, 0), &Displacement::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn test_squared_displacements() {
        let block = block_2x2();
        let sq = block.squared_displacements();
        assert_eq!(sq, vec![1.0, 4.0, 9.0, 3.0]);
    }

    #[test]
    fn test_collective_squared_displacements() {
        let block = block_2x2();
        // Observation 0: (1,0,0) + (0,0,3) = (1,0,3), |.|^2 = 10
        // Observation 1: (0,2,0) + (1,1,1) = (1,3,1), |.|^2 = 11
        let sq = block.collective_squared_displacements(&[0, 1]);
        assert_eq!(sq, vec![10.0, 11.0]);
    }

    #[test]
    fn test_collective_subset_matches_single_particle() {
        let block = block_2x2();
        let collective = block.collective_squared_displacements(&[1]);
        assert_eq!(collective, vec![9.0, 3.0]);
    }

    #[test]
    fn test_collective_empty_indices_selects_all() {
        let block = block_2x2();
        assert_eq!(
            block.collective_squared_displacements(&[]),
            block.collective_squared_displacements(&[0, 1])
        );
    }

    #[test]
    fn test_set_overwrites() {
        let mut block = DisplacementBlock::zeros(1, 2);
        block.set(0, 1, Displacement::new(0.0, 4.0, 0.0));
        assert_eq!(block.squared_displacements(), vec![0.0, 16.0]);
    }

    #[test]
    #[should_panic(expected = "n_particles * n_observations")]
    fn test_from_vectors_length_mismatch_panics() {
        DisplacementBlock::from_vectors(vec![Displacement::zeros(); 3], 2, 2);
    }

    #[test]
    #[should_panic(expected = "Particle index out of range")]
    fn test_collective_out_of_range_panics() {
        block_2x2().collective_squared_displacements(&[0, 2]);
    }
}
