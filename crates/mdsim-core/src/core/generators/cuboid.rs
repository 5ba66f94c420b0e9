use super::{Material, initial_velocity};
use crate::core::models::particle::Particle;
use itertools::iproduct;
use nalgebra::Vector3;
use rand::Rng;
use std::collections::HashSet;

/// Rectangular lattice of `counts[0] × counts[1] × counts[2]` particles.
///
/// The particle at lattice coordinate `(i, j, k)` sits at `origin + spacing·(i, j, k)`.
/// In two dimensions only the `k = 0` layer is generated.
#[derive(Debug, Clone, PartialEq)]
pub struct Cuboid {
    pub origin: Vector3<f64>,
    pub counts: [usize; 3],
    pub spacing: f64,
    pub velocity: Vector3<f64>,
    pub brownian_mean: f64,
    pub material: Material,
    /// Wires the lattice as a membrane: every particle records its axis-aligned
    /// lattice neighbors as direct and its in-plane diagonal neighbors as diagonal.
    pub membrane: bool,
    /// Lattice coordinates of particles that receive the membrane pull force.
    pub marked: Vec<[usize; 3]>,
}

impl Default for Cuboid {
    fn default() -> Self {
        Self {
            origin: Vector3::zeros(),
            counts: [1, 1, 1],
            spacing: 1.0,
            velocity: Vector3::zeros(),
            brownian_mean: 0.0,
            material: Material::default(),
            membrane: false,
            marked: Vec::new(),
        }
    }
}

const DIRECT_OFFSETS: [[isize; 3]; 6] = [
    [-1, 0, 0],
    [1, 0, 0],
    [0, -1, 0],
    [0, 1, 0],
    [0, 0, -1],
    [0, 0, 1],
];
const DIAGONAL_OFFSETS: [[isize; 3]; 4] = [[-1, -1, 0], [1, -1, 0], [-1, 1, 0], [1, 1, 0]];

impl Cuboid {
    fn layer_counts(&self, dimensions: usize) -> [usize; 3] {
        let [nx, ny, nz] = self.counts;
        [nx, ny, if dimensions == 2 { nz.min(1) } else { nz }]
    }

    /// Number of particles [`generate`](Self::generate) produces.
    pub fn particle_count(&self, dimensions: usize) -> usize {
        self.layer_counts(dimensions).iter().product()
    }

    pub fn generate<R: Rng + ?Sized>(&self, dimensions: usize, rng: &mut R) -> Vec<Particle> {
        let counts = self.layer_counts(dimensions);
        let [nx, ny, nz] = counts;
        let marked: HashSet<[usize; 3]> = self.marked.iter().copied().collect();

        let mut particles: Vec<Particle> = iproduct!(0..nz, 0..ny, 0..nx)
            .map(|(k, j, i)| {
                let offset = Vector3::new(i as f64, j as f64, k as f64) * self.spacing;
                let velocity =
                    initial_velocity(&self.velocity, self.brownian_mean, dimensions, rng);
                let mut particle = self.material.spawn(self.origin + offset, velocity);
                particle.marked = marked.contains(&[i, j, k]);
                particle
            })
            .collect();

        if self.membrane {
            self.connect(&mut particles, counts);
        }
        particles
    }

    fn connect(&self, particles: &mut [Particle], counts: [usize; 3]) {
        let [nx, ny, nz] = counts;
        let index = |i: usize, j: usize, k: usize| i + nx * (j + ny * k);
        let neighbor = |coords: [usize; 3], offset: &[isize; 3]| -> Option<usize> {
            let mut shifted = [0usize; 3];
            for axis in 0..3 {
                let c = coords[axis].checked_add_signed(offset[axis])?;
                if c >= counts[axis] {
                    return None;
                }
                shifted[axis] = c;
            }
            Some(index(shifted[0], shifted[1], shifted[2]))
        };

        let ids: Vec<_> = particles.iter().map(Particle::id).collect();
        for (k, j, i) in iproduct!(0..nz, 0..ny, 0..nx) {
            let coords = [i, j, k];
            let particle = &mut particles[index(i, j, k)];
            particle.direct_neighbors = DIRECT_OFFSETS
                .iter()
                .filter_map(|offset| neighbor(coords, offset))
                .map(|n| ids[n])
                .collect();
            particle.diagonal_neighbors = DIAGONAL_OFFSETS
                .iter()
                .filter_map(|offset| neighbor(coords, offset))
                .map(|n| ids[n])
                .collect();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(5)
    }

    #[test]
    fn generates_full_lattice_in_three_dimensions() {
        let cuboid = Cuboid {
            origin: Vector3::new(1.0, 2.0, 3.0),
            counts: [4, 3, 2],
            spacing: 1.5,
            velocity: Vector3::new(0.0, -10.0, 0.0),
            ..Cuboid::default()
        };
        let particles = cuboid.generate(3, &mut rng());
        assert_eq!(particles.len(), 24);
        assert_eq!(cuboid.particle_count(3), 24);
        assert_eq!(particles[0].position, Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(particles[1].position, Vector3::new(2.5, 2.0, 3.0));
        assert_eq!(particles[23].position, Vector3::new(5.5, 5.0, 4.5));
        assert!(particles.iter().all(|p| p.velocity == Vector3::new(0.0, -10.0, 0.0)));
    }

    #[test]
    fn two_dimensional_generation_keeps_a_single_layer() {
        let cuboid = Cuboid {
            counts: [4, 3, 2],
            brownian_mean: 0.1,
            ..Cuboid::default()
        };
        let particles = cuboid.generate(2, &mut rng());
        assert_eq!(particles.len(), 12);
        assert!(particles.iter().all(|p| p.position.z == 0.0 && p.velocity.z == 0.0));
        assert!(particles.iter().any(|p| p.velocity.x != 0.0));
    }

    #[test]
    fn membrane_wires_direct_and_diagonal_neighbors() {
        let cuboid = Cuboid {
            counts: [3, 3, 1],
            membrane: true,
            ..Cuboid::default()
        };
        let particles = cuboid.generate(3, &mut rng());

        let center = &particles[4];
        assert_eq!(center.direct_neighbors.len(), 4);
        assert_eq!(center.diagonal_neighbors.len(), 4);
        let corner = &particles[0];
        assert_eq!(corner.direct_neighbors.len(), 2);
        assert_eq!(corner.diagonal_neighbors.len(), 1);
        assert!(corner.direct_neighbors.contains(&particles[1].id()));
        assert!(corner.direct_neighbors.contains(&particles[3].id()));
        assert_eq!(corner.diagonal_neighbors, vec![particles[4].id()]);

        for p in &particles {
            for n in p.direct_neighbors.iter().chain(&p.diagonal_neighbors) {
                let other = particles.iter().find(|q| q.id() == *n).unwrap();
                assert!(other.is_neighbor_of(p.id()), "neighbor lists must be symmetric");
            }
        }
        let direct: usize = particles.iter().map(|p| p.direct_neighbors.len()).sum();
        let diagonal: usize = particles.iter().map(|p| p.diagonal_neighbors.len()).sum();
        assert_eq!(direct / 2, 12);
        assert_eq!(diagonal / 2, 8);
    }

    #[test]
    fn marked_coordinates_are_flagged() {
        let cuboid = Cuboid {
            counts: [3, 2, 1],
            marked: vec![[2, 1, 0]],
            ..Cuboid::default()
        };
        let particles = cuboid.generate(2, &mut rng());
        let marked: Vec<_> = particles.iter().filter(|p| p.marked).collect();
        assert_eq!(marked.len(), 1);
        assert_eq!(marked[0].position, Vector3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn plain_cuboid_has_no_topology() {
        let particles = Cuboid {
            counts: [2, 2, 2],
            ..Cuboid::default()
        }
        .generate(3, &mut rng());
        assert!(particles.iter().all(|p| p.direct_neighbors.is_empty()));
    }
}
