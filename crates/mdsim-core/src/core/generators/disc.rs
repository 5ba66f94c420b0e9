use super::{Material, initial_velocity};
use crate::core::models::particle::Particle;
use itertools::iproduct;
use nalgebra::Vector3;
use rand::Rng;

/// Lattice disc in the plane `z = center.z`.
///
/// Contains every lattice point `center + spacing·(i, j, 0)` with `i² + j² ≤ radius²`,
/// so `radius` is measured in molecules rather than length units.
#[derive(Debug, Clone, PartialEq)]
pub struct Disc {
    pub center: Vector3<f64>,
    pub radius: usize,
    pub spacing: f64,
    pub velocity: Vector3<f64>,
    pub brownian_mean: f64,
    pub material: Material,
}

impl Default for Disc {
    fn default() -> Self {
        Self {
            center: Vector3::zeros(),
            radius: 1,
            spacing: 1.0,
            velocity: Vector3::zeros(),
            brownian_mean: 0.0,
            material: Material::default(),
        }
    }
}

impl Disc {
    pub fn generate<R: Rng + ?Sized>(&self, dimensions: usize, rng: &mut R) -> Vec<Particle> {
        let r = self.radius as isize;
        iproduct!(-r..=r, -r..=r)
            .filter(|(j, i)| i * i + j * j <= r * r)
            .map(|(j, i)| {
                let offset = Vector3::new(i as f64, j as f64, 0.0) * self.spacing;
                let velocity =
                    initial_velocity(&self.velocity, self.brownian_mean, dimensions, rng);
                self.material.spawn(self.center + offset, velocity)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn disc_contains_lattice_points_within_radius() {
        let mut rng = StdRng::seed_from_u64(0);
        let disc = Disc {
            center: Vector3::new(10.0, 10.0, 0.0),
            radius: 2,
            spacing: 0.5,
            ..Disc::default()
        };
        let particles = disc.generate(2, &mut rng);
        assert_eq!(particles.len(), 13);
        for p in &particles {
            assert!((p.position - disc.center).norm() <= 1.0 + 1e-12);
            assert_eq!(p.position.z, 0.0);
        }
    }

    #[test]
    fn radius_zero_yields_single_particle_at_center() {
        let mut rng = StdRng::seed_from_u64(0);
        let disc = Disc {
            center: Vector3::new(1.0, 2.0, 0.0),
            radius: 0,
            ..Disc::default()
        };
        let particles = disc.generate(2, &mut rng);
        assert_eq!(particles.len(), 1);
        assert_eq!(particles[0].position, disc.center);
    }
}
