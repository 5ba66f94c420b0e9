use super::{Material, initial_velocity};
use crate::core::models::particle::Particle;
use itertools::iproduct;
use nalgebra::Vector3;
use rand::Rng;

/// Lattice sphere: every point `center + spacing·(i, j, k)` with
/// `i² + j² + k² ≤ radius²`.
///
/// In two dimensions only the `k = 0` slice is generated, which is the disc of the same
/// radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Sphere {
    pub center: Vector3<f64>,
    pub radius: usize,
    pub spacing: f64,
    pub velocity: Vector3<f64>,
    pub brownian_mean: f64,
    pub material: Material,
}

impl Default for Sphere {
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

impl Sphere {
    pub fn generate<R: Rng + ?Sized>(&self, dimensions: usize, rng: &mut R) -> Vec<Particle> {
        let r = self.radius as isize;
        let depth = if dimensions == 2 { 0 } else { r };
        iproduct!(-depth..=depth, -r..=r, -r..=r)
            .filter(|(k, j, i)| i * i + j * j + k * k <= r * r)
            .map(|(k, j, i)| {
                let offset = Vector3::new(i as f64, j as f64, k as f64) * self.spacing;
                let velocity =
                    initial_velocity(&self.velocity, self.brownian_mean, dimensions, rng);
                self.material.spawn(self.center + offset, velocity)
            })
            .collect()
    }
}
