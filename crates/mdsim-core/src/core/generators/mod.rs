//! # Particle Generators
//!
//! This module builds the initial particle sets of a simulation from simple geometric
//! bodies placed on a regular lattice.
//!
//! ## Overview
//!
//! Every body spawns particles sharing one [`Material`] (mass, Lennard-Jones parameters,
//! type tag and fixed flag) and one initial velocity. A thermal jitter drawn from the
//! Maxwell-Boltzmann distribution can be added on top through `brownian_mean`.
//!
//! ## Key Components
//!
//! - [`cuboid`] - Rectangular lattices, optionally wired as a membrane
//! - [`disc`] - Two-dimensional discs in the xy plane
//! - [`sphere`] - Lattice spheres, collapsing to discs in two dimensions
//! - [`ParticleSource`] - Closed set of bodies that a scenario can list

pub mod cuboid;
pub mod disc;
pub mod sphere;

use crate::core::models::particle::{DEFAULT_EPSILON, DEFAULT_SIGMA, Particle};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

pub use cuboid::Cuboid;
pub use disc::Disc;
pub use sphere::Sphere;

/// Per-particle properties shared by every particle of one body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub mass: f64,
    pub epsilon: f64,
    pub sigma: f64,
    pub type_id: i32,
    pub fixed: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            mass: 1.0,
            epsilon: DEFAULT_EPSILON,
            sigma: DEFAULT_SIGMA,
            type_id: 0,
            fixed: false,
        }
    }
}

impl Material {
    pub(crate) fn spawn(&self, position: Vector3<f64>, velocity: Vector3<f64>) -> Particle {
        let mut particle = Particle::new(position, velocity, self.mass)
            .with_lennard_jones(self.epsilon, self.sigma)
            .with_type(self.type_id);
        particle.fixed = self.fixed;
        particle
    }
}

/// Draws a velocity whose active components are `mean · N(0, 1)`.
///
/// Only the first `dimensions` components are populated, so two-dimensional
/// simulations never receive a z velocity.
pub fn maxwell_boltzmann_velocity<R: Rng + ?Sized>(
    mean: f64,
    dimensions: usize,
    rng: &mut R,
) -> Vector3<f64> {
    let mut velocity = Vector3::zeros();
    for axis in 0..dimensions.min(3) {
        let n: f64 = StandardNormal.sample(rng);
        velocity[axis] = mean * n;
    }
    velocity
}

/// Initial velocity of one lattice particle: the body velocity plus optional jitter.
fn initial_velocity<R: Rng + ?Sized>(
    velocity: &Vector3<f64>,
    brownian_mean: f64,
    dimensions: usize,
    rng: &mut R,
) -> Vector3<f64> {
    if brownian_mean > 0.0 {
        velocity + maxwell_boltzmann_velocity(brownian_mean, dimensions, rng)
    } else {
        *velocity
    }
}

/// A body listed in a scenario.
#[derive(Debug, Clone, PartialEq)]
pub enum ParticleSource {
    Cuboid(Cuboid),
    Disc(Disc),
    Sphere(Sphere),
}

impl ParticleSource {
    /// Spawns the particles of this body for a simulation with `dimensions` axes.
    pub fn generate<R: Rng + ?Sized>(&self, dimensions: usize, rng: &mut R) -> Vec<Particle> {
        match self {
            ParticleSource::Cuboid(cuboid) => cuboid.generate(dimensions, rng),
            ParticleSource::Disc(disc) => disc.generate(dimensions, rng),
            ParticleSource::Sphere(sphere) => sphere.generate(dimensions, rng),
        }
    }
}

/// Spawns the particles of every source in order.
pub fn generate_all<R: Rng + ?Sized>(
    sources: &[ParticleSource],
    dimensions: usize,
    rng: &mut R,
) -> Vec<Particle> {
    sources
        .iter()
        .flat_map(|source| source.generate(dimensions, rng))
        .collect()
}

/// Like [`generate_all`], drawing the thermal jitter from a generator seeded with `seed`,
/// or from system entropy when `None`.
pub fn generate_seeded(
    sources: &[ParticleSource],
    dimensions: usize,
    seed: Option<u64>,
) -> Vec<Particle> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    generate_all(sources, dimensions, &mut rng)
}
