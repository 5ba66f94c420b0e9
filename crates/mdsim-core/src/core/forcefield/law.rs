use super::potentials::{self, LJ_MINIMUM_FACTOR};
use crate::core::models::particle::Particle;
use nalgebra::Vector3;
use std::fmt;
use std::str::FromStr;

/// Selects the pairwise interaction evaluated between particles.
///
/// The set of laws is closed, so the strategy is an enum and the match in
/// [`ForceLaw::compute`] inlines into the pair loop of the containers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ForceLaw {
    /// Newtonian gravity with unit gravitational constant.
    Gravity,
    /// 12-6 Lennard-Jones using the particles' own `epsilon`/`sigma`, mixed with the
    /// Lorentz-Berthelot rules when they differ.
    #[default]
    LennardJones,
    /// Hookean spring between two particles.
    Harmonic {
        /// Spring constant `k`.
        stiffness: f64,
        /// Rest length `r₀`.
        rest_length: f64,
    },
}

impl ForceLaw {
    /// Computes the force exerted on `p1` by `p2`.
    ///
    /// The force on `p2` is the negation of the returned vector.
    #[inline]
    pub fn compute(&self, p1: &Particle, p2: &Particle) -> Vector3<f64> {
        self.compute_with_offset(p1, p2, &Vector3::zeros())
    }

    /// Computes the force exerted on `p1` by the image of `p2` translated by `offset`.
    ///
    /// Used for pairs that interact across a periodic boundary.
    #[inline]
    pub fn compute_with_offset(
        &self,
        p1: &Particle,
        p2: &Particle,
        offset: &Vector3<f64>,
    ) -> Vector3<f64> {
        let dx = p2.position + offset - p1.position;
        match *self {
            ForceLaw::Gravity => potentials::gravity(&dx, p1.mass, p2.mass),
            ForceLaw::LennardJones => {
                let (epsilon, sigma) =
                    potentials::mix_lorentz_berthelot(p1.epsilon, p1.sigma, p2.epsilon, p2.sigma);
                potentials::lennard_jones(&dx, epsilon, sigma)
            }
            ForceLaw::Harmonic {
                stiffness,
                rest_length,
            } => potentials::harmonic(&dx, stiffness, rest_length),
        }
    }

    /// Computes the repulsive-only Lennard-Jones force on `p1` from a mirror image of
    /// itself located at `ghost_position`.
    ///
    /// Returns zero once the image is farther away than the potential minimum
    /// `2^(1/6)σ`.
    #[inline]
    pub fn ghost_repulsion(p1: &Particle, ghost_position: &Vector3<f64>) -> Vector3<f64> {
        let dx = ghost_position - p1.position;
        let limit = LJ_MINIMUM_FACTOR * p1.sigma;
        if dx.norm_squared() > limit * limit {
            return Vector3::zeros();
        }
        potentials::lennard_jones(&dx, p1.epsilon, p1.sigma)
    }

    /// Returns `true` if the Lennard-Jones interaction between the two particles is in
    /// its repulsive range (`d ≤ 2^(1/6)σ`).
    #[inline]
    pub fn is_repulsive_range(p1: &Particle, p2: &Particle, offset: &Vector3<f64>) -> bool {
        let (_, sigma) =
            potentials::mix_lorentz_berthelot(p1.epsilon, p1.sigma, p2.epsilon, p2.sigma);
        let limit = LJ_MINIMUM_FACTOR * sigma;
        (p2.position + offset - p1.position).norm_squared() <= limit * limit
    }
}

impl fmt::Display for ForceLaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForceLaw::Gravity => write!(f, "gravity"),
            ForceLaw::LennardJones => write!(f, "lennard-jones"),
            ForceLaw::Harmonic {
                stiffness,
                rest_length,
            } => write!(f, "harmonic(k={}, r0={})", stiffness, rest_length),
        }
    }
}

impl FromStr for ForceLaw {
    type Err = ();

    /// Parses the parameterless force laws. Case-insensitive; accepts `lj` as an alias.
    ///
    /// # Errors
    ///
    /// Returns `()` for unknown names and for `harmonic`, which needs parameters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gravity" => Ok(ForceLaw::Gravity),
            "lennard-jones" | "lennard_jones" | "lj" => Ok(ForceLaw::LennardJones),
            _ => Err(()),
        }
    }
}
