use super::config::{MembraneConfig, SimulationConfig};
use crate::core::container::{NeighborKind, ParticleContainer};
use crate::core::forcefield::law::ForceLaw;
use crate::core::models::particle::Particle;
use nalgebra::Vector3;
use std::f64::consts::SQRT_2;

/// Everything that contributes to the force on a particle during one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interactions {
    pub law: ForceLaw,
    pub gravity: Option<Vector3<f64>>,
    pub membrane: Option<MembraneConfig>,
}

impl Interactions {
    pub fn new(law: ForceLaw) -> Self {
        Self {
            law,
            gravity: None,
            membrane: None,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            law: config.force_law,
            gravity: config.gravity,
            membrane: config.membrane,
        }
    }

    /// Force on `p1` from `p2` (translated by `offset`) under the configured law.
    ///
    /// With a membrane present, declared neighbors only interact through their springs
    /// and Lennard-Jones is cut off at its minimum so that it is purely repulsive.
    #[inline]
    pub fn pair_force(&self, p1: &Particle, p2: &Particle, offset: &Vector3<f64>) -> Vector3<f64> {
        if self.membrane.is_some() {
            if p1.is_neighbor_of(p2.id()) {
                return Vector3::zeros();
            }
            if self.law == ForceLaw::LennardJones && !ForceLaw::is_repulsive_range(p1, p2, offset)
            {
                return Vector3::zeros();
            }
        }
        self.law.compute_with_offset(p1, p2, offset)
    }

    /// Adds the pair force to both particles of every unique pair in the domain.
    pub fn accumulate_pair_forces<C: ParticleContainer>(&self, container: &mut C) {
        container.apply_to_all_unique_pairs_in_domain(|p, q| {
            let f = self.pair_force(p, q, &Vector3::zeros());
            p.force += f;
            q.force -= f;
        });
    }

    /// Adds the membrane springs and, while `time` has not passed the pull deadline, the
    /// pull force on marked particles.
    pub fn accumulate_membrane_forces<C: ParticleContainer>(&self, container: &mut C, time: f64) {
        let Some(membrane) = self.membrane else {
            return;
        };
        let direct = ForceLaw::Harmonic {
            stiffness: membrane.stiffness,
            rest_length: membrane.rest_length,
        };
        let diagonal = ForceLaw::Harmonic {
            stiffness: membrane.stiffness,
            rest_length: membrane.rest_length * SQRT_2,
        };
        container.apply_to_neighbor_pairs(|p, q, kind| {
            let law = match kind {
                NeighborKind::Direct => direct,
                NeighborKind::Diagonal => diagonal,
            };
            let f = law.compute(p, q);
            p.force += f;
            q.force -= f;
        });

        if let Some(pull) = membrane.pull {
            if time <= pull.until {
                container.apply_to_each_particle_in_domain(|p| {
                    if p.marked {
                        p.force += pull.force;
                    }
                });
            }
        }
    }

    /// Adds `m·g` to every domain particle.
    pub fn apply_gravity<C: ParticleContainer>(&self, container: &mut C) {
        if let Some(g) = self.gravity {
            container.apply_to_each_particle_in_domain(|p| p.force += p.mass * g);
        }
    }
}

/// Velocity-Störmer-Verlet update of one particle.
///
/// Expects `force` to hold the freshly accumulated force and `old_force` the one from
/// the previous step. The velocity is updated from both, then the position from the
/// updated velocity and `old_force`. Fixed particles are left untouched.
#[inline]
pub fn integrate(p: &mut Particle, delta_t: f64) {
    if p.fixed {
        return;
    }
    let half_step_per_mass = delta_t / (2.0 * p.mass);
    p.velocity += half_step_per_mass * (p.old_force + p.force);
    p.position += delta_t * p.velocity + delta_t * half_step_per_mass * p.old_force;
}
