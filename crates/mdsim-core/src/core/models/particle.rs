use super::ids::ParticleId;
use nalgebra::Vector3;

/// Default Lennard-Jones well depth assigned by [`Particle::new`].
pub const DEFAULT_EPSILON: f64 = 5.0;
/// Default Lennard-Jones zero-crossing distance assigned by [`Particle::new`].
pub const DEFAULT_SIGMA: f64 = 1.0;

/// Represents a single point mass and its full dynamic state.
///
/// A particle is owned by exactly one container cell at a time. The force fields
/// (`force`, `old_force`) are written only during the force-update phase of a step and
/// the kinematic fields (`position`, `velocity`) only during the integration phase.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Position in simulation units.
    pub position: Vector3<f64>,
    /// Velocity in simulation units per time unit.
    pub velocity: Vector3<f64>,
    /// Force accumulated during the current step.
    pub force: Vector3<f64>,
    /// Force accumulated during the previous step.
    pub old_force: Vector3<f64>,
    /// Mass; expected to be strictly positive.
    pub mass: f64,
    /// Free-form grouping tag (e.g. which generator produced the particle).
    pub type_id: i32,
    /// Lennard-Jones well depth.
    pub epsilon: f64,
    /// Lennard-Jones zero-crossing distance.
    pub sigma: f64,
    /// Marked particles receive the membrane pull force.
    pub marked: bool,
    /// Fixed particles exert forces but are never moved or rescaled.
    pub fixed: bool,
    /// Membrane neighbors sharing an edge with this particle.
    pub direct_neighbors: Vec<ParticleId>,
    /// Membrane neighbors sharing only a corner with this particle.
    pub diagonal_neighbors: Vec<ParticleId>,
    id: ParticleId,
}

impl Particle {
    /// Creates a new particle with default interaction parameters and zero forces.
    ///
    /// # Arguments
    ///
    /// * `position` - The initial position.
    /// * `velocity` - The initial velocity.
    /// * `mass` - The particle mass.
    pub fn new(position: Vector3<f64>, velocity: Vector3<f64>, mass: f64) -> Self {
        Self {
            position,
            velocity,
            force: Vector3::zeros(),
            old_force: Vector3::zeros(),
            mass,
            type_id: 0,
            epsilon: DEFAULT_EPSILON,
            sigma: DEFAULT_SIGMA,
            marked: false,
            fixed: false,
            direct_neighbors: Vec::new(),
            diagonal_neighbors: Vec::new(),
            id: ParticleId::next(),
        }
    }

    /// Sets the Lennard-Jones parameters, consuming and returning the particle.
    pub fn with_lennard_jones(mut self, epsilon: f64, sigma: f64) -> Self {
        self.epsilon = epsilon;
        self.sigma = sigma;
        self
    }

    /// Sets the grouping tag, consuming and returning the particle.
    pub fn with_type(mut self, type_id: i32) -> Self {
        self.type_id = type_id;
        self
    }

    pub fn id(&self) -> ParticleId {
        self.id
    }

    /// Returns `true` if `other` is a declared direct or diagonal membrane neighbor.
    pub fn is_neighbor_of(&self, other: ParticleId) -> bool {
        self.direct_neighbors.contains(&other) || self.diagonal_neighbors.contains(&other)
    }

    /// Returns `true` if any component of the position is NaN.
    pub fn has_nan_position(&self) -> bool {
        self.position.iter().any(|c| c.is_nan())
    }

    /// Returns `true` if the particle carries any out-of-plane (z) component.
    pub fn has_z_component(&self) -> bool {
        self.position.z != 0.0 || self.velocity.z != 0.0 || self.force.z != 0.0
    }

    /// Moves the current force into `old_force` and clears `force` for a new step.
    #[inline]
    pub fn shift_force(&mut self) {
        self.old_force = self.force;
        self.force = Vector3::zeros();
    }

    /// Kinetic energy `m|v|²/2`.
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.velocity.norm_squared()
    }
}
