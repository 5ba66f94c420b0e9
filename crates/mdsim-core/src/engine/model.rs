use super::boundary::{BoundaryCondition, BoundaryConditions};
use super::error::SimulationError;
use super::integration::{Interactions, integrate};
use crate::core::container::ParticleContainer;
use crate::core::container::direct_sum::DirectSumContainer;
use crate::core::container::error::ContainerError;
use crate::core::container::linked_cells::LinkedCellsContainer;
use crate::core::forcefield::law::ForceLaw;
use crate::core::forcefield::potentials::LJ_MINIMUM_FACTOR;
use crate::core::models::particle::{DEFAULT_SIGMA, Particle};
use tracing::{debug, trace};

/// One integration scheme bound to the container it advances.
pub trait Model {
    type Container: ParticleContainer;

    /// Advances the particles by one time step starting at `time`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Step`] if the container rejects a particle, e.g.
    /// because a position became NaN.
    fn step(&mut self, iteration: u64, time: f64) -> Result<(), SimulationError>;

    fn delta_t(&self) -> f64;

    fn container(&self) -> &Self::Container;

    fn container_mut(&mut self) -> &mut Self::Container;

    fn into_container(self) -> Self::Container;
}

/// Velocity-Störmer-Verlet over a [`DirectSumContainer`]. No boundaries.
#[derive(Debug, Clone)]
pub struct DirectSumModel {
    container: DirectSumContainer,
    interactions: Interactions,
    delta_t: f64,
}

impl DirectSumModel {
    pub fn new(container: DirectSumContainer, interactions: Interactions, delta_t: f64) -> Self {
        Self {
            container,
            interactions,
            delta_t,
        }
    }
}

impl Model for DirectSumModel {
    type Container = DirectSumContainer;

    fn step(&mut self, _iteration: u64, time: f64) -> Result<(), SimulationError> {
        let delta_t = self.delta_t;
        self.container
            .apply_to_each_particle_in_domain(Particle::shift_force);
        self.interactions
            .accumulate_pair_forces(&mut self.container);
        self.interactions
            .accumulate_membrane_forces(&mut self.container, time);
        self.interactions.apply_gravity(&mut self.container);
        self.container
            .apply_to_each_particle_in_domain(|p| integrate(p, delta_t));
        Ok(())
    }

    fn delta_t(&self) -> f64 {
        self.delta_t
    }

    fn container(&self) -> &DirectSumContainer {
        &self.container
    }

    fn container_mut(&mut self) -> &mut DirectSumContainer {
        &mut self.container
    }

    fn into_container(self) -> DirectSumContainer {
        self.container
    }
}

/// Velocity-Störmer-Verlet over a [`LinkedCellsContainer`] with per-side boundary
/// conditions.
///
/// One step runs `ResetForces → AccumulatePairForces → ApplyGravity →
/// ProcessBoundaries → UpdateVelocities → UpdatePositions → UpdateCells`.
#[derive(Debug, Clone)]
pub struct LinkedCellsModel {
    container: LinkedCellsContainer,
    interactions: Interactions,
    delta_t: f64,
    boundaries: BoundaryConditions,
    periodic_axes: [bool; 3],
    reflective_threshold: f64,
}

impl LinkedCellsModel {
    /// Binds a filled container to the integration scheme.
    ///
    /// The reflective distance threshold is derived from the largest `sigma` present at
    /// construction time.
    pub fn new(
        container: LinkedCellsContainer,
        interactions: Interactions,
        delta_t: f64,
        boundaries: BoundaryConditions,
    ) -> Self {
        let dimensions = container.grid().dimensions();
        let max_sigma = container
            .particles()
            .map(|p| p.sigma)
            .fold(f64::NAN, f64::max);
        let sigma = if max_sigma.is_nan() { DEFAULT_SIGMA } else { max_sigma };
        let reflective_threshold = LJ_MINIMUM_FACTOR * sigma;
        let periodic_axes = boundaries.periodic_axes(dimensions);
        debug!(
            reflective_threshold,
            ?periodic_axes,
            "Linked-cells model configured."
        );
        Self {
            container,
            interactions,
            delta_t,
            boundaries,
            periodic_axes,
            reflective_threshold,
        }
    }

    pub fn boundaries(&self) -> &BoundaryConditions {
        &self.boundaries
    }

    pub fn reflective_threshold(&self) -> f64 {
        self.reflective_threshold
    }

    fn has_periodic_axis(&self) -> bool {
        self.periodic_axes.iter().any(|&periodic| periodic)
    }

    #[cfg(feature = "parallel")]
    fn reset_forces(&mut self) {
        self.container
            .par_apply_to_each_particle_in_domain(Particle::shift_force);
    }

    #[cfg(not(feature = "parallel"))]
    fn reset_forces(&mut self) {
        self.container
            .apply_to_each_particle_in_domain(Particle::shift_force);
    }

    #[cfg(feature = "parallel")]
    fn accumulate_pair_forces(&mut self) {
        let interactions = self.interactions;
        self.container.par_accumulate_pair_forces(move |p, q| {
            interactions.pair_force(p, q, &nalgebra::Vector3::zeros())
        });
    }

    #[cfg(not(feature = "parallel"))]
    fn accumulate_pair_forces(&mut self) {
        self.interactions
            .accumulate_pair_forces(&mut self.container);
    }

    fn accumulate_periodic_pair_forces(&mut self) {
        if !self.has_periodic_axis() {
            return;
        }
        let interactions = &self.interactions;
        self.container
            .apply_to_periodic_pairs(self.periodic_axes, |p, q, offset| {
                let f = interactions.pair_force(p, q, offset);
                p.force += f;
                q.force -= f;
            });
    }

    fn process_boundaries(&mut self) -> Result<(), ContainerError> {
        let dimensions = self.container.grid().dimensions();
        let threshold = self.reflective_threshold;
        for (side, condition) in self.boundaries.active(dimensions) {
            match condition {
                BoundaryCondition::Reflective => {
                    self.container
                        .apply_to_all_boundary_particles(side, threshold, |p, ghost| {
                            let f = ForceLaw::ghost_repulsion(p, &ghost);
                            p.force += f;
                        });
                }
                BoundaryCondition::Outflow => {
                    self.container.clear_halo_cells(side);
                }
                BoundaryCondition::Periodic => {}
            }
        }
        if self.has_periodic_axis() {
            self.container
                .teleport_halo_particles(self.periodic_axes)?;
        }
        Ok(())
    }

    #[cfg(feature = "parallel")]
    fn update_kinematics(&mut self) {
        let delta_t = self.delta_t;
        self.container
            .par_apply_to_each_particle_in_domain(move |p| integrate(p, delta_t));
    }

    #[cfg(not(feature = "parallel"))]
    fn update_kinematics(&mut self) {
        let delta_t = self.delta_t;
        self.container
            .apply_to_each_particle_in_domain(|p| integrate(p, delta_t));
    }
}

impl Model for LinkedCellsModel {
    type Container = LinkedCellsContainer;

    fn step(&mut self, iteration: u64, time: f64) -> Result<(), SimulationError> {
        self.reset_forces();
        self.accumulate_pair_forces();
        self.accumulate_periodic_pair_forces();
        self.interactions
            .accumulate_membrane_forces(&mut self.container, time);
        self.interactions.apply_gravity(&mut self.container);

        self.process_boundaries()
            .map_err(|source| SimulationError::Step { iteration, source })?;

        self.update_kinematics();
        self.container
            .update_cells()
            .map_err(|source| SimulationError::Step { iteration, source })?;

        trace!(iteration, particles = self.container.len(), "Step complete.");
        Ok(())
    }

    fn delta_t(&self) -> f64 {
        self.delta_t
    }

    fn container(&self) -> &LinkedCellsContainer {
        &self.container
    }

    fn container_mut(&mut self) -> &mut LinkedCellsContainer {
        &mut self.container
    }

    fn into_container(self) -> LinkedCellsContainer {
        self.container
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::container::side::Side;
    use nalgebra::Vector3;
    use std::collections::HashMap;

    fn particle(x: f64, y: f64, z: f64) -> Particle {
        Particle::new(Vector3::new(x, y, z), Vector3::zeros(), 1.0)
    }

    fn linked_model(
        domain: [f64; 3],
        cutoff: f64,
        boundaries: BoundaryConditions,
        particles: Vec<Particle>,
        delta_t: f64,
    ) -> LinkedCellsModel {
        let mut container = LinkedCellsContainer::new(domain, cutoff).unwrap();
        for p in particles {
            container.add(p).unwrap();
        }
        LinkedCellsModel::new(
            container,
            Interactions::new(ForceLaw::LennardJones),
            delta_t,
            boundaries,
        )
    }

    #[test]
    fn particle_bounces_off_reflective_wall() {
        let mut p = particle(5.0, 2.0, 0.0);
        p.velocity = Vector3::new(0.0, -5.0, 0.0);
        let mut model = linked_model(
            [10.0, 10.0, 0.0],
            3.0,
            BoundaryConditions::uniform(BoundaryCondition::Reflective),
            vec![p],
            0.0005,
        );

        let mut min_y = f64::INFINITY;
        for iteration in 0..2000 {
            model.step(iteration, iteration as f64 * 0.0005).unwrap();
            let p = model.container().particles().next().unwrap();
            min_y = min_y.min(p.position.y);
            assert!(p.position.y > 0.0, "particle crossed the wall at step {}", iteration);
            assert!(p.velocity.norm() < 5.5, "speed blew up at step {}", iteration);
        }
        let p = model.container().particles().next().unwrap();
        assert!(min_y < 1.0);
        assert!(p.velocity.y > 0.0, "particle should be moving away from the wall");
        assert_eq!(model.container().len(), 1);
    }

    #[test]
    fn outflow_deletes_leaving_particles() {
        let mut p = particle(9.9, 5.0, 0.0);
        p.velocity = Vector3::new(10.0, 0.0, 0.0);
        let mut model = linked_model(
            [10.0, 10.0, 0.0],
            3.0,
            BoundaryConditions::uniform(BoundaryCondition::Outflow),
            vec![p],
            0.01,
        );
        for iteration in 0..3 {
            model.step(iteration, iteration as f64 * 0.01).unwrap();
        }
        assert!(model.container().is_empty());
    }

    #[test]
    fn periodic_particle_reenters_on_the_opposite_side() {
        let mut p = particle(9.95, 5.0, 0.0);
        p.velocity = Vector3::new(10.0, 0.0, 0.0);
        let mut model = linked_model(
            [10.0, 10.0, 0.0],
            3.0,
            BoundaryConditions::uniform(BoundaryCondition::Periodic),
            vec![p],
            0.01,
        );
        model.step(0, 0.0).unwrap();
        model.step(1, 0.01).unwrap();
        assert_eq!(model.container().len(), 1);
        let p = model.container().particles().next().unwrap();
        assert!(p.position.x >= 0.0 && p.position.x < 1.0, "x = {}", p.position.x);
    }

    #[test]
    fn periodic_pairs_interact_across_the_boundary() {
        let left = particle(0.3, 5.0, 0.0);
        let right = particle(9.7, 5.0, 0.0);
        let (left_id, right_id) = (left.id(), right.id());
        let mut model = linked_model(
            [10.0, 10.0, 0.0],
            3.0,
            BoundaryConditions::uniform(BoundaryCondition::Periodic),
            vec![left, right],
            1e-6,
        );
        model.step(0, 0.0).unwrap();
        let forces: HashMap<_, _> = model
            .container()
            .particles()
            .map(|p| (p.id(), p.force))
            .collect();
        // Images are 0.6 apart: strongly repulsive, pushing each particle inwards.
        assert!(forces[&left_id].x > 0.0);
        assert!(forces[&right_id].x < 0.0);
        assert!((forces[&left_id] + forces[&right_id]).norm() < 1e-9);
    }

    #[test]
    fn direct_sum_and_linked_cells_agree_when_cutoff_covers_all_pairs() {
        let mut particles = Vec::new();
        for (i, j, k) in itertools::iproduct!(0..2, 0..2, 0..2) {
            particles.push(
                particle(
                    1.5 + i as f64 + 0.05 * j as f64,
                    1.45 + j as f64,
                    1.5 + k as f64 - 0.03 * i as f64,
                )
                .with_lennard_jones(1.0, 1.0),
            );
        }

        let mut direct = DirectSumContainer::new();
        for p in &particles {
            direct.add(p.clone()).unwrap();
        }
        let mut direct_model =
            DirectSumModel::new(direct, Interactions::new(ForceLaw::LennardJones), 0.0001);
        let mut linked_model = linked_model(
            [4.0, 4.0, 4.0],
            2.0,
            BoundaryConditions::uniform(BoundaryCondition::Outflow),
            particles,
            0.0001,
        );

        direct_model.step(0, 0.0).unwrap();
        linked_model.step(0, 0.0).unwrap();

        let expected: HashMap<_, _> = direct_model
            .container()
            .particles()
            .map(|p| (p.id(), (p.force, p.position)))
            .collect();
        assert_eq!(linked_model.container().len(), expected.len());
        for p in linked_model.container().particles() {
            let (force, position) = expected[&p.id()];
            assert!((p.force - force).norm() <= 1e-9 * (1.0 + force.norm()));
            assert!((p.position - position).norm() <= 1e-12);
        }
    }

    #[test]
    fn reflective_threshold_uses_largest_sigma() {
        let model = linked_model(
            [10.0, 10.0, 0.0],
            3.0,
            BoundaryConditions::uniform(BoundaryCondition::Reflective),
            vec![
                particle(1.0, 1.0, 0.0).with_lennard_jones(1.0, 1.2),
                particle(2.0, 2.0, 0.0),
            ],
            0.001,
        );
        assert!((model.reflective_threshold() - LJ_MINIMUM_FACTOR * 1.2).abs() < 1e-12);
        assert_eq!(
            model.boundaries().get(Side::Top),
            BoundaryCondition::Reflective
        );
    }

    #[test]
    fn fixed_particles_stay_put_but_push_others() {
        let mut wall = particle(5.0, 5.0, 0.0);
        wall.fixed = true;
        let wall_id = wall.id();
        let mover = particle(6.0, 5.0, 0.0);
        let mut model = linked_model(
            [10.0, 10.0, 0.0],
            3.0,
            BoundaryConditions::uniform(BoundaryCondition::Reflective),
            vec![wall, mover],
            0.001,
        );
        for iteration in 0..10 {
            model.step(iteration, iteration as f64 * 0.001).unwrap();
        }
        for p in model.container().particles() {
            if p.id() == wall_id {
                assert_eq!(p.position, Vector3::new(5.0, 5.0, 0.0));
            } else {
                assert!(p.position.x > 6.0);
            }
        }
    }

    #[test]
    fn gravity_accelerates_direct_sum_particles() {
        let mut container = DirectSumContainer::new();
        container
            .add(Particle::new(Vector3::zeros(), Vector3::zeros(), 2.0))
            .unwrap();
        let interactions = Interactions {
            gravity: Some(Vector3::new(0.0, -10.0, 0.0)),
            ..Interactions::new(ForceLaw::Gravity)
        };
        let mut model = DirectSumModel::new(container, interactions, 0.1);
        model.step(0, 0.0).unwrap();
        let p = model.container().particles().next().unwrap();
        assert!((p.force - Vector3::new(0.0, -20.0, 0.0)).norm() < 1e-12);
        // No previous force yet, so only the velocity moves the particle.
        assert!((p.position - Vector3::new(0.0, -0.05, 0.0)).norm() < 1e-12);

        model.step(1, 0.1).unwrap();
        let p = model.container().particles().next().unwrap();
        assert!((p.velocity - Vector3::new(0.0, -1.5, 0.0)).norm() < 1e-12);
        assert!((p.position - Vector3::new(0.0, -0.25, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn nan_position_fails_the_step() {
        let mut p = particle(5.0, 5.0, 0.0);
        p.velocity = Vector3::new(f64::NAN, 0.0, 0.0);
        let mut model = linked_model(
            [10.0, 10.0, 0.0],
            3.0,
            BoundaryConditions::default(),
            vec![p],
            0.01,
        );
        assert!(matches!(
            model.step(7, 0.0),
            Err(SimulationError::Step { iteration: 7, .. })
        ));
    }
}
