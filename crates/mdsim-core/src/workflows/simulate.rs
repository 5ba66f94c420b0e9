use crate::core::container::ParticleContainer;
use crate::core::container::direct_sum::DirectSumContainer;
use crate::core::container::linked_cells::LinkedCellsContainer;
use crate::core::io::traits::SnapshotWriter;
use crate::core::models::particle::Particle;
use crate::engine::config::{ContainerConfig, SimulationConfig};
use crate::engine::error::SimulationError;
use crate::engine::integration::Interactions;
use crate::engine::model::{DirectSumModel, LinkedCellsModel, Model};
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::simulation::{Simulation, SimulationSummary, step_count};
use crate::engine::thermostat::Thermostat;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct SimulationOutcome {
    pub summary: SimulationSummary,
    /// Every particle left at the end of the run, e.g. for writing a checkpoint.
    pub particles: Vec<Particle>,
}

/// Occupancy of a linked-cells grid.
#[derive(Debug, Clone, PartialEq)]
pub struct GridReport {
    /// Cells per axis including the halo layers.
    pub cells_per_axis: [usize; 3],
    pub cell_count: usize,
    pub cell_size: [f64; 3],
    pub occupied_cells: usize,
    pub max_occupancy: usize,
    pub halo_particles: usize,
}

/// Static description of a configured simulation, produced without stepping it.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerReport {
    pub dimensions: usize,
    pub particle_count: usize,
    pub total_steps: u64,
    /// `None` for the direct-sum container.
    pub grid: Option<GridReport>,
}

/// Builds the container and model named by `config`, fills it with `particles`, applies
/// the initial temperature and runs the simulation to its end time.
///
/// # Errors
///
/// Returns an error if the container cannot be built, a particle is rejected, a step
/// fails or a snapshot cannot be written.
#[instrument(skip_all, name = "simulation_workflow")]
pub fn run(
    config: &SimulationConfig,
    particles: Vec<Particle>,
    writer: &mut dyn SnapshotWriter,
    reporter: &ProgressReporter,
) -> Result<SimulationOutcome, SimulationError> {
    info!(
        particles = particles.len(),
        dimensions = config.dimensions(),
        force = %config.force_law,
        "Setting up simulation."
    );
    reporter.report(Progress::Message(format!(
        "Loaded {} particles",
        particles.len()
    )));

    let interactions = Interactions::from_config(config);
    match &config.container {
        ContainerConfig::DirectSum { .. } => {
            let mut container = DirectSumContainer::with_dimensions(config.dimensions());
            fill(&mut container, particles)?;
            let model = DirectSumModel::new(container, interactions, config.delta_t);
            execute(model, config, writer, reporter)
        }
        ContainerConfig::LinkedCells {
            domain_size,
            cutoff_radius,
            boundaries,
        } => {
            let mut container = LinkedCellsContainer::new(*domain_size, *cutoff_radius)?;
            fill(&mut container, particles)?;
            let model = LinkedCellsModel::new(container, interactions, config.delta_t, *boundaries);
            execute(model, config, writer, reporter)
        }
    }
}

/// Builds the configured container and reports on it without running any step.
///
/// # Errors
///
/// Returns an error if the container cannot be built or a particle is rejected.
pub fn inspect(
    config: &SimulationConfig,
    particles: Vec<Particle>,
) -> Result<ContainerReport, SimulationError> {
    let total_steps = step_count(config.end_time, config.delta_t);
    match &config.container {
        ContainerConfig::DirectSum { .. } => {
            let mut container = DirectSumContainer::with_dimensions(config.dimensions());
            fill(&mut container, particles)?;
            Ok(ContainerReport {
                dimensions: container.dimensions(),
                particle_count: container.len(),
                total_steps,
                grid: None,
            })
        }
        ContainerConfig::LinkedCells {
            domain_size,
            cutoff_radius,
            ..
        } => {
            let mut container = LinkedCellsContainer::new(*domain_size, *cutoff_radius)?;
            fill(&mut container, particles)?;
            let grid = container.grid();
            let mut occupied_cells = 0;
            let mut max_occupancy = 0;
            let mut halo_particles = 0;
            for index in 0..grid.cell_count() {
                let occupancy = container.cell(index).len();
                if occupancy > 0 {
                    occupied_cells += 1;
                }
                max_occupancy = max_occupancy.max(occupancy);
                if grid.is_halo(index) {
                    halo_particles += occupancy;
                }
            }
            Ok(ContainerReport {
                dimensions: grid.dimensions(),
                particle_count: container.len(),
                total_steps,
                grid: Some(GridReport {
                    cells_per_axis: grid.dims(),
                    cell_count: grid.cell_count(),
                    cell_size: grid.cell_size(),
                    occupied_cells,
                    max_occupancy,
                    halo_particles,
                }),
            })
        }
    }
}

fn fill<C: ParticleContainer>(
    container: &mut C,
    particles: Vec<Particle>,
) -> Result<(), SimulationError> {
    for particle in particles {
        container.add(particle)?;
    }
    Ok(())
}

fn execute<M: Model>(
    mut model: M,
    config: &SimulationConfig,
    writer: &mut dyn SnapshotWriter,
    reporter: &ProgressReporter,
) -> Result<SimulationOutcome, SimulationError> {
    let thermostat = config.thermostat.as_ref().map(|thermostat_config| {
        let thermostat = Thermostat::from_config(thermostat_config, config.dimensions());
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        thermostat.initialize(
            model.container_mut(),
            thermostat_config.initial_temperature,
            &mut rng,
        );
        thermostat
    });

    let mut simulation = Simulation::new(model, config.end_time, config.output_interval);
    if let Some(thermostat) = thermostat {
        simulation = simulation.with_thermostat(thermostat);
    }
    let summary = simulation.run(writer, reporter)?;
    let particles = simulation.into_model().into_container().drain();
    Ok(SimulationOutcome { summary, particles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::container::error::ContainerError;
    use crate::core::forcefield::law::ForceLaw;
    use crate::core::io::writer::{CsvWriter, NullWriter};
    use crate::engine::boundary::{BoundaryCondition, BoundaryConditions};
    use crate::engine::config::{SimulationConfigBuilder, ThermostatConfig};
    use nalgebra::Vector3;

    fn linked_cells_config(boundary: BoundaryCondition) -> SimulationConfigBuilder {
        SimulationConfigBuilder::new()
            .delta_t(0.0005)
            .end_time(0.0098)
            .output_interval(10)
            .container(ContainerConfig::LinkedCells {
                domain_size: [10.0, 10.0, 0.0],
                cutoff_radius: 3.0,
                boundaries: BoundaryConditions::uniform(boundary),
            })
    }

    fn lattice() -> Vec<Particle> {
        let mut particles = Vec::new();
        for i in 0..4 {
            for j in 0..4 {
                particles.push(Particle::new(
                    Vector3::new(3.0 + 1.1225 * i as f64, 3.0 + 1.1225 * j as f64, 0.0),
                    Vector3::zeros(),
                    1.0,
                ));
            }
        }
        particles
    }

    #[test]
    fn run_returns_every_particle_of_a_closed_box() {
        let config = linked_cells_config(BoundaryCondition::Reflective).build().unwrap();
        let outcome = run(&config, lattice(), &mut NullWriter, &ProgressReporter::new()).unwrap();
        assert_eq!(outcome.summary.iterations, 20);
        assert_eq!(outcome.summary.particle_count, 16);
        assert_eq!(outcome.particles.len(), 16);
    }

    #[test]
    fn run_writes_csv_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let config = linked_cells_config(BoundaryCondition::Outflow).build().unwrap();
        let mut writer = CsvWriter::new(dir.path(), "frame").unwrap();
        let outcome = run(&config, lattice(), &mut writer, &ProgressReporter::new()).unwrap();
        assert_eq!(outcome.summary.snapshots_written, 2);
        assert!(dir.path().join("frame_10.csv").exists());
        assert!(dir.path().join("frame_20.csv").exists());
    }

    #[test]
    fn seeded_thermostat_runs_are_reproducible() {
        let config = linked_cells_config(BoundaryCondition::Periodic)
            .thermostat(ThermostatConfig {
                initial_temperature: 0.5,
                target_temperature: None,
                max_delta: None,
                interval: 5,
            })
            .seed(42)
            .build()
            .unwrap();
        let first = run(&config, lattice(), &mut NullWriter, &ProgressReporter::new()).unwrap();
        let second = run(&config, lattice(), &mut NullWriter, &ProgressReporter::new()).unwrap();
        let positions = |outcome: &SimulationOutcome| {
            let mut positions: Vec<_> = outcome
                .particles
                .iter()
                .map(|p| (p.position.x, p.position.y))
                .collect();
            positions.sort_by(|a, b| a.partial_cmp(b).unwrap());
            positions
        };
        for (a, b) in positions(&first).iter().zip(positions(&second).iter()) {
            assert!((a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9);
        }
        assert!(first.particles.iter().any(|p| p.velocity.norm() > 0.0));
    }

    #[test]
    fn direct_sum_workflow_runs_without_a_domain() {
        let config = SimulationConfigBuilder::new()
            .delta_t(0.01)
            .end_time(0.1)
            .force_law(ForceLaw::Gravity)
            .container(ContainerConfig::DirectSum { dimensions: 3 })
            .build()
            .unwrap();
        let particles = vec![
            Particle::new(Vector3::zeros(), Vector3::zeros(), 1.0),
            Particle::new(Vector3::new(100.0, 0.0, 0.0), Vector3::new(0.0, 0.1, 0.0), 1.0e-3),
        ];
        let outcome = run(&config, particles, &mut NullWriter, &ProgressReporter::new()).unwrap();
        assert_eq!(outcome.particles.len(), 2);
    }

    #[test]
    fn run_rejects_three_dimensional_particles_in_a_flat_domain() {
        let config = linked_cells_config(BoundaryCondition::Outflow).build().unwrap();
        let particles = vec![Particle::new(Vector3::new(1.0, 1.0, 0.5), Vector3::zeros(), 1.0)];
        let err = run(&config, particles, &mut NullWriter, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::Container(ContainerError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn inspect_reports_grid_occupancy() {
        let config = linked_cells_config(BoundaryCondition::Outflow).build().unwrap();
        let report = inspect(&config, lattice()).unwrap();
        assert_eq!(report.dimensions, 2);
        assert_eq!(report.particle_count, 16);
        assert_eq!(report.total_steps, 20);
        let grid = report.grid.unwrap();
        assert_eq!(grid.cells_per_axis, [5, 5, 1]);
        assert_eq!(grid.halo_particles, 0);
        assert!(grid.occupied_cells >= 1);
        assert!(grid.max_occupancy >= 16 / grid.occupied_cells);
    }
}
