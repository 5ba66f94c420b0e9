use super::error::SimulationError;
use super::model::Model;
use super::progress::{Progress, ProgressReporter};
use super::thermostat::Thermostat;
use crate::core::container::ParticleContainer;
use crate::core::io::traits::SnapshotWriter;
use crate::core::models::particle::Particle;
use tracing::{info, instrument};

/// What a finished run looked like.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSummary {
    /// Number of steps performed.
    pub iterations: u64,
    /// Simulated time reached after the last step.
    pub final_time: f64,
    /// Particles left in the container (outflow may have removed some).
    pub particle_count: usize,
    pub snapshots_written: u64,
}

/// Number of steps `n` such that every step starts strictly before `end_time`.
///
/// Computed from an integer step index so that the count does not depend on the
/// rounding of a repeatedly incremented clock.
pub fn step_count(end_time: f64, delta_t: f64) -> u64 {
    if !(end_time > 0.0 && delta_t > 0.0) {
        return 0;
    }
    let mut n = (end_time / delta_t).floor() as u64;
    while (n as f64) * delta_t < end_time {
        n += 1;
    }
    while n > 0 && ((n - 1) as f64) * delta_t >= end_time {
        n -= 1;
    }
    n
}

/// Drives a [`Model`] from `t = 0` to `end_time`.
pub struct Simulation<M: Model> {
    model: M,
    end_time: f64,
    output_interval: u64,
    thermostat: Option<Thermostat>,
}

impl<M: Model> Simulation<M> {
    /// `output_interval == 0` disables snapshots.
    pub fn new(model: M, end_time: f64, output_interval: u64) -> Self {
        Self {
            model,
            end_time,
            output_interval,
            thermostat: None,
        }
    }

    pub fn with_thermostat(mut self, thermostat: Thermostat) -> Self {
        self.thermostat = Some(thermostat);
        self
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut M {
        &mut self.model
    }

    pub fn into_model(self) -> M {
        self.model
    }

    fn snapshot_due(&self, iteration: u64) -> bool {
        self.output_interval > 0 && iteration % self.output_interval == 0
    }

    /// Runs every step, applying the thermostat and writing snapshots on schedule.
    ///
    /// Iterations are counted from 1; step `k` starts at `t = (k - 1)·Δt`.
    ///
    /// # Errors
    ///
    /// Stops at the first failing step or snapshot write and returns its error.
    #[instrument(skip_all, name = "simulation_run", fields(end_time = self.end_time))]
    pub fn run(
        &mut self,
        writer: &mut dyn SnapshotWriter,
        reporter: &ProgressReporter,
    ) -> Result<SimulationSummary, SimulationError> {
        let delta_t = self.model.delta_t();
        let total_steps = step_count(self.end_time, delta_t);
        info!(
            total_steps,
            delta_t,
            particles = self.model.container().len(),
            "Starting simulation."
        );
        reporter.report(Progress::RunStart { total_steps });

        let mut snapshots_written = 0;
        for step in 0..total_steps {
            let iteration = step + 1;
            let time = step as f64 * delta_t;
            self.model.step(iteration, time)?;

            if let Some(thermostat) = &self.thermostat {
                if thermostat.is_due(iteration) {
                    thermostat.apply(self.model.container_mut());
                }
            }

            if self.snapshot_due(iteration) {
                let particles: Vec<&Particle> = self.model.container().particles().collect();
                writer.write_snapshot(&particles, iteration)?;
                snapshots_written += 1;
                reporter.report(Progress::SnapshotWritten { iteration });
            }

            reporter.report(Progress::StepCompleted {
                iteration,
                particles: self.model.container().len(),
            });
        }

        reporter.report(Progress::RunFinish);
        let summary = SimulationSummary {
            iterations: total_steps,
            final_time: total_steps as f64 * delta_t,
            particle_count: self.model.container().len(),
            snapshots_written,
        };
        info!(
            iterations = summary.iterations,
            particles = summary.particle_count,
            snapshots = summary.snapshots_written,
            "Simulation finished."
        );
        Ok(summary)
    }
}
