use super::boundary::BoundaryConditions;
use crate::core::forcefield::law::ForceLaw;
use nalgebra::Vector3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Periodic boundary on the {axis} axis must be set on both opposite sides")]
    UnpairedPeriodic { axis: char },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContainerConfig {
    /// Flat list with all-pairs force evaluation and no domain bounds.
    DirectSum { dimensions: usize },
    /// Linked-cells grid over `[0, domain_size)`; a zero z extent selects 2D.
    LinkedCells {
        domain_size: [f64; 3],
        cutoff_radius: f64,
        boundaries: BoundaryConditions,
    },
}

impl ContainerConfig {
    pub fn dimensions(&self) -> usize {
        match self {
            ContainerConfig::DirectSum { dimensions } => {
                if *dimensions == 2 {
                    2
                } else {
                    3
                }
            }
            ContainerConfig::LinkedCells { domain_size, .. } => {
                if domain_size[2] == 0.0 {
                    2
                } else {
                    3
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThermostatConfig {
    /// Temperature whose Maxwell-Boltzmann velocities are added before the first step.
    pub initial_temperature: f64,
    /// Temperature the thermostat drives towards; defaults to the initial temperature.
    pub target_temperature: Option<f64>,
    /// Largest temperature change per application; unlimited when `None`.
    pub max_delta: Option<f64>,
    /// Number of steps between applications.
    pub interval: u64,
}

impl ThermostatConfig {
    pub fn target(&self) -> f64 {
        self.target_temperature.unwrap_or(self.initial_temperature)
    }
}

/// Constant force applied to marked membrane particles until `until`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PullForce {
    pub force: Vector3<f64>,
    pub until: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MembraneConfig {
    /// Spring constant between neighboring membrane particles.
    pub stiffness: f64,
    /// Rest length between direct neighbors; diagonal neighbors use `√2` times this.
    pub rest_length: f64,
    pub pull: Option<PullForce>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub delta_t: f64,
    pub end_time: f64,
    /// Steps between snapshots; `0` disables snapshots.
    pub output_interval: u64,
    pub force_law: ForceLaw,
    /// Uniform gravitational acceleration; each particle receives `m·g`.
    pub gravity: Option<Vector3<f64>>,
    pub container: ContainerConfig,
    pub thermostat: Option<ThermostatConfig>,
    pub membrane: Option<MembraneConfig>,
    /// Seed for the initial-temperature velocities; drawn from entropy when `None`.
    pub seed: Option<u64>,
}

impl SimulationConfig {
    pub fn dimensions(&self) -> usize {
        self.container.dimensions()
    }
}

#[derive(Default)]
pub struct SimulationConfigBuilder {
    delta_t: Option<f64>,
    end_time: Option<f64>,
    output_interval: Option<u64>,
    force_law: Option<ForceLaw>,
    gravity: Option<Vector3<f64>>,
    container: Option<ContainerConfig>,
    thermostat: Option<ThermostatConfig>,
    membrane: Option<MembraneConfig>,
    seed: Option<u64>,
}

const DEFAULT_OUTPUT_INTERVAL: u64 = 10;

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.into(),
    }
}

fn require_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(name, format!("must be a positive finite number, got {}", value)))
    }
}

fn require_non_negative(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(invalid(name, format!("must be a non-negative finite number, got {}", value)))
    }
}

impl SimulationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delta_t(mut self, delta_t: f64) -> Self {
        self.delta_t = Some(delta_t);
        self
    }
    pub fn end_time(mut self, end_time: f64) -> Self {
        self.end_time = Some(end_time);
        self
    }
    pub fn output_interval(mut self, interval: u64) -> Self {
        self.output_interval = Some(interval);
        self
    }
    pub fn force_law(mut self, law: ForceLaw) -> Self {
        self.force_law = Some(law);
        self
    }
    pub fn gravity(mut self, gravity: Vector3<f64>) -> Self {
        self.gravity = Some(gravity);
        self
    }
    pub fn container(mut self, container: ContainerConfig) -> Self {
        self.container = Some(container);
        self
    }
    pub fn thermostat(mut self, thermostat: ThermostatConfig) -> Self {
        self.thermostat = Some(thermostat);
        self
    }
    pub fn membrane(mut self, membrane: MembraneConfig) -> Self {
        self.membrane = Some(membrane);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<SimulationConfig, ConfigError> {
        let delta_t = self.delta_t.ok_or(ConfigError::MissingParameter("delta_t"))?;
        require_positive("delta_t", delta_t)?;
        let end_time = self.end_time.ok_or(ConfigError::MissingParameter("end_time"))?;
        require_non_negative("end_time", end_time)?;
        let container = self
            .container
            .ok_or(ConfigError::MissingParameter("container"))?;

        if let ContainerConfig::LinkedCells { boundaries, .. } = &container {
            boundaries.validate(container.dimensions())?;
        }
        if let Some(thermostat) = &self.thermostat {
            require_non_negative("thermostat.initial_temperature", thermostat.initial_temperature)?;
            require_non_negative("thermostat.target_temperature", thermostat.target())?;
            if let Some(max_delta) = thermostat.max_delta {
                require_positive("thermostat.max_delta", max_delta)?;
            }
            if thermostat.interval == 0 {
                return Err(invalid("thermostat.interval", "must be at least 1"));
            }
        }
        if let Some(membrane) = &self.membrane {
            require_positive("membrane.stiffness", membrane.stiffness)?;
            require_positive("membrane.rest_length", membrane.rest_length)?;
        }
        if let Some(gravity) = &self.gravity {
            if !gravity.iter().all(|g| g.is_finite()) {
                return Err(invalid("gravity", "components must be finite"));
            }
        }

        Ok(SimulationConfig {
            delta_t,
            end_time,
            output_interval: self.output_interval.unwrap_or(DEFAULT_OUTPUT_INTERVAL),
            force_law: self.force_law.unwrap_or_default(),
            gravity: self.gravity,
            container,
            thermostat: self.thermostat,
            membrane: self.membrane,
            seed: self.seed,
        })
    }
}
