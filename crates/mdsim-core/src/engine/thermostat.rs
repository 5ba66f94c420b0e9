use super::config::ThermostatConfig;
use crate::core::container::ParticleContainer;
use crate::core::generators::maxwell_boltzmann_velocity;
use rand::Rng;
use tracing::debug;

/// Velocity-scaling thermostat with `k_B = 1`.
///
/// Fixed particles neither contribute to the measured temperature nor get rescaled.
#[derive(Debug, Clone, PartialEq)]
pub struct Thermostat {
    target: f64,
    max_delta: Option<f64>,
    interval: u64,
    dimensions: usize,
}

impl Thermostat {
    pub fn new(target: f64, max_delta: Option<f64>, interval: u64, dimensions: usize) -> Self {
        Self {
            target,
            max_delta,
            interval: interval.max(1),
            dimensions,
        }
    }

    pub fn from_config(config: &ThermostatConfig, dimensions: usize) -> Self {
        Self::new(config.target(), config.max_delta, config.interval, dimensions)
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    /// Whether the thermostat runs after step `iteration`.
    #[inline]
    pub fn is_due(&self, iteration: u64) -> bool {
        iteration % self.interval == 0
    }

    /// Current temperature `Σ m|v|² / (dims · N)` over the non-fixed domain particles.
    ///
    /// Returns `0.0` if there is nothing to measure.
    pub fn temperature<C: ParticleContainer>(&self, container: &mut C) -> f64 {
        let mut twice_kinetic = 0.0;
        let mut count = 0usize;
        container.apply_to_each_particle_in_domain(|p| {
            if !p.fixed {
                twice_kinetic += p.mass * p.velocity.norm_squared();
                count += 1;
            }
        });
        if count == 0 {
            0.0
        } else {
            twice_kinetic / (self.dimensions as f64 * count as f64)
        }
    }

    /// Adds Maxwell-Boltzmann velocities for `temperature` to every non-fixed particle.
    ///
    /// Each active component receives `√(T/m) · N(0, 1)`.
    pub fn initialize<C, R>(&self, container: &mut C, temperature: f64, rng: &mut R)
    where
        C: ParticleContainer,
        R: Rng + ?Sized,
    {
        if temperature <= 0.0 {
            return;
        }
        let dimensions = self.dimensions;
        container.apply_to_each_particle_in_domain(|p| {
            if !p.fixed {
                let mean = (temperature / p.mass).sqrt();
                p.velocity += maxwell_boltzmann_velocity(mean, dimensions, rng);
            }
        });
        debug!(temperature, "Initial Brownian motion applied.");
    }

    /// Rescales velocities towards the target temperature.
    ///
    /// The change is clamped to `±max_delta` when one is configured. Returns the new
    /// temperature, or `None` if the system has no measurable temperature to scale from.
    pub fn apply<C: ParticleContainer>(&self, container: &mut C) -> Option<f64> {
        let current = self.temperature(container);
        if !(current > 0.0 && current.is_finite()) {
            debug!(current, "Thermostat skipped: nothing to scale.");
            return None;
        }
        let next = match self.max_delta {
            Some(max_delta) => current + (self.target - current).clamp(-max_delta, max_delta),
            None => self.target,
        };
        let beta = (next / current).sqrt();
        container.apply_to_each_particle_in_domain(|p| {
            if !p.fixed {
                p.velocity *= beta;
            }
        });
        debug!(from = current, to = next, "Thermostat applied.");
        Some(next)
    }
}
