//! # Engine Module
//!
//! This module advances particle systems through time. It binds a container to an
//! integration scheme, enforces boundary conditions, controls temperature and drives the
//! main loop.
//!
//! ## Overview
//!
//! Each time step of a linked-cells simulation runs the following phases in order:
//!
//! 1. **Reset forces** - `force` is copied to `old_force` and zeroed
//! 2. **Accumulate pair forces** - within the cutoff radius, plus periodic images and
//!    membrane springs when configured
//! 3. **Apply gravity** - `m·g` per particle
//! 4. **Process boundaries** - reflective ghost repulsion, outflow deletion, periodic
//!    teleportation
//! 5. **Update velocities and positions** - Velocity-Störmer-Verlet
//! 6. **Update cells** - particles are re-bucketed into the cells their positions name
//!
//! The direct-sum model runs the same phases without the boundary and re-bucketing steps.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Validated run parameters and their builder
//! - **Boundaries** ([`boundary`]) - Per-side boundary conditions
//! - **Integration** ([`integration`]) - Force contributions and the per-particle update
//! - **Models** ([`model`]) - The [`model::Model`] trait and its container-specific schemes
//! - **Thermostat** ([`thermostat`]) - Velocity scaling towards a target temperature
//! - **Driver** ([`simulation`]) - Main loop, snapshots and progress events
//! - **Progress Monitoring** ([`progress`]) - Callback-based progress reporting
//! - **Error Handling** ([`error`]) - Engine-level error type wrapping lower layers

pub mod boundary;
pub mod config;
pub mod error;
pub mod integration;
pub mod model;
pub mod progress;
pub mod simulation;
pub mod thermostat;
