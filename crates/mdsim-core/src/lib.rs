//! # mdsim Core Library
//!
//! A molecular-dynamics particle simulator built around a linked-cells container and a
//! Velocity-Störmer-Verlet integrator.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture to keep concerns separated,
//! making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains the particle model, the pure force laws
//!   (`potentials`, `ForceLaw`), the particle containers with their cell grid, particle
//!   generators and file I/O.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer advances a simulation. It holds
//!   the validated run configuration, the boundary conditions, the integration models
//!   (`DirectSumModel`, `LinkedCellsModel`), the thermostat and the step loop that drives
//!   them, reporting progress and writing snapshots on the way.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer. It ties
//!   `engine` and `core` together: given a configuration and an initial particle set it
//!   builds the right container and model, runs the simulation and hands back the final
//!   state.

pub mod core;
pub mod engine;
pub mod workflows;
