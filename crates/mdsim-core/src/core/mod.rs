//! # Core Module
//!
//! This module provides the fundamental building blocks of the simulator: the particle
//! data model, the pairwise force laws, the spatial containers that organize particles
//! for force evaluation, particle generators and file formats.
//!
//! ## Overview
//!
//! Everything in `core` is free of run-level state. A container owns particles and
//! knows how to enumerate them; a force law knows how to evaluate one pair. The
//! stateful time-stepping that combines them lives in [`crate::engine`].
//!
//! ## Architecture
//!
//! - **Particle Representation** ([`models`]) - Particle state and unique ids
//! - **Force Evaluation** ([`forcefield`]) - Gravity, Lennard-Jones and harmonic laws
//! - **Spatial Organization** ([`container`]) - Direct-sum and linked-cells containers
//! - **Initial Conditions** ([`generators`]) - Cuboids, discs, spheres and thermal jitter
//! - **File I/O** ([`io`]) - CSV/XYZ formats, checkpoints and snapshot writers
//!
//! ## Key Capabilities
//!
//! - **Linear-time pair enumeration** through a flattened cell grid with precomputed
//!   neighbor tables
//! - **Boundary support** for reflective, outflow and periodic faces via halo and
//!   boundary cell layers
//! - **Two- and three-dimensional domains** with the same code paths

pub mod container;
pub mod forcefield;
pub mod generators;
pub mod io;
pub mod models;
