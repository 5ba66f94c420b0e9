//! # Core Models Module
//!
//! This module contains the per-particle state that every container, force law and
//! integrator in mdsim operates on.
//!
//! ## Overview
//!
//! A simulation is a collection of [`particle::Particle`] records. Each record carries its
//! kinematic state (position, velocity), the force accumulated during the current and the
//! previous step, its physical parameters (mass, Lennard-Jones `epsilon`/`sigma`) and the
//! bookkeeping needed by membrane simulations (marked/fixed flags, neighbor topology).
//!
//! ## Key Components
//!
//! - [`particle`] - The mutable particle record and its constructors
//! - [`ids`] - Process-unique particle identifiers
//!
//! ## Usage
//!
//! ```ignore
//! use mdsim::core::models::particle::Particle;
//! use nalgebra::Vector3;
//!
//! let particle = Particle::new(Vector3::new(1.0, 2.0, 0.0), Vector3::zeros(), 1.0);
//! container.add(particle)?;
//! ```

pub mod ids;
pub mod particle;
