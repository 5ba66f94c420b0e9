//! # Force Field Module
//!
//! This module provides the pairwise force laws used by mdsim's integrators.
//!
//! ## Overview
//!
//! Every law maps a pair of particles to the force acting on the first particle; the
//! force on the second particle is its negation (Newton's third law), which lets the
//! pair iteration of a container evaluate each unique pair only once.
//!
//! - **Gravity** - `F = m₁m₂/|Δx|³ · Δx`
//! - **Lennard-Jones** - `F = (24ε/d²)(c₁ − 2c₁²) · Δx` with `c₁ = (σ²/d²)³`
//! - **Harmonic** - `F = (k(d − r₀)/d) · Δx`, used between declared membrane neighbors
//!
//! `Δx` is always `x₂ − x₁`. Degenerate inputs (coincident particles, zero masses) are
//! not guarded and follow IEEE-754 semantics.
//!
//! ## Key Components
//!
//! - [`law`] - The [`law::ForceLaw`] strategy enum dispatched in the hot pair loop
//! - `potentials` - Inline force kernels operating on raw separation vectors

pub mod law;
pub(crate) mod potentials;
