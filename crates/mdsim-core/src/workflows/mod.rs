//! # Workflows Module
//!
//! This module provides the top-level entry points of mdsim.
//!
//! ## Overview
//!
//! A workflow takes a validated [`crate::engine::config::SimulationConfig`] and an initial
//! particle set, builds the container and integration model the configuration names and
//! carries the run through to the end, handing back whatever the caller needs to persist.
//!
//! - **Simulation Workflow** ([`simulate`]) - Runs a full simulation, or only inspects the
//!   configured container without stepping it.

pub mod simulate;
