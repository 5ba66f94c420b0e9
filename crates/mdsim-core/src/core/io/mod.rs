//! Provides input/output functionality for particle state files.
//!
//! This module contains the file formats used to persist particles (a full-state CSV
//! format used for checkpoints and snapshots, and a position-only XYZ format for
//! visualization tools) behind the [`traits::ParticleFile`] interface, plus the
//! [`traits::SnapshotWriter`] implementations invoked periodically by a running
//! simulation.

pub mod csv;
pub mod traits;
pub mod writer;
pub mod xyz;

pub use traits::IoError;
