//! # Particle Container Module
//!
//! This module provides the spatial data structures that own the particles of a
//! simulation and expose them to force evaluation and integration.
//!
//! ## Overview
//!
//! Every container implements [`ParticleContainer`], a capability interface covering
//! insertion, size queries and the iteration protocol used by the integrator:
//!
//! - **Per-particle iteration** over the whole container or only the simulation domain
//! - **Unique pair iteration** that visits every interacting pair exactly once, so that
//!   Newton's third law halves the force work
//! - **Neighbor pair iteration** over declared membrane topology, independent of any cutoff
//!
//! Closures are passed as generic parameters, so each call site is monomorphized and the
//! hot pair loop contains no dynamic dispatch.
//!
//! ## Key Components
//!
//! - [`direct_sum`] - Flat list with O(N²) all-pairs iteration
//! - [`linked_cells`] - Cutoff-based cell grid with O(N) pair iteration and boundary support
//! - [`grid`] - Flattened index arithmetic and the precomputed halo/boundary/neighbor tables
//! - [`side`] - The six faces of the simulation box
//! - [`error`] - Construction and insertion failures
//!
//! ## Usage
//!
//! ```ignore
//! use mdsim::core::container::{ParticleContainer, linked_cells::LinkedCellsContainer};
//!
//! let mut container = LinkedCellsContainer::new([30.0, 30.0, 0.0], 3.0)?;
//! container.add(particle)?;
//! container.apply_to_all_unique_pairs_in_domain(|p, q| {
//!     let f = law.compute(p, q);
//!     p.force += f;
//!     q.force -= f;
//! });
//! ```

pub mod direct_sum;
pub mod error;
pub mod grid;
pub mod linked_cells;
pub mod side;

use crate::core::models::particle::Particle;
use error::ContainerError;

/// Kind of a declared membrane neighbor relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NeighborKind {
    /// The two particles share a lattice edge.
    Direct,
    /// The two particles share only a lattice corner.
    Diagonal,
}

/// Capability interface shared by all particle containers.
pub trait ParticleContainer {
    /// Moves a particle into the container.
    ///
    /// # Errors
    ///
    /// Returns a [`ContainerError`] if the particle cannot be placed (e.g. NaN position,
    /// or a z component in a two-dimensional container).
    fn add(&mut self, particle: Particle) -> Result<(), ContainerError>;

    /// Total number of particles held, including particles outside the domain.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of spatial dimensions the container simulates (2 or 3).
    fn dimensions(&self) -> usize;

    /// Iterates over every particle in the container.
    fn particles(&self) -> impl Iterator<Item = &Particle>;

    /// Calls `f` exactly once for every particle, including particles outside the domain.
    fn apply_to_each_particle<F>(&mut self, f: F)
    where
        F: FnMut(&mut Particle);

    /// Calls `f` exactly once for every particle inside the simulation domain.
    fn apply_to_each_particle_in_domain<F>(&mut self, f: F)
    where
        F: FnMut(&mut Particle);

    /// Calls `f` exactly once for every unordered pair of interacting domain particles.
    fn apply_to_all_unique_pairs_in_domain<F>(&mut self, f: F)
    where
        F: FnMut(&mut Particle, &mut Particle);

    /// Calls `f` exactly once for every declared membrane neighbor relation between
    /// domain particles.
    ///
    /// Neighbor lists are expected to be symmetric; a relation is reported from the side
    /// of the particle with the smaller id.
    fn apply_to_neighbor_pairs<F>(&mut self, f: F)
    where
        F: FnMut(&mut Particle, &mut Particle, NeighborKind);

    /// Moves every particle out of the container.
    fn drain(&mut self) -> Vec<Particle>;
}

/// Returns mutable references to two distinct elements of a slice.
#[inline]
pub(crate) fn pair_mut<T>(slice: &mut [T], a: usize, b: usize) -> (&mut T, &mut T) {
    debug_assert_ne!(a, b, "pair_mut requires distinct indices");
    if a < b {
        let (head, tail) = slice.split_at_mut(b);
        (&mut head[a], &mut tail[0])
    } else {
        let (head, tail) = slice.split_at_mut(a);
        (&mut tail[0], &mut head[b])
    }
}

/// Calls `f` for every unordered pair within `particles` accepted by `accept`.
#[inline]
pub(crate) fn for_each_pair_in<F, A>(particles: &mut [Particle], accept: A, f: &mut F)
where
    F: FnMut(&mut Particle, &mut Particle),
    A: Fn(&Particle, &Particle) -> bool,
{
    for j in 1..particles.len() {
        let (head, tail) = particles.split_at_mut(j);
        let q = &mut tail[0];
        for p in head.iter_mut() {
            if accept(p, q) {
                f(p, q);
            }
        }
    }
}
