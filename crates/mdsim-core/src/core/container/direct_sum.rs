use super::error::ContainerError;
use super::{NeighborKind, ParticleContainer, for_each_pair_in, pair_mut};
use crate::core::models::ids::ParticleId;
use crate::core::models::particle::Particle;
use std::collections::HashMap;

/// Flat particle list whose pair iteration visits every unordered pair.
///
/// There is no spatial domain: every particle counts as being "in the domain" and no
/// cutoff is applied.
#[derive(Debug, Clone)]
pub struct DirectSumContainer {
    particles: Vec<Particle>,
    dimensions: usize,
}

impl DirectSumContainer {
    /// Creates an empty three-dimensional container.
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            dimensions: 3,
        }
    }

    /// Creates an empty container simulating the given number of dimensions.
    ///
    /// Any value other than 2 is treated as 3.
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            particles: Vec::new(),
            dimensions: if dimensions == 2 { 2 } else { 3 },
        }
    }

    pub fn as_slice(&self) -> &[Particle] {
        &self.particles
    }
}

impl Default for DirectSumContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleContainer for DirectSumContainer {
    fn add(&mut self, particle: Particle) -> Result<(), ContainerError> {
        if particle.has_nan_position() {
            return Err(ContainerError::NanPosition { id: particle.id() });
        }
        if self.dimensions == 2 && particle.has_z_component() {
            return Err(ContainerError::DimensionMismatch { id: particle.id() });
        }
        self.particles.push(particle);
        Ok(())
    }

    fn len(&self) -> usize {
        self.particles.len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    fn apply_to_each_particle<F>(&mut self, f: F)
    where
        F: FnMut(&mut Particle),
    {
        self.particles.iter_mut().for_each(f);
    }

    fn apply_to_each_particle_in_domain<F>(&mut self, f: F)
    where
        F: FnMut(&mut Particle),
    {
        self.apply_to_each_particle(f);
    }

    fn apply_to_all_unique_pairs_in_domain<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Particle, &mut Particle),
    {
        for_each_pair_in(&mut self.particles, |_, _| true, &mut f);
    }

    fn apply_to_neighbor_pairs<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Particle, &mut Particle, NeighborKind),
    {
        let index: HashMap<ParticleId, usize> = self
            .particles
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id(), i))
            .collect();

        let mut relations = Vec::new();
        for (i, particle) in self.particles.iter().enumerate() {
            let lists = [
                (&particle.direct_neighbors, NeighborKind::Direct),
                (&particle.diagonal_neighbors, NeighborKind::Diagonal),
            ];
            for (list, kind) in lists {
                for other in list.iter().filter(|&&other| other > particle.id()) {
                    if let Some(&j) = index.get(other) {
                        relations.push((i, j, kind));
                    }
                }
            }
        }

        for (i, j, kind) in relations {
            let (p, q) = pair_mut(&mut self.particles, i, j);
            f(p, q, kind);
        }
    }

    fn drain(&mut self) -> Vec<Particle> {
        std::mem::take(&mut self.particles)
    }
}
