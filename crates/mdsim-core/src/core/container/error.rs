use crate::core::models::ids::ParticleId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContainerError {
    #[error("Invalid domain size {domain_size:?}: {reason}")]
    InvalidDomain {
        domain_size: [f64; 3],
        reason: &'static str,
    },

    #[error("Cutoff radius must be positive, got {0}")]
    InvalidCutoff(f64),

    #[error("Particle {id} has a NaN position component")]
    NanPosition { id: ParticleId },

    #[error("Particle {id} has a z component but the container is two-dimensional")]
    DimensionMismatch { id: ParticleId },
}
