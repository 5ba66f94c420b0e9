use thiserror::Error;

use super::config::ConfigError;
use crate::core::container::error::ContainerError;
use crate::core::io::IoError;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Container error: {0}")]
    Container(#[from] ContainerError),

    #[error("Output error: {source}")]
    Io {
        #[from]
        source: IoError,
    },

    #[error("Step {iteration} failed: {source}")]
    Step {
        iteration: u64,
        source: ContainerError,
    },
}
