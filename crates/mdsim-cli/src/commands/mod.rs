pub mod check;
pub mod run;

use crate::config::Scenario;
use crate::error::{CliError, Result};
use mdsim::core::generators::generate_seeded;
use mdsim::core::io::csv::read_checkpoint;
use mdsim::core::models::particle::Particle;
use tracing::info;

/// Checkpoint particles first, then every generated body in scenario order.
pub(crate) fn load_particles(scenario: &Scenario) -> Result<Vec<Particle>> {
    let mut particles = match &scenario.checkpoint {
        Some(path) => {
            info!("Loading checkpoint from {:?}", path);
            read_checkpoint(path).map_err(|e| CliError::FileParsing {
                path: path.clone(),
                source: e.into(),
            })?
        }
        None => Vec::new(),
    };
    let generated = generate_seeded(
        &scenario.sources,
        scenario.config.dimensions(),
        scenario.config.seed,
    );
    info!(
        loaded = particles.len(),
        generated = generated.len(),
        "Initial particles prepared."
    );
    particles.extend(generated);
    Ok(particles)
}
