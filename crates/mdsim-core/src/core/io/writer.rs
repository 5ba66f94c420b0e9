use super::csv::CsvFile;
use super::traits::{IoError, ParticleFile, SnapshotWriter};
use super::xyz::XyzFile;
use crate::core::models::particle::Particle;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Writes every snapshot to its own file `<directory>/<base>_<iteration>.<ext>`.
#[derive(Debug, Clone)]
pub struct FileSeriesWriter<F: ParticleFile> {
    directory: PathBuf,
    base_name: String,
    _format: PhantomData<F>,
}

pub type CsvWriter = FileSeriesWriter<CsvFile>;
pub type XyzWriter = FileSeriesWriter<XyzFile>;

impl<F: ParticleFile> FileSeriesWriter<F> {
    /// Creates the writer, creating `directory` if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(directory: impl Into<PathBuf>, base_name: impl Into<String>) -> Result<Self, IoError> {
        let directory = directory.into();
        fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            base_name: base_name.into(),
            _format: PhantomData,
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the file that receives the snapshot of `iteration`.
    pub fn path_for(&self, iteration: u64) -> PathBuf {
        self.directory
            .join(format!("{}_{}.{}", self.base_name, iteration, F::EXTENSION))
    }
}

impl<F: ParticleFile> SnapshotWriter for FileSeriesWriter<F> {
    fn write_snapshot(&mut self, particles: &[&Particle], iteration: u64) -> Result<(), IoError> {
        let path = self.path_for(iteration);
        F::write_to_path(particles.iter().copied(), &path)?;
        debug!(path = %path.display(), count = particles.len(), "Snapshot written.");
        Ok(())
    }
}

/// Discards all snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullWriter;

impl SnapshotWriter for NullWriter {
    fn write_snapshot(&mut self, _particles: &[&Particle], _iteration: u64) -> Result<(), IoError> {
        Ok(())
    }
}
