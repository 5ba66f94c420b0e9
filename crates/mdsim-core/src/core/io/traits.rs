use crate::core::models::particle::Particle;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Defines the interface for reading and writing particle file formats.
///
/// Implementors handle format-specific parsing and serialization; the path-based
/// helpers wrap the stream methods in buffered file handles.
pub trait ParticleFile {
    /// File extension used for files of this format, without the leading dot.
    const EXTENSION: &'static str;

    /// Reads all particles from a buffered reader.
    ///
    /// Particles receive fresh ids; neighbor topology is not part of any format.
    ///
    /// # Errors
    ///
    /// Returns an error if parsing fails or I/O operations encounter issues.
    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Particle>, IoError>;

    /// Writes the given particles to a writer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_to<'a>(
        particles: impl IntoIterator<Item = &'a Particle>,
        writer: &mut impl Write,
    ) -> Result<(), IoError>;

    /// Reads all particles from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Particle>, IoError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    /// Writes the given particles to a file path, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or writing fails.
    fn write_to_path<'a, P: AsRef<Path>>(
        particles: impl IntoIterator<Item = &'a Particle>,
        path: P,
    ) -> Result<(), IoError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(particles, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Receives the particle state every N-th simulation step.
pub trait SnapshotWriter {
    /// Persists one snapshot of the given particles.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn write_snapshot(&mut self, particles: &[&Particle], iteration: u64) -> Result<(), IoError>;
}
