use super::traits::{IoError, ParticleFile};
use crate::core::models::particle::Particle;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::Path;

/// One CSV row. Field order defines the header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ParticleRecord {
    type_id: i32,
    x: f64,
    y: f64,
    z: f64,
    vx: f64,
    vy: f64,
    vz: f64,
    fx: f64,
    fy: f64,
    fz: f64,
    old_fx: f64,
    old_fy: f64,
    old_fz: f64,
    mass: f64,
    epsilon: f64,
    sigma: f64,
    fixed: bool,
}

impl From<&Particle> for ParticleRecord {
    fn from(p: &Particle) -> Self {
        Self {
            type_id: p.type_id,
            x: p.position.x,
            y: p.position.y,
            z: p.position.z,
            vx: p.velocity.x,
            vy: p.velocity.y,
            vz: p.velocity.z,
            fx: p.force.x,
            fy: p.force.y,
            fz: p.force.z,
            old_fx: p.old_force.x,
            old_fy: p.old_force.y,
            old_fz: p.old_force.z,
            mass: p.mass,
            epsilon: p.epsilon,
            sigma: p.sigma,
            fixed: p.fixed,
        }
    }
}

impl From<ParticleRecord> for Particle {
    fn from(r: ParticleRecord) -> Self {
        let mut p = Particle::new(
            Vector3::new(r.x, r.y, r.z),
            Vector3::new(r.vx, r.vy, r.vz),
            r.mass,
        )
        .with_lennard_jones(r.epsilon, r.sigma)
        .with_type(r.type_id);
        p.force = Vector3::new(r.fx, r.fy, r.fz);
        p.old_force = Vector3::new(r.old_fx, r.old_fy, r.old_fz);
        p.fixed = r.fixed;
        p
    }
}

/// Full particle state as comma-separated values with a header row.
///
/// Used both for snapshots and for checkpoints that a later run resumes from.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFile;

impl ParticleFile for CsvFile {
    const EXTENSION: &'static str = "csv";

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Particle>, IoError> {
        let mut csv_reader = ::csv::Reader::from_reader(reader);
        let mut particles = Vec::new();
        for record in csv_reader.deserialize::<ParticleRecord>() {
            particles.push(Particle::from(record?));
        }
        Ok(particles)
    }

    fn write_to<'a>(
        particles: impl IntoIterator<Item = &'a Particle>,
        writer: &mut impl Write,
    ) -> Result<(), IoError> {
        let mut csv_writer = ::csv::Writer::from_writer(writer);
        let mut empty = true;
        for p in particles {
            csv_writer.serialize(ParticleRecord::from(p))?;
            empty = false;
        }
        if empty {
            // serde only emits the header together with the first record
            csv_writer.write_record([
                "type_id", "x", "y", "z", "vx", "vy", "vz", "fx", "fy", "fz", "old_fx", "old_fy",
                "old_fz", "mass", "epsilon", "sigma", "fixed",
            ])?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

/// Writes a checkpoint that [`read_checkpoint`] can restore.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_checkpoint<'a, P: AsRef<Path>>(
    path: P,
    particles: impl IntoIterator<Item = &'a Particle>,
) -> Result<(), IoError> {
    CsvFile::write_to_path(particles, path)
}

/// Restores the particles of a checkpoint written by [`write_checkpoint`].
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a row fails to parse.
pub fn read_checkpoint<P: AsRef<Path>>(path: P) -> Result<Vec<Particle>, IoError> {
    CsvFile::read_from_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    fn sample_particle() -> Particle {
        let mut p = Particle::new(
            Vector3::new(1.0, 2.5, -0.5),
            Vector3::new(0.1, -0.2, 0.3),
            2.0,
        )
        .with_lennard_jones(1.5, 1.2)
        .with_type(4);
        p.force = Vector3::new(3.0, 2.0, 1.0);
        p.old_force = Vector3::new(-1.0, -2.0, -3.0);
        p.fixed = true;
        p
    }

    #[test]
    fn write_emits_header_and_one_row_per_particle() {
        let particles = vec![sample_particle(), sample_particle()];
        let mut buffer = Vec::new();
        CsvFile::write_to(&particles, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "type_id,x,y,z,vx,vy,vz,fx,fy,fz,old_fx,old_fy,old_fz,mass,epsilon,sigma,fixed"
        );
        assert_eq!(lines.count(), 2);
    }

    #[test]
    fn empty_particle_set_still_has_header() {
        let mut buffer = Vec::new();
        CsvFile::write_to(std::iter::empty(), &mut buffer).unwrap();
        let restored = CsvFile::read_from(&mut Cursor::new(buffer)).unwrap();
        assert!(restored.is_empty());
    }

    #[test]
    fn checkpoint_preserves_particle_state() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.csv");
        let original = sample_particle();
        write_checkpoint(&path, [&original]).unwrap();

        let restored = read_checkpoint(&path).unwrap();
        assert_eq!(restored.len(), 1);
        let p = &restored[0];
        assert_eq!(p.position, original.position);
        assert_eq!(p.velocity, original.velocity);
        assert_eq!(p.force, original.force);
        assert_eq!(p.old_force, original.old_force);
        assert_eq!(p.mass, original.mass);
        assert_eq!(p.epsilon, original.epsilon);
        assert_eq!(p.sigma, original.sigma);
        assert_eq!(p.type_id, original.type_id);
        assert!(p.fixed);
        assert_ne!(p.id(), original.id());
    }

    #[test]
    fn malformed_row_is_reported() {
        let text = "type_id,x,y,z,vx,vy,vz,fx,fy,fz,old_fx,old_fy,old_fz,mass,epsilon,sigma,fixed\n\
                    0,1.0,oops,0,0,0,0,0,0,0,0,0,0,1,5,1,false\n";
        let result = CsvFile::read_from(&mut Cursor::new(text));
        assert!(matches!(result, Err(IoError::Csv(_))));
    }

    #[test]
    fn missing_checkpoint_is_an_io_error() {
        let dir = tempdir().unwrap();
        let result = read_checkpoint(dir.path().join("absent.csv"));
        assert!(matches!(result, Err(IoError::Io(_))));
    }
}
