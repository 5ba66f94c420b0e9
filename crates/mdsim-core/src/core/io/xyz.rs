use super::traits::{IoError, ParticleFile};
use crate::core::models::particle::Particle;
use nalgebra::Vector3;
use std::io::{BufRead, Write};

const COMMENT: &str = "Generated by mdsim";

/// Plain XYZ format: a count line, a comment line and one `type x y z` line per
/// particle.
///
/// Only positions and types survive a round trip; particles read back get unit mass,
/// zero velocity and default Lennard-Jones parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct XyzFile;

fn parse_field<T: std::str::FromStr>(
    value: Option<&str>,
    line: usize,
    name: &str,
) -> Result<T, IoError> {
    let value = value.ok_or_else(|| IoError::Parse {
        line,
        message: format!("missing {} column", name),
    })?;
    value.parse().map_err(|_| IoError::Parse {
        line,
        message: format!("invalid {} value '{}'", name, value),
    })
}

impl ParticleFile for XyzFile {
    const EXTENSION: &'static str = "xyz";

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Particle>, IoError> {
        let mut lines = reader.lines();
        let count_line = lines.next().ok_or(IoError::Parse {
            line: 1,
            message: "missing particle count".to_string(),
        })??;
        let count: usize = parse_field(Some(count_line.trim()), 1, "count")?;
        // comment line
        lines.next().transpose()?;

        let mut particles = Vec::with_capacity(count);
        for (offset, line) in lines.enumerate().take(count) {
            let line = line?;
            let line_number = offset + 3;
            let mut fields = line.split_whitespace();
            let type_id: i32 = parse_field(fields.next(), line_number, "type")?;
            let x: f64 = parse_field(fields.next(), line_number, "x")?;
            let y: f64 = parse_field(fields.next(), line_number, "y")?;
            let z: f64 = parse_field(fields.next(), line_number, "z")?;
            particles.push(
                Particle::new(Vector3::new(x, y, z), Vector3::zeros(), 1.0).with_type(type_id),
            );
        }

        if particles.len() != count {
            return Err(IoError::Parse {
                line: particles.len() + 3,
                message: format!("expected {} particles, found {}", count, particles.len()),
            });
        }
        Ok(particles)
    }

    fn write_to<'a>(
        particles: impl IntoIterator<Item = &'a Particle>,
        writer: &mut impl Write,
    ) -> Result<(), IoError> {
        let particles: Vec<&Particle> = particles.into_iter().collect();
        writeln!(writer, "{}", particles.len())?;
        writeln!(writer, "{}", COMMENT)?;
        for p in particles {
            writeln!(
                writer,
                "{} {} {} {}",
                p.type_id, p.position.x, p.position.y, p.position.z
            )?;
        }
        Ok(())
    }
}
