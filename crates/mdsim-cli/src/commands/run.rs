use crate::cli::{OutputFormat, RunArgs};
use crate::config::{OutputSettings, Overrides, PartialScenario};
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use mdsim::{
    core::io::{
        csv::write_checkpoint,
        traits::SnapshotWriter,
        writer::{CsvWriter, NullWriter, XyzWriter},
    },
    engine::progress::ProgressReporter,
    workflows,
};
use tracing::info;

fn create_writer(output: &OutputSettings) -> Result<Box<dyn SnapshotWriter>> {
    let to_cli_error = |source| CliError::Output {
        path: output.directory.clone(),
        source,
    };
    let writer: Box<dyn SnapshotWriter> = match output.format {
        OutputFormat::Csv => Box::new(
            CsvWriter::new(&output.directory, output.base_name.as_str()).map_err(to_cli_error)?,
        ),
        OutputFormat::Xyz => Box::new(
            XyzWriter::new(&output.directory, output.base_name.as_str()).map_err(to_cli_error)?,
        ),
        OutputFormat::None => Box::new(NullWriter),
    };
    Ok(writer)
}

pub fn run(args: RunArgs) -> Result<()> {
    let partial = PartialScenario::from_file(&args.config)?;
    info!("Merging scenario from file and CLI arguments...");
    let scenario = partial.merge_with_cli(&Overrides::from(&args))?;

    let particles = super::load_particles(&scenario)?;
    let mut writer = create_writer(&scenario.output)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Simulating {} particles until t = {}...",
        particles.len(),
        scenario.config.end_time
    );
    info!("Invoking the core simulation workflow...");
    let outcome = workflows::simulate::run(&scenario.config, particles, writer.as_mut(), &reporter)?;
    let summary = outcome.summary;

    println!(
        "✓ Simulation finished after {} steps (t = {:.4}), {} particles remaining.",
        summary.iterations, summary.final_time, summary.particle_count
    );
    if summary.snapshots_written > 0 {
        println!(
            "  {} snapshot(s) written to: {}",
            summary.snapshots_written,
            scenario.output.directory.display()
        );
    }

    if let Some(path) = &scenario.checkpoint_out {
        info!("Writing checkpoint to {:?}", path);
        write_checkpoint(path, &outcome.particles).map_err(|source| CliError::Output {
            path: path.clone(),
            source,
        })?;
        println!("  Checkpoint written to: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use mdsim::core::io::csv::read_checkpoint;
    use std::fs;

    const SMALL_BOX: &str = r#"
        [simulation]
        delta-t = 0.0005
        end-time = 0.0098
        output-interval = 10
        seed = 1

        [container]
        domain-size = [20.0, 20.0, 0.0]
        cutoff-radius = 3.0

        [container.boundaries]
        all = "reflective"

        [[cuboids]]
        origin = [5.0, 5.0, 0.0]
        counts = [4, 3, 1]
        spacing = 1.1225
        brownian-mean = 0.1
    "#;

    fn parse_run_args(extra: &[&str]) -> RunArgs {
        let args = ["mdsim", "run"].iter().chain(extra.iter());
        match Cli::parse_from(args).command {
            Commands::Run(run_args) => run_args,
            _ => panic!("Expected 'run' subcommand"),
        }
    }

    #[test]
    fn run_writes_snapshots_and_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let scenario_path = dir.path().join("box.toml");
        fs::write(&scenario_path, SMALL_BOX).unwrap();
        let output_dir = dir.path().join("frames");
        let checkpoint = dir.path().join("final.csv");

        let args = parse_run_args(&[
            "-c",
            scenario_path.to_str().unwrap(),
            "-o",
            output_dir.to_str().unwrap(),
            "--base-name",
            "box",
            "--checkpoint-out",
            checkpoint.to_str().unwrap(),
        ]);
        run(args).unwrap();

        assert!(output_dir.join("box_10.csv").exists());
        assert!(output_dir.join("box_20.csv").exists());
        assert_eq!(read_checkpoint(&checkpoint).unwrap().len(), 12);
    }

    #[test]
    fn run_without_snapshots_creates_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let scenario_path = dir.path().join("box.toml");
        fs::write(&scenario_path, SMALL_BOX).unwrap();
        let output_dir = dir.path().join("frames");

        let args = parse_run_args(&[
            "-c",
            scenario_path.to_str().unwrap(),
            "-o",
            output_dir.to_str().unwrap(),
            "--format",
            "none",
        ]);
        run(args).unwrap();
        assert!(!output_dir.exists());
    }

    #[test]
    fn run_fails_for_missing_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let args = parse_run_args(&["-c", missing.to_str().unwrap()]);
        assert!(matches!(run(args), Err(CliError::Io(_))));
    }
}
