use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "mdsim - A linked-cells molecular dynamics simulator for Lennard-Jones, gravity and membrane particle systems.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel force evaluation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the simulation described by a scenario file.
    Run(RunArgs),
    /// Validate a scenario and report the container it builds, without stepping it.
    Check(CheckArgs),
}

/// Snapshot file format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Xyz,
    /// Do not write snapshots.
    None,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the scenario file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    // --- Output Overrides ---
    /// Directory receiving the snapshot files.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Snapshot file format.
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// File name prefix of the snapshot files.
    #[arg(long, value_name = "NAME")]
    pub base_name: Option<String>,

    /// Write the final particle state as a CSV checkpoint to this path.
    #[arg(long, value_name = "PATH")]
    pub checkpoint_out: Option<PathBuf>,

    // --- Simulation Overrides ---
    /// Override the simulated end time.
    #[arg(short, long, value_name = "FLOAT")]
    pub end_time: Option<f64>,

    /// Override the time step.
    #[arg(short, long, value_name = "FLOAT")]
    pub delta_t: Option<f64>,

    /// Override the number of steps between snapshots (0 disables them).
    #[arg(long, value_name = "INT")]
    pub output_interval: Option<u64>,

    /// Seed for every random draw of the run.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Set a specific scenario value, overriding the scenario file.
    /// Can be used multiple times. Example: -S thermostat.target-temperature=30
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the scenario file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Set a specific scenario value, overriding the scenario file.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
