use crate::cli::{CheckArgs, OutputFormat, RunArgs};
use crate::error::{CliError, Result};
use mdsim::core::container::side::Side;
use mdsim::core::forcefield::law::ForceLaw;
use mdsim::core::generators::{Cuboid, Disc, Material, ParticleSource, Sphere};
use mdsim::engine::boundary::{BoundaryCondition, BoundaryConditions};
use mdsim::engine::config as core_config;
use nalgebra::Vector3;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

const DEFAULT_BASE_NAME: &str = "MD";
const DEFAULT_OUTPUT_DIR: &str = "output";

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSimulationSection {
    delta_t: Option<f64>,
    end_time: Option<f64>,
    output_interval: Option<u64>,
    force: Option<String>,
    gravity: Option<[f64; 3]>,
    seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialOutputSection {
    directory: Option<PathBuf>,
    base_name: Option<String>,
    format: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialBoundaries {
    /// Applied to every side not listed explicitly.
    all: Option<String>,
    left: Option<String>,
    right: Option<String>,
    bottom: Option<String>,
    top: Option<String>,
    front: Option<String>,
    back: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialContainerSection {
    #[serde(rename = "type")]
    kind: Option<String>,
    domain_size: Option<[f64; 3]>,
    cutoff_radius: Option<f64>,
    dimensions: Option<usize>,
    boundaries: Option<PartialBoundaries>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialThermostatSection {
    initial_temperature: Option<f64>,
    target_temperature: Option<f64>,
    max_delta: Option<f64>,
    interval: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialMembraneSection {
    stiffness: Option<f64>,
    rest_length: Option<f64>,
    pull_force: Option<[f64; 3]>,
    pull_until: Option<f64>,
}

fn material(
    mass: Option<f64>,
    epsilon: Option<f64>,
    sigma: Option<f64>,
    type_id: Option<i32>,
    fixed: Option<bool>,
) -> Material {
    let defaults = Material::default();
    Material {
        mass: mass.unwrap_or(defaults.mass),
        epsilon: epsilon.unwrap_or(defaults.epsilon),
        sigma: sigma.unwrap_or(defaults.sigma),
        type_id: type_id.unwrap_or(defaults.type_id),
        fixed: fixed.unwrap_or(defaults.fixed),
    }
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialCuboid {
    origin: [f64; 3],
    counts: [usize; 3],
    spacing: f64,
    #[serde(default)]
    velocity: [f64; 3],
    #[serde(default)]
    brownian_mean: f64,
    #[serde(default)]
    membrane: bool,
    #[serde(default)]
    marked: Vec<[usize; 3]>,
    mass: Option<f64>,
    epsilon: Option<f64>,
    sigma: Option<f64>,
    #[serde(rename = "type")]
    type_id: Option<i32>,
    fixed: Option<bool>,
}

impl From<PartialCuboid> for Cuboid {
    fn from(p: PartialCuboid) -> Self {
        Self {
            origin: Vector3::from(p.origin),
            counts: p.counts,
            spacing: p.spacing,
            velocity: Vector3::from(p.velocity),
            brownian_mean: p.brownian_mean,
            material: material(p.mass, p.epsilon, p.sigma, p.type_id, p.fixed),
            membrane: p.membrane,
            marked: p.marked,
        }
    }
}

/// Disc and sphere share the same keys.
#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialRoundBody {
    center: [f64; 3],
    radius: usize,
    spacing: f64,
    #[serde(default)]
    velocity: [f64; 3],
    #[serde(default)]
    brownian_mean: f64,
    mass: Option<f64>,
    epsilon: Option<f64>,
    sigma: Option<f64>,
    #[serde(rename = "type")]
    type_id: Option<i32>,
    fixed: Option<bool>,
}

impl From<PartialRoundBody> for Disc {
    fn from(p: PartialRoundBody) -> Self {
        Self {
            center: Vector3::from(p.center),
            radius: p.radius,
            spacing: p.spacing,
            velocity: Vector3::from(p.velocity),
            brownian_mean: p.brownian_mean,
            material: material(p.mass, p.epsilon, p.sigma, p.type_id, p.fixed),
        }
    }
}

impl From<PartialRoundBody> for Sphere {
    fn from(p: PartialRoundBody) -> Self {
        Self {
            center: Vector3::from(p.center),
            radius: p.radius,
            spacing: p.spacing,
            velocity: Vector3::from(p.velocity),
            brownian_mean: p.brownian_mean,
            material: material(p.mass, p.epsilon, p.sigma, p.type_id, p.fixed),
        }
    }
}

/// Scenario file as written by the user; every section is optional until merged.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct PartialScenario {
    simulation: Option<PartialSimulationSection>,
    output: Option<PartialOutputSection>,
    container: Option<PartialContainerSection>,
    thermostat: Option<PartialThermostatSection>,
    membrane: Option<PartialMembraneSection>,
    #[serde(default)]
    cuboids: Vec<PartialCuboid>,
    #[serde(default)]
    discs: Vec<PartialRoundBody>,
    #[serde(default)]
    spheres: Vec<PartialRoundBody>,
    /// CSV checkpoint whose particles are loaded before the generated bodies.
    checkpoint: Option<PathBuf>,
}

/// Where and how snapshots are written.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    pub directory: PathBuf,
    pub base_name: String,
    pub format: OutputFormat,
}

/// Fully merged scenario, ready to hand to the simulation workflow.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub config: core_config::SimulationConfig,
    pub sources: Vec<ParticleSource>,
    pub checkpoint: Option<PathBuf>,
    pub output: OutputSettings,
    pub checkpoint_out: Option<PathBuf>,
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

fn parse_boundary(side: &str, value: &str) -> Result<BoundaryCondition> {
    value.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown boundary condition '{}' for side '{}'. Expected outflow, reflective or periodic.",
            value, side
        ))
    })
}

fn parse_force(value: &str) -> Result<ForceLaw> {
    value.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown force '{}'. Expected lennard-jones or gravity.",
            value
        ))
    })
}

fn parse_format(value: &str) -> Result<OutputFormat> {
    <OutputFormat as clap::ValueEnum>::from_str(value, true).map_err(|_| {
        CliError::Config(format!(
            "Unknown output format '{}'. Expected csv, xyz or none.",
            value
        ))
    })
}

fn required<T>(value: Option<T>, key: &str) -> Result<T> {
    value.ok_or_else(|| {
        CliError::Config(format!(
            "A value for '{}' is required either in the scenario file or via CLI argument.",
            key
        ))
    })
}

impl PartialBoundaries {
    fn resolve(&self) -> Result<BoundaryConditions> {
        let fallback = match &self.all {
            Some(value) => parse_boundary("all", value)?,
            None => BoundaryCondition::default(),
        };
        let mut conditions = BoundaryConditions::uniform(fallback);
        let explicit = [
            (Side::Left, &self.left),
            (Side::Right, &self.right),
            (Side::Bottom, &self.bottom),
            (Side::Top, &self.top),
            (Side::Front, &self.front),
            (Side::Back, &self.back),
        ];
        for (side, value) in explicit {
            if let Some(value) = value {
                conditions.set(side, parse_boundary(&side.to_string(), value)?);
            }
        }
        Ok(conditions)
    }
}

impl PartialContainerSection {
    fn resolve(self) -> Result<core_config::ContainerConfig> {
        let kind = self.kind.as_deref().unwrap_or("linked-cells");
        match kind.to_ascii_lowercase().as_str() {
            "direct-sum" | "direct" => Ok(core_config::ContainerConfig::DirectSum {
                dimensions: self.dimensions.unwrap_or(3),
            }),
            "linked-cells" | "linked" => {
                let boundaries = self.boundaries.unwrap_or_default().resolve()?;
                Ok(core_config::ContainerConfig::LinkedCells {
                    domain_size: required(self.domain_size, "container.domain-size")?,
                    cutoff_radius: required(self.cutoff_radius, "container.cutoff-radius")?,
                    boundaries,
                })
            }
            other => Err(CliError::Config(format!(
                "Unknown container type '{}'. Expected linked-cells or direct-sum.",
                other
            ))),
        }
    }
}

impl PartialThermostatSection {
    fn resolve(self) -> Result<core_config::ThermostatConfig> {
        Ok(core_config::ThermostatConfig {
            initial_temperature: required(
                self.initial_temperature,
                "thermostat.initial-temperature",
            )?,
            target_temperature: self.target_temperature,
            max_delta: self.max_delta,
            interval: required(self.interval, "thermostat.interval")?,
        })
    }
}

impl PartialMembraneSection {
    fn resolve(self) -> Result<core_config::MembraneConfig> {
        let pull = match (self.pull_force, self.pull_until) {
            (Some(force), Some(until)) => Some(core_config::PullForce {
                force: Vector3::from(force),
                until,
            }),
            (None, None) => None,
            _ => {
                return Err(CliError::Config(
                    "`membrane.pull-force` and `membrane.pull-until` must be given together."
                        .to_string(),
                ));
            }
        };
        Ok(core_config::MembraneConfig {
            stiffness: required(self.stiffness, "membrane.stiffness")?,
            rest_length: required(self.rest_length, "membrane.rest-length")?,
            pull,
        })
    }
}

/// Overrides shared by `run` and `check`.
#[derive(Debug, Default)]
pub struct Overrides<'a> {
    pub end_time: Option<f64>,
    pub delta_t: Option<f64>,
    pub output_interval: Option<u64>,
    pub seed: Option<u64>,
    pub output_dir: Option<&'a Path>,
    pub format: Option<OutputFormat>,
    pub base_name: Option<&'a str>,
    pub checkpoint_out: Option<&'a Path>,
    pub set_values: &'a [String],
}

impl<'a> From<&'a RunArgs> for Overrides<'a> {
    fn from(args: &'a RunArgs) -> Self {
        Self {
            end_time: args.end_time,
            delta_t: args.delta_t,
            output_interval: args.output_interval,
            seed: args.seed,
            output_dir: args.output_dir.as_deref(),
            format: args.format,
            base_name: args.base_name.as_deref(),
            checkpoint_out: args.checkpoint_out.as_deref(),
            set_values: &args.set_values,
        }
    }
}

impl<'a> From<&'a CheckArgs> for Overrides<'a> {
    fn from(args: &'a CheckArgs) -> Self {
        Self {
            set_values: &args.set_values,
            ..Self::default()
        }
    }
}

impl PartialScenario {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading scenario from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut scenario: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        // Relative checkpoint paths are relative to the scenario file.
        if let (Some(checkpoint), Some(dir)) = (&scenario.checkpoint, path.parent()) {
            if checkpoint.is_relative() {
                scenario.checkpoint = Some(dir.join(checkpoint));
            }
        }
        Ok(scenario)
    }

    /// Applies CLI overrides (`-S` first, then dedicated flags) and validates the result.
    pub fn merge_with_cli(mut self, overrides: &Overrides) -> Result<Scenario> {
        self.apply_set_values(overrides.set_values)?;

        let simulation = self.simulation.take().unwrap_or_default();
        let output = self.output.take().unwrap_or_default();
        let container = required(self.container.take(), "container")?.resolve()?;

        let mut builder = core_config::SimulationConfigBuilder::new()
            .delta_t(required(
                overrides.delta_t.or(simulation.delta_t),
                "simulation.delta-t",
            )?)
            .end_time(required(
                overrides.end_time.or(simulation.end_time),
                "simulation.end-time",
            )?)
            .container(container);

        if let Some(interval) = overrides.output_interval.or(simulation.output_interval) {
            builder = builder.output_interval(interval);
        }
        if let Some(force) = &simulation.force {
            builder = builder.force_law(parse_force(force)?);
        }
        if let Some(gravity) = simulation.gravity {
            builder = builder.gravity(Vector3::from(gravity));
        }
        if let Some(seed) = overrides.seed.or(simulation.seed) {
            builder = builder.seed(seed);
        }
        if let Some(thermostat) = self.thermostat.take() {
            builder = builder.thermostat(thermostat.resolve()?);
        }
        if let Some(membrane) = self.membrane.take() {
            builder = builder.membrane(membrane.resolve()?);
        }
        let config = builder
            .build()
            .map_err(|e| CliError::Config(e.to_string()))?;

        let format = match (overrides.format, &output.format) {
            (Some(format), _) => format,
            (None, Some(value)) => parse_format(value)?,
            (None, None) => OutputFormat::Csv,
        };
        let output = OutputSettings {
            directory: overrides
                .output_dir
                .map(Path::to_path_buf)
                .or(output.directory)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR)),
            base_name: overrides
                .base_name
                .map(str::to_string)
                .or(output.base_name)
                .unwrap_or_else(|| DEFAULT_BASE_NAME.to_string()),
            format,
        };

        let sources = self
            .cuboids
            .into_iter()
            .map(|c| ParticleSource::Cuboid(c.into()))
            .chain(self.discs.into_iter().map(|d| ParticleSource::Disc(d.into())))
            .chain(self.spheres.into_iter().map(|s| ParticleSource::Sphere(s.into())))
            .collect::<Vec<_>>();

        if sources.is_empty() && self.checkpoint.is_none() {
            return Err(CliError::Config(
                "The scenario defines no particles: add cuboids, discs, spheres or a checkpoint."
                    .to_string(),
            ));
        }

        Ok(Scenario {
            config,
            sources,
            checkpoint: self.checkpoint,
            output,
            checkpoint_out: overrides.checkpoint_out.map(Path::to_path_buf),
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };
            let (key, value) = (key.trim(), value.trim());

            match key {
                "simulation.delta-t" => {
                    self.simulation.get_or_insert_with(Default::default).delta_t =
                        Some(parse_value(key, value)?);
                }
                "simulation.end-time" => {
                    self.simulation.get_or_insert_with(Default::default).end_time =
                        Some(parse_value(key, value)?);
                }
                "simulation.output-interval" => {
                    self.simulation.get_or_insert_with(Default::default).output_interval =
                        Some(parse_value(key, value)?);
                }
                "simulation.seed" => {
                    self.simulation.get_or_insert_with(Default::default).seed =
                        Some(parse_value(key, value)?);
                }
                "simulation.force" => {
                    self.simulation.get_or_insert_with(Default::default).force = Some(value.to_string());
                }
                "container.cutoff-radius" => {
                    self.container
                        .get_or_insert_with(Default::default)
                        .cutoff_radius = Some(parse_value(key, value)?);
                }
                "thermostat.initial-temperature" => {
                    self.thermostat
                        .get_or_insert_with(Default::default)
                        .initial_temperature = Some(parse_value(key, value)?);
                }
                "thermostat.target-temperature" => {
                    self.thermostat
                        .get_or_insert_with(Default::default)
                        .target_temperature = Some(parse_value(key, value)?);
                }
                "thermostat.max-delta" => {
                    self.thermostat
                        .get_or_insert_with(Default::default)
                        .max_delta = Some(parse_value(key, value)?);
                }
                "thermostat.interval" => {
                    self.thermostat
                        .get_or_insert_with(Default::default)
                        .interval = Some(parse_value(key, value)?);
                }
                "output.base-name" => {
                    self.output.get_or_insert_with(Default::default).base_name =
                        Some(value.to_string());
                }
                "output.format" => {
                    self.output.get_or_insert_with(Default::default).format =
                        Some(value.to_string());
                }
                _ if key.starts_with("container.boundaries.") => {
                    let side = &key["container.boundaries.".len()..];
                    parse_boundary(side, value)?;
                    let boundaries = self
                        .container
                        .get_or_insert_with(Default::default)
                        .boundaries
                        .get_or_insert_with(Default::default);
                    let slot = match side {
                        "all" => &mut boundaries.all,
                        "left" => &mut boundaries.left,
                        "right" => &mut boundaries.right,
                        "bottom" => &mut boundaries.bottom,
                        "top" => &mut boundaries.top,
                        "front" => &mut boundaries.front,
                        "back" => &mut boundaries.back,
                        _ => {
                            return Err(CliError::Config(format!(
                                "Unsupported configuration key for --set: '{}'",
                                key
                            )));
                        }
                    };
                    *slot = Some(value.to_string());
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}
