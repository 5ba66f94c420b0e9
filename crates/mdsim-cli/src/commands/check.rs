use crate::cli::CheckArgs;
use crate::config::{Overrides, PartialScenario};
use crate::error::Result;
use mdsim::workflows::simulate::{self, ContainerReport};
use tracing::info;

fn render(report: &ContainerReport) -> String {
    let mut lines = vec![
        format!("Dimensions:     {}", report.dimensions),
        format!("Particles:      {}", report.particle_count),
        format!("Steps:          {}", report.total_steps),
    ];
    match &report.grid {
        Some(grid) => {
            let [nx, ny, nz] = grid.cells_per_axis;
            let [sx, sy, sz] = grid.cell_size;
            lines.push(format!(
                "Grid:           {} x {} x {} cells ({} total, halo included)",
                nx, ny, nz, grid.cell_count
            ));
            lines.push(format!("Cell size:      {:.4} x {:.4} x {:.4}", sx, sy, sz));
            lines.push(format!(
                "Occupancy:      {} occupied cells, at most {} particles per cell",
                grid.occupied_cells, grid.max_occupancy
            ));
            if grid.halo_particles > 0 {
                lines.push(format!(
                    "Warning:        {} particle(s) start outside the domain",
                    grid.halo_particles
                ));
            }
        }
        None => lines.push("Container:      direct sum".to_string()),
    }
    lines.join("\n")
}

pub fn run(args: CheckArgs) -> Result<()> {
    let partial = PartialScenario::from_file(&args.config)?;
    let scenario = partial.merge_with_cli(&Overrides::from(&args))?;
    let particles = super::load_particles(&scenario)?;

    info!("Building container without stepping...");
    let report = simulate::inspect(&scenario.config, particles)?;
    println!("✓ Scenario '{}' is valid.", args.config.display());
    println!("{}", render(&report));
    Ok(())
}
