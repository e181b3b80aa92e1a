use anyhow::{Context, Result};
use canvas_gl::cli::Cli;
use canvas_gl::demo::{run_stress, StressConfig};
use canvas_gl::DriverConfig;
use clap::Parser;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let driver_config = match &cli.config {
        Some(path) => DriverConfig::from_json_file(path)?,
        None => DriverConfig::default(),
    };

    let stress = StressConfig {
        callers: cli.callers,
        canvases: cli.canvases,
        commands_per_caller: cli.commands,
        destroy_after: cli.destroy_after,
    };

    let report = run_stress(&stress, driver_config)?;

    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{json}");
    } else {
        println!(
            "{} callers / {} canvases: {} executed, {} without canvas, \
             {} activation failures, {} stale",
            report.callers,
            report.canvases,
            report.totals.executed,
            report.totals.no_active_canvas,
            report.totals.activation_failed,
            report.totals.stale,
        );
        println!(
            "{} context switches, {} make-current calls, {} ms",
            report.driver.switches, report.make_current_calls, report.elapsed_ms
        );
    }

    Ok(())
}
