// cli.rs - Command-line interface configuration
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "canvas-gl")]
#[command(about = "Headless GL canvas activation stress run", long_about = None)]
pub struct Cli {
    /// Driver configuration file (JSON)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of caller threads
    #[arg(long, default_value_t = 4)]
    pub callers: usize,

    /// Number of canvases shared between the callers
    #[arg(long, default_value_t = 2)]
    pub canvases: usize,

    /// Commands dispatched by each caller
    #[arg(long, default_value_t = 1000)]
    pub commands: usize,

    /// Destroy the first canvas after this many commands in total
    #[arg(long = "destroy-after")]
    pub destroy_after: Option<u64>,

    /// Print the report as JSON instead of a summary
    #[arg(long, default_value = "false")]
    pub json: bool,
}
