//! Command-line argument parsing for task generation runs

use clap::Parser;

/// Generate, partition and archive screened XC quadrature tasks
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override output file: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override number of cooperating ranks
    #[arg(long)]
    pub group_size: Option<usize>,

    /// Override rank of this process
    #[arg(long)]
    pub rank: Option<usize>,

    /// Report the partition of every rank instead of this one only
    #[arg(long)]
    pub all_ranks: bool,

    /// Override grid preset (fine, ultrafine or superfine)
    #[arg(long)]
    pub grid_size: Option<String>,

    /// Override maximum points per batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Override cost model (nbe_squared_points, nbe_points or points)
    #[arg(long)]
    pub cost_model: Option<String>,

    /// Override shell screening tolerance
    #[arg(long)]
    pub shell_tolerance: Option<f64>,

    /// Override task archive path
    #[arg(long)]
    pub archive: Option<String>,

    /// Drop grid points and weights from the archive
    #[arg(long)]
    pub omit_payload: bool,

    /// Write a payload-free reference of the global task list
    #[arg(long)]
    pub write_reference: Option<String>,

    /// Compare the global task list against a stored reference
    #[arg(long)]
    pub check_reference: Option<String>,
}
