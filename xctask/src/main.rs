//! Task generation command-line interface
//!
//! Reads a YAML configuration, builds the screened task list of the molecule
//! and reports or archives the share of one rank.

use color_eyre::eyre::Result;

mod app;
mod config;
mod io;

use app::TaskApplication;

fn main() -> Result<()> {
    color_eyre::install()?;
    TaskApplication::from_cli()?.run()
}
