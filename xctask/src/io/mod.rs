//! Input/Output operations for task generation runs
//!
//! This module handles logging setup, basis file loading and task tables.

mod basis_loader;
mod output;

pub use basis_loader::{basis_file_path, read_element_basis};
pub use output::{setup_output, write_task_table};
