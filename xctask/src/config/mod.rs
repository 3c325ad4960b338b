//! Configuration for task generation runs
//!
//! The YAML file describes the molecule, where its basis comes from, the grid
//! and how tasks are distributed. Every parameter section is optional and
//! filled in by `with_defaults`.

mod args;

pub use args::Args;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub geometry: Vec<Atom>,
    pub basis: BasisParams,
    pub grid: Option<GridParams>,
    pub load_balance: Option<LoadBalanceParams>,
    pub archive: Option<ArchiveParams>,
}

/// Atomic position configuration, in bohr
#[derive(Debug, Deserialize, Serialize)]
pub struct Atom {
    pub element: String,
    pub coords: [f64; 3],
}

/// Where NWChem basis files are found
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BasisParams {
    /// Basis name, used to build `<name>.<symbol>.nwchem` file names
    pub name: Option<String>,
    pub directory: Option<String>,
    /// Explicit file per element symbol, takes precedence over `directory`
    pub files: Option<HashMap<String, String>>,
    /// "spherical" or "cartesian"
    pub harmonics: Option<String>,
    pub shell_tolerance: Option<f64>,
}

impl Default for BasisParams {
    fn default() -> Self {
        BasisParams {
            name: Some("sto-3g".to_string()),
            directory: Some("basis_sets".to_string()),
            files: None,
            harmonics: Some("spherical".to_string()),
            shell_tolerance: Some(basis::DEFAULT_SHELL_TOLERANCE),
        }
    }
}

impl BasisParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.name.is_none() {
            self.name = defaults.name;
        }
        if self.directory.is_none() {
            self.directory = defaults.directory;
        }
        if self.harmonics.is_none() {
            self.harmonics = defaults.harmonics;
        }
        if self.shell_tolerance.is_none() {
            self.shell_tolerance = defaults.shell_tolerance;
        }
        self
    }
}

/// Molecular grid parameters
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GridParams {
    /// "fine", "ultrafine" or "superfine"; ignored when both point counts are set
    pub size: Option<String>,
    pub radial_points: Option<usize>,
    pub angular_points: Option<usize>,
    pub r_max: Option<f64>,
    /// "spatial" or "chunked"
    pub batching: Option<String>,
    pub batch_size: Option<usize>,
}

impl Default for GridParams {
    fn default() -> Self {
        GridParams {
            size: Some("ultrafine".to_string()),
            radial_points: None,
            angular_points: None,
            r_max: Some(xctask::grid::DEFAULT_R_MAX),
            batching: Some("spatial".to_string()),
            batch_size: Some(xctask::grid::DEFAULT_BATCH_SIZE),
        }
    }
}

impl GridParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.size.is_none() {
            self.size = defaults.size;
        }
        if self.r_max.is_none() {
            self.r_max = defaults.r_max;
        }
        if self.batching.is_none() {
            self.batching = defaults.batching;
        }
        if self.batch_size.is_none() {
            self.batch_size = defaults.batch_size;
        }
        self
    }
}

/// Process group and cost model
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoadBalanceParams {
    pub group_size: Option<usize>,
    pub rank: Option<usize>,
    /// "nbe_squared_points", "nbe_points" or "points"
    pub cost_model: Option<String>,
}

impl Default for LoadBalanceParams {
    fn default() -> Self {
        LoadBalanceParams {
            group_size: Some(1),
            rank: Some(0),
            cost_model: Some("nbe_squared_points".to_string()),
        }
    }
}

impl LoadBalanceParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.group_size.is_none() {
            self.group_size = defaults.group_size;
        }
        if self.rank.is_none() {
            self.rank = defaults.rank;
        }
        if self.cost_model.is_none() {
            self.cost_model = defaults.cost_model;
        }
        self
    }
}

/// Task archive output and reference checks
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ArchiveParams {
    /// Pickle file receiving this rank's tasks
    pub output: Option<String>,
    pub keep_payload: Option<bool>,
    /// Reference to write from the global task list
    pub write_reference: Option<String>,
    /// Reference to compare the global task list against
    pub check_reference: Option<String>,
    pub reference_rtol: Option<f64>,
}

impl ArchiveParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        if self.keep_payload.is_none() {
            self.keep_payload = Some(true);
        }
        if self.reference_rtol.is_none() {
            self.reference_rtol = Some(xctask::archive::DEFAULT_REFERENCE_RTOL);
        }
        self
    }
}

impl Config {
    /// Apply defaults to all configuration sections
    pub fn with_defaults(mut self) -> Self {
        self.basis = self.basis.with_defaults();
        self.grid = Some(self.grid.take().unwrap_or_default().with_defaults());
        self.load_balance = Some(self.load_balance.take().unwrap_or_default().with_defaults());
        self.archive = Some(self.archive.take().unwrap_or_default().with_defaults());
        self
    }

    pub fn grid_params(&self) -> GridParams {
        self.grid.clone().unwrap_or_default().with_defaults()
    }

    pub fn load_balance_params(&self) -> LoadBalanceParams {
        self.load_balance.clone().unwrap_or_default().with_defaults()
    }

    pub fn archive_params(&self) -> ArchiveParams {
        self.archive.clone().unwrap_or_default().with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
geometry:
  - element: H
    coords: [0.0, 0.0, 0.0]
  - element: H
    coords: [0.0, 0.0, 1.4]
basis:
  directory: data
"#;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = serde_yml::from_str::<Config>(MINIMAL).unwrap().with_defaults();
        assert_eq!(config.geometry.len(), 2);
        assert_eq!(config.basis.directory.as_deref(), Some("data"));
        assert_eq!(config.basis.name.as_deref(), Some("sto-3g"));

        let grid = config.grid_params();
        assert_eq!(grid.size.as_deref(), Some("ultrafine"));
        assert_eq!(grid.batch_size, Some(512));

        let lb = config.load_balance_params();
        assert_eq!(lb.group_size, Some(1));
        assert_eq!(lb.rank, Some(0));
        assert_eq!(config.archive_params().keep_payload, Some(true));
    }

    #[test]
    fn test_explicit_sections_are_kept() {
        let text = format!(
            "{}{}",
            MINIMAL,
            r#"grid:
  radial_points: 20
  angular_points: 50
  batching: chunked
load_balance:
  group_size: 4
  rank: 3
  cost_model: points
archive:
  output: tasks.pkl
  keep_payload: false
"#
        );
        let config = serde_yml::from_str::<Config>(&text).unwrap().with_defaults();
        let grid = config.grid_params();
        assert_eq!(grid.radial_points, Some(20));
        assert_eq!(grid.batching.as_deref(), Some("chunked"));
        assert_eq!(grid.batch_size, Some(512));
        let lb = config.load_balance_params();
        assert_eq!((lb.group_size, lb.rank), (Some(4), Some(3)));
        assert_eq!(lb.cost_model.as_deref(), Some("points"));
        assert_eq!(config.archive_params().keep_payload, Some(false));
    }
}
