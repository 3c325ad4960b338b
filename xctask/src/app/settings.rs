use crate::config::{Args, Config};
use ::basis::Harmonics;
use color_eyre::eyre::{eyre, Result};
use xctask::{BatchPolicy, CostModel, GridSize, ProcessGroup};

/// Grid, distribution and basis choices after command-line overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub grid_size: GridSize,
    pub r_max: f64,
    pub batch_policy: BatchPolicy,
    pub group: ProcessGroup,
    pub cost_model: CostModel,
    pub harmonics: Harmonics,
    pub shell_tolerance: f64,
}

impl RunSettings {
    pub fn resolve(args: &Args, config: &Config) -> Result<Self> {
        let grid = config.grid_params();
        let lb = config.load_balance_params();

        let grid_size = match (args.grid_size.as_deref(), grid.radial_points, grid.angular_points) {
            (Some(name), _, _) => parse_grid_size(name)?,
            (None, Some(radial), Some(angular)) => GridSize::Explicit { radial, angular },
            (None, _, _) => parse_grid_size(grid.size.as_deref().unwrap_or("ultrafine"))?,
        };

        let batch_size = args
            .batch_size
            .or(grid.batch_size)
            .unwrap_or(xctask::grid::DEFAULT_BATCH_SIZE);
        let batch_policy = parse_batch_policy(grid.batching.as_deref().unwrap_or("spatial"), batch_size)?;

        let group = ProcessGroup::new(
            args.group_size.or(lb.group_size).unwrap_or(1),
            args.rank.or(lb.rank).unwrap_or(0),
        )?;

        let cost_model = parse_cost_model(
            args.cost_model
                .as_deref()
                .or(lb.cost_model.as_deref())
                .unwrap_or("nbe_squared_points"),
        )?;

        Ok(Self {
            grid_size,
            r_max: grid.r_max.unwrap_or(xctask::grid::DEFAULT_R_MAX),
            batch_policy,
            group,
            cost_model,
            harmonics: parse_harmonics(config.basis.harmonics.as_deref().unwrap_or("spherical"))?,
            shell_tolerance: args
                .shell_tolerance
                .or(config.basis.shell_tolerance)
                .unwrap_or(::basis::DEFAULT_SHELL_TOLERANCE),
        })
    }
}

pub fn parse_grid_size(name: &str) -> Result<GridSize> {
    match name.to_lowercase().as_str() {
        "fine" => Ok(GridSize::Fine),
        "ultrafine" => Ok(GridSize::UltraFine),
        "superfine" => Ok(GridSize::SuperFine),
        other => Err(eyre!("Unknown grid size: {}", other)),
    }
}

pub fn parse_batch_policy(kind: &str, batch_size: usize) -> Result<BatchPolicy> {
    match kind.to_lowercase().as_str() {
        "spatial" => Ok(BatchPolicy::Spatial(batch_size)),
        "chunked" => Ok(BatchPolicy::Chunked(batch_size)),
        other => Err(eyre!("Unknown batching policy: {}", other)),
    }
}

pub fn parse_cost_model(name: &str) -> Result<CostModel> {
    match name.to_lowercase().as_str() {
        "nbe_squared_points" => Ok(CostModel::NbeSquaredPoints),
        "nbe_points" => Ok(CostModel::NbePoints),
        "points" => Ok(CostModel::Points),
        other => Err(eyre!("Unknown cost model: {}", other)),
    }
}

pub fn parse_harmonics(name: &str) -> Result<Harmonics> {
    match name.to_lowercase().as_str() {
        "spherical" => Ok(Harmonics::Spherical),
        "cartesian" => Ok(Harmonics::Cartesian),
        other => Err(eyre!("Unknown harmonic convention: {}", other)),
    }
}
