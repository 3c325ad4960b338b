mod archive;
mod basis;
mod geometry;
mod report;
mod settings;

use self::archive::run_archive_followups;
use self::basis::{BasisRegistry, NwchemFileLoader};
use self::geometry::{build_geometry, Geometry};
use self::report::{report_all_ranks, report_partition};
use self::settings::RunSettings;
use crate::config::{Args, Config};
use crate::io::setup_output;
use ::basis::BasisSet;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use std::fs;
use std::sync::Arc;
use tracing::info;
use xctask::{partition_all, LoadBalancerBuilder, MolGrid, MolMeta};

pub struct TaskApplication {
    args: Args,
    config: Config,
}

impl TaskApplication {
    pub fn from_cli() -> Result<Self> {
        let args = Args::parse();
        let config = load_config(&args)?;
        Ok(Self { args, config })
    }

    pub fn run(self) -> Result<()> {
        setup_output(self.args.output.as_deref())?;
        info!("Configuration loaded from: {}", self.args.config_file);

        let settings = RunSettings::resolve(&self.args, &self.config)?;
        info!("Run settings: {:?}", settings);

        let Geometry { elements, molecule } = build_geometry(&self.config)?;

        let mut registry = BasisRegistry::new(NwchemFileLoader::from_params(&self.config.basis));
        let library = registry.load_for_elements(&elements)?;
        let mut basis = BasisSet::assemble(molecule.centers(), library, settings.harmonics)
            .wrap_err("Failed to place basis shells on the molecule")?;
        basis.set_shell_tolerance(settings.shell_tolerance)?;
        info!("Basis: {} shells, {} functions", basis.nshells(), basis.nbf());

        let grid = MolGrid::new(settings.grid_size, &molecule)
            .with_r_max(settings.r_max)
            .with_batch_policy(settings.batch_policy);
        let meta = Arc::new(MolMeta::new(&molecule)?);

        let lb = LoadBalancerBuilder::new(settings.group, &molecule, &grid, &basis)
            .meta(meta)
            .cost_model(settings.cost_model)
            .build()
            .wrap_err("Task generation failed")?;
        report_partition(&lb);

        if self.args.all_ranks {
            let shares = partition_all(lb.global_tasks(), settings.group.size(), &settings.cost_model)?;
            report_all_ranks(&shares, &settings.cost_model);
        }

        run_archive_followups(&lb, &self.args, &self.config)
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let config_content = fs::read_to_string(&args.config_file)
        .wrap_err_with(|| format!("Unable to read configuration file: {}", args.config_file))?;

    let config = serde_yml::from_str::<Config>(&config_content)
        .wrap_err("Failed to parse configuration file")?
        .with_defaults();

    Ok(config)
}
