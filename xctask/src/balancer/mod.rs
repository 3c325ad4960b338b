//! Distribution of the global task list over a group of cooperating ranks.
//!
//! Every rank runs the same deterministic greedy longest-processing-time (LPT)
//! schedule over the same global list and keeps its own share, so no
//! communication is needed while partitioning.

use crate::cost::{CostModel, TaskCost};
use crate::error::{Result, XcTaskError};
use crate::generator::TaskGenerator;
use crate::grid::GridSource;
use crate::molecule::Molecule;
use crate::molmeta::MolMeta;
use crate::screening::{MinkowskiScreen, ShellScreen};
use crate::task::XcTask;
use basis::BasisSet;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};


/// Size of the cooperating group and the position of this process in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessGroup {
    size: usize,
    rank: usize,
}

impl ProcessGroup {
    pub fn new(size: usize, rank: usize) -> Result<Self> {
        if size == 0 {
            return Err(XcTaskError::EmptyGroup);
        }
        if rank >= size {
            return Err(XcTaskError::RankOutOfRange { rank, size });
        }
        Ok(Self { size, rank })
    }

    /// A group of one process.
    pub fn single() -> Self {
        Self { size: 1, rank: 0 }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn rank(&self) -> usize {
        self.rank
    }
}

/// Evaluates `model` on every task, rejecting negative or non-finite costs.
pub fn task_costs(tasks: &[XcTask], model: &dyn TaskCost) -> Result<Vec<f64>> {
    tasks
        .iter()
        .enumerate()
        .map(|(i, t)| {
            let cost = model.cost(t);
            if cost.is_finite() && cost >= 0.0 {
                Ok(cost)
            } else {
                Err(XcTaskError::InvalidCost { task: i, cost })
            }
        })
        .collect()
}

/// Greedy LPT schedule: returns the rank owning each task.
///
/// Tasks are visited by decreasing cost (ties by index) and each goes to the
/// currently least-loaded rank (ties to the lowest rank).
pub fn lpt_schedule(costs: &[f64], nranks: usize) -> Result<Vec<usize>> {
    if nranks == 0 {
        return Err(XcTaskError::EmptyGroup);
    }

    let mut order: Vec<usize> = (0..costs.len()).collect();
    order.sort_by(|&a, &b| match costs[b].total_cmp(&costs[a]) {
        Ordering::Equal => a.cmp(&b),
        ord => ord,
    });

    let mut loads = vec![0.0_f64; nranks];
    let mut owner = vec![0_usize; costs.len()];
    for idx in order {
        let mut target = 0;
        for r in 1..nranks {
            if loads[r] < loads[target] {
                target = r;
            }
        }
        loads[target] += costs[idx];
        owner[idx] = target;
    }
    Ok(owner)
}

/// Cumulative cost per rank under `owner`.
pub fn rank_loads(costs: &[f64], owner: &[usize], nranks: usize) -> Vec<f64> {
    let mut loads = vec![0.0_f64; nranks];
    for (&c, &r) in costs.iter().zip(owner) {
        loads[r] += c;
    }
    loads
}

/// The tasks rank `rank` owns, in global order.
///
/// Tasks are shape-checked and costed for every group size, so a group of
/// one rejects the same input a larger group does.
pub fn partition(
    tasks: &[XcTask],
    group_size: usize,
    rank: usize,
    model: &dyn TaskCost,
) -> Result<Vec<XcTask>> {
    let group = ProcessGroup::new(group_size, rank)?;
    let costs = checked_costs(tasks, model)?;
    if group.size() == 1 {
        return Ok(tasks.to_vec());
    }
    let owner = lpt_schedule(&costs, group.size())?;
    Ok(select(tasks, &owner, group.rank()))
}

/// Every rank's share at once, indexed by rank.
pub fn partition_all(tasks: &[XcTask], group_size: usize, model: &dyn TaskCost) -> Result<Vec<Vec<XcTask>>> {
    if group_size == 0 {
        return Err(XcTaskError::EmptyGroup);
    }
    let owner = lpt_schedule(&checked_costs(tasks, model)?, group_size)?;
    Ok((0..group_size).map(|r| select(tasks, &owner, r)).collect())
}

fn checked_costs(tasks: &[XcTask], model: &dyn TaskCost) -> Result<Vec<f64>> {
    for task in tasks {
        task.check_shape()?;
    }
    task_costs(tasks, model)
}

fn select(tasks: &[XcTask], owner: &[usize], rank: usize) -> Vec<XcTask> {
    tasks
        .iter()
        .zip(owner)
        .filter(|&(_, &r)| r == rank)
        .map(|(t, _)| t.clone())
        .collect()
}

/// Owns the global task list of a molecule and exposes this rank's share.
#[derive(Debug, Clone)]
pub struct LoadBalancer {
    group: ProcessGroup,
    mol: Arc<Molecule>,
    basis: Arc<BasisSet>,
    meta: Arc<MolMeta>,
    global: Vec<XcTask>,
    costs: Vec<f64>,
    owner: Vec<usize>,
    local: Vec<XcTask>,
}

impl LoadBalancer {
    /// Generates tasks with derived metadata and the stock strategies.
    pub fn new(group: ProcessGroup, mol: &Molecule, grid: &dyn GridSource, basis: &BasisSet) -> Result<Self> {
        LoadBalancerBuilder::new(group, mol, grid, basis).build()
    }

    /// Generates tasks reusing precomputed metadata.
    pub fn with_meta(
        group: ProcessGroup,
        mol: &Molecule,
        grid: &dyn GridSource,
        basis: &BasisSet,
        meta: impl Into<Arc<MolMeta>>,
    ) -> Result<Self> {
        LoadBalancerBuilder::new(group, mol, grid, basis).meta(meta).build()
    }

    /// Partitions an existing global task list.
    pub fn from_tasks(
        group: ProcessGroup,
        mol: Arc<Molecule>,
        basis: Arc<BasisSet>,
        meta: Arc<MolMeta>,
        global: Vec<XcTask>,
        model: &dyn TaskCost,
    ) -> Result<Self> {
        if meta.natoms() != mol.natoms() {
            return Err(XcTaskError::MetaAtomCountMismatch {
                meta_atoms: meta.natoms(),
                natoms: mol.natoms(),
            });
        }
        for task in &global {
            task.validate(mol.natoms(), &basis)?;
        }

        let costs = task_costs(&global, model)?;
        let owner = lpt_schedule(&costs, group.size())?;
        let local = select(&global, &owner, group.rank());

        let loads = rank_loads(&costs, &owner, group.size());
        let max_load = loads.iter().cloned().fold(0.0, f64::max);
        let mean_load = loads.iter().sum::<f64>() / group.size() as f64;
        info!(
            "Rank {}/{}: {} of {} tasks, load {:.3e} (max {:.3e}, mean {:.3e})",
            group.rank(),
            group.size(),
            local.len(),
            global.len(),
            loads[group.rank()],
            max_load,
            mean_load
        );
        debug!("Per-rank loads: {:?}", loads);

        Ok(Self {
            group,
            mol,
            basis,
            meta,
            global,
            costs,
            owner,
            local,
        })
    }

    /// Tasks owned by this rank, in global order.
    pub fn get_tasks(&self) -> &[XcTask] {
        &self.local
    }

    pub fn into_tasks(self) -> Vec<XcTask> {
        self.local
    }

    pub fn global_tasks(&self) -> &[XcTask] {
        &self.global
    }

    pub fn molecule(&self) -> &Molecule {
        &self.mol
    }

    pub fn molmeta(&self) -> &MolMeta {
        &self.meta
    }

    pub fn basis(&self) -> &BasisSet {
        &self.basis
    }

    pub fn group(&self) -> ProcessGroup {
        self.group
    }

    /// Rank owning each global task.
    pub fn owners(&self) -> &[usize] {
        &self.owner
    }

    pub fn task_costs(&self) -> &[f64] {
        &self.costs
    }

    /// Cumulative estimated cost of every rank.
    pub fn rank_costs(&self) -> Vec<f64> {
        rank_loads(&self.costs, &self.owner, self.group.size())
    }

    /// Grid points over the whole molecule.
    pub fn total_npts(&self) -> usize {
        self.global.iter().map(XcTask::npts).sum()
    }

    pub fn max_npts(&self) -> usize {
        self.local.iter().map(XcTask::npts).max().unwrap_or(0)
    }

    pub fn max_nbe(&self) -> usize {
        self.local.iter().map(|t| t.nbe).max().unwrap_or(0)
    }

    pub fn max_npts_x_nbe(&self) -> usize {
        self.local.iter().map(|t| t.npts() * t.nbe).max().unwrap_or(0)
    }
}

/// Setup-time choices for a [`LoadBalancer`].
pub struct LoadBalancerBuilder<'a> {
    group: ProcessGroup,
    mol: &'a Molecule,
    grid: &'a dyn GridSource,
    basis: &'a BasisSet,
    meta: Option<Arc<MolMeta>>,
    cost: Box<dyn TaskCost>,
    screen: Box<dyn ShellScreen>,
}

impl<'a> LoadBalancerBuilder<'a> {
    pub fn new(group: ProcessGroup, mol: &'a Molecule, grid: &'a dyn GridSource, basis: &'a BasisSet) -> Self {
        Self {
            group,
            mol,
            grid,
            basis,
            meta: None,
            cost: Box::new(CostModel::default()),
            screen: Box::new(MinkowskiScreen),
        }
    }

    pub fn meta(mut self, meta: impl Into<Arc<MolMeta>>) -> Self {
        self.meta = Some(meta.into());
        self
    }

    pub fn cost_model(mut self, cost: impl TaskCost + 'static) -> Self {
        self.cost = Box::new(cost);
        self
    }

    pub fn screen(mut self, screen: impl ShellScreen + 'static) -> Self {
        self.screen = Box::new(screen);
        self
    }

    pub fn build(self) -> Result<LoadBalancer> {
        let generator = match self.meta {
            Some(meta) => TaskGenerator::with_meta(self.mol, self.basis, self.grid, meta)?,
            None => TaskGenerator::new(self.mol, self.basis, self.grid)?,
        };
        let meta = Arc::clone(generator.meta());
        let global = generator.with_boxed_screen(self.screen).generate()?;

        LoadBalancer::from_tasks(
            self.group,
            Arc::new(self.mol.clone()),
            Arc::new(self.basis.clone()),
            meta,
            global,
            self.cost.as_ref(),
        )
    }
}

/// Load balancer with the stock cost model and screening; `meta` is derived
/// when not supplied.
pub fn make_default_load_balancer(
    group: ProcessGroup,
    mol: &Molecule,
    grid: &dyn GridSource,
    basis: &BasisSet,
    meta: Option<Arc<MolMeta>>,
) -> Result<LoadBalancer> {
    let builder = LoadBalancerBuilder::new(group, mol, grid, basis);
    match meta {
        Some(meta) => builder.meta(meta).build(),
        None => builder.build(),
    }
}
