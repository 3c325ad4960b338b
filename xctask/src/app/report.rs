use tracing::info;
use xctask::{LoadBalancer, TaskCost, XcTask};

pub fn report_partition(lb: &LoadBalancer) {
    let group = lb.group();
    let global = lb.global_tasks();
    let local = lb.get_tasks();

    info!("Task generation finished.");
    info!("  Atoms:            {}", lb.molecule().natoms());
    info!("  Shells:           {}", lb.basis().nshells());
    info!("  Basis functions:  {}", lb.basis().nbf());
    info!("  Global tasks:     {}", global.len());
    info!("  Total points:     {}", lb.total_npts());

    info!("Rank {} of {}:", group.rank(), group.size());
    info!("  Local tasks:      {}", local.len());
    info!("  Max npts:         {}", lb.max_npts());
    info!("  Max nbe:          {}", lb.max_nbe());
    info!("  Max npts x nbe:   {}", lb.max_npts_x_nbe());

    let costs = lb.rank_costs();
    report_loads(&costs);
}

/// Per-rank cost table for a partition computed for the whole group.
pub fn report_all_ranks(shares: &[Vec<XcTask>], model: &dyn TaskCost) {
    info!("Partition of all {} ranks:", shares.len());
    let mut loads = Vec::with_capacity(shares.len());
    for (rank, share) in shares.iter().enumerate() {
        let load: f64 = share.iter().map(|t| t.cost(model)).sum();
        let npts: usize = share.iter().map(XcTask::npts).sum();
        info!(
            "  Rank {:>4}: {:>6} tasks {:>10} points  cost {:.4e}",
            rank,
            share.len(),
            npts,
            load
        );
        loads.push(load);
    }
    report_loads(&loads);
}

fn report_loads(loads: &[f64]) {
    let max = loads.iter().cloned().fold(0.0, f64::max);
    let mean = loads.iter().sum::<f64>() / loads.len().max(1) as f64;
    if mean > 0.0 {
        info!("  Load imbalance (max / mean): {:.4}", max / mean);
    }
}
