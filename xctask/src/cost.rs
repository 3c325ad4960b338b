//! Cost estimates used to balance tasks across ranks.

use crate::task::XcTask;
use serde::{Deserialize, Serialize};

/// Estimated work for one task. Must be finite, non-negative, and depend on
/// the task alone.
pub trait TaskCost: Send + Sync {
    fn cost(&self, task: &XcTask) -> f64;
}

/// Stock cost models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CostModel {
    /// `nbe^2 * npts`: collocation and contraction dominate.
    #[default]
    NbeSquaredPoints,
    /// `nbe * npts`.
    NbePoints,
    /// `npts`, ignores screening.
    Points,
}

impl TaskCost for CostModel {
    fn cost(&self, task: &XcTask) -> f64 {
        let nbe = task.nbe as f64;
        let npts = task.npts() as f64;
        match self {
            CostModel::NbeSquaredPoints => nbe * nbe * npts,
            CostModel::NbePoints => nbe * npts,
            CostModel::Points => npts,
        }
    }
}

impl<F> TaskCost for F
where
    F: Fn(&XcTask) -> f64 + Send + Sync,
{
    fn cost(&self, task: &XcTask) -> f64 {
        self(task)
    }
}
