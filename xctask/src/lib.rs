//! Screened quadrature tasks for exchange-correlation integration and their
//! distribution over cooperating ranks.
//!
//! The molecular grid is cut into batches; each batch becomes an [`XcTask`]
//! listing the basis shells that can be non-negligible on it. The
//! [`LoadBalancer`] assigns tasks to ranks with a deterministic greedy LPT
//! schedule so that every rank computes the same partition independently.

pub mod archive;
pub mod balancer;
pub mod cost;
pub mod error;
pub mod generator;
pub mod grid;
pub mod molecule;
pub mod molmeta;
pub mod screening;
pub mod task;

pub use archive::{Payload, ReferenceData, ReferenceMismatch};
pub use balancer::{
    lpt_schedule, make_default_load_balancer, partition, partition_all, LoadBalancer,
    LoadBalancerBuilder, ProcessGroup,
};
pub use cost::{CostModel, TaskCost};
pub use error::{Result, XcTaskError};
pub use generator::{generate_tasks, TaskGenerator};
pub use grid::{AtomGrid, BatchPolicy, GridSize, GridSource, MolGrid};
pub use molecule::{Atom, Molecule};
pub use molmeta::MolMeta;
pub use screening::{BatchBounds, MinkowskiScreen, NoScreening, ShellScreen};
pub use task::XcTask;
