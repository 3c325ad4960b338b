//! Binary task archives and regression references.
//!
//! Archives are pickle streams of a task list. Dropping the payload keeps
//! `parent_atom`, `shell_list`, `nbe` and `dist_nearest`, which is enough to
//! audit screening and partitioning without storing the grid.

use crate::error::{Result, XcTaskError};
use crate::molmeta::MolMeta;
use crate::task::XcTask;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Relative tolerance used when comparing distances against a reference.
pub const DEFAULT_REFERENCE_RTOL: f64 = 1e-12;

/// Whether grid points and weights are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Payload {
    #[default]
    Keep,
    Omit,
}

pub fn to_bytes(tasks: &[XcTask], payload: Payload) -> Result<Vec<u8>> {
    let options = serde_pickle::SerOptions::new();
    match payload {
        Payload::Keep => Ok(serde_pickle::to_vec(&tasks, options)?),
        Payload::Omit => {
            let light: Vec<XcTask> = tasks.iter().map(XcTask::without_payload).collect();
            Ok(serde_pickle::to_vec(&light, options)?)
        }
    }
}

/// Decodes a task list, rejecting tasks with mismatched payload lengths or
/// unsorted shell lists.
pub fn from_bytes(bytes: &[u8]) -> Result<Vec<XcTask>> {
    let options = serde_pickle::DeOptions::new();
    let tasks: Vec<XcTask> = serde_pickle::from_slice(bytes, options)?;
    for task in &tasks {
        task.check_shape()?;
    }
    Ok(tasks)
}

pub fn save_tasks<P: AsRef<Path>>(path: P, tasks: &[XcTask], payload: Payload) -> Result<()> {
    write_file(path.as_ref(), &to_bytes(tasks, payload)?)
}

pub fn load_tasks<P: AsRef<Path>>(path: P) -> Result<Vec<XcTask>> {
    from_bytes(&read_file(path.as_ref())?)
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let io_err = |source| XcTaskError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::create(path).map_err(io_err)?;
    file.write_all(bytes).map_err(io_err)
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let io_err = |source| XcTaskError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut file = File::open(path).map_err(io_err)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer).map_err(io_err)?;
    Ok(buffer)
}

/// First difference found between a fresh result and a stored reference.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReferenceMismatch {
    #[error("molecular metadata differs: {0}")]
    Meta(String),

    #[error("task count differs: reference has {expected}, found {found}")]
    TaskCount { expected: usize, found: usize },

    #[error("task {task}: {field} differs, reference {expected}, found {found}")]
    TaskField {
        task: usize,
        field: &'static str,
        expected: String,
        found: String,
    },
}

/// Payload-free snapshot of a global task list and the metadata it was
/// generated with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub meta: MolMeta,
    pub tasks: Vec<XcTask>,
}

impl ReferenceData {
    pub fn new(meta: &MolMeta, tasks: &[XcTask]) -> Self {
        Self {
            meta: meta.clone(),
            tasks: tasks.iter().map(XcTask::without_payload).collect(),
        }
    }

    pub fn to_pickle(&self) -> Result<Vec<u8>> {
        let options = serde_pickle::SerOptions::new();
        Ok(serde_pickle::to_vec(self, options)?)
    }

    pub fn from_pickle(bytes: &[u8]) -> Result<Self> {
        let options = serde_pickle::DeOptions::new();
        let reference: Self = serde_pickle::from_slice(bytes, options)?;
        for task in &reference.tasks {
            task.check_shape()?;
        }
        Ok(reference)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        write_file(path, &self.to_pickle()?)?;
        info!("Wrote reference of {} tasks to {}", self.tasks.len(), path.display());
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_pickle(&read_file(path.as_ref())?)
    }

    /// Compares `meta` and `tasks` against this reference. Indices, shell
    /// lists and `nbe` must match exactly; distances within `rtol`.
    pub fn check(&self, meta: &MolMeta, tasks: &[XcTask], rtol: f64) -> Option<ReferenceMismatch> {
        if let Some(m) = compare_meta(&self.meta, meta, rtol) {
            return Some(m);
        }
        if self.tasks.len() != tasks.len() {
            return Some(ReferenceMismatch::TaskCount {
                expected: self.tasks.len(),
                found: tasks.len(),
            });
        }
        self.tasks
            .iter()
            .zip(tasks)
            .enumerate()
            .find_map(|(i, (r, t))| compare_task(i, r, t, rtol))
    }
}

fn close(a: f64, b: f64, rtol: f64) -> bool {
    if a.is_infinite() || b.is_infinite() {
        a == b
    } else {
        (a - b).abs() <= rtol * a.abs().max(b.abs())
    }
}

fn compare_meta(reference: &MolMeta, found: &MolMeta, rtol: f64) -> Option<ReferenceMismatch> {
    if reference.natoms() != found.natoms() {
        return Some(ReferenceMismatch::Meta(format!(
            "reference has {} atoms, found {}",
            reference.natoms(),
            found.natoms()
        )));
    }
    let rab = reference.rab().iter().zip(found.rab());
    if let Some((i, (a, b))) = rab.enumerate().find(|(_, (a, b))| !close(**a, **b, rtol)) {
        return Some(ReferenceMismatch::Meta(format!("rab[{}] is {} vs {}", i, a, b)));
    }
    let nearest = reference.dist_nearest().iter().zip(found.dist_nearest());
    if let Some((i, (a, b))) = nearest.enumerate().find(|(_, (a, b))| !close(**a, **b, rtol)) {
        return Some(ReferenceMismatch::Meta(format!("dist_nearest[{}] is {} vs {}", i, a, b)));
    }
    None
}

fn compare_task(idx: usize, reference: &XcTask, found: &XcTask, rtol: f64) -> Option<ReferenceMismatch> {
    let mismatch = |field, expected: String, found: String| ReferenceMismatch::TaskField {
        task: idx,
        field,
        expected,
        found,
    };
    if reference.parent_atom != found.parent_atom {
        return Some(mismatch(
            "parent_atom",
            reference.parent_atom.to_string(),
            found.parent_atom.to_string(),
        ));
    }
    if reference.shell_list != found.shell_list {
        return Some(mismatch(
            "shell_list",
            format!("{:?}", reference.shell_list),
            format!("{:?}", found.shell_list),
        ));
    }
    if reference.nbe != found.nbe {
        return Some(mismatch("nbe", reference.nbe.to_string(), found.nbe.to_string()));
    }
    if !close(reference.dist_nearest, found.dist_nearest, rtol) {
        return Some(mismatch(
            "dist_nearest",
            reference.dist_nearest.to_string(),
            found.dist_nearest.to_string(),
        ));
    }
    None
}
