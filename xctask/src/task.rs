use crate::cost::TaskCost;
use crate::error::{Result, XcTaskError};
use basis::BasisSet;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// One batch of quadrature points of one atom and the shells that matter
/// for it.
///
/// Atom and shell references are indices into the [`crate::Molecule`] and
/// [`BasisSet`] the task was generated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct XcTask {
    pub parent_atom: usize,
    #[serde(default)]
    pub points: Vec<Vector3<f64>>,
    #[serde(default)]
    pub weights: Vec<f64>,
    /// Strictly increasing shell indices.
    pub shell_list: Vec<usize>,
    /// Basis functions carried by `shell_list`.
    pub nbe: usize,
    pub dist_nearest: f64,
}

impl XcTask {
    pub fn npts(&self) -> usize {
        self.points.len()
    }

    /// Estimated work of this task under `model`.
    pub fn cost(&self, model: &dyn TaskCost) -> f64 {
        model.cost(self)
    }

    pub fn has_payload(&self) -> bool {
        !self.points.is_empty() || !self.weights.is_empty()
    }

    /// Drops `points` and `weights`, keeping the metadata needed to audit
    /// screening and partitioning.
    pub fn strip_payload(&mut self) {
        self.points = Vec::new();
        self.weights = Vec::new();
    }

    pub fn without_payload(&self) -> Self {
        Self {
            parent_atom: self.parent_atom,
            points: Vec::new(),
            weights: Vec::new(),
            shell_list: self.shell_list.clone(),
            nbe: self.nbe,
            dist_nearest: self.dist_nearest,
        }
    }

    /// Checks that need neither the molecule nor the basis: matching
    /// payload lengths and a strictly increasing shell list.
    pub fn check_shape(&self) -> Result<()> {
        if self.points.len() != self.weights.len() {
            return Err(XcTaskError::PayloadLengthMismatch {
                points: self.points.len(),
                weights: self.weights.len(),
            });
        }
        if self.shell_list.windows(2).any(|w| w[0] >= w[1]) {
            return Err(XcTaskError::UnsortedShellList);
        }
        Ok(())
    }

    /// Checks the task against the molecule size and basis it refers to.
    pub fn validate(&self, natoms: usize, basis: &BasisSet) -> Result<()> {
        if self.parent_atom >= natoms {
            return Err(XcTaskError::AtomOutOfRange {
                what: "task".to_string(),
                atom: self.parent_atom,
                natoms,
            });
        }
        self.check_shape()?;
        if let Some(&shell) = self.shell_list.iter().find(|&&s| s >= basis.nshells()) {
            return Err(XcTaskError::ShellOutOfRange {
                shell,
                nshells: basis.nshells(),
            });
        }
        let expected: usize = self
            .shell_list
            .iter()
            .map(|&s| basis.shell_nfunctions(s))
            .sum();
        if expected != self.nbe {
            return Err(XcTaskError::NbeMismatch {
                found: self.nbe,
                expected,
            });
        }
        Ok(())
    }
}
