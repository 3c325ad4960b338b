//! Distance metadata derived once from a molecular geometry.

use crate::error::{Result, XcTaskError};
use crate::molecule::Molecule;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Pairwise and nearest-neighbor distances of a molecule.
///
/// Holds values only, so it can be cached and reused for every task
/// regeneration on the same geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredMolMeta")]
pub struct MolMeta {
    natoms: usize,
    /// Row-major `natoms x natoms`, symmetric, zero diagonal.
    rab: Vec<f64>,
    /// `f64::INFINITY` for an atom without neighbors.
    dist_nearest: Vec<f64>,
}

impl MolMeta {
    pub fn new(mol: &Molecule) -> Result<Self> {
        if mol.is_empty() {
            return Err(XcTaskError::EmptyMolecule);
        }
        let natoms = mol.natoms();
        let rab = compute_rab(mol);
        let dist_nearest = compute_dist_nearest(natoms, &rab);
        Ok(Self {
            natoms,
            rab,
            dist_nearest,
        })
    }

    pub fn natoms(&self) -> usize {
        self.natoms
    }

    pub fn rab(&self) -> &[f64] {
        &self.rab
    }

    /// Distance between atoms `i` and `j`.
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.rab[i * self.natoms + j]
    }

    pub fn dist_nearest(&self) -> &[f64] {
        &self.dist_nearest
    }

    /// Whether atom `i` has any neighbor to screen against.
    pub fn has_neighbor(&self, i: usize) -> bool {
        self.dist_nearest[i].is_finite()
    }
}

/// Wire form of [`MolMeta`], checked before it becomes one.
#[derive(Deserialize)]
struct StoredMolMeta {
    natoms: usize,
    rab: Vec<f64>,
    dist_nearest: Vec<f64>,
}

impl TryFrom<StoredMolMeta> for MolMeta {
    type Error = XcTaskError;

    fn try_from(stored: StoredMolMeta) -> Result<Self> {
        let StoredMolMeta {
            natoms,
            rab,
            dist_nearest,
        } = stored;
        if natoms == 0 {
            return Err(XcTaskError::EmptyMolecule);
        }
        if natoms.checked_mul(natoms) != Some(rab.len()) || dist_nearest.len() != natoms {
            return Err(XcTaskError::MalformedMeta {
                natoms,
                rab: rab.len(),
                nearest: dist_nearest.len(),
            });
        }
        Ok(Self {
            natoms,
            rab,
            dist_nearest,
        })
    }
}

// Each unordered pair is evaluated once (rows in parallel over the upper
// triangle) and mirrored.
fn compute_rab(mol: &Molecule) -> Vec<f64> {
    let n = mol.natoms();
    let atoms = mol.atoms();

    let upper: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            ((i + 1)..n)
                .map(|j| (atoms[i].coords - atoms[j].coords).norm())
                .collect()
        })
        .collect();

    let mut rab = vec![0.0_f64; n * n];
    for (i, row) in upper.iter().enumerate() {
        for (k, &d) in row.iter().enumerate() {
            let j = i + 1 + k;
            rab[i * n + j] = d;
            rab[j * n + i] = d;
        }
    }
    rab
}

fn compute_dist_nearest(n: usize, rab: &[f64]) -> Vec<f64> {
    (0..n)
        .map(|i| {
            rab[i * n..(i + 1) * n]
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, &d)| d)
                .fold(f64::INFINITY, f64::min)
        })
        .collect()
}
