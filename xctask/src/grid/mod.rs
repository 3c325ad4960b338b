//! Atom-centered quadrature grids and their batching.
//!
//! The task generator only sees the [`GridSource`] trait: one ordered
//! `(point, weight)` sequence per atom plus a batching policy. [`MolGrid`] is
//! the stock implementation (Gauss–Legendre radial × product angular rule,
//! Becke partitioned).

mod becke;
mod quadrature;

use crate::error::{Result, XcTaskError};
use crate::molecule::Molecule;
use crate::molmeta::MolMeta;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BATCH_SIZE: usize = 512;
pub const DEFAULT_R_MAX: f64 = 12.0; // bohr

/// Quadrature points and weights of one atom, in generation order.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomGrid {
    points: Vec<Vector3<f64>>,
    weights: Vec<f64>,
}

impl AtomGrid {
    pub fn new(points: Vec<Vector3<f64>>, weights: Vec<f64>) -> Result<Self> {
        if points.len() != weights.len() {
            return Err(XcTaskError::PayloadLengthMismatch {
                points: points.len(),
                weights: weights.len(),
            });
        }
        Ok(Self { points, weights })
    }

    pub fn npts(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[Vector3<f64>] {
        &self.points
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Splits the grid into batches. Batch order and the point order inside
    /// each batch depend only on the point order of this grid.
    pub fn batches(&self, policy: BatchPolicy) -> Result<Vec<GridBatch>> {
        let max_points = policy.max_points();
        if max_points == 0 {
            return Err(XcTaskError::ZeroBatchSize);
        }

        let groups: Vec<Vec<usize>> = match policy {
            BatchPolicy::Chunked(_) => (0..self.npts())
                .collect::<Vec<_>>()
                .chunks(max_points)
                .map(|c| c.to_vec())
                .collect(),
            BatchPolicy::Spatial(_) => {
                let mut out = Vec::new();
                spatial_split((0..self.npts()).collect(), &self.points, max_points, &mut out);
                out
            }
        };

        Ok(groups
            .into_iter()
            .filter(|g| !g.is_empty())
            .map(|g| GridBatch {
                points: g.iter().map(|&i| self.points[i]).collect(),
                weights: g.iter().map(|&i| self.weights[i]).collect(),
            })
            .collect())
    }
}

/// A contiguous unit of grid work handed to the task generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GridBatch {
    pub points: Vec<Vector3<f64>>,
    pub weights: Vec<f64>,
}

/// Recursive bisection of the bounding box along its longest axis until a
/// box holds at most `max_points` points.
fn spatial_split(
    indices: Vec<usize>,
    points: &[Vector3<f64>],
    max_points: usize,
    out: &mut Vec<Vec<usize>>,
) {
    if indices.len() <= max_points {
        out.push(indices);
        return;
    }

    let mut lo = Vector3::repeat(f64::INFINITY);
    let mut hi = Vector3::repeat(f64::NEG_INFINITY);
    for &i in &indices {
        lo = lo.inf(&points[i]);
        hi = hi.sup(&points[i]);
    }
    let extent = hi - lo;
    let axis = extent.imax();
    let mid = 0.5 * (lo[axis] + hi[axis]);

    let (left, right): (Vec<usize>, Vec<usize>) =
        indices.iter().partition(|&&i| points[i][axis] < mid);

    if extent[axis] <= 0.0 || left.is_empty() || right.is_empty() {
        // coincident points, fall back to plain chunks
        out.extend(indices.chunks(max_points).map(|c| c.to_vec()));
        return;
    }

    spatial_split(left, points, max_points, out);
    spatial_split(right, points, max_points, out);
}

/// How an atomic grid is cut into batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "max_points")]
pub enum BatchPolicy {
    /// Consecutive runs of at most `n` points in grid order.
    Chunked(usize),
    /// Spatially compact boxes of at most `n` points.
    Spatial(usize),
}

impl BatchPolicy {
    pub fn max_points(self) -> usize {
        match self {
            BatchPolicy::Chunked(n) | BatchPolicy::Spatial(n) => n,
        }
    }
}

impl Default for BatchPolicy {
    fn default() -> Self {
        BatchPolicy::Spatial(DEFAULT_BATCH_SIZE)
    }
}

/// Preset grid densities as (radial, angular) point counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GridSize {
    Fine,
    #[default]
    UltraFine,
    SuperFine,
    Explicit { radial: usize, angular: usize },
}

impl GridSize {
    pub fn dims(self) -> (usize, usize) {
        match self {
            GridSize::Fine => (75, 302),
            GridSize::UltraFine => (99, 590),
            GridSize::SuperFine => (250, 974),
            GridSize::Explicit { radial, angular } => (radial, angular),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AtomGridSpec {
    pub radial_points: usize,
    pub angular_points: usize,
    pub r_max: f64,
}

impl AtomGridSpec {
    pub fn from_size(size: GridSize, r_max: f64) -> Self {
        let (radial_points, angular_points) = size.dims();
        Self {
            radial_points,
            angular_points,
            r_max,
        }
    }
}

/// Source of per-atom quadrature grids.
///
/// Implementations must be deterministic: the same molecule and atom always
/// produce the same points in the same order.
pub trait GridSource: Sync {
    /// Number of atoms this grid describes.
    fn natoms(&self) -> usize;

    fn atom_grid(&self, mol: &Molecule, meta: &MolMeta, atom: usize) -> Result<AtomGrid>;

    fn batch_policy(&self) -> BatchPolicy;
}

/// Molecular grid: one [`AtomGridSpec`] per atom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MolGrid {
    specs: Vec<AtomGridSpec>,
    policy: BatchPolicy,
}

impl MolGrid {
    /// Same preset on every atom of `mol`.
    pub fn new(size: GridSize, mol: &Molecule) -> Self {
        let spec = AtomGridSpec::from_size(size, DEFAULT_R_MAX);
        Self::from_specs(vec![spec; mol.natoms()])
    }

    pub fn from_specs(specs: Vec<AtomGridSpec>) -> Self {
        Self {
            specs,
            policy: BatchPolicy::default(),
        }
    }

    pub fn with_batch_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_r_max(mut self, r_max: f64) -> Self {
        for spec in self.specs.iter_mut() {
            spec.r_max = r_max;
        }
        self
    }

    pub fn specs(&self) -> &[AtomGridSpec] {
        &self.specs
    }
}

impl GridSource for MolGrid {
    fn natoms(&self) -> usize {
        self.specs.len()
    }

    fn atom_grid(&self, mol: &Molecule, meta: &MolMeta, atom: usize) -> Result<AtomGrid> {
        let spec = self.specs.get(atom).ok_or_else(|| XcTaskError::AtomOutOfRange {
            what: "grid".to_string(),
            atom,
            natoms: self.specs.len(),
        })?;
        if atom >= mol.natoms() {
            return Err(XcTaskError::AtomOutOfRange {
                what: "grid".to_string(),
                atom,
                natoms: mol.natoms(),
            });
        }

        let coords: Vec<Vector3<f64>> = mol.iter().map(|a| a.coords).collect();
        let center = coords[atom];
        let (r_nodes, r_weights) = quadrature::gauss_legendre(spec.radial_points, 0.0, spec.r_max);
        let ang = quadrature::angular_rule(spec.angular_points);

        let mut points = Vec::with_capacity(r_nodes.len() * ang.len());
        let mut weights = Vec::with_capacity(r_nodes.len() * ang.len());
        for (&r, &wr) in r_nodes.iter().zip(&r_weights) {
            let wr = wr * r * r; // Jacobian r^2
            for &(dir, wang) in &ang {
                let p = center + dir * r;
                let w = wr * wang * becke::becke_weight(atom, &p, &coords, meta);
                if w.is_finite() && w > 0.0 {
                    points.push(p);
                    weights.push(w);
                }
            }
        }

        AtomGrid::new(points, weights)
    }

    fn batch_policy(&self) -> BatchPolicy {
        self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::molecule::Atom;
    use std::f64::consts::PI;

    fn line_grid(n: usize) -> AtomGrid {
        let points = (0..n).map(|i| Vector3::new(i as f64, 0.0, 0.0)).collect();
        AtomGrid::new(points, vec![1.0; n]).unwrap()
    }

    #[test]
    fn test_mismatched_payload_rejected() {
        let err = AtomGrid::new(vec![Vector3::zeros(); 3], vec![1.0; 2]).unwrap_err();
        assert!(matches!(
            err,
            XcTaskError::PayloadLengthMismatch { points: 3, weights: 2 }
        ));
    }

    #[test]
    fn test_chunked_batches() {
        let grid = line_grid(10);
        let batches = grid.batches(BatchPolicy::Chunked(4)).unwrap();
        let sizes: Vec<usize> = batches.iter().map(|b| b.points.len()).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(batches[1].points[0].x, 4.0);
    }

    #[test]
    fn test_spatial_batches_cover_every_point_once() {
        let grid = line_grid(37);
        let batches = grid.batches(BatchPolicy::Spatial(5)).unwrap();
        assert!(batches.iter().all(|b| b.points.len() <= 5 && !b.points.is_empty()));
        let mut xs: Vec<f64> = batches.iter().flat_map(|b| b.points.iter().map(|p| p.x)).collect();
        assert_eq!(xs.len(), 37);
        xs.sort_by(f64::total_cmp);
        xs.dedup();
        assert_eq!(xs.len(), 37);
    }

    #[test]
    fn test_spatial_batches_coincident_points() {
        let grid = AtomGrid::new(vec![Vector3::zeros(); 9], vec![1.0; 9]).unwrap();
        let batches = grid.batches(BatchPolicy::Spatial(4)).unwrap();
        let sizes: Vec<usize> = batches.iter().map(|b| b.points.len()).collect();
        assert_eq!(sizes, vec![4, 4, 1]);
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let grid = line_grid(3);
        assert!(matches!(
            grid.batches(BatchPolicy::Chunked(0)),
            Err(XcTaskError::ZeroBatchSize)
        ));
    }

    #[test]
    fn test_single_atom_grid_integrates_gaussian() {
        // ∫ exp(-r^2) d^3r = π^(3/2)
        let mol = Molecule::new(vec![Atom::new(1, Vector3::zeros())]);
        let meta = MolMeta::new(&mol).unwrap();
        let grid = MolGrid::new(GridSize::Explicit { radial: 40, angular: 6 }, &mol);
        let ag = grid.atom_grid(&mol, &meta, 0).unwrap();
        let integral: f64 = ag
            .points()
            .iter()
            .zip(ag.weights())
            .map(|(p, w)| w * (-p.norm_squared()).exp())
            .sum();
        assert!((integral - PI.powf(1.5)).abs() < 1e-6);
    }

    #[test]
    fn test_becke_partition_recovers_total() {
        let mol = Molecule::new(vec![
            Atom::new(1, Vector3::new(0.0, 0.0, -0.7)),
            Atom::new(1, Vector3::new(0.0, 0.0, 0.7)),
        ]);
        let meta = MolMeta::new(&mol).unwrap();
        let grid = MolGrid::new(GridSize::Explicit { radial: 60, angular: 302 }, &mol);
        let f = |p: &Vector3<f64>| {
            (-(p - mol.atom(0).coords).norm_squared()).exp()
                + (-(p - mol.atom(1).coords).norm_squared()).exp()
        };
        let integral: f64 = (0..2)
            .map(|a| {
                let ag = grid.atom_grid(&mol, &meta, a).unwrap();
                ag.points().iter().zip(ag.weights()).map(|(p, w)| w * f(p)).sum::<f64>()
            })
            .sum();
        assert!((integral - 2.0 * PI.powf(1.5)).abs() < 1e-2);
    }

    #[test]
    fn test_atom_out_of_range() {
        let mol = Molecule::new(vec![Atom::new(1, Vector3::zeros())]);
        let meta = MolMeta::new(&mol).unwrap();
        let grid = MolGrid::new(GridSize::Fine, &mol);
        assert!(matches!(
            grid.atom_grid(&mol, &meta, 1),
            Err(XcTaskError::AtomOutOfRange { atom: 1, .. })
        ));
    }

    #[test]
    fn test_grid_is_deterministic() {
        let mol = crate::molecule::make_benzene();
        let meta = MolMeta::new(&mol).unwrap();
        let grid = MolGrid::new(GridSize::Explicit { radial: 8, angular: 26 }, &mol);
        let a = grid.atom_grid(&mol, &meta, 3).unwrap();
        let b = grid.atom_grid(&mol, &meta, 3).unwrap();
        assert_eq!(a, b);
    }
}
