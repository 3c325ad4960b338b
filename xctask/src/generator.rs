//! Turns a molecule, basis and grid into the global, screened task list.

use crate::error::{Result, XcTaskError};
use crate::grid::{GridBatch, GridSource};
use crate::molecule::Molecule;
use crate::molmeta::MolMeta;
use crate::screening::{BatchBounds, MinkowskiScreen, ShellScreen};
use crate::task::XcTask;
use basis::BasisSet;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds [`XcTask`]s atom by atom.
///
/// Atoms are processed in parallel; the output is always atom-major,
/// batch-minor, with shell lists in basis order.
pub struct TaskGenerator<'a> {
    mol: &'a Molecule,
    basis: &'a BasisSet,
    grid: &'a dyn GridSource,
    meta: Arc<MolMeta>,
    screen: Box<dyn ShellScreen>,
}

impl<'a> TaskGenerator<'a> {
    /// Derives the molecular metadata from `mol`.
    pub fn new(mol: &'a Molecule, basis: &'a BasisSet, grid: &'a dyn GridSource) -> Result<Self> {
        let meta = MolMeta::new(mol)?;
        Self::with_meta(mol, basis, grid, meta)
    }

    /// Reuses metadata computed earlier for the same geometry.
    pub fn with_meta(
        mol: &'a Molecule,
        basis: &'a BasisSet,
        grid: &'a dyn GridSource,
        meta: impl Into<Arc<MolMeta>>,
    ) -> Result<Self> {
        let meta = meta.into();
        if mol.is_empty() {
            return Err(XcTaskError::EmptyMolecule);
        }
        if meta.natoms() != mol.natoms() {
            return Err(XcTaskError::MetaAtomCountMismatch {
                meta_atoms: meta.natoms(),
                natoms: mol.natoms(),
            });
        }
        Ok(Self {
            mol,
            basis,
            grid,
            meta,
            screen: Box::new(MinkowskiScreen),
        })
    }

    pub fn with_screen(self, screen: impl ShellScreen + 'static) -> Self {
        self.with_boxed_screen(Box::new(screen))
    }

    pub fn with_boxed_screen(mut self, screen: Box<dyn ShellScreen>) -> Self {
        self.screen = screen;
        self
    }

    pub fn meta(&self) -> &Arc<MolMeta> {
        &self.meta
    }

    fn validate_inputs(&self) -> Result<()> {
        let natoms = self.mol.natoms();
        if self.grid.natoms() != natoms {
            return Err(XcTaskError::GridAtomCountMismatch {
                grid_atoms: self.grid.natoms(),
                natoms,
            });
        }
        if let Some((idx, shell)) = self
            .basis
            .iter()
            .enumerate()
            .find(|(_, s)| s.atom() >= natoms)
        {
            return Err(XcTaskError::AtomOutOfRange {
                what: format!("shell {}", idx),
                atom: shell.atom(),
                natoms,
            });
        }
        if self.grid.batch_policy().max_points() == 0 {
            return Err(XcTaskError::ZeroBatchSize);
        }
        Ok(())
    }

    /// Produces the global task list.
    pub fn generate(&self) -> Result<Vec<XcTask>> {
        self.validate_inputs()?;

        let per_atom: Vec<Vec<XcTask>> = (0..self.mol.natoms())
            .into_par_iter()
            .map(|atom| self.atom_tasks(atom))
            .collect::<Result<_>>()?;

        let tasks: Vec<XcTask> = per_atom.into_iter().flatten().collect();
        info!(
            "Generated {} tasks over {} atoms ({} shells, {} points)",
            tasks.len(),
            self.mol.natoms(),
            self.basis.nshells(),
            tasks.iter().map(XcTask::npts).sum::<usize>()
        );
        Ok(tasks)
    }

    fn atom_tasks(&self, atom: usize) -> Result<Vec<XcTask>> {
        let grid = self.grid.atom_grid(self.mol, &self.meta, atom)?;
        let batches = grid.batches(self.grid.batch_policy())?;
        let dist_nearest = self.meta.dist_nearest()[atom];

        // no neighbor to measure against: keep every shell
        let screening = self.meta.has_neighbor(atom);
        if !screening {
            debug!("Atom {} has no neighbors, shell screening disabled", atom);
        }

        let tasks: Vec<XcTask> = batches
            .into_iter()
            .map(|batch| self.batch_task(atom, batch, dist_nearest, screening))
            .collect();

        debug!(
            "Atom {}: {} points in {} batches",
            atom,
            grid.npts(),
            tasks.len()
        );
        Ok(tasks)
    }

    fn batch_task(&self, atom: usize, batch: GridBatch, dist_nearest: f64, screening: bool) -> XcTask {
        let bounds = BatchBounds::from_points(&batch.points);
        let shell_list: Vec<usize> = self
            .basis
            .iter()
            .enumerate()
            .filter(|(_, shell)| !screening || self.screen.is_significant(shell, &bounds))
            .map(|(idx, _)| idx)
            .collect();
        let nbe = shell_list
            .iter()
            .map(|&s| self.basis.shell_nfunctions(s))
            .sum();

        XcTask {
            parent_atom: atom,
            points: batch.points,
            weights: batch.weights,
            shell_list,
            nbe,
            dist_nearest,
        }
    }
}

/// Global task list for `mol`; `meta` is derived when not supplied.
pub fn generate_tasks(
    mol: &Molecule,
    basis: &BasisSet,
    grid: &dyn GridSource,
    meta: Option<&MolMeta>,
) -> Result<Vec<XcTask>> {
    let generator = match meta {
        Some(meta) => TaskGenerator::with_meta(mol, basis, grid, meta.clone())?,
        None => TaskGenerator::new(mol, basis, grid)?,
    };
    generator.generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{AtomGrid, BatchPolicy, GridSize, MolGrid};
    use crate::molecule::Atom;
    use basis::{Harmonics, Primitive, Shell};
    use nalgebra::Vector3;

    /// One point with unit weight on every nucleus.
    struct NucleusGrid {
        natoms: usize,
    }

    impl GridSource for NucleusGrid {
        fn natoms(&self) -> usize {
            self.natoms
        }

        fn atom_grid(&self, mol: &Molecule, _meta: &MolMeta, atom: usize) -> Result<AtomGrid> {
            AtomGrid::new(vec![mol.atom(atom).coords], vec![1.0])
        }

        fn batch_policy(&self) -> BatchPolicy {
            BatchPolicy::Chunked(1)
        }
    }

    fn dimer(separation: f64) -> Molecule {
        Molecule::new(vec![
            Atom::new(1, Vector3::zeros()),
            Atom::new(1, Vector3::new(separation, 0.0, 0.0)),
        ])
    }

    fn one_shell_per_atom(mol: &Molecule, cutoff: f64) -> BasisSet {
        let shells = mol
            .iter()
            .enumerate()
            .map(|(i, a)| {
                Shell::new(i, a.coords, 0, vec![Primitive::new(1.0, 1.0)]).with_cutoff_radius(cutoff)
            })
            .collect();
        BasisSet::new(shells, Harmonics::Spherical)
    }

    #[test]
    fn test_short_cutoff_keeps_own_shell_only() {
        let mol = dimer(3.0);
        let basis = one_shell_per_atom(&mol, 1.0);
        let grid = NucleusGrid { natoms: 2 };
        let tasks = generate_tasks(&mol, &basis, &grid, None).unwrap();
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].shell_list, vec![0]);
        assert_eq!(tasks[1].shell_list, vec![1]);
        assert_eq!(tasks[0].nbe, 1);
        assert_eq!(tasks[0].dist_nearest, 3.0);
    }

    #[test]
    fn test_long_cutoff_keeps_both_shells() {
        let mol = dimer(3.0);
        let basis = one_shell_per_atom(&mol, 4.0);
        let grid = NucleusGrid { natoms: 2 };
        let tasks = generate_tasks(&mol, &basis, &grid, None).unwrap();
        assert_eq!(tasks[0].shell_list, vec![0, 1]);
        assert_eq!(tasks[1].shell_list, vec![0, 1]);
        assert_eq!(tasks[1].nbe, 2);
    }

    #[test]
    fn test_cutoff_equal_to_distance_is_included() {
        let mol = dimer(3.0);
        let basis = one_shell_per_atom(&mol, 3.0);
        let grid = NucleusGrid { natoms: 2 };
        let tasks = generate_tasks(&mol, &basis, &grid, None).unwrap();
        assert_eq!(tasks[0].shell_list, vec![0, 1]);
    }

    #[test]
    fn test_single_atom_disables_screening() {
        let mol = Molecule::new(vec![Atom::new(1, Vector3::zeros())]);
        // a far-away shell that the Minkowski test alone would reject
        let shells = vec![
            Shell::new(0, Vector3::zeros(), 0, vec![Primitive::new(1.0, 1.0)]).with_cutoff_radius(0.1),
            Shell::new(0, Vector3::new(50.0, 0.0, 0.0), 1, vec![Primitive::new(1.0, 1.0)])
                .with_cutoff_radius(0.1),
        ];
        let basis = BasisSet::new(shells, Harmonics::Cartesian);
        let grid = NucleusGrid { natoms: 1 };
        let tasks = generate_tasks(&mol, &basis, &grid, None).unwrap();
        assert_eq!(tasks[0].shell_list, vec![0, 1]);
        assert_eq!(tasks[0].nbe, 4);
        assert_eq!(tasks[0].dist_nearest, f64::INFINITY);
    }

    #[test]
    fn test_explicit_meta_matches_implicit() {
        let mol = dimer(2.5);
        let basis = one_shell_per_atom(&mol, 2.0);
        let grid = MolGrid::new(GridSize::Explicit { radial: 6, angular: 26 }, &mol)
            .with_batch_policy(BatchPolicy::Spatial(16));
        let meta = MolMeta::new(&mol).unwrap();

        let implicit = generate_tasks(&mol, &basis, &grid, None).unwrap();
        let explicit = generate_tasks(&mol, &basis, &grid, Some(&meta)).unwrap();
        let shared = TaskGenerator::with_meta(&mol, &basis, &grid, Arc::new(meta))
            .unwrap()
            .generate()
            .unwrap();
        assert_eq!(implicit, explicit);
        assert_eq!(implicit, shared);
    }

    #[test]
    fn test_task_order_is_atom_major() {
        let mol = dimer(2.5);
        let basis = one_shell_per_atom(&mol, 2.0);
        let grid = MolGrid::new(GridSize::Explicit { radial: 6, angular: 26 }, &mol)
            .with_batch_policy(BatchPolicy::Chunked(10));
        let tasks = generate_tasks(&mol, &basis, &grid, None).unwrap();
        let parents: Vec<usize> = tasks.iter().map(|t| t.parent_atom).collect();
        let mut sorted = parents.clone();
        sorted.sort();
        assert_eq!(parents, sorted);
        assert!(tasks.iter().all(|t| t.validate(2, &basis).is_ok()));
    }

    #[test]
    fn test_grid_atom_count_mismatch() {
        let mol = dimer(3.0);
        let basis = one_shell_per_atom(&mol, 1.0);
        let grid = NucleusGrid { natoms: 3 };
        assert!(matches!(
            generate_tasks(&mol, &basis, &grid, None),
            Err(XcTaskError::GridAtomCountMismatch { grid_atoms: 3, natoms: 2 })
        ));
    }

    #[test]
    fn test_shell_on_missing_atom() {
        let mol = dimer(3.0);
        let shells = vec![Shell::new(2, Vector3::zeros(), 0, vec![Primitive::new(1.0, 1.0)])];
        let basis = BasisSet::new(shells, Harmonics::Spherical);
        let grid = NucleusGrid { natoms: 2 };
        assert!(matches!(
            generate_tasks(&mol, &basis, &grid, None),
            Err(XcTaskError::AtomOutOfRange { atom: 2, natoms: 2, .. })
        ));
    }

    #[test]
    fn test_meta_from_other_geometry_rejected() {
        let mol = dimer(3.0);
        let other = Molecule::new(vec![Atom::new(1, Vector3::zeros())]);
        let meta = MolMeta::new(&other).unwrap();
        let basis = one_shell_per_atom(&mol, 1.0);
        let grid = NucleusGrid { natoms: 2 };
        assert!(matches!(
            generate_tasks(&mol, &basis, &grid, Some(&meta)),
            Err(XcTaskError::MetaAtomCountMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_molecule_rejected() {
        let mol = Molecule::default();
        let basis = BasisSet::new(Vec::new(), Harmonics::Spherical);
        let grid = NucleusGrid { natoms: 0 };
        assert!(matches!(
            generate_tasks(&mol, &basis, &grid, None),
            Err(XcTaskError::EmptyMolecule)
        ));
    }

    #[test]
    fn test_custom_screen_is_used() {
        let mol = dimer(3.0);
        let basis = one_shell_per_atom(&mol, 100.0);
        let grid = NucleusGrid { natoms: 2 };
        let own_atom_only = |shell: &Shell, bounds: &BatchBounds| (shell.center() - bounds.center).norm() < 1e-9;
        let tasks = TaskGenerator::new(&mol, &basis, &grid)
            .unwrap()
            .with_screen(own_atom_only)
            .generate()
            .unwrap();
        assert_eq!(tasks[0].shell_list, vec![0]);
        assert_eq!(tasks[1].shell_list, vec![1]);
    }
}
