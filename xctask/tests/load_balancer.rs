//! End-to-end task generation and partitioning on benzene/STO-3G
//!
//! These tests build the full pipeline (basis placement, molecular grid,
//! screening, LPT partition, archives) on a coarse grid.

use basis::{BasisLibrary, BasisSet, ElementBasis, Harmonics};
use nalgebra::Vector3;
use std::sync::Arc;
use xctask::archive::{from_bytes, to_bytes, DEFAULT_REFERENCE_RTOL};
use xctask::{
    generate_tasks, make_default_load_balancer, partition_all, Atom, BatchBounds, BatchPolicy,
    CostModel, GridSize, LoadBalancer, MolGrid, MolMeta, Molecule, Payload, ProcessGroup,
    ReferenceData, XcTask,
};

#[cfg(test)]
mod integration_tests {
    use super::*;

    const H_STO3G: &str = include_str!("../example/basis_sets/sto-3g.h.nwchem");
    const C_STO3G: &str = include_str!("../example/basis_sets/sto-3g.c.nwchem");

    /// Planar ring in bohr (C-C 2.640, C-H 2.053), carbons first.
    fn make_benzene() -> Molecule {
        let ring = |radius: f64, k: usize| {
            let theta = std::f64::consts::PI / 3.0 * k as f64;
            Vector3::new(radius * theta.cos(), radius * theta.sin(), 0.0)
        };
        (0..6)
            .map(|k| Atom::new(6, ring(2.640, k)))
            .chain((0..6).map(|k| Atom::new(1, ring(2.640 + 2.053, k))))
            .collect()
    }

    fn sto3g_library() -> BasisLibrary {
        let mut library = BasisLibrary::new();
        library.insert(ElementBasis::parse_nwchem(H_STO3G).unwrap());
        library.insert(ElementBasis::parse_nwchem(C_STO3G).unwrap());
        library
    }

    fn benzene_basis(mol: &Molecule, tol: f64) -> BasisSet {
        let mut basis = BasisSet::assemble(mol.centers(), &sto3g_library(), Harmonics::Spherical).unwrap();
        basis.set_shell_tolerance(tol).unwrap();
        basis
    }

    fn coarse_grid(mol: &Molecule) -> MolGrid {
        MolGrid::new(GridSize::Explicit { radial: 10, angular: 14 }, mol)
            .with_batch_policy(BatchPolicy::Spatial(64))
    }

    #[test]
    fn test_benzene_basis_layout() {
        let mol = make_benzene();
        let basis = benzene_basis(&mol, f64::EPSILON);
        // C: s, s, p; H: s
        assert_eq!(basis.nshells(), 6 * 3 + 6);
        assert_eq!(basis.nbf(), 6 * 5 + 6);
        assert_eq!(basis.shells()[0].atom(), 0);
        assert_eq!(basis.shells()[23].atom(), 11);
    }

    #[test]
    fn test_meta_forms_and_factory_agree() {
        let mol = make_benzene();
        let basis = benzene_basis(&mol, f64::EPSILON);
        let grid = coarse_grid(&mol);
        let meta = MolMeta::new(&mol).unwrap();
        let group = ProcessGroup::single();

        let implicit = LoadBalancer::new(group, &mol, &grid, &basis).unwrap();
        let explicit = LoadBalancer::with_meta(group, &mol, &grid, &basis, meta.clone()).unwrap();
        let shared = LoadBalancer::with_meta(group, &mol, &grid, &basis, Arc::new(meta.clone())).unwrap();
        let factory = make_default_load_balancer(group, &mol, &grid, &basis, None).unwrap();

        assert!(!implicit.get_tasks().is_empty());
        assert_eq!(implicit.get_tasks(), explicit.get_tasks());
        assert_eq!(implicit.get_tasks(), shared.get_tasks());
        assert_eq!(implicit.get_tasks(), factory.get_tasks());
        assert_eq!(implicit.molmeta(), &meta);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let mol = make_benzene();
        let basis = benzene_basis(&mol, f64::EPSILON);
        let grid = coarse_grid(&mol);

        let first = generate_tasks(&mol, &basis, &grid, None).unwrap();
        let second = generate_tasks(&mol, &basis, &grid, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            to_bytes(&first, Payload::Keep).unwrap(),
            to_bytes(&second, Payload::Keep).unwrap()
        );
    }

    #[test]
    fn test_tasks_follow_atom_order_and_metadata() {
        let mol = make_benzene();
        let basis = benzene_basis(&mol, f64::EPSILON);
        let grid = coarse_grid(&mol);
        let meta = MolMeta::new(&mol).unwrap();
        let tasks = generate_tasks(&mol, &basis, &grid, Some(&meta)).unwrap();

        assert!(tasks.windows(2).all(|w| w[0].parent_atom <= w[1].parent_atom));
        for atom in 0..mol.natoms() {
            assert!(tasks.iter().any(|t| t.parent_atom == atom));
        }
        for task in &tasks {
            task.validate(mol.natoms(), &basis).unwrap();
            assert!(task.npts() <= 64);
            assert_eq!(task.dist_nearest, meta.dist_nearest()[task.parent_atom]);
            assert!(task.weights.iter().all(|&w| w > 0.0));
        }
    }

    #[test]
    fn test_screening_never_drops_a_reachable_shell() {
        let mol = make_benzene();
        let basis = benzene_basis(&mol, 1e-6);
        let grid = coarse_grid(&mol);
        let tasks = generate_tasks(&mol, &basis, &grid, None).unwrap();

        for task in &tasks {
            let bounds = BatchBounds::from_points(&task.points);
            for (idx, shell) in basis.iter().enumerate() {
                let reach = shell.cutoff_radius() + bounds.radius;
                let dist = (shell.center() - bounds.center).norm();
                if task.shell_list.binary_search(&idx).is_err() {
                    assert!(dist > reach, "shell {} dropped at distance {} <= {}", idx, dist, reach);
                }
            }
        }
    }

    #[test]
    fn test_looser_tolerance_gives_subset_shell_lists() {
        let mol = make_benzene();
        let grid = coarse_grid(&mol);
        let tight = generate_tasks(&mol, &benzene_basis(&mol, f64::EPSILON), &grid, None).unwrap();
        let loose = generate_tasks(&mol, &benzene_basis(&mol, 1e-3), &grid, None).unwrap();

        assert_eq!(tight.len(), loose.len());
        for (t, l) in tight.iter().zip(&loose) {
            assert_eq!(t.points, l.points);
            assert!(l.shell_list.iter().all(|s| t.shell_list.contains(s)));
            assert!(l.nbe <= t.nbe);
        }
    }

    #[test]
    fn test_ranks_cover_global_list_exactly_once() {
        let mol = make_benzene();
        let basis = benzene_basis(&mol, f64::EPSILON);
        let grid = coarse_grid(&mol);
        let meta = Arc::new(MolMeta::new(&mol).unwrap());
        let nranks = 3;

        let per_rank: Vec<LoadBalancer> = (0..nranks)
            .map(|rank| {
                let group = ProcessGroup::new(nranks, rank).unwrap();
                LoadBalancer::with_meta(group, &mol, &grid, &basis, Arc::clone(&meta)).unwrap()
            })
            .collect();

        let global = per_rank[0].global_tasks();
        let shares = partition_all(global, nranks, &CostModel::default()).unwrap();
        let mut total = 0;
        for (rank, lb) in per_rank.iter().enumerate() {
            assert_eq!(lb.global_tasks(), global);
            assert_eq!(lb.get_tasks(), shares[rank].as_slice());
            total += lb.get_tasks().len();
        }
        assert_eq!(total, global.len());

        // each global task is owned by exactly one rank
        for (idx, task) in global.iter().enumerate() {
            let owner = per_rank[0].owners()[idx];
            let holders = shares.iter().filter(|s| s.contains(task)).count();
            assert_eq!(holders, 1);
            assert!(shares[owner].contains(task));
        }

        let loads = per_rank[0].rank_costs();
        let max = loads.iter().cloned().fold(0.0, f64::max);
        let mean = loads.iter().sum::<f64>() / nranks as f64;
        let largest = per_rank[0].task_costs().iter().cloned().fold(0.0, f64::max);
        assert!(max <= mean + largest + 1e-9 * max);
    }

    #[test]
    fn test_payload_free_archive_and_reference() {
        let mol = make_benzene();
        let basis = benzene_basis(&mol, f64::EPSILON);
        let grid = coarse_grid(&mol);
        let meta = MolMeta::new(&mol).unwrap();
        let tasks = generate_tasks(&mol, &basis, &grid, Some(&meta)).unwrap();

        let full = to_bytes(&tasks, Payload::Keep).unwrap();
        let light = to_bytes(&tasks, Payload::Omit).unwrap();
        assert!(light.len() < full.len());

        let back: Vec<XcTask> = from_bytes(&light).unwrap();
        assert_eq!(back.len(), tasks.len());
        for (b, t) in back.iter().zip(&tasks) {
            assert_eq!(b.parent_atom, t.parent_atom);
            assert_eq!(b.shell_list, t.shell_list);
            assert_eq!(b.nbe, t.nbe);
            assert_eq!(b.dist_nearest, t.dist_nearest);
            assert_eq!(b.npts(), 0);
        }

        let bytes = ReferenceData::new(&meta, &tasks).to_pickle().unwrap();
        let reference = ReferenceData::from_pickle(&bytes).unwrap();
        let rerun = generate_tasks(&mol, &basis, &grid, None).unwrap();
        assert_eq!(reference.check(&meta, &rerun, DEFAULT_REFERENCE_RTOL), None);

        let mut tampered = rerun.clone();
        let last = tampered.len() - 1;
        tampered[last].nbe += 1;
        assert!(reference.check(&meta, &tampered, DEFAULT_REFERENCE_RTOL).is_some());
    }
}
