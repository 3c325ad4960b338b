use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or distributing quadrature tasks.
///
/// Variants fall into three groups: invalid input (bad molecule, basis, grid or
/// task data), invalid configuration (process group and cost model), and
/// persistence failures when task archives are written or read. None of them
/// is recoverable inside this crate; the operation that raised one returns no
/// partial result.
#[derive(Error, Debug)]
pub enum XcTaskError {
    /// A molecule without atoms cannot carry a grid.
    #[error("invalid input: molecule contains no atoms")]
    EmptyMolecule,

    /// A shell or grid refers to an atom the molecule does not have.
    #[error("invalid input: {what} refers to atom {atom}, but the molecule has {natoms} atoms")]
    AtomOutOfRange {
        what: String,
        atom: usize,
        natoms: usize,
    },

    /// A task lists a shell index past the end of the basis.
    #[error("invalid input: shell index {shell} out of range for a basis of {nshells} shells")]
    ShellOutOfRange { shell: usize, nshells: usize },

    #[error("invalid input: {points} points but {weights} weights")]
    PayloadLengthMismatch { points: usize, weights: usize },

    /// The grid does not describe exactly one atomic grid per atom.
    #[error("invalid input: grid describes {grid_atoms} atoms, molecule has {natoms}")]
    GridAtomCountMismatch { grid_atoms: usize, natoms: usize },

    /// Precomputed metadata belongs to a different geometry.
    #[error("invalid input: molecular metadata covers {meta_atoms} atoms, molecule has {natoms}")]
    MetaAtomCountMismatch { meta_atoms: usize, natoms: usize },

    /// Stored metadata whose distance tables do not fit its atom count.
    #[error("invalid input: molecular metadata for {natoms} atoms has {rab} pair distances and {nearest} nearest distances")]
    MalformedMeta {
        natoms: usize,
        rab: usize,
        nearest: usize,
    },

    #[error("invalid input: shell list is not strictly increasing")]
    UnsortedShellList,

    #[error("invalid input: nbe is {found} but the shell list implies {expected}")]
    NbeMismatch { found: usize, expected: usize },

    #[error("invalid input: basis error: {0}")]
    Basis(#[from] basis::BasisError),

    #[error("invalid configuration: process group size must be at least 1")]
    EmptyGroup,

    #[error("invalid configuration: rank {rank} is outside a group of {size}")]
    RankOutOfRange { rank: usize, size: usize },

    /// Cost models must return finite, non-negative values.
    #[error("invalid configuration: cost model returned {cost} for task {task}")]
    InvalidCost { task: usize, cost: f64 },

    #[error("invalid configuration: batch size must be at least 1")]
    ZeroBatchSize,

    #[error("I/O error at path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("task archive serialization failed: {0}")]
    Pickle(#[from] serde_pickle::Error),
}

pub type Result<T> = std::result::Result<T, XcTaskError>;
