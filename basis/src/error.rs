use std::path::PathBuf;
use thiserror::Error;

/// Failures raised while reading, assembling or persisting basis data.
#[derive(Error, Debug)]
pub enum BasisError {
    /// A line in an NWChem block could not be read as numbers.
    #[error("line {line}: cannot parse '{text}' as primitive data")]
    Parse { line: usize, text: String },

    /// Shell labels other than S, P, D, F, G, H and the combined SP.
    #[error("line {line}: unsupported shell label '{label}'")]
    UnsupportedShell { line: usize, label: String },

    #[error("unknown element symbol '{0}'")]
    UnknownElement(String),

    /// An NWChem text mixed primitives of several elements.
    #[error("basis text contains more than one element ('{first}' and '{second}')")]
    MixedElements { first: String, second: String },

    #[error("basis text for '{0}' contains no shells")]
    EmptyBasis(String),

    /// No per-element definition was supplied for an atom of the molecule.
    #[error("no basis definition for element '{symbol}' (atom {atom})")]
    MissingElement { symbol: String, atom: usize },

    #[error("shell tolerance must be positive and finite, got {0}")]
    InvalidTolerance(f64),

    #[error("I/O error at path '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("pickle serialization failed: {0}")]
    Pickle(#[from] serde_pickle::Error),
}

pub type Result<T> = std::result::Result<T, BasisError>;
