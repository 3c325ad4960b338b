//! Gaussian basis data used to screen shells against quadrature batches.
//!
//! Shells are read per element from NWChem text and placed on the atoms of a
//! molecule in atom order.

pub mod basis_set;
pub mod element;
pub mod error;
pub mod shell;

pub use basis_set::{BasisLibrary, BasisSet};
pub use element::{ElementBasis, ShellTemplate};
pub use error::{BasisError, Result};
pub use shell::{Harmonics, Primitive, Shell, DEFAULT_SHELL_TOLERANCE};
