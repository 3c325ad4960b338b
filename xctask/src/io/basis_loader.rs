//! Basis set loading utilities

use basis::ElementBasis;
use color_eyre::eyre::{Result, WrapErr};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// `<directory>/<name>.<symbol>.nwchem`, lowercase
pub fn basis_file_path(directory: &str, name: &str, symbol: &str) -> PathBuf {
    Path::new(directory).join(format!(
        "{}.{}.nwchem",
        name.to_lowercase(),
        symbol.to_lowercase()
    ))
}

/// Read one element's basis from an NWChem-format file
pub fn read_element_basis(path: &Path) -> Result<ElementBasis> {
    debug!("Loading basis file {}", path.display());
    let text = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read basis set file: {}", path.display()))?;
    ElementBasis::parse_nwchem(&text)
        .wrap_err_with(|| format!("Failed to parse basis set file: {}", path.display()))
}
