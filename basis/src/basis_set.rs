use crate::element::ElementBasis;
use crate::error::{BasisError, Result};
use crate::shell::{Harmonics, Shell};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Element basis definitions keyed by atomic number.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BasisLibrary {
    elements: BTreeMap<u32, ElementBasis>,
}

impl BasisLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, basis: ElementBasis) {
        self.elements.insert(basis.atomic_number, basis);
    }

    pub fn get(&self, atomic_number: u32) -> Option<&ElementBasis> {
        self.elements.get(&atomic_number)
    }

    pub fn contains(&self, atomic_number: u32) -> bool {
        self.elements.contains_key(&atomic_number)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Ordered list of shells for a whole molecule.
///
/// Shell order is the order atoms were supplied in, then file order within
/// each element; every consumer relies on this order being stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasisSet {
    shells: Vec<Shell>,
    harmonics: Harmonics,
}

impl BasisSet {
    pub fn new(shells: Vec<Shell>, harmonics: Harmonics) -> Self {
        Self { shells, harmonics }
    }

    /// Places the library shells on every `(atomic_number, center)` pair.
    pub fn assemble<I>(atoms: I, library: &BasisLibrary, harmonics: Harmonics) -> Result<Self>
    where
        I: IntoIterator<Item = (u32, Vector3<f64>)>,
    {
        let mut shells = Vec::new();
        for (atom, (z, center)) in atoms.into_iter().enumerate() {
            let element = library.get(z).ok_or_else(|| BasisError::MissingElement {
                symbol: format!("Z={}", z),
                atom,
            })?;
            shells.extend(
                element
                    .shells
                    .iter()
                    .map(|t| Shell::new(atom, center, t.l, t.primitives.clone())),
            );
        }
        Ok(Self::new(shells, harmonics))
    }

    pub fn shells(&self) -> &[Shell] {
        &self.shells
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Shell> {
        self.shells.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Shell> {
        self.shells.iter_mut()
    }

    pub fn nshells(&self) -> usize {
        self.shells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shells.is_empty()
    }

    pub fn harmonics(&self) -> Harmonics {
        self.harmonics
    }

    pub fn set_harmonics(&mut self, harmonics: Harmonics) {
        self.harmonics = harmonics;
    }

    /// Number of basis functions carried by the shell at `idx`.
    pub fn shell_nfunctions(&self, idx: usize) -> usize {
        self.shells[idx].nfunctions(self.harmonics)
    }

    /// Total number of basis functions.
    pub fn nbf(&self) -> usize {
        self.shells.iter().map(|s| s.nfunctions(self.harmonics)).sum()
    }

    /// Applies one significance tolerance to every shell.
    pub fn set_shell_tolerance(&mut self, tol: f64) -> Result<()> {
        if !(tol.is_finite() && tol > 0.0) {
            return Err(BasisError::InvalidTolerance(tol));
        }
        for shell in self.shells.iter_mut() {
            shell.set_shell_tolerance(tol)?;
        }
        Ok(())
    }

    pub fn to_pickle(&self) -> Result<Vec<u8>> {
        let options = serde_pickle::SerOptions::new();
        Ok(serde_pickle::to_vec(self, options)?)
    }

    pub fn from_pickle(bytes: &[u8]) -> Result<Self> {
        let options = serde_pickle::DeOptions::new();
        Ok(serde_pickle::from_slice(bytes, options)?)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let io_err = |source| BasisError::Io {
            path: path.to_path_buf(),
            source,
        };
        let serialized = self.to_pickle()?;
        let mut file = File::create(path).map_err(io_err)?;
        file.write_all(&serialized).map_err(io_err)
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let io_err = |source| BasisError::Io {
            path: path.to_path_buf(),
            source,
        };
        let mut file = File::open(path).map_err(io_err)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer).map_err(io_err)?;
        Self::from_pickle(&buffer)
    }
}

impl<'a> IntoIterator for &'a BasisSet {
    type Item = &'a Shell;
    type IntoIter = std::slice::Iter<'a, Shell>;

    fn into_iter(self) -> Self::IntoIter {
        self.shells.iter()
    }
}

impl<'a> IntoIterator for &'a mut BasisSet {
    type Item = &'a mut Shell;
    type IntoIter = std::slice::IterMut<'a, Shell>;

    fn into_iter(self) -> Self::IntoIter {
        self.shells.iter_mut()
    }
}
