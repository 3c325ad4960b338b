use crate::error::Result;
use basis::BasisError;
use nalgebra::Vector3;
use periodic_table_on_an_enum::Element;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub z: u32,
    /// Position in bohr.
    pub coords: Vector3<f64>,
}

impl Atom {
    pub fn new(z: u32, coords: Vector3<f64>) -> Self {
        Self { z, coords }
    }

    pub fn from_symbol(symbol: &str, coords: [f64; 3]) -> Result<Self> {
        let element = Element::from_symbol(symbol)
            .ok_or_else(|| BasisError::UnknownElement(symbol.to_string()))?;
        Ok(Self::new(
            element.get_atomic_number() as u32,
            Vector3::new(coords[0], coords[1], coords[2]),
        ))
    }
}

/// Ordered list of atoms. Atom indices are positions in this list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Molecule {
    atoms: Vec<Atom>,
}

impl Molecule {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }

    pub fn natoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, idx: usize) -> &Atom {
        &self.atoms[idx]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Atom> {
        self.atoms.iter()
    }

    /// `(atomic number, position)` pairs in atom order, the shape
    /// [`basis::BasisSet::assemble`] consumes.
    pub fn centers(&self) -> impl Iterator<Item = (u32, Vector3<f64>)> + '_ {
        self.atoms.iter().map(|a| (a.z, a.coords))
    }
}

impl FromIterator<Atom> for Molecule {
    fn from_iter<I: IntoIterator<Item = Atom>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Planar benzene in bohr (C-C 2.640, C-H 2.053), carbons first.
#[cfg(test)]
pub(crate) fn make_benzene() -> Molecule {
    const R_C: f64 = 2.640;
    const R_H: f64 = R_C + 2.053;
    let ring = |radius: f64, k: usize| {
        let theta = std::f64::consts::PI / 3.0 * k as f64;
        Vector3::new(radius * theta.cos(), radius * theta.sin(), 0.0)
    };
    (0..6)
        .map(|k| Atom::new(6, ring(R_C, k)))
        .chain((0..6).map(|k| Atom::new(1, ring(R_H, k))))
        .collect()
}
