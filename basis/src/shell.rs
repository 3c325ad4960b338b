/* Contracted gaussian shells and the geometric extent used to screen them
   against grid batches.
*/

use crate::error::{BasisError, Result};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Default significance tolerance applied to freshly built shells.
pub const DEFAULT_SHELL_TOLERANCE: f64 = 1e-10;

/// Convention used to count the functions carried by a shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Harmonics {
    /// Real solid harmonics, `2l + 1` functions per shell.
    #[default]
    Spherical,
    /// Cartesian monomials, `(l + 1)(l + 2) / 2` functions per shell.
    Cartesian,
}

impl Harmonics {
    pub fn nfunctions(self, l: u32) -> usize {
        let l = l as usize;
        match self {
            Harmonics::Spherical => 2 * l + 1,
            Harmonics::Cartesian => (l + 1) * (l + 2) / 2,
        }
    }
}

/// One gaussian primitive `c * exp(-alpha r^2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub alpha: f64,
    pub coeff: f64,
}

impl Primitive {
    pub fn new(alpha: f64, coeff: f64) -> Self {
        Self { alpha, coeff }
    }

    /// Radius beyond which `|c| exp(-alpha r^2)` stays below `tol`.
    fn radius(&self, tol: f64) -> f64 {
        let c = self.coeff.abs();
        if c <= tol || self.alpha <= 0.0 {
            return 0.0;
        }
        ((c / tol).ln() / self.alpha).sqrt()
    }
}

/// A shell of basis functions sharing a center atom and angular momentum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shell {
    atom: usize,
    center: Vector3<f64>,
    l: u32,
    primitives: Vec<Primitive>,
    tolerance: f64,
    cutoff_radius: f64,
}

impl Shell {
    pub fn new(atom: usize, center: Vector3<f64>, l: u32, primitives: Vec<Primitive>) -> Self {
        let mut shell = Self {
            atom,
            center,
            l,
            primitives,
            tolerance: DEFAULT_SHELL_TOLERANCE,
            cutoff_radius: 0.0,
        };
        shell.cutoff_radius = shell.compute_cutoff_radius();
        shell
    }

    /// Replace the derived cutoff with a fixed radius.
    ///
    /// The radius is kept until the next call to [`Shell::set_shell_tolerance`].
    pub fn with_cutoff_radius(mut self, radius: f64) -> Self {
        self.cutoff_radius = radius.max(0.0);
        self
    }

    /// Sets the significance tolerance and recomputes the cutoff radius.
    /// `tol` must be positive and finite.
    pub fn set_shell_tolerance(&mut self, tol: f64) -> Result<()> {
        if !(tol.is_finite() && tol > 0.0) {
            return Err(BasisError::InvalidTolerance(tol));
        }
        self.tolerance = tol;
        self.cutoff_radius = self.compute_cutoff_radius();
        Ok(())
    }

    fn compute_cutoff_radius(&self) -> f64 {
        self.primitives
            .iter()
            .map(|p| p.radius(self.tolerance))
            .fold(0.0, f64::max)
    }

    pub fn atom(&self) -> usize {
        self.atom
    }

    pub fn center(&self) -> &Vector3<f64> {
        &self.center
    }

    pub fn l(&self) -> u32 {
        self.l
    }

    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    pub fn nprim(&self) -> usize {
        self.primitives.len()
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn cutoff_radius(&self) -> f64 {
        self.cutoff_radius
    }

    pub fn nfunctions(&self, harmonics: Harmonics) -> usize {
        harmonics.nfunctions(self.l)
    }
}
