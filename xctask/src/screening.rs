//! Geometric shell screening against grid batches.

use basis::Shell;
use nalgebra::Vector3;

/// Sphere covering every point of a batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchBounds {
    pub center: Vector3<f64>,
    pub radius: f64,
}

impl BatchBounds {
    /// Centroid of `points` and the largest distance from it.
    pub fn from_points(points: &[Vector3<f64>]) -> Self {
        if points.is_empty() {
            return Self {
                center: Vector3::zeros(),
                radius: 0.0,
            };
        }
        let center = points.iter().fold(Vector3::zeros(), |acc, p| acc + p) / points.len() as f64;
        let radius = points
            .iter()
            .map(|p| (p - center).norm())
            .fold(0.0, f64::max);
        Self { center, radius }
    }
}

/// Decides whether a shell contributes to a batch.
///
/// Implementations may admit negligible shells but must never reject a
/// significant one.
pub trait ShellScreen: Send + Sync {
    fn is_significant(&self, shell: &Shell, bounds: &BatchBounds) -> bool;
}

/// Keeps a shell when its cutoff sphere touches the batch sphere
/// (closed boundary).
#[derive(Debug, Clone, Copy, Default)]
pub struct MinkowskiScreen;

impl ShellScreen for MinkowskiScreen {
    fn is_significant(&self, shell: &Shell, bounds: &BatchBounds) -> bool {
        let dist = (shell.center() - bounds.center).norm();
        dist <= shell.cutoff_radius() + bounds.radius
    }
}

/// Keeps every shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoScreening;

impl ShellScreen for NoScreening {
    fn is_significant(&self, _shell: &Shell, _bounds: &BatchBounds) -> bool {
        true
    }
}

impl<F> ShellScreen for F
where
    F: Fn(&Shell, &BatchBounds) -> bool + Send + Sync,
{
    fn is_significant(&self, shell: &Shell, bounds: &BatchBounds) -> bool {
        self(shell, bounds)
    }
}
