//! One-dimensional and angular quadrature rules used to build atomic grids.

use itertools::iproduct;
use nalgebra::Vector3;
use std::f64::consts::PI;

/// Gauss–Legendre nodes and weights on [a, b].
///
/// Newton iteration on the roots of P_n(x), numerical recipes style.
pub(crate) fn gauss_legendre(n: usize, a: f64, b: f64) -> (Vec<f64>, Vec<f64>) {
    if n == 0 {
        return (Vec::new(), Vec::new());
    }
    if n == 1 {
        return (vec![0.5 * (a + b)], vec![b - a]);
    }

    let m = (n + 1) / 2;
    let mut x = vec![0.0_f64; n];
    let mut w = vec![0.0_f64; n];
    let nn = n as f64;
    let xm = 0.5 * (b + a);
    let xl = 0.5 * (b - a);

    let eps = 1e-14;
    for i in 0..m {
        let i1 = i as f64 + 1.0;
        let mut z = (PI * (i1 - 0.25) / (nn + 0.5)).cos();
        for _ in 0..100 {
            let (p1, p2) = legendre_pn(n, z);
            let pp = (nn * (z * p1 - p2)) / (z * z - 1.0);
            let z1 = z;
            z = z1 - p1 / pp;
            if (z - z1).abs() < eps {
                break;
            }
        }
        let (p1, p2) = legendre_pn(n, z);
        let pp = (nn * (z * p1 - p2)) / (z * z - 1.0);
        x[i] = xm - xl * z;
        x[n - 1 - i] = xm + xl * z;
        let wi = 2.0 * xl / ((1.0 - z * z) * pp * pp);
        w[i] = wi;
        w[n - 1 - i] = wi;
    }
    (x, w)
}

/// Returns (P_n(z), P_{n-1}(z)).
fn legendre_pn(n: usize, z: f64) -> (f64, f64) {
    let mut p1 = 1.0;
    let mut p2 = 0.0;
    for j in 1..=n {
        let p3 = p2;
        p2 = p1;
        p1 = ((2.0 * j as f64 - 1.0) * z * p2 - (j as f64 - 1.0) * p3) / (j as f64);
    }
    (p1, p2)
}

/// Six points on the axes; weights sum to 4π.
pub(crate) fn octahedral_6() -> Vec<(Vector3<f64>, f64)> {
    let w = 4.0 * PI / 6.0;
    vec![
        (Vector3::new(1.0, 0.0, 0.0), w),
        (Vector3::new(-1.0, 0.0, 0.0), w),
        (Vector3::new(0.0, 1.0, 0.0), w),
        (Vector3::new(0.0, -1.0, 0.0), w),
        (Vector3::new(0.0, 0.0, 1.0), w),
        (Vector3::new(0.0, 0.0, -1.0), w),
    ]
}

/// Product rule on the unit sphere: Gauss–Legendre in cos θ times a uniform
/// trapezoid in φ. Weights sum to 4π.
pub(crate) fn product_sphere(n_theta: usize, n_phi: usize) -> Vec<(Vector3<f64>, f64)> {
    let (cos_t, w_t) = gauss_legendre(n_theta, -1.0, 1.0);
    let dphi = 2.0 * PI / n_phi as f64;

    iproduct!(0..n_theta, 0..n_phi)
        .map(|(it, ip)| {
            let ct = cos_t[it];
            let st = (1.0 - ct * ct).max(0.0).sqrt();
            let phi = dphi * ip as f64;
            let dir = Vector3::new(st * phi.cos(), st * phi.sin(), ct);
            (dir, w_t[it] * dphi)
        })
        .collect()
}

/// Angular rule with roughly `npts` points: the octahedron for 6 or fewer,
/// otherwise the product rule with `n_phi = 2 n_theta`.
pub(crate) fn angular_rule(npts: usize) -> Vec<(Vector3<f64>, f64)> {
    if npts <= 6 {
        return octahedral_6();
    }
    let n_theta = ((npts as f64 / 2.0).sqrt().round() as usize).max(2);
    product_sphere(n_theta, 2 * n_theta)
}
