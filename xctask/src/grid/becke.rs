use crate::molmeta::MolMeta;
use nalgebra::Vector3;

/// Classic Becke partition weight for atom `a` at point `r`.
///
/// `w_a = Π_{b≠a} s(μ_ab) / Σ_c Π_{b≠c} s(μ_cb)` with the cell function
/// applied three times.
pub(crate) fn becke_weight(a: usize, r: &Vector3<f64>, coords: &[Vector3<f64>], meta: &MolMeta) -> f64 {
    let na = coords.len();
    if na == 1 {
        return 1.0;
    }

    let dist: Vec<f64> = coords.iter().map(|c| (r - c).norm()).collect();

    let mut raw = vec![1.0_f64; na];
    for i in 0..na {
        for j in 0..na {
            if i == j {
                continue;
            }
            raw[i] *= cell_function(dist[i], dist[j], meta.distance(i, j));
            if raw[i] == 0.0 {
                break;
            }
        }
    }
    let denom: f64 = raw.iter().sum();
    if denom <= 0.0 || !denom.is_finite() {
        return 0.0;
    }
    raw[a] / denom
}

fn cell_function(ri: f64, rj: f64, rij: f64) -> f64 {
    if rij < 1e-12 {
        return 0.5;
    }
    let mut mu = (ri - rj) / rij;
    for _ in 0..3 {
        mu = (3.0 * mu - mu * mu * mu) / 2.0;
    }
    0.5 * (1.0 - mu)
}
