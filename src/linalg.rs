//! Small dense linear algebra on [`Matrix`]: products, the symmetric
//! eigendecomposition, a rank-truncated pseudo-inverse and thin QR.
//!
//! Sizes here are bounded by the number of sampled kernel columns, so plain
//! triple loops are adequate.

use crate::data::model::Matrix;
use crate::error::{FlowDataError, Result};

/// Maximum number of Jacobi sweeps.
const MAX_SWEEPS: usize = 100;

/// `a * b`.
pub fn matmul(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    if a.cols() != b.rows() {
        return Err(FlowDataError::DimensionMismatch {
            expected: (a.cols(), b.cols()),
            got: b.shape(),
        });
    }
    let (n, k, m) = (a.rows(), a.cols(), b.cols());
    let mut out = Matrix::zeros(n, m);
    for i in 0..n {
        for p in 0..k {
            let aip = a.get(i, p);
            if aip == 0.0 {
                continue;
            }
            for j in 0..m {
                out.set(i, j, out.get(i, j) + aip * b.get(p, j));
            }
        }
    }
    Ok(out)
}

pub fn frobenius_norm(a: &Matrix) -> f64 {
    a.as_slice().iter().map(|v| v * v).sum::<f64>().sqrt()
}

fn require_square(a: &Matrix) -> Result<usize> {
    let (n, m) = a.shape();
    if n != m {
        return Err(FlowDataError::DimensionMismatch {
            expected: (n, n),
            got: (n, m),
        });
    }
    Ok(n)
}

// ---------------------------------------------------------------------------
// Symmetric eigendecomposition (Jacobi)
// ---------------------------------------------------------------------------

/// `A = V diag(d) V^T` for a real symmetric `A`.
#[derive(Debug, Clone)]
pub struct SymmetricEigen {
    /// Descending.
    pub eigenvalues: Vec<f64>,
    /// Columns are eigenvectors, in the order of `eigenvalues`.
    pub eigenvectors: Matrix,
}

impl SymmetricEigen {
    pub fn decompose(a: &Matrix) -> Result<Self> {
        let n = require_square(a)?;
        let mut s = a.clone();
        let mut v = Matrix::zeros(n, n);
        for i in 0..n {
            v.set(i, i, 1.0);
        }

        let tol = f64::EPSILON * 100.0;

        for _sweep in 0..MAX_SWEEPS {
            let mut off_norm = 0.0;
            for i in 0..n {
                for j in (i + 1)..n {
                    off_norm += s.get(i, j) * s.get(i, j);
                }
            }
            if off_norm.sqrt() < tol {
                break;
            }

            for p in 0..n {
                for q in (p + 1)..n {
                    let apq = s.get(p, q);
                    if apq.abs() < tol {
                        continue;
                    }
                    let app = s.get(p, p);
                    let aqq = s.get(q, q);

                    let theta = (aqq - app) / (apq + apq);
                    let t = if theta >= 0.0 {
                        1.0 / (theta + (1.0 + theta * theta).sqrt())
                    } else {
                        -1.0 / (-theta + (1.0 + theta * theta).sqrt())
                    };
                    let cs = 1.0 / (1.0 + t * t).sqrt();
                    let sn = t * cs;

                    s.set(p, p, app - t * apq);
                    s.set(q, q, aqq + t * apq);
                    s.set(p, q, 0.0);
                    s.set(q, p, 0.0);

                    for r in 0..n {
                        if r == p || r == q {
                            continue;
                        }
                        let srp = s.get(r, p);
                        let srq = s.get(r, q);
                        s.set(r, p, cs * srp - sn * srq);
                        s.set(p, r, cs * srp - sn * srq);
                        s.set(r, q, sn * srp + cs * srq);
                        s.set(q, r, sn * srp + cs * srq);
                    }

                    for i in 0..n {
                        let vp = v.get(i, p);
                        let vq = v.get(i, q);
                        v.set(i, p, cs * vp - sn * vq);
                        v.set(i, q, sn * vp + cs * vq);
                    }
                }
            }
        }

        let diag: Vec<f64> = (0..n).map(|i| s.get(i, i)).collect();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| diag[b].total_cmp(&diag[a]));

        let mut eigenvectors = Matrix::zeros(n, n);
        for (new_j, &old_j) in order.iter().enumerate() {
            for i in 0..n {
                eigenvectors.set(i, new_j, v.get(i, old_j));
            }
        }

        Ok(SymmetricEigen {
            eigenvalues: order.iter().map(|&i| diag[i]).collect(),
            eigenvectors,
        })
    }
}

/// Pseudo-inverse of a symmetric positive semi-definite matrix, keeping at
/// most the `rank` largest eigenvalues. Eigenvalues below a relative
/// threshold are treated as zero.
pub fn pseudo_inverse_rank(w: &Matrix, rank: usize) -> Result<Matrix> {
    let n = require_square(w)?;
    if n == 0 {
        return Err(FlowDataError::Empty("pseudo-inverse of an empty matrix"));
    }
    let eig = SymmetricEigen::decompose(w)?;
    let largest = eig.eigenvalues.first().copied().unwrap_or(0.0).abs();
    let cutoff = largest * 1e-12 * n as f64;

    let mut out = Matrix::zeros(n, n);
    for (k, &lambda) in eig.eigenvalues.iter().enumerate().take(rank) {
        if lambda <= cutoff {
            break;
        }
        let inv = 1.0 / lambda;
        for i in 0..n {
            let vik = eig.eigenvectors.get(i, k) * inv;
            for j in 0..n {
                out.set(i, j, out.get(i, j) + vik * eig.eigenvectors.get(j, k));
            }
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Thin QR (modified Gram-Schmidt)
// ---------------------------------------------------------------------------

/// `a = q * r` with `q` n×m (orthonormal or zero columns) and `r` m×m upper
/// triangular. A column dependent on earlier ones gets a zero in `q` and a
/// zero diagonal in `r`.
pub fn thin_qr(a: &Matrix) -> (Matrix, Matrix) {
    let (n, m) = a.shape();
    let mut q = a.clone();
    let mut r = Matrix::zeros(m, m);
    let scale = frobenius_norm(a).max(f64::MIN_POSITIVE);

    for j in 0..m {
        for k in 0..j {
            let dot: f64 = (0..n).map(|i| q.get(i, k) * q.get(i, j)).sum();
            r.set(k, j, dot);
            for i in 0..n {
                q.set(i, j, q.get(i, j) - dot * q.get(i, k));
            }
        }
        let norm = (0..n).map(|i| q.get(i, j).powi(2)).sum::<f64>().sqrt();
        if norm <= scale * 1e-13 {
            for i in 0..n {
                q.set(i, j, 0.0);
            }
            continue;
        }
        r.set(j, j, norm);
        for i in 0..n {
            q.set(i, j, q.get(i, j) / norm);
        }
    }
    (q, r)
}
