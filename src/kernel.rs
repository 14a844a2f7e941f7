//! Gaussian (RBF) kernel matrices and their low-rank approximations.
//!
//! All three approximations sample `number_to_pick` landmark rows, build the
//! n×m cross kernel `C` and the m×m landmark kernel `W`, and return
//! `C W_k⁺ Cᵀ` where `W_k⁺` keeps the `rank` leading eigenpairs of `W`.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::model::Matrix;
use crate::error::{FlowDataError, Result};
use crate::linalg::{self, SymmetricEigen};
use crate::rng::SimpleRng;

/// Settings for [`KernelApproximation`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelSettings {
    /// Landmark rows sampled per approximation.
    pub number_to_pick: usize,
    /// Kernel width.
    pub sigma: f64,
    /// Eigenpairs of the landmark kernel kept in the pseudo-inverse.
    pub rank: usize,
    /// Independent Nyström approximations averaged by the ensemble method.
    pub number_of_matrices: usize,
    pub seed: u64,
}

impl Default for KernelSettings {
    fn default() -> Self {
        KernelSettings {
            number_to_pick: 100,
            sigma: 1.0,
            rank: 30,
            number_of_matrices: 10,
            seed: 42,
        }
    }
}

impl KernelSettings {
    /// Check the settings against a dataset of `n` observations.
    pub fn validate(&self, n: usize) -> Result<()> {
        fn invalid(name: &'static str, reason: String) -> Result<()> {
            Err(FlowDataError::InvalidSetting { name, reason })
        }
        if self.number_to_pick == 0 || self.number_to_pick > n {
            return invalid(
                "number_to_pick",
                format!("must be in 1..={n}, got {}", self.number_to_pick),
            );
        }
        if self.rank == 0 || self.rank > self.number_to_pick {
            return invalid(
                "rank",
                format!("must be in 1..={}, got {}", self.number_to_pick, self.rank),
            );
        }
        if self.number_of_matrices == 0 {
            return invalid("number_of_matrices", "must be positive".to_string());
        }
        if !(self.sigma > 0.0 && self.sigma.is_finite()) {
            return invalid("sigma", format!("must be positive, got {}", self.sigma));
        }
        Ok(())
    }
}

/// Which approximation [`KernelApproximation::compute`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    Standard,
    Ensemble,
    Qr,
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Kernel between every row of `x` and every row of `y`:
/// `K_ij = exp(-‖x_i − y_j‖² / σ²)`.
pub fn rbf_cross_kernel(x: &Matrix, y: &Matrix, sigma: f64) -> Result<Matrix> {
    if x.cols() != y.cols() {
        return Err(FlowDataError::DimensionMismatch {
            expected: (y.rows(), x.cols()),
            got: y.shape(),
        });
    }
    let gamma = 1.0 / (sigma * sigma);
    let mut k = Matrix::zeros(x.rows(), y.rows());
    for (i, xi) in x.iter_rows().enumerate() {
        for (j, yj) in y.iter_rows().enumerate() {
            k.set(i, j, (-gamma * squared_distance(xi, yj)).exp());
        }
    }
    Ok(k)
}

/// Exact n×n RBF kernel of `x` with itself.
pub fn rbf_kernel(x: &Matrix, sigma: f64) -> Result<Matrix> {
    rbf_cross_kernel(x, x, sigma)
}

/// `‖approx − exact‖_F / ‖exact‖_F`.
pub fn relative_error(approx: &Matrix, exact: &Matrix) -> Result<f64> {
    if approx.shape() != exact.shape() {
        return Err(FlowDataError::DimensionMismatch {
            expected: exact.shape(),
            got: approx.shape(),
        });
    }
    let diff: f64 = approx
        .as_slice()
        .iter()
        .zip(exact.as_slice())
        .map(|(a, e)| (a - e).powi(2))
        .sum::<f64>()
        .sqrt();
    Ok(diff / linalg::frobenius_norm(exact))
}

/// Low-rank approximation of the RBF kernel of a dataset.
#[derive(Debug)]
pub struct KernelApproximation<'a> {
    x: &'a Matrix,
    settings: KernelSettings,
}

impl<'a> KernelApproximation<'a> {
    pub fn new(x: &'a Matrix, settings: KernelSettings) -> Result<Self> {
        settings.validate(x.rows())?;
        Ok(KernelApproximation { x, settings })
    }

    pub fn settings(&self) -> &KernelSettings {
        &self.settings
    }

    pub fn compute(&self, method: Method) -> Result<Matrix> {
        match method {
            Method::Standard => self.nystrom_standard(),
            Method::Ensemble => self.nystrom_ensemble(),
            Method::Qr => self.qr_decomposition(),
        }
    }

    /// Landmark indices, cross kernel `C` and truncated `W⁺`.
    fn landmarks(&self, rng: &mut SimpleRng) -> Result<(Matrix, Matrix)> {
        let s = &self.settings;
        let picked = rng.sample_indices(self.x.rows(), s.number_to_pick);
        let c = rbf_cross_kernel(self.x, &self.x.take_rows(&picked), s.sigma)?;
        let w = c.take_rows(&picked);
        let w_pinv = linalg::pseudo_inverse_rank(&w, s.rank)?;
        debug!(
            "nystrom: {} landmarks of {} rows, rank {}",
            picked.len(),
            self.x.rows(),
            s.rank
        );
        Ok((c, w_pinv))
    }

    /// `C W_k⁺ Cᵀ` from one landmark sample.
    pub fn nystrom_standard(&self) -> Result<Matrix> {
        let mut rng = SimpleRng::new(self.settings.seed);
        let (c, w_pinv) = self.landmarks(&mut rng)?;
        linalg::matmul(&linalg::matmul(&c, &w_pinv)?, &c.transpose())
    }

    /// Uniform average of `number_of_matrices` independent Nyström samples.
    pub fn nystrom_ensemble(&self) -> Result<Matrix> {
        let p = self.settings.number_of_matrices;
        let n = self.x.rows();
        let weight = 1.0 / p as f64;
        let mut rng = SimpleRng::new(self.settings.seed);
        let mut acc = Matrix::zeros(n, n);

        for _ in 0..p {
            let (c, w_pinv) = self.landmarks(&mut rng)?;
            let k = linalg::matmul(&linalg::matmul(&c, &w_pinv)?, &c.transpose())?;
            for i in 0..n {
                for j in 0..n {
                    acc.set(i, j, acc.get(i, j) + weight * k.get(i, j));
                }
            }
        }
        Ok(acc)
    }

    /// Nyström through a thin QR of `C`.
    ///
    /// `C = QR`, then `R W_k⁺ Rᵀ = V Σ Vᵀ` and the result is `U Σ Uᵀ` with
    /// `U = QV`. Only m×m eigenproblems are solved.
    pub fn qr_decomposition(&self) -> Result<Matrix> {
        let mut rng = SimpleRng::new(self.settings.seed);
        let (c, w_pinv) = self.landmarks(&mut rng)?;
        let (q, r) = linalg::thin_qr(&c);

        let core = linalg::matmul(&linalg::matmul(&r, &w_pinv)?, &r.transpose())?;
        let eig = SymmetricEigen::decompose(&core)?;
        let u = linalg::matmul(&q, &eig.eigenvectors)?;

        let mut u_sigma = u.clone();
        for i in 0..u.rows() {
            for (k, &lambda) in eig.eigenvalues.iter().enumerate() {
                u_sigma.set(i, k, u.get(i, k) * lambda);
            }
        }
        linalg::matmul(&u_sigma, &u.transpose())
    }
}
