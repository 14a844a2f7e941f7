//! Column centering and scaling, label encoding and train/test splitting.
//!
//! The thermochemical state mixes temperatures in the thousands with species
//! fractions near zero, so every distance-based method downstream expects
//! `center_scale` to have been applied first.

use serde::{Deserialize, Serialize};

use crate::data::model::Matrix;
use crate::error::{FlowDataError, Result};
use crate::rng::SimpleRng;

/// Per-column centering statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Centering {
    #[default]
    Mean,
    Min,
}

/// Per-column scaling factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scaling {
    /// Standard deviation.
    #[default]
    Auto,
    /// Square root of the standard deviation.
    Pareto,
    /// Variance over mean.
    Vast,
    /// Max minus min.
    Range,
    /// Mean.
    Level,
    /// Max.
    Max,
}

fn columns(x: &Matrix) -> impl Iterator<Item = Vec<f64>> + '_ {
    (0..x.cols()).map(move |j| (0..x.rows()).map(|i| x.get(i, j)).collect())
}

fn mean(col: &[f64]) -> f64 {
    col.iter().sum::<f64>() / col.len() as f64
}

/// Population standard deviation.
fn std_dev(col: &[f64]) -> f64 {
    let mu = mean(col);
    (col.iter().map(|v| (v - mu).powi(2)).sum::<f64>() / col.len() as f64).sqrt()
}

fn min(col: &[f64]) -> f64 {
    col.iter().copied().fold(f64::INFINITY, f64::min)
}

fn max(col: &[f64]) -> f64 {
    col.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

fn require_rows(x: &Matrix) -> Result<()> {
    if x.rows() == 0 {
        return Err(FlowDataError::Empty("matrix has no rows"));
    }
    Ok(())
}

/// Centering vector, one entry per column.
pub fn center(x: &Matrix, method: Centering) -> Result<Vec<f64>> {
    require_rows(x)?;
    Ok(columns(x)
        .map(|col| match method {
            Centering::Mean => mean(&col),
            Centering::Min => min(&col),
        })
        .collect())
}

/// Scaling vector, one entry per column. Zero factors become 1.
pub fn scale(x: &Matrix, method: Scaling) -> Result<Vec<f64>> {
    require_rows(x)?;
    Ok(columns(x)
        .map(|col| {
            let factor = match method {
                Scaling::Auto => std_dev(&col),
                Scaling::Pareto => std_dev(&col).sqrt(),
                Scaling::Vast => std_dev(&col).powi(2) / mean(&col),
                Scaling::Range => max(&col) - min(&col),
                Scaling::Level => mean(&col),
                Scaling::Max => max(&col),
            };
            if factor == 0.0 || !factor.is_finite() {
                1.0
            } else {
                factor
            }
        })
        .collect())
}

fn check_len(x: &Matrix, v: &[f64]) -> Result<()> {
    if v.len() != x.cols() {
        return Err(FlowDataError::DimensionMismatch {
            expected: (1, x.cols()),
            got: (1, v.len()),
        });
    }
    Ok(())
}

/// `(x - mu) / sigma`, column-wise.
pub fn center_scale(x: &Matrix, mu: &[f64], sigma: &[f64]) -> Result<Matrix> {
    check_len(x, mu)?;
    check_len(x, sigma)?;
    let mut out = x.clone();
    for i in 0..x.rows() {
        for j in 0..x.cols() {
            out.set(i, j, (x.get(i, j) - mu[j]) / sigma[j]);
        }
    }
    Ok(out)
}

/// Inverse of [`center_scale`].
pub fn unscale(x: &Matrix, mu: &[f64], sigma: &[f64]) -> Result<Matrix> {
    check_len(x, mu)?;
    check_len(x, sigma)?;
    let mut out = x.clone();
    for i in 0..x.rows() {
        for j in 0..x.cols() {
            out.set(i, j, x.get(i, j) * sigma[j] + mu[j]);
        }
    }
    Ok(out)
}

/// One-hot encode cluster indices into an n×k matrix, `k = max(idx) + 1`.
pub fn one_hot(idx: &[usize]) -> Result<Matrix> {
    let k = idx
        .iter()
        .max()
        .map(|m| m + 1)
        .ok_or(FlowDataError::Empty("no cluster indices"))?;
    let mut out = Matrix::zeros(idx.len(), k);
    for (i, &c) in idx.iter().enumerate() {
        out.set(i, c, 1.0);
    }
    Ok(out)
}

/// Shuffled train/test row indices.
///
/// The test set gets `round(n * test_fraction)` rows, at least one and at most
/// `n - 1`, so neither side is empty.
pub fn train_test_split(
    n: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>)> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(FlowDataError::InvalidSetting {
            name: "test_fraction",
            reason: format!("must be in (0, 1), got {test_fraction}"),
        });
    }
    if n < 2 {
        return Err(FlowDataError::Empty("need at least two observations to split"));
    }
    let n_test = ((n as f64 * test_fraction).round() as usize).clamp(1, n - 1);

    let mut order: Vec<usize> = (0..n).collect();
    SimpleRng::new(seed).shuffle(&mut order);
    let train = order.split_off(n_test);
    Ok((train, order))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Matrix {
        Matrix::from_rows(vec![
            vec![300.0, 0.0, 5.0],
            vec![900.0, 0.1, 5.0],
            vec![1500.0, 0.2, 5.0],
            vec![2100.0, 0.5, 5.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_auto_scaled_columns_are_standardised() {
        let x = sample();
        let mu = center(&x, Centering::Mean).unwrap();
        let sigma = scale(&x, Scaling::Auto).unwrap();
        let z = center_scale(&x, &mu, &sigma).unwrap();

        for j in 0..2 {
            let col = z.column(j).unwrap();
            assert!(mean(&col).abs() < 1e-12);
            assert!((std_dev(&col) - 1.0).abs() < 1e-12);
        }
        // Constant column: scale factor replaced by 1, centred to zero.
        assert_eq!(sigma[2], 1.0);
        assert!(z.column(2).unwrap().iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_min_range_maps_to_unit_interval() {
        let x = sample();
        let mu = center(&x, Centering::Min).unwrap();
        let sigma = scale(&x, Scaling::Range).unwrap();
        let z = center_scale(&x, &mu, &sigma).unwrap();
        let expected = [0.0, 1.0 / 3.0, 2.0 / 3.0, 1.0];
        for (got, want) in z.column(0).unwrap().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_unscale_inverts() {
        let x = sample();
        let mu = center(&x, Centering::Mean).unwrap();
        let sigma = scale(&x, Scaling::Pareto).unwrap();
        let back = unscale(&center_scale(&x, &mu, &sigma).unwrap(), &mu, &sigma).unwrap();
        for (a, b) in back.as_slice().iter().zip(x.as_slice()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn test_length_mismatch() {
        let x = sample();
        assert!(center_scale(&x, &[0.0], &[1.0, 1.0, 1.0]).is_err());
        assert!(center(&Matrix::zeros(0, 3), Centering::Mean).is_err());
    }

    #[test]
    fn test_one_hot() {
        let m = one_hot(&[0, 2, 1, 2]).unwrap();
        assert_eq!(m.shape(), (4, 3));
        assert_eq!(m.row(1), &[0.0, 0.0, 1.0]);
        assert!(one_hot(&[]).is_err());
    }

    #[test]
    fn test_train_test_split() {
        let (train, test) = train_test_split(10, 0.3, 1).unwrap();
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 7);
        let mut all: Vec<usize> = train.iter().chain(&test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());

        assert_eq!(train_test_split(10, 0.3, 1).unwrap(), (train, test));
        assert!(train_test_split(10, 1.0, 1).is_err());
        assert!(train_test_split(1, 0.5, 1).is_err());
    }
}
