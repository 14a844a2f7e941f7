//! Generators for the toy clustering shapes in `dummy_data/`.
//!
//! Every generator is deterministic in its seed and returns the 2-D points
//! together with the ground-truth cluster index of each point, shuffled.

use std::f64::consts::PI;

use crate::data::model::Matrix;
use crate::error::{FlowDataError, Result};
use crate::rng::SimpleRng;

/// Half-width of the box blob centres are drawn from.
const CENTER_BOX: f64 = 10.0;

fn linspace(start: f64, stop: f64, n: usize, endpoint: bool) -> Vec<f64> {
    let steps = if endpoint { n.saturating_sub(1) } else { n };
    if steps == 0 {
        return vec![start; n];
    }
    let step = (stop - start) / steps as f64;
    (0..n).map(|i| start + step * i as f64).collect()
}

/// Add noise, shuffle rows together with labels and pack into a matrix.
fn finish(
    mut points: Vec<[f64; 2]>,
    mut labels: Vec<usize>,
    noise: f64,
    rng: &mut SimpleRng,
) -> Result<(Matrix, Vec<usize>)> {
    if noise > 0.0 {
        for p in &mut points {
            p[0] += rng.gauss(0.0, noise);
            p[1] += rng.gauss(0.0, noise);
        }
    }
    let mut order: Vec<usize> = (0..points.len()).collect();
    rng.shuffle(&mut order);
    labels = order.iter().map(|&i| labels[i]).collect();
    let data = order.iter().flat_map(|&i| points[i]).collect();
    Ok((Matrix::new(order.len(), 2, data)?, labels))
}

fn require_samples(n: usize) -> Result<()> {
    if n == 0 {
        return Err(FlowDataError::Empty("n_samples must be positive"));
    }
    Ok(())
}

/// Isotropic Gaussian blobs around `centers` random centres.
///
/// Samples are spread as evenly as possible; earlier blobs get the remainder.
pub fn make_blobs(
    n_samples: usize,
    centers: usize,
    cluster_std: f64,
    seed: u64,
) -> Result<(Matrix, Vec<usize>)> {
    require_samples(n_samples)?;
    if centers == 0 {
        return Err(FlowDataError::InvalidSetting {
            name: "centers",
            reason: "must be positive".to_string(),
        });
    }
    let mut rng = SimpleRng::new(seed);
    let centres: Vec<[f64; 2]> = (0..centers)
        .map(|_| {
            [
                rng.next_f64() * 2.0 * CENTER_BOX - CENTER_BOX,
                rng.next_f64() * 2.0 * CENTER_BOX - CENTER_BOX,
            ]
        })
        .collect();

    let mut points = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for (c, centre) in centres.iter().enumerate() {
        let count = n_samples / centers + usize::from(c < n_samples % centers);
        for _ in 0..count {
            points.push(*centre);
            labels.push(c);
        }
    }
    finish(points, labels, cluster_std, &mut rng)
}

/// Two interleaving half circles.
pub fn make_moons(n_samples: usize, noise: f64, seed: u64) -> Result<(Matrix, Vec<usize>)> {
    require_samples(n_samples)?;
    let n_out = n_samples / 2;
    let n_in = n_samples - n_out;

    let mut points = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for t in linspace(0.0, PI, n_out, true) {
        points.push([t.cos(), t.sin()]);
        labels.push(0);
    }
    for t in linspace(0.0, PI, n_in, true) {
        points.push([1.0 - t.cos(), 1.0 - t.sin() - 0.5]);
        labels.push(1);
    }
    finish(points, labels, noise, &mut SimpleRng::new(seed))
}

/// A large circle containing a smaller one scaled by `factor`.
pub fn make_circles(
    n_samples: usize,
    noise: f64,
    factor: f64,
    seed: u64,
) -> Result<(Matrix, Vec<usize>)> {
    require_samples(n_samples)?;
    if !(factor > 0.0 && factor < 1.0) {
        return Err(FlowDataError::InvalidSetting {
            name: "factor",
            reason: format!("must be in (0, 1), got {factor}"),
        });
    }
    let n_out = n_samples / 2;
    let n_in = n_samples - n_out;

    let mut points = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for t in linspace(0.0, 2.0 * PI, n_out, false) {
        points.push([t.cos(), t.sin()]);
        labels.push(0);
    }
    for t in linspace(0.0, 2.0 * PI, n_in, false) {
        points.push([factor * t.cos(), factor * t.sin()]);
        labels.push(1);
    }
    finish(points, labels, noise, &mut SimpleRng::new(seed))
}
