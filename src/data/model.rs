use std::fmt;

use serde::Serialize;

use crate::error::{FlowDataError, Result};

// ---------------------------------------------------------------------------
// Matrix – dense row-major block of f64
// ---------------------------------------------------------------------------

/// A dense row-major matrix, one observation per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Wrap a row-major buffer. Fails if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(FlowDataError::BufferLength {
                rows,
                cols,
                got: data.len(),
            });
        }
        Ok(Matrix { rows, cols, data })
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from a list of rows. Every row must have the length of the first.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let n = rows.len();
        let mut data = Vec::with_capacity(n * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(FlowDataError::RaggedRow {
                    row: i,
                    expected: cols,
                    got: row.len(),
                });
            }
            data.extend(row);
        }
        Ok(Matrix {
            rows: n,
            cols,
            data,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        self.data[i * self.cols + j] = value;
    }

    /// Copy of column `j`.
    pub fn column(&self, j: usize) -> Result<Vec<f64>> {
        if j >= self.cols {
            return Err(FlowDataError::ColumnOutOfBounds {
                column: j,
                cols: self.cols,
            });
        }
        Ok((0..self.rows).map(|i| self.get(i, j)).collect())
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        // chunks_exact(0) panics, so a column-less matrix yields no rows.
        self.data.chunks_exact(self.cols.max(1)).take(self.rows)
    }

    /// New matrix holding the given rows, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Matrix {
            rows: indices.len(),
            cols: self.cols,
            data,
        }
    }

    /// First `n` rows (all rows if `n` exceeds the row count).
    pub fn head(&self, n: usize) -> Matrix {
        let n = n.min(self.rows);
        Matrix {
            rows: n,
            cols: self.cols,
            data: self.data[..n * self.cols].to_vec(),
        }
    }

    pub fn transpose(&self) -> Matrix {
        let mut out = Matrix::zeros(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out.set(j, i, self.get(i, j));
            }
        }
        out
    }

    /// Whether every entry is neither NaN nor infinite.
    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{} matrix", self.rows, self.cols)
    }
}

// ---------------------------------------------------------------------------
// ColumnLabels – names aligned with state-matrix columns
// ---------------------------------------------------------------------------

/// Ordered column names, aligned positionally with a matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnLabels(Vec<String>);

impl ColumnLabels {
    pub fn new(names: Vec<String>) -> Self {
        ColumnLabels(names)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<&str> {
        self.0.get(i).map(String::as_str)
    }

    /// Index of `name`, compared case-insensitively.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|n| n.eq_ignore_ascii_case(name))
    }

    /// Whether the first label names the temperature column.
    pub fn denotes_temperature(&self) -> bool {
        self.0.first().is_some_and(|first| {
            let first = first.trim();
            ["t", "temp", "temperature"]
                .iter()
                .any(|alias| first.eq_ignore_ascii_case(alias))
        })
    }
}

// ---------------------------------------------------------------------------
// FluidVariable – fixed column order of fluid_var.csv
// ---------------------------------------------------------------------------

/// Columns of the fluid-dynamics matrix, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FluidVariable {
    Ux,
    Uy,
    Uz,
    Epsilon,
    K,
    Nut,
    P,
}

impl FluidVariable {
    pub const ALL: [FluidVariable; 7] = [
        FluidVariable::Ux,
        FluidVariable::Uy,
        FluidVariable::Uz,
        FluidVariable::Epsilon,
        FluidVariable::K,
        FluidVariable::Nut,
        FluidVariable::P,
    ];

    pub fn column(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            FluidVariable::Ux => "Ux",
            FluidVariable::Uy => "Uy",
            FluidVariable::Uz => "Uz",
            FluidVariable::Epsilon => "epsilon",
            FluidVariable::K => "k",
            FluidVariable::Nut => "nut",
            FluidVariable::P => "P",
        }
    }
}

impl fmt::Display for FluidVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

// ---------------------------------------------------------------------------
// ReactiveFlow – the complete reactive_flow/ folder
// ---------------------------------------------------------------------------

/// Thermochemical state plus its companions from `reactive_flow/`.
#[derive(Debug, Clone)]
pub struct ReactiveFlow {
    /// flameD: temperature in column 0, species after it.
    pub state: Matrix,
    pub labels: ColumnLabels,
    /// Grid coordinates, one row per state row.
    pub mesh: Option<Matrix>,
    /// Ux, Uy, Uz, epsilon, k, nut, P.
    pub fluid: Option<Matrix>,
}

impl ReactiveFlow {
    pub fn len(&self) -> usize {
        self.state.rows()
    }

    pub fn is_empty(&self) -> bool {
        self.state.rows() == 0
    }

    pub fn temperature(&self) -> Result<Vec<f64>> {
        self.state.column(0)
    }

    /// State column whose label matches `name`.
    pub fn species(&self, name: &str) -> Option<Vec<f64>> {
        let j = self.labels.position(name)?;
        self.state.column(j).ok()
    }

    pub fn fluid_variable(&self, var: FluidVariable) -> Option<Vec<f64>> {
        self.fluid.as_ref()?.column(var.column()).ok()
    }
}

// ---------------------------------------------------------------------------
// DummyDataset – one low-dimensional toy file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DummyKind {
    Blobs,
    Moons,
    Circles,
    Other,
}

impl DummyKind {
    /// Guess the shape from a file stem such as `moons` or `dummy_blobs_2d`.
    pub fn from_stem(stem: &str) -> Self {
        let stem = stem.to_ascii_lowercase();
        if stem.contains("blob") {
            DummyKind::Blobs
        } else if stem.contains("moon") {
            DummyKind::Moons
        } else if stem.contains("circle") {
            DummyKind::Circles
        } else {
            DummyKind::Other
        }
    }
}

/// A synthetic clustering dataset loaded from `dummy_data/`.
#[derive(Debug, Clone)]
pub struct DummyDataset {
    pub name: String,
    pub kind: DummyKind,
    pub points: Matrix,
}

impl DummyDataset {
    /// Split off the last column as integer cluster labels.
    ///
    /// Returns `None` when the last column holds anything but non-negative
    /// whole numbers, or when there is only one column.
    pub fn split_labels(&self) -> Option<(Matrix, Vec<usize>)> {
        let (rows, cols) = self.points.shape();
        if cols < 2 {
            return None;
        }
        let last = self.points.column(cols - 1).ok()?;
        if !last.iter().all(|v| *v >= 0.0 && v.fract() == 0.0) {
            return None;
        }
        let mut data = Vec::with_capacity(rows * (cols - 1));
        for row in self.points.iter_rows() {
            data.extend_from_slice(&row[..cols - 1]);
        }
        let features = Matrix::new(rows, cols - 1, data).ok()?;
        Some((features, last.into_iter().map(|v| v as usize).collect()))
    }
}
