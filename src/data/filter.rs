use serde::{Deserialize, Serialize};

use super::model::Matrix;

// ---------------------------------------------------------------------------
// Row predicate: inclusive value range on one column
// ---------------------------------------------------------------------------

/// Keep rows whose value in `column` lies in `[min, max]`.
/// A missing bound is open on that side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowFilter {
    pub column: usize,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl RowFilter {
    pub fn new(column: usize, min: Option<f64>, max: Option<f64>) -> Self {
        RowFilter { column, min, max }
    }

    fn accepts(&self, value: f64) -> bool {
        self.min.map_or(true, |lo| value >= lo) && self.max.map_or(true, |hi| value <= hi)
    }
}

/// Return indices of rows that pass all filters.
///
/// A row passes a filter when:
/// * The filter's column exists and the value is inside its range → passes
/// * The filter's column does not exist in the matrix → fails
/// * The value is NaN → fails (comparisons are false)
pub fn filtered_indices(matrix: &Matrix, filters: &[RowFilter]) -> Vec<usize> {
    matrix
        .iter_rows()
        .enumerate()
        .filter(|(_, row)| {
            filters.iter().all(|f| match row.get(f.column) {
                Some(&value) => f.accepts(value),
                None => false,
            })
        })
        .map(|(i, _)| i)
        .collect()
}

/// Convenience: the sub-matrix of rows passing all filters.
pub fn select(matrix: &Matrix, filters: &[RowFilter]) -> Matrix {
    matrix.take_rows(&filtered_indices(matrix, filters))
}
