use thiserror::Error;

/// Errors raised by the numeric layer (matrices, preprocessing, kernels).
///
/// File I/O and parsing go through `anyhow` in the loader; these variants are
/// the invariants a caller can violate with an in-memory value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowDataError {
    #[error("dimension mismatch: expected {expected:?}, got {got:?}")]
    DimensionMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },

    #[error("buffer holds {got} values, a {rows}×{cols} matrix needs {}", .rows * .cols)]
    BufferLength { rows: usize, cols: usize, got: usize },

    #[error("row {row} has {got} values, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("column {column} out of bounds for matrix with {cols} columns")]
    ColumnOutOfBounds { column: usize, cols: usize },

    #[error("invalid setting '{name}': {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("empty input: {0}")]
    Empty(&'static str),
}

pub type Result<T> = std::result::Result<T, FlowDataError>;
