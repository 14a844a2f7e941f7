use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use log::info;
use parquet::arrow::ArrowWriter;

use super::model::Matrix;

/// Write a matrix as headerless comma-separated rows.
pub fn write_matrix_csv(path: &Path, matrix: &Matrix) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;

    for row in matrix.iter_rows() {
        writer
            .write_record(row.iter().map(|v| v.to_string()))
            .with_context(|| format!("writing {}", path.display()))?;
    }
    writer.flush()?;

    info!("wrote {} to {}", matrix, path.display());
    Ok(())
}

/// Write a matrix to Parquet, one Float64 column per matrix column.
///
/// Column names default to `c0`, `c1`, ... unless `names` supplies them.
pub fn write_matrix_parquet(path: &Path, matrix: &Matrix, names: Option<&[String]>) -> Result<()> {
    let fields: Vec<Field> = (0..matrix.cols())
        .map(|j| {
            let name = names
                .and_then(|n| n.get(j).cloned())
                .unwrap_or_else(|| format!("c{j}"));
            Field::new(name, DataType::Float64, false)
        })
        .collect();
    let schema = Arc::new(Schema::new(fields));

    let columns = (0..matrix.cols())
        .map(|j| -> Result<ArrayRef> {
            let array: ArrayRef = Arc::new(Float64Array::from(matrix.column(j)?));
            Ok(array)
        })
        .collect::<Result<Vec<ArrayRef>>>()?;

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;

    info!("wrote {} to {}", matrix, path.display());
    Ok(())
}
