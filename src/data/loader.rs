use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use log::{debug, info, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{ColumnLabels, DummyDataset, DummyKind, Matrix, ReactiveFlow};
use super::schema::ReactiveFlowSchema;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Extensions `load_matrix` understands.
pub const MATRIX_EXTENSIONS: [&str; 6] = ["csv", "txt", "dat", "json", "parquet", "pq"];

/// Load a numeric matrix from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` / `.dat` – comma-separated rows, optional header row
/// * `.json`    – `[[1.0, 2.0], [3.0, 4.0], ...]`
/// * `.parquet` – one numeric column per matrix column
pub fn load_matrix(path: &Path) -> Result<Matrix> {
    let ext = extension(path);
    let matrix = match ext.as_str() {
        "csv" | "txt" | "dat" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    debug!("{}: {}", path.display(), matrix);
    Ok(matrix)
}

/// Load column names: one per line, or all on a single line.
pub fn load_labels(path: &Path) -> Result<ColumnLabels> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let mut names = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("{} row {row_no}", path.display()))?;
        names.extend(record.iter().filter(|f| !f.is_empty()).map(str::to_string));
    }
    Ok(ColumnLabels::new(names))
}

/// Load the `reactive_flow/` folder. `mesh` and `fluid_var` may be absent.
pub fn load_reactive_flow(dir: &Path, schema: &ReactiveFlowSchema) -> Result<ReactiveFlow> {
    let state = load_matrix(&dir.join(&schema.state.file_name))?;
    let labels = load_labels(&dir.join(&schema.labels.file_name))?;
    let mesh = load_optional(&dir.join(&schema.mesh.file_name))?;
    let fluid = load_optional(&dir.join(&schema.fluid.file_name))?;

    info!(
        "reactive flow loaded from {}: state {}, {} labels",
        dir.display(),
        state,
        labels.len()
    );
    Ok(ReactiveFlow {
        state,
        labels,
        mesh,
        fluid,
    })
}

/// Load every matrix file in `dummy_data/`, sorted by file name.
pub fn load_dummy_dir(dir: &Path) -> Result<Vec<DummyDataset>> {
    let mut out = Vec::new();
    for path in matrix_files(dir)? {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();
        let points = load_matrix(&path)?;
        out.push(DummyDataset {
            kind: DummyKind::from_stem(&name),
            name,
            points,
        });
    }
    info!("{} dummy datasets loaded from {}", out.len(), dir.display());
    Ok(out)
}

/// Files in `dir` with a matrix extension, sorted by name.
pub fn matrix_files(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && MATRIX_EXTENSIONS.contains(&extension(&path).as_str()) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn load_optional(path: &Path) -> Result<Option<Matrix>> {
    if !path.exists() {
        warn!("{} not found, skipping", path.display());
        return Ok(None);
    }
    load_matrix(path).map(Some)
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase()
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: row-major numbers, no header convention.
/// The first non-empty record is taken as a header and skipped only when none
/// of its fields is a number; a partly numeric first record is data.
fn load_csv(path: &Path) -> Result<Matrix> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context("opening CSV")?;

    let mut rows: Vec<Vec<f64>> = Vec::new();
    let mut seen_record = false;

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let first_record = !seen_record;
        seen_record = true;
        if first_record && record.iter().all(|f| f.parse::<f64>().is_err()) {
            warn!(
                "{}: row {row_no} has no numeric field, skipping it as a header",
                path.display()
            );
            continue;
        }

        let row = record
            .iter()
            .enumerate()
            .map(|(j, tok)| {
                tok.parse::<f64>()
                    .with_context(|| format!("Row {row_no}, column {j}: '{tok}' is not a number"))
            })
            .collect::<Result<Vec<f64>>>()?;

        if let Some(first) = rows.first() {
            if first.len() != row.len() {
                bail!(
                    "CSV row {row_no}: {} values but earlier rows have {}",
                    row.len(),
                    first.len()
                );
            }
        }
        rows.push(row);
    }

    Ok(Matrix::from_rows(rows)?)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema: an array of equal-length numeric arrays.
///
/// ```json
/// [[300.0, 0.1, 0.0], [301.5, 0.1, 0.0]]
/// ```
fn load_json(path: &Path) -> Result<Matrix> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let rows = records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let arr = rec
                .as_array()
                .with_context(|| format!("Row {i} is not a JSON array"))?;
            arr.iter()
                .enumerate()
                .map(|(j, v)| {
                    v.as_f64()
                        .with_context(|| format!("Row {i}, column {j}: not a number"))
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    Ok(Matrix::from_rows(rows)?)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file whose columns are all numeric.
///
/// Float64, Float32, Int32 and Int64 columns are accepted; nulls become NaN.
/// Column order in the schema is the matrix column order.
fn load_parquet(path: &Path) -> Result<Matrix> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows: Vec<Vec<f64>> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = batch
            .columns()
            .iter()
            .zip(batch.schema().fields().iter())
            .map(|(col, field)| {
                column_to_f64(col).with_context(|| format!("column '{}'", field.name()))
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        for row in 0..batch.num_rows() {
            rows.push(columns.iter().map(|c| c[row]).collect());
        }
    }

    Ok(Matrix::from_rows(rows)?)
}

// -- Parquet / Arrow helpers --

fn column_to_f64(col: &Arc<dyn Array>) -> Result<Vec<f64>> {
    let any = col.as_any();
    let values = match col.data_type() {
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .context("expected Float64Array")?
            .iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect(),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .context("expected Float32Array")?
            .iter()
            .map(|v| v.map_or(f64::NAN, f64::from))
            .collect(),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .iter()
            .map(|v| v.map_or(f64::NAN, f64::from))
            .collect(),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .iter()
            .map(|v| v.map_or(f64::NAN, |i| i as f64))
            .collect(),
        other => bail!("Expected a numeric column, got {other:?}"),
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_csv_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        fs::write(&path, "1.0,2.0,3.0\n4.0, 5.0 ,6e-1\n").unwrap();

        let m = load_matrix(&path).unwrap();
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.row(1), &[4.0, 5.0, 0.6]);
    }

    #[test]
    fn test_csv_header_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        fs::write(&path, "x,y\n1,2\n3,4\n").unwrap();

        let m = load_matrix(&path).unwrap();
        assert_eq!(m.shape(), (2, 2));
    }

    #[test]
    fn test_csv_malformed_first_row_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        fs::write(&path, "1.0.0,2\n1,2\n").unwrap();

        let err = format!("{:#}", load_matrix(&path).unwrap_err());
        assert!(err.contains("'1.0.0' is not a number"), "{err}");
    }

    #[test]
    fn test_csv_header_after_blank_line_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        fs::write(&path, "  \nx,y\n1,2\n").unwrap();

        let m = load_matrix(&path).unwrap();
        assert_eq!(m.shape(), (1, 2));
        assert_eq!(m.row(0), &[1.0, 2.0]);
    }

    #[test]
    fn test_csv_ragged_row_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        fs::write(&path, "1,2\n3\n").unwrap();

        let err = format!("{:#}", load_matrix(&path).unwrap_err());
        assert!(err.contains("row 1"), "{err}");
    }

    #[test]
    fn test_csv_non_numeric_body_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.csv");
        fs::write(&path, "1,2\n3,abc\n").unwrap();

        let err = format!("{:#}", load_matrix(&path).unwrap_err());
        assert!(err.contains("'abc' is not a number"), "{err}");
    }

    #[test]
    fn test_json_matrix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        fs::write(&path, "[[1, 2.5], [3, 4]]").unwrap();

        let m = load_matrix(&path).unwrap();
        assert_eq!(m.as_slice(), &[1.0, 2.5, 3.0, 4.0]);
    }

    #[test]
    fn test_unsupported_extension() {
        assert!(load_matrix(Path::new("data.xlsx")).is_err());
    }

    #[test]
    fn test_labels_one_per_line_or_single_row() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        fs::write(&a, "T\nH2\nO2\n").unwrap();
        fs::write(&b, "T, H2, O2\n").unwrap();

        let la = load_labels(&a).unwrap();
        let lb = load_labels(&b).unwrap();
        assert_eq!(la, lb);
        assert_eq!(la.len(), 3);
    }

    #[test]
    fn test_reactive_flow_optional_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("flameD.csv"), "300,0.1\n310,0.2\n").unwrap();
        fs::write(dir.path().join("labels.csv"), "T\nCH4\n").unwrap();

        let flow = load_reactive_flow(dir.path(), &ReactiveFlowSchema::default()).unwrap();
        assert_eq!(flow.len(), 2);
        assert!(flow.mesh.is_none());
        assert!(flow.fluid.is_none());
    }

    #[test]
    fn test_dummy_dir_sorted_with_kinds() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("moons.csv"), "0,1\n1,0\n").unwrap();
        fs::write(dir.path().join("blobs.csv"), "0,1\n").unwrap();
        fs::write(dir.path().join("README.md"), "not data").unwrap();

        let sets = load_dummy_dir(dir.path()).unwrap();
        let names: Vec<_> = sets.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["blobs", "moons"]);
        assert_eq!(sets[1].kind, DummyKind::Moons);
    }
}
