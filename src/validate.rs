//! Shape-contract checks for the fixture folders.
//!
//! Validation collects every finding instead of stopping at the first one:
//! a file that cannot be loaded yields a failed check and the checks that
//! depend on it are recorded as skipped.

use std::fmt;
use std::path::Path;

use log::{debug, warn};
use serde::Serialize;

use crate::data::loader::{load_labels, load_matrix, matrix_files};
use crate::data::model::{ColumnLabels, DummyKind, Matrix};
use crate::data::schema::{DUMMY_KINDS, FileSchema, ReactiveFlowSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    /// Suspicious but does not break the contract.
    Warn,
    Fail,
    /// A prerequisite failed, so the check could not run.
    Skip,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Pass => "PASS",
            Status::Warn => "WARN",
            Status::Fail => "FAIL",
            Status::Skip => "SKIP",
        })
    }
}

/// One finding about one file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Check {
    pub file: String,
    pub name: &'static str,
    pub status: Status,
    pub detail: String,
}

/// Every check run against a folder, in execution order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub checks: Vec<Check>,
}

impl ValidationReport {
    fn record(&mut self, file: &str, name: &'static str, status: Status, detail: String) {
        match status {
            Status::Fail => warn!("{file}: {name} failed: {detail}"),
            _ => debug!("{file}: {name} {status}: {detail}"),
        }
        self.checks.push(Check {
            file: file.to_string(),
            name,
            status,
            detail,
        });
    }

    fn expect_eq(&mut self, file: &str, name: &'static str, what: &str, got: usize, want: usize) {
        let status = if got == want { Status::Pass } else { Status::Fail };
        self.record(file, name, status, format!("{got} {what}, expected {want}"));
    }

    /// No check failed.
    pub fn is_ok(&self) -> bool {
        !self.checks.iter().any(|c| c.status == Status::Fail)
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|c| c.status == Status::Fail)
    }

    pub fn find(&self, file: &str, name: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.file == file && c.name == name)
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.checks.extend(other.checks);
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.checks.iter().map(|c| c.file.len()).max().unwrap_or(0);
        for c in &self.checks {
            writeln!(
                f,
                "{}  {:<width$}  {:<12}  {}",
                c.status, c.file, c.name, c.detail
            )?;
        }
        let failed = self.failures().count();
        write!(f, "{} checks, {failed} failed", self.checks.len())
    }
}

// ---------------------------------------------------------------------------
// reactive_flow/
// ---------------------------------------------------------------------------

/// Load `schema` from `dir`, recording presence and parse checks.
fn load_checked(report: &mut ValidationReport, dir: &Path, schema: &FileSchema) -> Option<Matrix> {
    let file = schema.file_name.as_str();
    let path = dir.join(file);
    if !path.is_file() {
        report.record(file, "present", Status::Fail, format!("{} not found", path.display()));
        return None;
    }
    report.record(file, "present", Status::Pass, path.display().to_string());

    match load_matrix(&path) {
        Ok(m) => {
            report.record(file, "numeric", Status::Pass, m.to_string());
            Some(m)
        }
        Err(e) => {
            report.record(file, "numeric", Status::Fail, format!("{e:#}"));
            None
        }
    }
}

fn check_shape(report: &mut ValidationReport, schema: &FileSchema, m: &Matrix) {
    let file = schema.file_name.as_str();
    if let Some(rows) = schema.rows {
        report.expect_eq(file, "rows", "rows", m.rows(), rows);
    }
    if let Some(cols) = schema.cols {
        report.expect_eq(file, "cols", "columns", m.cols(), cols);
    }
    record_finite(report, file, m);
}

fn record_finite(report: &mut ValidationReport, file: &str, m: &Matrix) {
    if m.is_finite() {
        report.record(file, "finite", Status::Pass, "no NaN or infinite values".into());
    } else {
        let bad = m.as_slice().iter().filter(|v| !v.is_finite()).count();
        report.record(file, "finite", Status::Fail, format!("{bad} non-finite values"));
    }
}

/// Row alignment of `other` with the state matrix.
fn check_aligned(
    report: &mut ValidationReport,
    file: &str,
    state: Option<&Matrix>,
    other: Option<&Matrix>,
    state_name: &str,
) {
    match (state, other) {
        (Some(s), Some(o)) => {
            let status = if o.rows() == s.rows() {
                Status::Pass
            } else {
                Status::Fail
            };
            let detail = format!("{} rows, {state_name} has {}", o.rows(), s.rows());
            report.record(file, "row-aligned", status, detail);
        }
        _ => report.record(
            file,
            "row-aligned",
            Status::Skip,
            format!("{file} or {state_name} unavailable"),
        ),
    }
}

fn check_labels(
    report: &mut ValidationReport,
    schema: &ReactiveFlowSchema,
    labels: Option<&ColumnLabels>,
    state: Option<&Matrix>,
) {
    let file = schema.labels.file_name.as_str();
    let Some(labels) = labels else {
        for name in ["entries", "col-aligned", "temperature"] {
            report.record(file, name, Status::Skip, "labels unavailable".into());
        }
        return;
    };

    if let Some(want) = schema.labels.entries {
        report.expect_eq(file, "entries", "entries", labels.len(), want);
    }

    match state {
        Some(s) => {
            let status = if labels.len() == s.cols() {
                Status::Pass
            } else {
                Status::Fail
            };
            let detail = format!(
                "{} entries, {} has {} columns",
                labels.len(),
                schema.state.file_name,
                s.cols()
            );
            report.record(file, "col-aligned", status, detail);
        }
        None => report.record(
            file,
            "col-aligned",
            Status::Skip,
            format!("{} unavailable", schema.state.file_name),
        ),
    }

    let first = labels.get(0).unwrap_or("<none>");
    let status = if labels.denotes_temperature() {
        Status::Pass
    } else {
        Status::Fail
    };
    report.record(file, "temperature", status, format!("first entry is '{first}'"));
}

/// Check `dir` against the reactive-flow contract.
pub fn validate_reactive_flow(dir: &Path, schema: &ReactiveFlowSchema) -> ValidationReport {
    let mut report = ValidationReport::default();

    let state = load_checked(&mut report, dir, &schema.state);
    if let Some(s) = &state {
        check_shape(&mut report, &schema.state, s);
    }

    let labels_path = dir.join(&schema.labels.file_name);
    let labels = if labels_path.is_file() {
        report.record(
            &schema.labels.file_name,
            "present",
            Status::Pass,
            labels_path.display().to_string(),
        );
        match load_labels(&labels_path) {
            Ok(l) => Some(l),
            Err(e) => {
                report.record(&schema.labels.file_name, "readable", Status::Fail, format!("{e:#}"));
                None
            }
        }
    } else {
        report.record(
            &schema.labels.file_name,
            "present",
            Status::Fail,
            format!("{} not found", labels_path.display()),
        );
        None
    };
    check_labels(&mut report, schema, labels.as_ref(), state.as_ref());

    for file_schema in [&schema.mesh, &schema.fluid] {
        let m = load_checked(&mut report, dir, file_schema);
        if let Some(m) = &m {
            check_shape(&mut report, file_schema, m);
        }
        check_aligned(
            &mut report,
            &file_schema.file_name,
            state.as_ref(),
            m.as_ref(),
            &schema.state.file_name,
        );
    }

    report
}

// ---------------------------------------------------------------------------
// dummy_data/
// ---------------------------------------------------------------------------

/// Check that every file in `dir` is a numeric matrix with consistent columns.
pub fn validate_dummy_dir(dir: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();
    let folder = dir.display().to_string();

    let files = match matrix_files(dir) {
        Ok(files) => files,
        Err(e) => {
            report.record(&folder, "present", Status::Fail, format!("{e:#}"));
            return report;
        }
    };
    if files.is_empty() {
        report.record(&folder, "present", Status::Fail, "no data files".into());
        return report;
    }
    report.record(&folder, "present", Status::Pass, format!("{} data files", files.len()));

    let mut kinds = Vec::new();
    for path in &files {
        let file = path
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or_default()
            .to_string();
        match load_matrix(path) {
            Ok(m) if m.is_empty() => {
                report.record(&file, "numeric", Status::Fail, "no values".into());
            }
            Ok(m) => {
                report.record(&file, "numeric", Status::Pass, format!("{m}, consistent columns"));
                record_finite(&mut report, &file, &m);
                let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
                kinds.push(DummyKind::from_stem(stem));
            }
            Err(e) => report.record(&file, "numeric", Status::Fail, format!("{e:#}")),
        }
    }

    for kind in DUMMY_KINDS {
        if kinds.contains(&kind) {
            report.record(&folder, "shapes", Status::Pass, format!("{kind:?} present"));
        } else {
            report.record(&folder, "shapes", Status::Warn, format!("no {kind:?} file"));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn rows(n: usize, cols: usize, first: f64) -> String {
        (0..n)
            .map(|i| {
                let mut row = vec![(first + i as f64).to_string()];
                row.extend((1..cols).map(|j| format!("{}", j as f64 * 0.01)));
                row.join(",")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn small_schema() -> ReactiveFlowSchema {
        let mut schema = ReactiveFlowSchema::default().with_rows(4);
        schema.state.cols = Some(3);
        schema.labels.entries = Some(3);
        schema
    }

    fn write_flow(dir: &Path) {
        fs::write(dir.join("flameD.csv"), rows(4, 3, 300.0)).unwrap();
        fs::write(dir.join("labels.csv"), "T\nCH4\nO2\n").unwrap();
        fs::write(dir.join("mesh.csv"), rows(4, 2, 0.0)).unwrap();
        fs::write(dir.join("fluid_var.csv"), rows(4, 7, 1.0)).unwrap();
    }

    #[test]
    fn test_consistent_folder_passes() {
        let dir = tempfile::tempdir().unwrap();
        write_flow(dir.path());

        let report = validate_reactive_flow(dir.path(), &small_schema());
        assert!(report.is_ok(), "{report}");
        assert_eq!(
            report.find("labels.csv", "temperature").unwrap().status,
            Status::Pass
        );
        assert_eq!(
            report.find("fluid_var.csv", "row-aligned").unwrap().status,
            Status::Pass
        );
    }

    #[test]
    fn test_default_schema_flags_counts() {
        let dir = tempfile::tempdir().unwrap();
        write_flow(dir.path());

        let report = validate_reactive_flow(dir.path(), &ReactiveFlowSchema::default());
        assert!(!report.is_ok());
        let rows = report.find("flameD.csv", "rows").unwrap();
        assert_eq!(rows.status, Status::Fail);
        assert_eq!(rows.detail, "4 rows, expected 10613");
        assert_eq!(report.find("labels.csv", "entries").unwrap().status, Status::Fail);
    }

    #[test]
    fn test_misaligned_mesh_and_labels() {
        let dir = tempfile::tempdir().unwrap();
        write_flow(dir.path());
        fs::write(dir.path().join("mesh.csv"), rows(3, 2, 0.0)).unwrap();
        fs::write(dir.path().join("labels.csv"), "H2,T").unwrap();

        let report = validate_reactive_flow(dir.path(), &ReactiveFlowSchema::relational());
        let failed: Vec<(&str, &str)> = report
            .failures()
            .map(|c| (c.file.as_str(), c.name))
            .collect();
        assert_eq!(
            failed,
            vec![
                ("labels.csv", "col-aligned"),
                ("labels.csv", "temperature"),
                ("mesh.csv", "row-aligned"),
            ]
        );
    }

    #[test]
    fn test_missing_state_skips_dependents() {
        let dir = tempfile::tempdir().unwrap();
        write_flow(dir.path());
        fs::remove_file(dir.path().join("flameD.csv")).unwrap();

        let report = validate_reactive_flow(dir.path(), &small_schema());
        assert_eq!(report.find("flameD.csv", "present").unwrap().status, Status::Fail);
        assert_eq!(report.find("labels.csv", "col-aligned").unwrap().status, Status::Skip);
        assert_eq!(report.find("mesh.csv", "row-aligned").unwrap().status, Status::Skip);
    }

    #[test]
    fn test_non_finite_state_fails() {
        let dir = tempfile::tempdir().unwrap();
        write_flow(dir.path());
        fs::write(dir.path().join("flameD.csv"), "300,0,0\nNaN,0,0\n310,0,0\n320,0,0\n").unwrap();

        let report = validate_reactive_flow(dir.path(), &small_schema());
        let finite = report.find("flameD.csv", "finite").unwrap();
        assert_eq!(finite.status, Status::Fail);
        assert_eq!(finite.detail, "1 non-finite values");
    }

    #[test]
    fn test_dummy_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blobs.csv"), "0,1\n2,3\n").unwrap();
        fs::write(dir.path().join("moons.csv"), "0,1\n2\n").unwrap();

        let report = validate_dummy_dir(dir.path());
        assert_eq!(report.find("blobs.csv", "numeric").unwrap().status, Status::Pass);
        assert_eq!(report.find("moons.csv", "numeric").unwrap().status, Status::Fail);
        assert!(
            report
                .checks
                .iter()
                .any(|c| c.name == "shapes" && c.status == Status::Warn)
        );
        assert!(!report.is_ok());
    }

    #[test]
    fn test_missing_shape_only_warns() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blobs.csv"), "0,1\n2,3\n").unwrap();

        let report = validate_dummy_dir(dir.path());
        let warned = report.checks.iter().filter(|c| c.status == Status::Warn).count();
        assert_eq!(warned, 2);
        assert!(report.is_ok(), "{report}");
        assert_eq!(report.failures().count(), 0);
    }

    #[test]
    fn test_dummy_finite_recorded_both_ways() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("blobs.csv"), "0,1\n2,3\n").unwrap();
        fs::write(dir.path().join("circles.csv"), "0,inf\n2,3\n").unwrap();

        let report = validate_dummy_dir(dir.path());
        assert_eq!(report.find("blobs.csv", "finite").unwrap().status, Status::Pass);
        let circles = report.find("circles.csv", "finite").unwrap();
        assert_eq!(circles.status, Status::Fail);
        assert_eq!(circles.detail, "1 non-finite values");
    }

    #[test]
    fn test_empty_dummy_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let report = validate_dummy_dir(dir.path());
        assert!(!report.is_ok());
        assert_eq!(report.checks.len(), 1);
    }

    #[test]
    fn test_report_serializes() {
        let dir = tempfile::tempdir().unwrap();
        write_flow(dir.path());
        let report = validate_reactive_flow(dir.path(), &small_schema());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["checks"][0]["status"], "pass");
        assert_eq!(json["checks"][0]["file"], "flameD.csv");
    }
}
