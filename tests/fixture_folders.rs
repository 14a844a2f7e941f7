use std::fs;
use std::path::Path;

use flowdata::data::loader::{load_dummy_dir, load_reactive_flow};
use flowdata::data::model::{DummyKind, FluidVariable, Matrix};
use flowdata::data::schema::ReactiveFlowSchema;
use flowdata::data::writer::write_matrix_csv;
use flowdata::kernel::{KernelApproximation, KernelSettings, Method, rbf_kernel, relative_error};
use flowdata::preprocess::{Centering, Scaling, center, center_scale, scale};
use flowdata::synthetic::{make_blobs, make_circles, make_moons};
use flowdata::validate::{Status, validate_dummy_dir, validate_reactive_flow};

const POINTS: usize = 40;
const SPECIES: usize = 4;

fn state_matrix() -> Matrix {
    let rows = (0..POINTS)
        .map(|i| {
            let t = 300.0 + 40.0 * i as f64;
            let mut row = vec![t];
            row.extend((0..SPECIES).map(|s| ((i + s) % 7) as f64 / 10.0 + 0.01 * s as f64));
            row
        })
        .collect();
    Matrix::from_rows(rows).unwrap()
}

fn write_reactive_flow(dir: &Path) {
    write_matrix_csv(&dir.join("flameD.csv"), &state_matrix()).unwrap();
    fs::write(dir.join("labels.csv"), "T\nH2\nO2\nCH4\nCO2\n").unwrap();

    let mesh = (0..POINTS).map(|i| vec![i as f64 * 0.1, 0.0]).collect();
    write_matrix_csv(&dir.join("mesh.csv"), &Matrix::from_rows(mesh).unwrap()).unwrap();

    let fluid = (0..POINTS)
        .map(|i| (0..7).map(|j| (i * 7 + j) as f64).collect())
        .collect();
    write_matrix_csv(&dir.join("fluid_var.csv"), &Matrix::from_rows(fluid).unwrap()).unwrap();
}

fn schema() -> ReactiveFlowSchema {
    let mut schema = ReactiveFlowSchema::default().with_rows(POINTS);
    schema.state.cols = Some(SPECIES + 1);
    schema.labels.entries = Some(SPECIES + 1);
    schema
}

#[test]
fn reactive_flow_folder_meets_contract() {
    let dir = tempfile::tempdir().unwrap();
    write_reactive_flow(dir.path());

    let report = validate_reactive_flow(dir.path(), &schema());
    assert!(report.is_ok(), "{report}");
    assert!(report.checks.iter().all(|c| c.status == Status::Pass));

    let flow = load_reactive_flow(dir.path(), &schema()).unwrap();
    assert_eq!(flow.len(), POINTS);
    assert_eq!(flow.temperature().unwrap()[1], 340.0);
    assert_eq!(flow.fluid_variable(FluidVariable::Uz).unwrap()[1], 9.0);
    assert_eq!(flow.species("CO2").unwrap().len(), POINTS);
}

#[test]
fn truncated_fluid_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    write_reactive_flow(dir.path());
    let short = Matrix::from_rows(vec![vec![0.0; 7]; POINTS - 1]).unwrap();
    write_matrix_csv(&dir.path().join("fluid_var.csv"), &short).unwrap();

    let report = validate_reactive_flow(dir.path(), &schema());
    let failed: Vec<_> = report.failures().map(|c| (c.file.as_str(), c.name)).collect();
    assert_eq!(
        failed,
        vec![("fluid_var.csv", "rows"), ("fluid_var.csv", "row-aligned")]
    );
}

#[test]
fn generated_dummy_folder_validates() {
    let dir = tempfile::tempdir().unwrap();
    let sets = [
        ("blobs", make_blobs(60, 3, 0.8, 1).unwrap()),
        ("moons", make_moons(60, 0.05, 1).unwrap()),
        ("circles", make_circles(60, 0.05, 0.4, 1).unwrap()),
    ];
    for (name, (points, _)) in &sets {
        write_matrix_csv(&dir.path().join(format!("{name}.csv")), points).unwrap();
    }

    let report = validate_dummy_dir(dir.path());
    assert!(report.is_ok(), "{report}");
    assert!(report.checks.iter().all(|c| c.status == Status::Pass), "{report}");

    let loaded = load_dummy_dir(dir.path()).unwrap();
    let kinds: Vec<_> = loaded.iter().map(|d| d.kind).collect();
    assert_eq!(kinds, vec![DummyKind::Blobs, DummyKind::Circles, DummyKind::Moons]);
    assert!(loaded.iter().all(|d| d.points.shape() == (60, 2)));
}

#[test]
fn kernel_on_scaled_state() {
    let x = state_matrix();
    let mu = center(&x, Centering::Mean).unwrap();
    let sigma = scale(&x, Scaling::Auto).unwrap();
    let x_tilde = center_scale(&x, &mu, &sigma).unwrap();

    let settings = KernelSettings {
        number_to_pick: POINTS,
        sigma: 1.0,
        rank: POINTS,
        number_of_matrices: 2,
        seed: 3,
    };
    let exact = rbf_kernel(&x_tilde, settings.sigma).unwrap();
    let approx = KernelApproximation::new(&x_tilde, settings)
        .unwrap()
        .compute(Method::Qr)
        .unwrap();
    assert_eq!(approx.shape(), (POINTS, POINTS));
    assert!(relative_error(&approx, &exact).unwrap() < 1e-3);
}

fn write_rows(path: &Path, rows: usize, cols: usize, value: impl Fn(usize, usize) -> f64) {
    let body: String = (0..rows)
        .map(|i| {
            let row: Vec<String> = (0..cols).map(|j| value(i, j).to_string()).collect();
            row.join(",") + "\n"
        })
        .collect();
    fs::write(path, body).unwrap();
}

#[test]
fn published_flame_d_shape_passes_default_contract() {
    use flowdata::data::schema::{FLAME_D_COLS, FLAME_D_ROWS, FLUID_VAR_COLS};

    let dir = tempfile::tempdir().unwrap();
    write_rows(&dir.path().join("flameD.csv"), FLAME_D_ROWS, FLAME_D_COLS, |i, j| {
        if j == 0 { 300.0 + i as f64 * 0.1 } else { 1.0 / (j + 1) as f64 }
    });
    let labels: String = std::iter::once("T".to_string())
        .chain((1..FLAME_D_COLS).map(|j| format!("Y{j}")))
        .collect::<Vec<_>>()
        .join("\n");
    fs::write(dir.path().join("labels.csv"), labels).unwrap();
    write_rows(&dir.path().join("mesh.csv"), FLAME_D_ROWS, 2, |i, j| (i * 2 + j) as f64);
    write_rows(&dir.path().join("fluid_var.csv"), FLAME_D_ROWS, FLUID_VAR_COLS, |i, j| {
        (i + j) as f64 * 0.5
    });

    let report = validate_reactive_flow(dir.path(), &ReactiveFlowSchema::default());
    assert!(report.is_ok(), "{report}");
    assert!(report.checks.iter().all(|c| c.status == Status::Pass), "{report}");
    assert_eq!(report.find("flameD.csv", "rows").unwrap().detail, "10613 rows, expected 10613");
    assert_eq!(report.find("flameD.csv", "cols").unwrap().detail, "37 columns, expected 37");
    assert_eq!(report.find("labels.csv", "entries").unwrap().detail, "37 entries, expected 37");
    assert_eq!(report.find("fluid_var.csv", "cols").unwrap().detail, "7 columns, expected 7");
    assert_eq!(report.find("mesh.csv", "row-aligned").unwrap().status, Status::Pass);
}
