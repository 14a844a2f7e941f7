use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use flowdata::data::model::Matrix;
use flowdata::data::writer::{write_matrix_csv, write_matrix_parquet};
use flowdata::synthetic::{make_blobs, make_circles, make_moons};

/// Write the synthetic blobs / moons / circles fixtures.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output folder (created if missing)
    #[arg(long, default_value = "dummy_data")]
    out: PathBuf,

    #[arg(long, default_value_t = 500)]
    samples: usize,

    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Also write .parquet copies
    #[arg(long)]
    parquet: bool,
}

/// Append the cluster index as a trailing column.
fn with_labels(points: &Matrix, labels: &[usize]) -> Result<Matrix> {
    let rows = points
        .iter_rows()
        .zip(labels)
        .map(|(row, &label)| {
            let mut row = row.to_vec();
            row.push(label as f64);
            row
        })
        .collect();
    Ok(Matrix::from_rows(rows)?)
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    let sets = [
        ("blobs", make_blobs(args.samples, 3, 1.0, args.seed)?),
        ("moons", make_moons(args.samples, 0.05, args.seed)?),
        ("circles", make_circles(args.samples, 0.05, 0.5, args.seed)?),
    ];

    let names = ["x".to_string(), "y".to_string(), "label".to_string()];
    for (name, (points, labels)) in &sets {
        let table = with_labels(points, labels)?;
        write_matrix_csv(&args.out.join(format!("{name}.csv")), &table)?;
        if args.parquet {
            write_matrix_parquet(&args.out.join(format!("{name}.parquet")), &table, Some(&names))?;
        }
    }

    println!(
        "Wrote {} datasets ({} points each) to {}",
        sets.len(),
        args.samples,
        args.out.display()
    );
    Ok(())
}
