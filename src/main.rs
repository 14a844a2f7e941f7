use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use flowdata::config::Settings;
use flowdata::data::filter::{RowFilter, select};
use flowdata::data::loader::{load_dummy_dir, load_labels, load_matrix, load_reactive_flow};
use flowdata::data::model::FluidVariable;
use flowdata::data::writer::write_matrix_csv;
use flowdata::kernel::{self, KernelApproximation};
use flowdata::preprocess::{center, center_scale, scale};
use flowdata::validate::{ValidationReport, validate_dummy_dir, validate_reactive_flow};

/// Inspect and validate reactive-flow and synthetic clustering fixtures.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging (RUST_LOG still takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check fixture folders against their documented shapes
    Validate {
        /// The reactive_flow/ folder
        #[arg(long)]
        reactive_flow: Option<PathBuf>,

        /// The dummy_data/ folder
        #[arg(long)]
        dummy: Option<PathBuf>,

        /// Only check agreement between files, not absolute counts
        #[arg(long)]
        relational: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print shape and per-column statistics of a matrix file
    Inspect {
        file: PathBuf,

        /// Column names to print alongside the statistics
        #[arg(long)]
        labels: Option<PathBuf>,
    },

    /// Load the fixture folders and summarise their contents
    Summary {
        #[arg(long)]
        reactive_flow: Option<PathBuf>,

        #[arg(long)]
        dummy: Option<PathBuf>,
    },

    /// Approximate the RBF kernel of a matrix and report the error
    Kernel {
        file: PathBuf,

        /// Keep rows with COL in [MIN, MAX]; either bound may be empty (e.g. `0:800:`)
        #[arg(long = "where", value_parser = parse_filter)]
        filters: Vec<RowFilter>,

        /// Use only the first N rows; the exact kernel is N×N
        #[arg(long, default_value_t = DEFAULT_KERNEL_ROWS)]
        rows: usize,

        #[arg(long, value_enum, default_value_t = MethodArg::Qr)]
        method: MethodArg,

        /// Write the approximated kernel as CSV
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum MethodArg {
    Standard,
    Ensemble,
    Qr,
}

impl From<MethodArg> for kernel::Method {
    fn from(m: MethodArg) -> Self {
        match m {
            MethodArg::Standard => kernel::Method::Standard,
            MethodArg::Ensemble => kernel::Method::Ensemble,
            MethodArg::Qr => kernel::Method::Qr,
        }
    }
}

/// Rows kept by `kernel` unless `--rows` says otherwise. Both the exact and
/// the approximated kernel are dense N×N, so the full 10613-row state does
/// not fit comfortably.
const DEFAULT_KERNEL_ROWS: usize = 2000;

fn parse_filter(s: &str) -> Result<RowFilter, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let [column, min, max] = parts.as_slice() else {
        return Err(format!("expected COL:MIN:MAX, got '{s}'"));
    };
    let bound = |b: &str| -> Result<Option<f64>, String> {
        if b.is_empty() {
            Ok(None)
        } else {
            b.parse().map(Some).map_err(|e| format!("bad bound '{b}': {e}"))
        }
    };
    let column = column
        .parse()
        .map_err(|e| format!("bad column '{column}': {e}"))?;
    Ok(RowFilter::new(column, bound(*min)?, bound(*max)?))
}

fn range(values: &[f64]) -> (f64, f64) {
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    (lo, hi)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let settings = Settings::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Validate {
            reactive_flow,
            dummy,
            relational,
            json,
        } => {
            if reactive_flow.is_none() && dummy.is_none() {
                bail!("nothing to validate: pass --reactive-flow and/or --dummy");
            }
            let schema = if relational {
                settings.reactive_flow.clone().without_counts()
            } else {
                settings.reactive_flow.clone()
            };

            let mut report = ValidationReport::default();
            if let Some(dir) = &reactive_flow {
                report.merge(validate_reactive_flow(dir, &schema));
            }
            if let Some(dir) = &dummy {
                report.merge(validate_dummy_dir(dir));
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{report}");
            }
            Ok(if report.is_ok() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Command::Inspect { file, labels } => {
            let m = load_matrix(&file)?;
            let names = labels.map(|p| load_labels(&p)).transpose()?;
            println!("{}: {m}", file.display());

            for j in 0..m.cols() {
                let col = m.column(j)?;
                let (lo, hi) = range(&col);
                let mean = col.iter().sum::<f64>() / col.len().max(1) as f64;
                let name = names
                    .as_ref()
                    .and_then(|n| n.get(j))
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("col {j}"));
                println!("{name:>12}  min {lo:>12.5e}  max {hi:>12.5e}  mean {mean:>12.5e}");
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Summary {
            reactive_flow,
            dummy,
        } => {
            if let Some(dir) = &reactive_flow {
                let flow = load_reactive_flow(dir, &settings.reactive_flow)?;
                println!("{}: {} points, state {}", dir.display(), flow.len(), flow.state);
                let (t_lo, t_hi) = range(&flow.temperature()?);
                println!("  temperature: {t_lo:.1} .. {t_hi:.1}");
                if let Some(mesh) = &flow.mesh {
                    println!("  mesh: {mesh}");
                }
                for var in FluidVariable::ALL {
                    if let Some(values) = flow.fluid_variable(var) {
                        let (lo, hi) = range(&values);
                        println!("  {var:>8}: {lo:.4e} .. {hi:.4e}");
                    }
                }
            }
            if let Some(dir) = &dummy {
                for ds in load_dummy_dir(dir)? {
                    match ds.split_labels() {
                        Some((features, labels)) => {
                            let k = labels.iter().max().map_or(0, |m| m + 1);
                            println!("{} ({:?}): {features}, {k} labelled clusters", ds.name, ds.kind);
                        }
                        None => println!("{} ({:?}): {}", ds.name, ds.kind, ds.points),
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::Kernel {
            file,
            filters,
            rows,
            method,
            output,
        } => {
            let x = select(&load_matrix(&file)?, &filters).head(rows);

            let mu = center(&x, settings.preprocess.centering)?;
            let sigma = scale(&x, settings.preprocess.scaling)?;
            let x_tilde = center_scale(&x, &mu, &sigma)?;
            info!("input matrix after centering and scaling: {x_tilde}");

            let model = KernelApproximation::new(&x_tilde, settings.kernel.clone())?;
            let approx = model.compute(method.into())?;
            let exact = kernel::rbf_kernel(&x_tilde, model.settings().sigma)?;

            println!("approximated kernel: {approx}");
            println!("exact kernel: {exact}");
            println!(
                "relative error: {:.6e}",
                kernel::relative_error(&approx, &exact)?
            );

            if let Some(path) = output {
                write_matrix_csv(&path, &approx)?;
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
