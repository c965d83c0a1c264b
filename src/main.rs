use clap::Parser;
use dotenv::dotenv;
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use rust_fva::domain::solver_factory::{create_solver, SolverType};
use rust_fva::{run_fva, FvaConfig, FvaError, FvaRequest};

/// Flux variability analysis: tighten every listed variable bound to its
/// feasible range over the model's constraints.
#[derive(Debug, Parser)]
#[command(name = "rust-fva", version)]
struct Args {
    /// JSON model file
    model_file: PathBuf,
    /// JSON solver parameter file, or "-" for none
    param_file: String,
    /// Signed 1-based variable ids: negative minimizes, positive maximizes
    #[arg(required = true, allow_negative_numbers = true)]
    tasks: Vec<i32>,
    /// Where to write the model with the final bounds
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Solver backend, overrides FVA_SOLVER
    #[arg(short, long)]
    solver: Option<String>,
    /// Maximum number of worker threads, overrides FVA_THREADS
    #[arg(short, long)]
    threads: Option<usize>,
}

fn param_path(raw: &str) -> Option<PathBuf> {
    if raw == "-" {
        info!("No solver parameter file given, using defaults");
        return None;
    }
    let path = PathBuf::from(raw);
    if !path.exists() {
        info!("Parameter file {} not found, using defaults", path.display());
        return None;
    }
    Some(path)
}

fn default_output(model_file: &Path) -> PathBuf {
    model_file.with_extension("fva.json")
}

fn run(args: Args) -> rust_fva::Result<bool> {
    let mut config = FvaConfig::from_env();
    if let Some(name) = &args.solver {
        config.solver = SolverType::from_str(name).ok_or_else(|| {
            FvaError::UnknownSolver(format!(
                "{} (available: {})",
                name,
                SolverType::available().join(", ")
            ))
        })?;
    }
    if let Some(threads) = args.threads {
        config.threads = Some(threads.max(1));
    }

    let request = FvaRequest {
        param_path: param_path(&args.param_file),
        output_path: args.output.unwrap_or_else(|| default_output(&args.model_file)),
        model_path: args.model_file,
        tasks: args.tasks,
    };

    let solver = create_solver(config.solver);
    let outcome = run_fva(solver.as_ref(), &request, &config)?;
    Ok(outcome.aborted)
}

fn main() -> ExitCode {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    match run(args) {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(e) => {
            error!("{}", e);
            ExitCode::from(2)
        }
    }
}
