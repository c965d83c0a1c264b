//! Run set-up and tear-down around the worker pool.
//!
//! `Setup` reads the initial bounds once through a master session, `Running`
//! spreads the tasks over `worker_count` threads, and the run ends either
//! `Completed` (final bounds exported) or `Aborted` (nothing exported).

use log::{debug, error, info};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::FvaConfig;
use crate::convert::to_solver_bound;
use crate::domain::results::BoundTable;
use crate::domain::solver::{LpSession, Solver};
use crate::domain::task_counter::SignedTaskCounter;
use crate::domain::validate::validate_tasks;
use crate::domain::worker::FvaWorker;
use crate::error::{Result, SolverError};

#[derive(Debug, Clone)]
pub struct FvaRequest {
    pub model_path: PathBuf,
    /// Solver parameter file applied to every worker session.
    pub param_path: Option<PathBuf>,
    /// Where the model with the final bounds is exported.
    pub output_path: PathBuf,
    pub tasks: Vec<i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FvaOutcome {
    pub aborted: bool,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    /// Number of worker threads spawned.
    pub threads: usize,
}

/// Workers needed for `tasks`: one per distinct variable at most, never more
/// than `available` CPUs nor than `cap`.
pub fn worker_count(available: usize, tasks: &[i32], cap: Option<usize>) -> usize {
    let distinct: HashSet<u32> = tasks.iter().map(|t| t.unsigned_abs()).collect();
    if distinct.is_empty() {
        return 0;
    }
    let count = available.min(distinct.len()).min(cap.unwrap_or(usize::MAX));
    count.max(1)
}

pub fn run_fva(solver: &dyn Solver, request: &FvaRequest, config: &FvaConfig) -> Result<FvaOutcome> {
    let (lower, upper) = snapshot_bounds(solver, &request.model_path)?;
    validate_tasks(&request.tasks, lower.len())?;

    let counter = SignedTaskCounter::new(request.tasks.clone());
    let lower_table = BoundTable::new(&lower);
    let upper_table = BoundTable::new(&upper);
    let threads = worker_count(config.available_cpus(), &request.tasks, config.threads);

    info!(
        "Running {} tasks on {} variables with {} {} worker(s)",
        counter.len(),
        lower.len(),
        threads,
        solver.name()
    );

    std::thread::scope(|s| {
        let handles: Vec<_> = (0..threads)
            .map(|id| {
                let counter = &counter;
                let lower = &lower_table;
                let upper = &upper_table;
                let limits = config.limits;
                s.spawn(move || match open_worker_session(solver, request) {
                    Ok(session) => Some(FvaWorker::new(id, session, counter, lower, upper, limits).run()),
                    Err(e) => {
                        error!("Worker {} could not start its session: {}, aborting the run", id, e);
                        counter.abort();
                        None
                    }
                })
            })
            .collect();

        for (id, handle) in handles.into_iter().enumerate() {
            match handle.join() {
                Ok(Some(stats)) => debug!("Worker {} finished: {:?}", id, stats),
                Ok(None) => {}
                Err(_) => {
                    error!("Worker {} panicked, aborting the run", id);
                    counter.abort();
                }
            }
        }
    });

    let aborted = counter.was_aborted();
    let lower = lower_table.to_vec();
    let upper = upper_table.to_vec();

    if aborted {
        error!(
            "Run aborted after {} of {} tasks, {} not written",
            counter.issued(),
            counter.len(),
            request.output_path.display()
        );
    } else {
        export_bounds(solver, &request.model_path, &request.output_path, &lower, &upper)?;
        info!("Final bounds written to {}", request.output_path.display());
    }

    Ok(FvaOutcome {
        aborted,
        lower,
        upper,
        threads,
    })
}

/// Load the model once and copy its bounds, sentinels turned into
/// infinities. The master session is released before returning.
fn snapshot_bounds(solver: &dyn Solver, model_path: &Path) -> std::result::Result<(Vec<f64>, Vec<f64>), SolverError> {
    let mut master = solver.open_session()?;
    master.import_model(model_path)?;

    let n = master.num_variables();
    let mut lower = Vec::with_capacity(n);
    let mut upper = Vec::with_capacity(n);
    for variable in 0..n {
        let (lb, ub) = master.bounds(variable)?;
        lower.push(to_solver_bound(lb));
        upper.push(to_solver_bound(ub));
    }

    master.clear_model();
    Ok((lower, upper))
}

fn open_worker_session(solver: &dyn Solver, request: &FvaRequest) -> std::result::Result<Box<dyn LpSession>, SolverError> {
    let mut session = solver.open_session()?;
    session.import_model(&request.model_path)?;
    if let Some(param_path) = &request.param_path {
        session.read_param_file(param_path)?;
    }
    Ok(session)
}

fn export_bounds(
    solver: &dyn Solver,
    model_path: &Path,
    output_path: &Path,
    lower: &[f64],
    upper: &[f64],
) -> std::result::Result<(), SolverError> {
    let mut session = solver.open_session()?;
    session.import_model(model_path)?;
    for (variable, (&lb, &ub)) in lower.iter().zip(upper).enumerate() {
        session.set_bounds(variable, lb, ub)?;
    }
    session.export_model(output_path)
}
