//! One thread of the FVA pool.
//!
//! A worker owns its solver session for its whole life and keeps pulling
//! tasks from the shared counter until the counter runs dry or the run is
//! aborted. Every per-task failure ends up either as a recovered value or as
//! a NaN slot plus a global abort; nothing is propagated out of `run`.

use log::{debug, error, warn};

use crate::config::QualityLimits;
use crate::convert::to_task;
use crate::domain::results::BoundTable;
use crate::domain::solver::{LpSession, SolveOutcome};
use crate::domain::task_counter::SignedTaskCounter;
use crate::error::SolverError;
use crate::models::{SolverDirection, Task};

/// How a task was settled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution {
    /// The bound value, already oriented for the task's direction.
    Value(f64),
    /// The optimum is unbounded; the initial (infinite) bound stands.
    Unbounded,
    /// Neither attempt produced a usable answer.
    Unresolved,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WorkerStats {
    /// Tasks for which at least one solve was attempted.
    pub solved: usize,
    /// Tasks that needed a conservative re-solve.
    pub resolved: usize,
    /// Re-solved tasks that still produced a value or an unbounded verdict.
    pub recovered: usize,
    /// Tasks left as NaN.
    pub failed: usize,
}

pub struct FvaWorker<'a> {
    id: usize,
    session: Box<dyn LpSession>,
    counter: &'a SignedTaskCounter,
    lower: &'a BoundTable,
    upper: &'a BoundTable,
    limits: QualityLimits,
}

impl<'a> FvaWorker<'a> {
    pub fn new(
        id: usize,
        session: Box<dyn LpSession>,
        counter: &'a SignedTaskCounter,
        lower: &'a BoundTable,
        upper: &'a BoundTable,
        limits: QualityLimits,
    ) -> Self {
        FvaWorker {
            id,
            session,
            counter,
            lower,
            upper,
            limits,
        }
    }

    /// Process tasks until none are left. The session is released when this
    /// returns (or unwinds).
    pub fn run(mut self) -> WorkerStats {
        let mut stats = WorkerStats::default();

        while let Some(task) = to_task(self.counter.next_task()) {
            if self.counter.was_aborted() {
                break;
            }
            stats.solved += 1;

            match self.process(task, &mut stats) {
                Ok(Resolution::Value(value)) => {
                    debug!(
                        "Worker {}: task {} ({} variable {}) = {}",
                        self.id, task.id, task.direction, task.variable, value
                    );
                    self.record(task, value);
                }
                Ok(Resolution::Unbounded) => {
                    debug!(
                        "Worker {}: task {} ({} variable {}) is unbounded",
                        self.id, task.id, task.direction, task.variable
                    );
                }
                Ok(Resolution::Unresolved) => {
                    error!(
                        "Worker {}: task {} ({} variable {}) could not be solved, aborting the run",
                        self.id, task.id, task.direction, task.variable
                    );
                    self.fail(task, &mut stats);
                }
                Err(e) => {
                    error!(
                        "Worker {}: solver failed on task {} ({} variable {}): {}, aborting the run",
                        self.id, task.id, task.direction, task.variable, e
                    );
                    self.fail(task, &mut stats);
                }
            }
        }

        stats
    }

    fn process(&mut self, task: Task, stats: &mut WorkerStats) -> Result<Resolution, SolverError> {
        let coefficient = task.direction.objective_coefficient();
        self.session.set_objective(task.variable, coefficient)?;
        let first = self.session.solve()?;

        match first {
            SolveOutcome::Optimal { objective, quality } if self.limits.accepts_optimal(quality) => {
                return Ok(Resolution::Value(coefficient * objective));
            }
            SolveOutcome::Optimal { quality, .. } => warn!(
                "Worker {}: task {} ({} variable {}) is optimal with poor quality {:?}, re-solving",
                self.id, task.id, task.direction, task.variable, quality
            ),
            SolveOutcome::Unbounded { quality } if self.limits.accepts_unbounded(quality) => {
                return Ok(Resolution::Unbounded);
            }
            SolveOutcome::Unbounded { quality } => warn!(
                "Worker {}: task {} ({} variable {}) is unbounded with poor quality {:?}, re-solving",
                self.id, task.id, task.direction, task.variable, quality
            ),
            SolveOutcome::Other(status) => warn!(
                "Worker {}: task {} ({} variable {}) ended with status '{}', re-solving",
                self.id, task.id, task.direction, task.variable, status
            ),
        }

        stats.resolved += 1;
        let retry = self.resolve()?;
        let resolution = settle(first, retry, coefficient);

        if resolution != Resolution::Unresolved {
            stats.recovered += 1;
            if matches!(first, SolveOutcome::Optimal { .. })
                && !matches!(retry, SolveOutcome::Optimal { .. })
            {
                warn!(
                    "Worker {}: task {} keeps its first value, re-solve ended with status '{}'",
                    self.id,
                    task.id,
                    retry.status()
                );
            }
        }
        Ok(resolution)
    }

    /// Solve again from scratch with warm start and presolve switched off,
    /// then restore the session's own settings.
    fn resolve(&mut self) -> Result<SolveOutcome, SolverError> {
        let configured = self.session.params().clone();
        self.session.set_params(configured.conservative())?;
        let retry = self.session.solve();
        self.session.set_params(configured)?;
        retry
    }

    fn record(&self, task: Task, value: f64) {
        match task.direction {
            SolverDirection::Minimize => self.lower.set(task.variable, value),
            SolverDirection::Maximize => self.upper.set(task.variable, value),
        }
    }

    fn fail(&self, task: Task, stats: &mut WorkerStats) {
        stats.failed += 1;
        self.record(task, f64::NAN);
        self.counter.abort();
    }
}

/// Pick the answer of a task that needed a re-solve.
///
/// The first attempt's quality is only known when it was optimal or
/// unbounded; when it is unknown on either side the retry is not held
/// against it.
pub fn settle(first: SolveOutcome, retry: SolveOutcome, coefficient: f64) -> Resolution {
    let first_quality = first.quality();

    match (first, retry) {
        (_, SolveOutcome::Optimal { objective, quality }) if no_worse(quality, first_quality) => {
            Resolution::Value(coefficient * objective)
        }
        (SolveOutcome::Optimal { objective, .. }, _) => Resolution::Value(coefficient * objective),
        (SolveOutcome::Unbounded { .. }, _) | (_, SolveOutcome::Unbounded { .. }) => {
            Resolution::Unbounded
        }
        _ => Resolution::Unresolved,
    }
}

fn no_worse(retry: Option<f64>, first: Option<f64>) -> bool {
    match (retry, first) {
        (Some(retry), Some(first)) => retry <= first,
        _ => true,
    }
}
