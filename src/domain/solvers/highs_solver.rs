use crate::convert::{to_column_entries, to_solver_bound};
use crate::domain::solver::{LpSession, SessionState, SolveOutcome, Solver};
use crate::error::SolverError;
use crate::models::Status;

use ::highs::{ColProblem, HighsModelStatus, Sense};

/// HiGHS solver implementation
pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        HighsSolver
    }
}

impl Default for HighsSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for HighsSolver {
    fn open_session(&self) -> Result<Box<dyn LpSession>, SolverError> {
        Ok(Box::new(HighsSession::default()))
    }

    fn name(&self) -> &str {
        "HiGHS"
    }
}

/// A HiGHS problem is rebuilt for every solve. HiGHS does not expose a
/// condition estimate through this interface, so quality is unknown.
#[derive(Default)]
pub struct HighsSession {
    state: SessionState,
}

impl HighsSession {
    /// Convert HiGHS status to our status
    fn convert_status(model_status: HighsModelStatus) -> Status {
        match model_status {
            HighsModelStatus::Optimal => Status::Optimal,
            HighsModelStatus::Infeasible => Status::Infeasible,
            HighsModelStatus::UnboundedOrInfeasible => Status::InfeasibleOrUnbounded,
            HighsModelStatus::Unbounded => Status::Unbounded,
            HighsModelStatus::ReachedTimeLimit | HighsModelStatus::ReachedIterationLimit => {
                Status::LimitReached
            }
            HighsModelStatus::SolveError
            | HighsModelStatus::PresolveError
            | HighsModelStatus::PostsolveError => Status::SimplexFailed,
            _ => Status::Undefined,
        }
    }
}

impl LpSession for HighsSession {
    fn state(&self) -> &SessionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    fn solve(&mut self) -> Result<SolveOutcome, SolverError> {
        let program = self.state.program()?;
        let params = self.state.params();
        let mut problem = ColProblem::new();

        // First, add all constraint rows
        let mut rows = Vec::with_capacity(program.num_rows());
        for &(lower, upper) in &program.row_bounds {
            rows.push(problem.add_row(to_solver_bound(lower)..=to_solver_bound(upper)));
        }

        // Add variables (columns) with their constraint coefficients
        let col_data = to_column_entries(&program.a);
        for (col_idx, entries) in col_data.iter().enumerate() {
            let (lower, upper) = self.state.solver_bounds(col_idx)?;
            let row_factors: Vec<_> = entries
                .iter()
                .map(|&(row_idx, val)| (rows[row_idx], val))
                .collect();
            problem.add_column(self.state.objective_coefficient(col_idx), lower..=upper, &row_factors);
        }

        let mut model = problem.optimise(Sense::Minimise);
        model.set_option("output_flag", false);
        model.set_option("presolve", if params.presolve { "choose" } else { "off" });
        model.set_option("threads", params.threads.max(1) as i32);
        if let Some(time_limit) = params.time_limit {
            model.set_option("time_limit", time_limit);
        }
        let solved = model.solve();

        match Self::convert_status(solved.status()) {
            Status::Optimal => {
                // Single-variable objective: its value is the objective
                let objective = match self.state.objective() {
                    Some((variable, coefficient)) => {
                        let columns = solved.get_solution();
                        coefficient * columns.columns().get(variable).copied().unwrap_or(0.0)
                    }
                    None => 0.0,
                };
                Ok(SolveOutcome::Optimal {
                    objective,
                    quality: None,
                })
            }
            Status::Unbounded => Ok(SolveOutcome::Unbounded { quality: None }),
            status => Ok(SolveOutcome::Other(status)),
        }
    }
}
