use crate::convert::{to_row_entries, to_solver_bound};
use crate::domain::solver::{LpSession, SessionState, SolveOutcome, Solver};
use crate::error::SolverError;
use crate::models::{SolverParams, Status};

use grb::prelude::*;

/// Gurobi's own infinity; anything at or above it is unbounded.
const GRB_INFINITY: f64 = 1e100;

fn backend_error(context: &'static str) -> impl Fn(grb::Error) -> SolverError {
    move |e| SolverError::Backend(format!("{}: {}", context, e))
}

/// Gurobi solver implementation
pub struct GurobiSolver;

impl GurobiSolver {
    pub fn new() -> Self {
        GurobiSolver
    }

    /// Convert Gurobi status to our status
    fn convert_status(status: grb::Status) -> Status {
        match status {
            grb::Status::Optimal => Status::Optimal,
            grb::Status::Infeasible => Status::Infeasible,
            grb::Status::InfOrUnbd => Status::InfeasibleOrUnbounded,
            grb::Status::Unbounded => Status::Unbounded,
            grb::Status::SubOptimal => Status::Feasible,
            grb::Status::TimeLimit | grb::Status::IterationLimit => Status::LimitReached,
            grb::Status::Numeric => Status::SimplexFailed,
            _ => Status::Undefined,
        }
    }
}

impl Default for GurobiSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for GurobiSolver {
    fn open_session(&self) -> Result<Box<dyn LpSession>, SolverError> {
        let mut env = Env::new("").map_err(backend_error("Failed to create Gurobi environment"))?;

        // Disable Gurobi console output, progress is reported through our log
        env.set(param::OutputFlag, 0)
            .map_err(backend_error("Failed to set Gurobi output flag"))?;

        Ok(Box::new(GurobiSession {
            env,
            state: SessionState::default(),
            model: None,
            vars: Vec::new(),
            built_revision: 0,
        }))
    }

    fn name(&self) -> &str {
        "Gurobi"
    }
}

/// Keeps one native model per session, rebuilt only when the loaded program
/// changes, so warm starts carry over between tasks.
pub struct GurobiSession {
    env: Env,
    state: SessionState,
    model: Option<Model>,
    vars: Vec<Var>,
    built_revision: u64,
}

impl GurobiSession {
    fn build_model(&mut self) -> Result<(), SolverError> {
        let program = self.state.program()?;
        let mut model = Model::with_env(&program.name, &self.env)
            .map_err(backend_error("Failed to create Gurobi model"))?;

        // Add variables
        let mut vars: Vec<Var> = Vec::with_capacity(program.num_variables());
        for (idx, var) in program.variables.iter().enumerate() {
            let (lower, upper) = self.state.solver_bounds(idx)?;
            let gurobi_var = add_ctsvar!(
                model,
                name: &var.id,
                bounds: lower.max(-GRB_INFINITY)..upper.min(GRB_INFINITY)
            )
            .map_err(backend_error("Failed to add variable"))?;
            vars.push(gurobi_var);
        }

        model.update().map_err(backend_error("Failed to update model after adding variables"))?;

        // Add constraints, ranged rows as two inequalities
        for (row_idx, entries) in to_row_entries(&program.a).iter().enumerate() {
            if entries.is_empty() {
                continue;
            }
            let (lower, upper) = program.row_bounds[row_idx];
            let (lower, upper) = (to_solver_bound(lower), to_solver_bound(upper));

            let expr = entries.iter().fold(Expr::Constant(0.0), |acc, &(col_idx, coeff)| {
                acc + coeff * vars[col_idx]
            });

            if lower == upper {
                model
                    .add_constr(&format!("r{}", row_idx), c!(expr == lower))
                    .map_err(backend_error("Failed to add constraint"))?;
                continue;
            }
            if lower.is_finite() {
                let lhs = expr.clone();
                model
                    .add_constr(&format!("r{}_lo", row_idx), c!(lhs >= lower))
                    .map_err(backend_error("Failed to add constraint"))?;
            }
            if upper.is_finite() {
                model
                    .add_constr(&format!("r{}_up", row_idx), c!(expr <= upper))
                    .map_err(backend_error("Failed to add constraint"))?;
            }
        }

        model.update().map_err(backend_error("Failed to update model after adding constraints"))?;

        self.built_revision = self.state.revision();
        self.vars = vars;
        self.model = Some(model);
        Ok(())
    }

    fn apply_params(model: &mut Model, params: &SolverParams) -> Result<(), SolverError> {
        // Presolve: -1 = auto, 0 = off
        model
            .set_param(param::Presolve, if params.presolve { -1 } else { 0 })
            .map_err(backend_error("Failed to set Gurobi presolve"))?;
        model
            .set_param(param::LPWarmStart, if params.advanced_start { 1 } else { 0 })
            .map_err(backend_error("Failed to set Gurobi warm start"))?;
        model
            .set_param(param::NumericFocus, if params.numerical_emphasis { 3 } else { 0 })
            .map_err(backend_error("Failed to set Gurobi numeric focus"))?;
        model
            .set_param(param::Threads, params.threads as i32)
            .map_err(backend_error("Failed to set Gurobi thread count"))?;
        model
            .set_param(param::TimeLimit, params.time_limit.unwrap_or(GRB_INFINITY))
            .map_err(backend_error("Failed to set Gurobi time limit"))?;
        Ok(())
    }
}

impl LpSession for GurobiSession {
    fn state(&self) -> &SessionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    fn clear_model(&mut self) {
        self.state.clear();
        self.model = None;
        self.vars.clear();
    }

    fn solve(&mut self) -> Result<SolveOutcome, SolverError> {
        if self.model.is_none() || self.built_revision != self.state.revision() {
            self.build_model()?;
        }
        let objective_term = self.state.objective();
        let params = self.state.params().clone();
        let model = self.model.as_mut().ok_or(SolverError::NoModel)?;

        let expr = match objective_term {
            Some((variable, coefficient)) => coefficient * self.vars[variable],
            None => Expr::Constant(0.0),
        };
        model
            .set_objective(expr, ModelSense::Minimize)
            .map_err(backend_error("Failed to set objective"))?;

        Self::apply_params(model, &params)?;
        if !params.advanced_start {
            // Discard the basis so the solve starts from scratch
            model.reset().map_err(backend_error("Failed to reset model"))?;
        }

        model.optimize().map_err(backend_error("Failed to optimize"))?;

        let status = model.status().map_err(backend_error("Failed to get model status"))?;
        match GurobiSolver::convert_status(status) {
            Status::Optimal => {
                let objective = model
                    .get_attr(attr::ObjVal)
                    .map_err(backend_error("Failed to get objective value"))?;
                let quality = model.get_attr(attr::Kappa).ok();
                Ok(SolveOutcome::Optimal { objective, quality })
            }
            Status::Unbounded => Ok(SolveOutcome::Unbounded {
                quality: model.get_attr(attr::Kappa).ok(),
            }),
            other => Ok(SolveOutcome::Other(other)),
        }
    }
}
