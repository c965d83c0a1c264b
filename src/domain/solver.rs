use std::path::Path;

use crate::convert::{to_file_bound, to_solver_bound};
use crate::domain::validate::validate_program;
use crate::error::SolverError;
use crate::models::{Bound, LinearProgram, SolverParams, Status};

/// What a single solve produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveOutcome {
    /// `quality` is the backend's condition estimate (kappa), `None` when
    /// the backend does not report one.
    Optimal { objective: f64, quality: Option<f64> },
    Unbounded { quality: Option<f64> },
    Other(Status),
}

impl SolveOutcome {
    pub fn status(&self) -> Status {
        match self {
            SolveOutcome::Optimal { .. } => Status::Optimal,
            SolveOutcome::Unbounded { .. } => Status::Unbounded,
            SolveOutcome::Other(status) => *status,
        }
    }

    /// Condition estimate captured for this outcome. Only optimal and
    /// unbounded outcomes carry one.
    pub fn quality(&self) -> Option<f64> {
        match self {
            SolveOutcome::Optimal { quality, .. } | SolveOutcome::Unbounded { quality } => *quality,
            SolveOutcome::Other(_) => None,
        }
    }
}

/// The model, objective and parameters held by one session. Backends embed
/// it and translate it into their native problem when solving.
#[derive(Debug, Default)]
pub struct SessionState {
    program: Option<LinearProgram>,
    objective: Option<(usize, f64)>,
    params: SolverParams,
    revision: u64,
}

impl SessionState {
    pub fn program(&self) -> Result<&LinearProgram, SolverError> {
        self.program.as_ref().ok_or(SolverError::NoModel)
    }

    pub fn load(&mut self, program: LinearProgram) {
        self.program = Some(program);
        self.objective = None;
        self.revision += 1;
    }

    pub fn clear(&mut self) {
        self.program = None;
        self.objective = None;
        self.revision += 1;
    }

    /// Bumped whenever the model changes, so backends that keep a native
    /// copy know when to rebuild it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn num_variables(&self) -> usize {
        self.program.as_ref().map_or(0, LinearProgram::num_variables)
    }

    fn check_variable(&self, variable: usize) -> Result<&LinearProgram, SolverError> {
        let program = self.program()?;
        if variable >= program.num_variables() {
            return Err(SolverError::VariableOutOfRange {
                index: variable,
                len: program.num_variables(),
            });
        }
        Ok(program)
    }

    /// Bounds of `variable` exactly as stored in the model.
    pub fn bounds(&self, variable: usize) -> Result<Bound, SolverError> {
        Ok(self.check_variable(variable)?.variables[variable].bound)
    }

    /// Bounds of `variable` with the infinity sentinel applied.
    pub fn solver_bounds(&self, variable: usize) -> Result<Bound, SolverError> {
        let (lower, upper) = self.bounds(variable)?;
        Ok((to_solver_bound(lower), to_solver_bound(upper)))
    }

    pub fn set_bounds(&mut self, variable: usize, lower: f64, upper: f64) -> Result<(), SolverError> {
        self.check_variable(variable)?;
        if let Some(program) = self.program.as_mut() {
            program.variables[variable].bound = (to_file_bound(lower), to_file_bound(upper));
            self.revision += 1;
        }
        Ok(())
    }

    /// Current objective as `(variable, coefficient)`; every other
    /// coefficient is zero.
    pub fn objective(&self) -> Option<(usize, f64)> {
        self.objective
    }

    pub fn objective_coefficient(&self, variable: usize) -> f64 {
        match self.objective {
            Some((selected, coefficient)) if selected == variable => coefficient,
            _ => 0.0,
        }
    }

    pub fn set_objective(&mut self, variable: usize, coefficient: f64) -> Result<(), SolverError> {
        self.check_variable(variable)?;
        self.objective = Some((variable, coefficient));
        Ok(())
    }

    pub fn params(&self) -> &SolverParams {
        &self.params
    }

    pub fn set_params(&mut self, params: SolverParams) {
        self.params = params;
    }
}

/// One loaded copy of a linear program inside a backend. A session is used
/// by a single thread; native resources are released when it is dropped.
pub trait LpSession: Send {
    fn state(&self) -> &SessionState;

    fn state_mut(&mut self) -> &mut SessionState;

    /// Minimize the current objective.
    fn solve(&mut self) -> Result<SolveOutcome, SolverError>;

    fn import_model(&mut self, path: &Path) -> Result<(), SolverError> {
        let program = LinearProgram::from_path(path)?;
        validate_program(&program)?;
        self.state_mut().load(program);
        Ok(())
    }

    fn export_model(&self, path: &Path) -> Result<(), SolverError> {
        self.state().program()?.to_path(path)
    }

    /// Drop the loaded model while keeping the session itself alive.
    fn clear_model(&mut self) {
        self.state_mut().clear();
    }

    fn num_variables(&self) -> usize {
        self.state().num_variables()
    }

    fn bounds(&self, variable: usize) -> Result<Bound, SolverError> {
        self.state().bounds(variable)
    }

    fn set_bounds(&mut self, variable: usize, lower: f64, upper: f64) -> Result<(), SolverError> {
        self.state_mut().set_bounds(variable, lower, upper)
    }

    /// Replace the objective with `coefficient * x[variable]`.
    fn set_objective(&mut self, variable: usize, coefficient: f64) -> Result<(), SolverError> {
        self.state_mut().set_objective(variable, coefficient)
    }

    fn params(&self) -> &SolverParams {
        self.state().params()
    }

    fn set_params(&mut self, params: SolverParams) -> Result<(), SolverError> {
        self.state_mut().set_params(params);
        Ok(())
    }

    fn read_param_file(&mut self, path: &Path) -> Result<(), SolverError> {
        let params = SolverParams::from_path(path)?;
        self.set_params(params)
    }
}

/// Common interface for LP solver backends
pub trait Solver: Send + Sync {
    /// Open an empty session. Each worker thread opens its own.
    fn open_session(&self) -> Result<Box<dyn LpSession>, SolverError>;

    /// Get the solver name for logging/debugging
    fn name(&self) -> &str;
}
