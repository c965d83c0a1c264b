use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::SolverError;

// ---------- Model file types: owned & serde-friendly ----------

/// Variable or row bounds as written in a model file, `(lower, upper)`.
/// Infinite bounds are stored as the `±1e20` sentinel.
pub type Bound = (f64, f64);

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProgramVariable {
    pub id: String,
    pub bound: Bound,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Shape {
    pub nrows: usize,
    pub ncols: usize,
}

/// Coordinate-format sparse matrix, rows are constraints and columns are
/// variables.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SparseMatrix {
    pub rows: Vec<usize>,
    pub cols: Vec<usize>,
    pub vals: Vec<f64>,
    pub shape: Shape,
}

/// A linear program `row_lower <= A x <= row_upper`, `lb <= x <= ub`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct LinearProgram {
    #[serde(default)]
    pub name: String,
    pub variables: Vec<ProgramVariable>,
    #[serde(rename = "A")]
    pub a: SparseMatrix,
    pub row_bounds: Vec<Bound>,
}

impl LinearProgram {
    /// Reads a model file without validating it.
    pub fn from_path(path: &Path) -> Result<Self, SolverError> {
        let file = File::open(path).map_err(|e| SolverError::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| SolverError::ModelFormat {
            details: format!("{}: {}", path.display(), e),
        })
    }

    pub fn to_path(&self, path: &Path) -> Result<(), SolverError> {
        let file = File::create(path).map_err(|e| SolverError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| SolverError::ModelFormat {
            details: format!("{}: {}", path.display(), e),
        })?;
        writer.flush().map_err(|e| SolverError::io(path, e))
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_rows(&self) -> usize {
        self.row_bounds.len()
    }
}

// ---------- Tasks ----------

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SolverDirection {
    Maximize,
    Minimize,
}

impl SolverDirection {
    /// Coefficient placed on the task variable so that a minimizing solver
    /// optimizes in this direction.
    pub fn objective_coefficient(self) -> f64 {
        match self {
            SolverDirection::Minimize => 1.0,
            SolverDirection::Maximize => -1.0,
        }
    }
}

impl std::fmt::Display for SolverDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverDirection::Maximize => f.write_str("maximize"),
            SolverDirection::Minimize => f.write_str("minimize"),
        }
    }
}

/// A decoded task: which variable to optimize and in which direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Task {
    /// The signed identifier it was decoded from.
    pub id: i32,
    /// 0-based variable index.
    pub variable: usize,
    pub direction: SolverDirection,
}

// ---------- Parameter file ----------

/// Solver settings applied to every session of a run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SolverParams {
    /// Run the backend's presolve before solving.
    pub presolve: bool,
    /// Reuse the previous basis (warm start) between solves.
    pub advanced_start: bool,
    /// Threads used inside one session.
    pub threads: u32,
    /// Ask the backend to favour numerical accuracy over speed.
    pub numerical_emphasis: bool,
    /// Per-solve time limit in seconds.
    pub time_limit: Option<f64>,
}

impl Default for SolverParams {
    fn default() -> Self {
        SolverParams {
            presolve: true,
            advanced_start: true,
            threads: 1,
            numerical_emphasis: false,
            time_limit: None,
        }
    }
}

impl SolverParams {
    pub fn from_path(path: &Path) -> Result<Self, SolverError> {
        let file = File::open(path).map_err(|e| SolverError::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|e| SolverError::ParamFormat {
            details: format!("{}: {}", path.display(), e),
        })
    }

    /// The settings used when re-solving an ill-conditioned task: no warm
    /// start and no presolve.
    pub fn conservative(&self) -> Self {
        SolverParams {
            presolve: false,
            advanced_start: false,
            ..self.clone()
        }
    }
}

// ---------- Solve status ----------

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Status {
    Undefined,
    Feasible,
    Infeasible,
    InfeasibleOrUnbounded,
    Optimal,
    Unbounded,
    SimplexFailed,
    LimitReached,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Status::Undefined => "undefined",
            Status::Feasible => "feasible",
            Status::Infeasible => "infeasible",
            Status::InfeasibleOrUnbounded => "infeasible or unbounded",
            Status::Optimal => "optimal",
            Status::Unbounded => "unbounded",
            Status::SimplexFailed => "simplex failed",
            Status::LimitReached => "limit reached",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_params_given_partial_file_should_fill_defaults() {
        let params: SolverParams = serde_json::from_str(r#"{"presolve": false}"#).unwrap();
        assert!(!params.presolve);
        assert!(params.advanced_start);
        assert_eq!(params.threads, 1);
        assert_eq!(params.time_limit, None);
    }

    #[test]
    fn test_conservative_should_only_disable_presolve_and_warm_start() {
        let params = SolverParams {
            threads: 4,
            numerical_emphasis: true,
            ..SolverParams::default()
        };
        let conservative = params.conservative();
        assert!(!conservative.presolve);
        assert!(!conservative.advanced_start);
        assert_eq!(conservative.threads, 4);
        assert!(conservative.numerical_emphasis);
    }

    #[test]
    fn test_linear_program_should_read_matrix_under_capital_a() {
        let json = r#"{
            "variables": [{"id": "R1", "bound": [0.0, 10.0]}],
            "A": {"rows": [0], "cols": [0], "vals": [1.0], "shape": {"nrows": 1, "ncols": 1}},
            "row_bounds": [[-1e20, 10.0]]
        }"#;
        let program: LinearProgram = serde_json::from_str(json).unwrap();
        assert_eq!(program.name, "");
        assert_eq!(program.num_variables(), 1);
        assert_eq!(program.num_rows(), 1);
        assert_eq!(program.a.vals, vec![1.0]);
    }
}
