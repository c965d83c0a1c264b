use std::path::Path;
use thiserror::Error;

/// Result type for FVA runs
pub type Result<T> = std::result::Result<T, FvaError>;

/// Errors raised by a solver session or while reading its files
#[derive(Error, Debug)]
pub enum SolverError {
    /// A model or parameter file could not be read or written
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The model file is malformed
    #[error("Invalid model: {details}")]
    ModelFormat { details: String },

    /// The parameter file is malformed
    #[error("Invalid solver parameters: {details}")]
    ParamFormat { details: String },

    /// A call needed a loaded model but the session is empty
    #[error("No model loaded in session")]
    NoModel,

    /// A variable index past the end of the model
    #[error("Variable index {index} out of range for a model with {len} variables")]
    VariableOutOfRange { index: usize, len: usize },

    /// The backend itself failed
    #[error("Solver backend error: {0}")]
    Backend(String),
}

impl SolverError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        SolverError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

/// Errors that stop an FVA run before or after the parallel phase
#[derive(Error, Debug)]
pub enum FvaError {
    #[error(transparent)]
    Solver(#[from] SolverError),

    /// The task list cannot be distributed
    #[error("Invalid task list: {0}")]
    InvalidTask(String),

    /// No backend with that name is compiled in
    #[error("Unknown solver: {0}")]
    UnknownSolver(String),
}
