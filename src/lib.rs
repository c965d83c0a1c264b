pub mod config;
pub mod convert;
pub mod domain;
pub mod error;
pub mod models;

mod test_utils;

pub use config::FvaConfig;
pub use domain::fva::{run_fva, FvaOutcome, FvaRequest};
pub use error::{FvaError, Result, SolverError};
