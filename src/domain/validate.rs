use std::collections::HashSet;

use crate::error::{FvaError, SolverError};
use crate::models::LinearProgram;

fn model_error(details: String) -> SolverError {
    SolverError::ModelFormat { details }
}

/// Check the structure of a model read from disk.
pub fn validate_program(program: &LinearProgram) -> Result<(), SolverError> {
    let a = &program.a;

    if a.rows.len() != a.cols.len() || a.rows.len() != a.vals.len() {
        return Err(model_error(format!(
            "Matrix has {} row indices, {} column indices and {} values",
            a.rows.len(),
            a.cols.len(),
            a.vals.len(),
        )));
    }
    if a.shape.ncols != program.variables.len() {
        return Err(model_error(format!(
            "Matrix has {} columns but the model declares {} variables",
            a.shape.ncols,
            program.variables.len(),
        )));
    }
    if a.shape.nrows != program.row_bounds.len() {
        return Err(model_error(format!(
            "Matrix has {} rows but the model declares {} row bounds",
            a.shape.nrows,
            program.row_bounds.len(),
        )));
    }
    if let Some((row, col)) = a
        .rows
        .iter()
        .zip(&a.cols)
        .find(|&(&row, &col)| row >= a.shape.nrows || col >= a.shape.ncols)
    {
        return Err(model_error(format!("Matrix entry ({}, {}) is out of shape", row, col)));
    }
    if a.vals.iter().any(|v| !v.is_finite()) {
        return Err(model_error("Matrix contains a non-finite value".to_string()));
    }

    let mut ids: HashSet<&str> = HashSet::with_capacity(program.variables.len());
    for variable in &program.variables {
        if !ids.insert(variable.id.as_str()) {
            return Err(model_error(format!("Duplicate variable {}", variable.id)));
        }
        let (lower, upper) = variable.bound;
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(model_error(format!(
                "Variable {} has invalid bounds [{}, {}]",
                variable.id, lower, upper,
            )));
        }
    }

    for (row, &(lower, upper)) in program.row_bounds.iter().enumerate() {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(model_error(format!(
                "Row {} has invalid bounds [{}, {}]",
                row, lower, upper,
            )));
        }
    }

    Ok(())
}

/// Check that a task list can be handed out: it is not empty, every id names
/// one of the `num_variables` variables and no (variable, direction) pair
/// repeats.
pub fn validate_tasks(tasks: &[i32], num_variables: usize) -> Result<(), FvaError> {
    if tasks.is_empty() {
        return Err(FvaError::InvalidTask("No tasks given".to_string()));
    }
    let mut seen: HashSet<i32> = HashSet::with_capacity(tasks.len());

    for &task in tasks {
        if task == 0 {
            return Err(FvaError::InvalidTask("Task 0 is reserved".to_string()));
        }
        if task.unsigned_abs() as usize > num_variables {
            return Err(FvaError::InvalidTask(format!(
                "Task {} is out of range for a model with {} variables",
                task, num_variables,
            )));
        }
        if !seen.insert(task) {
            return Err(FvaError::InvalidTask(format!("Task {} is listed twice", task)));
        }
    }

    Ok(())
}
