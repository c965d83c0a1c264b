use log::debug;

use crate::convert::{to_row_entries, to_solver_bound};
use crate::domain::solver::{LpSession, SessionState, SolveOutcome, Solver};
use crate::error::SolverError;
use crate::models::Status;

use microlp::{ComparisonOp, OptimizationDirection, Problem, Variable};

/// Pure Rust simplex backend. It builds a fresh problem for every solve, so
/// presolve and warm-start settings have no effect, and it does not report a
/// condition estimate.
pub struct MicrolpSolver;

impl MicrolpSolver {
    pub fn new() -> Self {
        MicrolpSolver
    }
}

impl Default for MicrolpSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver for MicrolpSolver {
    fn open_session(&self) -> Result<Box<dyn LpSession>, SolverError> {
        Ok(Box::new(MicrolpSession::default()))
    }

    fn name(&self) -> &str {
        "microlp"
    }
}

#[derive(Default)]
pub struct MicrolpSession {
    state: SessionState,
}

impl MicrolpSession {
    /// Convert a microlp error to our outcome
    fn convert_error(error: microlp::Error) -> SolveOutcome {
        match error {
            microlp::Error::Infeasible => SolveOutcome::Other(Status::Infeasible),
            microlp::Error::Unbounded => SolveOutcome::Unbounded { quality: None },
            microlp::Error::InternalError(details) => {
                debug!("microlp internal error: {}", details);
                SolveOutcome::Other(Status::SimplexFailed)
            }
        }
    }
}

impl LpSession for MicrolpSession {
    fn state(&self) -> &SessionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    fn solve(&mut self) -> Result<SolveOutcome, SolverError> {
        let program = self.state.program()?;
        let mut problem = Problem::new(OptimizationDirection::Minimize);

        // Add variables with the objective folded in
        let mut vars: Vec<Variable> = Vec::with_capacity(program.num_variables());
        for variable in 0..program.num_variables() {
            let bounds = self.state.solver_bounds(variable)?;
            vars.push(problem.add_var(self.state.objective_coefficient(variable), bounds));
        }

        // Add constraints, splitting ranged rows into two inequalities
        for (row_idx, entries) in to_row_entries(&program.a).iter().enumerate() {
            let (lower, upper) = program.row_bounds[row_idx];
            let (lower, upper) = (to_solver_bound(lower), to_solver_bound(upper));

            if entries.is_empty() {
                if lower > 0.0 || upper < 0.0 {
                    return Ok(SolveOutcome::Other(Status::Infeasible));
                }
                continue;
            }

            let terms: Vec<(Variable, f64)> = entries
                .iter()
                .map(|&(col_idx, coeff)| (vars[col_idx], coeff))
                .collect();

            if lower == upper {
                problem.add_constraint(terms.as_slice(), ComparisonOp::Eq, lower);
                continue;
            }
            if lower.is_finite() {
                problem.add_constraint(terms.as_slice(), ComparisonOp::Ge, lower);
            }
            if upper.is_finite() {
                problem.add_constraint(terms.as_slice(), ComparisonOp::Le, upper);
            }
        }

        match problem.solve() {
            Ok(solution) => Ok(SolveOutcome::Optimal {
                objective: solution.objective(),
                quality: None,
            }),
            Err(error) => Ok(Self::convert_error(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LinearProgram, ProgramVariable, Shape, SparseMatrix};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    /// uptake -> A -> B -> secretion, with a side reaction A -> C -> out
    /// capped at 3.
    fn branched() -> LinearProgram {
        let variables = [
            ("uptake", (0.0, 10.0)),
            ("a_to_b", (0.0, 1e20)),
            ("b_out", (0.0, 1e20)),
            ("a_to_c", (0.0, 3.0)),
            ("c_out", (-1e20, 1e20)),
        ]
        .iter()
        .map(|(id, bound)| ProgramVariable { id: id.to_string(), bound: *bound })
        .collect();

        // rows: A, B, C mass balances
        LinearProgram {
            name: "branched".to_string(),
            variables,
            a: SparseMatrix {
                rows: vec![0, 0, 0, 1, 1, 2, 2],
                cols: vec![0, 1, 3, 1, 2, 3, 4],
                vals: vec![1.0, -1.0, -1.0, 1.0, -1.0, 1.0, -1.0],
                shape: Shape { nrows: 3, ncols: 5 },
            },
            row_bounds: vec![(0.0, 0.0), (0.0, 0.0), (0.0, 0.0)],
        }
    }

    fn session(program: LinearProgram) -> MicrolpSession {
        let mut session = MicrolpSession::default();
        session.state_mut().load(program);
        session
    }

    #[test]
    fn test_solve_without_model_should_fail() {
        let mut session = MicrolpSession::default();
        assert!(matches!(session.solve(), Err(SolverError::NoModel)));
    }

    #[test]
    fn test_solve_should_find_variable_range_in_network() {
        let mut session = session(branched());

        session.set_objective(3, -1.0).unwrap();
        match session.solve().unwrap() {
            SolveOutcome::Optimal { objective, quality } => {
                assert!(approx(objective, -3.0));
                assert_eq!(quality, None);
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        session.set_objective(2, -1.0).unwrap();
        match session.solve().unwrap() {
            SolveOutcome::Optimal { objective, .. } => assert!(approx(objective, -10.0)),
            other => panic!("unexpected outcome {:?}", other),
        }

        session.set_objective(2, 1.0).unwrap();
        match session.solve().unwrap() {
            SolveOutcome::Optimal { objective, .. } => assert!(approx(objective, 0.0)),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_solve_given_conflicting_rows_should_be_infeasible() {
        let mut program = branched();
        // force uptake >= 20 through an extra row
        program.a.rows.push(3);
        program.a.cols.push(0);
        program.a.vals.push(1.0);
        program.a.shape.nrows = 4;
        program.row_bounds.push((20.0, 1e20));
        let mut session = session(program);

        session.set_objective(0, 1.0).unwrap();
        assert_eq!(session.solve().unwrap(), SolveOutcome::Other(Status::Infeasible));
    }

    #[test]
    fn test_solve_given_free_direction_should_be_unbounded() {
        let program = LinearProgram {
            name: "free".to_string(),
            variables: vec![ProgramVariable { id: "x".to_string(), bound: (-1e20, 4.0) }],
            a: SparseMatrix {
                rows: vec![],
                cols: vec![],
                vals: vec![],
                shape: Shape { nrows: 0, ncols: 1 },
            },
            row_bounds: vec![],
        };
        let mut session = session(program);

        session.set_objective(0, 1.0).unwrap();
        assert!(matches!(session.solve().unwrap(), SolveOutcome::Unbounded { .. }));
    }

    #[test]
    fn test_solve_given_repeated_matrix_entry_should_sum_coefficients() {
        // 0.5 x + 0.5 x <= 4, split over two entries
        let program = LinearProgram {
            name: "repeated".to_string(),
            variables: vec![ProgramVariable { id: "x".to_string(), bound: (0.0, 10.0) }],
            a: SparseMatrix {
                rows: vec![0, 0],
                cols: vec![0, 0],
                vals: vec![0.5, 0.5],
                shape: Shape { nrows: 1, ncols: 1 },
            },
            row_bounds: vec![(-1e20, 4.0)],
        };
        let mut session = session(program);

        session.set_objective(0, -1.0).unwrap();
        match session.solve().unwrap() {
            SolveOutcome::Optimal { objective, .. } => assert!(approx(objective, -4.0)),
            other => panic!("unexpected outcome {:?}", other),
        }
    }
}
