//! Helpers for unit tests, most notably a scripted solver backend whose
//! outcomes can be set per task and attempt.
#![cfg(test)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::convert::to_file_bound;
use crate::domain::solver::{LpSession, SessionState, SolveOutcome, Solver};
use crate::error::SolverError;
use crate::models::{LinearProgram, ProgramVariable, Shape, SparseMatrix};

/// Outcomes keyed by `(task id, conservative attempt)`. Tasks without an
/// entry are solved as if the model had no rows: the optimum sits on the
/// variable's bound.
#[derive(Debug, Default)]
pub struct Script {
    outcomes: HashMap<(i32, bool), Result<SolveOutcome, String>>,
    panics: HashSet<i32>,
}

impl Script {
    pub fn new() -> Self {
        Script::default()
    }

    pub fn outcome(mut self, task: i32, conservative: bool, outcome: SolveOutcome) -> Self {
        self.outcomes.insert((task, conservative), Ok(outcome));
        self
    }

    pub fn error(mut self, task: i32, conservative: bool, message: &str) -> Self {
        self.outcomes.insert((task, conservative), Err(message.to_string()));
        self
    }

    pub fn panic_on(mut self, task: i32) -> Self {
        self.panics.insert(task);
        self
    }
}

#[derive(Debug, Default)]
pub struct Counters {
    pub opened: AtomicUsize,
    pub dropped: AtomicUsize,
    pub solves: AtomicUsize,
    pub conservative_solves: AtomicUsize,
}

pub struct ScriptedSolver {
    script: Arc<Script>,
    pub counters: Arc<Counters>,
    /// Sessions opened from this index on fail to open.
    fail_open_from: Option<usize>,
}

impl ScriptedSolver {
    pub fn new(script: Script) -> Self {
        ScriptedSolver {
            script: Arc::new(script),
            counters: Arc::new(Counters::default()),
            fail_open_from: None,
        }
    }

    pub fn failing_open_from(mut self, index: usize) -> Self {
        self.fail_open_from = Some(index);
        self
    }

    pub fn balanced(&self) -> bool {
        self.counters.opened.load(Ordering::SeqCst) == self.counters.dropped.load(Ordering::SeqCst)
    }
}

impl Solver for ScriptedSolver {
    fn open_session(&self) -> Result<Box<dyn LpSession>, SolverError> {
        let index = self.counters.opened.fetch_add(1, Ordering::SeqCst);
        if self.fail_open_from.map_or(false, |from| index >= from) {
            self.counters.dropped.fetch_add(1, Ordering::SeqCst);
            return Err(SolverError::Backend("no license available".to_string()));
        }
        Ok(Box::new(ScriptedSession {
            state: SessionState::default(),
            script: Arc::clone(&self.script),
            counters: Arc::clone(&self.counters),
        }))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct ScriptedSession {
    state: SessionState,
    script: Arc<Script>,
    counters: Arc<Counters>,
}

impl Drop for ScriptedSession {
    fn drop(&mut self) {
        self.counters.dropped.fetch_add(1, Ordering::SeqCst);
    }
}

impl LpSession for ScriptedSession {
    fn state(&self) -> &SessionState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    fn solve(&mut self) -> Result<SolveOutcome, SolverError> {
        let (variable, coefficient) = self
            .state
            .objective()
            .ok_or_else(|| SolverError::Backend("no objective".to_string()))?;
        let task = if coefficient > 0.0 {
            -(variable as i32 + 1)
        } else {
            variable as i32 + 1
        };
        let conservative = !self.state.params().presolve;

        self.counters.solves.fetch_add(1, Ordering::SeqCst);
        if conservative {
            self.counters.conservative_solves.fetch_add(1, Ordering::SeqCst);
        }
        if self.script.panics.contains(&task) {
            panic!("scripted panic on task {}", task);
        }
        if let Some(outcome) = self.script.outcomes.get(&(task, conservative)) {
            return outcome.clone().map_err(SolverError::Backend);
        }

        let (lower, upper) = self.state.solver_bounds(variable)?;
        let bound = if coefficient > 0.0 { lower } else { upper };
        if bound.is_infinite() {
            Ok(SolveOutcome::Unbounded { quality: Some(1.0) })
        } else {
            Ok(SolveOutcome::Optimal {
                objective: coefficient * bound,
                quality: Some(1.0),
            })
        }
    }
}

/// A model with the given variable bounds and no rows.
pub fn box_program(bounds: &[(f64, f64)]) -> LinearProgram {
    LinearProgram {
        name: "box".to_string(),
        variables: bounds
            .iter()
            .enumerate()
            .map(|(i, &(lower, upper))| ProgramVariable {
                id: format!("x{}", i + 1),
                bound: (to_file_bound(lower), to_file_bound(upper)),
            })
            .collect(),
        a: SparseMatrix {
            rows: vec![],
            cols: vec![],
            vals: vec![],
            shape: Shape {
                nrows: 0,
                ncols: bounds.len(),
            },
        },
        row_bounds: vec![],
    }
}

static FILE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A fresh path in the temp directory, unique within this test process.
pub fn temp_path(name: &str) -> PathBuf {
    let n = FILE_COUNTER.fetch_add(1, Ordering::SeqCst);
    std::env::temp_dir().join(format!("rust-fva-unit-{}-{}-{}", std::process::id(), n, name))
}

pub fn write_program(program: &LinearProgram) -> PathBuf {
    let path = temp_path("model.json");
    program.to_path(&path).unwrap();
    path
}
