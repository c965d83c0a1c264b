use std::sync::atomic::{AtomicU64, Ordering};

/// One bound per variable, shared by all workers of a run.
///
/// Each cell has a single writer (the worker that drew the matching task),
/// so relaxed stores are enough; joining the workers publishes the values to
/// the orchestrator.
#[derive(Debug)]
pub struct BoundTable {
    cells: Vec<AtomicU64>,
}

impl BoundTable {
    /// A table pre-filled with `initial`, typically the model's own bounds.
    pub fn new(initial: &[f64]) -> Self {
        BoundTable {
            cells: initial.iter().map(|v| AtomicU64::new(v.to_bits())).collect(),
        }
    }

    pub fn get(&self, index: usize) -> f64 {
        f64::from_bits(self.cells[index].load(Ordering::Relaxed))
    }

    pub fn set(&self, index: usize, value: f64) {
        self.cells[index].store(value.to_bits(), Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        (0..self.len()).map(|i| self.get(i)).collect()
    }
}
