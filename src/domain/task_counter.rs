//! Work distribution for the FVA worker pool.
//!
//! The counter owns a fixed list of signed task ids and hands them out one by
//! one. Handing out a task and checking the abort flag happen under the same
//! lock, so once `abort()` returns no thread can receive another task.

use parking_lot::Mutex;

/// Returned by [`SignedTaskCounter::next_task`] when there is nothing left
/// to do.
pub const NO_TASK: i32 = 0;

#[derive(Debug)]
struct Critical {
    next: usize,
    aborted: bool,
}

#[derive(Debug)]
pub struct SignedTaskCounter {
    tasks: Vec<i32>,
    critical: Mutex<Critical>,
}

impl SignedTaskCounter {
    pub fn new(tasks: Vec<i32>) -> Self {
        SignedTaskCounter {
            tasks,
            critical: Mutex::new(Critical { next: 0, aborted: false }),
        }
    }

    /// The next unissued task, or [`NO_TASK`] once the list is exhausted or
    /// the run was aborted.
    pub fn next_task(&self) -> i32 {
        let mut critical = self.critical.lock();
        if critical.aborted || critical.next >= self.tasks.len() {
            return NO_TASK;
        }
        let task = self.tasks[critical.next];
        critical.next += 1;
        task
    }

    /// Stop handing out tasks. Idempotent.
    pub fn abort(&self) {
        self.critical.lock().aborted = true;
    }

    pub fn was_aborted(&self) -> bool {
        self.critical.lock().aborted
    }

    /// Number of tasks in the list.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of tasks handed out so far.
    pub fn issued(&self) -> usize {
        self.critical.lock().next
    }

    pub fn tasks(&self) -> &[i32] {
        &self.tasks
    }
}
