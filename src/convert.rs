use crate::models::{SolverDirection, SparseMatrix, Task};

/// Magnitude at or beyond which a bound read from a model is infinite.
pub const INFINITY_SENTINEL: f64 = 1e20;

/// Convert a bound as stored in a model file to the value used in
/// computations. Anything at or beyond the sentinel collapses to a signed
/// infinity.
pub fn to_solver_bound(value: f64) -> f64 {
    if value >= INFINITY_SENTINEL {
        f64::INFINITY
    } else if value <= -INFINITY_SENTINEL {
        f64::NEG_INFINITY
    } else {
        value
    }
}

/// Inverse of [`to_solver_bound`]: infinities are written back as the
/// sentinel so the model file stays valid JSON.
pub fn to_file_bound(value: f64) -> f64 {
    if value == f64::INFINITY {
        INFINITY_SENTINEL
    } else if value == f64::NEG_INFINITY {
        -INFINITY_SENTINEL
    } else {
        value
    }
}

/// Decode a signed task identifier. `0` is the exhausted sentinel and has no
/// task.
pub fn to_task(id: i32) -> Option<Task> {
    if id == 0 {
        return None;
    }
    let direction = if id < 0 {
        SolverDirection::Minimize
    } else {
        SolverDirection::Maximize
    };
    Some(Task {
        id,
        variable: id.unsigned_abs() as usize - 1,
        direction,
    })
}

/// Sort `entries` by index and add up values that share an index.
fn merge_duplicates(entries: &mut Vec<(usize, f64)>) {
    entries.sort_by_key(|&(index, _)| index);
    entries.dedup_by(|next, kept| {
        if next.0 == kept.0 {
            kept.1 += next.1;
            true
        } else {
            false
        }
    });
}

/// Group the non-zeros of `m` by row: `result[row] = [(col, val), ...]`,
/// sorted by column. Entries outside the declared shape are skipped and
/// repeated `(row, col)` pairs are summed.
pub fn to_row_entries(m: &SparseMatrix) -> Vec<Vec<(usize, f64)>> {
    let mut row_data: Vec<Vec<(usize, f64)>> = vec![Vec::new(); m.shape.nrows];
    for ((&row, &col), &val) in m.rows.iter().zip(&m.cols).zip(&m.vals) {
        if row < m.shape.nrows && col < m.shape.ncols {
            row_data[row].push((col, val));
        }
    }
    row_data.iter_mut().for_each(merge_duplicates);
    row_data
}

/// Group the non-zeros of `m` by column: `result[col] = [(row, val), ...]`,
/// with the same rules as [`to_row_entries`].
pub fn to_column_entries(m: &SparseMatrix) -> Vec<Vec<(usize, f64)>> {
    let mut col_data: Vec<Vec<(usize, f64)>> = vec![Vec::new(); m.shape.ncols];
    for ((&row, &col), &val) in m.rows.iter().zip(&m.cols).zip(&m.vals) {
        if row < m.shape.nrows && col < m.shape.ncols {
            col_data[col].push((row, val));
        }
    }
    col_data.iter_mut().for_each(merge_duplicates);
    col_data
}
