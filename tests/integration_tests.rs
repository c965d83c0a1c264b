use serde_json::{json, Value};
use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::atomic::{AtomicUsize, Ordering};

static FILE_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// A scratch directory holding one model, removed when the test ends.
struct TestModel {
    dir: PathBuf,
    model: PathBuf,
}

impl TestModel {
    fn write(model: Value) -> Self {
        // Get a unique directory for this test
        let n = FILE_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!("rust-fva-it-{}-{}", std::process::id(), n));
        fs::create_dir_all(&dir).expect("Failed to create test directory");

        let path = dir.join("model.json");
        fs::write(&path, serde_json::to_string_pretty(&model).unwrap()).expect("Failed to write model");
        TestModel { dir, model: path }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn default_output(&self) -> PathBuf {
        self.path("model.fva.json")
    }

    fn run(&self, args: &[&str]) -> Output {
        self.run_with_env(args, &[])
    }

    fn run_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_rust-fva"));
        command.arg(&self.model).args(args).current_dir(&self.dir);
        for (key, value) in env {
            command.env(key, value);
        }
        command.output().expect("Failed to run rust-fva")
    }
}

impl Drop for TestModel {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

fn read_bounds(path: &PathBuf) -> Vec<(f64, f64)> {
    let body: Value = serde_json::from_str(&fs::read_to_string(path).expect("Failed to read output"))
        .expect("Failed to parse output");
    body["variables"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| (v["bound"][0].as_f64().unwrap(), v["bound"][1].as_f64().unwrap()))
        .collect()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}

fn box_model() -> Value {
    json!({
        "name": "box",
        "variables": [{"id": "x", "bound": [0.0, 10.0]}],
        "A": {"rows": [], "cols": [], "vals": [], "shape": {"nrows": 0, "ncols": 1}},
        "row_bounds": []
    })
}

/// uptake -> A -> B -> out, with a side branch A -> C -> out capped at 3.
/// Internal fluxes start unbounded and get tightened.
fn branched_model() -> Value {
    json!({
        "name": "branched",
        "variables": [
            {"id": "uptake", "bound": [0.0, 10.0]},
            {"id": "a_to_b", "bound": [0.0, 1e20]},
            {"id": "b_out", "bound": [0.0, 1e20]},
            {"id": "a_to_c", "bound": [0.0, 3.0]},
            {"id": "c_out", "bound": [-1e20, 1e20]}
        ],
        "A": {
            "rows": [0, 0, 0, 1, 1, 2, 2],
            "cols": [0, 1, 3, 1, 2, 3, 4],
            "vals": [1.0, -1.0, -1.0, 1.0, -1.0, 1.0, -1.0],
            "shape": {"nrows": 3, "ncols": 5}
        },
        "row_bounds": [[0.0, 0.0], [0.0, 0.0], [0.0, 0.0]]
    })
}

fn infeasible_model() -> Value {
    json!({
        "name": "infeasible",
        "variables": [{"id": "x", "bound": [0.0, 1.0]}],
        "A": {"rows": [0], "cols": [0], "vals": [1.0], "shape": {"nrows": 1, "ncols": 1}},
        "row_bounds": [[5.0, 1e20]]
    })
}

#[test]
fn test_box_model_should_keep_its_bounds() {
    let model = TestModel::write(box_model());

    let output = model.run(&["-", "1", "-1"]);

    assert_eq!(output.status.code(), Some(0));
    let bounds = read_bounds(&model.default_output());
    assert!(approx(bounds[0].0, 0.0));
    assert!(approx(bounds[0].1, 10.0));
}

#[test]
fn test_branched_model_should_tighten_internal_fluxes() {
    let model = TestModel::write(branched_model());
    let out = model.path("tight.json");

    let output = model.run(&["-", "2", "-2", "3", "-3", "5", "-5", "-o", out.to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(0));
    let bounds = read_bounds(&out);
    assert!(approx(bounds[1].0, 0.0) && approx(bounds[1].1, 10.0));
    assert!(approx(bounds[2].0, 0.0) && approx(bounds[2].1, 10.0));
    assert!(approx(bounds[4].0, 0.0) && approx(bounds[4].1, 3.0));
    // untouched variables keep their initial bounds
    assert_eq!(bounds[0], (0.0, 10.0));
    assert_eq!(bounds[3], (0.0, 3.0));
}

#[test]
fn test_repeated_matrix_entries_should_be_summed() {
    let model = TestModel::write(json!({
        "name": "repeated",
        "variables": [{"id": "x", "bound": [0.0, 10.0]}],
        "A": {"rows": [0, 0], "cols": [0, 0], "vals": [0.5, 0.5], "shape": {"nrows": 1, "ncols": 1}},
        "row_bounds": [[-1e20, 4.0]]
    }));

    let output = model.run(&["-", "1", "-1"]);

    assert_eq!(output.status.code(), Some(0));
    let bounds = read_bounds(&model.default_output());
    assert!(approx(bounds[0].0, 0.0));
    assert!(approx(bounds[0].1, 4.0));
}

#[test]
fn test_infeasible_model_should_abort_without_output() {
    let model = TestModel::write(infeasible_model());

    let output = model.run(&["-", "1", "-1"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!model.default_output().exists());
}

#[test]
fn test_task_out_of_range_should_fail() {
    let model = TestModel::write(box_model());

    let output = model.run(&["-", "1", "2"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(!model.default_output().exists());
}

#[test]
fn test_missing_model_should_fail() {
    let model = TestModel::write(box_model());
    fs::remove_file(&model.model).unwrap();

    let output = model.run(&["-", "1"]);

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_param_file_should_be_read_when_present() {
    let model = TestModel::write(box_model());
    let params = model.path("params.json");
    fs::write(&params, json!({"presolve": false, "threads": 2}).to_string()).unwrap();

    let output = model.run(&[params.to_str().unwrap(), "-1", "1"]);

    assert_eq!(output.status.code(), Some(0));
    assert!(model.default_output().exists());
}

#[test]
fn test_malformed_param_file_should_abort() {
    let model = TestModel::write(box_model());
    let params = model.path("params.json");
    fs::write(&params, "presolve = off").unwrap();

    let output = model.run(&[params.to_str().unwrap(), "1"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(!model.default_output().exists());
}

#[test]
fn test_missing_param_file_should_fall_back_to_defaults() {
    let model = TestModel::write(box_model());

    let output = model.run(&["no-such-params.json", "1"]);

    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_unknown_solver_flag_should_fail() {
    let model = TestModel::write(box_model());

    let output = model.run(&["-", "1", "--solver", "cplex"]);

    assert_eq!(output.status.code(), Some(2));
}

#[test]
#[serial]
fn test_unknown_solver_env_should_fall_back_to_microlp() {
    let model = TestModel::write(box_model());

    let output = model.run_with_env(&["-", "1"], &[("FVA_SOLVER", "cplex"), ("FVA_THREADS", "1")]);

    assert_eq!(output.status.code(), Some(0));
}

#[test]
fn test_missing_tasks_should_be_rejected_by_clap() {
    let model = TestModel::write(box_model());

    let output = model.run(&["-"]);

    assert!(!output.status.success());
    assert!(!model.default_output().exists());
}
