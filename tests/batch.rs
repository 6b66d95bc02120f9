use std::path::{Path, PathBuf};

use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tempdir::TempDir;

use clfit::app::pipeline::{RunOutput, run_pipeline};
use clfit::data::{SynthConfig, TraceShape, decay_trace, flat_trace, write_synthetic_dataset, write_trace};
use clfit::domain::{BatchConfig, ExportFormat};
use clfit::error::AnalysisError;
use clfit::io::write_table;
use clfit::report::Cell;

fn write_decay(dir: &Path, name: &str, params: [f64; 3], seed: u64) -> PathBuf {
    write_noisy_decay(dir, name, params, TraceShape::default().noise, seed)
}

fn write_noisy_decay(dir: &Path, name: &str, params: [f64; 3], noise: f64, seed: u64) -> PathBuf {
    let mut rng = StdRng::seed_from_u64(seed);
    let shape = TraceShape {
        noise,
        ..TraceShape::default()
    };
    let (t, y) = decay_trace(params, &shape, &mut rng).unwrap();
    let path = dir.join(name);
    write_trace(&path, &t, &y).unwrap();
    path
}

/// A trace whose only peak is three samples from the end.
fn write_tail_peak(dir: &Path, name: &str) -> PathBuf {
    let t: Vec<f64> = (0..30).map(|i| i as f64 * 0.1).collect();
    let mut y = vec![0.0; 30];
    y[27] = 1.0;
    let path = dir.join(name);
    write_trace(&path, &t, &y).unwrap();
    path
}

fn write_malformed(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, "Time,Intensity\n0.0,0.1\n0.1,0.9\n0.2,oops\n0.3,0.4\n").unwrap();
    path
}

fn write_flat(dir: &Path, name: &str) -> PathBuf {
    let (t, y) = flat_trace(0.05, &TraceShape::default());
    let path = dir.join(name);
    write_trace(&path, &t, &y).unwrap();
    path
}

fn config_for(dir: &TempDir) -> BatchConfig {
    BatchConfig {
        input_directory: dir.path().to_path_buf(),
        ..BatchConfig::default()
    }
}

fn run(dir: &TempDir) -> RunOutput {
    run_pipeline(&config_for(dir)).unwrap()
}

#[test]
fn one_row_per_file_in_enumeration_order() {
    let dir = TempDir::new("one_row_per_file").unwrap();
    for (i, name) in ["S1_CL_T3.csv", "S1_CL_T1.csv", "S1_CL_T2.csv"].iter().enumerate() {
        write_decay(dir.path(), name, [1.0, 1.0 + i as f64 * 0.5, 0.02], i as u64);
    }
    // Does not match the default pattern.
    write_decay(dir.path(), "notes.csv", [1.0, 1.0, 0.0], 9);

    let out = run(&dir);
    assert_eq!(out.table.len(), 3);
    assert_eq!(out.table.files(), &["S1_CL_T1.csv", "S1_CL_T2.csv", "S1_CL_T3.csv"]);
}

#[test]
fn all_successful_fits_have_no_missing_values() {
    let dir = TempDir::new("all_successful").unwrap();
    for n in 1..=4 {
        write_decay(dir.path(), &format!("S1_CL_T{n}.csv"), [1.5, 0.8 * n as f64, 0.05], n);
    }

    let out = run(&dir);
    assert_eq!(out.outcome.failures, 0);
    assert!(out.outcome.notices.is_empty());
    for r in 0..out.table.len() {
        assert!(out.table.is_complete(r), "row {r} has missing values");
    }
}

#[test]
fn failed_file_is_isolated_and_named() {
    let dir = TempDir::new("failed_file").unwrap();
    for n in 1..=5 {
        let name = format!("S1_CL_T{n}.csv");
        if n == 3 {
            write_flat(dir.path(), &name);
        } else {
            write_decay(dir.path(), &name, [1.0, 1.0, 0.0], n);
        }
    }

    let out = run(&dir);
    assert_eq!(out.table.len(), 5);
    assert_eq!(out.outcome.successes, 4);
    assert_eq!(out.outcome.failures, 1);

    assert!(!out.table.is_complete(2));
    for r in [0, 1, 3, 4] {
        assert!(out.table.is_complete(r), "row {r} should be fitted");
    }
    assert_eq!(out.table.cell("tau", 2), Some(Cell::Number(None)));
    assert_eq!(out.table.cell("File", 2), Some(Cell::Text("S1_CL_T3.csv")));

    assert_eq!(
        out.outcome.notices,
        vec!["No peaks found for file S1_CL_T3.csv - might need to fit individually".to_string()]
    );
    assert_eq!(
        out.outcome.results[2].outcome.as_ref().unwrap_err(),
        &AnalysisError::NoPeaksFound
    );
}

#[test]
fn fit_and_load_failures_do_not_stop_the_batch() {
    let dir = TempDir::new("fit_and_load_failures").unwrap();
    write_decay(dir.path(), "S1_CL_T1.csv", [1.0, 1.0, 0.0], 1);
    write_malformed(dir.path(), "S1_CL_T2.csv");
    write_tail_peak(dir.path(), "S1_CL_T3.csv");
    write_decay(dir.path(), "S1_CL_T4.csv", [1.2, 0.9, 0.02], 4);
    write_decay(dir.path(), "S1_CL_T5.csv", [0.8, 2.0, 0.05], 5);

    let out = run(&dir);
    assert_eq!(out.table.len(), 5);
    assert_eq!(out.outcome.successes, 3);
    assert_eq!(out.outcome.failures, 2);

    assert!(matches!(
        out.outcome.results[1].outcome,
        Err(AnalysisError::FileLoadError { .. })
    ));
    assert!(matches!(
        out.outcome.results[2].outcome,
        Err(AnalysisError::FitDidNotConverge { .. })
    ));
    for r in [0, 3, 4] {
        assert!(out.table.is_complete(r), "row {r} should be fitted");
    }
    assert!(!out.table.is_complete(1));
    assert!(!out.table.is_complete(2));

    assert_eq!(out.outcome.notices.len(), 2);
    assert!(
        out.outcome.notices[0].starts_with("Could not load file S1_CL_T2.csv"),
        "{}",
        out.outcome.notices[0]
    );
    assert!(
        out.outcome.notices[1].starts_with("Fit did not converge for file S1_CL_T3.csv"),
        "{}",
        out.outcome.notices[1]
    );
}

#[test]
fn recovers_tau_at_moderate_noise() {
    let dir = TempDir::new("moderate_noise").unwrap();
    let truth = [0.8, 1.6, 2.4, 1.23];
    for (n, &tau) in truth.iter().enumerate() {
        write_noisy_decay(dir.path(), &format!("S1_CL_T{}.csv", n + 1), [1.0, tau, 0.03], 0.03, n as u64);
    }

    let out = run(&dir);
    assert_eq!(out.outcome.failures, 0, "{:?}", out.outcome.notices);
    let fitted = out.table.parameter("tau").unwrap();
    for (r, &tau) in truth.iter().enumerate() {
        let got = fitted[r].unwrap();
        assert_abs_diff_eq!(got, tau, epsilon = 0.05 * tau);
    }
}

#[test]
fn recovers_known_parameters_from_noisy_trace() {
    let dir = TempDir::new("recovers_params").unwrap();
    write_decay(dir.path(), "S1_CL_T1.csv", [1.0, 1.23, 0.0], 2024);

    let out = run(&dir);
    let a = out.table.parameter("A").unwrap()[0].unwrap();
    let tau = out.table.parameter("tau").unwrap()[0].unwrap();
    let c = out.table.parameter("C").unwrap()[0].unwrap();

    assert_abs_diff_eq!(a, 1.0, epsilon = 0.05);
    assert_abs_diff_eq!(tau, 1.23, epsilon = 0.05 * 1.23);
    assert_abs_diff_eq!(c, 0.0, epsilon = 0.02);
}

#[test]
fn repeated_and_sequential_runs_agree() {
    let dir = TempDir::new("repeatable").unwrap();
    write_synthetic_dataset(&SynthConfig {
        out_dir: dir.path().to_path_buf(),
        prefix: "S2".to_string(),
        count: 6,
        seed: 11,
        flat_every: Some(4),
        shape: TraceShape::default(),
    })
    .unwrap();

    let first = run(&dir);
    let second = run(&dir);
    assert_eq!(first.table, second.table);

    let sequential = run_pipeline(&BatchConfig {
        parallel: false,
        ..config_for(&dir)
    })
    .unwrap();
    assert_eq!(first.table, sequential.table);
    assert_eq!(first.outcome.notices, sequential.outcome.notices);
}

#[test]
fn synthetic_set_round_trips_through_the_fitter() {
    let dir = TempDir::new("synthetic_set").unwrap();
    let written = write_synthetic_dataset(&SynthConfig {
        out_dir: dir.path().to_path_buf(),
        prefix: "S1".to_string(),
        count: 5,
        seed: 3,
        flat_every: Some(5),
        shape: TraceShape::default(),
    })
    .unwrap();

    let out = run(&dir);
    assert_eq!(out.table.len(), 5);
    for (r, file) in written.iter().enumerate() {
        let name = file.path.file_name().unwrap().to_str().unwrap();
        assert_eq!(out.table.files()[r], name);
        match file.params {
            Some([_, tau, _]) => {
                let fitted = out.table.parameter("tau").unwrap()[r].unwrap();
                assert_abs_diff_eq!(fitted, tau, epsilon = 0.05 * tau);
            }
            None => assert!(!out.table.is_complete(r)),
        }
    }
}

#[test]
fn empty_directory_gives_empty_table() {
    let dir = TempDir::new("empty_dir").unwrap();
    let out = run(&dir);
    assert!(out.table.is_empty());
    assert_eq!(out.outcome.successes, 0);
    assert_eq!(out.outcome.failures, 0);
}

#[test]
fn export_writes_marker_for_failed_rows() {
    let dir = TempDir::new("export").unwrap();
    write_decay(dir.path(), "S1_CL_T1.csv", [1.0, 1.0, 0.0], 1);
    write_flat(dir.path(), "S1_CL_T2.csv");

    let out = run(&dir);
    let path = dir.path().join("results.tsv");
    write_table(&path, &out.table, ExportFormat::Tsv, "-").unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "File\tA\ttau\tC");
    assert!(lines[1].starts_with("S1_CL_T1.csv\t"));
    assert_eq!(lines[2], "S1_CL_T2.csv\t-\t-\t-");
}
