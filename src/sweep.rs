use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::config::SweepConfig;
use crate::extract::extract_throughput;
use crate::grid::{generate_grid, ParameterSet};
use crate::output::{create_timestamped_run_dir, write_manifest, Manifest, OUTPUT_SCHEMA_VERSION};
use crate::plot::render_chart;
use crate::results::{AggregateRow, ResultTable, TableWriter};
use crate::runner::{run_seed, TrialExecutor, TrialRun};
use crate::stats::aggregate;

/// Artifact paths and counters for one completed sweep.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub output_dir: PathBuf,
    pub csv_path: PathBuf,
    pub manifest_path: PathBuf,
    pub chart_path: PathBuf,
    pub combinations: usize,
    pub trials: usize,
    pub absent_trials: usize,
    pub table: ResultTable,
}

fn describe(params: &ParameterSet) -> String {
    match params.obss_pd_threshold {
        Some(threshold) => format!(
            "Distance: {} m, Threshold: {} dBm, OBSS-PD enabled",
            params.distance, threshold
        ),
        None => format!("Distance: {} m, OBSS-PD disabled", params.distance),
    }
}

/// Runs the configured sweep and writes `results.csv`, `manifest.json` and
/// `throughput_vs_distance.png` into `run_dir`.
///
/// Failed or unparsable trials are dropped from the sample for their grid
/// point and counted; nothing short of a broken configuration aborts the
/// sweep, so a long run always leaves a complete (if degraded) result table
/// behind.
pub fn run_sweep_into_dir<E: TrialExecutor>(
    config: &SweepConfig,
    executor: &E,
    run_dir: &Path,
) -> anyhow::Result<SweepReport> {
    config.validate()?;
    std::fs::create_dir_all(run_dir)?;

    let grid = generate_grid(config);
    let mut table = ResultTable::new();
    let mut trials = 0_usize;
    let mut absent_trials = 0_usize;

    // Rows hit the disk as soon as their grid point completes; a sweep
    // interrupted partway still leaves a readable results.csv behind.
    let csv_path = run_dir.join("results.csv");
    let mut csv_writer = TableWriter::create(&csv_path)?;

    for params in &grid {
        let mut measurements = Vec::with_capacity(config.runs);

        for repeat in 0..config.runs {
            trials += 1;
            let seed = config
                .seed_base
                .map(|base| run_seed(base, params.ordinal, config.runs, repeat));

            let measured = match executor.execute(params, seed) {
                TrialRun::Completed { stdout } => {
                    extract_throughput(&stdout, &config.marker, config.delimiter)
                }
                TrialRun::Failed { reason } => {
                    eprintln!("trial failed ({reason}): {}", describe(params));
                    None
                }
            };

            match measured {
                Some(value) => measurements.push(value),
                None => absent_trials += 1,
            }
        }

        let (samples, estimate) = aggregate(
            &measurements,
            config.confidence,
            config.interval,
            config.std_dev,
        );

        match estimate {
            Some(estimate) => println!(
                "{}, Throughput: {:.2} +/- {:.2} Mbps ({} of {} trials)",
                describe(params),
                estimate.mean,
                estimate.half_width,
                samples,
                config.runs
            ),
            None => println!("{}, no successful trials", describe(params)),
        }

        let row = AggregateRow {
            params: params.clone(),
            samples,
            estimate,
        };
        csv_writer.append(&row)?;
        table.push(row);
    }

    let chart_path = run_dir.join("throughput_vs_distance.png");
    render_chart(&table, config.confidence, &chart_path)?;

    let manifest_path = write_manifest(
        run_dir,
        &Manifest {
            schema_version: OUTPUT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            config: config.clone(),
            combinations: grid.len(),
            trials,
            absent_trials,
        },
    )?;

    Ok(SweepReport {
        output_dir: run_dir.to_path_buf(),
        csv_path,
        manifest_path,
        chart_path,
        combinations: grid.len(),
        trials,
        absent_trials,
        table,
    })
}

/// Like `run_sweep_into_dir`, but allocates a timestamped directory under
/// `output_root` first.
pub fn run_sweep<E: TrialExecutor>(
    config: &SweepConfig,
    executor: &E,
    output_root: &Path,
) -> anyhow::Result<SweepReport> {
    let run_dir = create_timestamped_run_dir(output_root)?;
    run_sweep_into_dir(config, executor, &run_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::TrialFailure;
    use std::path::PathBuf;

    /// Deterministic stand-in: scripts trial outcomes per grid point.
    struct FakeExecutor<F: Fn(&ParameterSet, Option<u64>) -> TrialRun> {
        behavior: F,
    }

    impl<F: Fn(&ParameterSet, Option<u64>) -> TrialRun> TrialExecutor for FakeExecutor<F> {
        fn execute(&self, params: &ParameterSet, seed: Option<u64>) -> TrialRun {
            (self.behavior)(params, seed)
        }
    }

    fn small_config() -> SweepConfig {
        SweepConfig {
            distances: vec![20.0, 40.0],
            distance_range: None,
            thresholds: vec![-72.0],
            obss_pd_modes: vec![true, false],
            runs: 3,
            ..SweepConfig::default()
        }
    }

    fn run_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "obss-sweep-driver-{}-{}",
            std::process::id(),
            name
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn aggregates_one_row_per_grid_point() {
        let executor = FakeExecutor {
            behavior: |params: &ParameterSet, _| TrialRun::Completed {
                stdout: format!("Throughput per STA:\t{} Mbps\n", 50.0 - params.distance * 0.1),
            },
        };
        let config = small_config();
        let report = run_sweep_into_dir(&config, &executor, &run_dir("rows")).unwrap();

        assert_eq!(report.combinations, 4);
        assert_eq!(report.table.len(), 4);
        assert_eq!(report.trials, 12);
        assert_eq!(report.absent_trials, 0);
        for row in report.table.rows() {
            assert_eq!(row.samples, 3);
            let estimate = row.estimate.unwrap();
            assert!((estimate.mean - (50.0 - row.params.distance * 0.1)).abs() < 1e-9);
            assert_eq!(estimate.half_width, 0.0);
        }
        assert!(report.csv_path.exists());
        assert!(report.chart_path.exists());
        assert!(report.manifest_path.exists());
    }

    #[test]
    fn failed_trials_shrink_the_sample_without_aborting() {
        // exactly one of the three consecutive seeds per point is 2 mod 3
        let executor = FakeExecutor {
            behavior: |_: &ParameterSet, seed: Option<u64>| {
                if seed.unwrap() % 3 == 2 {
                    TrialRun::Failed {
                        reason: TrialFailure::NonZeroExit,
                    }
                } else {
                    TrialRun::Completed {
                        stdout: "Throughput per STA:\t30.0 Mbps\n".to_string(),
                    }
                }
            },
        };
        let config = small_config();
        let report = run_sweep_into_dir(&config, &executor, &run_dir("failures")).unwrap();

        assert_eq!(report.absent_trials, 4);
        for row in report.table.rows() {
            assert_eq!(row.samples, 2);
            assert!(row.estimate.is_some());
        }
    }

    #[test]
    fn all_failed_point_persists_as_absent() {
        let executor = FakeExecutor {
            behavior: |params: &ParameterSet, _| {
                if params.obss_pd_enabled {
                    TrialRun::Failed {
                        reason: TrialFailure::TimedOut,
                    }
                } else {
                    TrialRun::Completed {
                        stdout: "Throughput per STA:\t28.4 Mbps\n".to_string(),
                    }
                }
            },
        };
        let config = small_config();
        let report = run_sweep_into_dir(&config, &executor, &run_dir("absent")).unwrap();

        let read_back = ResultTable::read_csv(&report.csv_path).unwrap();
        for row in read_back.rows() {
            if row.params.obss_pd_enabled {
                assert_eq!(row.samples, 0);
                assert!(row.estimate.is_none());
            } else {
                assert_eq!(row.samples, 3);
                assert!(row.estimate.is_some());
            }
        }
    }

    #[test]
    fn unparsable_output_counts_as_absent_trial() {
        let executor = FakeExecutor {
            behavior: |_: &ParameterSet, _| TrialRun::Completed {
                stdout: "no marker here\n".to_string(),
            },
        };
        let config = SweepConfig {
            obss_pd_modes: vec![false],
            ..small_config()
        };
        let report = run_sweep_into_dir(&config, &executor, &run_dir("unparsable")).unwrap();
        assert_eq!(report.absent_trials, report.trials);
        assert!(report.table.rows().iter().all(|r| r.estimate.is_none()));
    }

    #[test]
    fn broken_config_fails_before_any_trial() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static CALLS: AtomicUsize = AtomicUsize::new(0);

        let executor = FakeExecutor {
            behavior: |_: &ParameterSet, _| {
                CALLS.fetch_add(1, Ordering::SeqCst);
                TrialRun::Completed {
                    stdout: String::new(),
                }
            },
        };
        let config = SweepConfig {
            runs: 0,
            ..small_config()
        };
        assert!(run_sweep_into_dir(&config, &executor, &run_dir("broken")).is_err());
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);
    }
}
