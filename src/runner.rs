use std::io::Read;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::SweepConfig;
use crate::grid::ParameterSet;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Outcome of one simulator invocation, before metric extraction.
#[derive(Debug, Clone)]
pub enum TrialRun {
    Completed { stdout: String },
    Failed { reason: TrialFailure },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialFailure {
    /// The process could not be spawned at all (missing binary, permissions).
    SpawnError,
    /// The process exited with a non-zero status.
    NonZeroExit,
    /// The process outlived the configured timeout and was killed.
    TimedOut,
}

impl std::fmt::Display for TrialFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrialFailure::SpawnError => write!(f, "spawn error"),
            TrialFailure::NonZeroExit => write!(f, "non-zero exit"),
            TrialFailure::TimedOut => write!(f, "timed out"),
        }
    }
}

/// Per-run RNG seed: strictly increasing across the whole sweep and a pure
/// function of the grid position, so repeats stay independent and re-running
/// any single grid point reproduces the same seeds regardless of order.
pub fn run_seed(base: u64, ordinal: usize, runs: usize, repeat: usize) -> u64 {
    base + (ordinal * runs + repeat) as u64 + 1
}

/// Anything that can produce one trial for a grid point. The production
/// implementation shells out to the simulator; tests substitute canned
/// output.
pub trait TrialExecutor {
    fn execute(&self, params: &ParameterSet, seed: Option<u64>) -> TrialRun;
}

/// Invokes the external simulator via its command-line wrapper.
pub struct CommandExecutor<'a> {
    config: &'a SweepConfig,
}

impl<'a> CommandExecutor<'a> {
    pub fn new(config: &'a SweepConfig) -> Self {
        Self { config }
    }

    fn value_args(&self, params: &ParameterSet, seed: Option<u64>) -> Vec<String> {
        let config = self.config;
        let mut args = vec![format!("--{}={}", config.distance_arg, params.distance)];

        if let Some(threshold) = params.obss_pd_threshold {
            args.push(format!("--{}={}", config.threshold_arg, threshold));
        }
        args.push(format!(
            "--{}={}",
            config.enable_arg, params.obss_pd_enabled
        ));
        if let Some(seed) = seed {
            args.push(format!("--{}={}", config.seed_arg, seed));
        }
        args.extend(config.extra_args.iter().cloned());

        args
    }

    /// Full argument vector after the program name. With a `target`
    /// configured, the scenario and its arguments are bundled into one
    /// trailing string the way `./ns3 run "scratch/2BSS --d3=40 ..."`
    /// expects; without one they are passed through verbatim.
    pub fn argv(&self, params: &ParameterSet, seed: Option<u64>) -> Vec<String> {
        let value_args = self.value_args(params, seed);

        match &self.config.target {
            Some(target) => {
                let mut argv = self.config.run_prefix.clone();
                argv.push(format!("{} {}", target, value_args.join(" ")));
                argv
            }
            None => {
                let mut argv = self.config.run_prefix.clone();
                argv.extend(value_args);
                argv
            }
        }
    }

    fn command_line(&self, params: &ParameterSet, seed: Option<u64>) -> String {
        let mut parts = vec![self.config.program.clone()];
        parts.extend(self.argv(params, seed));
        parts.join(" ")
    }
}

impl TrialExecutor for CommandExecutor<'_> {
    fn execute(&self, params: &ParameterSet, seed: Option<u64>) -> TrialRun {
        println!("Running simulation: {}", self.command_line(params, seed));

        let spawned = Command::new(&self.config.program)
            .args(self.argv(params, seed))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn();

        let mut child = match spawned {
            Ok(child) => child,
            Err(error) => {
                eprintln!("failed to launch {}: {}", self.config.program, error);
                return TrialRun::Failed {
                    reason: TrialFailure::SpawnError,
                };
            }
        };

        // Drain stdout on a separate thread so a chatty simulator cannot
        // fill the pipe and stall while we poll for exit.
        let mut stdout_pipe = match child.stdout.take() {
            Some(pipe) => pipe,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return TrialRun::Failed {
                    reason: TrialFailure::SpawnError,
                };
            }
        };
        let reader = thread::spawn(move || {
            let mut captured = String::new();
            let _ = stdout_pipe.read_to_string(&mut captured);
            captured
        });

        let deadline = Instant::now() + Duration::from_secs(self.config.timeout_secs);
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        let _ = reader.join();
                        return TrialRun::Failed {
                            reason: TrialFailure::TimedOut,
                        };
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(_) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = reader.join();
                    return TrialRun::Failed {
                        reason: TrialFailure::SpawnError,
                    };
                }
            }
        };

        let stdout = reader.join().unwrap_or_default();

        if status.success() {
            TrialRun::Completed { stdout }
        } else {
            TrialRun::Failed {
                reason: TrialFailure::NonZeroExit,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SweepConfig;

    fn point(enabled: bool, threshold: Option<f64>) -> ParameterSet {
        ParameterSet {
            distance: 40.0,
            obss_pd_threshold: threshold,
            obss_pd_enabled: enabled,
            ordinal: 3,
        }
    }

    #[test]
    fn seeds_are_strictly_increasing_and_order_independent() {
        let base = 100;
        let runs = 5;
        let mut seen = Vec::new();
        for ordinal in 0..4 {
            for repeat in 0..runs {
                seen.push(run_seed(base, ordinal, runs, repeat));
            }
        }
        for pair in seen.windows(2) {
            assert!(pair[1] > pair[0]);
        }
        // the base itself is never issued; a base of 100 starts at 101
        assert_eq!(run_seed(base, 0, runs, 0), 101);
        // re-deriving a mid-sweep seed needs no loop-carried state
        assert_eq!(run_seed(base, 2, runs, 3), seen[13]);
    }

    #[test]
    fn bundles_scenario_into_single_argument() {
        let config = SweepConfig::default();
        let executor = CommandExecutor::new(&config);
        let argv = executor.argv(&point(true, Some(-72.0)), Some(105));
        assert_eq!(argv.len(), 2);
        assert_eq!(argv[0], "run");
        assert_eq!(
            argv[1],
            "scratch/2BSS --d3=40 --obssPdThreshold=-72 --enableObssPd=true --rngRun=105"
        );
    }

    #[test]
    fn direct_invocation_passes_separate_arguments() {
        let config = SweepConfig {
            run_prefix: Vec::new(),
            target: None,
            extra_args: vec!["--quiet".to_string()],
            ..SweepConfig::default()
        };
        let executor = CommandExecutor::new(&config);
        let argv = executor.argv(&point(true, Some(-72.0)), None);
        assert_eq!(
            argv,
            vec![
                "--d3=40".to_string(),
                "--obssPdThreshold=-72".to_string(),
                "--enableObssPd=true".to_string(),
                "--quiet".to_string(),
            ]
        );
    }

    #[test]
    fn disabled_mode_omits_threshold_argument() {
        let config = SweepConfig::default();
        let executor = CommandExecutor::new(&config);
        let argv = executor.argv(&point(false, None), None);
        assert_eq!(argv[1], "scratch/2BSS --d3=40 --enableObssPd=false");
    }
}
