use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::stats::{IntervalKind, StdDevKind};
use crate::SweepError;

/// Full description of one sweep: which grid points to visit, how to invoke
/// the simulator, and how to reduce the repeated trials.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Simulator launcher, e.g. `./ns3` or a path to `mock-sim`.
    pub program: String,
    /// Arguments inserted between the launcher and the scenario string,
    /// e.g. `["run"]` for the ns-3 wrapper. May be empty.
    pub run_prefix: Vec<String>,
    /// Scenario identifier, e.g. `scratch/2BSS`. When present, the scenario
    /// and all `--name=value` arguments are bundled into a single trailing
    /// argument the way the ns-3 wrapper expects. When absent, the
    /// `--name=value` arguments are passed directly to the program.
    pub target: Option<String>,
    /// Fixed `--name=value` arguments appended to every invocation.
    pub extra_args: Vec<String>,
    /// Wall-clock limit for a single invocation; exceeding it fails the trial.
    pub timeout_secs: u64,

    /// Name of the swept distance argument (`d3` between APs, `d2` AP to STA).
    pub distance_arg: String,
    pub threshold_arg: String,
    pub enable_arg: String,
    pub seed_arg: String,

    /// Explicit distance values in metres. When non-empty this list takes
    /// precedence over `distance_range`.
    pub distances: Vec<f64>,
    /// Half-open range `[start, stop)` walked in `step` increments.
    pub distance_range: Option<DistanceRange>,
    /// OBSS-PD thresholds in dBm, swept only while OBSS-PD is enabled.
    pub thresholds: Vec<f64>,
    /// OBSS-PD modes to visit, in order. With the feature disabled the
    /// threshold has no effect, so that mode contributes a single collapsed
    /// threshold instead of the full list.
    pub obss_pd_modes: Vec<bool>,

    /// Repeats per grid point.
    pub runs: usize,
    /// Base for per-run RNG seeds. `None` omits the seed argument entirely,
    /// for scenarios that are deterministic anyway.
    pub seed_base: Option<u64>,

    /// Confidence level in percent; 90, 95 and 99 are supported.
    pub confidence: u8,
    pub interval: IntervalKind,
    pub std_dev: StdDevKind,

    /// Substring identifying the throughput line in simulator stdout.
    pub marker: String,
    /// Field delimiter on the marker line.
    pub delimiter: char,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DistanceRange {
    pub start: f64,
    pub stop: f64,
    pub step: f64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            program: "./ns3".to_string(),
            run_prefix: vec!["run".to_string()],
            target: Some("scratch/2BSS".to_string()),
            extra_args: Vec::new(),
            timeout_secs: 600,
            distance_arg: "d3".to_string(),
            threshold_arg: "obssPdThreshold".to_string(),
            enable_arg: "enableObssPd".to_string(),
            seed_arg: "rngRun".to_string(),
            distances: Vec::new(),
            distance_range: Some(DistanceRange {
                start: 20.0,
                stop: 300.0,
                step: 20.0,
            }),
            thresholds: vec![-64.0, -72.0, -78.0],
            obss_pd_modes: vec![true, false],
            runs: 5,
            seed_base: Some(100),
            confidence: 95,
            interval: IntervalKind::StudentT,
            std_dev: StdDevKind::Sample,
            marker: "Throughput per STA:".to_string(),
            delimiter: '\t',
        }
    }
}

impl SweepConfig {
    pub fn from_toml_file(path: &Path) -> Result<Self, SweepError> {
        let raw = fs::read_to_string(path)?;
        let config: SweepConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SweepError> {
        if self.program.is_empty() {
            return Err(invalid("program must not be empty"));
        }
        if self.runs == 0 {
            return Err(invalid("runs must be greater than zero"));
        }
        if self.timeout_secs == 0 {
            return Err(invalid("timeout_secs must be greater than zero"));
        }
        if self.marker.is_empty() {
            return Err(invalid("marker must not be empty"));
        }

        if let Some(range) = self.distance_range {
            if !range.start.is_finite() || !range.stop.is_finite() || !range.step.is_finite() {
                return Err(invalid("distance_range bounds must be finite"));
            }
            if range.step <= 0.0 {
                return Err(invalid("distance_range step must be greater than zero"));
            }
            if range.stop <= range.start {
                return Err(invalid("distance_range stop must be greater than start"));
            }
        }
        if self.distances.iter().any(|d| !d.is_finite()) {
            return Err(invalid("distances must be finite"));
        }
        if self.distance_grid().is_empty() {
            return Err(invalid(
                "either distances or distance_range must yield at least one value",
            ));
        }

        if self.obss_pd_modes.is_empty() {
            return Err(invalid("obss_pd_modes must not be empty"));
        }
        if self.obss_pd_modes.len() > 2
            || (self.obss_pd_modes.len() == 2
                && self.obss_pd_modes[0] == self.obss_pd_modes[1])
        {
            return Err(invalid("obss_pd_modes must not repeat a mode"));
        }
        if self.obss_pd_modes.contains(&true) {
            if self.thresholds.is_empty() {
                return Err(invalid(
                    "thresholds must not be empty while OBSS-PD is enabled",
                ));
            }
            if self.thresholds.iter().any(|t| !t.is_finite()) {
                return Err(invalid("thresholds must be finite"));
            }
        }

        if !matches!(self.confidence, 90 | 95 | 99) {
            return Err(invalid("confidence must be one of 90, 95, 99"));
        }

        Ok(())
    }

    /// Swept distance values: the explicit list when given, otherwise the
    /// half-open range (`stop` itself is excluded).
    pub fn distance_grid(&self) -> Vec<f64> {
        if !self.distances.is_empty() {
            return self.distances.clone();
        }
        if let Some(range) = self.distance_range {
            let mut grid = Vec::new();
            let mut idx = 0_usize;
            loop {
                let value = range.start + range.step * idx as f64;
                if value >= range.stop {
                    break;
                }
                grid.push(value);
                idx += 1;
            }
            grid
        } else {
            Vec::new()
        }
    }
}

fn invalid(message: &str) -> SweepError {
    SweepError::InvalidConfig(message.to_string())
}
