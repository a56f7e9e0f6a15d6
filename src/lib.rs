//! obss-sweep - ns-3 OBSS-PD spatial-reuse throughput sweep harness
//!
//! Drives an externally built ns-3 scenario across a grid of distance and
//! OBSS-PD threshold values, repeats each point with independent RNG runs,
//! scrapes the per-STA throughput from the simulator's stdout, and reduces
//! the repeats into a mean with a confidence half-width. Aggregated rows are
//! persisted as CSV and rendered as an error-bar chart.

pub mod config;
pub mod extract;
pub mod grid;
pub mod output;
pub mod plot;
pub mod results;
pub mod runner;
pub mod stats;
pub mod sweep;

use thiserror::Error;

pub use config::SweepConfig;
pub use extract::extract_throughput;
pub use grid::{generate_grid, ParameterSet};
pub use results::{AggregateRow, ResultTable};
pub use runner::{CommandExecutor, TrialExecutor, TrialRun};
pub use stats::{aggregate, Estimate, IntervalKind, StdDevKind};
pub use sweep::{run_sweep, run_sweep_into_dir, SweepReport};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("invalid result row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}
