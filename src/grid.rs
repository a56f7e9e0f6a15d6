use serde::{Deserialize, Serialize};

use crate::config::SweepConfig;

/// One point in the sweep grid. Fully determines a simulator invocation,
/// apart from the per-repeat RNG run number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    /// Swept distance in metres.
    pub distance: f64,
    /// OBSS-PD threshold in dBm. `None` is the collapsed sentinel used while
    /// the feature is disabled and the threshold has no effect.
    pub obss_pd_threshold: Option<f64>,
    pub obss_pd_enabled: bool,
    /// Position in sweep-generation order; feeds per-run seed derivation.
    pub ordinal: usize,
}

/// Expands the configured dimensions into the full grid, ordered mode
/// outermost, then threshold, then distance. The disabled mode contributes a
/// single collapsed threshold regardless of how many thresholds are
/// configured, so the feature-off baseline is not simulated once per
/// threshold for no reason.
pub fn generate_grid(config: &SweepConfig) -> Vec<ParameterSet> {
    let distances = config.distance_grid();
    let mut grid = Vec::new();

    for &enabled in &config.obss_pd_modes {
        let thresholds: Vec<Option<f64>> = if enabled {
            config.thresholds.iter().copied().map(Some).collect()
        } else {
            vec![None]
        };

        for threshold in thresholds {
            for &distance in &distances {
                grid.push(ParameterSet {
                    distance,
                    obss_pd_threshold: threshold,
                    obss_pd_enabled: enabled,
                    ordinal: grid.len(),
                });
            }
        }
    }

    grid
}
