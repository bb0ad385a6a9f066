//! Per-simulation tunables (spec §6).

use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::model::Delay;

/// Time-window filter on edge delay. `All` disables the filter
/// entirely (spec §4.4: "`time_window = all` disabling the filter").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    Immediate,
    Minutes,
    Hours,
    Days,
    All,
}

impl TimeWindow {
    /// Whether an edge with the given delay bucket survives this filter.
    pub fn admits(&self, delay: Delay) -> bool {
        match self {
            TimeWindow::All => true,
            TimeWindow::Immediate => delay <= Delay::Immediate,
            TimeWindow::Minutes => delay <= Delay::Minutes,
            TimeWindow::Hours => delay <= Delay::Hours,
            TimeWindow::Days => delay <= Delay::Days,
        }
    }
}

/// Options accompanying a [`crate::propagation::SimulationRequest`].
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SimulationOptions {
    /// Maximum hop count from any seed. `0` is valid and yields only the
    /// seeds themselves (spec §8 boundary).
    pub max_hops: u32,
    pub min_confidence: f64,
    pub time_window: TimeWindow,
    /// Passed through to the response envelope unchanged; the engine
    /// does not interpret it (spec §6).
    pub dim_unaffected: bool,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        SimulationOptions {
            max_hops: 5,
            min_confidence: 0.0,
            time_window: TimeWindow::All,
            dim_unaffected: false,
        }
    }
}

impl SimulationOptions {
    pub fn validate(&self) -> Result<(), SimulationError> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(SimulationError::InvalidOption {
                name: "min_confidence".to_string(),
                detail: format!("{} not in [0, 1]", self.min_confidence),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_window_all_admits_everything() {
        for d in [Delay::Immediate, Delay::Minutes, Delay::Hours, Delay::Days] {
            assert!(TimeWindow::All.admits(d));
        }
    }

    #[test]
    fn time_window_filters_slower_buckets() {
        assert!(TimeWindow::Minutes.admits(Delay::Immediate));
        assert!(TimeWindow::Minutes.admits(Delay::Minutes));
        assert!(!TimeWindow::Minutes.admits(Delay::Hours));
        assert!(!TimeWindow::Minutes.admits(Delay::Days));
    }

    #[test]
    fn rejects_out_of_range_min_confidence() {
        let mut opts = SimulationOptions::default();
        opts.min_confidence = 1.5;
        assert!(opts.validate().is_err());
        opts.min_confidence = -0.1;
        assert!(opts.validate().is_err());
    }
}
