//! Population statistics collected by the tick driver.

use serde::{Deserialize, Serialize};

/// Distribution summary of one trait over the live population
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TraitSummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    /// 10th percentile
    pub low: f64,
    /// 90th percentile
    pub high: f64,
}

impl TraitSummary {
    /// Summarize a set of values. An empty set yields all zeros.
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let quantile = |q: f64| {
            let index = ((sorted.len() as f64 * q) as usize).min(sorted.len() - 1);
            sorted[index]
        };

        Self {
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            median: quantile(0.5),
            low: quantile(0.1),
            high: quantile(0.9),
        }
    }
}

/// Snapshot of the population at one tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    pub tick: u64,
    pub creatures: usize,
    pub food: usize,
    pub max_generation: u32,
    pub size: TraitSummary,
    pub speed: TraitSummary,
    pub perception: TraitSummary,
    pub digestion: TraitSummary,
    pub energy: TraitSummary,
}

impl PopulationStats {
    pub fn is_extinct(&self) -> bool {
        self.creatures == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_summary_is_zero() {
        let summary = TraitSummary::from_values(&[]);
        assert_eq!(summary, TraitSummary::default());
        assert_eq!(summary.mean, 0.0);
    }

    #[test]
    fn test_summary_quantiles() {
        let values: Vec<f64> = (1..=10).rev().map(|v| v as f64).collect();
        let summary = TraitSummary::from_values(&values);

        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 10.0);
        assert_eq!(summary.mean, 5.5);
        assert_eq!(summary.median, 6.0);
        assert_eq!(summary.low, 2.0);
        assert_eq!(summary.high, 10.0);
    }

    #[test]
    fn test_single_value() {
        let summary = TraitSummary::from_values(&[2.5]);
        assert_eq!(summary.min, 2.5);
        assert_eq!(summary.median, 2.5);
        assert_eq!(summary.high, 2.5);
    }

    #[test]
    fn test_extinction() {
        let stats = PopulationStats::default();
        assert!(stats.is_extinct());
    }
}
