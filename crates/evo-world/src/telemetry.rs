//! Destinations for periodic population statistics.

use evo_core::{PopulationStats, Result, TraitSummary};
use std::collections::VecDeque;
use tracing::{event, info, Level};

/// Receives a statistics snapshot every stats interval.
/// Errors are logged by the driver and otherwise ignored.
pub trait StatsSink: Send {
    fn record(&mut self, stats: &PopulationStats) -> Result<()>;
}

/// Logs each snapshot, plus one gauge event per headline number
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TracingSink {
    fn trait_gauge(name: &str, summary: &TraitSummary) {
        event!(
            Level::INFO,
            gauge_name = format!("trait_{}_mean", name),
            gauge_value = summary.mean,
            gauge_min = summary.min,
            gauge_max = summary.max,
            "Trait gauge"
        );
    }
}

impl StatsSink for TracingSink {
    fn record(&mut self, stats: &PopulationStats) -> Result<()> {
        info!(
            event = "population_metrics",
            tick = stats.tick,
            creatures = stats.creatures,
            food = stats.food,
            max_generation = stats.max_generation,
            mean_size = format!("{:.3}", stats.size.mean),
            mean_speed = format!("{:.3}", stats.speed.mean),
            mean_perception = format!("{:.3}", stats.perception.mean),
            mean_digestion = format!("{:.3}", stats.digestion.mean),
            mean_energy = format!("{:.1}", stats.energy.mean),
            "Population snapshot"
        );

        event!(
            Level::INFO,
            gauge_name = "population_total",
            gauge_value = stats.creatures,
            "Population gauge"
        );
        event!(
            Level::INFO,
            gauge_name = "food_total",
            gauge_value = stats.food,
            "Food gauge"
        );
        event!(
            Level::INFO,
            gauge_name = "max_generation",
            gauge_value = stats.max_generation,
            "Generation gauge"
        );
        Self::trait_gauge("size", &stats.size);
        Self::trait_gauge("speed", &stats.speed);
        Self::trait_gauge("perception", &stats.perception);
        Self::trait_gauge("digestion", &stats.digestion);
        Ok(())
    }
}

/// Bounded history of snapshots, oldest first
#[derive(Debug, Clone)]
pub struct StatsHistory {
    capacity: usize,
    entries: VecDeque<PopulationStats>,
}

impl StatsHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, stats: PopulationStats) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(stats);
    }

    pub fn latest(&self) -> Option<&PopulationStats> {
        self.entries.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PopulationStats> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl StatsSink for StatsHistory {
    fn record(&mut self, stats: &PopulationStats) -> Result<()> {
        self.push(stats.clone());
        Ok(())
    }
}
