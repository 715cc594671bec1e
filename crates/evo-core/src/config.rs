//! Configuration types for the simulation.

use crate::error::{Error, Result};
use crate::types::MapBounds;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Map geometry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Map width in tiles
    pub map_tiles_x: u32,
    /// Map height in tiles
    pub map_tiles_y: u32,
    /// Edge length of a tile, in distance units
    pub tile_size: f64,
    /// Entities never get closer than this to the map edge
    pub map_margin: f64,
    /// Edge length of a spatial index cell
    pub cell_size: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            map_tiles_x: 6,
            map_tiles_y: 4,
            tile_size: 256.0,
            map_margin: 20.0,
            cell_size: 128.0,
        }
    }
}

impl WorldConfig {
    pub fn tile_count(&self) -> u32 {
        self.map_tiles_x * self.map_tiles_y
    }

    pub fn map_width(&self) -> f64 {
        self.map_tiles_x as f64 * self.tile_size
    }

    pub fn map_height(&self) -> f64 {
        self.map_tiles_y as f64 * self.tile_size
    }

    pub fn bounds(&self) -> MapBounds {
        MapBounds::new(
            self.map_width(),
            self.map_height(),
            self.map_margin,
            self.tile_size - self.map_margin,
        )
    }
}

/// Population seeding and food supply
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Creatures rolled at world-seed time
    pub initial_creatures: u32,
    /// Food items placed at world-seed time
    pub food_start: u32,
    /// No food spawns while this many items exist
    pub food_max: u32,
    /// Spawn chance per tile per tick
    pub food_chance: f64,
}

impl SpawnConfig {
    /// Defaults scale with the number of map tiles
    pub fn for_tiles(tile_count: u32) -> Self {
        Self {
            initial_creatures: tile_count * 2,
            food_start: tile_count * 5,
            food_max: tile_count * 8,
            food_chance: 0.01,
        }
    }

    /// Nothing spawns, neither at seed time nor during ticks
    pub fn none() -> Self {
        Self {
            initial_creatures: 0,
            food_start: 0,
            food_max: 0,
            food_chance: 0.0,
        }
    }
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self::for_tiles(WorldConfig::default().tile_count())
    }
}

/// Creature metabolism and behavior tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreatureConfig {
    /// Upkeep grows by `age * decay` every tick
    pub decay: f64,
    /// Nutrition value = size cost * multiplier; also the starting energy
    pub nutrition_multiplier: f64,
    /// Reproduction cost as a fraction of nutrition value
    pub reproduction_cost_ratio: f64,
    /// Size ratio beyond which another creature is prey or predator
    pub predator_margin: f64,
    /// Nutrition drained per consume tick, before digestion scaling
    pub bite_rate: f64,
    pub gestation_ticks: u32,
    pub wean_ticks: u32,
    /// Escape markers are placed this fraction of perception distance away
    pub escape_distance_ratio: f64,
    /// Past positions kept for display
    pub waypoint_capacity: usize,
    /// Perception distance = perception value * scale
    pub perception_distance_scale: f64,
    /// Root genes are rolled within `default ± span * spread`
    pub genome_seed_spread: f64,
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            decay: 0.00075,
            nutrition_multiplier: 1800.0,
            reproduction_cost_ratio: 0.6,
            predator_margin: 1.25,
            bite_rate: 50.0,
            gestation_ticks: 30,
            wean_ticks: 20,
            escape_distance_ratio: 0.5,
            waypoint_capacity: 10,
            perception_distance_scale: 200.0,
            genome_seed_spread: 0.1,
        }
    }
}

/// Full simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the shared random generator
    pub seed: u64,
    /// Population statistics are collected every this many ticks
    pub stats_interval: u64,
    /// Number of statistics snapshots kept for charts
    pub stats_history: usize,
    pub world: WorldConfig,
    pub spawn: SpawnConfig,
    pub creature: CreatureConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            stats_interval: 150,
            stats_history: 250,
            world: WorldConfig::default(),
            spawn: SpawnConfig::default(),
            creature: CreatureConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let world = &self.world;
        if world.tile_count() == 0 {
            return Err(Error::Config("map must have at least one tile".to_string()));
        }
        if world.tile_size <= 0.0 || world.cell_size <= 0.0 {
            return Err(Error::Config(
                "tile_size and cell_size must be positive".to_string(),
            ));
        }
        if world.map_margin < 0.0 || world.map_margin * 2.0 >= world.map_width().min(world.map_height()) {
            return Err(Error::Config(format!(
                "map_margin {} leaves no playable area",
                world.map_margin
            )));
        }
        if !(0.0..=1.0).contains(&self.spawn.food_chance) {
            return Err(Error::Config(format!(
                "food_chance {} outside [0, 1]",
                self.spawn.food_chance
            )));
        }
        let creature = &self.creature;
        if creature.bite_rate <= 0.0 || creature.nutrition_multiplier <= 0.0 {
            return Err(Error::Config(
                "bite_rate and nutrition_multiplier must be positive".to_string(),
            ));
        }
        if creature.predator_margin < 1.0 {
            return Err(Error::Config(format!(
                "predator_margin {} below 1",
                creature.predator_margin
            )));
        }
        if self.stats_interval == 0 {
            return Err(Error::Config("stats_interval must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Lower and upper bound for the runner's ticks per second
pub const SPEED_RANGE: (u32, u32) = (1, 200);
pub const DEFAULT_SPEED: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Headless runner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Ticks per second
    pub speed: u32,
    /// Stop after this many ticks
    pub max_ticks: Option<u64>,
    /// Stop once no creature is left
    pub quit_on_extinct: bool,
    pub log_format: LogFormat,
    pub simulation: SimulationConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
            max_ticks: None,
            quit_on_extinct: false,
            log_format: LogFormat::Pretty,
            simulation: SimulationConfig::new(0),
        }
    }
}

impl RunnerConfig {
    /// Read a JSON config file; missing fields take their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: RunnerConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(SPEED_RANGE.0..=SPEED_RANGE.1).contains(&self.speed) {
            return Err(Error::Config(format!(
                "speed {} outside {}..={}",
                self.speed, SPEED_RANGE.0, SPEED_RANGE.1
            )));
        }
        self.simulation.validate()
    }
}
