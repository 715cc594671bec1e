//! World simulation engine.
//!
//! A continuous 2D map of food and creatures. Creatures age, forage, hunt,
//! flee and reproduce; their offspring inherit mutated genomes, so trait
//! distributions drift over time.

pub mod behavior;
pub mod control;
pub mod entity;
pub mod grid;
pub mod simulation;
pub mod snapshot;
pub mod task;
pub mod telemetry;
pub mod world;

pub use control::ControlHandle;
pub use entity::{Creature, CreatureMetrics, Food, FoodKind, Marker, MarkerKind, Target};
pub use grid::Grid;
pub use simulation::{RunSummary, Simulation, StopReason};
pub use snapshot::{CreatureView, FoodView, WorldSnapshot};
pub use task::{Task, TaskKind, TaskState};
pub use telemetry::{StatsHistory, StatsSink, TracingSink};
pub use world::{DeathCause, LifeformRef, World, WorldCounters};
