//! Tick driver: owns the world and advances it one tick at a time.

use crate::behavior::update_creature;
use crate::control::ControlHandle;
use crate::entity::{Creature, FoodKind};
use crate::snapshot::{CreatureView, FoodView, WorldSnapshot};
use crate::telemetry::{StatsHistory, StatsSink};
use crate::world::{World, WorldCounters};
use evo_core::{EntityId, Error, PopulationStats, Result, SimulationConfig, TraitSummary, Vec2};
use evo_genome::Genome;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, event, info, instrument, trace, warn, Level};

pub struct Simulation {
    config: SimulationConfig,
    world: World,
    tick: u64,
    sinks: Vec<Box<dyn StatsSink>>,
    history: StatsHistory,
    control: ControlHandle,
    quit_on_extinct: bool,
}

impl Simulation {
    /// Validated world seeded with the configured creatures and food
    pub fn new(config: SimulationConfig) -> Result<Self> {
        let mut sim = Self::empty(config)?;

        for _ in 0..sim.config.spawn.initial_creatures {
            sim.world.spawn_random_creature();
        }
        for _ in 0..sim.config.spawn.food_start {
            sim.world.spawn_random_food();
        }

        info!(
            seed = sim.config.seed,
            creatures = sim.world.creature_count(),
            food = sim.world.food_count(),
            width = sim.world.bounds.width,
            height = sim.world.bounds.height,
            "World seeded"
        );
        Ok(sim)
    }

    /// Validated world with nothing in it
    pub fn empty(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let world = World::new(&config);
        let history = StatsHistory::new(config.stats_history);
        Ok(Self {
            config,
            world,
            tick: 0,
            sinks: Vec::new(),
            history,
            control: ControlHandle::default(),
            quit_on_extinct: false,
        })
    }

    pub fn with_control(mut self, control: ControlHandle) -> Self {
        self.control = control;
        self
    }

    pub fn set_quit_on_extinct(&mut self, quit: bool) {
        self.quit_on_extinct = quit;
    }

    pub fn add_sink(&mut self, sink: Box<dyn StatsSink>) {
        self.sinks.push(sink);
    }

    pub fn spawn_creature_at(&mut self, genome: Genome, position: Vec2) -> EntityId {
        self.world.spawn_creature(genome, position)
    }

    pub fn spawn_food_at(&mut self, kind: FoodKind, position: Vec2) -> EntityId {
        self.world.spawn_food(kind, position)
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn control(&self) -> &ControlHandle {
        &self.control
    }

    pub fn history(&self) -> &StatsHistory {
        &self.history
    }

    pub fn latest_stats(&self) -> Option<&PopulationStats> {
        self.history.latest()
    }

    pub fn is_extinct(&self) -> bool {
        self.world.creature_count() == 0
    }

    /// Advance the world by one tick
    #[instrument(level = "trace", skip(self), fields(tick = self.tick))]
    pub fn step(&mut self) {
        self.spawn_food();
        self.world.rebuild_grid();
        let had_creatures = !self.is_extinct();

        // Creatures born during this tick act from the next one
        for id in self.world.creature_ids() {
            update_creature(&mut self.world, id, &self.config.creature);
        }

        self.tick += 1;
        trace!(
            tick = self.tick,
            creatures = self.world.creature_count(),
            food = self.world.food_count(),
            "Tick complete"
        );

        if had_creatures && self.is_extinct() {
            info!(
                event = "extinction",
                tick = self.tick,
                births = self.world.counters.births,
                "Population extinct"
            );
        }

        if let Some(id) = self.control.spotlight() {
            if !self.world.is_alive(id) && self.control.release_spotlight(id) {
                debug!(entity_id = %id, "Spotlight cleared");
            }
        }

        if self.tick % self.config.stats_interval == 0 {
            let stats = self.collect_stats();
            self.publish(stats);
        }
    }

    /// One roll per tile while below the food cap
    fn spawn_food(&mut self) {
        let spawn = &self.config.spawn;
        if spawn.food_chance <= 0.0 {
            return;
        }
        for _ in 0..self.config.world.tile_count() {
            if self.world.food_count() >= spawn.food_max as usize {
                break;
            }
            if self.world.rng.gen_bool(spawn.food_chance) {
                self.world.spawn_random_food();
            }
        }
    }

    /// Trait and energy distributions over the live population
    pub fn collect_stats(&self) -> PopulationStats {
        let creatures: Vec<&Creature> = self.world.creatures().collect();

        PopulationStats {
            tick: self.tick,
            creatures: creatures.len(),
            food: self.world.food_count(),
            max_generation: creatures.iter().map(|c| c.generation).max().unwrap_or(0),
            size: summarize(&creatures, |c| c.genome.size.value()),
            speed: summarize(&creatures, |c| c.genome.speed.value()),
            perception: summarize(&creatures, |c| c.genome.perception.value()),
            digestion: summarize(&creatures, |c| c.genome.digestion.value()),
            energy: summarize(&creatures, |c| c.energy),
        }
    }

    fn publish(&mut self, stats: PopulationStats) {
        for sink in &mut self.sinks {
            if let Err(e) = sink.record(&stats) {
                warn!(tick = stats.tick, error = %e, "Stats sink failed");
            }
        }
        self.history.push(stats);
    }

    /// Step until `max_ticks`, a stop request or (if enabled) extinction
    #[instrument(skip(self), fields(seed = self.config.seed))]
    pub fn run(&mut self, max_ticks: u64) -> RunSummary {
        info!("Starting simulation for {} ticks", max_ticks);
        let start = self.tick;
        let mut reason = StopReason::MaxTicks;

        while self.tick - start < max_ticks {
            if self.control.is_stopped() {
                reason = StopReason::Stopped;
                break;
            }
            if self.quit_on_extinct && self.is_extinct() {
                reason = StopReason::Extinct;
                break;
            }

            self.step();

            if self.tick % 1000 == 0 {
                info!(
                    "Tick {}: {} creatures, {} food",
                    self.tick,
                    self.world.creature_count(),
                    self.world.food_count()
                );
            }
        }

        let summary = self.summary(self.tick - start, reason);
        summary.log();
        summary
    }

    /// Totals since the world was created
    pub fn summary(&self, ticks_run: u64, reason: StopReason) -> RunSummary {
        let oldest = self.world.creatures().max_by_key(|c| c.age);
        RunSummary {
            ticks_run,
            final_tick: self.tick,
            reason,
            creatures: self.world.creature_count(),
            food: self.world.food_count(),
            max_generation: self.world.creatures().map(|c| c.generation).max().unwrap_or(0),
            oldest_age: oldest.map(|c| c.age).unwrap_or(0),
            counters: self.world.counters.clone(),
        }
    }

    /// Detail view of one creature, e.g. the spotlighted one
    pub fn creature_view(&self, id: EntityId) -> Result<CreatureView> {
        let creature = self.world.creature(id).ok_or(Error::NotFound(id))?;
        Ok(CreatureView::new(creature, &self.world, &self.config.creature))
    }

    /// Read-only view for presentation
    pub fn snapshot(&self) -> WorldSnapshot {
        let creature_config = &self.config.creature;
        WorldSnapshot {
            tick: self.tick,
            width: self.world.bounds.width,
            height: self.world.bounds.height,
            creatures: self
                .world
                .creatures()
                .map(|c| CreatureView::new(c, &self.world, creature_config))
                .collect(),
            foods: self.world.foods().map(FoodView::from).collect(),
            stats: self.latest_stats().cloned(),
            spotlight: self.control.spotlight(),
        }
    }
}

fn summarize(creatures: &[&Creature], value: impl Fn(&Creature) -> f64) -> TraitSummary {
    let values: Vec<f64> = creatures.iter().map(|c| value(c)).collect();
    TraitSummary::from_values(&values)
}

/// Why [`Simulation::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MaxTicks,
    Stopped,
    Extinct,
}

/// End-of-run report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks_run: u64,
    pub final_tick: u64,
    pub reason: StopReason,
    pub creatures: usize,
    pub food: usize,
    pub max_generation: u32,
    pub oldest_age: u64,
    pub counters: WorldCounters,
}

impl RunSummary {
    /// Emit the episode summary and final gauges
    pub fn log(&self) {
        info!(
            event = "episode_summary",
            ticks_run = self.ticks_run,
            final_tick = self.final_tick,
            reason = ?self.reason,
            survivors = self.creatures,
            food = self.food,
            max_generation = self.max_generation,
            oldest_age = self.oldest_age,
            births = self.counters.births,
            starved = self.counters.starved,
            eaten = self.counters.eaten,
            food_spawned = self.counters.food_spawned,
            food_eaten = self.counters.food_eaten,
            "Episode complete"
        );

        event!(
            Level::INFO,
            gauge_name = "final_population",
            gauge_value = self.creatures,
            "Final population gauge"
        );
        event!(
            Level::INFO,
            histogram_name = "episode_duration",
            histogram_value = self.ticks_run,
            "Episode duration histogram"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{MarkerKind, Target};
    use evo_core::SpawnConfig;
    use evo_genome::Trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn quiet_config(seed: u64) -> SimulationConfig {
        let mut config = SimulationConfig::new(seed);
        config.spawn = SpawnConfig::none();
        config
    }

    fn empty(seed: u64) -> Simulation {
        Simulation::empty(quiet_config(seed)).unwrap()
    }

    #[test]
    fn test_simulation_creation() {
        let sim = Simulation::new(SimulationConfig::new(42)).unwrap();
        let spawn = SpawnConfig::default();
        assert_eq!(sim.world().creature_count(), spawn.initial_creatures as usize);
        assert_eq!(sim.world().food_count(), spawn.food_start as usize);
        assert_eq!(sim.tick(), 0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = SimulationConfig::new(1);
        config.stats_interval = 0;
        assert!(matches!(Simulation::new(config), Err(Error::Config(_))));
    }

    #[test]
    fn test_creature_eats_nearby_food() {
        let mut sim = empty(1);
        let creature = sim.spawn_creature_at(Genome::default(), Vec2::new(300.0, 300.0));
        let food = sim.spawn_food_at(FoodKind::Cherry, Vec2::new(350.0, 300.0));
        let start_energy = sim.world().creature(creature).unwrap().energy;

        for _ in 0..200 {
            sim.step();
            if sim.world().food(food).is_none() {
                break;
            }
        }

        assert!(sim.world().food(food).is_none());
        let eater = sim.world().creature(creature).unwrap();
        assert!((eater.metrics.nutrition_consumed - 1000.0).abs() < 1e-9);
        // Nutrition minus the walk and upkeep
        assert!(eater.energy > start_energy + 700.0);
        assert!(eater.energy < start_energy + 1000.0);
        assert_eq!(sim.world().counters.food_eaten, 1);
    }

    #[test]
    fn test_predator_and_prey_pick_targets() {
        let mut sim = empty(2);
        let big = sim.spawn_creature_at(Genome::from_values(2.0, 1.0, 0.5, 5.0), Vec2::new(500.0, 500.0));
        let small = sim.spawn_creature_at(Genome::from_values(1.0, 1.0, 0.5, 5.0), Vec2::new(560.0, 500.0));

        sim.step();

        let predator = sim.world().creature(big).unwrap();
        assert_eq!(predator.target, Some(Target::Lifeform(small)));

        let prey = sim.world().creature(small).unwrap();
        match &prey.target {
            Some(Target::Marker(marker)) => {
                assert_eq!(marker.kind, MarkerKind::Escape);
                assert!(marker.position.x > 560.0);
            }
            other => panic!("expected escape marker, got {other:?}"),
        }
    }

    #[test]
    fn test_gestation_produces_one_offspring() {
        let mut sim = empty(3);
        let parent_id = sim.spawn_creature_at(Genome::default(), Vec2::new(700.0, 500.0));
        {
            let parent = sim.world_mut().creature_mut(parent_id).unwrap();
            parent.energy = parent.nutrition * 2.0;
        }

        for _ in 0..30 {
            sim.step();
        }
        assert_eq!(sim.world().creature_count(), 1);

        sim.step();
        assert_eq!(sim.world().creature_count(), 2);
        assert_eq!(sim.world().counters.births, 1);

        let parent = sim.world().creature(parent_id).unwrap();
        assert_eq!(parent.metrics.offspring, 1);
        let child = sim
            .world()
            .creatures()
            .find(|c| c.id != parent_id)
            .unwrap();
        assert_eq!(child.generation, parent.generation + 1);
        assert_eq!(child.parent, Some(parent_id));
        for kind in Trait::ALL {
            let bound = kind.spec().mutation_range();
            let delta = child.genome.gene(kind).value() - parent.genome.gene(kind).value();
            assert!(delta.abs() <= bound + 1e-12, "{kind} drifted by {delta}");
        }
    }

    #[test]
    fn test_newborn_waits_out_weaning() {
        let mut sim = empty(4);
        let parent_id = sim.spawn_creature_at(Genome::default(), Vec2::new(700.0, 500.0));
        sim.world_mut().creature_mut(parent_id).unwrap().energy *= 2.0;
        for _ in 0..31 {
            sim.step();
        }
        let child_id = sim.world().creature_ids().into_iter().find(|id| *id != parent_id).unwrap();
        let birthplace = sim.world().creature(child_id).unwrap().position;

        for _ in 0..20 {
            sim.step();
            let child = sim.world().creature(child_id).unwrap();
            assert_eq!(child.position, birthplace);
            assert!(child.target.is_none());
        }
        sim.step();
        assert!(sim.world().creature(child_id).unwrap().target.is_some());
    }

    #[test]
    fn test_food_spawning_respects_cap() {
        let mut config = SimulationConfig::new(5);
        config.spawn = SpawnConfig {
            initial_creatures: 0,
            food_start: 0,
            food_max: 7,
            food_chance: 1.0,
        };
        let mut sim = Simulation::new(config).unwrap();
        sim.step();
        assert_eq!(sim.world().food_count(), 7);
        sim.step();
        assert_eq!(sim.world().food_count(), 7);
    }

    struct CountingSink(Arc<AtomicUsize>);

    impl StatsSink for CountingSink {
        fn record(&mut self, _stats: &PopulationStats) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingSink;

    impl StatsSink for FailingSink {
        fn record(&mut self, _stats: &PopulationStats) -> Result<()> {
            Err(Error::Sink("unavailable".to_string()))
        }
    }

    #[test]
    fn test_stats_are_published_every_interval() {
        let mut config = quiet_config(6);
        config.stats_interval = 10;
        let mut sim = Simulation::empty(config).unwrap();
        sim.spawn_creature_at(Genome::default(), Vec2::new(400.0, 400.0));
        let count = Arc::new(AtomicUsize::new(0));
        sim.add_sink(Box::new(FailingSink));
        sim.add_sink(Box::new(CountingSink(count.clone())));

        for _ in 0..35 {
            sim.step();
        }
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(sim.history().len(), 3);
        let latest = sim.latest_stats().unwrap();
        assert_eq!(latest.tick, 30);
        assert_eq!(latest.creatures, 1);
        assert_eq!(latest.size.mean, 1.0);
    }

    #[test]
    fn test_empty_population_stats_are_zero() {
        let sim = empty(7);
        let stats = sim.collect_stats();
        assert!(stats.is_extinct());
        assert_eq!(stats.max_generation, 0);
        assert_eq!(stats.size, TraitSummary::default());
    }

    #[test]
    fn test_run_stops_on_request_and_extinction() {
        let mut sim = empty(8);
        sim.spawn_creature_at(Genome::default(), Vec2::new(400.0, 400.0));
        let summary = sim.run(25);
        assert_eq!(summary.ticks_run, 25);
        assert_eq!(summary.reason, StopReason::MaxTicks);

        sim.control().request_stop();
        let summary = sim.run(25);
        assert_eq!(summary.ticks_run, 0);
        assert_eq!(summary.reason, StopReason::Stopped);

        let mut sim = empty(9);
        sim.set_quit_on_extinct(true);
        let summary = sim.run(100);
        assert_eq!(summary.reason, StopReason::Extinct);
        assert_eq!(summary.final_tick, 0);
    }

    #[test]
    fn test_spotlight_cleared_when_entity_dies() {
        let mut sim = empty(10);
        let id = sim.spawn_creature_at(Genome::default(), Vec2::new(400.0, 400.0));
        sim.control().set_spotlight(Some(id));
        sim.step();
        assert_eq!(sim.control().spotlight(), Some(id));

        sim.world_mut().creature_mut(id).unwrap().energy = 0.1;
        sim.step();
        assert_eq!(sim.control().spotlight(), None);
        assert_eq!(sim.world().counters.starved, 1);
    }

    #[test]
    fn test_snapshot_lists_entities() {
        let mut sim = empty(11);
        let creature = sim.spawn_creature_at(Genome::default(), Vec2::new(400.0, 400.0));
        sim.spawn_food_at(FoodKind::Pineapple, Vec2::new(900.0, 700.0));
        sim.control().set_spotlight(Some(creature));
        sim.step();

        let snapshot = sim.snapshot();
        assert_eq!(snapshot.tick, 1);
        assert_eq!(snapshot.creatures.len(), 1);
        assert_eq!(snapshot.foods.len(), 1);
        assert_eq!(snapshot.spotlight, Some(creature));
        assert_eq!(snapshot.creatures[0].status, "Looking for food");
        assert!(serde_json::to_string(&snapshot).is_ok());

        assert_eq!(sim.creature_view(creature).unwrap().id, creature);
        assert!(matches!(sim.creature_view(EntityId(999)), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_same_seed_same_world() {
        let run = |seed| {
            let mut sim = Simulation::new(SimulationConfig::new(seed)).unwrap();
            for _ in 0..50 {
                sim.step();
            }
            sim.snapshot()
        };
        assert_eq!(run(12), run(12));
    }

    #[test]
    fn test_eaten_creature_is_not_updated_again() {
        let mut sim = empty(13);
        let predator = sim.spawn_creature_at(Genome::from_values(3.0, 1.0, 0.5, 5.0), Vec2::new(400.0, 400.0));
        let prey = sim.spawn_creature_at(Genome::default(), Vec2::new(401.0, 400.0));
        assert!(predator < prey);
        {
            let prey = sim.world_mut().creature_mut(prey).unwrap();
            // One bite of nutrition; enough energy for exactly one more tick
            prey.nutrition = 30.0;
            prey.energy = 1.0;
        }

        sim.step();
        assert_eq!(sim.world().creature(prey).unwrap().incapacitated_by, Some(predator));

        sim.step();
        assert!(sim.world().creature(prey).is_none());
        assert_eq!(sim.world().counters.eaten, 1);
        assert_eq!(sim.world().counters.starved, 0);

        let eater = sim.world().creature(predator).unwrap();
        assert_eq!(eater.metrics.kills, 1);
        assert_eq!(eater.metrics.nutrition_consumed, 30.0);
    }
}
