//! Owning registry of every live lifeform.
//!
//! Entities refer to each other by [`EntityId`] only. A destroyed entity is
//! removed from the registry at once, so any later lookup simply fails to
//! resolve and callers treat it as dead.

use crate::entity::{Creature, Food, FoodKind};
use crate::grid::Grid;
use evo_core::{CreatureConfig, EntityId, IdAllocator, MapBounds, SimulationConfig, Vec2};
use evo_genome::Genome;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Borrowed view of a lifeform, whichever variant it is
#[derive(Debug, Clone, Copy)]
pub enum LifeformRef<'a> {
    Food(&'a Food),
    Creature(&'a Creature),
}

impl LifeformRef<'_> {
    pub fn id(&self) -> EntityId {
        match self {
            LifeformRef::Food(food) => food.id,
            LifeformRef::Creature(creature) => creature.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LifeformRef::Food(food) => &food.name,
            LifeformRef::Creature(creature) => &creature.name,
        }
    }

    pub fn position(&self) -> Vec2 {
        match self {
            LifeformRef::Food(food) => food.position,
            LifeformRef::Creature(creature) => creature.position,
        }
    }

    pub fn nutrition(&self) -> f64 {
        match self {
            LifeformRef::Food(food) => food.nutrition,
            LifeformRef::Creature(creature) => creature.nutrition,
        }
    }

    pub fn is_creature(&self) -> bool {
        matches!(self, LifeformRef::Creature(_))
    }

    pub fn pinned_by(&self) -> Option<EntityId> {
        match self {
            LifeformRef::Food(food) => food.pinned_by,
            LifeformRef::Creature(creature) => creature.incapacitated_by,
        }
    }
}

/// Running totals since the world was created
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldCounters {
    pub births: u64,
    pub starved: u64,
    pub eaten: u64,
    pub food_spawned: u64,
    pub food_eaten: u64,
}

pub struct World {
    pub config: CreatureConfig,
    pub bounds: MapBounds,
    pub grid: Grid,
    pub rng: ChaCha8Rng,
    pub counters: WorldCounters,
    ids: IdAllocator,
    foods: BTreeMap<EntityId, Food>,
    creatures: BTreeMap<EntityId, Creature>,
}

impl World {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            config: config.creature.clone(),
            bounds: config.world.bounds(),
            grid: Grid::from_config(&config.world),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            counters: WorldCounters::default(),
            ids: IdAllocator::new(),
            foods: BTreeMap::new(),
            creatures: BTreeMap::new(),
        }
    }

    pub fn allocate_id(&mut self) -> EntityId {
        self.ids.allocate()
    }

    pub fn random_position(&mut self) -> Vec2 {
        self.bounds.random_position(&mut self.rng)
    }

    // ----- Spawning ----- //

    /// Place a food item of a random tier at a random position
    pub fn spawn_random_food(&mut self) -> EntityId {
        let kind = *FoodKind::ALL
            .choose(&mut self.rng)
            .unwrap_or(&FoodKind::Cherry);
        let position = self.random_position();
        self.spawn_food(kind, position)
    }

    pub fn spawn_food(&mut self, kind: FoodKind, position: Vec2) -> EntityId {
        let id = self.allocate_id();
        let food = Food::new(id, kind, self.bounds.clamp(position));
        self.foods.insert(id, food);
        self.counters.food_spawned += 1;
        id
    }

    /// World-seed creature with a freshly rolled genome
    pub fn spawn_random_creature(&mut self) -> EntityId {
        let genome = Genome::random(self.config.genome_seed_spread, &mut self.rng);
        let position = self.random_position();
        self.spawn_creature(genome, position)
    }

    pub fn spawn_creature(&mut self, genome: Genome, position: Vec2) -> EntityId {
        let id = self.allocate_id();
        let creature = Creature::new(id, self.bounds.clamp(position), genome, &self.config);
        self.creatures.insert(id, creature);
        id
    }

    /// Offspring of `parent`, placed at the parent's position
    pub fn spawn_offspring(&mut self, parent: &Creature) -> EntityId {
        let id = self.allocate_id();
        let genome = parent.genome.mutate(&mut self.rng);
        let child = Creature::offspring(id, parent, genome, &self.config);
        debug!(
            event = "creature_born",
            creature_id = %id,
            parent_id = %parent.id,
            generation = child.generation,
            size = child.genome.size.value(),
            speed = child.genome.speed.value(),
            perception = child.genome.perception.value(),
            digestion = child.genome.digestion.value(),
            "Creature born"
        );
        self.creatures.insert(id, child);
        self.counters.births += 1;
        id
    }

    // ----- Lookup ----- //

    pub fn food(&self, id: EntityId) -> Option<&Food> {
        self.foods.get(&id)
    }

    pub fn creature(&self, id: EntityId) -> Option<&Creature> {
        self.creatures.get(&id)
    }

    pub fn creature_mut(&mut self, id: EntityId) -> Option<&mut Creature> {
        self.creatures.get_mut(&id)
    }

    pub fn lifeform(&self, id: EntityId) -> Option<LifeformRef<'_>> {
        if let Some(creature) = self.creatures.get(&id) {
            return Some(LifeformRef::Creature(creature));
        }
        self.foods.get(&id).map(LifeformRef::Food)
    }

    pub fn is_alive(&self, id: EntityId) -> bool {
        self.creatures.contains_key(&id) || self.foods.contains_key(&id)
    }

    pub fn foods(&self) -> impl Iterator<Item = &Food> {
        self.foods.values()
    }

    pub fn creatures(&self) -> impl Iterator<Item = &Creature> {
        self.creatures.values()
    }

    /// Creature ids in ascending order
    pub fn creature_ids(&self) -> Vec<EntityId> {
        self.creatures.keys().copied().collect()
    }

    pub fn food_count(&self) -> usize {
        self.foods.len()
    }

    pub fn creature_count(&self) -> usize {
        self.creatures.len()
    }

    // ----- Per-creature update support ----- //

    /// Detach a creature while it is being updated
    pub(crate) fn take_creature(&mut self, id: EntityId) -> Option<Creature> {
        self.creatures.remove(&id)
    }

    /// Put an updated creature back
    pub(crate) fn restore_creature(&mut self, creature: Creature) {
        self.creatures.insert(creature.id, creature);
    }

    /// Whether `holder` still pins a lifeform: alive and still targeting it
    pub fn pin_is_held(&self, holder: EntityId, pinned: EntityId) -> bool {
        self.creatures.get(&holder).is_some_and(|predator| {
            predator.target.as_ref().and_then(|target| target.lifeform()) == Some(pinned)
        })
    }

    /// Pin a lifeform for `eater`. Fails if another live consumer holds it.
    pub fn pin(&mut self, id: EntityId, eater: EntityId) -> bool {
        let current = match self.lifeform(id) {
            Some(lifeform) => lifeform.pinned_by(),
            None => return false,
        };
        if let Some(holder) = current {
            if holder != eater && self.pin_is_held(holder, id) {
                return false;
            }
        }

        if let Some(creature) = self.creatures.get_mut(&id) {
            creature.incapacitated_by = Some(eater);
        } else if let Some(food) = self.foods.get_mut(&id) {
            food.pinned_by = Some(eater);
        }
        true
    }

    /// Remove up to `amount` nutrition from a lifeform. A lifeform drained
    /// to zero is destroyed.
    pub fn drain(&mut self, id: EntityId, amount: f64, eater: EntityId) -> Bite {
        let amount = amount.max(0.0);

        if let Some(creature) = self.creatures.get_mut(&id) {
            let taken = amount.min(creature.nutrition.max(0.0));
            creature.nutrition -= taken;
            let destroyed = creature.nutrition <= 0.0;
            if destroyed {
                self.destroy_creature(id, DeathCause::Eaten { by: eater });
            }
            return Bite { amount: taken, destroyed };
        }

        if let Some(food) = self.foods.get_mut(&id) {
            let taken = amount.min(food.nutrition.max(0.0));
            food.nutrition -= taken;
            let destroyed = food.nutrition <= 0.0;
            if destroyed {
                self.foods.remove(&id);
                self.counters.food_eaten += 1;
                debug!(event = "food_eaten", food_id = %id, eater_id = %eater, "Food fully eaten");
            }
            return Bite { amount: taken, destroyed };
        }

        Bite::default()
    }

    pub(crate) fn destroy_creature(&mut self, id: EntityId, cause: DeathCause) -> Option<Creature> {
        let creature = self.creatures.remove(&id)?;
        self.record_death(&creature, cause);
        Some(creature)
    }

    /// Account for a creature that has left the registry
    pub(crate) fn record_death(&mut self, creature: &Creature, cause: DeathCause) {
        match cause {
            DeathCause::Starved => self.counters.starved += 1,
            DeathCause::Eaten { .. } => self.counters.eaten += 1,
        }
        debug!(
            event = "creature_death",
            creature_id = %creature.id,
            cause = cause.label(),
            killer_id = ?cause.killer(),
            age = creature.age,
            generation = creature.generation,
            energy = creature.energy,
            offspring = creature.metrics.offspring,
            "Creature died"
        );
    }

    /// Index every live lifeform at its current position
    pub fn rebuild_grid(&mut self) {
        let entries = self
            .foods
            .values()
            .map(|food| (food.id, food.position))
            .chain(self.creatures.values().map(|c| (c.id, c.position)));
        self.grid.rebuild(entries);
    }
}

/// Outcome of one drain
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bite {
    pub amount: f64,
    /// The drained lifeform was destroyed by this bite
    pub destroyed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeathCause {
    Starved,
    Eaten { by: EntityId },
}

impl DeathCause {
    pub fn killer(&self) -> Option<EntityId> {
        match self {
            DeathCause::Starved => None,
            DeathCause::Eaten { by } => Some(*by),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeathCause::Starved => "starved",
            DeathCause::Eaten { .. } => "eaten",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> World {
        World::new(&SimulationConfig::new(1))
    }

    #[test]
    fn test_ids_unique_across_kinds() {
        let mut world = world();
        let food = world.spawn_food(FoodKind::Cherry, Vec2::new(100.0, 100.0));
        let creature = world.spawn_creature(Genome::default(), Vec2::new(200.0, 200.0));
        assert_ne!(food, creature);
        assert!(world.lifeform(food).is_some_and(|l| !l.is_creature()));
        assert!(world.lifeform(creature).is_some_and(|l| l.is_creature()));
    }

    #[test]
    fn test_spawn_clamps_into_bounds() {
        let mut world = world();
        let id = world.spawn_food(FoodKind::Cherry, Vec2::new(-100.0, 5000.0));
        let food = world.food(id).unwrap();
        assert!(world.bounds.contains(food.position));
    }

    #[test]
    fn test_drain_transfers_exact_amounts() {
        let mut world = world();
        let eater = world.spawn_creature(Genome::default(), Vec2::new(300.0, 300.0));
        let food = world.spawn_food(FoodKind::Cherry, Vec2::new(300.0, 300.0));

        assert_eq!(world.drain(food, 400.0, eater).amount, 400.0);
        assert_eq!(world.food(food).unwrap().nutrition, 600.0);
        assert_eq!(world.drain(food, 400.0, eater).amount, 400.0);

        // Last bite is clamped to what remains
        let last = world.drain(food, 400.0, eater);
        assert_eq!(last, Bite { amount: 200.0, destroyed: true });
        assert!(!world.is_alive(food));
        assert_eq!(world.counters.food_eaten, 1);
        assert_eq!(world.drain(food, 400.0, eater), Bite::default());
    }

    #[test]
    fn test_draining_creature_destroys_it() {
        let mut world = world();
        let predator = world.spawn_creature(Genome::from_values(3.0, 1.0, 0.5, 9.0), Vec2::new(300.0, 300.0));
        let prey = world.spawn_creature(Genome::default(), Vec2::new(300.0, 300.0));
        let nutrition = world.creature(prey).unwrap().nutrition;

        let bite = world.drain(prey, nutrition * 2.0, predator);
        assert_eq!(bite.amount, nutrition);
        assert!(bite.destroyed);
        assert!(!world.is_alive(prey));
        assert!(world.is_alive(predator));
        assert_eq!(world.counters.eaten, 1);
    }

    #[test]
    fn test_pin_is_exclusive_while_holder_targets() {
        let mut world = world();
        let a = world.spawn_creature(Genome::default(), Vec2::new(300.0, 300.0));
        let b = world.spawn_creature(Genome::default(), Vec2::new(300.0, 300.0));
        let food = world.spawn_food(FoodKind::Banana, Vec2::new(300.0, 300.0));

        world.creature_mut(a).unwrap().target = Some(crate::entity::Target::Lifeform(food));
        assert!(world.pin(food, a));
        assert!(!world.pin(food, b));

        // Holder gave up: the pin is stale
        world.creature_mut(a).unwrap().target = None;
        assert!(world.pin(food, b));
        assert_eq!(world.food(food).unwrap().pinned_by, Some(b));
    }

    #[test]
    fn test_rebuild_grid_indexes_all_lifeforms() {
        let mut world = world();
        for _ in 0..10 {
            world.spawn_random_food();
            world.spawn_random_creature();
        }
        world.rebuild_grid();
        assert_eq!(world.grid.len(), 20);
    }
}
