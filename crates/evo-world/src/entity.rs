//! Map occupants: food, creatures and waypoint markers.

use crate::task::{Task, TaskKind};
use crate::world::World;
use evo_core::{CreatureConfig, EntityId, Vec2};
use evo_genome::Genome;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Task type carried by creatures
pub type CreatureTask = Task<Creature, World>;

/// Fixed nutrition tiers for food
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoodKind {
    Cherry,
    Banana,
    Pineapple,
}

impl FoodKind {
    pub const ALL: [FoodKind; 3] = [FoodKind::Cherry, FoodKind::Banana, FoodKind::Pineapple];

    pub fn nutrition(&self) -> f64 {
        match self {
            FoodKind::Cherry => 1000.0,
            FoodKind::Banana => 2000.0,
            FoodKind::Pineapple => 3000.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FoodKind::Cherry => "Cherry",
            FoodKind::Banana => "Banana",
            FoodKind::Pineapple => "Pineapple",
        }
    }
}

/// Passive food item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Food {
    pub id: EntityId,
    pub name: String,
    pub kind: FoodKind,
    pub position: Vec2,
    /// Remaining nutrition; the item is destroyed once this reaches zero
    pub nutrition: f64,
    /// Creature currently eating this item
    pub pinned_by: Option<EntityId>,
}

impl Food {
    pub fn new(id: EntityId, kind: FoodKind, position: Vec2) -> Self {
        Self {
            id,
            name: format!("{}-{}", kind.name(), id),
            kind,
            position,
            nutrition: kind.nutrition(),
            pinned_by: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkerKind {
    Exploration,
    Escape,
}

/// Ephemeral waypoint a creature walks to. Dropped once reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub id: EntityId,
    pub name: String,
    pub kind: MarkerKind,
    pub position: Vec2,
}

impl Marker {
    pub fn new(id: EntityId, kind: MarkerKind, position: Vec2) -> Self {
        let label = match kind {
            MarkerKind::Exploration => "Exploration",
            MarkerKind::Escape => "Escape",
        };
        Self {
            id,
            name: format!("{}-{}", label, id),
            kind,
            position,
        }
    }
}

/// What a creature is currently pursuing or fleeing towards
#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Marker(Marker),
    /// A food item or creature, resolved through the world on every use
    Lifeform(EntityId),
}

impl Target {
    pub fn is_exploration(&self) -> bool {
        matches!(self, Target::Marker(m) if m.kind == MarkerKind::Exploration)
    }

    pub fn is_escape(&self) -> bool {
        matches!(self, Target::Marker(m) if m.kind == MarkerKind::Escape)
    }

    pub fn lifeform(&self) -> Option<EntityId> {
        match self {
            Target::Lifeform(id) => Some(*id),
            Target::Marker(_) => None,
        }
    }
}

/// Per-creature counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatureMetrics {
    pub nutrition_consumed: f64,
    pub offspring: u32,
    pub kills: u32,
}

pub struct Creature {
    pub id: EntityId,
    pub name: String,
    pub position: Vec2,
    pub genome: Genome,
    pub age: u64,
    pub energy: f64,
    /// Remaining value if eaten
    pub nutrition: f64,
    pub generation: u32,
    pub parent: Option<EntityId>,
    pub target: Option<Target>,
    pub task: Option<CreatureTask>,
    /// Set while a predator is consuming this creature
    pub incapacitated_by: Option<EntityId>,
    pub waypoints: VecDeque<Vec2>,
    pub metrics: CreatureMetrics,
    waypoint_capacity: usize,
}

impl Creature {
    /// A world-seed creature
    pub fn new(id: EntityId, position: Vec2, genome: Genome, config: &CreatureConfig) -> Self {
        let nutrition = genome.size.cost() * config.nutrition_multiplier;
        Self {
            id,
            name: format!("Creature-{}", id),
            position,
            genome,
            age: 0,
            energy: nutrition,
            nutrition,
            generation: 1,
            parent: None,
            target: None,
            task: None,
            incapacitated_by: None,
            waypoints: VecDeque::with_capacity(config.waypoint_capacity),
            metrics: CreatureMetrics::default(),
            waypoint_capacity: config.waypoint_capacity,
        }
    }

    /// Offspring of `parent`: mutated genome, same position, weaning first
    pub fn offspring(id: EntityId, parent: &Creature, genome: Genome, config: &CreatureConfig) -> Self {
        let mut child = Self::new(id, parent.position, genome, config);
        child.generation = parent.generation + 1;
        child.parent = Some(parent.id);
        child.task = Some(Task::new(TaskKind::Wean, config.wean_ticks));
        child
    }

    pub fn reproduction_cost(&self, config: &CreatureConfig) -> f64 {
        self.nutrition * config.reproduction_cost_ratio
    }

    pub fn can_reproduce(&self, config: &CreatureConfig) -> bool {
        self.energy >= self.nutrition + self.reproduction_cost(config)
    }

    pub fn perception_distance(&self, config: &CreatureConfig) -> f64 {
        self.genome.perception_distance(config.perception_distance_scale)
    }

    /// Shared parent, or parent/child
    pub fn is_related(&self, other: &Creature) -> bool {
        self.parent == Some(other.id)
            || other.parent == Some(self.id)
            || (self.parent.is_some() && self.parent == other.parent)
    }

    pub fn task_kind(&self) -> Option<TaskKind> {
        self.task
            .as_ref()
            .filter(|task| task.is_running())
            .map(|task| task.kind())
    }

    /// Replace the current target, remembering where the change happened
    pub fn set_target(&mut self, target: Option<Target>) {
        if self.waypoint_capacity > 0 {
            if self.waypoints.len() == self.waypoint_capacity {
                self.waypoints.pop_front();
            }
            self.waypoints.push_back(self.position);
        }
        self.target = target;
    }
}

impl fmt::Debug for Creature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Creature")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("generation", &self.generation)
            .field("age", &self.age)
            .field("energy", &self.energy)
            .field("nutrition", &self.nutrition)
            .field("target", &self.target)
            .field("task", &self.task)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evo_core::IdAllocator;

    fn config() -> CreatureConfig {
        CreatureConfig::default()
    }

    #[test]
    fn test_creature_creation() {
        let creature = Creature::new(EntityId(3), Vec2::new(5.0, 5.0), Genome::default(), &config());

        assert_eq!(creature.name, "Creature-3");
        assert_eq!(creature.generation, 1);
        assert!((creature.nutrition - 4.189 * 1800.0).abs() < 1e-9);
        assert_eq!(creature.energy, creature.nutrition);
        assert!(!creature.can_reproduce(&config()));
    }

    #[test]
    fn test_offspring_lineage() {
        let mut ids = IdAllocator::new();
        let parent = Creature::new(ids.allocate(), Vec2::new(40.0, 60.0), Genome::default(), &config());
        let child = Creature::offspring(ids.allocate(), &parent, parent.genome, &config());

        assert_eq!(child.generation, 2);
        assert_eq!(child.parent, Some(parent.id));
        assert_eq!(child.position, parent.position);
        assert_eq!(child.task_kind(), Some(TaskKind::Wean));
        assert!(child.is_related(&parent));
        assert!(parent.is_related(&child));
    }

    #[test]
    fn test_kinship() {
        let mut ids = IdAllocator::new();
        let pos = Vec2::new(100.0, 100.0);
        let a = Creature::new(ids.allocate(), pos, Genome::default(), &config());
        let b = Creature::new(ids.allocate(), pos, Genome::default(), &config());
        // Two roots share no parent
        assert!(!a.is_related(&b));

        let a1 = Creature::offspring(ids.allocate(), &a, a.genome, &config());
        let a2 = Creature::offspring(ids.allocate(), &a, a.genome, &config());
        let a11 = Creature::offspring(ids.allocate(), &a1, a1.genome, &config());
        assert!(a1.is_related(&a2));
        assert!(!a11.is_related(&a));
        assert!(!a1.is_related(&b));
    }

    #[test]
    fn test_waypoint_history_is_bounded() {
        let mut creature = Creature::new(EntityId(0), Vec2::ZERO, Genome::default(), &config());
        for i in 0..25 {
            creature.position = Vec2::new(i as f64, 0.0);
            creature.set_target(None);
        }
        assert_eq!(creature.waypoints.len(), 10);
        assert_eq!(creature.waypoints.front(), Some(&Vec2::new(15.0, 0.0)));
        assert_eq!(creature.waypoints.back(), Some(&Vec2::new(24.0, 0.0)));
    }

    #[test]
    fn test_food_tiers() {
        let food = Food::new(EntityId(9), FoodKind::Banana, Vec2::ZERO);
        assert_eq!(food.nutrition, 2000.0);
        assert_eq!(food.name, "Banana-9");
        assert!(food.pinned_by.is_none());
    }
}
