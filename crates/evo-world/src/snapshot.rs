//! Read-only views of the world for presentation layers.

use crate::entity::{Creature, Food, FoodKind, Target};
use crate::task::TaskKind;
use crate::world::World;
use evo_core::{CreatureConfig, EntityId, PopulationStats, Vec2};
use evo_genome::DietClass;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomeView {
    pub size: f64,
    pub speed: f64,
    pub perception: f64,
    pub digestion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureView {
    pub id: EntityId,
    pub name: String,
    pub position: Vec2,
    pub genome: GenomeView,
    pub diet: DietClass,
    pub generation: u32,
    pub parent: Option<EntityId>,
    pub age: u64,
    pub energy: f64,
    pub nutrition: f64,
    pub status: String,
    pub target_position: Option<Vec2>,
    pub waypoints: Vec<Vec2>,
    pub perception_distance: f64,
}

impl CreatureView {
    pub fn new(creature: &Creature, world: &World, config: &CreatureConfig) -> Self {
        let genome = &creature.genome;
        Self {
            id: creature.id,
            name: creature.name.clone(),
            position: creature.position,
            genome: GenomeView {
                size: genome.size.value(),
                speed: genome.speed.value(),
                perception: genome.perception.value(),
                digestion: genome.digestion.value(),
            },
            diet: genome.diet_class(),
            generation: creature.generation,
            parent: creature.parent,
            age: creature.age,
            energy: creature.energy,
            nutrition: creature.nutrition,
            status: status(creature, world),
            target_position: creature.target_position(world),
            waypoints: creature.waypoints.iter().copied().collect(),
            perception_distance: creature.perception_distance(config),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodView {
    pub id: EntityId,
    pub name: String,
    pub kind: FoodKind,
    pub position: Vec2,
    pub nutrition: f64,
}

impl From<&Food> for FoodView {
    fn from(food: &Food) -> Self {
        Self {
            id: food.id,
            name: food.name.clone(),
            kind: food.kind,
            position: food.position,
            nutrition: food.nutrition,
        }
    }
}

/// Everything needed to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub width: f64,
    pub height: f64,
    pub creatures: Vec<CreatureView>,
    pub foods: Vec<FoodView>,
    pub stats: Option<PopulationStats>,
    pub spotlight: Option<EntityId>,
}

/// Human-readable description of what a creature is doing
pub fn status(creature: &Creature, world: &World) -> String {
    let target_name = || {
        creature
            .target
            .as_ref()
            .and_then(Target::lifeform)
            .and_then(|id| world.lifeform(id))
            .map(|lifeform| lifeform.name().to_string())
            .unwrap_or_else(|| "nothing".to_string())
    };

    match creature.task_kind() {
        Some(TaskKind::Wean) => return "Weaning".to_string(),
        Some(TaskKind::Gestate) => return "Gestating".to_string(),
        Some(TaskKind::Consume) => return format!("Consuming {}", target_name()),
        None => {}
    }

    if creature
        .incapacitated_by
        .is_some_and(|holder| world.pin_is_held(holder, creature.id))
    {
        return "Being eaten".to_string();
    }

    match &creature.target {
        Some(Target::Lifeform(_)) => format!("Going after {}", target_name()),
        Some(target) if target.is_escape() => "Running away".to_string(),
        _ => "Looking for food".to_string(),
    }
}
