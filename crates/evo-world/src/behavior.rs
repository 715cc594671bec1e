//! Per-creature decision procedure.
//!
//! Every tick, each live creature runs through the same fixed sequence:
//! upkeep, death check, running task, incapacitation, reproduction, target
//! refresh and finally movement (which may start a consume task on arrival).

use crate::entity::{Creature, Marker, MarkerKind, Target};
use crate::task::{Task, TaskKind};
use crate::world::{DeathCause, LifeformRef, World};
use evo_core::{CreatureConfig, EntityId, Vec2};
use tracing::trace;

/// How a creature regards a lifeform it can see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    Prey,
    Predator,
    Ignore,
}

/// Run one tick for creature `id`. Creatures destroyed earlier in the tick
/// no longer resolve and are skipped.
pub fn update_creature(world: &mut World, id: EntityId, config: &CreatureConfig) {
    let Some(mut creature) = world.take_creature(id) else {
        return;
    };

    if creature.update(world, config) {
        world.restore_creature(creature);
    } else {
        world.record_death(&creature, DeathCause::Starved);
    }
}

impl Creature {
    /// Returns `false` once the creature has starved
    pub(crate) fn update(&mut self, world: &mut World, config: &CreatureConfig) -> bool {
        // Time passes
        self.age += 1;
        self.energy -= self.age as f64 * config.decay + self.genome.perception.cost();
        if self.energy <= 0.0 {
            return false;
        }

        // Busy creatures only advance their task
        if let Some(mut task) = self.task.take() {
            if task.is_running() {
                task.tick(self, world);
                if task.is_running() {
                    self.task = Some(task);
                }
                return true;
            }
        }

        if let Some(predator) = self.incapacitated_by {
            if world.pin_is_held(predator, self.id) {
                return true;
            }
            self.incapacitated_by = None;
        }

        if self.can_reproduce(config) {
            self.begin_gestation(config);
        }

        self.refresh_target(world, config);
        self.move_towards_target(world, config);
        true
    }

    fn begin_gestation(&mut self, config: &CreatureConfig) {
        trace!(creature_id = %self.id, energy = self.energy, "Gestation started");
        let task = Task::new(TaskKind::Gestate, config.gestation_ticks).with_action(
            |parent: &mut Creature, world: &mut World| {
                parent.energy -= parent.reproduction_cost(&world.config);
                parent.metrics.offspring += 1;
                world.spawn_offspring(parent);
            },
        );
        self.task = Some(task);
    }

    /// Classify another lifeform relative to this creature
    pub fn assess(&self, other: LifeformRef<'_>, world: &World, config: &CreatureConfig) -> Assessment {
        match other {
            LifeformRef::Food(_) => {
                if self.pinned_elsewhere(other, world) {
                    Assessment::Ignore
                } else {
                    Assessment::Prey
                }
            }
            LifeformRef::Creature(creature) => {
                if creature.id == self.id || self.is_related(creature) {
                    return Assessment::Ignore;
                }
                let own_size = self.genome.size.value();
                let other_size = creature.genome.size.value();
                if own_size > other_size * config.predator_margin {
                    if self.pinned_elsewhere(other, world) {
                        Assessment::Ignore
                    } else {
                        Assessment::Prey
                    }
                } else if other_size > own_size * config.predator_margin {
                    Assessment::Predator
                } else {
                    Assessment::Ignore
                }
            }
        }
    }

    /// Another consumer is already eating this lifeform
    fn pinned_elsewhere(&self, lifeform: LifeformRef<'_>, world: &World) -> bool {
        lifeform
            .pinned_by()
            .is_some_and(|holder| holder != self.id && world.pin_is_held(holder, lifeform.id()))
    }

    fn refresh_target(&mut self, world: &mut World, config: &CreatureConfig) {
        let perception = self.perception_distance(config);

        if let Some(target_id) = self.target.as_ref().and_then(Target::lifeform) {
            let keep = match world.lifeform(target_id) {
                None => false,
                Some(LifeformRef::Creature(prey)) => self.position.distance(prey.position) <= perception,
                Some(LifeformRef::Food(_)) => true,
            };
            if !keep {
                self.set_target(None);
            }
        }

        if self.target.as_ref().map_or(true, Target::is_exploration) {
            self.select_target(world, config);
        }
    }

    /// Look around: flee the nearest predator, else chase the best prey,
    /// else keep exploring.
    pub fn select_target(&mut self, world: &mut World, config: &CreatureConfig) {
        let perception = self.perception_distance(config);
        let mut predator: Option<(f64, Vec2)> = None;
        let mut prey: Option<(f64, EntityId)> = None;

        for candidate in world.grid.query(self.position, perception) {
            let Some(lifeform) = world.lifeform(candidate) else {
                continue;
            };
            let vector = lifeform.position() - self.position;
            let distance = vector.length();
            if distance > perception {
                continue;
            }

            match self.assess(lifeform, world, config) {
                Assessment::Predator => {
                    let score = 1.0 / distance.max(1.0);
                    if predator.map_or(true, |(best, _)| score > best) {
                        predator = Some((score, vector));
                    }
                }
                Assessment::Prey => {
                    let ratio = self.genome.digestion_ratio(lifeform.is_creature());
                    let score = ratio * lifeform.nutrition() / (distance * distance).max(1.0);
                    if score > 0.0 && prey.map_or(true, |(best, _)| score > best) {
                        prey = Some((score, candidate));
                    }
                }
                Assessment::Ignore => {}
            }
        }

        if let Some((_, vector)) = predator {
            let position = match vector.normalize() {
                Some(direction) => {
                    let away = self.position - direction * (perception * config.escape_distance_ratio);
                    world.bounds.bounce(away, &mut world.rng)
                }
                // Exact overlap: no direction to flee in
                None => world.random_position(),
            };
            let marker = Marker::new(world.allocate_id(), MarkerKind::Escape, position);
            trace!(creature_id = %self.id, marker = %marker.name, "Fleeing predator");
            self.set_target(Some(Target::Marker(marker)));
        } else if let Some((_, prey_id)) = prey {
            trace!(creature_id = %self.id, prey_id = %prey_id, "Chasing prey");
            self.set_target(Some(Target::Lifeform(prey_id)));
        } else if self.target.is_none() {
            let position = world.random_position();
            let marker = Marker::new(world.allocate_id(), MarkerKind::Exploration, position);
            self.set_target(Some(Target::Marker(marker)));
        }
    }

    /// Current position of whatever is targeted, if it still exists
    pub fn target_position(&self, world: &World) -> Option<Vec2> {
        match self.target.as_ref()? {
            Target::Marker(marker) => Some(marker.position),
            Target::Lifeform(id) => world.lifeform(*id).map(|lifeform| lifeform.position()),
        }
    }

    fn move_towards_target(&mut self, world: &mut World, config: &CreatureConfig) {
        if self.target.is_none() {
            return;
        }
        let Some(target_position) = self.target_position(world) else {
            self.set_target(None);
            return;
        };

        let vector = target_position - self.position;
        let arrival_tolerance = self.genome.speed.value() + self.genome.size.value();

        if vector.length() < arrival_tolerance {
            self.position = target_position;
            match self.target.as_ref().and_then(Target::lifeform) {
                // Gestation started this tick: the meal waits until it is over
                Some(_) if self.task.is_some() => {}
                Some(target_id) => self.begin_consume(target_id, world, config),
                // Marker reached
                None => self.set_target(None),
            }
        } else if let Some(direction) = vector.normalize() {
            self.position = world.bounds.clamp(self.position + direction * self.genome.speed.value());
            self.energy -= self.genome.speed.cost() * self.genome.size.cost();
        }
    }

    fn begin_consume(&mut self, target_id: EntityId, world: &mut World, config: &CreatureConfig) {
        let Some(target) = world.lifeform(target_id) else {
            self.set_target(None);
            return;
        };
        let eating_creature = target.is_creature();
        let nutrition = target.nutrition();

        if !world.pin(target_id, self.id) {
            trace!(creature_id = %self.id, target_id = %target_id, "Target already being eaten");
            self.set_target(None);
            return;
        }

        let bite = self.genome.digestion_ratio(eating_creature) * config.bite_rate;
        let timer = (nutrition / bite).ceil().max(1.0) as u32;
        trace!(creature_id = %self.id, target_id = %target_id, timer, bite, "Consuming");

        let task = Task::new(TaskKind::Consume, timer)
            .with_validation(move |_, world: &World| world.is_alive(target_id))
            .with_update(move |eater: &mut Creature, world: &mut World| {
                let taken = world.drain(target_id, bite, eater.id);
                eater.energy += taken.amount;
                eater.metrics.nutrition_consumed += taken.amount;
                if taken.destroyed && eating_creature {
                    eater.metrics.kills += 1;
                }
            });
        self.task = Some(task);
    }
}
