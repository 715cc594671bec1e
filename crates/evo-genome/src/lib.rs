//! Heritable traits for evo creatures.
//!
//! A genome is a fixed set of bounded scalar genes:
//! - Size: body volume, drives nutrition value and movement cost
//! - Speed: distance covered per tick
//! - Perception: detection radius, paid for every tick
//! - Digestion: trade-off between eating creatures and eating food
//!
//! Genes are immutable; offspring receive mutated copies.

pub mod gene;
pub mod genome;

pub use gene::{Gene, Trait, TraitSpec, MUTATION_RATIO};
pub use genome::{DietClass, DietRatios, Genome};
