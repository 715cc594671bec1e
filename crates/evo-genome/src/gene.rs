//! Bounded scalar traits and their costs.

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Heritable traits a creature carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trait {
    Size,
    Speed,
    Perception,
    Digestion,
}

/// Static bounds and mutation behavior of a trait
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraitSpec {
    pub min: f64,
    pub max: f64,
    pub default: f64,
    /// Mutation offsets are drawn from `±(span * mutation_ratio)`
    pub mutation_ratio: f64,
}

impl TraitSpec {
    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Largest change a single mutation can apply
    pub fn mutation_range(&self) -> f64 {
        self.span() * self.mutation_ratio
    }

    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            return self.default;
        }
        value.clamp(self.min, self.max)
    }
}

pub const MUTATION_RATIO: f64 = 0.033;

impl Trait {
    pub const ALL: [Trait; 4] = [Trait::Size, Trait::Speed, Trait::Perception, Trait::Digestion];

    pub fn spec(&self) -> TraitSpec {
        let (min, max, default) = match self {
            Trait::Size => (0.8, 4.0, 1.0),
            Trait::Speed => (0.8, 6.0, 1.0),
            Trait::Perception => (0.4, 3.0, 0.5),
            Trait::Digestion => (0.0, 10.0, 5.0),
        };
        TraitSpec {
            min,
            max,
            default,
            mutation_ratio: MUTATION_RATIO,
        }
    }

    /// Energy cost of carrying a trait at `value`
    pub fn cost(&self, value: f64) -> f64 {
        match self {
            // Volume of a sphere
            Trait::Size => 4.189 * value.powi(3),
            // Kinetic energy
            Trait::Speed => 0.5 * value.powi(2),
            // Half the surveyed disc
            Trait::Perception => 3.142 * value.powi(2),
            Trait::Digestion => value,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Trait::Size => "size",
            Trait::Speed => "speed",
            Trait::Perception => "perception",
            Trait::Digestion => "digestion",
        }
    }
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A trait value, always within its bounds. Immutable: mutation yields a new gene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    kind: Trait,
    value: f64,
    cost: f64,
}

impl Gene {
    /// Build a gene, clamping `value` into bounds. `None` means the trait default.
    pub fn new(kind: Trait, value: Option<f64>) -> Self {
        let spec = kind.spec();
        let value = spec.clamp(value.unwrap_or(spec.default));
        Self {
            kind,
            value,
            cost: kind.cost(value),
        }
    }

    pub fn default_for(kind: Trait) -> Self {
        Self::new(kind, None)
    }

    /// Roll a value uniformly within `default ± span * spread`
    pub fn random(kind: Trait, spread: f64, rng: &mut ChaCha8Rng) -> Self {
        let spec = kind.spec();
        let range = (spec.span() * spread).abs();
        if range == 0.0 {
            return Self::default_for(kind);
        }
        Self::new(kind, Some(spec.default + rng.gen_range(-range..=range)))
    }

    /// Copy of this gene with a uniformly random offset applied
    pub fn mutate(&self, rng: &mut ChaCha8Rng) -> Self {
        let range = self.kind.spec().mutation_range();
        Self::new(self.kind, Some(self.value + rng.gen_range(-range..=range)))
    }

    pub fn kind(&self) -> Trait {
        self.kind
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn cost(&self) -> f64 {
        self.cost
    }
}
