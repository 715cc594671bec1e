//! A creature's full set of traits.

use crate::gene::{Gene, Trait};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Digestion values are rescaled into `[-DIGESTION_SCALE, DIGESTION_SCALE]`
/// before deriving the diet multipliers.
pub const DIGESTION_SCALE: f64 = 2.0;

/// Diet multipliers derived from the digestion gene. Both are always > 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DietRatios {
    pub carnivore: f64,
    pub herbivore: f64,
}

impl DietRatios {
    pub fn from_digestion(value: f64) -> Self {
        let spec = Trait::Digestion.spec();
        let value = spec.clamp(value);
        let scaled = -DIGESTION_SCALE + 2.0 * DIGESTION_SCALE * (value - spec.min) / spec.span();

        if scaled >= 0.0 {
            Self {
                carnivore: scaled + 1.0,
                herbivore: 1.0 / (scaled + 1.0),
            }
        } else {
            Self {
                carnivore: 1.0 / (1.0 - scaled),
                herbivore: 1.0 - scaled,
            }
        }
    }
}

/// Coarse diet classification, used for depiction only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DietClass {
    Herbivore,
    Omnivore,
    Carnivore,
}

impl DietClass {
    pub fn from_digestion(value: f64) -> Self {
        if value >= 6.0 {
            DietClass::Carnivore
        } else if value <= 4.0 {
            DietClass::Herbivore
        } else {
            DietClass::Omnivore
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub size: Gene,
    pub speed: Gene,
    pub perception: Gene,
    pub digestion: Gene,
}

impl Default for Genome {
    fn default() -> Self {
        Self {
            size: Gene::default_for(Trait::Size),
            speed: Gene::default_for(Trait::Speed),
            perception: Gene::default_for(Trait::Perception),
            digestion: Gene::default_for(Trait::Digestion),
        }
    }
}

impl Genome {
    /// Build a genome from raw values, clamping each into bounds
    pub fn from_values(size: f64, speed: f64, perception: f64, digestion: f64) -> Self {
        Self {
            size: Gene::new(Trait::Size, Some(size)),
            speed: Gene::new(Trait::Speed, Some(speed)),
            perception: Gene::new(Trait::Perception, Some(perception)),
            digestion: Gene::new(Trait::Digestion, Some(digestion)),
        }
    }

    /// Fresh genome for a world-seed creature
    pub fn random(spread: f64, rng: &mut ChaCha8Rng) -> Self {
        Self {
            size: Gene::random(Trait::Size, spread, rng),
            speed: Gene::random(Trait::Speed, spread, rng),
            perception: Gene::random(Trait::Perception, spread, rng),
            digestion: Gene::random(Trait::Digestion, spread, rng),
        }
    }

    /// Offspring genome: every gene mutated independently
    pub fn mutate(&self, rng: &mut ChaCha8Rng) -> Self {
        Self {
            size: self.size.mutate(rng),
            speed: self.speed.mutate(rng),
            perception: self.perception.mutate(rng),
            digestion: self.digestion.mutate(rng),
        }
    }

    pub fn gene(&self, kind: Trait) -> &Gene {
        match kind {
            Trait::Size => &self.size,
            Trait::Speed => &self.speed,
            Trait::Perception => &self.perception,
            Trait::Digestion => &self.digestion,
        }
    }

    pub fn diet(&self) -> DietRatios {
        DietRatios::from_digestion(self.digestion.value())
    }

    pub fn diet_class(&self) -> DietClass {
        DietClass::from_digestion(self.digestion.value())
    }

    /// Multiplier applied when eating a creature (`true`) or food (`false`)
    pub fn digestion_ratio(&self, eating_creature: bool) -> f64 {
        let diet = self.diet();
        if eating_creature {
            diet.carnivore
        } else {
            diet.herbivore
        }
    }

    pub fn perception_distance(&self, scale: f64) -> f64 {
        self.perception.value() * scale
    }
}
