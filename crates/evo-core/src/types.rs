//! Core type definitions for the simulation.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};

/// Unique identifier for any entity on the map (food, creature or marker)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out entity ids. Owned by the world; ids are never reused.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next += 1;
        id
    }

    /// Number of ids handed out so far
    pub fn allocated(&self) -> u64 {
        self.next
    }
}

/// 2D point / vector on the continuous map
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(&self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(&self, other: Vec2) -> f64 {
        (other - *self).length()
    }

    /// Unit vector in the same direction, `None` for a zero-length vector
    pub fn normalize(&self) -> Option<Vec2> {
        let length = self.length();
        if length > 0.0 && length.is_finite() {
            Some(Vec2::new(self.x / length, self.y / length))
        } else {
            None
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl fmt::Display for Vec2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Playable area of the map. Entities live inside `[margin, size - margin]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub width: f64,
    pub height: f64,
    pub margin: f64,
    /// Width of the band escape markers are re-rolled into
    pub edge_band: f64,
}

impl MapBounds {
    pub fn new(width: f64, height: f64, margin: f64, edge_band: f64) -> Self {
        Self {
            width,
            height,
            margin,
            edge_band,
        }
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= self.margin
            && pos.x <= self.width - self.margin
            && pos.y >= self.margin
            && pos.y <= self.height - self.margin
    }

    /// Clamp a position into the playable area
    pub fn clamp(&self, pos: Vec2) -> Vec2 {
        Vec2::new(
            pos.x.clamp(self.margin, self.width - self.margin),
            pos.y.clamp(self.margin, self.height - self.margin),
        )
    }

    /// Any axis out of range is re-rolled inside the band along the edge it
    /// crossed, so a fleeing creature does not pile up in the corner.
    pub fn bounce<R: Rng + ?Sized>(&self, pos: Vec2, rng: &mut R) -> Vec2 {
        Vec2::new(
            Self::bounce_axis(pos.x, self.width, self.margin, self.edge_band, rng),
            Self::bounce_axis(pos.y, self.height, self.margin, self.edge_band, rng),
        )
    }

    fn bounce_axis<R: Rng + ?Sized>(
        value: f64,
        extent: f64,
        margin: f64,
        band: f64,
        rng: &mut R,
    ) -> f64 {
        let low = margin;
        let high = extent - margin;
        let band = band.clamp(0.0, high - low);
        if value < low {
            Self::uniform(rng, low, low + band)
        } else if value > high {
            Self::uniform(rng, high - band, high)
        } else {
            value
        }
    }

    pub fn random_position<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        Vec2::new(
            Self::uniform(rng, self.margin, self.width - self.margin),
            Self::uniform(rng, self.margin, self.height - self.margin),
        )
    }

    fn uniform<R: Rng + ?Sized>(rng: &mut R, low: f64, high: f64) -> f64 {
        if high > low {
            rng.gen_range(low..high)
        } else {
            low
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn bounds() -> MapBounds {
        MapBounds::new(1000.0, 500.0, 20.0, 256.0)
    }

    #[test]
    fn test_id_allocator_is_monotonic() {
        let mut ids = IdAllocator::new();
        let a = ids.allocate();
        let b = ids.allocate();
        assert!(b > a);
        assert_eq!(ids.allocated(), 2);
    }

    #[test]
    fn test_normalize_zero_vector() {
        assert_eq!(Vec2::ZERO.normalize(), None);

        let unit = Vec2::new(3.0, 4.0).normalize().unwrap();
        assert!((unit.length() - 1.0).abs() < 1e-12);
        assert!((unit.x - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_distance() {
        assert_eq!(Vec2::new(0.0, 0.0).distance(Vec2::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn test_clamp() {
        let b = bounds();
        assert_eq!(b.clamp(Vec2::new(-5.0, 900.0)), Vec2::new(20.0, 480.0));
        assert_eq!(b.clamp(Vec2::new(100.0, 100.0)), Vec2::new(100.0, 100.0));
    }

    #[test]
    fn test_bounce_rerolls_only_out_of_range_axis() {
        let b = bounds();
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        for _ in 0..100 {
            let pos = b.bounce(Vec2::new(-50.0, 250.0), &mut rng);
            assert_eq!(pos.y, 250.0);
            assert!(pos.x >= 20.0 && pos.x <= 276.0);

            let pos = b.bounce(Vec2::new(500.0, 999.0), &mut rng);
            assert_eq!(pos.x, 500.0);
            assert!(b.contains(pos));
        }
    }

    #[test]
    fn test_random_position_in_bounds() {
        let b = bounds();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for _ in 0..1000 {
            assert!(b.contains(b.random_position(&mut rng)));
        }
    }
}
