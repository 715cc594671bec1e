//! Shared run controls: speed, stop flag and spotlight.

use evo_core::{EntityId, DEFAULT_SPEED, SPEED_RANGE};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
struct Inner {
    speed: AtomicU32,
    stop: AtomicBool,
    spotlight: RwLock<Option<EntityId>>,
}

/// Cheap-to-clone handle shared between the tick driver and whatever
/// drives it (signal handlers, the runner loop).
#[derive(Debug, Clone)]
pub struct ControlHandle {
    inner: Arc<Inner>,
}

impl Default for ControlHandle {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED)
    }
}

impl ControlHandle {
    pub fn new(speed: u32) -> Self {
        Self {
            inner: Arc::new(Inner {
                speed: AtomicU32::new(clamp_speed(speed)),
                stop: AtomicBool::new(false),
                spotlight: RwLock::new(None),
            }),
        }
    }

    /// Ticks per second
    pub fn speed(&self) -> u32 {
        self.inner.speed.load(Ordering::Relaxed)
    }

    pub fn set_speed(&self, speed: u32) -> u32 {
        let speed = clamp_speed(speed);
        self.inner.speed.store(speed, Ordering::Relaxed);
        speed
    }

    pub fn faster(&self) -> u32 {
        self.set_speed(self.speed().saturating_add(1))
    }

    pub fn slower(&self) -> u32 {
        self.set_speed(self.speed().saturating_sub(1))
    }

    pub fn reset_speed(&self) -> u32 {
        self.set_speed(DEFAULT_SPEED)
    }

    /// Time between two ticks at the current speed
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.speed() as f64)
    }

    pub fn request_stop(&self) {
        self.inner.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stop.load(Ordering::SeqCst)
    }

    pub fn spotlight(&self) -> Option<EntityId> {
        *self.inner.spotlight.read()
    }

    pub fn set_spotlight(&self, id: Option<EntityId>) {
        *self.inner.spotlight.write() = id;
    }

    /// Clear the spotlight if it points at `id`
    pub fn release_spotlight(&self, id: EntityId) -> bool {
        let mut spotlight = self.inner.spotlight.write();
        if *spotlight == Some(id) {
            *spotlight = None;
            true
        } else {
            false
        }
    }
}

fn clamp_speed(speed: u32) -> u32 {
    speed.clamp(SPEED_RANGE.0, SPEED_RANGE.1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_is_clamped() {
        let control = ControlHandle::new(0);
        assert_eq!(control.speed(), SPEED_RANGE.0);
        assert_eq!(control.slower(), SPEED_RANGE.0);

        assert_eq!(control.set_speed(10_000), SPEED_RANGE.1);
        assert_eq!(control.faster(), SPEED_RANGE.1);

        assert_eq!(control.reset_speed(), DEFAULT_SPEED);
        assert_eq!(control.faster(), DEFAULT_SPEED + 1);
    }

    #[test]
    fn test_clones_share_state() {
        let control = ControlHandle::default();
        let other = control.clone();

        other.request_stop();
        assert!(control.is_stopped());

        other.set_spotlight(Some(EntityId(4)));
        assert_eq!(control.spotlight(), Some(EntityId(4)));
        assert!(!control.release_spotlight(EntityId(5)));
        assert!(control.release_spotlight(EntityId(4)));
        assert_eq!(other.spotlight(), None);
    }

    #[test]
    fn test_tick_period_follows_speed() {
        let control = ControlHandle::new(20);
        assert_eq!(control.tick_period(), Duration::from_millis(50));
    }
}
