//! Debounced shake detection over motion samples.

use std::time::{Duration, Instant};

use crate::samples::MotionSample;

/// Total acceleration (m/s², gravity included) a sample must exceed to count
/// as a shake.
pub const SHAKE_THRESHOLD: f64 = 15.0;
/// Minimum gap between two recognized shakes.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(1000);

/// A recognized shake.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShakeEvent {
    /// Running count, monotonically non-decreasing for the detector's lifetime.
    pub count: u32,
    pub magnitude: f64,
}

/// Threshold detector with a debounce window.
///
/// Edge-triggered: sustained high magnitude fires once per window, not
/// continuously. The first qualifying sample fires immediately.
#[derive(Debug)]
pub struct ShakeDetector {
    threshold: f64,
    debounce: Duration,
    last_fire: Option<Instant>,
    count: u32,
}

impl ShakeDetector {
    pub fn new(threshold: f64, debounce: Duration) -> Self {
        Self {
            threshold,
            debounce,
            last_fire: None,
            count: 0,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Feed one motion sample. Returns the shake event if this sample fires.
    pub fn process(&mut self, sample: &MotionSample, now: Instant) -> Option<ShakeEvent> {
        let magnitude = sample.magnitude();
        if magnitude <= self.threshold {
            return None;
        }
        if let Some(last) = self.last_fire {
            if now.duration_since(last) < self.debounce {
                return None;
            }
        }
        self.last_fire = Some(now);
        self.count += 1;
        Some(ShakeEvent {
            count: self.count,
            magnitude,
        })
    }
}

impl Default for ShakeDetector {
    fn default() -> Self {
        Self::new(SHAKE_THRESHOLD, DEBOUNCE_WINDOW)
    }
}
