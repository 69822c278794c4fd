//! Raw sensor sample types

/// One device-motion reading: acceleration including gravity, m/s² per axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MotionSample {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Total acceleration across the three axes.
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// One device-orientation reading, in degrees.
///
/// alpha ∈ [0, 360), beta ∈ [-180, 180], gamma ∈ [-90, 90]. Sources
/// substitute 0 for axes the hardware does not report.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct OrientationSample {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl OrientationSample {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }
}

/// One ambient-light reading, in lux (non-negative).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightSample {
    pub illuminance: f64,
}

impl LightSample {
    pub fn new(illuminance: f64) -> Self {
        Self { illuminance }
    }
}
