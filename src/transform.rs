//! Pure display transforms: raw samples to bounded indicator positions,
//! compass headings, and brightness tiers.

use crate::samples::{MotionSample, OrientationSample};

/// Acceleration (m/s²) treated as full indicator deflection.
pub const MAX_ACCELERATION: f64 = 20.0;
/// Pixels of deflection at `MAX_ACCELERATION`.
pub const ACCELERATION_SCALE: f64 = 50.0;
/// Indicator travel limit, display pixels from center.
pub const INDICATOR_BOUND: f64 = 70.0;
/// Tilt angle (degrees) treated as full indicator deflection.
pub const MAX_ROTATION: f64 = 180.0;

/// A clamped 2D indicator position, display pixels from center.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IndicatorOffset {
    pub x: f64,
    pub y: f64,
}

impl IndicatorOffset {
    /// Centered/neutral position.
    pub fn centered() -> Self {
        Self::default()
    }
}

fn acceleration_axis(value: f64) -> f64 {
    (value / MAX_ACCELERATION * ACCELERATION_SCALE).clamp(-INDICATOR_BOUND, INDICATOR_BOUND)
}

/// Position of the acceleration ball for a motion sample.
pub fn acceleration_offset(sample: &MotionSample) -> IndicatorOffset {
    IndicatorOffset {
        x: acceleration_axis(sample.x),
        y: acceleration_axis(sample.y),
    }
}

fn tilt_axis(degrees: f64) -> f64 {
    (degrees / MAX_ROTATION * INDICATOR_BOUND).clamp(-INDICATOR_BOUND, INDICATOR_BOUND)
}

/// Position of the tilt ball: gamma drives x, beta drives y.
pub fn tilt_offset(sample: &OrientationSample) -> IndicatorOffset {
    IndicatorOffset {
        x: tilt_axis(sample.gamma),
        y: tilt_axis(sample.beta),
    }
}

/// Needle rotation for a north-up compass. Alpha's sense is inverted and the
/// user calibration offset folded in additively. Always in [0, 360).
pub fn compass_heading(alpha: f64, calibration_offset: f64) -> f64 {
    (360.0 - alpha + calibration_offset).rem_euclid(360.0)
}

/// Brightness tier for an illuminance reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightLevel {
    VeryDark,
    Dark,
    LowLight,
    WellLit,
    VeryBright,
    IntenseLight,
}

impl LightLevel {
    /// Tier for a lux value. Total over all readings; each threshold is an
    /// exclusive lower bound of the next tier, so 10 lux is already `Dark`.
    pub fn from_lux(lux: f64) -> Self {
        if lux < 10.0 {
            LightLevel::VeryDark
        } else if lux < 50.0 {
            LightLevel::Dark
        } else if lux < 100.0 {
            LightLevel::LowLight
        } else if lux < 1000.0 {
            LightLevel::WellLit
        } else if lux < 10000.0 {
            LightLevel::VeryBright
        } else {
            LightLevel::IntenseLight
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LightLevel::VeryDark => "Very dark",
            LightLevel::Dark => "Dark",
            LightLevel::LowLight => "Low light",
            LightLevel::WellLit => "Well lit",
            LightLevel::VeryBright => "Very bright",
            LightLevel::IntenseLight => "Intense light",
        }
    }

    /// Background color of the light panel.
    pub fn background(&self) -> &'static str {
        match self {
            LightLevel::VeryDark => "#111",
            LightLevel::Dark => "#333",
            LightLevel::LowLight => "#666",
            LightLevel::WellLit => "#999",
            LightLevel::VeryBright => "#CCC",
            LightLevel::IntenseLight => "#FFF",
        }
    }

    /// Text color that stays readable on `background`.
    pub fn text_color(&self) -> &'static str {
        match self {
            LightLevel::VeryDark | LightLevel::Dark | LightLevel::LowLight => "#FFF",
            LightLevel::WellLit | LightLevel::VeryBright | LightLevel::IntenseLight => "#000",
        }
    }
}
