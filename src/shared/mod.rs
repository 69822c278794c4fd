//! Shared display formatting helpers for sensedeck

use crate::samples::{MotionSample, OrientationSample};

/// Format a motion sample the way the acceleration slot shows it.
pub fn format_axes(sample: &MotionSample) -> String {
    format!(
        "X: {:.2} | Y: {:.2} | Z: {:.2}",
        sample.x, sample.y, sample.z
    )
}

/// Format an orientation sample in degrees.
pub fn format_angles(sample: &OrientationSample) -> String {
    format!(
        "α: {:.1}° | β: {:.1}° | γ: {:.1}°",
        sample.alpha, sample.beta, sample.gamma
    )
}

/// Format an orientation sample with rate units for the gyroscope slot.
pub fn format_rates(sample: &OrientationSample) -> String {
    format!(
        "α: {:.1}°/s | β: {:.1}°/s | γ: {:.1}°/s",
        sample.alpha, sample.beta, sample.gamma
    )
}

/// Format an illuminance value for display.
pub fn format_lux(illuminance: f64) -> String {
    format!("{illuminance:.0} lux")
}
