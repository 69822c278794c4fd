//! In-memory model of the dashboard: every named slot the monitor renders
//! into, plus a plain-text renderer for the terminal.

use std::fmt;

use crate::transform::{IndicatorOffset, LightLevel};

/// Placeholder shown in the reading slots after `stop()`.
pub const STOPPED: &str = "Stopped";
/// Placeholder shown while a sensor has produced nothing yet.
pub const WAITING: &str = "Waiting...";

/// Availability class attached to a status slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Available,
    Unavailable,
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusClass::Available => write!(f, "available"),
            StatusClass::Unavailable => write!(f, "unavailable"),
        }
    }
}

/// One per-sensor status slot: human text plus an availability class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSlot {
    pub text: String,
    pub class: StatusClass,
}

impl StatusSlot {
    pub fn available() -> Self {
        Self {
            text: "Available".to_string(),
            class: StatusClass::Available,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            text: "Unavailable".to_string(),
            class: StatusClass::Unavailable,
        }
    }

    pub fn error() -> Self {
        Self {
            text: "Error".to_string(),
            class: StatusClass::Unavailable,
        }
    }
}

impl Default for StatusSlot {
    fn default() -> Self {
        Self {
            text: "Unknown".to_string(),
            class: StatusClass::Unavailable,
        }
    }
}

/// The colored ambient-light panel; `None` until a reading arrives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightPanel {
    pub level: LightLevel,
    pub illuminance: f64,
}

/// Everything the page displays. Mutated only by the monitor; rendered by
/// whoever drives it.
#[derive(Debug, Clone, Default)]
pub struct DisplayModel {
    pub accelerometer_status: StatusSlot,
    pub gyroscope_status: StatusSlot,
    pub orientation_status: StatusSlot,
    pub light_status: StatusSlot,
    pub shake_status: StatusSlot,
    pub summary_status: String,

    pub accelerometer_data: String,
    pub gyroscope_data: String,
    pub orientation_data: String,
    pub light_data: String,
    pub shake_data: String,

    pub acceleration_ball: IndicatorOffset,
    pub tilt_ball: IndicatorOffset,
    pub needle_angle: f64,
    pub light_panel: Option<LightPanel>,
    pub shake_animating: bool,

    pub supported_sensors: Vec<String>,
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub calibrate_enabled: bool,
    pub alert: Option<String>,
}

impl DisplayModel {
    pub fn new() -> Self {
        Self {
            summary_status: "Idle".to_string(),
            accelerometer_data: WAITING.to_string(),
            gyroscope_data: WAITING.to_string(),
            orientation_data: WAITING.to_string(),
            light_data: WAITING.to_string(),
            shake_data: WAITING.to_string(),
            start_enabled: true,
            stop_enabled: false,
            calibrate_enabled: true,
            ..Self::default()
        }
    }

    /// Reset reading slots and indicators to their neutral state. The light
    /// panel keeps its last value, matching the page's stop behavior.
    pub fn reset_readings(&mut self) {
        self.accelerometer_data = STOPPED.to_string();
        self.gyroscope_data = STOPPED.to_string();
        self.orientation_data = STOPPED.to_string();
        self.shake_data = WAITING.to_string();
        self.acceleration_ball = IndicatorOffset::centered();
        self.tilt_ball = IndicatorOffset::centered();
        self.needle_angle = 0.0;
        self.shake_animating = false;
    }

    /// Render the model as a plain-text dashboard.
    pub fn render(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("sensedeck — {}\n\n", self.summary_status));

        if let Some(alert) = &self.alert {
            out.push_str(&format!("  !! {alert}\n\n"));
        }

        out.push_str(&status_line(
            "Accelerometer",
            &self.accelerometer_status,
            &self.accelerometer_data,
        ));
        out.push_str(&status_line(
            "Gyroscope",
            &self.gyroscope_status,
            &self.gyroscope_data,
        ));
        out.push_str(&status_line(
            "Orientation",
            &self.orientation_status,
            &self.orientation_data,
        ));
        out.push_str(&status_line("Light", &self.light_status, &self.light_data));
        out.push_str(&status_line("Shake", &self.shake_status, &self.shake_data));
        out.push('\n');

        out.push_str(&format!(
            "  Acceleration ball: ({:+.1}, {:+.1}) px\n",
            self.acceleration_ball.x, self.acceleration_ball.y
        ));
        out.push_str(&format!(
            "  Tilt ball:         ({:+.1}, {:+.1}) px\n",
            self.tilt_ball.x, self.tilt_ball.y
        ));
        out.push_str(&format!("  Compass needle:    {:.1}°\n", self.needle_angle));

        if let Some(panel) = &self.light_panel {
            out.push_str(&format!(
                "  Light panel:       {} — {:.0} lux (bg {}, fg {})\n",
                panel.level.label(),
                panel.illuminance,
                panel.level.background(),
                panel.level.text_color()
            ));
        }

        if self.shake_animating {
            out.push_str("  Shake icon:        ~~~ shaking ~~~\n");
        }
        out.push('\n');

        if !self.supported_sensors.is_empty() {
            out.push_str("  Detected sensors:\n");
            for sensor in &self.supported_sensors {
                out.push_str(&format!("    - {sensor}\n"));
            }
            out.push('\n');
        }

        out.push_str(&format!(
            "  Controls: {} {} {}\n",
            control("start", self.start_enabled),
            control("stop", self.stop_enabled),
            control("calibrate", self.calibrate_enabled),
        ));

        out
    }
}

fn status_line(name: &str, status: &StatusSlot, data: &str) -> String {
    format!("  {:<14} [{:<11}] {}\n", name, status.text, data)
}

fn control(name: &str, enabled: bool) -> String {
    if enabled {
        format!("[{name}]")
    } else {
        format!("({name})")
    }
}
