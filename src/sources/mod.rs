//! Sensor source abstraction: capabilities, subscriptions, and the
//! permission gate. The monitor only ever talks to a `DeviceBackend`, so
//! tests can drive it with hand-fed channels.

pub mod simulated;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::samples::{LightSample, MotionSample, OrientationSample};

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("{0} sensor is not supported on this device")]
    Unavailable(&'static str),
    #[error("sensor permission denied")]
    PermissionDenied,
    #[error("sensor failure: {0}")]
    Runtime(String),
}

/// Outcome of a platform consent prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionDecision {
    Granted,
    Denied,
}

/// What the platform exposes. Absence of a capability is a normal, expected
/// outcome, never an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    pub motion: bool,
    pub orientation: bool,
    pub ambient_light: bool,
    pub proximity: bool,
    pub magnetometer: bool,
    pub linear_acceleration: bool,
    pub gravity: bool,
}

impl Capabilities {
    /// Human descriptions of every exposed sensor; a single placeholder
    /// entry when nothing is available.
    pub fn supported_sensors(&self) -> Vec<String> {
        let mut sensors = Vec::new();

        if self.motion {
            sensors.push("Accelerometer (3 axes, gravity included)".to_string());
        }
        if self.orientation {
            sensors.push("Gyroscope/Orientation (alpha, beta, gamma)".to_string());
        }
        if self.ambient_light {
            sensors.push("Ambient light sensor (lux)".to_string());
        }
        if self.proximity {
            sensors.push("Proximity sensor".to_string());
        }
        if self.magnetometer {
            sensors.push("Magnetometer (magnetic field)".to_string());
        }
        if self.linear_acceleration {
            sensors.push("Linear acceleration (gravity excluded)".to_string());
        }
        if self.gravity {
            sensors.push("Gravity sensor".to_string());
        }

        if sensors.is_empty() {
            sensors.push("No compatible sensors detected".to_string());
        }

        sensors
    }
}

/// An item on the ambient-light stream: the sensor can fail asynchronously
/// after it was constructed.
#[derive(Debug, Clone)]
pub enum LightReading {
    Sample(LightSample),
    Failed(String),
}

/// Handle to an active sensor stream. Dropping it unsubscribes and stops the
/// producing task, which releases the underlying sensor.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::Receiver<T>,
    producer: Option<JoinHandle<()>>,
}

impl<T> Subscription<T> {
    pub fn new(rx: mpsc::Receiver<T>, producer: Option<JoinHandle<()>>) -> Self {
        Self { rx, producer }
    }

    /// Next delivered sample; `None` once the producer is gone.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        if let Some(task) = self.producer.take() {
            task.abort();
        }
    }
}

/// A device's sensor surface.
pub trait DeviceBackend {
    fn capabilities(&self) -> Capabilities;

    /// Platform consent prompt, if this backend requires one. The receiver
    /// resolves once the user answers; `None` means no gate on this platform.
    fn request_permission(&mut self) -> Option<oneshot::Receiver<PermissionDecision>> {
        None
    }

    fn subscribe_motion(&mut self) -> Result<Subscription<MotionSample>, SensorError>;

    fn subscribe_orientation(&mut self) -> Result<Subscription<OrientationSample>, SensorError>;

    fn subscribe_light(&mut self) -> Result<Subscription<LightReading>, SensorError>;
}
