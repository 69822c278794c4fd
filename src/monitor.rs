//! The sensor monitor: the session state machine behind the dashboard, plus
//! the async runtime that wires it to a `DeviceBackend`.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};

use crate::config::Config;
use crate::display::{DisplayModel, StatusSlot};
use crate::notify::Notifier;
use crate::samples::{LightSample, MotionSample, OrientationSample};
use crate::shake::ShakeDetector;
use crate::shared::{format_angles, format_axes, format_lux, format_rates};
use crate::sources::{Capabilities, DeviceBackend, LightReading, PermissionDecision, Subscription};
use crate::transform::{acceleration_offset, compass_heading, tilt_offset, LightLevel};

/// User-triggered control actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Calibrate,
    Quit,
}

/// Session state and display logic. Synchronous and single-threaded; every
/// time-dependent method takes an explicit `Instant`, and scheduled effects
/// are deadlines expired by `tick`, so nothing outlives the monitor.
#[derive(Debug)]
pub struct SensorMonitor {
    active: bool,
    calibration_offset: f64,
    shake: ShakeDetector,
    display: DisplayModel,
    notifier: Notifier,
    rng: StdRng,
    shake_anim: Duration,
    calibrate_delay: Duration,
    shake_anim_until: Option<Instant>,
    calibrating_until: Option<Instant>,
}

impl SensorMonitor {
    pub fn new(config: &Config, seed: u64) -> Self {
        Self {
            active: false,
            calibration_offset: 0.0,
            shake: ShakeDetector::new(config.shake_threshold, config.shake_debounce()),
            display: DisplayModel::new(),
            notifier: Notifier::new(config.toast_display(), config.toast_exit()),
            rng: StdRng::seed_from_u64(seed),
            shake_anim: config.shake_animation(),
            calibrate_delay: config.calibrate_delay(),
            shake_anim_until: None,
            calibrating_until: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn display(&self) -> &DisplayModel {
        &self.display
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn calibration_offset(&self) -> f64 {
        self.calibration_offset
    }

    /// Availability probe: render per-sensor status and recompute the
    /// supported-sensor list. Absence is a normal outcome, not a failure.
    pub fn probe(&mut self, caps: &Capabilities) {
        let motion_status = || {
            if caps.motion {
                StatusSlot::available()
            } else {
                StatusSlot::unavailable()
            }
        };
        let orientation_status = || {
            if caps.orientation {
                StatusSlot::available()
            } else {
                StatusSlot::unavailable()
            }
        };

        self.display.accelerometer_status = motion_status();
        self.display.shake_status = motion_status();
        self.display.gyroscope_status = orientation_status();
        self.display.orientation_status = orientation_status();

        if caps.ambient_light {
            self.display.light_status = StatusSlot::available();
            self.display.light_data = "Ready to measure".to_string();
        } else {
            self.display.light_status = StatusSlot::unavailable();
            self.display.light_data = "Not available on this device".to_string();
        }

        self.display.supported_sensors = caps.supported_sensors();
        self.display.summary_status = format!("{} sensors", self.display.supported_sensors.len());
    }

    /// Permission was denied during start: surface a blocking alert and stay
    /// inactive.
    pub fn deny_start(&mut self) {
        tracing::warn!("sensor permission denied");
        self.display.alert = Some("Permission is required to access the sensors.".to_string());
    }

    /// Transition to ACTIVE after subscriptions are up. A light-sensor
    /// construction error is reported but never aborts the other sensors.
    pub fn activate(&mut self, light_error: Option<String>, now: Instant) {
        self.active = true;
        self.display.alert = None;
        self.display.start_enabled = false;
        self.display.stop_enabled = true;
        if let Some(message) = light_error {
            self.report_light_error(&message);
        }
        self.display.summary_status = "Active".to_string();
        self.notifier.push("Sensors activated", now);
    }

    /// Transition to INACTIVE: reset every indicator and reading slot.
    pub fn deactivate(&mut self, now: Instant) {
        self.active = false;
        self.display.start_enabled = true;
        self.display.stop_enabled = false;
        self.display.reset_readings();
        self.shake_anim_until = None;
        self.display.summary_status = "Stopped".to_string();
        self.notifier.push("Sensors stopped", now);
    }

    pub fn handle_motion(&mut self, sample: &MotionSample, now: Instant) {
        self.display.accelerometer_data = format_axes(sample);
        self.display.acceleration_ball = acceleration_offset(sample);

        if let Some(event) = self.shake.process(sample, now) {
            tracing::debug!("shake #{} at magnitude {:.1}", event.count, event.magnitude);
            self.display.shake_data = format!("Shaken! ({} times)", event.count);
            self.display.shake_animating = true;
            self.shake_anim_until = Some(now + self.shake_anim);
            self.notifier
                .push(format!("Device shaken! ({})", event.count), now);
        }
    }

    pub fn handle_orientation(&mut self, sample: &OrientationSample) {
        self.display.orientation_data = format_angles(sample);
        self.display.needle_angle = compass_heading(sample.alpha, self.calibration_offset);
        self.display.gyroscope_data = format_rates(sample);
        self.display.tilt_ball = tilt_offset(sample);
    }

    pub fn handle_light(&mut self, sample: &LightSample) {
        self.display.light_data = format_lux(sample.illuminance);
        self.display.light_panel = Some(crate::display::LightPanel {
            level: LightLevel::from_lux(sample.illuminance),
            illuminance: sample.illuminance,
        });
    }

    /// A light-sensor failure, at construction or mid-stream. Non-fatal.
    pub fn report_light_error(&mut self, message: &str) {
        tracing::warn!("light sensor failed: {message}");
        self.display.light_status = StatusSlot::error();
        self.display.light_data = format!("Error: {message}");
    }

    /// Set a new calibration offset so the current heading reads as north.
    /// The offset is simulated (uniform over [0, 360)); a guidance toast is
    /// shown instead when the sensors are not running.
    pub fn calibrate(&mut self, now: Instant) {
        if !self.active {
            self.notifier.push("Start the sensors first", now);
            return;
        }
        if self.calibrating_until.is_some() {
            return; // control is disabled mid-calibration
        }

        self.calibration_offset = self.rng.gen_range(0.0..360.0);
        self.display.calibrate_enabled = false;
        self.calibrating_until = Some(now + self.calibrate_delay);
        self.notifier.push("Compass calibrated. North set.", now);
    }

    /// Expire deadlines: shake animation, calibration delay, stale toasts.
    pub fn tick(&mut self, now: Instant) {
        if self.shake_anim_until.is_some_and(|t| now >= t) {
            self.shake_anim_until = None;
            self.display.shake_animating = false;
        }
        if self.calibrating_until.is_some_and(|t| now >= t) {
            self.calibrating_until = None;
            self.display.calibrate_enabled = true;
            self.notifier.push("Calibration complete", now);
        }
        self.notifier.prune(now);
    }
}

struct ActiveStreams {
    motion: Option<Subscription<MotionSample>>,
    orientation: Option<Subscription<OrientationSample>>,
    light: Option<Subscription<LightReading>>,
}

enum StreamEvent {
    Motion(MotionSample),
    Orientation(OrientationSample),
    Light(LightReading),
}

enum Step {
    Command(Option<Command>),
    Tick,
    Event(Option<StreamEvent>),
}

/// Drives a `SensorMonitor` against a backend: owns the subscriptions and
/// multiplexes commands, sensor streams, and the render tick.
pub struct MonitorRuntime<B: DeviceBackend> {
    backend: B,
    monitor: SensorMonitor,
    streams: Option<ActiveStreams>,
}

impl<B: DeviceBackend> MonitorRuntime<B> {
    pub fn new(backend: B, mut monitor: SensorMonitor) -> Self {
        let caps = backend.capabilities();
        monitor.probe(&caps);
        Self {
            backend,
            monitor,
            streams: None,
        }
    }

    pub fn monitor(&self) -> &SensorMonitor {
        &self.monitor
    }

    /// Start the sensors. No-op while already active. On consent-gated
    /// platforms the permission decision is awaited first; a prompt failure
    /// is logged and leaves the monitor inactive.
    pub async fn start(&mut self, now: Instant) {
        if self.monitor.is_active() {
            return;
        }

        if let Some(decision) = self.backend.request_permission() {
            match decision.await {
                Ok(PermissionDecision::Granted) => {}
                Ok(PermissionDecision::Denied) => {
                    self.monitor.deny_start();
                    return;
                }
                Err(err) => {
                    tracing::error!("permission request failed: {err}");
                    return;
                }
            }
        }

        self.activate_streams(now);
    }

    fn activate_streams(&mut self, now: Instant) {
        let caps = self.backend.capabilities();

        let motion = caps.motion.then(|| self.backend.subscribe_motion());
        let motion = match motion {
            Some(Ok(sub)) => Some(sub),
            Some(Err(err)) => {
                tracing::warn!("motion subscription failed: {err}");
                None
            }
            None => None,
        };

        let orientation = caps
            .orientation
            .then(|| self.backend.subscribe_orientation());
        let orientation = match orientation {
            Some(Ok(sub)) => Some(sub),
            Some(Err(err)) => {
                tracing::warn!("orientation subscription failed: {err}");
                None
            }
            None => None,
        };

        let mut light_error = None;
        let light = if caps.ambient_light {
            match self.backend.subscribe_light() {
                Ok(sub) => Some(sub),
                Err(err) => {
                    light_error = Some(err.to_string());
                    None
                }
            }
        } else {
            None
        };

        self.streams = Some(ActiveStreams {
            motion,
            orientation,
            light,
        });
        self.monitor.activate(light_error, now);
    }

    /// Stop the sensors. No-op while inactive. Dropping the subscriptions
    /// unsubscribes every stream and stops the light sensor.
    pub fn stop(&mut self, now: Instant) {
        if !self.monitor.is_active() {
            return;
        }
        self.streams = None;
        self.monitor.deactivate(now);
    }

    /// Run until the command channel yields `Quit` or closes. `on_render` is
    /// called once per tick with the current monitor state.
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        refresh: Duration,
        mut on_render: impl FnMut(&SensorMonitor),
    ) -> Self {
        let mut ticker = interval(refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let step = {
                let streams = self.streams.as_mut();
                let subscribed = streams.is_some();
                tokio::select! {
                    cmd = commands.recv() => Step::Command(cmd),
                    _ = ticker.tick() => Step::Tick,
                    ev = next_stream_event(streams), if subscribed => Step::Event(ev),
                }
            };

            match step {
                Step::Command(None) | Step::Command(Some(Command::Quit)) => break,
                Step::Command(Some(Command::Start)) => self.start(Instant::now()).await,
                Step::Command(Some(Command::Stop)) => self.stop(Instant::now()),
                Step::Command(Some(Command::Calibrate)) => {
                    self.monitor.calibrate(Instant::now())
                }
                Step::Tick => {
                    self.monitor.tick(Instant::now());
                    on_render(&self.monitor);
                }
                Step::Event(Some(event)) => {
                    let now = Instant::now();
                    match event {
                        StreamEvent::Motion(sample) => self.monitor.handle_motion(&sample, now),
                        StreamEvent::Orientation(sample) => {
                            self.monitor.handle_orientation(&sample)
                        }
                        StreamEvent::Light(LightReading::Sample(sample)) => {
                            self.monitor.handle_light(&sample)
                        }
                        StreamEvent::Light(LightReading::Failed(message)) => {
                            self.monitor.report_light_error(&message)
                        }
                    }
                }
                Step::Event(None) => {
                    tracing::warn!("all sensor streams ended");
                    self.streams = None;
                }
            }
        }

        self
    }
}

/// Resolve the next sample from whichever stream delivers first. Pends
/// forever when unsubscribed; yields `None` once every producer is gone.
async fn next_stream_event(streams: Option<&mut ActiveStreams>) -> Option<StreamEvent> {
    let Some(streams) = streams else {
        return std::future::pending().await;
    };

    tokio::select! {
        Some(sample) = recv_from(&mut streams.motion) => Some(StreamEvent::Motion(sample)),
        Some(sample) = recv_from(&mut streams.orientation) => Some(StreamEvent::Orientation(sample)),
        Some(reading) = recv_from(&mut streams.light) => Some(StreamEvent::Light(reading)),
        else => None,
    }
}

async fn recv_from<T>(sub: &mut Option<Subscription<T>>) -> Option<T> {
    match sub {
        Some(sub) => sub.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{STOPPED, WAITING};
    use crate::sources::SensorError;
    use crate::transform::IndicatorOffset;
    use std::sync::{Arc, Mutex};
    use tokio::sync::oneshot;

    fn monitor() -> SensorMonitor {
        SensorMonitor::new(&Config::default(), 42)
    }

    fn full_caps() -> Capabilities {
        Capabilities {
            motion: true,
            orientation: true,
            ambient_light: true,
            ..Capabilities::default()
        }
    }

    #[test]
    fn probe_marks_available_and_unavailable_sensors() {
        let mut monitor = monitor();
        monitor.probe(&Capabilities {
            motion: true,
            orientation: true,
            ambient_light: false,
            ..Capabilities::default()
        });

        let display = monitor.display();
        assert_eq!(display.accelerometer_status.text, "Available");
        assert_eq!(display.shake_status.text, "Available");
        assert_eq!(display.gyroscope_status.text, "Available");
        assert_eq!(display.light_status.text, "Unavailable");
        assert_eq!(display.light_data, "Not available on this device");
        assert_eq!(display.supported_sensors.len(), 2);
        assert_eq!(display.summary_status, "2 sensors");
    }

    #[test]
    fn probe_with_no_sensors_lists_the_placeholder() {
        let mut monitor = monitor();
        monitor.probe(&Capabilities::default());

        let display = monitor.display();
        assert_eq!(
            display.supported_sensors,
            vec!["No compatible sensors detected".to_string()]
        );
        // The summary counts list entries, placeholder included.
        assert_eq!(display.summary_status, "1 sensors");
    }

    #[test]
    fn shake_scenario_counts_and_debounces() {
        let mut monitor = monitor();
        let base = Instant::now();
        monitor.activate(None, base);

        let jolt = MotionSample::new(16.0, 0.0, 0.0);

        monitor.handle_motion(&jolt, base + Duration::from_millis(2000));
        assert_eq!(monitor.display().shake_data, "Shaken! (1 times)");
        assert!(monitor.display().shake_animating);

        monitor.handle_motion(&jolt, base + Duration::from_millis(2500));
        assert_eq!(monitor.display().shake_data, "Shaken! (1 times)");

        monitor.handle_motion(&jolt, base + Duration::from_millis(3500));
        assert_eq!(monitor.display().shake_data, "Shaken! (2 times)");
    }

    #[test]
    fn shake_animation_expires_on_tick() {
        let mut monitor = monitor();
        let base = Instant::now();
        monitor.activate(None, base);
        monitor.handle_motion(&MotionSample::new(20.0, 0.0, 0.0), base);
        assert!(monitor.display().shake_animating);

        monitor.tick(base + Duration::from_millis(499));
        assert!(monitor.display().shake_animating);

        monitor.tick(base + Duration::from_millis(500));
        assert!(!monitor.display().shake_animating);
    }

    #[test]
    fn deactivate_resets_readings_and_indicators() {
        let mut monitor = monitor();
        let base = Instant::now();
        monitor.activate(None, base);
        monitor.handle_motion(&MotionSample::new(8.0, -4.0, 9.8), base);
        monitor.handle_orientation(&OrientationSample::new(90.0, 30.0, -20.0));

        monitor.deactivate(base + Duration::from_secs(1));

        let display = monitor.display();
        assert!(!monitor.is_active());
        assert_eq!(display.accelerometer_data, STOPPED);
        assert_eq!(display.gyroscope_data, STOPPED);
        assert_eq!(display.orientation_data, STOPPED);
        assert_eq!(display.shake_data, WAITING);
        assert_eq!(display.acceleration_ball, IndicatorOffset::centered());
        assert_eq!(display.tilt_ball, IndicatorOffset::centered());
        assert_eq!(display.needle_angle, 0.0);
        assert_eq!(display.summary_status, "Stopped");
        assert!(display.start_enabled);
        assert!(!display.stop_enabled);
    }

    #[test]
    fn calibrate_while_inactive_shows_guidance_and_keeps_offset() {
        let mut monitor = monitor();
        let base = Instant::now();

        monitor.calibrate(base);

        assert_eq!(monitor.calibration_offset(), 0.0);
        assert_eq!(monitor.notifier().last_message(), Some("Start the sensors first"));
        assert!(monitor.display().calibrate_enabled);
    }

    #[test]
    fn calibrate_while_active_sets_offset_and_runs_the_delay() {
        let mut monitor = monitor();
        let base = Instant::now();
        monitor.activate(None, base);

        monitor.calibrate(base);

        let offset = monitor.calibration_offset();
        assert!((0.0..360.0).contains(&offset));
        assert!(!monitor.display().calibrate_enabled);
        assert_eq!(
            monitor.notifier().last_message(),
            Some("Compass calibrated. North set.")
        );

        // Re-triggering mid-calibration is ignored.
        monitor.calibrate(base + Duration::from_millis(100));
        assert_eq!(monitor.calibration_offset(), offset);

        monitor.tick(base + Duration::from_millis(1500));
        assert!(monitor.display().calibrate_enabled);
        assert_eq!(monitor.notifier().last_message(), Some("Calibration complete"));
    }

    #[test]
    fn calibration_offset_feeds_the_needle() {
        let mut monitor = monitor();
        let base = Instant::now();
        monitor.activate(None, base);
        monitor.calibrate(base);
        let offset = monitor.calibration_offset();

        monitor.handle_orientation(&OrientationSample::new(45.0, 0.0, 0.0));
        let expected = (360.0 - 45.0 + offset).rem_euclid(360.0);
        assert!((monitor.display().needle_angle - expected).abs() < 1e-9);
    }

    #[test]
    fn zero_lux_is_a_valid_darkest_reading() {
        let mut monitor = monitor();
        monitor.handle_light(&LightSample::new(0.0));

        let panel = monitor.display().light_panel.expect("panel set");
        assert_eq!(panel.level, LightLevel::VeryDark);
        assert_eq!(monitor.display().light_data, "0 lux");
    }

    #[test]
    fn light_error_is_rendered_but_not_fatal() {
        let mut monitor = monitor();
        let base = Instant::now();
        monitor.activate(Some("AmbientLightSensor start failed".to_string()), base);

        assert!(monitor.is_active());
        assert_eq!(monitor.display().light_status.text, "Error");
        assert_eq!(
            monitor.display().light_data,
            "Error: AmbientLightSensor start failed"
        );
    }

    // === Runtime tests ===

    #[derive(Default)]
    struct FakeState {
        motion: Vec<mpsc::Sender<MotionSample>>,
        orientation: Vec<mpsc::Sender<OrientationSample>>,
        light: Vec<mpsc::Sender<LightReading>>,
    }

    #[derive(Clone)]
    struct FakeBackend {
        caps: Capabilities,
        permission: Option<PermissionDecision>,
        light_fails: bool,
        state: Arc<Mutex<FakeState>>,
    }

    impl FakeBackend {
        fn new(caps: Capabilities) -> Self {
            Self {
                caps,
                permission: None,
                light_fails: false,
                state: Arc::new(Mutex::new(FakeState::default())),
            }
        }
    }

    impl DeviceBackend for FakeBackend {
        fn capabilities(&self) -> Capabilities {
            self.caps
        }

        fn request_permission(&mut self) -> Option<oneshot::Receiver<PermissionDecision>> {
            let decision = self.permission?;
            let (tx, rx) = oneshot::channel();
            tx.send(decision).ok();
            Some(rx)
        }

        fn subscribe_motion(&mut self) -> Result<Subscription<MotionSample>, SensorError> {
            let (tx, rx) = mpsc::channel(8);
            self.state.lock().unwrap().motion.push(tx);
            Ok(Subscription::new(rx, None))
        }

        fn subscribe_orientation(
            &mut self,
        ) -> Result<Subscription<OrientationSample>, SensorError> {
            let (tx, rx) = mpsc::channel(8);
            self.state.lock().unwrap().orientation.push(tx);
            Ok(Subscription::new(rx, None))
        }

        fn subscribe_light(&mut self) -> Result<Subscription<LightReading>, SensorError> {
            if self.light_fails {
                return Err(SensorError::Runtime("light sensor start failed".into()));
            }
            let (tx, rx) = mpsc::channel(8);
            self.state.lock().unwrap().light.push(tx);
            Ok(Subscription::new(rx, None))
        }
    }

    #[tokio::test]
    async fn double_start_creates_one_subscription_set() {
        let backend = FakeBackend::new(full_caps());
        let state = backend.state.clone();
        let mut runtime = MonitorRuntime::new(backend, monitor());

        runtime.start(Instant::now()).await;
        runtime.start(Instant::now()).await;

        let state = state.lock().unwrap();
        assert_eq!(state.motion.len(), 1);
        assert_eq!(state.orientation.len(), 1);
        assert_eq!(state.light.len(), 1);
        assert!(runtime.monitor().is_active());
        assert!(!runtime.monitor().display().start_enabled);
    }

    #[tokio::test]
    async fn denied_permission_keeps_the_monitor_inactive() {
        let mut backend = FakeBackend::new(full_caps());
        backend.permission = Some(PermissionDecision::Denied);
        let state = backend.state.clone();
        let mut runtime = MonitorRuntime::new(backend, monitor());

        runtime.start(Instant::now()).await;

        assert!(!runtime.monitor().is_active());
        assert!(runtime.monitor().display().alert.is_some());
        assert!(state.lock().unwrap().motion.is_empty());
    }

    #[tokio::test]
    async fn granted_permission_activates() {
        let mut backend = FakeBackend::new(full_caps());
        backend.permission = Some(PermissionDecision::Granted);
        let mut runtime = MonitorRuntime::new(backend, monitor());

        runtime.start(Instant::now()).await;

        assert!(runtime.monitor().is_active());
        assert!(runtime.monitor().display().alert.is_none());
    }

    #[tokio::test]
    async fn stop_drops_every_subscription() {
        let backend = FakeBackend::new(full_caps());
        let state = backend.state.clone();
        let mut runtime = MonitorRuntime::new(backend, monitor());

        runtime.start(Instant::now()).await;
        runtime.stop(Instant::now());

        let state = state.lock().unwrap();
        assert!(state.motion[0].is_closed());
        assert!(state.orientation[0].is_closed());
        assert!(state.light[0].is_closed());
        assert!(!runtime.monitor().is_active());
    }

    #[tokio::test]
    async fn light_failure_does_not_abort_activation() {
        let mut backend = FakeBackend::new(full_caps());
        backend.light_fails = true;
        let state = backend.state.clone();
        let mut runtime = MonitorRuntime::new(backend, monitor());

        runtime.start(Instant::now()).await;

        assert!(runtime.monitor().is_active());
        assert_eq!(state.lock().unwrap().motion.len(), 1);
        assert_eq!(runtime.monitor().display().light_status.text, "Error");
        assert!(runtime
            .monitor()
            .display()
            .light_data
            .contains("light sensor start failed"));
    }

    #[tokio::test]
    async fn run_loop_routes_samples_into_the_display() {
        let backend = FakeBackend::new(full_caps());
        let state = backend.state.clone();
        let runtime = MonitorRuntime::new(backend, monitor());

        let (tx, rx) = mpsc::channel(8);
        let handle = tokio::spawn(runtime.run(rx, Duration::from_millis(10), |_| {}));

        tx.send(Command::Start).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let motion_tx = state.lock().unwrap().motion[0].clone();
        motion_tx
            .send(MotionSample::new(1.0, 2.0, 3.0))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        tx.send(Command::Quit).await.unwrap();
        let runtime = handle.await.unwrap();

        assert_eq!(
            runtime.monitor().display().accelerometer_data,
            "X: 1.00 | Y: 2.00 | Z: 3.00"
        );
    }
}
