//! Simulated device backend: deterministic waveform sensors for the demo
//! dashboard. Each subscription runs its own tokio task seeded from the
//! device seed, so identical seeds replay identical sessions.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, oneshot};
use tokio::time;

use crate::samples::{LightSample, MotionSample, OrientationSample};

use super::{
    Capabilities, DeviceBackend, LightReading, PermissionDecision, SensorError, Subscription,
};

/// ~20 Hz, in the ballpark of real devicemotion delivery.
const SAMPLE_INTERVAL: Duration = Duration::from_millis(50);
const CHANNEL_DEPTH: usize = 32;
/// A shake burst is injected roughly this often (in ticks).
const BURST_EVERY: std::ops::Range<u32> = 160..240;
const BURST_TICKS: u32 = 3;
/// How long the simulated consent prompt takes to answer.
const PROMPT_DELAY: Duration = Duration::from_millis(200);

/// A phone-shaped fake: accelerometer, orientation, and an ambient light
/// sensor riding a day/night curve, with a periodic shake burst thrown in.
#[derive(Debug)]
pub struct SimulatedDevice {
    seed: u64,
    permission: Option<PermissionDecision>,
}

impl SimulatedDevice {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            permission: None,
        }
    }

    /// Simulate a consent-gated platform that answers the prompt with
    /// `decision` after a short delay.
    pub fn with_permission_prompt(mut self, decision: PermissionDecision) -> Self {
        self.permission = Some(decision);
        self
    }
}

impl DeviceBackend for SimulatedDevice {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            motion: true,
            orientation: true,
            ambient_light: true,
            magnetometer: true,
            ..Capabilities::default()
        }
    }

    fn request_permission(&mut self) -> Option<oneshot::Receiver<PermissionDecision>> {
        let decision = self.permission?;
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            time::sleep(PROMPT_DELAY).await;
            let _ = tx.send(decision);
        });
        Some(rx)
    }

    fn subscribe_motion(&mut self) -> Result<Subscription<MotionSample>, SensorError> {
        let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
        let mut rng = StdRng::seed_from_u64(self.seed);
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(SAMPLE_INTERVAL);
            let mut tick: u32 = 0;
            let mut next_burst = rng.gen_range(BURST_EVERY);
            let mut burst_left = 0u32;
            loop {
                ticker.tick().await;
                let t = f64::from(tick) * SAMPLE_INTERVAL.as_secs_f64();

                let mut sample = MotionSample::new(
                    2.0 * (t * 0.8).sin() + rng.gen_range(-0.3..0.3),
                    2.0 * (t * 0.6).cos() + rng.gen_range(-0.3..0.3),
                    9.81 + rng.gen_range(-0.2..0.2),
                );

                if tick >= next_burst && burst_left == 0 {
                    burst_left = BURST_TICKS;
                    next_burst = tick + rng.gen_range(BURST_EVERY);
                }
                if burst_left > 0 {
                    burst_left -= 1;
                    let spike = rng.gen_range(18.0..26.0);
                    sample.x = spike * if tick % 2 == 0 { 1.0 } else { -1.0 };
                }

                if tx.send(sample).await.is_err() {
                    break;
                }
                tick += 1;
            }
        });
        Ok(Subscription::new(rx, Some(task)))
    }

    fn subscribe_orientation(&mut self) -> Result<Subscription<OrientationSample>, SensorError> {
        let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(1));
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(SAMPLE_INTERVAL);
            let mut tick: u32 = 0;
            loop {
                ticker.tick().await;
                let t = f64::from(tick) * SAMPLE_INTERVAL.as_secs_f64();

                let sample = OrientationSample::new(
                    (t * 12.0).rem_euclid(360.0),
                    25.0 * (t * 0.5).sin() + rng.gen_range(-1.0..1.0),
                    35.0 * (t * 0.3).cos() + rng.gen_range(-1.0..1.0),
                );

                if tx.send(sample).await.is_err() {
                    break;
                }
                tick += 1;
            }
        });
        Ok(Subscription::new(rx, Some(task)))
    }

    fn subscribe_light(&mut self) -> Result<Subscription<LightReading>, SensorError> {
        let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(2));
        let task = tokio::spawn(async move {
            let mut ticker = time::interval(SAMPLE_INTERVAL * 4);
            let mut tick: u32 = 0;
            loop {
                ticker.tick().await;
                let t = f64::from(tick) * SAMPLE_INTERVAL.as_secs_f64() * 4.0;

                // Sweep a day/night curve across all six brightness tiers.
                let lux = 10f64.powf(2.0 + 2.2 * (t / 30.0).sin()) * rng.gen_range(0.9..1.1);
                let reading = LightReading::Sample(LightSample::new(lux));

                if tx.send(reading).await.is_err() {
                    break;
                }
                tick += 1;
            }
        });
        Ok(Subscription::new(rx, Some(task)))
    }
}
