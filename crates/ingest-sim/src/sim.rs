use std::f64::consts::TAU;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use model::MotionSample;
use motion_ingest_core::{MotionSource, SampleFeed, SourceError};
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

/// Synthetic accelerometer: gravity on z plus a slow sway on x/y.
#[derive(Clone, Debug)]
pub struct SimConfig {
    /// Sampling rate in Hz.
    pub rate_hz: f64,
    /// Peak sway acceleration in m/s^2.
    pub amplitude: f64,
    /// Sway frequency in Hz.
    pub sway_hz: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            rate_hz: 50.0,
            amplitude: 0.6,
            sway_hz: 1.2,
        }
    }
}

pub struct SimSource {
    cfg: SimConfig,
}

impl SimSource {
    pub fn new(cfg: SimConfig) -> Self {
        Self { cfg }
    }

    pub fn rate_hz(&self) -> f64 {
        self.cfg.rate_hz
    }
}

#[async_trait]
impl MotionSource for SimSource {
    async fn open(&self) -> Result<(), SourceError> {
        if !(self.cfg.rate_hz.is_finite() && self.cfg.rate_hz > 0.0) {
            return Err(SourceError::Unavailable(format!(
                "bad sample rate {}",
                self.cfg.rate_hz
            )));
        }
        Ok(())
    }

    async fn run(
        &self,
        feed: SampleFeed,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), SourceError> {
        let period = Duration::from_secs_f64(1.0 / self.cfg.rate_hz);
        let mut ticks = time::interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut n: u64 = 0;
        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    let t_s = n as f64 * period.as_secs_f64();
                    let phase = TAU * self.cfg.sway_hz * t_s;
                    feed.push(MotionSample::new(
                        t_s,
                        self.cfg.amplitude * phase.sin(),
                        self.cfg.amplitude * phase.cos(),
                        9.81 + 0.05 * (2.0 * phase).sin(),
                    ));
                    n += 1;
                }
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        debug!("sim source stopping after {n} samples");
                        return Ok(());
                    }
                }
            }
        }
    }
}
