use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use model::MotionSample;
use motion_ingest_core::{MotionSource, SampleFeed, SourceError};
use tokio::sync::watch;
use tokio::time;

/// Re-feeds a recorded batch, then idles until the session is stopped.
pub struct ReplaySource {
    samples: Vec<MotionSample>,
    paced: bool,
}

impl ReplaySource {
    pub fn new(samples: Vec<MotionSample>) -> Self {
        Self {
            samples,
            paced: false,
        }
    }

    /// Sleep out the recorded timestamp gaps instead of pushing flat-out.
    pub fn paced(mut self) -> Self {
        self.paced = true;
        self
    }
}

#[async_trait]
impl MotionSource for ReplaySource {
    async fn open(&self) -> Result<(), SourceError> {
        if self.samples.is_empty() {
            return Err(SourceError::Unavailable("replay batch is empty".into()));
        }
        Ok(())
    }

    async fn run(
        &self,
        feed: SampleFeed,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), SourceError> {
        let mut last_t = self.samples[0].t_s;
        for s in &self.samples {
            if *shutdown.borrow() {
                return Ok(());
            }
            if self.paced {
                let gap = (s.t_s - last_t).max(0.0);
                if gap > 0.0 {
                    tokio::select! {
                        _ = time::sleep(Duration::from_secs_f64(gap)) => {}
                        res = shutdown.changed() => {
                            if res.is_err() || *shutdown.borrow() {
                                return Ok(());
                            }
                        }
                    }
                }
                last_t = s.t_s;
            }
            feed.push(*s);
        }
        debug!("replay delivered {} samples", self.samples.len());
        // batch delivered; hold the feed open until the session stops
        while shutdown.changed().await.is_ok() {
            if *shutdown.borrow() {
                break;
            }
        }
        Ok(())
    }
}
