use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::SourceError;
use crate::stream::SampleFeed;

/// Trait for any push-style sample producer: a hardware driver, a simulator
/// or a replay.
///
/// `run` owns the device for the lifetime of one session. It pushes into
/// `feed` until `shutdown` flips to true (or its sender is dropped) or the
/// device faults; device resources are released before `run` returns. The
/// adapter stays thin: translating device events into pushes is its only job.
#[async_trait]
pub trait MotionSource: Send + Sync {
    /// Probes the device. `Err(SourceError::Unavailable)` here is the only
    /// place absence or denied access is reported.
    async fn open(&self) -> Result<(), SourceError> {
        Ok(())
    }

    async fn run(
        &self,
        feed: SampleFeed,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), SourceError>;
}
