use std::sync::Arc;

use log::{debug, error, info};
use model::{EndReason, SessionState};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{SessionError, SourceError};
use crate::source::MotionSource;
use crate::stream::{stream_pair, CancelHandle, SampleFeed, SampleStream};

/// Owns one source/queue/stream triple per capture session and guards the
/// Idle -> Running -> Cancelled lifecycle.
pub struct SessionController {
    source: Arc<dyn MotionSource>,
    rate_hz: f64,
    state: SessionState,
    active: Option<ActiveSession>,
}

struct ActiveSession {
    feed: SampleFeed,
    cancel: CancelHandle,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SessionController {
    pub fn new(source: Arc<dyn MotionSource>, rate_hz: f64) -> Self {
        Self {
            source,
            rate_hz,
            state: SessionState::Idle,
            active: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Idle -> Running. Probes the source, spawns its run task and hands the
    /// consuming stream back. Unavailability surfaces here and leaves the
    /// controller Idle.
    pub async fn begin(&mut self) -> Result<SampleStream, SessionError> {
        match self.state {
            SessionState::Running => return Err(SessionError::AlreadyRunning),
            SessionState::Cancelled => return Err(SessionError::NotReset),
            SessionState::Idle => {}
        }
        self.source.open().await?;

        let (feed, stream) = stream_pair(self.rate_hz);
        let cancel = stream.cancel_handle();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let source = Arc::clone(&self.source);
        let task_feed = feed.clone();
        let task = tokio::spawn(async move {
            match source.run(task_feed.clone(), shutdown_rx).await {
                Ok(()) => task_feed.close(),
                Err(err) => {
                    error!("motion source failed mid-stream: {err}");
                    task_feed.fail(err);
                }
            }
        });

        info!("capture session started at {} Hz", self.rate_hz);
        self.state = SessionState::Running;
        self.active = Some(ActiveSession {
            feed,
            cancel,
            shutdown: shutdown_tx,
            task,
        });
        Ok(stream)
    }

    /// Running -> Cancelled. Stops the source, waits for it to wind down and
    /// propagates `reason` into the stream. `Err(NotRunning)` when there is
    /// nothing to stop; the controller state is untouched in that case.
    pub async fn end(&mut self, reason: EndReason) -> Result<(), SessionError> {
        let Some(active) = self.active.take() else {
            return Err(SessionError::NotRunning);
        };
        let _ = active.shutdown.send(true);
        if active.task.await.is_err() {
            error!("motion source task panicked during shutdown");
        }
        debug!("{} samples queued at shutdown", active.feed.queued());
        match reason {
            EndReason::Stopped => active.cancel.cancel(),
            EndReason::Errored => {
                active
                    .feed
                    .fail(SourceError::Failed("session ended after error".into()));
            }
        }
        self.state = SessionState::Cancelled;
        info!("capture session ended: {reason:?}");
        Ok(())
    }

    /// Cancelled -> Idle. Discards the finished session's resources so a
    /// fresh `begin` is legal again.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Cancelled => {
                self.active = None;
                self.state = SessionState::Idle;
                Ok(())
            }
            SessionState::Running => Err(SessionError::AlreadyRunning),
            SessionState::Idle => Err(SessionError::NotRunning),
        }
    }
}
