use thiserror::Error;

/// Errors surfaced by a motion source or the stream reading from it.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The sensor is missing or access was denied. Reported when a session
    /// begins, never once streaming has started.
    #[error("motion source unavailable: {0}")]
    Unavailable(String),

    /// The sensor reported a fault after sampling began.
    #[error("motion source failed: {0}")]
    Failed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors from the session lifecycle.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a capture session is already running")]
    AlreadyRunning,

    #[error("no capture session is running")]
    NotRunning,

    #[error("session has ended; reset before starting again")]
    NotReset,

    #[error(transparent)]
    Source(#[from] SourceError),
}
