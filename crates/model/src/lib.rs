use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// One timestamped 3-axis motion reading.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq)]
pub struct MotionSample {
    /// Seconds since the capture epoch chosen by the source.
    pub t_s: f64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MotionSample {
    pub fn new(t_s: f64, x: f64, y: f64, z: f64) -> Self {
        Self { t_s, x, y, z }
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }
}

/// Lifecycle of one capture session. There is no Running -> Idle edge;
/// a finished session must be reset before a new one can begin.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Cancelled,
}

/// Why a running session ended.
#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum EndReason {
    Stopped,
    Errored,
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct SessionMeta {
    #[serde(with = "uuid::serde::simple")]
    pub id: Uuid,
    /// Prefix prepended to every CSV record of this session.
    pub tag: String,
    pub rate_hz: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
}

impl SessionMeta {
    pub fn new(tag: impl Into<String>, rate_hz: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            tag: tag.into(),
            rate_hz,
            started_at: OffsetDateTime::now_utc(),
        }
    }
}
