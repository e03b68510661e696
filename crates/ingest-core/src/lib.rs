//! Core capture pipeline: sample queue, cancellable stream, source seam and
//! session lifecycle.

mod error;
mod queue;
mod session;
mod source;
mod stream;

pub use error::{SessionError, SourceError};
pub use queue::SampleQueue;
pub use session::SessionController;
pub use source::MotionSource;
pub use stream::{stream_pair, CancelHandle, SampleFeed, SampleStream};
