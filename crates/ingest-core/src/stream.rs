use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use model::MotionSample;
use parking_lot::Mutex;

use crate::error::SourceError;
use crate::queue::SampleQueue;

struct StreamShared {
    queue: SampleQueue,
    closed: AtomicBool,
    fault: Mutex<Option<SourceError>>,
}

impl StreamShared {
    fn shut(&self) {
        self.closed.store(true, Ordering::SeqCst);
        self.queue.wake_all();
    }
}

/// Producer half of a capture session: pushes samples into the queue and
/// reports terminal events. Cloneable so a supervisor can keep one alongside
/// the source task.
#[derive(Clone)]
pub struct SampleFeed {
    shared: Arc<StreamShared>,
}

impl SampleFeed {
    pub fn push(&self, sample: MotionSample) {
        self.shared.queue.push(sample);
    }

    /// Marks the feed finished. Samples already queued stay readable; the
    /// stream yields `Ok(None)` once they are drained.
    pub fn close(&self) {
        self.shared.shut();
    }

    /// Records a mid-stream fault and closes the feed. The first error wins.
    pub fn fail(&self, err: SourceError) {
        {
            let mut fault = self.shared.fault.lock();
            if fault.is_none() {
                *fault = Some(err);
            }
        }
        self.shared.shut();
    }

    /// Samples pushed but not yet consumed.
    pub fn queued(&self) -> usize {
        self.shared.queue.len()
    }
}

/// Cancels the paired stream from any thread, including while a `next` call
/// is blocked.
#[derive(Clone)]
pub struct CancelHandle {
    shared: Arc<StreamShared>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.shared.shut();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StreamPhase {
    Ready,
    Streaming,
    Cancelled,
    Errored,
}

/// Single-consumer pull side of a capture session. `next` blocks while the
/// queue is empty; cancellation or a source fault unblocks it promptly.
/// Exclusive consumption is enforced by `&mut self` and the stream is not
/// cloneable.
pub struct SampleStream {
    shared: Arc<StreamShared>,
    phase: StreamPhase,
}

impl SampleStream {
    /// Returns the next sample, `Ok(None)` after cancellation, or the source
    /// fault once. Samples queued before the feed closed are still drained.
    pub fn next(&mut self) -> Result<Option<MotionSample>, SourceError> {
        match self.phase {
            StreamPhase::Cancelled | StreamPhase::Errored => return Ok(None),
            StreamPhase::Ready => self.phase = StreamPhase::Streaming,
            StreamPhase::Streaming => {}
        }
        let shared = &self.shared;
        match shared
            .queue
            .pop_wait_while(|| !shared.closed.load(Ordering::SeqCst))
        {
            Some(s) => Ok(Some(s)),
            None => {
                if let Some(err) = shared.fault.lock().take() {
                    self.phase = StreamPhase::Errored;
                    return Err(err);
                }
                self.phase = StreamPhase::Cancelled;
                Ok(None)
            }
        }
    }

    /// Sets the cancellation flag; any later `next` returns `Ok(None)` once
    /// queued samples are drained.
    pub fn cancel(&self) {
        self.shared.shut();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Builds the producer/consumer pair for one capture session.
pub fn stream_pair(rate_hz: f64) -> (SampleFeed, SampleStream) {
    let shared = Arc::new(StreamShared {
        queue: SampleQueue::with_rate_hint(rate_hz),
        closed: AtomicBool::new(false),
        fault: Mutex::new(None),
    });
    (
        SampleFeed {
            shared: Arc::clone(&shared),
        },
        SampleStream {
            shared,
            phase: StreamPhase::Ready,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    fn sample(t_s: f64) -> MotionSample {
        MotionSample::new(t_s, 0.0, 0.0, 9.81)
    }

    #[test]
    fn test_push_wakes_blocked_consumer() {
        let (feed, mut stream) = stream_pair(50.0);
        let consumer = thread::spawn(move || stream.next());
        thread::sleep(Duration::from_millis(30));
        feed.push(sample(2.5));
        let got = consumer.join().unwrap().unwrap();
        assert_eq!(got.unwrap().t_s, 2.5);
    }

    #[test]
    fn test_cancel_unblocks_waiting_next() {
        let (_feed, mut stream) = stream_pair(50.0);
        let cancel = stream.cancel_handle();
        let consumer = thread::spawn(move || {
            let started = Instant::now();
            (stream.next(), started.elapsed())
        });
        thread::sleep(Duration::from_millis(30));
        cancel.cancel();
        let (got, waited) = consumer.join().unwrap();
        assert!(matches!(got, Ok(None)));
        assert!(waited < Duration::from_secs(2));
    }

    #[test]
    fn test_queued_samples_drain_after_close() {
        let (feed, mut stream) = stream_pair(50.0);
        feed.push(sample(0.1));
        feed.push(sample(0.2));
        feed.push(sample(0.3));
        feed.close();
        assert_eq!(stream.next().unwrap().unwrap().t_s, 0.1);
        assert_eq!(stream.next().unwrap().unwrap().t_s, 0.2);
        assert_eq!(stream.next().unwrap().unwrap().t_s, 0.3);
        assert!(matches!(stream.next(), Ok(None)));
        assert!(matches!(stream.next(), Ok(None)));
    }

    #[test]
    fn test_cancel_drains_then_yields_none() {
        let (feed, mut stream) = stream_pair(50.0);
        feed.push(sample(0.1));
        stream.cancel();
        assert_eq!(stream.next().unwrap().unwrap().t_s, 0.1);
        assert!(matches!(stream.next(), Ok(None)));
    }

    #[test]
    fn test_fault_surfaces_once_after_drain() {
        let (feed, mut stream) = stream_pair(50.0);
        feed.push(sample(0.1));
        feed.fail(SourceError::Failed("sensor gone".into()));
        assert_eq!(stream.next().unwrap().unwrap().t_s, 0.1);
        assert!(matches!(stream.next(), Err(SourceError::Failed(_))));
        assert!(matches!(stream.next(), Ok(None)));
    }

    #[test]
    fn test_first_fault_wins() {
        let (feed, mut stream) = stream_pair(50.0);
        feed.fail(SourceError::Failed("first".into()));
        feed.fail(SourceError::Failed("second".into()));
        match stream.next() {
            Err(SourceError::Failed(msg)) => assert_eq!(msg, "first"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
