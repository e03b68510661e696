use std::collections::VecDeque;

use model::MotionSample;
use parking_lot::{Condvar, Mutex};

/// FIFO buffer between the source task and the consuming stream.
///
/// `push` never fails and never blocks; the queue grows past its hint if the
/// consumer stalls. Blocking consumption is layered in `SampleStream`, not
/// here, so the queue stays testable in isolation.
pub struct SampleQueue {
    inner: Mutex<VecDeque<MotionSample>>,
    available: Condvar,
}

impl SampleQueue {
    /// Pre-allocates room for two seconds of samples at `rate_hz`, doubled.
    pub fn with_rate_hint(rate_hz: f64) -> Self {
        let hint = (rate_hz * 2.0).ceil() as usize * 2;
        Self {
            inner: Mutex::new(VecDeque::with_capacity(hint.max(16))),
            available: Condvar::new(),
        }
    }

    pub fn push(&self, sample: MotionSample) {
        let mut q = self.inner.lock();
        q.push_back(sample);
        self.available.notify_one();
    }

    pub fn try_pop(&self) -> Option<MotionSample> {
        self.inner.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Blocks until a sample arrives or `keep_waiting` turns false. Queued
    /// samples are returned before the predicate is consulted.
    pub fn pop_wait_while<F: Fn() -> bool>(&self, keep_waiting: F) -> Option<MotionSample> {
        let mut q = self.inner.lock();
        loop {
            if let Some(s) = q.pop_front() {
                return Some(s);
            }
            if !keep_waiting() {
                return None;
            }
            self.available.wait(&mut q);
        }
    }

    /// Wakes every blocked `pop_wait_while` caller. Takes the queue lock
    /// first so a waiter between its predicate check and `wait` cannot miss
    /// the notification.
    pub fn wake_all(&self) {
        drop(self.inner.lock());
        self.available.notify_all();
    }
}
