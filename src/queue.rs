// FIFO hand-off of sample frames between one producer and one consumer.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::queue::ArrayQueue;

use crate::frame::SampleFrame;
use crate::types::DEFAULT_QUEUE_CAPACITY;

/// Bounded lock-free FIFO of sample frames.
///
/// `push` and `pop` never block and are safe to call from the real-time
/// callbacks. When the queue is full, the oldest frame is displaced so the
/// stream stays close to real time; the displaced frame is handed back to
/// the caller for buffer recycling and counted in `dropped_frames`. An
/// empty `pop` is a normal "no data" result, never an error.
#[derive(Debug)]
pub struct SampleQueue {
    inner: ArrayQueue<SampleFrame>,
    dropped: AtomicU64,
}

impl SampleQueue {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: ArrayQueue::new(capacity.max(1)),
            dropped: AtomicU64::new(0),
        }
    }

    /// Appends `frame`, displacing and returning the oldest queued frame
    /// when the queue is at capacity.
    pub fn push(&self, frame: SampleFrame) -> Option<SampleFrame> {
        let displaced = self.inner.force_push(frame);
        if displaced.is_some() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        displaced
    }

    /// Removes and returns the oldest queued frame. Never waits.
    pub fn pop(&self) -> Option<SampleFrame> {
        self.inner.pop()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Frames displaced because the consumer fell behind the bound.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl Default for SampleQueue {
    fn default() -> Self {
        Self::new()
    }
}
