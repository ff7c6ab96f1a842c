// One participant's outbound audio stream: a gain factor applied at
// enqueue time plus a FIFO of already-scaled frames.

use crate::frame::SampleFrame;
use crate::queue::SampleQueue;
use crate::types::{AtomicF32, DEFAULT_QUEUE_CAPACITY};

/// One participant's voice stream inside a playback session.
///
/// Sources are normally created through `PlaybackSession::add_source`; the
/// constructors are public so the queueing behavior can be exercised on
/// its own.
#[derive(Debug)]
pub struct VoiceSource {
    id: u32,
    gain: AtomicF32,
    queue: SampleQueue,
}

impl VoiceSource {
    /// A source with gain 1.0 and the default queue bound.
    pub fn new(id: u32) -> Self {
        Self::with_queue_capacity(id, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_queue_capacity(id: u32, queue_capacity: usize) -> Self {
        Self {
            id,
            gain: AtomicF32::new(1.0),
            queue: SampleQueue::with_capacity(queue_capacity),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn gain(&self) -> f32 {
        self.gain.load()
    }

    /// Applies to frames enqueued after the call; frames already queued
    /// keep the scaling they were enqueued with.
    pub fn set_gain(&self, gain: f32) {
        self.gain.store(gain);
    }

    /// Scales `frame` by the current gain and appends it, displacing the
    /// oldest queued frame when the queue is at capacity. The frame is
    /// assumed to match the owning session's period size; a mismatch is a
    /// caller contract violation, not a recoverable error.
    pub fn enqueue(&self, mut frame: SampleFrame) -> Option<SampleFrame> {
        frame.scale(self.gain.load());
        self.queue.push(frame)
    }

    /// Removes and returns the oldest queued frame. Never waits; `None`
    /// means the source contributes silence this period.
    pub fn dequeue(&self) -> Option<SampleFrame> {
        self.queue.pop()
    }

    pub fn queued_frames(&self) -> usize {
        self.queue.len()
    }

    pub fn dropped_frames(&self) -> u64 {
        self.queue.dropped_frames()
    }
}
