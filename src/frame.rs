// Sample frames and the recycled-buffer pool used by the real-time
// callbacks.

use crossbeam::queue::ArrayQueue;

/// One period of interleaved f32 samples.
///
/// A frame is filled once, optionally scaled in place when it enters a
/// voice source, and then moves by ownership: enqueue hands it to the
/// queue, dequeue hands it to the consumer. It is never aliased after
/// hand-off.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleFrame {
    samples: Vec<f32>,
}

impl SampleFrame {
    /// A silent frame of `len` samples.
    pub fn silent(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
        }
    }

    /// Wraps an interleaved sample buffer. The caller is responsible for
    /// matching the owning session's period size; frames are not
    /// re-validated on the audio path.
    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    /// Scales every sample in place.
    pub fn scale(&mut self, gain: f32) {
        if gain == 1.0 {
            return;
        }
        for sample in self.samples.iter_mut() {
            *sample *= gain;
        }
    }
}

/// Pool of recycled fixed-size sample buffers.
///
/// The capture and mix callbacks run on the backend's real-time threads;
/// recycling buffers through the pool keeps the steady state free of
/// allocator traffic. `acquire` falls back to a fresh allocation when the
/// pool is dry; `release` drops buffers that no longer match the period
/// size (stale frames from before a reconfiguration) or that exceed the
/// pool bound.
#[derive(Debug)]
pub struct FramePool {
    buffers: ArrayQueue<Vec<f32>>,
    frame_len: usize,
}

impl FramePool {
    /// A pool of `capacity` buffers of `frame_len` samples, fully
    /// preallocated.
    pub fn new(frame_len: usize, capacity: usize) -> Self {
        let buffers = ArrayQueue::new(capacity.max(1));
        for _ in 0..buffers.capacity() {
            let _ = buffers.push(vec![0.0; frame_len]);
        }
        Self { buffers, frame_len }
    }

    pub fn frame_len(&self) -> usize {
        self.frame_len
    }

    /// Pops a recycled buffer, or allocates a fresh one when the pool is
    /// dry. Contents are unspecified; callers overwrite the whole buffer.
    pub fn acquire(&self) -> Vec<f32> {
        self.buffers
            .pop()
            .unwrap_or_else(|| vec![0.0; self.frame_len])
    }

    /// Returns a buffer to the pool.
    pub fn release(&self, buffer: Vec<f32>) {
        if buffer.len() == self.frame_len {
            let _ = self.buffers.push(buffer);
        }
    }
}
