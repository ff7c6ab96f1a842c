// Capture session: drives a capture-direction device and hands captured
// periods to a consumer through a lock-free queue.

use std::sync::Arc;

use crate::audio_debug;
#[cfg(feature = "backend-cpal")]
use crate::backend::CpalBackend;
use crate::backend::{AudioBackend, IoCallback};
use crate::error::Result;
use crate::frame::{FramePool, SampleFrame};
use crate::queue::SampleQueue;
use crate::session::DeviceSession;
use crate::types::{AtomicF32, DeviceRole, SessionConfig, DEFAULT_QUEUE_CAPACITY};

/// Buffers recycled beyond the queue bound; enough to keep the capture
/// callback allocation-free once the consumer recycles what it dequeues.
const POOL_CAPACITY: usize = 32;

/// State shared between the control surface and the capture callback.
struct CaptureShared {
    queue: SampleQueue,
    pool: FramePool,
    gain: AtomicF32,
}

/// One capture-direction device plus the queue its callback feeds.
///
/// The hardware callback copies each captured period into an owned frame
/// (scaled by the capture gain) and appends it to the queue; consumers
/// poll `dequeue_frame` from any thread.
pub struct CaptureSession {
    session: DeviceSession,
    shared: Arc<CaptureShared>,
}

impl CaptureSession {
    /// Opens the system default capture device through cpal.
    #[cfg(feature = "backend-cpal")]
    pub fn new(config: SessionConfig) -> Result<Self> {
        Self::with_backend(config, Arc::new(CpalBackend::new()))
    }

    /// Opens the system default capture device on `backend`.
    pub fn with_backend(config: SessionConfig, backend: Arc<dyn AudioBackend>) -> Result<Self> {
        config.validate()?;
        let shared = Arc::new(CaptureShared {
            queue: SampleQueue::with_capacity(DEFAULT_QUEUE_CAPACITY),
            pool: FramePool::new(config.samples_per_period(), POOL_CAPACITY),
            gain: AtomicF32::new(config.master_gain),
        });
        let mut session = DeviceSession::new(config, DeviceRole::Capture, backend);
        let callback_shared = shared.clone();
        session.initialize(None, move || capture_callback(callback_shared))?;
        Ok(Self { session, shared })
    }

    /// Capture device names from a fresh enumeration.
    pub fn list_devices(&mut self) -> Result<Vec<String>> {
        self.session.list_devices()
    }

    /// Switches to the named capture device, or back to the system default
    /// for `None`. A running session resumes on the new device; frames
    /// already queued stay available to the consumer.
    pub fn select_device(&mut self, name: Option<&str>) -> Result<()> {
        let shared = self.shared.clone();
        self.session.initialize(name, move || capture_callback(shared))
    }

    pub fn current_device_name(&self) -> Result<String> {
        self.session.current_device_name()
    }

    pub fn start(&mut self) -> Result<()> {
        self.session.start()
    }

    pub fn stop(&mut self) {
        self.session.stop()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_running()
    }

    pub fn config(&self) -> &SessionConfig {
        self.session.config()
    }

    /// Software gain applied to the captured stream as it is copied out of
    /// the hardware buffer. Distinct from a voice source's gain, which
    /// scales a sent stream.
    pub fn set_gain(&self, gain: f32) {
        self.shared.gain.store(gain);
    }

    pub fn gain(&self) -> f32 {
        self.shared.gain.load()
    }

    /// Removes and returns the oldest captured frame, or `None` when no
    /// period has arrived yet. Never waits; poll with a sleep between
    /// attempts, not in a tight loop.
    pub fn dequeue_frame(&self) -> Option<SampleFrame> {
        self.shared.queue.pop()
    }

    /// Returns a consumed frame's buffer to the capture pool so the
    /// callback can reuse it instead of allocating.
    pub fn recycle_frame(&self, frame: SampleFrame) {
        self.shared.pool.release(frame.into_samples());
    }

    pub fn queued_frames(&self) -> usize {
        self.shared.queue.len()
    }

    /// Periods discarded because the consumer fell behind the queue bound.
    pub fn dropped_frames(&self) -> u64 {
        self.shared.queue.dropped_frames()
    }
}

fn capture_callback(shared: Arc<CaptureShared>) -> IoCallback {
    IoCallback::Capture(Box::new(move |input: &[f32]| {
        // The backend reports "no valid input" as an empty period.
        if input.is_empty() {
            return;
        }
        let gain = shared.gain.load();
        let mut buffer = shared.pool.acquire();
        let copied = input.len().min(buffer.len());
        if gain == 1.0 {
            buffer[..copied].copy_from_slice(&input[..copied]);
        } else {
            for (dst, src) in buffer[..copied].iter_mut().zip(&input[..copied]) {
                *dst = src * gain;
            }
        }
        // A short period is padded out with silence.
        buffer[copied..].fill(0.0);

        if let Some(displaced) = shared.queue.push(SampleFrame::from_samples(buffer)) {
            audio_debug!("capture queue full, dropped oldest period");
            shared.pool.release(displaced.into_samples());
        }
    }))
}
