// voicelink - real-time voice capture, mixing and playback
//
// The pipeline in one line: hardware input -> capture callback -> capture
// queue -> consumer thread -> voice source (gain applied) -> source queue
// -> mix callback -> hardware output.
//
// Components:
// - types: session configuration and core value types
// - error: the error taxonomy shared by every public surface
// - frame / queue / source: the sample pipeline (owned frames, lock-free
//   FIFO hand-off, per-participant sources)
// - backend: the hardware boundary (cpal in production, mock for tests)
// - session: capture and playback sessions over the shared device lifecycle

pub mod backend;
pub mod error;
pub mod frame;
pub mod log;
pub mod queue;
pub mod session;
pub mod source;
pub mod types;

// Re-export commonly used types for easier imports
pub use backend::{
    AudioBackend, BackendDevice, BackendError, DeviceDescriptor, DeviceId, IoCallback,
    MockBackend, MockDeviceDriver, OpenRequest,
};
pub use error::{Result, VoiceError};
pub use frame::{FramePool, SampleFrame};
pub use queue::SampleQueue;
pub use session::{CaptureSession, PlaybackSession};
pub use source::VoiceSource;
pub use types::{
    AtomicF32, DeviceRole, SessionConfig, BYTES_PER_SAMPLE, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_SAMPLE_RATE,
};

#[cfg(feature = "backend-cpal")]
pub use backend::CpalBackend;
