// Session layer: the shared device lifecycle plus the capture and
// playback sessions built on it.

mod device;

pub mod capture;
pub mod playback;

pub use capture::CaptureSession;
pub use playback::PlaybackSession;

pub(crate) use device::DeviceSession;
