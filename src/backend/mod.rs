// Hardware backend boundary.
//
// Sessions talk to the audio hardware through these traits only. The
// production implementation is CpalBackend; MockBackend drives the same
// surface deterministically for tests and headless environments.

#[cfg(feature = "backend-cpal")]
pub mod cpal_backend;
pub mod mock;

#[cfg(feature = "backend-cpal")]
pub use cpal_backend::CpalBackend;
pub use mock::{MockBackend, MockDeviceDriver};

use crate::types::DeviceRole;

/// Error reported by a backend implementation. Carried as the source of
/// the matching `VoiceError` variant.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct BackendError {
    message: String,
}

impl BackendError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Opaque backend identifier for one device, valid until the next
/// enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceId(pub(crate) String);

/// A human-readable device name paired with its opaque backend id.
#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub name: String,
    pub id: DeviceId,
}

/// Periodic I/O callback installed on an open device.
///
/// The callback closes over the owning session's shared state; the backend
/// invokes it from its real-time thread once per period while the device
/// is running. Callbacks must never block.
pub enum IoCallback {
    /// Fill one period of interleaved output samples.
    Playback(Box<dyn FnMut(&mut [f32]) + Send>),
    /// Consume one period of interleaved input samples. An empty slice
    /// means the backend had no valid input this period.
    Capture(Box<dyn FnMut(&[f32]) + Send>),
}

impl std::fmt::Debug for IoCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IoCallback::Playback(_) => f.write_str("IoCallback::Playback"),
            IoCallback::Capture(_) => f.write_str("IoCallback::Capture"),
        }
    }
}

/// Everything a backend needs to open one device.
#[derive(Debug)]
pub struct OpenRequest {
    pub role: DeviceRole,
    pub channels: u16,
    pub sample_rate: u32,
    pub period_ms: u32,
    /// `None` selects the system default device for the role.
    pub device: Option<DeviceId>,
    pub callback: IoCallback,
}

pub trait AudioBackend: Send + Sync {
    /// Lists the devices currently visible for `role`.
    fn enumerate(&self, role: DeviceRole) -> Result<Vec<DeviceDescriptor>, BackendError>;

    /// Opens a device configured for interleaved f32 I/O at the requested
    /// rate, channel count and period length, with `callback` installed.
    /// The device starts out stopped.
    fn open(&self, request: OpenRequest) -> Result<Box<dyn BackendDevice>, BackendError>;
}

/// An open backend device. Dropping the handle releases the device.
pub trait BackendDevice: Send {
    /// Transitions the device to running.
    fn start(&mut self) -> Result<(), BackendError>;

    /// Transitions the device to stopped. Best-effort, but synchronous: no
    /// callback invocation begins after this returns.
    fn stop(&mut self);

    /// The backend-reported name of the open device.
    fn name(&self) -> Result<String, BackendError>;
}
