use crate::backend::BackendError;
use crate::types::DeviceRole;

/// Errors surfaced by session construction, device lifecycle and source
/// registry operations.
///
/// Per-callback conditions (an underrun, an empty capture queue) are not
/// errors: they resolve to silence or `None` on the hot path and never
/// appear here.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    #[error("invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    #[error("failed to initialize {role} device")]
    DeviceInitFailed {
        role: DeviceRole,
        #[source]
        source: BackendError,
    },

    #[error("failed to start device")]
    DeviceStartFailed(#[source] BackendError),

    #[error("there is no {role} device with the name {name:?}")]
    DeviceNotFound { role: DeviceRole, name: String },

    #[error("cannot query current device name")]
    DeviceQueryFailed(#[source] BackendError),

    #[error("backend device query failed")]
    BackendQueryFailed(#[source] BackendError),

    #[error("no voice source registered under id {0}")]
    UnknownSourceId(u32),

    #[error("voice source id {0} is already registered")]
    DuplicateSourceId(u32),
}

pub type Result<T> = std::result::Result<T, VoiceError>;
