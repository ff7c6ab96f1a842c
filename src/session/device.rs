// Shared device lifecycle for capture and playback sessions.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use crate::backend::{AudioBackend, BackendDevice, BackendError, DeviceId, IoCallback, OpenRequest};
use crate::error::{Result, VoiceError};
use crate::types::{DeviceRole, SessionConfig};

/// Owns one backend device for a session: open/close/reopen lifecycle,
/// the device-name mapping used for selection, and the running state.
pub(crate) struct DeviceSession {
    config: SessionConfig,
    role: DeviceRole,
    backend: Arc<dyn AudioBackend>,
    device: Option<Box<dyn BackendDevice>>,
    /// Name -> id mapping from the most recent enumeration. Rebuilt on
    /// demand, never persisted.
    device_map: HashMap<String, DeviceId>,
    running: bool,
}

impl DeviceSession {
    pub(crate) fn new(
        config: SessionConfig,
        role: DeviceRole,
        backend: Arc<dyn AudioBackend>,
    ) -> Self {
        Self {
            config,
            role,
            backend,
            device: None,
            device_map: HashMap::new(),
            running: false,
        }
    }

    pub(crate) fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub(crate) fn is_running(&self) -> bool {
        self.running
    }

    /// Opens `device_name` (or the system default) with a callback built
    /// by `make_callback`, tearing down any previously open device first.
    ///
    /// The name is resolved against a fresh enumeration *before* the open
    /// device is touched, so an unknown name fails with `DeviceNotFound`
    /// and leaves the session exactly as it was. The running state is
    /// sampled immediately before teardown; a session that was running
    /// resumes on the new device.
    pub(crate) fn initialize(
        &mut self,
        device_name: Option<&str>,
        make_callback: impl FnOnce() -> IoCallback,
    ) -> Result<()> {
        let device_id = match device_name {
            Some(name) => {
                self.refresh_device_map()?;
                let id = self.device_map.get(name).cloned().ok_or_else(|| {
                    VoiceError::DeviceNotFound {
                        role: self.role,
                        name: name.to_string(),
                    }
                })?;
                Some(id)
            }
            None => None,
        };

        let was_running = self.running;
        if let Some(mut device) = self.device.take() {
            device.stop();
            // Dropping the handle releases the backend device before the
            // replacement opens; a failure below leaves the session
            // stopped with no device rather than half-switched.
        }
        self.running = false;

        let request = OpenRequest {
            role: self.role,
            channels: self.config.channels,
            sample_rate: self.config.sample_rate,
            period_ms: self.config.period_ms,
            device: device_id,
            callback: make_callback(),
        };
        let mut device =
            self.backend
                .open(request)
                .map_err(|source| VoiceError::DeviceInitFailed {
                    role: self.role,
                    source,
                })?;

        if was_running {
            device.start().map_err(VoiceError::DeviceStartFailed)?;
        }

        info!(
            "{} session initialized on {} (resumed: {})",
            self.role,
            device_name.unwrap_or("system default"),
            was_running
        );

        self.device = Some(device);
        self.running = was_running;
        Ok(())
    }

    /// Fresh enumeration of the session's role; also rebuilds the name→id
    /// map consulted by `initialize`.
    pub(crate) fn list_devices(&mut self) -> Result<Vec<String>> {
        self.refresh_device_map()
    }

    fn refresh_device_map(&mut self) -> Result<Vec<String>> {
        let descriptors = self
            .backend
            .enumerate(self.role)
            .map_err(VoiceError::BackendQueryFailed)?;
        self.device_map = descriptors
            .iter()
            .map(|d| (d.name.clone(), d.id.clone()))
            .collect();
        Ok(descriptors.into_iter().map(|d| d.name).collect())
    }

    pub(crate) fn current_device_name(&self) -> Result<String> {
        let device = self.device.as_ref().ok_or_else(|| {
            VoiceError::DeviceQueryFailed(BackendError::new("no device is open"))
        })?;
        device.name().map_err(VoiceError::DeviceQueryFailed)
    }

    /// The running flag is set only once the backend has accepted the
    /// start, so a rejected start leaves the session in its previous
    /// state.
    pub(crate) fn start(&mut self) -> Result<()> {
        let device = self.device.as_mut().ok_or_else(|| {
            VoiceError::DeviceStartFailed(BackendError::new("no device is open"))
        })?;
        device.start().map_err(VoiceError::DeviceStartFailed)?;
        self.running = true;
        Ok(())
    }

    /// Best-effort and idempotent. Synchronous: no callback invocation
    /// begins after this returns, so reconfiguration or destruction may
    /// follow immediately.
    pub(crate) fn stop(&mut self) {
        if let Some(device) = self.device.as_mut() {
            device.stop();
        }
        self.running = false;
    }
}

impl Drop for DeviceSession {
    fn drop(&mut self) {
        // Stop before the device handle drops, even after a partial init.
        self.stop();
    }
}
