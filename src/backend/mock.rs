// Deterministic in-process backend for tests and headless environments.
//
// The mock replaces the backend's real-time threads with explicit
// driving: tests obtain a MockDeviceDriver for an opened device and call
// render_period / feed_period to invoke the installed callback exactly
// when they choose to.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::{
    AudioBackend, BackendDevice, BackendError, DeviceDescriptor, DeviceId, IoCallback, OpenRequest,
};
use crate::types::DeviceRole;

/// In-memory backend with scriptable device lists and failure injection.
///
/// Clones share the same state, so a test can keep a handle while the
/// session owns another.
#[derive(Clone)]
pub struct MockBackend {
    inner: Arc<MockState>,
}

struct MockState {
    capture_names: Mutex<Vec<String>>,
    playback_names: Mutex<Vec<String>>,
    fail_enumerate: AtomicBool,
    fail_open: AtomicBool,
    fail_start: AtomicBool,
    opened: Mutex<Vec<Arc<MockDeviceState>>>,
}

struct MockDeviceState {
    name: String,
    role: DeviceRole,
    samples_per_period: usize,
    /// The running flag lives under the same lock as the callback, which
    /// makes `stop()` exact: once a stopper holds the lock, no callback is
    /// in flight and none will start.
    io: Mutex<MockIo>,
    closed: AtomicBool,
}

struct MockIo {
    callback: IoCallback,
    running: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::with_devices(&["Mock Microphone"], &["Mock Speakers"])
    }

    pub fn with_devices(capture: &[&str], playback: &[&str]) -> Self {
        Self {
            inner: Arc::new(MockState {
                capture_names: Mutex::new(capture.iter().map(|s| s.to_string()).collect()),
                playback_names: Mutex::new(playback.iter().map(|s| s.to_string()).collect()),
                fail_enumerate: AtomicBool::new(false),
                fail_open: AtomicBool::new(false),
                fail_start: AtomicBool::new(false),
                opened: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn set_fail_enumerate(&self, fail: bool) {
        self.inner.fail_enumerate.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.inner.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_start(&self, fail: bool) {
        self.inner.fail_start.store(fail, Ordering::SeqCst);
    }

    /// Driver for the most recently opened, still-open device of `role`.
    pub fn last_opened(&self, role: DeviceRole) -> Option<MockDeviceDriver> {
        self.inner
            .opened
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|d| d.role == role && !d.closed.load(Ordering::SeqCst))
            .map(|d| MockDeviceDriver { state: d.clone() })
    }

    /// Number of devices opened and not yet released, all roles.
    pub fn open_device_count(&self) -> usize {
        self.inner
            .opened
            .lock()
            .unwrap()
            .iter()
            .filter(|d| !d.closed.load(Ordering::SeqCst))
            .count()
    }

    fn names_for(&self, role: DeviceRole) -> Vec<String> {
        match role {
            DeviceRole::Capture => self.inner.capture_names.lock().unwrap().clone(),
            DeviceRole::Playback => self.inner.playback_names.lock().unwrap().clone(),
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for MockBackend {
    fn enumerate(&self, role: DeviceRole) -> Result<Vec<DeviceDescriptor>, BackendError> {
        if self.inner.fail_enumerate.load(Ordering::SeqCst) {
            return Err(BackendError::new("enumeration failure injected"));
        }
        Ok(self
            .names_for(role)
            .into_iter()
            .map(|name| DeviceDescriptor {
                id: DeviceId(name.clone()),
                name,
            })
            .collect())
    }

    fn open(&self, request: OpenRequest) -> Result<Box<dyn BackendDevice>, BackendError> {
        if self.inner.fail_open.load(Ordering::SeqCst) {
            return Err(BackendError::new("open failure injected"));
        }
        let names = self.names_for(request.role);
        let name = match &request.device {
            Some(DeviceId(key)) => {
                if !names.iter().any(|n| n == key) {
                    return Err(BackendError::new(format!("unknown device id {key:?}")));
                }
                key.clone()
            }
            None => names
                .first()
                .cloned()
                .ok_or_else(|| BackendError::new(format!("no {} devices", request.role)))?,
        };

        let frames = request.sample_rate as usize * request.period_ms as usize / 1000;
        let state = Arc::new(MockDeviceState {
            name,
            role: request.role,
            samples_per_period: frames * request.channels as usize,
            io: Mutex::new(MockIo {
                callback: request.callback,
                running: false,
            }),
            closed: AtomicBool::new(false),
        });
        self.inner.opened.lock().unwrap().push(state.clone());
        Ok(Box::new(MockDevice {
            backend: self.inner.clone(),
            state,
        }))
    }
}

struct MockDevice {
    backend: Arc<MockState>,
    state: Arc<MockDeviceState>,
}

impl BackendDevice for MockDevice {
    fn start(&mut self) -> Result<(), BackendError> {
        if self.backend.fail_start.load(Ordering::SeqCst) {
            return Err(BackendError::new("start failure injected"));
        }
        self.state.io.lock().unwrap().running = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.state.io.lock().unwrap().running = false;
    }

    fn name(&self) -> Result<String, BackendError> {
        Ok(self.state.name.clone())
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        self.state.io.lock().unwrap().running = false;
        self.state.closed.store(true, Ordering::SeqCst);
    }
}

/// Test-side handle that stands in for the backend's real-time thread.
pub struct MockDeviceDriver {
    state: Arc<MockDeviceState>,
}

impl MockDeviceDriver {
    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn samples_per_period(&self) -> usize {
        self.state.samples_per_period
    }

    pub fn is_running(&self) -> bool {
        self.state.io.lock().unwrap().running
    }

    /// Whether the session has released this device.
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Runs one playback period: invokes the callback on a zeroed output
    /// buffer and returns it. `None` when the device is stopped, released,
    /// or not a playback device.
    pub fn render_period(&self) -> Option<Vec<f32>> {
        let mut io = self.state.io.lock().unwrap();
        if !io.running || self.is_closed() {
            return None;
        }
        match &mut io.callback {
            IoCallback::Playback(callback) => {
                let mut buffer = vec![0.0f32; self.state.samples_per_period];
                callback(&mut buffer);
                Some(buffer)
            }
            IoCallback::Capture(_) => None,
        }
    }

    /// Runs one capture period: feeds `samples` to the callback. Returns
    /// false when the device is stopped, released, or not a capture
    /// device.
    pub fn feed_period(&self, samples: &[f32]) -> bool {
        let mut io = self.state.io.lock().unwrap();
        if !io.running || self.is_closed() {
            return false;
        }
        match &mut io.callback {
            IoCallback::Capture(callback) => {
                callback(samples);
                true
            }
            IoCallback::Playback(_) => false,
        }
    }
}
