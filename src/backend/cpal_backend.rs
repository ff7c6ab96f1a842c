// cpal-backed implementation of the backend boundary.
//
// cpal streams are not Send, so every open device gets a dedicated owner
// thread that builds the stream and services play/pause/name commands
// over a channel. Commands carry response channels, so callers observe
// completion synchronously.

use std::sync::mpsc;
use std::thread::JoinHandle;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{info, warn};

use super::{
    AudioBackend, BackendDevice, BackendError, DeviceDescriptor, DeviceId, IoCallback, OpenRequest,
};
use crate::types::DeviceRole;

/// Production backend over cpal's default host.
#[derive(Debug, Default)]
pub struct CpalBackend;

impl CpalBackend {
    pub fn new() -> Self {
        Self
    }
}

impl AudioBackend for CpalBackend {
    fn enumerate(&self, role: DeviceRole) -> Result<Vec<DeviceDescriptor>, BackendError> {
        let host = cpal::default_host();
        let devices = match role {
            DeviceRole::Capture => host.input_devices(),
            DeviceRole::Playback => host.output_devices(),
        }
        .map_err(|e| BackendError::new(format!("device enumeration failed: {e}")))?;

        let mut descriptors = Vec::new();
        for device in devices {
            // A device that cannot report a name cannot be selected by
            // name; skip it rather than failing the whole enumeration.
            match device.name() {
                Ok(name) => descriptors.push(DeviceDescriptor {
                    id: DeviceId(name.clone()),
                    name,
                }),
                Err(e) => warn!("skipping unnamed {role} device: {e}"),
            }
        }
        Ok(descriptors)
    }

    fn open(&self, request: OpenRequest) -> Result<Box<dyn BackendDevice>, BackendError> {
        let role = request.role;
        let (command_tx, command_rx) = mpsc::channel::<StreamCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), BackendError>>();

        let join = std::thread::Builder::new()
            .name(format!("voicelink-{role}-stream"))
            .spawn(move || stream_owner(request, command_rx, ready_tx))
            .map_err(|e| BackendError::new(format!("failed to spawn stream thread: {e}")))?;

        // The owner thread reports once the stream is built (or failed to
        // build); only a successfully opened device escapes this function.
        match ready_rx.recv() {
            Ok(Ok(())) => {
                info!("🔊 opened {role} stream");
                Ok(Box::new(CpalDevice {
                    command_tx,
                    join: Some(join),
                }))
            }
            Ok(Err(e)) => {
                let _ = join.join();
                Err(e)
            }
            Err(_) => {
                let _ = join.join();
                Err(BackendError::new(
                    "stream thread exited before reporting readiness",
                ))
            }
        }
    }
}

enum StreamCommand {
    Play(mpsc::Sender<Result<(), BackendError>>),
    Pause(mpsc::Sender<Result<(), BackendError>>),
    QueryName(mpsc::Sender<Result<String, BackendError>>),
    Shutdown,
}

/// Body of the stream owner thread: resolve the device, build the stream,
/// then service commands until shutdown. The stream is dropped (closing
/// the device) when this returns.
fn stream_owner(
    request: OpenRequest,
    command_rx: mpsc::Receiver<StreamCommand>,
    ready_tx: mpsc::Sender<Result<(), BackendError>>,
) {
    let host = cpal::default_host();
    let device = match resolve_device(&host, request.role, request.device.as_ref()) {
        Ok(device) => device,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    let frames = (request.sample_rate as u64 * request.period_ms as u64 / 1000) as u32;
    let config = cpal::StreamConfig {
        channels: request.channels,
        sample_rate: cpal::SampleRate(request.sample_rate),
        buffer_size: cpal::BufferSize::Fixed(frames),
    };

    let stream = match build_stream(&device, &config, request.callback) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if ready_tx.send(Ok(())).is_err() {
        return;
    }

    while let Ok(command) = command_rx.recv() {
        match command {
            StreamCommand::Play(response_tx) => {
                let _ = response_tx.send(
                    stream
                        .play()
                        .map_err(|e| BackendError::new(format!("failed to start stream: {e}"))),
                );
            }
            StreamCommand::Pause(response_tx) => {
                let _ = response_tx.send(
                    stream
                        .pause()
                        .map_err(|e| BackendError::new(format!("failed to pause stream: {e}"))),
                );
            }
            StreamCommand::QueryName(response_tx) => {
                let _ = response_tx.send(
                    device
                        .name()
                        .map_err(|e| BackendError::new(format!("cannot get device name: {e}"))),
                );
            }
            StreamCommand::Shutdown => break,
        }
    }
}

fn resolve_device(
    host: &cpal::Host,
    role: DeviceRole,
    wanted: Option<&DeviceId>,
) -> Result<cpal::Device, BackendError> {
    match wanted {
        None => match role {
            DeviceRole::Capture => host.default_input_device(),
            DeviceRole::Playback => host.default_output_device(),
        }
        .ok_or_else(|| BackendError::new(format!("no default {role} device"))),
        Some(DeviceId(name)) => {
            let mut devices = match role {
                DeviceRole::Capture => host.input_devices(),
                DeviceRole::Playback => host.output_devices(),
            }
            .map_err(|e| BackendError::new(format!("device enumeration failed: {e}")))?;
            devices
                .find(|d| d.name().map(|n| n == *name).unwrap_or(false))
                .ok_or_else(|| {
                    BackendError::new(format!("{role} device {name:?} is no longer present"))
                })
        }
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    callback: IoCallback,
) -> Result<cpal::Stream, BackendError> {
    match callback {
        IoCallback::Playback(mut callback) => device.build_output_stream(
            config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| callback(data),
            |err| warn!("playback stream error: {err}"),
            None,
        ),
        IoCallback::Capture(mut callback) => device.build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| callback(data),
            |err| warn!("capture stream error: {err}"),
            None,
        ),
    }
    .map_err(|e| BackendError::new(format!("failed to build audio stream: {e}")))
}

struct CpalDevice {
    command_tx: mpsc::Sender<StreamCommand>,
    join: Option<JoinHandle<()>>,
}

impl CpalDevice {
    fn request<T>(
        &self,
        make: impl FnOnce(mpsc::Sender<T>) -> StreamCommand,
    ) -> Result<T, BackendError> {
        let (response_tx, response_rx) = mpsc::channel();
        self.command_tx
            .send(make(response_tx))
            .map_err(|_| BackendError::new("stream thread is gone"))?;
        response_rx
            .recv()
            .map_err(|_| BackendError::new("stream thread dropped the request"))
    }
}

impl BackendDevice for CpalDevice {
    fn start(&mut self) -> Result<(), BackendError> {
        self.request(StreamCommand::Play)?
    }

    fn stop(&mut self) {
        // Waiting for the acknowledgment means the pause has been issued on
        // the owner thread before we return; best-effort beyond that.
        match self.request(StreamCommand::Pause) {
            Ok(Err(e)) => warn!("failed to pause stream: {e}"),
            Err(_) => {} // thread already gone, nothing left to stop
            Ok(Ok(())) => {}
        }
    }

    fn name(&self) -> Result<String, BackendError> {
        self.request(StreamCommand::QueryName)?
    }
}

impl Drop for CpalDevice {
    fn drop(&mut self) {
        let _ = self.command_tx.send(StreamCommand::Shutdown);
        if let Some(join) = self.join.take() {
            let _ = join.join();
        }
    }
}
