// Playback session: the mixing engine. Owns the voice source registry
// and produces one mixed period per hardware callback.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::audio_debug;
#[cfg(feature = "backend-cpal")]
use crate::backend::CpalBackend;
use crate::backend::{AudioBackend, IoCallback};
use crate::error::{Result, VoiceError};
use crate::frame::{FramePool, SampleFrame};
use crate::session::DeviceSession;
use crate::source::VoiceSource;
use crate::types::{AtomicF32, DeviceRole, SessionConfig, DEFAULT_QUEUE_CAPACITY};

/// Mixed-frame buffers recycled back to enqueuers via `acquire_frame`.
const POOL_CAPACITY: usize = 32;

type SourceMap = HashMap<u32, Arc<VoiceSource>>;

/// State shared between the control surface and the mix callback.
struct MixerShared {
    /// Snapshot/publish registry: control threads build a new map and swap
    /// the Arc; the callback clones the current Arc under the lock (a
    /// pointer copy) and mixes from one consistent snapshot. Mutations are
    /// rare next to the callback rate, so nothing here can stall the
    /// audio thread for longer than the pointer swap.
    sources: Mutex<Arc<SourceMap>>,
    master_gain: AtomicF32,
    pool: FramePool,
    samples_per_period: usize,
    source_queue_capacity: usize,
}

/// One playback-direction device plus the registry of voice sources its
/// callback mixes.
///
/// Once per hardware period, the mix callback dequeues at most one frame
/// from every registered source, sums them into an accumulation buffer,
/// scales the sum by the master gain and hands it to the backend. Sources
/// with nothing queued contribute silence; callback cost grows with the
/// number of registered sources, never with queue depth.
pub struct PlaybackSession {
    session: DeviceSession,
    mixer: Arc<MixerShared>,
}

impl PlaybackSession {
    /// Opens the system default playback device through cpal.
    #[cfg(feature = "backend-cpal")]
    pub fn new(config: SessionConfig) -> Result<Self> {
        Self::with_backend(config, Arc::new(CpalBackend::new()))
    }

    /// Opens the system default playback device on `backend`.
    pub fn with_backend(config: SessionConfig, backend: Arc<dyn AudioBackend>) -> Result<Self> {
        config.validate()?;
        let mixer = Arc::new(MixerShared {
            sources: Mutex::new(Arc::new(SourceMap::new())),
            master_gain: AtomicF32::new(config.master_gain),
            pool: FramePool::new(config.samples_per_period(), POOL_CAPACITY),
            samples_per_period: config.samples_per_period(),
            source_queue_capacity: DEFAULT_QUEUE_CAPACITY,
        });
        let mut session = DeviceSession::new(config, DeviceRole::Playback, backend);
        let callback_mixer = mixer.clone();
        session.initialize(None, move || mix_callback(callback_mixer))?;
        Ok(Self { session, mixer })
    }

    /// Registers a new voice source with gain 1.0 under `id`. Fails with
    /// `DuplicateSourceId` while `id` is registered; removing and
    /// re-adding the same id yields a fresh source.
    pub fn add_source(&self, id: u32) -> Result<()> {
        let mut registry = self.mixer.sources.lock().unwrap();
        if registry.contains_key(&id) {
            return Err(VoiceError::DuplicateSourceId(id));
        }
        let mut next: SourceMap = (**registry).clone();
        next.insert(
            id,
            Arc::new(VoiceSource::with_queue_capacity(
                id,
                self.mixer.source_queue_capacity,
            )),
        );
        *registry = Arc::new(next);
        info!("registered voice source {id}");
        Ok(())
    }

    /// Unregisters `id`, discarding anything still queued inside it. No-op
    /// when the id is not registered.
    pub fn remove_source(&self, id: u32) {
        let mut registry = self.mixer.sources.lock().unwrap();
        if !registry.contains_key(&id) {
            return;
        }
        let mut next: SourceMap = (**registry).clone();
        next.remove(&id);
        *registry = Arc::new(next);
        info!("removed voice source {id}");
    }

    pub fn source_count(&self) -> usize {
        self.mixer.sources.lock().unwrap().len()
    }

    fn source(&self, id: u32) -> Result<Arc<VoiceSource>> {
        self.mixer
            .sources
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(VoiceError::UnknownSourceId(id))
    }

    /// Scales `frame` by the source's current gain and queues it for
    /// mixing. The frame must match the session's period size; that is a
    /// caller contract, not a validated property.
    pub fn enqueue_sample(&self, id: u32, frame: SampleFrame) -> Result<()> {
        if let Some(displaced) = self.source(id)?.enqueue(frame) {
            audio_debug!("source {id} queue full, dropped oldest period");
            self.mixer.pool.release(displaced.into_samples());
        }
        Ok(())
    }

    /// Applies to frames enqueued after the call; already-queued frames
    /// keep their scaling.
    pub fn set_source_gain(&self, id: u32, gain: f32) -> Result<()> {
        self.source(id)?.set_gain(gain);
        Ok(())
    }

    pub fn source_gain(&self, id: u32) -> Result<f32> {
        Ok(self.source(id)?.gain())
    }

    /// Read once by each subsequent mix callback.
    pub fn set_master_gain(&self, gain: f32) {
        self.mixer.master_gain.store(gain);
    }

    pub fn master_gain(&self) -> f32 {
        self.mixer.master_gain.load()
    }

    /// A recycled (or fresh) silent frame of one period, for callers that
    /// want to fill frames without allocating.
    pub fn acquire_frame(&self) -> SampleFrame {
        let mut buffer = self.mixer.pool.acquire();
        buffer.fill(0.0);
        SampleFrame::from_samples(buffer)
    }

    /// Playback device names from a fresh enumeration.
    pub fn list_devices(&mut self) -> Result<Vec<String>> {
        self.session.list_devices()
    }

    /// Switches to the named playback device, or back to the system
    /// default for `None`. Registered sources, their gains and queued
    /// frames survive the switch; a running session resumes on the new
    /// device.
    pub fn select_device(&mut self, name: Option<&str>) -> Result<()> {
        let mixer = self.mixer.clone();
        self.session.initialize(name, move || mix_callback(mixer))
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
}

fn mix_callback(mixer: Arc<MixerShared>) -> IoCallback {
    // The accumulation buffer lives in the callback closure and is zeroed
    // after every period so the next mix starts clean.
    let mut mix_buffer = vec![0.0f32; mixer.samples_per_period];
    IoCallback::Playback(Box::new(move |output: &mut [f32]| {
        let snapshot = match mixer.sources.lock() {
            Ok(registry) => Arc::clone(&registry),
            // A poisoned registry means a control thread panicked mid
            // publish; emit silence rather than join it.
            Err(_) => {
                output.fill(0.0);
                return;
            }
        };

        for source in snapshot.values() {
            // An empty queue is a normal underrun: this source contributes
            // silence for the period and the rest still mix.
            let Some(frame) = source.dequeue() else { continue };
            let n = frame.len().min(mix_buffer.len());
            for (acc, sample) in mix_buffer[..n].iter_mut().zip(&frame.samples()[..n]) {
                *acc += *sample;
            }
            mixer.pool.release(frame.into_samples());
        }

        let master = mixer.master_gain.load();
        let n = output.len().min(mix_buffer.len());
        for (out, acc) in output[..n].iter_mut().zip(&mix_buffer[..n]) {
            *out = *acc * master;
        }
        output[n..].fill(0.0);
        mix_buffer.fill(0.0);
    }))
}
