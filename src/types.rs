// Core session types and configuration

use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::{Result, VoiceError};

/// Size of one sample on the wire: 32-bit float, the only format the
/// pipeline speaks.
pub const BYTES_PER_SAMPLE: usize = 4;

/// Professional standard rate used by the demo and the tests.
pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;

/// Default bound of a sample queue, in periods (~5 seconds at 20 ms).
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Which direction a device moves audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceRole {
    Capture,
    Playback,
}

impl std::fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceRole::Capture => f.write_str("capture"),
            DeviceRole::Playback => f.write_str("playback"),
        }
    }
}

/// Session parameters, immutable for one configuration epoch.
///
/// Every frame flowing through a session is sized from these values; a
/// device switch reuses them, a rate or channel change requires a new
/// session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Master gain for playback sessions, initial capture gain for capture
    /// sessions. Linear factor, 1.0 = unchanged.
    pub master_gain: f32,
    pub sample_rate: u32,
    pub channels: u16,
    /// Length of one hardware callback period in milliseconds.
    pub period_ms: u32,
}

impl SessionConfig {
    pub fn new(master_gain: f32, sample_rate: u32, channels: u16, period_ms: u32) -> Result<Self> {
        let config = Self {
            master_gain,
            sample_rate,
            channels,
            period_ms,
        };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        // `!(x >= 0.0)` also rejects NaN.
        if !(self.master_gain >= 0.0) {
            return Err(VoiceError::InvalidConfiguration {
                reason: format!("master gain must be >= 0, got {}", self.master_gain),
            });
        }
        if self.sample_rate == 0 {
            return Err(VoiceError::InvalidConfiguration {
                reason: "sample rate must be positive".to_string(),
            });
        }
        if self.channels == 0 {
            return Err(VoiceError::InvalidConfiguration {
                reason: "channel count must be positive".to_string(),
            });
        }
        if self.period_ms == 0 {
            return Err(VoiceError::InvalidConfiguration {
                reason: "period length must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Frames delivered by one hardware callback.
    pub fn frames_per_period(&self) -> usize {
        (self.sample_rate as u64 * self.period_ms as u64 / 1000) as usize
    }

    /// Interleaved samples in one period (frames x channels).
    pub fn samples_per_period(&self) -> usize {
        self.frames_per_period() * self.channels as usize
    }

    pub fn bytes_per_period(&self) -> usize {
        self.samples_per_period() * BYTES_PER_SAMPLE
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            master_gain: 1.0,
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 2,
            period_ms: 20,
        }
    }
}

/// f32 stored as its bit pattern in an `AtomicU32`, so gains can be read
/// from the audio callbacks without locking.
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}
