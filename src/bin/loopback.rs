// Microphone loopback demo: capture -> voice source 0 -> mixed playback.
//
// Run with RUST_LOG=info for session lifecycle logging. Talks into the
// default microphone and plays the mix on the default speakers until
// killed.

use std::thread;
use std::time::Duration;

use anyhow::Result;
use voicelink::{CaptureSession, PlaybackSession, SessionConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = SessionConfig::new(1.0, 48_000, 2, 20)?;
    let mut recorder = CaptureSession::new(config.clone())?;
    let mut player = PlaybackSession::new(config.clone())?;

    println!("------------------------------------------------------------");
    for name in recorder.list_devices()? {
        println!("Available capture device: {name}");
    }
    println!("------------------------------------------------------------");
    for name in player.list_devices()? {
        println!("Available playback device: {name}");
    }
    println!("------------------------------------------------------------");

    player.set_master_gain(2.0);
    player.add_source(0)?;

    println!("Starting mic loopback, you can try to talk now...");
    recorder.start()?;
    player.start()?;

    // Poll at a quarter period so an empty queue never turns into a tight
    // spin on this thread.
    let poll = Duration::from_millis((config.period_ms as u64 / 4).max(1));
    loop {
        match recorder.dequeue_frame() {
            Some(frame) => player.enqueue_sample(0, frame)?,
            None => thread::sleep(poll),
        }
    }
}
