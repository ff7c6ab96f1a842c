// Capture path tests: the driver feeds periods the way the backend's
// real-time thread would, the consumer side dequeues.

use std::sync::Arc;

use voicelink::{CaptureSession, DeviceRole, MockBackend, MockDeviceDriver, SessionConfig};

// 8 kHz mono at 10 ms: 80 samples per period, cheap to push in bulk.
fn capture_with_mock(master_gain: f32) -> (CaptureSession, MockDeviceDriver) {
    let config = SessionConfig::new(master_gain, 8_000, 1, 10).unwrap();
    let mock = MockBackend::new();
    let session = CaptureSession::with_backend(config, Arc::new(mock.clone()))
        .expect("capture session should open the mock device");
    let driver = mock.last_opened(DeviceRole::Capture).unwrap();
    (session, driver)
}

#[cfg(test)]
mod capture_pipeline_tests {
    use super::*;

    #[test]
    fn test_frames_come_back_in_fifo_order() {
        let (mut session, driver) = capture_with_mock(1.0);
        session.start().unwrap();

        for value in [0.1f32, 0.2, 0.3] {
            assert!(driver.feed_period(&vec![value; 80]));
        }

        for value in [0.1f32, 0.2, 0.3] {
            let frame = session.dequeue_frame().expect("one frame per period");
            assert_eq!(frame.len(), 80);
            assert!(frame.samples().iter().all(|&s| s == value));
        }
        assert!(session.dequeue_frame().is_none(), "queue drained");
    }

    #[test]
    fn test_capture_gain_scales_copied_samples() {
        let (mut session, driver) = capture_with_mock(1.0);
        session.set_gain(0.5);
        session.start().unwrap();

        driver.feed_period(&[1.0; 80]);

        let frame = session.dequeue_frame().unwrap();
        assert!(frame.samples().iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_gain_change_affects_only_later_periods() {
        let (mut session, driver) = capture_with_mock(1.0);
        session.start().unwrap();

        driver.feed_period(&[1.0; 80]);
        session.set_gain(0.25);
        driver.feed_period(&[1.0; 80]);

        let first = session.dequeue_frame().unwrap();
        assert!(first.samples().iter().all(|&s| s == 1.0));
        let second = session.dequeue_frame().unwrap();
        assert!(second.samples().iter().all(|&s| s == 0.25));
    }

    #[test]
    fn test_initial_gain_comes_from_config() {
        let (session, _driver) = capture_with_mock(2.0);
        assert_eq!(session.gain(), 2.0);
    }

    #[test]
    fn test_stopped_device_feeds_nothing() {
        let (session, driver) = capture_with_mock(1.0);

        assert!(!driver.feed_period(&[1.0; 80]), "device never started");
        assert_eq!(session.queued_frames(), 0);
        assert!(session.dequeue_frame().is_none());
    }

    #[test]
    fn test_empty_input_is_a_noop() {
        let (mut session, driver) = capture_with_mock(1.0);
        session.start().unwrap();

        assert!(driver.feed_period(&[]), "callback runs, but queues nothing");
        assert_eq!(session.queued_frames(), 0);
    }

    #[test]
    fn test_short_period_is_zero_padded() {
        let (mut session, driver) = capture_with_mock(1.0);
        session.start().unwrap();

        driver.feed_period(&[0.5; 40]);

        let frame = session.dequeue_frame().unwrap();
        assert_eq!(frame.len(), 80, "frames always span a full period");
        assert!(frame.samples()[..40].iter().all(|&s| s == 0.5));
        assert!(frame.samples()[40..].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_overflow_drops_oldest_periods() {
        let (mut session, driver) = capture_with_mock(1.0);
        session.start().unwrap();

        // 260 periods into a 256-slot queue: the first four go overboard.
        for i in 0..260 {
            driver.feed_period(&vec![i as f32; 80]);
        }

        assert_eq!(session.dropped_frames(), 4);
        assert_eq!(session.queued_frames(), 256);
        let oldest = session.dequeue_frame().unwrap();
        assert!(
            oldest.samples().iter().all(|&s| s == 4.0),
            "oldest surviving frame should be period 4"
        );
    }

    #[test]
    fn test_recycled_buffers_round_trip() {
        let (mut session, driver) = capture_with_mock(1.0);
        session.start().unwrap();

        driver.feed_period(&[0.7; 80]);
        let frame = session.dequeue_frame().unwrap();
        session.recycle_frame(frame);

        driver.feed_period(&[0.9; 80]);
        let frame = session.dequeue_frame().unwrap();
        assert!(
            frame.samples().iter().all(|&s| s == 0.9),
            "recycled buffers must be fully overwritten"
        );
    }
}
