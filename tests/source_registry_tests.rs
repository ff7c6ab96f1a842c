// Voice source registry semantics: id uniqueness, removal, and the
// re-add-after-remove contract.

use std::sync::Arc;

use voicelink::{
    DeviceRole, MockBackend, PlaybackSession, SampleFrame, SessionConfig, VoiceError,
};

fn playback_with_mock() -> (PlaybackSession, MockBackend) {
    let config = SessionConfig::new(1.0, 8_000, 1, 10).unwrap();
    let mock = MockBackend::new();
    let session = PlaybackSession::with_backend(config, Arc::new(mock.clone()))
        .expect("playback session should open the mock device");
    (session, mock)
}

fn ones_frame(session: &PlaybackSession) -> SampleFrame {
    SampleFrame::from_samples(vec![1.0; session.config().samples_per_period()])
}

#[cfg(test)]
mod registry_tests {
    use super::*;

    #[test]
    fn test_duplicate_source_id_is_rejected() {
        let (session, _mock) = playback_with_mock();
        session.add_source(7).unwrap();
        assert!(matches!(
            session.add_source(7),
            Err(VoiceError::DuplicateSourceId(7))
        ));
        assert_eq!(session.source_count(), 1);
    }

    #[test]
    fn test_enqueue_to_unknown_source_fails() {
        let (session, _mock) = playback_with_mock();
        let frame = ones_frame(&session);
        assert!(matches!(
            session.enqueue_sample(3, frame),
            Err(VoiceError::UnknownSourceId(3))
        ));
    }

    #[test]
    fn test_gain_access_on_unknown_source_fails() {
        let (session, _mock) = playback_with_mock();
        assert!(matches!(
            session.set_source_gain(9, 0.5),
            Err(VoiceError::UnknownSourceId(9))
        ));
        assert!(matches!(
            session.source_gain(9),
            Err(VoiceError::UnknownSourceId(9))
        ));
    }

    #[test]
    fn test_remove_source_is_noop_when_absent() {
        let (session, _mock) = playback_with_mock();
        session.remove_source(42);
        assert_eq!(session.source_count(), 0);
    }

    #[test]
    fn test_enqueue_after_remove_fails() {
        let (session, _mock) = playback_with_mock();
        session.add_source(0).unwrap();
        session.remove_source(0);
        let frame = ones_frame(&session);
        assert!(matches!(
            session.enqueue_sample(0, frame),
            Err(VoiceError::UnknownSourceId(0))
        ));
    }

    #[test]
    fn test_readd_after_remove_yields_fresh_source() {
        let (mut session, mock) = playback_with_mock();
        let driver = mock.last_opened(DeviceRole::Playback).unwrap();

        session.add_source(0).unwrap();
        session.set_source_gain(0, 0.25).unwrap();
        let frame = ones_frame(&session);
        session.enqueue_sample(0, frame).unwrap();

        session.remove_source(0);
        session.add_source(0).unwrap();

        // Fresh source: default gain, nothing queued from its past life.
        assert_eq!(session.source_gain(0).unwrap(), 1.0);
        session.start().unwrap();
        let output = driver.render_period().unwrap();
        assert!(
            output.iter().all(|&s| s == 0.0),
            "frames queued before removal must not survive re-registration"
        );
    }

    #[test]
    fn test_removed_source_stops_contributing() {
        let (mut session, mock) = playback_with_mock();
        let driver = mock.last_opened(DeviceRole::Playback).unwrap();

        session.add_source(0).unwrap();
        session.add_source(1).unwrap();
        let frame = ones_frame(&session);
        session.enqueue_sample(0, frame.clone()).unwrap();
        session.enqueue_sample(1, frame).unwrap();
        session.remove_source(0);
        session.start().unwrap();

        let output = driver.render_period().unwrap();
        assert!(
            output.iter().all(|&s| s == 1.0),
            "only the surviving source should contribute"
        );
    }

    #[test]
    fn test_source_count_tracks_registry() {
        let (session, _mock) = playback_with_mock();
        for id in 0..4 {
            session.add_source(id).unwrap();
        }
        assert_eq!(session.source_count(), 4);
        session.remove_source(2);
        assert_eq!(session.source_count(), 3);
    }
}
