use liveseries::core::{SeriesBuffer, WindowRange, WindowSpec};
use liveseries::error::LiveError;
use liveseries::observability::SessionMetrics;
use liveseries::session::{SessionState, ViewerEvent, ViewerSession};
use std::sync::Arc;

fn viewer(max_points: usize) -> ViewerSession {
    ViewerSession::new(3, WindowSpec::new(max_points).unwrap(), Arc::new(SessionMetrics::new(3)))
}

#[tokio::test]
async fn test_lifecycle_transitions() {
    let buffer = SeriesBuffer::new();
    let mut session = viewer(30);
    assert_eq!(session.state(), SessionState::Connecting);

    session.activate(&buffer).unwrap();
    assert_eq!(session.state(), SessionState::Active);

    // Active cannot go back to Connecting
    let err = session.transition_to(SessionState::Connecting).unwrap_err();
    assert!(matches!(err, LiveError::InvalidTransition { .. }));

    session.disconnect();
    assert_eq!(session.state(), SessionState::Disconnected);
    assert!(session.activate(&buffer).is_err());
}

#[tokio::test]
async fn test_display_state_follows_window_policy() {
    let buffer = SeriesBuffer::new();
    let mut session = viewer(5);
    session.activate(&buffer).unwrap();

    for i in 0..8 {
        let sample = buffer.append(i as f64 / 10.0);
        session.receive(0, sample, &buffer).unwrap();
    }

    let display = session.display_state();
    assert_eq!(display.session_id, 3);
    assert_eq!(display.labels, vec![3, 4, 5, 6, 7]);
    assert_eq!(display.values, vec![0.3, 0.4, 0.5, 0.6, 0.7]);
    assert_eq!(display.window_range, Some(WindowRange { start: 3, end: 7 }));
    assert_eq!(display.latest.unwrap().sequence, 7);
    assert_eq!(display.readout, "Latest Count: 7, Latest Random Val: 0.7");
}

#[tokio::test]
async fn test_catch_up_when_current_is_none() {
    let buffer = SeriesBuffer::new();
    buffer.append(1.0);
    let mut session = viewer(30);
    session.activate(&buffer).unwrap();

    assert!(session.catch_up(&buffer).unwrap().is_none());

    buffer.append(2.0);
    match session.catch_up(&buffer).unwrap() {
        Some(ViewerEvent::Samples(samples)) => assert_eq!(samples.len(), 1),
        other => panic!("expected samples, got {:?}", other),
    }
    assert_eq!(session.metrics().delivered(), 1);
}

#[tokio::test]
async fn test_evicted_history_forces_resync() {
    let buffer = SeriesBuffer::with_retention(30);
    buffer.append(0.0);
    let mut session = viewer(30);
    session.activate(&buffer).unwrap();

    // Retention drops samples the viewer never saw
    for i in 1..100 {
        buffer.append(i as f64);
    }

    match session.catch_up(&buffer).unwrap() {
        Some(ViewerEvent::Resync(snapshot)) => {
            assert_eq!(snapshot.samples.len(), 30);
            assert_eq!(snapshot.last_sequence(), Some(99));
        }
        other => panic!("expected resync, got {:?}", other),
    }
    assert_eq!(session.last_delivered_sequence(), Some(99));
}

#[tokio::test]
async fn test_events_convert_to_wire_messages() {
    let buffer = SeriesBuffer::new();
    let mut session = viewer(30);
    session.activate(&buffer).unwrap();

    buffer.append(0.5);
    buffer.append(0.6);
    let event = session.catch_up(&buffer).unwrap().unwrap();
    let messages = event.into_messages();
    assert_eq!(messages.len(), 2);

    let json = serde_json::to_value(&messages[1]).unwrap();
    assert_eq!(json, serde_json::json!({"type": "update", "sequence": 1, "value": 0.6}));
}
