use liveseries::observability::{DeliveryMonitor, MetricsCollector, ProducerMetrics, SessionMetrics};
use std::sync::Arc;

#[test]
fn test_report_without_anything_registered() {
    let monitor = DeliveryMonitor::new(MetricsCollector::new());
    let report = monitor.generate_report();

    assert!(report.starts_with("=== Live Series Metrics ==="));
    assert!(report.contains("No producer registered"));
    assert!(report.contains("No viewers connected"));
}

#[test]
fn test_report_includes_producer_and_sessions() {
    let collector = MetricsCollector::new();

    let producer = Arc::new(ProducerMetrics::new("random"));
    producer.record_tick_produced();
    producer.record_tick_produced();
    producer.record_tick_failure();
    collector.register_producer(producer);

    let session = Arc::new(SessionMetrics::new(4));
    session.record_delivered(12);
    session.record_overflow(3);
    session.record_catch_up();
    collector.register_session(session);

    let report = DeliveryMonitor::new(collector).generate_report();
    assert!(report.contains("[producer:random]"));
    assert!(report.contains("Ticks: 2 produced"));
    assert!(report.contains("1 skipped tick"));
    assert!(report.contains("[session:4]"));
    assert!(report.contains("Delivered: 12"));
    assert!(report.contains("Overflow dropped: 3"));
    assert!(report.contains("Catch-ups: 1"));
}
