use liveseries::core::SeriesBuffer;
use liveseries::engine::Producer;
use liveseries::sources::{FnSource, SineSource};
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_producer_ticks_at_fixed_rate() {
    let buffer = Arc::new(SeriesBuffer::new());
    let producer = Producer::new(
        buffer.clone(),
        Box::new(FnSource::new("counter", |seq| Ok(seq as f64))),
        Duration::from_millis(1000),
    );
    let handle = producer.spawn();

    // Ticks at 0, 1000, 2000, 3000, 4000
    tokio::time::sleep(Duration::from_millis(4500)).await;
    assert_eq!(buffer.len(), 5);
    assert_eq!(handle.metrics().ticks_produced(), 5);

    let seqs: Vec<u64> = buffer.read_window(10).iter().map(|s| s.sequence).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3, 4]);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_failing_tick_is_skipped_without_gap() {
    let buffer = Arc::new(SeriesBuffer::new());
    let mut calls = 0u32;
    let source = FnSource::new("flaky", move |_| {
        calls += 1;
        if calls == 2 {
            Err(anyhow::anyhow!("sensor glitch"))
        } else {
            Ok(calls as f64)
        }
    });
    let handle = Producer::new(buffer.clone(), Box::new(source), Duration::from_millis(1000)).spawn();

    tokio::time::sleep(Duration::from_millis(4500)).await;

    // Five ticks, one skipped: four samples, still numbered 0..3
    let samples = buffer.read_window(10);
    let seqs: Vec<u64> = samples.iter().map(|s| s.sequence).collect();
    assert_eq!(seqs, vec![0, 1, 2, 3]);
    assert_eq!(handle.metrics().tick_failures(), 1);
    assert_eq!(handle.metrics().ticks_produced(), 4);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_non_finite_value_is_a_tick_failure() {
    let buffer = Arc::new(SeriesBuffer::new());
    let handle = Producer::new(
        buffer.clone(),
        Box::new(FnSource::new("nan", |_| Ok(f64::NAN))),
        Duration::from_millis(100),
    )
    .spawn();

    tokio::time::sleep(Duration::from_millis(350)).await;
    assert!(buffer.is_empty());
    assert_eq!(handle.metrics().tick_failures(), 4);

    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_appends() {
    let buffer = Arc::new(SeriesBuffer::new());
    let handle = Producer::new(
        buffer.clone(),
        Box::new(SineSource::new(0.25, 1.0, 1.0)),
        Duration::from_millis(1000),
    )
    .spawn();

    tokio::time::sleep(Duration::from_millis(2500)).await;
    handle.shutdown().await;
    let stopped_at = buffer.len();
    assert_eq!(stopped_at, 3);

    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(buffer.len(), stopped_at);
}

#[tokio::test(start_paused = true)]
async fn test_dropping_handle_signals_shutdown() {
    let buffer = Arc::new(SeriesBuffer::new());
    let handle = Producer::new(
        buffer.clone(),
        Box::new(FnSource::new("const", |_| Ok(1.0))),
        Duration::from_millis(1000),
    )
    .spawn();

    tokio::time::sleep(Duration::from_millis(1500)).await;
    drop(handle);

    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(buffer.len(), 2);
}
