use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use liveseries::config::LiveConfig;
use liveseries::core::SeriesBuffer;
use liveseries::delivery::DeliveryChannel;
use liveseries::engine::Producer;
use liveseries::observability::MetricsCollector;
use liveseries::server::{self, AppState};
use liveseries::sources::create_source;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "liveseries=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = LiveConfig::from_env()?;
    info!(
        "Starting live series: maxPoints={}, interval={}ms, delivery={:?}",
        config.max_points, config.producer_interval_ms, config.delivery_strategy
    );

    let buffer = Arc::new(match config.retention {
        Some(cap) => SeriesBuffer::with_retention(cap),
        None => SeriesBuffer::new(),
    });
    let collector = MetricsCollector::new();
    let channel = DeliveryChannel::new(buffer.clone(), config.delivery_settings()?, collector.clone());

    let source = create_source(&config.source, config.producer_interval())?;
    let producer = Producer::new(buffer, source, config.producer_interval())
        .with_sink(Arc::new(channel.clone()));
    collector.register_producer(producer.metrics());
    let producer = producer.spawn();

    let listener = TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    info!("WebSocket endpoint: ws://{}/ws", config.bind_addr);

    let state = AppState::new(channel.clone());
    let monitor = state.monitor.clone();
    server::serve(listener, state, shutdown_signal()).await?;

    channel.shutdown();
    producer.shutdown().await;
    info!("\n{}", monitor.generate_report());

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
