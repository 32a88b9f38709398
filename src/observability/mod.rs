pub mod metrics;
pub mod collector;
pub mod monitor;

pub use metrics::{ProducerMetrics, SessionMetrics};
pub use collector::{MetricsCollector, ProducerSnapshot, SessionSnapshot};
pub use monitor::DeliveryMonitor;
