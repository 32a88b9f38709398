use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::env;
use std::path::Path;
use std::time::Duration;

use crate::core::WindowSpec;
use crate::delivery::{DeliverySettings, DeliveryStrategy, OverflowPolicy};
use crate::error::{LiveError, LiveResult};
use crate::sources::SourceConfig;

/// Runtime configuration
///
/// Read from JSON (camelCase keys), then overlaid by `LIVESERIES_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiveConfig {
    /// Samples shown per viewer
    pub max_points: usize,
    /// Producer tick period
    pub producer_interval_ms: u64,
    pub delivery_strategy: DeliveryStrategy,
    /// Poll period for pull viewers
    pub client_refresh_interval_ms: u64,
    /// Per-viewer queue bound for push delivery
    pub queue_capacity: usize,
    pub overflow_policy: OverflowPolicy,
    /// Samples kept in the buffer; absent keeps full history
    pub retention: Option<usize>,
    pub source: SourceConfig,
    pub bind_addr: String,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            max_points: 30,
            producer_interval_ms: 1000,
            delivery_strategy: DeliveryStrategy::Push,
            client_refresh_interval_ms: 1000,
            queue_capacity: 64,
            overflow_policy: OverflowPolicy::DropOldest,
            retention: None,
            source: SourceConfig::default(),
            bind_addr: "0.0.0.0:8050".to_string(),
        }
    }
}

impl LiveConfig {
    pub fn from_json(value: Value) -> LiveResult<Self> {
        let config: LiveConfig = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> LiveResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LiveConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// File named by `LIVESERIES_CONFIG` (or defaults), then the env overlay
    pub fn from_env() -> LiveResult<Self> {
        let mut config = match env::var("LIVESERIES_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay individual settings from a key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> LiveResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("LIVESERIES_MAX_POINTS") {
            self.max_points = parse_var("LIVESERIES_MAX_POINTS", &v)?;
        }
        if let Some(v) = lookup("LIVESERIES_PRODUCER_INTERVAL_MS") {
            self.producer_interval_ms = parse_var("LIVESERIES_PRODUCER_INTERVAL_MS", &v)?;
        }
        if let Some(v) = lookup("LIVESERIES_DELIVERY_STRATEGY") {
            self.delivery_strategy = match v.trim().to_lowercase().as_str() {
                "push" => DeliveryStrategy::Push,
                "pull" => DeliveryStrategy::Pull,
                other => {
                    return Err(LiveError::InvalidConfig(format!(
                        "LIVESERIES_DELIVERY_STRATEGY must be push or pull, got {}",
                        other
                    )))
                }
            };
        }
        if let Some(v) = lookup("LIVESERIES_CLIENT_REFRESH_MS") {
            self.client_refresh_interval_ms = parse_var("LIVESERIES_CLIENT_REFRESH_MS", &v)?;
        }
        if let Some(v) = lookup("LIVESERIES_BIND_ADDR") {
            self.bind_addr = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> LiveResult<()> {
        if self.max_points == 0 {
            return Err(LiveError::InvalidConfig("maxPoints must be at least 1".into()));
        }
        if self.producer_interval_ms == 0 {
            return Err(LiveError::InvalidConfig("producerIntervalMs must be positive".into()));
        }
        if self.client_refresh_interval_ms == 0 {
            return Err(LiveError::InvalidConfig(
                "clientRefreshIntervalMs must be positive".into(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(LiveError::InvalidConfig("queueCapacity must be at least 1".into()));
        }
        if let Some(retention) = self.retention {
            if retention < self.max_points {
                return Err(LiveError::InvalidConfig(format!(
                    "retention ({}) must hold at least one window ({})",
                    retention, self.max_points
                )));
            }
        }
        if let SourceConfig::Random { min, max, .. } = self.source {
            if !(min < max) {
                return Err(LiveError::InvalidConfig(format!(
                    "random source needs min < max, got [{}, {})",
                    min, max
                )));
            }
        }
        Ok(())
    }

    pub fn producer_interval(&self) -> Duration {
        Duration::from_millis(self.producer_interval_ms)
    }

    pub fn window(&self) -> LiveResult<WindowSpec> {
        WindowSpec::new(self.max_points)
    }

    pub fn delivery_settings(&self) -> LiveResult<DeliverySettings> {
        Ok(DeliverySettings {
            strategy: self.delivery_strategy,
            queue_capacity: self.queue_capacity,
            overflow: self.overflow_policy,
            client_refresh: Duration::from_millis(self.client_refresh_interval_ms),
            window: self.window()?,
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> LiveResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| LiveError::InvalidConfig(format!("{} has invalid value {:?}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = LiveConfig::default();
        assert_eq!(config.max_points, 30);
        assert_eq!(config.producer_interval(), Duration::from_secs(1));
        assert_eq!(config.delivery_strategy, DeliveryStrategy::Push);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_json_partial() {
        let config = LiveConfig::from_json(serde_json::json!({
            "maxPoints": 10,
            "deliveryStrategy": "pull",
            "overflowPolicy": "coalesceLatest",
            "source": {"type": "sine", "frequencyHz": 0.25}
        }))
        .unwrap();

        assert_eq!(config.max_points, 10);
        assert_eq!(config.delivery_strategy, DeliveryStrategy::Pull);
        assert_eq!(config.overflow_policy, OverflowPolicy::CoalesceLatest);
        assert_eq!(config.client_refresh_interval_ms, 1000);
        assert!(matches!(config.source, SourceConfig::Sine { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        for bad in [
            serde_json::json!({"maxPoints": 0}),
            serde_json::json!({"producerIntervalMs": 0}),
            serde_json::json!({"clientRefreshIntervalMs": 0}),
            serde_json::json!({"queueCapacity": 0}),
            serde_json::json!({"retention": 0}),
            serde_json::json!({"retention": 10}),
            serde_json::json!({"source": {"type": "random", "min": 2.0, "max": 1.0}}),
        ] {
            let err = LiveConfig::from_json(bad.clone()).unwrap_err();
            assert!(matches!(err, LiveError::InvalidConfig(_)), "accepted {}", bad);
        }
    }

    #[test]
    fn test_env_overlay() {
        let vars: HashMap<&str, &str> = [
            ("LIVESERIES_MAX_POINTS", "50"),
            ("LIVESERIES_DELIVERY_STRATEGY", "Pull"),
            ("LIVESERIES_BIND_ADDR", "127.0.0.1:9000"),
        ]
        .into_iter()
        .collect();

        let mut config = LiveConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.max_points, 50);
        assert_eq!(config.delivery_strategy, DeliveryStrategy::Pull);
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
        assert_eq!(config.producer_interval_ms, 1000);
    }

    #[test]
    fn test_env_overlay_rejects_garbage() {
        let mut config = LiveConfig::default();
        let result = config.apply_overrides(|key| {
            (key == "LIVESERIES_PRODUCER_INTERVAL_MS").then(|| "soon".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"maxPoints": 12, "retention": 100}}"#).unwrap();

        let config = LiveConfig::from_file(file.path()).unwrap();
        assert_eq!(config.max_points, 12);
        assert_eq!(config.retention, Some(100));
    }
}
