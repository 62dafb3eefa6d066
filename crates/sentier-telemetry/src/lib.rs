//! Observability for the sentier router.
//!
//! This crate provides:
//! - Structured JSON or pretty logging on stderr
//! - Standard event names and `log_*!` macros
//! - A Prometheus metrics registry and text exposition
//!
//! # Usage
//!
//! ```ignore
//! use sentier_telemetry::{Telemetry, TelemetryConfig};
//!
//! let config = TelemetryConfig::new().with_log_level("debug");
//! let telemetry = Telemetry::init(config)?;
//! println!("{}", telemetry.render_prometheus());
//! ```

pub mod config;
pub mod logging;
pub mod metrics;
pub mod prometheus;

pub use config::{LogFormat, TelemetryConfig};
pub use logging::events;
pub use metrics::MetricsRegistry;

use std::sync::Arc;
use thiserror::Error;

/// Telemetry errors.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Failed to initialize logging.
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),
}

/// Main telemetry handle.
pub struct Telemetry {
    config: TelemetryConfig,
    metrics: Arc<MetricsRegistry>,
}

impl Telemetry {
    /// Initialize logging and create the metrics registry.
    pub fn init(config: TelemetryConfig) -> Result<Self, TelemetryError> {
        logging::init_logging(&config)?;
        Ok(Self::init_without_logging(config))
    }

    /// Create the metrics registry without touching the global subscriber.
    ///
    /// Use this when logging is already initialized (e.g., in tests).
    pub fn init_without_logging(config: TelemetryConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(MetricsRegistry::new()),
        }
    }

    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Get a cloned Arc reference to the metrics registry.
    pub fn metrics_clone(&self) -> Arc<MetricsRegistry> {
        Arc::clone(&self.metrics)
    }

    /// Render metrics in Prometheus text format.
    pub fn render_prometheus(&self) -> String {
        prometheus::render_metrics(&self.metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "sentier");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_config_builder() {
        let config = TelemetryConfig::new()
            .with_service_name("routes-check")
            .with_log_level("debug")
            .with_log_format(LogFormat::Pretty);

        assert_eq!(config.service_name, "routes-check");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_telemetry_init_without_logging() {
        let telemetry = Telemetry::init_without_logging(TelemetryConfig::default());
        assert!(telemetry.render_prometheus().contains("sentier_routers_built"));
    }
}
