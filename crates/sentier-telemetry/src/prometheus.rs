//! Prometheus text exposition format rendering.

use crate::MetricsRegistry;
use prometheus_client::encoding::text::encode;

/// Render the metrics registry to Prometheus text format.
pub fn render_metrics(registry: &MetricsRegistry) -> String {
    let mut buffer = String::new();
    encode(&mut buffer, &registry.registry).expect("encoding metrics should not fail");
    buffer
}
