//! # Prometheus Metrics
//!
//! Operational metrics for the tokenization server, scraped at the
//! `/metrics` endpoint on the configured metrics port.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] so they do not
//! collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the server.
///
/// Clone-friendly (prometheus handles are internally reference-counted) so
/// it can be shared across request handlers.
#[derive(Clone)]
pub struct VaultMetrics {
    /// Registry that owns all metrics below.
    registry: Registry,
    /// Total number of tokens minted.
    pub tokens_issued_total: IntCounter,
    /// Total number of new card records created.
    pub cards_created_total: IntCounter,
    /// Total number of successful redemptions.
    pub redemptions_total: IntCounter,
    /// Total number of failed redemptions (missing, invalid, expired,
    /// dangling card reference, or store failure).
    pub redemption_failures_total: IntCounter,
    /// Total number of tokenization requests rejected by validation.
    pub validation_failures_total: IntCounter,
    /// Histogram of request handling latency in seconds.
    pub request_latency_seconds: Histogram,
}

impl VaultMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("cardvault".into()), None)
            .expect("failed to create prometheus registry");

        let tokens_issued_total =
            IntCounter::new("tokens_issued_total", "Total number of tokens minted")
                .expect("metric creation");
        registry
            .register(Box::new(tokens_issued_total.clone()))
            .expect("metric registration");

        let cards_created_total = IntCounter::new(
            "cards_created_total",
            "Total number of new card records created",
        )
        .expect("metric creation");
        registry
            .register(Box::new(cards_created_total.clone()))
            .expect("metric registration");

        let redemptions_total = IntCounter::new(
            "redemptions_total",
            "Total number of successful token redemptions",
        )
        .expect("metric creation");
        registry
            .register(Box::new(redemptions_total.clone()))
            .expect("metric registration");

        let redemption_failures_total = IntCounter::new(
            "redemption_failures_total",
            "Total number of failed token redemptions",
        )
        .expect("metric creation");
        registry
            .register(Box::new(redemption_failures_total.clone()))
            .expect("metric registration");

        let validation_failures_total = IntCounter::new(
            "validation_failures_total",
            "Total number of tokenization payloads rejected by validation",
        )
        .expect("metric creation");
        registry
            .register(Box::new(validation_failures_total.clone()))
            .expect("metric registration");

        let request_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "request_latency_seconds",
                "End-to-end request handling latency in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(request_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            tokens_issued_total,
            cards_created_total,
            redemptions_total,
            redemption_failures_total,
            validation_failures_total,
            request_latency_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for VaultMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<VaultMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_appear_in_exposition() {
        let metrics = VaultMetrics::new();
        metrics.tokens_issued_total.inc();
        metrics.redemptions_total.inc();
        metrics.redemptions_total.inc();

        let body = metrics.encode().expect("encode");
        assert!(body.contains("cardvault_tokens_issued_total 1"));
        assert!(body.contains("cardvault_redemptions_total 2"));
    }
}
