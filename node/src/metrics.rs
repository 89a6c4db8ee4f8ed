//! # Prometheus Metrics
//!
//! Operational metrics for the ledger node, scraped at the `/metrics` HTTP
//! endpoint on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the node.
///
/// Clone-friendly (wraps `Arc` internally via prometheus handles) so it can
/// be shared across request handlers.
#[derive(Clone)]
pub struct NodeMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total number of wallets issued by this node.
    pub wallets_created_total: IntCounter,
    /// Total number of wallet transfers committed to the ledger.
    pub transfers_committed_total: IntCounter,
    /// Total number of transfers rejected (any pipeline failure).
    pub transfers_rejected_total: IntCounter,
    /// Total number of records inserted by sync reconciliation
    /// (wallet transfers and POS sales combined).
    pub records_synced_total: IntCounter,
    /// Total number of POS sales recorded, including linked wallet sales.
    pub sales_recorded_total: IntCounter,
    /// Current number of wallets known to the ledger.
    pub wallet_count: IntGauge,
    /// Histogram of transfer processing latency in seconds.
    pub transfer_latency_seconds: Histogram,
}

impl NodeMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("wavepay".into()), None)
            .expect("failed to create prometheus registry");

        let wallets_created_total = IntCounter::new(
            "wallets_created_total",
            "Total number of wallets issued by this node",
        )
        .expect("metric creation");
        registry
            .register(Box::new(wallets_created_total.clone()))
            .expect("metric registration");

        let transfers_committed_total = IntCounter::new(
            "transfers_committed_total",
            "Total number of wallet transfers committed to the ledger",
        )
        .expect("metric creation");
        registry
            .register(Box::new(transfers_committed_total.clone()))
            .expect("metric registration");

        let transfers_rejected_total = IntCounter::new(
            "transfers_rejected_total",
            "Total number of wallet transfers rejected before commit",
        )
        .expect("metric creation");
        registry
            .register(Box::new(transfers_rejected_total.clone()))
            .expect("metric registration");

        let records_synced_total = IntCounter::new(
            "records_synced_total",
            "Total number of records inserted by offline-sync reconciliation",
        )
        .expect("metric creation");
        registry
            .register(Box::new(records_synced_total.clone()))
            .expect("metric registration");

        let sales_recorded_total = IntCounter::new(
            "sales_recorded_total",
            "Total number of POS sales recorded",
        )
        .expect("metric creation");
        registry
            .register(Box::new(sales_recorded_total.clone()))
            .expect("metric registration");

        let wallet_count = IntGauge::new("wallet_count", "Number of wallets known to the ledger")
            .expect("metric creation");
        registry
            .register(Box::new(wallet_count.clone()))
            .expect("metric registration");

        let transfer_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "transfer_latency_seconds",
                "End-to-end transfer processing latency in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(transfer_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            wallets_created_total,
            transfers_committed_total,
            transfers_rejected_total,
            records_synced_total,
            sales_recorded_total,
            wallet_count,
            transfer_latency_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<NodeMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
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
    fn metrics_encode_includes_registered_counters() {
        let metrics = NodeMetrics::new();
        metrics.wallets_created_total.inc();
        metrics.transfers_committed_total.inc_by(3);
        metrics.wallet_count.set(2);

        let text = metrics.encode().unwrap();
        assert!(text.contains("wavepay_wallets_created_total 1"));
        assert!(text.contains("wavepay_transfers_committed_total 3"));
        assert!(text.contains("wavepay_wallet_count 2"));
    }
}
