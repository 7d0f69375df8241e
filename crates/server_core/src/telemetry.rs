//! Telemetry bootstrap for the companion service (tracing + optional Prometheus metrics).
//!
//! Library code logs through `log`; the subscriber installed here bridges those
//! records so one filter governs both.

use anyhow::{Context, Result};
use data_runtime::configs::telemetry::TelemetryCfg;

/// Keeps telemetry alive for the lifetime of the host.
pub struct TelemetryGuard {
    pub metrics_addr: Option<std::net::SocketAddr>,
}

pub fn init_telemetry(cfg: &TelemetryCfg) -> Result<TelemetryGuard> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};
    let level = cfg.log_level.clone().unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = if cfg.json_logs.unwrap_or(false) { fmt::layer().json().boxed() } else { fmt::layer().boxed() };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .context("install tracing subscriber")?;

    let mut metrics_addr = None;
    if let Some(addr) = &cfg.metrics_addr {
        let addr = match addr.parse() {
            Ok(a) => a,
            Err(_) => {
                metrics::counter!("companions.errors_total", "site" => "telemetry.parse_addr").increment(1);
                tracing::warn!(target: "telemetry", %addr, "bad metrics address, falling back to 127.0.0.1:9100");
                std::net::SocketAddr::from(([127, 0, 0, 1], 9100))
            }
        };
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("install prometheus exporter")?;
        metrics_addr = Some(addr);
    }
    tracing::info!(
        target: "telemetry",
        log_level = %level,
        json_logs = ?cfg.json_logs,
        metrics_addr = ?cfg.metrics_addr,
        "telemetry initialized"
    );
    Ok(TelemetryGuard { metrics_addr })
}
