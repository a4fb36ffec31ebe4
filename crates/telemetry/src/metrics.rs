//! Prometheus metrics for the explorer refresh loop.

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntGauge, Registry,
    Encoder, TextEncoder,
};

/// Metrics collector for the explorer.
///
/// Each instance owns its registry, so independent instances never clash.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    refreshes: IntCounter,
    refresh_errors: IntCounter,
    hosts_normalized: IntCounter,
    active_hosts: IntGauge,
    tip_height: IntGauge,
    api_latency: HistogramVec,
}

impl Metrics {
    /// Create a new metrics instance.
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let refreshes = IntCounter::new(
            "dartsia_refreshes_total",
            "Total number of completed refresh cycles",
        )?;
        let refresh_errors = IntCounter::new(
            "dartsia_refresh_errors_total",
            "Total number of failed refresh cycles",
        )?;
        let hosts_normalized = IntCounter::new(
            "dartsia_hosts_normalized_total",
            "Total number of host records normalized",
        )?;
        let active_hosts = IntGauge::new(
            "dartsia_active_hosts",
            "Hosts seen within the active freshness window at the last refresh",
        )?;
        let tip_height = IntGauge::new(
            "dartsia_tip_height",
            "Chain tip height at the last refresh",
        )?;
        let api_latency = HistogramVec::new(
            HistogramOpts::new(
                "dartsia_api_latency_seconds",
                "Explorer API call latency in seconds",
            ),
            &["operation"],
        )?;

        registry.register(Box::new(refreshes.clone()))?;
        registry.register(Box::new(refresh_errors.clone()))?;
        registry.register(Box::new(hosts_normalized.clone()))?;
        registry.register(Box::new(active_hosts.clone()))?;
        registry.register(Box::new(tip_height.clone()))?;
        registry.register(Box::new(api_latency.clone()))?;

        Ok(Self {
            registry,
            refreshes,
            refresh_errors,
            hosts_normalized,
            active_hosts,
            tip_height,
            api_latency,
        })
    }

    pub fn inc_refreshes(&self) {
        self.refreshes.inc();
    }

    pub fn inc_refresh_errors(&self) {
        self.refresh_errors.inc();
    }

    pub fn inc_hosts_normalized(&self, count: u64) {
        self.hosts_normalized.inc_by(count);
    }

    pub fn set_active_hosts(&self, count: u64) {
        self.active_hosts.set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    pub fn set_tip_height(&self, height: u64) {
        self.tip_height.set(i64::try_from(height).unwrap_or(i64::MAX));
    }

    /// Record API call latency.
    pub fn observe_api_latency(&self, operation: &str, duration_secs: f64) {
        self.api_latency.with_label_values(&[operation]).observe(duration_secs);
    }

    /// Get Prometheus metrics in text exposition format.
    pub fn gather(&self) -> anyhow::Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
