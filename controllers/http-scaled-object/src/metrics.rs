//! Prometheus metrics for the reconciliation loop.

use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::time::Duration;

/// Reconcile metrics, registered in their own registry
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    reconcile_total: IntCounterVec,
    legacy_purged_total: IntCounter,
    reconcile_duration: Histogram,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let reconcile_total = IntCounterVec::new(
            Opts::new("httpso_reconcile_total", "HTTPScaledObject reconciliations by result"),
            &["result"],
        )?;
        let legacy_purged_total = IntCounter::new(
            "httpso_legacy_purged_total",
            "Legacy <name>-app ScaledObjects deleted",
        )?;
        let reconcile_duration = Histogram::with_opts(HistogramOpts::new(
            "httpso_reconcile_duration_seconds",
            "Time spent reconciling one HTTPScaledObject",
        ))?;

        registry.register(Box::new(reconcile_total.clone()))?;
        registry.register(Box::new(legacy_purged_total.clone()))?;
        registry.register(Box::new(reconcile_duration.clone()))?;

        Ok(Self {
            registry,
            reconcile_total,
            legacy_purged_total,
            reconcile_duration,
        })
    }

    /// Records one finished reconciliation
    pub fn observe_reconcile(&self, success: bool, elapsed: Duration) {
        let result = if success { "success" } else { "error" };
        self.reconcile_total.with_label_values(&[result]).inc();
        self.reconcile_duration.observe(elapsed.as_secs_f64());
    }

    pub fn inc_legacy_purged(&self) {
        self.legacy_purged_total.inc();
    }

    /// Renders the registry in the Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
