use prometheus_client::{
    metrics::{counter::Counter, gauge::Gauge},
    registry::Registry,
};
use std::sync::atomic::AtomicU64;

/// Engine counters. Clones share the same underlying values.
#[derive(Clone, Debug, Default)]
pub struct Metrics {
    pub sessions_started: Counter<u64, AtomicU64>,
    pub rejections: Counter<u64, AtomicU64>,
    pub settlements: Counter<u64, AtomicU64>,
    pub settlement_retries: Counter<u64, AtomicU64>,
    pub held_settlements: Gauge,
    pub faults: Counter<u64, AtomicU64>,
    pub active_sessions: Gauge,
}

impl Metrics {
    pub fn register(&self, registry: &mut Registry) {
        registry.register(
            "sessions_started",
            "Sessions admitted past every precondition.",
            self.sessions_started.clone(),
        );
        registry.register(
            "session_rejections",
            "Start requests rejected before a session was created.",
            self.rejections.clone(),
        );
        registry.register(
            "settlements",
            "Outcomes settled, including no-op settlements.",
            self.settlements.clone(),
        );
        registry.register(
            "settlement_retries",
            "Store writes retried during settlement.",
            self.settlement_retries.clone(),
        );
        registry.register(
            "held_settlements",
            "Outcomes waiting for a store retry.",
            self.held_settlements.clone(),
        );
        registry.register(
            "session_faults",
            "Sessions ended by an internal fault.",
            self.faults.clone(),
        );
        registry.register(
            "active_sessions",
            "Live sessions holding a scope.",
            self.active_sessions.clone(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus_client::encoding::text::encode;

    #[test]
    fn test_registered_metrics_encode() {
        let metrics = Metrics::default();
        let mut registry = Registry::default();
        metrics.register(&mut registry);
        metrics.sessions_started.inc();
        metrics.active_sessions.set(2);

        let mut out = String::new();
        encode(&mut out, &registry).unwrap();
        assert!(out.contains("sessions_started_total 1"));
        assert!(out.contains("active_sessions 2"));
    }
}
