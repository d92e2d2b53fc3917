//! Shared application state for the tally gateway.
//!
//! Owns the config, the counter registry and the metrics; cheap to clone into
//! every handler.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tally_core::error::{Result, TallyError};
use tally_core::protocol::command::{Command, Reply};

use crate::config::GatewayConfig;
use crate::dispatch;
use crate::obs::metrics::GatewayMetrics;
use crate::registry::CounterRegistry;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    registry: Arc<CounterRegistry>,
    metrics: Arc<GatewayMetrics>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    session_seq: AtomicU64,
}

impl AppState {
    /// Build application state and create the configured counters.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: GatewayConfig) -> Result<Self> {
        let registry = Arc::new(CounterRegistry::new(cfg.registry.max_instances));

        for seed in &cfg.counters {
            registry.create(Some(&seed.id)).map_err(|e| {
                TallyError::BadRequest(format!("counter seed failed (id={}): {e}", seed.id))
            })?;
        }
        tracing::debug!(seeded = registry.len(), "registry ready");

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                session_seq: AtomicU64::new(1),
            }),
            registry,
            metrics: Arc::new(GatewayMetrics::default()),
        })
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> Arc<CounterRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn metrics(&self) -> Arc<GatewayMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Run one command against this gateway's registry.
    pub fn execute(&self, cmd: Command) -> Reply {
        dispatch::execute(&self.registry, &self.metrics, cmd)
    }

    pub fn next_session_id(&self) -> u64 {
        self.inner.session_seq.fetch_add(1, Ordering::Relaxed)
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }

    pub fn set_draining(&self) {
        self.metrics.set_draining();
    }

    /// Gauges computed at scrape time.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        vec![
            ("tally_counters", self.registry.len() as u64),
            ("tally_registry_capacity", self.registry.max_instances() as u64),
        ]
    }
}
