//! # HTTP Gateway
//!
//! Serves the dashboard views and the JSON API. Handlers receive an
//! explicitly constructed [`AppContext`] as axum state; the background log
//! generator is owned by the same context and stopped through its
//! cancellation token.

mod server;
mod views;

pub use server::{
    ChartPayload, ExecuteActionRequest, StatsPayload, router as gateway_router, serve,
};
pub use views::{CHART_TYPES, Views, asset};

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::actions::ActionCatalog;
use crate::config::{GeneratorConfig, SocConfig};
use crate::error::SocError;
use crate::generator::LogGenerator;
use crate::metrics::{MetricsSource, RandomMetrics};
use crate::scenarios::ScenarioCatalog;
use crate::storage::Storage;

/// Everything a request handler needs, passed explicitly as router state.
#[derive(Clone)]
pub struct AppContext {
    pub storage: Storage,
    pub scenarios: Arc<ScenarioCatalog>,
    pub actions: Arc<ActionCatalog>,
    pub metrics: Arc<dyn MetricsSource>,
    pub views: Arc<Views>,
    /// Maximum rows returned by `/api/logs`.
    pub recent_log_limit: usize,
    /// Directory served under `/static`.
    pub static_dir: Option<PathBuf>,
    shutdown: CancellationToken,
    generator: Arc<Mutex<Option<JoinHandle<()>>>>,
    started_at: DateTime<Utc>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("storage", &self.storage)
            .field("scenarios", &self.scenarios.len())
            .field("actions", &self.actions.len())
            .field("recent_log_limit", &self.recent_log_limit)
            .field("shutdown", &self.shutdown.is_cancelled())
            .finish()
    }
}

impl AppContext {
    /// Context with built-in catalogs and random metrics.
    pub fn new(storage: Storage) -> Result<Self, SocError> {
        Ok(Self {
            storage,
            scenarios: Arc::new(ScenarioCatalog::builtin()),
            actions: Arc::new(ActionCatalog::builtin()),
            metrics: Arc::new(RandomMetrics::new()),
            views: Arc::new(Views::new()?),
            recent_log_limit: 30,
            static_dir: None,
            shutdown: CancellationToken::new(),
            generator: Arc::new(Mutex::new(None)),
            started_at: Utc::now(),
        })
    }

    /// Build the context from configuration and prepare the database.
    pub fn from_config(config: &SocConfig) -> Result<Self, SocError> {
        let storage = Storage::from_config(&config.storage);
        storage.initialize()?;
        if config.storage.seed_sample_logs {
            let seeded = storage.seed_sample_logs()?;
            if seeded > 0 {
                info!(rows = seeded, "Seeded sample logs");
            }
        }

        let mut ctx = Self::new(storage)?
            .with_scenarios(ScenarioCatalog::with_extra(&config.scenarios))
            .with_actions(ActionCatalog::with_extra(&config.actions));
        ctx.recent_log_limit = config.api.recent_log_limit;
        ctx.static_dir = config.server.static_dir.clone();
        Ok(ctx)
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn MetricsSource>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_scenarios(mut self, scenarios: ScenarioCatalog) -> Self {
        self.scenarios = Arc::new(scenarios);
        self
    }

    pub fn with_actions(mut self, actions: ActionCatalog) -> Self {
        self.actions = Arc::new(actions);
        self
    }

    /// Token cancelled by [`AppContext::shutdown`].
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn uptime_secs(&self) -> u64 {
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_seconds().max(0) as u64
    }

    /// Start the background log generator. A second call while one is
    /// running is ignored.
    pub fn start_generator(&self, config: &GeneratorConfig) -> bool {
        let mut slot = self
            .generator
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slot.as_ref().is_some_and(|h| !h.is_finished()) {
            warn!("Background log generator already running");
            return false;
        }
        let handle = LogGenerator::new(self.storage.clone(), config)
            .spawn(self.shutdown.child_token());
        *slot = Some(handle);
        true
    }

    pub fn generator_running(&self) -> bool {
        self.generator
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|h| !h.is_finished()))
            .unwrap_or(false)
    }

    /// Signal the generator and the server to stop.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Signal shutdown and wait for the generator task to exit.
    pub async fn shutdown_and_wait(&self) {
        self.shutdown();
        let handle = self
            .generator
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Background log generator ended abnormally");
        }
    }
}
