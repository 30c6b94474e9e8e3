//! Main browser container
//!
//! Owns the state store and everything the telemetry middleware reports to.

use std::sync::Arc;

use kestrel_perf::{LifecycleRegistry, StartupActivityLog};
use kestrel_state::{
    create_tab, BrowserAction, BrowserState, EngineAction, Middleware, Store, TabListAction,
};
use kestrel_storage::Database;
use kestrel_telemetry::{
    Clock, MetricsRegistry, MetricsSnapshot, SearchAdsTelemetry, SearchProvider, Settings,
    SystemClock, TelemetryMiddleware,
};

use crate::config::Config;
use crate::Result;

const SEARCH_PROVIDERS: &str = "search_providers";

pub struct Browser {
    /// Configuration
    config: Config,
    /// Browser state store; every change goes through `dispatch`
    store: Store,
    settings: Settings,
    metrics: Arc<MetricsRegistry>,
    ads_telemetry: Arc<SearchAdsTelemetry>,
    clock: Arc<dyn Clock>,
    startup_log: Arc<StartupActivityLog>,
    /// Shell lifecycle fan-out
    lifecycle: LifecycleRegistry,
    activity_lifecycle: LifecycleRegistry,
}

impl Browser {
    /// Open the configured database and build the browser around it
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        Self::with_database(config, db, Arc::new(SystemClock))
    }

    pub fn with_database(config: Config, db: Database, clock: Arc<dyn Clock>) -> Result<Self> {
        let settings = Settings::new(db.clone());
        let metrics = Arc::new(MetricsRegistry::new());

        // A persisted provider list overrides the configured one
        let providers = match db.get_json_setting::<Vec<SearchProvider>>(SEARCH_PROVIDERS)? {
            Some(providers) => {
                tracing::debug!(count = providers.len(), "Using stored search providers");
                providers
            }
            None => config.search_providers.clone(),
        };
        let ads_telemetry = Arc::new(SearchAdsTelemetry::with_providers(db, providers));

        let mut middleware: Vec<Box<dyn Middleware>> = Vec::new();
        if config.telemetry_enabled {
            middleware.push(Box::new(TelemetryMiddleware::new(
                settings.clone(),
                ads_telemetry.clone(),
                metrics.clone(),
                metrics.clone(),
                clock.clone(),
            )));
        } else {
            tracing::info!("Telemetry disabled");
        }
        let store = Store::with_middleware(BrowserState::default(), middleware);

        let startup_log = Arc::new(StartupActivityLog::new());
        let mut lifecycle = LifecycleRegistry::new();
        let mut activity_lifecycle = LifecycleRegistry::new();
        startup_log.register_in_app_on_create(&mut activity_lifecycle, &mut lifecycle);

        tracing::info!(
            previous_open_tabs = settings.open_tabs_count().unwrap_or_default(),
            telemetry = config.telemetry_enabled,
            "Browser initialized"
        );

        Ok(Self {
            config,
            store,
            settings,
            metrics,
            ads_telemetry,
            clock,
            startup_log,
            lifecycle,
            activity_lifecycle,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // === State ===

    pub fn dispatch(&self, action: impl Into<BrowserAction>) {
        self.store.dispatch(action);
    }

    pub fn state(&self) -> BrowserState {
        self.store.state()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Open a tab, select it and attach an engine session
    pub fn open_tab(&self, url: &str, private: bool) -> Result<String> {
        let tab = create_tab(url, private)?;
        let tab_id = tab.id.clone();

        self.dispatch(TabListAction::AddTab { tab, select: true });
        self.dispatch(EngineAction::LinkEngineSession {
            session_id: tab_id.clone(),
            timestamp: self.clock.elapsed_realtime_millis(),
        });

        tracing::info!(tab_id = %tab_id, private, "Opened tab");
        Ok(tab_id)
    }

    pub fn close_tab(&self, tab_id: &str) -> Result<()> {
        self.store.with_state(|state| state.require_tab(tab_id).map(|_| ()))?;
        self.dispatch(TabListAction::RemoveTab {
            tab_id: tab_id.to_string(),
        });
        Ok(())
    }

    /// Reclaim a tab's engine session, e.g. under memory pressure
    pub fn kill_engine_session(&self, tab_id: &str) -> Result<()> {
        self.store.with_state(|state| state.require_tab(tab_id).map(|_| ()))?;
        self.dispatch(EngineAction::KillEngineSession {
            session_id: tab_id.to_string(),
        });
        Ok(())
    }

    // === Telemetry ===

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn ad_clicks(&self, provider: &str) -> Result<u64> {
        Ok(self.ads_telemetry.ad_clicks(provider)?)
    }

    pub fn open_tabs_count(&self) -> Result<usize> {
        Ok(self.settings.open_tabs_count()?)
    }

    // === Lifecycle ===

    pub fn app_lifecycle(&self) -> &LifecycleRegistry {
        &self.lifecycle
    }

    pub fn activity_lifecycle(&self) -> &LifecycleRegistry {
        &self.activity_lifecycle
    }

    pub fn startup_log(&self) -> &StartupActivityLog {
        &self.startup_log
    }
}
