//! Kestrel Core
//!
//! Wires the browser state store, the telemetry middleware and its sinks,
//! persistent settings and the startup log into one [`Browser`].

mod browser;
mod config;
mod error;

pub use browser::Browser;
pub use config::Config;
pub use error::CoreError;

// Re-export core components
pub use kestrel_perf::{LifecycleRegistry, LogEntry, StartupActivityLog};
pub use kestrel_state::{
    BrowserAction, BrowserState, ContentAction, CustomTabListAction, DownloadAction,
    DownloadState, EngineAction, LoadRequestState, SessionState, Store, TabListAction,
};
pub use kestrel_storage::{Database, StorageError};
pub use kestrel_telemetry::{
    Clock, Event, ManualClock, MetricsSnapshot, SearchProvider, SystemClock, TabKillLabel,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging. `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &Config) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if fmt().with_env_filter(filter).with_target(true).try_init().is_err() {
        tracing::debug!("Logging already initialized");
    }
}
