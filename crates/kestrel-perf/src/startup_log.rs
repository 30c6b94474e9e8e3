//! Startup activity log
//!
//! An append-only list of lifecycle transitions. Rendering the list is only
//! worth it when someone is reading debug output, so `log_entries` skips the
//! work at any other level.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::Level;

use crate::lifecycle::{
    ActivityLifecycleCallbacks, ActivityLifecycleHost, AppLifecycle, AppLifecycleObserver,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "activity", rename_all = "snake_case")]
pub enum LogEntry {
    AppStarted,
    AppStopped,
    ActivityCreated(String),
    ActivityStarted(String),
    ActivityStopped(String),
}

impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogEntry::AppStarted => write!(f, "app-started"),
            LogEntry::AppStopped => write!(f, "app-stopped"),
            LogEntry::ActivityCreated(name) => write!(f, "{}-created", name),
            LogEntry::ActivityStarted(name) => write!(f, "{}-started", name),
            LogEntry::ActivityStopped(name) => write!(f, "{}-stopped", name),
        }
    }
}

#[derive(Debug, Default)]
pub struct StartupActivityLog {
    log: Mutex<Vec<LogEntry>>,
}

impl StartupActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hook the log into the app and activity lifecycles. Call once, while
    /// the application is being created.
    pub fn register_in_app_on_create(
        self: &Arc<Self>,
        app: &mut dyn ActivityLifecycleHost,
        lifecycle: &mut dyn AppLifecycle,
    ) {
        app.register_activity_lifecycle_callbacks(self.clone());
        lifecycle.add_observer(self.clone());
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.log.lock().clone()
    }

    /// Emit the whole log through `tracing` at debug level.
    /// Returns whether anything was emitted.
    pub fn log_entries(&self, level: Level) -> bool {
        if level != Level::DEBUG {
            return false;
        }

        let rendered = self
            .log
            .lock()
            .iter()
            .map(|entry| entry.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        tracing::debug!(entries = %rendered, "Startup activity log");
        true
    }

    fn push(&self, entry: LogEntry) {
        self.log.lock().push(entry);
    }
}

impl AppLifecycleObserver for StartupActivityLog {
    fn on_start(&self) {
        self.push(LogEntry::AppStarted);
    }

    fn on_stop(&self) {
        self.push(LogEntry::AppStopped);
    }
}

impl ActivityLifecycleCallbacks for StartupActivityLog {
    fn on_activity_created(&self, activity: &str) {
        self.push(LogEntry::ActivityCreated(activity.to_string()));
    }

    fn on_activity_started(&self, activity: &str) {
        self.push(LogEntry::ActivityStarted(activity.to_string()));
    }

    fn on_activity_stopped(&self, activity: &str) {
        self.push(LogEntry::ActivityStopped(activity.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::LifecycleRegistry;

    #[test]
    fn test_register_adds_both_observers() {
        let log = Arc::new(StartupActivityLog::new());
        let mut registry = LifecycleRegistry::new();
        let mut app_lifecycle = LifecycleRegistry::new();

        log.register_in_app_on_create(&mut registry, &mut app_lifecycle);

        assert_eq!(registry.observer_count(), 1);
        assert_eq!(app_lifecycle.observer_count(), 1);
    }

    #[test]
    fn test_app_transitions_are_appended() {
        let log = StartupActivityLog::new();
        assert!(log.entries().is_empty());

        log.on_start();
        assert_eq!(log.entries(), vec![LogEntry::AppStarted]);

        log.on_stop();
        assert_eq!(log.entries(), vec![LogEntry::AppStarted, LogEntry::AppStopped]);
    }

    #[test]
    fn test_activity_transitions_are_appended() {
        let log = StartupActivityLog::new();
        let mut expected = Vec::new();

        log.on_activity_created("HomeActivity");
        expected.push(LogEntry::ActivityCreated("HomeActivity".to_string()));
        assert_eq!(log.entries(), expected);

        log.on_activity_started("HomeActivity");
        expected.push(LogEntry::ActivityStarted("HomeActivity".to_string()));
        assert_eq!(log.entries(), expected);

        log.on_activity_stopped("HomeActivity");
        expected.push(LogEntry::ActivityStopped("HomeActivity".to_string()));
        assert_eq!(log.entries(), expected);
    }

    #[test]
    fn test_registry_drives_registered_log() {
        let log = Arc::new(StartupActivityLog::new());
        let mut registry = LifecycleRegistry::new();
        let mut app_lifecycle = LifecycleRegistry::new();
        log.register_in_app_on_create(&mut registry, &mut app_lifecycle);

        app_lifecycle.app_started();
        registry.activity_created("IntentReceiverActivity");
        registry.activity_started("IntentReceiverActivity");

        assert_eq!(
            log.entries(),
            vec![
                LogEntry::AppStarted,
                LogEntry::ActivityCreated("IntentReceiverActivity".to_string()),
                LogEntry::ActivityStarted("IntentReceiverActivity".to_string()),
            ]
        );
    }

    #[test]
    fn test_log_entries_only_at_debug() {
        let log = StartupActivityLog::new();
        log.on_start();

        assert!(log.log_entries(Level::DEBUG));
        assert!(!log.log_entries(Level::INFO));
        assert!(!log.log_entries(Level::TRACE));
    }

    #[test]
    fn test_entry_json() {
        let json = serde_json::to_value(LogEntry::ActivityStopped("Home".to_string())).unwrap();
        assert_eq!(json["type"], "activity_stopped");
        assert_eq!(json["activity"], "Home");
        assert_eq!(LogEntry::AppStarted.to_string(), "app-started");
    }
}
