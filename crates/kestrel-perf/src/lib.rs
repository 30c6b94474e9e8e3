//! Kestrel Performance Instrumentation
//!
//! Records app and activity lifecycle transitions during startup so slow or
//! unusual startup paths can be diagnosed from a debug log.

mod lifecycle;
mod startup_log;

pub use lifecycle::{
    ActivityLifecycleCallbacks, ActivityLifecycleHost, AppLifecycle, AppLifecycleObserver,
    LifecycleRegistry,
};
pub use startup_log::{LogEntry, StartupActivityLog};
