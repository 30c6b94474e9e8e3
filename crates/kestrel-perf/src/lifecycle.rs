//! Lifecycle observer seams
//!
//! The embedding shell reports app foreground/background transitions and
//! activity (screen) transitions through a [`LifecycleRegistry`].

use std::sync::Arc;

/// Whole-app foreground/background transitions
pub trait AppLifecycleObserver: Send + Sync {
    fn on_start(&self);
    fn on_stop(&self);
}

/// Per-activity transitions; `activity` is the activity's type name
pub trait ActivityLifecycleCallbacks: Send + Sync {
    fn on_activity_created(&self, activity: &str);
    fn on_activity_started(&self, activity: &str);
    fn on_activity_stopped(&self, activity: &str);
}

pub trait ActivityLifecycleHost {
    fn register_activity_lifecycle_callbacks(
        &mut self,
        callbacks: Arc<dyn ActivityLifecycleCallbacks>,
    );
}

pub trait AppLifecycle {
    fn add_observer(&mut self, observer: Arc<dyn AppLifecycleObserver>);
}

/// Fans lifecycle transitions out to every registered observer
#[derive(Default)]
pub struct LifecycleRegistry {
    app_observers: Vec<Arc<dyn AppLifecycleObserver>>,
    activity_callbacks: Vec<Arc<dyn ActivityLifecycleCallbacks>>,
}

impl LifecycleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn app_started(&self) {
        tracing::debug!("App started");
        for observer in self.app_observers.iter() {
            observer.on_start();
        }
    }

    pub fn app_stopped(&self) {
        tracing::debug!("App stopped");
        for observer in self.app_observers.iter() {
            observer.on_stop();
        }
    }

    pub fn activity_created(&self, activity: &str) {
        for callbacks in self.activity_callbacks.iter() {
            callbacks.on_activity_created(activity);
        }
    }

    pub fn activity_started(&self, activity: &str) {
        for callbacks in self.activity_callbacks.iter() {
            callbacks.on_activity_started(activity);
        }
    }

    pub fn activity_stopped(&self, activity: &str) {
        for callbacks in self.activity_callbacks.iter() {
            callbacks.on_activity_stopped(activity);
        }
    }

    pub fn observer_count(&self) -> usize {
        self.app_observers.len() + self.activity_callbacks.len()
    }
}

impl ActivityLifecycleHost for LifecycleRegistry {
    fn register_activity_lifecycle_callbacks(
        &mut self,
        callbacks: Arc<dyn ActivityLifecycleCallbacks>,
    ) {
        self.activity_callbacks.push(callbacks);
    }
}

impl AppLifecycle for LifecycleRegistry {
    fn add_observer(&mut self, observer: Arc<dyn AppLifecycleObserver>) {
        self.app_observers.push(observer);
    }
}
