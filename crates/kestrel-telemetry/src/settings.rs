//! Persisted application settings used by telemetry

use parking_lot::RwLock;
use std::sync::Arc;

use kestrel_storage::Database;

use crate::error::TelemetryError;
use crate::Result;

const OPEN_TABS_COUNT: &str = "open_tabs_count";

/// Settings store with a write-through in-memory cache
pub struct Settings {
    db: Database,
    open_tabs_count: Arc<RwLock<Option<usize>>>,
}

impl Settings {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            open_tabs_count: Arc::new(RwLock::new(None)),
        }
    }

    /// Last persisted number of open normal tabs
    pub fn open_tabs_count(&self) -> Result<usize> {
        if let Some(count) = *self.open_tabs_count.read() {
            return Ok(count);
        }

        let count = match self.db.get_setting(OPEN_TABS_COUNT)? {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| TelemetryError::InvalidSetting {
                    key: OPEN_TABS_COUNT.to_string(),
                    value: raw.clone(),
                })?,
            None => 0,
        };

        *self.open_tabs_count.write() = Some(count);
        Ok(count)
    }

    pub fn set_open_tabs_count(&self, count: usize) -> Result<()> {
        self.db.set_setting(OPEN_TABS_COUNT, &count.to_string())?;
        *self.open_tabs_count.write() = Some(count);
        Ok(())
    }
}

impl Clone for Settings {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            open_tabs_count: Arc::clone(&self.open_tabs_count),
        }
    }
}
