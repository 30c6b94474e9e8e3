//! Telemetry events and sink traits

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Event {
    /// A non-private page finished loading
    UriOpened,
    DownloadAdded,
    HaveOpenTabs,
    HaveNoOpenTabs,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::UriOpened => "uri_opened",
            Event::DownloadAdded => "download_added",
            Event::HaveOpenTabs => "have_open_tabs",
            Event::HaveNoOpenTabs => "have_no_open_tabs",
        }
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether a killed engine session belonged to the selected tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TabKillLabel {
    Foreground,
    Background,
}

impl TabKillLabel {
    pub fn from_selected(is_selected: bool) -> Self {
        if is_selected {
            TabKillLabel::Foreground
        } else {
            TabKillLabel::Background
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TabKillLabel::Foreground => "foreground",
            TabKillLabel::Background => "background",
        }
    }
}

impl std::fmt::Display for TabKillLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fire-and-forget event sink
pub trait MetricController: Send + Sync {
    fn track(&self, event: Event);
}

/// Engine session kill statistics
pub trait EngineMetrics: Send + Sync {
    /// Bump the `foreground`/`background` tab kill counter
    fn record_tab_kill(&self, label: TabKillLabel);

    /// Record how long the killed engine session had been alive
    fn record_kill_age(&self, label: TabKillLabel, age_nanos: i64);
}
