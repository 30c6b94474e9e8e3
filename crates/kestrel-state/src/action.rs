//! Browser actions
//!
//! The closed set of state changes that can flow through the store.

use serde::{Deserialize, Serialize};

use crate::state::DownloadState;
use crate::tab::{LoadRequestState, SessionState};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "group", content = "action")]
pub enum BrowserAction {
    Content(ContentAction),
    Download(DownloadAction),
    Engine(EngineAction),
    TabList(TabListAction),
    CustomTabList(CustomTabListAction),
}

/// Changes to the content of a single tab
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentAction {
    UpdateLoadingState {
        session_id: String,
        loading: bool,
    },
    UpdateLoadRequest {
        session_id: String,
        load_request: LoadRequestState,
    },
    /// The tab committed to a new URL
    UpdateUrl { session_id: String, url: String },
    UpdateTitle { session_id: String, title: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadAction {
    AddDownload { download: DownloadState },
    RemoveDownload { download_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineAction {
    /// An engine session was attached; `timestamp` is elapsed-realtime millis
    LinkEngineSession { session_id: String, timestamp: i64 },
    /// The engine session was reclaimed, the tab itself survives
    KillEngineSession { session_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TabListAction {
    AddTab { tab: SessionState, select: bool },
    AddMultipleTabs { tabs: Vec<SessionState> },
    SelectTab { tab_id: String },
    RemoveTab { tab_id: String },
    RemoveAllNormalTabs,
    RemoveAllPrivateTabs,
    RemoveAllTabs,
    Restore {
        tabs: Vec<SessionState>,
        selected_tab_id: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CustomTabListAction {
    AddCustomTab { tab: SessionState },
    RemoveCustomTab { tab_id: String },
}

impl From<ContentAction> for BrowserAction {
    fn from(action: ContentAction) -> Self {
        BrowserAction::Content(action)
    }
}

impl From<DownloadAction> for BrowserAction {
    fn from(action: DownloadAction) -> Self {
        BrowserAction::Download(action)
    }
}

impl From<EngineAction> for BrowserAction {
    fn from(action: EngineAction) -> Self {
        BrowserAction::Engine(action)
    }
}

impl From<TabListAction> for BrowserAction {
    fn from(action: TabListAction) -> Self {
        BrowserAction::TabList(action)
    }
}

impl From<CustomTabListAction> for BrowserAction {
    fn from(action: CustomTabListAction) -> Self {
        BrowserAction::CustomTabList(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let action: BrowserAction = EngineAction::KillEngineSession {
            session_id: "tab2".to_string(),
        }
        .into();

        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["group"], "Engine");
        assert_eq!(json["action"]["type"], "kill_engine_session");
        assert_eq!(json["action"]["session_id"], "tab2");
    }
}
