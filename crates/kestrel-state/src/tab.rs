//! Tab/session state
//!
//! A `SessionState` is one tab (or custom tab). Its content part mirrors what
//! the engine reports about the page; the engine part tracks the rendering
//! context that may be killed under memory pressure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StateError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Unique identifier
    pub id: String,
    /// Page content as last reported by the engine
    pub content: ContentState,
    /// Engine session bookkeeping
    pub engine_state: EngineState,
    /// When the tab was created
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentState {
    /// Committed URL
    pub url: String,
    pub title: String,
    pub loading: bool,
    /// Private (incognito) tab
    pub private: bool,
    /// Most recent load request, if any
    pub load_request: Option<LoadRequestState>,
}

/// A request to load a URL, possibly not yet committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadRequestState {
    pub url: String,
    pub triggered_by_redirect: bool,
    pub triggered_by_user: bool,
}

impl LoadRequestState {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            triggered_by_redirect: false,
            triggered_by_user: false,
        }
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        Self {
            triggered_by_redirect: true,
            ..Self::new(url)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineState {
    /// Elapsed-realtime milliseconds at which the engine session was linked.
    /// `None` while no engine session is attached.
    pub timestamp: Option<i64>,
}

/// Create a new tab with a generated id.
pub fn create_tab(url: impl Into<String>, private: bool) -> Result<SessionState> {
    let url = url.into();
    if url.is_empty() {
        return Err(StateError::InvalidUrl("URL cannot be empty".to_string()));
    }

    Ok(SessionState::with_id(Uuid::new_v4().to_string(), url, private))
}

impl SessionState {
    /// Create a tab with a caller-chosen id
    pub fn with_id(id: impl Into<String>, url: impl Into<String>, private: bool) -> Self {
        Self {
            id: id.into(),
            content: ContentState {
                url: url.into(),
                title: String::new(),
                loading: false,
                private,
                load_request: None,
            },
            engine_state: EngineState::default(),
            created_at: Utc::now(),
        }
    }

    pub fn is_private(&self) -> bool {
        self.content.private
    }
}
