//! Browser state tree and selectors

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::StateError;
use crate::tab::SessionState;
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserState {
    /// Normal and private tabs, in display order
    pub tabs: Vec<SessionState>,
    /// Tabs opened on behalf of other apps
    pub custom_tabs: Vec<SessionState>,
    pub selected_tab_id: Option<String>,
    pub downloads: BTreeMap<String, DownloadState>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadState {
    pub id: String,
    pub url: String,
    pub file_name: Option<String>,
    pub session_id: Option<String>,
    pub private: bool,
}

impl BrowserState {
    pub fn with_tabs(tabs: Vec<SessionState>, selected_tab_id: Option<String>) -> Self {
        Self {
            tabs,
            selected_tab_id,
            ..Self::default()
        }
    }

    /// Find a regular (normal or private) tab
    pub fn find_tab(&self, tab_id: &str) -> Option<&SessionState> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    pub fn find_custom_tab(&self, tab_id: &str) -> Option<&SessionState> {
        self.custom_tabs.iter().find(|t| t.id == tab_id)
    }

    pub fn find_tab_or_custom_tab(&self, tab_id: &str) -> Option<&SessionState> {
        self.find_tab(tab_id)
            .or_else(|| self.find_custom_tab(tab_id))
    }

    pub fn require_tab(&self, tab_id: &str) -> Result<&SessionState> {
        self.find_tab_or_custom_tab(tab_id)
            .ok_or_else(|| StateError::NotFound(tab_id.to_string()))
    }

    pub fn normal_tabs(&self) -> impl Iterator<Item = &SessionState> {
        self.tabs.iter().filter(|t| !t.content.private)
    }

    pub(crate) fn tab_mut(&mut self, tab_id: &str) -> Option<&mut SessionState> {
        if let Some(index) = self.tabs.iter().position(|t| t.id == tab_id) {
            return self.tabs.get_mut(index);
        }
        self.custom_tabs.iter_mut().find(|t| t.id == tab_id)
    }
}
