//! Reducer
//!
//! Pure state transitions. Actions for tabs that no longer exist are dropped.

use crate::action::{
    BrowserAction, ContentAction, CustomTabListAction, DownloadAction, EngineAction,
    TabListAction,
};
use crate::state::BrowserState;
use crate::tab::SessionState;

pub fn reduce(state: &mut BrowserState, action: &BrowserAction) {
    match action {
        BrowserAction::Content(action) => reduce_content(state, action),
        BrowserAction::Download(action) => reduce_download(state, action),
        BrowserAction::Engine(action) => reduce_engine(state, action),
        BrowserAction::TabList(action) => reduce_tab_list(state, action),
        BrowserAction::CustomTabList(action) => reduce_custom_tab_list(state, action),
    }
}

fn reduce_content(state: &mut BrowserState, action: &ContentAction) {
    let session_id = match action {
        ContentAction::UpdateLoadingState { session_id, .. }
        | ContentAction::UpdateLoadRequest { session_id, .. }
        | ContentAction::UpdateUrl { session_id, .. }
        | ContentAction::UpdateTitle { session_id, .. } => session_id,
    };

    let Some(tab) = state.tab_mut(session_id) else {
        tracing::debug!(session_id = %session_id, "Dropping content action for unknown tab");
        return;
    };

    match action {
        ContentAction::UpdateLoadingState { loading, .. } => tab.content.loading = *loading,
        ContentAction::UpdateLoadRequest { load_request, .. } => {
            tab.content.load_request = Some(load_request.clone());
        }
        ContentAction::UpdateUrl { url, .. } => tab.content.url = url.clone(),
        ContentAction::UpdateTitle { title, .. } => tab.content.title = title.clone(),
    }
}

fn reduce_download(state: &mut BrowserState, action: &DownloadAction) {
    match action {
        DownloadAction::AddDownload { download } => {
            state.downloads.insert(download.id.clone(), download.clone());
        }
        DownloadAction::RemoveDownload { download_id } => {
            state.downloads.remove(download_id);
        }
    }
}

fn reduce_engine(state: &mut BrowserState, action: &EngineAction) {
    match action {
        EngineAction::LinkEngineSession {
            session_id,
            timestamp,
        } => {
            if let Some(tab) = state.tab_mut(session_id) {
                tab.engine_state.timestamp = Some(*timestamp);
            }
        }
        EngineAction::KillEngineSession { session_id } => {
            if let Some(tab) = state.tab_mut(session_id) {
                tab.engine_state.timestamp = None;
            }
        }
    }
}

fn reduce_tab_list(state: &mut BrowserState, action: &TabListAction) {
    match action {
        TabListAction::AddTab { tab, select } => {
            if state.find_tab(&tab.id).is_some() {
                tracing::warn!(tab_id = %tab.id, "Ignoring duplicate tab");
                return;
            }
            state.tabs.push(tab.clone());
            if *select || state.selected_tab_id.is_none() {
                state.selected_tab_id = Some(tab.id.clone());
            }
        }
        TabListAction::AddMultipleTabs { tabs } => {
            append_new_tabs(state, tabs);
            if state.selected_tab_id.is_none() {
                state.selected_tab_id = tabs.first().map(|t| t.id.clone());
            }
        }
        TabListAction::SelectTab { tab_id } => {
            if state.find_tab(tab_id).is_some() {
                state.selected_tab_id = Some(tab_id.clone());
            }
        }
        TabListAction::RemoveTab { tab_id } => remove_tab(state, tab_id),
        TabListAction::RemoveAllNormalTabs => remove_where(state, |t| !t.content.private),
        TabListAction::RemoveAllPrivateTabs => remove_where(state, |t| t.content.private),
        TabListAction::RemoveAllTabs => {
            state.tabs.clear();
            state.selected_tab_id = None;
        }
        TabListAction::Restore {
            tabs,
            selected_tab_id,
        } => {
            append_new_tabs(state, tabs);
            if state.selected_tab_id.is_none() {
                state.selected_tab_id = selected_tab_id
                    .as_ref()
                    .filter(|id| state.find_tab(id).is_some())
                    .cloned();
            }
        }
    }
}

fn reduce_custom_tab_list(state: &mut BrowserState, action: &CustomTabListAction) {
    match action {
        CustomTabListAction::AddCustomTab { tab } => state.custom_tabs.push(tab.clone()),
        CustomTabListAction::RemoveCustomTab { tab_id } => {
            state.custom_tabs.retain(|t| &t.id != tab_id);
        }
    }
}

fn append_new_tabs(state: &mut BrowserState, tabs: &[SessionState]) {
    for tab in tabs {
        if state.find_tab(&tab.id).is_none() {
            state.tabs.push(tab.clone());
        }
    }
}

fn remove_tab(state: &mut BrowserState, tab_id: &str) {
    let Some(index) = state.tabs.iter().position(|t| t.id == tab_id) else {
        return;
    };
    let removed = state.tabs.remove(index);

    if state.selected_tab_id.as_deref() == Some(tab_id) {
        state.selected_tab_id = nearest_tab(&state.tabs, index, removed.content.private);
    }
}

/// Pick the tab that took the removed tab's place, or the one before it,
/// staying within the same privacy mode.
fn nearest_tab(tabs: &[SessionState], index: usize, private: bool) -> Option<String> {
    let same_mode = |t: &&SessionState| t.content.private == private;

    tabs[index.min(tabs.len())..]
        .iter()
        .find(same_mode)
        .or_else(|| tabs[..index.min(tabs.len())].iter().rev().find(same_mode))
        .map(|t| t.id.clone())
}

fn remove_where<F>(state: &mut BrowserState, predicate: F)
where
    F: Fn(&SessionState) -> bool,
{
    state.tabs.retain(|t| !predicate(t));

    let selected_removed = state
        .selected_tab_id
        .as_deref()
        .is_some_and(|id| state.find_tab(id).is_none());
    if selected_removed {
        state.selected_tab_id = None;
    }
}
