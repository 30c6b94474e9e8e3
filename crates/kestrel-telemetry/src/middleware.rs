//! Telemetry middleware
//!
//! Records telemetry in response to browser actions. Every action is
//! forwarded unchanged; telemetry work happens before forwarding (content,
//! download and engine actions) or after it (tab list changes, which need the
//! reduced tab count).

use std::sync::Arc;

use kestrel_state::{
    BrowserAction, BrowserState, ContentAction, DownloadAction, EngineAction, Middleware,
    MiddlewareContext, Next, SessionState, TabListAction,
};

use crate::ads::AdsTelemetry;
use crate::clock::Clock;
use crate::event::{EngineMetrics, Event, MetricController, TabKillLabel};
use crate::redirect::RedirectChainTracker;
use crate::settings::Settings;

pub struct TelemetryMiddleware {
    settings: Settings,
    ads_telemetry: Arc<dyn AdsTelemetry>,
    metrics: Arc<dyn MetricController>,
    engine_metrics: Arc<dyn EngineMetrics>,
    clock: Arc<dyn Clock>,
    redirect_chains: RedirectChainTracker,
}

impl TelemetryMiddleware {
    pub fn new(
        settings: Settings,
        ads_telemetry: Arc<dyn AdsTelemetry>,
        metrics: Arc<dyn MetricController>,
        engine_metrics: Arc<dyn EngineMetrics>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            ads_telemetry,
            metrics,
            engine_metrics,
            clock,
            redirect_chains: RedirectChainTracker::new(),
        }
    }

    fn pre_process(&mut self, context: &MiddlewareContext<'_>, action: &BrowserAction) {
        match action {
            BrowserAction::Content(ContentAction::UpdateLoadingState {
                session_id,
                loading,
            }) => {
                let tab = context.with_state(|state| {
                    state
                        .find_tab(session_id)
                        .map(|tab| (tab.content.loading, tab.content.private))
                });
                match tab {
                    Some((was_loading, private)) => {
                        self.on_loading_state_changed(was_loading, *loading, private)
                    }
                    None => tracing::debug!(session_id = %session_id, "No tab for loading state"),
                }
            }
            BrowserAction::Content(ContentAction::UpdateLoadRequest {
                session_id,
                load_request,
            }) => {
                let current_url = context.with_state(|state| {
                    state
                        .find_tab(session_id)
                        .map(|tab| tab.content.url.clone())
                });
                match current_url {
                    Some(current_url) => self.redirect_chains.on_load_request(
                        session_id,
                        &load_request.url,
                        &current_url,
                    ),
                    None => tracing::debug!(session_id = %session_id, "No tab for load request"),
                }
            }
            BrowserAction::Content(ContentAction::UpdateUrl { session_id, .. }) => {
                self.redirect_chains
                    .on_url_committed(session_id, self.ads_telemetry.as_ref());
            }
            BrowserAction::Download(DownloadAction::AddDownload { .. }) => {
                self.metrics.track(Event::DownloadAdded);
            }
            BrowserAction::Engine(EngineAction::KillEngineSession { session_id }) => {
                context.with_state(|state| {
                    let tab = state.find_tab_or_custom_tab(session_id);
                    self.on_engine_session_killed(state, tab);
                });
            }
            BrowserAction::Content(ContentAction::UpdateTitle { .. })
            | BrowserAction::Download(DownloadAction::RemoveDownload { .. })
            | BrowserAction::Engine(EngineAction::LinkEngineSession { .. })
            | BrowserAction::TabList(_)
            | BrowserAction::CustomTabList(_) => {}
        }
    }

    fn post_process(&self, context: &MiddlewareContext<'_>, action: &BrowserAction) {
        let BrowserAction::TabList(action) = action else {
            return;
        };

        match action {
            TabListAction::AddTab { .. }
            | TabListAction::AddMultipleTabs { .. }
            | TabListAction::RemoveTab { .. }
            | TabListAction::RemoveAllNormalTabs
            | TabListAction::RemoveAllTabs
            | TabListAction::Restore { .. } => {
                let count = context.with_state(|state| state.normal_tabs().count());
                self.on_open_tabs_changed(count);
            }
            TabListAction::SelectTab { .. } | TabListAction::RemoveAllPrivateTabs => {}
        }
    }

    /// A page finished loading
    fn on_loading_state_changed(&self, was_loading: bool, is_loading: bool, private: bool) {
        if was_loading && !is_loading && !private {
            self.metrics.track(Event::UriOpened);
        }
    }

    fn on_open_tabs_changed(&self, count: usize) {
        if let Err(e) = self.settings.set_open_tabs_count(count) {
            tracing::warn!(error = %e, count, "Failed to persist open tabs count");
        }

        if count > 0 {
            self.metrics.track(Event::HaveOpenTabs);
        } else {
            self.metrics.track(Event::HaveNoOpenTabs);
        }
    }

    fn on_engine_session_killed(&self, state: &BrowserState, tab: Option<&SessionState>) {
        let Some(tab) = tab else {
            tracing::debug!("Could not find tab for killed engine session");
            return;
        };

        let is_selected = state.selected_tab_id.as_deref() == Some(tab.id.as_str());
        let label = TabKillLabel::from_selected(is_selected);
        let age_nanos = self.engine_session_age_nanos(tab);

        tracing::debug!(tab_id = %tab.id, label = %label, age_nanos = ?age_nanos, "Engine session killed");

        self.engine_metrics.record_tab_kill(label);
        if let Some(age_nanos) = age_nanos {
            self.engine_metrics.record_kill_age(label, age_nanos);
        }
    }

    /// Nanoseconds since the engine session was linked, if it was
    fn engine_session_age_nanos(&self, tab: &SessionState) -> Option<i64> {
        let timestamp = tab.engine_state.timestamp?;
        let now = self.clock.elapsed_realtime_millis();
        Some(now.saturating_sub(timestamp).saturating_mul(1_000_000))
    }
}

impl Middleware for TelemetryMiddleware {
    fn invoke(&mut self, context: &MiddlewareContext<'_>, next: Next<'_>, action: &BrowserAction) {
        self.pre_process(context, action);

        next(action);

        self.post_process(context, action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::AttributionError;
    use crate::registry::MetricsRegistry;
    use kestrel_state::{DownloadState, LoadRequestState, Store};
    use kestrel_storage::{Database, StorageError};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FakeAds {
        reports: Mutex<Vec<(String, Vec<String>)>>,
        fail: bool,
    }

    impl AdsTelemetry for FakeAds {
        fn track_ad_clicked_metric(
            &self,
            session_url: &str,
            url_path: &[String],
        ) -> std::result::Result<(), AttributionError> {
            self.reports
                .lock()
                .push((session_url.to_string(), url_path.to_vec()));
            if self.fail {
                return Err(AttributionError::Storage(StorageError::Sqlite(
                    rusqlite::Error::InvalidQuery,
                )));
            }
            Ok(())
        }
    }

    struct Harness {
        store: Store,
        ads: Arc<FakeAds>,
        metrics: Arc<MetricsRegistry>,
        settings: Settings,
        clock: Arc<ManualClock>,
    }

    fn harness_with(state: BrowserState, ads: FakeAds) -> Harness {
        let ads = Arc::new(ads);
        let metrics = Arc::new(MetricsRegistry::new());
        let settings = Settings::new(Database::open_in_memory().unwrap());
        let clock = Arc::new(ManualClock::new(0));

        let middleware = TelemetryMiddleware::new(
            settings.clone(),
            ads.clone(),
            metrics.clone(),
            metrics.clone(),
            clock.clone(),
        );
        let store = Store::with_middleware(state, vec![Box::new(middleware)]);

        Harness {
            store,
            ads,
            metrics,
            settings,
            clock,
        }
    }

    fn harness(state: BrowserState) -> Harness {
        harness_with(state, FakeAds::default())
    }

    fn tab(id: &str, url: &str) -> SessionState {
        SessionState::with_id(id, url, false)
    }

    fn load_request(session_id: &str, url: &str) -> ContentAction {
        ContentAction::UpdateLoadRequest {
            session_id: session_id.to_string(),
            load_request: LoadRequestState::redirect(url),
        }
    }

    fn commit(session_id: &str, url: &str) -> ContentAction {
        ContentAction::UpdateUrl {
            session_id: session_id.to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn test_redirect_chain_reported_on_commit() {
        let h = harness(BrowserState::with_tabs(
            vec![tab("tab1", "https://a.test")],
            Some("tab1".to_string()),
        ));

        h.store.dispatch(load_request("tab1", "https://b.test"));
        h.store.dispatch(load_request("tab1", "https://c.test"));
        h.store.dispatch(commit("tab1", "https://c.test"));

        assert_eq!(
            *h.ads.reports.lock(),
            vec![(
                "https://a.test".to_string(),
                vec!["https://b.test".to_string(), "https://c.test".to_string()]
            )]
        );
        assert_eq!(h.store.state().find_tab("tab1").unwrap().content.url, "https://c.test");

        // the next commit has no chain left to report
        h.store.dispatch(commit("tab1", "https://c.test"));
        assert_eq!(h.ads.reports.lock().len(), 1);
    }

    #[test]
    fn test_load_request_to_current_url_opens_no_chain() {
        let h = harness(BrowserState::with_tabs(vec![tab("tab1", "https://a.test")], None));

        h.store.dispatch(load_request("tab1", "https://a.test"));
        h.store.dispatch(commit("tab1", "https://a.test"));

        assert!(h.ads.reports.lock().is_empty());
    }

    #[test]
    fn test_load_request_for_unknown_tab_is_ignored() {
        let h = harness(BrowserState::default());

        h.store.dispatch(load_request("ghost", "https://b.test"));
        h.store.dispatch(commit("ghost", "https://b.test"));

        assert!(h.ads.reports.lock().is_empty());
    }

    #[test]
    fn test_failed_attribution_does_not_break_dispatch() {
        let h = harness_with(
            BrowserState::with_tabs(vec![tab("tab1", "https://a.test")], None),
            FakeAds {
                fail: true,
                ..FakeAds::default()
            },
        );

        h.store.dispatch(load_request("tab1", "https://b.test"));
        h.store.dispatch(commit("tab1", "https://b.test"));
        h.store.dispatch(commit("tab1", "https://b.test"));

        assert_eq!(h.ads.reports.lock().len(), 1);
        // the action still reached the reducer
        assert_eq!(h.store.state().find_tab("tab1").unwrap().content.url, "https://b.test");
    }

    #[test]
    fn test_uri_opened_when_page_finishes_loading() {
        let mut private_tab = SessionState::with_id("private", "https://p.test", true);
        private_tab.content.loading = true;
        let mut normal_tab = tab("tab1", "https://a.test");
        normal_tab.content.loading = true;

        let h = harness(BrowserState::with_tabs(vec![normal_tab, private_tab], None));

        for session_id in ["tab1", "private"] {
            h.store.dispatch(ContentAction::UpdateLoadingState {
                session_id: session_id.to_string(),
                loading: false,
            });
        }
        // not-loading -> not-loading is not a finished load
        h.store.dispatch(ContentAction::UpdateLoadingState {
            session_id: "tab1".to_string(),
            loading: false,
        });

        assert_eq!(h.metrics.event_count(Event::UriOpened), 1);
    }

    #[test]
    fn test_loading_state_for_unknown_tab_is_ignored() {
        let h = harness(BrowserState::default());

        h.store.dispatch(ContentAction::UpdateLoadingState {
            session_id: "ghost".to_string(),
            loading: true,
        });
        h.store.dispatch(ContentAction::UpdateLoadingState {
            session_id: "ghost".to_string(),
            loading: false,
        });

        assert_eq!(h.metrics.event_count(Event::UriOpened), 0);
        assert!(h.metrics.snapshot().events.is_empty());
    }

    #[test]
    fn test_download_added() {
        let h = harness(BrowserState::default());
        h.store.dispatch(DownloadAction::AddDownload {
            download: DownloadState {
                id: "d1".to_string(),
                url: "https://a.test/file.zip".to_string(),
                file_name: None,
                session_id: None,
                private: false,
            },
        });

        assert_eq!(h.metrics.event_count(Event::DownloadAdded), 1);
        assert_eq!(h.store.state().downloads.len(), 1);
    }

    #[test]
    fn test_open_tabs_count_follows_tab_list() {
        let h = harness(BrowserState::default());

        h.store.dispatch(TabListAction::AddTab {
            tab: tab("a", "https://a.test"),
            select: true,
        });
        h.store.dispatch(TabListAction::AddMultipleTabs {
            tabs: vec![
                tab("b", "https://b.test"),
                SessionState::with_id("p", "https://p.test", true),
            ],
        });
        assert_eq!(h.settings.open_tabs_count().unwrap(), 2);
        assert_eq!(h.metrics.event_count(Event::HaveOpenTabs), 2);

        h.store.dispatch(TabListAction::RemoveAllNormalTabs);
        assert_eq!(h.settings.open_tabs_count().unwrap(), 0);
        assert_eq!(h.metrics.event_count(Event::HaveNoOpenTabs), 1);
    }

    #[test]
    fn test_select_and_private_removal_skip_tab_count() {
        let h = harness(BrowserState::with_tabs(
            vec![tab("a", "https://a.test"), tab("b", "https://b.test")],
            Some("a".to_string()),
        ));

        h.store.dispatch(TabListAction::SelectTab {
            tab_id: "b".to_string(),
        });
        h.store.dispatch(TabListAction::RemoveAllPrivateTabs);

        let snapshot = h.metrics.snapshot();
        assert!(snapshot.events.is_empty());
    }

    fn killed_tab_state(selected: &str, timestamp: Option<i64>) -> BrowserState {
        let mut tab2 = tab("tab2", "https://a.test");
        tab2.engine_state.timestamp = timestamp;
        BrowserState::with_tabs(
            vec![tab("tab1", "https://b.test"), tab2],
            Some(selected.to_string()),
        )
    }

    fn kill(session_id: &str) -> EngineAction {
        EngineAction::KillEngineSession {
            session_id: session_id.to_string(),
        }
    }

    #[test]
    fn test_foreground_kill_records_age() {
        let h = harness(killed_tab_state("tab2", Some(5_000)));
        h.clock.set(5_002);

        h.store.dispatch(kill("tab2"));

        let snapshot = h.metrics.snapshot();
        assert_eq!(h.metrics.tab_kills(TabKillLabel::Foreground), 1);
        assert_eq!(h.metrics.tab_kills(TabKillLabel::Background), 0);
        assert_eq!(snapshot.kill_foreground_age.samples, vec![2_000_000]);
        assert_eq!(snapshot.kill_background_age.count(), 0);
        // the reducer detached the engine session afterwards
        assert_eq!(
            h.store.state().find_tab("tab2").unwrap().engine_state.timestamp,
            None
        );
    }

    #[test]
    fn test_background_kill_records_age() {
        let h = harness(killed_tab_state("tab1", Some(1_000)));
        h.clock.set(4_000);

        h.store.dispatch(kill("tab2"));

        let snapshot = h.metrics.snapshot();
        assert_eq!(h.metrics.tab_kills(TabKillLabel::Background), 1);
        assert_eq!(snapshot.kill_background_age.samples, vec![3_000_000_000]);
        assert_eq!(snapshot.kill_foreground_age.count(), 0);
    }

    #[test]
    fn test_kill_without_timestamp_only_counts() {
        let h = harness(killed_tab_state("tab2", None));
        h.clock.set(5_002);

        h.store.dispatch(kill("tab2"));

        let snapshot = h.metrics.snapshot();
        assert_eq!(h.metrics.tab_kills(TabKillLabel::Foreground), 1);
        assert_eq!(snapshot.kill_foreground_age.count(), 0);
        assert_eq!(snapshot.kill_background_age.count(), 0);
    }

    #[test]
    fn test_kill_with_extreme_timestamp_saturates() {
        let h = harness(killed_tab_state("tab2", None));
        h.clock.set(1_000);
        h.store.dispatch(EngineAction::LinkEngineSession {
            session_id: "tab2".to_string(),
            timestamp: i64::MIN,
        });

        h.store.dispatch(kill("tab2"));

        let snapshot = h.metrics.snapshot();
        assert_eq!(h.metrics.tab_kills(TabKillLabel::Foreground), 1);
        assert_eq!(snapshot.kill_foreground_age.samples, vec![i64::MAX]);

        // a timestamp ahead of the clock saturates the other way
        h.store.dispatch(EngineAction::LinkEngineSession {
            session_id: "tab2".to_string(),
            timestamp: i64::MAX,
        });
        h.clock.set(-1_000);
        h.store.dispatch(kill("tab2"));

        let snapshot = h.metrics.snapshot();
        assert_eq!(snapshot.kill_foreground_age.samples, vec![i64::MAX, i64::MIN]);
    }

    #[test]
    fn test_kill_for_unknown_tab_records_nothing() {
        let h = harness(killed_tab_state("tab2", Some(5_000)));
        h.store.dispatch(kill("ghost"));

        let snapshot = h.metrics.snapshot();
        assert!(snapshot.tab_kills.is_empty());
        assert_eq!(snapshot.kill_foreground_age.count(), 0);
        assert_eq!(h.metrics.tab_kills(TabKillLabel::Foreground), 0);
        assert_eq!(h.metrics.tab_kills(TabKillLabel::Background), 0);
    }

    #[test]
    fn test_kill_custom_tab_counts_as_background() {
        let mut state = killed_tab_state("tab1", None);
        let mut custom = tab("custom", "https://c.test");
        custom.engine_state.timestamp = Some(10);
        state.custom_tabs.push(custom);

        let h = harness(state);
        h.clock.set(11);
        h.store.dispatch(kill("custom"));

        assert_eq!(h.metrics.tab_kills(TabKillLabel::Background), 1);
        assert_eq!(h.metrics.snapshot().kill_background_age.samples, vec![1_000_000]);
    }
}
