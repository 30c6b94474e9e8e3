//! Redirect chain tracking
//!
//! Collects the load requests a tab makes between two committed URLs. Per
//! session:
//!
//! ```text
//! NoChain --load request to a different URL--> Open
//! Open    --any load request--> Open (append)
//! Open    --URL committed--> NoChain (chain reported)
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::ads::AdsTelemetry;

/// URLs requested since the tab last committed to `root`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectChain {
    pub root: String,
    pub chain: Vec<String>,
}

impl RedirectChain {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            chain: Vec::new(),
        }
    }

    pub fn add(&mut self, url: impl Into<String>) {
        self.chain.push(url.into());
    }
}

/// One open chain per session, owned by the telemetry middleware.
/// Chains for sessions that never commit stay until the tracker is dropped.
#[derive(Debug, Default)]
pub struct RedirectChainTracker {
    chains: HashMap<String, RedirectChain>,
}

impl RedirectChainTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a load request for `session_id`.
    ///
    /// A chain is only opened when the request leaves the tab's current URL.
    /// Once open, every request is appended, including ones back to the
    /// current URL.
    pub fn on_load_request(&mut self, session_id: &str, requested_url: &str, current_tab_url: &str) {
        if !self.chains.contains_key(session_id) && requested_url != current_tab_url {
            tracing::trace!(session_id = %session_id, root = %current_tab_url, "Opening redirect chain");
            self.chains.insert(
                session_id.to_string(),
                RedirectChain::new(current_tab_url),
            );
        }

        if let Some(chain) = self.chains.get_mut(session_id) {
            chain.add(requested_url);
        }
    }

    /// Close the session's chain, if any, and report it once.
    ///
    /// The chain is removed before reporting, so a failing report cannot leave
    /// it behind. Report errors are logged and dropped.
    pub fn on_url_committed(&mut self, session_id: &str, ads: &dyn AdsTelemetry) {
        let Some(chain) = self.chains.remove(session_id) else {
            return;
        };

        if let Err(e) = ads.track_ad_clicked_metric(&chain.root, &chain.chain) {
            tracing::info!(
                session_id = %session_id,
                error = %e,
                "Failed to record search telemetry"
            );
        }
    }

    pub fn chain(&self, session_id: &str) -> Option<&RedirectChain> {
        self.chains.get(session_id)
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}
