//! Search ad click attribution
//!
//! A redirect chain rooted on a search results page that passes through one
//! of the provider's ad servers counts as an ad click for that provider.

use chrono::Utc;
use rusqlite::OptionalExtension;
use serde::{Deserialize, Serialize};
use url::Url;

use kestrel_storage::Database;

use crate::error::AttributionError;

pub trait AdsTelemetry: Send + Sync {
    /// Inspect a finished redirect chain and record an ad click if it was one
    fn track_ad_clicked_metric(
        &self,
        session_url: &str,
        url_path: &[String],
    ) -> std::result::Result<(), AttributionError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchProvider {
    pub name: String,
    /// Hosts (and their subdomains) serving the results page
    pub search_hosts: Vec<String>,
    /// `host/path-prefix` patterns of ad redirect servers
    pub ad_servers: Vec<String>,
}

impl SearchProvider {
    pub fn new(name: &str, search_hosts: &[&str], ad_servers: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            search_hosts: search_hosts.iter().map(|s| s.to_string()).collect(),
            ad_servers: ad_servers.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn defaults() -> Vec<SearchProvider> {
        vec![
            SearchProvider::new(
                "google",
                &["google.com"],
                &["googleadservices.com/pagead/aclk", "google.com/aclk"],
            ),
            SearchProvider::new("bing", &["bing.com"], &["bing.com/aclk", "bing.com/aclick"]),
            SearchProvider::new("duckduckgo", &["duckduckgo.com"], &["duckduckgo.com/y.js"]),
        ]
    }

    fn serves_results(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| self.search_hosts.iter().any(|h| host_matches(host, h)))
    }

    fn is_ad_server(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };

        self.ad_servers.iter().any(|pattern| {
            let (pattern_host, pattern_path) = match pattern.split_once('/') {
                Some((h, p)) => (h, p),
                None => (pattern.as_str(), ""),
            };
            host_matches(host, pattern_host)
                && url.path().trim_start_matches('/').starts_with(pattern_path)
        })
    }
}

fn host_matches(host: &str, domain: &str) -> bool {
    let host = host.to_lowercase();
    host == domain || host.ends_with(&format!(".{}", domain))
}

/// Counts ad clicks per provider in the `ad_clicks` table
pub struct SearchAdsTelemetry {
    db: Database,
    providers: Vec<SearchProvider>,
}

impl SearchAdsTelemetry {
    pub fn new(db: Database) -> Self {
        Self::with_providers(db, SearchProvider::defaults())
    }

    pub fn with_providers(db: Database, providers: Vec<SearchProvider>) -> Self {
        Self { db, providers }
    }

    pub fn ad_clicks(&self, provider: &str) -> std::result::Result<u64, AttributionError> {
        let count = self.db.with_connection(|conn| {
            let count: Option<i64> = conn
                .query_row(
                    "SELECT count FROM ad_clicks WHERE provider = ?1",
                    [provider],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(count.unwrap_or(0))
        })?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn record_ad_click(&self, provider: &str) -> std::result::Result<(), AttributionError> {
        let updated_at = Utc::now().to_rfc3339();
        self.db.with_connection(|conn| {
            conn.execute(
                "INSERT INTO ad_clicks (provider, count, updated_at) VALUES (?1, 1, ?2)
                 ON CONFLICT(provider) DO UPDATE SET count = count + 1, updated_at = ?2",
                rusqlite::params![provider, updated_at],
            )?;
            Ok(())
        })?;
        Ok(())
    }
}

impl AdsTelemetry for SearchAdsTelemetry {
    fn track_ad_clicked_metric(
        &self,
        session_url: &str,
        url_path: &[String],
    ) -> std::result::Result<(), AttributionError> {
        let Ok(root) = Url::parse(session_url) else {
            tracing::debug!(url = %session_url, "Redirect root is not a URL");
            return Ok(());
        };

        let Some(provider) = self.providers.iter().find(|p| p.serves_results(&root)) else {
            return Ok(());
        };

        let clicked = url_path
            .iter()
            .filter_map(|u| Url::parse(u).ok())
            .any(|u| provider.is_ad_server(&u));

        if clicked {
            tracing::info!(provider = %provider.name, "Search ad clicked");
            self.record_ad_click(&provider.name)?;
        }

        Ok(())
    }
}
