//! Backoff-protected cache of the public runner release list.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use crate::version::RunnerVersion;

const RELEASES_VALIDITY_DAYS: i64 = 1;

const INITIAL_BACKOFF_SECS: f64 = 5.0;
const MAX_BACKOFF_SECS: f64 = 3600.0;
const BACKOFF_GROWTH_FACTOR: f64 = 2.0;
// Past this count further exponentiation cannot grow the clamped interval.
const MAX_BACKOFF_COUNT: u32 = 8;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("unexpected status: {0}")]
    Status(u16),

    #[error("invalid payload: {0}")]
    Parse(String),
}

/// One entry of the releases endpoint payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseEntry {
    /// Release name, a `v`-prefixed semantic version string.
    pub name: String,
}

/// Source of the raw release list. Injected so the catalog can be tested
/// without a network and so the embedding application controls the client.
#[async_trait]
pub trait ReleaseFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Vec<ReleaseEntry>, FetchError>;
}

/// Fetches the release list over HTTP with a bounded timeout, so a slow
/// endpoint cannot stall a scheduling cycle.
pub struct HttpReleaseFetcher {
    client: reqwest::Client,
}

impl HttpReleaseFetcher {
    pub fn new(timeout: std::time::Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReleaseFetcher for HttpReleaseFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<ReleaseEntry>, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        response
            .json::<Vec<ReleaseEntry>>()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

#[derive(Debug)]
struct CatalogState {
    releases: Option<Vec<RunnerVersion>>,
    expire_time: DateTime<Utc>,
    backoff_count: u32,
}

impl CatalogState {
    fn stale() -> Self {
        Self {
            releases: None,
            expire_time: DateTime::<Utc>::MIN_UTC,
            backoff_count: 0,
        }
    }

    fn next_backoff(&mut self) -> Duration {
        if self.backoff_count >= MAX_BACKOFF_COUNT {
            return Duration::seconds(MAX_BACKOFF_SECS as i64);
        }

        let secs = (INITIAL_BACKOFF_SECS * BACKOFF_GROWTH_FACTOR.powi(self.backoff_count as i32))
            .clamp(INITIAL_BACKOFF_SECS, MAX_BACKOFF_SECS);
        self.backoff_count += 1;

        Duration::seconds(secs as i64)
    }
}

/// Sorted list of publicly known runner releases, refreshed at most once a
/// day and protected by exponential backoff after fetch failures.
///
/// Intended to be constructed once at process start and shared. The
/// fetch-and-update path is serialized under a mutex, so concurrent
/// callers hitting an expired cache trigger a single fetch.
pub struct ReleaseCatalog {
    fetcher: Arc<dyn ReleaseFetcher>,
    url: Url,
    state: Mutex<CatalogState>,
}

impl ReleaseCatalog {
    pub fn new(fetcher: Arc<dyn ReleaseFetcher>, url: Url) -> Self {
        Self {
            fetcher,
            url,
            state: Mutex::new(CatalogState::stale()),
        }
    }

    /// The cached release list, ascending. `None` means the list is
    /// temporarily unknown (the last fetch failed), not that there are no
    /// releases.
    pub async fn releases(&self) -> Option<Vec<RunnerVersion>> {
        self.releases_at(Utc::now()).await
    }

    /// Deterministic-time variant of [`releases`](Self::releases).
    pub async fn releases_at(&self, now: DateTime<Utc>) -> Option<Vec<RunnerVersion>> {
        let mut state = self.state.lock().await;

        if now < state.expire_time {
            return state.releases.clone();
        }

        match self.fetcher.fetch(&self.url).await {
            Ok(entries) => {
                let mut releases = parse_releases(&entries);
                releases.sort();
                debug!(count = releases.len(), "refreshed runner release list");
                state.releases = Some(releases);
                state.expire_time = now + Duration::days(RELEASES_VALIDITY_DAYS);
                state.backoff_count = 0;
            }
            Err(error) => {
                warn!(%error, url = %self.url, "runner release fetch failed");
                let backoff = state.next_backoff();
                state.releases = None;
                state.expire_time = now + backoff;
            }
        }

        state.releases.clone()
    }

    /// Drop the cache and backoff state; the next call fetches again.
    pub async fn reset(&self) {
        *self.state.lock().await = CatalogState::stale();
    }
}

/// Parse entry names into versions, stripping the `v` prefix. Entries that
/// do not parse are skipped rather than poisoning the whole list.
fn parse_releases(entries: &[ReleaseEntry]) -> Vec<RunnerVersion> {
    entries
        .iter()
        .filter_map(|entry| {
            let name = entry.name.strip_prefix('v').unwrap_or(&entry.name);
            name.parse::<RunnerVersion>()
                .inspect_err(|error| debug!(%error, name = %entry.name, "skipping release entry"))
                .ok()
        })
        .collect()
}
