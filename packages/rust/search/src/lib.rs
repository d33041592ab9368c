//! Reference finder backed by a Serper-style search provider.
//!
//! Submits an article title as a free-text query and returns the top ranked
//! organic results, filtered down to absolute, externally-resolvable links.
//! Provider failures (timeout, non-2xx, malformed response) are a
//! recoverable condition: the finder logs and returns an empty set, and the
//! orchestrator's minimum-reference gate takes care of the rest.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};
use url::Url;

use articlelift_shared::{ArticleLiftError, Result, SearchConfig, SearchResult};

/// Request body for the search provider.
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
    num: usize,
}

/// Provider response: a ranked list of organic results.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

/// A single organic result. Fields beyond `link`/`title` are ignored.
#[derive(Debug, Deserialize)]
struct OrganicResult {
    link: String,
    title: String,
}

// ---------------------------------------------------------------------------
// ReferenceFinder
// ---------------------------------------------------------------------------

/// Queries the search provider for competing pages on an article's topic.
pub struct ReferenceFinder {
    client: reqwest::Client,
    endpoint: String,
    endpoint_host: Option<String>,
    api_key: String,
    requested_results: usize,
    result_limit: usize,
}

impl ReferenceFinder {
    /// Create a finder from the search section of the app config.
    pub fn new(config: &SearchConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| ArticleLiftError::Network(format!("failed to build HTTP client: {e}")))?;

        let endpoint_host = Url::parse(&config.endpoint)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            endpoint_host,
            api_key: api_key.into(),
            requested_results: config.requested_results,
            result_limit: config.result_limit,
        })
    }

    /// Find up to `result_limit` usable references for an article title.
    ///
    /// Results come back in the provider's ranking order. Any provider
    /// failure yields an empty vec, never an error.
    #[instrument(skip(self), fields(title = %title))]
    pub async fn find(&self, title: &str) -> Vec<SearchResult> {
        match self.search(title).await {
            Ok(results) => {
                debug!(count = results.len(), "search results after filtering");
                results
            }
            Err(e) => {
                warn!(error = %e, "search provider call failed, proceeding with no references");
                Vec::new()
            }
        }
    }

    /// Raw provider call plus filtering; errors bubble up to `find`.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>> {
        let request = SearchRequest {
            q: query,
            num: self.requested_results,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ArticleLiftError::Network(format!("search request: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArticleLiftError::Provider(format!(
                "search provider returned HTTP {status}"
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ArticleLiftError::Provider(format!("malformed search response: {e}")))?;

        Ok(self.filter_results(body.organic))
    }

    /// Drop relative links, provider/search-engine links, and duplicates,
    /// preserving ranking order and capping at the configured limit.
    fn filter_results(&self, organic: Vec<OrganicResult>) -> Vec<SearchResult> {
        let mut seen = HashSet::new();
        let mut results = Vec::new();

        for hit in organic {
            if results.len() >= self.result_limit {
                break;
            }

            let Ok(parsed) = Url::parse(&hit.link) else {
                debug!(link = %hit.link, "dropping non-absolute link");
                continue;
            };
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                continue;
            }

            let Some(host) = parsed.host_str() else {
                continue;
            };
            if self.is_provider_host(host) {
                debug!(link = %hit.link, "dropping search-engine link");
                continue;
            }

            if !seen.insert(hit.link.clone()) {
                continue;
            }

            results.push(SearchResult {
                url: hit.link,
                title: hit.title,
            });
        }

        results
    }

    /// Whether a host belongs to the search provider or a search engine.
    /// Ranked links must be externally-resolvable pages, never a redirect
    /// back into search results.
    fn is_provider_host(&self, host: &str) -> bool {
        if self.endpoint_host.as_deref() == Some(host) {
            return true;
        }
        host.ends_with("serper.dev")
            || host == "google.com"
            || host.starts_with("google.")
            || host.contains(".google.")
    }
}

impl std::fmt::Debug for ReferenceFinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferenceFinder")
            .field("endpoint", &self.endpoint)
            .field("result_limit", &self.result_limit)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
