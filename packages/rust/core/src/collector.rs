//! Reference collector: turn ranked search results into extracted text.
//!
//! Fetches each candidate URL sequentially with a bounded timeout and a
//! browser-identifying User-Agent, runs the body through the extractor,
//! and drops empty extractions. Per-item failures are absorbed here — one
//! dead link never aborts collection of the rest. The pacing delay between
//! fetches is a politeness control against anti-bot defenses, not a
//! correctness requirement.

use std::time::Duration;

use tracing::{debug, instrument, warn};

use articlelift_shared::{ArticleLiftError, PipelineConfig, ReferenceArticle, Result, SearchResult};

use crate::BROWSER_USER_AGENT;

/// Fetch/extraction knobs for the collector.
#[derive(Debug, Clone)]
pub struct CollectorOptions {
    /// Timeout for each page fetch.
    pub fetch_timeout_secs: u64,
    /// Pause between consecutive fetches.
    pub fetch_delay_ms: u64,
    /// Character cap applied to extracted content.
    pub max_chars: usize,
}

impl From<&PipelineConfig> for CollectorOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            fetch_timeout_secs: config.fetch_timeout_secs,
            fetch_delay_ms: config.fetch_delay_ms,
            max_chars: config.reference_max_chars,
        }
    }
}

/// Fetches reference pages one at a time and extracts their text.
pub struct ReferenceCollector {
    client: reqwest::Client,
    delay: Duration,
    max_chars: usize,
}

impl ReferenceCollector {
    /// Create a collector with the given fetch options.
    pub fn new(options: &CollectorOptions) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(options.fetch_timeout_secs))
            .build()
            .map_err(|e| ArticleLiftError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            delay: Duration::from_millis(options.fetch_delay_ms),
            max_chars: options.max_chars,
        })
    }

    /// Collect reference articles from search results, in order.
    ///
    /// Failed fetches and empty extractions are skipped silently (logged,
    /// not surfaced); the result may be shorter than the input.
    #[instrument(skip_all, fields(candidates = results.len()))]
    pub async fn collect(&self, results: &[SearchResult]) -> Vec<ReferenceArticle> {
        let mut references = Vec::new();

        for (i, result) in results.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match self.fetch_and_extract(result).await {
                Ok(Some(reference)) => references.push(reference),
                Ok(None) => {
                    debug!(url = %result.url, "no extractable content, skipping");
                }
                Err(e) => {
                    warn!(url = %result.url, error = %e, "reference fetch failed, skipping");
                }
            }
        }

        debug!(collected = references.len(), "reference collection complete");
        references
    }

    /// Fetch one page and extract its text. `Ok(None)` means the page was
    /// reachable but yielded nothing usable.
    async fn fetch_and_extract(&self, result: &SearchResult) -> Result<Option<ReferenceArticle>> {
        let response = self
            .client
            .get(&result.url)
            .send()
            .await
            .map_err(|e| ArticleLiftError::Network(format!("{}: {e}", result.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArticleLiftError::Network(format!(
                "{}: HTTP {status}",
                result.url
            )));
        }

        // Any body is fed to the extractor regardless of content-type;
        // non-HTML degrades gracefully to whole-body text.
        let body = response
            .text()
            .await
            .map_err(|e| ArticleLiftError::Network(format!("{}: body read failed: {e}", result.url)))?;

        let content = articlelift_extract::extract_text(&body, self.max_chars);
        if content.is_empty() {
            return Ok(None);
        }

        Ok(Some(ReferenceArticle {
            title: result.title.clone(),
            url: result.url.clone(),
            content,
        }))
    }
}
