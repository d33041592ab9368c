//! End-to-end enhancement pipeline: backlog → search → collect → rewrite → persist.
//!
//! Articles move through a per-article state machine; every failure past
//! the initial backlog fetch is absorbed here, logged with the article's
//! identity and the stage reached, and the run moves on. Execution is
//! strictly sequential by design: target sites and provider APIs apply
//! anti-bot and rate-limit defenses, so deterministic pacing beats
//! throughput.

use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use articlelift_search::ReferenceFinder;
use articlelift_shared::{
    AppConfig, Article, ArticleId, EnhancementResult, PipelineConfig, Result, lookup_key,
};
use articlelift_store::ArticleStore;
use articlelift_rewrite::RewriteEngine;

use crate::collector::{CollectorOptions, ReferenceCollector};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Terminal state of one article's trip through the pipeline.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// The article was rewritten and persisted.
    Enhanced {
        /// Number of references used for the rewrite.
        references: usize,
    },
    /// The article was left untouched and stays eligible where noted.
    Skipped(SkipReason),
}

/// Why an article was skipped. All reasons leave `is_updated == false`.
#[derive(Debug, Clone)]
pub enum SkipReason {
    /// The finder yielded fewer usable results than the minimum threshold.
    /// No LLM call is made in this case.
    InsufficientReferences { found: usize },
    /// Every candidate page failed to fetch or extracted to nothing.
    NoExtractableContent,
    /// The LLM call errored or returned an empty completion.
    RewriteFailed(String),
    /// The store rejected the update; the article stays eligible for the
    /// next run (no partial write happened).
    PersistenceFailed(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientReferences { found } => {
                write!(f, "insufficient references (found {found})")
            }
            Self::NoExtractableContent => write!(f, "no extractable content"),
            Self::RewriteFailed(e) => write!(f, "rewrite failed: {e}"),
            Self::PersistenceFailed(e) => write!(f, "persistence failed: {e}"),
        }
    }
}

/// Summary of a completed pipeline run.
#[derive(Debug)]
pub struct RunSummary {
    /// Size of the fetched backlog.
    pub backlog: usize,
    /// Articles with `is_updated == false` at run start.
    pub eligible: usize,
    /// Articles enhanced and persisted this run.
    pub enhanced: usize,
    /// Articles skipped this run.
    pub skipped: usize,
    /// Per-article outcomes in processing order.
    pub outcomes: Vec<(ArticleId, Outcome)>,
    /// Total elapsed time.
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when an article starts processing.
    fn article_started(&self, title: &str, current: usize, total: usize);
    /// Called when an article reaches a terminal state.
    fn article_finished(&self, title: &str, outcome: &Outcome);
    /// Called when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn article_started(&self, _title: &str, _current: usize, _total: usize) {}
    fn article_finished(&self, _title: &str, _outcome: &Outcome) {}
    fn done(&self, _summary: &RunSummary) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Orchestration knobs, split out of [`PipelineConfig`] for the parts the
/// orchestrator itself uses.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Minimum usable search results to attempt an enhancement.
    pub min_references: usize,
    /// Pause between articles.
    pub article_delay_ms: u64,
}

impl From<&PipelineConfig> for PipelineOptions {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            min_references: config.min_references,
            article_delay_ms: config.article_delay_ms,
        }
    }
}

/// The article enhancement pipeline.
pub struct EnhancePipeline {
    store: ArticleStore,
    finder: ReferenceFinder,
    collector: ReferenceCollector,
    engine: RewriteEngine,
    options: PipelineOptions,
}

impl EnhancePipeline {
    /// Assemble a pipeline from pre-built components.
    pub fn new(
        store: ArticleStore,
        finder: ReferenceFinder,
        collector: ReferenceCollector,
        engine: RewriteEngine,
        options: PipelineOptions,
    ) -> Self {
        Self {
            store,
            finder,
            collector,
            engine,
            options,
        }
    }

    /// Assemble a pipeline from the app config, resolving API keys from
    /// the env vars the config names. A missing credential is fatal here,
    /// before any network call is made.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let search_key = lookup_key(&config.search.api_key_env, "search provider")?;
        let llm_key = lookup_key(&config.llm.api_key_env, "LLM provider")?;

        Ok(Self::new(
            ArticleStore::new(&config.store)?,
            ReferenceFinder::new(&config.search, search_key)?,
            ReferenceCollector::new(&CollectorOptions::from(&config.pipeline))?,
            RewriteEngine::new(&config.llm, llm_key, config.pipeline.excerpt_max_chars)?,
            PipelineOptions::from(&config.pipeline),
        ))
    }

    /// Run the pipeline once over the full backlog.
    ///
    /// Returns an error only when the backlog itself cannot be fetched;
    /// per-article failures are recorded in the summary.
    #[instrument(skip_all)]
    pub async fn run(&self, progress: &dyn ProgressReporter) -> Result<RunSummary> {
        let start = Instant::now();

        progress.phase("Fetching article backlog");
        let backlog = self.store.fetch_articles().await?;
        let backlog_len = backlog.len();

        let eligible: Vec<Article> = backlog.into_iter().filter(Article::is_eligible).collect();
        info!(
            backlog = backlog_len,
            eligible = eligible.len(),
            "starting enhancement run"
        );

        let total = eligible.len();
        let mut outcomes: Vec<(ArticleId, Outcome)> = Vec::with_capacity(total);
        let mut enhanced = 0usize;

        for (i, article) in eligible.iter().enumerate() {
            // Aggregate throttle across both providers.
            if i > 0 && self.options.article_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.options.article_delay_ms)).await;
            }

            progress.article_started(&article.title, i + 1, total);
            let outcome = self.enhance_article(article).await;

            match &outcome {
                Outcome::Enhanced { references } => {
                    enhanced += 1;
                    info!(
                        article_id = %article.id,
                        references,
                        "article enhanced and persisted"
                    );
                }
                Outcome::Skipped(reason) => {
                    warn!(article_id = %article.id, %reason, "article skipped");
                }
            }

            progress.article_finished(&article.title, &outcome);
            outcomes.push((article.id.clone(), outcome));
        }

        let summary = RunSummary {
            backlog: backlog_len,
            eligible: total,
            enhanced,
            skipped: total - enhanced,
            outcomes,
            elapsed: start.elapsed(),
        };

        info!(
            enhanced = summary.enhanced,
            skipped = summary.skipped,
            elapsed_ms = summary.elapsed.as_millis(),
            "enhancement run complete"
        );
        progress.done(&summary);

        Ok(summary)
    }

    /// Drive one article through search → collect → rewrite → persist.
    ///
    /// Never returns an error: every failure maps to a skip outcome so the
    /// run can continue with the next article.
    #[instrument(skip_all, fields(article_id = %article.id))]
    async fn enhance_article(&self, article: &Article) -> Outcome {
        // Stage 1: search
        let results = self.finder.find(&article.title).await;
        if results.len() < self.options.min_references {
            return Outcome::Skipped(SkipReason::InsufficientReferences {
                found: results.len(),
            });
        }

        // Stage 2: collect
        let references = self.collector.collect(&results).await;
        if references.is_empty() {
            return Outcome::Skipped(SkipReason::NoExtractableContent);
        }

        // Stage 3: rewrite
        let updated_content = match self.engine.rewrite(article, &references).await {
            Ok(content) => content,
            Err(e) => return Outcome::Skipped(SkipReason::RewriteFailed(e.to_string())),
        };

        // Stage 4: persist, atomically
        let enhancement = EnhancementResult {
            updated_content,
            references: references.iter().map(|r| r.to_reference()).collect(),
        };

        match self.store.update_article(&article.id, &enhancement).await {
            Ok(()) => Outcome::Enhanced {
                references: enhancement.references.len(),
            },
            Err(e) => Outcome::Skipped(SkipReason::PersistenceFailed(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use articlelift_shared::{LlmConfig, SearchConfig, StoreConfig};
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Build a pipeline with every external seam pointed at the mock
    /// server and all pacing delays zeroed.
    fn pipeline_for(server: &MockServer) -> EnhancePipeline {
        let store = ArticleStore::new(&StoreConfig {
            base_url: format!("{}/api", server.uri()),
            timeout_secs: 5,
        })
        .expect("store");

        let finder = ReferenceFinder::new(
            &SearchConfig {
                endpoint: format!("{}/search", server.uri()),
                ..SearchConfig::default()
            },
            "search-key",
        )
        .expect("finder");

        let collector = ReferenceCollector::new(&CollectorOptions {
            fetch_timeout_secs: 5,
            fetch_delay_ms: 0,
            max_chars: 3000,
        })
        .expect("collector");

        let engine = RewriteEngine::new(
            &LlmConfig {
                base_url: server.uri(),
                ..LlmConfig::default()
            },
            "llm-key",
            1500,
        )
        .expect("engine");

        EnhancePipeline::new(
            store,
            finder,
            collector,
            engine,
            PipelineOptions {
                min_references: 2,
                article_delay_ms: 0,
            },
        )
    }

    /// Reference links must not share the search endpoint's host or the
    /// finder drops them as provider links. `localhost` resolves to the
    /// same mock server under a different host string.
    fn external(server: &MockServer, page: &str) -> String {
        format!("{}{}", server.uri().replace("127.0.0.1", "localhost"), page)
    }

    fn backlog_response(articles: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({"success": true, "data": articles}))
    }

    async fn mount_backlog(server: &MockServer, articles: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/api/articles"))
            .respond_with(backlog_response(articles))
            .mount(server)
            .await;
    }

    async fn mount_search(server: &MockServer, links: &[&str]) {
        let organic: Vec<_> = links
            .iter()
            .map(|l| serde_json::json!({"link": l, "title": format!("Result {l}")}))
            .collect();
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"organic": organic})),
            )
            .mount(server)
            .await;
    }

    async fn mount_page(server: &MockServer, page: &str, html: &str) {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(ResponseTemplate::new(200).set_body_string(html.to_string()))
            .mount(server)
            .await;
    }

    async fn mount_llm(server: &MockServer, content: &str, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": content}}],
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn happy_path_persists_atomic_enhancement() {
        let server = MockServer::start().await;
        mount_backlog(
            &server,
            serde_json::json!([{"id": 7, "title": "X", "content": "Y", "is_updated": false}]),
        )
        .await;

        let ref1 = external(&server, "/ref1");
        let ref2 = external(&server, "/ref2");
        mount_search(&server, &[&ref1, &ref2]).await;
        mount_page(&server, "/ref1", "<article>Reference one body</article>").await;
        mount_page(&server, "/ref2", "<div class=\"post-content\">Reference two body</div>").await;
        mount_llm(&server, "# X, improved\n\nRewritten.", 1).await;

        let expected_put = serde_json::json!({
            "updated_content": "# X, improved\n\nRewritten.",
            "is_updated": true,
            "references": [
                {"title": format!("Result {ref1}"), "url": ref1},
                {"title": format!("Result {ref2}"), "url": ref2},
            ],
        });
        Mock::given(method("PUT"))
            .and(path("/api/articles/7"))
            .and(body_json(&expected_put))
            .respond_with(backlog_response(serde_json::json!({"id": 7, "title": "X", "content": "Y"})))
            .expect(1)
            .mount(&server)
            .await;

        let summary = pipeline_for(&server)
            .run(&SilentProgress)
            .await
            .expect("run");

        assert_eq!(summary.backlog, 1);
        assert_eq!(summary.eligible, 1);
        assert_eq!(summary.enhanced, 1);
        assert_eq!(summary.skipped, 0);
        assert!(matches!(
            summary.outcomes[0],
            (ArticleId::Int(7), Outcome::Enhanced { references: 2 })
        ));
    }

    #[tokio::test]
    async fn already_enhanced_articles_are_not_reprocessed() {
        let server = MockServer::start().await;
        mount_backlog(
            &server,
            serde_json::json!([{
                "id": 1, "title": "Done", "content": "C", "is_updated": true,
                "updated_content": "# Done", "references": [{"title": "r", "url": "https://r"}],
            }]),
        )
        .await;

        // Zero search and LLM traffic expected on a fully-enhanced backlog.
        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        mount_llm(&server, "unused", 0).await;

        let summary = pipeline_for(&server)
            .run(&SilentProgress)
            .await
            .expect("run");

        assert_eq!(summary.backlog, 1);
        assert_eq!(summary.eligible, 0);
        assert_eq!(summary.enhanced, 0);
    }

    #[tokio::test]
    async fn below_threshold_skips_without_llm_call() {
        let server = MockServer::start().await;
        mount_backlog(
            &server,
            serde_json::json!([{"id": 3, "title": "Lonely", "content": "C", "is_updated": false}]),
        )
        .await;

        let only = external(&server, "/only");
        mount_search(&server, &[&only]).await;
        mount_llm(&server, "unused", 0).await;

        Mock::given(method("PUT"))
            .and(path("/api/articles/3"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let summary = pipeline_for(&server)
            .run(&SilentProgress)
            .await
            .expect("run");

        assert_eq!(summary.enhanced, 0);
        assert!(matches!(
            summary.outcomes[0].1,
            Outcome::Skipped(SkipReason::InsufficientReferences { found: 1 })
        ));
    }

    #[tokio::test]
    async fn search_provider_error_skips_and_run_continues() {
        let server = MockServer::start().await;
        mount_backlog(
            &server,
            serde_json::json!([{"id": 7, "title": "X", "content": "Y", "is_updated": false}]),
        )
        .await;

        Mock::given(method("POST"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_llm(&server, "unused", 0).await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let summary = pipeline_for(&server)
            .run(&SilentProgress)
            .await
            .expect("run");

        // Article untouched, no persistence call issued.
        assert_eq!(summary.enhanced, 0);
        assert!(matches!(
            summary.outcomes[0].1,
            Outcome::Skipped(SkipReason::InsufficientReferences { found: 0 })
        ));
    }

    #[tokio::test]
    async fn partial_fetch_failure_proceeds_with_remaining_reference() {
        let server = MockServer::start().await;
        mount_backlog(
            &server,
            serde_json::json!([{"id": 9, "title": "P", "content": "Q", "is_updated": false}]),
        )
        .await;

        let dead = external(&server, "/dead");
        let alive = external(&server, "/alive");
        mount_search(&server, &[&dead, &alive]).await;
        Mock::given(method("GET"))
            .and(path("/dead"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        mount_page(&server, "/alive", "<article>Survivor text</article>").await;
        mount_llm(&server, "# Rewritten from one reference", 1).await;

        Mock::given(method("PUT"))
            .and(path("/api/articles/9"))
            .respond_with(backlog_response(serde_json::json!({"id": 9, "title": "P", "content": "Q"})))
            .expect(1)
            .mount(&server)
            .await;

        let summary = pipeline_for(&server)
            .run(&SilentProgress)
            .await
            .expect("run");

        assert_eq!(summary.enhanced, 1);
        assert!(matches!(
            summary.outcomes[0].1,
            Outcome::Enhanced { references: 1 }
        ));
    }

    #[tokio::test]
    async fn no_extractable_content_skips_before_llm() {
        let server = MockServer::start().await;
        mount_backlog(
            &server,
            serde_json::json!([{"id": 4, "title": "E", "content": "F", "is_updated": false}]),
        )
        .await;

        let a = external(&server, "/a");
        let b = external(&server, "/b");
        mount_search(&server, &[&a, &b]).await;
        Mock::given(method("GET"))
            .and(path("/a"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/b"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<body><script>nothing()</script></body>"),
            )
            .mount(&server)
            .await;
        mount_llm(&server, "unused", 0).await;

        let summary = pipeline_for(&server)
            .run(&SilentProgress)
            .await
            .expect("run");

        assert!(matches!(
            summary.outcomes[0].1,
            Outcome::Skipped(SkipReason::NoExtractableContent)
        ));
    }

    #[tokio::test]
    async fn persistence_failure_leaves_article_eligible() {
        let server = MockServer::start().await;
        mount_backlog(
            &server,
            serde_json::json!([{"id": 5, "title": "G", "content": "H", "is_updated": false}]),
        )
        .await;

        let r1 = external(&server, "/r1");
        let r2 = external(&server, "/r2");
        mount_search(&server, &[&r1, &r2]).await;
        mount_page(&server, "/r1", "<article>ref one</article>").await;
        mount_page(&server, "/r2", "<article>ref two</article>").await;
        mount_llm(&server, "# G rewritten", 1).await;

        Mock::given(method("PUT"))
            .and(path("/api/articles/5"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let summary = pipeline_for(&server)
            .run(&SilentProgress)
            .await
            .expect("run");

        assert_eq!(summary.enhanced, 0);
        assert!(matches!(
            summary.outcomes[0].1,
            Outcome::Skipped(SkipReason::PersistenceFailed(_))
        ));
    }

    #[tokio::test]
    async fn per_article_failure_does_not_stop_the_run() {
        let server = MockServer::start().await;
        mount_backlog(
            &server,
            serde_json::json!([
                {"id": 1, "title": "Fails", "content": "A", "is_updated": false},
                {"id": 2, "title": "Works", "content": "B", "is_updated": false},
            ]),
        )
        .await;

        // Both articles search the same endpoint; send both to two pages,
        // but make the rewrite fail for the first article only by having
        // the LLM return an empty completion first, then content.
        let p1 = external(&server, "/p1");
        let p2 = external(&server, "/p2");
        mount_search(&server, &[&p1, &p2]).await;
        mount_page(&server, "/p1", "<article>page one</article>").await;
        mount_page(&server, "/p2", "<article>page two</article>").await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "# Second article rewritten"}}],
            })))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/api/articles/2"))
            .respond_with(backlog_response(serde_json::json!({"id": 2, "title": "Works", "content": "B"})))
            .expect(1)
            .mount(&server)
            .await;

        let summary = pipeline_for(&server)
            .run(&SilentProgress)
            .await
            .expect("run");

        assert_eq!(summary.eligible, 2);
        assert_eq!(summary.enhanced, 1);
        assert!(matches!(
            summary.outcomes[0].1,
            Outcome::Skipped(SkipReason::RewriteFailed(_))
        ));
        assert!(matches!(
            summary.outcomes[1].1,
            Outcome::Enhanced { .. }
        ));
    }

    #[tokio::test]
    async fn backlog_fetch_failure_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/articles"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = pipeline_for(&server).run(&SilentProgress).await;
        assert!(result.is_err());
    }
}
