//! HTTP client for the external article store.
//!
//! The store is a plain CRUD API wrapping every response in a
//! `{success, data}` envelope. This crate consumes three endpoints:
//! `GET articles` (the backlog), `PUT articles/{id}` (persist an
//! enhancement), and `POST articles` (seed a new article).
//!
//! A failed persistence is not fatal to the run — the article keeps
//! `is_updated == false` server-side and stays eligible for the next run.

use serde::Serialize;
use tracing::{debug, instrument};

use articlelift_shared::{
    Article, ArticleId, ArticleLiftError, EnhancementResult, Envelope, NewArticle, Reference,
    Result, StoreConfig,
};

/// `PUT articles/{id}` body. `is_updated` is always true here: the store
/// client only ever writes completed enhancements, atomically.
#[derive(Debug, Serialize)]
struct UpdateArticleBody<'a> {
    updated_content: &'a str,
    is_updated: bool,
    references: &'a [Reference],
}

// ---------------------------------------------------------------------------
// ArticleStore
// ---------------------------------------------------------------------------

/// Client for the article store API.
pub struct ArticleStore {
    client: reqwest::Client,
    base_url: String,
}

impl ArticleStore {
    /// Create a store client from the store section of the app config.
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ArticleLiftError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch the full article backlog.
    ///
    /// This is the one call whose failure is fatal to a pipeline run.
    #[instrument(skip(self))]
    pub async fn fetch_articles(&self) -> Result<Vec<Article>> {
        let url = format!("{}/articles", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ArticleLiftError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArticleLiftError::Provider(format!(
                "article store returned HTTP {status}"
            )));
        }

        let envelope: Envelope<Vec<Article>> = response
            .json()
            .await
            .map_err(|e| ArticleLiftError::Provider(format!("malformed article list: {e}")))?;

        if !envelope.success {
            return Err(ArticleLiftError::Provider(
                "article store reported success=false for article list".into(),
            ));
        }

        let articles = envelope.data.unwrap_or_default();
        debug!(count = articles.len(), "fetched article backlog");
        Ok(articles)
    }

    /// Persist an enhancement as one atomic update.
    #[instrument(skip(self, enhancement), fields(article_id = %id))]
    pub async fn update_article(&self, id: &ArticleId, enhancement: &EnhancementResult) -> Result<()> {
        let url = format!("{}/articles/{id}", self.base_url);
        let body = UpdateArticleBody {
            updated_content: &enhancement.updated_content,
            is_updated: true,
            references: &enhancement.references,
        };

        let response = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ArticleLiftError::Persistence(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArticleLiftError::Persistence(format!(
                "article store returned HTTP {status} for update"
            )));
        }

        let envelope: Envelope<Article> = response
            .json()
            .await
            .map_err(|e| ArticleLiftError::Persistence(format!("malformed update response: {e}")))?;

        if !envelope.success {
            return Err(ArticleLiftError::Persistence(
                "article store reported success=false for update".into(),
            ));
        }

        debug!("article updated");
        Ok(())
    }

    /// Create a new (seed) article.
    #[instrument(skip(self, article), fields(title = %article.title))]
    pub async fn create_article(&self, article: &NewArticle) -> Result<Article> {
        let url = format!("{}/articles", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(article)
            .send()
            .await
            .map_err(|e| ArticleLiftError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArticleLiftError::Provider(format!(
                "article store returned HTTP {status} for create"
            )));
        }

        let envelope: Envelope<Article> = response
            .json()
            .await
            .map_err(|e| ArticleLiftError::Provider(format!("malformed create response: {e}")))?;

        match envelope.data {
            Some(created) if envelope.success => Ok(created),
            _ => Err(ArticleLiftError::Provider(
                "article store reported success=false for create".into(),
            )),
        }
    }
}
