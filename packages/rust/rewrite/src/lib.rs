//! LLM rewrite engine.
//!
//! Builds a single structured prompt from the original article plus the
//! collected reference articles and sends it to an OpenAI-compatible
//! chat-completion endpoint (Groq by default). The model is asked to
//! return only the rewritten body as markdown; a provider error or an
//! empty completion is a [`ArticleLiftError::Rewrite`], fatal to the
//! current article but never to the run.

mod prompt;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use articlelift_shared::{Article, ArticleLiftError, LlmConfig, ReferenceArticle, Result};

pub use prompt::build_prompt;

// ---------------------------------------------------------------------------
// Wire types (OpenAI chat-completion shape)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

// ---------------------------------------------------------------------------
// RewriteEngine
// ---------------------------------------------------------------------------

/// Client for the LLM provider's chat-completion endpoint.
pub struct RewriteEngine {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    excerpt_max_chars: usize,
}

impl RewriteEngine {
    /// Create an engine from the LLM section of the app config.
    pub fn new(config: &LlmConfig, api_key: impl Into<String>, excerpt_max_chars: usize) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(|e| ArticleLiftError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            excerpt_max_chars,
        })
    }

    /// Rewrite an article using the collected references as context.
    ///
    /// Returns the rewritten body as markdown.
    #[instrument(skip_all, fields(article_id = %article.id, references = references.len()))]
    pub async fn rewrite(&self, article: &Article, references: &[ReferenceArticle]) -> Result<String> {
        let prompt = build_prompt(article, references, self.excerpt_max_chars);
        debug!(prompt_len = prompt.len(), model = %self.model, "requesting rewrite");

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ArticleLiftError::Rewrite(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArticleLiftError::Rewrite(format!(
                "LLM provider returned HTTP {status}"
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ArticleLiftError::Rewrite(format!("malformed completion: {e}")))?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ArticleLiftError::Rewrite(
                "completion contained no content".into(),
            ));
        }

        debug!(len = content.len(), "rewrite complete");
        Ok(content)
    }
}

impl std::fmt::Debug for RewriteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteEngine")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}
