//! Application configuration for ArticleLift.
//!
//! User config lives at `~/.articlelift/articlelift.toml`.
//! Environment variables override config file values, which override
//! defaults. API keys are never stored in the file — the config names the
//! env vars that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ArticleLiftError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "articlelift.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".articlelift";

/// Env var overriding the article store base URL.
const STORE_URL_ENV: &str = "ARTICLELIFT_STORE_URL";

/// Env var overriding the LLM provider base URL.
const LLM_BASE_URL_ENV: &str = "ARTICLELIFT_LLM_BASE_URL";

/// Env var overriding the LLM model identifier.
const LLM_MODEL_ENV: &str = "ARTICLELIFT_LLM_MODEL";

// ---------------------------------------------------------------------------
// Config structs (matching articlelift.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Article store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Search provider settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// LLM provider settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Pipeline pacing and thresholds.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Seed scraper settings.
    #[serde(default)]
    pub seed: SeedConfig,
}

/// `[store]` section — the external article CRUD API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL of the article store API.
    #[serde(default = "default_store_url")]
    pub base_url: String,

    /// Timeout in seconds for article-list and update calls.
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: default_store_url(),
            timeout_secs: default_store_timeout(),
        }
    }
}

fn default_store_url() -> String {
    "http://localhost:8000/api".into()
}
fn default_store_timeout() -> u64 {
    30
}

/// `[search]` section — the Serper-style search provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,

    /// Search endpoint URL.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    /// How many ranked results the provider is asked for.
    #[serde(default = "default_search_num")]
    pub requested_results: usize,

    /// Cap on usable results returned by the finder.
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_search_key_env(),
            endpoint: default_search_endpoint(),
            requested_results: default_search_num(),
            result_limit: default_result_limit(),
        }
    }
}

fn default_search_key_env() -> String {
    "SERPER_API_KEY".into()
}
fn default_search_endpoint() -> String {
    "https://google.serper.dev/search".into()
}
fn default_search_num() -> usize {
    5
}
fn default_result_limit() -> usize {
    2
}

/// `[llm]` section — the OpenAI-compatible chat-completion provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Name of the env var holding the API key.
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: String,

    /// Provider base URL (OpenAI-compatible).
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model identifier.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Output token budget per completion.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature (moderately varied prose over determinism).
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_llm_key_env(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_llm_key_env() -> String {
    "GROQ_API_KEY".into()
}
fn default_llm_base_url() -> String {
    "https://api.groq.com/openai/v1".into()
}
fn default_llm_model() -> String {
    "llama-3.3-70b-versatile".into()
}
fn default_max_tokens() -> u32 {
    2500
}
fn default_temperature() -> f32 {
    0.7
}

/// `[pipeline]` section — pacing, timeouts, and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Minimum usable search results required to attempt an enhancement.
    #[serde(default = "default_min_references")]
    pub min_references: usize,

    /// Timeout in seconds for fetching a single reference page.
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Pause between reference fetches (anti-bot politeness).
    #[serde(default = "default_fetch_delay")]
    pub fetch_delay_ms: u64,

    /// Pause between articles (aggregate provider throttle).
    #[serde(default = "default_article_delay")]
    pub article_delay_ms: u64,

    /// Character cap for extracted reference content.
    #[serde(default = "default_reference_max_chars")]
    pub reference_max_chars: usize,

    /// Character cap for each reference excerpt embedded in the prompt.
    #[serde(default = "default_excerpt_max_chars")]
    pub excerpt_max_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_references: default_min_references(),
            fetch_timeout_secs: default_fetch_timeout(),
            fetch_delay_ms: default_fetch_delay(),
            article_delay_ms: default_article_delay(),
            reference_max_chars: default_reference_max_chars(),
            excerpt_max_chars: default_excerpt_max_chars(),
        }
    }
}

fn default_min_references() -> usize {
    2
}
fn default_fetch_timeout() -> u64 {
    10
}
fn default_fetch_delay() -> u64 {
    1_000
}
fn default_article_delay() -> u64 {
    3_000
}
fn default_reference_max_chars() -> usize {
    3_000
}
fn default_excerpt_max_chars() -> usize {
    1_500
}

/// `[seed]` section — the bulk-seeding scraper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Blog listing URL to scrape seed articles from.
    #[serde(default = "default_seed_url")]
    pub listing_url: String,

    /// Maximum articles to seed in one run.
    #[serde(default = "default_seed_limit")]
    pub max_articles: usize,

    /// Character cap for seeded article excerpts.
    #[serde(default = "default_seed_max_chars")]
    pub content_max_chars: usize,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            listing_url: default_seed_url(),
            max_articles: default_seed_limit(),
            content_max_chars: default_seed_max_chars(),
        }
    }
}

fn default_seed_url() -> String {
    "https://beyondchats.com/blogs/".into()
}
fn default_seed_limit() -> usize {
    5
}
fn default_seed_max_chars() -> usize {
    1_000
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.articlelift/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ArticleLiftError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.articlelift/articlelift.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk, then apply env overrides.
/// Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    let mut config = if path.exists() {
        load_config_from(&path)?
    } else {
        tracing::debug!(?path, "config file not found, using defaults");
        AppConfig::default()
    };

    apply_env_overrides(&mut config);
    Ok(config)
}

/// Load the application config from a specific file path (no env overrides).
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ArticleLiftError::config(format!("failed to read {}: {e}", path.display()))
    })?;

    toml::from_str(&content)
        .map_err(|e| ArticleLiftError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Apply `ARTICLELIFT_*` env overrides on top of file/default values.
fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(url) = std::env::var(STORE_URL_ENV) {
        if !url.is_empty() {
            config.store.base_url = url;
        }
    }
    if let Ok(url) = std::env::var(LLM_BASE_URL_ENV) {
        if !url.is_empty() {
            config.llm.base_url = url;
        }
    }
    if let Ok(model) = std::env::var(LLM_MODEL_ENV) {
        if !model.is_empty() {
            config.llm.model = model;
        }
    }
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)
        .map_err(|e| ArticleLiftError::config(format!("create {}: {e}", dir.display())))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ArticleLiftError::config(e.to_string()))?;

    std::fs::write(&path, content)
        .map_err(|e| ArticleLiftError::config(format!("write {}: {e}", path.display())))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that both provider API key env vars are set and non-empty.
/// A missing required credential is fatal to the run.
pub fn validate_api_keys(config: &AppConfig) -> Result<()> {
    lookup_key(&config.search.api_key_env, "search provider")?;
    lookup_key(&config.llm.api_key_env, "LLM provider")?;
    Ok(())
}

/// Read a named API key env var, erroring with context when unset.
pub fn lookup_key(var_name: &str, provider: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(ArticleLiftError::config(format!(
            "{provider} API key not found. Set the {var_name} environment variable."
        ))),
    }
}
