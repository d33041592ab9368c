//! Shared types, error model, and configuration for ArticleLift.
//!
//! This crate is the foundation depended on by all other ArticleLift crates.
//! It provides:
//! - [`ArticleLiftError`] — the unified error type
//! - Domain types ([`Article`], [`SearchResult`], [`ReferenceArticle`], [`EnhancementResult`])
//! - Configuration ([`AppConfig`], config loading, credential validation)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, LlmConfig, PipelineConfig, SearchConfig, SeedConfig, StoreConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, lookup_key, validate_api_keys,
};
pub use error::{ArticleLiftError, Result};
pub use types::{
    Article, ArticleId, EnhancementResult, Envelope, NewArticle, Reference, ReferenceArticle,
    SearchResult,
};
