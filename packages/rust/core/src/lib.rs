//! Pipeline orchestration for ArticleLift.
//!
//! Ties the finder, collector, rewrite engine, and article store together
//! into the per-article enhancement state machine, and hosts the seed
//! scraper that bootstraps the store with listing-page articles.

pub mod collector;
pub mod pipeline;
pub mod seed;

pub use collector::{CollectorOptions, ReferenceCollector};
pub use pipeline::{
    EnhancePipeline, Outcome, PipelineOptions, ProgressReporter, RunSummary, SilentProgress,
    SkipReason,
};
pub use seed::{SeedSummary, seed_articles};

/// Browser-identifying User-Agent for page fetches. Target sites may
/// reject unidentified clients, so we present as a desktop browser.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
