//! Error types for ArticleLift.
//!
//! Library crates use [`ArticleLiftError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! The pipeline distinguishes recoverable conditions (a timeout on one
//! reference page, a provider returning garbage) from fatal ones (missing
//! credentials, the article backlog itself being unreachable). Recoverable
//! errors are absorbed at the collector or orchestrator level; only config
//! and backlog failures terminate a run.

/// Top-level error type for all ArticleLift operations.
#[derive(Debug, thiserror::Error)]
pub enum ArticleLiftError {
    /// Configuration loading or validation error. Fatal to the run.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transient network failure: timeout, connection refused, body read.
    /// Recoverable — skips the current unit of work.
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx or malformed payload from the search or LLM provider.
    /// Recoverable — same treatment as a network failure.
    #[error("provider error: {0}")]
    Provider(String),

    /// The LLM call errored or returned no content. Fatal to the current
    /// article only; the orchestrator moves on to the next one.
    #[error("rewrite failed: {0}")]
    Rewrite(String),

    /// Write to the article store failed. The article stays unprocessed
    /// and remains eligible for a future run.
    #[error("persistence error: {0}")]
    Persistence(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ArticleLiftError>;

impl ArticleLiftError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ArticleLiftError::config("missing SERPER_API_KEY");
        assert_eq!(err.to_string(), "config error: missing SERPER_API_KEY");

        let err = ArticleLiftError::Rewrite("completion had no choices".into());
        assert!(err.to_string().contains("no choices"));
    }
}
