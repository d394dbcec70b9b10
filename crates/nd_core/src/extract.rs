use async_trait::async_trait;
use thiserror::Error;

/// Why a single extraction attempt produced no usable text. Transport
/// errors surface here only after the extractor's own bounded retry is
/// exhausted; scheduling the next article-level attempt is the caller's
/// concern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractFailure {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("aggregator redirect did not resolve to an external article")]
    RedirectUnresolved,

    #[error("HTTP {0}")]
    Http(u16),

    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("empty or tiny HTML body ({0} bytes)")]
    EmptyBody(usize),

    #[error("no article text found in page")]
    ParseFailed,

    #[error("text too short ({len} < {min})")]
    TooShort { len: usize, min: usize },
}

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    /// Fetch the page behind `url` and return its main body text, or the
    /// reason no text could be produced.
    async fn extract(&self, url: &str) -> std::result::Result<String, ExtractFailure>;
}
