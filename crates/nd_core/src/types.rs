use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the store when an article is first ingested.
/// Ordered so ranking ties can be broken deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArticleId(pub i64);

impl std::fmt::Display for ArticleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extraction lifecycle of an article. `Ok`, `Failed` and `Skipped` are
/// terminal; only `Unset` and a due `PendingRetry` are eligible for another
/// attempt. Body text lives inside `Ok`, so content without a successful
/// extraction (or a cooldown on a finished article) cannot be represented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionState {
    Unset,
    PendingRetry {
        attempts: u32,
        next_at: DateTime<Utc>,
    },
    Ok {
        text: String,
    },
    Failed {
        attempts: u32,
    },
    Skipped,
}

impl ExtractionState {
    pub fn attempts(&self) -> u32 {
        match self {
            ExtractionState::PendingRetry { attempts, .. } => *attempts,
            ExtractionState::Failed { attempts } => *attempts,
            _ => 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExtractionState::Ok { .. } | ExtractionState::Failed { .. } | ExtractionState::Skipped
        )
    }

    pub fn content_text(&self) -> Option<&str> {
        match self {
            ExtractionState::Ok { text } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    pub source: String,
    pub title: String,
    pub url: String,
    pub category: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub scraped_at: DateTime<Utc>,
    pub extraction: ExtractionState,
    pub importance_score: Option<f64>,
    pub reason_selected: Option<String>,
}

impl Article {
    /// Whether this article is a candidate for an extraction pass: scraped
    /// inside the window, not in a terminal state, below the attempt cap,
    /// and not cooling down.
    pub fn needs_extraction(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
        max_attempts: u32,
    ) -> bool {
        if self.scraped_at < cutoff {
            return false;
        }
        match &self.extraction {
            ExtractionState::Unset => true,
            ExtractionState::PendingRetry { attempts, next_at } => {
                *attempts < max_attempts && *next_at <= now
            }
            _ => false,
        }
    }
}

/// Raw candidate record handed over by ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewArticle {
    pub source: String,
    pub title: String,
    pub url: String,
    pub category: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}
