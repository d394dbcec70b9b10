use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::{Article, ArticleId, ExtractionState, NewArticle};
use crate::Result;

#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert or refresh raw candidates, deduplicated by URL. Returns the
    /// ids assigned to (or already held by) each distinct URL.
    async fn upsert_articles(
        &self,
        items: &[NewArticle],
        now: DateTime<Utc>,
    ) -> Result<Vec<ArticleId>>;

    /// Articles eligible for an extraction attempt: scraped since `cutoff`,
    /// non-terminal, below the attempt cap and past any cooldown.
    async fn extraction_candidates(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
        max_attempts: u32,
        limit: usize,
    ) -> Result<Vec<Article>>;

    /// Commit the outcome of a single extraction attempt.
    async fn update_extraction(&self, id: ArticleId, state: ExtractionState) -> Result<()>;

    /// Articles with successfully extracted content scraped since `cutoff`.
    async fn selectable_articles(&self, cutoff: DateTime<Utc>) -> Result<Vec<Article>>;

    /// Persist the score and selection reason for a picked article.
    async fn update_selection(&self, id: ArticleId, score: f64, reason: &str) -> Result<()>;

    async fn get_article(&self, id: ArticleId) -> Result<Article>;
}
