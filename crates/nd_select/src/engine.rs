use chrono::{DateTime, Duration, Utc};
use nd_core::{ArticleId, ArticleStore, Result};
use std::sync::Arc;
use tracing::info;

use crate::ranker::{select_top_diverse, SelectionConfig};

/// Runs a selection pass over the extracted pool and persists the outcome
/// on each picked article.
pub struct SelectionEngine {
    store: Arc<dyn ArticleStore>,
    config: SelectionConfig,
}

impl SelectionEngine {
    pub fn new(store: Arc<dyn ArticleStore>, config: SelectionConfig) -> Self {
        Self { store, config }
    }

    pub async fn pick_and_mark(&self) -> Result<Vec<ArticleId>> {
        self.pick_and_mark_at(Utc::now()).await
    }

    /// Select up to `final_n` articles, write `importance_score` and
    /// `reason_selected` on each, and return the ranked id list. Given the
    /// same pool and `now`, the result is identical run to run.
    pub async fn pick_and_mark_at(&self, now: DateTime<Utc>) -> Result<Vec<ArticleId>> {
        let cutoff = now - Duration::hours(self.config.window_hours);
        let pool = self.store.selectable_articles(cutoff).await?;
        info!(pool = pool.len(), "running selection");

        let picked = select_top_diverse(pool, &self.config, now);

        let mut ids = Vec::with_capacity(picked.len());
        for (rank, selected) in picked.iter().enumerate() {
            let reason = format!("rank={};topic={}", rank + 1, selected.topic);
            self.store
                .update_selection(selected.article.id, selected.score, &reason)
                .await?;
            ids.push(selected.article.id);
        }

        info!(selected = ids.len(), "selection complete");
        Ok(ids)
    }
}
