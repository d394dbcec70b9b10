use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nd_core::{Article, ArticleId, ArticleStore, Error, ExtractionState, NewArticle, Result};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Inner {
    articles: Vec<Article>,
    next_id: i64,
}

impl Inner {
    fn find_mut(&mut self, id: ArticleId) -> Result<&mut Article> {
        self.articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(Error::NotFound(id))
    }
}

/// In-memory article store. Single-process reference backend; URL is the
/// dedupe key and ids are assigned sequentially on first insert.
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleStore for MemoryStore {
    async fn upsert_articles(
        &self,
        items: &[NewArticle],
        now: DateTime<Utc>,
    ) -> Result<Vec<ArticleId>> {
        // Dedupe within the batch first; the last occurrence of a URL wins.
        let mut order: Vec<String> = Vec::new();
        let mut by_url: HashMap<String, &NewArticle> = HashMap::new();
        for item in items {
            let url = item.url.trim();
            if url.is_empty() {
                continue;
            }
            if !by_url.contains_key(url) {
                order.push(url.to_string());
            }
            by_url.insert(url.to_string(), item);
        }

        let mut inner = self.inner.write().await;
        let mut ids = Vec::with_capacity(order.len());
        for url in &order {
            let item = by_url[url];
            if let Some(existing) = inner.articles.iter_mut().find(|a| &a.url == url) {
                existing.source = item.source.clone();
                existing.title = item.title.trim().to_string();
                existing.category = item.category.clone();
                existing.published_at = item.published_at;
                existing.scraped_at = now;
                ids.push(existing.id);
            } else {
                inner.next_id += 1;
                let id = ArticleId(inner.next_id);
                inner.articles.push(Article {
                    id,
                    source: item.source.clone(),
                    title: item.title.trim().to_string(),
                    url: url.clone(),
                    category: item.category.clone(),
                    published_at: item.published_at,
                    scraped_at: now,
                    extraction: ExtractionState::Unset,
                    importance_score: None,
                    reason_selected: None,
                });
                ids.push(id);
            }
        }
        debug!(upserted = ids.len(), "articles upserted");
        Ok(ids)
    }

    async fn extraction_candidates(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
        max_attempts: u32,
        limit: usize,
    ) -> Result<Vec<Article>> {
        let inner = self.inner.read().await;
        let mut candidates: Vec<Article> = inner
            .articles
            .iter()
            .filter(|a| a.needs_extraction(cutoff, now, max_attempts))
            .cloned()
            .collect();
        candidates.sort_by_key(|a| a.id);
        candidates.truncate(limit);
        Ok(candidates)
    }

    async fn update_extraction(&self, id: ArticleId, state: ExtractionState) -> Result<()> {
        let mut inner = self.inner.write().await;
        let article = inner.find_mut(id)?;
        article.extraction = state;
        Ok(())
    }

    async fn selectable_articles(&self, cutoff: DateTime<Utc>) -> Result<Vec<Article>> {
        let inner = self.inner.read().await;
        Ok(inner
            .articles
            .iter()
            .filter(|a| a.scraped_at >= cutoff && a.extraction.content_text().is_some())
            .cloned()
            .collect())
    }

    async fn update_selection(&self, id: ArticleId, score: f64, reason: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        let article = inner.find_mut(id)?;
        article.importance_score = Some(score);
        article.reason_selected = Some(reason.to_string());
        Ok(())
    }

    async fn get_article(&self, id: ArticleId) -> Result<Article> {
        let inner = self.inner.read().await;
        inner
            .articles
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(Error::NotFound(id))
    }
}
