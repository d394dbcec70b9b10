use chrono::{DateTime, Duration, Utc};
use nd_core::{ArticleStore, ContentExtractor, ExtractionState, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub window_hours: i64,
    pub batch_size: usize,
    pub max_attempts: u32,
    pub backoff_base_minutes: i64,
    pub backoff_multiplier: i64,
    /// Hostnames never attempted; matching articles go straight to
    /// `Skipped` without consuming an attempt.
    pub skip_domains: HashSet<String>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            window_hours: 10,
            batch_size: 30,
            max_attempts: 3,
            backoff_base_minutes: 5,
            backoff_multiplier: 6,
            skip_domains: HashSet::new(),
        }
    }
}

/// Counters for one extraction pass. `rescheduled` counts attempts that
/// failed but earned another try after a cooldown; `failed` counts articles
/// whose attempt budget is exhausted for good.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractStats {
    pub attempted: usize,
    pub succeeded: usize,
    pub rescheduled: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ExtractStats {
    fn merge(&mut self, other: ExtractStats) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        self.rescheduled += other.rescheduled;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

/// Cooldown before the next attempt, given how many attempts have now been
/// made: base * multiplier^(attempts - 1).
fn backoff_minutes(base: i64, multiplier: i64, attempts: u32) -> i64 {
    base * multiplier.pow(attempts.saturating_sub(1))
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
}

/// Drives per-article extraction attempts: drains eligible candidates from
/// the store, applies the skip-list, invokes the extractor, and advances
/// each article's retry state. Sequential on purpose; one runner at a time.
pub struct ExtractionScheduler {
    store: Arc<dyn ArticleStore>,
    extractor: Arc<dyn ContentExtractor>,
    config: SchedulerConfig,
}

impl ExtractionScheduler {
    pub fn new(
        store: Arc<dyn ArticleStore>,
        extractor: Arc<dyn ContentExtractor>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            store,
            extractor,
            config,
        }
    }

    pub async fn run_pass(&self) -> Result<ExtractStats> {
        self.run_pass_at(Utc::now()).await
    }

    /// One extraction pass over up to `batch_size` eligible articles.
    /// Extraction failures never abort the rest of the batch; each outcome
    /// is committed per article.
    pub async fn run_pass_at(&self, now: DateTime<Utc>) -> Result<ExtractStats> {
        let cutoff = now - Duration::hours(self.config.window_hours);
        let candidates = self
            .store
            .extraction_candidates(cutoff, now, self.config.max_attempts, self.config.batch_size)
            .await?;

        if candidates.is_empty() {
            debug!("no articles need extraction");
            return Ok(ExtractStats::default());
        }

        info!(count = candidates.len(), "attempting extraction");
        let mut stats = ExtractStats {
            attempted: candidates.len(),
            ..ExtractStats::default()
        };

        for article in &candidates {
            if let Some(host) = host_of(&article.url) {
                if self.config.skip_domains.contains(&host) {
                    debug!(id = %article.id, %host, "domain on skip-list");
                    self.store
                        .update_extraction(article.id, ExtractionState::Skipped)
                        .await?;
                    stats.skipped += 1;
                    continue;
                }
            }

            match self.extractor.extract(&article.url).await {
                Ok(text) => {
                    info!(id = %article.id, chars = text.len(), "extraction succeeded");
                    self.store
                        .update_extraction(article.id, ExtractionState::Ok { text })
                        .await?;
                    stats.succeeded += 1;
                }
                Err(failure) => {
                    let attempts = article.extraction.attempts() + 1;
                    let state = if attempts < self.config.max_attempts {
                        let wait = backoff_minutes(
                            self.config.backoff_base_minutes,
                            self.config.backoff_multiplier,
                            attempts,
                        );
                        warn!(
                            id = %article.id,
                            error = %failure,
                            attempts,
                            cooldown_minutes = wait,
                            "extraction failed, retry scheduled"
                        );
                        stats.rescheduled += 1;
                        ExtractionState::PendingRetry {
                            attempts,
                            next_at: now + Duration::minutes(wait),
                        }
                    } else {
                        warn!(
                            id = %article.id,
                            error = %failure,
                            attempts,
                            "extraction failed, attempts exhausted"
                        );
                        stats.failed += 1;
                        ExtractionState::Failed { attempts }
                    };
                    self.store.update_extraction(article.id, state).await?;
                }
            }
        }

        info!(?stats, "extraction pass complete");
        Ok(stats)
    }

    /// Run passes until one finds nothing eligible. Articles cooling down
    /// or in a terminal state are excluded by the candidate query, so this
    /// converges once the pool is drained.
    pub async fn run_until_drained(&self) -> Result<ExtractStats> {
        let mut total = ExtractStats::default();
        loop {
            let stats = self.run_pass().await?;
            if stats.attempted == 0 {
                break;
            }
            total.merge(stats);
        }
        Ok(total)
    }
}
