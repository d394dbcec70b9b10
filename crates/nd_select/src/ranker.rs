use chrono::{DateTime, Utc};
use nd_core::Article;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::taxonomy::{normalize, TopicTaxonomy};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub window_hours: i64,
    /// Shortlist cap per source before global dedupe.
    pub per_source: usize,
    pub final_n: usize,
    /// Ordered topic -> quota mapping; order decides fill priority.
    pub topic_targets: Vec<(String, usize)>,
    pub taxonomy: TopicTaxonomy,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            window_hours: 10,
            per_source: 5,
            final_n: 10,
            topic_targets: vec![
                ("tech".to_string(), 4),
                ("finance".to_string(), 3),
                ("world".to_string(), 2),
                ("other".to_string(), 1),
            ],
            taxonomy: TopicTaxonomy::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScoredArticle {
    pub article: Article,
    pub topic: String,
    pub score: f64,
}

/// Score by recency plus matched keyword weight for the classified topic.
pub fn score_article(
    title: &str,
    scraped_at: DateTime<Utc>,
    topic: &str,
    taxonomy: &TopicTaxonomy,
    now: DateTime<Utc>,
) -> f64 {
    let age_hours = ((now - scraped_at).num_seconds() as f64 / 3600.0).max(0.0);
    let recency = 10.0 / (1.0 + age_hours);
    recency + taxonomy.keyword_weight(topic, &normalize(title))
}

/// Score descending, id ascending. The id leg keeps every sort and bucket
/// pop reproducible when scores tie.
fn rank_cmp(a: &ScoredArticle, b: &ScoredArticle) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.article.id.cmp(&b.article.id))
}

/// Diversity-constrained top-N selection: per-source shortlist, global
/// title dedupe, topic-quota fill in configured order, then score-ordered
/// backfill up to `final_n`.
pub fn select_top_diverse(
    pool: Vec<Article>,
    config: &SelectionConfig,
    now: DateTime<Utc>,
) -> Vec<ScoredArticle> {
    let taxonomy = &config.taxonomy;

    // Classify and score each article once.
    let scored: Vec<ScoredArticle> = pool
        .into_iter()
        .map(|article| {
            let topic = taxonomy
                .classify(&article.title, article.category.as_deref())
                .to_string();
            let score = score_article(&article.title, article.scraped_at, &topic, taxonomy, now);
            ScoredArticle {
                article,
                topic,
                score,
            }
        })
        .collect();

    // Per-source shortlist.
    let mut by_source: HashMap<String, Vec<ScoredArticle>> = HashMap::new();
    for s in scored {
        by_source
            .entry(s.article.source.clone())
            .or_default()
            .push(s);
    }
    let mut shortlisted: Vec<ScoredArticle> = Vec::new();
    for (_, mut group) in by_source {
        group.sort_by(rank_cmp);
        group.truncate(config.per_source);
        shortlisted.extend(group);
    }

    // Global dedupe by normalized title, best candidate first. Articles
    // whose title normalizes to nothing are dropped.
    shortlisted.sort_by(rank_cmp);
    let mut seen: HashSet<String> = HashSet::new();
    let mut deduped: Vec<ScoredArticle> = Vec::new();
    for s in shortlisted {
        let key = normalize(&s.article.title);
        if key.is_empty() {
            continue;
        }
        if seen.insert(key) {
            deduped.push(s);
        }
    }

    // Topic buckets, each best-first.
    let mut buckets: HashMap<String, Vec<ScoredArticle>> = HashMap::new();
    for s in deduped {
        buckets.entry(s.topic.clone()).or_default().push(s);
    }
    for bucket in buckets.values_mut() {
        bucket.sort_by(rank_cmp);
    }

    // Quota fill in configured topic order.
    let mut picked: Vec<ScoredArticle> = Vec::new();
    'targets: for (topic, target) in &config.topic_targets {
        for _ in 0..*target {
            if picked.len() >= config.final_n {
                break 'targets;
            }
            match buckets.get_mut(topic) {
                Some(bucket) if !bucket.is_empty() => picked.push(bucket.remove(0)),
                _ => break,
            }
        }
    }

    // Backfill from whatever is left, best first.
    if picked.len() < config.final_n {
        let mut remaining: Vec<ScoredArticle> = buckets.into_values().flatten().collect();
        remaining.sort_by(rank_cmp);
        for s in remaining {
            if picked.len() >= config.final_n {
                break;
            }
            picked.push(s);
        }
    }

    picked.truncate(config.final_n);
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::Topic;
    use chrono::Duration;
    use nd_core::{ArticleId, ExtractionState};

    fn article(id: i64, source: &str, title: &str, category: Option<&str>) -> Article {
        Article {
            id: ArticleId(id),
            source: source.to_string(),
            title: title.to_string(),
            url: format!("http://{}.com/{}", source, id),
            category: category.map(|c| c.to_string()),
            published_at: None,
            scraped_at: Utc::now(),
            extraction: ExtractionState::Ok {
                text: "body".to_string(),
            },
            importance_score: None,
            reason_selected: None,
        }
    }

    /// Taxonomy where each title is its own keyword, so tests can dial in
    /// exact scores (score = 10 recency + weight at age zero).
    fn scripted_taxonomy(tech: &[(&str, f64)], finance: &[(&str, f64)]) -> TopicTaxonomy {
        TopicTaxonomy {
            topics: vec![
                Topic {
                    name: "tech".to_string(),
                    category_hints: vec!["tech".to_string()],
                    keywords: tech.iter().map(|(k, w)| (k.to_string(), *w)).collect(),
                },
                Topic {
                    name: "finance".to_string(),
                    category_hints: vec!["finance".to_string()],
                    keywords: finance.iter().map(|(k, w)| (k.to_string(), *w)).collect(),
                },
            ],
            fallback: "other".to_string(),
        }
    }

    #[test]
    fn quota_order_governs_topic_priority() {
        let taxonomy = scripted_taxonomy(
            &[("t9", 9.0), ("t8", 8.0), ("t7", 7.0), ("t6", 6.0), ("t5", 5.0)],
            &[("f10", 10.0), ("f4", 4.0), ("f3", 3.0)],
        );
        let config = SelectionConfig {
            per_source: 5,
            final_n: 3,
            topic_targets: vec![("tech".to_string(), 2), ("finance".to_string(), 1)],
            taxonomy,
            ..SelectionConfig::default()
        };

        let now = Utc::now();
        let mut pool = Vec::new();
        for (i, title) in ["t9", "t8", "t7", "t6", "t5"].iter().enumerate() {
            let mut a = article(i as i64 + 1, &format!("s{}", i), title, Some("tech"));
            a.scraped_at = now;
            pool.push(a);
        }
        for (i, title) in ["f10", "f4", "f3"].iter().enumerate() {
            let mut a = article(i as i64 + 10, &format!("f{}", i), title, Some("finance"));
            a.scraped_at = now;
            pool.push(a);
        }

        let picked = select_top_diverse(pool, &config, now);
        let titles: Vec<&str> = picked.iter().map(|s| s.article.title.as_str()).collect();
        // Finance's best outscores every tech article, but the quota order
        // still puts the two tech picks first.
        assert_eq!(titles, vec!["t9", "t8", "f10"]);
    }

    #[test]
    fn per_source_shortlist_caps_each_source() {
        let now = Utc::now();
        let config = SelectionConfig {
            per_source: 1,
            final_n: 10,
            topic_targets: vec![("other".to_string(), 10)],
            taxonomy: TopicTaxonomy {
                topics: vec![],
                fallback: "other".to_string(),
            },
            ..SelectionConfig::default()
        };

        let mut pool = Vec::new();
        for i in 0..3 {
            let mut a = article(i + 1, "wire", &format!("story {}", i), None);
            // Older articles score lower; only the freshest survives.
            a.scraped_at = now - Duration::hours(i);
            pool.push(a);
        }
        let picked = select_top_diverse(pool, &config, now);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].article.id, ArticleId(1));
    }

    #[test]
    fn duplicate_titles_keep_the_higher_scored_copy() {
        let now = Utc::now();
        let config = SelectionConfig {
            final_n: 10,
            topic_targets: vec![("finance".to_string(), 10)],
            ..SelectionConfig::default()
        };

        let mut fresh = article(1, "a", "Fed Raises Rates", None);
        fresh.scraped_at = now;
        let mut stale = article(2, "b", "fed   raises rates!!", None);
        stale.scraped_at = now - Duration::hours(5);

        let picked = select_top_diverse(vec![stale, fresh], &config, now);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].article.id, ArticleId(1));
    }

    #[test]
    fn score_ties_break_by_ascending_id() {
        let now = Utc::now();
        let config = SelectionConfig {
            final_n: 3,
            topic_targets: vec![("other".to_string(), 3)],
            taxonomy: TopicTaxonomy {
                topics: vec![],
                fallback: "other".to_string(),
            },
            ..SelectionConfig::default()
        };

        let mut pool = Vec::new();
        for (id, title) in [(3, "gamma"), (1, "alpha"), (2, "beta")] {
            let mut a = article(id, &format!("s{}", id), title, None);
            a.scraped_at = now;
            pool.push(a);
        }
        let picked = select_top_diverse(pool, &config, now);
        let ids: Vec<ArticleId> = picked.iter().map(|s| s.article.id).collect();
        assert_eq!(ids, vec![ArticleId(1), ArticleId(2), ArticleId(3)]);
    }

    #[test]
    fn backfill_tops_up_after_quotas() {
        let taxonomy = scripted_taxonomy(&[("t1", 1.0)], &[("f5", 5.0), ("f2", 2.0)]);
        let config = SelectionConfig {
            final_n: 3,
            topic_targets: vec![("tech".to_string(), 1)],
            taxonomy,
            ..SelectionConfig::default()
        };

        let now = Utc::now();
        let mut pool = vec![
            article(1, "s1", "t1", Some("tech")),
            article(2, "s2", "f5", Some("finance")),
            article(3, "s3", "f2", Some("finance")),
        ];
        for a in &mut pool {
            a.scraped_at = now;
        }

        let picked = select_top_diverse(pool, &config, now);
        let titles: Vec<&str> = picked.iter().map(|s| s.article.title.as_str()).collect();
        // Tech quota first, then leftovers by score.
        assert_eq!(titles, vec!["t1", "f5", "f2"]);
    }

    #[test]
    fn result_never_exceeds_final_n() {
        let now = Utc::now();
        let config = SelectionConfig {
            final_n: 2,
            topic_targets: vec![("other".to_string(), 10)],
            taxonomy: TopicTaxonomy {
                topics: vec![],
                fallback: "other".to_string(),
            },
            ..SelectionConfig::default()
        };
        let pool = (1..=5)
            .map(|i| article(i, &format!("s{}", i), &format!("title {}", i), None))
            .collect();
        let picked = select_top_diverse(pool, &config, now);
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn recency_term_decays_with_age() {
        let now = Utc::now();
        let taxonomy = TopicTaxonomy::default();
        let fresh = score_article("quiet title", now, "other", &taxonomy, now);
        let aged = score_article(
            "quiet title",
            now - Duration::hours(9),
            "other",
            &taxonomy,
            now,
        );
        assert!((fresh - 10.0).abs() < 1e-9);
        assert!((aged - 1.0).abs() < 1e-9);
    }
}
