use serde::{Deserialize, Serialize};

/// Lowercase, strip everything but ASCII alphanumerics and spaces, collapse
/// whitespace. Used both as the title dedupe key and for keyword matching.
pub fn normalize(s: &str) -> String {
    let lowered = s.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    /// Substrings matched against the normalized feed category.
    #[serde(default)]
    pub category_hints: Vec<String>,
    /// Keyword -> weight table matched against the normalized title.
    #[serde(default)]
    pub keywords: Vec<(String, f64)>,
}

impl Topic {
    fn keyword_weight(&self, normalized_title: &str) -> f64 {
        self.keywords
            .iter()
            .filter(|(k, _)| normalized_title.contains(k.as_str()))
            .map(|(_, w)| w)
            .sum()
    }
}

/// Ordered topic tables driving classification and keyword scoring. Passed
/// in as configuration so callers and tests can swap the taxonomy out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicTaxonomy {
    pub topics: Vec<Topic>,
    pub fallback: String,
}

impl TopicTaxonomy {
    /// Topic for an article: category hints first (in taxonomy order), then
    /// the highest keyword-weight topic, then the fallback. Weight ties go
    /// to the earlier topic.
    pub fn classify(&self, title: &str, category: Option<&str>) -> &str {
        let c = normalize(category.unwrap_or(""));
        if !c.is_empty() {
            for topic in &self.topics {
                if topic.category_hints.iter().any(|h| c.contains(h.as_str())) {
                    return &topic.name;
                }
            }
        }

        let t = normalize(title);
        let mut best: Option<(&str, f64)> = None;
        for topic in &self.topics {
            let weight = topic.keyword_weight(&t);
            if weight > 0.0 && best.map_or(true, |(_, bw)| weight > bw) {
                best = Some((&topic.name, weight));
            }
        }
        best.map_or(self.fallback.as_str(), |(name, _)| name)
    }

    /// Summed weight of `topic`'s keywords found in an already-normalized
    /// title. Zero for unknown topics (including the fallback).
    pub fn keyword_weight(&self, topic: &str, normalized_title: &str) -> f64 {
        self.topics
            .iter()
            .find(|t| t.name == topic)
            .map_or(0.0, |t| t.keyword_weight(normalized_title))
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn weights(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
    pairs.iter().map(|(k, w)| (k.to_string(), *w)).collect()
}

impl Default for TopicTaxonomy {
    fn default() -> Self {
        Self {
            topics: vec![
                Topic {
                    name: "tech".to_string(),
                    category_hints: strings(&["tech", "technology", "ai", "startups"]),
                    keywords: weights(&[
                        ("openai", 2.0),
                        ("anthropic", 2.0),
                        ("google", 1.0),
                        ("microsoft", 1.0),
                        ("apple", 1.0),
                        ("nvidia", 1.5),
                        ("tesla", 0.8),
                        ("ai", 0.8),
                        ("llm", 1.0),
                        ("chip", 0.8),
                        ("gpu", 0.8),
                        ("cyber", 1.0),
                        ("security", 1.0),
                        ("breach", 1.2),
                        ("startup", 0.7),
                        ("funding", 0.9),
                    ]),
                },
                Topic {
                    name: "finance".to_string(),
                    category_hints: strings(&[
                        "finance", "business", "markets", "economy", "money",
                    ]),
                    keywords: weights(&[
                        ("stocks", 1.2),
                        ("equities", 1.2),
                        ("bond", 1.0),
                        ("bonds", 1.0),
                        ("yield", 1.0),
                        ("yields", 1.0),
                        ("forex", 1.0),
                        ("currency", 0.8),
                        ("rupee", 0.8),
                        ("dollar", 0.8),
                        ("oil", 0.8),
                        ("gold", 0.8),
                        ("inflation", 1.2),
                        ("cpi", 1.2),
                        ("gdp", 1.1),
                        ("interest rate", 1.2),
                        ("rates", 0.8),
                        ("fed", 1.2),
                        ("central bank", 1.2),
                        ("earnings", 1.0),
                        ("revenue", 0.6),
                        ("ipo", 0.8),
                        ("crypto", 0.8),
                        ("bitcoin", 0.8),
                    ]),
                },
                Topic {
                    name: "world".to_string(),
                    category_hints: strings(&[
                        "world",
                        "international",
                        "global",
                        "geopolitics",
                        "politics",
                    ]),
                    keywords: weights(&[
                        ("election", 0.8),
                        ("war", 1.0),
                        ("ceasefire", 1.0),
                        ("sanction", 1.0),
                        ("trade", 0.8),
                        ("tariff", 0.8),
                        ("diplomat", 0.6),
                        ("border", 0.6),
                    ]),
                },
            ],
            fallback: "other".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_case_whitespace_and_punctuation() {
        assert_eq!(normalize("Fed Raises Rates"), "fed raises rates");
        assert_eq!(normalize("fed   raises rates!!"), "fed raises rates");
        assert_eq!(normalize("  "), "");
    }

    #[test]
    fn category_hints_win_over_keywords() {
        let taxonomy = TopicTaxonomy::default();
        // The title screams tech but the feed category says business.
        assert_eq!(
            taxonomy.classify("OpenAI and Nvidia strike deal", Some("Business News")),
            "finance"
        );
    }

    #[test]
    fn keyword_fallback_picks_the_heaviest_topic() {
        let taxonomy = TopicTaxonomy::default();
        assert_eq!(
            taxonomy.classify("Fed signals interest rate cut", None),
            "finance"
        );
        assert_eq!(taxonomy.classify("OpenAI announces new model", None), "tech");
        assert_eq!(taxonomy.classify("Quiet day in the village", None), "other");
    }

    #[test]
    fn keyword_weight_sums_matches_for_the_topic_only() {
        let taxonomy = TopicTaxonomy::default();
        let t = normalize("Fed holds rates steady");
        // fed (1.2) + rates (0.8)
        assert!((taxonomy.keyword_weight("finance", &t) - 2.0).abs() < 1e-9);
        assert_eq!(taxonomy.keyword_weight("other", &t), 0.0);
    }
}
