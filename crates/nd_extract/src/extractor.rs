use async_trait::async_trait;
use nd_core::{ContentExtractor, ExtractFailure, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub request_timeout_secs: u64,
    /// Transport-level attempts per extraction call. This bounded retry is
    /// nested inside the article-level cooldown schedule, not a replacement
    /// for it.
    pub transport_retries: u32,
    pub min_content_length: usize,
    /// Hosts whose links are redirects to the real article.
    pub aggregator_domains: HashSet<String>,
    /// Hosts that reject the default header profile.
    pub anti_bot_domains: HashSet<String>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 10,
            transport_retries: 3,
            min_content_length: 100,
            aggregator_domains: ["news.google.com"].iter().map(|s| s.to_string()).collect(),
            anti_bot_domains: [
                "timesofindia.indiatimes.com",
                "www.theverge.com",
                "techcrunch.com",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
        ),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers
}

fn alternate_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0",
        ),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers
}

fn host_of(url: &str) -> std::result::Result<String, ExtractFailure> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .ok_or_else(|| ExtractFailure::InvalidUrl(url.to_string()))
}

fn map_transport(e: reqwest::Error) -> ExtractFailure {
    if e.is_timeout() {
        ExtractFailure::Timeout
    } else {
        ExtractFailure::Transport(e.to_string())
    }
}

/// A resolved aggregator redirect must land on a different host that is not
/// itself an aggregator.
fn is_external(original_host: &str, final_url: &Url, aggregators: &HashSet<String>) -> bool {
    match final_url.host_str() {
        Some(host) => host != original_host && !aggregators.contains(host),
        None => false,
    }
}

fn collect_paragraphs(document: &Html, selector: &Selector) -> Vec<String> {
    document
        .select(selector)
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Main body text of a page: paragraph text scoped to `<article>` when the
/// page has one, otherwise every paragraph.
fn body_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let scoped = Selector::parse("article p").unwrap();
    let any = Selector::parse("p").unwrap();

    let mut paragraphs = collect_paragraphs(&document, &scoped);
    if paragraphs.is_empty() {
        paragraphs = collect_paragraphs(&document, &any);
    }
    if paragraphs.is_empty() {
        None
    } else {
        Some(paragraphs.join("\n"))
    }
}

/// Validate a fetched page and pull its body text: rejects tiny HTML,
/// pages without paragraphs, and text shorter than `min`.
fn validated_text(html: &str, min: usize) -> std::result::Result<String, ExtractFailure> {
    if html.len() < 100 {
        return Err(ExtractFailure::EmptyBody(html.len()));
    }
    let text = body_text(html).ok_or(ExtractFailure::ParseFailed)?;
    let text = text.trim().to_string();
    if text.len() < min {
        return Err(ExtractFailure::TooShort {
            len: text.len(),
            min,
        });
    }
    Ok(text)
}

/// HTTP content extractor: resolves aggregator redirects, fetches with a
/// browser-like header profile (with an alternate profile for hosts that
/// reject it), and extracts validated body text.
pub struct HttpExtractor {
    client: reqwest::Client,
    alt_client: reqwest::Client,
    config: ExtractorConfig,
}

impl HttpExtractor {
    pub fn new(config: ExtractorConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.request_timeout_secs);
        let client = reqwest::Client::builder()
            .default_headers(browser_headers())
            .timeout(timeout)
            .build()?;
        let alt_client = reqwest::Client::builder()
            .default_headers(alternate_headers())
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            alt_client,
            config,
        })
    }

    async fn resolve_redirect(
        &self,
        url: &str,
        original_host: &str,
    ) -> std::result::Result<String, ExtractFailure> {
        let response = self.client.get(url).send().await.map_err(map_transport)?;
        let final_url = response.url().clone();
        if is_external(original_host, &final_url, &self.config.aggregator_domains) {
            debug!(resolved = %final_url, "aggregator redirect resolved");
            Ok(final_url.to_string())
        } else {
            Err(ExtractFailure::RedirectUnresolved)
        }
    }

    /// Header profiles to try within one attempt. The alternate profile
    /// goes first for known anti-bot hosts and on the final attempt, but a
    /// failed alternate fetch still falls through to the default profile
    /// before the attempt counts as spent.
    fn clients_for_attempt(&self, host: &str, attempt: u32, is_last: bool) -> Vec<&reqwest::Client> {
        if (self.config.anti_bot_domains.contains(host) && attempt == 0) || is_last {
            vec![&self.alt_client, &self.client]
        } else {
            vec![&self.client]
        }
    }

    async fn try_fetch(
        &self,
        client: &reqwest::Client,
        url: &str,
    ) -> std::result::Result<String, ExtractFailure> {
        let response = client.get(url).send().await.map_err(map_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractFailure::Http(status.as_u16()));
        }
        response.text().await.map_err(map_transport)
    }

    async fn fetch_html(
        &self,
        url: &str,
        host: &str,
    ) -> std::result::Result<String, ExtractFailure> {
        let retries = self.config.transport_retries.max(1);
        let mut last = ExtractFailure::Transport("no attempts made".to_string());

        for attempt in 0..retries {
            let is_last = attempt + 1 == retries;
            for client in self.clients_for_attempt(host, attempt, is_last) {
                match self.try_fetch(client, url).await {
                    Ok(body) => return Ok(body),
                    Err(e) => last = e,
                }
                warn!(%host, attempt, error = %last, "fetch attempt failed");
            }

            if !is_last {
                tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
            }
        }
        Err(last)
    }
}

#[async_trait]
impl ContentExtractor for HttpExtractor {
    async fn extract(&self, url: &str) -> std::result::Result<String, ExtractFailure> {
        let mut target = url.to_string();
        let mut host = host_of(&target)?;

        if self.config.aggregator_domains.contains(&host) {
            debug!(%host, "resolving aggregator redirect");
            target = self.resolve_redirect(&target, &host).await?;
            host = host_of(&target)?;
        }

        let html = self.fetch_html(&target, &host).await?;
        let text = match validated_text(&html, self.config.min_content_length) {
            Ok(text) => text,
            Err(failure) => {
                warn!(%host, bytes = html.len(), error = %failure, "fetched page failed validation");
                return Err(failure);
            }
        };

        info!(%host, chars = text.len(), "extracted article text");
        Ok(text)
    }
}
