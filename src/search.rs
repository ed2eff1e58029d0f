// src/search.rs
//! Web-search fallback for issues no listing page carries.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::ingest::harvest::LinkFilter;
use crate::pace::Pacer;

/// Ranked result URLs for a query.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>>;
    fn name(&self) -> &'static str;
}

/// Used when no search API key is configured.
pub struct NoopSearcher;

#[async_trait]
impl WebSearcher for NoopSearcher {
    async fn search(&self, _query: &str, _max_results: usize) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

// --- Serper (Google Search) ---

pub struct SerperSearcher {
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, serde::Deserialize)]
struct SerperResponse {
    #[serde(default)]
    organic: Vec<SerperResult>,
}

#[derive(Debug, serde::Deserialize)]
struct SerperResult {
    #[serde(default)]
    link: String,
}

impl SerperSearcher {
    pub fn new(api_key: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building serper client")?;
        Ok(Self {
            api_key: api_key.to_string(),
            client,
        })
    }

    /// `SERPER_API_KEY` from the environment, if set and non-empty.
    pub fn from_env(timeout: Duration) -> Option<Result<Self>> {
        let key = std::env::var("SERPER_API_KEY").ok()?;
        let key = key.trim();
        (!key.is_empty()).then(|| Self::new(key, timeout))
    }
}

#[async_trait]
impl WebSearcher for SerperSearcher {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        let body = serde_json::json!({
            "q": query,
            "num": max_results,
        });

        let data: SerperResponse = self
            .client
            .post("https://google.serper.dev/search")
            .header("X-API-KEY", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("serper request failed")?
            .error_for_status()
            .context("serper non-2xx")?
            .json()
            .await
            .context("parsing serper response")?;

        Ok(data
            .organic
            .into_iter()
            .map(|r| r.link)
            .filter(|l| !l.is_empty())
            .take(max_results)
            .collect())
    }

    fn name(&self) -> &'static str {
        "serper"
    }
}

/// Best-effort lookup of a single missing issue. Every failure reads as "no link".
pub struct SearchFallback {
    searcher: Arc<dyn WebSearcher>,
    filter: LinkFilter,
    query_template: String,
    keyword: String,
    max_results: usize,
    pacer: Pacer,
}

impl SearchFallback {
    pub fn new(
        searcher: Arc<dyn WebSearcher>,
        filter: LinkFilter,
        keyword: &str,
        query_template: &str,
        max_results: usize,
        pacer: Pacer,
    ) -> Self {
        Self {
            searcher,
            filter,
            query_template: query_template.to_string(),
            keyword: keyword.to_string(),
            max_results: max_results.max(1),
            pacer,
        }
    }

    /// `{keyword}` and `{date}` ("May 06, 2025") are substituted into the template.
    pub fn query_for(&self, date: NaiveDate) -> String {
        self.query_template
            .replace("{keyword}", &self.keyword)
            .replace("{date}", &date.format("%B %d, %Y").to_string())
    }

    pub async fn find(&self, date: NaiveDate, cancel: &CancellationToken) -> Option<String> {
        if cancel.is_cancelled() {
            return None;
        }
        let query = self.query_for(date);
        tracing::info!(target: "search", searcher = self.searcher.name(), %query, "searching for missing issue");
        counter!("search_queries_total").increment(1);

        let results = self
            .pacer
            .run(cancel, self.searcher.search(&query, self.max_results))
            .await;
        let urls = match results {
            Ok(urls) => urls,
            Err(e) => {
                tracing::warn!(target: "search", error = %format!("{e:#}"), %query, "search failed; treating as no link");
                return None;
            }
        };

        let hit = urls.into_iter().find(|u| self.filter.accepts(u));
        match &hit {
            Some(url) => {
                counter!("search_hits_total").increment(1);
                tracing::info!(target: "search", %url, "search found a document");
            }
            None => tracing::info!(target: "search", %query, "no matching document in results"),
        }
        hit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct Fixed(Vec<&'static str>);

    #[async_trait]
    impl WebSearcher for Fixed {
        async fn search(&self, _q: &str, _n: usize) -> Result<Vec<String>> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct Broken;

    #[async_trait]
    impl WebSearcher for Broken {
        async fn search(&self, _q: &str, _n: usize) -> Result<Vec<String>> {
            Err(anyhow!("blocked"))
        }
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    fn fallback(searcher: Arc<dyn WebSearcher>) -> SearchFallback {
        SearchFallback::new(
            searcher,
            LinkFilter::new("MyGov", ".pdf").excluding(["Mei"]),
            "MyGov",
            "{keyword} Digital Newspaper {date} pdf",
            10,
            Pacer::immediate(),
        )
    }

    fn may6() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 6).unwrap()
    }

    #[test]
    fn query_embeds_formatted_date() {
        let fb = fallback(Arc::new(NoopSearcher));
        assert_eq!(fb.query_for(may6()), "MyGov Digital Newspaper May 06, 2025 pdf");
    }

    #[tokio::test]
    async fn first_matching_result_wins() {
        let fb = fallback(Arc::new(Fixed(vec![
            "https://news.test/article-about-mygov",
            "https://gaa.go.ke/files/MyGov%20Mei%206%2C%202025.pdf",
            "https://gaa.go.ke/files/MyGov%20May%206%2C%202025.pdf",
            "https://other.test/MyGov%20May%206%2C%202025.pdf",
        ])));
        let got = fb.find(may6(), &CancellationToken::new()).await;
        assert_eq!(
            got.as_deref(),
            Some("https://gaa.go.ke/files/MyGov%20May%206%2C%202025.pdf")
        );
    }

    #[tokio::test]
    async fn provider_failure_is_no_link() {
        let fb = fallback(Arc::new(Broken));
        assert_eq!(fb.find(may6(), &CancellationToken::new()).await, None);
    }

    #[tokio::test]
    async fn cancelled_run_skips_search() {
        let fb = fallback(Arc::new(Fixed(vec!["https://x.test/MyGov.pdf"])));
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert_eq!(fb.find(may6(), &cancel).await, None);
    }
}
