// src/ingest/harvest.rs
//! Pull candidate document links out of one listing page.

use metrics::counter;
use once_cell::sync::OnceCell;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use url::Url;

use crate::ingest::fetch::HttpFetch;
use crate::ingest::types::{Candidate, HarvestOutcome, SourceEndpoint};

/// Which hrefs count as issues. All comparisons are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFilter {
    keyword: String,
    suffix: String,
    exclude: Vec<String>,
    require: Vec<String>,
}

impl LinkFilter {
    pub fn new(keyword: &str, suffix: &str) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
            suffix: suffix.to_lowercase(),
            exclude: Vec::new(),
            require: Vec::new(),
        }
    }

    /// Reject any filename containing one of these markers (other-language editions).
    pub fn excluding<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude = lowered(markers);
        self
    }

    /// Additionally require at least one of these markers in the filename.
    pub fn requiring<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.require = lowered(markers);
        self
    }

    /// Suffix and keyword both checked on the decoded URL path. The host never
    /// counts: every file on a site named after the keyword would pass otherwise.
    pub fn matches_url(&self, url: &str) -> bool {
        let path = match Url::parse(url) {
            Ok(u) => decode(u.path()),
            Err(_) => decode(url.split(['?', '#']).next().unwrap_or_default()),
        }
        .to_lowercase();
        path.ends_with(&self.suffix) && path.contains(&self.keyword)
    }

    /// Language markers checked against the decoded filename. Exclusion always wins.
    pub fn accepts_filename(&self, filename: &str) -> bool {
        let name = filename.to_lowercase();
        if self.exclude.iter().any(|m| name.contains(m.as_str())) {
            return false;
        }
        self.require.is_empty() || self.require.iter().any(|m| name.contains(m.as_str()))
    }

    pub fn accepts(&self, url: &str) -> bool {
        self.matches_url(url)
            && filename_from_url(url).is_some_and(|name| self.accepts_filename(&name))
    }
}

fn lowered<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn decode(s: &str) -> String {
    urlencoding::decode(s)
        .map(|c| c.into_owned())
        .unwrap_or_else(|_| s.to_string())
}

/// Decoded last path segment of `url`, e.g. `MyGov%20May%206%2C%202025.pdf` → `MyGov May 6, 2025.pdf`.
pub fn filename_from_url(url: &str) -> Option<String> {
    let raw = match Url::parse(url) {
        Ok(u) => u
            .path_segments()
            .and_then(|mut segs| segs.next_back().map(str::to_string)),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|p| p.rsplit('/').next())
            .map(str::to_string),
    }?;
    let name = decode(&raw).trim().to_string();
    (!name.is_empty()).then_some(name)
}

fn anchor_selector() -> &'static Selector {
    static SEL: OnceCell<Selector> = OnceCell::new();
    SEL.get_or_init(|| Selector::parse("a[href]").expect("anchor selector"))
}

/// Extract matching links from `html`, resolving relative hrefs against `page_url`.
/// Document order is kept; repeated URLs on one page are reported once.
pub fn extract_candidates(
    html: &str,
    page_url: &Url,
    filter: &LinkFilter,
    source_rank: usize,
) -> Vec<Candidate> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for element in document.select(anchor_selector()) {
        let Some(href) = element.value().attr("href").map(str::trim) else {
            continue;
        };
        if href.is_empty()
            || href.starts_with('#')
            || href.starts_with("javascript:")
            || href.starts_with("mailto:")
        {
            continue;
        }
        let Ok(resolved) = page_url.join(href) else {
            continue;
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }
        let url = resolved.to_string();
        if !filter.matches_url(&url) {
            continue;
        }
        let Some(filename) = filename_from_url(&url) else {
            continue;
        };
        if !filter.accepts_filename(&filename) {
            tracing::debug!(target: "harvest", %filename, "rejected by language markers");
            continue;
        }
        if seen.insert(url.clone()) {
            out.push(Candidate {
                filename,
                url,
                source_rank,
            });
        }
    }
    out
}

/// Fetches a listing page and turns it into candidates. Never fails past this
/// boundary: every problem becomes `HarvestOutcome::Failed` and is logged.
#[derive(Clone)]
pub struct LinkHarvester {
    fetcher: Arc<dyn HttpFetch>,
    filter: LinkFilter,
}

impl LinkHarvester {
    pub fn new(fetcher: Arc<dyn HttpFetch>, filter: LinkFilter) -> Self {
        Self { fetcher, filter }
    }

    pub fn filter(&self) -> &LinkFilter {
        &self.filter
    }

    pub async fn harvest(&self, endpoint: &SourceEndpoint, source_rank: usize) -> HarvestOutcome {
        let page_url = match Url::parse(&endpoint.url) {
            Ok(u) => u,
            Err(e) => return self.failed(endpoint, format!("invalid url: {e}")),
        };

        tracing::info!(target: "harvest", source = %endpoint.name, url = %endpoint.url, "scraping listing page");
        let resp = match self.fetcher.get(&endpoint.url).await {
            Ok(r) => r,
            Err(e) => return self.failed(endpoint, format!("{e:#}")),
        };
        if !resp.is_ok() {
            return self.failed(endpoint, format!("status {}", resp.status));
        }

        let candidates = extract_candidates(&resp.text(), &page_url, &self.filter, source_rank);
        counter!("harvest_candidates_total").increment(candidates.len() as u64);
        tracing::info!(
            target: "harvest",
            source = %endpoint.name,
            count = candidates.len(),
            "listing page harvested"
        );
        if candidates.is_empty() {
            HarvestOutcome::Empty
        } else {
            HarvestOutcome::Links(candidates)
        }
    }

    fn failed(&self, endpoint: &SourceEndpoint, reason: String) -> HarvestOutcome {
        tracing::warn!(target: "harvest", source = %endpoint.name, url = %endpoint.url, %reason, "source contributed nothing");
        counter!("harvest_source_errors_total").increment(1);
        HarvestOutcome::Failed(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SWAHILI: [&str; 12] = [
        "Januari", "Februari", "Machi", "Aprili", "Mei", "Juni", "Julai", "Agosti", "Septemba",
        "Oktoba", "Novemba", "Desemba",
    ];

    fn filter() -> LinkFilter {
        LinkFilter::new("MyGov", ".pdf").excluding(SWAHILI)
    }

    #[test]
    fn filename_is_decoded_last_segment() {
        let got = filename_from_url("https://gaa.go.ke/sites/default/files/2025/MyGov%20May%206%2C%202025.pdf");
        assert_eq!(got.as_deref(), Some("MyGov May 6, 2025.pdf"));
        assert_eq!(filename_from_url("https://gaa.go.ke/"), None);
    }

    #[test]
    fn suffix_and_keyword_are_case_insensitive() {
        let f = filter();
        assert!(f.matches_url("https://x.test/files/MYGOV%20May%206%2C%202025.PDF"));
        assert!(!f.matches_url("https://x.test/files/MyGov.docx"));
        assert!(!f.matches_url("https://x.test/files/Newsletter.pdf"));
    }

    #[test]
    fn keyword_in_host_alone_does_not_match() {
        let f = filter();
        assert!(!f.matches_url("https://www.mygov.go.ke/sites/default/files/Press%20Statement%2013%20May%202025.pdf"));
        assert!(f.matches_url("https://www.mygov.go.ke/sites/default/files/MyGov%20May%2013%2C%202025.pdf"));
        assert!(f.matches_url("https://cdn.test/mygov-issues/May%2013%2C%202025.pdf"));
    }

    #[test]
    fn unrelated_pdf_on_keyword_site_is_not_a_candidate() {
        let html = r#"
            <a href="/sites/default/files/Press%20Statement%2013%20May%202025.pdf">Press</a>
            <a href="/sites/default/files/MyGov%20May%2013%2C%202025.pdf">Issue</a>
        "#;
        let page = Url::parse("https://www.mygov.go.ke/mygov-newspaper-2025").unwrap();
        let got = extract_candidates(html, &page, &filter(), 0);
        let names: Vec<&str> = got.iter().map(|c| c.filename.as_str()).collect();
        assert_eq!(names, vec!["MyGov May 13, 2025.pdf"]);
    }

    #[test]
    fn exclusion_wins_in_either_order() {
        let f = filter().requiring(["September"]);
        assert!(!f.accepts_filename("MyGov Septemba September 5, 2023.pdf"));
        assert!(!f.accepts_filename("MyGov September Septemba 5, 2023.pdf"));
        assert!(f.accepts_filename("MyGov September 5, 2023.pdf"));
    }

    #[test]
    fn require_needs_a_positive_marker() {
        let f = filter().requiring(["May", "June"]);
        assert!(f.accepts_filename("MyGov June 3, 2025.pdf"));
        assert!(!f.accepts_filename("MyGov 2025-06.pdf"));
    }

    #[test]
    fn extracts_and_resolves_relative_links() {
        let html = r##"
            <html><body>
              <a href="/sites/default/files/2025/MyGov%20May%206%2C%202025.pdf">English</a>
              <a href="/sites/default/files/2025/MyGov%20Mei%206%2C%202025.pdf">Kiswahili</a>
              <a href="https://cdn.test/MyGov%20May%2013%2C%202025.PDF?dl=1">CDN</a>
              <a href="/sites/default/files/2025/MyGov%20May%206%2C%202025.pdf">duplicate</a>
              <a href="/about">About</a>
              <a href="#top">Top</a>
              <a href="mailto:info@example.test">Mail</a>
            </body></html>
        "##;
        let page = Url::parse("https://gaa.go.ke/index.php/mygov-newspaper-2025").unwrap();
        let got = extract_candidates(html, &page, &filter(), 3);
        assert_eq!(got.len(), 2);
        assert_eq!(got[0].filename, "MyGov May 6, 2025.pdf");
        assert_eq!(
            got[0].url,
            "https://gaa.go.ke/sites/default/files/2025/MyGov%20May%206%2C%202025.pdf"
        );
        assert_eq!(got[0].source_rank, 3);
        assert_eq!(got[1].filename, "MyGov May 13, 2025.PDF");
    }
}
