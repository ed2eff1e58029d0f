// tests/common/mod.rs
// Hand-written doubles for the async collaborator traits.
#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use mygov_archiver::ingest::fetch::{FetchResponse, HttpFetch};
use mygov_archiver::issue::LocalInventory;
use mygov_archiver::notify::{NotificationEvent, Notifier};
use mygov_archiver::search::WebSearcher;
use mygov_archiver::storage::Storage;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub const GAA_LISTING: &str = include_str!("../fixtures/gaa_listing.html");

pub fn html(body: &str) -> FetchResponse {
    FetchResponse {
        status: 200,
        content_type: Some("text/html; charset=utf-8".into()),
        body: body.as_bytes().to_vec(),
    }
}

pub fn pdf(bytes: &[u8]) -> FetchResponse {
    FetchResponse {
        status: 200,
        content_type: Some("application/pdf".into()),
        body: bytes.to_vec(),
    }
}

pub fn status(code: u16) -> FetchResponse {
    FetchResponse {
        status: code,
        content_type: Some("text/html".into()),
        body: Vec::new(),
    }
}

/// Canned responses keyed by URL; anything unknown is a transport error.
#[derive(Default)]
pub struct MockFetcher {
    routes: HashMap<String, FetchResponse>,
    pub calls: Mutex<Vec<String>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, resp: FetchResponse) -> Self {
        self.routes.insert(url.to_string(), resp);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpFetch for MockFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        self.calls.lock().unwrap().push(url.to_string());
        self.routes
            .get(url)
            .cloned()
            .ok_or_else(|| anyhow!("connection timed out: {url}"))
    }
}

/// Returns the same ranked list for every query and records the queries.
#[derive(Default)]
pub struct MockSearcher {
    results: Vec<String>,
    pub queries: Mutex<Vec<String>>,
}

impl MockSearcher {
    pub fn returning(results: &[&str]) -> Self {
        Self {
            results: results.iter().map(|s| s.to_string()).collect(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearcher for MockSearcher {
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<String>> {
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.results.iter().take(max_results).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// In-memory storage.
#[derive(Default)]
pub struct MemoryStorage {
    pub files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn with_files(names: &[&str]) -> Self {
        let files = names.iter().map(|n| (n.to_string(), b"%PDF".to_vec())).collect();
        Self {
            files: Mutex::new(files),
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn list(&self) -> Result<LocalInventory> {
        Ok(self.files.lock().unwrap().keys().cloned().collect())
    }

    async fn write(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.files
            .lock()
            .unwrap()
            .insert(filename.to_string(), bytes.to_vec());
        Ok(PathBuf::from(filename))
    }
}

pub struct RecordingNotifier(pub Arc<Mutex<Vec<NotificationEvent>>>);

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, ev: &NotificationEvent) -> Result<()> {
        self.0.lock().unwrap().push(ev.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Config with no pacing, given sources and schedule bounds.
pub fn config_toml(sources: &[(&str, &str)], start: &str, end: &str, search: bool) -> String {
    let mut s = format!(
        r#"
keyword = "MyGov"
exclude_markers = ["Januari", "Februari", "Machi", "Aprili", "Mei", "Juni", "Julai", "Agosti", "Septemba", "Oktoba", "Novemba", "Desemba"]
require_markers = ["January", "February", "March", "April", "May", "June", "July", "August", "September", "October", "November", "December"]

[schedule]
start = "{start}"
end = "{end}"
anchor_weekday = "Tuesday"

[network]
rate_limit_ms = 0
download_concurrency = 2

[search]
enabled = {search}
query_template = "{{keyword}} Digital Newspaper {{date}} pdf"

[storage]
dir = "unused"
"#
    );
    for (name, url) in sources {
        s.push_str(&format!("\n[[sources]]\nname = \"{name}\"\nurl = \"{url}\"\n"));
    }
    s
}
