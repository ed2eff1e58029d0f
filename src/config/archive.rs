// src/config/archive.rs
use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDate, Weekday};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

use crate::ingest::harvest::LinkFilter;
use crate::ingest::types::SourceEndpoint;
use crate::issue::IssueNaming;
use crate::schedule::ExpectedSchedule;

pub const ENV_CONFIG_PATH: &str = "ARCHIVER_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/archiver.toml";

fn default_suffix() -> String {
    ".pdf".to_string()
}
fn default_content_type_marker() -> String {
    "pdf".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_true() -> bool {
    true
}
fn default_rate_limit_ms() -> u64 {
    2_000
}
fn default_one() -> usize {
    1
}
fn default_download_concurrency() -> usize {
    2
}
fn default_user_agent() -> String {
    concat!("mygov-archiver/", env!("CARGO_PKG_VERSION")).to_string()
}
fn default_query_template() -> String {
    "{keyword} {date} pdf".to_string()
}
fn default_max_results() -> usize {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    /// Substring every issue URL must contain, e.g. "MyGov".
    pub keyword: String,
    /// Leading word of canonical filenames; defaults to `keyword`.
    #[serde(default)]
    pub filename_prefix: Option<String>,
    #[serde(default = "default_suffix")]
    pub suffix: String,
    /// Zero-pad the day in canonical filenames ("May 06, 2025").
    #[serde(default)]
    pub filename_pad_day: bool,
    /// Downloads are only written when `Content-Type` contains this.
    #[serde(default = "default_content_type_marker")]
    pub content_type_marker: String,
    /// Other-language markers; a filename containing any of these is skipped.
    #[serde(default)]
    pub exclude_markers: Vec<String>,
    /// Target-language markers the "latest" workflow requires (at least one).
    #[serde(default)]
    pub require_markers: Vec<String>,
    /// Listing pages, highest priority first.
    #[serde(default)]
    pub sources: Vec<SourceEndpoint>,
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    /// Quoted ISO date, e.g. "2022-09-06".
    pub start: NaiveDate,
    /// Inclusive; today when omitted.
    #[serde(default)]
    pub end: Option<NaiveDate>,
    /// "Tuesday", "tue", ...
    pub anchor_weekday: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_true")]
    pub tls_verify: bool,
    /// Cooldown after every outbound call, per slot. 0 disables pacing.
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
    #[serde(default = "default_one")]
    pub source_concurrency: usize,
    #[serde(default = "default_download_concurrency")]
    pub download_concurrency: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            tls_verify: true,
            rate_limit_ms: default_rate_limit_ms(),
            source_concurrency: 1,
            download_concurrency: default_download_concurrency(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub enabled: bool,
    /// `{keyword}` and `{date}` are substituted.
    #[serde(default = "default_query_template")]
    pub query_template: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            query_template: default_query_template(),
            max_results: default_max_results(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub dir: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub desktop: bool,
    #[serde(default)]
    pub email_to: Option<String>,
}

impl ArchiveConfig {
    /// Resolution order: explicit path, `$ARCHIVER_CONFIG_PATH`, `config/archiver.toml`.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => std::env::var(ENV_CONFIG_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
        };
        Self::load_from_file(&path)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: ArchiveConfig = toml::from_str(s).context("parsing archiver config")?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    fn normalize(&mut self) {
        self.keyword = self.keyword.trim().to_string();
        for src in &mut self.sources {
            src.name = src.name.trim().to_string();
            src.url = src.url.trim().to_string();
        }
        self.network.source_concurrency = self.network.source_concurrency.max(1);
        self.network.download_concurrency = self.network.download_concurrency.max(1);
    }

    /// Errors here abort the run; there is nothing useful to do without them.
    fn validate(&self) -> Result<()> {
        if self.keyword.is_empty() {
            bail!("`keyword` must not be empty");
        }
        if self.sources.is_empty() {
            bail!("no source endpoints configured");
        }
        for src in &self.sources {
            let url = Url::parse(&src.url)
                .with_context(|| format!("source {:?} has an invalid url {:?}", src.name, src.url))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                bail!("source {:?} must use http(s), got {}", src.name, url.scheme());
            }
        }
        self.anchor_weekday()?;
        Ok(())
    }

    pub fn anchor_weekday(&self) -> Result<Weekday> {
        self.schedule
            .anchor_weekday
            .trim()
            .parse::<Weekday>()
            .map_err(|_| anyhow!("invalid anchor_weekday {:?}", self.schedule.anchor_weekday))
    }

    pub fn schedule(&self, today: NaiveDate) -> Result<ExpectedSchedule> {
        let end = self.schedule.end.unwrap_or(today);
        Ok(ExpectedSchedule::new(self.schedule.start, end, self.anchor_weekday()?))
    }

    pub fn naming(&self) -> IssueNaming {
        let prefix = self
            .filename_prefix
            .clone()
            .unwrap_or_else(|| self.keyword.clone());
        IssueNaming::new(prefix, self.suffix.clone()).with_padded_day(self.filename_pad_day)
    }

    /// Filter for backfill harvesting and search results.
    pub fn link_filter(&self) -> LinkFilter {
        LinkFilter::new(&self.keyword, &self.suffix).excluding(&self.exclude_markers)
    }

    /// Backfill filter plus a positive target-language check.
    pub fn latest_filter(&self) -> LinkFilter {
        self.link_filter().requiring(&self.require_markers)
    }
}
