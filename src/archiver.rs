//! # Archiver
//! Wires the pieces into the two workflows:
//!
//! - `check_latest`: newest listed issue only, downloaded if not yet held;
//! - `backfill`: every scheduled issue that is missing, with search fallback
//!   for gaps no listing page carries.
//!
//! `plan` is the side-effect-free front half of `backfill`.

use anyhow::Result;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::ArchiveConfig;
use crate::download::{DownloadOutcome, Downloader};
use crate::gaps::{resolve_gaps, GapReport};
use crate::ingest::fetch::{HttpFetch, ReqwestFetcher};
use crate::ingest::harvest::LinkHarvester;
use crate::ingest::SourceAggregator;
use crate::issue::{Issue, IssueNaming};
use crate::latest::{pick_latest, LatestIssue};
use crate::metrics::ensure_metrics_described;
use crate::notify::{NotificationEvent, NotifierMux};
use crate::pace::Pacer;
use crate::schedule::ExpectedSchedule;
use crate::search::{NoopSearcher, SearchFallback, SerperSearcher, WebSearcher};
use crate::storage::{LocalDirStorage, Storage};

const APP_TITLE: &str = "MyGov Archiver";

/// External collaborators. Tests swap in mocks.
pub struct Collaborators {
    pub fetcher: Arc<dyn HttpFetch>,
    pub searcher: Arc<dyn WebSearcher>,
    pub storage: Arc<dyn Storage>,
    pub notifier: NotifierMux,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatestReport {
    NoneFound,
    AlreadyPresent { filename: String },
    Downloaded { filename: String, url: String },
    Failed { filename: String, reason: String },
    Cancelled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub expected: usize,
    pub satisfied: usize,
    pub searched: usize,
    pub downloaded: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub no_link: Vec<String>,
    pub cancelled: bool,
}

impl BackfillReport {
    pub fn summary(&self) -> String {
        format!(
            "expected {}, already held {}, downloaded {}, failed {}, no link {}",
            self.expected,
            self.satisfied,
            self.downloaded.len(),
            self.failed.len(),
            self.no_link.len()
        )
    }
}

pub struct Archiver {
    cfg: ArchiveConfig,
    naming: IssueNaming,
    schedule: ExpectedSchedule,
    backfill_sources: SourceAggregator,
    latest_sources: SourceAggregator,
    search: Option<SearchFallback>,
    downloader: Downloader,
    storage: Arc<dyn Storage>,
    notifier: NotifierMux,
}

impl Archiver {
    pub fn new(cfg: ArchiveConfig, deps: Collaborators, today: NaiveDate) -> Result<Self> {
        ensure_metrics_described();

        let interval = Duration::from_millis(cfg.network.rate_limit_ms);
        let source_pacer = Pacer::new(interval, cfg.network.source_concurrency);

        let backfill_sources = SourceAggregator::new(
            LinkHarvester::new(deps.fetcher.clone(), cfg.link_filter()),
            source_pacer.clone(),
        );
        let latest_sources = SourceAggregator::new(
            LinkHarvester::new(deps.fetcher.clone(), cfg.latest_filter()),
            source_pacer,
        );

        let search = cfg.search.enabled.then(|| {
            SearchFallback::new(
                deps.searcher.clone(),
                cfg.link_filter(),
                &cfg.keyword,
                &cfg.search.query_template,
                cfg.search.max_results,
                Pacer::new(interval, 1),
            )
        });

        let downloader = Downloader::new(
            deps.fetcher,
            deps.storage.clone(),
            &cfg.content_type_marker,
            Pacer::new(interval, cfg.network.download_concurrency),
        );

        Ok(Self {
            naming: cfg.naming(),
            schedule: cfg.schedule(today)?,
            backfill_sources,
            latest_sources,
            search,
            downloader,
            storage: deps.storage,
            notifier: deps.notifier,
            cfg,
        })
    }

    /// Real collaborators from config and environment. Fails if the output
    /// directory cannot be created or written.
    pub async fn from_config(cfg: ArchiveConfig) -> Result<Self> {
        let fetcher: Arc<dyn HttpFetch> = Arc::new(ReqwestFetcher::new(&cfg.network)?);
        let timeout = Duration::from_secs(cfg.network.timeout_secs);
        let searcher: Arc<dyn WebSearcher> = match SerperSearcher::from_env(timeout) {
            Some(s) => Arc::new(s?),
            None => {
                if cfg.search.enabled {
                    tracing::warn!(target: "search", "search enabled but SERPER_API_KEY unset; fallback finds nothing");
                }
                Arc::new(NoopSearcher)
            }
        };
        let storage: Arc<dyn Storage> = Arc::new(LocalDirStorage::open(&cfg.storage.dir).await?);
        let notifier = NotifierMux::from_config(&cfg.notify);
        let today = chrono::Local::now().date_naive();

        Self::new(
            cfg,
            Collaborators {
                fetcher,
                searcher,
                storage,
                notifier,
            },
            today,
        )
    }

    pub fn schedule(&self) -> &ExpectedSchedule {
        &self.schedule
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Harvest, snapshot storage and partition. Writes nothing, searches nothing.
    pub async fn plan(&self, cancel: &CancellationToken) -> Result<GapReport> {
        let links = self
            .backfill_sources
            .aggregate(&self.cfg.sources, cancel)
            .await;
        let inventory = self.storage.list().await?;
        tracing::info!(target: "archiver", links = links.len(), held = inventory.len(), "inputs collected");
        Ok(resolve_gaps(&self.schedule, &self.naming, &inventory, &links))
    }

    pub async fn backfill(&self, cancel: &CancellationToken) -> Result<BackfillReport> {
        let gaps = self.plan(cancel).await?;
        let mut report = BackfillReport {
            expected: gaps.expected(),
            satisfied: gaps.satisfied.len(),
            ..Default::default()
        };

        let mut jobs: Vec<Issue> = gaps.resolved;
        for issue in gaps.unresolved {
            let found = match &self.search {
                Some(search) if !cancel.is_cancelled() => {
                    report.searched += 1;
                    search.find(issue.date, cancel).await
                }
                _ => None,
            };
            match found {
                Some(url) => jobs.push(issue.with_url(url)),
                None => {
                    tracing::warn!(target: "archiver", filename = %issue.filename, "no link found");
                    report.no_link.push(issue.filename);
                }
            }
        }
        jobs.sort_by_key(|i| i.date);

        let outcomes: Vec<(Issue, DownloadOutcome)> = stream::iter(jobs)
            .map(|issue| async move {
                let url = issue.url.clone().unwrap_or_default();
                let outcome = self.downloader.download(&url, &issue.filename, cancel).await;
                (issue, outcome)
            })
            .buffer_unordered(self.downloader.concurrency())
            .collect()
            .await;

        for (issue, outcome) in outcomes {
            match outcome {
                DownloadOutcome::Saved(_) => report.downloaded.push(issue.filename),
                DownloadOutcome::Rejected(reason) | DownloadOutcome::Failed(reason) => {
                    report.failed.push((issue.filename, reason))
                }
                DownloadOutcome::Cancelled => report.cancelled = true,
            }
        }
        report.downloaded.sort();
        report.failed.sort();
        report.cancelled |= cancel.is_cancelled();

        tracing::info!(target: "archiver", summary = %report.summary(), "backfill finished");
        self.notifier
            .notify(&NotificationEvent::new(
                format!("{APP_TITLE}: backfill"),
                report.summary(),
            ))
            .await;
        Ok(report)
    }

    pub async fn check_latest(&self, cancel: &CancellationToken) -> Result<LatestReport> {
        let links = self.latest_sources.aggregate(&self.cfg.sources, cancel).await;
        if cancel.is_cancelled() {
            return Ok(LatestReport::Cancelled);
        }

        let Some(latest) = pick_latest(&links) else {
            tracing::warn!(target: "archiver", "no current issue found");
            self.notify(format!("No current {} issue found.", self.cfg.keyword))
                .await;
            return Ok(LatestReport::NoneFound);
        };
        // Exact dates are saved under the canonical name; vaguer ones keep the listed filename.
        let filename = if latest.is_exact() {
            self.naming.filename_for(latest.date)
        } else {
            latest.link.filename.clone()
        };
        tracing::info!(target: "archiver", %filename, listed_as = %latest.link.filename, date = %latest.date, source = %latest.link.source, "latest issue");

        if let Some(held) = self.held_copy(&latest, &filename).await? {
            tracing::info!(target: "archiver", %filename, %held, "latest issue already downloaded");
            self.notify(format!("Already downloaded: {filename}")).await;
            return Ok(LatestReport::AlreadyPresent { filename });
        }

        let report = match self
            .downloader
            .download(&latest.link.url, &filename, cancel)
            .await
        {
            DownloadOutcome::Saved(_) => LatestReport::Downloaded {
                filename: filename.clone(),
                url: latest.link.url.clone(),
            },
            DownloadOutcome::Rejected(reason) | DownloadOutcome::Failed(reason) => {
                LatestReport::Failed {
                    filename: filename.clone(),
                    reason,
                }
            }
            DownloadOutcome::Cancelled => LatestReport::Cancelled,
        };

        match &report {
            LatestReport::Downloaded { .. } => {
                self.notify(format!("Downloaded: {filename}")).await
            }
            LatestReport::Failed { .. } => {
                self.notify(format!("Failed to download: {filename}")).await
            }
            _ => {}
        }
        Ok(report)
    }

    /// Name under which the latest issue is already stored, if any: the target
    /// or listed spelling, or (for exact dates) any prefixed name with that date.
    async fn held_copy(&self, latest: &LatestIssue, filename: &str) -> Result<Option<String>> {
        if self.storage.exists(filename).await? {
            return Ok(Some(filename.to_string()));
        }
        let inventory = self.storage.list().await?;
        if inventory.contains(&latest.link.filename) {
            return Ok(Some(latest.link.filename.clone()));
        }
        if !latest.is_exact() {
            return Ok(None);
        }
        Ok(inventory
            .dates_held(&self.naming)
            .get(&latest.date)
            .map(|name| name.to_string()))
    }

    async fn notify(&self, message: String) {
        self.notifier
            .notify(&NotificationEvent::new(APP_TITLE, message))
            .await;
    }
}
