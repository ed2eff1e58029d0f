// src/download.rs
use metrics::counter;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::ingest::fetch::{FetchResponse, HttpFetch};
use crate::pace::Pacer;
use crate::storage::Storage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Saved(PathBuf),
    /// The server answered, but not with the document we want. Nothing was written.
    Rejected(String),
    Failed(String),
    Cancelled,
}

impl DownloadOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, DownloadOutcome::Saved(_))
    }
}

/// Status must be 200 and the declared content type must contain `marker`.
pub fn validate_response(resp: &FetchResponse, marker: &str) -> Result<(), String> {
    if resp.status != 200 {
        return Err(format!("status {}", resp.status));
    }
    let ct = resp.content_type.as_deref().unwrap_or_default();
    if !ct.to_lowercase().contains(&marker.to_lowercase()) {
        return Err(format!("unexpected content type {ct:?}"));
    }
    Ok(())
}

/// Single-attempt fetch-validate-write.
pub struct Downloader {
    fetcher: Arc<dyn HttpFetch>,
    storage: Arc<dyn Storage>,
    content_type_marker: String,
    pacer: Pacer,
}

impl Downloader {
    pub fn new(
        fetcher: Arc<dyn HttpFetch>,
        storage: Arc<dyn Storage>,
        content_type_marker: &str,
        pacer: Pacer,
    ) -> Self {
        Self {
            fetcher,
            storage,
            content_type_marker: content_type_marker.to_string(),
            pacer,
        }
    }

    pub fn concurrency(&self) -> usize {
        self.pacer.slots()
    }

    pub async fn download(
        &self,
        url: &str,
        filename: &str,
        cancel: &CancellationToken,
    ) -> DownloadOutcome {
        if cancel.is_cancelled() {
            return DownloadOutcome::Cancelled;
        }
        tracing::info!(target: "download", %url, %filename, "downloading");

        let resp = match self.pacer.run(cancel, self.fetcher.get(url)).await {
            Ok(r) => r,
            Err(e) => {
                counter!("download_errors_total").increment(1);
                tracing::error!(target: "download", %url, error = %format!("{e:#}"), "download failed");
                return DownloadOutcome::Failed(format!("{e:#}"));
            }
        };
        if let Err(reason) = validate_response(&resp, &self.content_type_marker) {
            counter!("download_rejected_total").increment(1);
            tracing::error!(target: "download", %url, %reason, "response rejected; nothing written");
            return DownloadOutcome::Rejected(reason);
        }

        match self.storage.write(filename, &resp.body).await {
            Ok(path) => {
                counter!("download_saved_total").increment(1);
                tracing::info!(target: "download", path = %path.display(), "saved");
                DownloadOutcome::Saved(path)
            }
            Err(e) => {
                counter!("download_errors_total").increment(1);
                tracing::error!(target: "download", %filename, error = %format!("{e:#}"), "write failed");
                DownloadOutcome::Failed(format!("{e:#}"))
            }
        }
    }
}
