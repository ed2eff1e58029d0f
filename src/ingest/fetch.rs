// src/ingest/fetch.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::NetworkConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Single GET with a bounded timeout. Errors are transport failures only; a
/// non-200 status is a successful fetch with that status.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchResponse>;
}

pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(cfg: &NetworkConfig) -> Result<Self> {
        if !cfg.tls_verify {
            tracing::warn!(target: "fetch", "TLS certificate verification disabled");
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .danger_accept_invalid_certs(!cfg.tls_verify)
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .bytes()
            .await
            .with_context(|| format!("reading body of {url}"))?
            .to_vec();
        Ok(FetchResponse {
            status,
            content_type,
            body,
        })
    }
}
