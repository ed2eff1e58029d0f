// src/ingest/types.rs
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashMap;

use crate::dates::extract_issue_date;
use crate::issue::IssueNaming;

/// A listing page. Position in the configured list is its priority (0 = highest).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceEndpoint {
    pub name: String,
    pub url: String,
}

/// A scraped link before merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub filename: String, // decoded last path segment
    pub url: String,      // absolute
    pub source_rank: usize,
}

/// What one harvest pass produced. Only `Links` contributes to the merge.
/// `Empty` (page fetched, no matching links), `Failed` (fetch or status error)
/// and `Cancelled` (run stopped before the fetch) are kept apart for the logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestOutcome {
    Links(Vec<Candidate>),
    Empty,
    Failed(String),
    Cancelled,
}

impl HarvestOutcome {
    pub fn into_candidates(self) -> Vec<Candidate> {
        match self {
            HarvestOutcome::Links(v) => v,
            _ => Vec::new(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HarvestOutcome::Links(_) => "links",
            HarvestOutcome::Empty => "empty",
            HarvestOutcome::Failed(_) => "failed",
            HarvestOutcome::Cancelled => "cancelled",
        }
    }
}

/// The candidate that won the merge for its filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub filename: String,
    pub url: String,
    pub source: String,
    pub source_rank: usize,
    /// Global insertion order; lower = seen earlier in priority order.
    pub seq: usize,
}

/// filename → winning link. First writer wins; a later (lower-priority) insert never overwrites.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedLinks {
    by_name: HashMap<String, ResolvedLink>,
    next_seq: usize,
}

impl ResolvedLinks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the candidate was inserted, `false` if its filename was already taken.
    pub fn insert_if_absent(&mut self, candidate: Candidate, source: &str) -> bool {
        if self.by_name.contains_key(&candidate.filename) {
            return false;
        }
        let link = ResolvedLink {
            filename: candidate.filename.clone(),
            url: candidate.url,
            source: source.to_string(),
            source_rank: candidate.source_rank,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.by_name.insert(candidate.filename, link);
        true
    }

    pub fn get(&self, filename: &str) -> Option<&ResolvedLink> {
        self.by_name.get(filename)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Links in insertion (= priority) order.
    pub fn in_priority_order(&self) -> Vec<&ResolvedLink> {
        let mut v: Vec<&ResolvedLink> = self.by_name.values().collect();
        v.sort_by_key(|l| l.seq);
        v
    }

    /// Exact-date index over filenames that start with the issue prefix; on a
    /// date collision the higher-priority link wins.
    pub fn by_exact_date(&self, naming: &IssueNaming) -> HashMap<NaiveDate, &ResolvedLink> {
        let prefix = naming.prefix.to_lowercase();
        let mut out = HashMap::new();
        for link in self.in_priority_order() {
            if !link.filename.to_lowercase().starts_with(&prefix) {
                continue;
            }
            if let Some(found) = extract_issue_date(&link.filename).filter(|d| d.is_exact()) {
                out.entry(found.date).or_insert(link);
            }
        }
        out
    }
}
