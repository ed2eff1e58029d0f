//! # Gap resolution
//! Splits the expected issues into three groups:
//!
//! - `satisfied`: already in local storage, nothing to do;
//! - `resolved`: not local, but a source lists it (the issue carries the URL);
//! - `unresolved`: not local and no source lists it (search fallback candidates).
//!
//! Matching is by canonical filename first, then by exact extracted date so that
//! spellings like "MyGov May 06, 2025.pdf" still line up. Low-confidence dates
//! never take part in matching.

use crate::ingest::types::ResolvedLinks;
use crate::issue::{Issue, IssueNaming, LocalInventory};
use crate::schedule::ExpectedSchedule;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GapReport {
    pub satisfied: Vec<Issue>,
    pub resolved: Vec<Issue>,
    pub unresolved: Vec<Issue>,
}

impl GapReport {
    pub fn expected(&self) -> usize {
        self.satisfied.len() + self.resolved.len() + self.unresolved.len()
    }

    pub fn missing(&self) -> usize {
        self.resolved.len() + self.unresolved.len()
    }
}

/// Partition the issues of `schedule` against what is held and what the sources list.
pub fn resolve_gaps(
    schedule: &ExpectedSchedule,
    naming: &IssueNaming,
    inventory: &LocalInventory,
    links: &ResolvedLinks,
) -> GapReport {
    let expected = schedule.iter().map(|d| naming.issue_for(d));
    partition_issues(expected, naming, inventory, links)
}

/// Same as [`resolve_gaps`] over an explicit list of expected issues.
pub fn partition_issues<I>(
    expected: I,
    naming: &IssueNaming,
    inventory: &LocalInventory,
    links: &ResolvedLinks,
) -> GapReport
where
    I: IntoIterator<Item = Issue>,
{
    let held_by_date = inventory.dates_held(naming);
    let listed_by_date = links.by_exact_date(naming);
    let mut report = GapReport::default();

    for issue in expected {
        if inventory.contains(&issue.filename) || held_by_date.contains_key(&issue.date) {
            report.satisfied.push(issue);
            continue;
        }
        let link = links
            .get(&issue.filename)
            .or_else(|| listed_by_date.get(&issue.date).copied());
        match link {
            Some(link) => {
                tracing::debug!(target: "gaps", filename = %issue.filename, source = %link.source, "gap has a listed link");
                let url = link.url.clone();
                report.resolved.push(issue.with_url(url));
            }
            None => report.unresolved.push(issue),
        }
    }

    tracing::info!(
        target: "gaps",
        expected = report.expected(),
        satisfied = report.satisfied.len(),
        resolved = report.resolved.len(),
        unresolved = report.unresolved.len(),
        "gap partition"
    );
    report
}
