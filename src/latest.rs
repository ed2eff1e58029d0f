// src/latest.rs
use chrono::NaiveDate;

use crate::dates::{extract_issue_date, Confidence};
use crate::ingest::types::{ResolvedLink, ResolvedLinks};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatestIssue {
    pub date: NaiveDate,
    pub confidence: Confidence,
    pub link: ResolvedLink,
}

impl LatestIssue {
    pub fn is_exact(&self) -> bool {
        self.confidence == Confidence::Exact
    }
}

/// Most recent issue by extracted date.
///
/// Links without a date, or whose date rests on the unknown-month default, are
/// left out of the comparison entirely. Ties keep the link seen first in
/// priority order.
pub fn pick_latest(links: &ResolvedLinks) -> Option<LatestIssue> {
    let mut best: Option<LatestIssue> = None;
    for link in links.in_priority_order() {
        let Some(found) = extract_issue_date(&link.filename) else {
            tracing::debug!(target: "latest", filename = %link.filename, "no date; skipped");
            continue;
        };
        if found.confidence == Confidence::Low {
            tracing::debug!(target: "latest", filename = %link.filename, "low-confidence date; skipped");
            continue;
        }
        let newer = best.as_ref().map_or(true, |b| found.date > b.date);
        if newer {
            best = Some(LatestIssue {
                date: found.date,
                confidence: found.confidence,
                link: link.clone(),
            });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::Candidate;

    fn links(entries: &[(&str, &str, &str)]) -> ResolvedLinks {
        let mut l = ResolvedLinks::new();
        for (rank, (src, f, u)) in entries.iter().enumerate() {
            l.insert_if_absent(
                Candidate {
                    filename: f.to_string(),
                    url: u.to_string(),
                    source_rank: rank,
                },
                src,
            );
        }
        l
    }

    #[test]
    fn empty_mapping_has_no_latest() {
        assert_eq!(pick_latest(&ResolvedLinks::new()), None);
    }

    #[test]
    fn undated_entries_are_never_picked() {
        let l = links(&[("a", "MyGov-Unparseable-Name.pdf", "https://a.test/x.pdf")]);
        assert_eq!(pick_latest(&l), None);
    }

    #[test]
    fn picks_maximum_date() {
        let l = links(&[
            ("a", "MyGov April 29, 2025.pdf", "https://a.test/1.pdf"),
            ("a", "MyGov-Unparseable-Name.pdf", "https://a.test/2.pdf"),
            ("b", "MyGov 6th May 2025.pdf", "https://b.test/3.pdf"),
            ("b", "MyGov Foo 30, 2026.pdf", "https://b.test/4.pdf"),
        ]);
        let got = pick_latest(&l).unwrap();
        assert_eq!(got.date, NaiveDate::from_ymd_opt(2025, 5, 6).unwrap());
        assert_eq!(got.link.url, "https://b.test/3.pdf");
        assert!(got.is_exact());
    }

    #[test]
    fn tie_goes_to_first_scanned_source() {
        let l = links(&[
            ("a", "MyGov May 6, 2025.pdf", "https://a.test/1.pdf"),
            ("b", "MyGov 6th May 2025.pdf", "https://b.test/1.pdf"),
        ]);
        let got = pick_latest(&l).unwrap();
        assert_eq!(got.link.source, "a");
    }
}
