// src/issue.rs
use chrono::{Datelike, NaiveDate};
use std::collections::{HashMap, HashSet};

use crate::dates::extract_issue_date;

/// How issue filenames are spelled: `"<prefix> <Month> <day>, <year><suffix>"`.
/// The day is unpadded ("May 6") unless `pad_day` is set ("May 06").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueNaming {
    pub prefix: String,
    pub suffix: String,
    pub pad_day: bool,
}

impl IssueNaming {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
            pad_day: false,
        }
    }

    pub fn with_padded_day(mut self, pad: bool) -> Self {
        self.pad_day = pad;
        self
    }

    /// Canonical filename for the issue published on `date`.
    pub fn filename_for(&self, date: NaiveDate) -> String {
        let day = if self.pad_day {
            format!("{:02}", date.day())
        } else {
            date.day().to_string()
        };
        format!(
            "{} {} {}, {}{}",
            self.prefix,
            date.format("%B"),
            day,
            date.year(),
            self.suffix
        )
    }

    pub fn issue_for(&self, date: NaiveDate) -> Issue {
        Issue {
            date,
            filename: self.filename_for(date),
            url: None,
        }
    }
}

/// One dated publication. `filename` is derived from `date`; `url` is set once a
/// source (or the search fallback) says where to get it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub date: NaiveDate,
    pub filename: String,
    pub url: Option<String>,
}

impl Issue {
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Snapshot of filenames already present in storage. Taken once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalInventory {
    names: HashSet<String>,
}

impl LocalInventory {
    pub fn contains(&self, filename: &str) -> bool {
        self.names.contains(filename)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Sorted copy of the names, for display.
    pub fn sorted(&self) -> Vec<&str> {
        let mut v: Vec<&str> = self.names.iter().map(String::as_str).collect();
        v.sort_unstable();
        v
    }

    /// Dates held locally under a non-canonical spelling (e.g. "May 06, 2025").
    /// Only names starting with the issue prefix and carrying an exact date count.
    pub fn dates_held(&self, naming: &IssueNaming) -> HashMap<NaiveDate, &str> {
        let prefix = naming.prefix.to_lowercase();
        let mut out = HashMap::new();
        for name in &self.names {
            if !name.to_lowercase().starts_with(&prefix) {
                continue;
            }
            if let Some(found) = extract_issue_date(name).filter(|d| d.is_exact()) {
                out.entry(found.date).or_insert(name.as_str());
            }
        }
        out
    }
}

impl<S: Into<String>> FromIterator<S> for LocalInventory {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
