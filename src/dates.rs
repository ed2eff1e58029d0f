//! # Date extraction
//! Pulls a publication date out of a free-form filename or URL-decoded fragment.
//!
//! Patterns are tried in priority order. A pattern whose capture does not form a
//! real calendar day falls through to the next pattern; when everything fails the
//! result is `None`. The only defaults applied are the documented ones (day 1 for
//! year-month names, January for an unknown month word) and both are tagged with a
//! weaker [`Confidence`] so callers can keep them out of ordering decisions.

use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use regex::Regex;

/// How much of the date was actually present in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Confidence {
    /// The month word was not in the table and defaulted to January.
    Low,
    /// Only year and month were present; the day defaulted to 1.
    MonthOnly,
    /// Day, month and year all came from the input.
    Exact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtractedDate {
    pub date: NaiveDate,
    pub confidence: Confidence,
}

impl ExtractedDate {
    pub fn is_exact(&self) -> bool {
        self.confidence == Confidence::Exact
    }
}

const MONTHS: [(&str, u32); 12] = [
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

/// Case-insensitive month lookup: full English names, three-letter abbreviations and "sept".
pub fn month_number(name: &str) -> Option<u32> {
    let lower = name.trim_end_matches('.').to_ascii_lowercase();
    if lower == "sept" {
        return Some(9);
    }
    MONTHS.iter().find_map(|(full, n)| {
        let is_abbrev = lower.len() == 3 && full.starts_with(lower.as_str());
        (lower == *full || is_abbrev).then_some(*n)
    })
}

#[derive(Clone, Copy)]
enum Shape {
    MonthDayYear,
    DayMonthYear,
    IsoDay,
    YearMonth,
}

struct Pattern {
    re: Regex,
    shape: Shape,
}

fn patterns() -> &'static [Pattern] {
    static PATTERNS: OnceCell<Vec<Pattern>> = OnceCell::new();
    PATTERNS.get_or_init(|| {
        let table = [
            // "April 29, 2025" / "Sept 5 2023"
            (r"(?i)\b([a-z]+)\.?\s+(\d{1,2}),?\s+(\d{4})\b", Shape::MonthDayYear),
            // "29 May 2023" (ordinals already stripped)
            (r"(?i)\b(\d{1,2})\s+([a-z]+)\.?,?\s+(\d{4})\b", Shape::DayMonthYear),
            // "2024-05-06"
            (r"\b(\d{4})-(\d{2})-(\d{2})\b", Shape::IsoDay),
            // "2024-05" (upload folders)
            (r"\b(\d{4})-(\d{1,2})\b", Shape::YearMonth),
        ];
        table
            .into_iter()
            .map(|(src, shape)| Pattern {
                re: Regex::new(src).expect("date pattern"),
                shape,
            })
            .collect()
    })
}

/// `1st` → `1`, `22nd` → `22`, leaving words such as "August" untouched.
pub fn strip_ordinals(s: &str) -> String {
    static RE: OnceCell<Regex> = OnceCell::new();
    let re = RE.get_or_init(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").expect("ordinal regex"));
    re.replace_all(s, "$1").into_owned()
}

/// Separators seen in real filenames that stand in for spaces.
fn normalize_separators(s: &str) -> String {
    s.replace(['_', '+'], " ")
}

/// Extract the best available date from `input`, or `None` if no pattern yields a real day.
pub fn extract_issue_date(input: &str) -> Option<ExtractedDate> {
    let text = strip_ordinals(&normalize_separators(input));

    for pattern in patterns() {
        let Some(caps) = pattern.re.captures(&text) else {
            continue;
        };
        let parsed = match pattern.shape {
            Shape::MonthDayYear => from_words(&caps[1], &caps[2], &caps[3]),
            Shape::DayMonthYear => from_words(&caps[2], &caps[1], &caps[3]),
            Shape::IsoDay => from_numbers(&caps[1], &caps[2], Some(&caps[3])),
            Shape::YearMonth => from_numbers(&caps[1], &caps[2], None),
        };
        if let Some(found) = parsed {
            return Some(found);
        }
        tracing::trace!(target: "dates", input, "pattern matched but did not form a date");
    }
    None
}

fn from_words(month: &str, day: &str, year: &str) -> Option<ExtractedDate> {
    let day: u32 = day.parse().ok()?;
    let year: i32 = year.parse().ok()?;
    let (month, confidence) = match month_number(month) {
        Some(m) => (m, Confidence::Exact),
        None => (1, Confidence::Low),
    };
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(ExtractedDate { date, confidence })
}

fn from_numbers(year: &str, month: &str, day: Option<&str>) -> Option<ExtractedDate> {
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let (day, confidence) = match day {
        Some(d) => (d.parse().ok()?, Confidence::Exact),
        None => (1, Confidence::MonthOnly),
    };
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(ExtractedDate { date, confidence })
}
