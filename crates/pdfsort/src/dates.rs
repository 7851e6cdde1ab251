//! Date detection in free document text.
//!
//! Numeric patterns are tried in a fixed order and only the first match of
//! each pattern is considered. A match is re-parsed against concrete
//! templates and must land in `[1900, current_year + 1]`. When no numeric
//! pattern yields a date, French month names are used as a last resort.

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use tracing::debug;

const MIN_YEAR: i32 = 1900;

/// A month and year located in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateCandidate {
    pub month: u32,
    pub year: i32,
}

impl DateCandidate {
    pub fn new(month: u32, year: i32) -> Self {
        Self { month, year }
    }

    /// Month as used in destination folders (`01`..`12`).
    pub fn month_folder(&self) -> String {
        format!("{:02}", self.month)
    }
}

impl std::fmt::Display for DateCandidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

const DAY: &str = "(?:0[1-9]|[12][0-9]|3[01])";
const MONTH: &str = "(?:0[1-9]|1[0-2])";
const LONG_YEAR: &str = "20[0-9]{2}";
const SHORT_YEAR: &str = "[0-9]{2}";

/// A short year must be followed by whitespace, a dash, a colon or the end of
/// the text. The terminator sits outside the `date` group so that
/// `25/04/25-14:14:28` yields `25/04/25`.
const SHORT_YEAR_END: &str = r"(?:[\s\-:]|$)";

static DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    let patterns = [
        format!(r"(?P<date>{DAY}/{MONTH}/{LONG_YEAR})"),
        format!(r"(?P<date>{DAY}\.{MONTH}\.{LONG_YEAR})"),
        format!(r"(?P<date>{DAY}\s{MONTH}\s{LONG_YEAR})"),
        format!(r"(?P<date>{DAY}-{MONTH}-{LONG_YEAR})"),
        format!(r"(?P<date>{LONG_YEAR}-{MONTH}-{DAY})"),
        format!(r"(?P<date>{DAY}/{MONTH}/{SHORT_YEAR}){SHORT_YEAR_END}"),
        format!(r"(?P<date>{DAY}\.{MONTH}\.{SHORT_YEAR}){SHORT_YEAR_END}"),
        format!(r"(?P<date>{DAY}\s{MONTH}\s{SHORT_YEAR}){SHORT_YEAR_END}"),
        format!(r"(?P<date>{DAY}-{MONTH}-{SHORT_YEAR}){SHORT_YEAR_END}"),
        format!(r"(?i)(?P<date>{DAY}\s[a-z]{{3}}\.?\s{LONG_YEAR})"),
        format!(
            r"(?i)(?P<date>(?:january|february|march|april|may|june|july|august|september|october|november|december)\s{DAY},\s{LONG_YEAR})"
        ),
    ];

    patterns
        .iter()
        .map(|p| Regex::new(p).expect("built-in date pattern must compile"))
        .collect()
});

struct DateTemplate {
    format: &'static str,
    short_year: bool,
}

const fn template(format: &'static str, short_year: bool) -> DateTemplate {
    DateTemplate { format, short_year }
}

static DATE_TEMPLATES: &[DateTemplate] = &[
    template("%d/%m/%Y", false),
    template("%d.%m.%Y", false),
    template("%d-%m-%Y", false),
    template("%d/%m/%y", true),
    template("%d.%m.%y", true),
    template("%d-%m-%y", true),
    template("%d %m %Y", false),
    template("%d %m %y", true),
    template("%d %b %Y", false),
    template("%d %b. %Y", false),
    template("%B %d, %Y", false),
    template("%Y-%m-%d", false),
];

/// Checked in this order; the first name contained in the text wins even if
/// another name appears earlier in the text.
const FRENCH_MONTHS: [(&str, u32); 12] = [
    ("janvier", 1),
    ("février", 2),
    ("mars", 3),
    ("avril", 4),
    ("mai", 5),
    ("juin", 6),
    ("juillet", 7),
    ("août", 8),
    ("septembre", 9),
    ("octobre", 10),
    ("novembre", 11),
    ("décembre", 12),
];

#[derive(Debug, Clone, Copy)]
pub struct DateExtractor {
    current_year: i32,
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl DateExtractor {
    /// Extractor whose upper year bound follows the local clock.
    pub fn new() -> Self {
        Self::with_current_year(Local::now().year())
    }

    pub fn with_current_year(current_year: i32) -> Self {
        Self { current_year }
    }

    pub fn max_year(&self) -> i32 {
        self.current_year + 1
    }

    pub fn extract(&self, text: &str) -> Option<DateCandidate> {
        for pattern in DATE_PATTERNS.iter() {
            let Some(caps) = pattern.captures(text) else {
                continue;
            };
            let Some(matched) = caps.name("date") else {
                continue;
            };

            let mut candidate = matched.as_str().trim();
            // An embedded timestamp such as "25/04/25-14:14:28"
            if candidate.contains('-') && candidate.contains(':') {
                candidate = candidate.split('-').next().unwrap_or(candidate).trim();
            }

            if let Some(date) = self.parse_candidate(candidate) {
                debug!("Extracted date {} from '{}'", date, candidate);
                return Some(date);
            }
        }

        let date = extract_french_month(text);
        if let Some(date) = date {
            debug!("Extracted French month date {}", date);
        }
        date
    }

    fn parse_candidate(&self, candidate: &str) -> Option<DateCandidate> {
        for template in DATE_TEMPLATES {
            let Ok(parsed) = NaiveDate::parse_from_str(candidate, template.format) else {
                continue;
            };

            let year = if template.short_year {
                2000 + parsed.year().rem_euclid(100)
            } else {
                parsed.year()
            };

            if (MIN_YEAR..=self.max_year()).contains(&year) {
                return Some(DateCandidate::new(parsed.month(), year));
            }
        }
        None
    }
}

/// Month and year of the first recognizable date in `text`, bounded by the
/// local clock's year.
pub fn extract_date(text: &str) -> Option<DateCandidate> {
    DateExtractor::new().extract(text)
}

fn extract_french_month(text: &str) -> Option<DateCandidate> {
    let lowered = text.to_lowercase();

    let year = lowered
        .split_whitespace()
        .find(|word| word.len() == 4 && word.chars().all(|c| c.is_ascii_digit()))
        .and_then(|word| word.parse::<i32>().ok())?;

    let month = FRENCH_MONTHS
        .iter()
        .find(|(name, _)| lowered.contains(name))
        .map(|(_, number)| *number)?;

    NaiveDate::from_ymd_opt(year, month, 1)
        .filter(|d| d.year() >= 1)
        .map(|d| DateCandidate::new(d.month(), d.year()))
}
