use std::borrow::Cow;

use tracing::debug;

use crate::dates::{DateCandidate, DateExtractor};

/// Invoice markers that always apply on top of the caller's keywords.
pub const BUILTIN_DESIRED_KEYWORDS: &[&str] =
    &["facture", "invoice", "rechnung", "facturation", "repas"];

/// Markers of documents that explicitly say they are not invoices.
pub const DEFAULT_UNDESIRED_KEYWORDS: &[&str] = &["ceci n'est pas une facture"];

/// Caller keywords used when nothing else is configured.
pub const DEFAULT_KEYWORDS: &[&str] = &["facture", "invoice", "fechnung", "ticket", "justificatif"];

/// Ordered, case-insensitive substrings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    /// Keywords are lowercased; blank entries are dropped.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    pub fn builtin_desired() -> Self {
        Self::new(BUILTIN_DESIRED_KEYWORDS)
    }

    pub fn default_undesired() -> Self {
        Self::new(DEFAULT_UNDESIRED_KEYWORDS)
    }

    pub fn default_keywords() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }

    /// Appends keywords, keeping the existing order.
    pub fn extend<I, S>(&mut self, extra: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords.extend(Self::new(extra).keywords);
    }

    pub fn as_slice(&self) -> &[String] {
        &self.keywords
    }

    /// `text` must already be lowercase.
    fn contains_any(&self, text: &str) -> bool {
        self.keywords.iter().any(|k| text.contains(k.as_str()))
    }

    /// All keywords found in `text`, in set order.
    pub fn matches_in<'a>(&'a self, text: &str) -> Vec<&'a str> {
        let text = lowercase(text);
        self.keywords
            .iter()
            .filter(|k| text.contains(k.as_str()))
            .map(String::as_str)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsortableReason {
    NoKeywordMatch,
    NoDateFound,
}

impl std::fmt::Display for UnsortableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnsortableReason::NoKeywordMatch => write!(f, "no invoice keyword found"),
            UnsortableReason::NoDateFound => write!(f, "keyword matched, no date found"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    NonInvoice,
    Invoice(DateCandidate),
    Unsortable(UnsortableReason),
}

pub struct Categorizer {
    keywords: KeywordSet,
    desired: KeywordSet,
    undesired: KeywordSet,
    dates: DateExtractor,
}

impl Categorizer {
    pub fn new(keywords: KeywordSet, undesired: KeywordSet) -> Self {
        Self {
            keywords,
            desired: KeywordSet::builtin_desired(),
            undesired,
            dates: DateExtractor::new(),
        }
    }

    /// Replaces the date extractor, mainly to pin the year bound.
    pub fn with_date_extractor(mut self, dates: DateExtractor) -> Self {
        self.dates = dates;
        self
    }

    pub fn classify(&self, text: &str) -> Classification {
        let text = lowercase(text);

        if self.undesired.contains_any(&text) {
            debug!(
                "Found non-invoice markers: {}",
                self.undesired.matches_in(&text).join(", ")
            );
            return Classification::NonInvoice;
        }

        if !self.has_invoice_keyword(&text) {
            return Classification::Unsortable(UnsortableReason::NoKeywordMatch);
        }

        debug!(
            "Found keywords: {}",
            self.keywords
                .matches_in(&text)
                .into_iter()
                .chain(self.desired.matches_in(&text))
                .collect::<Vec<_>>()
                .join(", ")
        );

        match self.dates.extract(&text) {
            Some(date) => Classification::Invoice(date),
            None => Classification::Unsortable(UnsortableReason::NoDateFound),
        }
    }

    /// True once the text already carries a date and an invoice keyword, so
    /// further OCR cannot change a positive decision.
    pub fn is_settled(&self, text: &str) -> bool {
        let text = lowercase(text);
        self.dates.extract(&text).is_some() && self.has_invoice_keyword(&text)
    }

    fn has_invoice_keyword(&self, text: &str) -> bool {
        self.keywords.contains_any(text) || self.desired.contains_any(text)
    }
}

fn lowercase(text: &str) -> Cow<'_, str> {
    if text.chars().any(char::is_uppercase) {
        Cow::Owned(text.to_lowercase())
    } else {
        Cow::Borrowed(text)
    }
}
