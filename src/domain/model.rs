use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::utils::error::Result;
use crate::utils::validation::validate_date;

/// Substring that marks an expedited (urgent) announcement title.
pub const URGENCY_MARKER: &str = "긴급";

/// A raw announcement item as delivered by the API, before normalization.
pub type RawItem = serde_json::Map<String, serde_json::Value>;

/// Calendar date pair in `YYYY-MM-DD` text form.
///
/// `start_date <= end_date` is not enforced; the API is queried as given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: String,
    pub end_date: String,
}

impl DateRange {
    pub fn new(start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            start_date: start_date.into(),
            end_date: end_date.into(),
        }
    }

    /// Builds a range after checking both ends are real `YYYY-MM-DD` dates.
    pub fn parse(start_date: &str, end_date: &str) -> Result<Self> {
        validate_date("start_date", start_date)?;
        validate_date("end_date", end_date)?;
        Ok(Self::new(start_date, end_date))
    }

    pub fn single_day(date: NaiveDate) -> Self {
        let text = date.format("%Y-%m-%d").to_string();
        Self::new(text.clone(), text)
    }
}

/// Begin/end timestamps in the API's `YYYYMMDDHHMM` encoding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryWindow {
    pub begin_timestamp: String,
    pub end_timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidRecord {
    pub announcement_id: Option<String>,
    pub category: Option<String>,
    pub title: String,
    pub announcing_institution: Option<String>,
    /// `YYYYMMDD`
    pub closing_date: Option<String>,
    /// `HHMM`
    pub closing_time: Option<String>,
    pub detail_url: Option<String>,
}

impl BidRecord {
    pub fn is_urgent(&self) -> bool {
        self.title.contains(URGENCY_MARKER)
    }

    /// Closing instant; a missing closing time means end of day (23:59).
    pub fn closing_at(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(self.closing_date.as_deref()?, "%Y%m%d").ok()?;
        let time = match self.closing_time.as_deref() {
            Some(hhmm) => NaiveTime::parse_from_str(hhmm, "%H%M").ok()?,
            None => NaiveTime::from_hms_opt(23, 59, 0)?,
        };
        Some(date.and_time(time))
    }

    /// The detail link, if it is a usable http(s) URL.
    pub fn detail_link(&self) -> Option<Url> {
        let url = Url::parse(self.detail_url.as_deref()?.trim()).ok()?;
        matches!(url.scheme(), "http" | "https").then_some(url)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub total: usize,
    pub urgent: usize,
    pub closing_today: usize,
}

/// Result of one fetch cycle. Exactly one is produced per cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Success(Vec<RawItem>),
    EmptyResult,
    DomainError(String),
    TransportError,
}

impl FetchOutcome {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            FetchOutcome::Success(_) => OutcomeKind::Success,
            FetchOutcome::EmptyResult => OutcomeKind::EmptyResult,
            FetchOutcome::DomainError(_) => OutcomeKind::DomainError,
            FetchOutcome::TransportError => OutcomeKind::TransportError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    EmptyResult,
    DomainError,
    TransportError,
    /// Raised by the controller, not the client, when malformed items abort a batch.
    MalformedItem,
}
