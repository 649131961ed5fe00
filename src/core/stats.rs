use crate::domain::model::{BidRecord, Statistics};
use chrono::{Duration, NaiveDateTime};

/// Counts total, urgent and closing-today announcements as of `now`.
pub fn aggregate(records: &[BidRecord], now: NaiveDateTime) -> Statistics {
    let today = now.format("%Y%m%d").to_string();

    records.iter().fold(
        Statistics {
            total: records.len(),
            ..Statistics::default()
        },
        |mut stats, record| {
            if record.is_urgent() {
                stats.urgent += 1;
            }
            if record.closing_date.as_deref() == Some(today.as_str()) {
                stats.closing_today += 1;
            }
            stats
        },
    )
}

/// True when the record closes within `[now, now + within]`.
pub fn is_closing_soon(record: &BidRecord, now: NaiveDateTime, within: Duration) -> bool {
    match record.closing_at() {
        Some(closing) => closing >= now && closing - now <= within,
        None => false,
    }
}
