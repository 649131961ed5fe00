use crate::domain::model::{DateRange, QueryWindow};

const DAY_START: &str = "0000";
const DAY_END: &str = "2359";

/// Converts a `YYYY-MM-DD` range into the API's begin/end timestamps.
///
/// No validation: malformed input yields a malformed window.
pub fn to_query_window(range: &DateRange) -> QueryWindow {
    QueryWindow {
        begin_timestamp: compact(&range.start_date, DAY_START),
        end_timestamp: compact(&range.end_date, DAY_END),
    }
}

fn compact(date: &str, time: &str) -> String {
    let mut out: String = date.chars().filter(|c| *c != '-').collect();
    out.push_str(time);
    out
}
