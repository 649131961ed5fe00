use crate::domain::model::{BidRecord, RawItem};
use crate::utils::error::DashboardError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const FIELD_ID: &str = "bidNtceNo";
const FIELD_CATEGORY: &str = "bsnsDivNm";
const FIELD_TITLE: &str = "bidNtceNm";
const FIELD_INSTITUTION: &str = "ntceInsttNm";
const FIELD_CLOSING_DATE: &str = "bidClseDate";
const FIELD_CLOSING_TIME: &str = "bidClseTm";
const FIELD_DETAIL_URL: &str = "bidNtceUrl";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedItemPolicy {
    /// Drop the item and keep the rest of the batch.
    #[default]
    Skip,
    /// Fail the whole batch on the first malformed item.
    Abort,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedItem {
    pub index: usize,
    pub reason: String,
}

impl From<MalformedItem> for DashboardError {
    fn from(item: MalformedItem) -> Self {
        DashboardError::MalformedItem {
            index: item.index,
            reason: item.reason,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub records: Vec<BidRecord>,
    pub skipped: Vec<MalformedItem>,
}

pub fn normalize(raw_items: &[RawItem]) -> Vec<BidRecord> {
    normalize_with_report(raw_items).records
}

pub fn normalize_with_report(raw_items: &[RawItem]) -> Normalized {
    let mut normalized = Normalized::default();

    for (index, item) in raw_items.iter().enumerate() {
        match normalize_item(index, item) {
            Ok(record) => normalized.records.push(record),
            Err(malformed) => {
                tracing::warn!(
                    "Skipping malformed bid item {}: {}",
                    malformed.index,
                    malformed.reason
                );
                normalized.skipped.push(malformed);
            }
        }
    }

    tracing::debug!(
        "Normalized {} of {} bid items",
        normalized.records.len(),
        raw_items.len()
    );
    normalized
}

pub fn normalize_item(index: usize, item: &RawItem) -> Result<BidRecord, MalformedItem> {
    let title = match item.get(FIELD_TITLE) {
        None | Some(Value::Null) => {
            return Err(MalformedItem {
                index,
                reason: format!("missing {}", FIELD_TITLE),
            })
        }
        Some(value) => scalar_text(value).ok_or_else(|| MalformedItem {
            index,
            reason: format!("{} is not a scalar value", FIELD_TITLE),
        })?,
    };

    Ok(BidRecord {
        announcement_id: text_field(item, FIELD_ID),
        category: text_field(item, FIELD_CATEGORY),
        title,
        announcing_institution: text_field(item, FIELD_INSTITUTION),
        closing_date: text_field(item, FIELD_CLOSING_DATE),
        closing_time: text_field(item, FIELD_CLOSING_TIME),
        detail_url: text_field(item, FIELD_DETAIL_URL),
    })
}

/// Stable display key; duplicate ids stay distinct through the position.
pub fn display_key(index: usize, record: &BidRecord) -> String {
    format!("{}-{}", record.announcement_id.as_deref().unwrap_or(""), index)
}

fn text_field(item: &RawItem, key: &str) -> Option<String> {
    item.get(key).and_then(scalar_text)
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}
