// Versioned wire format of a tag's remote document.
//
// Purpose
// - Serialize a tag's entries into the document body persisted remotely.
// - Decode a fetched document body back into entries for the owning tag.
//
// Format (version 0.1.0)
//   { "version": "0.1.0", "entries": [ { "count": <number>, "date": "<ISO-8601>" } ] }
//
// Error policy
// - A missing or unknown version, or a non-array `entries`, rejects the whole document.
// - A bad entry is rejected on its own; the remaining entries are kept.
// - Rejections are logged here and never leave this module.
//
// Versioning and evolution
// - Add a new version constant and a new decode arm. Never change the meaning of 0.1.0.

use crate::core::tally::entry::{Entry, StoreEntry};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::error;

pub const CONTENT_VERSION_0_1_0: &str = "0.1.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TallyDocument {
    pub version: String,
    pub entries: Vec<WireEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireEntry {
    pub count: serde_json::Number,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContentError {
    #[error("file content has no version")]
    MissingVersion,

    #[error("file content has unrecognised version number: {0}")]
    UnknownVersion(String),

    #[error("file content entries must be an array")]
    EntriesNotArray,

    #[error("file content entry missing attribute (count): {0}")]
    MissingCount(Value),

    #[error("file content entry count is not numeric: {0}")]
    InvalidCount(Value),

    #[error("file content entry missing attribute (date): {0}")]
    MissingDate(Value),

    #[error("file content failed to parse date: {0}")]
    InvalidDate(Value),
}

/// Outcome of decoding one document: the accepted entries and every entry-level rejection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Decoded {
    pub entries: Vec<StoreEntry>,
    pub rejected: Vec<ContentError>,
}

impl From<&Entry> for WireEntry {
    fn from(entry: &Entry) -> Self {
        Self {
            count: count_to_number(entry.count),
            date: entry.date.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

pub fn serialize_entries(entries: &[Entry]) -> Value {
    let document = TallyDocument {
        version: CONTENT_VERSION_0_1_0.to_string(),
        entries: entries.iter().map(WireEntry::from).collect(),
    };
    serde_json::to_value(document).unwrap_or(Value::Null)
}

/// Decodes `content` for `tag`, logging every rejection.
pub fn parse_content(tag: &str, content: &Value) -> Vec<StoreEntry> {
    match decode(tag, content) {
        Ok(decoded) => {
            for rejection in &decoded.rejected {
                error!(tag, %rejection, "skipping tally entry");
            }
            decoded.entries
        }
        Err(rejection) => {
            error!(tag, %rejection, %content, "dropping tally document");
            Vec::new()
        }
    }
}

pub fn decode(tag: &str, content: &Value) -> Result<Decoded, ContentError> {
    match content.get("version") {
        None | Some(Value::Null) => Err(ContentError::MissingVersion),
        Some(Value::String(version)) if version == CONTENT_VERSION_0_1_0 => decode_v0_1_0(tag, content),
        Some(Value::String(version)) => Err(ContentError::UnknownVersion(version.clone())),
        Some(other) => Err(ContentError::UnknownVersion(other.to_string())),
    }
}

fn decode_v0_1_0(tag: &str, content: &Value) -> Result<Decoded, ContentError> {
    let Some(Value::Array(raw_entries)) = content.get("entries") else {
        return Err(ContentError::EntriesNotArray);
    };
    let mut decoded = Decoded::default();
    for raw in raw_entries {
        match decode_entry(raw) {
            Ok(entry) => decoded.entries.push(entry.tagged(tag)),
            Err(rejection) => decoded.rejected.push(rejection),
        }
    }
    Ok(decoded)
}

fn decode_entry(raw: &Value) -> Result<Entry, ContentError> {
    let count = match raw.get("count") {
        None => return Err(ContentError::MissingCount(raw.clone())),
        Some(value) => numeric(value).ok_or_else(|| ContentError::InvalidCount(raw.clone()))?,
    };
    let date = match raw.get("date") {
        None => return Err(ContentError::MissingDate(raw.clone())),
        Some(Value::String(value)) => {
            parse_date(value).ok_or_else(|| ContentError::InvalidDate(raw.clone()))?
        }
        Some(_) => return Err(ContentError::InvalidDate(raw.clone())),
    };
    Ok(Entry::new(count, date))
}

// Numeric strings are accepted as well, older documents stored counts as text.
fn numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

// Instants at or before the Unix epoch are treated as unparseable.
fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let date = DateTime::parse_from_rfc3339(value)
        .map(|date| date.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .map(|day| day.and_time(chrono::NaiveTime::MIN).and_utc())
        })?;
    (date.timestamp_millis() > 0).then_some(date)
}

fn count_to_number(count: f64) -> serde_json::Number {
    if count.fract() == 0.0 && count.abs() < i64::MAX as f64 {
        serde_json::Number::from(count as i64)
    } else {
        serde_json::Number::from_f64(count).unwrap_or_else(|| serde_json::Number::from(0))
    }
}
