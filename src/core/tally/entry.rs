// Tally entry values.
//
// Purpose
// - Entry: one tally event, a count logged at an instant.
// - StoreEntry: an Entry annotated with the tag it belongs to. Unit of write, delete and update.
//
// Equality
// - Entries are compared structurally (count and date). Two identical entries are
//   still two distinct records in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub count: f64,
    pub date: DateTime<Utc>,
}

impl Entry {
    pub fn new(count: f64, date: DateTime<Utc>) -> Self {
        Self { count, date }
    }

    pub fn tagged(self, tag: impl Into<String>) -> StoreEntry {
        StoreEntry {
            tag: tag.into(),
            count: self.count,
            date: self.date,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreEntry {
    pub tag: String,
    pub count: f64,
    pub date: DateTime<Utc>,
}

impl StoreEntry {
    pub fn new(tag: impl Into<String>, count: f64, date: DateTime<Utc>) -> Self {
        Self {
            tag: tag.into(),
            count,
            date,
        }
    }

    pub fn entry(&self) -> Entry {
        Entry {
            count: self.count,
            date: self.date,
        }
    }
}
