// In-memory ledger of tally entries keyed by tag.
//
// Purpose
// - Authoritative local record the sync cache renders from.
//
// Responsibilities
// - Keep each tag's entries in insertion order.
// - Match deletes structurally on count and date, one record per call.
// - Never perform input or output. No operation can fail.

use crate::core::tally::entry::{Entry, StoreEntry};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryStore {
    entries: BTreeMap<String, Vec<Entry>>,
}

impl EntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write(&mut self, entry: StoreEntry) {
        let value = entry.entry();
        self.entries.entry(entry.tag).or_default().push(value);
    }

    /// Removes one record equal to `entry` from its tag. Duplicates beyond the
    /// first match stay in place. Tags left without entries are dropped.
    pub fn delete(&mut self, entry: &StoreEntry) {
        let target = entry.entry();
        let Some(list) = self.entries.get_mut(&entry.tag) else {
            return;
        };
        if let Some(position) = list.iter().position(|candidate| *candidate == target) {
            list.remove(position);
        }
        if list.is_empty() {
            self.entries.remove(&entry.tag);
        }
    }

    /// Delete then write. A missing `old` degrades to a plain write.
    pub fn update(&mut self, old: &StoreEntry, new: StoreEntry) {
        self.delete(old);
        self.write(new);
    }

    pub fn tags(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn entries_by_tag(&self, tag: &str) -> Vec<Entry> {
        self.entries.get(tag).cloned().unwrap_or_default()
    }

    pub fn read(&self) -> Vec<StoreEntry> {
        self.entries
            .iter()
            .flat_map(|(tag, list)| list.iter().map(move |entry| entry.tagged(tag.clone())))
            .collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
