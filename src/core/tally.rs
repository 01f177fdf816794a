// This module groups the tally domain components.
//
// Structure
// - entry.rs: Entry and StoreEntry values
// - entry_store.rs: in-memory ledger of entries per tag
// - file_header.rs: remote document naming convention and the file header registry
// - content.rs: versioned wire format of a tag's remote document
// - summary.rs: pure statistics over a tag's entries

pub mod content;
pub mod entry;
pub mod entry_store;
pub mod file_header;
pub mod summary;
