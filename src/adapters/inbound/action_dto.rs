use crate::application::dispatch::StoreAction;
use crate::core::ports::RemoteFileRef;
use crate::core::tally::entry::StoreEntry;
use serde::{Deserialize, Serialize};

/// Wire shape of a dispatched action: `{"type": "...", "payload": ...}`.
/// Swapping the whole store is internal and has no wire form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum StoreActionDto {
    Write(StoreEntry),
    Delete(StoreEntry),
    Update { old: StoreEntry, new: StoreEntry },
    Clear,
    AddFiles(Vec<RemoteFileRef>),
}

impl From<StoreActionDto> for StoreAction {
    fn from(dto: StoreActionDto) -> Self {
        match dto {
            StoreActionDto::Write(entry) => StoreAction::Write(entry),
            StoreActionDto::Delete(entry) => StoreAction::Delete(entry),
            StoreActionDto::Update { old, new } => StoreAction::Update { old, new },
            StoreActionDto::Clear => StoreAction::Clear,
            StoreActionDto::AddFiles(files) => StoreAction::AddFiles(files),
        }
    }
}
