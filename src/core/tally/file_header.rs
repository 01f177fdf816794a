// Remote document headers and their naming convention.
//
// Purpose
// - Recover the tag a remote document belongs to from its file name.
// - Track which tags are backed by a remote document, without the content.
//
// Naming convention
// - `<tag>-TA.json`, optionally with a numeric disambiguator: `<tag>-<digits>-TA.json`.
//
// Registry states
// - NotLoaded: the remote listing has never been queried this session.
// - Loaded: the listing was queried. An empty list means no documents were found.

use crate::core::ports::RemoteFileRef;
use serde::Serialize;

pub const TALLY_FILE_SUFFIX: &str = "-TA.json";

/// A tag that itself ends in `-<digits>` gets a `-1` disambiguator so the name reads
/// back as the same tag.
pub fn file_name_for_tag(tag: &str) -> String {
    let name = format!("{tag}{TALLY_FILE_SUFFIX}");
    if tag_from_file_name(&name) == Some(tag) {
        name
    } else {
        format!("{tag}-1{TALLY_FILE_SUFFIX}")
    }
}

pub fn tag_from_file_name(name: &str) -> Option<&str> {
    let stem = name.strip_suffix(TALLY_FILE_SUFFIX)?;
    let tag = match stem.rsplit_once('-') {
        Some((tag, digits))
            if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) =>
        {
            tag
        }
        _ => stem,
    };
    (!tag.is_empty()).then_some(tag)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileHeader {
    pub name: String,
    pub tag: String,
    /// Empty while the document is still being created remotely.
    pub id: String,
}

impl FileHeader {
    pub fn from_remote(file: &RemoteFileRef) -> Option<Self> {
        let tag = tag_from_file_name(&file.name)?;
        Some(Self {
            name: file.name.clone(),
            tag: tag.to_string(),
            id: file.id.clone(),
        })
    }

    pub fn placeholder(tag: &str) -> Self {
        Self {
            name: file_name_for_tag(tag),
            tag: tag.to_string(),
            id: String::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FileHeaders {
    #[default]
    NotLoaded,
    Loaded(Vec<FileHeader>),
}

impl FileHeaders {
    pub fn from_listing(files: &[RemoteFileRef]) -> Self {
        let mut headers = Self::Loaded(Vec::new());
        for header in files.iter().filter_map(FileHeader::from_remote) {
            headers.register(header);
        }
        headers
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded(_))
    }

    pub fn find(&self, tag: &str) -> Option<&FileHeader> {
        match self {
            Self::NotLoaded => None,
            Self::Loaded(headers) => headers.iter().find(|header| header.tag == tag),
        }
    }

    pub fn tags(&self) -> Vec<String> {
        match self {
            Self::NotLoaded => Vec::new(),
            Self::Loaded(headers) => headers.iter().map(|header| header.tag.clone()).collect(),
        }
    }

    /// Adds the header, replacing any header already registered for the same tag.
    /// Returns false when the registry is not loaded yet.
    pub fn register(&mut self, header: FileHeader) -> bool {
        let Self::Loaded(headers) = self else {
            return false;
        };
        match headers.iter_mut().find(|existing| existing.tag == header.tag) {
            Some(existing) => *existing = header,
            None => headers.push(header),
        }
        true
    }

    pub fn remove_placeholder(&mut self, tag: &str) {
        if let Self::Loaded(headers) = self {
            headers.retain(|header| !(header.tag == tag && header.is_placeholder()));
        }
    }
}
