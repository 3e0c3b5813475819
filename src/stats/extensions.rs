//! File extension histogram

use std::collections::BTreeMap;

use serde::Serialize;

/// Files and lines sharing one extension
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtensionStats {
    pub files: u64,
    pub lines: u64,
}

/// Lower-cased extension of `path`, or `""` when it has none worth keeping
///
/// Only the file name is considered. A name without a dot, a name whose only
/// dot is leading (`.gitignore`), or an extension longer than
/// `max_ext_length` all map to the empty key.
pub fn classify_extension(path: &str, max_ext_length: usize) -> String {
    let filename = path.rsplit('/').next().unwrap_or(path);
    match filename.rfind('.') {
        None | Some(0) => String::new(),
        Some(dot) => {
            let ext = &filename[dot + 1..];
            if ext.chars().count() > max_ext_length {
                String::new()
            } else {
                ext.to_lowercase()
            }
        }
    }
}

/// Extension histogram over the files of the end revision
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ExtensionMap {
    entries: BTreeMap<String, ExtensionStats>,
}

impl ExtensionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, ext: impl Into<String>, lines: u64) {
        let entry = self.entries.entry(ext.into()).or_default();
        entry.files += 1;
        entry.lines += lines;
    }

    pub fn get(&self, ext: &str) -> Option<&ExtensionStats> {
        self.entries.get(ext)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ExtensionStats)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
