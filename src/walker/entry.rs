//! One-level directory enumeration

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// A path found in a directory, tagged with its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub path: PathBuf,
    pub kind: EntryKind,
}

impl Entry {
    /// Base name, lossily converted for matching.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// List the immediate entries of `dir` in enumeration order.
///
/// Symlinks and special files are left out. Entries that vanish or cannot be
/// inspected during the listing are dropped; only failing to open the
/// directory itself is an error.
pub fn read_entries(dir: &Path) -> io::Result<Vec<Entry>> {
    let entries = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter_map(|entry| {
            let file_type = entry.file_type().ok()?;
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else if file_type.is_file() {
                EntryKind::File
            } else {
                return None;
            };
            Some(Entry {
                path: entry.path(),
                kind,
            })
        })
        .collect();
    Ok(entries)
}
