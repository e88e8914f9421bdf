//! File categories by extension

use crate::search::NameQuery;
use scan_proto::FileEntry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category of a scanned entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Directory,
    Image,
    Video,
    Audio,
    Document,
    Spreadsheet,
    Presentation,
    Archive,
    Other,
}

impl FileCategory {
    /// Classify a lower-cased extension
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "tiff" | "svg" | "webp" | "ico" => {
                FileCategory::Image
            }
            "mp4" | "avi" | "mov" | "wmv" | "webm" | "flv" => FileCategory::Video,
            "mp3" | "wav" | "aac" | "flac" | "ogg" | "wma" => FileCategory::Audio,
            "pdf" | "doc" | "docx" | "txt" | "md" | "markdown" => FileCategory::Document,
            "xls" | "xlsx" | "csv" => FileCategory::Spreadsheet,
            "ppt" | "pptx" => FileCategory::Presentation,
            "zip" | "rar" | "7z" | "gz" | "tar" | "bz2" => FileCategory::Archive,
            _ => FileCategory::Other,
        }
    }

    /// Classify an entry; directories are never given a file category
    pub fn of(entry: &FileEntry) -> Self {
        if entry.is_dir {
            FileCategory::Directory
        } else {
            Self::from_extension(&entry.extension())
        }
    }
}

/// Scan result grouped by category
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    all: Vec<FileEntry>,
    groups: BTreeMap<FileCategory, Vec<FileEntry>>,
}

impl CategoryIndex {
    pub fn build(entries: &[FileEntry]) -> Self {
        let mut groups: BTreeMap<FileCategory, Vec<FileEntry>> = BTreeMap::new();
        for entry in entries {
            groups
                .entry(FileCategory::of(entry))
                .or_default()
                .push(entry.clone());
        }
        Self {
            all: entries.to_vec(),
            groups,
        }
    }

    pub fn entries(&self, category: FileCategory) -> &[FileEntry] {
        self.groups.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, category: FileCategory) -> usize {
        self.entries(category).len()
    }

    /// Per-category counts for file categories (directories excluded)
    pub fn counts(&self) -> BTreeMap<FileCategory, usize> {
        self.groups
            .iter()
            .filter(|(category, _)| **category != FileCategory::Directory)
            .map(|(category, entries)| (*category, entries.len()))
            .collect()
    }

    /// Entries whose name matches `query`, optionally within one category
    pub fn search(&self, query: &str, category: Option<FileCategory>) -> Vec<&FileEntry> {
        let query = NameQuery::parse(query);
        let pool = match category {
            Some(category) => self.entries(category),
            None => self.all.as_slice(),
        };
        pool.iter().filter(|entry| query.matches(&entry.name)).collect()
    }
}
