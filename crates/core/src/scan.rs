//! Input discovery: walk a folder for Office documents.

use crate::error::{ConversionError, Result};
use crate::DocumentKind;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// Which document kinds a run picks up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTypeFilter {
    kinds: BTreeSet<DocumentKind>,
}

impl Default for FileTypeFilter {
    fn default() -> Self {
        Self::all()
    }
}

impl FileTypeFilter {
    pub fn all() -> Self {
        Self {
            kinds: DocumentKind::ALL.into_iter().collect(),
        }
    }

    pub fn only<I: IntoIterator<Item = DocumentKind>>(kinds: I) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    /// Parse `all` or a comma list such as `excel,word`.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() || text.eq_ignore_ascii_case("all") {
            return Ok(Self::all());
        }
        let kinds = text
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| part.parse::<DocumentKind>().map_err(ConversionError::InvalidConfig))
            .collect::<Result<BTreeSet<_>>>()?;
        if kinds.is_empty() {
            return Err(ConversionError::InvalidConfig(format!(
                "no file types in '{}'",
                text
            )));
        }
        Ok(Self { kinds })
    }

    pub fn kinds(&self) -> impl Iterator<Item = DocumentKind> + '_ {
        self.kinds.iter().copied()
    }

    /// The kind of `path` if this filter takes it.
    pub fn accepts(&self, path: &Path) -> Option<DocumentKind> {
        DocumentKind::from_path(path).filter(|kind| self.kinds.contains(kind))
    }
}

impl FromStr for FileTypeFilter {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn is_hidden_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry.file_name().to_str().map_or(false, |name| name.starts_with('.'))
}

/// Office lock files (`~$Book1.xlsx`) left behind by open documents.
pub fn is_lock_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map_or(false, |name| name.starts_with("~$"))
}

/// Every document under `root` the filter accepts, sorted by path.
///
/// Hidden directories and Office lock files are skipped.
pub fn scan_directory(root: &Path, filter: &FileTypeFilter) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(ConversionError::InputNotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_hidden_dir(e))
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if is_lock_file(path) {
            debug!("Skipping lock file {:?}", path);
            continue;
        }
        if filter.accepts(path).is_some() {
            files.push(path.to_path_buf());
        }
    }

    files.sort();
    info!("Found {} file(s) under {:?}", files.len(), root);
    Ok(files)
}
