//! Candidate discovery under checkpoint base directories

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{ResolveError, ResolveResult};
use crate::extensions::ExtensionSet;

/// A discovered checkpoint file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateRecord {
    /// Path relative to `base_directory`, always `/`-separated
    pub relative_path: String,
    /// Base directory the file was found under
    pub base_directory: PathBuf,
}

impl CandidateRecord {
    pub fn new(relative_path: impl Into<String>, base_directory: impl Into<PathBuf>) -> Self {
        Self {
            relative_path: relative_path.into(),
            base_directory: base_directory.into(),
        }
    }

    /// Absolute (or base-relative, if the base is relative) path on disk
    pub fn full_path(&self) -> PathBuf {
        self.base_directory.join(&self.relative_path)
    }
}

/// Walks base directories collecting files accepted by an extension filter
#[derive(Debug, Clone)]
pub struct PathIndex {
    extensions: ExtensionSet,
}

impl PathIndex {
    pub fn new(extensions: ExtensionSet) -> Self {
        Self { extensions }
    }

    pub fn extensions(&self) -> &ExtensionSet {
        &self.extensions
    }

    /// Recursively collect candidates under every base directory.
    ///
    /// Duplicate base directories are walked once. A missing or unreadable
    /// base directory contributes nothing; the rest of the scan continues.
    pub fn scan<P: AsRef<Path>>(&self, base_directories: &[P]) -> Vec<CandidateRecord> {
        debug!(dir_count = base_directories.len(), extensions = %self.extensions, "PathIndex::scan: called");
        let mut seen: Vec<&Path> = Vec::new();
        let mut records = Vec::new();

        for base in base_directories.iter().map(AsRef::as_ref) {
            if seen.contains(&base) {
                debug!(?base, "PathIndex::scan: skipping duplicate base directory");
                continue;
            }
            seen.push(base);

            if let Err(e) = fs::read_dir(base) {
                let err = ResolveError::DirectoryUnavailable {
                    path: base.to_path_buf(),
                    source: e,
                };
                warn!("{}: {}", err, source_of(&err));
                continue;
            }

            let before = records.len();
            self.walk_into(base, &mut records);
            debug!(?base, found = records.len() - before, "PathIndex::scan: walked base directory");
        }

        debug!(total = records.len(), "PathIndex::scan: complete");
        records
    }

    fn walk_into(&self, base: &Path, records: &mut Vec<CandidateRecord>) {
        let walker = WalkDir::new(base).follow_links(true).sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(?base, %e, "PathIndex::walk_into: skipping unreadable entry");
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy();
            if !self.extensions.matches(&file_name) {
                continue;
            }

            if let Ok(relative) = entry.path().strip_prefix(base) {
                records.push(CandidateRecord::new(slash_path(relative), base));
            }
        }
    }

    /// Non-recursive, name-sorted listing of accepted files directly in `folder`
    pub fn list_folder(&self, folder: &Path) -> ResolveResult<Vec<String>> {
        debug!(?folder, extensions = %self.extensions, "PathIndex::list_folder: called");
        let entries = fs::read_dir(folder).map_err(|e| ResolveError::DirectoryUnavailable {
            path: folder.to_path_buf(),
            source: e,
        })?;

        let mut files: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().is_file())
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .filter(|name| self.extensions.matches(name))
            .collect();
        files.sort();

        debug!(count = files.len(), "PathIndex::list_folder: complete");
        Ok(files)
    }
}

/// Join path components with `/` regardless of the host separator
pub fn slash_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn source_of(err: &ResolveError) -> String {
    std::error::Error::source(err).map(|s| s.to_string()).unwrap_or_default()
}
