//! Seams to the host application: folder registry and checkpoint loader

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ResolveError, ResolveResult};

/// Registry kind searched by name-based resolution
pub const CHECKPOINTS_KIND: &str = "checkpoints";

/// Host lookup of base search directories by kind (e.g. `checkpoints`)
pub trait DirectoryRegistry {
    /// Ordered base directories for `kind`; empty when the kind is unknown
    fn folder_paths(&self, kind: &str) -> Vec<PathBuf>;
}

/// Host routine that turns a resolved relative path into loaded artifacts
pub trait CheckpointLoader {
    /// Opaque model/CLIP/VAE bundle produced by the host
    type Artifacts;
    type Error: std::fmt::Display;

    fn load_checkpoint(&self, relative_path: &str) -> Result<Self::Artifacts, Self::Error>;
}

/// Registry backed by a fixed kind → directories map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticRegistry {
    folders: BTreeMap<String, Vec<PathBuf>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folders(mut self, kind: &str, dirs: Vec<PathBuf>) -> Self {
        self.folders.insert(kind.to_string(), dirs);
        self
    }

    pub fn add_folder(&mut self, kind: &str, dir: PathBuf) {
        self.folders.entry(kind.to_string()).or_default().push(dir);
    }
}

impl DirectoryRegistry for StaticRegistry {
    fn folder_paths(&self, kind: &str) -> Vec<PathBuf> {
        let dirs = self.folders.get(kind).cloned().unwrap_or_default();
        debug!(%kind, count = dirs.len(), "StaticRegistry::folder_paths: called");
        dirs
    }
}

/// Category name → folder name under a rotation base folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryFolders {
    folders: BTreeMap<String, String>,
}

impl Default for CategoryFolders {
    fn default() -> Self {
        let folders = [("SDXL", "SDXL 10"), ("PONY", "Pony"), ("SD15", "SD15")]
            .into_iter()
            .map(|(category, folder)| (category.to_string(), folder.to_string()))
            .collect();
        Self { folders }
    }
}

impl CategoryFolders {
    pub fn set(&mut self, category: &str, folder: &str) {
        self.folders.insert(category.to_uppercase(), folder.to_string());
    }

    /// Folder name for `category`, matched case-insensitively
    pub fn folder_name(&self, category: &str) -> Option<&str> {
        self.folders
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(category))
            .map(|(_, folder)| folder.as_str())
    }

    /// `base/<folder for category>`
    pub fn folder_for(&self, base: &Path, category: &str) -> ResolveResult<PathBuf> {
        let folder = self.folder_name(category).ok_or_else(|| {
            ResolveError::InvalidConfiguration(format!(
                "unknown category '{}' (known: {})",
                category,
                self.categories().collect::<Vec<_>>().join(", ")
            ))
        })?;
        Ok(base.join(folder))
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.folders.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_categories() {
        let categories = CategoryFolders::default();
        assert_eq!(categories.folder_name("SDXL"), Some("SDXL 10"));
        assert_eq!(categories.folder_name("pony"), Some("Pony"));
        assert_eq!(categories.folder_name("Sd15"), Some("SD15"));
        assert_eq!(categories.folder_name("FLUX"), None);
    }

    #[test]
    fn test_folder_for_joins_base() {
        let categories = CategoryFolders::default();
        let folder = categories.folder_for(Path::new("/models"), "sdxl").unwrap();
        assert_eq!(folder, PathBuf::from("/models/SDXL 10"));
    }

    #[test]
    fn test_unknown_category_is_configuration_error() {
        let err = CategoryFolders::default()
            .folder_for(Path::new("/models"), "FLUX")
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidConfiguration(ref msg) if msg.contains("FLUX")));
    }

    #[test]
    fn test_custom_category() {
        let mut categories = CategoryFolders::default();
        categories.set("flux", "Flux Dev");
        assert_eq!(categories.folder_name("FLUX"), Some("Flux Dev"));
    }

    #[test]
    fn test_static_registry() {
        let mut registry = StaticRegistry::new().with_folders(CHECKPOINTS_KIND, vec![PathBuf::from("/a")]);
        registry.add_folder(CHECKPOINTS_KIND, PathBuf::from("/b"));

        assert_eq!(
            registry.folder_paths(CHECKPOINTS_KIND),
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
        assert!(registry.folder_paths("loras").is_empty());
    }
}
