//! Configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::extensions::ExtensionSet;
use crate::gate::SafetyMode;
use crate::host::{CHECKPOINTS_KIND, CategoryFolders, DirectoryRegistry, StaticRegistry};
use crate::matcher::AmbiguityPolicy;
use crate::resolver::ResolverOptions;
use crate::rotation::IntervalMinutes;

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name-resolution settings
    pub resolver: ResolverConfig,

    /// Rotation settings
    pub rotation: RotationConfig,

    /// Search folders by kind (e.g. `checkpoints`)
    pub folders: StaticRegistry,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .ckptresolver.yml
        let local_config = PathBuf::from(".ckptresolver.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/ckptresolver/ckptresolver.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("ckptresolver").join("ckptresolver.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = config_path.cloned().or_else(|| {
            let local = PathBuf::from(".ckptresolver.yml");
            local.exists().then_some(local)
        })?;
        let content = fs::read_to_string(path).ok()?;
        let config: Self = serde_yaml::from_str(&content).ok()?;
        config.log_level
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Checkpoint search folders, defaulting to the rotation base folder
    pub fn checkpoint_dirs(&self) -> Vec<PathBuf> {
        let dirs = self.folders.folder_paths(CHECKPOINTS_KIND);
        if dirs.is_empty() {
            vec![self.rotation.base_folder.clone()]
        } else {
            dirs
        }
    }
}

/// Name-resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Comma-separated extension list, used in unsafe mode
    pub extensions: String,

    /// Validate files as safetensors before use
    #[serde(rename = "safe-mode")]
    pub safe_mode: bool,

    /// When two top candidates count as tied
    pub ambiguity: AmbiguityPolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            extensions: ".safetensors,.sft".to_string(),
            safe_mode: true,
            ambiguity: AmbiguityPolicy::default(),
        }
    }
}

impl ResolverConfig {
    /// Validate into resolver options
    pub fn options(&self) -> Result<ResolverOptions> {
        let extensions = ExtensionSet::parse(&self.extensions).context("Invalid resolver.extensions")?;
        Ok(ResolverOptions {
            extensions,
            safety: SafetyMode::from_flag(self.safe_mode),
            ambiguity: self.ambiguity,
        })
    }
}

/// Rotation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Folder containing one sub-folder per category
    #[serde(rename = "base-folder")]
    pub base_folder: PathBuf,

    /// Rotation interval in minutes (1-1440)
    #[serde(rename = "interval-minutes")]
    pub interval_minutes: u32,

    /// Default category when none is given
    pub category: String,

    /// Category → folder name
    pub categories: CategoryFolders,
}

impl Default for RotationConfig {
    fn default() -> Self {
        let base_folder = dirs::data_dir()
            .map(|d| d.join("ckptresolver").join("checkpoints"))
            .unwrap_or_else(|| PathBuf::from("models/checkpoints"));

        Self {
            base_folder,
            interval_minutes: crate::rotation::DEFAULT_INTERVAL_MINUTES,
            category: "SDXL".to_string(),
            categories: CategoryFolders::default(),
        }
    }
}

impl RotationConfig {
    pub fn interval(&self) -> Result<IntervalMinutes> {
        IntervalMinutes::new(self.interval_minutes).context("Invalid rotation.interval-minutes")
    }
}
