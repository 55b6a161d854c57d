//! Resolver facade: name-based resolution and category rotation

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{ResolveError, ResolveResult};
use crate::extensions::ExtensionSet;
use crate::gate::{SafeGate, SafetyMode, VerifiedCheckpoint};
use crate::host::{CHECKPOINTS_KIND, CategoryFolders, CheckpointLoader, DirectoryRegistry};
use crate::index::{CandidateRecord, PathIndex};
use crate::matcher::{AmbiguityPolicy, MatchTier, Matcher};
use crate::rotation::{self, IntervalMinutes, RotationWindow};

/// Validated resolver settings
#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    /// Extensions used in unsafe mode; safe mode always uses the approved set
    pub extensions: ExtensionSet,
    pub safety: SafetyMode,
    pub ambiguity: AmbiguityPolicy,
}

/// A successful name-based resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    /// `/`-separated path relative to `base_directory`
    pub relative_path: String,
    pub base_directory: PathBuf,
    pub tier: MatchTier,
    /// Present when the file went through the safe gate
    pub verified: Option<VerifiedCheckpoint>,
}

impl Resolution {
    pub fn full_path(&self) -> PathBuf {
        self.base_directory.join(&self.relative_path)
    }
}

/// A successful rotation selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationPick {
    pub folder: PathBuf,
    pub full_path: PathBuf,
    pub filename: String,
    pub window: RotationWindow,
}

/// Entry point composing index, matcher, gate and rotation
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    options: ResolverOptions,
    gate: SafeGate,
}

impl Resolver {
    pub fn new(options: ResolverOptions) -> Self {
        debug!(?options, "Resolver::new: called");
        Self {
            options,
            gate: SafeGate::new(),
        }
    }

    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Extensions in effect for the current safety mode
    pub fn active_extensions(&self) -> &ExtensionSet {
        match self.options.safety {
            SafetyMode::Safe => self.gate.approved(),
            SafetyMode::Unsafe => &self.options.extensions,
        }
    }

    /// Candidates visible under `base_directories` in the current mode
    pub fn candidates<P: AsRef<Path>>(&self, base_directories: &[P]) -> Vec<CandidateRecord> {
        PathIndex::new(self.active_extensions().clone()).scan(base_directories)
    }

    /// Resolve `query` to exactly one checkpoint under `base_directories`
    pub fn resolve_by_name<P: AsRef<Path>>(&self, query: &str, base_directories: &[P]) -> ResolveResult<Resolution> {
        debug!(%query, safety = ?self.options.safety, "Resolver::resolve_by_name: called");
        if query.trim().is_empty() {
            return Err(ResolveError::NotFound {
                query: query.to_string(),
            });
        }
        if !self.options.safety.is_safe() {
            warn!(%query, extensions = %self.options.extensions, "Unsafe mode: checkpoint will not be validated before load");
        }

        let extensions = self.active_extensions();
        let candidates = self.candidates(base_directories);
        debug!(count = candidates.len(), "Resolver::resolve_by_name: candidates collected");

        let matched = Matcher::new(self.options.ambiguity).resolve(query, &candidates, Some(extensions))?;
        let record = matched.record;

        let verified = match self.options.safety {
            SafetyMode::Safe => Some(self.gate.verify(&record.full_path())?),
            SafetyMode::Unsafe => None,
        };

        info!(
            path = %record.relative_path,
            base = ?record.base_directory,
            tier = %matched.tier,
            "Resolved checkpoint"
        );
        Ok(Resolution {
            relative_path: record.relative_path,
            base_directory: record.base_directory,
            tier: matched.tier,
            verified,
        })
    }

    /// Deterministic pick among the files directly inside `folder`
    pub fn resolve_by_rotation(
        &self,
        category: &str,
        interval: IntervalMinutes,
        folder: &Path,
        now: NaiveDateTime,
    ) -> ResolveResult<RotationPick> {
        debug!(%category, %interval, ?folder, %now, "Resolver::resolve_by_rotation: called");
        let files = PathIndex::new(self.active_extensions().clone()).list_folder(folder)?;
        if files.is_empty() {
            return Err(ResolveError::NotFound {
                query: format!("checkpoint files in {}", folder.display()),
            });
        }

        let filename = rotation::select(category, interval, &files, now)?;
        let window = RotationWindow::containing(category, interval, now);

        info!(%category, window = %window.label(), %filename, "Rotation selected checkpoint");
        Ok(RotationPick {
            folder: folder.to_path_buf(),
            full_path: folder.join(&filename),
            filename,
            window,
        })
    }

    /// Rotation over `base_folder/<category folder>`
    pub fn resolve_category_rotation(
        &self,
        categories: &CategoryFolders,
        base_folder: &Path,
        category: &str,
        interval: IntervalMinutes,
        now: NaiveDateTime,
    ) -> ResolveResult<RotationPick> {
        let folder = categories.folder_for(base_folder, category)?;
        self.resolve_by_rotation(category, interval, &folder, now)
    }

    /// Resolve through the host registry and hand the result to the host loader
    pub fn load_by_name<R, L>(&self, registry: &R, loader: &L, query: &str) -> ResolveResult<(L::Artifacts, String)>
    where
        R: DirectoryRegistry,
        L: CheckpointLoader,
    {
        let dirs = registry.folder_paths(CHECKPOINTS_KIND);
        debug!(%query, dir_count = dirs.len(), "Resolver::load_by_name: called");

        let resolution = self.resolve_by_name(query, dirs.as_slice())?;
        let artifacts = loader
            .load_checkpoint(&resolution.relative_path)
            .map_err(|e| ResolveError::Load(e.to_string()))?;

        Ok((artifacts, resolution.relative_path))
    }
}
