//! Resolver error types

use std::path::PathBuf;
use thiserror::Error;

use crate::index::CandidateRecord;
use crate::matcher::MatchTier;

/// Errors that can occur while resolving or rotating checkpoints
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Checkpoint directory unavailable: {path}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Checkpoint '{query}' not found in checkpoint directories")]
    NotFound { query: String },

    #[error("Ambiguous checkpoint match for '{query}' ({tier}): {}. Provide a more specific name/path.", format_candidates(.candidates))]
    Ambiguous {
        query: String,
        tier: MatchTier,
        candidates: Vec<CandidateRecord>,
    },

    #[error("File '{path}' rejected by safe mode: {reason}")]
    UnsafeFormatRejected {
        path: PathBuf,
        #[source]
        reason: GateRejection,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Checkpoint loader failed: {0}")]
    Load(String),
}

/// Why the safe gate refused a file
#[derive(Debug, Error)]
pub enum GateRejection {
    #[error("extension '{extension}' is not an approved safetensors extension")]
    DisallowedExtension { extension: String },

    #[error("cannot read file: {0}")]
    Unreadable(#[from] std::io::Error),

    #[error("not a valid safetensors file: {0}")]
    Malformed(#[from] safetensors::SafeTensorError),
}

fn format_candidates(candidates: &[CandidateRecord]) -> String {
    candidates
        .iter()
        .map(|c| format!("{} in {}", c.relative_path, c.base_directory.display()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result alias for resolver operations
pub type ResolveResult<T> = Result<T, ResolveError>;
