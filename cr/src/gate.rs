//! Safe-mode validation of checkpoint files
//!
//! Pickle-based formats (`.ckpt`, `.pt`, `.bin`) can execute arbitrary code on
//! load. In safe mode only safetensors containers are accepted, and only after
//! the whole container parses.

use std::fs;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use safetensors::SafeTensors;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{GateRejection, ResolveError, ResolveResult};
use crate::extensions::ExtensionSet;
use crate::matcher::split_extension;

/// Operating mode of the resolver
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SafetyMode {
    /// Only approved extensions, each file validated before use
    #[default]
    Safe,
    /// Legacy opt-out: any configured extension, no validation
    Unsafe,
}

impl SafetyMode {
    pub fn from_flag(safe: bool) -> Self {
        if safe { SafetyMode::Safe } else { SafetyMode::Unsafe }
    }

    pub fn is_safe(self) -> bool {
        self == SafetyMode::Safe
    }
}

/// A file that passed the gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedCheckpoint {
    pub path: PathBuf,
    pub tensor_count: usize,
    pub size_bytes: u64,
}

/// Structural validator for safetensors containers
#[derive(Debug, Clone)]
pub struct SafeGate {
    approved: ExtensionSet,
}

impl Default for SafeGate {
    fn default() -> Self {
        Self {
            approved: ExtensionSet::safe(),
        }
    }
}

impl SafeGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn approved(&self) -> &ExtensionSet {
        &self.approved
    }

    /// Verify that `path` is a well-formed safetensors file
    pub fn verify(&self, path: &Path) -> ResolveResult<VerifiedCheckpoint> {
        debug!(?path, "SafeGate::verify: called");
        let reject = |reason: GateRejection| {
            warn!(?path, %reason, "SafeGate::verify: rejected");
            ResolveError::UnsafeFormatRejected {
                path: path.to_path_buf(),
                reason,
            }
        };

        let file_name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        let extension = split_extension(&file_name).1.to_lowercase();
        if !self.approved.contains(&extension) {
            return Err(reject(GateRejection::DisallowedExtension { extension }));
        }

        let (tensor_count, size_bytes) = inspect(path).map_err(reject)?;

        info!(?path, tensor_count, size_bytes, "SafeGate::verify: valid safetensors file");
        Ok(VerifiedCheckpoint {
            path: path.to_path_buf(),
            tensor_count,
            size_bytes,
        })
    }
}

#[allow(unsafe_code)] // Mmap::map requires unsafe for memory-mapped I/O.
fn inspect(path: &Path) -> Result<(usize, u64), GateRejection> {
    let file = fs::File::open(path)?;
    let size_bytes = file.metadata()?.len();

    let tensor_count = if size_bytes == 0 {
        SafeTensors::deserialize(&[])?.names().len()
    } else {
        // SAFETY: mapping is read-only and dropped before returning.
        let mmap = unsafe { Mmap::map(&file)? };
        SafeTensors::deserialize(&mmap)?.names().len()
    };

    Ok((tensor_count, size_bytes))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Minimal valid safetensors bytes: one F32 tensor of two elements
    pub(crate) fn safetensors_bytes() -> Vec<u8> {
        let mut header = br#"{"weight":{"dtype":"F32","shape":[2],"data_offsets":[0,8]}}"#.to_vec();
        while header.len() % 8 != 0 {
            header.push(b' ');
        }
        let mut bytes = (header.len() as u64).to_le_bytes().to_vec();
        bytes.extend_from_slice(&header);
        bytes.extend_from_slice(&[0u8; 8]);
        bytes
    }

    #[test]
    fn test_accepts_valid_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("model.safetensors");
        fs::write(&path, safetensors_bytes()).unwrap();

        let verified = SafeGate::new().verify(&path).unwrap();
        assert_eq!(verified.tensor_count, 1);
        assert_eq!(verified.size_bytes, safetensors_bytes().len() as u64);
    }

    #[test]
    fn test_accepts_sft_extension_any_case() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("model.SFT");
        fs::write(&path, safetensors_bytes()).unwrap();

        assert!(SafeGate::new().verify(&path).is_ok());
    }

    #[test]
    fn test_rejects_garbage_contents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("model.safetensors");
        fs::write(&path, b"this is not a tensor container").unwrap();

        let err = SafeGate::new().verify(&path).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::UnsafeFormatRejected {
                reason: GateRejection::Malformed(_),
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_truncated_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("model.safetensors");
        let mut bytes = safetensors_bytes();
        bytes.truncate(bytes.len() - 4);
        fs::write(&path, bytes).unwrap();

        let err = SafeGate::new().verify(&path).unwrap_err();
        assert!(matches!(err, ResolveError::UnsafeFormatRejected { .. }));
    }

    #[test]
    fn test_rejects_empty_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.safetensors");
        fs::write(&path, b"").unwrap();

        let err = SafeGate::new().verify(&path).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::UnsafeFormatRejected {
                reason: GateRejection::Malformed(_),
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_pickle_extension_without_reading() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.ckpt");

        let err = SafeGate::new().verify(&path).unwrap_err();
        match err {
            ResolveError::UnsafeFormatRejected {
                reason: GateRejection::DisallowedExtension { extension },
                ..
            } => assert_eq!(extension, ".ckpt"),
            other => panic!("expected disallowed extension, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let temp = TempDir::new().unwrap();
        let err = SafeGate::new()
            .verify(&temp.path().join("gone.safetensors"))
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::UnsafeFormatRejected {
                reason: GateRejection::Unreadable(_),
                ..
            }
        ));
    }

    #[test]
    fn test_safety_mode_from_flag() {
        assert_eq!(SafetyMode::from_flag(true), SafetyMode::Safe);
        assert!(!SafetyMode::from_flag(false).is_safe());
        assert_eq!(SafetyMode::default(), SafetyMode::Safe);
    }
}
