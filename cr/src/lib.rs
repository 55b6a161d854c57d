//! CkptResolver - checkpoint resolution for image-generation pipelines
//!
//! Hands a downstream loader one stable, validated checkpoint path without the
//! caller knowing exact filenames or directory layout.
//!
//! # Modules
//!
//! - [`index`] - recursive candidate discovery under base directories
//! - [`matcher`] - five-tier fuzzy matching with deterministic tie-break
//! - [`gate`] - safe-mode safetensors validation
//! - [`rotation`] - time-windowed deterministic rotation
//! - [`resolver`] - facade composing the above
//! - [`host`] - directory registry and checkpoint loader seams
//! - [`kontext`] - preferred Flux Kontext target sizes
//!
//! # Example
//!
//! ```ignore
//! use ckptresolver::{Resolver, ResolverOptions};
//!
//! let resolver = Resolver::new(ResolverOptions::default());
//! let resolution = resolver.resolve_by_name("juggernaut", &["/models/checkpoints"])?;
//! println!("{} in {}", resolution.relative_path, resolution.base_directory.display());
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod extensions;
pub mod gate;
pub mod host;
pub mod index;
pub mod kontext;
pub mod matcher;
pub mod resolver;
pub mod rotation;

pub use error::{GateRejection, ResolveError, ResolveResult};
pub use extensions::{ExtensionSet, SAFE_EXTENSIONS};
pub use gate::{SafeGate, SafetyMode, VerifiedCheckpoint};
pub use host::{CHECKPOINTS_KIND, CategoryFolders, CheckpointLoader, DirectoryRegistry, StaticRegistry};
pub use index::{CandidateRecord, PathIndex};
pub use matcher::{AmbiguityPolicy, Match, MatchQuery, MatchTier, Matcher};
pub use resolver::{Resolution, Resolver, ResolverOptions, RotationPick};
pub use rotation::{IntervalMinutes, RotationWindow};
