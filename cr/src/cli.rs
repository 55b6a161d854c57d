//! CLI argument parsing for cr

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::kontext::{CropAnchor, Interpolation, ResizeMode};

#[derive(Parser, Debug)]
#[command(name = "cr")]
#[command(author, version, about = "Resolve and rotate diffusion checkpoints", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose (debug) output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a full path, filename, base name or fragment to one checkpoint
    Resolve {
        /// Name or path to look for
        #[arg(required = true)]
        query: String,

        /// Base directories to search (default: configured checkpoint folders)
        #[arg(short, long = "dir")]
        dirs: Vec<PathBuf>,

        /// Legacy mode: skip safetensors validation and use --extensions
        #[arg(long = "unsafe")]
        unsafe_mode: bool,

        /// Comma-separated extensions for unsafe mode (e.g. ".safetensors,.ckpt")
        #[arg(short, long)]
        extensions: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Pick the checkpoint for the current rotation window of a category
    Rotate {
        /// Category (SDXL, PONY, SD15, or any configured one)
        #[arg(long)]
        category: Option<String>,

        /// Rotation interval in minutes (1-1440)
        #[arg(short, long)]
        interval: Option<u32>,

        /// Folder holding one sub-folder per category
        #[arg(short, long)]
        base_folder: Option<PathBuf>,

        /// Evaluate at this local time instead of now ("YYYY-MM-DD HH:MM")
        #[arg(long)]
        at: Option<String>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Check that a file is a well-formed safetensors container
    Verify {
        /// File to check
        #[arg(required = true)]
        path: PathBuf,
    },

    /// List candidate checkpoints
    List {
        /// Base directories to scan (default: configured checkpoint folders)
        #[arg(short, long = "dir")]
        dirs: Vec<PathBuf>,

        /// Include files allowed only in unsafe mode
        #[arg(long = "unsafe")]
        unsafe_mode: bool,
    },

    /// Preferred Flux Kontext size for an input image
    Kontext {
        /// Input width in pixels
        width: u32,

        /// Input height in pixels
        height: u32,

        #[arg(short, long, value_enum, default_value_t = ResizeMode::Crop)]
        mode: ResizeMode,

        #[arg(short, long, value_enum, default_value_t = Interpolation::Lanczos)]
        interpolation: Interpolation,

        #[arg(short, long, value_enum, default_value_t = CropAnchor::Center)]
        anchor: CropAnchor,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
