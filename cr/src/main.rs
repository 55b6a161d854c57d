use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::{debug, info};

use ckptresolver::cli::{Cli, Command, OutputFormat};
use ckptresolver::config::Config;
use ckptresolver::{ExtensionSet, IntervalMinutes, Resolver, SafeGate, SafetyMode, kontext};

fn parse_level(level: &str) -> tracing::Level {
    match level.to_uppercase().as_str() {
        "TRACE" => tracing::Level::TRACE,
        "DEBUG" => tracing::Level::DEBUG,
        "INFO" => tracing::Level::INFO,
        "WARN" | "WARNING" => tracing::Level::WARN,
        "ERROR" => tracing::Level::ERROR,
        _ => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", level);
            tracing::Level::INFO
        }
    }
}

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>, verbose: bool) -> Result<()> {
    // Priority: CLI --log-level > config file > --verbose > INFO
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => parse_level(s),
        None if verbose => tracing::Level::DEBUG,
        None => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .try_init()
        .map_err(|e| eyre::eyre!("Failed to install subscriber: {}", e))?;

    debug!("Logging initialized (level: {:?})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref(), cli.verbose)
        .context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("cr starting");
    debug!(command = ?cli.command, "main: dispatching command");

    match cli.command {
        Command::Resolve {
            query,
            dirs,
            unsafe_mode,
            extensions,
            format,
        } => {
            let resolver = build_resolver(&config, unsafe_mode, extensions.as_deref())?;
            let dirs = if dirs.is_empty() { config.checkpoint_dirs() } else { dirs };
            let resolution = resolver.resolve_by_name(&query, &dirs)?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&resolution)?),
                OutputFormat::Text => {
                    println!(
                        "{} {} {}",
                        "✓".green(),
                        resolution.relative_path.cyan(),
                        format!("({})", resolution.tier).dimmed()
                    );
                    println!("  Base: {}", resolution.base_directory.display());
                    match &resolution.verified {
                        Some(v) => println!("  Verified: {} tensors, {} bytes", v.tensor_count, v.size_bytes),
                        None => println!("  {}", "Not verified (unsafe mode)".yellow()),
                    }
                }
            }
        }
        Command::Rotate {
            category,
            interval,
            base_folder,
            at,
            format,
        } => {
            let resolver = build_resolver(&config, false, None)?;
            let category = category.unwrap_or_else(|| config.rotation.category.clone());
            let interval = match interval {
                Some(minutes) => IntervalMinutes::new(minutes)?,
                None => config.rotation.interval()?,
            };
            let base_folder: PathBuf = base_folder.unwrap_or_else(|| config.rotation.base_folder.clone());
            let now = match at {
                Some(s) => NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M")
                    .context(format!("Invalid --at time '{}', expected YYYY-MM-DD HH:MM", s))?,
                None => chrono::Local::now().naive_local(),
            };

            let pick = resolver.resolve_category_rotation(
                &config.rotation.categories,
                &base_folder,
                &category,
                interval,
                now,
            )?;

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&pick)?),
                OutputFormat::Text => {
                    println!("{} {}", "✓".green(), pick.filename.cyan());
                    println!("  Folder: {}", pick.folder.display());
                    println!("  Path: {}", pick.full_path.display());
                    println!("  Window: {} ({})", pick.window.label(), interval);
                }
            }
        }
        Command::Verify { path } => {
            let verified = SafeGate::new().verify(&path)?;
            println!(
                "{} {} ({} tensors, {} bytes)",
                "✓".green(),
                verified.path.display(),
                verified.tensor_count,
                verified.size_bytes
            );
        }
        Command::List { dirs, unsafe_mode } => {
            let resolver = build_resolver(&config, unsafe_mode, None)?;
            let dirs = if dirs.is_empty() { config.checkpoint_dirs() } else { dirs };
            let candidates = resolver.candidates(&dirs);
            if candidates.is_empty() {
                println!("No checkpoints found");
            } else {
                for c in candidates {
                    println!("{} {}", c.relative_path, format!("[{}]", c.base_directory.display()).dimmed());
                }
            }
        }
        Command::Kontext {
            width,
            height,
            mode,
            interpolation,
            anchor,
        } => {
            let plan = kontext::plan_resize(width, height, mode, interpolation, anchor)?;
            let anchor = plan
                .crop_anchor
                .map(|a| format!("crop {:?}", a).to_lowercase())
                .unwrap_or_else(|| "stretch".to_string());
            println!(
                "{}x{} -> {}x{} ({}, {:?})",
                width,
                height,
                plan.width.to_string().cyan(),
                plan.height.to_string().cyan(),
                anchor,
                plan.interpolation
            );
        }
    }

    Ok(())
}

fn build_resolver(config: &Config, force_unsafe: bool, extensions: Option<&str>) -> Result<Resolver> {
    let mut options = config.resolver.options().context("Invalid resolver configuration")?;
    if force_unsafe {
        options.safety = SafetyMode::Unsafe;
    }
    if let Some(list) = extensions {
        options.extensions = ExtensionSet::parse(list)?;
    }
    Ok(Resolver::new(options))
}
