//! Time-windowed deterministic checkpoint rotation
//!
//! The selection for a category is a pure function of the category, the
//! interval window containing `now`, and the file list. A fresh generator is
//! seeded for every call, so there is no shared state between calls.

use std::fmt;

use chrono::{NaiveDateTime, Timelike};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{ResolveError, ResolveResult};

/// Longest allowed rotation interval (one day)
pub const MAX_INTERVAL_MINUTES: u32 = 1440;

/// Default rotation interval (one hour)
pub const DEFAULT_INTERVAL_MINUTES: u32 = 60;

const WINDOW_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Rotation interval in minutes, always within 1..=1440
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct IntervalMinutes(u32);

impl IntervalMinutes {
    pub fn new(minutes: u32) -> ResolveResult<Self> {
        if (1..=MAX_INTERVAL_MINUTES).contains(&minutes) {
            Ok(Self(minutes))
        } else {
            Err(ResolveError::InvalidConfiguration(format!(
                "interval must be between 1 and {} minutes, got {}",
                MAX_INTERVAL_MINUTES, minutes
            )))
        }
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for IntervalMinutes {
    fn default() -> Self {
        Self(DEFAULT_INTERVAL_MINUTES)
    }
}

impl TryFrom<u32> for IntervalMinutes {
    type Error = ResolveError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::new(minutes)
    }
}

impl From<IntervalMinutes> for u32 {
    fn from(interval: IntervalMinutes) -> Self {
        interval.0
    }
}

impl fmt::Display for IntervalMinutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

/// The interval-aligned time bucket a selection belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RotationWindow {
    pub category: String,
    pub interval_minutes: IntervalMinutes,
    pub window_start: NaiveDateTime,
}

impl RotationWindow {
    /// Window of `category` containing `now`.
    ///
    /// The minute field is reduced to `minute - minute % interval` and
    /// seconds are zeroed, so intervals longer than an hour align to the hour.
    pub fn containing(category: &str, interval: IntervalMinutes, now: NaiveDateTime) -> Self {
        let minute = now.minute() - now.minute() % interval.get();
        let window_start = now
            .with_minute(minute)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);

        Self {
            category: category.to_string(),
            interval_minutes: interval,
            window_start,
        }
    }

    /// Window start as used in the seed, `YYYY-MM-DD HH:MM`
    pub fn label(&self) -> String {
        self.window_start.format(WINDOW_FORMAT).to_string()
    }

    /// Stable seed: first 8 bytes (little-endian) of SHA-256 over category and window label
    pub fn seed(&self) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(self.category.as_bytes());
        hasher.update([0x1fu8]);
        hasher.update(self.label().as_bytes());
        let digest = hasher.finalize();

        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        u64::from_le_bytes(bytes)
    }

    /// Draw one entry from `files` using a generator seeded for this window
    pub fn draw<'a, T>(&self, files: &'a [T]) -> Option<&'a T> {
        let mut rng = StdRng::seed_from_u64(self.seed());
        files.choose(&mut rng)
    }
}

/// Pick the file for `category` in the window containing `now`.
///
/// `files` is used in the order given; callers wanting reproducibility across
/// directory listings must pass a stable order.
pub fn select(category: &str, interval: IntervalMinutes, files: &[String], now: NaiveDateTime) -> ResolveResult<String> {
    let window = RotationWindow::containing(category, interval, now);
    debug!(%category, %interval, window = %window.label(), file_count = files.len(), "rotation::select: called");

    let chosen = window.draw(files).ok_or_else(|| ResolveError::NotFound {
        query: format!("{} rotation pool", category),
    })?;

    debug!(%chosen, "rotation::select: selected");
    Ok(chosen.clone())
}
