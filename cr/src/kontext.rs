//! Target-size planning for Flux Kontext inputs
//!
//! Only the choice of output dimensions lives here; the pixel resize is done by
//! the host's scaling utility using the returned plan.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ResolveError, ResolveResult};

/// Resolutions Flux Kontext was trained on, as `(width, height)`
pub const PREFERRED_KONTEXT_RESOLUTIONS: [(u32, u32); 17] = [
    (672, 1568),
    (688, 1504),
    (720, 1456),
    (752, 1392),
    (800, 1328),
    (832, 1248),
    (880, 1184),
    (944, 1104),
    (1024, 1024),
    (1104, 944),
    (1184, 880),
    (1248, 832),
    (1328, 800),
    (1392, 752),
    (1456, 720),
    (1504, 688),
    (1568, 672),
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResizeMode {
    /// Scale to cover the target and crop the overflow
    #[default]
    Crop,
    /// Scale each axis independently to the target
    Stretch,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    #[default]
    Lanczos,
    Bilinear,
    Nearest,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CropAnchor {
    #[default]
    Center,
    Top,
    Bottom,
    Left,
    Right,
}

/// What the host scaler should do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResizePlan {
    pub width: u32,
    pub height: u32,
    pub interpolation: Interpolation,
    /// `None` for stretch, the anchor to crop around otherwise
    pub crop_anchor: Option<CropAnchor>,
}

/// Preferred resolution whose aspect ratio is closest to `width / height`
pub fn preferred_resolution(width: u32, height: u32) -> ResolveResult<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(ResolveError::InvalidConfiguration(format!(
            "image dimensions must be non-zero, got {}x{}",
            width, height
        )));
    }

    let aspect = f64::from(width) / f64::from(height);
    let best = PREFERRED_KONTEXT_RESOLUTIONS
        .iter()
        .map(|&(w, h)| ((aspect - f64::from(w) / f64::from(h)).abs(), w, h))
        .min_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(_, w, h)| (w, h))
        .unwrap_or((1024, 1024));

    Ok(best)
}

pub fn plan_resize(
    width: u32,
    height: u32,
    mode: ResizeMode,
    interpolation: Interpolation,
    anchor: CropAnchor,
) -> ResolveResult<ResizePlan> {
    debug!(width, height, ?mode, ?interpolation, ?anchor, "kontext::plan_resize: called");
    let (target_w, target_h) = preferred_resolution(width, height)?;

    let crop_anchor = match mode {
        ResizeMode::Crop => Some(anchor),
        ResizeMode::Stretch => None,
    };

    Ok(ResizePlan {
        width: target_w,
        height: target_h,
        interpolation,
        crop_anchor,
    })
}
