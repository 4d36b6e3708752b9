//! Shared types for the restora enhancement pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Re-export `RgbImage` so downstream crates can pass pixel data
/// without depending on `image` directly.
pub use image::RgbImage;

/// Re-export `GrayImage` for the luma projections used by the
/// analyzer and the quality metrics.
pub use image::GrayImage;

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions of an RGB image.
    #[must_use]
    pub fn of(image: &RgbImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }

    /// Total number of pixels.
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns `true` if either side is zero.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ───────────────────────── Stages ──────────────────────────────────

/// Number of toggleable enhancement stages.
pub const STAGE_COUNT: usize = 4;

/// The four enhancement stages, in the fixed order the enhancer runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Non-local means denoising.
    Denoise,
    /// Tiled luma equalization followed by gamma correction.
    Contrast,
    /// Unsharp masking.
    Sharpen,
    /// Learned or interpolated upscaling.
    SuperResolve,
}

impl StageKind {
    /// All stages in execution order.
    pub const ALL: [Self; STAGE_COUNT] =
        [Self::Denoise, Self::Contrast, Self::Sharpen, Self::SuperResolve];

    /// Short machine-friendly name, used in logs and error tags.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Denoise => "denoise",
            Self::Contrast => "contrast",
            Self::Sharpen => "sharpen",
            Self::SuperResolve => "super_res",
        }
    }

    /// Zero-based position in the execution order.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Denoise => 0,
            Self::Contrast => 1,
            Self::Sharpen => 2,
            Self::SuperResolve => 3,
        }
    }

    /// Whether the stage may change image dimensions.
    #[must_use]
    pub const fn resizes(self) -> bool {
        matches!(self, Self::SuperResolve)
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ───────────────────────── Configuration ───────────────────────────

/// Enablement flags and parameters for every stage.
///
/// Built once per enhancer and never mutated while it runs. Parameter
/// values are validated by the stage that consumes them; an out-of-range
/// value surfaces as [`StageError::InvalidParameter`] from `enhance()`.
/// The model name and scale are validated earlier, when the enhancer is
/// constructed.
///
/// Missing fields deserialize to their defaults, so a JSON document only
/// needs to name the parameters it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Run the denoise stage.
    pub denoise: bool,
    /// Filter strength `h`. Higher values smooth more and lose more detail.
    pub denoise_strength: f64,

    /// Run the contrast stage.
    pub contrast: bool,
    /// Per-tile histogram clip limit, relative to a flat histogram.
    pub clahe_clip_limit: f64,
    /// Number of tiles along each axis.
    pub clahe_tile_grid: u32,
    /// Fixed gamma. Takes precedence over `auto_brightness`.
    pub gamma: Option<f64>,
    /// Derive gamma from the mean brightness when no fixed gamma is set.
    pub auto_brightness: bool,

    /// Run the sharpen stage.
    pub sharpen: bool,
    /// Weight of the high-frequency residual added back.
    pub sharpen_amount: f64,
    /// Residuals with magnitude at or below this are dropped.
    pub sharpen_threshold: f64,
    /// Gaussian sigma of the blurred copy.
    pub sharpen_sigma: f64,
    /// Odd Gaussian kernel size. `0` derives the size from the sigma.
    pub sharpen_kernel_size: u32,
    /// Choose the amount from the input's Laplacian variance instead.
    pub adaptive_sharpen: bool,

    /// Run the super-resolution stage.
    pub super_res: bool,
    /// Model architecture name (`edsr`, `fsrcnn`, `espcn`, `lapsrn`).
    pub model: String,
    /// Integer upscale factor.
    pub scale: u32,
}

impl StageConfig {
    /// Default denoise filter strength.
    pub const DEFAULT_DENOISE_STRENGTH: f64 = 10.0;
    /// Default CLAHE clip limit.
    pub const DEFAULT_CLAHE_CLIP_LIMIT: f64 = 2.0;
    /// Default CLAHE tile grid (8×8).
    pub const DEFAULT_CLAHE_TILE_GRID: u32 = 8;
    /// Default unsharp-mask amount.
    pub const DEFAULT_SHARPEN_AMOUNT: f64 = 1.5;
    /// Default unsharp-mask threshold (no suppression).
    pub const DEFAULT_SHARPEN_THRESHOLD: f64 = 0.0;
    /// Default unsharp-mask blur sigma.
    pub const DEFAULT_SHARPEN_SIGMA: f64 = 1.0;
    /// Default unsharp-mask kernel size.
    pub const DEFAULT_SHARPEN_KERNEL_SIZE: u32 = 5;
    /// Default model architecture.
    pub const DEFAULT_MODEL: &'static str = "edsr";
    /// Default upscale factor.
    pub const DEFAULT_SCALE: u32 = 2;

    /// Whether `stage` is switched on.
    #[must_use]
    pub const fn is_enabled(&self, stage: StageKind) -> bool {
        match stage {
            StageKind::Denoise => self.denoise,
            StageKind::Contrast => self.contrast,
            StageKind::Sharpen => self.sharpen,
            StageKind::SuperResolve => self.super_res,
        }
    }

    /// Turn `stage` on or off.
    pub const fn set_enabled(&mut self, stage: StageKind, enabled: bool) {
        match stage {
            StageKind::Denoise => self.denoise = enabled,
            StageKind::Contrast => self.contrast = enabled,
            StageKind::Sharpen => self.sharpen = enabled,
            StageKind::SuperResolve => self.super_res = enabled,
        }
    }

    /// Enabled stages in execution order.
    pub fn enabled_stages(&self) -> impl Iterator<Item = StageKind> + '_ {
        StageKind::ALL
            .into_iter()
            .filter(|&stage| self.is_enabled(stage))
    }
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            denoise: true,
            denoise_strength: Self::DEFAULT_DENOISE_STRENGTH,
            contrast: true,
            clahe_clip_limit: Self::DEFAULT_CLAHE_CLIP_LIMIT,
            clahe_tile_grid: Self::DEFAULT_CLAHE_TILE_GRID,
            gamma: None,
            auto_brightness: true,
            sharpen: true,
            sharpen_amount: Self::DEFAULT_SHARPEN_AMOUNT,
            sharpen_threshold: Self::DEFAULT_SHARPEN_THRESHOLD,
            sharpen_sigma: Self::DEFAULT_SHARPEN_SIGMA,
            sharpen_kernel_size: Self::DEFAULT_SHARPEN_KERNEL_SIZE,
            adaptive_sharpen: false,
            super_res: true,
            model: Self::DEFAULT_MODEL.to_owned(),
            scale: Self::DEFAULT_SCALE,
        }
    }
}

// ───────────────────────── Errors ──────────────────────────────────

/// Failure reported by an inference backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{backend}: {message}")]
pub struct BackendError {
    /// Which backend failed (e.g. `"onnx"`, `"interpolation"`).
    pub backend: String,
    /// Human-readable cause.
    pub message: String,
}

impl BackendError {
    #[must_use]
    pub fn new(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            backend: backend.into(),
            message: message.into(),
        }
    }
}

/// Why a single stage could not produce its output.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StageError {
    /// A numeric parameter is outside the range the stage accepts.
    #[error("invalid {name} = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in [`StageConfig`].
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// What the stage requires instead.
        reason: &'static str,
    },

    /// The stage returned an image of unexpected size.
    #[error("stage produced {actual}, expected {expected}")]
    DimensionMismatch {
        /// Size the stage contract requires.
        expected: Dimensions,
        /// Size the stage returned.
        actual: Dimensions,
    },

    /// The inference backend failed while running.
    #[error("backend failure: {0}")]
    Backend(#[from] BackendError),
}

/// Errors surfaced by the enhancer to its caller.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// The input is not a non-empty 3-channel 8-bit image.
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// A stage failed. Snapshots collected before the failure are discarded.
    #[error("{stage} stage failed: {cause}")]
    StageFailure {
        /// The failing stage.
        stage: StageKind,
        /// The stage's own error.
        #[source]
        cause: StageError,
    },

    /// Unknown model name, or a scale the model does not support.
    #[error("unsupported configuration: model {model:?} at scale {scale}")]
    UnsupportedConfiguration {
        /// Requested model name.
        model: String,
        /// Requested scale factor.
        scale: u32,
    },
}

/// Build an [`RgbImage`] from raw interleaved samples.
///
/// Accepts only 3-channel data whose length matches `width * height * 3`.
///
/// # Errors
///
/// Returns [`PipelineError::InvalidImage`] if either dimension is zero,
/// `channels` is not 3, or the buffer length is wrong.
pub fn image_from_raw(
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
) -> Result<RgbImage, PipelineError> {
    if width == 0 || height == 0 {
        return Err(PipelineError::InvalidImage(format!(
            "dimensions must be positive, got {width}x{height}",
        )));
    }
    if channels != 3 {
        return Err(PipelineError::InvalidImage(format!(
            "expected 3 channels, got {channels}",
        )));
    }
    let len = data.len();
    let mismatch = || {
        PipelineError::InvalidImage(format!(
            "buffer of {len} bytes does not match {width}x{height}x3",
        ))
    };
    if len as u64 != Dimensions::new(width, height).pixel_count() * 3 {
        return Err(mismatch());
    }
    RgbImage::from_raw(width, height, data).ok_or_else(mismatch)
}
