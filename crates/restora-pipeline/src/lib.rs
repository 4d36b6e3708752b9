//! restora-pipeline: Image enhancement pipeline (sans-IO).
//!
//! Improves a single raster image through up to four stages:
//! denoise -> contrast -> sharpen -> super-resolution.
//!
//! Alongside the stages the crate provides a read-only analyzer (blur,
//! noise and brightness estimates) and PSNR/SSIM quality assessment.
//!
//! This crate has **no I/O dependencies**. It works on decoded
//! [`RgbImage`] buffers, and learns about trained super-resolution models
//! only through the [`ModelSource`] trait. Fetching, caching, loading and
//! file handling all live in `restora-io`.

pub mod analyze;
pub mod blur;
pub mod color;
pub mod contrast;
pub mod denoise;
pub mod diagnostics;
pub mod pipeline;
pub mod plane;
pub mod quality;
pub mod resample;
pub mod sharpen;
pub mod types;
pub mod upscale;

pub use analyze::{AnalysisReport, BlurLevel, BrightnessLevel, ImageInfo, NoiseLevel, analyze};
pub use diagnostics::{PipelineDiagnostics, StageDiagnostics, StageMetrics};
pub use pipeline::{ImageEnhancer, PipelineResult, Snapshot, SnapshotName};
pub use quality::{QualityMetrics, assess};
pub use resample::ResampleFilter;
pub use types::{
    BackendError, Dimensions, GrayImage, PipelineError, RgbImage, StageConfig, StageError,
    StageKind, image_from_raw,
};
pub use upscale::{
    InterpolationUpscaler, ModelArch, ModelSource, ModelUnavailable, NoModels, ResolveError,
    ResolvedModel, SuperResolver, Upscaler,
};

/// Enhance `image` once with `config`, upscaling by interpolation.
///
/// Convenience for callers without a model store. Building an
/// [`ImageEnhancer`] is cheaper when several images share one
/// configuration.
///
/// # Errors
///
/// Same as [`ImageEnhancer::new`] followed by [`ImageEnhancer::enhance`].
pub fn enhance(image: &RgbImage, config: StageConfig) -> Result<PipelineResult, PipelineError> {
    ImageEnhancer::new(config, &NoModels)?.enhance(image)
}
