//! The enhancement orchestrator.
//!
//! [`ImageEnhancer`] owns a [`StageConfig`] and the upscaler chosen for it,
//! and runs the enabled stages in their fixed order:
//!
//! ```text
//! denoise -> contrast -> sharpen -> super_res
//! ```
//!
//! ```rust
//! # use restora_pipeline::{ImageEnhancer, NoModels, PipelineError, RgbImage, SnapshotName, StageConfig};
//! # fn run() -> Result<(), PipelineError> {
//! let config = StageConfig {
//!     denoise: false,
//!     ..StageConfig::default()
//! };
//! let mut enhancer = ImageEnhancer::new(config, &NoModels)?;
//! let input = RgbImage::from_pixel(16, 16, image::Rgb([90, 90, 90]));
//! let result = enhancer.enhance(&input)?;
//! assert_eq!(result.enhanced().dimensions(), (32, 32));
//! assert!(result.get(SnapshotName::Denoised).is_none());
//! # Ok(())
//! # }
//! ```
//!
//! # Memory
//!
//! Every enabled stage leaves a full copy of its output in the
//! [`PipelineResult`], so a run holds up to five images at once (the
//! original plus four stage outputs). Inputs are single frames, not
//! streams, and the snapshots are what make before/after inspection
//! possible.
//!
//! # Failure
//!
//! A failing stage aborts the run. The snapshots gathered so far are
//! dropped and the caller receives [`PipelineError::StageFailure`] naming
//! the stage. The one recoverable condition, a model that cannot be
//! fetched or loaded, is handled once in [`ImageEnhancer::new`] by
//! switching to interpolation.

use std::fmt;
use std::time::Duration;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::analyze::{AnalysisReport, analyze, mean_brightness};
use crate::contrast::{ContrastParams, GammaMode, normalize_contrast};
use crate::denoise::{SEARCH_WINDOW, TEMPLATE_WINDOW, denoise};
use crate::diagnostics::{PipelineDiagnostics, PipelineSummary, StageDiagnostics, StageMetrics};
use crate::resample::scaled_dimensions;
use crate::sharpen::{SharpenParams, adaptive_amount, unsharp_mask};
use crate::types::{
    BackendError, Dimensions, PipelineError, RgbImage, StageConfig, StageError, StageKind,
};
use crate::upscale::{ModelSource, ResolveError, Upscaler};

// ───────────────────────── Snapshots ───────────────────────────────

/// Names of the images a run can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotName {
    /// The input, untouched.
    Original,
    /// After denoising.
    Denoised,
    /// After equalization and gamma.
    ContrastEnhanced,
    /// After unsharp masking.
    Sharpened,
    /// After upscaling.
    SuperRes,
    /// The final image; always the last snapshot produced.
    Enhanced,
}

impl SnapshotName {
    /// The snapshot a stage produces.
    #[must_use]
    pub const fn for_stage(stage: StageKind) -> Self {
        match stage {
            StageKind::Denoise => Self::Denoised,
            StageKind::Contrast => Self::ContrastEnhanced,
            StageKind::Sharpen => Self::Sharpened,
            StageKind::SuperResolve => Self::SuperRes,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Denoised => "denoised",
            Self::ContrastEnhanced => "contrast_enhanced",
            Self::Sharpened => "sharpened",
            Self::SuperRes => "super_res",
            Self::Enhanced => "enhanced",
        }
    }
}

impl fmt::Display for SnapshotName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named image captured at a stage boundary.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub name: SnapshotName,
    pub image: RgbImage,
}

/// Everything one `enhance()` call produced.
///
/// Snapshots are stored in the order they were taken, starting with
/// [`SnapshotName::Original`]. [`SnapshotName::Enhanced`] is not stored
/// separately; it resolves to the last snapshot.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    snapshots: Vec<Snapshot>,
    analysis: AnalysisReport,
    diagnostics: PipelineDiagnostics,
}

impl PipelineResult {
    /// The input image.
    #[must_use]
    pub fn original(&self) -> &RgbImage {
        &self.snapshots[0].image
    }

    /// The final image.
    #[must_use]
    pub fn enhanced(&self) -> &RgbImage {
        &self.last().image
    }

    /// Consume the result, keeping only the final image.
    #[must_use]
    pub fn into_enhanced(mut self) -> RgbImage {
        self.snapshots.swap_remove(self.snapshots.len() - 1).image
    }

    /// The snapshot called `name`, if that stage ran.
    #[must_use]
    pub fn get(&self, name: SnapshotName) -> Option<&RgbImage> {
        if name == SnapshotName::Enhanced {
            return Some(self.enhanced());
        }
        self.snapshots
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.image)
    }

    /// Names of every populated snapshot, in order, ending with
    /// [`SnapshotName::Enhanced`].
    #[must_use]
    pub fn snapshot_names(&self) -> Vec<SnapshotName> {
        self.snapshots
            .iter()
            .map(|s| s.name)
            .chain(std::iter::once(SnapshotName::Enhanced))
            .collect()
    }

    /// Every populated snapshot in order, with `enhanced` last.
    pub fn snapshots(&self) -> impl Iterator<Item = (SnapshotName, &RgbImage)> {
        self.snapshots
            .iter()
            .map(|s| (s.name, &s.image))
            .chain(std::iter::once((SnapshotName::Enhanced, self.enhanced())))
    }

    /// Analysis of the input image.
    #[must_use]
    pub const fn analysis(&self) -> &AnalysisReport {
        &self.analysis
    }

    /// Per-stage timings and parameters.
    #[must_use]
    pub const fn diagnostics(&self) -> &PipelineDiagnostics {
        &self.diagnostics
    }

    /// Wall-clock time of the whole run.
    #[must_use]
    pub const fn elapsed_time(&self) -> Duration {
        self.diagnostics.total_duration
    }

    fn last(&self) -> &Snapshot {
        // Never empty: the original is pushed before any stage runs.
        &self.snapshots[self.snapshots.len() - 1]
    }
}

// ───────────────────────── Enhancer ────────────────────────────────

/// Runs the enabled stages of a fixed [`StageConfig`].
///
/// The upscaler is resolved once, in [`new`](Self::new), and reused by
/// every [`enhance`](Self::enhance) call. An enhancer is not meant to be
/// shared between threads while enhancing; parallel batch work should
/// build one enhancer per worker.
#[derive(Debug)]
pub struct ImageEnhancer {
    config: StageConfig,
    upscaler: Option<Upscaler>,
}

impl ImageEnhancer {
    /// Build an enhancer, resolving the super-resolution model if that
    /// stage is enabled.
    ///
    /// A model that cannot be fetched or loaded is not an error: a
    /// warning is logged and the enhancer upscales by interpolation for
    /// its whole lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnsupportedConfiguration`] if
    /// super-resolution is enabled with an unknown model name or a scale
    /// that model does not support. `models` is not consulted in that
    /// case.
    pub fn new(config: StageConfig, models: &dyn ModelSource) -> Result<Self, PipelineError> {
        let upscaler = if config.super_res {
            Some(resolve_upscaler(&config, models)?)
        } else {
            None
        };
        debug!("enhancer configured: {config:?}");
        Ok(Self { config, upscaler })
    }

    /// The configuration this enhancer runs.
    #[must_use]
    pub const fn config(&self) -> &StageConfig {
        &self.config
    }

    /// The upscaler chosen at construction, if super-resolution is on.
    #[must_use]
    pub const fn upscaler(&self) -> Option<&Upscaler> {
        self.upscaler.as_ref()
    }

    /// Enhance one image.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidImage`] for an image with a zero
    /// dimension, and [`PipelineError::StageFailure`] if any stage fails.
    pub fn enhance(&mut self, image: &RgbImage) -> Result<PipelineResult, PipelineError> {
        let started = Instant::now();
        let input = Dimensions::of(image);
        if input.is_empty() {
            return Err(PipelineError::InvalidImage(format!(
                "dimensions must be positive, got {input}",
            )));
        }

        let analysis = analyze(image);
        info!(
            "enhancing {input} image (blur {}, noise {}, brightness {})",
            analysis.blur.label, analysis.noise.label, analysis.brightness.label,
        );

        let mut snapshots = vec![Snapshot {
            name: SnapshotName::Original,
            image: image.clone(),
        }];
        let mut stages = Vec::new();

        let Self { config, upscaler } = self;
        for stage in config.enabled_stages() {
            let stage_start = Instant::now();
            let current = &snapshots[snapshots.len() - 1].image;

            let (output, metrics) = run_stage(stage, config, upscaler.as_mut(), current)
                .map_err(|cause| PipelineError::StageFailure { stage, cause })?;
            check_dimensions(stage, config.scale, current, &output)
                .map_err(|cause| PipelineError::StageFailure { stage, cause })?;

            let duration = stage_start.elapsed();
            info!(
                "{stage} finished in {:.1}ms",
                duration.as_secs_f64() * 1000.0
            );
            stages.push(StageDiagnostics {
                stage,
                duration,
                metrics,
            });
            snapshots.push(Snapshot {
                name: SnapshotName::for_stage(stage),
                image: output,
            });
        }

        let output = Dimensions::of(&snapshots[snapshots.len() - 1].image);
        let diagnostics = PipelineDiagnostics {
            summary: PipelineSummary {
                input,
                output,
                stages_run: stages.len(),
            },
            stages,
            total_duration: started.elapsed(),
        };
        info!(
            "enhanced {input} -> {output} in {:.1}ms",
            diagnostics.total_duration.as_secs_f64() * 1000.0,
        );

        Ok(PipelineResult {
            snapshots,
            analysis,
            diagnostics,
        })
    }
}

fn resolve_upscaler(config: &StageConfig, models: &dyn ModelSource) -> Result<Upscaler, PipelineError> {
    match models.resolve(&config.model, config.scale) {
        Ok(model) => {
            info!("using {} for x{} super-resolution", model.describe(), model.scale);
            Ok(Upscaler::Model(model))
        }
        Err(ResolveError::Unsupported { model, scale }) => {
            Err(PipelineError::UnsupportedConfiguration { model, scale })
        }
        Err(ResolveError::Unavailable(unavailable)) => {
            warn!("{unavailable}; falling back to bicubic interpolation");
            Ok(Upscaler::fallback(config.scale, unavailable.reason))
        }
    }
}

/// Run one stage on `image`, returning its output and metrics.
fn run_stage(
    stage: StageKind,
    config: &StageConfig,
    upscaler: Option<&mut Upscaler>,
    image: &RgbImage,
) -> Result<(RgbImage, StageMetrics), StageError> {
    match stage {
        StageKind::Denoise => {
            debug!("denoise: h={}", config.denoise_strength);
            let output = denoise(image, config.denoise_strength)?;
            Ok((
                output,
                StageMetrics::Denoise {
                    strength: config.denoise_strength,
                    template_window: TEMPLATE_WINDOW,
                    search_window: SEARCH_WINDOW,
                },
            ))
        }
        StageKind::Contrast => {
            let params = ContrastParams::from_config(config);
            debug!("contrast: {params:?}");
            let brightness_before = mean_brightness(image);
            let outcome = normalize_contrast(image, params)?;
            let brightness_after = mean_brightness(&outcome.image);
            Ok((
                outcome.image,
                StageMetrics::Contrast {
                    clip_limit: params.clip_limit,
                    tile_grid: params.tile_grid,
                    gamma: outcome.gamma,
                    auto_gamma: params.gamma == GammaMode::Auto,
                    brightness_before,
                    brightness_after,
                },
            ))
        }
        StageKind::Sharpen => {
            let mut params = SharpenParams::from_config(config);
            if config.adaptive_sharpen {
                params.amount = adaptive_amount(image);
            }
            debug!("sharpen: {params:?}");
            let output = unsharp_mask(image, params)?;
            Ok((
                output,
                StageMetrics::Sharpen {
                    amount: params.amount,
                    adaptive: config.adaptive_sharpen,
                    threshold: params.threshold,
                },
            ))
        }
        StageKind::SuperResolve => {
            let upscaler = upscaler.ok_or_else(|| {
                BackendError::new("super_res", "no upscaler was resolved for this enhancer")
            })?;
            let output = upscaler.upscale(image)?;
            let metrics = StageMetrics::SuperResolve {
                backend: upscaler.describe(),
                fallback: upscaler.is_fallback(),
                scale: config.scale,
                output: Dimensions::of(&output),
            };
            Ok((output, metrics))
        }
    }
}

/// Every stage but super-resolution keeps the size; super-resolution
/// multiplies it by exactly the configured scale.
fn check_dimensions(
    stage: StageKind,
    scale: u32,
    input: &RgbImage,
    output: &RgbImage,
) -> Result<(), StageError> {
    let before = Dimensions::of(input);
    let expected = if stage.resizes() {
        scaled_dimensions(before, scale).ok_or_else(|| {
            BackendError::new(stage.name(), format!("{before} x{scale} overflows"))
        })?
    } else {
        before
    };
    let actual = Dimensions::of(output);
    if actual == expected {
        Ok(())
    } else {
        Err(StageError::DimensionMismatch { expected, actual })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::upscale::{
        InterpolationUpscaler, ModelArch, ModelUnavailable, NoModels, ResolvedModel,
        SuperResolver,
    };

    /// Backend that fills the upscaled frame with a marker colour.
    struct MarkerBackend {
        scale: u32,
        calls: usize,
    }

    impl SuperResolver for MarkerBackend {
        fn describe(&self) -> String {
            format!("marker x{}", self.scale)
        }

        fn scale(&self) -> u32 {
            self.scale
        }

        fn upscale(&mut self, image: &RgbImage) -> Result<RgbImage, BackendError> {
            self.calls += 1;
            Ok(RgbImage::from_pixel(
                image.width() * self.scale,
                image.height() * self.scale,
                image::Rgb([1, 2, 3]),
            ))
        }
    }

    /// Backend that always fails.
    struct FailingBackend;

    impl SuperResolver for FailingBackend {
        fn describe(&self) -> String {
            "failing".to_owned()
        }

        fn scale(&self) -> u32 {
            2
        }

        fn upscale(&mut self, _image: &RgbImage) -> Result<RgbImage, BackendError> {
            Err(BackendError::new("failing", "inference exploded"))
        }
    }

    /// Backend that returns the wrong size.
    struct ShrinkingBackend;

    impl SuperResolver for ShrinkingBackend {
        fn describe(&self) -> String {
            "shrinking".to_owned()
        }

        fn scale(&self) -> u32 {
            2
        }

        fn upscale(&mut self, image: &RgbImage) -> Result<RgbImage, BackendError> {
            Ok(RgbImage::new(image.width(), image.height()))
        }
    }

    #[derive(Default)]
    struct MarkerSource {
        loads: Cell<usize>,
    }

    impl ModelSource for MarkerSource {
        fn load(&self, arch: ModelArch, scale: u32) -> Result<ResolvedModel, ModelUnavailable> {
            self.loads.set(self.loads.get() + 1);
            Ok(ResolvedModel::new(
                arch,
                scale,
                Box::new(MarkerBackend { scale, calls: 0 }),
            ))
        }
    }

    struct FixedSource(fn() -> Box<dyn SuperResolver>);

    fn failing() -> Box<dyn SuperResolver> {
        Box::new(FailingBackend)
    }

    fn shrinking() -> Box<dyn SuperResolver> {
        Box::new(ShrinkingBackend)
    }

    fn interpolating_x3() -> Box<dyn SuperResolver> {
        Box::new(InterpolationUpscaler::new(3))
    }

    impl ModelSource for FixedSource {
        fn load(&self, arch: ModelArch, scale: u32) -> Result<ResolvedModel, ModelUnavailable> {
            Ok(ResolvedModel::new(arch, scale, (self.0)()))
        }
    }

    fn only(stage: StageKind) -> StageConfig {
        let mut config = StageConfig::default();
        for s in StageKind::ALL {
            config.set_enabled(s, s == stage);
        }
        config
    }

    fn textured(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            image::Rgb([
                (40 + (x * 13 + y * 7) % 120) as u8,
                (60 + (x * 3 + y * 11) % 100) as u8,
                (50 + (x * y) % 90) as u8,
            ])
        })
    }

    #[test]
    fn no_stages_returns_original_as_enhanced() {
        let mut config = StageConfig::default();
        for s in StageKind::ALL {
            config.set_enabled(s, false);
        }
        let img = textured(8, 8);
        let result = ImageEnhancer::new(config, &NoModels).unwrap().enhance(&img).unwrap();
        assert_eq!(
            result.snapshot_names(),
            [SnapshotName::Original, SnapshotName::Enhanced],
        );
        assert_eq!(result.enhanced(), &img);
        assert!(result.diagnostics().stages.is_empty());
    }

    #[test]
    fn snapshot_order_follows_stage_order() {
        let img = textured(12, 10);
        let result = ImageEnhancer::new(StageConfig::default(), &NoModels)
            .unwrap()
            .enhance(&img)
            .unwrap();
        assert_eq!(
            result.snapshot_names(),
            [
                SnapshotName::Original,
                SnapshotName::Denoised,
                SnapshotName::ContrastEnhanced,
                SnapshotName::Sharpened,
                SnapshotName::SuperRes,
                SnapshotName::Enhanced,
            ],
        );
        assert_eq!(result.get(SnapshotName::SuperRes), Some(result.enhanced()));
        assert_eq!(result.original(), &img);
        let stages: Vec<_> = result.diagnostics().stages.iter().map(|d| d.stage).collect();
        assert_eq!(stages, StageKind::ALL);
    }

    #[test]
    fn single_stage_snapshots() {
        for stage in StageKind::ALL {
            let img = textured(9, 7);
            let result = ImageEnhancer::new(only(stage), &NoModels)
                .unwrap()
                .enhance(&img)
                .unwrap();
            let name = SnapshotName::for_stage(stage);
            assert_eq!(
                result.snapshot_names(),
                [SnapshotName::Original, name, SnapshotName::Enhanced],
            );
            assert_eq!(result.get(name), Some(result.enhanced()));
        }
    }

    #[test]
    fn unavailable_model_falls_back_to_interpolation() {
        let enhancer = ImageEnhancer::new(only(StageKind::SuperResolve), &NoModels).unwrap();
        let upscaler = enhancer.upscaler().unwrap();
        assert!(upscaler.is_fallback());
    }

    #[test]
    fn fallback_is_recorded_in_diagnostics() {
        let mut enhancer = ImageEnhancer::new(only(StageKind::SuperResolve), &NoModels).unwrap();
        let result = enhancer.enhance(&textured(5, 5)).unwrap();
        let diag = result.diagnostics().stage(StageKind::SuperResolve).unwrap();
        assert!(matches!(
            diag.metrics,
            StageMetrics::SuperResolve { fallback: true, scale: 2, .. }
        ));
    }

    #[test]
    fn resolved_model_is_used_and_reused() {
        let source = MarkerSource::default();
        let mut enhancer = ImageEnhancer::new(only(StageKind::SuperResolve), &source).unwrap();
        for _ in 0..3 {
            let result = enhancer.enhance(&textured(4, 3)).unwrap();
            assert_eq!(result.enhanced().dimensions(), (8, 6));
            assert_eq!(result.enhanced().get_pixel(0, 0).0, [1, 2, 3]);
        }
        assert_eq!(source.loads.get(), 1);
        assert!(!enhancer.upscaler().unwrap().is_fallback());
    }

    #[test]
    fn unsupported_configuration_fails_before_loading() {
        let source = MarkerSource::default();
        let config = StageConfig {
            model: "espcn".to_owned(),
            scale: 8,
            ..StageConfig::default()
        };
        let err = ImageEnhancer::new(config, &source).unwrap_err();
        assert_eq!(
            err,
            PipelineError::UnsupportedConfiguration {
                model: "espcn".to_owned(),
                scale: 8,
            },
        );
        assert_eq!(source.loads.get(), 0);
    }

    #[test]
    fn unknown_model_is_unsupported() {
        let config = StageConfig {
            model: "bsrgan".to_owned(),
            ..StageConfig::default()
        };
        assert!(matches!(
            ImageEnhancer::new(config, &NoModels),
            Err(PipelineError::UnsupportedConfiguration { .. })
        ));
    }

    #[test]
    fn model_is_not_checked_when_super_res_is_off() {
        let config = StageConfig {
            model: "bsrgan".to_owned(),
            super_res: false,
            ..StageConfig::default()
        };
        let enhancer = ImageEnhancer::new(config, &NoModels).unwrap();
        assert!(enhancer.upscaler().is_none());
    }

    #[test]
    fn backend_failure_is_stage_failure() {
        let source = FixedSource(failing);
        let mut enhancer = ImageEnhancer::new(StageConfig::default(), &source).unwrap();
        let err = enhancer.enhance(&textured(6, 6)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::StageFailure {
                stage: StageKind::SuperResolve,
                cause: StageError::Backend(_),
            }
        ));
    }

    #[test]
    fn wrong_output_size_is_stage_failure() {
        let source = FixedSource(shrinking);
        let mut enhancer = ImageEnhancer::new(only(StageKind::SuperResolve), &source).unwrap();
        let err = enhancer.enhance(&textured(6, 4)).unwrap_err();
        assert_eq!(
            err,
            PipelineError::StageFailure {
                stage: StageKind::SuperResolve,
                cause: StageError::DimensionMismatch {
                    expected: Dimensions::new(12, 8),
                    actual: Dimensions::new(6, 4),
                },
            },
        );
    }

    #[test]
    fn invalid_parameter_aborts_run() {
        let config = StageConfig {
            denoise_strength: -1.0,
            ..StageConfig::default()
        };
        let mut enhancer = ImageEnhancer::new(config, &NoModels).unwrap();
        let err = enhancer.enhance(&textured(6, 6)).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::StageFailure {
                stage: StageKind::Denoise,
                cause: StageError::InvalidParameter { .. },
            }
        ));
    }

    #[test]
    fn empty_image_is_invalid() {
        let mut enhancer = ImageEnhancer::new(StageConfig::default(), &NoModels).unwrap();
        let err = enhancer.enhance(&RgbImage::new(0, 5)).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidImage(_)));
    }

    #[test]
    fn adaptive_sharpen_reports_chosen_amount() {
        let config = StageConfig {
            adaptive_sharpen: true,
            ..only(StageKind::Sharpen)
        };
        let flat = RgbImage::from_pixel(8, 8, image::Rgb([70, 70, 70]));
        let result = ImageEnhancer::new(config, &NoModels)
            .unwrap()
            .enhance(&flat)
            .unwrap();
        let diag = result.diagnostics().stage(StageKind::Sharpen).unwrap();
        assert!(matches!(
            diag.metrics,
            StageMetrics::Sharpen { amount, adaptive: true, .. } if (amount - 2.5).abs() < f64::EPSILON
        ));
    }

    #[test]
    fn interpolation_backend_in_model_slot_works() {
        let source = FixedSource(interpolating_x3);
        let config = StageConfig {
            scale: 3,
            ..only(StageKind::SuperResolve)
        };
        let mut enhancer = ImageEnhancer::new(config, &source).unwrap();
        let result = enhancer.enhance(&textured(5, 4)).unwrap();
        assert_eq!(result.enhanced().dimensions(), (15, 12));
    }

    #[test]
    fn into_enhanced_returns_final_image() {
        let mut enhancer = ImageEnhancer::new(only(StageKind::SuperResolve), &NoModels).unwrap();
        let result = enhancer.enhance(&textured(4, 4)).unwrap();
        let expected = result.enhanced().clone();
        assert_eq!(result.into_enhanced(), expected);
    }

    #[test]
    fn snapshot_names_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&SnapshotName::ContrastEnhanced).unwrap(),
            "\"contrast_enhanced\"",
        );
        assert_eq!(SnapshotName::SuperRes.to_string(), "super_res");
    }
}
