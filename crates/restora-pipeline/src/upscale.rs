//! Super-resolution: the backend contract, model resolution and the
//! interpolation fallback.
//!
//! A [`ModelSource`] turns a model name and scale into a
//! [`ResolvedModel`]. Support is checked before the source is asked to
//! load anything, so an unsupported pair never reaches the network. A
//! load failure is reported as [`ModelUnavailable`], which the enhancer
//! answers by switching to [`InterpolationUpscaler`] for the rest of its
//! lifetime.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::resample::{ResampleFilter, resize_exact, scaled_dimensions};
use crate::types::{BackendError, Dimensions, RgbImage};

/// Every scale factor any architecture supports.
pub const SUPPORTED_SCALES: [u32; 4] = [2, 3, 4, 8];

// ───────────────────────── Architectures ───────────────────────────

/// Supported super-resolution architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelArch {
    /// Enhanced deep residual network. Slow, highest quality.
    Edsr,
    /// Fast super-resolution CNN.
    Fsrcnn,
    /// Efficient sub-pixel CNN.
    Espcn,
    /// Laplacian pyramid network. The only one offering 8×.
    Lapsrn,
}

impl ModelArch {
    pub const ALL: [Self; 4] = [Self::Edsr, Self::Fsrcnn, Self::Espcn, Self::Lapsrn];

    /// Scale factors this architecture has weights for.
    #[must_use]
    pub const fn supported_scales(self) -> &'static [u32] {
        match self {
            Self::Edsr | Self::Fsrcnn | Self::Espcn => &[2, 3, 4],
            Self::Lapsrn => &[2, 4, 8],
        }
    }

    #[must_use]
    pub fn supports(self, scale: u32) -> bool {
        self.supported_scales().contains(&scale)
    }

    /// Lowercase name used in configuration and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Edsr => "edsr",
            Self::Fsrcnn => "fsrcnn",
            Self::Espcn => "espcn",
            Self::Lapsrn => "lapsrn",
        }
    }

    /// Name used in weight artifact file names, e.g. `LapSRN_x8.pb`.
    #[must_use]
    pub const fn artifact_stem(self) -> &'static str {
        match self {
            Self::Edsr => "EDSR",
            Self::Fsrcnn => "FSRCNN",
            Self::Espcn => "ESPCN",
            Self::Lapsrn => "LapSRN",
        }
    }
}

impl fmt::Display for ModelArch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned by [`ModelArch::from_str`] for an unknown name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown model {0:?} (expected one of edsr, fsrcnn, espcn, lapsrn)")]
pub struct UnknownModel(pub String);

impl FromStr for ModelArch {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|arch| arch.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownModel(s.to_owned()))
    }
}

// ───────────────────────── Backends ────────────────────────────────

/// An upscaling backend bound to one scale factor.
///
/// `upscale` takes `&mut self` because inference sessions keep mutable
/// scratch state; one enhancer owns one backend and never shares it.
pub trait SuperResolver: Send {
    /// Short description for logs and diagnostics.
    fn describe(&self) -> String;

    /// The integer factor applied to both axes.
    fn scale(&self) -> u32;

    /// Upscale `image` by [`scale`](Self::scale).
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if inference fails.
    fn upscale(&mut self, image: &RgbImage) -> Result<RgbImage, BackendError>;
}

/// Deterministic bicubic upscaling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpolationUpscaler {
    scale: u32,
    filter: ResampleFilter,
}

impl InterpolationUpscaler {
    /// Bicubic upscaler for `scale`.
    #[must_use]
    pub const fn new(scale: u32) -> Self {
        Self {
            scale,
            filter: ResampleFilter::UPSCALE,
        }
    }

    /// Use a different resampling filter.
    #[must_use]
    pub const fn with_filter(mut self, filter: ResampleFilter) -> Self {
        self.filter = filter;
        self
    }
}

impl SuperResolver for InterpolationUpscaler {
    fn describe(&self) -> String {
        format!("interpolation ({}) x{}", self.filter, self.scale)
    }

    fn scale(&self) -> u32 {
        self.scale
    }

    fn upscale(&mut self, image: &RgbImage) -> Result<RgbImage, BackendError> {
        let target = scaled_dimensions(Dimensions::of(image), self.scale).ok_or_else(|| {
            BackendError::new(
                "interpolation",
                format!("{} x{} overflows", Dimensions::of(image), self.scale),
            )
        })?;
        Ok(resize_exact(image, target, self.filter))
    }
}

// ───────────────────────── Resolution ──────────────────────────────

/// A model could not be fetched or loaded. Recoverable: the enhancer
/// falls back to interpolation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("model {arch} x{scale} unavailable: {reason}")]
pub struct ModelUnavailable {
    pub arch: ModelArch,
    pub scale: u32,
    pub reason: String,
}

impl ModelUnavailable {
    #[must_use]
    pub fn new(arch: ModelArch, scale: u32, reason: impl Into<String>) -> Self {
        Self {
            arch,
            scale,
            reason: reason.into(),
        }
    }
}

/// Outcome of [`ModelSource::resolve`] when no model is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// Unknown name or unsupported scale. Fatal at configuration time.
    #[error("unsupported model {model:?} at scale {scale}")]
    Unsupported { model: String, scale: u32 },

    /// Fetch or load failed.
    #[error(transparent)]
    Unavailable(#[from] ModelUnavailable),
}

/// A loaded backend bound to the architecture and scale it serves.
pub struct ResolvedModel {
    pub arch: ModelArch,
    pub scale: u32,
    backend: Box<dyn SuperResolver>,
}

impl ResolvedModel {
    #[must_use]
    pub fn new(arch: ModelArch, scale: u32, backend: Box<dyn SuperResolver>) -> Self {
        Self {
            arch,
            scale,
            backend,
        }
    }

    /// The backend's own description.
    #[must_use]
    pub fn describe(&self) -> String {
        self.backend.describe()
    }

    /// Run inference.
    ///
    /// # Errors
    ///
    /// Propagates the backend's [`BackendError`].
    pub fn upscale(&mut self, image: &RgbImage) -> Result<RgbImage, BackendError> {
        self.backend.upscale(image)
    }
}

impl fmt::Debug for ResolvedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedModel")
            .field("arch", &self.arch)
            .field("scale", &self.scale)
            .field("backend", &self.backend.describe())
            .finish()
    }
}

/// Validate a (model name, scale) pair without touching any source.
///
/// # Errors
///
/// Returns [`ResolveError::Unsupported`] for an unknown name or a scale
/// the architecture has no weights for.
pub fn check_supported(model: &str, scale: u32) -> Result<ModelArch, ResolveError> {
    let unsupported = || ResolveError::Unsupported {
        model: model.to_owned(),
        scale,
    };
    let arch = model.parse::<ModelArch>().map_err(|_| unsupported())?;
    if arch.supports(scale) {
        Ok(arch)
    } else {
        Err(unsupported())
    }
}

/// Somewhere models come from.
pub trait ModelSource {
    /// Fetch (if needed) and load weights for a supported pair.
    ///
    /// Only called after [`check_supported`] has accepted the pair.
    ///
    /// # Errors
    ///
    /// Returns [`ModelUnavailable`] on any fetch or load failure.
    fn load(&self, arch: ModelArch, scale: u32) -> Result<ResolvedModel, ModelUnavailable>;

    /// Resolve a model name and scale to a loaded backend.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Unsupported`] before calling
    /// [`load`](Self::load) when the pair is not supported, and
    /// [`ResolveError::Unavailable`] when loading fails.
    fn resolve(&self, model: &str, scale: u32) -> Result<ResolvedModel, ResolveError> {
        let arch = check_supported(model, scale)?;
        Ok(self.load(arch, scale)?)
    }
}

/// A source with no models. Every supported pair is unavailable, which
/// makes the enhancer use interpolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModels;

impl ModelSource for NoModels {
    fn load(&self, arch: ModelArch, scale: u32) -> Result<ResolvedModel, ModelUnavailable> {
        Err(ModelUnavailable::new(arch, scale, "no model source configured"))
    }
}

/// The upscaler an enhancer settled on at construction.
#[derive(Debug)]
pub enum Upscaler {
    /// A resolved model.
    Model(ResolvedModel),
    /// Interpolation, with the reason the model was not used.
    Interpolation {
        upscaler: InterpolationUpscaler,
        reason: String,
    },
}

impl Upscaler {
    /// Fallback upscaler for `scale`, remembering why.
    #[must_use]
    pub fn fallback(scale: u32, reason: impl Into<String>) -> Self {
        Self::Interpolation {
            upscaler: InterpolationUpscaler::new(scale),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Model(model) => model.describe(),
            Self::Interpolation { upscaler, .. } => upscaler.describe(),
        }
    }

    /// `true` when the model could not be used.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        matches!(self, Self::Interpolation { .. })
    }

    /// Upscale with whichever backend was chosen.
    ///
    /// # Errors
    ///
    /// Propagates the backend's [`BackendError`].
    pub fn upscale(&mut self, image: &RgbImage) -> Result<RgbImage, BackendError> {
        match self {
            Self::Model(model) => model.upscale(image),
            Self::Interpolation { upscaler, .. } => upscaler.upscale(image),
        }
    }
}
