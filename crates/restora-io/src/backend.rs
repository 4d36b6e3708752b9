//! Inference backend loaders.
//!
//! A loader turns a cached weights file into a [`SuperResolver`]. Each
//! loader reads one weight format; the resolver asks the store for that
//! format and nothing else.

use std::path::Path;

use restora_pipeline::{BackendError, ModelArch, SuperResolver};

/// Builds inference backends from weight files.
pub trait BackendLoader {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// File extension of the weights this loader reads.
    fn format(&self) -> &'static str;

    /// `false` when no runtime is compiled in, in which case the resolver
    /// reports the model unavailable without fetching anything.
    fn is_available(&self) -> bool {
        true
    }

    /// Build a backend for `arch` at `scale` from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError`] if the weights cannot be loaded.
    fn load(
        &self,
        path: &Path,
        arch: ModelArch,
        scale: u32,
    ) -> Result<Box<dyn SuperResolver>, BackendError>;
}

/// Loader for builds without an inference runtime.
///
/// It names the upstream TensorFlow format but can never load it, so
/// every model resolves to the interpolation fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLoader;

impl BackendLoader for NullLoader {
    fn name(&self) -> &'static str {
        "tensorflow"
    }

    fn format(&self) -> &'static str {
        crate::models::UPSTREAM_FORMAT
    }

    fn is_available(&self) -> bool {
        false
    }

    fn load(
        &self,
        path: &Path,
        _arch: ModelArch,
        _scale: u32,
    ) -> Result<Box<dyn SuperResolver>, BackendError> {
        Err(BackendError::new(
            self.name(),
            format!("cannot run {}: no runtime compiled in", path.display()),
        ))
    }
}

/// The best loader this build carries.
#[must_use]
pub fn default_loader() -> Box<dyn BackendLoader> {
    #[cfg(feature = "onnx")]
    {
        Box::new(crate::onnx::OnnxLoader)
    }
    #[cfg(not(feature = "onnx"))]
    {
        Box::new(NullLoader)
    }
}
