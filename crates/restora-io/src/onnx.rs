//! ONNX Runtime backend.
//!
//! Expects weights exported to ONNX with one NCHW float input holding
//! RGB in `0.0..=1.0` and one output of the same layout at `scale` times
//! the input size. Such exports are served from a mirror (see
//! [`ModelStore::with_mirror`](crate::ModelStore::with_mirror)); upstream
//! only publishes TensorFlow graphs.

use std::path::Path;

use ndarray::Array4;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::{Session, SessionOutputs};
use restora_pipeline::{BackendError, ModelArch, RgbImage, SuperResolver};

use crate::backend::BackendLoader;

const BACKEND: &str = "onnx";

fn ort_error(e: impl std::fmt::Display) -> BackendError {
    BackendError::new(BACKEND, e.to_string())
}

/// Loads `.onnx` weights into ONNX Runtime sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnnxLoader;

impl BackendLoader for OnnxLoader {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn format(&self) -> &'static str {
        "onnx"
    }

    fn load(
        &self,
        path: &Path,
        arch: ModelArch,
        scale: u32,
    ) -> Result<Box<dyn SuperResolver>, BackendError> {
        let session = Session::builder()
            .map_err(ort_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(ort_error)?
            .commit_from_file(path)
            .map_err(ort_error)?;
        Ok(Box::new(OnnxUpscaler {
            session,
            arch,
            scale,
        }))
    }
}

/// A loaded ONNX super-resolution session.
pub struct OnnxUpscaler {
    session: Session,
    arch: ModelArch,
    scale: u32,
}

impl SuperResolver for OnnxUpscaler {
    fn describe(&self) -> String {
        format!("{} x{} (onnx)", self.arch, self.scale)
    }

    fn scale(&self) -> u32 {
        self.scale
    }

    fn upscale(&mut self, image: &RgbImage) -> Result<RgbImage, BackendError> {
        let input = to_tensor(image);
        let input_name = self
            .session
            .inputs
            .first()
            .map_or_else(|| "input".to_owned(), |i| i.name.clone());
        let input_ref = ort::value::TensorRef::from_array_view(&input).map_err(ort_error)?;

        let outputs = self
            .session
            .run(ort::inputs![input_name.as_str() => input_ref])
            .map_err(ort_error)?;
        from_outputs(&outputs)
    }
}

/// NCHW tensor with RGB scaled to `0.0..=1.0`.
fn to_tensor(image: &RgbImage) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));
    for (x, y, pixel) in image.enumerate_pixels() {
        for (c, &v) in pixel.0.iter().enumerate() {
            tensor[[0, c, y as usize, x as usize]] = f32::from(v) / 255.0;
        }
    }
    tensor
}

/// First output tensor back to an 8-bit image.
fn from_outputs(outputs: &SessionOutputs<'_>) -> Result<RgbImage, BackendError> {
    let (_, output) = outputs
        .iter()
        .next()
        .ok_or_else(|| ort_error("model produced no output"))?;
    let (shape, data) = output.try_extract_tensor::<f32>().map_err(ort_error)?;

    if shape.len() != 4 || shape[1] != 3 {
        return Err(ort_error(format!("expected a 1x3xHxW output, got {shape:?}")));
    }
    let height = u32::try_from(shape[2]).map_err(|_| ort_error("invalid output height"))?;
    let width = u32::try_from(shape[3]).map_err(|_| ort_error("invalid output width"))?;
    let plane = width as usize * height as usize;
    if data.len() < plane * 3 {
        return Err(ort_error("output tensor is shorter than its shape"));
    }

    Ok(RgbImage::from_fn(width, height, |x, y| {
        let idx = y as usize * width as usize + x as usize;
        let sample = |c: usize| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let v = (data[c * plane + idx] * 255.0).clamp(0.0, 255.0).round() as u8;
            v
        };
        image::Rgb([sample(0), sample(1), sample(2)])
    }))
}
