//! Before/after comparison of an original and its enhanced version.

use std::path::Path;

use image::Rgb;
use restora_pipeline::resample::{ResampleFilter, resize_exact};
use restora_pipeline::{Dimensions, QualityMetrics, RgbImage, assess};

use crate::error::IoError;
use crate::image_io::load_image;

/// Width of the bar between the two halves of a composite.
pub const SEPARATOR_WIDTH: u32 = 5;

/// Gray level of the separator bar.
pub const SEPARATOR_GRAY: u8 = 100;

/// Place `original` and `enhanced` next to each other.
///
/// Both are scaled, keeping their aspect ratio, to the taller of the two
/// heights and joined by a [`SEPARATOR_WIDTH`]-pixel gray bar.
#[must_use = "returns the composite image"]
pub fn side_by_side(original: &RgbImage, enhanced: &RgbImage) -> RgbImage {
    let height = original.height().max(enhanced.height());
    let left = to_height(original, height);
    let right = to_height(enhanced, height);

    let mut canvas = RgbImage::from_pixel(
        left.width() + SEPARATOR_WIDTH + right.width(),
        height,
        Rgb([SEPARATOR_GRAY; 3]),
    );
    image::imageops::replace(&mut canvas, &left, 0, 0);
    image::imageops::replace(
        &mut canvas,
        &right,
        i64::from(left.width() + SEPARATOR_WIDTH),
        0,
    );
    canvas
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn to_height(image: &RgbImage, height: u32) -> RgbImage {
    if image.height() == height || image.height() == 0 {
        return image.clone();
    }
    let ratio = f64::from(height) / f64::from(image.height());
    let width = (f64::from(image.width()) * ratio).round().max(1.0) as u32;
    resize_exact(image, Dimensions::new(width, height), ResampleFilter::COMPARE)
}

/// An original and its enhanced version, loaded and assessed.
#[derive(Debug, Clone)]
pub struct Comparison {
    pub original: RgbImage,
    pub enhanced: RgbImage,
    pub metrics: QualityMetrics,
}

impl Comparison {
    /// [`side_by_side`] of the two images.
    #[must_use = "returns the composite image"]
    pub fn composite(&self) -> RgbImage {
        side_by_side(&self.original, &self.enhanced)
    }
}

/// Load both files and assess the enhanced one against the original.
///
/// # Errors
///
/// Propagates [`load_image`] failures.
pub fn compare_files(original: &Path, enhanced: &Path) -> Result<Comparison, IoError> {
    let original = load_image(original)?;
    let enhanced = load_image(enhanced)?;
    let metrics = assess(&original, &enhanced);
    Ok(Comparison {
        original,
        enhanced,
        metrics,
    })
}
