//! Resampling to exact target dimensions.
//!
//! Used in two places: the interpolation upscaler that stands in for an
//! unavailable super-resolution model, and the quality assessor, which
//! shrinks an enhanced image back to the original's size before
//! comparing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, RgbImage};

/// Resampling filter.
///
/// Ordered from fastest/lowest-quality to slowest/highest-quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResampleFilter {
    /// Nearest-neighbor: fastest, blocky artifacts.
    Nearest,
    /// Bilinear interpolation.
    Triangle,
    /// Bicubic (Catmull-Rom).
    CatmullRom,
    /// Gaussian: smooth output.
    Gaussian,
    /// Lanczos with 3 lobes: sharpest.
    Lanczos3,
}

impl ResampleFilter {
    /// Filter used when upscaling without a model.
    pub const UPSCALE: Self = Self::CatmullRom;

    /// Filter used to bring an enhanced image back to the original size
    /// for comparison.
    pub const COMPARE: Self = Self::Triangle;

    const fn to_image_filter(self) -> image::imageops::FilterType {
        match self {
            Self::Nearest => image::imageops::FilterType::Nearest,
            Self::Triangle => image::imageops::FilterType::Triangle,
            Self::CatmullRom => image::imageops::FilterType::CatmullRom,
            Self::Gaussian => image::imageops::FilterType::Gaussian,
            Self::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

impl Default for ResampleFilter {
    fn default() -> Self {
        Self::UPSCALE
    }
}

impl fmt::Display for ResampleFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nearest => f.write_str("Nearest"),
            Self::Triangle => f.write_str("Triangle"),
            Self::CatmullRom => f.write_str("CatmullRom"),
            Self::Gaussian => f.write_str("Gaussian"),
            Self::Lanczos3 => f.write_str("Lanczos3"),
        }
    }
}

/// `dims` multiplied by an integer `scale`, or `None` on overflow.
#[must_use]
pub fn scaled_dimensions(dims: Dimensions, scale: u32) -> Option<Dimensions> {
    Some(Dimensions {
        width: dims.width.checked_mul(scale)?,
        height: dims.height.checked_mul(scale)?,
    })
}

/// Resize to exactly `target`, ignoring aspect ratio.
///
/// Returns a clone when the image already has the target size.
#[must_use = "returns the resized image"]
pub fn resize_exact(image: &RgbImage, target: Dimensions, filter: ResampleFilter) -> RgbImage {
    if Dimensions::of(image) == target {
        return image.clone();
    }
    image::imageops::resize(
        image,
        target.width,
        target.height,
        filter.to_image_filter(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_is_catmull_rom() {
        assert_eq!(ResampleFilter::default(), ResampleFilter::CatmullRom);
        assert_eq!(ResampleFilter::COMPARE, ResampleFilter::Triangle);
    }

    #[test]
    fn display_names() {
        assert_eq!(ResampleFilter::Lanczos3.to_string(), "Lanczos3");
        assert_eq!(ResampleFilter::Triangle.to_string(), "Triangle");
    }

    #[test]
    fn scaled_dimensions_multiplies_both_axes() {
        let dims = scaled_dimensions(Dimensions::new(33, 17), 3);
        assert_eq!(dims, Some(Dimensions::new(99, 51)));
    }

    #[test]
    fn scaled_dimensions_detects_overflow() {
        assert_eq!(scaled_dimensions(Dimensions::new(u32::MAX, 1), 2), None);
    }

    #[test]
    fn resize_exact_hits_target() {
        let img = RgbImage::from_pixel(10, 6, image::Rgb([1, 2, 3]));
        let up = resize_exact(&img, Dimensions::new(40, 24), ResampleFilter::CatmullRom);
        assert_eq!(up.dimensions(), (40, 24));
        let down = resize_exact(&up, Dimensions::new(7, 5), ResampleFilter::Triangle);
        assert_eq!(down.dimensions(), (7, 5));
    }

    #[test]
    fn resize_exact_same_size_is_identity() {
        let img = RgbImage::from_fn(5, 5, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            image::Rgb([(x * 40) as u8, (y * 40) as u8, 7])
        });
        let same = resize_exact(&img, Dimensions::new(5, 5), ResampleFilter::Lanczos3);
        assert_eq!(same, img);
    }
}
