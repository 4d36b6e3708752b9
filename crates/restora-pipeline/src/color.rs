//! Channel normalization and luma/chroma separation.
//!
//! Every stage works on 3-channel 8-bit RGB. [`normalize`] brings any
//! decoded image into that shape. [`luma`] is the grayscale projection
//! used by the analyzer and the quality metrics, and [`YCbCrPlanes`]
//! splits an image so contrast equalization can touch brightness while
//! leaving chroma alone.

use image::DynamicImage;

use crate::plane::Plane;
use crate::types::{GrayImage, RgbImage};

/// Convert any decoded image to 8-bit RGB.
///
/// Alpha is dropped, gray is replicated across the three channels and
/// 16-bit or float samples are rescaled to 8 bits.
#[must_use = "returns the normalized RGB image"]
pub fn normalize(image: DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    }
}

/// Round and clamp a filtered value back into the 8-bit range.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_u8(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.round().clamp(0.0, 255.0) as u8
}

/// BT.601 luma of a single pixel, unrounded.
#[must_use]
pub fn luma_value(r: u8, g: u8, b: u8) -> f64 {
    0.114f64.mul_add(
        f64::from(b),
        0.299f64.mul_add(f64::from(r), 0.587 * f64::from(g)),
    )
}

/// Grayscale projection: `0.299*R + 0.587*G + 0.114*B`, rounded.
#[must_use = "returns the grayscale image"]
pub fn luma(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        image::Luma([to_u8(luma_value(r, g, b))])
    })
}

/// Full-range BT.601 decomposition of an RGB image.
///
/// Luma is quantized to 8 bits so it can be equalized with histogram
/// methods; chroma stays in floating point so recombining with an
/// unchanged luma reproduces the input within one level.
#[derive(Debug, Clone)]
pub struct YCbCrPlanes {
    /// Quantized luma.
    pub y: GrayImage,
    /// Blue-difference chroma, centered on 128.
    pub cb: Plane,
    /// Red-difference chroma, centered on 128.
    pub cr: Plane,
}

impl YCbCrPlanes {
    /// Split `image` into luma and chroma.
    #[must_use]
    pub fn from_rgb(image: &RgbImage) -> Self {
        let (w, h) = image.dimensions();
        let y = luma(image);
        let cb = Plane::from_fn(w, h, |x, y| {
            let [r, g, b] = image.get_pixel(x, y).0;
            128.0
                + 0.5f64.mul_add(
                    f64::from(b),
                    (-0.168_736f64).mul_add(f64::from(r), -0.331_264 * f64::from(g)),
                )
        });
        let cr = Plane::from_fn(w, h, |x, y| {
            let [r, g, b] = image.get_pixel(x, y).0;
            128.0
                + (-0.081_312f64).mul_add(
                    f64::from(b),
                    0.5f64.mul_add(f64::from(r), -0.418_688 * f64::from(g)),
                )
        });
        Self { y, cb, cr }
    }

    /// Recombine with a replacement luma plane of the same size.
    #[must_use]
    pub fn to_rgb_with_luma(&self, luma: &GrayImage) -> RgbImage {
        RgbImage::from_fn(luma.width(), luma.height(), |x, y| {
            let l = f64::from(luma.get_pixel(x, y).0[0]);
            let cb = self.cb.get(x, y) - 128.0;
            let cr = self.cr.get(x, y) - 128.0;
            image::Rgb([
                to_u8(1.402f64.mul_add(cr, l)),
                to_u8((-0.714_136f64).mul_add(cr, (-0.344_136f64).mul_add(cb, l))),
                to_u8(1.772f64.mul_add(cb, l)),
            ])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_alpha() {
        let rgba = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 0]));
        let rgb = normalize(DynamicImage::ImageRgba8(rgba));
        assert_eq!(rgb.dimensions(), (3, 2));
        assert_eq!(rgb.get_pixel(1, 1).0, [10, 20, 30]);
    }

    #[test]
    fn normalize_expands_gray() {
        let gray = GrayImage::from_pixel(2, 2, image::Luma([77]));
        let rgb = normalize(DynamicImage::ImageLuma8(gray));
        assert_eq!(rgb.get_pixel(0, 0).0, [77, 77, 77]);
    }

    #[test]
    fn luma_weights_green_highest() {
        let img = RgbImage::from_fn(3, 1, |x, _| match x {
            0 => image::Rgb([255, 0, 0]),
            1 => image::Rgb([0, 255, 0]),
            _ => image::Rgb([0, 0, 255]),
        });
        let gray = luma(&img);
        let r = gray.get_pixel(0, 0).0[0];
        let g = gray.get_pixel(1, 0).0[0];
        let b = gray.get_pixel(2, 0).0[0];
        assert_eq!((r, g, b), (76, 150, 29));
    }

    #[test]
    fn luma_of_neutral_gray_is_unchanged() {
        let img = RgbImage::from_pixel(4, 4, image::Rgb([128, 128, 128]));
        assert!(luma(&img).pixels().all(|p| p.0[0] == 128));
    }

    #[test]
    fn to_u8_rounds_and_clamps() {
        assert_eq!(to_u8(-3.0), 0);
        assert_eq!(to_u8(300.0), 255);
        assert_eq!(to_u8(127.5), 128);
        assert_eq!(to_u8(f64::NAN), 0);
    }

    #[test]
    fn ycbcr_round_trip_within_one_level() {
        let img = RgbImage::from_fn(16, 16, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            image::Rgb([(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8])
        });
        let planes = YCbCrPlanes::from_rgb(&img);
        let back = planes.to_rgb_with_luma(&planes.y);
        for (a, b) in img.pixels().zip(back.pixels()) {
            for c in 0..3 {
                let diff = (i16::from(a.0[c]) - i16::from(b.0[c])).abs();
                assert!(diff <= 1, "channel {c}: {} vs {}", a.0[c], b.0[c]);
            }
        }
    }

    #[test]
    fn gray_pixels_have_neutral_chroma() {
        let img = RgbImage::from_pixel(2, 2, image::Rgb([90, 90, 90]));
        let planes = YCbCrPlanes::from_rgb(&img);
        assert!((planes.cb.get(0, 0) - 128.0).abs() < 1e-9);
        assert!((planes.cr.get(1, 1) - 128.0).abs() < 1e-9);
    }
}
