//! Fidelity metrics between an original and an enhanced image.
//!
//! The original is the ground truth. An enhanced image of a different
//! size (the usual case after super-resolution) is first resized down to
//! the original's dimensions; the comparison never happens at the
//! enhanced resolution.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::blur::{convolve_separable, convolve_separable_valid, gaussian_kernel};
use crate::color::luma;
use crate::plane::Plane;
use crate::resample::{ResampleFilter, resize_exact};
use crate::types::{Dimensions, RgbImage};

/// SSIM window side length.
pub const SSIM_WINDOW: usize = 11;

/// SSIM window Gaussian sigma.
pub const SSIM_SIGMA: f64 = 1.5;

const PEAK: f64 = 255.0;
const C1: f64 = (0.01 * PEAK) * (0.01 * PEAK);
const C2: f64 = (0.03 * PEAK) * (0.03 * PEAK);

/// Serializes PSNR with `"inf"` standing in for identical images, since
/// JSON has no infinity.
mod psnr_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Finite(f64),
        Text(String),
    }

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_infinite() && value.is_sign_positive() {
            "inf".serialize(serializer)
        } else {
            value.serialize(serializer)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Finite(v) => Ok(v),
            Repr::Text(s) if s == "inf" => Ok(f64::INFINITY),
            Repr::Text(s) => Err(serde::de::Error::custom(format!(
                "expected a number or \"inf\", got {s:?}",
            ))),
        }
    }
}

/// PSNR and SSIM of an enhanced image against its original.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityMetrics {
    /// Peak signal-to-noise ratio in dB. `f64::INFINITY` for identical
    /// images.
    #[serde(with = "psnr_serde")]
    pub psnr: f64,
    /// Mean structural similarity, 1.0 for identical images.
    pub ssim: f64,
}

impl QualityMetrics {
    /// `true` if the images were pixel-identical.
    #[must_use]
    pub fn is_identical(&self) -> bool {
        self.psnr.is_infinite()
    }
}

impl fmt::Display for QualityMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_identical() {
            write!(f, "PSNR: inf dB  SSIM: {:.4}", self.ssim)
        } else {
            write!(f, "PSNR: {:.2} dB  SSIM: {:.4}", self.psnr, self.ssim)
        }
    }
}

/// Compare `enhanced` against `original`.
#[must_use = "returns the quality metrics"]
pub fn assess(original: &RgbImage, enhanced: &RgbImage) -> QualityMetrics {
    let target = Dimensions::of(original);
    let resized;
    let enhanced = if Dimensions::of(enhanced) == target {
        enhanced
    } else {
        resized = resize_exact(enhanced, target, ResampleFilter::COMPARE);
        &resized
    };
    QualityMetrics {
        psnr: psnr(original, enhanced),
        ssim: ssim(original, enhanced),
    }
}

/// Peak signal-to-noise ratio over all channels of two same-sized images.
///
/// Returns `f64::INFINITY` when the mean squared error is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn psnr(a: &RgbImage, b: &RgbImage) -> f64 {
    let (sum, count) = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .fold((0.0f64, 0usize), |(sum, n), (&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            (d.mul_add(d, sum), n + 1)
        });
    if count == 0 || sum == 0.0 {
        return f64::INFINITY;
    }
    let mse = sum / count as f64;
    10.0 * (PEAK * PEAK / mse).log10()
}

/// Mean structural similarity of the grayscale projections of two
/// same-sized images.
///
/// Local statistics use an 11×11 Gaussian window (σ = 1.5). The mean is
/// taken over positions where the window fits entirely inside the image;
/// images smaller than the window fall back to the full map with
/// mirrored borders.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn ssim(a: &RgbImage, b: &RgbImage) -> f64 {
    let x = Plane::from_gray(&luma(a));
    let y = Plane::from_gray(&luma(b));
    let kernel = gaussian_kernel(SSIM_WINDOW, SSIM_SIGMA);

    let window = SSIM_WINDOW as u32;
    let filter = |p: &Plane| {
        if x.width() >= window && x.height() >= window {
            convolve_separable_valid(p, &kernel)
        } else {
            convolve_separable(p, &kernel)
        }
    };

    let mu_x = filter(&x);
    let mu_y = filter(&y);
    let xx = filter(&x.zip_map(&x, |a, b| a * b));
    let yy = filter(&y.zip_map(&y, |a, b| a * b));
    let xy = filter(&x.zip_map(&y, |a, b| a * b));

    let map = Plane::from_fn(mu_x.width(), mu_x.height(), |i, j| {
        let (mx, my) = (mu_x.get(i, j), mu_y.get(i, j));
        let var_x = mx.mul_add(-mx, xx.get(i, j));
        let var_y = my.mul_add(-my, yy.get(i, j));
        let cov = mx.mul_add(-my, xy.get(i, j));
        let numerator = (2.0 * mx).mul_add(my, C1) * 2.0f64.mul_add(cov, C2);
        let denominator = mx.mul_add(mx, my.mul_add(my, C1)) * (var_x + var_y + C2);
        numerator / denominator
    });
    map.mean()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gradient(w: u32, h: u32) -> RgbImage {
        RgbImage::from_fn(w, h, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            image::Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn identical_images_have_infinite_psnr_and_unit_ssim() {
        let img = gradient(40, 30);
        let m = assess(&img, &img);
        assert!(m.psnr.is_infinite() && m.psnr > 0.0);
        assert!((m.ssim - 1.0).abs() < 1e-9, "ssim {}", m.ssim);
        assert!(m.is_identical());
    }

    #[test]
    fn identical_small_images_use_full_map() {
        let img = gradient(6, 5);
        let m = assess(&img, &img);
        assert!((m.ssim - 1.0).abs() < 1e-9);
    }

    #[test]
    fn psnr_of_constant_offset() {
        // Every channel differs by 5: MSE 25.
        let a = RgbImage::from_pixel(8, 8, image::Rgb([100, 100, 100]));
        let b = RgbImage::from_pixel(8, 8, image::Rgb([105, 105, 105]));
        let expected = 10.0 * (255.0f64 * 255.0 / 25.0).log10();
        assert!((psnr(&a, &b) - expected).abs() < 1e-9);
    }

    #[test]
    fn distortion_lowers_both_metrics() {
        let img = gradient(32, 32);
        let mut noisy = img.clone();
        for (i, p) in noisy.pixels_mut().enumerate() {
            if i % 3 == 0 {
                p.0[0] = p.0[0].wrapping_add(60);
                p.0[1] = p.0[1].wrapping_sub(40);
            }
        }
        let m = assess(&img, &noisy);
        assert!(m.psnr.is_finite());
        assert!(m.psnr < 30.0);
        assert!(m.ssim < 0.99);
    }

    #[test]
    fn larger_enhanced_image_is_resized_to_original() {
        let original = RgbImage::from_pixel(16, 16, image::Rgb([90, 120, 150]));
        let enhanced = RgbImage::from_pixel(32, 32, image::Rgb([90, 120, 150]));
        let m = assess(&original, &enhanced);
        assert!(m.psnr > 40.0, "psnr {}", m.psnr);
        assert!(m.ssim > 0.99, "ssim {}", m.ssim);
    }

    #[test]
    fn ssim_stays_in_range() {
        let a = gradient(24, 24);
        let b = RgbImage::from_fn(24, 24, |x, y| {
            let [r, g, bl] = a.get_pixel(x, y).0;
            image::Rgb([255 - r, 255 - g, 255 - bl])
        });
        let s = ssim(&a, &b);
        assert!((-1.0..=1.0).contains(&s), "ssim {s}");
        assert!(s < 0.5);
    }

    #[test]
    fn psnr_serializes_infinity_as_text() {
        let m = QualityMetrics {
            psnr: f64::INFINITY,
            ssim: 1.0,
        };
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"psnr":"inf","ssim":1.0}"#);
        let back: QualityMetrics = serde_json::from_str(&json).unwrap();
        assert!(back.psnr.is_infinite());

        let finite: QualityMetrics = serde_json::from_str(r#"{"psnr":31.5,"ssim":0.9}"#).unwrap();
        assert!((finite.psnr - 31.5).abs() < f64::EPSILON);
        assert!(serde_json::from_str::<QualityMetrics>(r#"{"psnr":"nan","ssim":0.9}"#).is_err());
    }

    #[test]
    fn display_formats_infinity() {
        let m = QualityMetrics {
            psnr: f64::INFINITY,
            ssim: 1.0,
        };
        assert_eq!(m.to_string(), "PSNR: inf dB  SSIM: 1.0000");
    }
}
