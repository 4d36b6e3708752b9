//! Image quality descriptors: blur, noise and brightness.
//!
//! All three work on the grayscale projection from [`color::luma`] and
//! are bucketed into four ordinal labels with fixed thresholds. The
//! analysis is a pure function of the pixels and never touches the input.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::blur::{gaussian_blur_gray_sized, reflect_101};
use crate::color::luma;
use crate::plane::Plane;
use crate::types::{Dimensions, GrayImage, RgbImage};

/// Kernel size of the smoothing used as the noise reference.
pub const NOISE_KERNEL_SIZE: usize = 5;

// ───────────────────────── Labels ──────────────────────────────────

/// Sharpness bucket derived from Laplacian variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BlurLevel {
    #[serde(rename = "very blurry")]
    VeryBlurry,
    #[serde(rename = "blurry")]
    Blurry,
    #[serde(rename = "moderately sharp")]
    ModeratelySharp,
    #[serde(rename = "sharp")]
    Sharp,
}

impl BlurLevel {
    /// Upper bounds (exclusive) of the first three buckets.
    pub const THRESHOLDS: [f64; 3] = [50.0, 100.0, 500.0];

    #[must_use]
    pub fn from_variance(variance: f64) -> Self {
        match bucket(variance, Self::THRESHOLDS) {
            0 => Self::VeryBlurry,
            1 => Self::Blurry,
            2 => Self::ModeratelySharp,
            _ => Self::Sharp,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryBlurry => "very blurry",
            Self::Blurry => "blurry",
            Self::ModeratelySharp => "moderately sharp",
            Self::Sharp => "sharp",
        }
    }
}

/// Noise bucket derived from the residual against a smoothed copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NoiseLevel {
    #[serde(rename = "noiseless")]
    Noiseless,
    #[serde(rename = "low noise")]
    Low,
    #[serde(rename = "moderate noise")]
    Moderate,
    #[serde(rename = "high noise")]
    High,
}

impl NoiseLevel {
    /// Upper bounds (exclusive) of the first three buckets.
    pub const THRESHOLDS: [f64; 3] = [3.0, 8.0, 15.0];

    #[must_use]
    pub fn from_std_dev(std_dev: f64) -> Self {
        match bucket(std_dev, Self::THRESHOLDS) {
            0 => Self::Noiseless,
            1 => Self::Low,
            2 => Self::Moderate,
            _ => Self::High,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Noiseless => "noiseless",
            Self::Low => "low noise",
            Self::Moderate => "moderate noise",
            Self::High => "high noise",
        }
    }
}

/// Brightness bucket derived from the mean gray level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BrightnessLevel {
    #[serde(rename = "very dark")]
    VeryDark,
    #[serde(rename = "dark")]
    Dark,
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "bright")]
    Bright,
}

impl BrightnessLevel {
    /// Upper bounds (exclusive) of the first three buckets.
    pub const THRESHOLDS: [f64; 3] = [50.0, 100.0, 180.0];

    #[must_use]
    pub fn from_mean(mean: f64) -> Self {
        match bucket(mean, Self::THRESHOLDS) {
            0 => Self::VeryDark,
            1 => Self::Dark,
            2 => Self::Normal,
            _ => Self::Bright,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::VeryDark => "very dark",
            Self::Dark => "dark",
            Self::Normal => "normal",
            Self::Bright => "bright",
        }
    }
}

macro_rules! display_label {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

display_label!(BlurLevel, NoiseLevel, BrightnessLevel);

/// Index of the first threshold `value` falls below, or 3.
fn bucket(value: f64, thresholds: [f64; 3]) -> usize {
    thresholds
        .iter()
        .position(|&t| value < t)
        .unwrap_or(thresholds.len())
}

// ───────────────────────── Report ──────────────────────────────────

/// A raw measurement together with its bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement<L> {
    pub value: f64,
    pub label: L,
}

/// Basic facts about an image's size and value range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    /// Always 3 once an image has been normalized.
    pub channels: u8,
    /// Size of the decoded pixel buffer.
    pub size_bytes: u64,
    /// `size_bytes` in MiB.
    pub size_mb: f64,
    /// Smallest channel value.
    pub min: u8,
    /// Largest channel value.
    pub max: u8,
    /// Mean over every channel value.
    pub mean: f64,
}

/// Blur, noise and brightness of one image plus [`ImageInfo`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub blur: Measurement<BlurLevel>,
    pub noise: Measurement<NoiseLevel>,
    pub brightness: Measurement<BrightnessLevel>,
    pub info: ImageInfo,
}

impl AnalysisReport {
    /// Dimensions of the analyzed image.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.info.width, self.info.height)
    }

    /// Format the report as indented human-readable lines.
    #[must_use]
    pub fn report(&self) -> String {
        let info = &self.info;
        [
            "Image Analysis".to_owned(),
            "=".repeat(40),
            format!(
                "  Dimensions:  {}x{} ({} channels, {:.2} MB)",
                info.width, info.height, info.channels, info.size_mb,
            ),
            format!(
                "  Value range: {}..{} (mean {:.1})",
                info.min, info.max, info.mean,
            ),
            format!(
                "  Blur score:  {:.2} ({})",
                self.blur.value, self.blur.label,
            ),
            format!(
                "  Noise level: {:.2} ({})",
                self.noise.value, self.noise.label,
            ),
            format!(
                "  Brightness:  {:.2} ({})",
                self.brightness.value, self.brightness.label,
            ),
        ]
        .join("\n")
    }
}

// ───────────────────────── Estimators ──────────────────────────────

/// Analyze an RGB image.
#[must_use = "returns the analysis report"]
pub fn analyze(image: &RgbImage) -> AnalysisReport {
    let gray = luma(image);

    let blur = laplacian_variance(&gray);
    let noise = noise_std_dev(&gray);
    let brightness = Plane::from_gray(&gray).mean();

    AnalysisReport {
        blur: Measurement {
            value: blur,
            label: BlurLevel::from_variance(blur),
        },
        noise: Measurement {
            value: noise,
            label: NoiseLevel::from_std_dev(noise),
        },
        brightness: Measurement {
            value: brightness,
            label: BrightnessLevel::from_mean(brightness),
        },
        info: image_info(image),
    }
}

/// Variance of the 4-neighbour Laplacian response.
///
/// Higher values mean more high-frequency content, i.e. a sharper
/// image. Borders use reflect-101, so a uniform image scores exactly 0.
#[must_use]
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (w, h) = gray.dimensions();
    let at = |x: i64, y: i64| f64::from(gray.get_pixel(reflect_101(x, w), reflect_101(y, h)).0[0]);
    let response = Plane::from_fn(w, h, |x, y| {
        let (x, y) = (i64::from(x), i64::from(y));
        4.0f64.mul_add(
            -at(x, y),
            at(x - 1, y) + at(x + 1, y) + at(x, y - 1) + at(x, y + 1),
        )
    });
    response.variance()
}

/// Standard deviation of `|gray - blur(gray)|` with a 5×5 Gaussian.
#[must_use]
pub fn noise_std_dev(gray: &GrayImage) -> f64 {
    let smoothed = gaussian_blur_gray_sized(gray, NOISE_KERNEL_SIZE, 0.0);
    let residual = Plane::from_fn(gray.width(), gray.height(), |x, y| {
        let a = gray.get_pixel(x, y).0[0];
        let b = smoothed.get_pixel(x, y).0[0];
        f64::from(a.abs_diff(b))
    });
    residual.std_dev()
}

/// Mean gray level in `0.0..=255.0`.
#[must_use]
pub fn mean_brightness(image: &RgbImage) -> f64 {
    Plane::from_gray(&luma(image)).mean()
}

/// Size and value range of an image.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn image_info(image: &RgbImage) -> ImageInfo {
    let raw = image.as_raw();
    let size_bytes = raw.len() as u64;
    let (min, max, sum) = raw
        .iter()
        .fold((u8::MAX, u8::MIN, 0u64), |(lo, hi, sum), &v| {
            (lo.min(v), hi.max(v), sum + u64::from(v))
        });
    let (min, max, mean) = if raw.is_empty() {
        (0, 0, 0.0)
    } else {
        (min, max, sum as f64 / raw.len() as f64)
    };
    ImageInfo {
        width: image.width(),
        height: image.height(),
        channels: 3,
        size_bytes,
        size_mb: size_bytes as f64 / (1024.0 * 1024.0),
        min,
        max,
        mean,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn checkerboard(size: u32) -> RgbImage {
        RgbImage::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 {
                image::Rgb([0, 0, 0])
            } else {
                image::Rgb([255, 255, 255])
            }
        })
    }

    #[test]
    fn uniform_gray_is_normal_very_blurry_noiseless() {
        let img = RgbImage::from_pixel(100, 100, image::Rgb([128, 128, 128]));
        let report = analyze(&img);
        assert_eq!(report.brightness.label, BrightnessLevel::Normal);
        assert_eq!(report.blur.label, BlurLevel::VeryBlurry);
        assert_eq!(report.noise.label, NoiseLevel::Noiseless);
        assert!(report.blur.value.abs() < f64::EPSILON);
        assert!(report.noise.value.abs() < f64::EPSILON);
        assert!((report.brightness.value - 128.0).abs() < f64::EPSILON);
    }

    #[test]
    fn checkerboard_is_sharp() {
        let report = analyze(&checkerboard(32));
        assert_eq!(report.blur.label, BlurLevel::Sharp);
    }

    #[test]
    fn isolated_speckles_register_as_noise() {
        let img = RgbImage::from_fn(40, 40, |x, y| {
            if x % 7 == 3 && y % 5 == 2 {
                image::Rgb([255, 255, 255])
            } else {
                image::Rgb([60, 60, 60])
            }
        });
        let report = analyze(&img);
        assert!(report.noise.value > 0.0);
        assert_ne!(report.noise.label, NoiseLevel::Noiseless);
    }

    #[test]
    fn analysis_does_not_mutate_input() {
        let img = checkerboard(16);
        let before = img.clone();
        let _ = analyze(&img);
        assert_eq!(img, before);
    }

    #[test]
    fn bucket_boundaries_are_exclusive_upper_bounds() {
        assert_eq!(BlurLevel::from_variance(49.99), BlurLevel::VeryBlurry);
        assert_eq!(BlurLevel::from_variance(50.0), BlurLevel::Blurry);
        assert_eq!(BlurLevel::from_variance(100.0), BlurLevel::ModeratelySharp);
        assert_eq!(BlurLevel::from_variance(500.0), BlurLevel::Sharp);

        assert_eq!(NoiseLevel::from_std_dev(2.9), NoiseLevel::Noiseless);
        assert_eq!(NoiseLevel::from_std_dev(3.0), NoiseLevel::Low);
        assert_eq!(NoiseLevel::from_std_dev(8.0), NoiseLevel::Moderate);
        assert_eq!(NoiseLevel::from_std_dev(15.0), NoiseLevel::High);

        assert_eq!(BrightnessLevel::from_mean(0.0), BrightnessLevel::VeryDark);
        assert_eq!(BrightnessLevel::from_mean(50.0), BrightnessLevel::Dark);
        assert_eq!(BrightnessLevel::from_mean(100.0), BrightnessLevel::Normal);
        assert_eq!(BrightnessLevel::from_mean(180.0), BrightnessLevel::Bright);
    }

    #[test]
    fn brightness_extremes() {
        let black = RgbImage::new(8, 8);
        let white = RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255]));
        assert_eq!(analyze(&black).brightness.label, BrightnessLevel::VeryDark);
        assert_eq!(analyze(&white).brightness.label, BrightnessLevel::Bright);
    }

    #[test]
    fn labels_display_and_serialize_as_text() {
        assert_eq!(BlurLevel::ModeratelySharp.to_string(), "moderately sharp");
        assert_eq!(NoiseLevel::High.to_string(), "high noise");
        assert_eq!(
            serde_json::to_string(&BrightnessLevel::VeryDark).unwrap(),
            "\"very dark\"",
        );
    }

    #[test]
    fn image_info_reports_range_and_size() {
        let img = RgbImage::from_fn(4, 2, |x, _| {
            if x == 0 {
                image::Rgb([10, 20, 30])
            } else {
                image::Rgb([200, 200, 200])
            }
        });
        let info = image_info(&img);
        assert_eq!((info.width, info.height, info.channels), (4, 2, 3));
        assert_eq!(info.size_bytes, 24);
        assert_eq!((info.min, info.max), (10, 200));
        // Two pixels of mean 20, six of 200.
        assert!((info.mean - 155.0).abs() < 1e-9);
    }

    #[test]
    fn report_mentions_every_label() {
        let img = RgbImage::from_pixel(10, 10, image::Rgb([128, 128, 128]));
        let text = analyze(&img).report();
        assert!(text.contains("very blurry"));
        assert!(text.contains("noiseless"));
        assert!(text.contains("normal"));
        assert!(text.contains("10x10"));
    }
}
