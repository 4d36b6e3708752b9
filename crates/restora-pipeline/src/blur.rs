//! Gaussian smoothing.
//!
//! Two flavours are provided. [`gaussian_kernel`] plus the separable
//! convolutions give exact control over kernel size and border handling
//! (reflect-101, mirroring without repeating the edge sample); the
//! analyzer, the unsharp mask and SSIM use these. [`gaussian_blur_rgb`]
//! wraps [`imageproc::filter::gaussian_blur_f32`] for callers that only
//! know a sigma and let the kernel extent follow from it.

use image::GrayImage;

use crate::color::to_u8;
use crate::plane::Plane;
use crate::types::RgbImage;

/// Sigma implied by a kernel size when none is given.
///
/// Matches the convention of common vision libraries:
/// `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn sigma_for_size(size: usize) -> f64 {
    0.3f64.mul_add((size.saturating_sub(1) as f64).mul_add(0.5, -1.0), 0.8)
}

/// Normalized 1-D Gaussian kernel of odd length `size`.
///
/// Non-positive or non-finite `sigma` falls back to [`sigma_for_size`].
/// A `size` of 0 or 1 yields the identity kernel `[1.0]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f64> {
    if size <= 1 {
        return vec![1.0];
    }
    let sigma = if sigma > 0.0 && sigma.is_finite() {
        sigma
    } else {
        sigma_for_size(size)
    };
    let center = (size / 2) as f64;
    let two_sigma_sq = 2.0 * sigma * sigma;
    let raw: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / two_sigma_sq).exp()
        })
        .collect();
    let sum: f64 = raw.iter().sum();
    raw.into_iter().map(|v| v / sum).collect()
}

/// Map a possibly out-of-range index into `0..len` by reflect-101.
///
/// `-1 -> 1`, `len -> len - 2`. A single-sample axis always maps to 0.
#[must_use]
#[allow(
    clippy::cast_possible_wrap,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn reflect_101(index: i64, len: u32) -> u32 {
    let len = i64::from(len);
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let mut i = index.rem_euclid(period);
    if i >= len {
        i = period - i;
    }
    i as u32
}

/// Convolve `plane` with `kernel` horizontally then vertically.
///
/// Output has the same size as the input; borders use reflect-101.
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub fn convolve_separable(plane: &Plane, kernel: &[f64]) -> Plane {
    let (w, h) = (plane.width(), plane.height());
    let radius = (kernel.len() / 2) as i64;

    let horizontal = Plane::from_fn(w, h, |x, y| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, &weight)| {
                let sx = reflect_101(i64::from(x) + k as i64 - radius, w);
                weight * plane.get(sx, y)
            })
            .sum()
    });

    Plane::from_fn(w, h, |x, y| {
        kernel
            .iter()
            .enumerate()
            .map(|(k, &weight)| {
                let sy = reflect_101(i64::from(y) + k as i64 - radius, h);
                weight * horizontal.get(x, sy)
            })
            .sum()
    })
}

/// Convolve keeping only positions where the kernel fits entirely.
///
/// Output is `(w - k + 1) × (h - k + 1)`. Returns an empty plane when
/// the kernel is larger than either side.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn convolve_separable_valid(plane: &Plane, kernel: &[f64]) -> Plane {
    let k = kernel.len() as u32;
    let (w, h) = (plane.width(), plane.height());
    if k == 0 || w < k || h < k {
        return Plane::new(0, 0);
    }
    let (out_w, out_h) = (w - k + 1, h - k + 1);

    let horizontal = Plane::from_fn(out_w, h, |x, y| {
        kernel
            .iter()
            .zip(x..)
            .map(|(&weight, sx)| weight * plane.get(sx, y))
            .sum()
    });

    Plane::from_fn(out_w, out_h, |x, y| {
        kernel
            .iter()
            .zip(y..)
            .map(|(&weight, sy)| weight * horizontal.get(x, sy))
            .sum()
    })
}

/// Blur a grayscale image with a `size × size` Gaussian and round back
/// to 8 bits.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur_gray_sized(image: &GrayImage, size: usize, sigma: f64) -> GrayImage {
    let kernel = gaussian_kernel(size, sigma);
    let blurred = convolve_separable(&Plane::from_gray(image), &kernel);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        image::Luma([to_u8(blurred.get(x, y))])
    })
}

/// Blur each RGB channel with a `size × size` Gaussian and round back
/// to 8 bits.
#[must_use = "returns the blurred image"]
pub fn gaussian_blur_rgb_sized(image: &RgbImage, size: usize, sigma: f64) -> RgbImage {
    let kernel = gaussian_kernel(size, sigma);
    let blurred: [Plane; 3] =
        std::array::from_fn(|c| convolve_separable(&Plane::from_channel(image, c), &kernel));
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        image::Rgb(std::array::from_fn(|c| to_u8(blurred[c].get(x, y))))
    })
}

/// Blur an RGB image by blurring each channel independently with
/// `imageproc`.
///
/// Non-positive sigma values return the image unchanged, since
/// `imageproc` panics on `sigma <= 0.0`.
#[must_use = "returns the blurred RGB image"]
pub fn gaussian_blur_rgb(image: &RgbImage, sigma: f32) -> RgbImage {
    if sigma <= 0.0 || !sigma.is_finite() {
        return image.clone();
    }

    let (w, h) = image.dimensions();

    let channels: [GrayImage; 3] = std::array::from_fn(|c| {
        GrayImage::from_fn(w, h, |x, y| image::Luma([image.get_pixel(x, y).0[c]]))
    });

    let blurred: [GrayImage; 3] =
        std::array::from_fn(|c| imageproc::filter::gaussian_blur_f32(&channels[c], sigma));

    RgbImage::from_fn(w, h, |x, y| {
        image::Rgb([
            blurred[0].get_pixel(x, y).0[0],
            blurred[1].get_pixel(x, y).0[0],
            blurred[2].get_pixel(x, y).0[0],
        ])
    })
}
