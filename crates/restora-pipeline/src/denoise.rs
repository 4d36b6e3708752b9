//! Non-local means denoising.
//!
//! Each output pixel is a weighted average of every pixel in a square
//! search window around it. The weight of a candidate falls off with the
//! mean squared difference between the 7×7 patch around the candidate and
//! the 7×7 patch around the target, so pixels are averaged with others
//! that *look* alike rather than merely sit nearby.
//!
//! Patch distances are evaluated per search offset: one squared-difference
//! map per offset, summed over patches through an integral image. That
//! keeps the cost at `O(search² · pixels)` independent of the patch size.

use crate::blur::reflect_101;
use crate::color::to_u8;
use crate::plane::Plane;
use crate::types::{RgbImage, StageError};

/// Side length of the comparison patch.
pub const TEMPLATE_WINDOW: u32 = 7;

/// Side length of the search window.
pub const SEARCH_WINDOW: u32 = 21;

/// Filter parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NlMeansParams {
    /// Filter strength `h`. The weight of a patch at mean squared
    /// distance `d²` is `exp(-d² / h²)`.
    pub strength: f64,
    /// Odd patch side length.
    pub template_window: u32,
    /// Odd search side length.
    pub search_window: u32,
}

impl NlMeansParams {
    /// Parameters with the standard 7×7 patch and 21×21 search window.
    #[must_use]
    pub const fn with_strength(strength: f64) -> Self {
        Self {
            strength,
            template_window: TEMPLATE_WINDOW,
            search_window: SEARCH_WINDOW,
        }
    }
}

/// Denoise with the given strength and the standard windows.
///
/// # Errors
///
/// Returns [`StageError::InvalidParameter`] unless `strength` is a
/// positive finite number.
pub fn denoise(image: &RgbImage, strength: f64) -> Result<RgbImage, StageError> {
    if !(strength.is_finite() && strength > 0.0) {
        return Err(StageError::InvalidParameter {
            name: "denoise_strength",
            value: strength,
            reason: "must be a positive finite number",
        });
    }
    Ok(non_local_means(
        image,
        NlMeansParams::with_strength(strength),
    ))
}

/// Run non-local means on all three channels jointly.
///
/// Channels share one weight per candidate, computed from the patch
/// distance averaged over channels, so colours are never shifted
/// independently of each other.
#[must_use = "returns the denoised image"]
#[allow(clippy::cast_possible_wrap)]
pub fn non_local_means(image: &RgbImage, params: NlMeansParams) -> RgbImage {
    let (w, h) = image.dimensions();
    if w == 0 || h == 0 {
        return image.clone();
    }

    let channels: [Plane; 3] = std::array::from_fn(|c| Plane::from_channel(image, c));
    let template_radius = i64::from(params.template_window / 2);
    let search_radius = i64::from(params.search_window / 2);
    let inv_h2 = 1.0 / (params.strength * params.strength);

    let n = w as usize * h as usize;
    let mut weight_sum = vec![0.0f64; n];
    let mut value_sum = vec![[0.0f64; 3]; n];

    for dy in -search_radius..=search_radius {
        for dx in -search_radius..=search_radius {
            let patch = PatchDistances::new(&channels, dx, dy, template_radius);
            for y in 0..h {
                for x in 0..w {
                    let weight = (-patch.mean_at(x, y) * inv_h2).exp();
                    let sx = reflect_101(i64::from(x) + dx, w);
                    let sy = reflect_101(i64::from(y) + dy, h);
                    let i = y as usize * w as usize + x as usize;
                    weight_sum[i] += weight;
                    for (acc, plane) in value_sum[i].iter_mut().zip(&channels) {
                        *acc += weight * plane.get(sx, sy);
                    }
                }
            }
        }
    }

    RgbImage::from_fn(w, h, |x, y| {
        let i = y as usize * w as usize + x as usize;
        let total = weight_sum[i];
        image::Rgb(std::array::from_fn(|c| to_u8(value_sum[i][c] / total)))
    })
}

/// Patch distances for one search offset, as a summed-area table over
/// the border-padded squared-difference map.
struct PatchDistances {
    /// Row stride of `table`.
    stride: usize,
    table: Vec<f64>,
    template_radius: i64,
    patch_area: f64,
}

impl PatchDistances {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn new(channels: &[Plane; 3], dx: i64, dy: i64, template_radius: i64) -> Self {
        let (w, h) = (channels[0].width(), channels[0].height());
        let padded_w = w as usize + 2 * template_radius as usize;
        let padded_h = h as usize + 2 * template_radius as usize;
        let stride = padded_w + 1;
        let mut table = vec![0.0f64; stride * (padded_h + 1)];

        for py in 0..padded_h {
            let y = py as i64 - template_radius;
            let (ay, by) = (reflect_101(y, h), reflect_101(y + dy, h));
            let mut row_sum = 0.0;
            for px in 0..padded_w {
                let x = px as i64 - template_radius;
                let (ax, bx) = (reflect_101(x, w), reflect_101(x + dx, w));
                let d2: f64 = channels
                    .iter()
                    .map(|plane| {
                        let d = plane.get(ax, ay) - plane.get(bx, by);
                        d * d
                    })
                    .sum::<f64>()
                    / 3.0;
                row_sum += d2;
                table[(py + 1) * stride + px + 1] = table[py * stride + px + 1] + row_sum;
            }
        }

        let side = (2 * template_radius + 1) as f64;
        Self {
            stride,
            table,
            template_radius,
            patch_area: side * side,
        }
    }

    /// Mean squared difference over the patch centered on `(x, y)`.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    fn mean_at(&self, x: u32, y: u32) -> f64 {
        // Padded coordinates of the patch's top-left corner equal (x, y).
        let side = (2 * self.template_radius + 1) as usize;
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + side, y0 + side);
        let s = self.stride;
        let sum = self.table[y1 * s + x1] - self.table[y0 * s + x1] - self.table[y1 * s + x0]
            + self.table[y0 * s + x0];
        sum / self.patch_area
    }
}
