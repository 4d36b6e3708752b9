//! Contrast normalization: tiled luma equalization, then gamma.
//!
//! Equalization runs on the luma plane of a YCbCr split so chroma is left
//! as it was. It is contrast-limited and tiled: each tile gets its own
//! clipped-histogram mapping and pixels blend the mappings of the four
//! nearest tile centres, so flat regions are not blown out and tile seams
//! do not show.
//!
//! Gamma correction is a 256-entry lookup table, either from a fixed
//! gamma or from one derived from the mean brightness.

use crate::analyze::mean_brightness;
use crate::color::{YCbCrPlanes, to_u8};
use crate::types::{GrayImage, RgbImage, StageConfig, StageError};

/// Brightness that automatic gamma aims for.
pub const TARGET_BRIGHTNESS: f64 = 128.0;

/// Smallest automatic gamma.
pub const MIN_AUTO_GAMMA: f64 = 0.3;

/// Largest automatic gamma.
pub const MAX_AUTO_GAMMA: f64 = 3.0;

const HIST_BINS: usize = 256;

/// How the gamma sub-step behaves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GammaMode {
    /// No gamma correction.
    Off,
    /// Apply this gamma.
    Fixed(f64),
    /// Derive the correction from mean brightness.
    Auto,
}

/// Parameters for [`normalize_contrast`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastParams {
    pub clip_limit: f64,
    pub tile_grid: u32,
    pub gamma: GammaMode,
}

impl ContrastParams {
    /// Pick the contrast parameters out of a stage configuration.
    ///
    /// A fixed gamma wins over automatic brightness.
    #[must_use]
    pub const fn from_config(config: &StageConfig) -> Self {
        let gamma = match config.gamma {
            Some(g) => GammaMode::Fixed(g),
            None if config.auto_brightness => GammaMode::Auto,
            None => GammaMode::Off,
        };
        Self {
            clip_limit: config.clahe_clip_limit,
            tile_grid: config.clahe_tile_grid,
            gamma,
        }
    }
}

/// Output of [`normalize_contrast`].
#[derive(Debug, Clone)]
pub struct ContrastOutcome {
    pub image: RgbImage,
    /// Gamma handed to the lookup table, if any was applied.
    pub gamma: Option<f64>,
    /// Mean brightness after equalization, before gamma.
    pub equalized_brightness: f64,
}

/// Equalize luma, then apply gamma per `params.gamma`.
///
/// # Errors
///
/// Returns [`StageError::InvalidParameter`] for a non-positive clip
/// limit, a zero tile grid, or a non-positive fixed gamma.
pub fn normalize_contrast(
    image: &RgbImage,
    params: ContrastParams,
) -> Result<ContrastOutcome, StageError> {
    let equalized = equalize_luma(image, params.clip_limit, params.tile_grid)?;
    let equalized_brightness = mean_brightness(&equalized);

    let gamma = match params.gamma {
        GammaMode::Off => None,
        GammaMode::Fixed(g) => Some(g),
        // The LUT raises to 1/gamma; the derived value is the exponent that
        // maps the current mean onto the target.
        GammaMode::Auto => Some(
            (1.0 / auto_gamma(equalized_brightness)).clamp(MIN_AUTO_GAMMA, MAX_AUTO_GAMMA),
        ),
    };

    let image = match gamma {
        Some(g) => apply_gamma(&equalized, g)?,
        None => equalized,
    };

    Ok(ContrastOutcome {
        image,
        gamma,
        equalized_brightness,
    })
}

// ───────────────────────── Equalization ────────────────────────────

/// Contrast-limited tiled equalization of the luma channel.
///
/// # Errors
///
/// Returns [`StageError::InvalidParameter`] if `clip_limit` is not a
/// positive finite number or `tile_grid` is zero.
pub fn equalize_luma(
    image: &RgbImage,
    clip_limit: f64,
    tile_grid: u32,
) -> Result<RgbImage, StageError> {
    if !(clip_limit.is_finite() && clip_limit > 0.0) {
        return Err(StageError::InvalidParameter {
            name: "clahe_clip_limit",
            value: clip_limit,
            reason: "must be a positive finite number",
        });
    }
    if tile_grid == 0 {
        return Err(StageError::InvalidParameter {
            name: "clahe_tile_grid",
            value: 0.0,
            reason: "must be at least 1",
        });
    }

    let planes = YCbCrPlanes::from_rgb(image);
    let equalized = clahe(&planes.y, clip_limit, tile_grid);
    Ok(planes.to_rgb_with_luma(&equalized))
}

/// Contrast-limited adaptive histogram equalization of a gray image.
///
/// The grid is reduced on axes shorter than `tile_grid` pixels so every
/// tile holds at least one pixel.
#[must_use = "returns the equalized image"]
#[allow(clippy::cast_precision_loss)]
pub fn clahe(gray: &GrayImage, clip_limit: f64, tile_grid: u32) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w == 0 || h == 0 {
        return gray.clone();
    }
    let tiles_x = tile_grid.clamp(1, w);
    let tiles_y = tile_grid.clamp(1, h);

    let mut luts = Vec::with_capacity((tiles_x * tiles_y) as usize);
    for ty in 0..tiles_y {
        let (y0, y1) = tile_span(ty, tiles_y, h);
        for tx in 0..tiles_x {
            let (x0, x1) = tile_span(tx, tiles_x, w);
            let mut hist = [0u32; HIST_BINS];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[usize::from(gray.get_pixel(x, y).0[0])] += 1;
                }
            }
            let area = (x1 - x0) * (y1 - y0);
            luts.push(tile_lut(hist, area, clip_limit));
        }
    }

    let tile_w = f64::from(w) / f64::from(tiles_x);
    let tile_h = f64::from(h) / f64::from(tiles_y);
    let lut = |tx: u32, ty: u32, v: u8| f64::from(luts[(ty * tiles_x + tx) as usize][usize::from(v)]);

    GrayImage::from_fn(w, h, |x, y| {
        let (tx1, tx2, xa) = neighbours(f64::from(x), tile_w, tiles_x);
        let (ty1, ty2, ya) = neighbours(f64::from(y), tile_h, tiles_y);
        let v = gray.get_pixel(x, y).0[0];
        let top = (lut(tx2, ty1, v) - lut(tx1, ty1, v)).mul_add(xa, lut(tx1, ty1, v));
        let bottom = (lut(tx2, ty2, v) - lut(tx1, ty2, v)).mul_add(xa, lut(tx1, ty2, v));
        image::Luma([to_u8((bottom - top).mul_add(ya, top))])
    })
}

/// Pixel range `[start, end)` covered by tile `index` of `count` along an
/// axis of `len` pixels.
#[allow(clippy::cast_possible_truncation)]
const fn tile_span(index: u32, count: u32, len: u32) -> (u32, u32) {
    let start = (index as u64 * len as u64 / count as u64) as u32;
    let end = ((index as u64 + 1) * len as u64 / count as u64) as u32;
    (start, end)
}

/// The two tiles whose centres bracket `pos`, and the blend factor
/// towards the second.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn neighbours(pos: f64, tile_size: f64, tiles: u32) -> (u32, u32, f64) {
    let t = (pos + 0.5) / tile_size - 0.5;
    let t1 = t.floor();
    let frac = t - t1;
    let last = f64::from(tiles - 1);
    let lo = t1.clamp(0.0, last) as u32;
    let hi = (t1 + 1.0).clamp(0.0, last) as u32;
    (lo, hi, frac)
}

/// Clip a tile histogram, redistribute the excess and build its CDF
/// lookup table.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn tile_lut(mut hist: [u32; HIST_BINS], area: u32, clip_limit: f64) -> [u8; HIST_BINS] {
    let limit = ((clip_limit * f64::from(area) / HIST_BINS as f64) as u32).max(1);

    let mut excess = 0u32;
    for count in &mut hist {
        if *count > limit {
            excess += *count - limit;
            *count = limit;
        }
    }

    let bins = HIST_BINS as u32;
    let batch = excess / bins;
    let mut residual = excess - batch * bins;
    for count in &mut hist {
        *count += batch;
    }
    if residual > 0 {
        let step = (bins / residual).max(1) as usize;
        for count in hist.iter_mut().step_by(step) {
            if residual == 0 {
                break;
            }
            *count += 1;
            residual -= 1;
        }
    }

    let scale = 255.0 / f64::from(area.max(1));
    let mut lut = [0u8; HIST_BINS];
    let mut cumulative = 0u32;
    for (entry, &count) in lut.iter_mut().zip(&hist) {
        cumulative += count;
        *entry = to_u8(f64::from(cumulative) * scale);
    }
    lut
}

// ───────────────────────── Gamma ───────────────────────────────────

/// Lookup table for `out = 255 * (in / 255) ^ (1 / gamma)`.
///
/// Gamma above 1 brightens, below 1 darkens. Entries are rounded, so
/// gamma 1 is the identity.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn gamma_lut(gamma: f64) -> [u8; 256] {
    let inv = 1.0 / gamma;
    std::array::from_fn(|i| to_u8(255.0 * (i as f64 / 255.0).powf(inv)))
}

/// Apply gamma correction through [`gamma_lut`].
///
/// # Errors
///
/// Returns [`StageError::InvalidParameter`] unless `gamma` is a positive
/// finite number.
pub fn apply_gamma(image: &RgbImage, gamma: f64) -> Result<RgbImage, StageError> {
    if !(gamma.is_finite() && gamma > 0.0) {
        return Err(StageError::InvalidParameter {
            name: "gamma",
            value: gamma,
            reason: "must be a positive finite number",
        });
    }
    let lut = gamma_lut(gamma);
    let mut out = image.clone();
    for px in out.pixels_mut() {
        for v in &mut px.0 {
            *v = lut[usize::from(*v)];
        }
    }
    Ok(out)
}

/// Exponent that maps `mean_brightness` onto [`TARGET_BRIGHTNESS`]:
/// `log(target / 255) / log(mean / 255)`, clamped to
/// [`MIN_AUTO_GAMMA`]..=[`MAX_AUTO_GAMMA`].
///
/// A mean of 0 is treated as 1. A mean at or above 255 has no finite
/// solution and yields the upper bound.
#[must_use]
pub fn auto_gamma(mean_brightness: f64) -> f64 {
    if mean_brightness.is_nan() {
        return 1.0;
    }
    if mean_brightness >= 255.0 {
        return MAX_AUTO_GAMMA;
    }
    let mean = if mean_brightness <= 0.0 {
        1.0
    } else {
        mean_brightness
    };
    let gamma = (TARGET_BRIGHTNESS / 255.0).ln() / (mean / 255.0).ln();
    if gamma.is_nan() {
        return 1.0;
    }
    gamma.clamp(MIN_AUTO_GAMMA, MAX_AUTO_GAMMA)
}
