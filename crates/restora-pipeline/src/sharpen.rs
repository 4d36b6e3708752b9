//! Unsharp masking.

use crate::analyze::laplacian_variance;
use crate::blur::{gaussian_blur_rgb, gaussian_blur_rgb_sized};
use crate::color::{luma, to_u8};
use crate::types::{RgbImage, StageConfig, StageError};

/// Amount chosen by adaptive sharpening for very blurry input
/// (Laplacian variance below 50).
pub const ADAPTIVE_AMOUNT_VERY_BLURRY: f64 = 2.5;
/// Amount for blurry input (variance below 100).
pub const ADAPTIVE_AMOUNT_BLURRY: f64 = 1.5;
/// Amount for everything sharper.
pub const ADAPTIVE_AMOUNT_SHARP: f64 = 0.8;

/// Unsharp-mask parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharpenParams {
    pub amount: f64,
    pub threshold: f64,
    pub sigma: f64,
    pub kernel_size: u32,
}

impl SharpenParams {
    #[must_use]
    pub const fn from_config(config: &StageConfig) -> Self {
        Self {
            amount: config.sharpen_amount,
            threshold: config.sharpen_threshold,
            sigma: config.sharpen_sigma,
            kernel_size: config.sharpen_kernel_size,
        }
    }

    fn validate(&self) -> Result<(), StageError> {
        let non_negative = |name, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(StageError::InvalidParameter {
                    name,
                    value,
                    reason: "must be a non-negative finite number",
                })
            }
        };
        non_negative("sharpen_amount", self.amount)?;
        non_negative("sharpen_threshold", self.threshold)?;
        non_negative("sharpen_sigma", self.sigma)?;
        if self.kernel_size != 0 && self.kernel_size % 2 == 0 {
            return Err(StageError::InvalidParameter {
                name: "sharpen_kernel_size",
                value: f64::from(self.kernel_size),
                reason: "must be odd, or 0 to derive it from the sigma",
            });
        }
        if self.kernel_size == 0 && self.sigma <= 0.0 {
            return Err(StageError::InvalidParameter {
                name: "sharpen_sigma",
                value: self.sigma,
                reason: "must be positive when the kernel size is derived",
            });
        }
        Ok(())
    }
}

/// Sharpen `image`: `out = in + amount * (in - blur(in))`, with residuals
/// of magnitude at or below `threshold` dropped first.
///
/// An `amount` of 0 returns the input unchanged.
///
/// # Errors
///
/// Returns [`StageError::InvalidParameter`] for a negative or non-finite
/// amount, threshold or sigma, for an even kernel size, or for a zero
/// sigma combined with a derived kernel size.
pub fn unsharp_mask(image: &RgbImage, params: SharpenParams) -> Result<RgbImage, StageError> {
    params.validate()?;

    let blurred = if params.kernel_size == 0 {
        #[allow(clippy::cast_possible_truncation)]
        let sigma = params.sigma as f32;
        gaussian_blur_rgb(image, sigma)
    } else {
        gaussian_blur_rgb_sized(image, params.kernel_size as usize, params.sigma)
    };

    let mut out = image.clone();
    for (px, blur_px) in out.pixels_mut().zip(blurred.pixels()) {
        for (v, &b) in px.0.iter_mut().zip(&blur_px.0) {
            let diff = f64::from(*v) - f64::from(b);
            if diff.abs() > params.threshold {
                *v = to_u8(params.amount.mul_add(diff, f64::from(*v)));
            }
        }
    }
    Ok(out)
}

/// Sharpening amount matched to how blurry `image` is.
#[must_use]
pub fn adaptive_amount(image: &RgbImage) -> f64 {
    let variance = laplacian_variance(&luma(image));
    if variance < 50.0 {
        ADAPTIVE_AMOUNT_VERY_BLURRY
    } else if variance < 100.0 {
        ADAPTIVE_AMOUNT_BLURRY
    } else {
        ADAPTIVE_AMOUNT_SHARP
    }
}
