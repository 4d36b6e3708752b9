//! Single-channel floating-point pixel planes.
//!
//! Filtering and statistics run on `f64` planes so intermediate values
//! (Laplacian responses, signed differences, squared products) are not
//! clamped to the 8-bit range until a stage hands its result back as an
//! [`RgbImage`](crate::types::RgbImage).

use image::{GrayImage, RgbImage};

/// A `width × height` grid of `f64` samples in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    width: u32,
    height: u32,
    data: Vec<f64>,
}

impl Plane {
    /// A plane filled with zeros.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0.0; width as usize * height as usize],
        }
    }

    /// Build a plane by evaluating `f(x, y)` for every sample.
    #[must_use]
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> f64) -> Self {
        let mut data = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Lift an 8-bit grayscale image into a plane.
    #[must_use]
    pub fn from_gray(image: &GrayImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.as_raw().iter().map(|&v| f64::from(v)).collect(),
        }
    }

    /// Extract channel `c` (0 = red, 1 = green, 2 = blue) of an RGB image.
    #[must_use]
    pub fn from_channel(image: &RgbImage, c: usize) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            data: image.pixels().map(|p| f64::from(p.0[c])).collect(),
        }
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Returns `true` if the plane holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All samples in row-major order.
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.data
    }

    /// Sample at `(x, y)`. Coordinates must be in bounds.
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> f64 {
        self.data[y as usize * self.width as usize + x as usize]
    }

    /// Overwrite the sample at `(x, y)`.
    pub fn set(&mut self, x: u32, y: u32, value: f64) {
        let w = self.width as usize;
        self.data[y as usize * w + x as usize] = value;
    }

    /// Apply `f` to every sample.
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two equally sized planes sample by sample.
    ///
    /// The result takes the dimensions of `self`; `other` must match.
    #[must_use]
    pub fn zip_map(&self, other: &Self, f: impl Fn(f64, f64) -> f64) -> Self {
        debug_assert_eq!(
            (self.width, self.height),
            (other.width, other.height),
            "zip_map requires planes of equal size",
        );
        Self {
            width: self.width,
            height: self.height,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        }
    }

    /// Arithmetic mean of all samples, `0.0` for an empty plane.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f64>() / self.data.len() as f64
    }

    /// Population variance of all samples, `0.0` for an empty plane.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn variance(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        self.data
            .iter()
            .map(|&v| (v - mean) * (v - mean))
            .sum::<f64>()
            / self.data.len() as f64
    }

    /// Population standard deviation.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}
