//! Loading and saving image files.
//!
//! Every loaded image is normalized to 8-bit RGB before it reaches the
//! pipeline: alpha is dropped, grayscale is expanded, and 16-bit or float
//! samples are converted down.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use image::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use log::{debug, error};
use restora_pipeline::RgbImage;
use restora_pipeline::color::normalize;

use crate::error::IoError;

/// Quality used for JPEG output.
pub const JPEG_QUALITY: u8 = 95;

/// Load `path` as an 8-bit RGB image.
///
/// # Errors
///
/// Returns [`IoError::ImageNotFound`] if `path` does not exist, and
/// [`IoError::ImageDecode`] if its contents are not a supported image.
pub fn load_image(path: &Path) -> Result<RgbImage, IoError> {
    if !path.exists() {
        return Err(IoError::ImageNotFound(path.to_path_buf()));
    }
    let decoded = image::open(path).map_err(|source| IoError::ImageDecode {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        "loaded {} ({}x{}, {:?})",
        path.display(),
        decoded.width(),
        decoded.height(),
        decoded.color(),
    );
    Ok(normalize(decoded))
}

/// Decode an in-memory encoded image (PNG, JPEG, BMP, TIFF, WebP) to
/// 8-bit RGB.
///
/// # Errors
///
/// Returns the decoder's error if the bytes are not a supported image.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, image::ImageError> {
    image::load_from_memory(bytes).map(normalize)
}

/// Write `image` to `path`, creating missing parent directories.
///
/// The encoder is chosen from the file extension. JPEG output uses
/// [`JPEG_QUALITY`].
///
/// # Errors
///
/// Returns [`IoError::Io`] if a directory or the file cannot be created,
/// and [`IoError::ImageEncode`] for an unknown extension or an encoder
/// failure.
pub fn try_save_image(image: &RgbImage, path: &Path) -> Result<(), IoError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let encode_error = |source| IoError::ImageEncode {
        path: path.to_path_buf(),
        source,
    };

    let format = ImageFormat::from_path(path).map_err(encode_error)?;
    if format == ImageFormat::Jpeg {
        let mut writer = BufWriter::new(File::create(path)?);
        let encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
        image.write_with_encoder(encoder).map_err(encode_error)?;
    } else {
        image.save_with_format(path, format).map_err(encode_error)?;
    }
    debug!("saved {}", path.display());
    Ok(())
}

/// Write `image` to `path`, reporting success as a boolean.
///
/// Failures are logged at `error` level. Use [`try_save_image`] to get the
/// cause.
#[must_use = "returns whether the image was written"]
pub fn save_image(image: &RgbImage, path: &Path) -> bool {
    match try_save_image(image, path) {
        Ok(()) => true,
        Err(e) => {
            error!("could not save {}: {e}", path.display());
            false
        }
    }
}
