//! Enhancer input: a file on disk, encoded bytes, raw samples or an
//! image already in memory.

use std::path::{Path, PathBuf};

use restora_pipeline::{ImageEnhancer, PipelineResult, RgbImage, image_from_raw};

use crate::error::IoError;
use crate::image_io::{decode_image, load_image};

/// What to enhance.
///
/// The variant is resolved to pixels once, in [`into_image`](Self::into_image);
/// nothing downstream looks at where the image came from.
#[derive(Debug, Clone)]
pub enum EnhanceInput {
    /// A path to be loaded and normalized to RGB.
    FilePath(PathBuf),
    /// An encoded file (PNG, JPEG, ...) already read into memory.
    Encoded(Vec<u8>),
    /// Interleaved 8-bit samples; only 3-channel data is accepted.
    Raw {
        width: u32,
        height: u32,
        channels: u8,
        data: Vec<u8>,
    },
    /// Pixels the caller already holds.
    InMemory(RgbImage),
}

impl EnhanceInput {
    /// Resolve the input to an RGB image.
    ///
    /// # Errors
    ///
    /// Propagates [`load_image`] failures for [`EnhanceInput::FilePath`],
    /// returns [`IoError::Decode`] for undecodable
    /// [`EnhanceInput::Encoded`] bytes and [`IoError::Pipeline`] for raw
    /// samples with the wrong channel count or length.
    pub fn into_image(self) -> Result<RgbImage, IoError> {
        match self {
            Self::FilePath(path) => load_image(&path),
            Self::Encoded(bytes) => decode_image(&bytes).map_err(IoError::Decode),
            Self::Raw {
                width,
                height,
                channels,
                data,
            } => Ok(image_from_raw(width, height, channels, data)?),
            Self::InMemory(image) => Ok(image),
        }
    }
}

impl From<PathBuf> for EnhanceInput {
    fn from(path: PathBuf) -> Self {
        Self::FilePath(path)
    }
}

impl From<&Path> for EnhanceInput {
    fn from(path: &Path) -> Self {
        Self::FilePath(path.to_path_buf())
    }
}

impl From<RgbImage> for EnhanceInput {
    fn from(image: RgbImage) -> Self {
        Self::InMemory(image)
    }
}

/// Resolve `input` and run it through `enhancer`.
///
/// # Errors
///
/// Returns [`IoError`] if the file cannot be loaded or the enhancer
/// fails.
pub fn enhance_input(
    enhancer: &mut ImageEnhancer,
    input: impl Into<EnhanceInput>,
) -> Result<PipelineResult, IoError> {
    let image = input.into().into_image()?;
    Ok(enhancer.enhance(&image)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use restora_pipeline::{NoModels, StageConfig, StageKind};

    use super::*;
    use crate::image_io::try_save_image;

    fn upscale_only() -> ImageEnhancer {
        let mut config = StageConfig::default();
        for stage in StageKind::ALL {
            config.set_enabled(stage, stage == StageKind::SuperResolve);
        }
        ImageEnhancer::new(config, &NoModels).unwrap()
    }

    #[test]
    fn file_and_memory_inputs_agree() {
        let image = RgbImage::from_fn(6, 5, |x, y| {
            #[allow(clippy::cast_possible_truncation)]
            image::Rgb([(x * 30) as u8, (y * 40) as u8, 90])
        });
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.png");
        try_save_image(&image, &path).unwrap();

        let mut enhancer = upscale_only();
        let from_file = enhance_input(&mut enhancer, path.as_path()).unwrap();
        let from_memory = enhance_input(&mut enhancer, image).unwrap();
        assert_eq!(from_file.enhanced(), from_memory.enhanced());
        assert_eq!(from_file.enhanced().dimensions(), (12, 10));
    }

    #[test]
    fn encoded_bytes_are_decoded() {
        let image = RgbImage::from_pixel(4, 3, image::Rgb([10, 200, 30]));
        let mut png = std::io::Cursor::new(Vec::new());
        image.write_to(&mut png, image::ImageFormat::Png).unwrap();

        let mut enhancer = upscale_only();
        let result = enhance_input(&mut enhancer, EnhanceInput::Encoded(png.into_inner())).unwrap();
        assert_eq!(result.original(), &image);
        assert_eq!(result.enhanced().dimensions(), (8, 6));

        let err = enhance_input(&mut enhancer, EnhanceInput::Encoded(b"not an image".to_vec()))
            .unwrap_err();
        assert!(matches!(err, IoError::Decode(_)));
    }

    #[test]
    fn raw_samples_must_be_rgb() {
        let mut enhancer = upscale_only();
        let rgb = EnhanceInput::Raw {
            width: 2,
            height: 1,
            channels: 3,
            data: vec![1, 2, 3, 4, 5, 6],
        };
        let result = enhance_input(&mut enhancer, rgb).unwrap();
        assert_eq!(result.original().get_pixel(1, 0).0, [4, 5, 6]);

        let rgba = EnhanceInput::Raw {
            width: 2,
            height: 1,
            channels: 4,
            data: vec![0; 8],
        };
        let err = enhance_input(&mut enhancer, rgba).unwrap_err();
        assert!(matches!(
            err,
            IoError::Pipeline(restora_pipeline::PipelineError::InvalidImage(_))
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let mut enhancer = upscale_only();
        let err = enhance_input(&mut enhancer, PathBuf::from("/definitely/not/here.png"))
            .unwrap_err();
        assert!(matches!(err, IoError::ImageNotFound(_)));
    }

    #[test]
    fn empty_image_is_pipeline_error() {
        let mut enhancer = upscale_only();
        let err = enhance_input(&mut enhancer, RgbImage::new(0, 0)).unwrap_err();
        assert!(matches!(err, IoError::Pipeline(_)));
    }
}
