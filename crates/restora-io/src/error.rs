//! Errors surfaced by the I/O layer.

use std::path::PathBuf;

use restora_pipeline::PipelineError;

/// Errors from loading, saving and enhancing files.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// The input path does not exist.
    #[error("image not found: {}", .0.display())]
    ImageNotFound(PathBuf),

    /// The file exists but is not a decodable image.
    #[error("failed to decode {}: {source}", path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// In-memory bytes are not a decodable image.
    #[error("failed to decode in-memory image: {0}")]
    Decode(#[source] image::ImageError),

    /// The image could not be encoded in the format the extension names.
    #[error("failed to encode {}: {source}", path.display())]
    ImageEncode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Filesystem failure outside decoding and encoding.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The enhancer rejected the image or a stage failed.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
