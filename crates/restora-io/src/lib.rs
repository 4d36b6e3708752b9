//! restora-io: Filesystem and network collaborators for restora.
//!
//! Loads and saves image files, keeps a verified local cache of
//! super-resolution weights (fetched over HTTP on first use), turns those
//! weights into inference backends, and runs whole directories through
//! an enhancer. The pixel work itself lives in `restora-pipeline`.
//!
//! Inference is optional: without the `onnx` feature every model
//! resolves to the interpolation fallback, without touching the network.

pub mod backend;
pub mod batch;
pub mod compare;
pub mod error;
pub mod image_io;
pub mod input;
pub mod models;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use backend::{BackendLoader, NullLoader, default_loader};
pub use batch::{BatchEntry, BatchOutcome, BatchReport, DEFAULT_SUFFIX, process_directory};
pub use compare::{Comparison, compare_files, side_by_side};
pub use error::IoError;
pub use image_io::{load_image, save_image, try_save_image};
pub use input::{EnhanceInput, enhance_input};
pub use models::{FetchError, Fetcher, HttpFetcher, ModelResolver, ModelStore, StoreError};
#[cfg(feature = "onnx")]
pub use onnx::OnnxLoader;
