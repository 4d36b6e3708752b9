//! Directory batch processing.
//!
//! Every image in a directory is enhanced independently with one shared
//! [`ImageEnhancer`]. A failing file is recorded and skipped; it never
//! stops the rest of the batch.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use restora_pipeline::ImageEnhancer;
use restora_pipeline::diagnostics::duration_serde;
use serde::Serialize;
use web_time::Instant;

use crate::error::IoError;
use crate::image_io::{load_image, try_save_image};

/// Extensions picked up from a batch directory (compared
/// case-insensitively).
pub const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "tiff", "webp"];

/// Appended to each file stem in the output directory.
pub const DEFAULT_SUFFIX: &str = "_enhanced";

/// `true` if `path`'s extension is in [`IMAGE_EXTENSIONS`].
#[must_use]
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Image files directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns [`IoError::Io`] if the directory cannot be read.
pub fn list_images(dir: &Path) -> Result<Vec<PathBuf>, IoError> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_image_path(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// `<output_dir>/<stem><suffix>.<ext>`, keeping the input's extension.
#[must_use]
pub fn output_path(input: &Path, output_dir: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let name = match input.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    output_dir.join(name)
}

/// How one file fared.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// Enhanced and written.
    Enhanced {
        /// Load, enhance and save time (seconds).
        #[serde(with = "duration_serde")]
        elapsed: Duration,
    },
    /// Loading, enhancing or saving failed.
    Failed { error: String },
}

/// One file of a batch.
///
/// Serializes as `{input, output, success, status, elapsed | error}`.
#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Mirrors `outcome`; set by [`BatchEntry::new`].
    pub success: bool,
    #[serde(flatten)]
    pub outcome: BatchOutcome,
}

impl BatchEntry {
    #[must_use]
    pub const fn new(input: PathBuf, output: PathBuf, outcome: BatchOutcome) -> Self {
        Self {
            input,
            output,
            success: matches!(outcome, BatchOutcome::Enhanced { .. }),
            outcome,
        }
    }

    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.success
    }
}

/// Per-file records in processing order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    /// Number of files enhanced and written.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.entries.iter().filter(|e| e.succeeded()).count()
    }

    /// Number of files that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.entries.len() - self.succeeded()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {}/{} images successfully",
            self.succeeded(),
            self.entries.len(),
        )
    }
}

/// Enhance every image in `input_dir` into `output_dir`.
///
/// # Errors
///
/// Returns [`IoError::Io`] only if `input_dir` cannot be listed.
/// Per-file failures are recorded in the report.
pub fn process_directory(
    enhancer: &mut ImageEnhancer,
    input_dir: &Path,
    output_dir: &Path,
    suffix: &str,
) -> Result<BatchReport, IoError> {
    let inputs = list_images(input_dir)?;
    info!(
        "found {} images in {}",
        inputs.len(),
        input_dir.display(),
    );

    let mut report = BatchReport::default();
    for (i, input) in inputs.into_iter().enumerate() {
        let output = output_path(&input, output_dir, suffix);
        info!("[{}] {}", i + 1, input.display());

        let started = Instant::now();
        let outcome = match enhance_file(enhancer, &input, &output) {
            Ok(()) => BatchOutcome::Enhanced {
                elapsed: started.elapsed(),
            },
            Err(e) => {
                warn!("{}: {e}", input.display());
                BatchOutcome::Failed {
                    error: e.to_string(),
                }
            }
        };
        report.entries.push(BatchEntry::new(input, output, outcome));
    }

    info!("{report}");
    Ok(report)
}

fn enhance_file(enhancer: &mut ImageEnhancer, input: &Path, output: &Path) -> Result<(), IoError> {
    let image = load_image(input)?;
    let result = enhancer.enhance(&image)?;
    try_save_image(result.enhanced(), output)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn extension_filter_is_case_insensitive() {
        assert!(is_image_path(Path::new("a/photo.JPG")));
        assert!(is_image_path(Path::new("scan.tiff")));
        assert!(!is_image_path(Path::new("scan.tif")));
        assert!(!is_image_path(Path::new("notes.txt")));
        assert!(!is_image_path(Path::new("README")));
    }

    #[test]
    fn output_keeps_extension() {
        assert_eq!(
            output_path(Path::new("in/cat.png"), Path::new("out"), "_enhanced"),
            PathBuf::from("out/cat_enhanced.png"),
        );
        assert_eq!(
            output_path(Path::new("in/dog.JPEG"), Path::new("out"), "-x2"),
            PathBuf::from("out/dog-x2.JPEG"),
        );
    }

    #[test]
    fn listing_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.jpg", "c.txt", "d.webp"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("e.png")).unwrap();
        let names: Vec<_> = list_images(dir.path())
            .unwrap()
            .into_iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.jpg", "b.png", "d.webp"]);
    }

    #[test]
    fn report_serializes_outcomes() {
        let report = BatchReport {
            entries: vec![
                BatchEntry::new(
                    PathBuf::from("a.png"),
                    PathBuf::from("out/a_enhanced.png"),
                    BatchOutcome::Enhanced {
                        elapsed: Duration::from_millis(250),
                    },
                ),
                BatchEntry::new(
                    PathBuf::from("b.png"),
                    PathBuf::from("out/b_enhanced.png"),
                    BatchOutcome::Failed {
                        error: "broken".to_owned(),
                    },
                ),
            ],
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["entries"][0]["success"], true);
        assert_eq!(json["entries"][0]["status"], "enhanced");
        assert!((json["entries"][0]["elapsed"].as_f64().unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(json["entries"][1]["success"], false);
        assert_eq!(json["entries"][1]["status"], "failed");
        assert_eq!(json["entries"][1]["error"], "broken");
        assert_eq!(report.to_string(), "Processed 1/2 images successfully");
        assert_eq!(report.failed(), 1);
    }
}
