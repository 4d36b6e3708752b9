//! Per-stage timing and the parameters each stage actually used.
//!
//! [`ImageEnhancer::enhance`](crate::ImageEnhancer::enhance) fills one
//! [`StageDiagnostics`] per stage that ran. Clocks come from `web-time`
//! so the same code times stages on native and WASM targets. In JSON,
//! durations are plain seconds.

use std::fmt::{self, Write as _};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{Dimensions, STAGE_COUNT, StageKind};

/// `#[serde(with = "duration_serde")]` for a `Duration` stored as an
/// `f64` number of seconds.
pub mod duration_serde {
    use std::time::Duration;

    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    /// # Errors
    ///
    /// Propagates serializer errors.
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    /// # Errors
    ///
    /// Rejects negative, non-finite and overflowing second counts.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let seconds: f64 = Deserialize::deserialize(deserializer)?;
        Duration::try_from_secs_f64(seconds).map_err(D::Error::custom)
    }
}

/// Diagnostics collected from one `enhance()` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Stages that ran, in execution order.
    pub stages: Vec<StageDiagnostics>,
    /// Wall-clock duration of the whole call (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary across all stages.
    pub summary: PipelineSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Which stage.
    pub stage: StageKind,
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific parameters and measurements.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Non-local means.
    Denoise {
        /// Filter strength `h`.
        strength: f64,
        /// Patch side length.
        template_window: u32,
        /// Search side length.
        search_window: u32,
    },
    /// Equalization and gamma.
    Contrast {
        /// Histogram clip limit.
        clip_limit: f64,
        /// Tiles per axis.
        tile_grid: u32,
        /// Gamma applied after equalization, if any.
        gamma: Option<f64>,
        /// Whether `gamma` was derived from brightness.
        auto_gamma: bool,
        /// Mean brightness entering the stage.
        brightness_before: f64,
        /// Mean brightness leaving the stage.
        brightness_after: f64,
    },
    /// Unsharp mask.
    Sharpen {
        /// Amount actually used.
        amount: f64,
        /// Whether `amount` was picked adaptively.
        adaptive: bool,
        /// Residual suppression threshold.
        threshold: f64,
    },
    /// Upscaling.
    SuperResolve {
        /// Backend description.
        backend: String,
        /// `true` if interpolation stood in for the model.
        fallback: bool,
        /// Integer scale factor.
        scale: u32,
        /// Output dimensions.
        output: Dimensions,
    },
}

/// Summary for the whole run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Input dimensions.
    pub input: Dimensions,
    /// Output dimensions.
    pub output: Dimensions,
    /// Number of stages that ran.
    pub stages_run: usize,
}

impl PipelineDiagnostics {
    /// Diagnostics for `stage`, if it ran.
    #[must_use]
    pub fn stage(&self, stage: StageKind) -> Option<&StageDiagnostics> {
        self.stages.iter().find(|d| d.stage == stage)
    }

    /// Share of the total time spent in `stage`, in percent.
    #[must_use]
    pub fn share(&self, stage: &StageDiagnostics) -> f64 {
        let total = self.total_duration.as_secs_f64();
        if total > 0.0 {
            stage.duration.as_secs_f64() / total * 100.0
        } else {
            0.0
        }
    }

    /// One line per stage with its time, share and parameters.
    #[must_use]
    pub fn report(&self) -> String {
        let summary = &self.summary;
        let mut out = format!(
            "Enhancement: {} -> {}, {}/{STAGE_COUNT} stages in {:.1} ms\n",
            summary.input,
            summary.output,
            summary.stages_run,
            millis(self.total_duration),
        );
        for diag in &self.stages {
            let _ = writeln!(
                out,
                "  {:<10} {:>9.1} ms {:>5.1}%  {}",
                diag.stage.name(),
                millis(diag.duration),
                self.share(diag),
                diag.metrics,
            );
        }
        out.truncate(out.trim_end().len());
        out
    }
}

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1e3
}

impl fmt::Display for StageMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Denoise {
                strength,
                template_window,
                search_window,
            } => write!(
                f,
                "h={strength:.1} patch={template_window} window={search_window}"
            ),
            Self::Contrast {
                clip_limit,
                tile_grid,
                gamma,
                auto_gamma,
                brightness_before,
                brightness_after,
            } => {
                write!(f, "clip={clip_limit:.1} tiles={tile_grid}x{tile_grid} ")?;
                match gamma {
                    Some(g) if *auto_gamma => write!(f, "gamma={g:.2} (auto)")?,
                    Some(g) => write!(f, "gamma={g:.2}")?,
                    None => f.write_str("gamma=off")?,
                }
                write!(f, " mean {brightness_before:.1} -> {brightness_after:.1}")
            }
            Self::Sharpen {
                amount,
                adaptive,
                threshold,
            } => {
                write!(f, "amount={amount:.2}")?;
                if *adaptive {
                    f.write_str(" (adaptive)")?;
                }
                write!(f, " threshold={threshold:.1}")
            }
            Self::SuperResolve {
                backend,
                fallback,
                output,
                ..
            } => {
                f.write_str(backend)?;
                if *fallback {
                    f.write_str(" [fallback]")?;
                }
                write!(f, " -> {output}")
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> PipelineDiagnostics {
        PipelineDiagnostics {
            stages: vec![
                StageDiagnostics {
                    stage: StageKind::Denoise,
                    duration: Duration::from_millis(40),
                    metrics: StageMetrics::Denoise {
                        strength: 10.0,
                        template_window: 7,
                        search_window: 21,
                    },
                },
                StageDiagnostics {
                    stage: StageKind::Contrast,
                    duration: Duration::from_millis(10),
                    metrics: StageMetrics::Contrast {
                        clip_limit: 2.0,
                        tile_grid: 8,
                        gamma: Some(1.4),
                        auto_gamma: true,
                        brightness_before: 61.0,
                        brightness_after: 98.5,
                    },
                },
                StageDiagnostics {
                    stage: StageKind::SuperResolve,
                    duration: Duration::from_millis(50),
                    metrics: StageMetrics::SuperResolve {
                        backend: "interpolation (CatmullRom) x2".to_owned(),
                        fallback: true,
                        scale: 2,
                        output: Dimensions::new(128, 128),
                    },
                },
            ],
            total_duration: Duration::from_millis(100),
            summary: PipelineSummary {
                input: Dimensions::new(64, 64),
                output: Dimensions::new(128, 128),
                stages_run: 3,
            },
        }
    }

    #[test]
    fn share_is_relative_to_total() {
        let diag = sample();
        let denoise = diag.stage(StageKind::Denoise).unwrap();
        assert!((diag.share(denoise) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn report_lists_stages_that_ran() {
        let report = sample().report();
        assert!(report.starts_with("Enhancement: 64x64 -> 128x128, 3/4 stages"), "{report}");
        assert_eq!(report.lines().count(), 4);
        assert!(report.contains("denoise"));
        assert!(report.contains("gamma=1.40 (auto)"));
        assert!(report.contains("[fallback]"));
        assert!(!report.contains("sharpen"));
    }

    #[test]
    fn stage_lookup() {
        let diag = sample();
        assert!(diag.stage(StageKind::Contrast).is_some());
        assert!(diag.stage(StageKind::Sharpen).is_none());
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!((json["total_duration"].as_f64().unwrap() - 0.1).abs() < 1e-12);
        assert_eq!(json["stages"][0]["stage"], "denoise");
        let back: PipelineDiagnostics = serde_json::from_value(json).unwrap();
        assert_eq!(back.stages.len(), 3);
        assert_eq!(back.total_duration, Duration::from_millis(100));
    }

    #[test]
    fn negative_duration_is_rejected() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["total_duration"] = serde_json::json!(-1.0);
        assert!(serde_json::from_value::<PipelineDiagnostics>(json).is_err());
    }
}
