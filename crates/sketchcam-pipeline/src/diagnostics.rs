//! Pipeline diagnostics: timing and counts for each stage.
//!
//! Collected by [`run_with_diagnostics`](crate::pipeline::run_with_diagnostics)
//! alongside the output frame. The server logs them at debug level and
//! the bench tool prints them.
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::StageData;
use crate::types::Dimensions;

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a `Duration` as fractional seconds (`f64`).
    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    /// Deserialize a `Duration` from fractional seconds (`f64`).
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineDiagnostics {
    /// Dimensions of the frame the pipeline started from.
    pub input: Dimensions,
    /// One entry per executed stage, in execution order.
    pub stages: Vec<StageDiagnostics>,
    /// Total wall-clock duration of the entire pipeline (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
}

/// Diagnostics for a single pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Stage name.
    pub stage: String,
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// What the stage produced.
    pub metrics: StageMetrics,
}

/// Summary of a stage's output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageMetrics {
    /// The stage produced a frame.
    Frame {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Channels per pixel.
        channels: u8,
    },
    /// The stage produced contours.
    Contours {
        /// Number of contours.
        count: usize,
        /// Total points across all contours.
        total_points: usize,
    },
    /// The stage produced polygons.
    Polygons {
        /// Number of polygons.
        count: usize,
        /// Total vertices across all polygons.
        total_vertices: usize,
    },
}

impl StageMetrics {
    /// Summarize a stage output.
    #[must_use]
    pub fn of(data: &StageData) -> Self {
        match data {
            StageData::Frame(f) => Self::Frame {
                width: f.width(),
                height: f.height(),
                channels: f.channels(),
            },
            StageData::Contours(c) => Self::Contours {
                count: c.len(),
                total_points: c.iter().map(crate::types::Contour::len).sum(),
            },
            StageData::Polygons(p) => Self::Polygons {
                count: p.len(),
                total_vertices: p.iter().map(crate::types::Polygon::vertex_count).sum(),
            },
        }
    }

    fn details(&self) -> String {
        match self {
            Self::Frame {
                width,
                height,
                channels,
            } => format!("{width}x{height}, {channels} ch"),
            Self::Contours {
                count,
                total_points,
            } => format!("{count} contours, {total_points} points"),
            Self::Polygons {
                count,
                total_vertices,
            } => format!("{count} polygons, {total_vertices} vertices"),
        }
    }
}

impl PipelineDiagnostics {
    /// Number of polygons that reached the overlay, if the pipeline
    /// drew any overlay at all.
    #[must_use]
    pub fn drawn_polygons(&self) -> Option<usize> {
        self.stages.iter().rev().find_map(|s| match s.metrics {
            StageMetrics::Polygons { count, .. } => Some(count),
            _ => None,
        })
    }

    /// Human-readable multi-line report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Pipeline Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Input: {}x{}",
            self.input.width, self.input.height
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<24} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for stage in &self.stages {
            let ms = duration_ms(stage.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            lines.push(format!(
                "{:<24} {:>8.3}ms {:>9.1}%  {}",
                stage.stage,
                ms,
                pct,
                stage.metrics.details(),
            ));
        }

        lines.join("\n")
    }
}

/// Convert a `Duration` to fractional milliseconds.
fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}
