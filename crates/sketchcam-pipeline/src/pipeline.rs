//! Stage executor and the built-in pipeline variants.
//!
//! A variant is nothing more than an ordered slice of [`Stage`]s. The
//! executor threads a [`StageData`] value through them: most stages map
//! a frame to a frame, while the shape-detection tail moves through
//! contours and polygons before drawing back onto the original frame.
//!
//! ```rust
//! # use sketchcam_pipeline::{Frame, PipelineError, VariantKind};
//! # fn run(frame: &Frame) -> Result<(), PipelineError> {
//! let sketch = VariantKind::Sketch.run(frame)?;
//! assert_eq!(sketch.channels(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! Adding a variant means adding a new stage list; the executor does not
//! change. Every stage checks the kind of data it receives and fails
//! with [`PipelineError::UnexpectedInput`] or
//! [`PipelineError::ChannelMismatch`] rather than guessing.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::diagnostics::{PipelineDiagnostics, StageDiagnostics, StageMetrics};
use crate::threshold::Polarity;
use crate::types::{Contour, Frame, PipelineError, Polygon};

/// Canny low threshold for the sketch variant.
pub const SKETCH_CANNY_LOW: f32 = 10.0;

/// Canny high threshold for the sketch variant.
pub const SKETCH_CANNY_HIGH: f32 = 70.0;

/// Threshold cutoff shared by both variants.
pub const THRESHOLD_CUTOFF: u8 = 70;

/// Polygon approximation tolerance as a fraction of contour perimeter.
pub const APPROX_EPSILON_FRACTION: f64 = 0.03;

/// Grayscale → blur → Canny → inverted threshold.
pub const SKETCH: &[Stage] = &[
    Stage::Grayscale,
    Stage::GaussianBlur,
    Stage::Canny {
        low: SKETCH_CANNY_LOW,
        high: SKETCH_CANNY_HIGH,
    },
    Stage::Threshold {
        cutoff: THRESHOLD_CUTOFF,
        polarity: Polarity::Inverted,
    },
];

/// Grayscale → blur → threshold → contours → polygons → triangles →
/// filled overlay on the original frame.
pub const SHAPE_DETECT: &[Stage] = &[
    Stage::Grayscale,
    Stage::GaussianBlur,
    Stage::Threshold {
        cutoff: THRESHOLD_CUTOFF,
        polarity: Polarity::Binary,
    },
    Stage::FindContours,
    Stage::ApproximatePolygons {
        epsilon_fraction: APPROX_EPSILON_FRACTION,
    },
    Stage::KeepTriangles,
    Stage::OverlayOnOriginal {
        color: crate::overlay::HIGHLIGHT,
    },
];

/// Selects which built-in variant a server or tool runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VariantKind {
    /// Binary line drawing of the frame's edges.
    Sketch,
    /// Original frame with detected triangles filled in.
    #[default]
    ShapeDetect,
}

impl VariantKind {
    /// The stage list for this variant.
    #[must_use]
    pub const fn stages(self) -> &'static [Stage] {
        match self {
            Self::Sketch => SKETCH,
            Self::ShapeDetect => SHAPE_DETECT,
        }
    }

    /// Short name for logs and reports.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sketch => "sketch",
            Self::ShapeDetect => "shape_detect",
        }
    }

    /// Run this variant over `frame`.
    ///
    /// # Errors
    ///
    /// Propagates any [`PipelineError`] raised by a stage.
    pub fn run(self, frame: &Frame) -> Result<Frame, PipelineError> {
        run(self.stages(), frame)
    }

    /// Run this variant and collect per-stage diagnostics.
    ///
    /// # Errors
    ///
    /// Propagates any [`PipelineError`] raised by a stage.
    pub fn run_with_diagnostics(
        self,
        frame: &Frame,
    ) -> Result<(Frame, PipelineDiagnostics), PipelineError> {
        run_with_diagnostics(self.stages(), frame)
    }
}

/// One step of a pipeline variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    /// Color frame → gray frame.
    Grayscale,
    /// Gray frame → gray frame, 5×5 Gaussian, zero border.
    GaussianBlur,
    /// Gray frame → binary edge frame.
    Canny {
        /// Hysteresis low threshold.
        low: f32,
        /// Hysteresis high threshold.
        high: f32,
    },
    /// Gray frame → binary frame.
    Threshold {
        /// Pixels strictly above this value are "on".
        cutoff: u8,
        /// Which side of the cutoff becomes white.
        polarity: Polarity,
    },
    /// Binary frame → contours.
    FindContours,
    /// Contours → polygons with `epsilon = epsilon_fraction × perimeter`.
    ApproximatePolygons {
        /// Tolerance as a fraction of each contour's perimeter.
        epsilon_fraction: f64,
    },
    /// Polygons → only those with three vertices.
    KeepTriangles,
    /// Polygons → copy of the original color frame with each polygon
    /// filled in `color`.
    OverlayOnOriginal {
        /// RGB fill color.
        color: [u8; 3],
    },
}

impl Stage {
    /// Stage name for logs, errors, and diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Grayscale => crate::grayscale::STAGE,
            Self::GaussianBlur => crate::blur::STAGE,
            Self::Canny { .. } => crate::edge::STAGE,
            Self::Threshold { .. } => crate::threshold::STAGE,
            Self::FindContours => crate::contour::STAGE,
            Self::ApproximatePolygons { .. } => crate::approx::STAGE,
            Self::KeepTriangles => crate::overlay::CLASSIFY_STAGE,
            Self::OverlayOnOriginal { .. } => crate::overlay::DRAW_STAGE,
        }
    }

    /// Apply this stage to `input`. `original` is the frame the pipeline
    /// started from, used by overlay stages.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnexpectedInput`] if `input` is the wrong
    /// kind of data, or [`PipelineError::ChannelMismatch`] if a frame has
    /// the wrong channel count.
    pub fn apply(&self, input: StageInput<'_>, original: &Frame) -> Result<StageData, PipelineError> {
        let stage = self.name();
        match *self {
            Self::Grayscale => crate::grayscale::grayscale(input.frame(stage)?).map(StageData::Frame),
            Self::GaussianBlur => crate::blur::gaussian_blur(input.frame(stage)?).map(StageData::Frame),
            Self::Canny { low, high } => {
                crate::edge::canny(input.frame(stage)?, low, high).map(StageData::Frame)
            }
            Self::Threshold { cutoff, polarity } => {
                crate::threshold::threshold(input.frame(stage)?, cutoff, polarity)
                    .map(StageData::Frame)
            }
            Self::FindContours => {
                crate::contour::find_contours(input.frame(stage)?).map(StageData::Contours)
            }
            Self::ApproximatePolygons { epsilon_fraction } => Ok(StageData::Polygons(
                crate::approx::approximate_all(input.contours(stage)?, epsilon_fraction),
            )),
            Self::KeepTriangles => Ok(StageData::Polygons(crate::overlay::keep_triangles(
                input.polygons(stage)?,
            ))),
            Self::OverlayOnOriginal { color } => {
                crate::overlay::draw_filled(original, input.polygons(stage)?, color)
                    .map(StageData::Frame)
            }
        }
    }
}

/// Owned output of a stage.
#[derive(Debug, Clone, PartialEq)]
pub enum StageData {
    /// A raster frame.
    Frame(Frame),
    /// Traced contours, in no particular order.
    Contours(Vec<Contour>),
    /// Approximated polygons.
    Polygons(Vec<Polygon>),
}

impl StageData {
    /// Borrow as a stage input.
    #[must_use]
    pub fn as_input(&self) -> StageInput<'_> {
        match self {
            Self::Frame(f) => StageInput::Frame(f),
            Self::Contours(c) => StageInput::Contours(c),
            Self::Polygons(p) => StageInput::Polygons(p),
        }
    }
}

/// Borrowed input to a stage.
#[derive(Debug, Clone, Copy)]
pub enum StageInput<'a> {
    /// A raster frame.
    Frame(&'a Frame),
    /// Traced contours.
    Contours(&'a [Contour]),
    /// Approximated polygons.
    Polygons(&'a [Polygon]),
}

impl<'a> StageInput<'a> {
    /// Name of the data kind, for error messages.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Frame(_) => "a frame",
            Self::Contours(_) => "contours",
            Self::Polygons(_) => "polygons",
        }
    }

    fn frame(self, stage: &'static str) -> Result<&'a Frame, PipelineError> {
        match self {
            Self::Frame(f) => Ok(f),
            other => Err(other.mismatch(stage, "a frame")),
        }
    }

    fn contours(self, stage: &'static str) -> Result<&'a [Contour], PipelineError> {
        match self {
            Self::Contours(c) => Ok(c),
            other => Err(other.mismatch(stage, "contours")),
        }
    }

    fn polygons(self, stage: &'static str) -> Result<&'a [Polygon], PipelineError> {
        match self {
            Self::Polygons(p) => Ok(p),
            other => Err(other.mismatch(stage, "polygons")),
        }
    }

    const fn mismatch(&self, stage: &'static str, expected: &'static str) -> PipelineError {
        PipelineError::UnexpectedInput {
            stage,
            expected,
            actual: self.kind(),
        }
    }
}

/// Run `stages` in order over `frame` and return the final frame.
///
/// An empty stage list returns a copy of `frame`.
///
/// # Errors
///
/// Propagates the first [`PipelineError`] raised by a stage, or returns
/// [`PipelineError::NoFrameOutput`] if the last stage does not produce
/// a frame.
pub fn run(stages: &[Stage], frame: &Frame) -> Result<Frame, PipelineError> {
    execute(stages, frame, |_, _, _| {})
}

/// Like [`run`], but also returns per-stage timings and metrics.
///
/// # Errors
///
/// Same as [`run`].
pub fn run_with_diagnostics(
    stages: &[Stage],
    frame: &Frame,
) -> Result<(Frame, PipelineDiagnostics), PipelineError> {
    let started = Instant::now();
    let mut recorded = Vec::with_capacity(stages.len());
    let output = execute(stages, frame, |stage, data, duration| {
        recorded.push(StageDiagnostics {
            stage: stage.name().to_owned(),
            duration,
            metrics: StageMetrics::of(data),
        });
    })?;
    let diagnostics = PipelineDiagnostics {
        input: frame.dimensions(),
        stages: recorded,
        total_duration: started.elapsed(),
    };
    Ok((output, diagnostics))
}

/// The one executor loop. `observe` sees every stage's output and how
/// long it took.
fn execute(
    stages: &[Stage],
    frame: &Frame,
    mut observe: impl FnMut(&Stage, &StageData, Duration),
) -> Result<Frame, PipelineError> {
    let mut current: Option<StageData> = None;
    for stage in stages {
        let input = current
            .as_ref()
            .map_or(StageInput::Frame(frame), StageData::as_input);
        let started = Instant::now();
        let output = stage.apply(input, frame)?;
        let elapsed = started.elapsed();
        debug!(stage = stage.name(), elapsed_us = elapsed.as_micros(), "stage done");
        observe(stage, &output, elapsed);
        current = Some(output);
    }

    match current {
        None => Ok(frame.clone()),
        Some(StageData::Frame(output)) => Ok(output),
        Some(other) => Err(PipelineError::NoFrameOutput(other.as_input().kind())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::{GrayImage, RgbImage};

    fn color(w: u32, h: u32) -> Frame {
        Frame::Color(RgbImage::from_fn(w, h, |x, y| {
            if x + y < w {
                image::Rgb([250, 250, 250])
            } else {
                image::Rgb([5, 5, 5])
            }
        }))
    }

    #[test]
    fn empty_stage_list_returns_copy() {
        let frame = color(6, 6);
        assert_eq!(run(&[], &frame).unwrap(), frame);
    }

    #[test]
    fn sketch_is_single_channel_binary() {
        let out = VariantKind::Sketch.run(&color(40, 30)).unwrap();
        assert_eq!(out.channels(), 1);
        assert_eq!((out.width(), out.height()), (40, 30));
        match out {
            Frame::Gray(img) => assert!(img.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255)),
            Frame::Color(_) => panic!("sketch must be single-channel"),
        }
    }

    #[test]
    fn sketch_is_deterministic() {
        let frame = color(32, 32);
        assert_eq!(
            VariantKind::Sketch.run(&frame).unwrap(),
            VariantKind::Sketch.run(&frame).unwrap()
        );
    }

    #[test]
    fn shape_detect_keeps_color_and_dimensions() {
        let out = VariantKind::ShapeDetect.run(&color(25, 35)).unwrap();
        assert_eq!(out.channels(), 3);
        assert_eq!((out.width(), out.height()), (25, 35));
    }

    #[test]
    fn gray_input_is_a_channel_mismatch() {
        let frame = Frame::Gray(GrayImage::new(8, 8));
        let err = VariantKind::Sketch.run(&frame).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ChannelMismatch {
                stage: "grayscale",
                ..
            }
        ));
    }

    #[test]
    fn miswired_stage_reports_unexpected_input() {
        let stages = [Stage::Grayscale, Stage::KeepTriangles];
        let err = run(&stages, &color(8, 8)).unwrap_err();
        assert_eq!(
            err,
            PipelineError::UnexpectedInput {
                stage: "keep_triangles",
                expected: "polygons",
                actual: "a frame",
            }
        );
    }

    #[test]
    fn ending_on_contours_is_an_error() {
        let stages = [Stage::Grayscale, Stage::FindContours];
        let err = run(&stages, &color(8, 8)).unwrap_err();
        assert_eq!(err, PipelineError::NoFrameOutput("contours"));
    }

    #[test]
    fn diagnostics_record_every_stage() {
        let (_, diagnostics) = VariantKind::ShapeDetect
            .run_with_diagnostics(&color(20, 20))
            .unwrap();
        let names: Vec<&str> = diagnostics.stages.iter().map(|s| s.stage.as_str()).collect();
        let expected: Vec<&str> = SHAPE_DETECT.iter().map(Stage::name).collect();
        assert_eq!(names, expected);
        assert_eq!(diagnostics.input.width, 20);
    }

    #[test]
    fn variant_names() {
        assert_eq!(VariantKind::Sketch.name(), "sketch");
        assert_eq!(VariantKind::default(), VariantKind::ShapeDetect);
    }
}
