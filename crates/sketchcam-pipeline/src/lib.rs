//! sketchcam-pipeline: Pure frame processing pipeline (sans-IO).
//!
//! Turns one camera frame into one output frame through one of two
//! fixed variants:
//!
//! - **Sketch**: grayscale -> blur -> Canny -> inverted threshold,
//!   giving a black-on-white line drawing.
//! - **Shape detect**: grayscale -> blur -> threshold -> contours ->
//!   polygon approximation -> triangle classification -> filled overlay
//!   on the original color frame.
//!
//! The [`codec`] module converts between data-URI text (as carried on
//! the wire) and [`Frame`]s. This crate has **no network or filesystem
//! dependencies**; the WebSocket server lives in `sketchcam-server`.

pub mod approx;
pub mod blur;
pub mod codec;
pub mod contour;
pub mod diagnostics;
pub mod edge;
pub mod grayscale;
pub mod overlay;
pub mod pipeline;
pub mod threshold;
pub mod types;

pub use codec::{DecodeError, EncodeError};
pub use diagnostics::PipelineDiagnostics;
pub use pipeline::{Stage, StageData, VariantKind};
pub use threshold::Polarity;
pub use types::{Contour, Dimensions, Frame, GrayImage, PipelineError, Point, Polygon, RgbImage};

/// Render a color frame as a binary line drawing.
///
/// Output is single-channel with every pixel either 0 (line) or 255
/// (paper).
///
/// # Errors
///
/// Returns [`PipelineError::ChannelMismatch`] if `frame` is not a
/// three-channel color frame.
pub fn sketch(frame: &Frame) -> Result<Frame, PipelineError> {
    VariantKind::Sketch.run(frame)
}

/// Fill every detected triangle in a color frame with the highlight
/// color.
///
/// Output is a three-channel frame with the same dimensions as `frame`.
///
/// # Errors
///
/// Returns [`PipelineError::ChannelMismatch`] if `frame` is not a
/// three-channel color frame.
pub fn detect_shapes(frame: &Frame) -> Result<Frame, PipelineError> {
    VariantKind::ShapeDetect.run(frame)
}
