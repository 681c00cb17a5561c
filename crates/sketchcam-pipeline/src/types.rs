//! Shared types for the sketchcam frame pipeline.

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can build and inspect
/// single-channel frames without depending on `image` directly.
pub use image::GrayImage;

/// Re-export `RgbImage` so downstream crates can build and inspect
/// color frames without depending on `image` directly.
pub use image::RgbImage;

/// An in-memory raster frame.
///
/// Frames are values: every stage borrows its input and returns a new
/// owned frame. The variant determines the channel count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Single-channel intensity (grayscale or binary 0/255).
    Gray(GrayImage),
    /// Three-channel RGB color.
    Color(RgbImage),
}

impl Frame {
    /// Number of channels per pixel: 1 for [`Gray`](Self::Gray),
    /// 3 for [`Color`](Self::Color).
    #[must_use]
    pub const fn channels(&self) -> u8 {
        match self {
            Self::Gray(_) => 1,
            Self::Color(_) => 3,
        }
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        match self {
            Self::Gray(img) => img.width(),
            Self::Color(img) => img.width(),
        }
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        match self {
            Self::Gray(img) => img.height(),
            Self::Color(img) => img.height(),
        }
    }

    /// Width and height together.
    #[must_use]
    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    /// Borrow the single-channel image, or fail with
    /// [`PipelineError::ChannelMismatch`] naming `stage`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ChannelMismatch`] if this is a color frame.
    pub const fn require_gray(&self, stage: &'static str) -> Result<&GrayImage, PipelineError> {
        match self {
            Self::Gray(img) => Ok(img),
            Self::Color(_) => Err(PipelineError::ChannelMismatch {
                stage,
                expected: 1,
                actual: 3,
            }),
        }
    }

    /// Borrow the three-channel image, or fail with
    /// [`PipelineError::ChannelMismatch`] naming `stage`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ChannelMismatch`] if this is a
    /// single-channel frame.
    pub const fn require_color(&self, stage: &'static str) -> Result<&RgbImage, PipelineError> {
        match self {
            Self::Color(img) => Ok(img),
            Self::Gray(_) => Err(PipelineError::ChannelMismatch {
                stage,
                expected: 3,
                actual: 1,
            }),
        }
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A 2D integer point in frame coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: i32,
    /// Vertical position (pixels from top edge).
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x - other.x);
        let dy = f64::from(self.y - other.y);
        dx.hypot(dy)
    }
}

/// A closed boundary traced in a binary frame.
///
/// Always holds at least one point. The last point connects back to the
/// first; the closing point is not repeated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contour(Vec<Point>);

impl Contour {
    /// Wrap a point sequence, or return `None` if it is empty.
    #[must_use]
    pub fn new(points: Vec<Point>) -> Option<Self> {
        if points.is_empty() {
            None
        } else {
            Some(Self(points))
        }
    }

    /// Number of points in the contour.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; kept for API symmetry with `len`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns a slice of all points.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Total length of the closed boundary, including the segment from
    /// the last point back to the first.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        let n = self.0.len();
        (0..n).map(|i| self.0[i].distance(self.0[(i + 1) % n])).sum()
    }
}

/// A closed polygon with at least three vertices.
///
/// Consecutive duplicate vertices (including last-to-first) are removed
/// on construction, so the first and last vertex always differ.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon(Vec<Point>);

impl Polygon {
    /// Build a polygon, or return `None` if fewer than three distinct
    /// consecutive vertices remain after de-duplication.
    #[must_use]
    pub fn new(mut vertices: Vec<Point>) -> Option<Self> {
        vertices.dedup();
        while vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        if vertices.len() < 3 {
            None
        } else {
            Some(Self(vertices))
        }
    }

    /// Number of vertices.
    #[must_use]
    pub const fn vertex_count(&self) -> usize {
        self.0.len()
    }

    /// Returns a slice of all vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.0
    }
}

/// Errors raised by pipeline stages and the stage executor.
///
/// These indicate a stage was wired to the wrong kind of input. The
/// frame codec only ever produces color frames, so for the built-in
/// variants they are defensive checks.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// A stage received a frame with the wrong channel count.
    #[error("{stage} expects a {expected}-channel frame, got {actual} channels")]
    ChannelMismatch {
        /// Name of the stage that rejected its input.
        stage: &'static str,
        /// Channel count the stage requires.
        expected: u8,
        /// Channel count it was given.
        actual: u8,
    },

    /// A stage received contours or polygons where it expected a frame
    /// (or the other way around).
    #[error("{stage} expects {expected} input, got {actual}")]
    UnexpectedInput {
        /// Name of the stage that rejected its input.
        stage: &'static str,
        /// Kind of data the stage requires.
        expected: &'static str,
        /// Kind of data it was given.
        actual: &'static str,
    },

    /// The last stage of a variant produced something other than a frame.
    #[error("pipeline ended with {0} instead of a frame")]
    NoFrameOutput(&'static str),
}
