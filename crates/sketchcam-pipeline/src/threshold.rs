//! Fixed-level binary thresholding.
//!
//! Maps every pixel of a single-channel frame to either 0 or
//! [`MAX_VALUE`]. A pixel is "above" the cutoff only when strictly
//! greater than it.

use serde::{Deserialize, Serialize};

use crate::types::{Frame, PipelineError};

/// Stage name used in error messages and diagnostics.
pub const STAGE: &str = "threshold";

/// Value written for pixels on the "on" side of the cutoff.
pub const MAX_VALUE: u8 = 255;

/// Which side of the cutoff becomes white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    /// Above cutoff → 255, otherwise 0.
    Binary,
    /// Above cutoff → 0, otherwise 255.
    Inverted,
}

/// Threshold a single-channel frame at `cutoff`.
///
/// # Errors
///
/// Returns [`PipelineError::ChannelMismatch`] if `frame` is not a
/// single-channel frame.
pub fn threshold(frame: &Frame, cutoff: u8, polarity: Polarity) -> Result<Frame, PipelineError> {
    let gray = frame.require_gray(STAGE)?;
    let (above, below) = match polarity {
        Polarity::Binary => (MAX_VALUE, 0),
        Polarity::Inverted => (0, MAX_VALUE),
    };
    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        pixel.0[0] = if pixel.0[0] > cutoff { above } else { below };
    }
    Ok(Frame::Gray(out))
}
