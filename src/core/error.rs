//! Error taxonomy for the grid engine.
//!
//! None of these reach the user.  The engine absorbs them by rendering
//! nothing (or keeping the previous focus) and logging at debug level.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    /// The wrap-index formula is undefined for a zero-length list.
    #[error("item list is empty; nothing to tile")]
    EmptyItemList,
    /// Width or height is zero, negative or not finite.
    #[error("viewport {width}x{height} is degenerate")]
    DegenerateViewport { width: i64, height: i64 },
}

impl GridError {
    pub(crate) fn degenerate(width: f64, height: f64) -> Self {
        Self::DegenerateViewport {
            width: width as i64,
            height: height as i64,
        }
    }
}
