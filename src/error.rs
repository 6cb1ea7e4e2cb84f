//! Error types for the clustering engine's public boundaries.
//!
//! Non-fatal internal degeneracies (a dummy centre sampled mid-split, a
//! numerically impossible nearest-centre tie) are not represented here;
//! they are recovered locally and surfaced through
//! `log::warn!` call sites in `coreset_tree`, the same way the teacher
//! reserves panics for "should never happen" structural bugs and `Result`
//! for the handful of boundaries a caller can legitimately get wrong.

use std::fmt;

/// A boundary-level error: bad configuration, or a precondition the caller
/// violated (a decreasing timestamp, a zero-weight point fed to the stream).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClustreamError {
    Configuration(String),
    Precondition(String),
}

impl fmt::Display for ClustreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClustreamError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            ClustreamError::Precondition(msg) => write!(f, "precondition violated: {msg}"),
        }
    }
}

impl std::error::Error for ClustreamError {}

pub type Result<T> = std::result::Result<T, ClustreamError>;
