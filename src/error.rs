use thiserror::Error;

use crate::elements::ValidationError;
use crate::frames::FrameError;
use crate::kepler::KeplerError;
use crate::tle::ParseError;

/// Any failure surfaced by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Malformed TLE text.
    #[error("TLE parse error: {0}")]
    Parse(#[from] ParseError),

    /// Element set rejected at construction.
    #[error("invalid element set: {0}")]
    Validation(#[from] ValidationError),

    /// Only raised by a strict Kepler solver.
    #[error(transparent)]
    Kepler(#[from] KeplerError),

    #[error(transparent)]
    Frame(#[from] FrameError),
}
