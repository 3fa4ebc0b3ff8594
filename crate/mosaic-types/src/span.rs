//! The ByteSpan type for inclusive range operations.
//!
//! This module provides the `ByteSpan` type, an inclusive interval of byte
//! positions used to describe the missing parts of a chunk.
//!
//! # ByteSpan
//!
//! - Represents an inclusive span of positions `[start, end]`; both bounds
//!   are covered, so a span is never empty.
//! - Construction normalizes the bounds so that `start <= end` always holds.
//! - Implements the standard traits for comparison, cloning, serialization
//!   and display.
//!
//! # Examples
//!
//! ```rust
//! use mosaic_types::ByteSpan;
//!
//! let span = ByteSpan::new(40, 60);
//! assert_eq!(span.bytecount(), 21);
//! assert!(span.contains(60));
//! ```

use std::fmt;

/// An inclusive span of byte positions: `[start, end]`.
///
/// - Both bounds belong to the span, so `bytecount()` is at least 1.
/// - Ordering is lexicographic on `(start, end)`.
#[derive(
    Clone, Copy, Eq, PartialEq, Debug, serde::Serialize, serde::Deserialize, PartialOrd, Ord,
)]
pub struct ByteSpan {
    /// The first position covered by the span.
    pub start: u64,
    /// The last position covered by the span.
    pub end: u64,
}

impl ByteSpan {
    /// Create a new span covering `a` to `b`, in either order.
    ///
    /// The smaller argument becomes `start` and the larger one `end`, so
    /// construction never fails.
    pub fn new(a: u64, b: u64) -> Self {
        if a <= b {
            ByteSpan { start: a, end: b }
        } else {
            ByteSpan { start: b, end: a }
        }
    }

    /// Returns the number of bytes covered by this span.
    pub fn bytecount(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Check whether a position is within the span.
    pub fn contains(&self, pos: u64) -> bool {
        pos >= self.start && pos <= self.end
    }

    /// Returns true if `other` lies entirely within this span.
    pub fn contains_span(&self, other: &ByteSpan) -> bool {
        self.start <= other.start && self.end >= other.end
    }

    /// Parse a span from its `start-end` rendering.
    ///
    /// The inverse of [Display](std::fmt::Display). Parsed bounds are
    /// normalized exactly like constructed ones.
    pub fn parse(s: &str) -> Result<ByteSpan, SpanParseError> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| SpanParseError::BadSpan(s.to_string()))?;
        let start = start
            .parse::<u64>()
            .map_err(|_| SpanParseError::BadSpan(s.to_string()))?;
        let end = end
            .parse::<u64>()
            .map_err(|_| SpanParseError::BadSpan(s.to_string()))?;

        Ok(ByteSpan::new(start, end))
    }
}

impl fmt::Display for ByteSpan {
    /// Formats the span as `start-end`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Error returned when parsing a [ByteSpan] rendering fails.
#[derive(Debug, thiserror::Error)]
pub enum SpanParseError {
    #[error("not a start-end span: {0:?}")]
    BadSpan(String),
}
