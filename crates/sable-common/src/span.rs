//! Span - source location tracking for synthesized trees and diagnostics.
//!
//! Spans use half-open byte ranges `[start, end)` and are small (8 bytes)
//! and cheap to copy. The implicit engine only threads them through to the
//! trees it synthesizes; it never reads source text.

use serde::{Deserialize, Serialize};

/// A span of source code, represented as a byte range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive)
    pub start: u32,
    /// End byte offset (exclusive)
    pub end: u32,
}

impl Span {
    /// Create a new span from start and end offsets.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    /// Create an empty span at the given position.
    #[inline]
    pub const fn at(pos: u32) -> Self {
        Span {
            start: pos,
            end: pos,
        }
    }

    /// Create a dummy span for synthetic nodes.
    #[inline]
    pub const fn dummy() -> Self {
        Span {
            start: u32::MAX,
            end: u32::MAX,
        }
    }

    #[inline]
    pub const fn is_dummy(self) -> bool {
        self.start == u32::MAX && self.end == u32::MAX
    }

    #[inline]
    pub const fn len(self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.start >= self.end
    }

    /// The zero-width span at this span's start.
    #[inline]
    pub const fn start_pos(self) -> Span {
        Span::at(self.start)
    }
}
