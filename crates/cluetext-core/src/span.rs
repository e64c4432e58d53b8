//! Byte ranges into the markup source.
//!
//! Tokens and diagnostics carry a `Span` so callers can point back at the
//! exact piece of author text that produced them. Blocks themselves do not
//! carry spans: they are transient render input, not an editing model.

/// A byte range in the source text, `[start, end)`.
///
/// # Example
///
/// ```rust
/// use cluetext_core::span::Span;
///
/// let span = Span::new(4, 12);
/// assert_eq!(span.len(), 8);
/// assert_eq!(span.slice("**a riddle**"), "riddle**");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Starting byte offset (inclusive).
    pub start: u32,
    /// Ending byte offset (exclusive).
    pub end: u32,
}

impl Span {
    /// Create a new span from byte offsets.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Span of `len` bytes beginning at `start`.
    #[inline]
    pub(crate) fn at(start: usize, len: usize) -> Self {
        Self::new(start as u32, (start + len) as u32)
    }

    /// Length of this span in bytes.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Move the span right by `offset` bytes.
    ///
    /// Nested regions are parsed as their own strings; this maps their
    /// local offsets back into the enclosing text.
    #[inline]
    pub const fn shifted(self, offset: u32) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    /// The text covered by this span, or `""` if it does not fit `source`.
    #[inline]
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        source
            .get(self.start as usize..self.end as usize)
            .unwrap_or("")
    }
}
