use crate::span::Span;
use std::fmt;

/// Categories of parse diagnostics.
///
/// Parsing never fails; these describe places where the output is not a
/// faithful structural reading of the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// An opening tag without a matching closing tag. The tag degrades to
    /// literal text.
    UnclosedDelimiter,
    /// Handwritten regions nested past the depth limit. The region is kept
    /// as one literal text block.
    DepthExceeded,
    /// The iteration circuit breaker tripped and the output was truncated.
    IterationLimit,
}

impl ParseErrorKind {
    /// Stable lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            ParseErrorKind::UnclosedDelimiter => "unclosed_delimiter",
            ParseErrorKind::DepthExceeded => "depth_exceeded",
            ParseErrorKind::IterationLimit => "iteration_limit",
        }
    }
}

/// A parse diagnostic with location and recovery information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Human-readable error message
    pub message: String,
    /// Source location where the error occurred
    pub span: Option<Span>,
    /// Error categorization
    pub kind: ParseErrorKind,
    /// Whether the produced tree still covers all of the input
    pub recoverable: bool,
}

impl ParseError {
    /// Create an error for an opening tag that is never closed.
    pub fn unclosed_delimiter(delimiter: &str, span: Option<Span>) -> Self {
        Self {
            message: format!("unclosed {}", delimiter),
            span,
            kind: ParseErrorKind::UnclosedDelimiter,
            recoverable: true,
        }
    }

    /// Create an error for a region nested deeper than `max_depth`.
    pub fn depth_exceeded(max_depth: usize, span: Option<Span>) -> Self {
        Self {
            message: format!("nesting deeper than {} kept as literal text", max_depth),
            span,
            kind: ParseErrorKind::DepthExceeded,
            recoverable: true,
        }
    }

    /// Create an error for a tripped circuit breaker.
    ///
    /// The span covers the input that was dropped.
    pub fn iteration_limit(limit: usize, span: Option<Span>) -> Self {
        Self {
            message: format!("iteration limit of {} reached, output truncated", limit),
            span,
            kind: ParseErrorKind::IterationLimit,
            recoverable: false,
        }
    }

    /// Move the error's span right by `offset` bytes.
    pub(crate) fn shifted(mut self, offset: u32) -> Self {
        self.span = self.span.map(|span| span.shifted(offset));
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(span) = self.span {
            write!(f, " at bytes {}..{}", span.start, span.end)?;
        }
        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// Diagnostics collected while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    /// Check if any non-recoverable errors exist.
    pub fn has_fatal(&self) -> bool {
        self.errors.iter().any(|e| !e.recoverable)
    }

    /// Check if any error of the given kind was collected.
    pub fn contains(&self, kind: ParseErrorKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}
