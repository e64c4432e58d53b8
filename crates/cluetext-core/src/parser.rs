//! Recursive markup parser.
//!
//! Drives a [`Lexer`] across the input, recursing into handwritten regions.
//! Parsing is total: malformed markup degrades to literal text and the
//! caller always gets a tree back. Two limits bound the work:
//!
//! - a **depth guard**: regions nested deeper than `max_depth` are kept as
//!   one literal text block;
//! - an **iteration circuit breaker**: a region that needs more than
//!   `iteration_limit` steps is cut short. Every step consumes at least one
//!   byte, so this only fires on input larger than the limit.

use std::borrow::Cow;

use crate::ast::{Block, Page};
use crate::error::{ParseError, ParseErrors};
use crate::lexer::{Lexer, TokenKind};
use crate::pages::split_pages;
use crate::span::Span;

/// Deepest handwritten nesting that is still parsed structurally.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Ceiling for [`Parser::with_max_depth`]; handwritten regions recurse
/// once per level, so this bounds the parser's stack use.
pub const MAX_DEPTH_LIMIT: usize = 64;

/// Steps a single region may take before the circuit breaker trips.
pub const DEFAULT_ITERATION_LIMIT: usize = 100_000;

/// Result of parsing with diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult<'a> {
    /// Parsed pages (truncated if a fatal error occurred).
    pub pages: Vec<Page<'a>>,
    /// Diagnostics encountered during parsing.
    pub errors: ParseErrors,
}

impl<'a> ParseResult<'a> {
    /// Check if parsing completed without diagnostics.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Check if the output was truncated.
    pub fn has_fatal_errors(&self) -> bool {
        self.errors.has_fatal()
    }
}

/// Markup parser with configurable limits.
///
/// The parser holds no state between calls and may be shared freely.
///
/// ```rust
/// use cluetext_core::{Block, Parser};
///
/// let parser = Parser::new().with_max_depth(1);
/// let blocks = parser.parse_blocks("Hello **world**!", 0);
/// assert_eq!(blocks[1], Block::Bold("world".into()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parser {
    max_depth: usize,
    iteration_limit: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Create a parser with the default limits.
    #[inline]
    pub fn new() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            iteration_limit: DEFAULT_ITERATION_LIMIT,
        }
    }

    /// Set the deepest nesting level that is parsed structurally.
    ///
    /// Values above [`MAX_DEPTH_LIMIT`] are lowered to it.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.min(MAX_DEPTH_LIMIT);
        self
    }

    /// Set the per-region step limit of the circuit breaker.
    ///
    /// A limit of zero is raised to one.
    pub fn with_iteration_limit(mut self, limit: usize) -> Self {
        self.iteration_limit = limit.max(1);
        self
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn iteration_limit(&self) -> usize {
        self.iteration_limit
    }

    /// Parse author text into pages.
    #[inline]
    pub fn parse<'a>(&self, input: &'a str) -> Vec<Page<'a>> {
        self.parse_with_recovery(input).pages
    }

    /// Parse author text into pages, keeping diagnostics.
    pub fn parse_with_recovery<'a>(&self, input: &'a str) -> ParseResult<'a> {
        let mut errors = ParseErrors::new();
        // A borrowed page is `input` with surrounding whitespace trimmed.
        let leading = input.len() - input.trim_start().len();
        let pages: Vec<Page<'a>> = split_pages(input)
            .into_iter()
            .map(|page| match page {
                Cow::Borrowed(text) => {
                    Page::new(self.parse_region(text, 0, leading, &mut errors))
                }
                // Rewritten text only lives for this call; spans refer to it,
                // not to `input`.
                Cow::Owned(text) => {
                    Page::new(self.parse_region(&text, 0, 0, &mut errors)).into_owned()
                }
            })
            .collect();
        ParseResult { pages, errors }
    }

    /// Parse one region of markup at the given nesting depth.
    ///
    /// This never fails; diagnostics are dropped. Use
    /// [`Parser::parse_blocks_with_recovery`] to keep them.
    #[inline]
    pub fn parse_blocks<'a>(&self, text: &'a str, depth: usize) -> Vec<Block<'a>> {
        let mut errors = ParseErrors::new();
        self.parse_region(text, depth, 0, &mut errors)
    }

    /// Parse one region of markup, appending diagnostics to `errors`.
    pub fn parse_blocks_with_recovery<'a>(
        &self,
        text: &'a str,
        depth: usize,
        errors: &mut ParseErrors,
    ) -> Vec<Block<'a>> {
        self.parse_region(text, depth, 0, errors)
    }

    /// `base` is the byte offset of `text` in the top-level input and is
    /// only used to place diagnostics.
    fn parse_region<'a>(
        &self,
        text: &'a str,
        depth: usize,
        base: usize,
        errors: &mut ParseErrors,
    ) -> Vec<Block<'a>> {
        if text.is_empty() {
            return Vec::new();
        }

        if depth > self.max_depth {
            tracing::debug!(depth, len = text.len(), "nesting limit reached, keeping literal text");
            errors.push(
                ParseError::depth_exceeded(self.max_depth, Some(Span::at(0, text.len())))
                    .shifted(base as u32),
            );
            return vec![Block::Text(Cow::Borrowed(text))];
        }

        let mut lexer = Lexer::new(text);
        let mut blocks = Vec::with_capacity(8);
        let mut iterations = 0usize;

        while !lexer.is_eof() {
            iterations += 1;
            if iterations > self.iteration_limit {
                let dropped = Span::at(lexer.offset(), text.len() - lexer.offset());
                tracing::warn!(
                    depth,
                    iterations = self.iteration_limit,
                    offset = base + lexer.offset(),
                    dropped = dropped.len(),
                    "markup iteration limit reached, output truncated"
                );
                errors.push(
                    ParseError::iteration_limit(self.iteration_limit, Some(dropped))
                        .shifted(base as u32),
                );
                break;
            }

            let start = lexer.offset();
            if let Some(token) = lexer.next_token() {
                blocks.push(self.token_block(token.kind, depth, base, errors));
                debug_assert!(lexer.offset() > start);
                continue;
            }

            let marker = lexer.next_marker();
            if marker > start {
                blocks.push(Block::Text(Cow::Borrowed(lexer.slice(start, marker))));
                lexer.advance(marker - start);
            } else {
                // A marker that did not form a token: keep one character
                // literally and move on.
                if let Some((tag, span)) = lexer.unclosed_tag() {
                    errors.push(
                        ParseError::unclosed_delimiter(tag, Some(span)).shifted(base as u32),
                    );
                }
                let len = lexer.current_char_len();
                blocks.push(Block::Text(Cow::Borrowed(lexer.slice(start, start + len))));
                lexer.advance(len);
            }
        }

        blocks
    }

    fn token_block<'a>(
        &self,
        kind: TokenKind<'a>,
        depth: usize,
        base: usize,
        errors: &mut ParseErrors,
    ) -> Block<'a> {
        match kind {
            TokenKind::Handwritten {
                style,
                inner,
                inner_start,
            } => Block::Handwritten {
                style,
                children: self.parse_region(inner, depth + 1, base + inner_start, errors),
            },
            TokenKind::Colored { color, content } => Block::Colored {
                content: Cow::Borrowed(content),
                color: Cow::Borrowed(color),
            },
            TokenKind::Image(path) => Block::Image(Cow::Borrowed(path)),
            TokenKind::ParagraphBreak => Block::ParagraphBreak,
            TokenKind::LineBreak => Block::LineBreak,
            TokenKind::Bold(content) => Block::Bold(Cow::Borrowed(content)),
            TokenKind::Italic(content) => Block::Italic(Cow::Borrowed(content)),
        }
    }
}

/// Parse author text into pages with the default limits.
#[inline]
pub fn parse_rich_text(input: &str) -> Vec<Page<'_>> {
    Parser::new().parse(input)
}

/// Parse one region of markup at `depth` with the default limits.
#[inline]
pub fn parse_blocks(text: &str, depth: usize) -> Vec<Block<'_>> {
    Parser::new().parse_blocks(text, depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn circuit_breaker_logs_a_warning() {
        let input = "*".repeat(40);
        let parser = Parser::new().with_iteration_limit(3);
        let mut errors = ParseErrors::new();
        let blocks = parser.parse_blocks_with_recovery(&input, 0, &mut errors);

        assert_eq!(blocks.len(), 3);
        assert!(errors.contains(ParseErrorKind::IterationLimit));
        assert!(logs_contain("markup iteration limit reached"));
    }

    #[test]
    fn zero_iteration_limit_still_makes_progress() {
        let parser = Parser::new().with_iteration_limit(0);
        assert_eq!(parser.iteration_limit(), 1);
        assert_eq!(parser.parse_blocks("abc", 0), vec![Block::Text("abc".into())]);
    }

    #[test]
    fn max_depth_is_capped() {
        let parser = Parser::new().with_max_depth(usize::MAX);
        assert_eq!(parser.max_depth(), MAX_DEPTH_LIMIT);

        let levels = MAX_DEPTH_LIMIT + 10;
        let input = format!(
            "{}x{}",
            "{{handwritten}}".repeat(levels),
            "{{/handwritten}}".repeat(levels)
        );
        let mut errors = ParseErrors::new();
        let blocks = parser.parse_blocks_with_recovery(&input, 0, &mut errors);
        assert_eq!(crate::metrics::nesting_depth(&blocks), MAX_DEPTH_LIMIT + 1);
        assert!(errors.contains(ParseErrorKind::DepthExceeded));
    }

    #[test]
    fn nested_diagnostics_are_shifted() {
        let input = "12{{handwritten}}{{color:red}}x{{/handwritten}}";
        let result = Parser::new().parse_with_recovery(input);
        let error = result.errors.iter().next().unwrap();
        assert_eq!(error.kind, ParseErrorKind::UnclosedDelimiter);
        assert_eq!(error.span.map(|s| s.slice(input)), Some("{{color:red}}"));
    }

    #[test]
    fn leading_whitespace_is_accounted_for() {
        let input = "   {{color:red}}x";
        let result = Parser::new().parse_with_recovery(input);
        let error = result.errors.iter().next().unwrap();
        assert_eq!(error.span.map(|s| s.slice(input)), Some("{{color:red}}"));
    }

    #[test]
    fn rewritten_pages_are_owned() {
        let pages = Parser::new().parse("a{{pagebreak}}b");
        assert_eq!(
            pages[0].blocks,
            vec![
                Block::Text("a".into()),
                Block::ParagraphBreak,
                Block::Text("b".into()),
            ]
        );
        assert!(matches!(pages[0].blocks[0], Block::Text(Cow::Owned(_))));
    }
}
