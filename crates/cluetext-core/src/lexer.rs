//! Cursor-based token matcher.
//!
//! The lexer recognizes one markup token at the cursor, trying each kind in
//! a fixed priority order:
//!
//! 1. `{{handwritten}}...{{/handwritten}}` / `{{handwritten:STYLE}}...`
//! 2. `{{color:NAME}}...{{/color}}`
//! 3. `{{image:PATH}}`
//! 4. `\n\n` paragraph break
//! 5. `\n` line break
//! 6. `**bold**`
//! 7. `*italic*`
//!
//! Every token it returns is at least one byte long, so a caller that
//! advances by the token length always makes progress. Marker scanning uses
//! `memchr` (SIMD on supported platforms).

use memchr::{memchr, memchr3, memmem};

use crate::ast::HandwritingStyle;
use crate::span::Span;

const HANDWRITTEN_OPEN: &str = "{{handwritten";
const HANDWRITTEN_CLOSE: &str = "{{/handwritten}}";
const COLOR_OPEN: &str = "{{color:";
const COLOR_CLOSE: &str = "{{/color}}";
const IMAGE_OPEN: &str = "{{image:";
const TAG_END: &str = "}}";

/// Semantic payload of a recognized token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind<'a> {
    /// Handwritten region. `inner` is raw markup still to be parsed;
    /// `inner_start` is its byte offset in the lexer input.
    Handwritten {
        style: HandwritingStyle,
        inner: &'a str,
        inner_start: usize,
    },
    /// Colored span, both fields already trimmed.
    Colored { color: &'a str, content: &'a str },
    /// Image reference, trimmed.
    Image(&'a str),
    ParagraphBreak,
    LineBreak,
    /// Bold span content (never re-parsed).
    Bold(&'a str),
    /// Italic span content (never re-parsed).
    Italic(&'a str),
}

/// A token together with the input it covers, delimiters included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind<'a>,
    pub span: Span,
}

impl<'a> Token<'a> {
    /// Number of input bytes the token consumes.
    #[inline]
    pub fn len(&self) -> usize {
        self.span.len() as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.span.is_empty()
    }
}

/// Markup tokenizer with a byte cursor.
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    offset: usize,
    /// Start of the last `{{/handwritten}}` in the input.
    last_handwritten_close: Option<usize>,
    /// Start of the last `{{/color}}` in the input.
    last_color_close: Option<usize>,
}

impl<'a> Lexer<'a> {
    #[inline]
    pub fn new(input: &'a str) -> Self {
        let bytes = input.as_bytes();
        Self {
            input,
            bytes,
            offset: 0,
            last_handwritten_close: memmem::rfind(bytes, HANDWRITTEN_CLOSE.as_bytes()),
            last_color_close: memmem::rfind(bytes, COLOR_CLOSE.as_bytes()),
        }
    }

    /// Current byte offset.
    #[inline(always)]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline(always)]
    pub fn is_eof(&self) -> bool {
        self.offset >= self.bytes.len()
    }

    /// Unconsumed input.
    #[inline(always)]
    pub fn remaining(&self) -> &'a str {
        &self.input[self.offset..]
    }

    /// Slice of the input between two byte offsets.
    #[inline(always)]
    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.input[start..end]
    }

    /// Move the cursor forward by `len` bytes, clamped to the input end.
    #[inline]
    pub fn advance(&mut self, len: usize) {
        self.offset = (self.offset + len).min(self.bytes.len());
    }

    /// Byte length of the character at the cursor (0 at end of input).
    #[inline]
    pub fn current_char_len(&self) -> usize {
        self.remaining().chars().next().map_or(0, char::len_utf8)
    }

    /// Recognize a token at the cursor without consuming it.
    pub fn peek_token(&self) -> Option<Token<'a>> {
        let rest = self.remaining();
        let (kind, len) = match self.bytes.get(self.offset).copied()? {
            b'{' => {
                let after = self.offset + 1;
                closes_after(self.last_handwritten_close, after)
                    .then(|| match_handwritten(rest, self.offset))
                    .flatten()
                    .or_else(|| {
                        closes_after(self.last_color_close, after)
                            .then(|| match_colored(rest))
                            .flatten()
                    })
                    .or_else(|| match_image(rest))?
            }
            b'\n' if rest.starts_with("\n\n") => (TokenKind::ParagraphBreak, 2),
            b'\n' => (TokenKind::LineBreak, 1),
            b'*' => match_bold(rest).or_else(|| match_italic(rest))?,
            _ => return None,
        };
        Some(Token {
            kind,
            span: Span::at(self.offset, len),
        })
    }

    /// Recognize and consume a token at the cursor.
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        let token = self.peek_token()?;
        self.advance(token.len());
        Some(token)
    }

    /// Earliest offset at or after the cursor where a token could begin:
    /// `{{`, `*`, or `\n`. Returns the input length if there is none.
    pub fn next_marker(&self) -> usize {
        let mut from = self.offset;
        while let Some(found) = memchr3(b'{', b'*', b'\n', &self.bytes[from..]) {
            let at = from + found;
            if self.bytes[at] != b'{' || self.bytes.get(at + 1) == Some(&b'{') {
                return at;
            }
            from = at + 1;
        }
        self.bytes.len()
    }

    /// Name of a well-formed opening tag at the cursor that has no closing
    /// tag, together with the span of the opening tag.
    pub fn unclosed_tag(&self) -> Option<(&'static str, Span)> {
        let rest = self.remaining();
        if let Some((_, header)) = handwritten_header(rest) {
            if !closes_after(self.last_handwritten_close, self.offset + header) {
                return Some(("{{handwritten}}", Span::at(self.offset, header)));
            }
        } else if let Some((_, header)) = tag_argument(rest, COLOR_OPEN) {
            if !closes_after(self.last_color_close, self.offset + header) {
                return Some(("{{color}}", Span::at(self.offset, header)));
            }
        }
        None
    }
}

/// Whether a closing tag whose last occurrence starts at `last` can still
/// appear at or after `from`.
#[inline(always)]
fn closes_after(last: Option<usize>, from: usize) -> bool {
    last.is_some_and(|close| close >= from)
}

/// Parse `{{handwritten}}` or `{{handwritten:STYLE}}` at the start of
/// `rest`, returning the style and the header length.
fn handwritten_header(rest: &str) -> Option<(HandwritingStyle, usize)> {
    let after = rest.strip_prefix(HANDWRITTEN_OPEN)?;
    if after.starts_with(TAG_END) {
        return Some((HandwritingStyle::Default, HANDWRITTEN_OPEN.len() + TAG_END.len()));
    }
    let named = after.strip_prefix(':')?;
    let name_len = named
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    if name_len == 0 || !named[name_len..].starts_with(TAG_END) {
        return None;
    }
    let style = HandwritingStyle::from_name(&named[..name_len]);
    Some((style, HANDWRITTEN_OPEN.len() + 1 + name_len + TAG_END.len()))
}

/// Parse `{{PREFIX ARG}}` at the start of `rest`, returning the raw argument
/// and the header length. The argument may not span lines or contain braces.
fn tag_argument<'a>(rest: &'a str, prefix: &str) -> Option<(&'a str, usize)> {
    let after = rest.strip_prefix(prefix)?;
    let end = memchr3(b'{', b'}', b'\n', after.as_bytes())?;
    if !after[end..].starts_with(TAG_END) {
        return None;
    }
    let arg = &after[..end];
    if arg.trim().is_empty() {
        return None;
    }
    Some((arg, prefix.len() + end + TAG_END.len()))
}

/// Offset of the `{{/handwritten}}` that closes a region whose body starts
/// at the beginning of `body`.
///
/// Nested openings are balanced against closings in one forward pass. If
/// the body never balances, the first closing tag wins.
fn find_handwritten_close(body: &str) -> Option<usize> {
    let bytes = body.as_bytes();
    let mut open = 1usize;
    let mut first_close = None;
    let mut from = 0;
    while let Some(found) = memchr(b'{', &bytes[from..]) {
        let at = from + found;
        let rest = &body[at..];
        if rest.starts_with(HANDWRITTEN_CLOSE) {
            first_close.get_or_insert(at);
            open -= 1;
            if open == 0 {
                return Some(at);
            }
            from = at + HANDWRITTEN_CLOSE.len();
        } else if let Some((_, header)) = handwritten_header(rest) {
            open += 1;
            from = at + header;
        } else {
            from = at + 1;
        }
    }
    first_close
}

fn match_handwritten(rest: &str, offset: usize) -> Option<(TokenKind<'_>, usize)> {
    let (style, header) = handwritten_header(rest)?;
    let close = header + find_handwritten_close(&rest[header..])?;
    Some((
        TokenKind::Handwritten {
            style,
            inner: &rest[header..close],
            inner_start: offset + header,
        },
        close + HANDWRITTEN_CLOSE.len(),
    ))
}

fn match_colored(rest: &str) -> Option<(TokenKind<'_>, usize)> {
    let (color, header) = tag_argument(rest, COLOR_OPEN)?;
    let close = header + memmem::find(rest[header..].as_bytes(), COLOR_CLOSE.as_bytes())?;
    Some((
        TokenKind::Colored {
            color: color.trim(),
            content: rest[header..close].trim(),
        },
        close + COLOR_CLOSE.len(),
    ))
}

fn match_image(rest: &str) -> Option<(TokenKind<'_>, usize)> {
    let (path, header) = tag_argument(rest, IMAGE_OPEN)?;
    Some((TokenKind::Image(path.trim()), header))
}

/// End of the current line within `rest`, searching from `from`.
#[inline]
fn line_end(rest: &[u8], from: usize) -> usize {
    memchr(b'\n', &rest[from..]).map_or(rest.len(), |pos| from + pos)
}

fn match_bold(rest: &str) -> Option<(TokenKind<'_>, usize)> {
    let bytes = rest.as_bytes();
    if !rest.starts_with("**") || bytes.len() < 3 || bytes[2] == b'\n' {
        return None;
    }
    // Content is at least one character, so the closing `**` cannot begin
    // before the byte after the opening delimiter's first content byte.
    let limit = line_end(bytes, 2);
    let close = 3 + memmem::find(&bytes[3..limit], b"**")?;
    Some((TokenKind::Bold(&rest[2..close]), close + 2))
}

fn match_italic(rest: &str) -> Option<(TokenKind<'_>, usize)> {
    let bytes = rest.as_bytes();
    if !rest.starts_with('*') || bytes.len() < 2 || bytes[1] == b'\n' {
        return None;
    }
    let limit = line_end(bytes, 1);
    let close = 2 + memchr(b'*', &bytes[2..limit])?;
    Some((TokenKind::Italic(&rest[1..close]), close + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(input: &str) -> Option<TokenKind<'_>> {
        Lexer::new(input).peek_token().map(|t| t.kind)
    }

    fn len(input: &str) -> usize {
        Lexer::new(input).peek_token().map_or(0, |t| t.len())
    }

    #[test]
    fn handwritten_default_and_styled() {
        assert_eq!(
            kind("{{handwritten}}hi{{/handwritten}} tail"),
            Some(TokenKind::Handwritten {
                style: HandwritingStyle::Default,
                inner: "hi",
                inner_start: 15,
            })
        );
        assert_eq!(len("{{handwritten}}hi{{/handwritten}} tail"), 33);

        assert_eq!(
            kind("{{handwritten:graffiti}}x{{/handwritten}}"),
            Some(TokenKind::Handwritten {
                style: HandwritingStyle::Graffiti,
                inner: "x",
                inner_start: 24,
            })
        );
    }

    #[test]
    fn handwritten_requires_alphanumeric_style() {
        assert_eq!(kind("{{handwritten:}}x{{/handwritten}}"), None);
        assert_eq!(kind("{{handwritten:a-b}}x{{/handwritten}}"), None);
    }

    #[test]
    fn handwritten_balances_nested_regions() {
        let input = "{{handwritten}}a{{handwritten}}b{{/handwritten}}c{{/handwritten}}";
        match kind(input) {
            Some(TokenKind::Handwritten { inner, .. }) => {
                assert_eq!(inner, "a{{handwritten}}b{{/handwritten}}c")
            }
            other => panic!("expected handwritten, got {:?}", other),
        }
        assert_eq!(len(input), input.len());
    }

    #[test]
    fn handwritten_unbalanced_takes_first_close() {
        let input = "{{handwritten}}a{{handwritten}}b{{/handwritten}}c";
        match kind(input) {
            Some(TokenKind::Handwritten { inner, .. }) => assert_eq!(inner, "a{{handwritten}}b"),
            other => panic!("expected handwritten, got {:?}", other),
        }
    }

    #[test]
    fn handwritten_balance_ignores_invalid_headers() {
        let input = "{{handwritten}}a{{handwritten:}}b{{/handwritten}}c{{/handwritten}}";
        match kind(input) {
            Some(TokenKind::Handwritten { inner, .. }) => assert_eq!(inner, "a{{handwritten:}}b"),
            other => panic!("expected handwritten, got {:?}", other),
        }
    }

    #[test]
    fn close_before_cursor_does_not_count() {
        let mut lexer = Lexer::new("{{/color}}{{color:red}}x");
        lexer.advance(COLOR_CLOSE.len());
        assert_eq!(lexer.peek_token(), None);
        assert_eq!(lexer.unclosed_tag().map(|t| t.0), Some("{{color}}"));
    }

    #[test]
    fn tag_argument_stops_at_first_brace() {
        assert_eq!(tag_argument("{{image:a}b}}", IMAGE_OPEN), None);
        assert_eq!(tag_argument("{{image:a\n}}", IMAGE_OPEN), None);
        assert_eq!(tag_argument("{{image: a }}rest", IMAGE_OPEN), Some((" a ", 13)));
    }

    #[test]
    fn colored_trims_name_and_content() {
        assert_eq!(
            kind("{{color: red }}  blood moon {{/color}}!"),
            Some(TokenKind::Colored {
                color: "red",
                content: "blood moon",
            })
        );
        assert_eq!(len("{{color:red}}x{{/color}}!"), 24);
    }

    #[test]
    fn colored_without_close_is_not_a_token() {
        assert_eq!(kind("{{color:red}}never closed"), None);
    }

    #[test]
    fn image_path() {
        assert_eq!(
            kind("{{image: /maps/park.png }}after"),
            Some(TokenKind::Image("/maps/park.png"))
        );
        assert_eq!(kind("{{image:}}"), None);
    }

    #[test]
    fn breaks() {
        assert_eq!(kind("\n\nx"), Some(TokenKind::ParagraphBreak));
        assert_eq!(len("\n\n\n"), 2);
        assert_eq!(kind("\nx"), Some(TokenKind::LineBreak));
    }

    #[test]
    fn bold_is_lazy_and_non_empty() {
        assert_eq!(kind("**a** and **b**"), Some(TokenKind::Bold("a")));
        assert_eq!(kind("***a**"), Some(TokenKind::Bold("*a")));
        assert_eq!(kind("****"), Some(TokenKind::Italic("*")));
    }

    #[test]
    fn italic_after_bold_fails() {
        assert_eq!(kind("*a**b*"), Some(TokenKind::Italic("a")));
        assert_eq!(kind("**a*"), Some(TokenKind::Italic("*a")));
        assert_eq!(kind("*lonely"), None);
        assert_eq!(kind("**"), None);
    }

    #[test]
    fn emphasis_stops_at_newline() {
        assert_eq!(kind("**a\nb**"), None);
        assert_eq!(kind("*a\nb*"), None);
    }

    #[test]
    fn unknown_brace_tag_is_not_a_token() {
        assert_eq!(kind("{{pagebreak}}"), None);
        assert_eq!(kind("{{handwritten"), None);
    }

    #[test]
    fn next_marker_skips_single_brace() {
        let mut lexer = Lexer::new("a{b}c*d");
        assert_eq!(lexer.next_marker(), 5);
        lexer.advance(6);
        assert_eq!(lexer.next_marker(), 7);

        assert_eq!(Lexer::new("x{{y").next_marker(), 1);
        assert_eq!(Lexer::new("x\ny").next_marker(), 1);
    }

    #[test]
    fn next_token_advances() {
        let mut lexer = Lexer::new("**b**\n");
        assert_eq!(lexer.next_token().map(|t| t.kind), Some(TokenKind::Bold("b")));
        assert_eq!(lexer.offset(), 5);
        assert_eq!(lexer.next_token().map(|t| t.kind), Some(TokenKind::LineBreak));
        assert!(lexer.is_eof());
        assert_eq!(lexer.next_token(), None);
    }

    #[test]
    fn unclosed_tags_are_reported() {
        let lexer = Lexer::new("{{handwritten:scrawl}}no close");
        assert_eq!(
            lexer.unclosed_tag(),
            Some(("{{handwritten}}", Span::new(0, 22)))
        );
        assert_eq!(Lexer::new("{{color:red}}x").unclosed_tag().map(|t| t.0), Some("{{color}}"));
        assert_eq!(Lexer::new("{{image:x}}").unclosed_tag(), None);
    }

    #[test]
    fn multibyte_emphasis() {
        assert_eq!(kind("*é*"), Some(TokenKind::Italic("é")));
        assert_eq!(kind("**日本**"), Some(TokenKind::Bold("日本")));
    }
}
