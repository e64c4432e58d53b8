//! Block tree produced by the parser.
//!
//! The tree is flat: only [`Block::Handwritten`] has children,
//! every other variant is a leaf. Leaf content borrows from the input via
//! [`CowStr`] whenever possible, so parsing a riddle does not copy it.

use std::borrow::Cow;

/// Borrowed or owned string type for zero-copy parsing.
pub type CowStr<'a> = Cow<'a, str>;

/// Lettering style of a handwritten region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HandwritingStyle {
    /// Neutral handwriting.
    #[default]
    Default,
    /// Hurried, messy note.
    Scrawl,
    /// Calligraphic script.
    Elegant,
    /// Spray-painted lettering.
    Graffiti,
}

impl HandwritingStyle {
    /// All styles, in declaration order.
    pub const ALL: [HandwritingStyle; 4] = [
        HandwritingStyle::Default,
        HandwritingStyle::Scrawl,
        HandwritingStyle::Elegant,
        HandwritingStyle::Graffiti,
    ];

    /// Resolve a style name from markup.
    ///
    /// Names are matched case-insensitively. Unknown names resolve to
    /// [`HandwritingStyle::Default`] rather than rejecting the span.
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|style| style.as_str().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }

    /// The name used in markup (`{{handwritten:NAME}}`).
    pub const fn as_str(self) -> &'static str {
        match self {
            HandwritingStyle::Default => "default",
            HandwritingStyle::Scrawl => "scrawl",
            HandwritingStyle::Elegant => "elegant",
            HandwritingStyle::Graffiti => "graffiti",
        }
    }
}

/// One node of a parsed markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block<'a> {
    /// Plain run of characters.
    Text(CowStr<'a>),
    /// `**bold**` span.
    Bold(CowStr<'a>),
    /// `*italic*` span.
    Italic(CowStr<'a>),
    /// `{{color:NAME}}...{{/color}}` span.
    Colored {
        content: CowStr<'a>,
        color: CowStr<'a>,
    },
    /// `{{handwritten:STYLE}}...{{/handwritten}}` region. Its inner markup
    /// is parsed recursively into `children`.
    Handwritten {
        style: HandwritingStyle,
        children: Vec<Block<'a>>,
    },
    /// `{{image:PATH}}` reference.
    Image(CowStr<'a>),
    /// Single newline.
    LineBreak,
    /// Blank line between paragraphs.
    ParagraphBreak,
}

impl<'a> Block<'a> {
    /// Text of a leaf block, `None` for structural blocks.
    ///
    /// Image paths are not text: they never count toward reveal length.
    pub fn text(&self) -> Option<&str> {
        self.content().map(|content| content.as_ref())
    }

    /// Content of a divisible block, `None` for atomic ones.
    pub(crate) fn content(&self) -> Option<&CowStr<'a>> {
        match self {
            Block::Text(s) | Block::Bold(s) | Block::Italic(s) => Some(s),
            Block::Colored { content, .. } => Some(content),
            Block::Handwritten { .. }
            | Block::Image(_)
            | Block::LineBreak
            | Block::ParagraphBreak => None,
        }
    }

    /// Whether the reveal engine must show this block whole or not at all.
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            Block::Handwritten { .. } | Block::Image(_) | Block::LineBreak | Block::ParagraphBreak
        )
    }

    /// Stable lowercase name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Block::Text(_) => "text",
            Block::Bold(_) => "bold",
            Block::Italic(_) => "italic",
            Block::Colored { .. } => "colored",
            Block::Handwritten { .. } => "handwritten",
            Block::Image(_) => "image",
            Block::LineBreak => "line_break",
            Block::ParagraphBreak => "paragraph_break",
        }
    }

    /// Concatenated leaf text of this block and its descendants.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        self.push_plain_text(&mut out);
        out
    }

    fn push_plain_text(&self, out: &mut String) {
        match self {
            Block::Handwritten { children, .. } => {
                for child in children {
                    child.push_plain_text(out);
                }
            }
            other => {
                if let Some(text) = other.text() {
                    out.push_str(text);
                }
            }
        }
    }

    /// Detach this block from the input it borrows from.
    pub fn into_owned(self) -> Block<'static> {
        match self {
            Block::Text(s) => Block::Text(Cow::Owned(s.into_owned())),
            Block::Bold(s) => Block::Bold(Cow::Owned(s.into_owned())),
            Block::Italic(s) => Block::Italic(Cow::Owned(s.into_owned())),
            Block::Colored { content, color } => Block::Colored {
                content: Cow::Owned(content.into_owned()),
                color: Cow::Owned(color.into_owned()),
            },
            Block::Handwritten { style, children } => Block::Handwritten {
                style,
                children: children.into_iter().map(Block::into_owned).collect(),
            },
            Block::Image(s) => Block::Image(Cow::Owned(s.into_owned())),
            Block::LineBreak => Block::LineBreak,
            Block::ParagraphBreak => Block::ParagraphBreak,
        }
    }

    /// Copy of a divisible block with its content replaced.
    ///
    /// Returns `None` for atomic blocks, which have no content to replace.
    pub(crate) fn with_text(&self, text: CowStr<'a>) -> Option<Block<'a>> {
        match self {
            Block::Text(_) => Some(Block::Text(text)),
            Block::Bold(_) => Some(Block::Bold(text)),
            Block::Italic(_) => Some(Block::Italic(text)),
            Block::Colored { color, .. } => Some(Block::Colored {
                content: text,
                color: color.clone(),
            }),
            _ => None,
        }
    }
}

/// One page of parsed content.
///
/// Input always produces at most one page today; the type is kept so
/// callers can keep iterating pages.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page<'a> {
    /// Blocks in reading order.
    pub blocks: Vec<Block<'a>>,
}

impl<'a> Page<'a> {
    pub fn new(blocks: Vec<Block<'a>>) -> Self {
        Self { blocks }
    }

    /// Detach this page from the input it borrows from.
    pub fn into_owned(self) -> Page<'static> {
        Page {
            blocks: self.blocks.into_iter().map(Block::into_owned).collect(),
        }
    }
}
