//! # cluetext core
//!
//! Parser and typewriter reveal engine for the small rich-text markup used
//! in puzzle-hunt riddles, success messages and puzzle prompts.
//!
//! ## Quick Start
//!
//! ```rust
//! use cluetext_core::{parse_rich_text, reveal, total_text_length, Block};
//!
//! let pages = parse_rich_text("Hello **world**!");
//! let blocks = &pages[0].blocks;
//! assert_eq!(blocks[1], Block::Bold("world".into()));
//!
//! let total = total_text_length(blocks);
//! let halfway = reveal(blocks, total / 2);
//! assert_eq!(halfway.consumed, 6);
//! ```
//!
//! ## Markup
//!
//! | Syntax | Block |
//! |---|---|
//! | `**text**` | [`Block::Bold`] |
//! | `*text*` | [`Block::Italic`] |
//! | `{{color:NAME}}text{{/color}}` | [`Block::Colored`] |
//! | `{{handwritten:STYLE}}markup{{/handwritten}}` | [`Block::Handwritten`] |
//! | `{{image:PATH}}` | [`Block::Image`] |
//! | blank line | [`Block::ParagraphBreak`] |
//! | newline | [`Block::LineBreak`] |
//!
//! Anything else, including malformed markup, is kept as literal text.
//!
//! ## Diagnostics
//!
//! Parsing never fails. [`Parser::parse_with_recovery`] additionally returns
//! diagnostics for unclosed tags, over-deep nesting and a tripped iteration
//! limit; the last one is also logged through `tracing` at `WARN`.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod metrics;
pub mod pages;
pub mod parser;
pub mod reveal;
pub mod span;
pub mod typewriter;

pub use ast::{Block, HandwritingStyle, Page};
pub use error::{ParseError, ParseErrorKind, ParseErrors};
pub use metrics::total_text_length;
pub use parser::{parse_blocks, parse_rich_text, ParseResult, Parser};
pub use reveal::{reveal, Reveal};
pub use typewriter::{Typewriter, TypewriterConfig};
