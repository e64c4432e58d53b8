//! Progressive disclosure of a block tree.
//!
//! [`reveal`] computes what a typewriter shows once `budget` characters have
//! been typed. It is a pure function of `(blocks, budget)`: the driver can
//! call it with any budget in any order and never has state to roll back.
//!
//! Blocks fall into two groups:
//!
//! - **divisible** blocks (text, bold, italic, colored) may be cut short, so
//!   the last visible one can be a truncated copy;
//! - **atomic** blocks are shown whole or not at all. Images and breaks cost
//!   nothing and appear as soon as they are reached; a handwritten region
//!   costs its full text length and stays hidden until all of it fits.
//!
//! Raising the budget only ever appends blocks or lengthens the final
//! truncated block.

use std::borrow::Cow;

use crate::ast::{Block, CowStr};
use crate::metrics::{block_text_length, total_text_length};

/// The visible prefix of a tree at some budget.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reveal<'a> {
    /// Visible blocks; the last divisible block may be truncated.
    pub blocks: Vec<Block<'a>>,
    /// Characters of text made visible, never more than the budget.
    pub consumed: usize,
}

impl<'a> Reveal<'a> {
    /// Whether every character of a tree with `total` characters is shown.
    #[inline]
    pub fn is_complete(&self, total: usize) -> bool {
        self.consumed >= total
    }
}

/// Visible prefix of `blocks` once `budget` characters have been revealed.
///
/// A budget of zero shows nothing. Once the whole text fits, trailing
/// images and breaks are shown as well, so `reveal(blocks, total)` is the
/// full tree for any tree that has text.
pub fn reveal<'a>(blocks: &[Block<'a>], budget: usize) -> Reveal<'a> {
    let total = total_text_length(blocks);
    let mut visible = Vec::with_capacity(blocks.len());
    let mut consumed = 0usize;

    for block in blocks {
        if consumed == budget && (budget == 0 || consumed < total) {
            break;
        }

        let len = block_text_length(block);
        if block.is_atomic() {
            if consumed + len > budget {
                break;
            }
            visible.push(block.clone());
            consumed += len;
            continue;
        }

        let left = budget - consumed;
        if len <= left {
            visible.push(block.clone());
            consumed += len;
            continue;
        }
        let partial = block
            .content()
            .and_then(|content| block.with_text(truncate_chars(content, left)));
        visible.extend(partial);
        consumed = budget;
        break;
    }

    Reveal {
        blocks: visible,
        consumed,
    }
}

/// First `chars` characters of `text`, borrowing when `text` borrows.
fn truncate_chars<'a>(text: &CowStr<'a>, chars: usize) -> CowStr<'a> {
    let end = text
        .char_indices()
        .nth(chars)
        .map_or(text.len(), |(index, _)| index);
    match *text {
        Cow::Borrowed(s) => Cow::Borrowed(&s[..end]),
        Cow::Owned(ref s) => Cow::Owned(s[..end].to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::HandwritingStyle;

    fn secret() -> Block<'static> {
        Block::Handwritten {
            style: HandwritingStyle::Scrawl,
            children: vec![Block::Text("0123456789".into())],
        }
    }

    #[test]
    fn zero_budget_shows_nothing() {
        let blocks = vec![Block::Image("/a.png".into()), Block::Text("x".into())];
        assert_eq!(reveal(&blocks, 0), Reveal::default());
    }

    #[test]
    fn truncates_last_divisible_block() {
        let blocks = vec![Block::Text("Hello ".into()), Block::Bold("world".into())];
        let shown = reveal(&blocks, 8);
        assert_eq!(
            shown.blocks,
            vec![Block::Text("Hello ".into()), Block::Bold("wo".into())]
        );
        assert_eq!(shown.consumed, 8);
    }

    #[test]
    fn truncation_keeps_color() {
        let blocks = vec![Block::Colored {
            content: "scarlet".into(),
            color: "red".into(),
        }];
        assert_eq!(
            reveal(&blocks, 3).blocks,
            vec![Block::Colored {
                content: "sca".into(),
                color: "red".into(),
            }]
        );
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let blocks = vec![Block::Text("héllo".into())];
        assert_eq!(reveal(&blocks, 2).blocks, vec![Block::Text("hé".into())]);
    }

    #[test]
    fn truncating_owned_text_stays_owned() {
        let blocks = vec![Block::Text(Cow::Owned("abcdef".to_string()))];
        let shown = reveal(&blocks, 3);
        assert!(matches!(&shown.blocks[0], Block::Text(Cow::Owned(s)) if s == "abc"));
    }

    #[test]
    fn handwritten_is_all_or_nothing() {
        let blocks = vec![Block::Text("ab".into()), secret(), Block::Text("cd".into())];

        let before = reveal(&blocks, 2 + 9);
        assert_eq!(before.blocks, vec![Block::Text("ab".into())]);
        assert_eq!(before.consumed, 2);

        let after = reveal(&blocks, 2 + 10);
        assert_eq!(after.blocks, vec![Block::Text("ab".into()), secret()]);
        assert_eq!(after.consumed, 12);
    }

    #[test]
    fn breaks_appear_when_reached() {
        let blocks = vec![
            Block::Text("ab".into()),
            Block::LineBreak,
            Block::Image("/x.png".into()),
            Block::Text("cd".into()),
        ];
        assert_eq!(reveal(&blocks, 2).blocks, vec![Block::Text("ab".into())]);
        assert_eq!(
            reveal(&blocks, 3).blocks,
            vec![
                Block::Text("ab".into()),
                Block::LineBreak,
                Block::Image("/x.png".into()),
                Block::Text("c".into()),
            ]
        );
    }

    #[test]
    fn full_budget_includes_trailing_structure() {
        let blocks = vec![
            Block::Text("end".into()),
            Block::ParagraphBreak,
            Block::Image("/final.png".into()),
        ];
        let shown = reveal(&blocks, 3);
        assert_eq!(shown.blocks, blocks);
        assert!(shown.is_complete(3));
    }

    #[test]
    fn budget_beyond_total_is_capped() {
        let blocks = vec![Block::Italic("abc".into())];
        let shown = reveal(&blocks, 100);
        assert_eq!(shown.blocks, blocks);
        assert_eq!(shown.consumed, 3);
    }
}
