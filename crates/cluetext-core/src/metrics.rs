//! Length measurements over a block tree.
//!
//! All lengths are in characters (Unicode scalar values), the unit the
//! typewriter reveals in.

use crate::ast::Block;

/// Total number of visible text characters in `blocks`.
///
/// Leaf content counts; images and breaks count zero; handwritten regions
/// count their descendants.
pub fn total_text_length(blocks: &[Block<'_>]) -> usize {
    blocks.iter().map(block_text_length).sum()
}

/// Number of visible text characters in one block and its descendants.
pub fn block_text_length(block: &Block<'_>) -> usize {
    match block {
        Block::Handwritten { children, .. } => total_text_length(children),
        other => other.text().map_or(0, |text| text.chars().count()),
    }
}

/// Deepest handwritten nesting in `blocks`; zero for a flat tree.
pub fn nesting_depth(blocks: &[Block<'_>]) -> usize {
    blocks
        .iter()
        .map(|block| match block {
            Block::Handwritten { children, .. } => 1 + nesting_depth(children),
            _ => 0,
        })
        .max()
        .unwrap_or(0)
}
