//! Integration tests for progressive disclosure

use cluetext_core::{
    parse_blocks, reveal, total_text_length, Block, HandwritingStyle, Typewriter, TypewriterConfig,
};

const RIDDLE: &str = "I have **keys** but no locks.\n\n{{handwritten:scrawl}}Look *inside*{{/handwritten}}\n{{image:/hunts/7/piano.png}}\n{{color:gold}}Hurry!{{/color}}";

// ============================================================================
// Metrics
// ============================================================================

#[test]
fn test_total_length_of_parsed_riddle() {
    let blocks = parse_blocks(RIDDLE, 0);
    // "I have " + "keys" + " but no locks." + "Look " + "inside" + "Hurry!"
    assert_eq!(total_text_length(&blocks), 7 + 4 + 14 + 5 + 6 + 6);
}

// ============================================================================
// Boundaries
// ============================================================================

#[test]
fn test_zero_budget_is_empty() {
    let blocks = parse_blocks(RIDDLE, 0);
    let shown = reveal(&blocks, 0);
    assert!(shown.blocks.is_empty());
    assert_eq!(shown.consumed, 0);
}

#[test]
fn test_total_budget_is_full_tree() {
    let blocks = parse_blocks(RIDDLE, 0);
    let total = total_text_length(&blocks);
    let shown = reveal(&blocks, total);
    assert_eq!(shown.blocks, blocks);
    assert_eq!(shown.consumed, total);
    assert!(shown.is_complete(total));
}

#[test]
fn test_first_character() {
    let blocks = parse_blocks(RIDDLE, 0);
    assert_eq!(reveal(&blocks, 1).blocks, vec![Block::Text("I".into())]);
}

// ============================================================================
// Atomic Handwriting
// ============================================================================

#[test]
fn test_handwritten_block_of_ten_is_atomic() {
    let blocks = parse_blocks("ab{{handwritten}}0123456789{{/handwritten}}", 0);
    let start = 2;

    let partial = reveal(&blocks, start + 9);
    assert!(!partial
        .blocks
        .iter()
        .any(|b| matches!(b, Block::Handwritten { .. })));

    let whole = reveal(&blocks, start + 10);
    assert_eq!(
        whole.blocks.last(),
        Some(&Block::Handwritten {
            style: HandwritingStyle::Default,
            children: vec![Block::Text("0123456789".into())],
        })
    );
}

#[test]
fn test_handwriting_blocks_following_text() {
    let blocks = parse_blocks("{{handwritten}}abc{{/handwritten}}def", 0);
    let shown = reveal(&blocks, 2);
    assert!(shown.blocks.is_empty());
    assert_eq!(shown.consumed, 0);
}

// ============================================================================
// Growth
// ============================================================================

#[test]
fn test_every_budget_extends_the_previous() {
    let blocks = parse_blocks(RIDDLE, 0);
    let total = total_text_length(&blocks);
    let mut previous = reveal(&blocks, 0);

    for budget in 1..=total + 2 {
        let next = reveal(&blocks, budget);
        assert!(next.consumed >= previous.consumed, "budget {}", budget);
        assert!(next.consumed <= budget);

        let keep = previous.blocks.len().saturating_sub(1);
        assert_eq!(previous.blocks[..keep], next.blocks[..keep], "budget {}", budget);
        if let Some(last) = previous.blocks.last() {
            let grown = &next.blocks[keep];
            assert_eq!(last.kind(), grown.kind());
            assert!(grown.plain_text().starts_with(&last.plain_text()));
        }
        previous = next;
    }
}

// ============================================================================
// Typewriter
// ============================================================================

#[test]
fn test_typewriter_matches_reveal() {
    let blocks = parse_blocks(RIDDLE, 0);
    let total = total_text_length(&blocks);
    let typewriter = Typewriter::new(&blocks, TypewriterConfig::default());

    for (tick, frame) in typewriter.enumerate() {
        let budget = tick + 1;
        if budget < total {
            assert_eq!(frame, reveal(&blocks, budget));
        } else {
            assert_eq!(frame.blocks, blocks);
        }
    }
}

#[test]
fn test_typewriter_restarts_on_new_input() {
    let old = parse_blocks("old clue", 0);
    let new = parse_blocks("**new** clue", 0);
    let mut typewriter = Typewriter::new(&old, TypewriterConfig::default());
    typewriter.nth(4);
    assert_eq!(typewriter.budget(), 5);

    typewriter.reset(&new);
    assert_eq!(typewriter.budget(), 0);
    assert_eq!(typewriter.tick().blocks, vec![Block::Bold("n".into())]);
}
