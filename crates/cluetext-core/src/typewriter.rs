//! Typewriter driver for the reveal engine.
//!
//! The driver only keeps the current budget. Each frame is recomputed from
//! `(blocks, budget)` with [`reveal`], so stopping the driver at any tick
//! needs no cleanup. It never sleeps itself: callers wait
//! [`Typewriter::delay`] between ticks on whatever clock they use.

use std::time::Duration;

use crate::ast::Block;
use crate::metrics::total_text_length;
use crate::reveal::{reveal, Reveal};

/// Timing and mode of a typewriter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypewriterConfig {
    /// Pause between ticks.
    pub delay: Duration,
    /// Characters revealed per tick.
    pub chars_per_tick: usize,
    /// Start fully revealed.
    pub instant: bool,
}

impl Default for TypewriterConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(30),
            chars_per_tick: 1,
            instant: false,
        }
    }
}

impl TypewriterConfig {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Characters per tick; zero is raised to one.
    pub fn with_chars_per_tick(mut self, chars: usize) -> Self {
        self.chars_per_tick = chars.max(1);
        self
    }

    pub fn with_instant(mut self, instant: bool) -> Self {
        self.instant = instant;
        self
    }
}

/// Drives a reveal budget over a borrowed tree.
///
/// ```rust
/// use cluetext_core::{parse_blocks, Typewriter, TypewriterConfig};
///
/// let blocks = parse_blocks("Dig **here**", 0);
/// let mut typewriter = Typewriter::new(&blocks, TypewriterConfig::default());
/// let first = typewriter.tick();
/// assert_eq!(first.consumed, 1);
/// assert_eq!(typewriter.count(), 7);
/// ```
#[derive(Debug, Clone)]
pub struct Typewriter<'t, 'a> {
    blocks: &'t [Block<'a>],
    config: TypewriterConfig,
    budget: usize,
    total: usize,
}

impl<'t, 'a> Typewriter<'t, 'a> {
    /// Start a typewriter at budget zero, or complete when `instant`.
    pub fn new(blocks: &'t [Block<'a>], config: TypewriterConfig) -> Self {
        let total = total_text_length(blocks);
        let config = TypewriterConfig {
            chars_per_tick: config.chars_per_tick.max(1),
            ..config
        };
        Self {
            blocks,
            config,
            budget: if config.instant { total } else { 0 },
            total,
        }
    }

    /// Replace the tree and restart.
    ///
    /// The old budget is discarded; the new tree starts at zero, or
    /// complete when the typewriter is `instant`.
    pub fn reset(&mut self, blocks: &'t [Block<'a>]) {
        self.blocks = blocks;
        self.total = total_text_length(blocks);
        self.budget = if self.config.instant { self.total } else { 0 };
    }

    #[inline]
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Total characters in the tree.
    #[inline]
    pub fn total(&self) -> usize {
        self.total
    }

    #[inline]
    pub fn delay(&self) -> Duration {
        self.config.delay
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.budget >= self.total
    }

    /// Advance one tick and return the new frame.
    pub fn tick(&mut self) -> Reveal<'a> {
        self.budget = (self.budget + self.config.chars_per_tick).min(self.total);
        tracing::trace!(budget = self.budget, total = self.total, "typewriter tick");
        self.current()
    }

    /// Jump straight to the complete frame.
    pub fn skip(&mut self) -> Reveal<'a> {
        self.budget = self.total;
        self.current()
    }

    /// Frame at the current budget.
    ///
    /// A complete typewriter always shows the whole tree, including trees
    /// that contain no text at all.
    pub fn current(&self) -> Reveal<'a> {
        if self.is_complete() {
            return Reveal {
                blocks: self.blocks.to_vec(),
                consumed: self.total,
            };
        }
        reveal(self.blocks, self.budget)
    }
}

/// Yields one frame per tick until the tree is fully revealed.
impl<'t, 'a> Iterator for Typewriter<'t, 'a> {
    type Item = Reveal<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_complete() {
            return None;
        }
        Some(self.tick())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.total - self.budget).div_ceil(self.config.chars_per_tick);
        (left, Some(left))
    }
}

impl<'t, 'a> ExactSizeIterator for Typewriter<'t, 'a> {}
