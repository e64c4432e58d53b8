//! Page splitting.
//!
//! Content used to be authored as several pages separated by
//! `{{pagebreak}}`. Pages are now always merged into one: each separator
//! becomes a paragraph break. The list-of-pages shape is kept so existing
//! callers keep working.

use std::borrow::Cow;

/// Legacy marker between pages.
pub const PAGE_SEPARATOR: &str = "{{pagebreak}}";

/// Split author text into page texts.
///
/// Returns no pages for blank input and exactly one page otherwise. The
/// page borrows from `input` unless a separator had to be rewritten.
pub fn split_pages(input: &str) -> Vec<Cow<'_, str>> {
    let page = if input.contains(PAGE_SEPARATOR) {
        let merged = input.replace(PAGE_SEPARATOR, "\n\n");
        Cow::Owned(merged.trim().to_string())
    } else {
        Cow::Borrowed(input.trim())
    };

    if page.is_empty() {
        Vec::new()
    } else {
        vec![page]
    }
}
