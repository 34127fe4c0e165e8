//! Grapheme-aware word measurement.
//!
//! A "visual letter" is what an early reader perceives as one unit: a
//! single character, or a known multi-character grapheme such as `th` or
//! `ough`. [`visual_length`] is the canonical glyph metric used by stage
//! checks and book statistics alike.

use std::cmp::Reverse;
use std::collections::HashSet;

use aho_corasick::{AhoCorasick, MatchKind};

use crate::text;

/// Stand-in for a whole multi-character grapheme while counting.
///
/// Private-use code point; never produced by natural text.
const SENTINEL: &str = "\u{E000}";

/// Count the visual letters in `word` given the known graphemes.
///
/// Diacritics (combining marks) are stripped first. Each multi-character
/// grapheme is then collapsed to a single unit, longest first, so `ough`
/// is consumed before `ou` can match inside it. Graphemes of equal length
/// are applied in the order given.
pub fn visual_length<S: AsRef<str>>(word: &str, known_graphemes: &[S]) -> usize {
    GlyphCounter::new(known_graphemes).count(word)
}

/// [`visual_length`] with the grapheme ordering computed once.
///
/// Use this when measuring many words against the same grapheme set.
#[derive(Debug, Clone, Default)]
pub struct GlyphCounter {
    /// Multi-character graphemes, longest first.
    multi: Vec<String>,
}

impl GlyphCounter {
    /// Prepare a counter for the given known graphemes.
    pub fn new<S: AsRef<str>>(known_graphemes: &[S]) -> Self {
        let mut multi: Vec<String> = known_graphemes
            .iter()
            .map(|g| g.as_ref())
            .filter(|g| g.chars().count() > 1)
            .map(str::to_string)
            .collect();
        // Stable sort keeps the caller's order among equal lengths.
        multi.sort_by_key(|g| Reverse(g.chars().count()));
        Self { multi }
    }

    /// Count the visual letters in `word`.
    pub fn count(&self, word: &str) -> usize {
        let mut collapsed = text::strip_combining_marks(word);
        for grapheme in &self.multi {
            if collapsed.contains(grapheme.as_str()) {
                collapsed = collapsed.replace(grapheme.as_str(), SENTINEL);
            }
        }
        collapsed.chars().count()
    }
}

/// Splits words into their constituent graphemes.
///
/// Multi-character graphemes are matched leftmost-longest; every other
/// character (with any combining marks that follow it) is its own grapheme.
#[derive(Debug, Clone, Default)]
pub struct GraphemeInventory {
    matcher: Option<AhoCorasick>,
}

impl GraphemeInventory {
    /// Build an inventory from letters and multi-character graphemes.
    pub fn new<S: AsRef<str>>(graphemes: &[S]) -> Self {
        let patterns: Vec<&str> = graphemes
            .iter()
            .map(|g| g.as_ref())
            .filter(|g| g.chars().count() > 1)
            .collect();
        if patterns.is_empty() {
            return Self { matcher: None };
        }
        let matcher = AhoCorasick::builder()
            .match_kind(MatchKind::LeftmostLongest)
            .build(patterns)
            .map_err(|e| tracing::warn!(error = %e, "grapheme matcher unavailable"))
            .ok();
        Self { matcher }
    }

    /// Split `word` into graphemes.
    pub fn split(&self, word: &str) -> Vec<String> {
        let mut graphemes = Vec::new();
        let mut cursor = 0;

        if let Some(ref matcher) = self.matcher {
            for found in matcher.find_iter(word) {
                push_single_chars(&mut graphemes, &word[cursor..found.start()]);
                graphemes.push(word[found.start()..found.end()].to_string());
                cursor = found.end();
            }
        }
        push_single_chars(&mut graphemes, &word[cursor..]);
        graphemes
    }

    /// Whether `word` is non-empty and built only from `permitted` graphemes.
    pub fn is_composed_of(&self, word: &str, permitted: &HashSet<String>) -> bool {
        !word.is_empty()
            && self
                .split(word)
                .iter()
                .all(|grapheme| permitted.contains(grapheme))
    }
}

fn push_single_chars(graphemes: &mut Vec<String>, gap: &str) {
    for ch in gap.chars() {
        match graphemes.last_mut() {
            // A combining mark belongs to the grapheme before it.
            Some(last) if text::is_combining_mark(ch) => last.push(ch),
            _ => graphemes.push(ch.to_string()),
        }
    }
}
