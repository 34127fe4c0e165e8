//! Word and letter ordering for display.

use std::cmp::Ordering;
use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::decodability::WordEntry;
use crate::text;

/// How stage word lists are ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum SortMode {
    /// Lexical order, ignoring case and diacritics first.
    #[default]
    Alphabetic,
    /// Shortest first, ties alphabetical.
    #[serde(rename = "length")]
    #[cfg_attr(feature = "clap", value(name = "length"))]
    ByLength,
    /// Most frequent first, ties alphabetical.
    #[serde(rename = "frequency")]
    #[cfg_attr(feature = "clap", value(name = "frequency"))]
    ByFrequency,
}

impl SortMode {
    /// Returns the mode as a lowercase string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Alphabetic => "alphabetic",
            Self::ByLength => "length",
            Self::ByFrequency => "frequency",
        }
    }
}

impl std::fmt::Display for SortMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compare two words the way a reader expects to find them in a list.
///
/// Words are compared first by a folded key (combining marks removed,
/// lower-cased) so `Apple`, `apple` and `ápple` sort together, then by
/// their exact text so the order is total.
pub fn alphabetic_cmp(a: &str, b: &str) -> Ordering {
    fold(a).cmp(&fold(b)).then_with(|| a.cmp(b))
}

fn fold(word: &str) -> String {
    text::strip_combining_marks(word).to_lowercase()
}

/// Sort word entries in place.
pub fn sort_words(words: &mut [WordEntry], mode: SortMode) {
    match mode {
        SortMode::Alphabetic => words.sort_by(|a, b| alphabetic_cmp(&a.name, &b.name)),
        SortMode::ByLength => words.sort_by(|a, b| {
            a.name
                .chars()
                .count()
                .cmp(&b.name.chars().count())
                .then_with(|| alphabetic_cmp(&a.name, &b.name))
        }),
        SortMode::ByFrequency => words.sort_by(|a, b| {
            b.frequency
                .cmp(&a.frequency)
                .then_with(|| alphabetic_cmp(&a.name, &b.name))
        }),
    }
}

/// Order letters by their position in `alphabet`.
///
/// Letters missing from the alphabet follow, in their original order.
pub fn order_by_alphabet<S: AsRef<str>>(letters: &mut [String], alphabet: &[S]) {
    let positions: HashMap<&str, usize> = alphabet
        .iter()
        .enumerate()
        .map(|(i, letter)| (letter.as_ref(), i))
        .collect();
    letters.sort_by_key(|letter| positions.get(letter.as_str()).copied().unwrap_or(usize::MAX));
}
