//! Text processing utilities.
//!
//! Provides word extraction, sentence splitting, and diacritic stripping
//! shared by the corpus, the statistics engine, and page markup.

use regex::Regex;
use std::sync::LazyLock;

/// A run of letters (with their combining marks), allowing inner apostrophes.
static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{M}]+(?:['\u{2019}][\p{L}\p{M}]+)*").expect("valid regex")
});

/// Any Unicode combining mark (Mn, Mc, Me).
static COMBINING_MARK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{M}").expect("valid regex"));

/// Characters that always close a sentence.
const TERMINATORS: &[char] = &['.', '!', '?', '\u{2026}'];

/// Characters that may trail a terminator and still belong to the sentence.
const CLOSERS: &[char] = &['"', '\'', ')', ']', '\u{201D}', '\u{2019}', '\u{00BB}'];

/// Extract words from text, splitting on every non-letter boundary.
///
/// Case is preserved; callers that count words lower-case them.
/// Digits, punctuation and symbols never appear in the output.
pub fn split_words(text: &str) -> Vec<String> {
    WORD_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Remove every combining mark (diacritic) from `word`.
pub fn strip_combining_marks(word: &str) -> String {
    COMBINING_MARK.replace_all(word, "").into_owned()
}

/// Whether `ch` is a combining mark.
pub fn is_combining_mark(ch: char) -> bool {
    let mut buf = [0u8; 4];
    COMBINING_MARK.is_match(ch.encode_utf8(&mut buf))
}

/// A sentence fragment with its words already extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// The fragment text, trimmed.
    pub text: String,
    /// Words found in the fragment, in order.
    pub words: Vec<String>,
}

/// Split text into sentence fragments.
///
/// A fragment ends after `.`, `!`, `?`, `…`, or any character in
/// `extra_punctuation`, together with any run of terminators and closing
/// quotes that immediately follow. A period between two digits (`3.5`)
/// never ends a fragment. Text after the last terminator forms a final
/// fragment. Fragments that are blank after trimming are dropped, but
/// fragments with no words (e.g. `"...!"`) are kept so callers can see them.
#[tracing::instrument(skip_all, fields(text_len = text.len()))]
pub fn split_sentences(text: &str, extra_punctuation: &str) -> Vec<Fragment> {
    let chars: Vec<char> = text.chars().collect();
    let is_terminator = |ch: char| {
        TERMINATORS.contains(&ch) || (!ch.is_whitespace() && extra_punctuation.contains(ch))
    };

    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];
        current.push(ch);

        if is_terminator(ch) && !is_decimal_point(&chars, i) {
            while let Some(&next) = chars.get(i + 1) {
                if is_terminator(next) || CLOSERS.contains(&next) {
                    current.push(next);
                    i += 1;
                } else {
                    break;
                }
            }
            push_fragment(&mut fragments, &current);
            current.clear();
        }

        i += 1;
    }

    push_fragment(&mut fragments, &current);
    fragments
}

fn push_fragment(fragments: &mut Vec<Fragment>, raw: &str) {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return;
    }
    fragments.push(Fragment {
        text: trimmed.to_string(),
        words: split_words(trimmed),
    });
}

fn is_decimal_point(chars: &[char], pos: usize) -> bool {
    chars[pos] == '.'
        && pos > 0
        && chars[pos - 1].is_ascii_digit()
        && chars.get(pos + 1).is_some_and(char::is_ascii_digit)
}
