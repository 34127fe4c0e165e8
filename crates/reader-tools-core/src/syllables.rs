//! Syllable estimation for the decodability syllable-range filter.
//!
//! Counts vowel groups, then corrects for silent `e`, consonant + `le`
//! endings, and silent `-ed`. Diacritics are ignored.

use crate::text;

const VOWELS: &[char] = &['a', 'e', 'i', 'o', 'u', 'y'];

/// Estimate the number of syllables in `word`.
///
/// Returns 0 only for a word with no letters; any other word has at least 1.
pub fn estimate_syllables(word: &str) -> usize {
    let word: Vec<char> = text::strip_combining_marks(word)
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect();
    if word.is_empty() {
        return 0;
    }
    if word.len() <= 3 {
        return 1;
    }

    let is_vowel = |c: &char| VOWELS.contains(c);
    let mut syllables = 0;
    let mut previous_was_vowel = false;
    for c in &word {
        let vowel = is_vowel(c);
        if vowel && !previous_was_vowel {
            syllables += 1;
        }
        previous_was_vowel = vowel;
    }

    let n = word.len();
    let last = word[n - 1];
    let before_last = word[n - 2];

    // Silent e ("made"), but not "-le" after a consonant ("table").
    if last == 'e' && syllables > 1 {
        let consonant_le = before_last == 'l' && !is_vowel(&word[n - 3]);
        if !consonant_le {
            syllables -= 1;
        }
    }

    // Silent -ed ("jumped"), but "wanted" and "faded" keep it.
    if last == 'd' && before_last == 'e' && syllables > 1 && !matches!(word[n - 3], 't' | 'd') {
        syllables -= 1;
    }

    syllables.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_words_are_one_syllable() {
        assert_eq!(estimate_syllables("cat"), 1);
        assert_eq!(estimate_syllables("a"), 1);
        assert_eq!(estimate_syllables("the"), 1);
    }

    #[test]
    fn vowel_groups_count() {
        assert_eq!(estimate_syllables("catty"), 2);
        assert_eq!(estimate_syllables("rodent"), 2);
        assert_eq!(estimate_syllables("banana"), 3);
    }

    #[test]
    fn silent_endings() {
        assert_eq!(estimate_syllables("rate"), 1);
        assert_eq!(estimate_syllables("feline"), 2);
        assert_eq!(estimate_syllables("table"), 2);
        assert_eq!(estimate_syllables("jumped"), 1);
        assert_eq!(estimate_syllables("wanted"), 2);
    }

    #[test]
    fn non_letters_are_ignored() {
        assert_eq!(estimate_syllables(""), 0);
        assert_eq!(estimate_syllables("123"), 0);
        assert_eq!(estimate_syllables("bo\u{301}at"), 1);
    }
}
