//! Page markup: which words a reader at a stage can read, and which
//! sentences and words are too long for a level.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::graphemes::{GlyphCounter, GraphemeInventory};
use crate::model::{Level, Settings};
use crate::text;

/// What the reader knows at a stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageKnowledge {
    /// Corpus mode: known graphemes plus sight words.
    Graphemes {
        /// Cumulative known graphemes, lower-cased.
        known: HashSet<String>,
        /// Cumulative sight words, lower-cased.
        sight_words: HashSet<String>,
    },
    /// Allowed-words mode: an explicit word list plus sight words.
    AllowedWords {
        /// Cumulative allowed words, lower-cased.
        allowed: HashSet<String>,
        /// Cumulative sight words, lower-cased.
        sight_words: HashSet<String>,
    },
}

impl StageKnowledge {
    /// Knowledge at one-based stage `number` of `settings`.
    pub fn for_stage(settings: &Settings, number: usize) -> Self {
        let lower = |words: Vec<String>| -> HashSet<String> {
            words.iter().map(|w| w.to_lowercase()).collect()
        };
        if settings.use_allowed_words {
            Self::AllowedWords {
                allowed: lower(settings.cumulative_allowed_words(number)),
                sight_words: lower(settings.cumulative_sight_words(number)),
            }
        } else {
            Self::Graphemes {
                known: lower(settings.cumulative_graphemes(number)),
                sight_words: lower(settings.cumulative_sight_words(number)),
            }
        }
    }

    fn status(&self, word: &str, inventory: &GraphemeInventory) -> WordStatus {
        let lower = word.to_lowercase();
        match self {
            Self::Graphemes { known, sight_words } => {
                if sight_words.contains(&lower) {
                    WordStatus::SightWord
                } else if inventory.is_composed_of(&lower, known) {
                    WordStatus::Decodable
                } else {
                    WordStatus::NotDecodable
                }
            }
            Self::AllowedWords {
                allowed,
                sight_words,
            } => {
                if sight_words.contains(&lower) {
                    WordStatus::SightWord
                } else if allowed.contains(&lower) {
                    WordStatus::Allowed
                } else {
                    WordStatus::NotAllowed
                }
            }
        }
    }
}

/// How a word on the page relates to the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum WordStatus {
    /// Built only from known graphemes.
    Decodable,
    /// A sight word for this stage or an earlier one.
    SightWord,
    /// Uses a grapheme the reader has not learned.
    NotDecodable,
    /// On the stage's allowed-word list.
    Allowed,
    /// Missing from the stage's allowed-word list.
    NotAllowed,
}

impl WordStatus {
    /// Whether the reader can read the word.
    pub const fn is_readable(self) -> bool {
        matches!(self, Self::Decodable | Self::SightWord | Self::Allowed)
    }
}

/// A word with its markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkedWord {
    /// The word as written.
    pub text: String,
    /// Readability at the stage.
    pub status: WordStatus,
    /// Visual glyph count.
    pub glyphs: usize,
    /// Over the level's `maxGlyphsPerWord`.
    pub too_long: bool,
}

/// A sentence with its markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkedSentence {
    /// The sentence text.
    pub text: String,
    /// Its words, in order.
    pub words: Vec<MarkedWord>,
    /// Over the level's `maxWordsPerSentence`.
    pub too_long: bool,
}

/// One page's markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PageMarkup {
    /// Sentences, in order.
    pub sentences: Vec<MarkedSentence>,
}

impl PageMarkup {
    /// Every marked word on the page.
    pub fn words(&self) -> impl Iterator<Item = &MarkedWord> {
        self.sentences.iter().flat_map(|s| s.words.iter())
    }

    /// Words the reader cannot read.
    pub fn unreadable(&self) -> impl Iterator<Item = &MarkedWord> {
        self.words().filter(|w| !w.status.is_readable())
    }

    /// True when every word is readable and nothing is too long.
    pub fn is_clean(&self) -> bool {
        self.sentences
            .iter()
            .all(|s| !s.too_long && s.words.iter().all(|w| w.status.is_readable() && !w.too_long))
    }
}

/// Mark up one page of text.
///
/// Without a level, no sentence or word is ever too long.
#[tracing::instrument(skip_all, fields(text_len = page.len()))]
pub fn mark_page(
    page: &str,
    knowledge: &StageKnowledge,
    level: Option<&Level>,
    inventory: &GraphemeInventory,
    counter: &GlyphCounter,
    extra_punctuation: &str,
) -> PageMarkup {
    let max_words = level.map_or(0, |l| l.max_words_per_sentence);
    let max_glyphs = level.map_or(0, |l| l.max_glyphs_per_word);

    let sentences = text::split_sentences(page, extra_punctuation)
        .into_iter()
        .map(|fragment| {
            let words = fragment
                .words
                .into_iter()
                .map(|word| {
                    let glyphs = counter.count(&word.to_lowercase());
                    MarkedWord {
                        status: knowledge.status(&word, inventory),
                        too_long: max_glyphs != 0 && glyphs > max_glyphs,
                        glyphs,
                        text: word,
                    }
                })
                .collect::<Vec<_>>();
            MarkedSentence {
                too_long: max_words != 0 && words.len() > max_words,
                text: fragment.text,
                words,
            }
        })
        .collect();
    PageMarkup { sentences }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Stage;

    fn settings() -> Settings {
        Settings {
            letters: "a b c e f g i o r s t w y sh"
                .split_whitespace()
                .map(String::from)
                .collect(),
            stages: vec![
                Stage::new("a c e r s t y", "feline rodent"),
                Stage::new("b f o sh", "one two"),
            ],
            ..Settings::default()
        }
    }

    fn mark(page: &str, stage: usize, level: Option<&Level>) -> PageMarkup {
        let settings = settings();
        let inventory = settings.grapheme_inventory();
        mark_page(
            page,
            &StageKnowledge::for_stage(&settings, stage),
            level,
            &GraphemeInventory::new(&inventory),
            &GlyphCounter::new(&inventory),
            &settings.sentence_punct,
        )
    }

    fn statuses(markup: &PageMarkup) -> Vec<(&str, WordStatus)> {
        markup.words().map(|w| (w.text.as_str(), w.status)).collect()
    }

    #[test]
    fn words_are_classified_against_the_stage() {
        let markup = mark("The cat sat. Rodent!", 1, None);
        assert_eq!(
            statuses(&markup),
            vec![
                ("The", WordStatus::NotDecodable),
                ("cat", WordStatus::Decodable),
                ("sat", WordStatus::Decodable),
                ("Rodent", WordStatus::SightWord),
            ]
        );
        assert!(!markup.is_clean());
        assert_eq!(markup.unreadable().count(), 1);
    }

    #[test]
    fn later_stages_know_earlier_graphemes() {
        let markup = mark("Bob has a fish. Feline.", 2, None);
        let unreadable: Vec<_> = markup.unreadable().map(|w| w.text.as_str()).collect();
        // "has" needs "h"; "fish" needs "i".
        assert_eq!(unreadable, vec!["has", "fish"]);
        assert_eq!(markup.words().last().map(|w| w.status), Some(WordStatus::SightWord));
    }

    #[test]
    fn long_sentences_and_words_are_flagged() {
        let level = Level {
            max_words_per_sentence: 2,
            max_glyphs_per_word: 4,
            ..Level::default()
        };
        let markup = mark("Cats sat. Cats sat at rest. Crash!", 2, Some(&level));
        let too_long: Vec<bool> = markup.sentences.iter().map(|s| s.too_long).collect();
        assert_eq!(too_long, vec![false, true, false]);
        // "crash" is c r a sh = 4 glyphs, at the limit.
        let crash = markup.words().last().cloned();
        assert_eq!(crash.map(|w| (w.glyphs, w.too_long)), Some((4, false)));
    }

    #[test]
    fn allowed_words_mode_uses_the_list() {
        let mut settings = settings();
        settings.use_allowed_words = true;
        settings.stages[0].allowed_words = vec!["cat".into(), "Sat".into()];
        let knowledge = StageKnowledge::for_stage(&settings, 1);
        let markup = mark_page(
            "Cat sat on it.",
            &knowledge,
            None,
            &GraphemeInventory::default(),
            &GlyphCounter::default(),
            "",
        );
        assert_eq!(
            statuses(&markup),
            vec![
                ("Cat", WordStatus::Allowed),
                ("sat", WordStatus::Allowed),
                ("on", WordStatus::NotAllowed),
                ("it", WordStatus::NotAllowed),
            ]
        );
    }

    #[test]
    fn allowed_words_mode_reads_sight_words() {
        let mut settings = settings();
        settings.use_allowed_words = true;
        settings.stages[0] = Stage::new("a c t", "the");
        settings.stages[0].allowed_words = vec!["cat".into(), "sat".into()];
        let markup = mark_page(
            "The cat sat.",
            &StageKnowledge::for_stage(&settings, 1),
            None,
            &GraphemeInventory::default(),
            &GlyphCounter::default(),
            "",
        );
        assert_eq!(
            statuses(&markup),
            vec![
                ("The", WordStatus::SightWord),
                ("cat", WordStatus::Allowed),
                ("sat", WordStatus::Allowed),
            ]
        );
        assert_eq!(markup.unreadable().count(), 0);
    }

    #[test]
    fn zero_limits_never_flag() {
        let markup = mark("Sat sat sat sat sat sat sat sat.", 1, Some(&Level::default()));
        assert!(markup.is_clean());
    }
}
