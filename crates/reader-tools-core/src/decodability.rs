//! Decodable word selection.
//!
//! A corpus word is decodable when every grapheme it is built from is in
//! the permitted set. Optional filters narrow the result by estimated
//! syllable count, vocabulary group, and part of speech. Sight words are
//! unioned in afterwards by [`with_sight_words`] and are always flagged as
//! sight words, whether or not they are also decodable.

use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::corpus::WordCorpus;
use crate::graphemes::GraphemeInventory;
use crate::sorting::alphabetic_cmp;
use crate::syllables::estimate_syllables;

/// Syllable counts accepted when a query does not narrow them.
pub const DEFAULT_SYLLABLE_LENGTHS: RangeInclusive<usize> = 1..=24;

/// Number of vocabulary groups when configuration does not say otherwise.
pub const DEFAULT_VOCABULARY_GROUPS: usize = 6;

/// A word offered to the author, with what the reader knows about it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WordEntry {
    /// The word as first seen.
    pub name: String,
    /// Corpus frequency, 0 when the corpus never saw it.
    pub frequency: usize,
    /// Whether the word is a sight word for the stage.
    pub is_sight_word: bool,
}

/// Corpus words partitioned into frequency bands.
///
/// Group 1 holds the most frequent words. The classification is a snapshot
/// of one corpus state and must be rebuilt whenever the corpus changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VocabularyGroups {
    groups: HashMap<String, usize>,
    group_count: usize,
}

impl VocabularyGroups {
    /// Rank corpus words by descending frequency (ties alphabetical) and
    /// split the ranking into `group_count` contiguous, near-equal groups.
    #[tracing::instrument(skip(corpus), fields(words = corpus.len()))]
    pub fn classify(corpus: &WordCorpus, group_count: usize) -> Self {
        let group_count = group_count.max(1);
        let mut ranked: Vec<(&str, usize)> = corpus.iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| alphabetic_cmp(a.0, b.0)));

        let total = ranked.len();
        let groups = ranked
            .into_iter()
            .enumerate()
            .map(|(rank, (word, _))| (word.to_string(), rank * group_count / total + 1))
            .collect();

        Self {
            groups,
            group_count,
        }
    }

    /// The group `word` belongs to, if it is in the classified corpus.
    pub fn group_of(&self, word: &str) -> Option<usize> {
        self.groups.get(&word.to_lowercase()).copied()
    }

    /// Number of groups.
    pub const fn group_count(&self) -> usize {
        self.group_count
    }
}

/// What to select from the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordQuery {
    desired_graphemes: Vec<String>,
    known_graphemes: Vec<String>,
    restrict_to_known: bool,
    allow_upper_case: bool,
    syllable_lengths: RangeInclusive<usize>,
    vocabulary_groups: Option<Vec<usize>>,
    parts_of_speech: Option<Vec<String>>,
}

impl WordQuery {
    /// Select words built from `desired` graphemes, or from `known`
    /// graphemes once [`restrict_to_known`](Self::restrict_to_known) is set.
    pub fn new(desired: Vec<String>, known: Vec<String>) -> Self {
        Self {
            desired_graphemes: desired,
            known_graphemes: known,
            restrict_to_known: false,
            allow_upper_case: false,
            syllable_lengths: DEFAULT_SYLLABLE_LENGTHS,
            vocabulary_groups: None,
            parts_of_speech: None,
        }
    }

    /// Select words built only from `known` graphemes.
    pub fn known(known: Vec<String>) -> Self {
        Self::new(known.clone(), known).restrict_to_known(true)
    }

    /// Permit only the known graphemes rather than the desired ones.
    #[must_use]
    pub const fn restrict_to_known(mut self, restrict: bool) -> Self {
        self.restrict_to_known = restrict;
        self
    }

    /// Match upper-case letters against their lower-case graphemes.
    ///
    /// When off, a word containing an upper-case letter is never selected.
    #[must_use]
    pub const fn allow_upper_case(mut self, allow: bool) -> Self {
        self.allow_upper_case = allow;
        self
    }

    /// Keep only words whose estimated syllable count is in `range`.
    #[must_use]
    pub const fn syllable_lengths(mut self, range: RangeInclusive<usize>) -> Self {
        self.syllable_lengths = range;
        self
    }

    /// Keep only words in one of the given vocabulary groups.
    #[must_use]
    pub fn vocabulary_groups(mut self, groups: Vec<usize>) -> Self {
        self.vocabulary_groups = Some(groups);
        self
    }

    /// Keep only words tagged with one of the given parts of speech.
    #[must_use]
    pub fn parts_of_speech(mut self, tags: Vec<String>) -> Self {
        self.parts_of_speech = Some(tags.iter().map(|t| t.to_lowercase()).collect());
        self
    }

    fn permitted(&self) -> HashSet<String> {
        let source = if self.restrict_to_known {
            &self.known_graphemes
        } else {
            &self.desired_graphemes
        };
        source
            .iter()
            .map(|g| {
                if self.allow_upper_case {
                    g.to_lowercase()
                } else {
                    g.clone()
                }
            })
            .collect()
    }
}

/// Selects corpus words usable under a grapheme set.
#[derive(Debug, Clone, Copy)]
pub struct DecodabilityFilter<'a> {
    corpus: &'a WordCorpus,
    inventory: &'a GraphemeInventory,
    groups: Option<&'a VocabularyGroups>,
}

impl<'a> DecodabilityFilter<'a> {
    /// A filter over `corpus`, splitting words with `inventory`.
    pub const fn new(corpus: &'a WordCorpus, inventory: &'a GraphemeInventory) -> Self {
        Self {
            corpus,
            inventory,
            groups: None,
        }
    }

    /// Use `groups` to answer vocabulary-group filters.
    ///
    /// Without a classification, a group filter matches nothing.
    #[must_use]
    pub const fn with_groups(mut self, groups: &'a VocabularyGroups) -> Self {
        self.groups = Some(groups);
        self
    }

    /// Whether `word` is built only from `permitted` graphemes.
    pub fn is_decodable(
        &self,
        word: &str,
        permitted: &HashSet<String>,
        allow_upper_case: bool,
    ) -> bool {
        if allow_upper_case {
            self.inventory.is_composed_of(&word.to_lowercase(), permitted)
        } else {
            !word.chars().any(char::is_uppercase) && self.inventory.is_composed_of(word, permitted)
        }
    }

    /// Corpus words matching `query`, as bare names in alphabetical order.
    pub fn select_word_names(&self, query: &WordQuery) -> Vec<String> {
        self.select_words(query).into_iter().map(|w| w.name).collect()
    }

    /// Corpus words matching `query`, with their frequencies, in
    /// alphabetical order. None of them is flagged as a sight word.
    #[tracing::instrument(skip_all, fields(corpus = self.corpus.len()))]
    pub fn select_words(&self, query: &WordQuery) -> Vec<WordEntry> {
        let permitted = query.permitted();
        let mut selected: Vec<WordEntry> = self
            .corpus
            .iter()
            .filter(|(word, _)| self.is_decodable(word, &permitted, query.allow_upper_case))
            .filter(|(word, _)| query.syllable_lengths.contains(&estimate_syllables(word)))
            .filter(|(word, _)| self.in_groups(word, query))
            .filter(|(word, _)| self.has_part_of_speech(word, query))
            .map(|(word, frequency)| WordEntry {
                name: word.to_string(),
                frequency,
                is_sight_word: false,
            })
            .collect();
        selected.sort_by(|a, b| alphabetic_cmp(&a.name, &b.name));
        tracing::debug!(selected = selected.len(), "decodable words selected");
        selected
    }

    fn in_groups(&self, word: &str, query: &WordQuery) -> bool {
        let Some(ref wanted) = query.vocabulary_groups else {
            return true;
        };
        self.groups
            .and_then(|groups| groups.group_of(word))
            .is_some_and(|group| wanted.contains(&group))
    }

    fn has_part_of_speech(&self, word: &str, query: &WordQuery) -> bool {
        let Some(ref wanted) = query.parts_of_speech else {
            return true;
        };
        self.corpus
            .parts_of_speech(word)
            .iter()
            .any(|tag| wanted.contains(tag))
    }
}

/// Union `sight_words` into `words`.
///
/// Each sight word takes its frequency from the corpus (0 if absent) and is
/// always flagged as a sight word. Entries are de-duplicated by name,
/// ignoring case; the first spelling seen is kept.
pub fn with_sight_words<S: AsRef<str>>(
    words: Vec<WordEntry>,
    sight_words: &[S],
    corpus: &WordCorpus,
) -> Vec<WordEntry> {
    let sight = sight_words.iter().map(|word| WordEntry {
        name: word.as_ref().to_string(),
        frequency: corpus.frequency_of(word.as_ref()),
        is_sight_word: true,
    });
    dedupe(words.into_iter().chain(sight))
}

/// Entries for an explicit allowed-word list, with corpus frequencies.
pub fn allowed_word_entries<S: AsRef<str>>(allowed: &[S], corpus: &WordCorpus) -> Vec<WordEntry> {
    dedupe(allowed.iter().map(|word| WordEntry {
        name: word.as_ref().to_string(),
        frequency: corpus.frequency_of(word.as_ref()),
        is_sight_word: false,
    }))
}

fn dedupe(entries: impl Iterator<Item = WordEntry>) -> Vec<WordEntry> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut result: Vec<WordEntry> = Vec::new();
    for entry in entries {
        let key = entry.name.to_lowercase();
        if let Some(&i) = index.get(&key) {
            result[i].is_sight_word |= entry.is_sight_word;
        } else {
            index.insert(key, result.len());
            result.push(entry);
        }
    }
    result
}
