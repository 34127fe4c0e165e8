//! Word-frequency corpus built from sample texts.
//!
//! Ingestion is additive: feeding the same text twice doubles every count.
//! Each call processes at most `max_words_per_ingest` words; the rest of
//! that call's text is dropped silently.

use std::collections::HashMap;

use serde::Serialize;

use crate::text;

/// Default ceiling on words processed by a single [`WordCorpus::ingest`] call.
pub const DEFAULT_MAX_WORDS_PER_INGEST: usize = 10_000;

/// What a single [`WordCorpus::ingest`] call did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Words counted.
    pub processed: usize,
    /// Words skipped because the ceiling was reached.
    pub dropped: usize,
}

/// Word → frequency table, keyed by lower-cased word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordCorpus {
    frequencies: HashMap<String, usize>,
    parts_of_speech: HashMap<String, Vec<String>>,
    max_words_per_ingest: usize,
}

impl Default for WordCorpus {
    fn default() -> Self {
        Self::new()
    }
}

impl WordCorpus {
    /// An empty corpus with the default ingestion ceiling.
    pub fn new() -> Self {
        Self {
            frequencies: HashMap::new(),
            parts_of_speech: HashMap::new(),
            max_words_per_ingest: DEFAULT_MAX_WORDS_PER_INGEST,
        }
    }

    /// Set the per-call ingestion ceiling. 0 removes the ceiling.
    pub const fn with_max_words_per_ingest(mut self, max: usize) -> Self {
        self.max_words_per_ingest = max;
        self
    }

    /// Tokenize `text` and add one to the count of every word found.
    #[tracing::instrument(skip_all, fields(text_len = text.len()))]
    pub fn ingest(&mut self, text: &str) -> IngestSummary {
        let words = text::split_words(text);
        let limit = if self.max_words_per_ingest == 0 {
            words.len()
        } else {
            self.max_words_per_ingest.min(words.len())
        };

        for word in &words[..limit] {
            *self.frequencies.entry(word.to_lowercase()).or_insert(0) += 1;
        }

        let summary = IngestSummary {
            processed: limit,
            dropped: words.len() - limit,
        };
        if summary.dropped > 0 {
            tracing::debug!(dropped = summary.dropped, "ingestion ceiling reached");
        }
        summary
    }

    /// Make sure each word is present, without changing existing counts.
    ///
    /// Used for extra vocabulary that may not occur in any sample text.
    pub fn add_vocabulary<S: AsRef<str>>(&mut self, words: &[S]) {
        for word in words {
            for token in text::split_words(word.as_ref()) {
                self.frequencies.entry(token.to_lowercase()).or_insert(0);
            }
        }
    }

    /// How often `word` has been seen (0 if never).
    pub fn frequency_of(&self, word: &str) -> usize {
        self.frequencies
            .get(&word.to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// Whether `word` is in the corpus, even with a zero count.
    pub fn contains(&self, word: &str) -> bool {
        self.frequencies.contains_key(&word.to_lowercase())
    }

    /// Attach part-of-speech tags to `word`.
    pub fn tag_parts_of_speech<S: AsRef<str>>(&mut self, word: &str, tags: &[S]) {
        let entry = self.parts_of_speech.entry(word.to_lowercase()).or_default();
        for tag in tags {
            let tag = tag.as_ref().to_lowercase();
            if !entry.contains(&tag) {
                entry.push(tag);
            }
        }
    }

    /// Part-of-speech tags of `word`, if any were attached.
    pub fn parts_of_speech(&self, word: &str) -> &[String] {
        self.parts_of_speech
            .get(&word.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Iterate over `(word, frequency)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.frequencies.iter().map(|(w, &f)| (w.as_str(), f))
    }

    /// Number of distinct words.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Whether no word has been added.
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Forget every word and tag, keeping the ceiling.
    pub fn clear(&mut self) {
        self.frequencies.clear();
        self.parts_of_speech.clear();
    }
}
