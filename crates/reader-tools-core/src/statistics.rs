//! Book statistics and leveled-reader limit checks.
//!
//! Averages are computed as a ratio of sums across the whole book, never as
//! an average of per-page averages. Sentences without words are not
//! counted anywhere. Any average with a zero denominator is 0.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::graphemes::GlyphCounter;
use crate::manuscript::Book;
use crate::model::{Level, within_limit};

/// Counts and averages for one book.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BookStatistics {
    /// Number of pages.
    pub pages: usize,
    /// Total words in the book.
    pub total_words: usize,
    /// Distinct words, ignoring case.
    pub unique_words: usize,
    /// Sentences with at least one word.
    pub sentences: usize,
    /// Words on the busiest page.
    pub max_words_per_page: usize,
    /// Words in the longest sentence.
    pub max_words_per_sentence: usize,
    /// Glyphs in the longest word.
    pub max_glyphs_per_word: usize,
    /// Sentences on the page with the most sentences.
    pub max_sentences_per_page: usize,
    /// Total words / total sentences.
    pub average_words_per_sentence: f64,
    /// Total words / pages.
    pub average_words_per_page: f64,
    /// Total glyphs / total words.
    pub average_glyphs_per_word: f64,
    /// Total sentences / pages.
    pub average_sentences_per_page: f64,
}

/// `numerator / denominator`, or 0 when the denominator is 0.
pub fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Average words per page given each page's word count.
pub fn average_words_per_page(page_word_counts: &[usize]) -> f64 {
    ratio(page_word_counts.iter().sum(), page_word_counts.len())
}

impl BookStatistics {
    /// Measure `book`, counting glyphs with `known_graphemes`.
    ///
    /// Words are lower-cased before their glyphs are counted.
    #[tracing::instrument(skip_all, fields(pages = book.pages.len()))]
    pub fn compute<S: AsRef<str>>(book: &Book, known_graphemes: &[S]) -> Self {
        let counter = GlyphCounter::new(known_graphemes);
        let mut unique = HashSet::new();
        let mut stats = Self {
            pages: book.pages.len(),
            ..Self::default()
        };
        let mut total_glyphs = 0;

        for page in &book.pages {
            let page_words = page.word_count();
            let page_sentences = page.sentence_count();
            stats.total_words += page_words;
            stats.sentences += page_sentences;
            stats.max_words_per_page = stats.max_words_per_page.max(page_words);
            stats.max_sentences_per_page = stats.max_sentences_per_page.max(page_sentences);

            for sentence in &page.sentences {
                stats.max_words_per_sentence = stats.max_words_per_sentence.max(sentence.words.len());
                for word in &sentence.words {
                    let lower = word.to_lowercase();
                    let glyphs = counter.count(&lower);
                    total_glyphs += glyphs;
                    stats.max_glyphs_per_word = stats.max_glyphs_per_word.max(glyphs);
                    unique.insert(lower);
                }
            }
        }

        stats.unique_words = unique.len();
        stats.average_words_per_sentence = ratio(stats.total_words, stats.sentences);
        stats.average_words_per_page = ratio(stats.total_words, stats.pages);
        stats.average_glyphs_per_word = ratio(total_glyphs, stats.total_words);
        stats.average_sentences_per_page = ratio(stats.sentences, stats.pages);
        tracing::debug!(
            words = stats.total_words,
            sentences = stats.sentences,
            "book measured"
        );
        stats
    }
}

/// A level constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum LevelMetric {
    /// `maxWordsPerSentence`
    WordsPerSentence,
    /// `maxWordsPerPage`
    WordsPerPage,
    /// `maxWordsPerBook`
    WordsPerBook,
    /// `maxUniqueWordsPerBook`
    UniqueWordsPerBook,
    /// `maxGlyphsPerWord`
    GlyphsPerWord,
    /// `maxSentencesPerPage`
    SentencesPerPage,
    /// `maxAverageWordsPerSentence`
    AverageWordsPerSentence,
    /// `maxAverageWordsPerPage`
    AverageWordsPerPage,
    /// `maxAverageGlyphsPerWord`
    AverageGlyphsPerWord,
    /// `maxAverageSentencesPerPage`
    AverageSentencesPerPage,
}

impl LevelMetric {
    /// Every metric, in display order.
    pub const ALL: [Self; 10] = [
        Self::WordsPerSentence,
        Self::WordsPerPage,
        Self::WordsPerBook,
        Self::UniqueWordsPerBook,
        Self::GlyphsPerWord,
        Self::SentencesPerPage,
        Self::AverageWordsPerSentence,
        Self::AverageWordsPerPage,
        Self::AverageGlyphsPerWord,
        Self::AverageSentencesPerPage,
    ];

    /// Human-readable label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::WordsPerSentence => "words per sentence",
            Self::WordsPerPage => "words per page",
            Self::WordsPerBook => "words per book",
            Self::UniqueWordsPerBook => "unique words per book",
            Self::GlyphsPerWord => "glyphs per word",
            Self::SentencesPerPage => "sentences per page",
            Self::AverageWordsPerSentence => "average words per sentence",
            Self::AverageWordsPerPage => "average words per page",
            Self::AverageGlyphsPerWord => "average glyphs per word",
            Self::AverageSentencesPerPage => "average sentences per page",
        }
    }

    /// The limit `level` sets for this metric (0 is unlimited).
    pub fn limit(self, level: &Level) -> f64 {
        match self {
            Self::WordsPerSentence => level.max_words_per_sentence as f64,
            Self::WordsPerPage => level.max_words_per_page as f64,
            Self::WordsPerBook => level.max_words_per_book as f64,
            Self::UniqueWordsPerBook => level.max_unique_words_per_book as f64,
            Self::GlyphsPerWord => level.max_glyphs_per_word as f64,
            Self::SentencesPerPage => level.max_sentences_per_page as f64,
            Self::AverageWordsPerSentence => level.max_average_words_per_sentence,
            Self::AverageWordsPerPage => level.max_average_words_per_page,
            Self::AverageGlyphsPerWord => level.max_average_glyphs_per_word,
            Self::AverageSentencesPerPage => level.max_average_sentences_per_page,
        }
    }

    /// The measured value of this metric.
    pub fn measure(self, stats: &BookStatistics) -> f64 {
        match self {
            Self::WordsPerSentence => stats.max_words_per_sentence as f64,
            Self::WordsPerPage => stats.max_words_per_page as f64,
            Self::WordsPerBook => stats.total_words as f64,
            Self::UniqueWordsPerBook => stats.unique_words as f64,
            Self::GlyphsPerWord => stats.max_glyphs_per_word as f64,
            Self::SentencesPerPage => stats.max_sentences_per_page as f64,
            Self::AverageWordsPerSentence => stats.average_words_per_sentence,
            Self::AverageWordsPerPage => stats.average_words_per_page,
            Self::AverageGlyphsPerWord => stats.average_glyphs_per_word,
            Self::AverageSentencesPerPage => stats.average_sentences_per_page,
        }
    }
}

impl std::fmt::Display for LevelMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// One metric compared against its limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LevelCheck {
    /// Which constraint.
    pub metric: LevelMetric,
    /// Value measured in the book.
    pub measured: f64,
    /// Configured limit, 0 when unlimited.
    pub limit: f64,
    /// Whether the measured value is within the limit.
    pub acceptable: bool,
}

/// A book compared against a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LevelReport {
    /// Level display name.
    pub level: String,
    /// Measured statistics.
    pub statistics: BookStatistics,
    /// One entry per constraint, in display order.
    pub checks: Vec<LevelCheck>,
    /// True when every check is acceptable.
    pub pass: bool,
}

impl LevelReport {
    /// Compare `stats` against every limit in `level`.
    pub fn new(stats: BookStatistics, level: &Level, level_number: usize) -> Self {
        let checks: Vec<LevelCheck> = LevelMetric::ALL
            .into_iter()
            .map(|metric| {
                let measured = metric.measure(&stats);
                let limit = metric.limit(level);
                LevelCheck {
                    metric,
                    measured,
                    limit,
                    acceptable: within_limit(measured, limit),
                }
            })
            .collect();
        let pass = checks.iter().all(|c| c.acceptable);
        Self {
            level: level.display_name(level_number),
            statistics: stats,
            checks,
            pass,
        }
    }

    /// Checks that exceeded their limit.
    pub fn violations(&self) -> impl Iterator<Item = &LevelCheck> {
        self.checks.iter().filter(|c| !c.acceptable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_words_per_page_uses_sums() {
        assert_eq!(average_words_per_page(&[]), 0.0);
        assert_eq!(average_words_per_page(&[3, 3]), 3.0);
        assert_eq!(average_words_per_page(&[8, 3]), 5.5);
    }

    #[test]
    fn empty_book_is_all_zero() {
        let stats = BookStatistics::compute(&Book::default(), &["th"]);
        assert_eq!(stats, BookStatistics::default());
    }

    #[test]
    fn counts_across_pages() {
        let book = Book::from_pages(
            &["The cat sat. The cat ran!", "Sam sat with the thin cat. ..."],
            "",
        );
        let stats = BookStatistics::compute(&book, &["th", "sh"]);
        assert_eq!(stats.pages, 2);
        assert_eq!(stats.total_words, 12);
        // the cat sat ran sam with thin
        assert_eq!(stats.unique_words, 7);
        assert_eq!(stats.sentences, 3);
        assert_eq!(stats.max_words_per_page, 6);
        assert_eq!(stats.max_words_per_sentence, 6);
        assert_eq!(stats.max_sentences_per_page, 2);
        // "with" and "thin" are three glyphs each with "th" known.
        assert_eq!(stats.max_glyphs_per_word, 3);
        assert_eq!(stats.average_words_per_sentence, 4.0);
        assert_eq!(stats.average_words_per_page, 6.0);
        assert_eq!(stats.average_sentences_per_page, 1.5);
    }

    #[test]
    fn glyph_average_is_over_words() {
        let book = Book::from_pages(&["The cat."], "");
        let stats = BookStatistics::compute(&book, &["th"]);
        // the = 2 glyphs, cat = 3 glyphs
        assert_eq!(stats.average_glyphs_per_word, 2.5);
        assert_eq!(stats.max_glyphs_per_word, 3);
    }

    #[test]
    fn zero_limits_are_unlimited() {
        let book = Book::from_pages(&["one two three four five six seven."], "");
        let stats = BookStatistics::compute(&book, &[] as &[&str]);
        let report = LevelReport::new(stats, &Level::default(), 1);
        assert!(report.pass);
        assert_eq!(report.checks.len(), LevelMetric::ALL.len());
        assert_eq!(report.level, "1");
    }

    #[test]
    fn exceeded_limits_are_reported() {
        let level = Level {
            name: "Blue".to_string(),
            max_words_per_sentence: 3,
            max_average_words_per_page: 10.0,
            ..Level::default()
        };
        let book = Book::from_pages(&["Sam sat on the mat."], "");
        let stats = BookStatistics::compute(&book, &[] as &[&str]);
        let report = LevelReport::new(stats, &level, 2);
        assert!(!report.pass);
        assert_eq!(report.level, "Blue");
        let violations: Vec<_> = report.violations().map(|c| c.metric).collect();
        assert_eq!(violations, vec![LevelMetric::WordsPerSentence]);
        let check = &report.checks[0];
        assert_eq!(check.measured, 5.0);
        assert_eq!(check.limit, 3.0);
    }

    #[test]
    fn measured_equal_to_limit_is_acceptable() {
        let level = Level {
            max_words_per_page: 5,
            ..Level::default()
        };
        let book = Book::from_pages(&["Sam sat on the mat."], "");
        let report = LevelReport::new(BookStatistics::compute(&book, &["th"]), &level, 1);
        assert!(report.pass);
    }
}
