//! Reader settings: stages, levels, and the alphabet they draw on.
//!
//! [`Settings`] is the document persisted by a
//! [`SettingsStore`](crate::collaborators::SettingsStore). It is always
//! replaced wholesale; partial documents are overlaid onto a base with
//! [`Settings::merge`].
//!
//! Stage and level numbers used throughout this crate are one-based.

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{SettingsError, SettingsResult};
use crate::text;

/// A decodable-reader stage.
///
/// Stage order encodes cumulative knowledge: a reader at stage N knows
/// every grapheme and sight word of stages 1..=N.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Stage {
    /// Display name. Empty means "use the stage number".
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Graphemes introduced at this stage, in teaching order.
    #[serde(rename = "letters", deserialize_with = "word_list")]
    #[schemars(with = "Vec<String>")]
    pub known_graphemes: Vec<String>,
    /// Words always treated as known from this stage on.
    #[serde(deserialize_with = "word_list")]
    #[schemars(with = "Vec<String>")]
    pub sight_words: Vec<String>,
    /// Plain-text word list used in allowed-words mode, relative to the
    /// settings document.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub allowed_words_file: Option<Utf8PathBuf>,
    /// Allowed words, either inline or resolved from `allowed_words_file`.
    #[serde(deserialize_with = "word_list", skip_serializing_if = "Vec::is_empty")]
    #[schemars(with = "Vec<String>")]
    pub allowed_words: Vec<String>,
}

impl Stage {
    /// Create a stage from whitespace-separated graphemes and sight words.
    pub fn new(letters: &str, sight_words: &str) -> Self {
        Self {
            known_graphemes: letters.split_whitespace().map(str::to_string).collect(),
            sight_words: sight_words.split_whitespace().map(str::to_string).collect(),
            ..Self::default()
        }
    }

    /// The name to show for this stage, falling back to its number.
    pub fn display_name(&self, number: usize) -> String {
        if self.name.is_empty() {
            number.to_string()
        } else {
            self.name.clone()
        }
    }
}

/// A leveled-reader level: ceilings on sentence, page and book complexity.
///
/// Every constraint uses 0 to mean "unlimited".
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Level {
    /// Display name. Empty means "use the level number".
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Most words allowed in a single sentence.
    pub max_words_per_sentence: usize,
    /// Most words allowed on a single page.
    pub max_words_per_page: usize,
    /// Most words allowed in the whole book.
    pub max_words_per_book: usize,
    /// Most distinct words allowed in the whole book.
    pub max_unique_words_per_book: usize,
    /// Most visual glyphs allowed in a single word.
    pub max_glyphs_per_word: usize,
    /// Most sentences allowed on a single page.
    pub max_sentences_per_page: usize,
    /// Ceiling on the book-wide average words per sentence.
    pub max_average_words_per_sentence: f64,
    /// Ceiling on the book-wide average words per page.
    pub max_average_words_per_page: f64,
    /// Ceiling on the book-wide average glyphs per word.
    pub max_average_glyphs_per_word: f64,
    /// Ceiling on the book-wide average sentences per page.
    pub max_average_sentences_per_page: f64,
}

impl Level {
    /// The name to show for this level, falling back to its number.
    pub fn display_name(&self, number: usize) -> String {
        if self.name.is_empty() {
            number.to_string()
        } else {
            self.name.clone()
        }
    }
}

/// Whether `measured` satisfies `limit`, where a limit of 0 is unlimited.
pub fn within_limit(measured: f64, limit: f64) -> bool {
    limit == 0.0 || measured <= limit
}

/// The complete reader-tools settings document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Alphabet letters and multi-character graphemes, in display order.
    #[serde(deserialize_with = "word_list")]
    #[schemars(with = "Vec<String>")]
    pub letters: Vec<String>,
    /// Extra vocabulary added to the corpus on top of the sample texts.
    #[serde(deserialize_with = "word_list")]
    #[schemars(with = "Vec<String>")]
    pub more_words: Vec<String>,
    /// Extra characters that end a sentence.
    pub sentence_punct: String,
    /// Use explicit allowed-word lists instead of corpus-derived words.
    #[serde(deserialize_with = "flag")]
    #[schemars(with = "bool")]
    pub use_allowed_words: bool,
    /// Decodable stages, in order.
    pub stages: Vec<Stage>,
    /// Reader levels, in order.
    pub levels: Vec<Level>,
}

/// A settings document where every field is optional.
///
/// Produced when reading possibly incomplete documents; applied to a base
/// with [`Settings::merge`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PartialSettings {
    /// Alphabet letters, if present.
    #[serde(deserialize_with = "optional_word_list")]
    pub letters: Option<Vec<String>>,
    /// Extra vocabulary, if present.
    #[serde(deserialize_with = "optional_word_list")]
    pub more_words: Option<Vec<String>>,
    /// Extra sentence punctuation, if present.
    pub sentence_punct: Option<String>,
    /// Word-source mode, if present.
    #[serde(deserialize_with = "optional_flag")]
    pub use_allowed_words: Option<bool>,
    /// Stages, if present.
    pub stages: Option<Vec<Stage>>,
    /// Levels, if present.
    pub levels: Option<Vec<Level>>,
}

impl Settings {
    /// Number of stages.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Number of levels.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// The stage with one-based number `number`.
    pub fn stage(&self, number: usize) -> Option<&Stage> {
        number.checked_sub(1).and_then(|i| self.stages.get(i))
    }

    /// The level with one-based number `number`.
    pub fn level(&self, number: usize) -> Option<&Level> {
        number.checked_sub(1).and_then(|i| self.levels.get(i))
    }

    /// Overlay every field present in `partial` onto these settings.
    ///
    /// Lists are replaced, never appended.
    pub fn merge(&mut self, partial: PartialSettings) {
        let PartialSettings {
            letters,
            more_words,
            sentence_punct,
            use_allowed_words,
            stages,
            levels,
        } = partial;

        if let Some(letters) = letters {
            self.letters = letters;
        }
        if let Some(more_words) = more_words {
            self.more_words = more_words;
        }
        if let Some(sentence_punct) = sentence_punct {
            self.sentence_punct = sentence_punct;
        }
        if let Some(use_allowed_words) = use_allowed_words {
            self.use_allowed_words = use_allowed_words;
        }
        if let Some(stages) = stages {
            self.stages = stages;
        }
        if let Some(levels) = levels {
            self.levels = levels;
        }
    }

    /// Graphemes known at stage `number`: the ordered union of stages 1..=number.
    pub fn cumulative_graphemes(&self, number: usize) -> Vec<String> {
        self.cumulative(number, |stage| &stage.known_graphemes)
    }

    /// Sight words known at stage `number`: the ordered union of stages 1..=number.
    pub fn cumulative_sight_words(&self, number: usize) -> Vec<String> {
        self.cumulative(number, |stage| &stage.sight_words)
    }

    /// Allowed words of stages 1..=number, in allowed-words mode.
    pub fn cumulative_allowed_words(&self, number: usize) -> Vec<String> {
        self.cumulative(number, |stage| &stage.allowed_words)
    }

    /// Graphemes first introduced at stage `number`.
    pub fn new_graphemes(&self, number: usize) -> Vec<String> {
        let earlier: HashSet<String> = self
            .cumulative_graphemes(number.saturating_sub(1))
            .into_iter()
            .collect();
        self.stage(number)
            .map(|stage| {
                stage
                    .known_graphemes
                    .iter()
                    .filter(|g| !earlier.contains(*g))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every grapheme the settings mention: the alphabet, then any stage
    /// grapheme missing from it.
    pub fn grapheme_inventory(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.letters
            .iter()
            .chain(self.stages.iter().flat_map(|s| &s.known_graphemes))
            .filter(|g| seen.insert(g.as_str()))
            .cloned()
            .collect()
    }

    /// Read every stage's `allowed_words_file`, resolving relative paths
    /// against `base_dir`.
    ///
    /// Stages without a file keep any inline `allowed_words`.
    #[tracing::instrument(skip(self))]
    pub fn resolve_allowed_words(&mut self, base_dir: &Utf8Path) -> SettingsResult<()> {
        for (index, stage) in self.stages.iter_mut().enumerate() {
            let Some(ref file) = stage.allowed_words_file else {
                continue;
            };
            let path = if file.is_relative() {
                base_dir.join(file)
            } else {
                file.clone()
            };
            let content = std::fs::read_to_string(path.as_std_path()).map_err(|source| {
                SettingsError::AllowedWordsFile {
                    stage: index + 1,
                    path: path.clone(),
                    source,
                }
            })?;
            stage.allowed_words = text::split_words(&content);
            tracing::debug!(
                stage = index + 1,
                words = stage.allowed_words.len(),
                %path,
                "resolved allowed words"
            );
        }
        Ok(())
    }

    fn cumulative<'a>(
        &'a self,
        number: usize,
        field: impl Fn(&'a Stage) -> &'a Vec<String>,
    ) -> Vec<String> {
        let mut seen = HashSet::new();
        self.stages
            .iter()
            .take(number)
            .flat_map(field)
            .filter(|item| seen.insert(item.as_str()))
            .cloned()
            .collect()
    }
}

/// Word lists appear either as a whitespace-separated string or an array.
#[derive(Deserialize)]
#[serde(untagged)]
enum WordListRepr {
    Text(String),
    List(Vec<String>),
}

impl WordListRepr {
    fn into_words(self) -> Vec<String> {
        match self {
            Self::Text(text) => text.split_whitespace().map(str::to_string).collect(),
            Self::List(items) => items
                .iter()
                .map(|item| item.trim())
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }
}

fn word_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    WordListRepr::deserialize(deserializer).map(WordListRepr::into_words)
}

fn optional_word_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<String>>, D::Error> {
    Option::<WordListRepr>::deserialize(deserializer).map(|repr| repr.map(WordListRepr::into_words))
}

/// Mode flags appear as booleans or as 0/1 numbers.
#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Number(i64),
}

impl FlagRepr {
    const fn into_bool(self) -> bool {
        match self {
            Self::Bool(value) => value,
            Self::Number(value) => value != 0,
        }
    }
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    FlagRepr::deserialize(deserializer).map(FlagRepr::into_bool)
}

fn optional_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    Option::<FlagRepr>::deserialize(deserializer).map(|repr| repr.map(FlagRepr::into_bool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn three_stages() -> Settings {
        Settings {
            stages: vec![
                Stage::new("a c e r s t y", "feline rodent"),
                Stage::new("b f o", "one two"),
                Stage::new("g i w", "fruit nut"),
            ],
            ..Settings::default()
        }
    }

    #[test]
    fn cumulative_graphemes_union_prior_stages() {
        let settings = three_stages();
        assert_eq!(settings.cumulative_graphemes(1).len(), 7);
        assert_eq!(
            settings.cumulative_graphemes(2),
            vec!["a", "c", "e", "r", "s", "t", "y", "b", "f", "o"]
        );
        assert_eq!(settings.cumulative_graphemes(3).len(), 13);
        assert!(settings.cumulative_graphemes(0).is_empty());
    }

    #[test]
    fn cumulative_sight_words_union_prior_stages() {
        let settings = three_stages();
        assert_eq!(
            settings.cumulative_sight_words(2),
            vec!["feline", "rodent", "one", "two"]
        );
    }

    #[test]
    fn new_graphemes_skip_repeats() {
        let mut settings = three_stages();
        settings.stages[1].known_graphemes.push("a".to_string());
        assert_eq!(settings.new_graphemes(2), vec!["b", "f", "o"]);
        assert_eq!(settings.new_graphemes(1).len(), 7);
        assert!(settings.new_graphemes(9).is_empty());
    }

    #[test]
    fn stage_and_level_lookup_is_one_based() {
        let settings = three_stages();
        assert!(settings.stage(0).is_none());
        assert_eq!(settings.stage(1).unwrap().sight_words, vec!["feline", "rodent"]);
        assert!(settings.stage(4).is_none());
        assert!(settings.level(1).is_none());
    }

    #[test]
    fn zero_limit_is_unlimited() {
        assert!(within_limit(1_000_000.0, 0.0));
        assert!(within_limit(5.0, 5.0));
        assert!(!within_limit(5.5, 5.0));
    }

    #[test]
    fn deserializes_string_and_array_word_lists() {
        let json = r#"{
            "letters": "a b c ch",
            "moreWords": ["cab", " bach "],
            "useAllowedWords": 1,
            "stages": [{"letters": "a b", "sightWords": "the"}],
            "levels": [{"maxWordsPerSentence": 5, "maxAverageWordsPerPage": 2.5}]
        }"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.letters, vec!["a", "b", "c", "ch"]);
        assert_eq!(settings.more_words, vec!["cab", "bach"]);
        assert!(settings.use_allowed_words);
        assert_eq!(settings.stages[0].known_graphemes, vec!["a", "b"]);
        assert_eq!(settings.levels[0].max_words_per_sentence, 5);
        assert_eq!(settings.levels[0].max_words_per_book, 0);
        assert!((settings.levels[0].max_average_words_per_page - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn merge_replaces_only_present_fields() {
        let mut settings = three_stages();
        settings.sentence_punct = ";".to_string();
        let partial: PartialSettings =
            serde_json::from_str(r#"{"letters": "x y", "useAllowedWords": false}"#).unwrap();
        settings.merge(partial);
        assert_eq!(settings.letters, vec!["x", "y"]);
        assert_eq!(settings.stages.len(), 3);
        assert_eq!(settings.sentence_punct, ";");
    }

    #[test]
    fn grapheme_inventory_appends_stage_graphemes() {
        let mut settings = three_stages();
        settings.letters = vec!["a".to_string(), "th".to_string()];
        let inventory = settings.grapheme_inventory();
        assert_eq!(&inventory[..3], &["a", "th", "c"]);
        assert_eq!(inventory.len(), 14);
    }

    #[test]
    fn resolves_allowed_words_relative_to_base() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("stage1.txt"), "cat, sat\nmat").unwrap();
        let base = Utf8PathBuf::try_from(tmp.path().to_path_buf()).unwrap();

        let mut settings = three_stages();
        settings.stages[0].allowed_words_file = Some(Utf8PathBuf::from("stage1.txt"));
        settings.resolve_allowed_words(&base).unwrap();
        assert_eq!(settings.stages[0].allowed_words, vec!["cat", "sat", "mat"]);
        assert_eq!(settings.cumulative_allowed_words(3), vec!["cat", "sat", "mat"]);
    }

    #[test]
    fn missing_allowed_words_file_errors() {
        let mut settings = three_stages();
        settings.stages[1].allowed_words_file = Some(Utf8PathBuf::from("missing.txt"));
        let err = settings
            .resolve_allowed_words(Utf8Path::new("/nonexistent"))
            .unwrap_err();
        assert!(matches!(err, SettingsError::AllowedWordsFile { stage: 2, .. }));
    }
}
