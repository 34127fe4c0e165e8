//! Contracts between the progression controller and its host, plus
//! file-backed implementations of them.
//!
//! The controller never touches the filesystem or a display directly. It
//! reads settings and sample text through [`SettingsStore`] and
//! [`CorpusSource`], pushes results to a [`RenderTarget`], labels them with
//! a [`Localizer`], and reports failures that must not interrupt the
//! session to a [`ProblemReporter`].

use std::io::ErrorKind;

use camino::{Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};

use crate::decodability::WordEntry;
use crate::error::{CorpusError, CorpusResult, SettingsError, SettingsResult};
use crate::manuscript;
use crate::markup::PageMarkup;
use crate::model::{PartialSettings, Settings};

/// A letter as shown in the stage letter list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterEntry {
    /// The letter or grapheme.
    pub letter: String,
    /// Whether it was introduced at the current stage.
    pub is_new: bool,
}

/// Level limits rendered for display. An unlimited (0) limit is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitDisplay {
    /// `maxWordsPerSentence`
    pub max_words_per_sentence: String,
    /// `maxWordsPerPage`
    pub max_words_per_page: String,
    /// `maxWordsPerBook`
    pub max_words_per_book: String,
    /// `maxUniqueWordsPerBook`
    pub max_unique_words_per_book: String,
    /// `maxGlyphsPerWord`
    pub max_glyphs_per_word: String,
    /// `maxSentencesPerPage`
    pub max_sentences_per_page: String,
    /// `maxAverageWordsPerSentence`
    pub max_average_words_per_sentence: String,
    /// `maxAverageWordsPerPage`
    pub max_average_words_per_page: String,
    /// `maxAverageGlyphsPerWord`
    pub max_average_glyphs_per_word: String,
    /// `maxAverageSentencesPerPage`
    pub max_average_sentences_per_page: String,
}

/// Which navigation buttons are enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    /// Previous stage.
    pub stage_back: bool,
    /// Next stage.
    pub stage_forward: bool,
    /// Previous level.
    pub level_back: bool,
    /// Next level.
    pub level_forward: bool,
}

/// Current stage and level, as persisted between sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    /// One-based stage number, 0 when there are no stages.
    pub stage: usize,
    /// One-based level number, 0 when there are no levels.
    pub level: usize,
}

/// Where the controller's results are displayed.
///
/// Every method receives finished, ordered data; the target only presents it.
pub trait RenderTarget {
    /// A stage recomputation has started.
    fn show_loading(&self) {}
    /// The stage word list, already sorted.
    fn show_words(&self, words: &[WordEntry]);
    /// The cumulative letter list, in alphabet order.
    fn show_letters(&self, letters: &[LetterEntry]);
    /// The current level's limits.
    fn show_limits(&self, limits: &LimitDisplay);
    /// Navigation button states.
    fn show_navigation(&self, navigation: NavigationState);
    /// Markup of the manuscript pages under edit.
    fn show_markup(&self, _pages: &[PageMarkup]) {}
}

/// Persistence for the settings document and the user's progress.
pub trait SettingsStore {
    /// Load the settings document, with allowed-word lists resolved.
    fn load(&self) -> SettingsResult<Settings>;
    /// Replace the stored settings document.
    fn save(&self, settings: &Settings) -> SettingsResult<()>;
    /// Remember the current stage and level.
    fn save_progress(&self, progress: Progress) -> SettingsResult<()>;
}

/// Supplier of raw sample text for the word corpus.
pub trait CorpusSource {
    /// Every sample text, as prose.
    fn sample_texts(&self) -> CorpusResult<Vec<String>>;
}

/// Label translation.
pub trait Localizer {
    /// Translate `key`, falling back to `fallback`. `{0}`, `{1}`, ... are
    /// replaced by `args`.
    fn get_text(&self, key: &str, fallback: &str, args: &[&str]) -> String;
}

/// Host-level channel for failures that must not interrupt the session.
pub trait ProblemReporter {
    /// Report `error`, described by `context`.
    fn report(&self, context: &str, error: &dyn std::error::Error);
}

/// A [`Localizer`] with no translations.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackLocalizer;

impl Localizer for FallbackLocalizer {
    fn get_text(&self, _key: &str, fallback: &str, args: &[&str]) -> String {
        args.iter()
            .enumerate()
            .fold(fallback.to_string(), |text, (i, arg)| {
                text.replace(&format!("{{{i}}}"), arg)
            })
    }
}

/// A [`ProblemReporter`] that logs at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProblemReporter;

impl ProblemReporter for TracingProblemReporter {
    fn report(&self, context: &str, error: &dyn std::error::Error) {
        tracing::warn!(error = %error, "{context}");
    }
}

/// A [`SettingsStore`] backed by a JSON file.
///
/// The document may be partial; missing fields take their defaults. A
/// missing file loads as empty settings. Progress is written to a sibling
/// `<stem>.progress.json`.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: Utf8PathBuf,
}

impl JsonSettingsStore {
    /// A store for the settings document at `path`.
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the settings document.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Path of the progress file.
    pub fn progress_path(&self) -> Utf8PathBuf {
        let stem = self.path.file_stem().unwrap_or("settings");
        self.path.with_file_name(format!("{stem}.progress.json"))
    }

    /// Read the saved progress, if any.
    pub fn load_progress(&self) -> SettingsResult<Option<Progress>> {
        let path = self.progress_path();
        match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|source| SettingsError::Parse { path, source }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SettingsError::Io { path, source }),
        }
    }

    fn write_json<T: Serialize>(&self, path: &Utf8Path, value: &T) -> SettingsResult<()> {
        let json = serde_json::to_string_pretty(value).map_err(SettingsError::Serialize)?;
        std::fs::write(path, json + "\n").map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl SettingsStore for JsonSettingsStore {
    #[tracing::instrument(skip(self), fields(path = %self.path))]
    fn load(&self) -> SettingsResult<Settings> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!("settings file not found, using empty settings");
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(SettingsError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        let partial: PartialSettings =
            serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
                path: self.path.clone(),
                source,
            })?;

        let mut settings = Settings::default();
        settings.merge(partial);
        let base_dir = self.path.parent().unwrap_or_else(|| Utf8Path::new("."));
        settings.resolve_allowed_words(base_dir)?;
        tracing::info!(
            stages = settings.stage_count(),
            levels = settings.level_count(),
            "settings loaded"
        );
        Ok(settings)
    }

    fn save(&self, settings: &Settings) -> SettingsResult<()> {
        self.write_json(&self.path, settings)
    }

    fn save_progress(&self, progress: Progress) -> SettingsResult<()> {
        self.write_json(&self.progress_path(), &progress)
    }
}

/// A [`CorpusSource`] reading every matching file under a directory.
///
/// Files are matched by name against the configured globs and read in
/// path order. Markdown files (`.md`, `.markdown`) are reduced to prose.
#[derive(Debug, Clone)]
pub struct DirectoryCorpusSource {
    root: Utf8PathBuf,
    globs: GlobSet,
}

impl DirectoryCorpusSource {
    /// A source over `root`, keeping files whose name matches any pattern.
    pub fn new<S: AsRef<str>>(root: impl Into<Utf8PathBuf>, patterns: &[S]) -> CorpusResult<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = Glob::new(pattern).map_err(|source| CorpusError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;
            builder.add(glob);
        }
        let globs = builder.build().map_err(|source| CorpusError::Pattern {
            pattern: patterns
                .iter()
                .map(|p| p.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
            source,
        })?;
        Ok(Self {
            root: root.into(),
            globs,
        })
    }

    /// Every matching file, sorted.
    pub fn files(&self) -> CorpusResult<Vec<Utf8PathBuf>> {
        let mut files = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let entries = std::fs::read_dir(&dir).map_err(|source| CorpusError::Io {
                path: dir.clone(),
                source,
            })?;
            for entry in entries {
                let entry = entry.map_err(|source| CorpusError::Io {
                    path: dir.clone(),
                    source,
                })?;
                let path = Utf8PathBuf::try_from(entry.path())
                    .map_err(|e| CorpusError::NonUtf8Path(e.into_path_buf().display().to_string()))?;
                if path.is_dir() {
                    pending.push(path);
                } else if path.file_name().is_some_and(|name| self.globs.is_match(name)) {
                    files.push(path);
                }
            }
        }
        files.sort();
        Ok(files)
    }
}

impl CorpusSource for DirectoryCorpusSource {
    #[tracing::instrument(skip(self), fields(root = %self.root))]
    fn sample_texts(&self) -> CorpusResult<Vec<String>> {
        let files = self.files()?;
        let mut texts = Vec::with_capacity(files.len());
        for path in files {
            let content = std::fs::read_to_string(&path).map_err(|source| CorpusError::Io {
                path: path.clone(),
                source,
            })?;
            let markdown = matches!(path.extension(), Some("md" | "markdown"));
            texts.push(if markdown {
                manuscript::split_pages(&content, true).join("\n\n")
            } else {
                content
            });
        }
        tracing::debug!(files = texts.len(), "sample texts read");
        Ok(texts)
    }
}
