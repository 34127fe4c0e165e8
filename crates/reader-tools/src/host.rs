//! Terminal host for the progression controller.
//!
//! Wires the configured settings document and corpus directory to the
//! controller's collaborator contracts, and shows a spinner on stderr while
//! a stage is being recomputed.

use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use indicatif::{ProgressBar, ProgressStyle};
use reader_tools_core::collaborators::{
    CorpusSource, DirectoryCorpusSource, FallbackLocalizer, JsonSettingsStore, LetterEntry,
    LimitDisplay, NavigationState, RenderTarget, TracingProblemReporter,
};
use reader_tools_core::controller::{Collaborators, ControllerOptions};
use reader_tools_core::decodability::WordEntry;
use reader_tools_core::error::CorpusResult;
use reader_tools_core::{Config, ProgressionController};
use tracing::debug;

/// Settings document used when the configuration names none.
pub const DEFAULT_SETTINGS_FILE: &str = "reader-settings.json";

/// Renders controller progress as a stderr spinner.
///
/// Results themselves are read back from the controller and printed by the
/// command, so only the loading state is shown here.
#[derive(Debug, Clone)]
pub struct SpinnerRender {
    bar: ProgressBar,
}

impl SpinnerRender {
    /// A spinner, or a hidden one when `visible` is false.
    pub fn new(visible: bool) -> Self {
        let bar = if visible {
            let bar = ProgressBar::new_spinner();
            if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
                bar.set_style(style);
            }
            bar
        } else {
            ProgressBar::hidden()
        };
        Self { bar }
    }
}

impl RenderTarget for SpinnerRender {
    fn show_loading(&self) {
        self.bar.set_message("selecting words");
        self.bar.enable_steady_tick(Duration::from_millis(80));
    }

    fn show_words(&self, words: &[WordEntry]) {
        debug!(count = words.len(), "word list ready");
        self.bar.finish_and_clear();
    }

    fn show_letters(&self, _letters: &[LetterEntry]) {}

    fn show_limits(&self, _limits: &LimitDisplay) {}

    fn show_navigation(&self, _navigation: NavigationState) {}
}

/// Corpus source for a configuration without `corpus_dir`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCorpus;

impl CorpusSource for NoCorpus {
    fn sample_texts(&self) -> CorpusResult<Vec<String>> {
        Ok(Vec::new())
    }
}

/// Path of the settings document for `config`.
pub fn settings_path(config: &Config, base_dir: &Utf8Path) -> Utf8PathBuf {
    config
        .settings_path(base_dir)
        .unwrap_or_else(|| base_dir.join(DEFAULT_SETTINGS_FILE))
}

/// Build a controller over the configured settings and corpus.
///
/// The controller is not loaded yet; call
/// [`ProgressionController::reload`] before selecting a stage.
pub fn build_controller(
    config: &Config,
    base_dir: &Utf8Path,
    show_progress: bool,
) -> anyhow::Result<ProgressionController> {
    let store = JsonSettingsStore::new(settings_path(config, base_dir));
    let corpus_source: Rc<dyn CorpusSource> = match config.corpus_path(base_dir) {
        Some(dir) => Rc::new(
            DirectoryCorpusSource::new(dir.clone(), &config.corpus_globs)
                .with_context(|| format!("invalid corpus configuration for {dir}"))?,
        ),
        None => Rc::new(NoCorpus),
    };
    debug!(settings = %store.path(), "building controller");

    let host = Collaborators {
        render: Rc::new(SpinnerRender::new(show_progress)),
        store: Rc::new(store),
        corpus_source,
        localizer: Rc::new(FallbackLocalizer),
        problems: Rc::new(TracingProblemReporter),
    };
    let options = ControllerOptions {
        sort: config.sort,
        vocabulary_groups: config.vocabulary_groups,
        max_words_per_ingest: config.max_words_per_ingest,
    };
    Ok(ProgressionController::new(host, options))
}

/// Run a controller future to completion on a single-threaded runtime.
pub fn block_on<F: std::future::Future>(future: F) -> anyhow::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .context("failed to create async runtime")?;
    Ok(runtime.block_on(future))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reader_tools_core::StageOutcome;

    #[test]
    fn settings_path_defaults_next_to_base_dir() {
        let config = Config::default();
        assert_eq!(
            settings_path(&config, Utf8Path::new("/books")),
            Utf8PathBuf::from("/books/reader-settings.json")
        );

        let config = Config {
            settings_file: Some(Utf8PathBuf::from("conf/settings.json")),
            ..Config::default()
        };
        assert_eq!(
            settings_path(&config, Utf8Path::new("/books")),
            Utf8PathBuf::from("/books/conf/settings.json")
        );
    }

    #[test]
    fn controller_loads_from_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let base = Utf8Path::from_path(tmp.path()).unwrap();
        std::fs::write(
            base.join(DEFAULT_SETTINGS_FILE),
            r#"{"letters": "a c s t", "stages": [{"letters": "a c s t", "sightWords": ""}]}"#,
        )
        .unwrap();
        std::fs::create_dir(base.join("corpus")).unwrap();
        std::fs::write(base.join("corpus/one.txt"), "a cat sat").unwrap();

        let config = Config {
            corpus_dir: Some(Utf8PathBuf::from("corpus")),
            ..Config::default()
        };
        let controller = build_controller(&config, base, false).unwrap();
        let outcome = block_on(controller.reload()).unwrap().unwrap();
        assert_eq!(outcome, StageOutcome::Applied);

        let names: Vec<String> = controller.words().into_iter().map(|w| w.name).collect();
        assert_eq!(names, vec!["a", "cat", "sat"]);
    }

    #[test]
    fn missing_settings_file_gives_no_stages() {
        let tmp = tempfile::tempdir().unwrap();
        let base = Utf8Path::from_path(tmp.path()).unwrap();
        let controller = build_controller(&Config::default(), base, false).unwrap();
        let outcome = block_on(controller.reload()).unwrap().unwrap();
        assert_eq!(outcome, StageOutcome::Ignored);
        assert!(controller.words().is_empty());
    }

    #[test]
    fn bad_corpus_glob_is_an_error() {
        let config = Config {
            corpus_dir: Some(Utf8PathBuf::from("/nonexistent")),
            corpus_globs: vec!["[".to_string()],
            ..Config::default()
        };
        assert!(build_controller(&config, Utf8Path::new("/"), false).is_err());
    }
}
