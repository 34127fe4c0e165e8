//! The progression controller: current stage and level, and the
//! recomputation of everything derived from them.
//!
//! One controller exists per editing session and is passed by reference to
//! whatever needs it. It is single-threaded (`!Send`): state lives in
//! `RefCell`/`Cell` and is never borrowed across an `.await`.
//!
//! Changing stage updates the stage number and navigation synchronously,
//! then recomputes graphemes, words, letters and markup after yielding
//! once so the host can show a loading state. Every stage change bumps a
//! generation counter. Each recomputation step re-checks its generation and
//! stage before committing, and a superseded computation discards its
//! results instead of applying them.

use std::cell::{Cell, Ref, RefCell};
use std::future::Future;
use std::ops::RangeInclusive;
use std::rc::Rc;

use tracing::Instrument;

use crate::collaborators::{
    CorpusSource, LetterEntry, LimitDisplay, Localizer, NavigationState, ProblemReporter,
    Progress, RenderTarget, SettingsStore,
};
use crate::corpus::{DEFAULT_MAX_WORDS_PER_INGEST, WordCorpus};
use crate::decodability::{
    DEFAULT_SYLLABLE_LENGTHS, DEFAULT_VOCABULARY_GROUPS, DecodabilityFilter, VocabularyGroups,
    WordEntry, WordQuery, allowed_word_entries, with_sight_words,
};
use crate::error::ControllerResult;
use crate::graphemes::{GlyphCounter, GraphemeInventory};
use crate::markup::{PageMarkup, StageKnowledge, mark_page};
use crate::model::{Level, Settings};
use crate::sorting::{SortMode, order_by_alphabet, sort_words};

/// The host services a controller talks to.
#[derive(Clone)]
pub struct Collaborators {
    /// Where results are displayed.
    pub render: Rc<dyn RenderTarget>,
    /// Settings and progress persistence.
    pub store: Rc<dyn SettingsStore>,
    /// Sample text for the word corpus.
    pub corpus_source: Rc<dyn CorpusSource>,
    /// Label translation.
    pub localizer: Rc<dyn Localizer>,
    /// Channel for non-fatal failures.
    pub problems: Rc<dyn ProblemReporter>,
}

/// Tunables fixed for the life of a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerOptions {
    /// Initial word-list ordering.
    pub sort: SortMode,
    /// Number of vocabulary groups used by group filters.
    pub vocabulary_groups: usize,
    /// Per-text ingestion ceiling, 0 for none.
    pub max_words_per_ingest: usize,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            sort: SortMode::default(),
            vocabulary_groups: DEFAULT_VOCABULARY_GROUPS,
            max_words_per_ingest: DEFAULT_MAX_WORDS_PER_INGEST,
        }
    }
}

/// Optional narrowing of the stage word list. Applies from the next stage
/// recomputation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordFilters {
    /// Accepted estimated syllable counts.
    pub syllable_lengths: RangeInclusive<usize>,
    /// Accepted vocabulary groups, or all.
    pub vocabulary_groups: Option<Vec<usize>>,
    /// Accepted parts of speech, or all.
    pub parts_of_speech: Option<Vec<String>>,
}

impl Default for WordFilters {
    fn default() -> Self {
        Self {
            syllable_lengths: DEFAULT_SYLLABLE_LENGTHS,
            vocabulary_groups: None,
            parts_of_speech: None,
        }
    }
}

/// How a stage change ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    /// Every recomputed result was applied.
    Applied,
    /// The stage number was out of range; nothing changed.
    Ignored,
    /// A newer change superseded this one; its results were discarded.
    Superseded,
}

/// Handle returned by [`ProgressionController::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type WordListener = Rc<dyn Fn(&[WordEntry])>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Ticket {
    stage: usize,
    generation: u64,
}

#[derive(Default)]
struct Session {
    settings: Settings,
    corpus: WordCorpus,
    groups: Option<VocabularyGroups>,
    inventory: GraphemeInventory,
    counter: GlyphCounter,
    stage: usize,
    level: usize,
    sort: SortMode,
    filters: WordFilters,
    known_graphemes: Vec<String>,
    words: Vec<WordEntry>,
    letters: Vec<LetterEntry>,
    pages: Vec<String>,
    markup: Vec<PageMarkup>,
}

/// Owns the current stage and level and keeps the display in step with them.
pub struct ProgressionController {
    session: RefCell<Session>,
    generation: Cell<u64>,
    listeners: RefCell<Vec<(SubscriptionId, WordListener)>>,
    next_subscription: Cell<u64>,
    options: ControllerOptions,
    host: Collaborators,
}

impl std::fmt::Debug for ProgressionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = self.session.borrow();
        f.debug_struct("ProgressionController")
            .field("stage", &session.stage)
            .field("level", &session.level)
            .field("generation", &self.generation.get())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl ProgressionController {
    /// A controller with empty settings and corpus. Call [`reload`](Self::reload)
    /// to load them.
    pub fn new(host: Collaborators, options: ControllerOptions) -> Self {
        let corpus = WordCorpus::new().with_max_words_per_ingest(options.max_words_per_ingest);
        Self {
            session: RefCell::new(Session {
                corpus,
                sort: options.sort,
                ..Session::default()
            }),
            generation: Cell::new(0),
            listeners: RefCell::new(Vec::new()),
            next_subscription: Cell::new(0),
            options,
            host,
        }
    }

    /// Load settings and rebuild the corpus from scratch, then select stage 1.
    ///
    /// Stage and level are reset. Any recomputation still in flight is
    /// superseded.
    #[tracing::instrument(skip(self))]
    pub async fn reload(&self) -> ControllerResult<StageOutcome> {
        let settings = self.host.store.load()?;
        let texts = self.host.corpus_source.sample_texts()?;

        let mut corpus =
            WordCorpus::new().with_max_words_per_ingest(self.options.max_words_per_ingest);
        for text in &texts {
            corpus.ingest(text);
        }
        corpus.add_vocabulary(&settings.more_words);
        tracing::info!(
            texts = texts.len(),
            words = corpus.len(),
            stages = settings.stage_count(),
            levels = settings.level_count(),
            "corpus rebuilt"
        );

        let stage_count = settings.stage_count();
        {
            let inventory = settings.grapheme_inventory();
            let mut session = self.session.borrow_mut();
            session.inventory = GraphemeInventory::new(&inventory);
            session.counter = GlyphCounter::new(&inventory);
            session.level = usize::from(settings.level_count() > 0);
            session.stage = 0;
            session.settings = settings;
            session.corpus = corpus;
            session.groups = None;
            session.known_graphemes.clear();
            session.words.clear();
            session.letters.clear();
            session.markup.clear();
        }
        self.generation.set(self.generation.get() + 1);

        self.host.render.show_limits(&self.limits());
        self.host.render.show_navigation(self.navigation());
        if stage_count == 0 {
            self.host.render.show_words(&[]);
            self.host.render.show_letters(&[]);
            return Ok(StageOutcome::Ignored);
        }
        Ok(self.set_stage(1).await)
    }

    /// Move to one-based stage `number`.
    ///
    /// The stage number, navigation state and loading indicator change
    /// before this returns; the returned future performs the recomputation.
    /// An out-of-range number changes nothing and resolves to
    /// [`StageOutcome::Ignored`].
    pub fn set_stage(&self, number: usize) -> impl Future<Output = StageOutcome> + '_ {
        let ticket = self.begin_stage(number);
        let span = tracing::debug_span!("stage_recompute", stage = number);
        async move {
            match ticket {
                Some(ticket) => self.recompute(ticket).await,
                None => StageOutcome::Ignored,
            }
        }
        .instrument(span)
    }

    fn begin_stage(&self, number: usize) -> Option<Ticket> {
        let stage_count = self.session.borrow().settings.stage_count();
        if !(1..=stage_count).contains(&number) {
            tracing::debug!(number, stage_count, "stage out of range, ignored");
            return None;
        }

        self.session.borrow_mut().stage = number;
        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        self.host.render.show_navigation(self.navigation());
        self.host.render.show_loading();
        self.persist_progress();
        Some(Ticket {
            stage: number,
            generation,
        })
    }

    async fn recompute(&self, ticket: Ticket) -> StageOutcome {
        tokio::task::yield_now().await;

        let known = self.session.borrow().settings.cumulative_graphemes(ticket.stage);
        if !self.is_current(ticket, "graphemes") {
            return StageOutcome::Superseded;
        }
        self.session.borrow_mut().known_graphemes = known;

        let words = self.compute_words(ticket.stage);
        if !self.is_current(ticket, "words") {
            return StageOutcome::Superseded;
        }
        self.session.borrow_mut().words.clone_from(&words);
        self.notify(&words);
        if !self.is_current(ticket, "word render") {
            return StageOutcome::Superseded;
        }
        self.host.render.show_words(&words);

        let letters = self.compute_letters(ticket.stage);
        if !self.is_current(ticket, "letters") {
            return StageOutcome::Superseded;
        }
        self.session.borrow_mut().letters.clone_from(&letters);
        self.host.render.show_letters(&letters);

        let markup = self.compute_markup();
        if !self.is_current(ticket, "markup") {
            return StageOutcome::Superseded;
        }
        self.session.borrow_mut().markup.clone_from(&markup);
        self.host.render.show_markup(&markup);

        tracing::debug!(words = words.len(), letters = letters.len(), "stage applied");
        StageOutcome::Applied
    }

    fn is_current(&self, ticket: Ticket, step: &str) -> bool {
        let current = self.generation.get() == ticket.generation
            && self.session.borrow().stage == ticket.stage;
        if !current {
            tracing::debug!(
                step,
                stage = ticket.stage,
                generation = ticket.generation,
                "stale result discarded"
            );
        }
        current
    }

    fn compute_words(&self, stage: usize) -> Vec<WordEntry> {
        let mut guard = self.session.borrow_mut();
        if guard.filters.vocabulary_groups.is_some() && guard.groups.is_none() {
            guard.groups = Some(VocabularyGroups::classify(
                &guard.corpus,
                self.options.vocabulary_groups,
            ));
        }
        let session = &*guard;
        let settings = &session.settings;

        let words = if settings.use_allowed_words {
            allowed_word_entries(&settings.cumulative_allowed_words(stage), &session.corpus)
        } else {
            let mut query = WordQuery::known(session.known_graphemes.clone())
                .allow_upper_case(true)
                .syllable_lengths(session.filters.syllable_lengths.clone());
            if let Some(ref groups) = session.filters.vocabulary_groups {
                query = query.vocabulary_groups(groups.clone());
            }
            if let Some(ref tags) = session.filters.parts_of_speech {
                query = query.parts_of_speech(tags.clone());
            }
            let mut filter = DecodabilityFilter::new(&session.corpus, &session.inventory);
            if let Some(ref groups) = session.groups {
                filter = filter.with_groups(groups);
            }
            filter.select_words(&query)
        };

        let mut words = with_sight_words(
            words,
            &settings.cumulative_sight_words(stage),
            &session.corpus,
        );
        sort_words(&mut words, session.sort);
        words
    }

    fn compute_letters(&self, stage: usize) -> Vec<LetterEntry> {
        let session = self.session.borrow();
        let new: Vec<String> = session.settings.new_graphemes(stage);
        let mut letters = session.known_graphemes.clone();
        order_by_alphabet(&mut letters, &session.settings.letters);
        letters
            .into_iter()
            .map(|letter| LetterEntry {
                is_new: new.contains(&letter),
                letter,
            })
            .collect()
    }

    fn compute_markup(&self) -> Vec<PageMarkup> {
        let session = self.session.borrow();
        if session.pages.is_empty() {
            return Vec::new();
        }
        let knowledge = StageKnowledge::for_stage(&session.settings, session.stage);
        let level = session.settings.level(session.level);
        session
            .pages
            .iter()
            .map(|page| {
                mark_page(
                    page,
                    &knowledge,
                    level,
                    &session.inventory,
                    &session.counter,
                    &session.settings.sentence_punct,
                )
            })
            .collect()
    }

    /// Move to one-based level `number`. Returns false, changing nothing,
    /// when the number is out of range.
    pub fn set_level(&self, number: usize) -> bool {
        let level_count = self.session.borrow().settings.level_count();
        if !(1..=level_count).contains(&number) {
            tracing::debug!(number, level_count, "level out of range, ignored");
            return false;
        }
        self.session.borrow_mut().level = number;
        self.host.render.show_limits(&self.limits());
        self.host.render.show_navigation(self.navigation());
        self.persist_progress();

        let markup = self.compute_markup();
        if !markup.is_empty() {
            self.session.borrow_mut().markup.clone_from(&markup);
            self.host.render.show_markup(&markup);
        }
        true
    }

    /// Change the word-list ordering and re-sort the current list.
    pub fn set_sort(&self, mode: SortMode) {
        let words = {
            let mut session = self.session.borrow_mut();
            session.sort = mode;
            sort_words(&mut session.words, mode);
            session.words.clone()
        };
        self.host.render.show_words(&words);
    }

    /// Narrow the word list from the next stage recomputation on.
    pub fn set_word_filters(&self, filters: WordFilters) {
        self.session.borrow_mut().filters = filters;
    }

    /// Replace the manuscript pages marked up for the current stage and level.
    pub fn set_pages(&self, pages: Vec<String>) {
        self.session.borrow_mut().pages = pages;
        let markup = self.compute_markup();
        self.session.borrow_mut().markup.clone_from(&markup);
        self.host.render.show_markup(&markup);
    }

    fn persist_progress(&self) {
        let progress = self.progress();
        if let Err(e) = self.host.store.save_progress(progress) {
            self.host.problems.report("failed to save reading progress", &e);
        }
    }

    /// Register `listener` for every applied word list.
    pub fn subscribe(&self, listener: impl Fn(&[WordEntry]) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.get());
        self.next_subscription.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Remove a listener. Returns false if it was already removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn notify(&self, words: &[WordEntry]) {
        let listeners: Vec<WordListener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener(words);
        }
    }

    /// Current stage and level numbers.
    pub fn progress(&self) -> Progress {
        let session = self.session.borrow();
        Progress {
            stage: session.stage,
            level: session.level,
        }
    }

    /// Current one-based stage, 0 before any stage is selected.
    pub fn current_stage(&self) -> usize {
        self.session.borrow().stage
    }

    /// Current one-based level, 0 when there are no levels.
    pub fn current_level(&self) -> usize {
        self.session.borrow().level
    }

    /// The loaded settings.
    pub fn settings(&self) -> Ref<'_, Settings> {
        Ref::map(self.session.borrow(), |s| &s.settings)
    }

    /// The corpus built by the last reload.
    pub fn corpus(&self) -> Ref<'_, WordCorpus> {
        Ref::map(self.session.borrow(), |s| &s.corpus)
    }

    /// The last applied word list.
    pub fn words(&self) -> Vec<WordEntry> {
        self.session.borrow().words.clone()
    }

    /// The last applied letter list.
    pub fn letters(&self) -> Vec<LetterEntry> {
        self.session.borrow().letters.clone()
    }

    /// The last applied page markup.
    pub fn markup(&self) -> Vec<PageMarkup> {
        self.session.borrow().markup.clone()
    }

    /// Graphemes known at the current stage, as last applied.
    pub fn known_graphemes(&self) -> Vec<String> {
        self.session.borrow().known_graphemes.clone()
    }

    /// Which navigation buttons should be enabled.
    pub fn navigation(&self) -> NavigationState {
        let session = self.session.borrow();
        let stages = session.settings.stage_count();
        let levels = session.settings.level_count();
        NavigationState {
            stage_back: session.stage > 1,
            stage_forward: session.stage >= 1 && session.stage < stages,
            level_back: session.level > 1,
            level_forward: session.level >= 1 && session.level < levels,
        }
    }

    /// The current level's limits as display strings.
    pub fn limits(&self) -> LimitDisplay {
        let session = self.session.borrow();
        session
            .settings
            .level(session.level)
            .map(limit_display)
            .unwrap_or_default()
    }

    /// Current stage name, or `"0"` when there are no stages.
    pub fn stage_label(&self) -> String {
        let session = self.session.borrow();
        session
            .settings
            .stage(session.stage)
            .map_or_else(|| "0".to_string(), |s| s.display_name(session.stage))
    }

    /// Current level name, or `"0"` when there are no levels.
    pub fn level_label(&self) -> String {
        let session = self.session.borrow();
        session
            .settings
            .level(session.level)
            .map_or_else(|| "0".to_string(), |l| l.display_name(session.level))
    }

    /// Number of stages as a label.
    pub fn stage_count_label(&self) -> String {
        self.session.borrow().settings.stage_count().to_string()
    }

    /// Number of levels as a label.
    pub fn level_count_label(&self) -> String {
        self.session.borrow().settings.level_count().to_string()
    }

    /// Localized "Stage N of M" heading.
    pub fn stage_heading(&self) -> String {
        let (label, count) = (self.stage_label(), self.stage_count_label());
        self.host
            .localizer
            .get_text("ReaderTools.StageHeading", "Stage {0} of {1}", &[label.as_str(), count.as_str()])
    }

    /// Localized "Level N of M" heading.
    pub fn level_heading(&self) -> String {
        let (label, count) = (self.level_label(), self.level_count_label());
        self.host
            .localizer
            .get_text("ReaderTools.LevelHeading", "Level {0} of {1}", &[label.as_str(), count.as_str()])
    }
}

fn limit_display(level: &Level) -> LimitDisplay {
    let count = |value: usize| {
        if value == 0 {
            String::new()
        } else {
            value.to_string()
        }
    };
    let average = |value: f64| {
        if value == 0.0 {
            String::new()
        } else {
            value.to_string()
        }
    };
    LimitDisplay {
        max_words_per_sentence: count(level.max_words_per_sentence),
        max_words_per_page: count(level.max_words_per_page),
        max_words_per_book: count(level.max_words_per_book),
        max_unique_words_per_book: count(level.max_unique_words_per_book),
        max_glyphs_per_word: count(level.max_glyphs_per_word),
        max_sentences_per_page: count(level.max_sentences_per_page),
        max_average_words_per_sentence: average(level.max_average_words_per_sentence),
        max_average_words_per_page: average(level.max_average_words_per_page),
        max_average_glyphs_per_word: average(level.max_average_glyphs_per_word),
        max_average_sentences_per_page: average(level.max_average_sentences_per_page),
    }
}
