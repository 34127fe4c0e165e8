//! Core library for reader-tools.
//!
//! Decodable and leveled reader analysis for authors of early-literacy
//! books. A decodable reader is written for a *stage*: the reader knows a
//! cumulative set of graphemes and sight words, and every word in the book
//! should be readable with just those. A leveled reader is written for a
//! *level*: ceilings on sentence, page and book complexity.
//!
//! # Modules
//!
//! - [`model`] - Stages, levels and the settings document
//! - [`corpus`] - Word-frequency corpus built from sample texts
//! - [`graphemes`] - Visual letter counting and grapheme splitting
//! - [`decodability`] - Selecting words a stage can decode
//! - [`statistics`] - Book statistics checked against a level
//! - [`markup`] - Per-word and per-sentence page markup
//! - [`controller`] - Stage/level progression with stale-result guarding
//! - [`collaborators`] - Host contracts and file-backed implementations
//! - [`config`] - Application configuration loading
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```
//! use reader_tools_core::{Settings, Stage, WordCorpus, GraphemeInventory};
//! use reader_tools_core::decodability::{DecodabilityFilter, WordQuery};
//!
//! let settings = Settings {
//!     stages: vec![Stage::new("a c s t", "the")],
//!     ..Settings::default()
//! };
//! let mut corpus = WordCorpus::new();
//! corpus.ingest("The cat sat on a mat.");
//!
//! let inventory = GraphemeInventory::new(&settings.grapheme_inventory());
//! let query = WordQuery::known(settings.cumulative_graphemes(1)).allow_upper_case(true);
//! let words = DecodabilityFilter::new(&corpus, &inventory).select_word_names(&query);
//! assert_eq!(words, vec!["a", "cat", "sat"]);
//! ```
#![deny(unsafe_code)]

pub mod collaborators;
pub mod config;
pub mod controller;
pub mod corpus;
pub mod decodability;
pub mod error;
pub mod graphemes;
pub mod manuscript;
pub mod markup;
pub mod model;
pub mod sorting;
pub mod statistics;
pub mod syllables;
pub mod text;

pub use config::{Config, ConfigLoader, ConfigSources, LogLevel};
pub use controller::{ProgressionController, StageOutcome};
pub use corpus::WordCorpus;
pub use error::{ConfigError, ConfigResult, ControllerError, CorpusError, SettingsError};
pub use graphemes::{GlyphCounter, GraphemeInventory, visual_length};
pub use model::{Level, Settings, Stage};
pub use sorting::SortMode;

/// Default maximum input size: 5 MiB.
pub const DEFAULT_MAX_INPUT_BYTES: usize = 5 * 1024 * 1024;
