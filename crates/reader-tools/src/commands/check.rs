//! Check command: mark words a reader cannot decode.

use anyhow::bail;
use camino::{Utf8Path, Utf8PathBuf};
use clap::Args;
use owo_colors::Style;
use reader_tools_core::Config;
use reader_tools_core::manuscript::split_pages;
use reader_tools_core::markup::{MarkedWord, PageMarkup};
use serde::Serialize;
use tracing::{debug, instrument};

use super::{enter_stage, is_markdown, paint, read_input_file};
use crate::host;

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Manuscript to check. Pages are separated by `---` or form feeds.
    pub file: Utf8PathBuf,

    /// One-based stage number.
    #[arg(short, long, default_value_t = 1)]
    pub stage: usize,

    /// One-based level whose length limits are flagged (default: first level).
    #[arg(short, long)]
    pub level: Option<usize>,
}

#[derive(Serialize)]
struct CheckReport {
    stage: String,
    level: String,
    pages: Vec<PageMarkup>,
    unreadable: Vec<String>,
    too_long: usize,
}

impl CheckReport {
    fn unreadable_words(pages: &[PageMarkup]) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        pages
            .iter()
            .flat_map(PageMarkup::unreadable)
            .filter(|w| seen.insert(w.text.to_lowercase()))
            .map(|w| w.text.clone())
            .collect()
    }

    fn too_long_count(pages: &[PageMarkup]) -> usize {
        pages
            .iter()
            .flat_map(|p| p.sentences.iter())
            .map(|s| usize::from(s.too_long) + s.words.iter().filter(|w| w.too_long).count())
            .sum()
    }
}

/// Mark up a manuscript for a stage and fail if any word is unreadable.
#[instrument(name = "cmd_check", skip_all, fields(file = %args.file, stage = args.stage))]
pub fn cmd_check(
    args: CheckArgs,
    global_json: bool,
    show_progress: bool,
    config: &Config,
    base_dir: &Utf8Path,
    max_input_bytes: Option<usize>,
) -> anyhow::Result<()> {
    debug!(file = %args.file, stage = args.stage, level = ?args.level, "executing check command");

    let content = read_input_file(&args.file, max_input_bytes)?;
    let controller = host::build_controller(config, base_dir, show_progress && !global_json)?;
    enter_stage(&controller, args.stage)?;
    if let Some(level) = args.level
        && !controller.set_level(level)
    {
        bail!(
            "level {level} does not exist (settings define {} levels)",
            controller.level_count_label()
        );
    }
    controller.set_pages(split_pages(&content, is_markdown(&args.file)));

    let pages = controller.markup();
    let report = CheckReport {
        stage: controller.stage_label(),
        level: controller.level_label(),
        unreadable: CheckReport::unreadable_words(&pages),
        too_long: CheckReport::too_long_count(&pages),
        pages,
    };

    if global_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_pages(&report.pages);
    }

    if !report.unreadable.is_empty() {
        bail!(
            "{} has {} word(s) not readable at stage {}: {}",
            args.file,
            report.unreadable.len(),
            report.stage,
            report.unreadable.join(", ")
        );
    }
    if !global_json {
        if report.too_long > 0 {
            println!(
                "{} {} sentence(s) or word(s) too long for level {}",
                paint("WARN:", Style::new().yellow()),
                report.too_long,
                report.level
            );
        }
        println!(
            "{} {} is readable at stage {}",
            paint("PASS:", Style::new().green()),
            args.file,
            report.stage
        );
    }
    Ok(())
}

fn print_pages(pages: &[PageMarkup]) {
    for (i, page) in pages.iter().enumerate() {
        println!("{}", paint(format!("Page {}", i + 1), Style::new().bold().underline()));
        for sentence in &page.sentences {
            let words: Vec<String> = sentence.words.iter().map(render_word).collect();
            let marker = if sentence.too_long {
                paint(" (too long)", Style::new().yellow())
            } else {
                String::new()
            };
            println!("  {}{marker}", words.join(" "));
        }
    }
}

fn render_word(word: &MarkedWord) -> String {
    match (word.status.is_readable(), word.too_long) {
        (false, _) => paint(&word.text, Style::new().red().bold()),
        (true, true) => paint(&word.text, Style::new().yellow()),
        (true, false) => word.text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reader_tools_core::markup::{MarkedSentence, WordStatus};

    fn word(text: &str, status: WordStatus, too_long: bool) -> MarkedWord {
        MarkedWord {
            text: text.to_string(),
            status,
            glyphs: text.chars().count(),
            too_long,
        }
    }

    fn pages() -> Vec<PageMarkup> {
        vec![
            PageMarkup {
                sentences: vec![MarkedSentence {
                    text: "The ship sat.".to_string(),
                    words: vec![
                        word("The", WordStatus::SightWord, false),
                        word("ship", WordStatus::NotDecodable, false),
                        word("sat", WordStatus::Decodable, false),
                    ],
                    too_long: true,
                }],
            },
            PageMarkup {
                sentences: vec![MarkedSentence {
                    text: "Ship catastrophe.".to_string(),
                    words: vec![
                        word("Ship", WordStatus::NotDecodable, false),
                        word("catastrophe", WordStatus::Decodable, true),
                    ],
                    too_long: false,
                }],
            },
        ]
    }

    #[test]
    fn unreadable_words_are_unique_ignoring_case() {
        assert_eq!(CheckReport::unreadable_words(&pages()), vec!["ship"]);
    }

    #[test]
    fn too_long_counts_sentences_and_words() {
        assert_eq!(CheckReport::too_long_count(&pages()), 2);
    }
}
