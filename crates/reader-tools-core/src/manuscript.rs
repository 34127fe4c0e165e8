//! Manuscript pages, pre-split into sentences and words.
//!
//! A manuscript file holds a whole book. Pages are separated by a
//! thematic break (`---`, `***`, `___` on a line of their own) or a
//! form feed. Markdown manuscripts are reduced to prose with pulldown-cmark
//! first, so code blocks, headings and markup never count as words.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::text::{self, Fragment};

/// One page of a book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    /// Sentence fragments, in order. May include fragments with no words.
    pub sentences: Vec<Fragment>,
}

impl Page {
    /// Split page text into sentences.
    pub fn from_text(text: &str, extra_punctuation: &str) -> Self {
        Self {
            sentences: text::split_sentences(text, extra_punctuation),
        }
    }

    /// Total words on the page.
    pub fn word_count(&self) -> usize {
        self.sentences.iter().map(|s| s.words.len()).sum()
    }

    /// Sentences that contain at least one word.
    pub fn sentence_count(&self) -> usize {
        self.sentences.iter().filter(|s| !s.words.is_empty()).count()
    }

    /// Every word on the page, in order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.sentences
            .iter()
            .flat_map(|s| s.words.iter().map(String::as_str))
    }
}

/// A whole book.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Book {
    /// Pages, in order.
    pub pages: Vec<Page>,
}

impl Book {
    /// Build a book from already separated page texts.
    pub fn from_pages<S: AsRef<str>>(pages: &[S], extra_punctuation: &str) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|p| Page::from_text(p.as_ref(), extra_punctuation))
                .collect(),
        }
    }

    /// Parse a manuscript file into pages.
    #[tracing::instrument(skip(manuscript, extra_punctuation), fields(len = manuscript.len()))]
    pub fn parse(manuscript: &str, markdown: bool, extra_punctuation: &str) -> Self {
        let pages = split_pages(manuscript, markdown);
        tracing::debug!(pages = pages.len(), "manuscript split into pages");
        Self::from_pages(&pages, extra_punctuation)
    }

    /// Every word in the book, in order.
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flat_map(Page::words)
    }
}

/// Split a manuscript into page texts.
///
/// Pages that are blank after splitting are dropped.
pub fn split_pages(manuscript: &str, markdown: bool) -> Vec<String> {
    let manuscript = strip_frontmatter(manuscript);
    let pages = if markdown {
        markdown_pages(&manuscript)
    } else {
        plain_pages(&manuscript)
    };
    pages
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn plain_pages(text: &str) -> Vec<String> {
    let mut pages = vec![String::new()];
    for line in text.lines() {
        if is_break_line(line) {
            pages.push(String::new());
            continue;
        }
        let mut parts = line.split('\u{c}');
        if let Some(first) = parts.next()
            && let Some(page) = pages.last_mut()
        {
            page.push_str(first);
        }
        for part in parts {
            pages.push(part.to_string());
        }
        if let Some(page) = pages.last_mut() {
            page.push('\n');
        }
    }
    pages
}

fn is_break_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3
        && ['-', '*', '_']
            .iter()
            .any(|&c| trimmed.chars().all(|ch| ch == c || ch == ' '))
}

fn markdown_pages(text: &str) -> Vec<String> {
    let options =
        Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES;
    let mut pages = vec![String::new()];
    let mut skip_depth: usize = 0;

    // Form feeds are not markdown; turn them into thematic breaks first.
    let text = text.replace('\u{c}', "\n\n---\n\n");
    for event in Parser::new_ext(&text, options) {
        if matches!(event, Event::Rule) {
            pages.push(String::new());
            continue;
        }
        let Some(page) = pages.last_mut() else {
            break;
        };
        match event {
            Event::Start(Tag::CodeBlock(_) | Tag::Heading { .. }) => skip_depth += 1,
            Event::End(TagEnd::CodeBlock | TagEnd::Heading(_)) => {
                skip_depth = skip_depth.saturating_sub(1);
            }
            Event::Text(t) if skip_depth == 0 => page.push_str(&t),
            Event::SoftBreak | Event::HardBreak if skip_depth == 0 => page.push(' '),
            Event::End(TagEnd::Paragraph | TagEnd::Item) if skip_depth == 0 => page.push(' '),
            _ => {}
        }
    }
    pages
}

/// Strip YAML frontmatter delimited by `---` lines.
///
/// The block only counts as frontmatter when every line in it reads as
/// YAML; otherwise the opening `---` is a page break.
fn strip_frontmatter(text: &str) -> String {
    let trimmed = text.trim_start();
    if !trimmed.starts_with("---\n") && !trimmed.starts_with("---\r\n") {
        return text.to_string();
    }
    let Some((_, after_opening)) = trimmed.split_once('\n') else {
        return text.to_string();
    };
    let Some(close_pos) = after_opening.find("\n---") else {
        return text.to_string();
    };
    if !is_yaml_block(&after_opening[..close_pos]) {
        return text.to_string();
    }
    let rest = &after_opening[close_pos + 4..];
    rest.strip_prefix('\n').unwrap_or(rest).to_string()
}

fn is_yaml_block(block: &str) -> bool {
    let mut lines = block.lines().filter(|l| !l.trim().is_empty()).peekable();
    lines.peek().is_some()
        && lines.all(|line| {
            let trimmed = line.trim_end();
            line.starts_with([' ', '\t'])
                || trimmed.starts_with('#')
                || trimmed.starts_with("- ")
                || trimmed
                    .split_once(':')
                    .is_some_and(|(key, value)| {
                        !key.is_empty()
                            && !key.contains(char::is_whitespace)
                            && (value.is_empty() || value.starts_with(' '))
                    })
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_counts_words_and_sentences() {
        let page = Page::from_text("Sam sat. ... The cat ran!", "");
        assert_eq!(page.word_count(), 5);
        assert_eq!(page.sentences.len(), 3);
        assert_eq!(page.sentence_count(), 2);
    }

    #[test]
    fn plain_pages_split_on_rules_and_form_feeds() {
        let text = "Sam sat.\n---\nBob ran.\u{c}Fig hid.\n\n***\n";
        let pages = split_pages(text, false);
        assert_eq!(pages, vec!["Sam sat.", "Bob ran.", "Fig hid."]);
    }

    #[test]
    fn markdown_pages_drop_markup() {
        let text = "# Title\n\nSam *sat*.\n\n---\n\n```\ncode here\n```\n\nBob ran.\n";
        let pages = split_pages(text, true);
        assert_eq!(pages, vec!["Sam sat.", "Bob ran."]);
    }

    #[test]
    fn frontmatter_is_not_a_page_break() {
        let text = "---\ntitle: Cats\n---\nSam sat.\n---\nBob ran.\n";
        let pages = split_pages(text, false);
        assert_eq!(pages, vec!["Sam sat.", "Bob ran."]);
    }

    #[test]
    fn leading_break_keeps_first_page() {
        let text = "---\nSam sat.\n---\nBob ran.\n";
        assert_eq!(split_pages(text, false), vec!["Sam sat.", "Bob ran."]);
    }

    #[test]
    fn prose_with_colon_is_not_frontmatter() {
        let text = "---\nSam said: go.\n---\nBob ran.\n";
        assert_eq!(split_pages(text, false), vec!["Sam said: go.", "Bob ran."]);
    }

    #[test]
    fn book_words_span_pages() {
        let book = Book::parse("Sam sat.\n---\nBob ran.", false, "");
        assert_eq!(book.pages.len(), 2);
        assert_eq!(book.words().collect::<Vec<_>>(), vec!["Sam", "sat", "Bob", "ran"]);
    }

    #[test]
    fn empty_manuscript_has_no_pages() {
        assert!(Book::parse("", false, "").pages.is_empty());
        assert!(Book::parse("\n---\n", true, "").pages.is_empty());
    }
}
