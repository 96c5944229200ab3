//! Text files as opened by the reader: body normalisation, pagination and
//! the `#METADATA` trailer that stores where the reader left off.

use std::fs;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

use crate::error::{LegiloError, Result};

use super::sentences::RE_SENTENCE;

const MIN_DOUBLE_LINE_BREAKS_FOR_MERGE: usize = 10;
const MAX_TITLE_LEN: usize = 100;
const MAX_TITLE_LINE_LEN: usize = 50;

/// Position stored in the metadata trailer of a text file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResumeMetadata {
    pub active_word_num: Option<usize>,
    pub page_index: Option<usize>,
    pub page_size: Option<usize>,
}

impl ResumeMetadata {
    /// Formats the trailer line, or `None` when there is nothing to store.
    pub fn to_line(&self) -> Option<String> {
        let mut items = Vec::new();
        if let Some(word_num) = self.active_word_num {
            items.push(format!("active_word_num = {}", word_num));
        }
        if let (Some(page_index), Some(page_size)) = (self.page_index, self.page_size) {
            items.push(format!("page_index = {}", page_index));
            items.push(format!("page_size = {}", page_size));
        }
        if items.is_empty() {
            None
        } else {
            Some(format!("#METADATA {}", items.join(", ")))
        }
    }

    pub fn parse(line: &str) -> Self {
        let line = line.trim().replace("#METADATA ", "").replace("# ", "");
        let mut meta = Self::default();
        for tag_and_value in line.split(", ") {
            let parts: Vec<&str> = tag_and_value.split(" = ").collect();
            if parts.len() != 2 {
                continue;
            }
            let value = parts[1].trim().parse::<usize>().ok();
            match parts[0].trim() {
                "active_word_num" => meta.active_word_num = value,
                "page_index" => meta.page_index = value,
                "page_size" => meta.page_size = value,
                other => log::debug!("ignoring unknown metadata tag '{}'", other),
            }
        }
        meta
    }
}

pub fn is_metadata_line(line: &str) -> bool {
    line.contains("#METADATA") || line.contains("# active_word_num")
}

/// A text split into pages.
#[derive(Debug, Clone)]
pub struct TextDocument {
    full_text: String,
    pages: Vec<String>,
    /// `None` for single-page texts.
    page_size: Option<usize>,
}

impl TextDocument {
    /// Builds the pages for an already normalised text.
    ///
    /// The stored page size from the metadata wins over the configured one,
    /// so saved word numbers keep pointing at the same words.
    pub fn paginate(
        full_text: String,
        meta: &ResumeMetadata,
        configured_page_size: usize,
        short_text_limit: usize,
    ) -> Self {
        let is_one_page_text = meta.active_word_num.is_some() && meta.page_size.is_none();
        let is_short_text = full_text.chars().count() <= short_text_limit;
        if is_one_page_text || is_short_text {
            return Self {
                pages: vec![full_text.clone()],
                full_text,
                page_size: None,
            };
        }
        let page_size = meta.page_size.unwrap_or(configured_page_size);
        Self {
            pages: split_into_pages(&full_text, page_size),
            full_text,
            page_size: Some(page_size),
        }
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }

    pub fn page(&self, index: usize) -> Option<&str> {
        self.pages.get(index).map(String::as_str)
    }

    pub fn num_pages(&self) -> usize {
        self.pages.len()
    }

    pub fn page_size(&self) -> Option<usize> {
        self.page_size
    }

    /// Metadata describing a reader position in this document.
    pub fn resume_metadata(&self, last_active: Option<(usize, usize)>, page_index: usize) -> ResumeMetadata {
        match last_active {
            Some((word_num, active_page)) => ResumeMetadata {
                active_word_num: Some(word_num),
                page_index: self.page_size.map(|_| active_page),
                page_size: self.page_size,
            },
            None => ResumeMetadata {
                active_word_num: None,
                page_index: self.page_size.map(|_| page_index),
                page_size: self.page_size,
            },
        }
    }

    /// File contents to write back: body plus the metadata trailer.
    /// Returns `None` for an empty text, which is never written.
    pub fn to_file_contents(&self, meta: &ResumeMetadata) -> Option<String> {
        if self.full_text.is_empty() {
            return None;
        }
        let mut contents = self.full_text.clone();
        if let Some(line) = meta.to_line() {
            contents.push_str("\n\n");
            contents.push_str(&line);
        }
        Some(contents)
    }
}

/// A parsed text file before pagination.
#[derive(Debug, Clone)]
pub struct LoadedText {
    pub text: String,
    pub meta: ResumeMetadata,
}

pub fn load_text_file(path: &Path) -> Result<LoadedText> {
    let bytes = fs::read(path)?;
    let raw = String::from_utf8(bytes).map_err(|e| LegiloError::NotText {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(parse_text(&raw))
}

/// Splits off the metadata line and normalises the body.
pub fn parse_text(raw: &str) -> LoadedText {
    let mut meta = ResumeMetadata::default();
    let mut body_lines = Vec::new();
    let mut found_meta = false;
    for line in raw.split_inclusive('\n') {
        if is_metadata_line(line) {
            if !found_meta {
                meta = ResumeMetadata::parse(line);
                found_meta = true;
            }
        } else {
            body_lines.push(line);
        }
    }
    let text: String = body_lines.concat().trim().nfc().collect();
    let text = remove_line_breaks_in_paragraphs(&text);
    let text = fix_paragraph_spacing(&text);
    let text = fix_title(&text);
    LoadedText { text, meta }
}

fn count_double_line_breaks(text: &str) -> usize {
    text.matches("\n\n").count()
}

// Replaces every line break that is not part of a run of line breaks.
fn replace_single_line_breaks(text: &str, replacement: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        let prev_is_break = i > 0 && chars[i - 1] == '\n';
        let next_is_break = chars.get(i + 1) == Some(&'\n');
        if c == '\n' && !prev_is_break && !next_is_break {
            out.push_str(replacement);
        } else {
            out.push(c);
        }
    }
    out
}

/// Joins lines inside paragraphs, but only for texts that clearly use blank
/// lines between paragraphs.
pub fn remove_line_breaks_in_paragraphs(text: &str) -> String {
    if count_double_line_breaks(text) >= MIN_DOUBLE_LINE_BREAKS_FOR_MERGE {
        replace_single_line_breaks(text, " ")
    } else {
        text.to_string()
    }
}

pub fn fix_paragraph_spacing(text: &str) -> String {
    if text.contains("\n\n") {
        text.to_string()
    } else {
        replace_single_line_breaks(text, "\n\n")
    }
}

/// Adds the first sentence as a title when the text starts with a long
/// multi-sentence line.
pub fn fix_title(text: &str) -> String {
    let first_line = text.split('\n').next().unwrap_or("");
    let num_sentences = RE_SENTENCE
        .find_iter(first_line)
        .filter(|m| !m.as_str().is_empty())
        .count();
    if num_sentences > 1 && first_line.chars().count() >= MAX_TITLE_LEN {
        if let Some(first) = RE_SENTENCE.find(text) {
            let mut title = first.as_str().trim().to_string();
            if title.ends_with('.') {
                title.pop();
            }
            return format!("{}\n\n{}", title, text);
        }
    }
    text.to_string()
}

pub fn split_into_pages(text: &str, page_size: usize) -> Vec<String> {
    let mut pages = Vec::new();
    let mut page = String::new();
    for line in text.split('\n') {
        let page_len = page.chars().count();
        if page_len > 0 && page_len + line.chars().count() >= page_size {
            pages.push(page.trim().to_string());
            page.clear();
        }
        page.push_str(line);
        page.push('\n');
    }
    pages.push(page.trim().to_string());
    pages
}

/// Heading heuristic used by the renderer.
pub fn line_is_title(line: &str) -> bool {
    const QUOTATION_MARKS: &str = "“”„‟«»‹›‘’‚‛′″❝❞❮❯〝〞＂'\"";
    const DASHES: &str = "‐‑‒–—―−﹘﹣－⸺⸻-";
    let line = line.trim();
    let (Some(first), Some(last)) = (line.chars().next(), line.chars().last()) else {
        return false;
    };
    if line.chars().count() > MAX_TITLE_LINE_LEN || last == '.' || last == ':' {
        return false;
    }
    if DASHES.contains(first) {
        return false;
    }
    !(QUOTATION_MARKS.contains(first) && QUOTATION_MARKS.contains(last))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_line_is_stripped_and_parsed() {
        let loaded = parse_text("Title\n\nSome text here.\n\n#METADATA active_word_num = 12, page_index = 1, page_size = 1800\n");
        assert_eq!(loaded.text, "Title\n\nSome text here.");
        assert_eq!(
            loaded.meta,
            ResumeMetadata { active_word_num: Some(12), page_index: Some(1), page_size: Some(1800) }
        );
    }

    #[test]
    fn legacy_and_garbled_metadata() {
        let meta = ResumeMetadata::parse("# active_word_num = 7");
        assert_eq!(meta.active_word_num, Some(7));
        let meta = ResumeMetadata::parse("#METADATA active_word_num = x, page_index = 2");
        assert_eq!(meta.active_word_num, None);
        assert_eq!(meta.page_index, Some(2));
    }

    #[test]
    fn single_breaks_become_paragraphs_without_blank_lines() {
        assert_eq!(fix_paragraph_spacing("a\nb\nc"), "a\n\nb\n\nc");
        assert_eq!(fix_paragraph_spacing("a\n\nb\nc"), "a\n\nb\nc");
    }

    #[test]
    fn lines_are_joined_inside_paragraphs_when_blank_lines_dominate() {
        let text = (0..11).map(|i| format!("p{} line\nwrapped", i)).collect::<Vec<_>>().join("\n\n");
        let merged = remove_line_breaks_in_paragraphs(&text);
        assert!(merged.starts_with("p0 line wrapped\n\np1 line wrapped"));
        let few = "a\nb\n\nc";
        assert_eq!(remove_line_breaks_in_paragraphs(few), few);
    }

    #[test]
    fn long_first_line_gets_a_title() {
        let first = format!("A short opening. {}", "word ".repeat(25));
        let fixed = fix_title(&first);
        assert!(fixed.starts_with("A short opening\n\nA short opening."));
        assert_eq!(fix_title("Title\n\nBody."), "Title\n\nBody.");
    }

    #[test]
    fn pages_pack_whole_lines() {
        let text = "aaaa\nbbbb\ncccc\ndddd";
        assert_eq!(split_into_pages(text, 10), vec!["aaaa\nbbbb", "cccc\ndddd"]);
        assert_eq!(split_into_pages(text, 1000), vec![text]);
    }

    #[test]
    fn short_and_legacy_texts_are_single_page() {
        let text = "line\n".repeat(50);
        let doc = TextDocument::paginate(text.clone(), &ResumeMetadata::default(), 20, 10_000);
        assert_eq!(doc.num_pages(), 1);
        assert_eq!(doc.page_size(), None);

        let legacy = ResumeMetadata { active_word_num: Some(3), ..Default::default() };
        let doc = TextDocument::paginate(text.clone(), &legacy, 20, 10);
        assert_eq!(doc.num_pages(), 1);

        let doc = TextDocument::paginate(text, &ResumeMetadata::default(), 20, 10);
        assert!(doc.num_pages() > 1);
        assert_eq!(doc.page_size(), Some(20));
    }

    #[test]
    fn stored_page_size_wins() {
        let text = "line\n".repeat(50);
        let meta = ResumeMetadata { active_word_num: Some(1), page_index: Some(0), page_size: Some(40) };
        let doc = TextDocument::paginate(text, &meta, 20, 10);
        assert_eq!(doc.page_size(), Some(40));
    }

    #[test]
    fn file_contents_round_trip_metadata() {
        let text = "x ".repeat(40).trim().to_string();
        let doc = TextDocument::paginate(text, &ResumeMetadata::default(), 30, 10);
        let meta = doc.resume_metadata(Some((4, 1)), 1);
        let contents = doc.to_file_contents(&meta).unwrap();
        let loaded = parse_text(&contents);
        assert_eq!(loaded.meta, meta);
        assert_eq!(loaded.text, doc.full_text());
    }

    #[test]
    fn single_page_metadata_has_no_page_fields() {
        let doc = TextDocument::paginate("Short.".into(), &ResumeMetadata::default(), 30, 1000);
        let meta = doc.resume_metadata(Some((1, 0)), 0);
        assert_eq!(meta.to_line().as_deref(), Some("#METADATA active_word_num = 1"));
        assert_eq!(doc.resume_metadata(None, 0).to_line(), None);
    }

    #[test]
    fn empty_text_is_never_written() {
        let doc = TextDocument::paginate(String::new(), &ResumeMetadata::default(), 30, 1000);
        assert!(doc.to_file_contents(&ResumeMetadata::default()).is_none());
    }

    #[test]
    fn non_utf8_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.epub");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x81]).unwrap();
        assert!(matches!(load_text_file(&path), Err(LegiloError::NotText { .. })));
    }

    #[test]
    fn titles() {
        assert!(line_is_title("Chapter One"));
        assert!(!line_is_title("It ended."));
        assert!(!line_is_title("— spoken line"));
        assert!(!line_is_title("«Quoted»"));
        assert!(!line_is_title(""));
    }
}
