use once_cell::sync::Lazy;
use regex::Regex;

use super::tokenizer::WordToken;

// A sentence runs up to `.`, `!` or `?` followed by whitespace or the end,
// otherwise up to the end of the line.
pub(crate) static RE_SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r".*?[.!?](?:\s|$)|.*?(?:\n|$)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceSpan {
    pub start_word_num: usize,
    pub end_word_num: usize,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl SentenceSpan {
    /// Sentence text with line/paragraph separators and runs of whitespace
    /// collapsed to single spaces.
    pub fn text(&self, page_text: &str) -> String {
        collapse_whitespace(&page_text[self.start_offset..self.end_offset])
    }
}

/// Sentences of one page, addressable by word number.
#[derive(Debug, Clone, Default)]
pub struct SentenceIndex {
    spans: Vec<SentenceSpan>,
    // word_num - 1 -> index into `spans`
    by_word: Vec<usize>,
}

impl SentenceIndex {
    pub fn sentence_of(&self, word_num: usize) -> Option<&SentenceSpan> {
        let idx = *self.by_word.get(word_num.checked_sub(1)?)?;
        self.spans.get(idx)
    }

    pub fn spans(&self) -> &[SentenceSpan] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

pub fn index_sentences(text: &str, tokens: &[WordToken]) -> SentenceIndex {
    let mut index = SentenceIndex {
        spans: Vec::new(),
        by_word: Vec::with_capacity(tokens.len()),
    };
    let mut next_token = 0;

    for m in RE_SENTENCE.find_iter(text) {
        if m.as_str().trim().is_empty() {
            continue;
        }
        let first = next_token;
        while next_token < tokens.len() && tokens[next_token].start_offset < m.end() {
            next_token += 1;
        }
        // Sentences made only of punctuation own no words and are dropped.
        if next_token == first {
            continue;
        }
        let span_idx = index.spans.len();
        index.spans.push(SentenceSpan {
            start_word_num: tokens[first].word_num,
            end_word_num: tokens[next_token - 1].word_num,
            start_offset: m.start(),
            end_offset: m.end(),
        });
        index.by_word.extend(std::iter::repeat(span_idx).take(next_token - first));
    }

    index
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
