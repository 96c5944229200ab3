//! Saved phrases and their located occurrences on a page.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::word_info::WordInfo;
use crate::text::tokenizer::WordToken;

/// A saved multi-word expression with its looked-up info.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PhraseDefinition {
    pub words: Vec<String>,
    pub info: WordInfo,
}

impl PhraseDefinition {
    pub fn new(words: Vec<String>, mut info: WordInfo) -> Self {
        info.phrase_words = Some(words.clone());
        Self { words, info }
    }

    /// The phrase as one space-separated string, the key used for personal
    /// translations.
    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

/// Phrase definitions keyed by their first word. Definitions sharing a first
/// word keep their insertion order.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct PhraseBook {
    by_first_word: BTreeMap<String, Vec<PhraseDefinition>>,
}

impl PhraseBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidates(&self, first_word: &str) -> &[PhraseDefinition] {
        self.by_first_word
            .get(first_word)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get(&self, words: &[String]) -> Option<&PhraseDefinition> {
        let first = words.first()?;
        self.candidates(first).iter().find(|def| def.words == words)
    }

    pub fn contains(&self, words: &[String]) -> bool {
        self.get(words).is_some()
    }

    /// Adds a definition, replacing the info of an existing one with the same
    /// words. The replaced definition keeps its position.
    pub fn insert(&mut self, definition: PhraseDefinition) {
        let Some(first) = definition.words.first().cloned() else {
            return;
        };
        let list = self.by_first_word.entry(first).or_default();
        match list.iter_mut().find(|def| def.words == definition.words) {
            Some(existing) => *existing = definition,
            None => list.push(definition),
        }
    }

    pub fn remove(&mut self, words: &[String]) -> Option<PhraseDefinition> {
        let first = words.first()?;
        let list = self.by_first_word.get_mut(first)?;
        let idx = list.iter().position(|def| def.words == words)?;
        let removed = list.remove(idx);
        if list.is_empty() {
            self.by_first_word.remove(first);
        }
        Some(removed)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhraseDefinition> {
        self.by_first_word.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.by_first_word.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_first_word.is_empty()
    }
}

/// A located match of a phrase definition in a page's tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPhraseOccurrence {
    pub words: Vec<String>,
    pub start_word_num: usize,
    pub end_word_num: usize,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl TextPhraseOccurrence {
    pub fn contains_word(&self, word_num: usize) -> bool {
        self.start_word_num <= word_num && word_num <= self.end_word_num
    }

    pub fn contains_offset(&self, offset: usize) -> bool {
        self.start_offset <= offset && offset <= self.end_offset
    }

    /// The phrase as written on the page, whitespace collapsed.
    pub fn page_text(&self, page_text: &str) -> String {
        crate::text::sentences::collapse_whitespace(&page_text[self.start_offset..self.end_offset])
    }
}

fn occurrence_at(tokens: &[WordToken], idx: usize, words: &[String]) -> Option<TextPhraseOccurrence> {
    if words.is_empty() || idx + words.len() > tokens.len() {
        return None;
    }
    let span = &tokens[idx..idx + words.len()];
    if span.iter().zip(words).any(|(token, word)| token.form != *word) {
        return None;
    }
    let (first, last) = (&span[0], &span[span.len() - 1]);
    Some(TextPhraseOccurrence {
        words: words.to_vec(),
        start_word_num: first.word_num,
        end_word_num: last.word_num,
        start_offset: first.start_offset,
        end_offset: last.end_offset,
    })
}

/// Locates every saved phrase in `tokens`.
///
/// At most one occurrence starts at a given word: the first definition (in
/// insertion order) matching there wins. Occurrences starting at different
/// words may overlap.
pub fn build_text_phrases(tokens: &[WordToken], book: &PhraseBook) -> Vec<TextPhraseOccurrence> {
    tokens
        .iter()
        .enumerate()
        .filter_map(|(idx, token)| {
            book.candidates(&token.form)
                .iter()
                .find_map(|def| occurrence_at(tokens, idx, &def.words))
        })
        .collect()
}

/// Adds the occurrences of a newly saved phrase without rescanning the other
/// definitions. Does nothing if the phrase is already located on the page.
/// Start words already owned by an earlier definition are left to it, so the
/// result equals a full rebuild with the phrase appended to the book.
///
/// Returns whether any occurrence was added.
pub fn add_phrase(
    occurrences: &mut Vec<TextPhraseOccurrence>,
    tokens: &[WordToken],
    new_words: &[String],
) -> bool {
    if occurrences.iter().any(|occ| occ.words == new_words) {
        return false;
    }
    let Some(first) = new_words.first() else {
        return false;
    };
    let mut added = false;
    for (idx, token) in tokens.iter().enumerate() {
        if token.form != *first
            || occurrences.iter().any(|occ| occ.start_word_num == token.word_num)
        {
            continue;
        }
        if let Some(occ) = occurrence_at(tokens, idx, new_words) {
            let pos = occurrences.partition_point(|o| o.start_word_num < occ.start_word_num);
            occurrences.insert(pos, occ);
            added = true;
        }
    }
    added
}

/// Removes every occurrence of exactly `words`. Returns how many were removed.
pub fn remove_phrase(occurrences: &mut Vec<TextPhraseOccurrence>, words: &[String]) -> usize {
    let before = occurrences.len();
    occurrences.retain(|occ| occ.words != words);
    before - occurrences.len()
}

/// First occurrence covering `word_num`.
pub fn phrase_at_word(occurrences: &[TextPhraseOccurrence], word_num: usize) -> Option<&TextPhraseOccurrence> {
    occurrences.iter().find(|occ| occ.contains_word(word_num))
}

pub fn phrase_at_offset(occurrences: &[TextPhraseOccurrence], offset: usize) -> Option<&TextPhraseOccurrence> {
    occurrences.iter().find(|occ| occ.contains_offset(offset))
}
