//! Offline collaborators: a JSON glossary standing in for the online
//! dictionary, and a lemma table standing in for a morphological analyser.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::{lemma_from_definition, DictionaryProvider, Lemmatizer, ProviderError};
use crate::error::{LegiloError, Result};
use crate::tracking::{TranslationEntry, TranslationSource};

/// Glossary file contents.
///
/// ```json
/// {
///   "entries": { "gatos": [{ "part_of_speech": "noun", "definitions": [{ "definition": "plural of gato" }] }] },
///   "translations": { "el gato": "the cat" },
///   "examples": { "gato": [["El gato duerme.", "The cat sleeps."]] }
/// }
/// ```
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct GlossaryProvider {
    entries: HashMap<String, Vec<TranslationEntry>>,
    translations: HashMap<String, String>,
    examples: HashMap<String, Vec<(String, String)>>,
}

impl GlossaryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let glossary: Self = serde_json::from_str(&contents)
            .map_err(|e| LegiloError::config(path, format!("invalid glossary: {e}")))?;
        log::info!(
            "loaded glossary {} with {} headwords",
            path.display(),
            glossary.entries.len()
        );
        Ok(glossary)
    }

    pub fn add_entry(&mut self, word: &str, entry: TranslationEntry) {
        self.entries.entry(word.to_string()).or_default().push(entry);
    }

    pub fn add_translation(&mut self, text: &str, translation: &str) {
        self.translations
            .insert(text.trim().to_lowercase(), translation.to_string());
    }

    pub fn add_example(&mut self, word: &str, sentence: &str, translation: &str) {
        self.examples
            .entry(word.to_string())
            .or_default()
            .push((sentence.to_string(), translation.to_string()));
    }
}

impl DictionaryProvider for GlossaryProvider {
    fn lookup(&self, word: &str, _language: &str) -> std::result::Result<Vec<TranslationEntry>, ProviderError> {
        let Some(entries) = self.entries.get(word.trim()) else {
            return Ok(Vec::new());
        };
        Ok(entries
            .iter()
            .cloned()
            .map(|mut entry| {
                entry.source = TranslationSource::Glossary;
                entry.word.get_or_insert_with(|| word.trim().to_string());
                if entry.lemma.is_none() {
                    entry.lemma = entry
                        .definitions
                        .iter()
                        .find_map(|d| lemma_from_definition(&d.definition));
                }
                entry
            })
            .collect())
    }

    fn machine_translate(&self, text: &str, _src_lang: &str, _dst_lang: &str) -> std::result::Result<String, ProviderError> {
        self.translations
            .get(&text.trim().to_lowercase())
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(text.to_string()))
    }

    fn example_sentences(
        &self,
        word: &str,
        _language: &str,
        max: usize,
    ) -> std::result::Result<Vec<(String, String)>, ProviderError> {
        Ok(self
            .examples
            .get(word)
            .map(|examples| examples.iter().take(max).cloned().collect())
            .unwrap_or_default())
    }
}

/// Maps inflected forms to lemmas from a whitespace-separated table, one
/// `form lemma` pair per line. Unlisted words are their own lemma.
#[derive(Debug, Default, Clone)]
pub struct TableLemmatizer {
    lemmas: HashMap<String, String>,
}

impl TableLemmatizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let table = Self::parse(&contents);
        log::info!("loaded {} lemmas from {}", table.lemmas.len(), path.display());
        Ok(table)
    }

    /// Lines starting with `#` and lines without two columns are skipped.
    pub fn parse(contents: &str) -> Self {
        let mut table = Self::new();
        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut columns = line.split_whitespace();
            if let (Some(form), Some(lemma)) = (columns.next(), columns.next()) {
                table.insert(form, lemma);
            }
        }
        table
    }

    pub fn insert(&mut self, form: &str, lemma: &str) {
        self.lemmas
            .insert(form.trim().to_lowercase(), lemma.trim().to_lowercase());
    }
}

impl Lemmatizer for TableLemmatizer {
    fn lemma_of(&self, word: &str) -> String {
        let key = word.trim().to_lowercase();
        self.lemmas.get(&key).cloned().unwrap_or(key)
    }
}
