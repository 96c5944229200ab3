use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use super::phrases::{PhraseBook, PhraseDefinition};
use super::word_info::WordInfo;
use crate::error::Result;
use crate::persistence::{self, Persistence};

pub const KNOWN_WORDS_KEY: &str = "known_words";
pub const LEARNING_WORDS_KEY: &str = "learning_words";
pub const IGNORED_WORDS_KEY: &str = "ignored_words";
pub const PHRASES_KEY: &str = "phrases";
pub const PERSONAL_TRANSLATIONS_KEY: &str = "personal_translations";
pub const LAST_OPENED_FILES_KEY: &str = "last_opened_files";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WordCategory {
    New,
    Learning,
    Known,
    Ignored,
}

impl WordCategory {
    /// New and learning words are the ones navigation stops at.
    pub fn is_marked(self) -> bool {
        matches!(self, Self::New | Self::Learning)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Learning => "learning",
            Self::Known => "known",
            Self::Ignored => "ignored",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct OpenedFile {
    pub title: String,
    pub file_name: String,
}

/// Learning state of every word form and saved phrase.
///
/// A form is in at most one of the known, learning and ignored collections;
/// a form in none of them is new. Every mutator keeps it that way.
#[derive(Debug, Default, Clone)]
pub struct WordStore {
    known: BTreeMap<String, Option<WordInfo>>,
    learning: BTreeMap<String, WordInfo>,
    ignored: BTreeSet<String>,
    phrases: PhraseBook,
    personal_translations: BTreeMap<String, String>,
    last_opened_files: Vec<OpenedFile>,
}

impl WordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every collection, starting from an empty one for each snapshot
    /// that is missing or unreadable.
    pub fn load(store: &dyn Persistence) -> Self {
        let words = Self {
            known: persistence::load(store, KNOWN_WORDS_KEY).unwrap_or_default(),
            learning: persistence::load(store, LEARNING_WORDS_KEY).unwrap_or_default(),
            ignored: persistence::load(store, IGNORED_WORDS_KEY).unwrap_or_default(),
            phrases: persistence::load(store, PHRASES_KEY).unwrap_or_default(),
            personal_translations: persistence::load(store, PERSONAL_TRANSLATIONS_KEY)
                .unwrap_or_default(),
            last_opened_files: persistence::load(store, LAST_OPENED_FILES_KEY).unwrap_or_default(),
        };
        log::debug!(
            "loaded {} known, {} learning, {} ignored words and {} phrases",
            words.known.len(),
            words.learning.len(),
            words.ignored.len(),
            words.phrases.len()
        );
        words
    }

    pub fn save(&self, store: &dyn Persistence) -> Result<()> {
        persistence::save(store, KNOWN_WORDS_KEY, &self.known)?;
        persistence::save(store, LEARNING_WORDS_KEY, &self.learning)?;
        persistence::save(store, IGNORED_WORDS_KEY, &self.ignored)?;
        persistence::save(store, PHRASES_KEY, &self.phrases)?;
        persistence::save(store, PERSONAL_TRANSLATIONS_KEY, &self.personal_translations)?;
        persistence::save(store, LAST_OPENED_FILES_KEY, &self.last_opened_files)?;
        log::info!("saved word lists, number of known words: {}", self.known.len());
        Ok(())
    }

    pub fn category_of(&self, form: &str) -> WordCategory {
        if self.learning.contains_key(form) {
            WordCategory::Learning
        } else if self.ignored.contains(form) {
            WordCategory::Ignored
        } else if self.known.contains_key(form) {
            WordCategory::Known
        } else {
            WordCategory::New
        }
    }

    /// Info stored for a learning word or a known word saved with info.
    pub fn stored_info(&self, form: &str) -> Option<&WordInfo> {
        self.learning
            .get(form)
            .or_else(|| self.known.get(form).and_then(Option::as_ref))
    }

    fn remove_everywhere(&mut self, form: &str) {
        self.known.remove(form);
        self.learning.remove(form);
        self.ignored.remove(form);
    }

    pub fn mark_known(&mut self, form: &str, info: Option<WordInfo>) {
        self.remove_everywhere(form);
        self.known.insert(form.to_string(), info);
    }

    pub fn mark_learning(&mut self, form: &str, info: WordInfo) {
        self.remove_everywhere(form);
        self.learning.insert(form.to_string(), info);
    }

    pub fn mark_ignored(&mut self, form: &str) {
        self.remove_everywhere(form);
        self.ignored.insert(form.to_string());
    }

    pub fn mark_new(&mut self, form: &str) {
        self.remove_everywhere(form);
    }

    pub fn num_known_words(&self) -> usize {
        self.known.len()
    }

    pub fn num_learning_words(&self) -> usize {
        self.learning.len()
    }

    pub fn phrases(&self) -> &PhraseBook {
        &self.phrases
    }

    /// Saves a phrase, replacing the info of an identical one.
    pub fn add_phrase(&mut self, definition: PhraseDefinition) {
        self.phrases.insert(definition);
    }

    pub fn remove_phrase(&mut self, words: &[String]) -> Option<PhraseDefinition> {
        self.phrases.remove(words)
    }

    pub fn get_phrase(&self, words: &[String]) -> Option<&PhraseDefinition> {
        self.phrases.get(words)
    }

    pub fn phrase_exists(&self, words: &[String]) -> bool {
        self.phrases.contains(words)
    }

    pub fn personal_translation(&self, word_or_phrase: &str) -> Option<&str> {
        self.personal_translations.get(word_or_phrase).map(String::as_str)
    }

    pub fn set_personal_translation(&mut self, word_or_phrase: &str, translation: &str) {
        self.personal_translations
            .insert(word_or_phrase.to_string(), translation.to_string());
    }

    pub fn remove_personal_translation(&mut self, word_or_phrase: &str) {
        self.personal_translations.remove(word_or_phrase);
    }

    /// Adds comma-separated translations to a word's personal translation,
    /// skipping the ones already there. A phrase's translation is replaced
    /// instead.
    pub fn add_to_personal_translation(&mut self, word_or_phrase: &str, additional: &str) {
        if additional.is_empty() {
            return;
        }
        if word_or_phrase.split_whitespace().count() > 1 {
            self.set_personal_translation(word_or_phrase, additional);
            return;
        }
        let mut parts: Vec<&str> = Vec::new();
        let old = self.personal_translation(word_or_phrase).unwrap_or_default().to_string();
        for part in old.split(", ").chain(additional.split(", ")) {
            let part = part.trim();
            if !part.is_empty() && !parts.contains(&part) {
                parts.push(part);
            }
        }
        let merged = parts.join(", ");
        self.set_personal_translation(word_or_phrase, &merged);
    }

    /// Every tracked word and phrase, sorted, without the `exclude`d ones.
    pub fn all_words(&self, exclude: &[&str]) -> Vec<String> {
        let mut all: BTreeSet<String> = BTreeSet::new();
        all.extend(self.known.keys().cloned());
        all.extend(self.learning.keys().cloned());
        all.extend(self.ignored.iter().cloned());
        all.extend(self.phrases.iter().map(PhraseDefinition::text));
        all.into_iter()
            .filter(|word| !exclude.contains(&word.as_str()))
            .collect()
    }

    /// Recently opened texts, most recent last.
    pub fn last_opened_files(&self) -> &[OpenedFile] {
        &self.last_opened_files
    }

    pub fn note_opened(&mut self, title: &str, file_name: &str) {
        self.last_opened_files.retain(|f| f.file_name != file_name);
        self.last_opened_files.push(OpenedFile {
            title: title.to_string(),
            file_name: file_name.to_string(),
        });
    }

    pub fn forget_missing(&mut self, texts_dir: &Path) {
        self.last_opened_files
            .retain(|f| texts_dir.join(&f.file_name).exists());
    }

    /// Writes each word list as a readable text file into `dir`.
    pub fn save_as_txt(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;

        let known: Vec<String> = self.known.keys().cloned().collect();
        write_list(dir, KNOWN_WORDS_KEY, &known)?;

        let learning: Vec<String> = self
            .learning
            .iter()
            .map(|(form, info)| match self.summary(form, info) {
                Some(trans) => format!("{form}: {trans}"),
                None => form.clone(),
            })
            .collect();
        write_list(dir, LEARNING_WORDS_KEY, &learning)?;

        let ignored: Vec<String> = self.ignored.iter().cloned().collect();
        write_list(dir, IGNORED_WORDS_KEY, &ignored)?;

        let learning_list: Vec<String> = self.learning.keys().cloned().collect();
        write_list(dir, "learning_words_list", &learning_list)?;

        let phrases: Vec<String> = self.phrases.iter().map(PhraseDefinition::text).collect();
        write_list(dir, PHRASES_KEY, &phrases)?;

        log::info!("word lists exported to {}", dir.display());
        Ok(())
    }

    fn summary(&self, form: &str, info: &WordInfo) -> Option<String> {
        if let Some(personal) = self.personal_translation(form) {
            return Some(personal.to_string());
        }
        info.trans
            .iter()
            .find_map(|entry| entry.first_definition())
            .map(str::to_string)
    }
}

fn write_list(dir: &Path, name: &str, lines: &[String]) -> Result<()> {
    let mut out = String::new();
    let _ = writeln!(out, "{name}");
    for line in lines {
        let _ = writeln!(out, "{line}");
    }
    fs::write(dir.join(format!("{name}.txt")), out)?;
    Ok(())
}
