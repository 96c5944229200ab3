//! Deciding where the info for a word or phrase comes from.
//!
//! The dictionary, the machine translator and the lemmatizer are external
//! collaborators behind traits. Their failures stop here: they are logged
//! and replaced by a `?` placeholder, never returned to the engine.

pub mod providers;

use std::collections::BTreeSet;
use thiserror::Error;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::tracking::{TranslationEntry, TranslationSource, WordCategory, WordInfo};

/// Placeholder translation when no service could translate.
pub const UNKNOWN_TRANSLATION: &str = "?";

/// How many example sentences a provider is asked for.
pub const EXAMPLE_SENTENCE_COUNT: usize = 8;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("lookup failed: {0}")]
    Failed(String),
}

pub trait DictionaryProvider {
    /// Dictionary entries for `word` in `language` (a language name such as
    /// "spanish"). An unknown word gives an empty list.
    fn lookup(&self, word: &str, language: &str) -> Result<Vec<TranslationEntry>, ProviderError>;

    fn machine_translate(&self, text: &str, src_lang: &str, dst_lang: &str) -> Result<String, ProviderError>;

    /// Example sentence pairs (sentence, translation) using `word`.
    fn example_sentences(
        &self,
        _word: &str,
        _language: &str,
        _max: usize,
    ) -> Result<Vec<(String, String)>, ProviderError> {
        Ok(Vec::new())
    }
}

pub trait Lemmatizer {
    fn lemma_of(&self, word: &str) -> String;
}

/// Drops combining marks, so pronunciation accents do not make a dictionary
/// headword differ from the looked-up word.
pub fn remove_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

const LEMMA_TRIGGERS: &[&str] = &[
    "first-person", "second-person", "third-person", "participle", "inflection",
    "imperfect", "subjunctive", "gerund", "present", "verbform", "perfective of",
    "imperfective of", "plural of", "singular of", "inflection of", "variant of",
    "female equivalent of", "compound of", "indicative of",
];

/// Lemma named by an inflection definition such as "plural of gato".
pub fn lemma_from_definition(definition: &str) -> Option<String> {
    if !LEMMA_TRIGGERS.iter().any(|t| definition.contains(t)) || !definition.contains("of") {
        return None;
    }
    let cleaned = definition
        .replace([':', ';'], "")
        .replace("the ", "")
        .replace("adjective ", "")
        .replace("verb ", "")
        .replace("infinitive ", "");
    let words: Vec<&str> = cleaned.split_whitespace().collect();
    words
        .windows(2)
        .find(|pair| pair[0] == "of")
        .map(|pair| pair[1].to_string())
}

/// Looks up words and phrases and builds their `WordInfo`.
pub struct Translator {
    dictionary: Box<dyn DictionaryProvider>,
    lemmatizer: Option<Box<dyn Lemmatizer>>,
    language: String,
    language_code: String,
    target_lang: String,
    machine_source: TranslationSource,
}

impl Translator {
    pub fn new(
        dictionary: Box<dyn DictionaryProvider>,
        language: &str,
        language_code: &str,
        target_lang: &str,
    ) -> Self {
        Self {
            dictionary,
            lemmatizer: None,
            language: language.to_lowercase(),
            language_code: language_code.to_string(),
            target_lang: target_lang.to_string(),
            machine_source: TranslationSource::GoogleTranslate,
        }
    }

    pub fn with_lemmatizer(mut self, lemmatizer: Box<dyn Lemmatizer>) -> Self {
        self.lemmatizer = Some(lemmatizer);
        self
    }

    pub fn with_machine_source(mut self, source: TranslationSource) -> Self {
        self.machine_source = source;
        self
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    /// Info for the active word given its category: stored info is reused,
    /// everything else is looked up fresh with a first example attached.
    pub fn lookup(&self, form: &str, category: WordCategory, stored: Option<&WordInfo>) -> WordInfo {
        match (category, stored) {
            (WordCategory::Learning | WordCategory::Known, Some(info)) => {
                log::debug!("using stored info for {form:?}");
                info.clone()
            }
            _ => {
                log::debug!("looking up {form:?} ({})", category.label());
                let mut info = self.get_info(form, false);
                self.attach_first_example(&mut info, form);
                info
            }
        }
    }

    /// Fresh info for a phrase chosen in the text.
    pub fn lookup_phrase(&self, phrase_text: &str, words: &[String]) -> WordInfo {
        let mut info = self.get_info(phrase_text, true);
        info.word_type = Some("phrase".to_string());
        info.phrase_words = Some(words.to_vec());
        self.attach_first_example(&mut info, phrase_text);
        info
    }

    /// Looks `word` up again with the learner's lemmas as hints.
    ///
    /// The lemmas and the machine translation present in `old` are kept, and
    /// every member the new lookup leaves unset is taken from `old`.
    pub fn relookup_with_lemmas(&self, old: &WordInfo, lemmas: BTreeSet<String>, is_phrase: bool) -> WordInfo {
        let word = old.dict_word.as_str();
        let mut results = self.dictionary_entries(word);
        for lemma in &lemmas {
            if lemma != word {
                results.extend(self.dictionary_entries(lemma));
            }
        }
        match old.machine_translation_entry() {
            Some(item) => results.insert(0, item.clone()),
            None if results.is_empty() => results = vec![self.machine_entry(word)],
            None => {}
        }
        let mut info = self.build_info(word, results);
        info.lemmas = Some(lemmas);
        if is_phrase {
            info.word_type = Some("phrase".to_string());
        }
        info.merge_missing_from(old);
        info
    }

    /// All translation entries for a word, dictionary first, machine
    /// translation where the dictionary falls short.
    pub fn translate(&self, word: &str, is_phrase: bool) -> Vec<TranslationEntry> {
        let mut results = self.dictionary_entries(word);

        if self.language == "german" && !is_phrase {
            let capitalized = capitalize(word);
            if capitalized != word {
                results.extend(self.dictionary_entries(&capitalized));
            }
        }

        if !is_phrase {
            if let Some(lemmatizer) = &self.lemmatizer {
                let lemma = lemmatizer.lemma_of(word);
                let known_lemmas = lemmas_of(&results);
                let headwords = headwords_of(&results);
                if lemma != word && !known_lemmas.contains(&lemma) && !headwords.contains(&lemma) {
                    results.extend(self.dictionary_entries(&lemma));
                }
            }
        }

        if results.is_empty() {
            return vec![self.machine_entry(word)];
        }
        if !headwords_of(&results).contains(&remove_accents(word)) {
            results.insert(0, self.machine_entry(word));
        }
        results
    }

    pub fn get_info(&self, word: &str, is_phrase: bool) -> WordInfo {
        let results = self.translate(word, is_phrase);
        self.build_info(word, results)
    }

    fn build_info(&self, word: &str, trans: Vec<TranslationEntry>) -> WordInfo {
        let mut word_types: Vec<&str> = Vec::new();
        let mut genders = BTreeSet::new();
        let mut lemmas = BTreeSet::new();
        let mut remarks: Vec<String> = Vec::new();
        let mut etymologies: Vec<String> = Vec::new();

        for (i, entry) in trans.iter().enumerate() {
            if let Some(pos) = entry.part_of_speech.as_deref() {
                if !pos.is_empty() && !word_types.contains(&pos) {
                    word_types.push(pos);
                }
            }
            if let Some(gender) = entry.gender.as_deref() {
                for part in gender.split_whitespace() {
                    if matches!(part, "m" | "f" | "n") {
                        genders.insert(part);
                    }
                }
            }
            if let Some(lemma) = &entry.lemma {
                lemmas.insert(lemma.clone());
            }
            if let Some(word_info) = &entry.word_info {
                remarks.push(word_info.clone());
            }
            if let Some(etymology) = &entry.etymology {
                etymologies.push(format!("Etymology {}: {}", i + 1, etymology));
            }
        }
        remarks.extend(etymologies);

        // BTreeSet orders "f" < "m" < "n"; masculine is listed first.
        let genders: Vec<&str> = ["m", "f", "n"]
            .into_iter()
            .filter(|g| genders.contains(g))
            .collect();

        WordInfo {
            dict_word: word.to_string(),
            word_type: (!word_types.is_empty()).then(|| word_types.join(", ")),
            gender: (!genders.is_empty()).then(|| genders.join(", ")),
            lemmas: (!lemmas.is_empty()).then_some(lemmas),
            remark: (!remarks.is_empty()).then(|| remarks.join("\n\n")),
            trans,
            ..Default::default()
        }
    }

    fn dictionary_entries(&self, word: &str) -> Vec<TranslationEntry> {
        match self.dictionary.lookup(word, &self.language) {
            Ok(entries) => entries,
            Err(ProviderError::NotFound(_)) => Vec::new(),
            Err(e) => {
                log::warn!("dictionary lookup of {word:?} failed: {e}");
                Vec::new()
            }
        }
    }

    /// Machine translation of `text`, `?` when unavailable or unchanged.
    pub fn machine_translate(&self, text: &str) -> String {
        match self
            .dictionary
            .machine_translate(text, &self.language_code, &self.target_lang)
        {
            Ok(trans) if trans.trim().is_empty() || trans == text => UNKNOWN_TRANSLATION.to_string(),
            Ok(trans) => trans,
            Err(e) => {
                log::warn!("machine translation of {text:?} failed: {e}");
                UNKNOWN_TRANSLATION.to_string()
            }
        }
    }

    pub fn machine_entry(&self, text: &str) -> TranslationEntry {
        TranslationEntry::machine(text, self.machine_translate(text), self.machine_source.clone())
    }

    pub fn example_sentences(&self, word: &str) -> Vec<(String, String)> {
        match self
            .dictionary
            .example_sentences(word, &self.language, EXAMPLE_SENTENCE_COUNT)
        {
            Ok(examples) => examples,
            Err(e) => {
                log::warn!("no example sentences for {word:?}: {e}");
                Vec::new()
            }
        }
    }

    fn attach_first_example(&self, info: &mut WordInfo, word: &str) {
        if let Some((sentence, trans)) = self
            .example_sentences(word)
            .into_iter()
            .find(|(sentence, _)| !sentence.is_empty())
        {
            info.set_example(sentence, trans);
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lemmas_of(results: &[TranslationEntry]) -> BTreeSet<String> {
    results.iter().filter_map(|e| e.lemma.clone()).collect()
}

fn headwords_of(results: &[TranslationEntry]) -> BTreeSet<String> {
    results
        .iter()
        .filter_map(|e| e.word.as_deref())
        .map(remove_accents)
        .collect()
}
