use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Where a translation entry came from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub enum TranslationSource {
    #[default]
    Wiktionary,
    #[serde(rename = "Google Translate")]
    GoogleTranslate,
    #[serde(rename = "GPT")]
    Gpt,
    Glossary,
}

impl TranslationSource {
    pub fn is_machine(&self) -> bool {
        matches!(self, Self::GoogleTranslate | Self::Gpt)
    }

    /// Parses the configured machine translator name.
    pub fn machine_from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "gpt" => Self::Gpt,
            _ => Self::GoogleTranslate,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Definition {
    pub definition: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub antonyms: Option<String>,
}

impl Definition {
    pub fn new(definition: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            ..Default::default()
        }
    }
}

/// One dictionary or machine-translation result.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TranslationEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub part_of_speech: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etymology: Option<String>,
    #[serde(default)]
    pub definitions: Vec<Definition>,
    #[serde(default)]
    pub source: TranslationSource,
}

impl TranslationEntry {
    pub fn machine(word: &str, translation: impl Into<String>, source: TranslationSource) -> Self {
        Self {
            word: Some(word.to_string()),
            definitions: vec![Definition::new(translation)],
            source,
            ..Default::default()
        }
    }

    pub fn first_definition(&self) -> Option<&str> {
        self.definitions.first().map(|d| d.definition.as_str())
    }
}

/// Lookup result for a word or phrase, plus the learner's own additions.
///
/// Optional members distinguish "never set" (`None`) from "set to empty"
/// (`Some("")`): the lemma re-lookup keeps every member that the new lookup
/// leaves unset.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct WordInfo {
    pub dict_word: String,
    #[serde(default)]
    pub trans: Vec<TranslationEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemmas: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentence_trans: Option<String>,
    /// Words of the phrase, `None` for single words.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phrase_words: Option<Vec<String>>,
}

impl WordInfo {
    pub fn new(dict_word: impl Into<String>) -> Self {
        Self {
            dict_word: dict_word.into(),
            ..Default::default()
        }
    }

    /// Fills every member left unset here with the value from `old`.
    pub fn merge_missing_from(&mut self, old: &WordInfo) {
        fn keep<T: Clone>(new: &mut Option<T>, old: &Option<T>) {
            if new.is_none() {
                new.clone_from(old);
            }
        }
        if self.dict_word.is_empty() {
            self.dict_word.clone_from(&old.dict_word);
        }
        keep(&mut self.word_type, &old.word_type);
        keep(&mut self.gender, &old.gender);
        keep(&mut self.lemmas, &old.lemmas);
        keep(&mut self.remark, &old.remark);
        keep(&mut self.sentence, &old.sentence);
        keep(&mut self.sentence_trans, &old.sentence_trans);
        keep(&mut self.phrase_words, &old.phrase_words);
    }

    pub fn machine_translation_entry(&self) -> Option<&TranslationEntry> {
        self.trans.iter().find(|entry| entry.source.is_machine())
    }

    pub fn has_machine_translation(&self) -> bool {
        self.machine_translation_entry().is_some()
    }

    pub fn machine_translation(&self) -> Option<&str> {
        self.machine_translation_entry()
            .and_then(TranslationEntry::first_definition)
    }

    /// Removes the first machine-translated entry, leaving dictionary
    /// entries untouched. Returns whether one was removed.
    pub fn remove_machine_translation(&mut self) -> bool {
        match self.trans.iter().position(|entry| entry.source.is_machine()) {
            Some(idx) => {
                self.trans.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn set_example(&mut self, sentence: impl Into<String>, translation: impl Into<String>) {
        self.sentence = Some(sentence.into());
        self.sentence_trans = Some(translation.into());
    }

    pub fn example(&self) -> Option<(&str, &str)> {
        match (&self.sentence, &self.sentence_trans) {
            (Some(s), Some(t)) => Some((s.as_str(), t.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wiktionary(word: &str, def: &str) -> TranslationEntry {
        TranslationEntry {
            word: Some(word.into()),
            definitions: vec![Definition::new(def)],
            source: TranslationSource::Wiktionary,
            ..Default::default()
        }
    }

    #[test]
    fn merge_keeps_old_members_only_where_new_is_unset() {
        let mut old = WordInfo::new("gatos");
        old.remark = Some("my note".into());
        old.word_type = Some("noun".into());
        old.sentence = Some(String::new());

        let mut new = WordInfo::new("gatos");
        new.word_type = Some("verb".into());
        new.merge_missing_from(&old);

        assert_eq!(new.remark.as_deref(), Some("my note"));
        assert_eq!(new.word_type.as_deref(), Some("verb"));
        assert_eq!(new.sentence.as_deref(), Some(""));
        assert_eq!(new.gender, None);
    }

    #[test]
    fn only_first_machine_entry_is_removed() {
        let mut info = WordInfo::new("perro");
        info.trans = vec![
            TranslationEntry::machine("perro", "dog", TranslationSource::GoogleTranslate),
            wiktionary("perro", "dog"),
            TranslationEntry::machine("perro", "hound", TranslationSource::Gpt),
        ];
        assert_eq!(info.machine_translation(), Some("dog"));
        assert!(info.remove_machine_translation());
        assert_eq!(info.trans.len(), 2);
        assert_eq!(info.trans[0].source, TranslationSource::Wiktionary);
        assert_eq!(info.machine_translation(), Some("hound"));
    }

    #[test]
    fn unset_members_are_not_serialized() {
        let info = WordInfo::new("casa");
        let json = serde_json::to_string(&info).unwrap();
        assert!(!json.contains("remark"));
        let back: WordInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, info);

        let mut with_empty = info.clone();
        with_empty.remark = Some(String::new());
        let json = serde_json::to_string(&with_empty).unwrap();
        let back: WordInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back.remark.as_deref(), Some(""));
    }

    #[test]
    fn machine_source_names() {
        assert_eq!(TranslationSource::machine_from_name("GPT"), TranslationSource::Gpt);
        assert_eq!(
            TranslationSource::machine_from_name("Google Translate"),
            TranslationSource::GoogleTranslate
        );
        assert!(!TranslationSource::Wiktionary.is_machine());
    }
}
