use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

use super::NavigationEngine;

impl NavigationEngine {
    /// Text sent to lookups for the active unit: the phrase as written on
    /// the page, or the active word form.
    fn active_lookup_text(&self) -> Option<String> {
        match &self.active_phrase {
            Some(phrase) => Some(phrase.occurrence.page_text(&self.page.text)),
            None => self.active_form().map(str::to_string),
        }
    }

    pub fn set_remark(&mut self, remark: &str) -> bool {
        if !self.looked_up {
            return false;
        }
        match self.active_info.as_mut() {
            Some(info) => {
                info.remark = Some(remark.to_string());
                true
            }
            None => false,
        }
    }

    pub fn personal_translation(&self) -> Option<&str> {
        let key = self.active_word_or_phrase()?;
        self.store.personal_translation(&key)
    }

    /// Replaces the personal translation of the active unit; an empty one
    /// removes it.
    pub fn set_personal_translation(&mut self, translation: &str) -> bool {
        if !self.looked_up {
            return false;
        }
        let Some(key) = self.active_word_or_phrase() else {
            return false;
        };
        self.store.remove_personal_translation(&key);
        if !translation.is_empty() {
            self.store.set_personal_translation(&key, translation);
        }
        true
    }

    /// Words offered while editing lemmas.
    pub fn lemma_suggestions(&self) -> Vec<String> {
        match self.active_word_or_phrase() {
            Some(active) => self.store.all_words(&[active.as_str()]),
            None => self.store.all_words(&[]),
        }
    }

    /// The lemma editor text: one lemma per line, with its personal
    /// translation after a colon when it has one.
    pub fn lemma_text(&self) -> String {
        let Some(lemmas) = self.active_info.as_ref().and_then(|i| i.lemmas.as_ref()) else {
            return String::new();
        };
        lemmas
            .iter()
            .map(|lemma| match self.store.personal_translation(lemma) {
                Some(trans) => format!("{lemma}: {trans}"),
                None => lemma.clone(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Applies edited lemma text. `lemma: translation` lines also set the
    /// lemma's personal translation; a bare lemma clears it.
    pub fn update_lemmas(&mut self, text: &str) -> bool {
        if !self.looked_up {
            return false;
        }
        let mut lemmas = BTreeSet::new();
        for line in text.lines() {
            let mut parts = line.split(':');
            let lemma: String = parts.next().unwrap_or_default().trim().nfc().collect();
            if lemma.is_empty() {
                continue;
            }
            match parts.next().map(str::trim) {
                Some(trans) if !trans.is_empty() => self.store.set_personal_translation(&lemma, trans),
                _ => self.store.remove_personal_translation(&lemma),
            }
            lemmas.insert(lemma);
        }
        self.set_lemmas(lemmas, false)
    }

    /// Sets the lemmas of the active info, looking the word up again when
    /// they changed. Members the new lookup does not set are kept.
    pub fn set_lemmas(&mut self, lemmas: BTreeSet<String>, keep_previous: bool) -> bool {
        if !self.looked_up {
            return false;
        }
        let Some(mut info) = self.active_info.take() else {
            return false;
        };
        let previous = info.lemmas.clone();
        let mut lemmas = lemmas;
        if keep_previous {
            if let Some(previous) = &previous {
                lemmas.extend(previous.iter().cloned());
            }
        }
        info.lemmas = Some(lemmas.clone());
        if previous.as_ref() != Some(&lemmas) {
            log::debug!("lemmas of {:?} changed, looking up again", info.dict_word);
            let is_phrase = self.active_phrase.is_some();
            info = self.translator.relookup_with_lemmas(&info, lemmas, is_phrase);
        }
        self.active_info = Some(info);
        true
    }

    /// Adds a machine translation to the active info, or removes it when
    /// there is one. Dictionary entries are never touched.
    pub fn toggle_machine_translation(&mut self) -> bool {
        if !self.looked_up {
            return false;
        }
        let text = self.active_lookup_text();
        let Some(info) = self.active_info.as_mut() else {
            return false;
        };
        if !info.remove_machine_translation() {
            let Some(text) = text else {
                return false;
            };
            info.trans.push(self.translator.machine_entry(&text));
        }
        true
    }

    /// Keeps the machine translation as the learner's own.
    ///
    /// A `lemma: translation` result adds the lemma with that translation;
    /// any other result is merged into the personal translation. The machine
    /// entry is removed afterwards.
    pub fn use_machine_translation(&mut self) -> bool {
        if !self.looked_up {
            return false;
        }
        let Some(machine) = self
            .active_info
            .as_ref()
            .and_then(|info| info.machine_translation())
            .map(str::to_string)
        else {
            return false;
        };

        let parts: Vec<&str> = machine.split(':').collect();
        let is_lemma_definition = parts.len() == 2 && parts[0].split_whitespace().count() == 1;
        if is_lemma_definition {
            let lemma: String = parts[0].trim().nfc().collect();
            let trans = parts[1].trim();
            if !trans.is_empty() {
                self.store.add_to_personal_translation(&lemma, trans);
            }
            self.set_lemmas(BTreeSet::from([lemma]), true);
        } else if let Some(key) = self.active_word_or_phrase() {
            self.store.add_to_personal_translation(&key, &machine);
        }
        if let Some(info) = self.active_info.as_mut() {
            info.remove_machine_translation();
        }
        true
    }

    /// Sets the example of the active info: 1 to 8 pick a provider example,
    /// 9 the current sentence with its machine translation, 0 clears it.
    pub fn select_example_sentence(&mut self, example_num: usize) -> bool {
        if !self.looked_up || self.active_info.is_none() {
            return false;
        }
        let Some(word) = self.active_lookup_text() else {
            return false;
        };
        let (sentence, trans) = match example_num {
            1..=8 => {
                let examples = self.examples_for(&word);
                examples.get(example_num - 1).cloned().unwrap_or_default()
            }
            9 if self.active_phrase.is_none() => match self.active_sentence_text() {
                Some(sentence) => {
                    let trans = self.translator.machine_translate(&sentence);
                    (sentence, trans)
                }
                None => Default::default(),
            },
            _ => Default::default(),
        };
        if let Some(info) = self.active_info.as_mut() {
            info.set_example(sentence, trans);
        }
        true
    }

    fn examples_for(&mut self, word: &str) -> Vec<(String, String)> {
        match &self.example_cache {
            Some((cached, examples)) if cached == word => examples.clone(),
            _ => {
                let examples = self.translator.example_sentences(word);
                self.example_cache = Some((word.to_string(), examples.clone()));
                examples
            }
        }
    }

    pub fn active_sentence_text(&self) -> Option<String> {
        let span = self.page.sentences.sentence_of(self.active_word_num?)?;
        Some(span.text(&self.page.text))
    }
}
