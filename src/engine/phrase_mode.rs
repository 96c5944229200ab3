use super::{ActivePhrase, Direction, NavigationEngine, PhraseSelection};
use crate::tracking::{phrase_at_word, PhraseDefinition, TextPhraseOccurrence};

impl NavigationEngine {
    pub fn is_in_phrase_mode(&self) -> bool {
        self.phrase_selection.is_some()
    }

    pub fn phrase_selection_cursor(&self) -> Option<usize> {
        self.phrase_selection.as_ref().and_then(|s| s.cursor)
    }

    /// Enters or leaves phrase mode. Returns whether phrase mode is on.
    pub fn toggle_phrase_mode(&mut self) -> bool {
        if self.phrase_selection.is_some() {
            self.leave_phrase_mode();
        } else {
            self.enter_phrase_mode();
        }
        self.phrase_selection.is_some()
    }

    fn enter_phrase_mode(&mut self) {
        self.handle_active(true);
        self.phrase_selection = Some(PhraseSelection {
            cursor: self.active_word_num,
            chosen: Vec::new(),
        });
        log::debug!("phrase mode on");
    }

    fn leave_phrase_mode(&mut self) {
        self.phrase_selection = None;
        log::debug!("phrase mode off");
    }

    /// A click in phrase mode: a saved phrase under the word is activated
    /// directly, otherwise the word is chosen as one end of a new phrase.
    /// The second distinct end creates the phrase.
    pub(super) fn select_in_phrase_mode(&mut self, word_num: usize) -> bool {
        if let Some(occurrence) = phrase_at_word(&self.page.phrases, word_num).cloned() {
            self.active_phrase = Some(ActivePhrase {
                occurrence,
                is_new: false,
            });
            self.clear_active_info();
            self.look_up();
            self.leave_phrase_mode();
            return true;
        }

        let Some(selection) = self.phrase_selection.as_mut() else {
            return false;
        };
        if !selection.chosen.contains(&word_num) {
            selection.chosen.push(word_num);
        }
        if let [a, b] = selection.chosen[..] {
            self.create_phrase(a.min(b), a.max(b));
            self.leave_phrase_mode();
        }
        true
    }

    pub(super) fn move_selection_cursor(&mut self, direction: Direction) -> bool {
        let num_words = self.page.num_words();
        let Some(selection) = self.phrase_selection.as_mut() else {
            return false;
        };
        selection.cursor = match (direction, selection.cursor) {
            (Direction::Right, None) => (num_words > 0).then_some(1),
            (Direction::Right, Some(n)) => (n < num_words).then_some(n + 1),
            (Direction::Left, Some(n)) => (n > 1).then(|| n - 1),
            (Direction::Left, None) => None,
        };
        selection.cursor.is_some()
    }

    /// Saves the words `first..=last` as a phrase (looking it up when it is
    /// not saved yet) and activates it.
    fn create_phrase(&mut self, first: usize, last: usize) -> bool {
        let (Some(first_token), Some(last_token)) = (self.page.token(first), self.page.token(last)) else {
            return false;
        };
        let words: Vec<String> = self.page.tokens[first - 1..last]
            .iter()
            .map(|t| t.form.clone())
            .collect();
        let synthesized = TextPhraseOccurrence {
            words: words.clone(),
            start_word_num: first,
            end_word_num: last,
            start_offset: first_token.start_offset,
            end_offset: last_token.end_offset,
        };

        let is_new = !self.store.phrase_exists(&words);
        if is_new {
            let text = synthesized.page_text(&self.page.text).to_lowercase();
            let info = self.translator.lookup_phrase(&text, &words);
            self.store
                .add_phrase(PhraseDefinition::new(words.clone(), info));
            log::debug!("new phrase {text:?}");
        }
        crate::tracking::add_phrase(&mut self.page.phrases, &self.page.tokens, &words);

        // A phrase shadowed by an earlier one at the same start word has no
        // occurrence of its own; it stays active through the synthesized one.
        let occurrence = self
            .page
            .phrases
            .iter()
            .find(|o| o.start_word_num == first && o.words == words)
            .cloned()
            .unwrap_or(synthesized);
        self.active_phrase = Some(ActivePhrase { occurrence, is_new });
        self.clear_active_info();
        self.look_up()
    }

    /// Makes the active word's sentence a phrase and looks it up.
    pub fn look_up_current_sentence(&mut self) -> bool {
        if self.phrase_selection.is_some() {
            return false;
        }
        let Some(active) = self.active_word_num else {
            return false;
        };
        let Some(span) = self.page.sentences.sentence_of(active).cloned() else {
            return false;
        };
        self.enter_phrase_mode();
        if span.start_word_num == span.end_word_num {
            self.leave_phrase_mode();
            return self.look_up();
        }
        self.skip_next_pronunciation = true;
        let created = self.create_phrase(span.start_word_num, span.end_word_num);
        self.skip_next_pronunciation = false;
        self.leave_phrase_mode();
        created
    }
}
