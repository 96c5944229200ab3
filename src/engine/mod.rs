//! The reading state machine: which word or phrase is active, where the
//! cursor goes next, and when word states are committed.

mod editing;
mod navigation;
mod phrase_mode;
#[cfg(test)]
mod tests;

use std::fs;
use std::path::Path;

use crate::error::{LegiloError, Result};
use crate::lookup::Translator;
use crate::persistence::Persistence;
use crate::speech::Speaker;
use crate::text::{index_sentences, tokenize, ResumeMetadata, SentenceIndex, TextDocument, WordToken};
use crate::tracking::{
    build_text_phrases, PhraseDefinition, TextPhraseOccurrence, WordCategory, WordInfo, WordStore,
};

/// How a word is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Active,
    /// Cursor or chosen end word while selecting a phrase.
    Selected,
    Category(WordCategory),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhraseMarker {
    Ordinary,
    Active,
}

/// What is currently addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveUnit {
    Word {
        word_num: usize,
        looked_up: bool,
    },
    Phrase {
        occurrence: TextPhraseOccurrence,
        looked_up: bool,
        is_new: bool,
    },
}

/// Last active word and the page it was on, written back to the text file
/// so reading resumes there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastActive {
    pub word_num: usize,
    pub page_index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LookupState {
    Idle,
    InFlight,
}

/// Tokens, sentences and phrase occurrences of the open page.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    pub index: usize,
    pub text: String,
    pub tokens: Vec<WordToken>,
    pub sentences: SentenceIndex,
    pub phrases: Vec<TextPhraseOccurrence>,
}

impl PageState {
    fn build(index: usize, text: &str, store: &WordStore) -> Self {
        let tokens = tokenize(text);
        let sentences = index_sentences(text, &tokens);
        let phrases = build_text_phrases(&tokens, store.phrases());
        Self {
            index,
            text: text.to_string(),
            tokens,
            sentences,
            phrases,
        }
    }

    pub fn num_words(&self) -> usize {
        self.tokens.len()
    }

    pub fn form(&self, word_num: usize) -> Option<&str> {
        self.tokens
            .get(word_num.checked_sub(1)?)
            .map(|t| t.form.as_str())
    }

    pub fn token(&self, word_num: usize) -> Option<&WordToken> {
        self.tokens.get(word_num.checked_sub(1)?)
    }
}

#[derive(Debug, Clone)]
struct ActivePhrase {
    occurrence: TextPhraseOccurrence,
    is_new: bool,
}

#[derive(Debug, Clone, Default)]
struct PhraseSelection {
    cursor: Option<usize>,
    chosen: Vec<usize>,
}

pub struct NavigationEngine {
    store: WordStore,
    persistence: Box<dyn Persistence>,
    translator: Translator,
    speaker: Option<Box<dyn Speaker>>,
    sound_on: bool,
    document: TextDocument,
    page: PageState,
    page_is_open: bool,

    active_word_num: Option<usize>,
    active_phrase: Option<ActivePhrase>,
    active_info: Option<WordInfo>,
    looked_up: bool,
    lookup_state: LookupState,
    skip_next_pronunciation: bool,

    phrase_selection: Option<PhraseSelection>,
    has_gone_through_whole_page: bool,
    left_page_in_direction: Option<Direction>,
    last_active: Option<LastActive>,
    example_cache: Option<(String, Vec<(String, String)>)>,
}

impl NavigationEngine {
    /// Creates the engine with the first page open and nothing active.
    pub fn new(
        document: TextDocument,
        store: WordStore,
        persistence: Box<dyn Persistence>,
        translator: Translator,
    ) -> Self {
        let mut engine = Self {
            store,
            persistence,
            translator,
            speaker: None,
            sound_on: false,
            document,
            page: PageState::default(),
            page_is_open: false,
            active_word_num: None,
            active_phrase: None,
            active_info: None,
            looked_up: false,
            lookup_state: LookupState::Idle,
            skip_next_pronunciation: false,
            phrase_selection: None,
            has_gone_through_whole_page: false,
            left_page_in_direction: None,
            last_active: None,
            example_cache: None,
        };
        engine.open_page_with(0, false);
        engine
    }

    pub fn with_speaker(mut self, speaker: Box<dyn Speaker>, sound_on: bool) -> Self {
        self.speaker = Some(speaker);
        self.sound_on = sound_on;
        self
    }

    /// Reopens the page and word saved in a text's metadata.
    pub fn resume(&mut self, meta: &ResumeMetadata) {
        let page_index = meta
            .page_index
            .unwrap_or(0)
            .min(self.document.num_pages().saturating_sub(1));
        self.last_active = meta.active_word_num.map(|word_num| LastActive {
            word_num,
            page_index,
        });
        self.open_page_with(page_index, true);
    }

    pub fn store(&self) -> &WordStore {
        &self.store
    }

    pub fn page(&self) -> &PageState {
        &self.page
    }

    pub fn page_index(&self) -> usize {
        self.page.index
    }

    pub fn num_pages(&self) -> usize {
        self.document.num_pages()
    }

    pub fn document(&self) -> &TextDocument {
        &self.document
    }

    pub fn active_word_num(&self) -> Option<usize> {
        self.active_word_num
    }

    pub fn active_info(&self) -> Option<&WordInfo> {
        self.active_info.as_ref()
    }

    pub fn is_looked_up(&self) -> bool {
        self.looked_up
    }

    pub fn last_active(&self) -> Option<LastActive> {
        self.last_active
    }

    pub fn has_gone_through_whole_page(&self) -> bool {
        self.has_gone_through_whole_page
    }

    pub fn active_unit(&self) -> Option<ActiveUnit> {
        if let Some(phrase) = &self.active_phrase {
            return Some(ActiveUnit::Phrase {
                occurrence: phrase.occurrence.clone(),
                looked_up: self.looked_up,
                is_new: phrase.is_new,
            });
        }
        self.active_word_num.map(|word_num| ActiveUnit::Word {
            word_num,
            looked_up: self.looked_up,
        })
    }

    pub fn active_form(&self) -> Option<&str> {
        self.page.form(self.active_word_num?)
    }

    /// The active phrase as its words joined by spaces, or the active word.
    /// Personal translations are keyed by this.
    pub fn active_word_or_phrase(&self) -> Option<String> {
        match &self.active_phrase {
            Some(phrase) => Some(phrase.occurrence.words.join(" ")),
            None => self.active_form().map(str::to_string),
        }
    }

    /// Category of the active unit. An active phrase counts as learning.
    pub fn active_category(&self) -> Option<WordCategory> {
        if self.active_phrase.is_some() {
            return Some(WordCategory::Learning);
        }
        self.active_form().map(|form| self.store.category_of(form))
    }

    pub fn category_of_word(&self, word_num: usize) -> Option<WordCategory> {
        self.page.form(word_num).map(|form| self.store.category_of(form))
    }

    pub fn word_marker(&self, word_num: usize) -> Marker {
        if let Some(selection) = &self.phrase_selection {
            if selection.cursor == Some(word_num) || selection.chosen.contains(&word_num) {
                return Marker::Selected;
            }
        }
        if self.active_phrase.is_none() && self.active_word_num == Some(word_num) {
            return Marker::Active;
        }
        let category = self.category_of_word(word_num).unwrap_or(WordCategory::New);
        Marker::Category(category)
    }

    pub fn phrase_marker(&self, occurrence: &TextPhraseOccurrence) -> PhraseMarker {
        match &self.active_phrase {
            Some(active)
                if active.occurrence.start_word_num == occurrence.start_word_num
                    && active.occurrence.words == occurrence.words =>
            {
                PhraseMarker::Active
            }
            _ => PhraseMarker::Ordinary,
        }
    }

    /// Looks up the active unit. Does nothing when nothing is active, when
    /// it is already looked up, or while another lookup is running.
    pub fn look_up(&mut self) -> bool {
        if self.lookup_state == LookupState::InFlight || self.looked_up {
            return false;
        }
        self.lookup_state = LookupState::InFlight;
        let found = self.look_up_active();
        self.lookup_state = LookupState::Idle;
        if found {
            self.pronounce_after_lookup();
        }
        found
    }

    fn look_up_active(&mut self) -> bool {
        if let Some(phrase) = &self.active_phrase {
            let words = phrase.occurrence.words.clone();
            let info = match self.store.get_phrase(&words) {
                Some(definition) => definition.info.clone(),
                None => {
                    let text = phrase.occurrence.page_text(&self.page.text).to_lowercase();
                    self.translator.lookup_phrase(&text, &words)
                }
            };
            self.active_info = Some(info);
            self.looked_up = true;
            log::debug!("looked up phrase {:?}", words.join(" "));
            return true;
        }
        let Some(form) = self.active_form().map(str::to_string) else {
            return false;
        };
        let category = self.store.category_of(&form);
        let info = self
            .translator
            .lookup(&form, category, self.store.stored_info(&form));
        self.active_info = Some(info);
        self.looked_up = true;
        true
    }

    fn pronounce_after_lookup(&mut self) {
        if self.skip_next_pronunciation {
            self.skip_next_pronunciation = false;
            return;
        }
        if self.sound_on {
            self.pronounce_active();
        }
    }

    /// Speaks the looked-up dictionary word, or the active word as written.
    pub fn pronounce_active(&self) -> bool {
        let Some(speaker) = &self.speaker else {
            return false;
        };
        let text = match (&self.active_info, self.looked_up) {
            (Some(info), true) => info.dict_word.clone(),
            _ => match self.active_form() {
                Some(form) => form.to_string(),
                None => return false,
            },
        };
        speaker.speak(&text, self.translator.language_code());
        true
    }

    /// Commits or discards the active unit.
    ///
    /// A looked-up word becomes learning when `save` is set; otherwise a
    /// looked-up new word becomes known. An active phrase is saved when
    /// `save` is set and deleted otherwise. The word cursor stays in place
    /// after a phrase is handled.
    fn handle_active(&mut self, save: bool) {
        if let Some(phrase) = self.active_phrase.take() {
            if save {
                self.save_phrase(&phrase.occurrence);
            } else {
                self.delete_phrase(&phrase.occurrence.words);
            }
            self.clear_active_info();
            return;
        }
        let Some(form) = self.active_form().map(str::to_string) else {
            return;
        };
        if !self.looked_up {
            return;
        }
        let info = self.active_info.take();
        if save {
            if let Some(info) = info {
                log::debug!("{form:?} saved as learning");
                self.store.mark_learning(&form, info);
            }
        } else if self.store.category_of(&form) == WordCategory::New {
            log::debug!("{form:?} looked up and skipped, saved as known");
            self.store.mark_known(&form, info);
        }
        self.clear_active_info();
    }

    fn clear_active_info(&mut self) {
        self.active_info = None;
        self.looked_up = false;
    }

    fn save_phrase(&mut self, occurrence: &TextPhraseOccurrence) {
        let info = self
            .active_info
            .clone()
            .unwrap_or_else(|| WordInfo::new(occurrence.words.join(" ")));
        self.store
            .add_phrase(PhraseDefinition::new(occurrence.words.clone(), info));
        crate::tracking::add_phrase(&mut self.page.phrases, &self.page.tokens, &occurrence.words);
    }

    fn delete_phrase(&mut self, words: &[String]) {
        if self.store.remove_phrase(words).is_none() {
            return;
        }
        // Definitions it shadowed may start at the freed words.
        self.page.phrases = build_text_phrases(&self.page.tokens, self.store.phrases());
        log::debug!("phrase {:?} deleted", words.join(" "));
    }

    /// Saves the word lists.
    pub fn save_store(&self) -> Result<()> {
        self.store.save(self.persistence.as_ref())
    }

    pub fn export_word_lists(&self, dir: &Path) -> Result<()> {
        self.store.save_as_txt(dir)
    }

    pub fn note_opened(&mut self, title: &str, file_name: &str) {
        self.store.note_opened(title, file_name);
    }

    /// Metadata describing the current reading position.
    pub fn resume_metadata(&self) -> ResumeMetadata {
        self.document.resume_metadata(
            self.last_active.map(|l| (l.word_num, l.page_index)),
            self.page.index,
        )
    }

    /// Commits the active unit and saves the word lists. Returns the text
    /// file contents with the reading position appended, `None` for an
    /// empty text.
    pub fn close(&mut self) -> Result<Option<String>> {
        self.handle_active(true);
        self.phrase_selection = None;
        self.save_store()?;
        Ok(self.document.to_file_contents(&self.resume_metadata()))
    }

    /// [`close`](Self::close), then writes the text with its reading
    /// position to `path`.
    pub fn save_progress(&mut self, path: &Path) -> Result<()> {
        if let Some(contents) = self.close()? {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, contents)?;
            log::info!("progress saved to {}", path.display());
        }
        Ok(())
    }

    pub fn open_page(&mut self, page_index: usize) -> Result<()> {
        if page_index >= self.document.num_pages() {
            return Err(LegiloError::PageOutOfRange {
                index: page_index,
                pages: self.document.num_pages(),
            });
        }
        self.open_page_with(page_index, true);
        Ok(())
    }

    /// Rebuilds the page state. Restores the last active word when it was
    /// on this page and `restore` is set.
    fn open_page_with(&mut self, page_index: usize, restore: bool) {
        if self.page_is_open {
            self.handle_active(true);
            if let Err(e) = self.save_store() {
                log::warn!("could not save word lists when leaving page {}: {e}", self.page.index);
            }
        }
        let text = self.document.page(page_index).unwrap_or_default().to_string();
        self.page = PageState::build(page_index, &text, &self.store);
        self.page_is_open = true;
        self.phrase_selection = None;
        self.left_page_in_direction = None;
        self.has_gone_through_whole_page = false;
        self.active_word_num = None;
        self.active_phrase = None;
        self.clear_active_info();
        log::info!(
            "opened page {} of {} ({} words)",
            page_index + 1,
            self.document.num_pages(),
            self.page.num_words()
        );

        if !restore {
            return;
        }
        if let Some(last) = self.last_active.filter(|l| l.page_index == page_index) {
            if let Some(word_num) = self.resume_position(last.word_num) {
                self.active_word_num = Some(word_num);
                self.update_last_active();
            }
        }
    }

    /// First marked word at or after `saved`, so words that became known
    /// or ignored since are stepped over. Never moves backward.
    fn resume_position(&self, saved: usize) -> Option<usize> {
        let num_words = self.page.num_words();
        if num_words == 0 {
            return None;
        }
        let saved = saved.clamp(1, num_words);
        Some(
            (saved..=num_words)
                .find(|&n| self.is_marked(n))
                .unwrap_or(saved),
        )
    }

    fn update_last_active(&mut self) {
        self.last_active = self.active_word_num.map(|word_num| LastActive {
            word_num,
            page_index: self.page.index,
        });
    }

    fn is_marked(&self, word_num: usize) -> bool {
        self.category_of_word(word_num)
            .is_some_and(WordCategory::is_marked)
    }

    fn is_new(&self, word_num: usize) -> bool {
        self.category_of_word(word_num) == Some(WordCategory::New)
    }
}
