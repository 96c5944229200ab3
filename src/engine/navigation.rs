use super::{Direction, NavigationEngine};
use crate::tracking::WordCategory;

impl NavigationEngine {
    /// Activates `word_num` on the current page, committing whatever was
    /// active before. In phrase mode the word is chosen as a phrase end
    /// instead.
    pub fn select(&mut self, word_num: usize) -> bool {
        if word_num == 0 || word_num > self.page.num_words() {
            return false;
        }
        if self.phrase_selection.is_some() {
            return self.select_in_phrase_mode(word_num);
        }
        self.handle_active(true);
        self.set_active_word_num(Some(word_num));
        true
    }

    /// Activates the word at a byte offset of the page text.
    pub fn select_at_offset(&mut self, offset: usize) -> bool {
        match crate::text::word_num_at_offset(&self.page.tokens, offset) {
            Some(word_num) => self.select(word_num),
            None => false,
        }
    }

    /// Moves the cursor forward. New words walked past become known.
    pub fn advance(&mut self, skip_known: bool) -> bool {
        self.advance_with(skip_known, true)
    }

    pub(super) fn advance_with(&mut self, skip_known: bool, save: bool) -> bool {
        if self.phrase_selection.is_some() {
            return self.move_selection_cursor(Direction::Right);
        }
        if self.active_phrase.is_some() {
            self.handle_active(save);
            return true;
        }
        self.handle_active(save);

        loop {
            let next = if skip_known {
                self.next_marked_word_num(self.active_word_num)
            } else {
                self.next_word_num(self.active_word_num)
            };
            if self.active_word_num.is_some() && next.is_none() {
                self.left_page_in_direction = Some(Direction::Right);
            }
            if next.is_some() {
                self.set_active_word_num(next);
                return true;
            }

            self.has_gone_through_whole_page = true;
            if self.page.index + 1 >= self.document.num_pages() {
                self.set_active_word_num(None);
                return false;
            }
            self.set_active_word_num(None);
            let next_page = self.page.index + 1;
            log::debug!("end of page reached, continuing on page {}", next_page + 1);
            self.open_page_with(next_page, false);
        }
    }

    /// Moves the cursor backward.
    ///
    /// Running off the start opens the previous page, but the cursor then
    /// lands on that page's first new word instead of its last word. Without
    /// a previous marked word the cursor falls back to the first new word
    /// of the page.
    pub fn retreat(&mut self, skip_known: bool) -> bool {
        if self.phrase_selection.is_some() {
            return self.move_selection_cursor(Direction::Left);
        }
        if self.active_phrase.is_some() {
            return false;
        }
        self.handle_active(true);

        let previous = if skip_known {
            self.previous_marked_word_num(self.active_word_num)
        } else {
            self.previous_word_num(self.active_word_num)
        };
        if self.active_word_num.is_some() && previous.is_none() {
            self.left_page_in_direction = Some(Direction::Left);
        }

        let target = match previous {
            Some(word_num) => Some(word_num),
            None => {
                if self.left_page_in_direction == Some(Direction::Left) {
                    if self.page.index == 0 {
                        self.set_active_word_num(None);
                        return false;
                    }
                    let previous_page = self.page.index - 1;
                    self.open_page_with(previous_page, false);
                }
                match self.first_new_word() {
                    Some(word_num) => Some(word_num),
                    None if skip_known => self.last_marked_word(),
                    None => self.last_word(),
                }
            }
        };
        self.set_active_word_num(target);
        target.is_some()
    }

    /// Marks the active word known, or deletes the active phrase.
    ///
    /// A word is only accepted when it was looked up or is already learning,
    /// so a word never seen cannot be made known by accident. The cursor
    /// then moves on without committing anything else.
    pub fn mark_known(&mut self) -> bool {
        if let Some(phrase) = self.active_phrase.take() {
            self.delete_phrase(&phrase.occurrence.words);
            self.clear_active_info();
            return true;
        }
        let Some(form) = self.active_form().map(str::to_string) else {
            return false;
        };
        let category = self.store.category_of(&form);
        if !(category == WordCategory::Learning || self.looked_up) {
            log::debug!("{form:?} was never looked up, not marked known");
            return false;
        }
        let info = self
            .active_info
            .take()
            .or_else(|| self.store.stored_info(&form).cloned());
        self.store.mark_known(&form, info);
        self.clear_active_info();
        self.advance_with(true, false);
        true
    }

    /// Marks the active word ignored and moves on. Phrases cannot be ignored.
    pub fn mark_ignored(&mut self) -> bool {
        if self.active_phrase.is_some() {
            return false;
        }
        let Some(form) = self.active_form().map(str::to_string) else {
            return false;
        };
        self.store.mark_ignored(&form);
        self.clear_active_info();
        self.advance_with(true, false);
        true
    }

    /// Enter key: look up the active unit, or move on once it is looked up.
    pub fn look_up_or_next(&mut self) -> bool {
        if self.looked_up {
            return self.advance(true);
        }
        match &self.phrase_selection {
            Some(selection) => match selection.cursor {
                Some(word_num) => self.select(word_num),
                None => false,
            },
            None => self.look_up(),
        }
    }

    pub fn show_next_page(&mut self) -> bool {
        let next = self.page.index + 1;
        self.open_page(next).is_ok()
    }

    pub fn show_previous_page(&mut self) -> bool {
        match self.page.index.checked_sub(1) {
            Some(previous) => self.open_page(previous).is_ok(),
            None => false,
        }
    }

    /// Treats the rest of the page as read: every new word left on it
    /// becomes known, then the next page opens.
    pub fn next_page_setting_new_to_known(&mut self) -> bool {
        self.handle_active(true);
        self.has_gone_through_whole_page = true;
        self.set_active_word_num(None);
        self.show_next_page()
    }

    /// Moves the active word, promoting every new word from the previous
    /// position up to the word before the new one to known. With no new
    /// position, the rest of the page is promoted once it has been gone
    /// through.
    pub(super) fn set_active_word_num(&mut self, word_num: Option<usize>) {
        let previous = self.active_word_num.unwrap_or(1);
        self.active_word_num = word_num;
        self.clear_active_info();
        match word_num {
            Some(current) => self.set_new_to_known(previous, current.saturating_sub(1)),
            None if self.has_gone_through_whole_page => {
                self.set_new_to_known(previous, self.page.num_words());
            }
            None => {}
        }
        self.update_last_active();
        log::debug!("active word {:?} on page {}", word_num, self.page.index + 1);
    }

    fn set_new_to_known(&mut self, start: usize, end: usize) {
        for word_num in start..=end {
            if !self.is_new(word_num) {
                continue;
            }
            if let Some(form) = self.page.form(word_num).map(str::to_string) {
                self.store.mark_known(&form, None);
            }
        }
    }

    fn next_word_num(&mut self, active: Option<usize>) -> Option<usize> {
        let start = match active {
            Some(word_num) => word_num + 1,
            None if !self.has_gone_through_whole_page => 1,
            None => return None,
        };
        self.scan_forward(start, |engine, n| {
            engine.category_of_word(n) != Some(WordCategory::Ignored)
        })
    }

    fn next_marked_word_num(&mut self, active: Option<usize>) -> Option<usize> {
        let start = match active {
            Some(word_num) => word_num + 1,
            None if !self.has_gone_through_whole_page => 1,
            None => return None,
        };
        self.scan_forward(start, |engine, n| engine.is_marked(n))
    }

    fn scan_forward(&mut self, start: usize, accept: impl Fn(&Self, usize) -> bool) -> Option<usize> {
        let this: &Self = self;
        let found = (start..=this.page.num_words()).find(|&n| accept(this, n));
        if found.is_none() {
            self.has_gone_through_whole_page = true;
        }
        found
    }

    fn previous_word_num(&self, active: Option<usize>) -> Option<usize> {
        (1..active?)
            .rev()
            .find(|&n| self.category_of_word(n) != Some(WordCategory::Ignored))
    }

    fn previous_marked_word_num(&self, active: Option<usize>) -> Option<usize> {
        (1..active?).rev().find(|&n| self.is_marked(n))
    }

    pub(super) fn first_new_word(&self) -> Option<usize> {
        (1..=self.page.num_words()).find(|&n| self.is_new(n))
    }

    fn last_marked_word(&self) -> Option<usize> {
        (1..=self.page.num_words()).rev().find(|&n| self.is_marked(n))
    }

    fn last_word(&self) -> Option<usize> {
        self.previous_word_num(Some(self.page.num_words() + 1))
    }
}
