pub mod phrases;
pub mod word_info;
pub mod word_store;

pub use phrases::{
    add_phrase, build_text_phrases, phrase_at_offset, phrase_at_word, remove_phrase, PhraseBook,
    PhraseDefinition, TextPhraseOccurrence,
};
pub use word_info::{Definition, TranslationEntry, TranslationSource, WordInfo};
pub use word_store::{OpenedFile, WordCategory, WordStore};
