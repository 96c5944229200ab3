pub mod document;
pub mod sentences;
pub mod tokenizer;

pub use document::{load_text_file, parse_text, LoadedText, ResumeMetadata, TextDocument};
pub use sentences::{index_sentences, SentenceIndex, SentenceSpan};
pub use tokenizer::{render_tokens, tokenize, word_num_at_offset, WordToken};
