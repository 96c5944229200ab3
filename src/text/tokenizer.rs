use once_cell::sync::Lazy;
use regex::Regex;

// Letters, digits and inner hyphens. Apostrophes are not word characters,
// so "can't" yields "can" and "t".
static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+(?:-\w+)*\b").unwrap());

/// One addressable word of a page.
///
/// `word_num` is 1-based and contiguous. Offsets are byte offsets into the
/// page text, `end_offset` exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordToken {
    pub word_num: usize,
    pub form: String,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl WordToken {
    /// The token as it appears in the source, original casing kept.
    pub fn original<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start_offset..self.end_offset]
    }
}

pub fn tokenize(text: &str) -> Vec<WordToken> {
    RE_WORD
        .find_iter(text)
        .enumerate()
        .map(|(index, m)| WordToken {
            word_num: index + 1,
            form: m.as_str().to_lowercase(),
            start_offset: m.start(),
            end_offset: m.end(),
        })
        .collect()
}

/// Renders the token forms back into a plain text, one space apart.
pub fn render_tokens(tokens: &[WordToken]) -> String {
    tokens
        .iter()
        .map(|token| token.form.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Word number of the token covering `offset`. Both token ends count as
/// inside so a cursor placed right after a word still selects it.
pub fn word_num_at_offset(tokens: &[WordToken], offset: usize) -> Option<usize> {
    let idx = tokens.partition_point(|token| token.end_offset < offset);
    tokens
        .get(idx)
        .filter(|token| token.start_offset <= offset)
        .map(|token| token.word_num)
}
