use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LegiloError, Result};

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub language: String,
    pub language_code: Option<String>,
    pub page_size: usize,
    pub short_text_limit: usize,
    pub autoscroll: bool,
    pub sound_on: bool,
    pub use_lemmatizer: bool,
    pub machine_translator: String,
    pub machine_translator_lang: String,
    pub glossary_path: Option<PathBuf>,
    pub lemma_table_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            language: "spanish".to_string(),
            language_code: None,
            page_size: 1800,
            short_text_limit: 5000,
            autoscroll: true,
            sound_on: false,
            use_lemmatizer: true,
            machine_translator: "Google Translate".to_string(),
            machine_translator_lang: "en".to_string(),
            glossary_path: None,
            lemma_table_path: None,
        }
    }
}

impl Config {
    /// Directory holding the word-list snapshots for the configured language.
    pub fn history_dir(&self) -> PathBuf {
        self.data_dir.join(&self.language).join("history")
    }

    /// Directory where opened texts are written back with their metadata.
    pub fn texts_dir(&self) -> PathBuf {
        self.data_dir.join(&self.language).join("texts")
    }

    pub fn txt_word_lists_dir(&self) -> PathBuf {
        self.data_dir.join(&self.language).join("txt_word_lists")
    }

    /// ISO 639-1 code for the configured language.
    pub fn language_code(&self) -> Option<String> {
        self.language_code
            .clone()
            .or_else(|| language_code_for(&self.language).map(str::to_string))
    }
}

/// Two-letter code for the languages Legilo is commonly used with.
pub fn language_code_for(language: &str) -> Option<&'static str> {
    let code = match language.trim().to_lowercase().as_str() {
        "english" => "en",
        "spanish" => "es",
        "french" => "fr",
        "german" => "de",
        "italian" => "it",
        "portuguese" => "pt",
        "russian" => "ru",
        "croatian" | "serbo-croatian" => "hr",
        "swedish" => "sv",
        "dutch" => "nl",
        "polish" => "pl",
        _ => return None,
    };
    Some(code)
}

pub fn load_config_from_file(file_path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(file_path).map_err(|e| {
        LegiloError::config(
            file_path,
            format!("failed to read ({}), please ensure it exists", e),
        )
    })?;
    toml::from_str::<Config>(&contents)
        .map_err(|e| LegiloError::config(file_path, format!("failed to parse: {}", e)))
}
