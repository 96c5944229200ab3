// Modules of the reader library. The binary in main.rs only adds the window.
pub mod config;
pub mod engine;
pub mod error;
pub mod lookup;
pub mod persistence;
pub mod speech;
pub mod text;
pub mod tracking;

pub use config::Config;
pub use engine::{ActiveUnit, Marker, NavigationEngine, PhraseMarker};
pub use error::{LegiloError, Result};
pub use lookup::Translator;
pub use tracking::{WordCategory, WordInfo, WordStore};
