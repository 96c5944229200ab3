#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use clap::Parser;
use eframe::{egui, App, NativeOptions};
use egui::{Color32, RichText};
use std::path::{Path, PathBuf};

use legilo::config::{self, Config};
use legilo::engine::{ActiveUnit, Marker, NavigationEngine, PhraseMarker};
use legilo::lookup::providers::{GlossaryProvider, TableLemmatizer};
use legilo::lookup::Translator;
use legilo::persistence::JsonDirStore;
use legilo::speech::{BackgroundSpeaker, CommandBackend};
use legilo::text::{load_text_file, TextDocument};
use legilo::tracking::{TextPhraseOccurrence, TranslationSource, WordCategory, WordInfo, WordStore};

const NEW_COLOR: Color32 = Color32::from_rgb(90, 150, 230);
const LEARNING_COLOR: Color32 = Color32::from_rgb(230, 140, 30);
const ACTIVE_BG: Color32 = Color32::from_rgb(250, 220, 90);
const SELECTED_BG: Color32 = Color32::from_rgb(160, 210, 250);
const PHRASE_BG: Color32 = Color32::from_rgb(250, 200, 150);
const MAX_TITLE_CHARS: usize = 60;

#[derive(Parser, Debug)]
#[command(name = "legilo", about = "Read a foreign-language text and keep track of its words")]
struct Args {
    /// Plain-text file to read.
    text_file: PathBuf,

    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides the language from the config file.
    #[arg(short, long)]
    language: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum KeyAction {
    LookUpOrNext,
    Next { skip_known: bool },
    Previous { skip_known: bool },
    Known,
    Ignored,
    PhraseMode,
    Sentence,
    MachineTranslation,
    NextPage,
    PreviousPage,
}

struct ReaderApp {
    engine: NavigationEngine,
    title: String,
    save_path: PathBuf,
    word_lists_dir: PathBuf,
    autoscroll: bool,
    // Active unit the edit fields were filled for.
    edits_for: (Option<String>, bool),
    translation_edit: String,
    remark_edit: String,
    lemma_edit: String,
    scrolled_to: Option<(usize, usize)>,
    status: Option<String>,
    closed: bool,
}

impl ReaderApp {
    fn open(args: &Args) -> legilo::Result<Self> {
        let mut config = match config::load_config_from_file(&args.config) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{e}, using the default configuration");
                Config::default()
            }
        };
        if let Some(language) = &args.language {
            config.language = language.clone();
        }

        let loaded = load_text_file(&args.text_file)?;
        let title = title_of(&loaded.text);
        let document = TextDocument::paginate(
            loaded.text,
            &loaded.meta,
            config.page_size,
            config.short_text_limit,
        );

        let persistence = JsonDirStore::new(config.history_dir());
        let mut store = WordStore::load(&persistence);
        store.forget_missing(&config.texts_dir());
        log::info!(
            "{} known and {} learning {} words",
            store.num_known_words(),
            store.num_learning_words(),
            config.language
        );

        let translator = build_translator(&config);
        let mut engine = NavigationEngine::new(document, store, Box::new(persistence), translator);
        if config.sound_on {
            let speaker = BackgroundSpeaker::spawn(CommandBackend::new("espeak"));
            engine = engine.with_speaker(Box::new(speaker), true);
        }
        engine.resume(&loaded.meta);

        let file_name = args
            .text_file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "text.txt".to_string());
        engine.note_opened(&title, &file_name);

        Ok(Self {
            engine,
            title,
            save_path: config.texts_dir().join(&file_name),
            word_lists_dir: config.txt_word_lists_dir(),
            autoscroll: config.autoscroll,
            edits_for: (None, false),
            translation_edit: String::new(),
            remark_edit: String::new(),
            lemma_edit: String::new(),
            scrolled_to: None,
            status: None,
            closed: false,
        })
    }

    fn handle_keys(&mut self, ctx: &egui::Context) {
        // Keys typed into the edit fields are not commands.
        if ctx.wants_keyboard_input() {
            return;
        }
        let actions = ctx.input(|i| {
            let shift = i.modifiers.shift;
            let bindings = [
                (egui::Key::Enter, KeyAction::LookUpOrNext),
                (egui::Key::ArrowRight, KeyAction::Next { skip_known: !shift }),
                (egui::Key::ArrowLeft, KeyAction::Previous { skip_known: !shift }),
                (egui::Key::K, KeyAction::Known),
                (egui::Key::I, KeyAction::Ignored),
                (egui::Key::P, KeyAction::PhraseMode),
                (egui::Key::S, KeyAction::Sentence),
                (egui::Key::M, KeyAction::MachineTranslation),
                (egui::Key::PageDown, KeyAction::NextPage),
                (egui::Key::PageUp, KeyAction::PreviousPage),
            ];
            bindings
                .into_iter()
                .filter(|(key, _)| i.key_pressed(*key))
                .map(|(_, action)| action)
                .collect::<Vec<_>>()
        });
        for action in actions {
            self.apply(action);
        }
    }

    fn apply(&mut self, action: KeyAction) {
        let engine = &mut self.engine;
        let handled = match action {
            KeyAction::LookUpOrNext => engine.look_up_or_next(),
            KeyAction::Next { skip_known } => engine.advance(skip_known),
            KeyAction::Previous { skip_known } => engine.retreat(skip_known),
            KeyAction::Known => engine.mark_known(),
            KeyAction::Ignored => engine.mark_ignored(),
            KeyAction::PhraseMode => {
                engine.toggle_phrase_mode();
                true
            }
            KeyAction::Sentence => engine.look_up_current_sentence(),
            KeyAction::MachineTranslation => engine.toggle_machine_translation(),
            KeyAction::NextPage => engine.show_next_page(),
            KeyAction::PreviousPage => engine.show_previous_page(),
        };
        if !handled {
            log::debug!("{action:?} did nothing");
        }
    }

    /// Refills the edit fields when another unit became active or it was
    /// looked up.
    fn sync_edits(&mut self) {
        let current = (self.engine.active_word_or_phrase(), self.engine.is_looked_up());
        if current == self.edits_for {
            return;
        }
        self.edits_for = current;
        self.translation_edit = self.engine.personal_translation().unwrap_or_default().to_string();
        self.remark_edit = self
            .engine
            .active_info()
            .and_then(|info| info.remark.clone())
            .unwrap_or_default();
        self.lemma_edit = self.engine.lemma_text();
    }

    fn save_on_close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.engine.save_progress(&self.save_path) {
            log::error!("could not save progress: {e}");
        }
        if let Err(e) = self.engine.export_word_lists(&self.word_lists_dir) {
            log::warn!("could not export word lists: {e}");
        }
    }

    fn show_top_bar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Export word lists").clicked() {
                    self.status = Some(match self.engine.export_word_lists(&self.word_lists_dir) {
                        Ok(()) => format!("Word lists written to {}", self.word_lists_dir.display()),
                        Err(e) => format!("Export failed: {e}"),
                    });
                    ui.close_menu();
                }
                if ui.button("Exit").clicked() {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
            });
            ui.menu_button("Page", |ui| {
                if ui.button("Next page, remaining new words known").clicked() {
                    self.engine.next_page_setting_new_to_known();
                    ui.close_menu();
                }
            });
            ui.separator();
            ui.label(format!(
                "Page {} / {}",
                self.engine.page_index() + 1,
                self.engine.num_pages()
            ));
            ui.label(format!("Known words: {}", self.engine.store().num_known_words()));
            if self.engine.is_in_phrase_mode() {
                ui.colored_label(SELECTED_BG, "Phrase mode");
            }
            if let Some(status) = &self.status {
                ui.label(status);
            }
        });
    }

    fn show_page(&mut self, ui: &mut egui::Ui) {
        let scroll_target = self.take_scroll_target();
        let mut clicked = None;
        let engine = &self.engine;
        let page = engine.page();
        let active_phrase = match engine.active_unit() {
            Some(ActiveUnit::Phrase { occurrence, .. }) => Some(occurrence),
            _ => None,
        };

        ui.horizontal_wrapped(|ui| {
            ui.spacing_mut().item_spacing.x = 0.0;
            let mut prev_end = 0;
            for token in &page.tokens {
                show_gap(ui, &page.text[prev_end..token.start_offset]);
                let text = style_word(
                    engine,
                    active_phrase.as_ref(),
                    token.word_num,
                    RichText::new(token.original(&page.text)).size(18.0),
                );
                let response = ui.add(egui::Label::new(text).sense(egui::Sense::click()));
                if response.clicked() {
                    clicked = Some(token.word_num);
                }
                if scroll_target == Some(token.word_num) {
                    response.scroll_to_me(Some(egui::Align::Center));
                }
                prev_end = token.end_offset;
            }
            show_gap(ui, &page.text[prev_end..]);
        });

        if let Some(word_num) = clicked {
            self.engine.select(word_num);
        }
    }

    fn take_scroll_target(&mut self) -> Option<usize> {
        if !self.autoscroll {
            return None;
        }
        let word_num = self.engine.active_word_num()?;
        let position = (self.engine.page_index(), word_num);
        if self.scrolled_to == Some(position) {
            return None;
        }
        self.scrolled_to = Some(position);
        Some(word_num)
    }

    fn show_info_panel(&mut self, ui: &mut egui::Ui) {
        self.sync_edits();
        let Some(word) = self.engine.active_word_or_phrase() else {
            ui.label("Click a word or press → to start reading.");
            return;
        };
        ui.heading(&word);
        if let Some(category) = self.engine.active_category() {
            ui.label(category.label());
        }
        let Some(info) = self.engine.active_info().cloned() else {
            ui.label("Press Enter to look it up.");
            return;
        };
        ui.separator();
        show_translations(ui, &info);
        ui.separator();

        ui.label("Personal translation");
        if ui.text_edit_singleline(&mut self.translation_edit).lost_focus() {
            self.engine.set_personal_translation(&self.translation_edit);
        }
        ui.label("Lemmas (one per line, lemma: translation)");
        ui.add(egui::TextEdit::multiline(&mut self.lemma_edit).desired_rows(2));
        if ui.button("Apply lemmas").clicked() {
            self.engine.update_lemmas(&self.lemma_edit);
            self.lemma_edit = self.engine.lemma_text();
        }
        ui.label("Remark");
        let remark = ui.add(egui::TextEdit::multiline(&mut self.remark_edit).desired_rows(3));
        if remark.lost_focus() {
            self.engine.set_remark(&self.remark_edit);
        }

        ui.separator();
        if let Some((sentence, trans)) = info.example() {
            if !sentence.is_empty() {
                ui.label(RichText::new(sentence).italics());
                ui.label(trans);
            }
        }
        let mut example = None;
        ui.horizontal(|ui| {
            ui.label("Example:");
            for n in 0..=9 {
                if ui.small_button(n.to_string()).clicked() {
                    example = Some(n);
                }
            }
        });
        if let Some(n) = example {
            self.engine.select_example_sentence(n);
        }

        ui.separator();
        ui.horizontal_wrapped(|ui| {
            if ui.button("Known (K)").clicked() {
                self.engine.mark_known();
            }
            if ui.button("Ignore (I)").clicked() {
                self.engine.mark_ignored();
            }
            let machine_label = if info.has_machine_translation() {
                "Hide machine translation (M)"
            } else {
                "Machine translation (M)"
            };
            if ui.button(machine_label).clicked() {
                self.engine.toggle_machine_translation();
            }
            if info.has_machine_translation() && ui.button("Use machine translation").clicked() {
                self.engine.use_machine_translation();
                self.translation_edit = self.engine.personal_translation().unwrap_or_default().to_string();
                self.lemma_edit = self.engine.lemma_text();
            }
            if ui.button("Speak").clicked() {
                self.engine.pronounce_active();
            }
        });
    }
}

impl App for ReaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input(|i| i.viewport().close_requested()) {
            self.save_on_close();
        }
        self.handle_keys(ctx);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            self.show_top_bar(ctx, ui);
        });

        egui::SidePanel::right("info_panel")
            .min_width(250.0)
            .default_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_source("info_scroll")
                    .show(ui, |ui| self.show_info_panel(ui));
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading(&self.title);
            ui.separator();
            egui::ScrollArea::vertical()
                .id_source("page_scroll")
                .auto_shrink([false, false])
                .show(ui, |ui| self.show_page(ui));
        });
    }
}

fn build_translator(config: &Config) -> Translator {
    let glossary = match &config.glossary_path {
        Some(path) => GlossaryProvider::from_file(path).unwrap_or_else(|e| {
            log::warn!("{e}, looking words up without a glossary");
            GlossaryProvider::new()
        }),
        None => GlossaryProvider::new(),
    };
    let language_code = config.language_code().unwrap_or_else(|| {
        log::warn!("no language code known for {}, set language_code in the config", config.language);
        config.language.clone()
    });
    let mut translator = Translator::new(
        Box::new(glossary),
        &config.language,
        &language_code,
        &config.machine_translator_lang,
    )
    .with_machine_source(TranslationSource::machine_from_name(&config.machine_translator));

    if config.use_lemmatizer {
        if let Some(path) = &config.lemma_table_path {
            match TableLemmatizer::from_file(path) {
                Ok(lemmatizer) => translator = translator.with_lemmatizer(Box::new(lemmatizer)),
                Err(e) => log::warn!("lemma table {} not loaded: {e}", path.display()),
            }
        }
    }
    translator
}

fn title_of(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or_default().trim();
    first_line.chars().take(MAX_TITLE_CHARS).collect()
}

fn show_gap(ui: &mut egui::Ui, gap: &str) {
    let mut lines = gap.split('\n');
    if let Some(first) = lines.next() {
        if !first.is_empty() {
            ui.label(RichText::new(first).size(18.0));
        }
    }
    for line in lines {
        ui.end_row();
        if !line.is_empty() {
            ui.label(RichText::new(line).size(18.0));
        }
    }
}

fn style_word(
    engine: &NavigationEngine,
    active_phrase: Option<&TextPhraseOccurrence>,
    word_num: usize,
    text: RichText,
) -> RichText {
    let text = match engine.word_marker(word_num) {
        Marker::Active => text.background_color(ACTIVE_BG).color(Color32::BLACK),
        Marker::Selected => text.background_color(SELECTED_BG).color(Color32::BLACK),
        Marker::Category(WordCategory::New) => text.color(NEW_COLOR),
        Marker::Category(WordCategory::Learning) => text.color(LEARNING_COLOR),
        Marker::Category(WordCategory::Known) => text,
        Marker::Category(WordCategory::Ignored) => text.color(Color32::GRAY),
    };
    if active_phrase.is_some_and(|phrase| phrase.contains_word(word_num)) {
        return text.underline().background_color(PHRASE_BG).color(Color32::BLACK);
    }
    let in_phrase = engine
        .page()
        .phrases
        .iter()
        .filter(|occurrence| occurrence.contains_word(word_num))
        .any(|occurrence| engine.phrase_marker(occurrence) == PhraseMarker::Ordinary);
    if in_phrase {
        text.underline()
    } else {
        text
    }
}

fn show_translations(ui: &mut egui::Ui, info: &WordInfo) {
    let mut details = Vec::new();
    if let Some(word_type) = &info.word_type {
        details.push(word_type.clone());
    }
    if let Some(gender) = &info.gender {
        details.push(gender.clone());
    }
    if !details.is_empty() {
        ui.label(details.join(", "));
    }
    if let Some(lemmas) = &info.lemmas {
        let lemmas: Vec<&str> = lemmas.iter().map(String::as_str).collect();
        ui.label(format!("Lemmas: {}", lemmas.join(", ")));
    }
    for entry in &info.trans {
        let mut head = entry.word.clone().unwrap_or_else(|| info.dict_word.clone());
        if let Some(pos) = &entry.part_of_speech {
            head.push_str(&format!(" ({pos})"));
        }
        if entry.source.is_machine() {
            head.push_str(" [machine]");
        }
        ui.strong(head);
        for (i, definition) in entry.definitions.iter().enumerate() {
            ui.label(format!("{}. {}", i + 1, definition.definition));
        }
    }
    if let Some(remark) = &info.remark {
        ui.small(remark);
    }
}

fn main() -> Result<(), eframe::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let app = match ReaderApp::open(&args) {
        Ok(app) => app,
        Err(e) => {
            log::error!("could not open {}: {e}", args.text_file.display());
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    let window_title = format!("Legilo - {}", file_label(&args.text_file));

    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(&window_title, options, Box::new(|_cc| Box::new(app)))
}

fn file_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
