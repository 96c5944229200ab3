use super::*;
use crate::lookup::providers::GlossaryProvider;
use crate::persistence::MemoryStore;
use crate::tracking::{Definition, TranslationEntry};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

const TEXT: &str = "The cat sees a dog. The dog runs.";

#[derive(Clone, Default)]
struct SharedStore(Rc<MemoryStore>);

impl Persistence for SharedStore {
    fn save_snapshot(&self, key: &str, value: &Value) -> Result<()> {
        self.0.save_snapshot(key, value)
    }

    fn load_snapshot(&self, key: &str) -> Result<Option<Value>> {
        self.0.load_snapshot(key)
    }
}

#[derive(Clone, Default)]
struct RecordingSpeaker {
    spoken: Rc<RefCell<Vec<String>>>,
}

impl Speaker for RecordingSpeaker {
    fn speak(&self, text: &str, _language: &str) {
        self.spoken.borrow_mut().push(text.to_string());
    }
}

fn words(phrase: &str) -> Vec<String> {
    phrase.split_whitespace().map(str::to_string).collect()
}

fn dictionary_entry(word: &str, definition: &str) -> TranslationEntry {
    TranslationEntry {
        word: Some(word.to_string()),
        part_of_speech: Some("verb".to_string()),
        definitions: vec![Definition::new(definition)],
        ..Default::default()
    }
}

fn single_page(text: &str) -> TextDocument {
    TextDocument::paginate(text.to_string(), &ResumeMetadata::default(), 1800, 5000)
}

// "Uno dos." and "Tres cuatro." on separate pages.
fn two_pages() -> TextDocument {
    TextDocument::paginate(
        "Uno dos.\nTres cuatro.".to_string(),
        &ResumeMetadata::default(),
        10,
        0,
    )
}

fn engine_with(document: TextDocument, store: WordStore, glossary: GlossaryProvider) -> NavigationEngine {
    let translator = Translator::new(Box::new(glossary), "english", "en", "de");
    NavigationEngine::new(document, store, Box::new(MemoryStore::new()), translator)
}

fn engine(store: WordStore) -> NavigationEngine {
    engine_with(single_page(TEXT), store, GlossaryProvider::new())
}

fn store_with_known(forms: &[&str]) -> WordStore {
    let mut store = WordStore::new();
    for form in forms {
        store.mark_known(form, None);
    }
    store
}

#[test]
fn new_words_walked_past_become_known() {
    let mut engine = engine(store_with_known(&["cat"]));
    assert!(engine.select(1));
    assert!(engine.advance(true));

    assert_eq!(engine.active_word_num(), Some(3));
    assert_eq!(engine.store().category_of("the"), WordCategory::Known);
    assert_eq!(engine.store().category_of("sees"), WordCategory::New);
}

#[test]
fn selecting_out_of_range_does_nothing() {
    let mut engine = engine(WordStore::new());
    assert!(!engine.select(0));
    assert!(!engine.select(9));
    assert_eq!(engine.active_word_num(), None);
}

#[test]
fn end_of_last_page_clears_the_cursor() {
    let mut engine = engine_with(single_page("Uno dos."), WordStore::new(), GlossaryProvider::new());
    engine.select(2);
    assert!(!engine.advance(true));

    assert_eq!(engine.active_word_num(), None);
    assert!(engine.has_gone_through_whole_page());
    assert_eq!(engine.store().category_of("uno"), WordCategory::Known);
    assert_eq!(engine.store().category_of("dos"), WordCategory::Known);
}

#[test]
fn advancing_past_the_page_end_opens_the_next_page() {
    let mut engine = engine_with(two_pages(), WordStore::new(), GlossaryProvider::new());
    assert_eq!(engine.num_pages(), 2);
    engine.select(2);
    assert!(engine.advance(true));

    assert_eq!(engine.page_index(), 1);
    assert_eq!(engine.active_word_num(), Some(1));
    assert_eq!(engine.active_form(), Some("tres"));
    assert_eq!(engine.store().category_of("dos"), WordCategory::Known);
}

#[test]
fn retreating_off_a_page_lands_on_the_first_new_word() {
    let mut engine = engine_with(two_pages(), WordStore::new(), GlossaryProvider::new());
    assert!(engine.show_next_page());
    engine.select(2);
    assert_eq!(engine.store().category_of("tres"), WordCategory::Known);

    assert!(engine.retreat(true));
    assert_eq!(engine.page_index(), 0);
    // The first new word, not the last word of the page.
    assert_eq!(engine.active_word_num(), Some(1));
}

#[test]
fn retreating_off_the_first_page_clears_the_cursor() {
    let mut engine = engine(WordStore::new());
    engine.select(1);
    assert!(!engine.retreat(false));
    assert_eq!(engine.active_word_num(), None);
    assert_eq!(engine.page_index(), 0);
}

#[test]
fn ignored_words_are_never_visited_again() {
    let mut engine = engine(store_with_known(&["cat"]));
    engine.select(2);
    assert!(engine.mark_ignored());
    assert_eq!(engine.store().category_of("cat"), WordCategory::Ignored);
    assert_eq!(engine.active_word_num(), Some(3));

    assert!(engine.retreat(false));
    assert_eq!(engine.active_word_num(), Some(1));
    assert!(engine.advance(false));
    assert_eq!(engine.active_word_num(), Some(3));
}

#[test]
fn retreat_without_new_words_lands_on_the_last_marked_word() {
    let mut store = store_with_known(&["uno", "tres"]);
    store.mark_learning("dos", WordInfo::new("dos"));
    let mut engine = engine_with(single_page("Uno dos tres."), store, GlossaryProvider::new());

    assert!(engine.retreat(true));
    assert_eq!(engine.active_word_num(), Some(2));
}

#[test]
fn retreat_without_new_words_skips_an_ignored_last_word() {
    let mut store = store_with_known(&["uno", "dos"]);
    store.mark_ignored("tres");
    let mut engine = engine_with(single_page("Uno dos tres."), store, GlossaryProvider::new());

    assert!(engine.retreat(false));
    assert_eq!(engine.active_word_num(), Some(2));
    assert_eq!(engine.category_of_word(2), Some(WordCategory::Known));
}

#[test]
fn retreat_finds_nothing_when_every_word_is_ignored() {
    let mut store = WordStore::new();
    store.mark_ignored("uno");
    store.mark_ignored("dos");
    let mut engine = engine_with(single_page("Uno dos."), store, GlossaryProvider::new());

    assert!(!engine.retreat(false));
    assert_eq!(engine.active_word_num(), None);
}

#[test]
fn word_must_be_looked_up_before_it_can_be_marked_known() {
    let mut engine = engine(WordStore::new());
    engine.select(3);
    assert!(!engine.mark_known());
    assert_eq!(engine.store().category_of("sees"), WordCategory::New);

    assert!(engine.look_up());
    assert!(engine.mark_known());
    assert_eq!(engine.store().category_of("sees"), WordCategory::Known);
    assert!(engine.store().stored_info("sees").is_some());
    assert_eq!(engine.active_word_num(), Some(4));
}

#[test]
fn learning_word_can_be_marked_known_without_lookup() {
    let mut store = WordStore::new();
    store.mark_learning("sees", WordInfo::new("sees"));
    let mut engine = engine(store);
    engine.select(3);

    assert!(engine.mark_known());
    assert_eq!(engine.store().category_of("sees"), WordCategory::Known);
    assert_eq!(
        engine.store().stored_info("sees").map(|i| i.dict_word.as_str()),
        Some("sees")
    );
}

#[test]
fn second_lookup_is_refused() {
    let mut engine = engine(WordStore::new());
    assert!(!engine.look_up());
    engine.select(1);
    assert!(engine.look_up());
    assert!(engine.is_looked_up());
    assert!(!engine.look_up());
}

#[test]
fn looked_up_word_is_saved_as_learning_on_advance() {
    let mut engine = engine(WordStore::new());
    engine.select(3);
    engine.look_up();
    engine.advance(true);

    assert_eq!(engine.store().category_of("sees"), WordCategory::Learning);
    assert_eq!(engine.active_word_num(), Some(4));
    assert!(!engine.is_looked_up());
}

#[test]
fn known_word_looked_up_again_becomes_learning() {
    let mut engine = engine(store_with_known(&["sees"]));
    engine.select(3);
    engine.look_up();
    engine.select(5);
    assert_eq!(engine.store().category_of("sees"), WordCategory::Learning);
}

#[test]
fn word_not_looked_up_is_not_saved_as_learning() {
    let mut engine = engine(WordStore::new());
    engine.select(3);
    engine.advance(true);
    assert_eq!(engine.store().category_of("sees"), WordCategory::Known);
    assert_eq!(engine.store().num_learning_words(), 0);
}

#[test]
fn phrase_mode_click_outside_a_phrase_chooses_an_end() {
    let mut store = WordStore::new();
    store.add_phrase(PhraseDefinition::new(words("dog runs"), WordInfo::new("dog runs")));
    let mut engine = engine(store);
    assert_eq!(engine.page().phrases.len(), 1);

    assert!(engine.toggle_phrase_mode());
    engine.select(5);
    assert!(engine.is_in_phrase_mode());
    assert!(!matches!(engine.active_unit(), Some(ActiveUnit::Phrase { .. })));
    assert_eq!(engine.word_marker(5), Marker::Selected);
}

#[test]
fn phrase_mode_click_on_a_phrase_activates_it() {
    let mut store = WordStore::new();
    store.add_phrase(PhraseDefinition::new(words("dog runs"), WordInfo::new("dog runs")));
    let mut engine = engine(store);

    engine.toggle_phrase_mode();
    assert!(engine.select(7));
    assert!(!engine.is_in_phrase_mode());
    match engine.active_unit() {
        Some(ActiveUnit::Phrase {
            occurrence,
            looked_up,
            is_new,
        }) => {
            assert_eq!(occurrence.start_word_num, 7);
            assert_eq!(occurrence.end_word_num, 8);
            assert!(looked_up);
            assert!(!is_new);
        }
        other => panic!("expected an active phrase, got {other:?}"),
    }
    assert_eq!(engine.active_word_or_phrase().as_deref(), Some("dog runs"));
    assert_eq!(engine.active_category(), Some(WordCategory::Learning));
    assert_eq!(engine.phrase_marker(&engine.page().phrases[0].clone()), PhraseMarker::Active);
}

#[test]
fn choosing_two_ends_creates_and_saves_a_phrase() {
    let mut engine = engine(WordStore::new());
    engine.toggle_phrase_mode();
    engine.select(4);
    engine.select(3);

    assert!(!engine.is_in_phrase_mode());
    assert!(engine.store().phrase_exists(&words("sees a")));
    assert!(matches!(
        engine.active_unit(),
        Some(ActiveUnit::Phrase { is_new: true, looked_up: true, .. })
    ));
    assert_eq!(
        engine.active_info().and_then(|i| i.word_type.as_deref()),
        Some("phrase")
    );

    engine.advance(true);
    assert_eq!(engine.active_unit(), None);
    assert!(engine.store().phrase_exists(&words("sees a")));
    assert_eq!(engine.page().phrases.len(), 1);
}

#[test]
fn deleting_a_phrase_brings_back_the_one_it_shadowed() {
    let mut store = WordStore::new();
    store.add_phrase(PhraseDefinition::new(words("dog runs"), WordInfo::new("dog runs")));
    store.add_phrase(PhraseDefinition::new(words("dog runs away"), WordInfo::new("dog runs away")));
    let mut engine = engine_with(single_page("The dog runs away."), store, GlossaryProvider::new());
    assert_eq!(engine.page().phrases.len(), 1);
    assert_eq!(engine.page().phrases[0].words, words("dog runs"));

    engine.toggle_phrase_mode();
    engine.select(2);
    assert!(engine.mark_known());

    assert!(!engine.store().phrase_exists(&words("dog runs")));
    assert_eq!(engine.page().phrases.len(), 1);
    assert_eq!(engine.page().phrases[0].words, words("dog runs away"));
    assert_eq!(engine.page().phrases[0].end_word_num, 4);
}

#[test]
fn deleting_a_phrase_frees_its_start_for_a_phrase_seen_elsewhere() {
    let mut store = WordStore::new();
    store.add_phrase(PhraseDefinition::new(words("a b c"), WordInfo::new("a b c")));
    store.add_phrase(PhraseDefinition::new(words("a b"), WordInfo::new("a b")));
    let mut engine = engine_with(single_page("a b c. a b d."), store, GlossaryProvider::new());
    let starts: Vec<usize> = engine.page().phrases.iter().map(|p| p.start_word_num).collect();
    assert_eq!(starts, vec![1, 4]);

    engine.toggle_phrase_mode();
    engine.select(1);
    assert!(engine.mark_known());

    let found: Vec<(usize, Vec<String>)> = engine
        .page()
        .phrases
        .iter()
        .map(|p| (p.start_word_num, p.words.clone()))
        .collect();
    assert_eq!(found, vec![(1, words("a b")), (4, words("a b"))]);
    assert_eq!(
        engine.page().phrases,
        build_text_phrases(&engine.page().tokens, engine.store().phrases())
    );
}

#[test]
fn markers_follow_cursor_and_categories() {
    let mut engine = engine(WordStore::new());
    engine.select(2);
    assert_eq!(engine.word_marker(2), Marker::Active);
    assert_eq!(engine.word_marker(1), Marker::Category(WordCategory::Known));
    assert_eq!(engine.word_marker(3), Marker::Category(WordCategory::New));

    engine.toggle_phrase_mode();
    assert_eq!(engine.phrase_selection_cursor(), Some(2));
    assert_eq!(engine.word_marker(2), Marker::Selected);
    engine.advance(true);
    assert_eq!(engine.phrase_selection_cursor(), Some(3));
}

#[test]
fn resume_moves_forward_to_the_next_marked_word() {
    let mut engine = engine(store_with_known(&["cat"]));
    engine.resume(&ResumeMetadata {
        active_word_num: Some(2),
        page_index: None,
        page_size: None,
    });
    assert_eq!(engine.active_word_num(), Some(3));
    // Nothing is promoted by restoring.
    assert_eq!(engine.store().category_of("the"), WordCategory::New);
}

#[test]
fn resume_opens_the_saved_page() {
    let mut engine = engine_with(two_pages(), WordStore::new(), GlossaryProvider::new());
    engine.resume(&ResumeMetadata {
        active_word_num: Some(2),
        page_index: Some(1),
        page_size: Some(10),
    });
    assert_eq!(engine.page_index(), 1);
    assert_eq!(engine.active_form(), Some("cuatro"));
}

#[test]
fn close_commits_and_returns_text_with_position() {
    let persistence = SharedStore::default();
    let translator = Translator::new(Box::new(GlossaryProvider::new()), "english", "en", "de");
    let mut engine = NavigationEngine::new(
        single_page(TEXT),
        WordStore::new(),
        Box::new(persistence.clone()),
        translator,
    );
    engine.select(3);
    engine.look_up();

    let contents = engine.close().unwrap().unwrap();
    assert!(contents.starts_with(TEXT));
    assert!(contents.ends_with("#METADATA active_word_num = 3"));
    assert_eq!(engine.store().category_of("sees"), WordCategory::Learning);

    let reloaded = WordStore::load(&persistence);
    assert_eq!(reloaded.category_of("sees"), WordCategory::Learning);
    assert_eq!(reloaded.category_of("the"), WordCategory::Known);
}

#[test]
fn page_change_saves_the_word_lists() {
    let persistence = SharedStore::default();
    let translator = Translator::new(Box::new(GlossaryProvider::new()), "spanish", "es", "en");
    let mut engine =
        NavigationEngine::new(two_pages(), WordStore::new(), Box::new(persistence.clone()), translator);
    engine.select(2);
    assert!(!persistence.0.contains("known_words"));

    engine.show_next_page();
    assert!(persistence.0.contains("known_words"));
    assert!(engine.open_page(5).is_err());
}

#[test]
fn editing_lemmas_keeps_the_remark() {
    let mut glossary = GlossaryProvider::new();
    glossary.add_entry("sees", dictionary_entry("sees", "perceives with the eyes"));
    let mut engine = engine_with(single_page(TEXT), WordStore::new(), glossary);
    engine.select(3);
    engine.look_up();
    assert!(engine.set_remark("irregular"));

    assert!(engine.update_lemmas("see: look"));
    let info = engine.active_info().unwrap();
    assert_eq!(info.remark.as_deref(), Some("irregular"));
    assert_eq!(info.lemmas, Some(BTreeSet::from(["see".to_string()])));
    assert_eq!(engine.store().personal_translation("see"), Some("look"));
    assert_eq!(engine.lemma_text(), "see: look");
}

#[test]
fn editing_requires_a_lookup() {
    let mut engine = engine(WordStore::new());
    engine.select(3);
    assert!(!engine.set_remark("note"));
    assert!(!engine.set_personal_translation("sieht"));
    assert!(!engine.toggle_machine_translation());
    assert!(!engine.select_example_sentence(1));
}

#[test]
fn personal_translation_is_replaced_and_cleared() {
    let mut engine = engine(WordStore::new());
    engine.select(3);
    engine.look_up();
    engine.set_personal_translation("sieht");
    assert_eq!(engine.personal_translation(), Some("sieht"));
    engine.set_personal_translation("");
    assert_eq!(engine.personal_translation(), None);
}

#[test]
fn machine_translation_toggles_without_touching_dictionary_entries() {
    let mut glossary = GlossaryProvider::new();
    glossary.add_entry("sees", dictionary_entry("sees", "perceives with the eyes"));
    glossary.add_translation("sees", "sieht");
    let mut engine = engine_with(single_page(TEXT), WordStore::new(), glossary);
    engine.select(3);
    engine.look_up();
    assert!(!engine.active_info().unwrap().has_machine_translation());

    engine.toggle_machine_translation();
    let info = engine.active_info().unwrap();
    assert_eq!(info.machine_translation(), Some("sieht"));
    assert_eq!(info.trans.len(), 2);

    engine.toggle_machine_translation();
    let info = engine.active_info().unwrap();
    assert!(!info.has_machine_translation());
    assert_eq!(info.trans.len(), 1);
}

#[test]
fn machine_translation_is_kept_as_personal_translation() {
    let mut glossary = GlossaryProvider::new();
    glossary.add_translation("sees", "sieht");
    let mut engine = engine_with(single_page(TEXT), WordStore::new(), glossary);
    engine.select(3);
    engine.look_up();

    assert!(engine.use_machine_translation());
    assert_eq!(engine.personal_translation(), Some("sieht"));
    assert!(!engine.active_info().unwrap().has_machine_translation());
}

#[test]
fn machine_lemma_definition_adds_the_lemma() {
    let mut glossary = GlossaryProvider::new();
    glossary.add_translation("runs", "run: rennen");
    let mut engine = engine_with(single_page(TEXT), WordStore::new(), glossary);
    engine.select(8);
    engine.look_up();

    assert!(engine.use_machine_translation());
    assert_eq!(engine.store().personal_translation("run"), Some("rennen"));
    let info = engine.active_info().unwrap();
    assert!(info.lemmas.as_ref().unwrap().contains("run"));
    assert!(!info.has_machine_translation());
}

#[test]
fn example_sentences_are_picked_by_number() {
    let mut glossary = GlossaryProvider::new();
    glossary.add_example("sees", "She sees it.", "Sie sieht es.");
    glossary.add_example("sees", "He sees nothing.", "Er sieht nichts.");
    let mut engine = engine_with(single_page(TEXT), WordStore::new(), glossary);
    engine.select(3);
    engine.look_up();
    assert_eq!(
        engine.active_info().unwrap().example(),
        Some(("She sees it.", "Sie sieht es."))
    );

    engine.select_example_sentence(2);
    assert_eq!(
        engine.active_info().unwrap().example(),
        Some(("He sees nothing.", "Er sieht nichts."))
    );

    engine.select_example_sentence(5);
    assert_eq!(engine.active_info().unwrap().example(), Some(("", "")));

    engine.select_example_sentence(9);
    let (sentence, trans) = engine.active_info().unwrap().example().unwrap();
    assert_eq!(sentence.trim(), "The cat sees a dog.");
    assert_eq!(trans, "?");

    engine.select_example_sentence(0);
    assert_eq!(engine.active_info().unwrap().example(), Some(("", "")));
}

#[test]
fn lookup_pronounces_but_sentence_lookup_stays_silent() {
    let speaker = RecordingSpeaker::default();
    let spoken = Rc::clone(&speaker.spoken);
    let mut engine = engine(WordStore::new()).with_speaker(Box::new(speaker), true);
    engine.select(3);
    engine.look_up();
    assert_eq!(*spoken.borrow(), vec!["sees".to_string()]);

    assert!(engine.look_up_current_sentence());
    assert_eq!(spoken.borrow().len(), 1);
    match engine.active_unit() {
        Some(ActiveUnit::Phrase { occurrence, .. }) => {
            assert_eq!(occurrence.words, words("the cat sees a dog"));
        }
        other => panic!("expected the sentence as a phrase, got {other:?}"),
    }
    assert_eq!(engine.store().category_of("sees"), WordCategory::Learning);
}

#[test]
fn lemma_suggestions_exclude_the_active_word() {
    let mut engine = engine(store_with_known(&["cat", "sees"]));
    engine.select(3);
    assert_eq!(engine.lemma_suggestions(), vec!["cat".to_string()]);
}
