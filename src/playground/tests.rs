use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use proptest::prelude::*;

use super::*;
use crate::formatter::{Formatter, HtmlFormatter, InlineBackend};
use crate::store::MemoryStore;

fn canonical(text: &str) -> String {
    HtmlFormatter
        .format(text, &FormatOptions::default())
        .unwrap()
}

fn inline_playground(store: MemoryStore) -> Playground<MemoryStore, InlineBackend<HtmlFormatter>> {
    Playground::initialize(
        store,
        InlineBackend::new(HtmlFormatter),
        PlaygroundSettings::default(),
    )
}

fn manual_settings() -> PlaygroundSettings {
    PlaygroundSettings {
        auto_format: false,
        ..PlaygroundSettings::default()
    }
}

/// Holds requests until the test releases them.
#[derive(Clone, Default)]
struct DelayedBackend {
    inner: Rc<RefCell<Delayed>>,
}

#[derive(Default)]
struct Delayed {
    held: Vec<FormatRequest>,
    ready: VecDeque<FormatResponse>,
}

impl DelayedBackend {
    fn held(&self) -> usize {
        self.inner.borrow().held.len()
    }

    fn release_all(&self) {
        let mut delayed = self.inner.borrow_mut();
        let held = std::mem::take(&mut delayed.held);
        for request in held {
            let result = HtmlFormatter.format(&request.input, &request.options);
            delayed.ready.push_back(FormatResponse {
                ticket: request.ticket,
                result,
            });
        }
    }
}

impl FormatBackend for DelayedBackend {
    fn submit(&mut self, request: FormatRequest) {
        self.inner.borrow_mut().held.push(request);
    }

    fn try_recv(&mut self) -> Option<FormatResponse> {
        self.inner.borrow_mut().ready.pop_front()
    }
}

/// A store that can never be reached.
struct BrokenStore {
    readable: bool,
}

impl KeyValueStore for BrokenStore {
    fn get(&self, _key: &str) -> Result<Option<String>, PersistenceError> {
        if self.readable {
            Ok(None)
        } else {
            Err(PersistenceError::Unavailable("read denied".to_string()))
        }
    }

    fn set(&mut self, _key: &str, _value: &str) -> Result<(), PersistenceError> {
        Err(PersistenceError::Unavailable("quota exceeded".to_string()))
    }

    fn describe(&self) -> String {
        "broken".to_string()
    }
}

#[test]
fn test_default_document_is_already_canonical() {
    assert_eq!(canonical(DEFAULT_DOCUMENT), DEFAULT_DOCUMENT);
}

#[test]
fn test_unclosed_then_closed_div() {
    let mut playground = inline_playground(MemoryStore::new());
    assert_eq!(playground.raw_text(), canonical(DEFAULT_DOCUMENT));
    assert_eq!(playground.state(), PlaygroundState::Idle);

    playground.edit("<div>hi");
    assert!(matches!(playground.format(), FormatStatus::Submitted(_)));
    let outcomes = playground.poll();
    assert!(matches!(outcomes.as_slice(), [FormatOutcome::Rejected(_)]));
    assert_eq!(playground.raw_text(), "<div>hi");
    assert_eq!(playground.rendered_text(), "<div>hi");

    playground.edit("<div>hi</div>");
    playground.format();
    assert_eq!(
        playground.poll(),
        vec![FormatOutcome::Applied { changed: true }]
    );
    assert_eq!(playground.raw_text(), "<div>hi</div>\n");
    assert_eq!(playground.rendered_text(), "<div>hi</div>\n");
    assert_eq!(playground.state(), PlaygroundState::Idle);
}

#[test]
fn test_edit_wins_over_delayed_format() {
    let backend = DelayedBackend::default();
    let mut playground =
        Playground::initialize(MemoryStore::new(), backend.clone(), manual_settings());

    playground.edit("A");
    playground.format();
    assert_eq!(playground.state(), PlaygroundState::Formatting);
    playground.edit("B");
    backend.release_all();

    assert_eq!(
        playground.poll(),
        vec![FormatOutcome::StaleResultDiscarded]
    );
    assert_eq!(playground.raw_text(), "B");
    assert_eq!(playground.rendered_text(), "B");
    assert_eq!(playground.state(), PlaygroundState::Idle);
}

#[test]
fn test_newer_format_supersedes_older_request() {
    let backend = DelayedBackend::default();
    let mut playground =
        Playground::initialize(MemoryStore::new(), backend.clone(), manual_settings());

    playground.edit("A");
    playground.format();
    playground.edit("B");
    assert!(matches!(playground.format(), FormatStatus::Submitted(_)));
    assert_eq!(backend.held(), 2);
    backend.release_all();

    assert_eq!(
        playground.poll(),
        vec![
            FormatOutcome::StaleResultDiscarded,
            FormatOutcome::Applied { changed: true },
        ]
    );
    assert_eq!(playground.raw_text(), "B\n");
}

#[test]
fn test_format_of_same_text_is_not_resubmitted() {
    let backend = DelayedBackend::default();
    let mut playground =
        Playground::initialize(MemoryStore::new(), backend.clone(), manual_settings());

    playground.edit("<p>x</p>");
    assert!(matches!(playground.format(), FormatStatus::Submitted(_)));
    assert_eq!(playground.format(), FormatStatus::AlreadyFormatting);
    assert_eq!(backend.held(), 1);
}

#[test]
fn test_reset_requires_confirmation() {
    let mut playground = inline_playground(MemoryStore::new());
    playground.edit("<p>mine</p>");
    let revision = playground.revision();

    let mut asked = String::new();
    let outcome = playground.reset(|prompt| {
        asked = prompt.to_string();
        false
    });
    assert_eq!(outcome, ResetOutcome::Cancelled);
    assert_eq!(asked, RESET_PROMPT);
    assert_eq!(playground.raw_text(), "<p>mine</p>");
    assert_eq!(playground.revision(), revision);

    assert_eq!(playground.reset(|_| true), ResetOutcome::Reset);
    playground.poll();
    assert_eq!(playground.raw_text(), canonical(DEFAULT_DOCUMENT));
    assert_eq!(
        playground
            .store()
            .get(DEFAULT_STORAGE_KEY)
            .unwrap()
            .as_deref(),
        Some(canonical(DEFAULT_DOCUMENT).as_str())
    );
}

#[test]
fn test_reload_formats_stored_text() {
    let mut playground = inline_playground(MemoryStore::new());
    playground.edit("<p>x</p>");
    let store = playground.store().clone();

    let reloaded = inline_playground(store);
    assert_eq!(reloaded.raw_text(), canonical("<p>x</p>"));
}

#[test]
fn test_reload_keeps_unparseable_text_verbatim() {
    let mut playground = inline_playground(MemoryStore::new());
    playground.edit("<p>x");
    let store = playground.store().clone();

    let reloaded = inline_playground(store);
    assert_eq!(reloaded.raw_text(), "<p>x");
}

#[test]
fn test_without_auto_format_loaded_text_is_shown_raw() {
    let store = MemoryStore::with_entry(DEFAULT_STORAGE_KEY, "<p>x</p>");
    let playground =
        Playground::initialize(store, InlineBackend::new(HtmlFormatter), manual_settings());
    assert_eq!(playground.raw_text(), "<p>x</p>");
}

#[test]
fn test_custom_storage_key() {
    let settings = PlaygroundSettings {
        storage_key: "scratch".to_string(),
        ..PlaygroundSettings::default()
    };
    let mut playground =
        Playground::initialize(MemoryStore::new(), InlineBackend::new(HtmlFormatter), settings);
    playground.edit("<b>x</b>");
    assert_eq!(
        playground.store().get("scratch").unwrap().as_deref(),
        Some("<b>x</b>")
    );
    assert_eq!(playground.store().get(DEFAULT_STORAGE_KEY).unwrap(), None);
}

#[test]
fn test_export_matches_rendered_text() {
    let mut playground = inline_playground(MemoryStore::new());
    playground.edit("X");
    let artifact = playground.export();
    assert_eq!(
        String::from_utf8(artifact.bytes).unwrap(),
        playground.rendered_text()
    );
    assert_eq!(artifact.mime, "text/html");
    assert!(artifact.filename.starts_with("htmlpen-"));
    assert!(artifact.filename.ends_with(".html"));
    assert_eq!(playground.raw_text(), "X");
}

#[test]
fn test_persistence_warning_fires_once() {
    let mut playground = Playground::initialize(
        BrokenStore { readable: true },
        InlineBackend::new(HtmlFormatter),
        PlaygroundSettings::default(),
    );
    assert!(!playground.is_persistent());
    let notice = playground.take_notice();
    assert!(matches!(notice, Some(Notice::PersistenceUnavailable(ref reason)) if reason.contains("quota")));

    playground.edit("<p>a</p>");
    playground.edit("<p>b</p>");
    assert_eq!(playground.take_notice(), None);
    assert_eq!(playground.raw_text(), "<p>b</p>");
}

#[test]
fn test_unreadable_store_falls_back_to_default() {
    let mut playground = Playground::initialize(
        BrokenStore { readable: false },
        InlineBackend::new(HtmlFormatter),
        PlaygroundSettings::default(),
    );
    assert_eq!(playground.raw_text(), canonical(DEFAULT_DOCUMENT));
    assert!(matches!(
        playground.take_notice(),
        Some(Notice::PersistenceUnavailable(ref reason)) if reason.contains("read denied")
    ));
}

#[test]
fn test_slow_format_times_out() {
    let backend = DelayedBackend::default();
    let settings = PlaygroundSettings {
        format_timeout: Some(Duration::from_millis(10)),
        ..manual_settings()
    };
    let mut playground = Playground::initialize(MemoryStore::new(), backend.clone(), settings);
    playground.edit("<i>x</i>");
    playground.format();

    assert!(playground.poll_at(Instant::now()).is_empty());
    let later = Instant::now() + Duration::from_secs(1);
    assert_eq!(playground.poll_at(later), vec![FormatOutcome::TimedOut]);
    assert_eq!(playground.state(), PlaygroundState::Idle);

    backend.release_all();
    assert_eq!(
        playground.poll(),
        vec![FormatOutcome::StaleResultDiscarded]
    );
    assert_eq!(playground.raw_text(), "<i>x</i>");
}

#[test]
fn test_formatting_canonical_text_does_not_bump_revision() {
    let mut playground = inline_playground(MemoryStore::new());
    let revision = playground.revision();
    playground.format();
    assert_eq!(
        playground.poll(),
        vec![FormatOutcome::Applied { changed: false }]
    );
    assert_eq!(playground.revision(), revision);
}

proptest! {
    #[test]
    fn prop_rejected_format_leaves_buffer_untouched(tail in "[a-z <>/=\"']{0,40}") {
        let text = format!("<div>{tail}");
        let mut playground = inline_playground(MemoryStore::new());
        playground.edit(text.clone());
        playground.format();
        let outcomes = playground.poll();
        if matches!(outcomes.as_slice(), [FormatOutcome::Rejected(_)]) {
            prop_assert_eq!(playground.raw_text(), text.as_str());
            prop_assert_eq!(playground.rendered_text(), text.as_str());
        }
    }

    #[test]
    fn prop_edit_during_format_always_wins(first in "[a-z<>/ ]{0,20}", second in "[a-z<>/ ]{0,20}") {
        prop_assume!(first != second);
        let backend = DelayedBackend::default();
        let mut playground =
            Playground::initialize(MemoryStore::new(), backend.clone(), manual_settings());
        playground.edit(first);
        playground.format();
        playground.edit(second.clone());
        backend.release_all();
        playground.poll();
        prop_assert_eq!(playground.raw_text(), second.as_str());
    }
}
