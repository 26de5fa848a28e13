use super::*;
use crate::app::{Message, Model, update};
use crate::formatter::{FormatBackend, HtmlFormatter, InlineBackend};
use crate::playground::{Playground, PlaygroundSettings, RESET_PROMPT};
use crate::store::{KeyValueStore, MemoryStore};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

fn create_test_terminal() -> Terminal<TestBackend> {
    let backend = TestBackend::new(80, 24);
    Terminal::new(backend).unwrap()
}

fn create_test_model(document: &str) -> Model {
    let settings = PlaygroundSettings {
        default_document: document.to_string(),
        auto_format: false,
        ..PlaygroundSettings::default()
    };
    let playground = Playground::initialize(
        Box::new(MemoryStore::new()) as Box<dyn KeyValueStore>,
        Box::new(InlineBackend::new(HtmlFormatter)) as Box<dyn FormatBackend>,
        settings,
    );
    Model::new(playground, (80, 24))
}

fn draw(model: &mut Model) -> Terminal<TestBackend> {
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(model, frame)).unwrap();
    terminal
}

fn row_text(terminal: &Terminal<TestBackend>, y: u16) -> String {
    let buffer = terminal.backend().buffer();
    (0..buffer.area.width)
        .map(|x| buffer[(x, y)].symbol())
        .collect()
}

fn screen_text(terminal: &Terminal<TestBackend>) -> String {
    let height = terminal.backend().buffer().area.height;
    (0..height)
        .map(|y| row_text(terminal, y))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_layout_splits_panes_above_footer() {
    let layout = screen_layout(Rect::new(0, 0, 80, 24));
    assert_eq!(layout.editor, Rect::new(0, 0, 40, 22));
    assert_eq!(layout.preview, Rect::new(40, 0, 40, 22));
    assert_eq!(layout.toast, Rect::new(0, 22, 80, 1));
    assert_eq!(layout.status, Rect::new(0, 23, 80, 1));
    assert_eq!(layout.preview_inner(), Rect::new(41, 1, 38, 20));
}

#[test]
fn test_line_number_width() {
    assert_eq!(line_number_width(0), 1);
    assert_eq!(line_number_width(9), 1);
    assert_eq!(line_number_width(10), 2);
    assert_eq!(line_number_width(1234), 4);
}

#[test]
fn test_editor_shows_source_with_line_numbers() {
    let mut model = create_test_model("<p>one</p>\n<p>two</p>");
    let terminal = draw(&mut model);
    let first = row_text(&terminal, 1);
    let second = row_text(&terminal, 2);
    assert!(first.starts_with("│1 <p>one</p>"), "{first:?}");
    assert!(second.starts_with("│2 <p>two</p>"), "{second:?}");
}

#[test]
fn test_preview_shows_rendered_text_not_markup() {
    let mut model = create_test_model("<h1>Hello</h1><p>World</p>");
    let terminal = draw(&mut model);
    let preview: String = (1..21)
        .map(|y| row_text(&terminal, y).chars().skip(41).take(38).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n");
    assert!(preview.contains("Hello"));
    assert!(preview.contains("World"));
    assert!(!preview.contains("<h1>"));
}

#[test]
fn test_preview_title_comes_from_document() {
    let mut model =
        create_test_model("<html><head><title>Demo</title></head><body>x</body></html>");
    let terminal = draw(&mut model);
    assert!(row_text(&terminal, 0).contains(" Demo "));
}

#[test]
fn test_status_bar_shows_state_and_store() {
    let mut model = create_test_model("<p>x</p>");
    let terminal = draw(&mut model);
    let status = row_text(&terminal, 23);
    assert!(status.contains("htmlpen"), "{status:?}");
    assert!(status.contains("Idle"));
    assert!(status.contains("store: memory"));
    assert!(status.contains("Ln 1, Col 1"));
}

#[test]
fn test_toast_bar_shows_latest_message() {
    let model = create_test_model("<div>oops");
    let mut model = update(model, Message::Format);
    for outcome in model.playground.poll() {
        model = update(model, Message::FormatFinished(outcome));
    }
    let terminal = draw(&mut model);
    let toast = row_text(&terminal, 22);
    assert!(toast.starts_with("[info] Not formatted:"), "{toast:?}");
}

#[test]
fn test_reset_prompt_overlays_screen() {
    let mut model = update(create_test_model("<p>x</p>"), Message::RequestReset);
    let terminal = draw(&mut model);
    let screen = screen_text(&terminal);
    assert!(screen.contains("Reset"));
    assert!(screen.contains("Reset the document"));
    assert!(screen.contains("any other key: cancel"));
    assert!(RESET_PROMPT.starts_with("Reset the document"));
}

#[test]
fn test_help_overlay_lists_bindings() {
    let mut model = update(create_test_model(""), Message::ToggleHelp);
    let terminal = draw(&mut model);
    let screen = screen_text(&terminal);
    assert!(screen.contains("Help"));
    assert!(screen.contains("Ctrl-f"));
    assert!(screen.contains("j/k scroll"));
}

#[test]
fn test_help_overlay_scrolls() {
    let model = update(create_test_model(""), Message::ToggleHelp);
    let mut model = update(model, Message::HelpScrollDown);
    let terminal = draw(&mut model);
    let screen = screen_text(&terminal);
    assert!(screen.contains("Ctrl-f"));
    assert!(!screen.contains("Document"));
}

#[test]
fn test_cursor_is_placed_in_focused_editor() {
    let mut model = create_test_model("<p>x</p>");
    let mut terminal = create_test_terminal();
    terminal.draw(|frame| render(&mut model, frame)).unwrap();
    let position = terminal.get_cursor_position().unwrap();
    // border + "1 " gutter
    assert_eq!((position.x, position.y), (3, 1));
}

#[test]
fn test_long_line_scrolls_horizontally_to_cursor() {
    let long = format!("<p>{}</p>", "x".repeat(100));
    let model = create_test_model(&long);
    let mut model = update(model, Message::EditorMove(crate::editor::Motion::LineEnd));
    let terminal = draw(&mut model);
    let first = row_text(&terminal, 1);
    assert!(first.contains("</p>"), "{first:?}");
}
