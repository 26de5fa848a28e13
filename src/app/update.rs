use crate::app::Model;
use crate::app::model::{Focus, ToastLevel};
use crate::editor::Motion;
use crate::playground::{FormatOutcome, FormatStatus, ResetOutcome};

/// All possible events and actions in the application.
///
/// These represent user input, system events, and internal actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Editor
    /// Insert a character at the cursor
    EditorInsertChar(char),
    /// Insert pasted text at the cursor
    EditorInsertText(String),
    /// Break the line at the cursor (Enter)
    EditorNewline,
    /// Delete character before cursor (Backspace)
    EditorDeleteBack,
    /// Delete character at cursor (Delete)
    EditorDeleteForward,
    /// Move the cursor
    EditorMove(Motion),
    /// Move cursor to (line, display column), e.g. from a mouse click
    EditorMoveTo(usize, usize),
    /// Scroll editor viewport up by n lines
    EditorScrollUp(usize),
    /// Scroll editor viewport down by n lines
    EditorScrollDown(usize),

    // Preview
    /// Scroll up by n lines
    ScrollUp(usize),
    /// Scroll down by n lines
    ScrollDown(usize),
    /// Scroll up one page
    PageUp,
    /// Scroll down one page
    PageDown,
    /// Scroll up half page
    HalfPageUp,
    /// Scroll down half page
    HalfPageDown,
    /// Go to beginning of preview
    GoToTop,
    /// Go to end of preview
    GoToBottom,

    // Playground
    /// Pretty-print the document
    Format,
    /// A format request finished
    FormatFinished(FormatOutcome),
    /// Ask for confirmation before resetting
    RequestReset,
    /// Reset to the default document
    ConfirmReset,
    /// Dismiss the reset confirmation
    CancelReset,
    /// Write the rendered text to the export directory
    Export,
    /// Copy the rendered text to the clipboard
    CopyDocument,

    // Panes and overlays
    /// Switch focus between editor and preview
    SwitchFocus,
    /// Focus a specific pane
    SetFocus(Focus),
    /// Toggle help overlay
    ToggleHelp,
    /// Hide help overlay
    HideHelp,
    /// Scroll help overlay up
    HelpScrollUp,
    /// Scroll help overlay down
    HelpScrollDown,

    // Window
    /// Terminal resized
    Resize(u16, u16),
    /// Redraw screen
    Redraw,

    // Application
    /// Quit the application
    Quit,
}

/// Pure function that updates the model based on a message.
///
/// This is the core of TEA - all state transitions happen here.
/// Export and clipboard output happen afterwards, in the side-effect step.
pub fn update(mut model: Model, msg: Message) -> Model {
    match msg {
        // Editor
        Message::EditorInsertChar(ch) => {
            model.editor.insert_char(ch);
            model.commit_edit();
        }
        Message::EditorInsertText(text) => {
            model.editor.insert_str(&text);
            model.commit_edit();
        }
        Message::EditorNewline => {
            model.editor.split_line();
            model.commit_edit();
        }
        Message::EditorDeleteBack => {
            if model.editor.delete_back() {
                model.commit_edit();
            }
        }
        Message::EditorDeleteForward => {
            if model.editor.delete_forward() {
                model.commit_edit();
            }
        }
        Message::EditorMove(motion) => {
            model.editor.apply(motion);
            model.ensure_cursor_visible();
        }
        Message::EditorMoveTo(line, col) => {
            model.focus = Focus::Editor;
            model.editor.move_to_display(line, col);
            model.ensure_cursor_visible();
        }
        Message::EditorScrollUp(n) => model.editor_viewport.scroll_up(n),
        Message::EditorScrollDown(n) => model.editor_viewport.scroll_down(n),

        // Preview
        Message::ScrollUp(n) => model.viewport.scroll_up(n),
        Message::ScrollDown(n) => model.viewport.scroll_down(n),
        Message::PageUp => model.viewport.page_up(),
        Message::PageDown => model.viewport.page_down(),
        Message::HalfPageUp => model.viewport.half_page_up(),
        Message::HalfPageDown => model.viewport.half_page_down(),
        Message::GoToTop => model.viewport.go_to_top(),
        Message::GoToBottom => model.viewport.go_to_bottom(),

        // Playground
        Message::Format => {
            if model.playground.format() == FormatStatus::AlreadyFormatting {
                model.show_toast(ToastLevel::Info, "Already formatting");
            }
        }
        Message::FormatFinished(outcome) => apply_format_outcome(&mut model, outcome),
        Message::RequestReset => {
            model.help_visible = false;
            model.reset_prompt_visible = true;
        }
        Message::ConfirmReset => {
            model.reset_prompt_visible = false;
            if model.playground.reset(|_| true) == ResetOutcome::Reset {
                model.reload_editor();
                model.editor.apply(Motion::BufferStart);
                model.ensure_cursor_visible();
                model.viewport.go_to_top();
                model.show_toast(ToastLevel::Info, "Document reset");
            }
        }
        Message::CancelReset => {
            model.reset_prompt_visible = false;
            model.playground.reset(|_| false);
            model.show_toast(ToastLevel::Info, "Reset cancelled");
        }
        // Export/CopyDocument: handled in effects
        // Redraw: no state change needed
        Message::Export | Message::CopyDocument | Message::Redraw => {}

        // Panes and overlays
        Message::SwitchFocus => {
            model.focus = match model.focus {
                Focus::Editor => Focus::Preview,
                Focus::Preview => Focus::Editor,
            };
        }
        Message::SetFocus(focus) => model.focus = focus,
        Message::ToggleHelp => {
            model.help_visible = !model.help_visible;
            model.help_scroll_offset = 0;
        }
        Message::HideHelp => model.help_visible = false,
        Message::HelpScrollUp => {
            model.help_scroll_offset = model.help_scroll_offset.saturating_sub(1);
        }
        Message::HelpScrollDown => {
            model.help_scroll_offset = model.help_scroll_offset.saturating_add(1);
        }

        // Window
        Message::Resize(width, height) => model.resize(width, height),

        // Application
        Message::Quit => model.should_quit = true,
    }
    model.surface_notice();
    model
}

fn apply_format_outcome(model: &mut Model, outcome: FormatOutcome) {
    match outcome {
        FormatOutcome::Applied { changed: true } => {
            model.reload_editor();
            model.show_toast(ToastLevel::Info, "Formatted");
        }
        FormatOutcome::Applied { changed: false } => {
            model.show_toast(ToastLevel::Info, "Already formatted");
        }
        FormatOutcome::Rejected(err) => {
            model.show_toast(ToastLevel::Info, format!("Not formatted: {err}"));
        }
        // A newer edit already won; nothing to tell the user.
        FormatOutcome::StaleResultDiscarded => {}
        FormatOutcome::TimedOut => {
            model.show_toast(ToastLevel::Warning, "Formatter timed out");
        }
    }
}
