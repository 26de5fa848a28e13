use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::Frame;
use ratatui::layout::Rect;

use crate::app::{App, Focus, Message, Model};
use crate::editor::Motion;

use super::event_loop::ResizeDebouncer;

/// Lines moved per mouse wheel notch.
const WHEEL_LINES: usize = 3;

impl App {
    pub(super) fn handle_event(
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::handle_key(*key, model),
            Event::Mouse(mouse) => Self::handle_mouse(*mouse, model),
            Event::Paste(text) if !model.help_visible && !model.reset_prompt_visible => {
                Some(Message::EditorInsertText(text.clone()))
            }
            Event::Resize(w, h) => {
                resize_debouncer.queue(*w, *h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        if model.reset_prompt_visible {
            return match key.code {
                KeyCode::Char('y' | 'Y') if !ctrl => Some(Message::ConfirmReset),
                _ => Some(Message::CancelReset),
            };
        }

        if model.help_visible {
            return match key.code {
                KeyCode::Char('j') | KeyCode::Down => Some(Message::HelpScrollDown),
                KeyCode::Char('k') | KeyCode::Up => Some(Message::HelpScrollUp),
                _ => Some(Message::HideHelp),
            };
        }

        // Global bindings work in either pane.
        match key.code {
            KeyCode::Char('q' | 'c') if ctrl => return Some(Message::Quit),
            KeyCode::Char('f') if ctrl => return Some(Message::Format),
            KeyCode::Char('r') if ctrl => return Some(Message::RequestReset),
            KeyCode::Char('e') if ctrl => return Some(Message::Export),
            KeyCode::Char('y') if ctrl => return Some(Message::CopyDocument),
            KeyCode::F(1) => return Some(Message::ToggleHelp),
            KeyCode::Tab | KeyCode::BackTab => return Some(Message::SwitchFocus),
            _ => {}
        }

        match model.focus {
            Focus::Editor => Self::handle_editor_key(key, model),
            Focus::Preview => Self::handle_preview_key(key, model),
        }
    }

    fn handle_editor_key(key: KeyEvent, model: &Model) -> Option<Message> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let page = usize::from(model.editor_viewport.height().max(1));
        let motion = match key.code {
            KeyCode::Left if ctrl => Motion::WordLeft,
            KeyCode::Right if ctrl => Motion::WordRight,
            KeyCode::Home if ctrl => Motion::BufferStart,
            KeyCode::End if ctrl => Motion::BufferEnd,
            KeyCode::Left => Motion::Left,
            KeyCode::Right => Motion::Right,
            KeyCode::Up => Motion::Up,
            KeyCode::Down => Motion::Down,
            KeyCode::Home => Motion::LineStart,
            KeyCode::End => Motion::LineEnd,
            KeyCode::PageUp => Motion::PageUp(page),
            KeyCode::PageDown => Motion::PageDown(page),
            KeyCode::Enter => return Some(Message::EditorNewline),
            KeyCode::Backspace => return Some(Message::EditorDeleteBack),
            KeyCode::Delete => return Some(Message::EditorDeleteForward),
            KeyCode::Char(c) if !ctrl && !key.modifiers.contains(KeyModifiers::ALT) => {
                return Some(Message::EditorInsertChar(c));
            }
            _ => return None,
        };
        Some(Message::EditorMove(motion))
    }

    fn handle_preview_key(key: KeyEvent, model: &Model) -> Option<Message> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let vp = &model.viewport;
        match key.code {
            KeyCode::Char('j') | KeyCode::Down if vp.can_scroll_down() => {
                Some(Message::ScrollDown(1))
            }
            KeyCode::Char('k') | KeyCode::Up if vp.can_scroll_up() => Some(Message::ScrollUp(1)),
            KeyCode::Char('d') if ctrl && vp.can_scroll_down() => Some(Message::HalfPageDown),
            KeyCode::Char('u') if ctrl && vp.can_scroll_up() => Some(Message::HalfPageUp),
            KeyCode::Char(' ') | KeyCode::PageDown if vp.can_scroll_down() => {
                Some(Message::PageDown)
            }
            KeyCode::Char('b') | KeyCode::PageUp if vp.can_scroll_up() => Some(Message::PageUp),
            KeyCode::Char('g') | KeyCode::Home => Some(Message::GoToTop),
            KeyCode::Char('G') | KeyCode::End => Some(Message::GoToBottom),
            KeyCode::Char('?') => Some(Message::ToggleHelp),
            KeyCode::Esc | KeyCode::Char('i') => Some(Message::SetFocus(Focus::Editor)),
            _ => None,
        }
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
        if model.help_visible || model.reset_prompt_visible {
            return None;
        }

        let layout = model.layout();
        let editor = layout.editor_inner();
        let in_editor = point_in_rect(mouse.column, mouse.row, editor);
        let in_preview = point_in_rect(mouse.column, mouse.row, layout.preview);

        match mouse.kind {
            MouseEventKind::ScrollDown if in_editor => model
                .editor_viewport
                .can_scroll_down()
                .then_some(Message::EditorScrollDown(WHEEL_LINES)),
            MouseEventKind::ScrollUp if in_editor => model
                .editor_viewport
                .can_scroll_up()
                .then_some(Message::EditorScrollUp(WHEEL_LINES)),
            MouseEventKind::ScrollDown if in_preview => model
                .viewport
                .can_scroll_down()
                .then_some(Message::ScrollDown(WHEEL_LINES)),
            MouseEventKind::ScrollUp if in_preview => model
                .viewport
                .can_scroll_up()
                .then_some(Message::ScrollUp(WHEEL_LINES)),
            MouseEventKind::Down(MouseButton::Left) if in_editor => {
                let line = model.editor_viewport.offset() + usize::from(mouse.row - editor.y);
                let gutter = model.editor_gutter_width();
                let text_x = editor.x + gutter;
                let h_scroll = model.editor_h_scroll(editor.width.saturating_sub(gutter));
                let col = usize::from(mouse.column.saturating_sub(text_x)) + h_scroll;
                Some(Message::EditorMoveTo(line, col))
            }
            MouseEventKind::Down(MouseButton::Left) if in_preview => {
                (model.focus != Focus::Preview).then_some(Message::SetFocus(Focus::Preview))
            }
            _ => None,
        }
    }

    pub(super) fn view(model: &mut Model, frame: &mut Frame) {
        crate::ui::render(model, frame);
    }
}

const fn point_in_rect(col: u16, row: u16, rect: Rect) -> bool {
    col >= rect.x
        && col < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}
