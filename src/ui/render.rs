use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{Focus, Model};

use super::style::{style_for_highlight, style_for_inline, style_for_line_type};
use super::{overlays, status};

/// Where each part of the screen goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    /// Editor pane, border included
    pub editor: Rect,
    /// Preview pane, border included
    pub preview: Rect,
    pub toast: Rect,
    pub status: Rect,
}

impl ScreenLayout {
    pub fn editor_inner(&self) -> Rect {
        pane_inner(self.editor)
    }

    pub fn preview_inner(&self) -> Rect {
        pane_inner(self.preview)
    }
}

/// Split the screen into two side-by-side panes over a toast line and a
/// status line. The footer is always reserved so pane sizes do not jump
/// when a toast appears.
pub fn screen_layout(area: Rect) -> ScreenLayout {
    let [body, toast, status] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);
    let [editor, preview] =
        Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(body);
    ScreenLayout {
        editor,
        preview,
        toast,
        status,
    }
}

fn pane_inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        })
}

/// Render the complete UI.
pub fn render(model: &mut Model, frame: &mut Frame) {
    let area = frame.area();
    let layout = screen_layout(area);
    let overlay = model.help_visible || model.reset_prompt_visible;

    render_editor(model, frame, layout.editor, !overlay);
    render_preview(model, frame, layout.preview);
    status::render_toast_bar(model, frame, layout.toast);
    status::render_status_bar(model, frame, layout.status);

    if model.reset_prompt_visible {
        overlays::render_reset_prompt(frame, area);
    } else if model.help_visible {
        overlays::render_help_overlay(model, frame, area);
    }
}

fn render_editor(model: &mut Model, frame: &mut Frame, area: Rect, show_cursor: bool) {
    let focused = model.focus == Focus::Editor;
    let block = pane_block(" HTML ".to_string(), focused);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let gutter_width = model.editor_gutter_width();
    let [gutter_area, text_area] =
        Layout::horizontal([Constraint::Length(gutter_width), Constraint::Min(0)]).areas(inner);

    let start = model.editor_viewport.offset();
    let end = (start + usize::from(inner.height)).min(model.editor.line_count());
    let number_width = usize::from(gutter_width.saturating_sub(1));
    let numbers: Vec<Line> = (start..end)
        .map(|idx| {
            Line::styled(
                format!("{:>number_width$} ", idx + 1),
                Style::default().fg(Color::DarkGray),
            )
        })
        .collect();
    frame.render_widget(Paragraph::new(numbers), gutter_area);

    // Scroll sideways just far enough to keep the cursor column on screen.
    let cursor = model.editor.cursor();
    let cursor_x = model.editor.cursor_display_col();
    let h_scroll = model.editor_h_scroll(text_area.width);

    let content: Vec<Line> = model
        .editor_highlights()
        .iter()
        .skip(start)
        .take(end.saturating_sub(start))
        .map(|spans| {
            Line::from(
                spans
                    .iter()
                    .map(|span| Span::styled(span.text.clone(), style_for_highlight(span.fg)))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    let h_scroll_u16 = u16::try_from(h_scroll).unwrap_or(u16::MAX);
    frame.render_widget(Paragraph::new(content).scroll((0, h_scroll_u16)), text_area);

    if show_cursor && focused && (start..end).contains(&cursor.line) {
        let x = u16::try_from(cursor_x - h_scroll).unwrap_or(0);
        let y = u16::try_from(cursor.line - start).unwrap_or(0);
        frame.set_cursor_position(Position::new(text_area.x + x, text_area.y + y));
    }
}

fn render_preview(model: &Model, frame: &mut Frame, area: Rect) {
    let title = model
        .preview
        .title()
        .map_or_else(|| " Preview ".to_string(), |title| format!(" {title} "));
    let block = pane_block(title, model.focus == Focus::Preview);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let content: Vec<Line> = model
        .preview
        .visible_lines(model.viewport.offset(), usize::from(inner.height))
        .into_iter()
        .map(|line| {
            let line_style = style_for_line_type(line.line_type());
            line.spans().map_or_else(
                || Line::styled(line.content().to_string(), line_style),
                |spans| {
                    Line::from(
                        spans
                            .iter()
                            .map(|span| {
                                Span::styled(
                                    span.text().to_string(),
                                    style_for_inline(line_style, span.style()),
                                )
                            })
                            .collect::<Vec<_>>(),
                    )
                },
            )
        })
        .collect();
    frame.render_widget(Paragraph::new(content), inner);
}

/// Calculate the width needed for line numbers.
pub const fn line_number_width(total_lines: usize) -> u16 {
    let mut width = 1;
    let mut n = total_lines / 10;
    while n > 0 {
        width += 1;
        n /= 10;
    }
    width
}
