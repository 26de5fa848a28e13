use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, ToastLevel};

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let state = if model.is_formatting() {
        "Formatting\u{2026}"
    } else {
        "Idle"
    };
    let storage = if model.playground.is_persistent() {
        format!("store: {}", model.playground.store().describe())
    } else {
        "memory only".to_string()
    };
    let cursor = model.editor.cursor();
    let status = format!(
        " htmlpen  {state}  {storage}  Ln {}, Col {}  [{}%]  F1:help",
        cursor.line + 1,
        cursor.col + 1,
        model.viewport.scroll_percent(),
    );

    let status_bar =
        Paragraph::new(status).style(Style::default().bg(Color::DarkGray).fg(Color::White));

    frame.render_widget(status_bar, area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => (
            "[info]",
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
