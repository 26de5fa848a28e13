use std::io::{Write, stdout};

use base64::Engine;
use tracing::warn;

use crate::app::{App, Message, Model, ToastLevel};
use crate::export::ExportSink;

impl App {
    pub(super) fn handle_message_side_effects(&mut self, model: &mut Model, msg: &Message) {
        match msg {
            Message::Export => export_document(model, &mut self.export_sink),
            Message::CopyDocument => copy_document(model, &mut stdout()),
            _ => {}
        }
    }
}

/// Deliver the rendered text to `sink` and report where it went.
pub(super) fn export_document(model: &mut Model, sink: &mut impl ExportSink) {
    let artifact = model.playground.export();
    match sink.deliver(&artifact) {
        Ok(path) => {
            model.show_toast(ToastLevel::Info, format!("Exported {}", path.display()));
        }
        Err(err) => {
            warn!(%err, "export failed");
            model.show_toast(ToastLevel::Error, format!("Export failed: {err}"));
        }
    }
}

pub(super) fn copy_document(model: &mut Model, out: &mut impl Write) {
    let text = model.playground.rendered_text().to_string();
    if text.is_empty() {
        model.show_toast(ToastLevel::Info, "Nothing to copy");
        return;
    }
    match copy_to_clipboard(&text, out) {
        Ok(()) => {
            let lines = text.lines().count();
            model.show_toast(ToastLevel::Info, format!("Copied {lines} line(s)"));
        }
        Err(err) => model.show_toast(ToastLevel::Error, format!("Copy failed: {err}")),
    }
}

fn copy_to_clipboard(text: &str, out: &mut impl Write) -> std::io::Result<()> {
    #[cfg(target_os = "macos")]
    {
        if copy_to_pbcopy(text).is_ok() {
            return Ok(());
        }
    }
    out.write_all(osc52_sequence(text).as_bytes())?;
    out.flush()
}

#[cfg(target_os = "macos")]
fn copy_to_pbcopy(text: &str) -> std::io::Result<()> {
    use std::process::{Command, Stdio};

    let mut child = Command::new("pbcopy").stdin(Stdio::piped()).spawn()?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(text.as_bytes())?;
    }
    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(std::io::Error::other("pbcopy failed"))
    }
}

fn osc52_sequence(text: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07")
}
