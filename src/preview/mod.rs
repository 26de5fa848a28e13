//! Sandboxed render surface.
//!
//! Turns arbitrary markup into styled terminal lines. Nothing in the markup
//! is executed: script and style bodies are dropped, and control characters
//! (escape sequences included) never reach the terminal. Malformed markup
//! degrades to text; rendering never fails.

mod layout;
mod text;
mod types;

pub use types::{InlineSpan, InlineStyle, LineType, PreviewDocument, RenderedLine};

/// Lay out `markup` for a pane `width` columns wide.
pub fn render(markup: &str, width: u16) -> PreviewDocument {
    layout::Layout::new(usize::from(width)).render(markup)
}
