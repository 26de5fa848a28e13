//! Pretty-printing capability.
//!
//! The playground never formats by itself; it hands a [`FormatRequest`] to a
//! [`FormatBackend`], which runs a [`Formatter`] either inline or on a worker
//! thread and hands back a [`FormatResponse`].

mod backend;
mod printer;
mod tree;

pub use backend::{FormatBackend, FormatRequest, FormatResponse, FormatWorker, InlineBackend};

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::markup;

/// Layout knobs for the pretty-printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatOptions {
    /// Spaces per nesting level.
    pub indent_width: usize,
    /// Preferred maximum display width of a line. Unbreakable content
    /// (a long word, a verbatim body) may exceed it.
    pub max_line_width: usize,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_width: 2,
            max_line_width: 80,
        }
    }
}

/// Turns markup text into its canonical form.
///
/// Implementations must not keep state between calls: the same input and
/// options always produce the same result.
pub trait Formatter: Send {
    /// Format `text`.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when `text` is not markup the formatter can
    /// reproduce faithfully.
    fn format(&self, text: &str, options: &FormatOptions) -> Result<String, ParseError>;
}

/// The built-in HTML pretty-printer.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFormatter;

impl Formatter for HtmlFormatter {
    fn format(&self, text: &str, options: &FormatOptions) -> Result<String, ParseError> {
        let tokens = markup::tokenize(text)?;
        let nodes = tree::build(text, tokens)?;
        Ok(printer::print(&nodes, options))
    }
}

impl<F> Formatter for F
where
    F: Fn(&str, &FormatOptions) -> Result<String, ParseError> + Send,
{
    fn format(&self, text: &str, options: &FormatOptions) -> Result<String, ParseError> {
        self(text, options)
    }
}
