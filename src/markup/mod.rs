//! Markup tokenization shared by the formatter and the preview.
//!
//! The formatter uses the strict [`tokenize`] and refuses anything it cannot
//! reproduce faithfully; the preview uses [`tokenize_lenient`], which never
//! fails and turns broken constructs into text.

pub mod elements;
mod lexer;

pub use lexer::{Attribute, Token, tokenize, tokenize_lenient};
