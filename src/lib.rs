// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. store::FileStore)
    clippy::module_name_repetitions
)]

//! # htmlpen
//!
//! An HTML playground for the terminal.
//!
//! htmlpen keeps one HTML document and lets you:
//! - Edit it with syntax highlighting, saved on every keystroke
//! - Pretty-print it on demand without ever blocking the editor
//! - Preview it as styled text next to the source
//! - Reset it to an example, export it as an `.html` file, or copy it
//!
//! ## Architecture
//!
//! The document lives in a [`playground::Playground`], which owns the
//! buffer and talks to a key-value store and a formatter backend. The
//! terminal host uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`playground`]: The document buffer and its operations
//! - [`formatter`]: Pretty-printing, inline or on a worker thread
//! - [`markup`]: Tokenizer shared by the formatter and the preview
//! - [`preview`]: Markup to styled terminal lines
//! - [`store`]: Key-value persistence
//! - [`export`]: Export artifacts and where they go
//! - [`app`]: Main application loop and state
//! - [`editor`]: Text buffer behind the editor pane
//! - [`ui`]: Terminal UI components
//! - [`highlight`]: Syntax highlighting

pub mod app;
pub mod config;
pub mod editor;
pub mod error;
pub mod export;
pub mod formatter;
pub mod highlight;
pub mod markup;
pub mod playground;
pub mod preview;
pub mod store;
pub mod ui;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::playground::Playground;
    pub use crate::ui::viewport::Viewport;
}
