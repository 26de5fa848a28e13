//! Rope-backed text buffer for the editor pane.
//!
//! The buffer owns only the text and the cursor. Changes reach the
//! playground through the app's update loop, which compares
//! [`EditorBuffer::version`] against what it last committed.

mod buffer;

pub use buffer::{Cursor, EditorBuffer, Motion};
