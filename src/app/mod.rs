//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{Focus, Model, SessionPlayground, ToastLevel};
pub use update::{Message, update};

use std::path::PathBuf;

use crate::export::DirectorySink;

/// Main application struct that owns the terminal and runs the event loop.
pub struct App {
    playground: Option<SessionPlayground>,
    export_sink: DirectorySink,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create a new application around an initialized playground.
    pub fn new(playground: SessionPlayground) -> Self {
        Self {
            playground: Some(playground),
            export_sink: DirectorySink::new("."),
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Directory that exports are written to.
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_sink = DirectorySink::new(dir);
        self
    }

    /// Set config paths to show in help.
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}
