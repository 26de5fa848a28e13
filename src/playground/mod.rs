//! The markup playground: one document buffer and the operations on it.
//!
//! Formatting is asynchronous. [`Playground::format`] snapshots the raw text
//! into a ticketed [`FormatRequest`]; when the response comes back through
//! [`Playground::poll`] it is applied only if its ticket is still the pending
//! one and the raw text is still exactly the snapshot. Anything else is a
//! stale result and is dropped. Edits are never blocked by a pending format.
//!
//! No operation returns an error. Parse failures leave the buffer untouched,
//! and persistence failures drop the session to memory-only mode with a
//! single [`Notice`].

mod buffer;

pub use buffer::DocumentBuffer;

use std::fmt;
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{debug, info, warn};

use crate::error::{ParseError, PersistenceError};
use crate::export::ExportArtifact;
use crate::formatter::{FormatBackend, FormatOptions, FormatRequest, FormatResponse};
use crate::store::KeyValueStore;

pub const DEFAULT_STORAGE_KEY: &str = "html-code";

pub const RESET_PROMPT: &str = "Reset the document to the default example? Your changes will be lost.";

/// The document a fresh playground starts with.
pub const DEFAULT_DOCUMENT: &str = r"<!DOCTYPE html>
<html>
  <head>
    <title>htmlpen</title>
    <style>h1 { color: teal; }</style>
  </head>
  <body>
    <h1>Hello, htmlpen!</h1>
    <p>Type markup on the left; the preview on the right follows along.</p>
    <ul>
      <li><b>Ctrl-F</b> formats the document</li>
      <li><b>Ctrl-E</b> exports it as a file</li>
      <li><b>Ctrl-R</b> resets to this example</li>
    </ul>
  </body>
</html>
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaygroundState {
    #[default]
    Idle,
    Formatting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatStatus {
    Submitted(u64),
    /// A request for exactly the current text is already in flight.
    AlreadyFormatting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    Applied { changed: bool },
    Rejected(ParseError),
    StaleResultDiscarded,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    Cancelled,
    Reset,
}

/// Something the host should tell the user once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    PersistenceUnavailable(String),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PersistenceUnavailable(reason) => write!(
                f,
                "Storage unavailable, changes will not be saved ({reason})"
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaygroundSettings {
    pub storage_key: String,
    pub default_document: String,
    pub options: FormatOptions,
    /// Format the loaded document once at startup.
    pub auto_format: bool,
    /// A pending format older than this completes as [`FormatOutcome::TimedOut`].
    pub format_timeout: Option<Duration>,
}

impl Default for PlaygroundSettings {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            default_document: DEFAULT_DOCUMENT.to_string(),
            options: FormatOptions::default(),
            auto_format: true,
            format_timeout: None,
        }
    }
}

#[derive(Debug)]
struct Pending {
    ticket: u64,
    input: String,
    issued: Instant,
}

pub struct Playground<S, B> {
    buffer: DocumentBuffer,
    state: PlaygroundState,
    store: S,
    backend: B,
    settings: PlaygroundSettings,
    pending: Option<Pending>,
    next_ticket: u64,
    persistent: bool,
    notice: Option<Notice>,
}

impl<S: KeyValueStore, B: FormatBackend> Playground<S, B> {
    /// Load the stored document (or the default), persist it, and format it
    /// once if `auto_format` is set.
    pub fn initialize(store: S, backend: B, settings: PlaygroundSettings) -> Self {
        let mut playground = Self::detached(store, backend, settings);

        let text = match playground.store.get(&playground.settings.storage_key) {
            Ok(Some(text)) => {
                debug!(bytes = text.len(), "loaded stored document");
                text
            }
            Ok(None) => playground.settings.default_document.clone(),
            Err(err) => {
                playground.persistence_failed(&err);
                playground.settings.default_document.clone()
            }
        };
        playground.buffer = DocumentBuffer::new(text);
        playground.persist();

        if playground.settings.auto_format {
            playground.format();
            playground.poll();
        }
        playground
    }

    /// An empty, idle playground. Nothing is read from or written to the
    /// store until the first edit.
    pub(crate) fn detached(store: S, backend: B, settings: PlaygroundSettings) -> Self {
        Self {
            buffer: DocumentBuffer::default(),
            state: PlaygroundState::Idle,
            store,
            backend,
            settings,
            pending: None,
            next_ticket: 1,
            persistent: true,
            notice: None,
        }
    }

    pub fn raw_text(&self) -> &str {
        self.buffer.raw_text()
    }

    pub fn rendered_text(&self) -> &str {
        self.buffer.rendered_text()
    }

    pub const fn revision(&self) -> u64 {
        self.buffer.revision()
    }

    pub const fn state(&self) -> PlaygroundState {
        self.state
    }

    /// Whether writes still reach the store.
    pub const fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub const fn settings(&self) -> &PlaygroundSettings {
        &self.settings
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Replace the document with `text`. Never blocked by a pending format.
    pub fn edit(&mut self, text: impl Into<String>) {
        self.buffer.replace(text.into());
        self.persist();
    }

    /// Ask the backend to format the current raw text.
    pub fn format(&mut self) -> FormatStatus {
        if let Some(pending) = &self.pending {
            if pending.input == self.buffer.raw_text() {
                return FormatStatus::AlreadyFormatting;
            }
            debug!(ticket = pending.ticket, "superseding format request");
        }

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        let input = self.buffer.raw_text().to_string();
        self.pending = Some(Pending {
            ticket,
            input: input.clone(),
            issued: Instant::now(),
        });
        self.state = PlaygroundState::Formatting;
        self.backend.submit(FormatRequest {
            ticket,
            input,
            options: self.settings.options,
        });
        FormatStatus::Submitted(ticket)
    }

    /// Apply one backend response, subject to the staleness guard.
    pub fn complete(&mut self, response: FormatResponse) -> FormatOutcome {
        let Some(pending) = self
            .pending
            .take_if(|pending| pending.ticket == response.ticket)
        else {
            debug!(ticket = response.ticket, "discarding retired format result");
            return FormatOutcome::StaleResultDiscarded;
        };
        self.state = PlaygroundState::Idle;

        if pending.input != self.buffer.raw_text() {
            debug!(ticket = pending.ticket, "document edited while formatting, discarding result");
            return FormatOutcome::StaleResultDiscarded;
        }

        match response.result {
            Ok(text) => {
                let changed = self.buffer.apply_formatted(text);
                if changed {
                    self.persist();
                }
                FormatOutcome::Applied { changed }
            }
            Err(err) => {
                debug!(%err, "formatter rejected document, keeping text");
                FormatOutcome::Rejected(err)
            }
        }
    }

    /// Drain finished responses and expire a timed-out request.
    pub fn poll(&mut self) -> Vec<FormatOutcome> {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> Vec<FormatOutcome> {
        let mut outcomes = Vec::new();
        while let Some(response) = self.backend.try_recv() {
            outcomes.push(self.complete(response));
        }
        if let Some(timeout) = self.settings.format_timeout
            && let Some(pending) = &self.pending
            && now.saturating_duration_since(pending.issued) >= timeout
        {
            debug!(ticket = pending.ticket, ?timeout, "format request timed out");
            self.pending = None;
            self.state = PlaygroundState::Idle;
            outcomes.push(FormatOutcome::TimedOut);
        }
        outcomes
    }

    /// Restore the default document if `confirm` agrees, then format it.
    pub fn reset(&mut self, confirm: impl FnOnce(&str) -> bool) -> ResetOutcome {
        if !confirm(RESET_PROMPT) {
            debug!("reset cancelled");
            return ResetOutcome::Cancelled;
        }
        info!("resetting document to default");
        self.buffer.replace(self.settings.default_document.clone());
        self.format();
        self.persist();
        ResetOutcome::Reset
    }

    /// Snapshot the rendered text as a downloadable file.
    pub fn export(&self) -> ExportArtifact {
        ExportArtifact::html(self.buffer.rendered_text(), Local::now())
    }

    /// The persistence warning, handed out at most once per session.
    pub const fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    fn persist(&mut self) {
        if !self.persistent {
            return;
        }
        let result = self
            .store
            .set(&self.settings.storage_key, self.buffer.raw_text());
        if let Err(err) = result {
            self.persistence_failed(&err);
        }
    }

    fn persistence_failed(&mut self, err: &PersistenceError) {
        if !self.persistent {
            return;
        }
        warn!(%err, "persistence unavailable, continuing in memory");
        self.persistent = false;
        self.notice = Some(Notice::PersistenceUnavailable(err.to_string()));
    }
}

#[cfg(test)]
mod tests;
