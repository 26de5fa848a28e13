use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;

use crate::editor::EditorBuffer;
use crate::formatter::{FormatBackend, HtmlFormatter, InlineBackend};
use crate::highlight::{HighlightSpan, highlight_lines};
use crate::playground::{Playground, PlaygroundSettings, PlaygroundState};
use crate::preview::{self, PreviewDocument};
use crate::store::{KeyValueStore, MemoryStore};
use crate::ui::ScreenLayout;
use crate::ui::viewport::Viewport;

/// The playground as the terminal host drives it: store and formatter are
/// picked at startup.
pub type SessionPlayground = Playground<Box<dyn KeyValueStore>, Box<dyn FormatBackend>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Which pane receives keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Editor,
    Preview,
}

/// The complete application state.
///
/// All state lives here - no global or scattered state.
pub struct Model {
    /// The document buffer and its operations
    pub playground: SessionPlayground,
    /// Editor text and cursor
    pub editor: EditorBuffer,
    /// Editor version last handed to the playground
    synced_version: u64,
    /// Scroll position of the editor pane
    pub editor_viewport: Viewport,
    /// Highlighted editor lines, keyed by editor version
    editor_highlights: Option<(u64, Vec<Vec<HighlightSpan>>)>,
    /// Preview of the rendered text
    pub preview: PreviewDocument,
    /// (revision, width) the preview was laid out for
    preview_key: Option<(u64, u16)>,
    /// Scroll position of the preview pane
    pub viewport: Viewport,
    pub focus: Focus,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    /// Whether help overlay is visible
    pub help_visible: bool,
    /// Scroll offset inside the help overlay
    pub help_scroll_offset: usize,
    /// Whether the reset confirmation is showing
    pub reset_prompt_visible: bool,
    toast: Option<Toast>,
    /// Whether the app should quit
    pub should_quit: bool,
    terminal_size: (u16, u16),
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("state", &self.playground.state())
            .field("revision", &self.playground.revision())
            .field("editor", &self.editor)
            .field("focus", &self.focus)
            .field("terminal_size", &self.terminal_size)
            .finish_non_exhaustive()
    }
}

impl Model {
    /// Create a model showing the playground's current document.
    pub fn new(playground: SessionPlayground, terminal_size: (u16, u16)) -> Self {
        let mut model = Self::bare(playground, terminal_size);
        model.resize(terminal_size.0, terminal_size.1);
        model.surface_notice();
        model
    }

    /// The model without any layout or preview work done yet.
    fn bare(playground: SessionPlayground, terminal_size: (u16, u16)) -> Self {
        let editor = EditorBuffer::from_text(playground.raw_text());
        Self {
            synced_version: editor.version(),
            playground,
            editor,
            editor_viewport: Viewport::new(0, 0, 0),
            editor_highlights: None,
            preview: PreviewDocument::empty(),
            preview_key: None,
            viewport: Viewport::new(0, 0, 0),
            focus: Focus::Editor,
            config_global_path: None,
            config_local_path: None,
            help_visible: false,
            help_scroll_offset: 0,
            reset_prompt_visible: false,
            toast: None,
            should_quit: false,
            terminal_size,
        }
    }

    pub fn layout(&self) -> ScreenLayout {
        let (width, height) = self.terminal_size;
        crate::ui::screen_layout(Rect::new(0, 0, width, height))
    }

    /// Columns taken by the editor's line-number gutter.
    pub fn editor_gutter_width(&self) -> u16 {
        crate::ui::line_number_width(self.editor.line_count()) + 1
    }

    /// Display columns the editor text is scrolled sideways so the cursor
    /// stays inside a text area `text_width` columns wide.
    pub fn editor_h_scroll(&self, text_width: u16) -> usize {
        self.editor
            .cursor_display_col()
            .saturating_sub(usize::from(text_width.saturating_sub(1)))
    }

    pub fn is_formatting(&self) -> bool {
        self.playground.state() == PlaygroundState::Formatting
    }

    pub(super) fn resize(&mut self, width: u16, height: u16) {
        self.terminal_size = (width, height);
        let layout = self.layout();
        let editor = layout.editor_inner();
        let preview = layout.preview_inner();
        self.editor_viewport.resize(
            editor.width.saturating_sub(self.editor_gutter_width()),
            editor.height,
        );
        self.viewport.resize(preview.width, preview.height);
        self.editor_viewport.set_total_lines(self.editor.line_count());
        self.ensure_cursor_visible();
        self.refresh_preview();
    }

    /// Hand editor changes to the playground as one Edit of the full text.
    pub(super) fn commit_edit(&mut self) {
        if self.editor.version() != self.synced_version {
            self.playground.edit(self.editor.text());
            self.synced_version = self.editor.version();
        }
        self.editor_viewport.set_total_lines(self.editor.line_count());
        self.ensure_cursor_visible();
        self.refresh_preview();
    }

    /// Make the editor show the playground's raw text again.
    pub(super) fn reload_editor(&mut self) {
        if self.editor.text() != self.playground.raw_text() {
            self.editor.reload(self.playground.raw_text());
        }
        self.synced_version = self.editor.version();
        self.editor_viewport.set_total_lines(self.editor.line_count());
        self.ensure_cursor_visible();
        self.refresh_preview();
    }

    pub(super) fn refresh_preview(&mut self) {
        let key = (self.playground.revision(), self.viewport.width());
        if self.preview_key == Some(key) {
            return;
        }
        self.preview = preview::render(self.playground.rendered_text(), key.1);
        self.preview_key = Some(key);
        self.viewport.set_total_lines(self.preview.line_count());
    }

    pub(super) fn ensure_cursor_visible(&mut self) {
        self.editor_viewport.ensure_visible(self.editor.cursor().line);
    }

    /// Highlighted editor lines for the current text.
    pub fn editor_highlights(&mut self) -> &[Vec<HighlightSpan>] {
        let version = self.editor.version();
        if self
            .editor_highlights
            .as_ref()
            .is_none_or(|(cached, _)| *cached != version)
        {
            let lines = highlight_lines("html", &self.editor.text());
            self.editor_highlights = Some((version, lines));
        }
        self.editor_highlights
            .as_ref()
            .map_or(&[][..], |(_, lines)| lines.as_slice())
    }

    /// Turn a pending playground notice into a toast.
    pub(super) fn surface_notice(&mut self) {
        if let Some(notice) = self.playground.take_notice() {
            self.show_toast(ToastLevel::Warning, notice.to_string());
        }
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + Duration::from_secs(4),
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}

// Implement Default for Model to allow std::mem::take. The placeholder only
// lives until update returns, so it skips the store and all layout work.
impl Default for Model {
    fn default() -> Self {
        let playground = Playground::detached(
            Box::new(MemoryStore::new()) as Box<dyn KeyValueStore>,
            Box::new(InlineBackend::new(HtmlFormatter)) as Box<dyn FormatBackend>,
            PlaygroundSettings::default(),
        );
        Self::bare(playground, (0, 0))
    }
}
