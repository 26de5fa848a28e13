use ropey::Rope;
use unicode_width::UnicodeWidthChar;

/// Cursor position in the editor buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    /// Zero-based line index.
    pub line: usize,
    /// Zero-based column, counted in chars.
    pub col: usize,
    /// Column vertical movement tries to return to.
    goal_col: usize,
}

impl Cursor {
    pub const fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            goal_col: col,
        }
    }

    const fn set_col(&mut self, col: usize) {
        self.col = col;
        self.goal_col = col;
    }
}

impl Default for Cursor {
    fn default() -> Self {
        Self::at(0, 0)
    }
}

/// A cursor movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    WordLeft,
    WordRight,
    LineStart,
    LineEnd,
    BufferStart,
    BufferEnd,
    PageUp(usize),
    PageDown(usize),
}

/// The text shown in the editor pane.
///
/// Every change to the text bumps [`EditorBuffer::version`], including a
/// [`EditorBuffer::reload`], so views derived from the text can tell when
/// they are out of date.
pub struct EditorBuffer {
    rope: Rope,
    cursor: Cursor,
    version: u64,
}

impl EditorBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: Cursor::default(),
            version: 0,
        }
    }

    pub fn empty() -> Self {
        Self::from_text("")
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub const fn version(&self) -> u64 {
        self.version
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Line content without its line break.
    pub fn line(&self, idx: usize) -> Option<String> {
        if idx >= self.rope.len_lines() {
            return None;
        }
        let mut line = self.rope.line(idx).to_string();
        while line.ends_with(is_line_break) {
            line.pop();
        }
        Some(line)
    }

    /// Length of a line in chars, line break excluded.
    pub fn line_len(&self, idx: usize) -> usize {
        if idx >= self.rope.len_lines() {
            return 0;
        }
        let line = self.rope.line(idx);
        let mut len = line.len_chars();
        let mut chars = line.chars_at(len);
        while len > 0 && chars.prev().is_some_and(is_line_break) {
            len -= 1;
        }
        len
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace the whole text, keeping the cursor as close to where it was
    /// as the new text allows.
    pub fn reload(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.version += 1;
        let line = self.cursor.line.min(self.last_line());
        let col = self.cursor.col.min(self.line_len(line));
        self.cursor = Cursor::at(line, col);
    }

    /// Insert a typed char. Any line break char splits the line as `\n`.
    pub fn insert_char(&mut self, ch: char) {
        if is_line_break(ch) {
            self.split_line();
            return;
        }
        self.rope.insert_char(self.cursor_char_idx(), ch);
        self.cursor.set_col(self.cursor.col + 1);
        self.version += 1;
    }

    /// Insert pasted text. `\r\n` and every other line break char become `\n`.
    pub fn insert_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let text: String = text
            .replace("\r\n", "\n")
            .chars()
            .map(|ch| if is_line_break(ch) { '\n' } else { ch })
            .collect();
        let start = self.cursor_char_idx();
        self.rope.insert(start, &text);
        self.place_at_char(start + text.chars().count());
        self.version += 1;
    }

    /// Break the line at the cursor. The new line starts with the same
    /// leading whitespace as the one it was split from.
    pub fn split_line(&mut self) {
        let indent: String = self
            .line(self.cursor.line)
            .unwrap_or_default()
            .chars()
            .take(self.cursor.col)
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        let idx = self.cursor_char_idx();
        let inserted = format!("\n{indent}");
        self.rope.insert(idx, &inserted);
        self.place_at_char(idx + inserted.chars().count());
        self.version += 1;
    }

    /// Delete the char before the cursor, joining lines at column 0.
    pub fn delete_back(&mut self) -> bool {
        if self.cursor.col == 0 && self.cursor.line == 0 {
            return false;
        }
        let idx = self.cursor_char_idx();
        let Some(before) = idx.checked_sub(1) else {
            return false;
        };
        if self.cursor.col == 0 {
            let prev = self.cursor.line - 1;
            let prev_len = self.line_len(prev);
            let prev_end = self.rope.line_to_char(prev) + prev_len;
            self.rope.remove(prev_end..idx);
            self.place_at_char(prev_end);
        } else {
            self.rope.remove(before..idx);
            self.place_at_char(before);
        }
        self.version += 1;
        true
    }

    /// Delete the char under the cursor, joining lines at line end.
    pub fn delete_forward(&mut self) -> bool {
        let idx = self.cursor_char_idx();
        if self.cursor.col < self.line_len(self.cursor.line) {
            self.rope.remove(idx..=idx);
        } else if self.cursor.line < self.last_line() {
            let next_start = self.rope.line_to_char(self.cursor.line + 1);
            self.rope.remove(idx..next_start);
        } else {
            return false;
        }
        self.place_at_char(idx);
        self.version += 1;
        true
    }

    pub fn apply(&mut self, motion: Motion) {
        match motion {
            Motion::Left => self.move_left(),
            Motion::Right => self.move_right(),
            Motion::Up => self.move_vertically(-1),
            Motion::Down => self.move_vertically(1),
            Motion::PageUp(rows) => {
                self.move_vertically(-isize::try_from(rows).unwrap_or(isize::MAX));
            }
            Motion::PageDown(rows) => {
                self.move_vertically(isize::try_from(rows).unwrap_or(isize::MAX));
            }
            Motion::WordLeft => self.move_word_left(),
            Motion::WordRight => self.move_word_right(),
            Motion::LineStart => self.cursor.set_col(0),
            Motion::LineEnd => self.cursor.set_col(self.line_len(self.cursor.line)),
            Motion::BufferStart => self.cursor = Cursor::default(),
            Motion::BufferEnd => {
                let last = self.last_line();
                self.cursor = Cursor::at(last, self.line_len(last));
            }
        }
    }

    /// Move to `line`, at the char under display column `display_col`.
    pub fn move_to_display(&mut self, line: usize, display_col: usize) {
        let line = line.min(self.last_line());
        let text = self.line(line).unwrap_or_default();
        let mut width = 0;
        let mut col = 0;
        for ch in text.chars() {
            let w = ch.width().unwrap_or(0);
            if width + w > display_col {
                break;
            }
            width += w;
            col += 1;
        }
        self.cursor = Cursor::at(line, col);
    }

    /// Display width of the cursor's line up to the cursor.
    pub fn cursor_display_col(&self) -> usize {
        self.line(self.cursor.line)
            .unwrap_or_default()
            .chars()
            .take(self.cursor.col)
            .map(|c| c.width().unwrap_or(0))
            .sum()
    }

    fn last_line(&self) -> usize {
        self.rope.len_lines().saturating_sub(1)
    }

    /// Put the cursor on char `idx`. A lone `\r` joined with a following
    /// `\n` becomes one break, so the column is clamped to the line.
    fn place_at_char(&mut self, idx: usize) {
        let idx = idx.min(self.rope.len_chars());
        let line = self.rope.char_to_line(idx);
        let col = (idx - self.rope.line_to_char(line)).min(self.line_len(line));
        self.cursor = Cursor::at(line, col);
    }

    fn cursor_char_idx(&self) -> usize {
        self.rope.line_to_char(self.cursor.line) + self.cursor.col.min(self.line_len(self.cursor.line))
    }

    fn move_left(&mut self) {
        if self.cursor.col > 0 {
            self.cursor.set_col(self.cursor.col - 1);
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
            self.cursor.set_col(self.line_len(self.cursor.line));
        }
    }

    fn move_right(&mut self) {
        if self.cursor.col < self.line_len(self.cursor.line) {
            self.cursor.set_col(self.cursor.col + 1);
        } else if self.cursor.line < self.last_line() {
            self.cursor.line += 1;
            self.cursor.set_col(0);
        }
    }

    fn move_vertically(&mut self, delta: isize) {
        let target = self
            .cursor
            .line
            .saturating_add_signed(delta)
            .min(self.last_line());
        if target == self.cursor.line {
            return;
        }
        self.cursor.line = target;
        self.cursor.col = self.cursor.goal_col.min(self.line_len(target));
    }

    fn move_word_left(&mut self) {
        if self.cursor.col == 0 {
            self.move_left();
            return;
        }
        let chars: Vec<char> = self.line(self.cursor.line).unwrap_or_default().chars().collect();
        let mut col = self.cursor.col.min(chars.len());
        while col > 0 && !is_word_char(chars[col - 1]) {
            col -= 1;
        }
        while col > 0 && is_word_char(chars[col - 1]) {
            col -= 1;
        }
        self.cursor.set_col(col);
    }

    fn move_word_right(&mut self) {
        let chars: Vec<char> = self.line(self.cursor.line).unwrap_or_default().chars().collect();
        if self.cursor.col >= chars.len() {
            self.move_right();
            return;
        }
        let mut col = self.cursor.col;
        while col < chars.len() && is_word_char(chars[col]) {
            col += 1;
        }
        while col < chars.len() && !is_word_char(chars[col]) {
            col += 1;
        }
        self.cursor.set_col(col);
    }
}

/// Chars ropey ends a line on.
const fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field("lines", &self.rope.len_lines())
            .field("cursor", &self.cursor)
            .field("version", &self.version)
            .finish()
    }
}
