//! Error types shared by the playground and its collaborators.
//!
//! None of these escape a playground operation: parse failures leave the
//! buffer untouched, persistence failures drop the session to memory-only
//! mode, and export failures become a toast.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// A 1-based line/column location inside the markup being formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Compute the position of byte `offset` in `source`.
    ///
    /// Columns count characters, not bytes. Offsets past the end clamp to
    /// the end of the source.
    pub fn at_offset(source: &str, offset: usize) -> Self {
        let mut offset = offset.min(source.len());
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The pretty-printer rejected its input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unterminated tag starting at {at}")]
    UnterminatedTag { at: Position },

    #[error("unterminated comment starting at {at}")]
    UnterminatedComment { at: Position },

    #[error("unterminated attribute value in <{tag}> at {at}")]
    UnterminatedAttribute { tag: String, at: Position },

    #[error("<{name}> opened at {at} is never closed")]
    UnclosedElement { name: String, at: Position },

    #[error("unexpected </{name}> at {at}")]
    UnexpectedClosingTag { name: String, at: Position },

    #[error("expected </{expected}> but found </{found}> at {at}")]
    MismatchedClosingTag {
        expected: String,
        found: String,
        at: Position,
    },

    #[error("formatter unavailable: {0}")]
    FormatterUnavailable(String),
}

impl ParseError {
    /// Where in the input the problem was detected, if it is tied to a spot.
    pub const fn position(&self) -> Option<Position> {
        match self {
            Self::UnterminatedTag { at }
            | Self::UnterminatedComment { at }
            | Self::UnterminatedAttribute { at, .. }
            | Self::UnclosedElement { at, .. }
            | Self::UnexpectedClosingTag { at, .. }
            | Self::MismatchedClosingTag { at, .. } => Some(*at),
            Self::FormatterUnavailable(_) => None,
        }
    }
}

/// The key-value store could not be read or written.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("store I/O failed for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("store file {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// An export artifact could not be delivered.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_at_offset_counts_lines_and_chars() {
        let src = "ab\ncdé\nf";
        assert_eq!(Position::at_offset(src, 0), Position::new(1, 1));
        assert_eq!(Position::at_offset(src, 3), Position::new(2, 1));
        // 'é' is two bytes; the offset after it is column 4
        assert_eq!(Position::at_offset(src, 7), Position::new(2, 4));
        assert_eq!(Position::at_offset(src, 999), Position::new(3, 2));
    }

    #[test]
    fn test_position_clamps_inside_multibyte_char() {
        let src = "é";
        assert_eq!(Position::at_offset(src, 1), Position::new(1, 1));
    }

    #[test]
    fn test_parse_error_messages_name_the_tag() {
        let err = ParseError::UnclosedElement {
            name: "div".to_string(),
            at: Position::new(1, 1),
        };
        assert_eq!(err.to_string(), "<div> opened at 1:1 is never closed");
        assert_eq!(err.position(), Some(Position::new(1, 1)));
    }
}
