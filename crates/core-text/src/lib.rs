//! Rope-based text model.
//!
//! All offsets exposed by this crate are *character* offsets (Unicode scalar
//! values), matching the contract consumed by the editing engine: the buffer
//! is addressed as a flat sequence of characters, lines are derived on demand
//! and every mutation flows through the single atomic [`Buffer::replace`].
//!
//! Line boundaries are `\n`, `\r\n` and a solitary `\r`. Lines are contiguous
//! and delimiter-terminated except possibly the last one, so a buffer ending
//! in a delimiter has a trailing empty line.

use ropey::Rope;
use thiserror::Error;
use tracing::trace;

pub mod find;

pub use find::Direction;

/// Errors raised when a caller addresses the buffer outside its bounds.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextError {
    #[error("invalid range {start}..{end} (buffer holds {len} chars)")]
    InvalidRange { start: usize, end: usize, len: usize },
    #[error("offset {offset} out of bounds (buffer holds {len} chars)")]
    OffsetOutOfBounds { offset: usize, len: usize },
    #[error("line {line} out of bounds (buffer holds {count} lines)")]
    LineOutOfBounds { line: usize, count: usize },
}

pub type TextResult<T> = Result<T, TextError>;

/// Default delimiter used when the initial content carries none.
pub const DEFAULT_DELIMITER: &str = "\n";

/// A text buffer backed by a `ropey::Rope`.
#[derive(Clone)]
pub struct Buffer {
    rope: Rope,
    delimiter: &'static str,
    pub name: String,
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("name", &self.name)
            .field("chars", &self.rope.len_chars())
            .field("lines", &self.rope.len_lines())
            .finish()
    }
}

impl Buffer {
    /// Construct a buffer from an in-memory string slice. The line delimiter is
    /// taken from the first delimiter found in `content`.
    pub fn from_str(name: impl Into<String>, content: &str) -> Self {
        Self {
            rope: Rope::from_str(content),
            delimiter: detect_delimiter(content),
            name: name.into(),
        }
    }

    /// Whole buffer content.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Content of the half-open char range `[start, end)`.
    pub fn text_range(&self, start: usize, end: usize) -> TextResult<String> {
        self.check_range(start, end)?;
        Ok(self.rope.slice(start..end).to_string())
    }

    /// Total number of characters.
    pub fn char_count(&self) -> usize {
        self.rope.len_chars()
    }

    /// Total number of lines (always at least one).
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Delimiter inserted by editing operations that synthesize line breaks.
    pub fn line_delimiter(&self) -> &'static str {
        self.delimiter
    }

    /// Line index containing `offset`. The end-of-buffer offset maps to the last line.
    pub fn line_at_offset(&self, offset: usize) -> TextResult<usize> {
        let len = self.rope.len_chars();
        if offset > len {
            return Err(TextError::OffsetOutOfBounds { offset, len });
        }
        Ok(self.rope.char_to_line(offset))
    }

    /// Offset of the first character of `line`.
    pub fn line_start(&self, line: usize) -> TextResult<usize> {
        self.check_line(line)?;
        Ok(self.rope.line_to_char(line))
    }

    /// Offset just past the last character of `line`, optionally including its delimiter.
    pub fn line_end(&self, line: usize, include_delimiter: bool) -> TextResult<usize> {
        self.check_line(line)?;
        let start = self.rope.line_to_char(line);
        let slice = self.rope.line(line);
        let full = start + slice.len_chars();
        if include_delimiter {
            Ok(full)
        } else {
            Ok(full - delimiter_len(&slice))
        }
    }

    /// Text of `line`, optionally including its delimiter.
    pub fn line(&self, line: usize, include_delimiter: bool) -> TextResult<String> {
        let start = self.line_start(line)?;
        let end = self.line_end(line, include_delimiter)?;
        Ok(self.rope.slice(start..end).to_string())
    }

    /// Character at `offset`, if any.
    pub fn char_at(&self, offset: usize) -> Option<char> {
        if offset < self.rope.len_chars() {
            Some(self.rope.char(offset))
        } else {
            None
        }
    }

    /// Atomically replace `[start, end)` with `text`. An empty `text` deletes,
    /// `start == end` inserts. Returns the removed text.
    pub fn replace(&mut self, start: usize, end: usize, text: &str) -> TextResult<String> {
        self.check_range(start, end)?;
        let removed = self.rope.slice(start..end).to_string();
        if start < end {
            self.rope.remove(start..end);
        }
        if !text.is_empty() {
            self.rope.insert(start, text);
        }
        trace!(
            target: "text.buffer",
            start,
            end,
            removed_chars = end - start,
            added_chars = text.chars().count(),
            "replace"
        );
        Ok(removed)
    }

    fn check_range(&self, start: usize, end: usize) -> TextResult<()> {
        let len = self.rope.len_chars();
        if start > end || end > len {
            return Err(TextError::InvalidRange { start, end, len });
        }
        Ok(())
    }

    fn check_line(&self, line: usize) -> TextResult<()> {
        let count = self.rope.len_lines();
        if line >= count {
            return Err(TextError::LineOutOfBounds { line, count });
        }
        Ok(())
    }

    pub(crate) fn rope(&self) -> &Rope {
        &self.rope
    }
}

fn delimiter_len(line: &ropey::RopeSlice<'_>) -> usize {
    let n = line.len_chars();
    if n == 0 {
        return 0;
    }
    match line.char(n - 1) {
        '\n' if n >= 2 && line.char(n - 2) == '\r' => 2,
        '\n' | '\r' => 1,
        _ => 0,
    }
}

fn detect_delimiter(content: &str) -> &'static str {
    match content.find(['\n', '\r']) {
        Some(idx) if content[idx..].starts_with("\r\n") => "\r\n",
        Some(idx) if content.as_bytes()[idx] == b'\r' => "\r",
        _ => DEFAULT_DELIMITER,
    }
}
