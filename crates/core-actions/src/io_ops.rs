//! File IO helpers used by the runner.
//!
//! Synchronous and minimal. The buffer keeps the file's own delimiters, so a
//! load / save round trip is byte-identical for valid UTF-8 input.

use core_state::EditorState;
use core_text::Buffer;
use std::path::{Path, PathBuf};

/// Result of attempting to open a file.
#[derive(Debug)]
pub enum OpenFileResult {
    Success(OpenedFile),
    Error, // already logged
}

pub struct OpenedFile {
    pub buffer: Buffer,
    pub file_name: PathBuf,
}

impl std::fmt::Debug for OpenedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedFile")
            .field("file_name", &self.file_name)
            .field("chars", &self.buffer.char_count())
            .field("line_delimiter", &self.buffer.line_delimiter())
            .finish()
    }
}

/// Read `path` into a new buffer named after the file.
pub fn open_file(path: &Path) -> OpenFileResult {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("file");
            let buffer = Buffer::from_str(name, &content);
            tracing::debug!(target: "io", path = %path.display(), chars = buffer.char_count(), lines = buffer.line_count(), "file_opened");
            OpenFileResult::Success(OpenedFile {
                buffer,
                file_name: path.to_path_buf(),
            })
        }
        Err(e) => {
            tracing::error!(target: "io", ?e, path = %path.display(), "file_open_error");
            OpenFileResult::Error
        }
    }
}

/// Result of a write attempt.
#[derive(Debug, PartialEq, Eq)]
pub enum WriteFileResult {
    Success,
    NoFilename,
    Error,
}

/// Write the buffer to `target`, or to the state's file name. A successful
/// write marks the undo history clean.
pub fn write_file(state: &mut EditorState, target: Option<&Path>) -> WriteFileResult {
    let path = if let Some(p) = target {
        p.to_path_buf()
    } else if let Some(existing) = state.file_name.clone() {
        existing
    } else {
        return WriteFileResult::NoFilename;
    };
    let content = state.buffer().text();
    match std::fs::write(&path, content.as_bytes()) {
        Ok(_) => {
            state.mark_clean();
            tracing::debug!(target: "io", path = %path.display(), bytes = content.len(), "file_written");
            WriteFileResult::Success
        }
        Err(e) => {
            tracing::error!(target: "io", ?e, path = %path.display(), "file_write_error");
            WriteFileResult::Error
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_file_keeps_crlf_delimiters() {
        use std::io::Write;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.txt");
        {
            let mut f = std::fs::File::create(&path).unwrap();
            write!(f, "line1\r\nline2\r\n").unwrap();
        }
        match open_file(&path) {
            OpenFileResult::Success(s) => {
                assert_eq!(s.buffer.line_delimiter(), "\r\n");
                assert_eq!(s.buffer.line(0, false).unwrap(), "line1");
                assert_eq!(s.file_name, path);
            }
            OpenFileResult::Error => panic!("expected success"),
        }
    }

    #[test]
    fn open_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            open_file(&dir.path().join("missing.txt")),
            OpenFileResult::Error
        ));
    }

    #[test]
    fn write_file_round_trips_and_marks_clean() {
        let mut state = EditorState::new(Buffer::from_str("t", "a\r\nb\r\n"));
        state.replace(0, 1, "z").unwrap();
        assert!(!state.is_clean());
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        state.file_name = Some(path.clone());
        assert_eq!(write_file(&mut state, None), WriteFileResult::Success);
        assert!(state.is_clean(), "clean after write");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "z\r\nb\r\n");
    }

    #[test]
    fn write_file_no_filename() {
        let mut state = EditorState::new(Buffer::from_str("t", "x"));
        state.replace(0, 0, "y").unwrap();
        assert_eq!(write_file(&mut state, None), WriteFileResult::NoFilename);
        assert!(!state.is_clean(), "clean state unchanged when no filename");
    }
}
