//! Editing commands, modes and the key-driven editor facade.
//!
//! Layering:
//! * `engine`     - line/comment/indent commands, goto line, proposal accept.
//!   Each mutating command is one compound change around exactly one replace.
//! * `search`     - incremental find mode (verify + selection listener).
//! * `linked`     - linked edit session (model change listener).
//! * `modes`      - the ordered mode list routing cancel/up/down/enter.
//! * `dispatcher` - `Editor`: keybinding -> `Action` -> modes / engine /
//!   default behaviour, then notification delivery, reveal and status.
//! * `io_ops`     - file load/save helpers used by the runner.

use core_text::{Buffer, TextError};
use thiserror::Error;

pub mod dispatcher;
pub mod engine;
pub mod io_ops;
pub mod linked;
pub mod modes;
pub mod search;

pub use dispatcher::Editor;
pub use engine::Column;
pub use linked::{LinkedEditSession, LinkedModeModel, LinkedPosition, PositionGroup};
pub use modes::{EditorMode, ModeDispatcher, ModeSlot};
pub use search::IncrementalSearch;

/// Failure of an editing operation. "Not applicable" is not an error; it is
/// reported as `Ok(false)`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    Text(#[from] TextError),
    #[error("line {0} is out of range")]
    InvalidLine(usize),
}

/// `Ok(true)`: handled. `Ok(false)`: not applicable, nothing changed.
pub type EditResult = Result<bool, EditError>;

/// Named editor actions. Keybindings resolve to these by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    LineUp,
    LineDown,
    Enter,
    Cancel,
    Tab,
    ShiftTab,
    DeletePrevious,
    MoveLinesUp,
    MoveLinesDown,
    CopyLinesUp,
    CopyLinesDown,
    DeleteLines,
    ToggleLineComment,
    AddBlockComment,
    RemoveBlockComment,
    GotoLine,
    IncrementalFind,
    IncrementalFindReverse,
    NextLinkedPosition,
    PreviousLinkedPosition,
    Undo,
    Redo,
    ContentAssist,
}

const ACTION_NAMES: &[(Action, &str)] = &[
    (Action::LineUp, "lineUp"),
    (Action::LineDown, "lineDown"),
    (Action::Enter, "enter"),
    (Action::Cancel, "cancel"),
    (Action::Tab, "tab"),
    (Action::ShiftTab, "shiftTab"),
    (Action::DeletePrevious, "deletePrevious"),
    (Action::MoveLinesUp, "moveLinesUp"),
    (Action::MoveLinesDown, "moveLinesDown"),
    (Action::CopyLinesUp, "copyLinesUp"),
    (Action::CopyLinesDown, "copyLinesDown"),
    (Action::DeleteLines, "deleteLines"),
    (Action::ToggleLineComment, "toggleLineComment"),
    (Action::AddBlockComment, "addBlockComment"),
    (Action::RemoveBlockComment, "removeBlockComment"),
    (Action::GotoLine, "gotoLine"),
    (Action::IncrementalFind, "incrementalFind"),
    (Action::IncrementalFindReverse, "incrementalFindReverse"),
    (Action::NextLinkedPosition, "nextLinkedPosition"),
    (Action::PreviousLinkedPosition, "previousLinkedPosition"),
    (Action::Undo, "undo"),
    (Action::Redo, "redo"),
    (Action::ContentAssist, "contentAssist"),
];

impl Action {
    /// Stable action name used by keybindings and config overrides.
    pub fn name(self) -> &'static str {
        ACTION_NAMES
            .iter()
            .find(|(a, _)| *a == self)
            .map(|(_, n)| *n)
            .unwrap_or("unknown")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        ACTION_NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(a, _)| *a)
    }

    pub fn all() -> impl Iterator<Item = Action> {
        ACTION_NAMES.iter().map(|(a, _)| *a)
    }
}

/// Comment markers used by the comment commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentMarkers {
    pub line: String,
    pub block_start: String,
    pub block_end: String,
}

impl Default for CommentMarkers {
    fn default() -> Self {
        Self::from(&core_config::CommentConfig::default())
    }
}

impl From<&core_config::CommentConfig> for CommentMarkers {
    fn from(cfg: &core_config::CommentConfig) -> Self {
        Self {
            line: cfg.line.clone(),
            block_start: cfg.block_start.clone(),
            block_end: cfg.block_end.clone(),
        }
    }
}

/// Goto-line dialog. Returns the text the user entered, or `None` on cancel.
pub trait LinePrompt {
    fn prompt(&mut self, current_line: usize, line_count: usize) -> Option<String>;
}

impl<F> LinePrompt for F
where
    F: FnMut(usize, usize) -> Option<String>,
{
    fn prompt(&mut self, current_line: usize, line_count: usize) -> Option<String> {
        self(current_line, line_count)
    }
}

/// A completion proposal. `positions` are buffer offsets valid after the
/// proposal text has been inserted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Proposal {
    pub text: String,
    pub positions: Vec<PositionGroup>,
    pub escape_position: Option<usize>,
}

impl Proposal {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Source of completion proposals for the word before the caret.
pub trait ContentAssistProvider {
    fn proposals(&mut self, buffer: &Buffer, offset: usize, prefix: &str) -> Vec<Proposal>;
}
