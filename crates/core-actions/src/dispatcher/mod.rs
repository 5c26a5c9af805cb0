//! Key-driven editor facade.
//!
//! `Editor` owns the model (state + view), the keymap and the mode list. A key
//! resolves to an action name through the keymap; the action goes to the
//! active mode first, then to the command engine, then to default editing
//! behaviour. Printable keys without a binding take the verify path.
//!
//! After every action:
//! * queued model and selection notifications are delivered to the modes,
//! * a pending reveal scrolls the view,
//! * the status line is refreshed (mode status, else caret position).
//!
//! Sub-modules:
//! * `motion` - default caret movement for lineUp / lineDown
//! * `edit`   - typed text through verify listeners, backspace
//! * `undo`   - undo / redo dispatch

use crate::engine::{self, Column};
use crate::linked::LinkedModeModel;
use crate::modes::{EditorMode, ModeDispatcher, ModeKey};
use crate::{Action, CommentMarkers, ContentAssistProvider, EditResult, LinePrompt};
use core_config::Config;
use core_events::KeyEvent;
use core_keymap::Keymap;
use core_model::{EditorModel, RevealConfig, View};
use core_state::{EditorState, Selection, StatusMessage, StatusReporter};
use core_text::Buffer;
use std::time::Instant;
use tracing::{debug, warn};

mod edit;
mod motion;
mod undo;

/// Delivering notifications can cause further changes (a mode moving the
/// caret); bound the feedback loop.
const MAX_NOTIFY_ROUNDS: usize = 4;

pub struct Editor {
    model: EditorModel,
    keymap: Keymap,
    modes: ModeDispatcher,
    comments: CommentMarkers,
    prompt: Option<Box<dyn LinePrompt>>,
    assist: Option<Box<dyn ContentAssistProvider>>,
    /// Column lineUp / lineDown try to keep across short lines.
    sticky_col: Option<usize>,
    /// An error status was just reported; keep it for this action.
    hold_status: bool,
}

impl Editor {
    pub fn new(buffer: Buffer) -> Self {
        Self::with_config(buffer, &Config::default(), 24)
    }

    pub fn with_config(buffer: Buffer, config: &Config, view_height: usize) -> Self {
        let file = &config.file;
        let state = EditorState::with_history(buffer, file.undo.history_max);
        let reveal = RevealConfig {
            margin: usize::from(config.effective_margin),
            animate: file.reveal.animate,
            tick: file.reveal.tick(),
            steps: file.reveal.steps,
        };
        let mut keymap = Keymap::with_defaults();
        for err in keymap.apply_overrides(config.key_overrides()) {
            warn!(target: "actions.dispatch", error = %err, "key_override_rejected");
        }
        for (binding, action) in config.key_overrides() {
            if !action.is_empty() && Action::from_name(action).is_none() {
                warn!(target: "actions.dispatch", binding, action, "key_override_unknown_action");
            }
        }
        Self {
            model: EditorModel::with_view(state, View::new(view_height, reveal)),
            keymap,
            modes: ModeDispatcher::new(file.search.wrap),
            comments: CommentMarkers::from(&file.comments),
            prompt: None,
            assist: None,
            sticky_col: None,
            hold_status: false,
        }
    }

    pub fn model(&self) -> &EditorModel {
        &self.model
    }

    pub fn state(&self) -> &EditorState {
        self.model.state()
    }

    pub fn state_mut(&mut self) -> &mut EditorState {
        self.model.state_mut()
    }

    pub fn view(&self) -> &View {
        self.model.view()
    }

    pub fn modes(&self) -> &ModeDispatcher {
        &self.modes
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn keymap_mut(&mut self) -> &mut Keymap {
        &mut self.keymap
    }

    pub fn text(&self) -> String {
        self.model.state().buffer().text()
    }

    pub fn selection(&self) -> Selection {
        self.model.state().selection()
    }

    pub fn set_line_prompt(&mut self, prompt: Box<dyn LinePrompt>) {
        self.prompt = Some(prompt);
    }

    pub fn set_content_assist(&mut self, provider: Box<dyn ContentAssistProvider>) {
        self.assist = Some(provider);
    }

    pub fn set_status_reporter(&mut self, reporter: Box<dyn StatusReporter>) {
        self.model.state_mut().set_status_reporter(reporter);
    }

    pub fn set_comment_markers(&mut self, markers: CommentMarkers) {
        self.comments = markers;
    }

    /// Handle one key. Returns whether it was consumed.
    pub fn handle_key(&mut self, key: &KeyEvent) -> bool {
        if let Some(action) = self.keymap.action_for(key).and_then(Action::from_name) {
            return self.run_action(action);
        }
        match key.printable() {
            Some(c) => self.handle_text(c.encode_utf8(&mut [0; 4])),
            None => {
                debug!(target: "actions.dispatch", key = %core_keymap::format_binding(key), "unbound_key");
                false
            }
        }
    }

    /// Typed or pasted text. Listeners see it before the buffer does and may
    /// rewrite or veto it.
    pub fn handle_text(&mut self, text: &str) -> bool {
        self.sticky_col = None;
        let state = self.model.state_mut();
        let result = edit::insert_text(state, &mut self.modes, text);
        let consumed = self.settle("text", result);
        self.finish_action();
        consumed
    }

    /// Run a named action. Returns whether it was consumed; unconsumed keys
    /// leave the buffer and selection untouched.
    pub fn run_action(&mut self, action: Action) -> bool {
        if !matches!(action, Action::LineUp | Action::LineDown) {
            self.sticky_col = None;
        }
        let result = self.apply(action);
        let consumed = self.settle(action.name(), result);
        debug!(target: "actions.dispatch", action = action.name(), consumed, "action");
        self.finish_action();
        consumed
    }

    fn apply(&mut self, action: Action) -> EditResult {
        let state = self.model.state_mut();
        let modes = &mut self.modes;
        match action {
            Action::LineUp => {
                if modes.dispatch(state, ModeKey::LineUp) {
                    return Ok(true);
                }
                motion::vertical(state, &mut self.sticky_col, motion::Vertical::Up)
            }
            Action::LineDown => {
                if modes.dispatch(state, ModeKey::LineDown) {
                    return Ok(true);
                }
                motion::vertical(state, &mut self.sticky_col, motion::Vertical::Down)
            }
            Action::Enter => {
                if modes.dispatch(state, ModeKey::Enter) {
                    return Ok(true);
                }
                if engine::auto_indent_newline(state)? {
                    return Ok(true);
                }
                let delimiter = state.buffer().line_delimiter();
                edit::insert_text(state, modes, delimiter)
            }
            Action::Cancel => Ok(modes.dispatch(state, ModeKey::Cancel)),
            Action::Tab => {
                if let Some(linked) = modes.linked_mut()
                    && linked.is_active()
                {
                    return Ok(linked.next_position(state));
                }
                if engine::tab_indent(state)? {
                    return Ok(true);
                }
                edit::insert_text(state, modes, "\t")
            }
            Action::ShiftTab => {
                if let Some(linked) = modes.linked_mut()
                    && linked.is_active()
                {
                    return Ok(linked.previous_position(state));
                }
                engine::unindent(state)
            }
            Action::DeletePrevious => {
                if let Some(search) = modes.search_mut()
                    && search.is_active()
                {
                    return Ok(search.backspace(state));
                }
                edit::delete_previous(state)
            }
            Action::MoveLinesUp => engine::move_lines_up(state),
            Action::MoveLinesDown => engine::move_lines_down(state),
            Action::CopyLinesUp => engine::copy_lines_up(state),
            Action::CopyLinesDown => engine::copy_lines_down(state),
            Action::DeleteLines => engine::delete_lines(state),
            Action::ToggleLineComment => engine::toggle_line_comment(state, &self.comments),
            Action::AddBlockComment => engine::add_block_comment(state, &self.comments),
            Action::RemoveBlockComment => engine::remove_block_comment(state, &self.comments),
            Action::GotoLine => match self.prompt.as_mut() {
                Some(prompt) => engine::goto_line(state, &mut **prompt),
                None => Ok(false),
            },
            Action::IncrementalFind | Action::IncrementalFindReverse => {
                let reverse = action == Action::IncrementalFindReverse;
                Ok(modes
                    .search_mut()
                    .is_some_and(|search| search.toggle(state, reverse)))
            }
            Action::NextLinkedPosition => Ok(modes
                .linked_mut()
                .is_some_and(|linked| linked.next_position(state))),
            Action::PreviousLinkedPosition => Ok(modes
                .linked_mut()
                .is_some_and(|linked| linked.previous_position(state))),
            Action::Undo => undo::handle_undo(state),
            Action::Redo => undo::handle_redo(state),
            Action::ContentAssist => self.content_assist(),
        }
    }

    /// Accept the first proposal for the word before the caret.
    fn content_assist(&mut self) -> EditResult {
        let Some(provider) = self.assist.as_mut() else {
            return Ok(false);
        };
        let state = self.model.state_mut();
        let caret = state.caret_offset();
        let start = word_start(state.buffer(), caret);
        let prefix = state.buffer().text_range(start, caret)?;
        let Some(proposal) = provider
            .proposals(state.buffer(), caret, &prefix)
            .into_iter()
            .next()
        else {
            debug!(target: "actions.dispatch", prefix = prefix.as_str(), "no_proposals");
            return Ok(false);
        };
        if let Some(linked) = engine::accept_proposal(state, start, caret, &proposal)? {
            self.enter_linked(linked);
        }
        Ok(true)
    }

    /// Start a linked edit session. Changes made so far are delivered first so
    /// they cannot end the new session.
    pub fn enter_linked_mode(&mut self, model: LinkedModeModel) -> bool {
        let entered = self.enter_linked(model);
        self.finish_action();
        entered
    }

    fn enter_linked(&mut self, model: LinkedModeModel) -> bool {
        self.flush_notifications();
        let state = self.model.state_mut();
        self.modes
            .linked_mut()
            .is_some_and(|linked| linked.enter(state, model))
    }

    /// Select within 1-based `line`; see [`engine::goto_line_column`].
    pub fn goto_line_column(&mut self, line: usize, column: Column, end: Option<usize>) -> EditResult {
        self.sticky_col = None;
        let result = engine::goto_line_column(self.model.state_mut(), line, column, end);
        if let Err(err) = &result {
            self.settle("gotoLine", Err(err.clone()));
        }
        self.finish_action();
        result
    }

    /// Advance a running reveal animation. Returns true if the view scrolled.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.model.view_mut().tick(now)
    }

    /// Errors become a warning plus an error status; the key counts as consumed.
    fn settle(&mut self, what: &str, result: EditResult) -> bool {
        match result {
            Ok(consumed) => consumed,
            Err(err) => {
                warn!(target: "actions.dispatch", action = what, error = %err, "action_failed");
                self.model
                    .state_mut()
                    .report_status(err.to_string(), true, false);
                self.hold_status = true;
                true
            }
        }
    }

    fn finish_action(&mut self) {
        self.flush_notifications();
        self.model.sync_reveal(Instant::now());
        self.update_status();
    }

    fn flush_notifications(&mut self) {
        let state = self.model.state_mut();
        for _ in 0..MAX_NOTIFY_ROUNDS {
            let changes = state.take_model_changes();
            let selections = state.take_selection_changes();
            if changes.is_empty() && selections.is_empty() {
                return;
            }
            for change in &changes {
                self.modes.deliver_model_change(state, change);
            }
            for change in &selections {
                self.modes.deliver_selection(state, change);
            }
        }
        debug!(target: "actions.dispatch", rounds = MAX_NOTIFY_ROUNDS, "notification_rounds_exhausted");
    }

    fn update_status(&mut self) {
        if std::mem::take(&mut self.hold_status) {
            return;
        }
        let state = self.model.state_mut();
        let message = match self.modes.status_owner().and_then(|m| m.status_message()) {
            Some(message) => message,
            None => {
                let (line, col) = state.caret_line_col();
                StatusMessage {
                    text: format!("Line {} : Col {}", line + 1, col + 1),
                    is_error: false,
                    is_progress: false,
                }
            }
        };
        if state.last_status() != Some(&message) {
            state.report_status(message.text, message.is_error, message.is_progress);
        }
    }
}

/// Start of the identifier run ending at `offset`.
fn word_start(buffer: &Buffer, offset: usize) -> usize {
    let mut start = offset;
    while start > 0
        && buffer
            .char_at(start - 1)
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
    {
        start -= 1;
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EditError, PositionGroup, Proposal};
    use core_events::{KeyCode, KeyModifiers};
    use core_text::Buffer;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn editor(text: &str) -> Editor {
        Editor::new(Buffer::from_str("t", text))
    }

    fn key(spec: &str) -> KeyEvent {
        core_keymap::parse_binding(spec).unwrap()
    }

    #[test]
    fn typing_goes_through_verify_and_moves_caret() {
        let mut ed = editor("");
        for c in "hi".chars() {
            assert!(ed.handle_key(&KeyEvent::plain(KeyCode::Char(c))));
        }
        assert_eq!(ed.text(), "hi");
        assert_eq!(ed.selection(), Selection::caret_at(2));
        assert_eq!(ed.state().last_status().unwrap().text, "Line 1 : Col 3");
    }

    #[test]
    fn ctrl_chord_without_binding_is_not_consumed() {
        let mut ed = editor("abc");
        let ctrl_q = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::CTRL);
        assert!(!ed.handle_key(&ctrl_q));
        assert_eq!(ed.text(), "abc");
    }

    #[test]
    fn vertical_motion_keeps_sticky_column() {
        let mut ed = editor("abcdef\nx\nabcdef");
        ed.state_mut().set_caret_offset(4, false);
        ed.handle_key(&key("down"));
        assert_eq!(ed.selection(), Selection::caret_at(8));
        ed.handle_key(&key("down"));
        assert_eq!(ed.selection(), Selection::caret_at(13));
        assert!(ed.handle_key(&key("down")), "boundary still consumed");
        assert_eq!(ed.selection(), Selection::caret_at(13));
    }

    #[test]
    fn enter_inserts_buffer_delimiter() {
        let mut ed = editor("ab\r\ncd");
        ed.state_mut().set_caret_offset(1, false);
        ed.handle_key(&key("enter"));
        assert_eq!(ed.text(), "a\r\nb\r\ncd");
        assert_eq!(ed.selection(), Selection::caret_at(3));
    }

    #[test]
    fn enter_keeps_indentation_in_one_undo_step() {
        let mut ed = editor("\tfoo");
        ed.state_mut().set_caret_offset(4, false);
        assert!(ed.handle_key(&key("enter")));
        assert_eq!(ed.text(), "\tfoo\n\t");
        assert_eq!(ed.selection(), Selection::caret_at(6));
        ed.handle_key(&key("ctrl+z"));
        assert_eq!(ed.text(), "\tfoo");
    }

    #[test]
    fn backspace_removes_crlf_as_one_unit() {
        let mut ed = editor("a\r\nb");
        ed.state_mut().set_caret_offset(3, false);
        ed.handle_key(&key("backspace"));
        assert_eq!(ed.text(), "ab");
        assert_eq!(ed.selection(), Selection::caret_at(1));
    }

    #[test]
    fn single_line_tab_inserts_tab_character() {
        let mut ed = editor("ab");
        ed.state_mut().set_caret_offset(1, false);
        ed.handle_key(&key("tab"));
        assert_eq!(ed.text(), "a\tb");
    }

    #[test]
    fn search_status_owns_status_line() {
        let mut ed = editor("xxabxxab");
        ed.handle_key(&key("ctrl+j"));
        assert_eq!(ed.state().last_status().unwrap().text, "Incremental find: ");
        ed.handle_text("a");
        ed.handle_text("b");
        let status = ed.state().last_status().unwrap().clone();
        assert_eq!(status.text, "Incremental find: ab");
        assert!(status.is_progress);
        ed.handle_key(&key("esc"));
        assert_eq!(ed.state().last_status().unwrap().text, "Line 1 : Col 5");
    }

    #[test]
    fn errors_are_reported_and_consumed() {
        let mut ed = editor("a\nb");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        ed.set_status_reporter(Box::new(move |msg: &str, is_error: bool, _: bool| {
            sink.borrow_mut().push((msg.to_string(), is_error));
        }));
        let result = ed.goto_line_column(9, Column::Offset(0), None);
        assert_eq!(result, Err(EditError::InvalidLine(9)));
        assert_eq!(
            seen.borrow().last(),
            Some(&("line 9 is out of range".to_string(), true))
        );
        ed.handle_key(&key("down"));
        assert_eq!(
            seen.borrow().last(),
            Some(&("Line 2 : Col 1".to_string(), false))
        );
    }

    struct Snippets;

    impl ContentAssistProvider for Snippets {
        fn proposals(&mut self, _buffer: &Buffer, offset: usize, prefix: &str) -> Vec<Proposal> {
            if prefix != "fn" {
                return Vec::new();
            }
            let start = offset - prefix.len();
            vec![Proposal {
                text: "fn name() {}".into(),
                positions: vec![PositionGroup::single(start + 3, 4)],
                escape_position: Some(start + 12),
            }]
        }
    }

    #[test]
    fn content_assist_enters_linked_mode() {
        let mut ed = editor("x fn");
        ed.state_mut().set_caret_offset(4, false);
        ed.set_content_assist(Box::new(Snippets));
        assert!(ed.handle_key(&key("ctrl+space")));
        assert_eq!(ed.text(), "x fn name() {}");
        assert!(ed.modes().linked().unwrap().is_active());
        assert_eq!(ed.selection(), Selection::new(5, 9));

        ed.handle_text("id");
        assert_eq!(ed.text(), "x fn id() {}");
        assert_eq!(ed.modes().linked().unwrap().escape_offset(), 12);
        ed.handle_key(&key("enter"));
        assert_eq!(ed.selection(), Selection::caret_at(12));
        assert!(!ed.modes().linked().unwrap().is_active());
    }
}
