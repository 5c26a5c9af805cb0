#![allow(dead_code)] // Shared across integration tests; each test binary uses a subset of helpers.

use core_actions::Editor;
use core_config::Config;
use core_events::{KeyCode, KeyEvent};
use core_text::Buffer;

pub fn editor(text: &str) -> Editor {
    Editor::new(Buffer::from_str("test", text))
}

pub fn editor_with_config(text: &str, toml: &str, view_height: usize) -> Editor {
    let config: Config = core_config::parse(toml, "inline");
    Editor::with_config(Buffer::from_str("test", text), &config, view_height)
}

pub fn key(spec: &str) -> KeyEvent {
    core_keymap::parse_binding(spec).expect("valid binding")
}

/// Press the chord named by `spec`; returns whether it was consumed.
pub fn press(ed: &mut Editor, spec: &str) -> bool {
    ed.handle_key(&key(spec))
}

/// Type `text` one unmodified key at a time.
pub fn type_keys(ed: &mut Editor, text: &str) {
    for c in text.chars() {
        ed.handle_key(&KeyEvent::plain(KeyCode::Char(c)));
    }
}

pub fn select(ed: &mut Editor, anchor: usize, caret: usize) {
    ed.state_mut().set_selection(anchor, caret, false);
    // Consume the change so it is not mistaken for a later one.
    let _ = ed.state_mut().take_selection_changes();
}
