//! core-keymap: key binding table.
//!
//! Design principles:
//! - Pure and deterministic: resolution depends only on the table and the key.
//! - Bindings map a key chord to an *action name*; what the action does is
//!   decided by the action layer. Unbinding is expressed by binding to `None`.
//! - Later bindings for the same chord override earlier ones (logged at trace).
//!
//! Binding strings use `+`-separated modifiers followed by one key, e.g.
//! `"ctrl+alt+up"`, `"ctrl+shift+/"`, `"shift+tab"`, `"ctrl+space"`.
//! Modifier matching is exact: a chord bound with `shift` only fires when
//! SHIFT is part of the incoming key event.

use core_events::{KeyCode, KeyEvent, KeyModifiers};
use smallvec::SmallVec;
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeymapError {
    #[error("empty key binding")]
    Empty,
    #[error("unknown modifier `{0}` in key binding")]
    UnknownModifier(String),
    #[error("unknown key `{0}` in key binding")]
    UnknownKey(String),
}

/// Parse a binding string such as `"ctrl+alt+down"` into a key event.
pub fn parse_binding(spec: &str) -> Result<KeyEvent, KeymapError> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(KeymapError::Empty);
    }
    // A trailing "+" names the plus key itself ("ctrl++").
    let (head, key) = match spec.strip_suffix("++") {
        Some(rest) => (rest, "+"),
        None if spec == "+" => ("", "+"),
        None => match spec.rsplit_once('+') {
            Some((rest, key)) => (rest, key),
            None => ("", spec),
        },
    };
    let tokens: SmallVec<[&str; 4]> = head.split('+').filter(|t| !t.is_empty()).collect();
    let mut mods = KeyModifiers::empty();
    for tok in tokens {
        mods |= match tok.to_ascii_lowercase().as_str() {
            "ctrl" | "control" | "cmd" => KeyModifiers::CTRL,
            "alt" | "option" => KeyModifiers::ALT,
            "shift" => KeyModifiers::SHIFT,
            _ => return Err(KeymapError::UnknownModifier(tok.to_string())),
        };
    }
    Ok(KeyEvent::new(parse_key(key)?, mods))
}

fn parse_key(key: &str) -> Result<KeyCode, KeymapError> {
    let lower = key.to_ascii_lowercase();
    let code = match lower.as_str() {
        "" => return Err(KeymapError::Empty),
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "enter" | "return" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "space" => KeyCode::Char(' '),
        _ => {
            let mut chars = key.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c.to_ascii_lowercase()),
                _ => return Err(KeymapError::UnknownKey(key.to_string())),
            }
        }
    };
    Ok(code)
}

/// Render a key event back into binding-string form.
pub fn format_binding(key: &KeyEvent) -> String {
    let mut out = String::new();
    for (flag, name) in [
        (KeyModifiers::CTRL, "ctrl+"),
        (KeyModifiers::ALT, "alt+"),
        (KeyModifiers::SHIFT, "shift+"),
    ] {
        if key.mods.contains(flag) {
            out.push_str(name);
        }
    }
    match key.code {
        KeyCode::Char(' ') => out.push_str("space"),
        KeyCode::Char(c) => out.push(c),
        KeyCode::Enter => out.push_str("enter"),
        KeyCode::Esc => out.push_str("esc"),
        KeyCode::Backspace => out.push_str("backspace"),
        KeyCode::Tab => out.push_str("tab"),
        KeyCode::Up => out.push_str("up"),
        KeyCode::Down => out.push_str("down"),
        KeyCode::Left => out.push_str("left"),
        KeyCode::Right => out.push_str("right"),
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    key: KeyEvent,
    action: String,
}

/// Ordered key → action-name table.
#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: Vec<Binding>,
}

/// Default chords, mirroring common IDE conventions.
pub const DEFAULT_BINDINGS: &[(&str, &str)] = &[
    ("up", "lineUp"),
    ("down", "lineDown"),
    ("enter", "enter"),
    ("esc", "cancel"),
    ("tab", "tab"),
    ("shift+tab", "shiftTab"),
    ("backspace", "deletePrevious"),
    ("alt+up", "moveLinesUp"),
    ("alt+down", "moveLinesDown"),
    ("ctrl+alt+up", "copyLinesUp"),
    ("ctrl+alt+down", "copyLinesDown"),
    ("ctrl+d", "deleteLines"),
    ("ctrl+/", "toggleLineComment"),
    ("ctrl+shift+/", "addBlockComment"),
    ("ctrl+shift+\\", "removeBlockComment"),
    ("ctrl+l", "gotoLine"),
    ("ctrl+j", "incrementalFind"),
    ("ctrl+shift+j", "incrementalFindReverse"),
    ("ctrl+z", "undo"),
    ("ctrl+y", "redo"),
    ("ctrl+space", "contentAssist"),
];

impl Keymap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table populated with [`DEFAULT_BINDINGS`].
    pub fn with_defaults() -> Self {
        let mut km = Self::new();
        for (spec, action) in DEFAULT_BINDINGS {
            // Defaults are static and known to parse.
            if let Ok(key) = parse_binding(spec) {
                km.set_key_binding(key, Some(*action));
            }
        }
        km
    }

    /// Bind `key` to `action`, or remove the binding when `action` is `None`.
    pub fn set_key_binding(&mut self, key: KeyEvent, action: Option<&str>) {
        let key = normalize(key);
        if let Some(pos) = self.bindings.iter().position(|b| b.key == key) {
            let old = self.bindings.remove(pos);
            trace!(target: "keymap", key = %format_binding(&key), old = old.action.as_str(), "binding_override");
        }
        if let Some(action) = action {
            self.bindings.push(Binding {
                key,
                action: action.to_string(),
            });
        }
    }

    /// Parse and apply `(binding, action)` overrides, collecting parse failures.
    /// An empty action name removes the binding.
    pub fn apply_overrides<'a, I>(&mut self, overrides: I) -> Vec<KeymapError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut errors = Vec::new();
        for (spec, action) in overrides {
            match parse_binding(spec) {
                Ok(key) => {
                    let action = (!action.is_empty()).then_some(action);
                    debug!(target: "keymap", binding = spec, action, "binding_override_applied");
                    self.set_key_binding(key, action);
                }
                Err(e) => errors.push(e),
            }
        }
        errors
    }

    /// Action name bound to `key`, if any.
    pub fn action_for(&self, key: &KeyEvent) -> Option<&str> {
        let key = normalize(*key);
        self.bindings
            .iter()
            .find(|b| b.key == key)
            .map(|b| b.action.as_str())
    }

    /// All chords bound to `action`.
    pub fn bindings_for(&self, action: &str) -> SmallVec<[KeyEvent; 2]> {
        self.bindings
            .iter()
            .filter(|b| b.action == action)
            .map(|b| b.key)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl fmt::Display for Keymap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.bindings {
            writeln!(f, "{:<16} {}", format_binding(&b.key), b.action)?;
        }
        Ok(())
    }
}

fn normalize(key: KeyEvent) -> KeyEvent {
    match key.code {
        KeyCode::Char(c) => KeyEvent::new(KeyCode::Char(c.to_ascii_lowercase()), key.mods),
        _ => key,
    }
}
