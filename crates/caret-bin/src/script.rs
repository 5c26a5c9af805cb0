//! Key script parsing.
//!
//! One directive per line:
//! * `key <binding>` - a chord such as `ctrl+alt+down`
//! * `text <chars>` - committed text; `\n`, `\t` and `\\` are unescaped
//! * `answer <text>` - queued reply for the next goto-line prompt
//!
//! A line with no directive is read as a binding. Blank lines and lines
//! starting with `#` are skipped.

use anyhow::{Context, Result, bail};
use core_events::InputEvent;
use core_keymap::parse_binding;
use std::collections::VecDeque;
use std::path::Path;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct Script {
    pub events: Vec<InputEvent>,
    pub answers: VecDeque<String>,
}

pub fn load(path: &Path) -> Result<Script> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading key script {}", path.display()))?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<Script> {
    let mut script = Script::default();
    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let (directive, rest) = match line.split_once(' ') {
            Some((d, rest)) => (d, rest),
            None => (line, ""),
        };
        match directive {
            "key" => script.events.push(InputEvent::Key(binding(rest, idx)?)),
            "text" => {
                if rest.is_empty() {
                    bail!("line {}: empty text directive", idx + 1);
                }
                script.events.push(InputEvent::Text(unescape(rest)));
            }
            "answer" => script.answers.push_back(rest.trim().to_string()),
            _ => script.events.push(InputEvent::Key(binding(line, idx)?)),
        }
    }
    tracing::debug!(
        target: "runtime.script",
        events = script.events.len(),
        answers = script.answers.len(),
        "script_parsed"
    );
    Ok(script)
}

fn binding(spec: &str, idx: usize) -> Result<core_events::KeyEvent> {
    parse_binding(spec).with_context(|| format!("line {}: bad binding {spec:?}", idx + 1))
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_events::{KeyCode, KeyEvent, KeyModifiers};
    use pretty_assertions::assert_eq;

    #[test]
    fn directives_and_bare_bindings() {
        let script = parse("# move a line\nalt+up\nkey ctrl+z\ntext a\\tb\\n\nanswer 12\n\n").unwrap();
        assert_eq!(
            script.events,
            vec![
                InputEvent::Key(KeyEvent::new(KeyCode::Up, KeyModifiers::ALT)),
                InputEvent::Key(KeyEvent::new(KeyCode::Char('z'), KeyModifiers::CTRL)),
                InputEvent::Text("a\tb\n".to_string()),
            ]
        );
        assert_eq!(script.answers, VecDeque::from(vec!["12".to_string()]));
    }

    #[test]
    fn text_keeps_inner_spaces() {
        let script = parse("text let x = 1;").unwrap();
        assert_eq!(script.events, vec![InputEvent::Text("let x = 1;".to_string())]);
    }

    #[test]
    fn bad_binding_names_the_line() {
        let err = parse("tab\nhyper+q\n").unwrap_err();
        assert!(format!("{err:#}").contains("line 2"), "{err:#}");
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keys.txt");
        std::fs::write(&path, "text hi\r\nesc\r\n").unwrap();
        let script = load(&path).unwrap();
        assert_eq!(script.events.len(), 2);
    }
}
