//! Configuration loading and parsing.
//!
//! Parses `caret.toml` (or an override path provided by the binary). Every
//! table is optional and every field carries a default, so a missing or
//! partial file yields a usable configuration. Unknown fields are ignored to
//! allow forward evolution. A file that fails to parse falls back to defaults
//! with a warning rather than aborting startup.
//!
//! The reveal margin is clamped at application time: the effective value is at
//! most `(h - 2) / 2` where `h` is the number of text rows of the view. The raw
//! parsed value is retained so a later viewport change can re-clamp.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::{fs, io, path::PathBuf, time::Duration};
use tracing::{info, warn};

pub const CONFIG_FILE_NAME: &str = "caret.toml";

/// Viewport facts needed to derive effective values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigContext {
    pub viewport_rows: u16,
    pub status_rows: u16,
}

impl ConfigContext {
    pub fn new(viewport_rows: u16, status_rows: u16) -> Self {
        Self {
            viewport_rows,
            status_rows,
        }
    }

    pub fn text_rows(&self) -> u16 {
        self.viewport_rows.saturating_sub(self.status_rows)
    }
}

/// Comment markers used by the comment toggling commands.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CommentConfig {
    pub line: String,
    pub block_start: String,
    pub block_end: String,
}

impl Default for CommentConfig {
    fn default() -> Self {
        Self {
            line: "//".to_string(),
            block_start: "/*".to_string(),
            block_end: "*/".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct UndoConfig {
    pub history_max: usize,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self { history_max: 200 }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RevealConfig {
    pub margin: u16,
    pub animate: bool,
    pub tick_ms: u64,
    pub steps: u32,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            margin: 1,
            animate: true,
            tick_ms: 20,
            steps: 5,
        }
    }
}

impl RevealConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SearchConfig {
    /// Wrap around the buffer once when find next/previous runs off its end.
    pub wrap: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { wrap: true }
    }
}

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigFile {
    pub comments: CommentConfig,
    pub undo: UndoConfig,
    pub reveal: RevealConfig,
    pub search: SearchConfig,
    /// Binding string -> action name. An empty action name unbinds the key.
    pub keys: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub raw: Option<String>,      // original file string (optional)
    pub file: ConfigFile,         // parsed (or default) data
    pub effective_margin: u16,    // clamped to viewport semantics
}

impl Default for Config {
    fn default() -> Self {
        let file = ConfigFile::default();
        Self {
            raw: None,
            effective_margin: file.reveal.margin,
            file,
        }
    }
}

/// Best-effort config path following platform conventions (XDG / AppData Roaming).
pub fn discover() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("caret").join(CONFIG_FILE_NAME);
    }
    PathBuf::from(CONFIG_FILE_NAME)
}

/// Load configuration from `path` (or the discovered location). A missing file
/// yields defaults; an unreadable one is an error.
pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let content = match fs::read_to_string(&path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => {
            return Err(e).with_context(|| format!("reading config {}", path.display()));
        }
    };
    Ok(parse(&content, &path.display().to_string()))
}

/// Parse a config document; parse errors fall back to defaults.
pub fn parse(content: &str, origin: &str) -> Config {
    match toml::from_str::<ConfigFile>(content) {
        Ok(file) => Config {
            raw: Some(content.to_string()),
            effective_margin: file.reveal.margin,
            file,
        },
        Err(e) => {
            warn!(target: "config", origin, error = %e, "config_parse_failed_using_defaults");
            Config::default()
        }
    }
}

impl Config {
    /// Apply viewport context to compute the clamped reveal margin.
    /// Returns the effective (possibly clamped) value.
    pub fn apply_context(&mut self, ctx: ConfigContext) -> u16 {
        let raw = self.file.reveal.margin;
        let text_rows = ctx.text_rows();
        let (clamped, max) = if text_rows <= 3 {
            (0, 0)
        } else {
            let max = (text_rows.saturating_sub(2)) / 2;
            (raw.min(max), max)
        };

        if clamped != raw {
            info!(
                target: "config",
                raw,
                clamped,
                max,
                text_rows,
                viewport_rows = ctx.viewport_rows,
                status_rows = ctx.status_rows,
                "reveal_margin_clamped"
            );
        }
        self.effective_margin = clamped;
        clamped
    }

    /// Recompute the effective margin after a viewport change. Returns
    /// `Some(new_margin)` when the effective value changed, else `None`.
    pub fn recompute_with_context(&mut self, ctx: ConfigContext) -> Option<u16> {
        let prev = self.effective_margin;
        let current = self.apply_context(ctx);
        if current != prev { Some(current) } else { None }
    }

    /// Key overrides as `(binding, action)` pairs in binding order.
    pub fn key_overrides(&self) -> impl Iterator<Item = (&str, &str)> {
        self.file
            .keys
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
