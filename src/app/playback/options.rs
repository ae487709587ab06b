use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command as ProcessCommand;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use crate::db::load_document;
use crate::paths::WATCH_OPTIONS_FILE;

/// Per-directory playback settings read from `.watch-options.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub(crate) struct WatchOptions {
    /// Shell command run before playback starts.
    #[serde(default)]
    pub(crate) before: Option<String>,
    /// Shell command run once playback ends.
    #[serde(default)]
    pub(crate) after: Option<String>,
    /// Everything else is handed to the player as `--name=value`.
    #[serde(flatten)]
    pub(crate) player: BTreeMap<String, Value>,
}

impl WatchOptions {
    fn merge(&mut self, other: WatchOptions) {
        if other.before.is_some() {
            self.before = other.before;
        }
        if other.after.is_some() {
            self.after = other.after;
        }
        self.player.extend(other.player);
    }

    pub(crate) fn player_args(&self) -> Vec<String> {
        self.player
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    Value::String(text) => text.clone(),
                    Value::Bool(true) => "yes".to_string(),
                    Value::Bool(false) => "no".to_string(),
                    other => other.to_string(),
                };
                format!("--{name}={value}")
            })
            .collect()
    }
}

/// Options for a media file: the grandparent directory's file first, then the
/// media directory's own file on top.
pub(crate) fn load_watch_options(media_path: &Path) -> Result<WatchOptions> {
    let Some(media_dir) = media_path.parent() else {
        return Ok(WatchOptions::default());
    };

    let mut options = WatchOptions::default();
    for candidate in [
        media_dir.join("..").join(WATCH_OPTIONS_FILE),
        media_dir.join(WATCH_OPTIONS_FILE),
    ] {
        if let Some(found) = load_document::<WatchOptions>(&candidate)? {
            options.merge(found);
        }
    }
    Ok(options)
}

pub(crate) fn run_hook(command: &str) -> Result<()> {
    let status = ProcessCommand::new("sh")
        .arg("-c")
        .arg(command)
        .status()
        .with_context(|| format!("failed to run hook '{command}'"))?;
    if !status.success() {
        eprintln!("Warning: hook '{command}' exited with status: {status}");
    }
    Ok(())
}
