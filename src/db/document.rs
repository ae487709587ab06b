use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::MediaError;

/// Reads one JSON document; a missing file is `Ok(None)`.
pub(crate) fn load_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    let document = serde_json::from_str(&raw).map_err(|err| MediaError::MalformedDocument {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    Ok(Some(document))
}

/// Replaces the document at `path` wholesale via a sibling temp file and a rename.
pub(crate) fn save_document<T: Serialize + ?Sized>(path: &Path, document: &T) -> Result<()> {
    let mut json = serde_json::to_string_pretty(document)
        .with_context(|| format!("failed to serialize {}", path.display()))?;
    json.push('\n');
    replace_file(path, json.as_bytes())
}

/// Reads a JSON Lines sequence file; a missing file is an empty sequence.
pub(crate) fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    let mut records = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(line).map_err(|err| MediaError::MalformedDocument {
            path: path.to_path_buf(),
            message: format!("line {}: {err}", idx + 1),
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Appends one record without reading what is already there.
pub(crate) fn append_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut line = serde_json::to_string(record)
        .with_context(|| format!("failed to serialize record for {}", path.display()))?;
    line.push('\n');

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open {} for appending", path.display()))?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("failed to append to {}", path.display()))?;
    file.sync_data()
        .with_context(|| format!("failed to flush {}", path.display()))?;
    Ok(())
}

fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent_dir(path)?;
    let file_name = path
        .file_name()
        .with_context(|| format!("{} has no file name", path.display()))?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    {
        let mut file = File::create(&tmp_path)
            .with_context(|| format!("failed to create {}", tmp_path.display()))?;
        file.write_all(bytes)
            .with_context(|| format!("failed to write {}", tmp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("failed to flush {}", tmp_path.display()))?;
    }
    fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "failed to replace {} with {}",
            path.display(),
            tmp_path.display()
        )
    })?;
    Ok(())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(())
}
