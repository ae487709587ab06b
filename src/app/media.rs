use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::db::MediaRef;

const REMOTE_PREFIXES: [&str; 4] = ["http://", "https://", "ytdl://", "spotify:"];
const AUDIO_URI_PREFIX: &str = "spotify:";

const VIDEO_EXTENSIONS: [&str; 12] = [
    "mkv", "avi", "mpg", "mp4", "mpeg", "ogv", "wmv", "flv", "m4v", "iso", "mov", "webm",
];
const AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "flac", "ogg", "opus", "m4a", "wav"];

pub(crate) fn is_remote_uri(raw: &str) -> bool {
    REMOTE_PREFIXES.iter().any(|prefix| raw.starts_with(prefix))
}

pub(crate) fn is_remote_track(raw: &str) -> bool {
    raw.starts_with(AUDIO_URI_PREFIX)
}

fn extension_in(name: &str, allowed: &[&str]) -> bool {
    let Some((_, ext)) = name.rsplit_once('.') else {
        return false;
    };
    allowed.iter().any(|candidate| candidate.eq_ignore_ascii_case(ext))
}

pub(crate) fn is_video_file(name: &str) -> bool {
    extension_in(name, &VIDEO_EXTENSIONS)
}

pub(crate) fn is_audio_file(name: &str) -> bool {
    extension_in(name, &AUDIO_EXTENSIONS)
}

/// Wraps a stored reference in the right kind for what it points at.
pub(crate) fn media_ref_for(reference: String) -> MediaRef {
    if is_remote_track(&reference) || is_audio_file(&reference) {
        MediaRef::Audio(reference)
    } else {
        MediaRef::Video(reference)
    }
}

/// How a queue in `queue_dir` refers to `raw`: URIs verbatim, paths inside the
/// queue directory relative to it, anything else as an absolute path.
pub(crate) fn media_reference(queue_dir: &Path, raw: &str) -> String {
    if is_remote_uri(raw) {
        return raw.to_string();
    }
    let target = normalize_path(Path::new(raw));
    let base = normalize_path(queue_dir);
    match target.strip_prefix(&base) {
        Ok(relative) if !relative.as_os_str().is_empty() => {
            relative.to_string_lossy().into_owned()
        }
        _ => target.to_string_lossy().into_owned(),
    }
}

/// Absolute form of `path`, resolving symlinks for whatever part exists.
pub(crate) fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name())
        && let Ok(parent) = parent.canonicalize()
    {
        return parent.join(name);
    }
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Names of the regular files directly inside `dir`, sorted, skipping hidden
/// files. With `video_only`, only recognized video containers are kept.
pub(crate) fn scan_media_files(dir: &Path, video_only: bool) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("failed to scan {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || (video_only && !is_video_file(&name)) {
            continue;
        }
        names.push(name);
    }
    Ok(names)
}
