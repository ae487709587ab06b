use std::path::Path;

use anyhow::Result;

use super::media::{is_remote_uri, scan_media_files};
use crate::db::{MediaEntry, NextEntry, SeriesStore};
use crate::error::MediaError;

#[derive(Debug, Clone, Copy)]
pub(crate) struct ResolveOptions {
    /// Only consider recognized video containers when scanning a directory.
    pub(crate) video_only: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self { video_only: true }
    }
}

/// What to play for a user-supplied path, and the queue entry it came from.
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    pub(crate) media: String,
    pub(crate) next: Option<NextEntry>,
}

impl Resolved {
    fn direct(media: impl Into<String>) -> Self {
        Self {
            media: media.into(),
            next: None,
        }
    }

    pub(crate) fn entry(&self) -> Option<&MediaEntry> {
        self.next.as_ref().map(|next| &next.entry)
    }
}

/// Decides what `path` plays: a URI or file as given, the next queued entry
/// of a directory holding a series, or the single media file in a directory.
pub(crate) fn resolve_next_media(path: &str, options: ResolveOptions) -> Result<Resolved> {
    if is_remote_uri(path) {
        return Ok(Resolved::direct(path));
    }

    let fs_path = Path::new(path);
    if fs_path.is_dir() {
        if SeriesStore::path_has_store(fs_path) {
            return resolve_from_series(fs_path);
        }
        return resolve_single_file(fs_path, options);
    }

    if fs_path.is_file() {
        return Ok(Resolved::direct(path));
    }

    Err(MediaError::NotFound(fs_path.to_path_buf()).into())
}

fn resolve_from_series(dir: &Path) -> Result<Resolved> {
    let mut store = SeriesStore::new();
    store.load(dir)?;
    let next = store
        .next(dir)?
        .ok_or_else(|| MediaError::NotFound(dir.to_path_buf()))?;
    Ok(Resolved {
        media: entry_media_path(dir, &next.entry),
        next: Some(next),
    })
}

fn resolve_single_file(dir: &Path, options: ResolveOptions) -> Result<Resolved> {
    let mut candidates = scan_media_files(dir, options.video_only)?;
    match candidates.len() {
        0 => Err(MediaError::NotFound(dir.to_path_buf()).into()),
        1 => {
            let name = candidates.remove(0);
            Ok(Resolved::direct(dir.join(name).to_string_lossy()))
        }
        _ => Err(MediaError::AmbiguousCandidate {
            dir: dir.to_path_buf(),
            candidates,
        }
        .into()),
    }
}

/// Playable location of a queued entry in `dir`. An alias names a
/// subdirectory the media file lives in; URIs are used verbatim.
pub(crate) fn entry_media_path(dir: &Path, entry: &MediaEntry) -> String {
    let media = entry.media.as_str();
    if is_remote_uri(media) {
        return media.to_string();
    }
    let mut path = dir.to_path_buf();
    if let Some(alias) = entry.alias.as_deref() {
        path.push(alias);
    }
    path.push(media);
    path.to_string_lossy().into_owned()
}
