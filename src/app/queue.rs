use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};
use tracing::debug;

use super::media::{
    is_audio_file, is_remote_uri, is_video_file, media_ref_for, media_reference,
    scan_media_files,
};
use super::resolve::{ResolveOptions, resolve_next_media};
use crate::db::{GlobalRecord, MediaEntry, MediaRef, RecordEntry, SeriesStore};
use crate::error::MediaError;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct EnqueueOptions<'a> {
    pub(crate) comment: Option<&'a str>,
    pub(crate) title: Option<&'a str>,
    /// Drop watched entries before the current position first.
    pub(crate) prune: bool,
}

/// Appends every path not already queued in `queue_dir` and returns the new entries.
pub(crate) fn enqueue_media(
    queue_dir: &Path,
    paths: &[String],
    options: EnqueueOptions<'_>,
) -> Result<Vec<MediaEntry>> {
    let mut store = SeriesStore::new();
    store.load(queue_dir)?;
    if options.prune {
        store.prune_before(store.next_index());
    }

    let mut queued = store.video_set();
    let mut added = Vec::new();
    for raw in paths {
        let mut entry = queue_entry(queue_dir, raw)?;
        if !queued.insert(entry.media.as_str().to_string()) {
            debug!(media = entry.media.as_str(), "already queued");
            continue;
        }
        entry.comment = options.comment.map(str::to_string);
        entry.title = options.title.map(str::to_string);
        store.append(entry.clone());
        added.push(entry);
    }

    if !added.is_empty() {
        store.persist(queue_dir)?;
    }
    Ok(added)
}

fn queue_entry(queue_dir: &Path, raw: &str) -> Result<MediaEntry> {
    if is_remote_uri(raw) {
        return Ok(MediaEntry::new(media_ref_for(raw.to_string())));
    }

    let path = Path::new(raw);
    if path.is_dir() {
        if SeriesStore::path_has_store(path) {
            return aliased_entry(queue_dir, path, raw);
        }
        let resolved = resolve_next_media(raw, ResolveOptions::default())?;
        return Ok(MediaEntry::new(media_ref_for(media_reference(
            queue_dir,
            &resolved.media,
        ))));
    }

    if path.is_file() && (is_video_file(raw) || is_audio_file(raw)) {
        return Ok(MediaEntry::new(media_ref_for(media_reference(queue_dir, raw))));
    }

    Err(MediaError::NotFound(path.to_path_buf()).into())
}

/// Queues the next entry of another series, pointing back at it through an alias.
fn aliased_entry(queue_dir: &Path, series_dir: &Path, raw: &str) -> Result<MediaEntry> {
    let mut series = SeriesStore::new();
    series.load(series_dir)?;
    if series.is_empty() {
        return Err(MediaError::NotFound(series_dir.to_path_buf()).into());
    }
    let index = series
        .next_index()
        .ok_or_else(|| MediaError::SeriesComplete(series_dir.to_path_buf()))?;
    let next = &series.entries()[index];
    if next.alias.is_some() {
        return Err(MediaError::NestedAlias(series_dir.to_path_buf()).into());
    }

    let mut entry = MediaEntry::new(next.media.clone());
    entry.alias = Some(media_reference(queue_dir, raw));
    Ok(entry)
}

/// Removes queued entries matching `paths`: files and URIs by media reference,
/// directories holding a series by alias, other directories by the single
/// media file they resolve to. Returns what was removed.
pub(crate) fn dequeue_media(queue_dir: &Path, paths: &[String]) -> Result<Vec<MediaEntry>> {
    if !queue_dir.is_dir() {
        return Err(MediaError::NotFound(queue_dir.to_path_buf()).into());
    }
    let mut store = SeriesStore::new();
    store.load(queue_dir)?;

    let mut direct = HashSet::new();
    let mut aliases = HashSet::new();
    for raw in paths {
        let path = Path::new(raw);
        if is_remote_uri(raw) || !path.is_dir() {
            direct.insert(raw.clone());
            direct.insert(media_reference(queue_dir, raw));
        } else if SeriesStore::path_has_store(path) {
            aliases.insert(media_reference(queue_dir, raw));
        } else {
            let resolved = resolve_next_media(raw, ResolveOptions::default())?;
            direct.insert(media_reference(queue_dir, &resolved.media));
        }
    }

    let should_drop = |entry: &MediaEntry| -> bool {
        direct.contains(entry.media.as_str())
            || entry
                .alias
                .as_ref()
                .is_some_and(|alias| aliases.contains(alias))
    };
    let removed = store
        .matching_entries(&should_drop)
        .cloned()
        .collect::<Vec<_>>();
    store.filter(|entry| !should_drop(entry));
    store.persist(queue_dir)?;
    Ok(removed)
}

/// Seeds a series in `dir` with one unwatched entry per video file, in name order.
pub(crate) fn create_from_directory(dir: &Path, force: bool) -> Result<SeriesStore> {
    if !dir.is_dir() {
        return Err(MediaError::NotFound(dir.to_path_buf()).into());
    }
    if SeriesStore::path_has_store(dir) && !force {
        return Err(MediaError::StoreExists(dir.to_path_buf()).into());
    }

    let mut store = SeriesStore::new();
    for name in scan_media_files(dir, true)? {
        store.append(MediaEntry::new(MediaRef::Video(name)));
    }
    store.persist(dir)?;
    Ok(store)
}

/// Global record entries whose media reference matches every term.
pub(crate) fn find_records(global: &GlobalRecord, terms: &[String]) -> Result<Vec<RecordEntry>> {
    let patterns = terms
        .iter()
        .map(|term| {
            RegexBuilder::new(term)
                .case_insensitive(true)
                .build()
                .with_context(|| format!("invalid search term '{term}'"))
        })
        .collect::<Result<Vec<Regex>>>()?;

    Ok(global
        .matching_entries(|record| {
            patterns
                .iter()
                .all(|pattern| pattern.is_match(record.media.as_str()))
        })
        .cloned()
        .collect())
}
