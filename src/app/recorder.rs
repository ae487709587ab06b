use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::db::{
    AliasTarget, GlobalRecord, Marker, MediaEntry, MediaRef, NextEntry, RecordEntry, SeriesStore,
    Viewing,
};
use crate::error::MediaError;

/// Everything known about one finished playback session.
#[derive(Debug, Clone)]
pub(crate) struct SessionRecord<'a> {
    /// The queue entry that was next before playback began.
    pub(crate) next: Option<&'a NextEntry>,
    /// Reference that was actually played.
    pub(crate) media: &'a str,
    /// Directory or path the user asked to play.
    pub(crate) path: &'a Path,
    pub(crate) start: Marker,
    pub(crate) end: Marker,
    pub(crate) duration: Option<String>,
    pub(crate) comment: Option<&'a str>,
    pub(crate) title: Option<&'a str>,
    pub(crate) audio: bool,
    pub(crate) skip_global: bool,
}

#[derive(Debug)]
pub(crate) enum SeriesUpdate {
    Recorded,
    NotQueued,
    Skipped(MediaError),
}

#[derive(Debug)]
pub(crate) struct RecordOutcome {
    pub(crate) global: bool,
    pub(crate) series: SeriesUpdate,
    pub(crate) alias: SeriesUpdate,
}

/// Writes the session to the global record, then to the queue it came from.
///
/// The queue is reloaded from disk and only updated when its next entry is
/// still the one that was played.
pub(crate) fn record_session(
    global: &GlobalRecord,
    session: &SessionRecord<'_>,
) -> Result<RecordOutcome> {
    let entry = session.next.map(|next| &next.entry);
    let start = session.start.to_string();
    let end = session.end.to_string();

    let record = RecordEntry {
        media: match entry {
            Some(entry) => entry.media.with_media(session.media.to_string()),
            None if session.audio => MediaRef::Audio(session.media.to_string()),
            None => MediaRef::Video(session.media.to_string()),
        },
        duration: session.duration.clone(),
        start: start.clone(),
        end: end.clone(),
        comment: session
            .comment
            .map(str::to_string)
            .or_else(|| entry.and_then(|entry| entry.comment.clone())),
        title: session
            .title
            .map(str::to_string)
            .or_else(|| entry.and_then(|entry| entry.title.clone())),
    };

    let global_recorded = if session.skip_global {
        false
    } else {
        global.append(&record)?;
        true
    };

    let Some(next) = session.next else {
        return Ok(RecordOutcome {
            global: global_recorded,
            series: SeriesUpdate::NotQueued,
            alias: SeriesUpdate::NotQueued,
        });
    };

    let viewing = Viewing {
        start,
        end,
        comment: None,
    };

    let series = record_in_series(session, &next.entry, &viewing)?;
    let alias = match (&series, &next.alias) {
        (SeriesUpdate::Recorded, Some(target)) => {
            record_in_alias(target, &next.entry, session.duration.as_deref(), &viewing)?
        }
        _ => SeriesUpdate::NotQueued,
    };

    Ok(RecordOutcome {
        global: global_recorded,
        series,
        alias,
    })
}

fn record_in_series(
    session: &SessionRecord<'_>,
    expected: &MediaEntry,
    viewing: &Viewing,
) -> Result<SeriesUpdate> {
    let dir = session.path;
    let mut store = SeriesStore::new();
    if !store.load(dir)? {
        return Ok(skipped(dir));
    }
    let Some(index) = matching_next(&store, expected) else {
        return Ok(skipped(dir));
    };
    let Some(entry) = store.entry_mut(index) else {
        return Ok(skipped(dir));
    };

    update_duration(entry, session.duration.as_deref());
    if let Some(comment) = session.comment {
        entry.comment = Some(comment.to_string());
    }
    if let Some(title) = session.title {
        entry.title = Some(title.to_string());
    }
    entry.viewings.push(viewing.clone());

    store.persist(dir)?;
    info!(dir = %dir.display(), media = expected.media.as_str(), "recorded viewing");
    Ok(SeriesUpdate::Recorded)
}

/// Advances the aliased directory's own store in lockstep, keyed by media.
/// Both the snapshot taken before playback and the store on disk must still
/// have the played media next.
fn record_in_alias(
    target: &AliasTarget,
    expected: &MediaEntry,
    duration: Option<&str>,
    viewing: &Viewing,
) -> Result<SeriesUpdate> {
    let dir = target.dir.as_path();
    if matching_next(&target.store, expected).is_none() {
        return Ok(skipped(dir));
    }
    let mut store = SeriesStore::new();
    if !store.load(dir)? {
        return Ok(skipped(dir));
    }
    let Some(entry) = matching_next(&store, expected).and_then(|index| store.entry_mut(index))
    else {
        return Ok(skipped(dir));
    };

    update_duration(entry, duration);
    entry.viewings.push(viewing.clone());
    store.persist(dir)?;
    info!(dir = %dir.display(), media = expected.media.as_str(), "recorded aliased viewing");
    Ok(SeriesUpdate::Recorded)
}

fn matching_next(store: &SeriesStore, expected: &MediaEntry) -> Option<usize> {
    store
        .next_index()
        .filter(|&index| store.entries()[index].media.as_str() == expected.media.as_str())
}

fn update_duration(entry: &mut MediaEntry, duration: Option<&str>) {
    if let Some(duration) = duration
        && entry.duration.as_deref() != Some(duration)
    {
        entry.duration = Some(duration.to_string());
    }
}

fn skipped(dir: &Path) -> SeriesUpdate {
    let err = MediaError::ConcurrentModification(dir.to_path_buf());
    warn!(dir = %dir.display(), "next entry changed during playback");
    eprintln!("Warning: {err}");
    SeriesUpdate::Skipped(err)
}
