mod media;
mod playback;
mod queue;
mod recorder;
mod resolve;


use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use tracing::debug;

use crate::cli::{Cli, Command, EnqueueArgs, PrintArgs, WatchArgs};
use crate::db::{GlobalRecord, Marker, MarkerDate, MarkerOffset, format_duration};
use crate::error::MediaError;
use crate::paths::{global_record_path, resolve_mpv_bin, resolve_remote_player};

use self::media::{is_remote_track, is_remote_uri, media_ref_for};
use self::playback::{
    MpvConfig, MpvPlayer, PlaybackOutcome, PlaybackRequest, RemoteTrack, RemoteTrackPlayer,
    WatchOptions, load_watch_options, play_session, run_hook, with_sigint_ignored,
};
use self::queue::{
    EnqueueOptions, create_from_directory, dequeue_media, enqueue_media, find_records,
};
use self::recorder::{RecordOutcome, SeriesUpdate, SessionRecord, record_session};
use self::resolve::{ResolveOptions, Resolved, resolve_next_media};

const CURRENT_DIR: &str = ".";

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Command::Watch(args)) => run_watch(&args)?,
        Some(Command::Night(mut args)) => {
            args.night_mode = true;
            run_watch(&args)?
        }
        Some(Command::Dryrun(mut args)) => {
            args.dont_record = true;
            run_watch(&args)?
        }
        Some(Command::Listen { tracks }) => run_watch(&WatchArgs {
            paths: tracks,
            ..WatchArgs::default()
        })?,
        Some(Command::Enqueue(args)) => run_enqueue(&args)?,
        Some(Command::Dequeue { queue_path, paths }) => run_dequeue(&queue_path, &paths)?,
        Some(Command::Print(args)) => run_print(&args)?,
        Some(Command::Create { paths, force }) => run_create(&paths, force)?,
        Some(Command::Find {
            search_terms,
            quiet,
        }) => run_find(&search_terms, quiet)?,
        Some(Command::Record { path, comment }) => run_record(&path, &comment)?,
        None => run_watch(&WatchArgs::default())?,
    }

    Ok(())
}

fn paths_or_current_dir(paths: &[String]) -> Vec<String> {
    if paths.is_empty() {
        vec![CURRENT_DIR.to_string()]
    } else {
        paths.to_vec()
    }
}

fn open_global_record() -> Result<GlobalRecord> {
    Ok(GlobalRecord::at(global_record_path()?))
}

fn run_watch(args: &WatchArgs) -> Result<()> {
    let global = open_global_record()?;
    for path in paths_or_current_dir(&args.paths) {
        watch_path(&global, &path, args)?;
    }
    Ok(())
}

fn watch_path(global: &GlobalRecord, path: &str, args: &WatchArgs) -> Result<()> {
    let resolved = resolve_next_media(path, ResolveOptions::default())?;
    let entry = resolved.entry();
    let display = args
        .title
        .as_deref()
        .or_else(|| entry.and_then(|entry| entry.title.as_deref()))
        .map(str::to_string)
        .unwrap_or_else(|| display_name(&resolved.media));
    let request = PlaybackRequest {
        media: &resolved.media,
        display: &display,
        start_position: entry.and_then(|entry| entry.resume_position()).unwrap_or(0.0),
    };

    let outcome = if is_remote_track(&resolved.media) {
        let mut player = RemoteTrackPlayer::new(RemoteTrack::new(resolve_remote_player()));
        with_sigint_ignored(|| play_session(&mut player, &request, true))?
    } else {
        play_with_mpv(&request, args)?
    };

    let Some(outcome) = outcome else {
        println!("Playback ended before it started, nothing recorded.");
        return Ok(());
    };
    if args.dont_record {
        debug!(media = resolved.media.as_str(), "dry run, not recording");
        return Ok(());
    }

    let session = SessionRecord {
        next: resolved.next.as_ref(),
        media: &resolved.media,
        path: Path::new(path),
        start: Marker::at(outcome.started_at, outcome.start_position),
        end: Marker::at(outcome.ended_at, outcome.position),
        duration: Some(format_duration(outcome.duration)),
        comment: args.comment.as_deref(),
        title: args.title.as_deref(),
        audio: media_ref_for(resolved.media.clone()).is_audio(),
        skip_global: false,
    };
    let recorded = record_session(global, &session)?;
    report_recorded(path, &recorded);
    Ok(())
}

fn play_with_mpv(
    request: &PlaybackRequest<'_>,
    args: &WatchArgs,
) -> Result<Option<PlaybackOutcome>> {
    let options = if is_remote_uri(request.media) {
        WatchOptions::default()
    } else {
        load_watch_options(Path::new(request.media))?
    };
    if let Some(before) = options.before.as_deref() {
        run_hook(before)?;
    }

    let mut player = MpvPlayer::new(MpvConfig {
        bin: resolve_mpv_bin(),
        night_mode: args.night_mode,
        sub_file: args.sub_file.clone(),
        options: options.player_args(),
    });
    let outcome = with_sigint_ignored(|| play_session(&mut player, request, true));
    drop(player);

    if let Some(after) = options.after.as_deref() {
        run_hook(after)?;
    }
    outcome
}

fn display_name(media: &str) -> String {
    if is_remote_uri(media) {
        return media.to_string();
    }
    Path::new(media)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| media.to_string())
}

fn report_recorded(path: &str, outcome: &RecordOutcome) {
    if matches!(outcome.series, SeriesUpdate::Recorded) {
        println!("Updated series: {path}");
    }
    if matches!(outcome.alias, SeriesUpdate::Recorded) {
        println!("Updated aliased series for: {path}");
    }
    if !outcome.global {
        debug!(path, "global record not written");
    }
}

fn run_enqueue(args: &EnqueueArgs) -> Result<()> {
    let added = enqueue_media(
        Path::new(&args.queue_path),
        &args.paths,
        EnqueueOptions {
            comment: args.comment.as_deref(),
            title: args.title.as_deref(),
            prune: args.prune,
        },
    )?;
    if added.is_empty() {
        println!("Nothing new to enqueue.");
    }
    for entry in added {
        match entry.alias.as_deref() {
            Some(alias) => println!("enqueued: {} (from {alias})", entry.media.as_str()),
            None => println!("enqueued: {}", entry.media.as_str()),
        }
    }
    Ok(())
}

fn run_dequeue(queue_path: &str, paths: &[String]) -> Result<()> {
    let removed = dequeue_media(Path::new(queue_path), paths)?;
    if removed.is_empty() {
        println!("Nothing matched in {queue_path}.");
    }
    for entry in removed {
        println!("dequeued: {}", entry.media.as_str());
    }
    Ok(())
}

fn run_print(args: &PrintArgs) -> Result<()> {
    for_each_printable(args, |resolved| print_resolved(resolved, args))
}

/// Resolves each print path in turn; with `--ignore-errors`, paths with
/// nothing to play are skipped instead of failing the run.
fn for_each_printable<F>(args: &PrintArgs, mut visit: F) -> Result<()>
where
    F: FnMut(&Resolved) -> Result<()>,
{
    let options = ResolveOptions {
        video_only: !args.no_extension_filter,
    };
    for path in paths_or_current_dir(&args.paths) {
        let resolved = match resolve_next_media(&path, options) {
            Ok(resolved) => resolved,
            Err(err) if args.ignore_errors && is_skippable(&err) => {
                debug!(path = path.as_str(), %err, "skipping");
                continue;
            }
            Err(err) => return Err(err),
        };
        visit(&resolved)?;
    }
    Ok(())
}

fn is_skippable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<MediaError>()
        .is_some_and(MediaError::is_skippable)
}

fn print_resolved(resolved: &Resolved, args: &PrintArgs) -> Result<()> {
    if args.mtime && !is_remote_uri(&resolved.media) {
        let modified = fs::metadata(&resolved.media)
            .and_then(|metadata| metadata.modified())
            .with_context(|| format!("failed to read mtime of {}", resolved.media))?;
        let modified: DateTime<Local> = modified.into();
        println!("{} {}", modified.format("%Y/%m/%d %H:%M:%S"), resolved.media);
    } else {
        println!("{}", resolved.media);
    }

    if args.verbose
        && let Some(entry) = resolved.entry()
    {
        let json = serde_json::to_string_pretty(entry).context("failed to render entry")?;
        println!("{json}");
    }
    Ok(())
}

fn run_create(paths: &[String], force: bool) -> Result<()> {
    for path in paths_or_current_dir(paths) {
        let store = create_from_directory(Path::new(&path), force)?;
        println!("Created series of {} videos in {path}", store.len());
    }
    Ok(())
}

fn run_find(terms: &[String], quiet: bool) -> Result<()> {
    let mut global = open_global_record()?;
    global.load()?;
    let found = find_records(&global, terms)?;
    if found.is_empty() {
        println!("No matches in {}.", global.path().display());
    }
    for record in found {
        if quiet {
            println!("{}", record.media.as_str());
        } else {
            let json = serde_json::to_string_pretty(&record).context("failed to render record")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn run_record(path: &str, comment: &str) -> Result<()> {
    let global = open_global_record()?;
    let (media, recorded) = record_finished(&global, path, comment)?;
    println!("recorded: {media}");
    report_recorded(path, &recorded);
    Ok(())
}

/// Marks the next media of `path` as watched to the end without playing it.
fn record_finished(
    global: &GlobalRecord,
    path: &str,
    comment: &str,
) -> Result<(String, RecordOutcome)> {
    let resolved = resolve_next_media(path, ResolveOptions::default())?;
    let session = SessionRecord {
        next: resolved.next.as_ref(),
        media: &resolved.media,
        path: Path::new(path),
        start: Marker {
            date: MarkerDate::Sometime,
            offset: MarkerOffset::Seconds(0.0),
        },
        end: Marker {
            date: MarkerDate::At(Local::now()),
            offset: MarkerOffset::Finished,
        },
        duration: resolved.entry().and_then(|entry| entry.duration.clone()),
        comment: Some(comment),
        title: None,
        audio: media_ref_for(resolved.media.clone()).is_audio(),
        skip_global: false,
    };
    let recorded = record_session(global, &session)?;
    Ok((resolved.media, recorded))
}
