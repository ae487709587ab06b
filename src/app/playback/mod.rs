mod input;
mod mpv;
mod options;
mod process;
mod remote;

use anyhow::Result;
use chrono::{DateTime, Local};

use crate::db::format_duration;

pub(crate) use input::KeyRelay;
pub(crate) use mpv::{MpvConfig, MpvPlayer};
pub(crate) use options::{WatchOptions, load_watch_options, run_hook};
pub(crate) use process::with_sigint_ignored;
pub(crate) use remote::{RemoteTrack, RemoteTrackPlayer};

#[cfg(test)]
pub(crate) use input::key_name;
#[cfg(test)]
pub(crate) use mpv::{MpvEvent, parse_event};
#[cfg(test)]
pub(crate) use remote::{parse_metadata, track_id_for};

/// Receives key names (`q`, `SPACE`, `LEFT`, ...) relayed from the terminal.
pub(crate) type KeyHandler = Box<dyn FnMut(&str) + Send>;

/// A component that can play one media reference at a time.
pub(crate) trait Player {
    fn play(&mut self, media: &str) -> Result<()>;

    fn wait_until_playing(&mut self) -> Result<()>;

    /// Total length in seconds, or `None` when playback ended before it was known.
    fn probe_duration(&mut self) -> Result<Option<f64>>;

    fn seek(&mut self, seconds: f64) -> Result<()>;

    fn show_text(&mut self, _text: &str) -> Result<()> {
        Ok(())
    }

    fn wait_for_completion(&mut self) -> Result<()>;

    /// Where playback stopped, `None` when it ran to the end.
    fn current_position(&mut self) -> Result<Option<f64>>;

    fn key_handler(&self) -> Option<KeyHandler>;
}

#[derive(Debug, Clone)]
pub(crate) struct PlaybackRequest<'a> {
    pub(crate) media: &'a str,
    pub(crate) display: &'a str,
    pub(crate) start_position: f64,
}

#[derive(Debug, Clone)]
pub(crate) struct PlaybackOutcome {
    pub(crate) started_at: DateTime<Local>,
    pub(crate) start_position: f64,
    pub(crate) ended_at: DateTime<Local>,
    pub(crate) position: f64,
    pub(crate) duration: f64,
}

/// Plays one session to the end and reports how far it got.
///
/// Returns `Ok(None)` when playback stopped before the player knew the
/// duration, in which case there is nothing worth recording.
pub(crate) fn play_session<P: Player>(
    player: &mut P,
    request: &PlaybackRequest<'_>,
    relay_keys: bool,
) -> Result<Option<PlaybackOutcome>> {
    let started_at = Local::now();
    player.play(request.media)?;
    player.wait_until_playing()?;
    let Some(duration) = player.probe_duration()? else {
        return Ok(None);
    };

    println!("start: {}", request.media);
    if request.start_position > 0.0 {
        player.seek(request.start_position)?;
    }
    let formatted_duration = format_duration(duration);
    player.show_text(&format!(
        "{} ({} / {})",
        request.display,
        format_duration(request.start_position),
        formatted_duration
    ))?;

    let relay = match player.key_handler() {
        Some(handler) if relay_keys => KeyRelay::start(handler)?,
        _ => None,
    };
    let completion = player.wait_for_completion();
    drop(relay);
    completion?;

    let ended_at = Local::now();
    let position = player.current_position()?.unwrap_or(duration);
    println!();
    println!(
        "end: {}/{}",
        format_duration(position),
        formatted_duration
    );

    Ok(Some(PlaybackOutcome {
        started_at,
        start_position: request.start_position,
        ended_at,
        position,
        duration,
    }))
}
