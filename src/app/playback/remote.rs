use std::io::ErrorKind;
use std::process::Command as ProcessCommand;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

use super::{KeyHandler, Player};
use crate::error::MediaError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const END_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// The remote player rewinds when it moves on; positions this close to the
/// start at the end of a track mean it played out.
const MIN_FINAL_POSITION_MICROS: u64 = 2_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrackMetadata {
    pub(crate) track_id: String,
    pub(crate) length_micros: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PlaybackStatus {
    Playing,
    Paused,
    Other(String),
}

impl PlaybackStatus {
    fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Playing" => Self::Playing,
            "Paused" => Self::Paused,
            other => Self::Other(other.to_string()),
        }
    }
}

/// Parses `<trackid>\t<length>`. The length stays empty until the player
/// knows it, which reads as zero.
pub(crate) fn parse_metadata(raw: &str) -> Option<TrackMetadata> {
    let (track_id, length) = raw.trim_end_matches(['\r', '\n']).split_once('\t')?;
    let length_micros = match length.trim() {
        "" => 0,
        value => value.parse::<u64>().ok()?,
    };
    Some(TrackMetadata {
        track_id: track_id.trim().to_string(),
        length_micros,
    })
}

/// MPRIS track id the player reports for a `spotify:` URI.
pub(crate) fn track_id_for(uri: &str) -> String {
    format!("/com/{}", uri.replace(':', "/"))
}

/// An MPRIS media player controlled through `playerctl`.
#[derive(Debug, Clone)]
pub(crate) struct RemoteTrack {
    player: String,
}

impl RemoteTrack {
    pub(crate) fn new(player: String) -> Self {
        Self { player }
    }

    fn playerctl(&self, args: &[&str]) -> Result<String> {
        let output = match ProcessCommand::new("playerctl")
            .arg("--player")
            .arg(&self.player)
            .args(args)
            .output()
        {
            Ok(output) => output,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(MediaError::ConfigurationMissing(format!(
                    "playerctl is required to control {}",
                    self.player
                ))
                .into());
            }
            Err(err) => return Err(err).context("failed to launch playerctl"),
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "playerctl {} failed: {}",
                args.join(" "),
                stderr.trim()
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    pub(crate) fn open_track(&self, uri: &str) -> Result<()> {
        self.playerctl(&["open", uri]).map(drop)
    }

    /// Stopping alone only pauses the current track, so skip past it first.
    pub(crate) fn stop(&self) -> Result<()> {
        self.playerctl(&["next"])?;
        self.playerctl(&["stop"]).map(drop)
    }

    pub(crate) fn toggle_pause(&self) -> Result<()> {
        self.playerctl(&["play-pause"]).map(drop)
    }

    pub(crate) fn metadata(&self) -> Result<TrackMetadata> {
        let raw = self.playerctl(&[
            "metadata",
            "--format",
            "{{mpris:trackid}}\t{{mpris:length}}",
        ])?;
        parse_metadata(&raw).ok_or_else(|| anyhow!("unexpected playerctl metadata: {raw}"))
    }

    pub(crate) fn playback_status(&self) -> Result<PlaybackStatus> {
        Ok(PlaybackStatus::parse(&self.playerctl(&["status"])?))
    }

    pub(crate) fn position(&self) -> Result<u64> {
        let raw = self.playerctl(&["position"])?;
        let seconds = raw
            .trim()
            .parse::<f64>()
            .with_context(|| format!("unexpected playerctl position: {raw}"))?;
        Ok((seconds * 1_000_000.0) as u64)
    }

    fn set_position(&self, seconds: f64) -> Result<()> {
        self.playerctl(&["position", &format!("{seconds:.3}")])
            .map(drop)
    }
}

/// Plays `spotify:` URIs on a remote MPRIS player.
pub(crate) struct RemoteTrackPlayer {
    track: RemoteTrack,
    track_id: String,
}

impl RemoteTrackPlayer {
    pub(crate) fn new(track: RemoteTrack) -> Self {
        Self {
            track,
            track_id: String::new(),
        }
    }
}

impl Player for RemoteTrackPlayer {
    fn play(&mut self, media: &str) -> Result<()> {
        self.track.open_track(media)?;
        self.track_id = track_id_for(media);
        Ok(())
    }

    fn wait_until_playing(&mut self) -> Result<()> {
        loop {
            if self.track.metadata()?.track_id == self.track_id
                && self.track.playback_status()? == PlaybackStatus::Playing
            {
                return Ok(());
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn probe_duration(&mut self) -> Result<Option<f64>> {
        // The length shows up a little after the track starts.
        loop {
            let metadata = self.track.metadata()?;
            if metadata.track_id != self.track_id {
                return Ok(None);
            }
            if metadata.length_micros > 0 {
                return Ok(Some(metadata.length_micros as f64 / 1_000_000.0));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        self.track.set_position(seconds)
    }

    fn wait_for_completion(&mut self) -> Result<()> {
        let mut status = PlaybackStatus::Playing;
        loop {
            if self.track.metadata()?.track_id != self.track_id {
                break;
            }
            let current = self.track.playback_status()?;
            if current != status {
                match current {
                    PlaybackStatus::Paused => println!("pause: paused"),
                    PlaybackStatus::Playing => println!("pause: resumed"),
                    PlaybackStatus::Other(ref other) => {
                        debug!(status = other.as_str(), "remote playback stopped");
                        break;
                    }
                }
                status = current;
            }
            thread::sleep(END_POLL_INTERVAL);
        }
        // The remote player moves on to the next track by itself.
        self.track.stop()
    }

    fn current_position(&mut self) -> Result<Option<f64>> {
        let position = self.track.position()?;
        if position < MIN_FINAL_POSITION_MICROS {
            return Ok(None);
        }
        Ok(Some(position as f64 / 1_000_000.0))
    }

    fn key_handler(&self) -> Option<KeyHandler> {
        let track = self.track.clone();
        Some(Box::new(move |key: &str| {
            let result = match key {
                "q" => track.stop(),
                "SPACE" => track.toggle_pause(),
                _ => Ok(()),
            };
            if let Err(err) = result {
                debug!(%err, key, "remote key action failed");
            }
        }))
    }
}
