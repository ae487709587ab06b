//! mpv run as a child process and driven over its JSON IPC socket.

use std::env;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::process::{Child, Command as ProcessCommand, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use tracing::debug;

use super::process::restore_child_signals;
use super::{KeyHandler, Player};

const CONNECT_ATTEMPTS: u32 = 50;
const CONNECT_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Default)]
pub(crate) struct MpvConfig {
    pub(crate) bin: PathBuf,
    /// Normalise loudness for quiet late-night viewing.
    pub(crate) night_mode: bool,
    pub(crate) sub_file: Option<String>,
    /// Extra `--name=value` options from watch option files.
    pub(crate) options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum MpvEvent {
    Duration(f64),
    Position(f64),
    Pause(bool),
    EndFile { eof: bool },
    Closed,
}

pub(crate) fn parse_event(line: &str) -> Option<MpvEvent> {
    let msg: Value = serde_json::from_str(line).ok()?;
    match msg.get("event")?.as_str()? {
        "property-change" => {
            let data = msg.get("data")?;
            match msg.get("name")?.as_str()? {
                "duration" => data.as_f64().map(MpvEvent::Duration),
                "time-pos" => data.as_f64().map(MpvEvent::Position),
                "pause" => data.as_bool().map(MpvEvent::Pause),
                _ => None,
            }
        }
        "end-file" => Some(MpvEvent::EndFile {
            eof: msg.get("reason").and_then(Value::as_str) == Some("eof"),
        }),
        "shutdown" => Some(MpvEvent::Closed),
        _ => None,
    }
}

pub(crate) struct MpvPlayer {
    config: MpvConfig,
    socket_path: PathBuf,
    process: Option<Child>,
    writer: Option<Arc<Mutex<UnixStream>>>,
    events: Option<Receiver<MpvEvent>>,
    last_position: Option<f64>,
    reached_eof: bool,
    finished: bool,
    pause_seen: bool,
}

impl MpvPlayer {
    pub(crate) fn new(config: MpvConfig) -> Self {
        let socket_path = env::temp_dir().join(format!("babies-mpv-{}.sock", std::process::id()));
        Self {
            config,
            socket_path,
            process: None,
            writer: None,
            events: None,
            last_position: None,
            reached_eof: false,
            finished: false,
            pause_seen: false,
        }
    }

    fn build_command(&self, media: &str) -> ProcessCommand {
        let mut cmd = ProcessCommand::new(&self.config.bin);
        cmd.arg(format!("--input-ipc-server={}", self.socket_path.display()))
            .arg("--input-terminal=no")
            .arg("--msg-level=all=warn")
            .arg("--fullscreen")
            .arg("--osc=yes");
        if self.config.night_mode {
            cmd.arg("--af=dynaudnorm");
        }
        if let Some(sub_file) = &self.config.sub_file {
            cmd.arg(format!("--sub-file={sub_file}"));
        }
        cmd.args(&self.config.options);
        cmd.arg("--").arg(media);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        restore_child_signals(&mut cmd);
        cmd
    }

    fn connect(&mut self) -> Result<UnixStream> {
        for _ in 0..CONNECT_ATTEMPTS {
            if let Ok(stream) = UnixStream::connect(&self.socket_path) {
                return Ok(stream);
            }
            if let Some(child) = self.process.as_mut()
                && let Some(status) = child.try_wait().context("failed waiting on mpv")?
            {
                return Err(anyhow!("mpv exited with {status} before opening its IPC socket"));
            }
            thread::sleep(CONNECT_DELAY);
        }
        Err(anyhow!(
            "timed out connecting to mpv IPC socket {}",
            self.socket_path.display()
        ))
    }

    fn send(&self, command: Value) -> Result<()> {
        let writer = self
            .writer
            .as_ref()
            .ok_or_else(|| anyhow!("mpv is not running"))?;
        send_line(writer, &command)
    }

    fn next_event(&mut self) -> MpvEvent {
        let event = match &self.events {
            Some(events) => events.recv().unwrap_or(MpvEvent::Closed),
            None => MpvEvent::Closed,
        };
        match event {
            MpvEvent::Position(position) => self.last_position = Some(position),
            MpvEvent::Pause(paused) => {
                if self.pause_seen {
                    println!("pause: {}", if paused { "paused" } else { "resumed" });
                }
                self.pause_seen = true;
            }
            MpvEvent::EndFile { eof } => {
                self.reached_eof = eof;
                self.finished = true;
            }
            MpvEvent::Closed => self.finished = true,
            MpvEvent::Duration(_) => {}
        }
        event
    }
}

fn send_line(writer: &Mutex<UnixStream>, command: &Value) -> Result<()> {
    let mut stream = writer
        .lock()
        .map_err(|_| anyhow!("mpv IPC connection lock poisoned"))?;
    writeln!(stream, "{command}").context("failed writing to mpv IPC socket")?;
    stream.flush().context("failed flushing mpv IPC socket")?;
    Ok(())
}

impl Player for MpvPlayer {
    fn play(&mut self, media: &str) -> Result<()> {
        let _ = fs::remove_file(&self.socket_path);
        let child = self
            .build_command(media)
            .spawn()
            .with_context(|| format!("failed to launch {}", self.config.bin.display()))?;
        debug!(pid = child.id(), media, "spawned mpv");
        self.process = Some(child);

        let stream = self.connect()?;
        let reader = stream
            .try_clone()
            .context("failed to clone mpv IPC connection")?;
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for line in BufReader::new(reader).lines() {
                let Ok(line) = line else { break };
                if let Some(event) = parse_event(&line)
                    && tx.send(event).is_err()
                {
                    return;
                }
            }
            let _ = tx.send(MpvEvent::Closed);
        });

        self.writer = Some(Arc::new(Mutex::new(stream)));
        self.events = Some(rx);
        self.send(json!({ "command": ["observe_property", 1, "duration"] }))?;
        self.send(json!({ "command": ["observe_property", 2, "time-pos"] }))?;
        self.send(json!({ "command": ["observe_property", 3, "pause"] }))?;
        Ok(())
    }

    /// Nothing to wait on: the `duration` event only arrives once mpv is playing.
    fn wait_until_playing(&mut self) -> Result<()> {
        Ok(())
    }

    fn probe_duration(&mut self) -> Result<Option<f64>> {
        while !self.finished {
            if let MpvEvent::Duration(duration) = self.next_event()
                && duration > 0.0
            {
                return Ok(Some(duration));
            }
        }
        Ok(None)
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        self.send(json!({ "command": ["seek", seconds, "absolute"] }))
    }

    fn show_text(&mut self, text: &str) -> Result<()> {
        self.send(json!({ "command": ["show-text", text, 2000] }))
    }

    fn wait_for_completion(&mut self) -> Result<()> {
        while !self.finished {
            self.next_event();
        }
        if let Some(mut child) = self.process.take() {
            let status = child.wait().context("failed waiting on mpv")?;
            debug!(%status, "mpv exited");
        }
        Ok(())
    }

    fn current_position(&mut self) -> Result<Option<f64>> {
        if self.reached_eof {
            return Ok(None);
        }
        Ok(self.last_position)
    }

    fn key_handler(&self) -> Option<KeyHandler> {
        let writer = Arc::clone(self.writer.as_ref()?);
        Some(Box::new(move |key: &str| {
            let command = json!({ "command": ["keypress", key] });
            if let Err(err) = send_line(&writer, &command) {
                debug!(%err, key, "failed relaying key to mpv");
            }
        }))
    }
}

impl Drop for MpvPlayer {
    fn drop(&mut self) {
        if let Some(mut child) = self.process.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = fs::remove_file(&self.socket_path);
    }
}
