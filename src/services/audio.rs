//! Success audio cue backends.

use std::{
    path::{Path, PathBuf},
    process::{Child, Command, Stdio},
    sync::{Arc, Mutex, PoisonError},
    thread,
};

use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::{AppConfig, AudioBackend};

/// Errors raised by an audio backend.
#[derive(Debug, Error)]
pub enum CueError {
    /// Backend missing or cue resource not found; the round settles on the flash alone.
    #[error("audio cue unavailable: {0}")]
    Unavailable(String),
    /// Backend present but playback could not be started.
    #[error("audio playback failed: {0}")]
    Playback(String),
}

/// Asynchronous playback of the success cue.
///
/// `start` must return immediately; completion is observed by polling `is_playing`.
pub trait AudioCue: Send + Sync {
    /// Begin playback from the start of the cue.
    fn start(&self) -> Result<(), CueError>;
    /// Whether playback is still in progress.
    fn is_playing(&self) -> bool;
    /// Stop any playback in progress.
    fn stop(&self);
}

/// Backend used when no audio is configured: every start reports the cue as unavailable.
#[derive(Debug, Default)]
pub struct NoCue;

impl AudioCue for NoCue {
    fn start(&self) -> Result<(), CueError> {
        Err(CueError::Unavailable("no audio backend configured".into()))
    }

    fn is_playing(&self) -> bool {
        false
    }

    fn stop(&self) {}
}

/// Plays the cue by spawning an external player process on the audio file.
#[derive(Debug)]
pub struct CommandCue {
    program: String,
    args: Vec<String>,
    path: PathBuf,
    child: Mutex<Option<Child>>,
}

impl CommandCue {
    /// `player` is the program followed by its arguments; the audio path is appended last.
    pub fn new(player: &[String], path: impl Into<PathBuf>) -> Result<Self, CueError> {
        let (program, args) = player
            .split_first()
            .ok_or_else(|| CueError::Unavailable("empty audio player command".into()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            path: path.into(),
            child: Mutex::new(None),
        })
    }

    /// Kill the player without blocking the caller, which may hold the game lock.
    /// A player that has not exited yet is reaped on a detached thread.
    fn kill(mut child: Child) {
        if let Err(err) = child.kill() {
            warn!(error = %err, "failed to stop audio player");
        }
        if let Ok(Some(_)) = child.try_wait() {
            return;
        }
        let reaper = thread::Builder::new()
            .name("audio-reaper".into())
            .spawn(move || {
                let _ = child.wait();
            });
        if let Err(err) = reaper {
            warn!(error = %err, "failed to reap audio player");
        }
    }
}

impl AudioCue for CommandCue {
    fn start(&self) -> Result<(), CueError> {
        if !self.path.is_file() {
            return Err(CueError::Unavailable(format!(
                "audio file `{}` not found",
                self.path.display()
            )));
        }

        let mut slot = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            Self::kill(previous);
        }

        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(&self.path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| CueError::Unavailable(format!("cannot run `{}`: {err}", self.program)))?;

        info!(path = %self.path.display(), pid = child.id(), "playing audio cue");
        *slot = Some(child);
        Ok(())
    }

    fn is_playing(&self) -> bool {
        let mut slot = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(child) = slot.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                if !status.success() {
                    warn!(%status, "audio player exited with failure");
                }
                slot.take();
                false
            }
            Err(err) => {
                warn!(error = %err, "failed to poll audio player; treating as finished");
                slot.take();
                false
            }
        }
    }

    fn stop(&self) {
        let mut slot = self.child.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(child) = slot.take() {
            Self::kill(child);
        }
    }
}

/// Build the configured backend. Problems are logged and never fatal: the
/// game falls back to silent success flashes.
pub fn from_config(config: &AppConfig) -> Arc<dyn AudioCue> {
    let path = config.audio_path();
    if config.audio_backend() != AudioBackend::None && !path.is_file() {
        error!(path = %path.display(), "audio file not found; successes will be silent until it appears");
    }

    match config.audio_backend() {
        AudioBackend::None => {
            info!("audio disabled");
            Arc::new(NoCue)
        }
        AudioBackend::Command => match CommandCue::new(config.audio_player(), path) {
            Ok(cue) => Arc::new(cue),
            Err(err) => {
                error!(error = %err, "audio player unusable; audio disabled");
                Arc::new(NoCue)
            }
        },
        AudioBackend::Rodio => rodio_backend(path),
    }
}

#[cfg(feature = "rodio-cue")]
fn rodio_backend(path: &Path) -> Arc<dyn AudioCue> {
    match RodioCue::open(path) {
        Ok(cue) => {
            info!("audio output device opened");
            Arc::new(cue)
        }
        Err(err) => {
            error!(error = %err, "failed to open audio output; audio disabled");
            Arc::new(NoCue)
        }
    }
}

#[cfg(not(feature = "rodio-cue"))]
fn rodio_backend(_path: &Path) -> Arc<dyn AudioCue> {
    error!("rodio backend requested but the `rodio-cue` feature is not enabled; audio disabled");
    Arc::new(NoCue)
}

#[cfg(feature = "rodio-cue")]
pub use self::rodio_cue::RodioCue;

#[cfg(feature = "rodio-cue")]
mod rodio_cue {
    use std::{
        fs::File,
        io::BufReader,
        path::PathBuf,
        sync::{Mutex, PoisonError, mpsc},
        thread,
    };

    use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
    use tracing::info;

    use super::{AudioCue, CueError};

    /// In-process playback through the default output device.
    ///
    /// The output stream is not `Send`, so it lives on a dedicated thread for
    /// the lifetime of the process while the cue keeps a handle to it.
    pub struct RodioCue {
        path: PathBuf,
        handle: OutputStreamHandle,
        sink: Mutex<Option<Sink>>,
    }

    impl RodioCue {
        /// Open the default output device.
        pub fn open(path: impl Into<PathBuf>) -> Result<Self, CueError> {
            let (tx, rx) = mpsc::channel();
            thread::Builder::new()
                .name("audio-output".into())
                .spawn(move || match OutputStream::try_default() {
                    Ok((stream, handle)) => {
                        if tx.send(Ok(handle)).is_ok() {
                            let _stream = stream;
                            loop {
                                thread::park();
                            }
                        }
                    }
                    Err(err) => {
                        let _ = tx.send(Err(CueError::Unavailable(err.to_string())));
                    }
                })
                .map_err(|err| CueError::Unavailable(err.to_string()))?;

            let handle = rx
                .recv()
                .map_err(|err| CueError::Unavailable(err.to_string()))??;
            Ok(Self {
                path: path.into(),
                handle,
                sink: Mutex::new(None),
            })
        }
    }

    impl AudioCue for RodioCue {
        fn start(&self) -> Result<(), CueError> {
            let file = File::open(&self.path).map_err(|err| {
                CueError::Unavailable(format!("{}: {err}", self.path.display()))
            })?;
            let source = Decoder::new(BufReader::new(file))
                .map_err(|err| CueError::Playback(err.to_string()))?;
            let sink =
                Sink::try_new(&self.handle).map_err(|err| CueError::Playback(err.to_string()))?;
            sink.append(source);

            info!(path = %self.path.display(), "playing audio cue");
            let mut slot = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(previous) = slot.replace(sink) {
                previous.stop();
            }
            Ok(())
        }

        fn is_playing(&self) -> bool {
            let slot = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
            slot.as_ref().is_some_and(|sink| !sink.empty())
        }

        fn stop(&self) {
            let mut slot = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(sink) = slot.take() {
                sink.stop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_cue_is_always_unavailable() {
        let cue = NoCue;
        assert!(matches!(cue.start(), Err(CueError::Unavailable(_))));
        assert!(!cue.is_playing());
    }

    #[test]
    fn command_cue_requires_a_program() {
        let err = CommandCue::new(&[], "/tmp/cue.mp3").unwrap_err();
        assert!(matches!(err, CueError::Unavailable(_)));
    }

    #[test]
    fn disabled_backend_builds_no_cue() {
        let config =
            AppConfig::from_json(r#"{"audio_backend":"none","audio_player":[]}"#).unwrap();
        let cue = from_config(&config);
        assert!(matches!(cue.start(), Err(CueError::Unavailable(_))));
    }

    #[test]
    fn command_cue_reports_missing_file() {
        let cue = CommandCue::new(&["mpg123".to_string()], "/nonexistent/unison/cue.mp3").unwrap();
        let err = cue.start().unwrap_err();
        assert!(matches!(err, CueError::Unavailable(_)));
        assert!(!cue.is_playing());
    }

    #[cfg(unix)]
    #[test]
    fn stopping_a_long_player_returns_immediately() {
        // `sh -c` binds the appended audio path to `$1` and ignores it.
        let player = ["sh", "-c", "exec sleep 30", "cue"].map(String::from);
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("Cargo.toml");
        let cue = CommandCue::new(&player, path).unwrap();
        cue.start().unwrap();
        assert!(cue.is_playing());

        let started = std::time::Instant::now();
        cue.stop();
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
        assert!(!cue.is_playing());
    }
}
