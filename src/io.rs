//! Collaborator seams: speech capture, speech output, display, app launch.
//!
//! The core only sees these traits. Process-backed implementations shell out
//! to configurable programs (a recognizer that prints text, a TTS command,
//! the app to launch); the console sink prints to stdout.

use crate::config::AppAlias;
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;
use tracing::{debug, warn};

/// Sender label for assistant lines.
pub const ASSISTANT_LABEL: &str = "JARVIS";

/// Result of one capture attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Capture {
    /// Lowercased recognized text.
    Utterance(String),
    /// Timeout, silence, or nothing recognizable.
    Miss,
}

impl Capture {
    /// Normalize recognizer output: lowercased, trimmed, `Miss` when empty.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let text = text.trim().to_lowercase();
        if text.is_empty() {
            Self::Miss
        } else {
            Self::Utterance(text)
        }
    }
}

/// Listens once on the default audio input.
#[async_trait]
pub trait SpeechCapture: Send + Sync {
    /// Never fails: errors are a [`Capture::Miss`].
    async fn capture(&self, timeout: Duration) -> Capture;
}

/// Speaks text. Fire-and-forget.
pub trait SpeechOutput: Send + Sync {
    fn speak(&self, text: &str);
}

/// Presentation layer: a transcript pane and a status line.
pub trait OutputSink: Send + Sync {
    fn display(&self, sender: &str, text: &str);
    fn set_status(&self, text: &str);
}

/// Starts a desktop application.
pub trait AppLauncher: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the program could not be started.
    fn launch(&self, app: &AppAlias) -> Result<()>;
}

/// The single microphone: captures never overlap.
pub struct Microphone {
    capture: Arc<dyn SpeechCapture>,
    in_use: tokio::sync::Mutex<()>,
}

impl Microphone {
    pub fn new(capture: Arc<dyn SpeechCapture>) -> Self {
        Self {
            capture,
            in_use: tokio::sync::Mutex::new(()),
        }
    }

    /// Wait for the microphone, then capture once.
    pub async fn listen(&self, timeout: Duration) -> Capture {
        let _guard = self.in_use.lock().await;
        self.capture.capture(timeout).await
    }
}

/// Display plus speech, the way every assistant reply goes out.
#[derive(Clone)]
pub struct Output {
    sink: Arc<dyn OutputSink>,
    speaker: Arc<dyn SpeechOutput>,
}

impl Output {
    pub fn new(sink: Arc<dyn OutputSink>, speaker: Arc<dyn SpeechOutput>) -> Self {
        Self { sink, speaker }
    }

    /// Display as the assistant and speak.
    pub fn say(&self, text: &str) {
        self.sink.display(ASSISTANT_LABEL, text);
        self.speaker.speak(text);
    }

    /// Speak without displaying.
    pub fn speak(&self, text: &str) {
        self.speaker.speak(text);
    }

    pub fn display(&self, sender: &str, text: &str) {
        self.sink.display(sender, text);
    }

    pub fn set_status(&self, text: &str) {
        self.sink.set_status(text);
    }
}

// ── Process-backed implementations ──────────────────────────────────

/// Runs a recognizer program and reads the recognized text from stdout.
#[derive(Debug, Clone)]
pub struct CommandCapture {
    program: String,
    args: Vec<String>,
}

impl CommandCapture {
    /// `argv[0]` is the program. `None` for an empty command line.
    #[must_use]
    pub fn new(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl SpeechCapture for CommandCapture {
    async fn capture(&self, timeout: Duration) -> Capture {
        let child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn();
        let child = match child {
            Ok(c) => c,
            Err(e) => {
                warn!("failed to start recognizer {}: {e}", self.program);
                return Capture::Miss;
            }
        };

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) if output.status.success() => {
                Capture::from_text(&String::from_utf8_lossy(&output.stdout))
            }
            Ok(Ok(output)) => {
                debug!("recognizer exited with {}", output.status);
                Capture::Miss
            }
            Ok(Err(e)) => {
                warn!("recognizer I/O error: {e}");
                Capture::Miss
            }
            Err(_) => {
                debug!("capture timed out after {timeout:?}");
                Capture::Miss
            }
        }
    }
}

/// Capture used when no recognizer is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapture;

#[async_trait]
impl SpeechCapture for NoCapture {
    async fn capture(&self, _timeout: Duration) -> Capture {
        Capture::Miss
    }
}

/// Speaks through an external TTS program, one utterance at a time.
///
/// A single worker thread drains a queue, so utterances are spoken in the
/// order `speak` was called. The worker exits when the last handle drops.
#[derive(Debug, Clone)]
pub struct CommandSpeaker {
    queue: mpsc::Sender<String>,
}

impl CommandSpeaker {
    /// `argv[0]` is the program; the text is appended as the last argument.
    #[must_use]
    pub fn new(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        let program = program.clone();
        let args = args.to_vec();
        let (queue, pending) = mpsc::channel::<String>();
        std::thread::spawn(move || {
            for text in pending {
                let result = std::process::Command::new(&program)
                    .args(&args)
                    .arg(&text)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .status();
                if let Err(e) = result {
                    warn!("speech output failed: {e}");
                }
            }
        });
        Some(Self { queue })
    }
}

impl SpeechOutput for CommandSpeaker {
    fn speak(&self, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        if self.queue.send(text.to_owned()).is_err() {
            warn!("speech worker has stopped");
        }
    }
}

/// Speech output used when no TTS program is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeaker;

impl SpeechOutput for SilentSpeaker {
    fn speak(&self, text: &str) {
        debug!("(speech disabled) {text}");
    }
}

/// Prints the conversation to stdout.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    status: Mutex<String>,
}

impl OutputSink for ConsoleSink {
    fn display(&self, sender: &str, text: &str) {
        println!("{sender}: {text}");
    }

    fn set_status(&self, text: &str) {
        let mut status = self.status.lock().unwrap_or_else(|e| e.into_inner());
        if *status != text {
            *status = text.to_owned();
            println!("  [status: {text}]");
        }
    }
}

/// Spawns the configured program and reaps it in the background.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessLauncher;

impl AppLauncher for ProcessLauncher {
    fn launch(&self, app: &AppAlias) -> Result<()> {
        let mut child = std::process::Command::new(&app.program)
            .args(&app.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                AssistantError::Io(std::io::Error::new(e.kind(), format!("{}: {e}", app.program)))
            })?;
        debug!("launched {} (pid {})", app.program, child.id());
        // Reap the app when it exits.
        std::thread::spawn(move || {
            let _ = child.wait();
        });
        Ok(())
    }
}
