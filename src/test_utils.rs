//! Scripted collaborators and a wired-up router for unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crate::config::{default_apps, AppAlias};
use crate::dialogue::{DialogueBackend, DialogueClient};
use crate::error::{AssistantError, Result};
use crate::io::{
    AppLauncher, Capture, Microphone, Output, OutputSink, SpeechCapture, SpeechOutput,
    ASSISTANT_LABEL,
};
use crate::memory::ChatMessage;
use crate::router::{IntentRouter, RouterParts};
use crate::session::Session;
use crate::store::Store;
use crate::weather::WeatherProvider;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Hands out captures in order, then misses.
#[derive(Default)]
pub struct ScriptedCapture {
    script: Mutex<VecDeque<Capture>>,
    calls: AtomicUsize,
}

impl ScriptedCapture {
    pub fn new(script: Vec<Capture>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechCapture for ScriptedCapture {
    async fn capture(&self, _timeout: Duration) -> Capture {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(capture) => capture,
            None => {
                // Keeps an idle listener loop from spinning.
                tokio::time::sleep(Duration::from_millis(5)).await;
                Capture::Miss
            }
        }
    }
}

/// Records everything shown.
#[derive(Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<(String, String)>>,
    statuses: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn lines(&self) -> Vec<(String, String)> {
        self.lines.lock().unwrap().clone()
    }

    pub fn assistant_lines(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(sender, _)| sender == ASSISTANT_LABEL)
            .map(|(_, text)| text)
            .collect()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.statuses.lock().unwrap().clone()
    }
}

impl OutputSink for RecordingSink {
    fn display(&self, sender: &str, text: &str) {
        self.lines
            .lock()
            .unwrap()
            .push((sender.to_owned(), text.to_owned()));
    }

    fn set_status(&self, text: &str) {
        self.statuses.lock().unwrap().push(text.to_owned());
    }
}

#[derive(Default)]
pub struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
}

impl RecordingSpeaker {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }
}

impl SpeechOutput for RecordingSpeaker {
    fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_owned());
    }
}

#[derive(Default)]
pub struct ScriptedLauncher {
    launched: Mutex<Vec<String>>,
    fail_next: AtomicBool,
}

impl ScriptedLauncher {
    pub fn launched(&self) -> Vec<String> {
        self.launched.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

impl AppLauncher for ScriptedLauncher {
    fn launch(&self, app: &AppAlias) -> Result<()> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(AssistantError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                app.program.clone(),
            )));
        }
        self.launched.lock().unwrap().push(app.label.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct ScriptedWeather {
    cities: Mutex<Vec<String>>,
}

impl ScriptedWeather {
    pub fn cities(&self) -> Vec<String> {
        self.cities.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.cities.lock().unwrap().len()
    }
}

#[async_trait]
impl WeatherProvider for ScriptedWeather {
    async fn describe(&self, city: &str) -> String {
        self.cities.lock().unwrap().push(city.to_owned());
        format!("Sunny in {city}.")
    }
}

/// Replies from a queue (then "ok") and records every request.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedBackend {
    pub const SYSTEM_PROMPT: &'static str = "You are Jarvis, a helpful assistant.";

    pub fn push_reply(&self, text: &str) {
        self.replies.lock().unwrap().push_back(Ok(text.to_owned()));
    }

    pub fn push_error(&self, detail: &str) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(AssistantError::Backend(detail.to_owned())));
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl DialogueBackend for ScriptedBackend {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ok".to_owned()))
    }
}

/// A router over scripted collaborators and a temporary store.
pub struct Harness {
    _dir: tempfile::TempDir,
    pub router: Arc<IntentRouter>,
    pub microphone: Arc<Microphone>,
    pub output: Output,
    pub capture: Arc<ScriptedCapture>,
    pub sink: Arc<RecordingSink>,
    pub speaker: Arc<RecordingSpeaker>,
    pub launcher: Arc<ScriptedLauncher>,
    pub weather: Arc<ScriptedWeather>,
    pub backend: Arc<ScriptedBackend>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_captures(Vec::new())
    }

    pub fn with_captures(captures: Vec<Capture>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::new(
            dir.path().join("jarvis_profile.json"),
            dir.path().join("jarvis_chat_history.json"),
        );
        let session = Arc::new(Session::load(store));

        let capture = Arc::new(ScriptedCapture::new(captures));
        let sink = Arc::new(RecordingSink::default());
        let speaker = Arc::new(RecordingSpeaker::default());
        let launcher = Arc::new(ScriptedLauncher::default());
        let weather = Arc::new(ScriptedWeather::default());
        let backend = Arc::new(ScriptedBackend::default());

        let microphone = Arc::new(Microphone::new(capture.clone()));
        let output = Output::new(sink.clone(), speaker.clone());
        let parts = RouterParts {
            dialogue: DialogueClient::new(backend.clone(), "Groq", ScriptedBackend::SYSTEM_PROMPT),
            weather: weather.clone(),
            launcher: launcher.clone(),
            microphone: microphone.clone(),
            output: output.clone(),
            apps: default_apps(),
            default_city: "Mumbai".to_owned(),
            capture_timeout: Duration::from_millis(50),
        };
        let router = Arc::new(IntentRouter::new(session, parts));

        Self {
            _dir: dir,
            router,
            microphone,
            output,
            capture,
            sink,
            speaker,
            launcher,
            weather,
            backend,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        self.router.session()
    }

    pub fn store(&self) -> &Store {
        self.session().store()
    }
}
