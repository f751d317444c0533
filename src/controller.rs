//! Session Controller: the awake/asleep toggle, voice gating, and the
//! background wake word listener.
//!
//! Two trigger events closer together than the toggle window flip the state.
//! Only voice input is gated by it: typed commands always reach the router.
//! Every capture and every routed command races the shutdown token, so a
//! shutdown never waits on a microphone or a remote reply.

use crate::config::{SessionConfig, WakeWordConfig};
use crate::io::{ASSISTANT_LABEL, Capture, Microphone, Output};
use crate::personality;
use crate::router::{IntentRouter, RouteOutcome};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Sender label for typed commands.
pub const TEXT_LABEL: &str = "You";
/// Sender label for spoken commands.
pub const VOICE_LABEL: &str = "You (mic)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Awake,
    Asleep,
}

impl SessionState {
    fn flipped(self) -> Self {
        match self {
            Self::Awake => Self::Asleep,
            Self::Asleep => Self::Awake,
        }
    }

    /// "awake" / "sleeping", as spoken.
    #[must_use]
    pub fn spoken(self) -> &'static str {
        match self {
            Self::Awake => "awake",
            Self::Asleep => "sleeping",
        }
    }
}

/// Double-trigger toggle. Every event updates the last trigger time, so a
/// third quick event flips the state back.
#[derive(Debug)]
pub struct ToggleGate {
    state: SessionState,
    last_trigger: Option<Instant>,
    window: Duration,
}

impl ToggleGate {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            state: SessionState::Awake,
            last_trigger: None,
            window,
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Register a trigger event. Returns the new state if it toggled.
    pub fn register(&mut self, at: Instant) -> Option<SessionState> {
        let toggled = self
            .last_trigger
            .is_some_and(|prev| at.saturating_duration_since(prev) < self.window);
        self.last_trigger = Some(at);
        if toggled {
            self.state = self.state.flipped();
            Some(self.state)
        } else {
            None
        }
    }
}

/// Wake word and capture timing for the controller.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub session: SessionConfig,
    pub wake_word: WakeWordConfig,
    /// Timeout for mic-button captures.
    pub capture_timeout: Duration,
}

pub struct SessionController {
    router: Arc<IntentRouter>,
    microphone: Arc<Microphone>,
    output: Output,
    gate: Mutex<ToggleGate>,
    config: ControllerConfig,
    cancel: CancellationToken,
}

impl SessionController {
    pub fn new(
        router: Arc<IntentRouter>,
        microphone: Arc<Microphone>,
        output: Output,
        config: ControllerConfig,
    ) -> Self {
        let gate = ToggleGate::new(config.session.toggle_window());
        Self {
            router,
            microphone,
            output,
            gate: Mutex::new(gate),
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancelled on shutdown.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.gate.lock().unwrap_or_else(|e| e.into_inner()).state()
    }

    #[must_use]
    pub fn is_awake(&self) -> bool {
        self.state() == SessionState::Awake
    }

    /// Startup greeting.
    pub fn greet(&self) {
        let name = self.router.session().user_name();
        self.output.say(&personality::greeting(&name));
        self.output.set_status("Idle");
    }

    /// A trigger event now (Enter on the console).
    pub fn trigger(&self) -> Option<SessionState> {
        self.trigger_at(Instant::now())
    }

    /// A trigger event at `at`. Announces the new state if it toggled.
    pub fn trigger_at(&self, at: Instant) -> Option<SessionState> {
        let toggled = self
            .gate
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .register(at);
        if let Some(state) = toggled {
            info!("session is now {}", state.spoken());
            let name = self.router.session().user_name();
            self.output.display(
                ASSISTANT_LABEL,
                &format!("I am now {}, {name}.", state.spoken()),
            );
            let status = match state {
                SessionState::Awake => "Awake (toggled)",
                SessionState::Asleep => "Sleeping (toggled)",
            };
            self.output.set_status(status);
        }
        toggled
    }

    /// A typed command. Never gated by the sleep state.
    pub async fn handle_text(&self, text: &str) -> Option<RouteOutcome> {
        let utterance = text.trim().to_lowercase();
        if utterance.is_empty() {
            return None;
        }
        self.dispatch(&utterance, TEXT_LABEL).await
    }

    /// A mic-button command: one capture, then route. Rejected while asleep.
    pub async fn handle_voice(&self) -> Option<RouteOutcome> {
        if !self.is_awake() {
            self.output
                .display(ASSISTANT_LABEL, &self.config.session.sleeping_notice);
            return None;
        }
        self.output.set_status("Listening...");
        let heard = self.capture(self.config.capture_timeout).await;
        self.output.set_status("Idle");
        self.dispatch_capture(heard?).await
    }

    /// Listen for the wake word until shutdown.
    pub async fn run_wake_word_listener(&self) {
        let phrase = self.config.wake_word.phrase.to_lowercase();
        let listen_timeout = Duration::from_secs(self.config.wake_word.listen_timeout_secs);
        let command_timeout = Duration::from_secs(self.config.wake_word.command_timeout_secs);
        info!("wake word listener started, phrase: \"{phrase}\"");
        self.output.set_status("Listening...");

        while !self.cancel.is_cancelled() {
            let Some(heard) = self.capture(listen_timeout).await else {
                break;
            };
            let Capture::Utterance(text) = heard else {
                continue;
            };
            if !text.contains(&phrase) {
                continue;
            }
            debug!("wake word detected in '{text}'");
            if !self.is_awake() {
                self.output
                    .display(ASSISTANT_LABEL, &self.config.session.sleeping_notice);
                continue;
            }

            let name = self.router.session().user_name();
            self.output.say(&personality::wake_acknowledgement(&name));
            let Some(command) = self.capture(command_timeout).await else {
                break;
            };
            self.dispatch_capture(command).await;
            self.output.set_status("Listening...");
        }
        info!("wake word listener stopped");
    }

    /// Spawn [`Self::run_wake_word_listener`] on the runtime.
    pub fn spawn_wake_word_listener(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let controller = Arc::clone(self);
        tokio::spawn(async move { controller.run_wake_word_listener().await })
    }

    /// One capture. `None` on shutdown.
    async fn capture(&self, timeout: Duration) -> Option<Capture> {
        tokio::select! {
            () = self.cancel.cancelled() => None,
            heard = self.microphone.listen(timeout) => Some(heard),
        }
    }

    async fn dispatch_capture(&self, heard: Capture) -> Option<RouteOutcome> {
        match heard {
            Capture::Utterance(text) => self.dispatch(&text, VOICE_LABEL).await,
            Capture::Miss => {
                if let Some(notice) = &self.config.session.miss_notice {
                    self.output.display(ASSISTANT_LABEL, notice);
                }
                None
            }
        }
    }

    async fn dispatch(&self, utterance: &str, sender: &str) -> Option<RouteOutcome> {
        self.output.display(sender, utterance);
        self.output.set_status("Thinking...");
        let outcome = tokio::select! {
            () = self.cancel.cancelled() => None,
            outcome = self.router.route(utterance) => Some(outcome),
        };
        self.output.set_status("Idle");
        let outcome = outcome?;

        if let Some(response) = &outcome.response {
            if outcome.effects.transcript_updated && self.config.session.thinking_phrases {
                self.output.speak(personality::thinking_phrase());
            }
            self.output.say(response);
        }
        if outcome.effects.shutdown_requested {
            info!("shutting down");
            self.cancel.cancel();
        }
        Some(outcome)
    }
}
