//! Intent Router: one utterance in, one reply out.
//!
//! [`IntentRouter::route`] never fails. Every local handler produces a
//! sentence, including when it cannot do what was asked, and remote failures
//! arrive here already converted to text by the dialogue client.

use crate::arithmetic::{self, Answer};
use crate::config::AppAlias;
use crate::dialogue::{DialogueClient, DialogueReply};
use crate::intent::{self, Intent};
use crate::io::{AppLauncher, Capture, Microphone, Output};
use crate::profile::capitalize;
use crate::session::Session;
use crate::weather::WeatherProvider;
use chrono::Datelike;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Prompt spoken before the follow-up capture of "remember this".
pub const REMEMBER_PROMPT: &str = "Go ahead, I'm listening.";

/// What a routed utterance changed besides producing a reply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SideEffects {
    pub profile_updated: bool,
    /// A remote exchange was appended to the conversation memory.
    pub transcript_updated: bool,
    pub app_launched: bool,
    pub shutdown_requested: bool,
}

/// Reply plus side effects for one utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteOutcome {
    /// Short intent name for logs.
    pub intent: &'static str,
    /// `None` when the utterance was empty.
    pub response: Option<String>,
    pub effects: SideEffects,
}

impl RouteOutcome {
    fn reply(intent: &Intent, response: impl Into<String>) -> Self {
        Self {
            intent: intent.name(),
            response: Some(response.into()),
            effects: SideEffects::default(),
        }
    }

    fn with(mut self, update: impl FnOnce(&mut SideEffects)) -> Self {
        update(&mut self.effects);
        self
    }
}

/// Everything the router talks to besides the session.
pub struct RouterParts {
    pub dialogue: DialogueClient,
    pub weather: Arc<dyn WeatherProvider>,
    pub launcher: Arc<dyn AppLauncher>,
    pub microphone: Arc<Microphone>,
    pub output: Output,
    pub apps: Vec<AppAlias>,
    pub default_city: String,
    /// Timeout for the follow-up capture of "remember this".
    pub capture_timeout: Duration,
}

pub struct IntentRouter {
    session: Arc<Session>,
    parts: RouterParts,
}

impl IntentRouter {
    pub fn new(session: Arc<Session>, parts: RouterParts) -> Self {
        Self { session, parts }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Route a lowercased utterance.
    pub async fn route(&self, utterance: &str) -> RouteOutcome {
        let intent = intent::classify(utterance, &self.parts.apps);
        debug!("routing '{utterance}' as {}", intent.name());

        match &intent {
            Intent::Empty => RouteOutcome {
                intent: intent.name(),
                response: None,
                effects: SideEffects::default(),
            },
            Intent::IdentityStatement { name } => self.set_name(&intent, name),
            Intent::RememberThis { inline } => self.remember(&intent, inline.as_deref()).await,
            Intent::WhoAmI => RouteOutcome::reply(&intent, self.session.profile().about),
            Intent::BirthdayStatement { dob } => self.set_birthday(&intent, dob),
            Intent::BirthdayQuery => RouteOutcome::reply(&intent, self.birthday_answer()),
            Intent::Shutdown => {
                info!("shutdown requested");
                RouteOutcome::reply(&intent, "Shutting down.").with(|e| e.shutdown_requested = true)
            }
            Intent::LaunchApp(app) => self.launch(&intent, app),
            Intent::Weather { city } => {
                let city = city.as_deref().unwrap_or(self.parts.default_city.as_str());
                RouteOutcome::reply(&intent, self.parts.weather.describe(city).await)
            }
            Intent::Arithmetic => RouteOutcome::reply(&intent, calculate(utterance)),
            Intent::Dialogue => self.converse(&intent, utterance).await,
        }
    }

    fn set_name(&self, intent: &Intent, spoken: &str) -> RouteOutcome {
        let name = capitalize(spoken);
        if name.is_empty() {
            return RouteOutcome::reply(intent, "I didn't catch your name.");
        }
        self.persist_profile(|p| p.name.clone_from(&name));
        RouteOutcome::reply(intent, format!("Nice to meet you, {name}."))
            .with(|e| e.profile_updated = true)
    }

    async fn remember(&self, intent: &Intent, inline: Option<&str>) -> RouteOutcome {
        let fact = match inline {
            Some(text) => text.to_owned(),
            None => {
                self.parts.output.say(REMEMBER_PROMPT);
                self.parts.output.set_status("Listening...");
                match self.parts.microphone.listen(self.parts.capture_timeout).await {
                    Capture::Utterance(text) => text,
                    Capture::Miss => {
                        return RouteOutcome::reply(intent, "I didn't catch anything to remember.");
                    }
                }
            }
        };
        self.persist_profile(|p| p.about = fact);
        RouteOutcome::reply(intent, "Got it! I'll remember that.").with(|e| e.profile_updated = true)
    }

    fn set_birthday(&self, intent: &Intent, spoken: &str) -> RouteOutcome {
        let dob = capitalize(spoken);
        if dob.is_empty() {
            return RouteOutcome::reply(intent, "I didn't catch the date.");
        }
        self.persist_profile(|p| p.dob = Some(dob.clone()));
        RouteOutcome::reply(intent, format!("I've saved your birthday as {dob}."))
            .with(|e| e.profile_updated = true)
    }

    fn birthday_answer(&self) -> String {
        let Some(dob) = self.session.profile().dob else {
            return "I don't know your birthday yet.".to_owned();
        };
        let mut tokens = dob.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(day), Some(month)) => {
                let year = chrono::Local::now().year();
                format!("Your birthday is on {day} {month} {year}.")
            }
            _ => format!("You told me your birthday is {dob}."),
        }
    }

    fn launch(&self, intent: &Intent, app: &AppAlias) -> RouteOutcome {
        match self.parts.launcher.launch(app) {
            Ok(()) => {
                info!("launched {}", app.program);
                RouteOutcome::reply(intent, format!("Opening {}.", app.label))
                    .with(|e| e.app_launched = true)
            }
            Err(e) => {
                warn!("failed to launch {}: {e}", app.program);
                RouteOutcome::reply(intent, format!("I couldn't open {}.", app.label))
            }
        }
    }

    async fn converse(&self, intent: &Intent, prompt: &str) -> RouteOutcome {
        let memory = self.session.memory();
        let messages =
            memory.build_message_sequence(self.parts.dialogue.system_prompt(), prompt);
        match self.parts.dialogue.reply(&messages).await {
            DialogueReply::Reply(text) => {
                if let Err(e) = memory.record_exchange(prompt, &text) {
                    warn!("failed to save chat history: {e}");
                }
                RouteOutcome::reply(intent, text).with(|e| e.transcript_updated = true)
            }
            DialogueReply::Failed(text) => RouteOutcome::reply(intent, text),
        }
    }

    fn persist_profile(&self, update: impl FnOnce(&mut crate::profile::Profile)) {
        if let Err(e) = self.session.update_profile(update) {
            warn!("failed to save profile: {e}");
        }
    }
}

fn calculate(utterance: &str) -> String {
    match arithmetic::evaluate(utterance) {
        Ok(value) => format!("The answer is {}", Answer(value)),
        Err(e) => {
            debug!("arithmetic rejected: {e}");
            "I couldn't calculate that.".to_owned()
        }
    }
}
