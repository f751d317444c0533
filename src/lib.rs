//! Jarvis: a personal voice and text assistant.
//!
//! Utterances are routed either to local intent handlers (name, "about" and
//! birthday memory, weather, arithmetic, app launch, shutdown) or to a remote
//! chat model, while the user profile and the chat transcript persist across
//! sessions.
//!
//! # Architecture
//!
//! - **Session Controller** ([`controller`]): awake/asleep toggle, voice
//!   gating, and the background wake word listener
//! - **Intent Router** ([`router`]): ordered intent matching and handlers
//! - **Conversation Memory** ([`memory`]): transcript and message reconstruction
//! - **Remote Dialogue Client** ([`dialogue`]): OpenAI-compatible chat completions
//! - **Persistence Store** ([`store`]): profile and history as JSON documents
//!
//! Speech capture, speech output, display, and app launching sit behind the
//! traits in [`io`].

pub mod arithmetic;
pub mod config;
pub mod controller;
pub mod dialogue;
pub mod error;
pub mod intent;
pub mod io;
pub mod jarvis_dirs;
pub mod memory;
pub mod personality;
pub mod profile;
pub mod router;
pub mod session;
pub mod store;
pub mod weather;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::AssistantConfig;
pub use controller::{SessionController, SessionState};
pub use error::{AssistantError, Result};
pub use memory::{ChatMessage, ConversationMemory, Turn};
pub use profile::Profile;
pub use router::{IntentRouter, RouteOutcome, SideEffects};
pub use session::Session;
pub use store::Store;
