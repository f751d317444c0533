//! Conversation Memory: the persisted transcript of remote dialogue exchanges.
//!
//! Only exchanges with the remote dialogue backend are recorded; local intent
//! replies never enter the transcript. Turns are appended in (user, assistant)
//! pairs under a single write lock, so a reader never sees a prompt without
//! its reply.

use crate::error::Result;
use crate::store::Store;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tracing::debug;

/// Speaker of a recorded turn.
///
/// `Other` keeps roles found in older or hand-edited history files so they
/// are written back unchanged; such turns are never sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    Other(String),
}

impl Role {
    /// Parse the role string used in history documents.
    #[must_use]
    pub fn from_wire(s: &str) -> Self {
        match s {
            "user" => Self::User,
            "assistant" => Self::Assistant,
            other => Self::Other(other.to_owned()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Other(s) => s,
        }
    }
}

/// One recorded utterance or reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Role of a message sent to the dialogue backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// A message in the request sent to the dialogue backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Build the request messages: system preamble, every well-formed
/// (user, assistant) pair from `turns` in order, then the live prompt.
///
/// The scan advances two positions past a valid pair and one position past
/// anything else, so a stray or duplicated turn costs only itself and the
/// pairs after it are still found.
#[must_use]
pub fn reconstruct_messages(
    turns: &[Turn],
    system_preamble: &str,
    prompt: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(turns.len() + 2);
    messages.push(ChatMessage::system(system_preamble));

    let mut i = 0;
    while i + 1 < turns.len() {
        let (first, second) = (&turns[i], &turns[i + 1]);
        if first.role == Role::User && second.role == Role::Assistant {
            messages.push(ChatMessage::user(first.content.clone()));
            messages.push(ChatMessage::assistant(second.content.clone()));
            i += 2;
        } else {
            i += 1;
        }
    }

    messages.push(ChatMessage::user(prompt));
    messages
}

/// Owns the transcript for the lifetime of the process.
#[derive(Debug)]
pub struct ConversationMemory {
    turns: RwLock<Vec<Turn>>,
    store: Store,
}

impl ConversationMemory {
    /// Load the transcript from `store`.
    #[must_use]
    pub fn load(store: Store) -> Self {
        let turns = store.load_transcript();
        debug!("loaded {} transcript turns", turns.len());
        Self::with_turns(store, turns)
    }

    /// Start from an explicit transcript (nothing is read from disk).
    #[must_use]
    pub fn with_turns(store: Store, turns: Vec<Turn>) -> Self {
        Self {
            turns: RwLock::new(turns),
            store,
        }
    }

    /// Append a (user, assistant) pair and persist the transcript.
    ///
    /// The pair is in memory once this returns, even if the save failed.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AssistantError::Persistence`] if the transcript
    /// could not be written.
    pub fn record_exchange(&self, prompt: &str, reply: &str) -> Result<()> {
        let mut turns = self.turns.write().unwrap_or_else(|e| e.into_inner());
        turns.push(Turn::user(prompt));
        turns.push(Turn::assistant(reply));
        // Save under the write lock: file order matches memory order.
        self.store.save_transcript(&turns)
    }

    /// Messages for a remote call: see [`reconstruct_messages`].
    #[must_use]
    pub fn build_message_sequence(&self, system_preamble: &str, prompt: &str) -> Vec<ChatMessage> {
        let turns = self.turns.read().unwrap_or_else(|e| e.into_inner());
        reconstruct_messages(&turns, system_preamble, prompt)
    }

    /// Copy of the current transcript.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
