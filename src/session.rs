//! Shared session state: the profile and the conversation memory.
//!
//! One `Session` lives for the whole process behind an `Arc` and is shared by
//! the foreground loop, voice-capture tasks, and the wake word listener.
//! Profile changes are written through to disk before the lock is released.

use crate::error::Result;
use crate::memory::ConversationMemory;
use crate::profile::Profile;
use crate::store::Store;
use std::sync::RwLock;
use tracing::info;

#[derive(Debug)]
pub struct Session {
    profile: RwLock<Profile>,
    memory: ConversationMemory,
    store: Store,
}

impl Session {
    /// Load profile and transcript from `store`. Missing or unreadable files
    /// start from defaults.
    #[must_use]
    pub fn load(store: Store) -> Self {
        let profile = store.load_profile();
        let memory = ConversationMemory::load(store.clone());
        info!(
            "session loaded for {} ({} transcript turns)",
            profile.name,
            memory.len()
        );
        Self {
            profile: RwLock::new(profile),
            memory,
            store,
        }
    }

    /// Copy of the current profile.
    #[must_use]
    pub fn profile(&self) -> Profile {
        self.profile.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Current display name.
    #[must_use]
    pub fn user_name(&self) -> String {
        self.profile
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .name
            .clone()
    }

    /// Mutate the profile and persist it.
    ///
    /// The in-memory change stands even when the save fails.
    ///
    /// # Errors
    ///
    /// Returns [`crate::AssistantError::Persistence`] if the profile could not
    /// be written.
    pub fn update_profile(&self, update: impl FnOnce(&mut Profile)) -> Result<()> {
        let mut profile = self.profile.write().unwrap_or_else(|e| e.into_inner());
        update(&mut profile);
        self.store.save_profile(&profile)
    }

    #[must_use]
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }
}
