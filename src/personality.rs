//! Fixed assistant phrasing: greetings and the short fillers spoken while a
//! remote reply is being prepared.

use rand::seq::SliceRandom;

/// Spoken just before a remote reply.
pub const THINKING_PHRASES: [&str; 5] = [
    "Let me see...",
    "Hmm...",
    "Okay...",
    "Just a moment...",
    "Understood.",
];

/// A random filler phrase.
#[must_use]
pub fn thinking_phrase() -> &'static str {
    THINKING_PHRASES
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("Okay...")
}

/// Startup greeting.
#[must_use]
pub fn greeting(name: &str) -> String {
    format!("Hello {name}, I am online and ready.")
}

/// Reply to a detected wake word.
#[must_use]
pub fn wake_acknowledgement(name: &str) -> String {
    format!("Yes, {name}?")
}
