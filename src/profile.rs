//! The user's profile: name, free-text "about", and birthday.

use serde::{Deserialize, Serialize};

/// Name used until the user introduces themselves.
pub const DEFAULT_NAME: &str = "Sir";

/// `about` text used until the user asks Jarvis to remember something.
pub const DEFAULT_ABOUT: &str = "I don't have any information about you yet.";

/// One profile per installation.
///
/// `dob` is free-form text as spoken ("12 march"); it is never parsed as a
/// calendar date and carries no year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_about")]
    pub about: String,
    #[serde(default)]
    pub dob: Option<String>,
}

fn default_name() -> String {
    DEFAULT_NAME.to_owned()
}

fn default_about() -> String {
    DEFAULT_ABOUT.to_owned()
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: default_name(),
            about: default_about(),
            dob: None,
        }
    }
}

/// Upper-case the first character and lower-case the rest.
///
/// `"john SMITH"` becomes `"John smith"`; `"12 march"` is unchanged.
#[must_use]
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => {
            let mut result = c.to_uppercase().to_string();
            result.push_str(&chars.as_str().to_lowercase());
            result
        }
        None => String::new(),
    }
}
