//! Ordered intent classification.
//!
//! Matching is plain substring containment on the lowercased utterance and
//! the first match wins, in this order:
//!
//! | # | Intent | Trigger |
//! |---|--------|---------|
//! | 1 | identity statement | "my name is" |
//! | 2 | memory recall request | "remember this" |
//! | 3 | who am I | "who am i", "do you know me" |
//! | 4 | birthday statement | "my birthday is" |
//! | 5 | birthday query | "when is my birthday" |
//! | 6 | shutdown | "shutdown", "exit" |
//! | 7 | app launch | configured alias phrases |
//! | 8 | weather | "weather" |
//! | 9 | arithmetic | "plus", "minus", "times", "divided" |
//! | 10 | dialogue | anything else |

use crate::arithmetic;
use crate::config::AppAlias;

/// A recognized utterance category with whatever it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Nothing usable was heard or typed.
    Empty,
    IdentityStatement { name: String },
    /// `inline` is the text after the trigger, if any.
    RememberThis { inline: Option<String> },
    WhoAmI,
    BirthdayStatement { dob: String },
    BirthdayQuery,
    Shutdown,
    LaunchApp(AppAlias),
    /// `city` is `None` when the utterance names no city.
    Weather { city: Option<String> },
    Arithmetic,
    Dialogue,
}

impl Intent {
    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::IdentityStatement { .. } => "identity_statement",
            Self::RememberThis { .. } => "remember_this",
            Self::WhoAmI => "who_am_i",
            Self::BirthdayStatement { .. } => "birthday_statement",
            Self::BirthdayQuery => "birthday_query",
            Self::Shutdown => "shutdown",
            Self::LaunchApp(_) => "launch_app",
            Self::Weather { .. } => "weather",
            Self::Arithmetic => "arithmetic",
            Self::Dialogue => "dialogue",
        }
    }
}

/// Text after the last occurrence of `marker`, trimmed.
fn after_last<'a>(utterance: &'a str, marker: &str) -> &'a str {
    utterance
        .rsplit_once(marker)
        .map_or("", |(_, rest)| rest)
        .trim()
}

/// City named after the last standalone word "in".
fn weather_city(utterance: &str) -> Option<String> {
    let words: Vec<&str> = utterance.split_whitespace().collect();
    let pos = words.iter().rposition(|w| *w == "in")?;
    let city = words[pos + 1..]
        .join(" ")
        .trim_end_matches(['?', '.', '!'])
        .trim()
        .to_owned();
    (!city.is_empty()).then_some(city)
}

/// Classify a lowercased utterance.
#[must_use]
pub fn classify(utterance: &str, apps: &[AppAlias]) -> Intent {
    let text = utterance.trim();
    if text.is_empty() {
        return Intent::Empty;
    }

    if text.contains("my name is") {
        return Intent::IdentityStatement {
            name: after_last(text, "my name is").to_owned(),
        };
    }
    if text.contains("remember this") {
        let inline = after_last(text, "remember this")
            .trim_start_matches([':', ',', '-'])
            .trim();
        return Intent::RememberThis {
            inline: (!inline.is_empty()).then(|| inline.to_owned()),
        };
    }
    if text.contains("who am i") || text.contains("do you know me") {
        return Intent::WhoAmI;
    }
    if text.contains("my birthday is") {
        return Intent::BirthdayStatement {
            dob: after_last(text, "my birthday is").to_owned(),
        };
    }
    if text.contains("when is my birthday") {
        return Intent::BirthdayQuery;
    }
    if text.contains("shutdown") || text.contains("exit") {
        return Intent::Shutdown;
    }
    if let Some(app) = apps.iter().find(|a| text.contains(a.phrase.as_str())) {
        return Intent::LaunchApp(app.clone());
    }
    if text.contains("weather") {
        return Intent::Weather {
            city: weather_city(text),
        };
    }
    if arithmetic::mentions_operator(text) {
        return Intent::Arithmetic;
    }
    Intent::Dialogue
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use crate::config::default_apps;

    fn classify_default(text: &str) -> Intent {
        classify(text, &default_apps())
    }

    #[test]
    fn each_intent_is_recognized() {
        assert_eq!(
            classify_default("hello, my name is tony stark"),
            Intent::IdentityStatement {
                name: "tony stark".to_owned()
            }
        );
        assert_eq!(
            classify_default("remember this"),
            Intent::RememberThis { inline: None }
        );
        assert_eq!(
            classify_default("remember this: i like tea"),
            Intent::RememberThis {
                inline: Some("i like tea".to_owned())
            }
        );
        assert_eq!(classify_default("who am i"), Intent::WhoAmI);
        assert_eq!(classify_default("do you know me"), Intent::WhoAmI);
        assert_eq!(
            classify_default("my birthday is 12 march"),
            Intent::BirthdayStatement {
                dob: "12 march".to_owned()
            }
        );
        assert_eq!(classify_default("when is my birthday"), Intent::BirthdayQuery);
        assert_eq!(classify_default("please exit"), Intent::Shutdown);
        assert_eq!(classify_default("open calculator"), Intent::LaunchApp(default_apps()[1].clone()));
        assert_eq!(
            classify_default("what's the weather in new york?"),
            Intent::Weather {
                city: Some("new york".to_owned())
            }
        );
        assert_eq!(classify_default("weather"), Intent::Weather { city: None });
        assert_eq!(classify_default("5 plus 3"), Intent::Arithmetic);
        assert_eq!(classify_default("tell me a joke"), Intent::Dialogue);
        assert_eq!(classify_default("   "), Intent::Empty);
    }

    #[test]
    fn shutdown_outranks_weather() {
        assert_eq!(classify_default("shutdown the weather please"), Intent::Shutdown);
    }

    #[test]
    fn earlier_intents_outrank_later_ones() {
        assert!(matches!(
            classify_default("my name is bob, what's the weather"),
            Intent::IdentityStatement { .. }
        ));
        assert!(matches!(
            classify_default("open notepad and add 2 plus 2"),
            Intent::LaunchApp(_)
        ));
        assert_eq!(classify_default("weather plus wind"), Intent::Weather { city: None });
    }

    #[test]
    fn weather_city_ignores_embedded_in() {
        // "raining" contains "in" but is not the word "in".
        assert_eq!(weather_city("is it raining weather"), None);
        assert_eq!(weather_city("weather in"), None);
        assert_eq!(
            weather_city("weather in rio in brazil"),
            Some("brazil".to_owned())
        );
    }
}
