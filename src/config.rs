//! Configuration types for the assistant.

use crate::error::{AssistantError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Where the profile and chat history documents live.
    pub storage: StorageConfig,
    /// Remote dialogue backend (OpenAI-compatible chat completions).
    pub dialogue: DialogueConfig,
    /// Weather lookups.
    pub weather: WeatherConfig,
    /// Awake/asleep toggle and user-facing notices.
    pub session: SessionConfig,
    /// Background wake word listener.
    pub wake_word: WakeWordConfig,
    /// External speech capture / speech output programs.
    pub speech: SpeechConfig,
    /// App-launch aliases, matched in order.
    pub apps: Vec<AppAlias>,
}

/// Persistence locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding both documents (None = platform data dir).
    pub data_dir: Option<PathBuf>,
    /// Profile document file name.
    pub profile_file: String,
    /// Chat history document file name.
    pub transcript_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            profile_file: "jarvis_profile.json".to_owned(),
            transcript_file: "jarvis_chat_history.json".to_owned(),
        }
    }
}

impl StorageConfig {
    /// Resolved data directory.
    #[must_use]
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(crate::jarvis_dirs::data_dir)
    }

    /// Full path of the profile document.
    #[must_use]
    pub fn profile_path(&self) -> PathBuf {
        self.resolved_data_dir().join(&self.profile_file)
    }

    /// Full path of the chat history document.
    #[must_use]
    pub fn transcript_path(&self) -> PathBuf {
        self.resolved_data_dir().join(&self.transcript_file)
    }

    /// Log file directory (`<data dir>/logs`).
    #[must_use]
    pub fn logs_dir(&self) -> PathBuf {
        self.resolved_data_dir().join("logs")
    }
}

/// Remote dialogue backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Name used as the prefix of error replies ("<name> error: ...").
    pub backend_name: String,
    /// Base URL of the OpenAI-compatible API (with or without `/v1`).
    pub api_url: String,
    /// Model identifier.
    pub model: String,
    /// System preamble sent as the first message of every request.
    pub system_prompt: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            backend_name: "Groq".to_owned(),
            api_url: "https://api.groq.com/openai/v1".to_owned(),
            model: "llama-3.3-70b-versatile".to_owned(),
            system_prompt: "You are Jarvis, a helpful assistant.".to_owned(),
            api_key_env: "GROQ_API_KEY".to_owned(),
            timeout_secs: 60,
        }
    }
}

/// Weather lookup settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Current-conditions endpoint.
    pub api_url: String,
    /// City used when the utterance names none.
    pub default_city: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: "http://api.openweathermap.org/data/2.5/weather".to_owned(),
            default_city: "Mumbai".to_owned(),
            api_key_env: "OPENWEATHER_API_KEY".to_owned(),
            timeout_secs: 10,
        }
    }
}

/// Session toggle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Two trigger events closer than this toggle awake/asleep.
    pub toggle_window_ms: u64,
    /// Reply to voice commands while asleep.
    pub sleeping_notice: String,
    /// Optional notice shown after a failed capture (None = silent).
    pub miss_notice: Option<String>,
    /// Speak a short filler phrase before remote replies.
    pub thinking_phrases: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            toggle_window_ms: 500,
            sleeping_notice: "I'm sleeping. Press Enter twice to wake me.".to_owned(),
            miss_notice: Some("Sorry, I didn't catch that.".to_owned()),
            thinking_phrases: true,
        }
    }
}

impl SessionConfig {
    /// Toggle window as a [`Duration`].
    #[must_use]
    pub fn toggle_window(&self) -> Duration {
        Duration::from_millis(self.toggle_window_ms)
    }
}

/// Background wake word listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WakeWordConfig {
    /// Whether the listener task is started.
    pub enabled: bool,
    /// Trigger phrase (case-insensitive substring).
    pub phrase: String,
    /// Capture timeout while waiting for the trigger phrase.
    pub listen_timeout_secs: u64,
    /// Capture timeout for the single follow-up command.
    pub command_timeout_secs: u64,
}

impl Default for WakeWordConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            phrase: "jarvis".to_owned(),
            listen_timeout_secs: 3,
            command_timeout_secs: 5,
        }
    }
}

/// External speech programs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Recognizer program printing the recognized text on stdout.
    pub capture_command: Option<Vec<String>>,
    /// TTS program receiving the text as its final argument.
    pub speak_command: Option<Vec<String>>,
    /// Capture timeout for mic-button commands.
    pub capture_timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            capture_command: None,
            speak_command: None,
            capture_timeout_secs: 8,
        }
    }
}

/// One app-launch alias: `phrase` in the utterance launches `program`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppAlias {
    /// Substring that triggers the launch (lowercase).
    pub phrase: String,
    /// Program to spawn.
    pub program: String,
    /// Program arguments.
    #[serde(default)]
    pub args: Vec<String>,
    /// Name used in the reply ("Opening <label>.").
    pub label: String,
}

/// Default launch aliases.
#[must_use]
pub fn default_apps() -> Vec<AppAlias> {
    let (notepad, calculator) = if cfg!(target_os = "windows") {
        ("notepad", "calc")
    } else if cfg!(target_os = "macos") {
        ("TextEdit", "Calculator")
    } else {
        ("gedit", "gnome-calculator")
    };
    let wrap = |app: &str| -> (String, Vec<String>) {
        if cfg!(target_os = "macos") {
            ("open".to_owned(), vec!["-a".to_owned(), app.to_owned()])
        } else {
            (app.to_owned(), Vec::new())
        }
    };
    let (np_program, np_args) = wrap(notepad);
    let (calc_program, calc_args) = wrap(calculator);
    vec![
        AppAlias {
            phrase: "open notepad".to_owned(),
            program: np_program,
            args: np_args,
            label: "Notepad".to_owned(),
        },
        AppAlias {
            phrase: "open calculator".to_owned(),
            program: calc_program,
            args: calc_args,
            label: "Calculator".to_owned(),
        },
    ]
}

impl AssistantConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// An absent `apps` list means the default aliases.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self =
            toml::from_str(&content).map_err(|e| AssistantError::Config(e.to_string()))?;
        if config.apps.is_empty() {
            config.apps = default_apps();
        }
        Ok(config)
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AssistantError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Default config file path: `<config_dir>/config.toml`.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        crate::jarvis_dirs::config_file()
    }

    /// Defaults with the built-in app aliases filled in.
    #[must_use]
    pub fn with_default_apps() -> Self {
        Self {
            apps: default_apps(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AssistantConfig::with_default_apps();
        assert_eq!(config.session.toggle_window(), Duration::from_millis(500));
        assert_eq!(config.weather.default_city, "Mumbai");
        assert_eq!(config.dialogue.backend_name, "Groq");
        assert!(!config.wake_word.enabled);
        assert_eq!(config.apps.len(), 2);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AssistantConfig::with_default_apps();
        config.session.toggle_window_ms = 300;
        config.wake_word.phrase = "friday".to_owned();
        config.speech.speak_command = Some(vec!["espeak".to_owned()]);

        config.save_to_file(&path).unwrap();
        let loaded = AssistantConfig::from_file(&path).unwrap();
        assert_eq!(loaded.session.toggle_window_ms, 300);
        assert_eq!(loaded.wake_word.phrase, "friday");
        assert_eq!(loaded.speech.speak_command, Some(vec!["espeak".to_owned()]));
        assert_eq!(loaded.apps, config.apps);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[weather]\ndefault_city = \"Pune\"\n").unwrap();

        let loaded = AssistantConfig::from_file(&path).unwrap();
        assert_eq!(loaded.weather.default_city, "Pune");
        assert_eq!(loaded.weather.api_key_env, "OPENWEATHER_API_KEY");
        assert_eq!(loaded.storage.profile_file, "jarvis_profile.json");
        assert_eq!(loaded.apps.len(), 2);
    }

    #[test]
    fn custom_apps_replace_defaults() {
        let toml_str = r#"
[[apps]]
phrase = "open browser"
program = "firefox"
label = "Firefox"
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, toml_str).unwrap();

        let loaded = AssistantConfig::from_file(&path).unwrap();
        assert_eq!(loaded.apps.len(), 1);
        assert_eq!(loaded.apps[0].label, "Firefox");
        assert!(loaded.apps[0].args.is_empty());
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();
        assert!(matches!(
            AssistantConfig::from_file(&path),
            Err(AssistantError::Config(_))
        ));
    }

    #[test]
    fn storage_paths_join_data_dir() {
        let storage = StorageConfig {
            data_dir: Some(PathBuf::from("/var/jarvis")),
            ..StorageConfig::default()
        };
        assert_eq!(
            storage.profile_path(),
            PathBuf::from("/var/jarvis/jarvis_profile.json")
        );
        assert_eq!(
            storage.transcript_path(),
            PathBuf::from("/var/jarvis/jarvis_chat_history.json")
        );
        assert_eq!(storage.logs_dir(), PathBuf::from("/var/jarvis/logs"));
    }
}
