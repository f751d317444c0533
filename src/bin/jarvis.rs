//! Jarvis console front-end.
//!
//! Typed lines go to the router. An empty line is a trigger event (Enter
//! twice quickly toggles awake/asleep), `/mic` captures one voice command.

use anyhow::Context;
use jarvis::config::AssistantConfig;
use jarvis::controller::{ControllerConfig, SessionController};
use jarvis::dialogue::{DialogueClient, OpenAiChatBackend};
use jarvis::io::{
    CommandCapture, CommandSpeaker, ConsoleSink, Microphone, NoCapture, Output, ProcessLauncher,
    SilentSpeaker, SpeechCapture, SpeechOutput,
};
use jarvis::router::{IntentRouter, RouterParts};
use jarvis::session::Session;
use jarvis::store::Store;
use jarvis::weather::OpenWeatherClient;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config_path = AssistantConfig::default_config_path();
    let first_run = !config_path.exists();
    let config = if first_run {
        AssistantConfig::with_default_apps()
    } else {
        AssistantConfig::from_file(&config_path)
            .with_context(|| format!("failed to load {}", config_path.display()))?
    };

    let _log_guard = init_tracing(&config.storage.logs_dir());
    info!("Jarvis v{} starting", env!("CARGO_PKG_VERSION"));
    if first_run {
        // Leave an editable config behind for the next start.
        match config.save_to_file(&config_path) {
            Ok(()) => info!("wrote default config to {}", config_path.display()),
            Err(e) => warn!("could not write {}: {e}", config_path.display()),
        }
    } else {
        info!("config loaded from {}", config_path.display());
    }

    let controller = Arc::new(build_controller(&config)?);
    let cancel = controller.cancel_token();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down...");
            cancel_clone.cancel();
        }
    });

    controller.greet();
    let listener = config
        .wake_word
        .enabled
        .then(|| controller.spawn_wake_word_listener());

    println!(
        "\nType a command. Press Enter twice quickly to toggle sleep, /mic to speak, Ctrl+C to quit.\n"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            () = cancel.cancelled() => break,
            line = lines.next_line() => line.context("failed to read stdin")?,
        };
        let Some(line) = line else {
            break;
        };
        match line.trim() {
            "" => {
                controller.trigger();
            }
            "/mic" => {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move {
                    controller.handle_voice().await;
                });
            }
            text => {
                controller.handle_text(text).await;
            }
        }
    }

    cancel.cancel();
    if let Some(handle) = listener
        && let Err(e) = handle.await
    {
        warn!("wake word listener ended abnormally: {e}");
    }
    info!("goodbye");
    Ok(())
}

/// Stderr logging plus a daily file under `logs_dir` when it is writable.
fn init_tracing(logs_dir: &Path) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jarvis=info"));
    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match std::fs::create_dir_all(logs_dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(logs_dir, "jarvis.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        Err(e) => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr_layer)
                .init();
            warn!("log directory {} unavailable: {e}", logs_dir.display());
            None
        }
    }
}

/// Credential from the named environment variable, if set and non-empty.
fn credential(var: &str) -> Option<String> {
    let value = std::env::var(var).ok().filter(|v| !v.trim().is_empty());
    if value.is_none() {
        warn!("{var} is not set");
    }
    value
}

fn build_controller(config: &AssistantConfig) -> anyhow::Result<SessionController> {
    let store = Store::from_config(&config.storage);
    info!("profile: {}", store.profile_path().display());
    let session = Arc::new(Session::load(store));

    let capture: Arc<dyn SpeechCapture> = match config
        .speech
        .capture_command
        .as_deref()
        .and_then(CommandCapture::new)
    {
        Some(capture) => Arc::new(capture),
        None => {
            info!("no speech capture configured, voice input disabled");
            Arc::new(NoCapture)
        }
    };
    let speaker: Arc<dyn SpeechOutput> = match config
        .speech
        .speak_command
        .as_deref()
        .and_then(CommandSpeaker::new)
    {
        Some(speaker) => Arc::new(speaker),
        None => Arc::new(SilentSpeaker),
    };
    let microphone = Arc::new(Microphone::new(capture));
    let output = Output::new(Arc::new(ConsoleSink::default()), speaker);

    let backend = OpenAiChatBackend::new(
        &config.dialogue,
        credential(&config.dialogue.api_key_env),
    )?;
    let dialogue = DialogueClient::new(
        Arc::new(backend),
        config.dialogue.backend_name.clone(),
        config.dialogue.system_prompt.clone(),
    );
    let weather = OpenWeatherClient::new(&config.weather, credential(&config.weather.api_key_env));

    let capture_timeout = Duration::from_secs(config.speech.capture_timeout_secs);
    let router = IntentRouter::new(
        session,
        RouterParts {
            dialogue,
            weather: Arc::new(weather),
            launcher: Arc::new(ProcessLauncher),
            microphone: microphone.clone(),
            output: output.clone(),
            apps: config.apps.clone(),
            default_city: config.weather.default_city.clone(),
            capture_timeout,
        },
    );

    Ok(SessionController::new(
        Arc::new(router),
        microphone,
        output,
        ControllerConfig {
            session: config.session.clone(),
            wake_word: config.wake_word.clone(),
            capture_timeout,
        },
    ))
}
