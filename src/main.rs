//! Murmur - voice chat client for a streaming chatbot backend
//!
//! Main entry point for the Murmur application.

use anyhow::Context;
use eframe::egui;
use murmur::chat::ChatPipeline;
use murmur::config::AppConfig;
use murmur::session::{load_or_create_device_id, FixedLocation, LocationSource, SessionContext};
use murmur::speech::{NullRecognizer, NullSynthesizer, TtsConfig, TtsPipeline};
use murmur::ui::{AppState, MurmurApp};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "murmur=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Murmur");

    let config = AppConfig::load().context("loading configuration")?;
    config.validate().context("validating configuration")?;

    // Backend workers
    let chat = ChatPipeline::new(config.stream_config());
    let chat_command_tx = chat.command_sender();
    let chat_event_rx = chat.event_receiver();
    chat.start_worker().context("starting chat pipeline")?;

    let tts = TtsPipeline::new(TtsConfig {
        language: config.language.clone(),
        ..TtsConfig::default()
    });
    let tts_command_tx = tts.command_sender();
    let tts_event_rx = tts.event_receiver();
    tts.start_worker(Box::new(NullSynthesizer))
        .context("starting speech pipeline")?;

    // Session context and one-shot location fix
    let device_id = load_or_create_device_id();
    tracing::info!("device id: {device_id}");

    let mut state = AppState::new(SessionContext::new(device_id));
    state.chat_command_tx = Some(chat_command_tx);
    state.chat_event_rx = Some(chat_event_rx);
    state.tts_command_tx = Some(tts_command_tx);
    state.tts_event_rx = Some(tts_event_rx);
    state.recognizer = Some(Box::new(NullRecognizer));

    let (location_tx, location_rx) = crossbeam_channel::bounded(4);
    FixedLocation::new(config.location).request_fix(location_tx);
    state.location_rx = Some(location_rx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([480.0, 720.0])
            .with_min_inner_size([360.0, 480.0])
            .with_title("Murmur"),
        ..Default::default()
    };

    eframe::run_native(
        "Murmur",
        options,
        Box::new(|cc| Ok(Box::new(MurmurApp::new(cc, state)))),
    )
    .map_err(|e| anyhow::anyhow!("UI error: {e}"))
}
