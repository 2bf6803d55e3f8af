//! Speech output pipeline.
//!
//! Finished replies are handed to a [`SpeechSynthesizer`] on a worker
//! thread via a command channel. Synthesis failures are logged and never
//! reach the transcript.

use crate::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread;
use tracing::{debug, error, info, warn};

/// Configuration for speech output
#[derive(Clone, Debug)]
pub struct TtsConfig {
    /// BCP-47 language preference for the voice.
    pub language: String,

    /// Maximum queue size for pending utterances
    pub queue_size: usize,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            language: "ko".to_string(),
            queue_size: 16,
        }
    }
}

/// Strip everything that is not a letter, digit, or whitespace so the voice
/// does not try to pronounce markup or punctuation.
pub fn sanitize_for_speech(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect()
}

/// Command sent to the speech pipeline
#[derive(Clone, Debug)]
pub enum TtsCommand {
    /// Speak a finished reply
    Speak {
        text: String,
        /// Interrupt the current utterance first
        flush: bool,
    },

    /// Shutdown the pipeline
    Shutdown,
}

/// Event emitted by the speech pipeline
#[derive(Clone, Debug)]
pub enum TtsEvent {
    /// An utterance was handed to the synthesizer
    Spoken { chars: usize },

    /// Synthesis failed; the reply stays visible as text
    Error { error: String },

    /// Pipeline has shut down
    Shutdown,
}

/// The synthesis backend seam.
pub trait SpeechSynthesizer: Send {
    fn speak(&mut self, text: &str, language: &str) -> Result<()>;

    /// Interrupt the current utterance, if any.
    fn stop(&mut self) -> Result<()>;
}

/// Logs utterances instead of producing audio.
///
/// Used where no platform voice is wired up, so the rest of the flow keeps
/// working end to end.
pub struct NullSynthesizer;

impl SpeechSynthesizer for NullSynthesizer {
    fn speak(&mut self, text: &str, language: &str) -> Result<()> {
        info!("speak [{language}]: {text}");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Speech pipeline with channel-based communication
pub struct TtsPipeline {
    config: TtsConfig,
    command_tx: Sender<TtsCommand>,
    command_rx: Receiver<TtsCommand>,
    event_tx: Sender<TtsEvent>,
    event_rx: Receiver<TtsEvent>,
}

impl TtsPipeline {
    pub fn new(config: TtsConfig) -> Self {
        let (command_tx, command_rx) = bounded(config.queue_size);
        let (event_tx, event_rx) = bounded(config.queue_size);

        Self {
            config,
            command_tx,
            command_rx,
            event_tx,
            event_rx,
        }
    }

    /// Get a sender for commands
    pub fn command_sender(&self) -> Sender<TtsCommand> {
        self.command_tx.clone()
    }

    /// Get a receiver for events
    pub fn event_receiver(&self) -> Receiver<TtsEvent> {
        self.event_rx.clone()
    }

    /// Start the worker thread that drives the synthesizer.
    pub fn start_worker(self, mut synthesizer: Box<dyn SpeechSynthesizer>) -> Result<()> {
        let config = self.config.clone();
        let command_rx = self.command_rx.clone();
        let event_tx = self.event_tx.clone();

        thread::spawn(move || {
            info!("speech pipeline worker starting");

            loop {
                match command_rx.recv() {
                    Ok(TtsCommand::Speak { text, flush }) => {
                        if text.trim().is_empty() {
                            warn!("nothing speakable in reply, skipping");
                            continue;
                        }

                        if flush {
                            if let Err(e) = synthesizer.stop() {
                                debug!("could not interrupt current utterance: {e}");
                            }
                        }

                        match synthesizer.speak(&text, &config.language) {
                            Ok(()) => {
                                let _ = event_tx.send(TtsEvent::Spoken { chars: text.chars().count() });
                            }
                            Err(e) => {
                                error!("speech synthesis failed: {e}");
                                let _ = event_tx.send(TtsEvent::Error {
                                    error: e.to_string(),
                                });
                            }
                        }
                    }

                    Ok(TtsCommand::Shutdown) => {
                        info!("speech pipeline worker shutting down");
                        let _ = event_tx.send(TtsEvent::Shutdown);
                        break;
                    }

                    Err(e) => {
                        error!("speech command channel error: {e}");
                        break;
                    }
                }
            }

            info!("speech pipeline worker stopped");
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MurmurError;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct RecordingSynthesizer {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl SpeechSynthesizer for RecordingSynthesizer {
        fn speak(&mut self, text: &str, language: &str) -> Result<()> {
            self.calls.lock().unwrap().push(format!("speak[{language}]:{text}"));
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            self.calls.lock().unwrap().push("stop".to_string());
            Ok(())
        }
    }

    struct FailingSynthesizer;

    impl SpeechSynthesizer for FailingSynthesizer {
        fn speak(&mut self, _text: &str, _language: &str) -> Result<()> {
            Err(MurmurError::Speech("no voice".into()))
        }

        fn stop(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn sanitize_keeps_letters_digits_whitespace() {
        assert_eq!(sanitize_for_speech("Hello, world! 123"), "Hello world 123");
        assert_eq!(sanitize_for_speech("날씨는 *맑음*입니다."), "날씨는 맑음입니다");
        assert_eq!(sanitize_for_speech("a\tb\nc"), "a\tb\nc");
        assert_eq!(sanitize_for_speech("(&^%$)"), "");
    }

    #[test]
    fn flush_stops_before_speaking() {
        let synthesizer = RecordingSynthesizer::default();
        let calls = synthesizer.calls.clone();

        let pipeline = TtsPipeline::new(TtsConfig::default());
        let tx = pipeline.command_sender();
        let rx = pipeline.event_receiver();
        pipeline.start_worker(Box::new(synthesizer)).unwrap();

        tx.send(TtsCommand::Speak {
            text: "hello".into(),
            flush: true,
        })
        .unwrap();

        match rx.recv_timeout(Duration::from_secs(1)).unwrap() {
            TtsEvent::Spoken { chars } => assert_eq!(chars, 5),
            other => panic!("expected Spoken, got {other:?}"),
        }

        let calls = calls.lock().unwrap();
        assert_eq!(calls.as_slice(), ["stop", "speak[ko]:hello"]);
    }

    #[test]
    fn blank_text_is_skipped() {
        let synthesizer = RecordingSynthesizer::default();
        let calls = synthesizer.calls.clone();

        let pipeline = TtsPipeline::new(TtsConfig::default());
        let tx = pipeline.command_sender();
        let rx = pipeline.event_receiver();
        pipeline.start_worker(Box::new(synthesizer)).unwrap();

        tx.send(TtsCommand::Speak {
            text: "   ".into(),
            flush: true,
        })
        .unwrap();
        tx.send(TtsCommand::Shutdown).unwrap();

        match rx.recv_timeout(Duration::from_secs(1)).unwrap() {
            TtsEvent::Shutdown => {}
            other => panic!("expected Shutdown only, got {other:?}"),
        }
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn synthesis_failure_reported_as_event() {
        let pipeline = TtsPipeline::new(TtsConfig::default());
        let tx = pipeline.command_sender();
        let rx = pipeline.event_receiver();
        pipeline.start_worker(Box::new(FailingSynthesizer)).unwrap();

        tx.send(TtsCommand::Speak {
            text: "hello".into(),
            flush: false,
        })
        .unwrap();

        match rx.recv_timeout(Duration::from_secs(1)).unwrap() {
            TtsEvent::Error { error } => assert!(error.contains("no voice")),
            other => panic!("expected Error, got {other:?}"),
        }
    }
}
