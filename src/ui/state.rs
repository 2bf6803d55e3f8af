//! Application state management
//!
//! The central state for the Murmur UI. The transcript lives here and is
//! mutated only on the UI thread: backend workers deliver their results
//! over channels and [`AppState::poll_events`] applies them each frame in
//! arrival order.

use crate::chat::{
    CancelToken, ChatCommand, ChatEvent, ExchangeHandle, ResponseAssembler,
};
use crate::session::{Coordinates, SessionContext};
use crate::speech::{RecognitionEvent, SpeechRecognizer, TtsCommand, TtsEvent};
use crate::stream::ChatRequest;
use crate::transcript::Transcript;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// State of the voice input button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    /// Not listening
    Idle,
    /// The recognizer is capturing speech
    Listening,
}

/// Central application state
pub struct AppState {
    /// Conversation transcript, owned by the UI thread
    pub transcript: Transcript,

    /// Assembler for the active exchange
    pub assembler: ResponseAssembler,

    /// Request context (device id, last known coordinates)
    pub session: SessionContext,

    /// Current text input
    pub input_text: String,

    /// Voice input state
    pub voice_state: VoiceState,

    /// Last error shown in the status line
    pub last_error: Option<String>,

    /// Channel to send chat commands
    pub chat_command_tx: Option<Sender<ChatCommand>>,

    /// Channel to receive chat events
    pub chat_event_rx: Option<Receiver<ChatEvent>>,

    /// Channel to send speech-output commands
    pub tts_command_tx: Option<Sender<TtsCommand>>,

    /// Channel to receive speech-output events
    pub tts_event_rx: Option<Receiver<TtsEvent>>,

    /// Channel delivering one-shot location fixes
    pub location_rx: Option<Receiver<Coordinates>>,

    /// Voice recognition backend
    pub recognizer: Option<Box<dyn SpeechRecognizer>>,

    recognition_tx: Sender<RecognitionEvent>,
    recognition_rx: Receiver<RecognitionEvent>,

    active_exchange: Option<ExchangeHandle>,
}

impl AppState {
    pub fn new(session: SessionContext) -> Self {
        let (recognition_tx, recognition_rx) = bounded(8);

        Self {
            transcript: Transcript::new(),
            assembler: ResponseAssembler::new(),
            session,
            input_text: String::new(),
            voice_state: VoiceState::Idle,
            last_error: None,
            chat_command_tx: None,
            chat_event_rx: None,
            tts_command_tx: None,
            tts_event_rx: None,
            location_rx: None,
            recognizer: None,
            recognition_tx,
            recognition_rx,
            active_exchange: None,
        }
    }

    /// Whether a reply is currently being generated
    pub fn is_generating(&self) -> bool {
        self.assembler.is_active()
    }

    /// Send the typed message
    pub fn send_message(&mut self) {
        let text = self.input_text.trim().to_string();
        if text.is_empty() {
            return;
        }
        self.input_text.clear();
        self.submit(text);
    }

    /// Run one exchange for `text`.
    ///
    /// A send while a previous exchange is still streaming cancels that
    /// exchange first; two exchanges never write to the transcript at once.
    pub fn submit(&mut self, text: String) {
        if let Some(handle) = self.active_exchange.take() {
            debug!("new send cancels exchange {}", handle.id);
            handle.cancel();
            self.assembler.cancel(&mut self.transcript);
        }

        let exchange = Uuid::new_v4();
        self.assembler
            .begin(&mut self.transcript, &text, exchange, Instant::now());

        if let Some(tx) = &self.chat_command_tx {
            let cancel = CancelToken::new();
            let request = ChatRequest {
                text,
                device_id: self.session.device_id.clone(),
                coordinates: self.session.coordinates,
            };

            let _ = tx.send(ChatCommand::Send {
                request,
                exchange,
                cancel: cancel.clone(),
            });
            self.active_exchange = Some(ExchangeHandle::new(exchange, cancel));
        }
    }

    /// Stop the active exchange, keeping whatever text already arrived
    pub fn cancel_exchange(&mut self) {
        if let Some(handle) = self.active_exchange.take() {
            handle.cancel();
        }
        self.assembler.cancel(&mut self.transcript);
    }

    /// Begin a one-shot voice recognition attempt
    pub fn start_voice_input(&mut self) {
        if self.voice_state != VoiceState::Idle {
            return;
        }

        let events = self.recognition_tx.clone();
        if let Some(recognizer) = &mut self.recognizer {
            if let Err(e) = recognizer.start(events) {
                debug!("voice input unavailable: {e}");
            }
        } else {
            debug!("no recognizer configured");
        }
    }

    /// Process incoming events from backend channels, in arrival order.
    pub fn poll_events(&mut self) {
        self.assembler.tick(&mut self.transcript, Instant::now());

        // Chat events - collect first, then process
        let chat_events: Vec<ChatEvent> = self
            .chat_event_rx
            .as_ref()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default();

        for event in chat_events {
            if self.is_terminal_for_active(&event) {
                self.active_exchange = None;
            }
            if let ChatEvent::Error { error, .. } = &event {
                self.last_error = Some(error.clone());
            }

            let speech = self.assembler.apply(&mut self.transcript, event);
            if let (Some(request), Some(tx)) = (speech, &self.tts_command_tx) {
                let _ = tx.send(TtsCommand::Speak {
                    text: request.text,
                    flush: request.flush,
                });
            }
        }

        // Speech-output events
        let tts_events: Vec<TtsEvent> = self
            .tts_event_rx
            .as_ref()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default();

        for event in tts_events {
            match event {
                TtsEvent::Spoken { chars } => debug!("spoke {chars} characters"),
                TtsEvent::Error { error } => warn!("speech output failed: {error}"),
                TtsEvent::Shutdown => debug!("speech pipeline shut down"),
            }
        }

        // Recognition events
        let recognitions: Vec<RecognitionEvent> = self.recognition_rx.try_iter().collect();
        for event in recognitions {
            match event {
                RecognitionEvent::Ready => self.voice_state = VoiceState::Listening,
                RecognitionEvent::Transcript(text) => {
                    self.voice_state = VoiceState::Idle;
                    let text = text.trim().to_string();
                    if !text.is_empty() {
                        self.submit(text);
                    }
                }
                RecognitionEvent::NoMatch => self.voice_state = VoiceState::Idle,
                RecognitionEvent::Error(e) => {
                    // Only the button label resets; nothing is shown
                    debug!("recognition failed: {e}");
                    self.voice_state = VoiceState::Idle;
                }
            }
        }

        // Location fixes - last known fix wins
        let fixes: Vec<Coordinates> = self
            .location_rx
            .as_ref()
            .map(|rx| rx.try_iter().collect())
            .unwrap_or_default();
        for fix in fixes {
            self.session.update_fix(fix);
        }
    }

    fn is_terminal_for_active(&self, event: &ChatEvent) -> bool {
        let active = match &self.active_exchange {
            Some(handle) => handle.id,
            None => return false,
        };

        matches!(
            event,
            ChatEvent::Complete { exchange, .. }
            | ChatEvent::Closed { exchange }
            | ChatEvent::Error { exchange, .. }
            if *exchange == active
        )
    }

    /// Clear the conversation
    pub fn clear_transcript(&mut self) {
        self.cancel_exchange();
        self.transcript.clear();
        self.last_error = None;
    }
}
