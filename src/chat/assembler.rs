//! Assembles streamed tokens into the transcript.
//!
//! One assembler tracks one exchange at a time through
//! `Idle → WaitingFirstToken → Streaming → Done` (or `Errored`). While no
//! real token has arrived it animates a placeholder turn; once tokens flow
//! it merges them into the in-progress turn and accumulates the full reply
//! for speech synthesis.

use crate::chat::pipeline::{ChatEvent, ExchangeId};
use crate::speech::sanitize_for_speech;
use crate::transcript::{Transcript, Turn};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Base text of the transient "thinking" turn shown before the first token.
pub const PLACEHOLDER_TEXT: &str = "Thinking";

const ANIMATION_PERIOD: Duration = Duration::from_millis(500);
const MAX_DOTS: usize = 3;

fn placeholder_with_dots(dots: usize) -> String {
    format!("{PLACEHOLDER_TEXT}{}", ".".repeat(dots))
}

/// Where the current exchange stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangePhase {
    Idle,
    WaitingFirstToken,
    Streaming,
    Done,
    Errored,
}

/// A finished reply handed off for speech synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechRequest {
    pub text: String,
    /// Interrupt any current utterance before speaking.
    pub flush: bool,
}

pub struct ResponseAssembler {
    phase: ExchangePhase,
    exchange: Option<ExchangeId>,
    /// Every token of the reply, independent of what the transcript shows.
    buffer: String,
    dots: usize,
    next_dot_at: Option<Instant>,
}

impl Default for ResponseAssembler {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseAssembler {
    pub fn new() -> Self {
        Self {
            phase: ExchangePhase::Idle,
            exchange: None,
            buffer: String::new(),
            dots: 1,
            next_dot_at: None,
        }
    }

    pub fn phase(&self) -> ExchangePhase {
        self.phase
    }

    pub fn exchange(&self) -> Option<ExchangeId> {
        self.exchange
    }

    /// Whether an exchange is currently running.
    pub fn is_active(&self) -> bool {
        matches!(
            self.phase,
            ExchangePhase::WaitingFirstToken | ExchangePhase::Streaming
        )
    }

    /// Start a new exchange: append the user turn and the placeholder.
    pub fn begin(
        &mut self,
        transcript: &mut Transcript,
        user_text: &str,
        exchange: ExchangeId,
        now: Instant,
    ) {
        transcript.push(Turn::user(user_text));
        transcript.push(Turn::bot_in_progress(placeholder_with_dots(1)));

        self.phase = ExchangePhase::WaitingFirstToken;
        self.exchange = Some(exchange);
        self.buffer.clear();
        self.dots = 1;
        self.next_dot_at = Some(now + ANIMATION_PERIOD);
    }

    /// Abandon the current exchange, leaving whatever text already arrived.
    pub fn cancel(&mut self, transcript: &mut Transcript) {
        if self.is_active() {
            debug!("abandoning exchange {:?}", self.exchange);
            transcript.finish_in_progress();
        }
        self.phase = ExchangePhase::Idle;
        self.exchange = None;
        self.next_dot_at = None;
    }

    /// Advance the placeholder animation: cycle 1–3 trailing dots every
    /// 500ms until the first real token arrives.
    pub fn tick(&mut self, transcript: &mut Transcript, now: Instant) {
        if self.phase != ExchangePhase::WaitingFirstToken {
            return;
        }
        let Some(due) = self.next_dot_at else { return };
        if now < due {
            return;
        }

        self.dots = if self.dots >= MAX_DOTS { 1 } else { self.dots + 1 };
        self.next_dot_at = Some(now + ANIMATION_PERIOD);
        transcript.set_in_progress_content(placeholder_with_dots(self.dots));
    }

    /// Apply one pipeline event, mutating the transcript in arrival order.
    ///
    /// Returns a [`SpeechRequest`] when a completed reply should be spoken.
    pub fn apply(&mut self, transcript: &mut Transcript, event: ChatEvent) -> Option<SpeechRequest> {
        match event {
            ChatEvent::Token { token, exchange } => {
                if !self.is_current(exchange) {
                    return None;
                }
                self.on_token(transcript, &token);
                None
            }

            ChatEvent::AudioHint { url, exchange } => {
                if self.is_current(exchange) {
                    debug!("server offered audio rendition: {url}");
                }
                None
            }

            ChatEvent::Complete {
                exchange,
                first_token_ms,
                total_ms,
            } => {
                if !self.is_current(exchange) {
                    return None;
                }
                debug!("reply complete: first token {first_token_ms}ms, total {total_ms}ms");
                self.finish(transcript);
                self.phase = ExchangePhase::Done;
                self.speech_request()
            }

            ChatEvent::Closed { exchange } => {
                if !self.is_current(exchange) {
                    return None;
                }
                warn!("stream closed without completion signal, skipping speech");
                self.finish(transcript);
                self.phase = ExchangePhase::Done;
                None
            }

            ChatEvent::Error { error, exchange } => {
                if !self.is_current(exchange) {
                    return None;
                }
                self.next_dot_at = None;
                transcript.set_in_progress_content(format!("Request failed: {error}"));
                transcript.finish_in_progress();
                self.phase = ExchangePhase::Errored;
                None
            }

            ChatEvent::Shutdown => {
                debug!("chat pipeline shut down");
                None
            }
        }
    }

    fn is_current(&self, exchange: ExchangeId) -> bool {
        if self.exchange == Some(exchange) {
            true
        } else {
            debug!("ignoring event for stale exchange {exchange}");
            false
        }
    }

    fn on_token(&mut self, transcript: &mut Transcript, token: &str) {
        if token.is_empty() {
            return;
        }

        if self.phase == ExchangePhase::WaitingFirstToken {
            self.phase = ExchangePhase::Streaming;
            self.next_dot_at = None;
        }

        self.buffer.push_str(token);

        if let Some(turn) = transcript.in_progress_mut() {
            if turn.content.starts_with(PLACEHOLDER_TEXT) {
                // First real content replaces the placeholder wholesale so no
                // placeholder text lingers in the answer
                turn.content = token.to_string();
            } else {
                turn.content.push_str(token);
            }
        }
    }

    fn finish(&mut self, transcript: &mut Transcript) {
        self.next_dot_at = None;
        transcript.finish_in_progress();
    }

    /// Build the speech hand-off for the accumulated reply, if any.
    fn speech_request(&self) -> Option<SpeechRequest> {
        if self.buffer.trim().is_empty() {
            info!("reply was empty, skipping speech synthesis");
            return None;
        }

        Some(SpeechRequest {
            text: sanitize_for_speech(&self.buffer),
            flush: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn started() -> (ResponseAssembler, Transcript, ExchangeId, Instant) {
        let mut assembler = ResponseAssembler::new();
        let mut transcript = Transcript::new();
        let exchange = Uuid::new_v4();
        let now = Instant::now();
        assembler.begin(&mut transcript, "question", exchange, now);
        (assembler, transcript, exchange, now)
    }

    fn token(token: &str, exchange: ExchangeId) -> ChatEvent {
        ChatEvent::Token {
            token: token.to_string(),
            exchange,
        }
    }

    fn complete(exchange: ExchangeId) -> ChatEvent {
        ChatEvent::Complete {
            exchange,
            first_token_ms: 10,
            total_ms: 100,
        }
    }

    #[test]
    fn begin_appends_user_and_placeholder_turns() {
        let (assembler, transcript, _, _) = started();

        assert_eq!(assembler.phase(), ExchangePhase::WaitingFirstToken);
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.turns()[0].content, "question");
        assert!(transcript.turns()[0].is_user());
        assert_eq!(transcript.turns()[1].content, "Thinking.");
        assert!(transcript.turns()[1].streaming);
    }

    #[test]
    fn tick_cycles_one_to_three_dots() {
        let (mut assembler, mut transcript, _, now) = started();

        assembler.tick(&mut transcript, now + Duration::from_millis(500));
        assert_eq!(transcript.in_progress().unwrap().content, "Thinking..");

        assembler.tick(&mut transcript, now + Duration::from_millis(1000));
        assert_eq!(transcript.in_progress().unwrap().content, "Thinking...");

        assembler.tick(&mut transcript, now + Duration::from_millis(1500));
        assert_eq!(transcript.in_progress().unwrap().content, "Thinking.");
    }

    #[test]
    fn tick_before_period_does_nothing() {
        let (mut assembler, mut transcript, _, now) = started();

        assembler.tick(&mut transcript, now + Duration::from_millis(100));
        assert_eq!(transcript.in_progress().unwrap().content, "Thinking.");
    }

    #[test]
    fn first_token_replaces_placeholder_wholesale() {
        let (mut assembler, mut transcript, exchange, _) = started();

        assembler.apply(&mut transcript, token("Hello", exchange));

        assert_eq!(assembler.phase(), ExchangePhase::Streaming);
        assert_eq!(transcript.in_progress().unwrap().content, "Hello");
    }

    #[test]
    fn later_tokens_append() {
        let (mut assembler, mut transcript, exchange, _) = started();

        assembler.apply(&mut transcript, token("Hello", exchange));
        assembler.apply(&mut transcript, token(" world", exchange));

        assert_eq!(transcript.in_progress().unwrap().content, "Hello world");
    }

    #[test]
    fn animation_stops_after_first_token() {
        let (mut assembler, mut transcript, exchange, now) = started();

        assembler.apply(&mut transcript, token("Hello", exchange));
        assembler.tick(&mut transcript, now + Duration::from_secs(10));

        assert_eq!(transcript.in_progress().unwrap().content, "Hello");
    }

    #[test]
    fn buffer_concatenates_every_token_in_order() {
        let (mut assembler, mut transcript, exchange, _) = started();

        for part in ["A", "B", "C"] {
            assembler.apply(&mut transcript, token(part, exchange));
        }
        let speech = assembler.apply(&mut transcript, complete(exchange));

        assert_eq!(speech.unwrap().text, "ABC");
    }

    #[test]
    fn complete_hands_sanitized_text_to_speech() {
        let (mut assembler, mut transcript, exchange, _) = started();

        assembler.apply(&mut transcript, token("Hello", exchange));
        assembler.apply(&mut transcript, token(" world", exchange));
        let speech = assembler.apply(&mut transcript, complete(exchange));

        let speech = speech.unwrap();
        assert_eq!(speech.text, "Hello world");
        assert!(speech.flush);
        assert_eq!(assembler.phase(), ExchangePhase::Done);
        assert!(transcript.in_progress().is_none());
    }

    #[test]
    fn punctuation_stripped_for_speech() {
        let (mut assembler, mut transcript, exchange, _) = started();

        assembler.apply(&mut transcript, token("안녕하세요! (hello?)", exchange));
        let speech = assembler.apply(&mut transcript, complete(exchange));

        assert_eq!(speech.unwrap().text, "안녕하세요 hello");
    }

    #[test]
    fn blank_reply_skips_speech() {
        let (mut assembler, mut transcript, exchange, _) = started();

        let speech = assembler.apply(&mut transcript, complete(exchange));

        assert!(speech.is_none());
        assert_eq!(assembler.phase(), ExchangePhase::Done);
    }

    #[test]
    fn closed_stream_finishes_without_speech() {
        let (mut assembler, mut transcript, exchange, _) = started();

        assembler.apply(&mut transcript, token("partial", exchange));
        let speech = assembler.apply(&mut transcript, ChatEvent::Closed { exchange });

        assert!(speech.is_none());
        assert!(transcript.in_progress().is_none());
        assert_eq!(transcript.turns().last().unwrap().content, "partial");
    }

    #[test]
    fn error_replaces_placeholder_with_reason() {
        let (mut assembler, mut transcript, exchange, _) = started();

        assembler.apply(
            &mut transcript,
            ChatEvent::Error {
                error: "server returned 503".into(),
                exchange,
            },
        );

        assert_eq!(assembler.phase(), ExchangePhase::Errored);
        let last = transcript.turns().last().unwrap();
        assert!(last.content.contains("server returned 503"));
        assert!(!last.streaming);
    }

    #[test]
    fn stale_exchange_events_are_ignored() {
        let (mut assembler, mut transcript, _, _) = started();
        let stale = Uuid::new_v4();

        assembler.apply(&mut transcript, token("ghost", stale));
        let speech = assembler.apply(&mut transcript, complete(stale));

        assert!(speech.is_none());
        assert_eq!(assembler.phase(), ExchangePhase::WaitingFirstToken);
        assert_eq!(transcript.in_progress().unwrap().content, "Thinking.");
    }

    #[test]
    fn cancel_closes_in_progress_turn() {
        let (mut assembler, mut transcript, exchange, _) = started();

        assembler.apply(&mut transcript, token("half an ans", exchange));
        assembler.cancel(&mut transcript);

        assert_eq!(assembler.phase(), ExchangePhase::Idle);
        assert!(transcript.in_progress().is_none());
    }

    #[test]
    fn new_exchange_resets_buffer() {
        let (mut assembler, mut transcript, exchange, now) = started();

        assembler.apply(&mut transcript, token("first reply", exchange));
        assembler.apply(&mut transcript, complete(exchange));

        let second = Uuid::new_v4();
        assembler.begin(&mut transcript, "again", second, now);
        assembler.apply(&mut transcript, token("second", second));
        let speech = assembler.apply(&mut transcript, complete(second));

        assert_eq!(speech.unwrap().text, "second");
    }
}
