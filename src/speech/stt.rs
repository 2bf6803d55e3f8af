//! One-shot speech recognition.
//!
//! Platform recognizers are callback-based; here a recognition attempt is a
//! collaborator that reports its outcome over a channel. No result and
//! errors both leave the conversation untouched; only a transcript is acted
//! on.

use crate::Result;
use crossbeam_channel::Sender;
use tracing::debug;

/// Outcome events of one recognition attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// The recognizer is listening
    Ready,

    /// Best-effort transcript of what was heard
    Transcript(String),

    /// Nothing intelligible was heard; silently ignored
    NoMatch,

    /// Recognition failed; only the voice button state is reset
    Error(String),
}

/// The recognition backend seam.
pub trait SpeechRecognizer: Send {
    /// Begin a one-shot recognition attempt; outcome arrives on `events`.
    fn start(&mut self, events: Sender<RecognitionEvent>) -> Result<()>;
}

/// Recognizer used where no microphone backend is wired up.
///
/// Reports listening and then no result, so the voice button round-trips
/// without affecting the conversation.
pub struct NullRecognizer;

impl SpeechRecognizer for NullRecognizer {
    fn start(&mut self, events: Sender<RecognitionEvent>) -> Result<()> {
        debug!("no recognizer backend, voice input is a no-op");
        std::thread::spawn(move || {
            let _ = events.send(RecognitionEvent::Ready);
            let _ = events.send(RecognitionEvent::NoMatch);
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::time::Duration;

    #[test]
    fn null_recognizer_reports_ready_then_no_match() {
        let (tx, rx) = bounded(4);
        NullRecognizer.start(tx).unwrap();

        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            RecognitionEvent::Ready
        );
        assert_eq!(
            rx.recv_timeout(Duration::from_secs(1)).unwrap(),
            RecognitionEvent::NoMatch
        );
    }
}
