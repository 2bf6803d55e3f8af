//! Speech collaborators: synthesis of finished replies and one-shot
//! voice recognition. Engine internals live behind the traits; the crate
//! only ships logging stand-ins.

pub mod stt;
pub mod tts;

pub use stt::{NullRecognizer, RecognitionEvent, SpeechRecognizer};
pub use tts::{
    sanitize_for_speech, NullSynthesizer, SpeechSynthesizer, TtsCommand, TtsConfig, TtsEvent,
    TtsPipeline,
};
