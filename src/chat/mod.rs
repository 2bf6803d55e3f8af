//! Chat exchanges: the streaming pipeline and the response assembler.

pub mod assembler;
pub mod pipeline;

pub use assembler::{ExchangePhase, ResponseAssembler, SpeechRequest, PLACEHOLDER_TEXT};
pub use pipeline::{
    CancelToken, ChatCommand, ChatEvent, ChatPipeline, ExchangeHandle, ExchangeId,
};
