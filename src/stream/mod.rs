//! Streaming chat transport
//!
//! This module provides:
//! - The `data: `-prefixed line protocol spoken by the chat endpoint
//! - An HTTP client that turns a response body into partial results

pub mod client;
pub mod protocol;

pub use client::{ChatRequest, ChatStreamClient, StreamConfig};
pub use protocol::{LineSplitter, PartialResult, StreamPayload, DATA_PREFIX};
