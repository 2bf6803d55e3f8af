//! The line-oriented micro protocol spoken by the chat endpoint.
//!
//! The response body is an event-stream-like sequence of lines. Lines that
//! begin with `data: ` carry a JSON payload; everything else (heartbeats,
//! blank lines) is ignored. A malformed payload is reported as a per-line
//! parse error so the caller can log and skip it without dropping the
//! connection.

use crate::{MurmurError, Result};
use serde::Deserialize;

/// Marker that prefixes every payload-carrying line.
pub const DATA_PREFIX: &str = "data: ";

/// Raw JSON payload of one stream line.
///
/// All fields are optional on the wire; missing ones fall back to serde
/// defaults (empty message, `done = false`).
#[derive(Debug, Clone, Deserialize)]
pub struct StreamPayload {
    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub done: bool,

    #[serde(default)]
    pub audio_url: Option<String>,
}

/// One partial result of an in-flight exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialResult {
    /// Token text, possibly empty on the final result.
    pub token: String,

    /// Whether this is the completion signal for the exchange.
    pub done: bool,

    /// Optional URL of a pre-rendered audio version of the reply.
    pub audio_hint: Option<String>,
}

impl From<StreamPayload> for PartialResult {
    fn from(payload: StreamPayload) -> Self {
        Self {
            token: payload.message,
            done: payload.done,
            audio_hint: payload.audio_url,
        }
    }
}

/// Parse a single line of the stream body.
///
/// Returns `None` for lines without the `data: ` marker and for empty
/// heartbeat payloads, `Some(Ok(..))` for a result worth delivering
/// (non-empty token or completion signal), and `Some(Err(..))` for a
/// malformed JSON payload.
pub fn parse_line(line: &str) -> Option<Result<PartialResult>> {
    let data = line.strip_prefix(DATA_PREFIX)?;

    match serde_json::from_str::<StreamPayload>(data) {
        Ok(payload) => {
            let result = PartialResult::from(payload);
            if result.token.is_empty() && !result.done {
                // Heartbeat, nothing to deliver
                None
            } else {
                Some(Ok(result))
            }
        }
        Err(e) => Some(Err(MurmurError::Parse(format!(
            "malformed payload on stream line: {e}"
        )))),
    }
}

/// Incrementally split a byte stream into lines.
///
/// Network chunks do not respect line boundaries, so the splitter buffers
/// raw bytes until a newline completes a line and only then decodes. A
/// multibyte character split across two chunks is reassembled intact.
/// Handles `\r\n` by stripping the trailing `\r`.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buffer: Vec<u8>,
}

impl LineSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a chunk of bytes, returning every line completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();

        for &byte in chunk {
            if byte == b'\n' {
                lines.push(Self::decode(std::mem::take(&mut self.buffer)));
            } else {
                self.buffer.push(byte);
            }
        }

        lines
    }

    /// Flush the trailing line, if the body ended without a newline.
    pub fn flush(&mut self) -> Option<String> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(Self::decode(std::mem::take(&mut self.buffer)))
    }

    fn decode(mut bytes: Vec<u8>) -> String {
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_token_line() {
        let result = parse_line(r#"data: {"message":"Hello","done":false}"#);
        match result {
            Some(Ok(r)) => {
                assert_eq!(r.token, "Hello");
                assert!(!r.done);
                assert!(r.audio_hint.is_none());
            }
            other => panic!("expected token result, got {other:?}"),
        }
    }

    #[test]
    fn parse_applies_field_defaults() {
        let result = parse_line(r#"data: {"done":true}"#);
        match result {
            Some(Ok(r)) => {
                assert!(r.token.is_empty());
                assert!(r.done);
            }
            other => panic!("expected done result, got {other:?}"),
        }
    }

    #[test]
    fn parse_audio_hint_carried_through() {
        let result = parse_line(r#"data: {"message":"hi","audio_url":"https://x/a.mp3"}"#);
        match result {
            Some(Ok(r)) => assert_eq!(r.audio_hint.as_deref(), Some("https://x/a.mp3")),
            other => panic!("expected result with audio hint, got {other:?}"),
        }
    }

    #[test]
    fn parse_skips_non_data_lines() {
        assert!(parse_line("event: ping").is_none());
        assert!(parse_line("").is_none());
        assert!(parse_line(": comment").is_none());
    }

    #[test]
    fn parse_suppresses_empty_heartbeat() {
        // Valid JSON but nothing to deliver
        assert!(parse_line(r#"data: {"message":""}"#).is_none());
        assert!(parse_line("data: {}").is_none());
    }

    #[test]
    fn parse_reports_malformed_json() {
        let result = parse_line("data: {not json");
        match result {
            Some(Err(e)) => assert!(matches!(e, MurmurError::Parse(_))),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn parse_requires_space_after_marker() {
        // The endpoint always emits "data: " with a space
        assert!(parse_line(r#"data:{"message":"x"}"#).is_none());
    }

    #[test]
    fn splitter_single_chunk() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"one\ntwo\n");
        assert_eq!(lines, vec!["one".to_string(), "two".to_string()]);
    }

    #[test]
    fn splitter_line_split_across_chunks() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(b"hel").is_empty());
        let lines = splitter.push(b"lo\n");
        assert_eq!(lines, vec!["hello".to_string()]);
    }

    #[test]
    fn splitter_strips_crlf() {
        let mut splitter = LineSplitter::new();
        let lines = splitter.push(b"hello\r\n");
        assert_eq!(lines, vec!["hello".to_string()]);
    }

    #[test]
    fn splitter_flush_trailing_line() {
        let mut splitter = LineSplitter::new();
        assert!(splitter.push(b"tail").is_empty());
        assert_eq!(splitter.flush(), Some("tail".to_string()));
        assert_eq!(splitter.flush(), None);
    }

    #[test]
    fn splitter_reassembles_multibyte_char_split_across_chunks() {
        let mut splitter = LineSplitter::new();
        let text = "data: {\"message\":\"안녕\"}\n";
        let bytes = text.as_bytes();
        // Byte 20 lands inside the 3-byte encoding of "안"
        assert!(!text.is_char_boundary(20));

        let mut lines = splitter.push(&bytes[..20]);
        lines.extend(splitter.push(&bytes[20..]));

        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("안녕"), "got: {}", lines[0]);
    }

    #[test]
    fn splitter_reassembles_every_mid_char_split() {
        let text = "data: {\"message\":\"날씨는 맑음\"}\n";
        let bytes = text.as_bytes();

        for split_at in 1..bytes.len() {
            let mut splitter = LineSplitter::new();
            let mut lines = splitter.push(&bytes[..split_at]);
            lines.extend(splitter.push(&bytes[split_at..]));

            assert_eq!(lines.len(), 1);
            assert_eq!(lines[0], "data: {\"message\":\"날씨는 맑음\"}");
        }
    }
}
