//! HTTP client for the streaming chat endpoint.
//!
//! Each call to [`ChatStreamClient::open_stream`] opens a fresh connection
//! and yields [`PartialResult`]s as `data: ` lines arrive. The stream ends
//! after the completion signal or when the body is exhausted; dropping it
//! closes the connection.

use crate::session::Coordinates;
use crate::stream::protocol::{parse_line, LineSplitter, PartialResult};
use crate::{MurmurError, Result};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, warn};

/// Connection settings for the chat endpoint.
#[derive(Clone, Debug)]
pub struct StreamConfig {
    /// Base URL of the chat backend, without a trailing path.
    pub base_url: String,

    /// Timeout for establishing the connection.
    pub connect_timeout: Duration,

    /// Timeout for each body read; streams idle longer than this fail.
    pub read_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(120),
        }
    }
}

/// One outgoing chat request.
#[derive(Clone, Debug)]
pub struct ChatRequest {
    /// The user's message text.
    pub text: String,

    /// Stable per-install identifier attached as `uid`.
    pub device_id: String,

    /// Last known coordinates, attached when present.
    pub coordinates: Option<Coordinates>,
}

/// Client for the `/chat-stream` endpoint.
pub struct ChatStreamClient {
    http: reqwest::Client,
    config: StreamConfig,
}

impl ChatStreamClient {
    pub fn new(config: StreamConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()
            .map_err(|e| MurmurError::Transport(format!("failed to build http client: {e}")))?;

        Ok(Self { http, config })
    }

    /// Build the request URL with url-encoded query parameters.
    fn endpoint(&self, request: &ChatRequest) -> Result<reqwest::Url> {
        let base = self.config.base_url.trim_end_matches('/');
        let mut url = reqwest::Url::parse(&format!("{base}/chat-stream"))
            .map_err(|e| MurmurError::Config(format!("invalid base url {base:?}: {e}")))?;

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("text", &request.text);
            pairs.append_pair("uid", &request.device_id);
            pairs.append_pair("client_type", "app");

            if let Some(coords) = request.coordinates {
                pairs.append_pair("lat", &coords.lat.to_string());
                pairs.append_pair("lon", &coords.lon.to_string());
            }
        }

        Ok(url)
    }

    /// Open a new connection and stream partial results.
    ///
    /// A non-success status or a connect failure yields a single
    /// `Transport` error. Malformed lines are logged and skipped.
    pub fn open_stream(
        &self,
        request: ChatRequest,
    ) -> Pin<Box<dyn Stream<Item = Result<PartialResult>> + Send>> {
        let url = match self.endpoint(&request) {
            Ok(url) => url,
            Err(e) => return Box::pin(futures::stream::once(async move { Err(e) })),
        };

        let http = self.http.clone();

        Box::pin(async_stream::try_stream! {
            debug!("opening chat stream: {url}");

            let response = http
                .get(url)
                .header("ngrok-skip-browser-warning", "true")
                .send()
                .await
                .map_err(|e| MurmurError::Transport(format!("connection failed: {e}")))?;

            let status = response.status();
            if !status.is_success() {
                Err(MurmurError::Transport(format!("server returned {status}")))?;
            }

            let body = token_stream(response.bytes_stream());
            futures::pin_mut!(body);

            while let Some(item) = body.next().await {
                yield item?;
            }
        })
    }
}

/// Turn a raw body byte stream into partial results.
///
/// Separated from the HTTP plumbing so the line handling can be exercised
/// against in-memory byte streams.
pub(crate) fn token_stream<S, B, E>(body: S) -> impl Stream<Item = Result<PartialResult>>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    async_stream::try_stream! {
        futures::pin_mut!(body);

        let mut splitter = LineSplitter::new();
        let mut finished = false;

        'body: while let Some(chunk) = body.next().await {
            let chunk =
                chunk.map_err(|e| MurmurError::Transport(format!("stream read failed: {e}")))?;

            for line in splitter.push(chunk.as_ref()) {
                match parse_line(&line) {
                    Some(Ok(result)) => {
                        let done = result.done;
                        yield result;
                        if done {
                            finished = true;
                            break 'body;
                        }
                    }
                    Some(Err(e)) => warn!("skipping bad stream line: {e}"),
                    None => {}
                }
            }
        }

        if !finished {
            if let Some(line) = splitter.flush() {
                match parse_line(&line) {
                    Some(Ok(result)) => yield result,
                    Some(Err(e)) => warn!("skipping bad trailing line: {e}"),
                    None => {}
                }
            }
        }
    }
}
