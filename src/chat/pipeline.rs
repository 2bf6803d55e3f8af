//! Chat pipeline for running exchanges against the streaming endpoint.
//!
//! Provides a channel-based interface: the UI sends [`ChatCommand`]s, a
//! dedicated worker thread owns a tokio runtime and the HTTP client, and
//! [`ChatEvent`]s come back in token-arrival order. One exchange runs at a
//! time; a [`CancelToken`] lets the UI abandon the active one promptly.

use crate::stream::{ChatRequest, ChatStreamClient, StreamConfig};
use crate::Result;
use crossbeam_channel::{bounded, Receiver, Sender};
use futures::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::Runtime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Identifier of one user request / bot response pair.
pub type ExchangeId = Uuid;

/// Cooperative cancellation signal shared between the UI and the worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    notify: Arc<tokio::sync::Notify>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        loop {
            if self.is_cancelled() {
                return;
            }
            let notified = self.notify.notified();
            // Re-check after registering so a cancel between the first check
            // and registration is not missed.
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Handle to an in-flight exchange.
#[derive(Debug, Clone)]
pub struct ExchangeHandle {
    pub id: ExchangeId,
    cancel: CancelToken,
}

impl ExchangeHandle {
    pub fn new(id: ExchangeId, cancel: CancelToken) -> Self {
        Self { id, cancel }
    }

    /// Abandon the exchange: the worker closes the connection and emits no
    /// further events for it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Commands that can be sent to the chat pipeline
#[derive(Debug, Clone)]
pub enum ChatCommand {
    /// Run one exchange against the streaming endpoint
    Send {
        request: ChatRequest,
        exchange: ExchangeId,
        cancel: CancelToken,
    },

    /// Shutdown the pipeline
    Shutdown,
}

/// Events emitted by the chat pipeline
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// A token arrived for the exchange
    Token { token: String, exchange: ExchangeId },

    /// The server offered a pre-rendered audio version of the reply
    AudioHint { url: String, exchange: ExchangeId },

    /// The completion signal arrived
    Complete {
        exchange: ExchangeId,
        /// Time to first token in milliseconds
        first_token_ms: u64,
        /// Total exchange time in milliseconds
        total_ms: u64,
    },

    /// The connection closed before a completion signal
    Closed { exchange: ExchangeId },

    /// The exchange failed; no retry is attempted
    Error { error: String, exchange: ExchangeId },

    /// Pipeline has shut down
    Shutdown,
}

enum Outcome {
    Done,
    Exhausted,
    Cancelled,
}

/// Chat pipeline with channel-based communication
pub struct ChatPipeline {
    config: StreamConfig,
    command_tx: Sender<ChatCommand>,
    command_rx: Receiver<ChatCommand>,
    event_tx: Sender<ChatEvent>,
    event_rx: Receiver<ChatEvent>,
}

impl ChatPipeline {
    pub fn new(config: StreamConfig) -> Self {
        let (command_tx, command_rx) = bounded(100);
        let (event_tx, event_rx) = bounded(100);

        Self {
            config,
            command_tx,
            command_rx,
            event_tx,
            event_rx,
        }
    }

    /// Get a sender for commands
    pub fn command_sender(&self) -> Sender<ChatCommand> {
        self.command_tx.clone()
    }

    /// Get a receiver for events
    pub fn event_receiver(&self) -> Receiver<ChatEvent> {
        self.event_rx.clone()
    }

    /// Start the pipeline worker thread.
    ///
    /// The worker owns the tokio runtime and the HTTP client; all network
    /// I/O happens there, never on the caller's thread.
    pub fn start_worker(self) -> Result<()> {
        let config = self.config.clone();
        let command_rx = self.command_rx.clone();
        let event_tx = self.event_tx.clone();

        std::thread::spawn(move || {
            info!("chat pipeline worker starting");

            let runtime = match Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    error!("failed to create tokio runtime: {e}");
                    let _ = event_tx.send(ChatEvent::Shutdown);
                    return;
                }
            };

            let client = match ChatStreamClient::new(config) {
                Ok(client) => client,
                Err(e) => {
                    error!("failed to build stream client: {e}");
                    let _ = event_tx.send(ChatEvent::Shutdown);
                    return;
                }
            };

            info!("chat pipeline worker ready");

            loop {
                match command_rx.recv() {
                    Ok(ChatCommand::Send {
                        request,
                        exchange,
                        cancel,
                    }) => {
                        debug!("running exchange {exchange}");
                        run_exchange(&runtime, &client, &event_tx, request, exchange, &cancel);
                    }

                    Ok(ChatCommand::Shutdown) => {
                        info!("chat pipeline worker shutting down");
                        let _ = event_tx.send(ChatEvent::Shutdown);
                        break;
                    }

                    Err(e) => {
                        error!("command channel error: {e}");
                        break;
                    }
                }
            }

            info!("chat pipeline worker stopped");
        });

        Ok(())
    }
}

fn run_exchange(
    runtime: &Runtime,
    client: &ChatStreamClient,
    event_tx: &Sender<ChatEvent>,
    request: ChatRequest,
    exchange: ExchangeId,
    cancel: &CancelToken,
) {
    let start = Instant::now();
    let mut first_token_at: Option<Instant> = None;

    let outcome = runtime.block_on(async {
        let stream = client.open_stream(request);
        futures::pin_mut!(stream);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return Ok(Outcome::Cancelled),
                item = stream.next() => match item {
                    None => return Ok(Outcome::Exhausted),
                    Some(Err(e)) => return Err(e),
                    Some(Ok(result)) => {
                        if !result.token.is_empty() {
                            if first_token_at.is_none() {
                                first_token_at = Some(Instant::now());
                            }
                            let _ = event_tx.send(ChatEvent::Token {
                                token: result.token,
                                exchange,
                            });
                        }

                        if let Some(url) = result.audio_hint {
                            let _ = event_tx.send(ChatEvent::AudioHint { url, exchange });
                        }

                        if result.done {
                            return Ok(Outcome::Done);
                        }
                    }
                },
            }
        }
    });

    // Dropping the stream above closed the connection; now report.
    match outcome {
        Ok(Outcome::Cancelled) => {
            debug!("exchange {exchange} cancelled");
        }
        Ok(Outcome::Done) => {
            let total_ms = start.elapsed().as_millis() as u64;
            let first_token_ms = first_token_at
                .map(|t| t.duration_since(start).as_millis() as u64)
                .unwrap_or(total_ms);
            debug!("exchange {exchange} complete in {total_ms}ms");
            let _ = event_tx.send(ChatEvent::Complete {
                exchange,
                first_token_ms,
                total_ms,
            });
        }
        Ok(Outcome::Exhausted) => {
            warn!("exchange {exchange}: stream closed before completion signal");
            let _ = event_tx.send(ChatEvent::Closed { exchange });
        }
        Err(e) => {
            if cancel.is_cancelled() {
                debug!("exchange {exchange} failed after cancel: {e}");
            } else {
                error!("exchange {exchange} failed: {e}");
                let _ = event_tx.send(ChatEvent::Error {
                    error: e.to_string(),
                    exchange,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_creation() {
        let pipeline = ChatPipeline::new(StreamConfig::default());

        let _cmd_tx = pipeline.command_sender();
        let _event_rx = pipeline.event_receiver();
        assert!(pipeline.command_tx.capacity().is_some());
    }

    #[test]
    fn cancel_token_flag() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn cancelled_resolves_after_cancel() {
        let token = CancelToken::new();

        let waiter = {
            let token = token.clone();
            tokio::spawn(async move {
                token.cancelled().await;
            })
        };

        token.cancel();
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("cancelled() should resolve promptly")
            .unwrap();
    }

    #[tokio::test]
    async fn cancelled_resolves_when_already_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        // Must not hang
        token.cancelled().await;
    }

    #[test]
    fn handle_cancels_shared_token() {
        let token = CancelToken::new();
        let handle = ExchangeHandle::new(Uuid::new_v4(), token.clone());
        handle.cancel();
        assert!(token.is_cancelled());
    }
}
