use std::{
    io,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use rmcp::ServiceExt;
use serde_json::Value;
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf},
    sync::Mutex,
    time,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    lib::{
        errors::SessionError,
        jsonrpc::{
            initialized_notification, is_initialize_request, is_initialized_notification,
            is_success_response, MessageKind,
        },
    },
    server::{config::SessionConfig, runtime::WeatherServer},
};

use super::{SessionId, SessionRegistry};

/// Lifecycle of one session. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Active,
    Closed,
}

/// What the service produced for one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// Notification or client response; nothing to send back.
    Accepted,
    /// Response to a request, preceded by anything the service emitted meanwhile.
    Reply { events: Vec<Value>, response: Value },
}

struct SessionChannel {
    phase: SessionPhase,
    initialized_notified: bool,
    writer: WriteHalf<DuplexStream>,
    reader: Lines<BufReader<ReadHalf<DuplexStream>>>,
}

/// Client side of a per-session rmcp service.
///
/// The channel mutex serializes all traffic for the session, so requests that
/// share an id are handled one at a time while other sessions proceed.
pub struct SessionTransport {
    id: SessionId,
    created_at: Instant,
    last_activity_ms: AtomicU64,
    response_timeout: Duration,
    cancel: CancellationToken,
    channel: Mutex<SessionChannel>,
}

impl SessionTransport {
    /// Start the session's service task and return its transport handle.
    ///
    /// When the service ends for any reason the task removes `id` from `registry`.
    pub fn spawn(
        id: SessionId,
        server: WeatherServer,
        registry: SessionRegistry,
        settings: &SessionConfig,
    ) -> Arc<Self> {
        let (client_io, server_io) = tokio::io::duplex(settings.channel_buffer_bytes);
        let (read_half, write_half) = tokio::io::split(client_io);
        let cancel = CancellationToken::new();

        let transport = Arc::new(Self {
            id: id.clone(),
            created_at: Instant::now(),
            last_activity_ms: AtomicU64::new(0),
            response_timeout: settings.response_timeout(),
            cancel: cancel.clone(),
            channel: Mutex::new(SessionChannel {
                phase: SessionPhase::Uninitialized,
                initialized_notified: false,
                writer: write_half,
                reader: BufReader::new(read_half).lines(),
            }),
        });

        tokio::spawn(run_service(id, server, server_io, cancel, registry));
        transport
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn phase(&self) -> SessionPhase {
        if self.is_closed() {
            return SessionPhase::Closed;
        }
        self.channel.lock().await.phase
    }

    /// Time since the last message was handled.
    pub fn idle_for(&self) -> Duration {
        let last = Duration::from_millis(self.last_activity_ms.load(Ordering::Relaxed));
        self.created_at.elapsed().saturating_sub(last)
    }

    /// Deliver one JSON-RPC message to the session's service.
    pub async fn dispatch(&self, message: Value) -> Result<Delivery, SessionError> {
        self.touch();
        let mut channel = self.channel.lock().await;
        if self.is_closed() {
            channel.phase = SessionPhase::Closed;
        }

        let result = match channel.phase {
            SessionPhase::Closed => Err(SessionError::Closed {
                id: self.id.to_string(),
            }),
            SessionPhase::Uninitialized => {
                if !is_initialize_request(&message) {
                    return Err(SessionError::NotInitialized {
                        id: self.id.to_string(),
                    });
                }
                let delivery = self.exchange(&mut channel, &message).await;
                if let Ok(Delivery::Reply { response, .. }) = &delivery {
                    if is_success_response(response) {
                        channel.phase = SessionPhase::Active;
                        info!(
                            target: "weather_mcp::session",
                            session_id = %self.id,
                            "Session initialized"
                        );
                    } else {
                        channel.phase = SessionPhase::Closed;
                        self.cancel.cancel();
                    }
                }
                delivery
            }
            SessionPhase::Active => self.forward(&mut channel, message).await,
        };

        if matches!(
            result,
            Err(SessionError::Channel { .. } | SessionError::Malformed { .. })
        ) {
            channel.phase = SessionPhase::Closed;
            self.cancel.cancel();
        }
        self.touch();
        result
    }

    /// Close the session and stop its service. Safe to call more than once.
    pub async fn close(&self) {
        self.cancel.cancel();
        let mut channel = self.channel.lock().await;
        if channel.phase != SessionPhase::Closed {
            channel.phase = SessionPhase::Closed;
            if let Err(err) = channel.writer.shutdown().await {
                debug!(
                    target: "weather_mcp::session",
                    session_id = %self.id,
                    error = %err,
                    "Session channel already shut down"
                );
            }
        }
    }

    async fn forward(
        &self,
        channel: &mut SessionChannel,
        message: Value,
    ) -> Result<Delivery, SessionError> {
        if !channel.initialized_notified {
            channel.initialized_notified = true;
            if is_initialized_notification(&message) {
                self.send(channel, &message).await?;
                return Ok(Delivery::Accepted);
            }
            debug!(
                target: "weather_mcp::session",
                session_id = %self.id,
                "Client skipped notifications/initialized; sending it on its behalf"
            );
            self.send(channel, &initialized_notification()).await?;
        }

        match MessageKind::of(&message) {
            MessageKind::Request => self.exchange(channel, &message).await,
            _ => {
                self.send(channel, &message).await?;
                Ok(Delivery::Accepted)
            }
        }
    }

    async fn exchange(
        &self,
        channel: &mut SessionChannel,
        request: &Value,
    ) -> Result<Delivery, SessionError> {
        self.send(channel, request).await?;
        let request_id = request.get("id").cloned().unwrap_or(Value::Null);
        time::timeout(
            self.response_timeout,
            self.await_response(channel, &request_id),
        )
        .await
        .map_err(|_| SessionError::ResponseTimeout {
            id: self.id.to_string(),
            timeout_secs: self.response_timeout.as_secs(),
        })?
    }

    async fn await_response(
        &self,
        channel: &mut SessionChannel,
        request_id: &Value,
    ) -> Result<Delivery, SessionError> {
        let mut events = Vec::new();
        loop {
            let line = channel
                .reader
                .next_line()
                .await
                .map_err(|source| self.channel_error(source))?
                .ok_or_else(|| {
                    self.channel_error(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "session service ended",
                    ))
                })?;
            if line.trim().is_empty() {
                continue;
            }

            let message: Value =
                serde_json::from_str(&line).map_err(|source| SessionError::Malformed {
                    id: self.id.to_string(),
                    source,
                })?;
            match MessageKind::of(&message) {
                MessageKind::Response if message.get("id") == Some(request_id) => {
                    return Ok(Delivery::Reply {
                        events,
                        response: message,
                    });
                }
                MessageKind::Request | MessageKind::Notification => events.push(message),
                MessageKind::Response | MessageKind::Invalid => {
                    debug!(
                        target: "weather_mcp::session",
                        session_id = %self.id,
                        "Discarding stray message from session service"
                    );
                }
            }
        }
    }

    async fn send(&self, channel: &mut SessionChannel, message: &Value) -> Result<(), SessionError> {
        let mut frame = serde_json::to_vec(message).map_err(|source| SessionError::Malformed {
            id: self.id.to_string(),
            source,
        })?;
        frame.push(b'\n');
        channel
            .writer
            .write_all(&frame)
            .await
            .map_err(|source| self.channel_error(source))?;
        channel
            .writer
            .flush()
            .await
            .map_err(|source| self.channel_error(source))
    }

    fn channel_error(&self, source: io::Error) -> SessionError {
        SessionError::Channel {
            id: self.id.to_string(),
            source,
        }
    }

    fn touch(&self) {
        let elapsed = self.created_at.elapsed().as_millis() as u64;
        self.last_activity_ms.store(elapsed, Ordering::Relaxed);
    }
}

async fn run_service(
    id: SessionId,
    server: WeatherServer,
    io: DuplexStream,
    cancel: CancellationToken,
    registry: SessionRegistry,
) {
    match server.serve_with_ct(io, cancel.clone()).await {
        Ok(running) => {
            if let Err(err) = running.waiting().await {
                warn!(
                    target: "weather_mcp::session",
                    session_id = %id,
                    error = %err,
                    "Session service task failed"
                );
            }
        }
        Err(err) => {
            warn!(
                target: "weather_mcp::session",
                session_id = %id,
                error = %err,
                "Session handshake failed"
            );
        }
    }

    cancel.cancel();
    if registry.remove(id.as_str()).await.is_some() {
        info!(
            target: "weather_mcp::session",
            session_id = %id,
            "Session closed by its transport"
        );
    }
}
