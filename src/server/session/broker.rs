use std::sync::Arc;

use serde_json::Value;
use tokio::{task::JoinHandle, time};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    lib::{errors::SessionError, jsonrpc::is_initialize_request},
    server::{config::SessionConfig, runtime::WeatherServer},
};

use super::{Delivery, SessionId, SessionRegistry, SessionTransport};

/// A delivery together with the session that produced it.
#[derive(Debug)]
pub struct Routed {
    pub session_id: SessionId,
    pub delivery: Delivery,
    /// `true` when this message created the session.
    pub created: bool,
}

/// Routes inbound messages to an existing session or opens a new one.
#[derive(Clone)]
pub struct SessionBroker {
    registry: SessionRegistry,
    server: WeatherServer,
    settings: Arc<SessionConfig>,
}

impl SessionBroker {
    pub fn new(server: WeatherServer, settings: SessionConfig) -> Self {
        Self {
            registry: SessionRegistry::new(),
            server,
            settings: Arc::new(settings),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &SessionConfig {
        &self.settings
    }

    /// Handle one message.
    ///
    /// A known id resumes its session. Otherwise only a valid `initialize`
    /// request is accepted, and it opens a session with a fresh id.
    pub async fn handle(
        &self,
        session_id: Option<&str>,
        message: Value,
    ) -> Result<Routed, SessionError> {
        if let Some(id) = session_id {
            if let Some(transport) = self.registry.get(id).await {
                return self.resume(transport, message).await;
            }
        }

        if !is_initialize_request(&message) {
            debug!(
                target: "weather_mcp::session",
                session_id = session_id.unwrap_or("<none>"),
                "Rejecting message without a valid session"
            );
            return Err(SessionError::NoValidSession);
        }
        self.open(message).await
    }

    /// Close a session by id. Returns `false` if it was unknown.
    pub async fn close(&self, id: &str) -> bool {
        match self.registry.remove(id).await {
            Some(transport) => {
                transport.close().await;
                true
            }
            None => false,
        }
    }

    /// Close every session idle past the configured timeout.
    pub async fn evict_idle(&self) -> usize {
        let Some(max_idle) = self.settings.idle_timeout() else {
            return 0;
        };
        let idle = self.registry.idle_sessions(max_idle).await;
        let mut evicted = 0;
        for id in idle {
            if self.close(id.as_str()).await {
                info!(
                    target: "weather_mcp::session",
                    session_id = %id,
                    idle_timeout_secs = max_idle.as_secs(),
                    "Evicted idle session"
                );
                evicted += 1;
            }
        }
        evicted
    }

    /// Close all sessions, used on shutdown.
    pub async fn close_all(&self) -> usize {
        let transports = self.registry.drain().await;
        for transport in &transports {
            transport.close().await;
        }
        transports.len()
    }

    async fn resume(
        &self,
        transport: Arc<SessionTransport>,
        message: Value,
    ) -> Result<Routed, SessionError> {
        let session_id = transport.id().clone();
        match transport.dispatch(message).await {
            Ok(delivery) => Ok(Routed {
                session_id,
                delivery,
                created: false,
            }),
            // A closed session behaves exactly like an unknown one.
            Err(SessionError::Closed { .. }) => {
                self.registry.remove(session_id.as_str()).await;
                Err(SessionError::NoValidSession)
            }
            Err(err) => {
                if transport.is_closed() {
                    self.registry.remove(session_id.as_str()).await;
                }
                Err(err)
            }
        }
    }

    async fn open(&self, message: Value) -> Result<Routed, SessionError> {
        let session_id = SessionId::generate();
        let transport = SessionTransport::spawn(
            session_id.clone(),
            self.server.clone(),
            self.registry.clone(),
            &self.settings,
        );

        let delivery = match transport.dispatch(message).await {
            Ok(delivery) => delivery,
            Err(err) => {
                transport.close().await;
                return Err(err);
            }
        };

        if transport.is_closed() {
            debug!(
                target: "weather_mcp::session",
                session_id = %session_id,
                "Initialize failed; session not registered"
            );
        } else {
            self.registry.insert(transport).await?;
        }

        Ok(Routed {
            session_id,
            delivery,
            created: true,
        })
    }
}

/// Periodically evict idle sessions until `shutdown` fires.
///
/// Returns `None` when idle eviction is disabled.
pub fn spawn_idle_reaper(
    broker: SessionBroker,
    shutdown: CancellationToken,
) -> Option<JoinHandle<()>> {
    broker.settings.idle_timeout()?;
    let period = broker.settings.cleanup_interval();

    Some(tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let evicted = broker.evict_idle().await;
                    if evicted > 0 {
                        let live_sessions = broker.registry.len().await;
                        debug!(
                            target: "weather_mcp::session",
                            evicted,
                            live_sessions,
                            "Idle sweep finished"
                        );
                    }
                }
            }
        }
    }))
}
