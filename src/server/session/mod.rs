//! Session lifecycle for the streamable HTTP transport.
//!
//! Each session owns one [`SessionTransport`]: a dedicated rmcp service
//! instance reached through an in-process duplex channel. The
//! [`SessionRegistry`] maps ids to transports and the [`SessionBroker`] decides,
//! per request, whether to resume a session or create one.

mod broker;
mod registry;
mod transport;

use std::{borrow::Borrow, fmt};

use uuid::Uuid;

pub use broker::{spawn_idle_reaper, Routed, SessionBroker};
pub use registry::SessionRegistry;
pub use transport::{Delivery, SessionPhase, SessionTransport};

/// Server-generated, opaque session identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Fresh random id; v4 UUIDs are not reissued within a process lifetime.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for SessionId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
