use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::lib::errors::ConfigError;

pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 1800;
pub const DEFAULT_SESSION_CLEANUP_SECS: u64 = 60;
pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_CHANNEL_BUFFER_BYTES: usize = 64 * 1024;

/// Session lifecycle settings for the streamable HTTP transport.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Sessions idle longer than this are evicted; `0` disables eviction.
    pub idle_timeout_secs: u64,
    pub cleanup_schedule_secs: u64,
    pub response_timeout_secs: u64,
    pub channel_buffer_bytes: usize,
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_schedule_secs)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_secs(self.response_timeout_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: DEFAULT_IDLE_TIMEOUT_SECS,
            cleanup_schedule_secs: DEFAULT_SESSION_CLEANUP_SECS,
            response_timeout_secs: DEFAULT_RESPONSE_TIMEOUT_SECS,
            channel_buffer_bytes: DEFAULT_CHANNEL_BUFFER_BYTES,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawSessionConfig {
    pub idle_timeout_secs: Option<u64>,
    pub cleanup_schedule_secs: Option<u64>,
    pub response_timeout_secs: Option<u64>,
    pub channel_buffer_bytes: Option<usize>,
}

pub fn parse_session_section(
    raw: Option<RawSessionConfig>,
    path: &Path,
) -> Result<SessionConfig, ConfigError> {
    let session_raw = raw.unwrap_or_default();

    let idle_timeout_secs = session_raw
        .idle_timeout_secs
        .unwrap_or(DEFAULT_IDLE_TIMEOUT_SECS);

    let cleanup_schedule_secs = session_raw
        .cleanup_schedule_secs
        .unwrap_or(DEFAULT_SESSION_CLEANUP_SECS);
    require_positive(path, "session.cleanup_schedule_secs", cleanup_schedule_secs)?;

    let response_timeout_secs = session_raw
        .response_timeout_secs
        .unwrap_or(DEFAULT_RESPONSE_TIMEOUT_SECS);
    require_positive(path, "session.response_timeout_secs", response_timeout_secs)?;

    let channel_buffer_bytes = session_raw
        .channel_buffer_bytes
        .unwrap_or(DEFAULT_CHANNEL_BUFFER_BYTES);
    if channel_buffer_bytes < 1024 {
        return Err(ConfigError::InvalidField {
            path: path.to_path_buf(),
            field: "session.channel_buffer_bytes",
            message: "Use at least 1024 bytes".into(),
        });
    }

    Ok(SessionConfig {
        idle_timeout_secs,
        cleanup_schedule_secs,
        response_timeout_secs,
        channel_buffer_bytes,
    })
}

fn require_positive(path: &Path, field: &'static str, value: u64) -> Result<(), ConfigError> {
    if value > 0 {
        return Ok(());
    }
    Err(ConfigError::InvalidField {
        path: path.to_path_buf(),
        field,
        message: "must be greater than zero".into(),
    })
}
