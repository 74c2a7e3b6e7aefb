//! Settings types. Serialized camelCase; every field has a default so a
//! partial settings file is enough.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings object.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScorelineSettings {
    /// HTTP / WebSocket server.
    pub server: ServerSettings,
    /// Session tokens.
    pub auth: AuthSettings,
    /// Log output.
    pub logging: LoggingSettings,
}

impl ScorelineSettings {
    /// Reject settings the server cannot start with.
    pub fn validate(&self) -> Result<()> {
        if self.auth.jwt_secret.is_empty() {
            return Err(SettingsError::InvalidValue(
                "auth.jwtSecret must be set (or JWT_SECRET)".into(),
            ));
        }
        if !(4..=31).contains(&self.auth.password_cost) {
            return Err(SettingsError::InvalidValue(
                "auth.passwordCost must be between 4 and 31".into(),
            ));
        }
        if self.server.send_queue_capacity == 0 {
            return Err(SettingsError::InvalidValue(
                "server.sendQueueCapacity must be greater than zero".into(),
            ));
        }
        if self.server.max_message_size == 0 {
            return Err(SettingsError::InvalidValue(
                "server.maxMessageSize must be greater than zero".into(),
            ));
        }
        if self.server.heartbeat_timeout_secs < self.server.heartbeat_interval_secs {
            return Err(SettingsError::InvalidValue(
                "server.heartbeatTimeoutSecs must not be shorter than the heartbeat interval"
                    .into(),
            ));
        }
        Ok(())
    }
}

/// Server network and connection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Origin allowed by CORS.
    pub frontend_url: String,
    /// Outbound frames buffered per connection before sends start failing.
    pub send_queue_capacity: usize,
    /// Per-frame socket write timeout in milliseconds.
    pub send_timeout_ms: u64,
    /// Interval between server pings.
    pub heartbeat_interval_secs: u64,
    /// Silence after which a client is disconnected.
    pub heartbeat_timeout_secs: u64,
    /// Largest accepted inbound WebSocket message, in bytes.
    pub max_message_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            frontend_url: "http://localhost:3000".to_string(),
            send_queue_capacity: 256,
            send_timeout_ms: 5_000,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
            max_message_size: 1024 * 1024,
        }
    }
}

/// Session token settings.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthSettings {
    /// HMAC secret for signing tokens. Empty means unset.
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub token_ttl_secs: u64,
    /// bcrypt cost factor for stored password hashes (4 to 31).
    pub password_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: 24 * 60 * 60,
            password_cost: 12,
        }
    }
}

impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("password_cost", &self.password_cost)
            .finish()
    }
}

/// Log output settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of compact text.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
