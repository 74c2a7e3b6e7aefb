//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use scoreline_settings::ServerSettings;

use crate::error::ServerError;

/// Runtime configuration for the relay server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Origin allowed by CORS.
    pub frontend_url: String,
    /// Outbound frames buffered per connection.
    pub send_queue_capacity: usize,
    /// Per-frame socket write timeout in milliseconds.
    pub send_timeout_ms: u64,
    /// Heartbeat interval in seconds.
    pub heartbeat_interval_secs: u64,
    /// Silence, in seconds, after which a client is disconnected.
    pub heartbeat_timeout_secs: u64,
    /// Max WebSocket message size in bytes.
    pub max_message_size: usize,
}

impl ServerConfig {
    /// Build from loaded settings.
    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
            frontend_url: settings.frontend_url.clone(),
            send_queue_capacity: settings.send_queue_capacity,
            send_timeout_ms: settings.send_timeout_ms,
            heartbeat_interval_secs: settings.heartbeat_interval_secs,
            heartbeat_timeout_secs: settings.heartbeat_timeout_secs,
            max_message_size: settings.max_message_size,
        }
    }

    /// Reject values that would break a session at runtime.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.send_queue_capacity == 0 {
            return Err(ServerError::InvalidConfig(
                "send_queue_capacity must be greater than zero",
            ));
        }
        if self.max_message_size == 0 {
            return Err(ServerError::InvalidConfig(
                "max_message_size must be greater than zero",
            ));
        }
        Ok(())
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Socket write timeout.
    pub fn send_timeout(&self) -> Duration {
        Duration::from_millis(self.send_timeout_ms)
    }

    /// Interval between server pings.
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs.max(1))
    }

    /// Silence tolerated before disconnecting.
    pub fn heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.heartbeat_timeout_secs)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            send_queue_capacity: 256,
            send_timeout_ms: 5_000,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
            max_message_size: 1024 * 1024, // 1 MiB
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_binds_loopback_ephemeral() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.bind_addr(), "127.0.0.1:0");
    }

    #[test]
    fn from_settings_copies_every_field() {
        let settings = ServerSettings {
            host: "0.0.0.0".into(),
            port: 3001,
            frontend_url: "https://scores.example".into(),
            send_queue_capacity: 8,
            send_timeout_ms: 250,
            heartbeat_interval_secs: 5,
            heartbeat_timeout_secs: 15,
            max_message_size: 4096,
        };
        let cfg = ServerConfig::from_settings(&settings);
        assert_eq!(cfg.bind_addr(), "0.0.0.0:3001");
        assert_eq!(cfg.frontend_url, "https://scores.example");
        assert_eq!(cfg.send_queue_capacity, 8);
        assert_eq!(cfg.send_timeout(), Duration::from_millis(250));
        assert_eq!(cfg.heartbeat_interval(), Duration::from_secs(5));
        assert_eq!(cfg.heartbeat_timeout(), Duration::from_secs(15));
        assert_eq!(cfg.max_message_size, 4096);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(ServerConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_queue_capacity_is_invalid() {
        let cfg = ServerConfig {
            send_queue_capacity: 0,
            ..ServerConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, ServerError::InvalidConfig(_)));
        assert!(err.to_string().contains("send_queue_capacity"));
    }

    #[test]
    fn zero_message_size_is_invalid() {
        let cfg = ServerConfig {
            max_message_size: 0,
            ..ServerConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ServerError::InvalidConfig(_))));
    }

    #[test]
    fn zero_heartbeat_interval_is_clamped() {
        let cfg = ServerConfig {
            heartbeat_interval_secs: 0,
            ..ServerConfig::default()
        };
        assert_eq!(cfg.heartbeat_interval(), Duration::from_secs(1));
    }

    #[test]
    fn deserialize_from_json_string() {
        let json = r#"{"host":"10.0.0.1","port":3000,"frontend_url":"http://a","send_queue_capacity":4,"send_timeout_ms":10,"heartbeat_interval_secs":10,"heartbeat_timeout_secs":30,"max_message_size":512}"#;
        let cfg: ServerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.host, "10.0.0.1");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.send_queue_capacity, 4);
    }
}
