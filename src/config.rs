//! Application configuration
//!
//! All settings come from the environment; every field has a default so the
//! service starts in a development setup with nothing configured.

use std::path::PathBuf;

/// Admin HTTP listener settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub debug: bool,
}

/// OCPP WebSocket listener settings.
#[derive(Debug, Clone)]
pub struct WebSocketConfig {
    pub host: String,
    pub port: u16,
    pub subprotocols: Vec<String>,
    pub ssl_keyfile: Option<PathBuf>,
    pub ssl_certfile: Option<PathBuf>,
}

/// JWT settings. The signing algorithm is pinned: anything but HS256 is a
/// configuration error.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub secret_key: String,
    pub access_token_expire_minutes: i64,
}

/// Back-office bridge settings.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub api_url: String,
    pub api_key: String,
    pub redis_url: Option<String>,
    pub mq_broker_url: Option<String>,
    pub mq_exchange: String,
}

/// Charger/session interval defaults.
#[derive(Debug, Clone)]
pub struct IntervalConfig {
    pub heartbeat_interval_s: u32,
    pub meter_value_interval_s: u32,
    pub connection_timeout_s: u32,
    pub session_timeout_s: u32,
    pub max_concurrent_sessions: u32,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub websocket: WebSocketConfig,
    pub database_url: String,
    pub security: SecurityConfig,
    pub bridge: BridgeSettings,
    pub intervals: IntervalConfig,
    /// Currency units per kWh used for session cost.
    pub rate_per_kwh: f64,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                debug: false,
            },
            websocket: WebSocketConfig {
                host: "0.0.0.0".to_string(),
                port: 1025,
                subprotocols: vec!["ocpp1.6".to_string(), "ocpp2.0.1".to_string()],
                ssl_keyfile: None,
                ssl_certfile: None,
            },
            database_url: "sqlite://ocpp_cms.db?mode=rwc".to_string(),
            security: SecurityConfig {
                secret_key: "your-secret-key-change-in-production".to_string(),
                access_token_expire_minutes: 30,
            },
            bridge: BridgeSettings {
                api_url: "http://localhost:8080/api".to_string(),
                api_key: "your-api-key".to_string(),
                redis_url: None,
                mq_broker_url: None,
                mq_exchange: "ocpp_events".to_string(),
            },
            intervals: IntervalConfig {
                heartbeat_interval_s: 60,
                meter_value_interval_s: 60,
                connection_timeout_s: 30,
                session_timeout_s: 3600,
                max_concurrent_sessions: 1000,
            },
            rate_per_kwh: 0.15,
            log_level: "info".to_string(),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env_var(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// Load from the environment on top of the defaults.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        if let Some(algorithm) = env_var("ALGORITHM") {
            if algorithm != "HS256" {
                return Err(format!(
                    "ALGORITHM must be HS256, got '{algorithm}'"
                ));
            }
        }

        // TLS requires both halves of the key pair.
        let ssl_keyfile = env_var("SSL_KEYFILE").map(PathBuf::from);
        let ssl_certfile = env_var("SSL_CERTFILE").map(PathBuf::from);
        let (ssl_keyfile, ssl_certfile) = match (ssl_keyfile, ssl_certfile) {
            (Some(key), Some(cert)) => (Some(key), Some(cert)),
            (None, None) => (None, None),
            _ => {
                return Err(
                    "SSL_KEYFILE and SSL_CERTFILE must be configured together".to_string()
                );
            }
        };

        let subprotocols = env_var("OCPP_SUBPROTOCOLS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.websocket.subprotocols);

        Ok(Self {
            server: ServerConfig {
                host: env_var("HOST").unwrap_or(defaults.server.host),
                port: env_parse("PORT", defaults.server.port),
                debug: env_var("DEBUG")
                    .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                    .unwrap_or(defaults.server.debug),
            },
            websocket: WebSocketConfig {
                host: env_var("OCPP_WEBSOCKET_HOST").unwrap_or(defaults.websocket.host),
                port: env_parse("OCPP_WEBSOCKET_PORT", defaults.websocket.port),
                subprotocols,
                ssl_keyfile,
                ssl_certfile,
            },
            database_url: env_var("DATABASE_URL").unwrap_or(defaults.database_url),
            security: SecurityConfig {
                secret_key: env_var("SECRET_KEY").unwrap_or(defaults.security.secret_key),
                access_token_expire_minutes: env_parse(
                    "ACCESS_TOKEN_EXPIRE_MINUTES",
                    defaults.security.access_token_expire_minutes,
                ),
            },
            bridge: BridgeSettings {
                api_url: env_var("LARAVEL_API_URL").unwrap_or(defaults.bridge.api_url),
                api_key: env_var("LARAVEL_API_KEY").unwrap_or(defaults.bridge.api_key),
                redis_url: env_var("REDIS_URL"),
                mq_broker_url: env_var("MQ_BROKER_URL"),
                mq_exchange: env_var("MQ_EXCHANGE").unwrap_or(defaults.bridge.mq_exchange),
            },
            intervals: IntervalConfig {
                heartbeat_interval_s: env_parse(
                    "HEARTBEAT_INTERVAL",
                    defaults.intervals.heartbeat_interval_s,
                ),
                meter_value_interval_s: env_parse(
                    "METER_VALUE_INTERVAL",
                    defaults.intervals.meter_value_interval_s,
                ),
                connection_timeout_s: env_parse(
                    "CONNECTION_TIMEOUT",
                    defaults.intervals.connection_timeout_s,
                ),
                session_timeout_s: env_parse(
                    "SESSION_TIMEOUT",
                    defaults.intervals.session_timeout_s,
                ),
                max_concurrent_sessions: env_parse(
                    "MAX_CONCURRENT_SESSIONS",
                    defaults.intervals.max_concurrent_sessions,
                ),
            },
            rate_per_kwh: env_parse("SESSION_RATE_PER_KWH", defaults.rate_per_kwh),
            log_level: env_var("LOG_LEVEL")
                .map(|v| v.to_lowercase())
                .unwrap_or(defaults.log_level),
        })
    }

    pub fn api_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.websocket.port, 1025);
        assert_eq!(
            config.websocket.subprotocols,
            vec!["ocpp1.6", "ocpp2.0.1"]
        );
        assert!(config.websocket.ssl_certfile.is_none());
        assert_eq!(config.intervals.heartbeat_interval_s, 60);
        assert!((config.rate_per_kwh - 0.15).abs() < f64::EPSILON);
    }

    #[test]
    fn env_parse_falls_back_on_garbage() {
        // env var not set here, so the default survives
        assert_eq!(env_parse("DEFINITELY_NOT_SET_12345", 42u16), 42);
    }
}
