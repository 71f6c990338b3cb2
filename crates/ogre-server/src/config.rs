use serde::Deserialize;

use ogre_core::net::protocol::DEFAULT_TICK_RATE_HZ;

use crate::error::ConfigError;

/// Highest tick rate the session loop accepts.
pub const MAX_TICK_RATE_HZ: u32 = 240;

/// Top-level server configuration, loaded from `ogre.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub tick_rate_hz: u32,
    pub max_players: usize,
    /// Ability tuning file. Falls back to `AbilityConfig::load()` when unset.
    pub ability_config_path: Option<String>,
    pub limits: LimitsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            tick_rate_hz: DEFAULT_TICK_RATE_HZ,
            max_players: 8,
            ability_config_path: None,
            limits: LimitsConfig::default(),
        }
    }
}

/// Connection caps, buffer sizes and rate limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_ws_connections: usize,
    pub broadcast_capacity: usize,
    pub ws_rate_limit_per_sec: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_ws_connections: 64,
            broadcast_capacity: 1024,
            ws_rate_limit_per_sec: 60.0,
        }
    }
}

impl ServerConfig {
    /// Check every value the server depends on, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::InvalidListenAddr(self.listen_addr.clone()));
        }
        if self.tick_rate_hz == 0 || self.tick_rate_hz > MAX_TICK_RATE_HZ {
            return Err(ConfigError::TickRateOutOfRange(self.tick_rate_hz));
        }
        if self.max_players == 0 {
            return Err(ConfigError::ZeroLimit("max_players"));
        }
        if self.limits.max_ws_connections == 0 {
            return Err(ConfigError::ZeroLimit("limits.max_ws_connections"));
        }
        if self.limits.broadcast_capacity == 0 {
            return Err(ConfigError::ZeroLimit("limits.broadcast_capacity"));
        }
        if self.limits.ws_rate_limit_per_sec <= 0.0 {
            return Err(ConfigError::ZeroLimit("limits.ws_rate_limit_per_sec"));
        }
        if self.max_players > self.limits.max_ws_connections {
            tracing::warn!(
                max_players = self.max_players,
                max_ws_connections = self.limits.max_ws_connections,
                "max_players exceeds the connection cap, the arena can never fill"
            );
        }
        Ok(())
    }

    /// Load config from `$OGRE_CONFIG` or `ogre.toml` if present, then apply
    /// `OGRE_*` environment overrides.
    pub fn load() -> Self {
        let path = std::env::var("OGRE_CONFIG").unwrap_or_else(|_| "ogre.toml".to_string());
        let mut config = match std::fs::read_to_string(&path) {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!(path = %path, "Loaded server configuration");
                    cfg
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path,
                        "Failed to parse server config: {e}, using defaults"
                    );
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!(path = %path, "No server config found, using defaults");
                ServerConfig::default()
            },
        };
        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(addr) = std::env::var("OGRE_LISTEN_ADDR")
            && !addr.is_empty()
        {
            self.listen_addr = addr;
        }
        if let Ok(val) = std::env::var("OGRE_TICK_RATE")
            && let Ok(n) = val.parse::<u32>()
        {
            self.tick_rate_hz = n;
        }
        if let Ok(val) = std::env::var("OGRE_MAX_PLAYERS")
            && let Ok(n) = val.parse::<usize>()
        {
            self.max_players = n;
        }
        if let Ok(path) = std::env::var("OGRE_ABILITY_CONFIG")
            && !path.is_empty()
        {
            self.ability_config_path = Some(path);
        }
        if let Ok(val) = std::env::var("OGRE_MAX_WS_CONNECTIONS")
            && let Ok(n) = val.parse::<usize>()
        {
            self.limits.max_ws_connections = n;
        }
        if let Ok(val) = std::env::var("OGRE_WS_RATE_LIMIT")
            && let Ok(n) = val.parse::<f64>()
        {
            self.limits.ws_rate_limit_per_sec = n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
        assert_eq!(cfg.tick_rate_hz, DEFAULT_TICK_RATE_HZ);
        assert!(cfg.ability_config_path.is_none());
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn parse_partial_toml_keeps_defaults() {
        let toml_str = r#"
            tick_rate_hz = 60

            [limits]
            ws_rate_limit_per_sec = 10.0
        "#;
        let cfg: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.tick_rate_hz, 60);
        assert_eq!(cfg.max_players, 8);
        assert_eq!(cfg.limits.ws_rate_limit_per_sec, 10.0);
        assert_eq!(cfg.limits.broadcast_capacity, 1024);
    }

    #[test]
    fn shipped_config_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../ogre.toml");
        let content = std::fs::read_to_string(path).unwrap();
        let cfg: ServerConfig = toml::from_str(&content).unwrap();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.ability_config_path.as_deref(), Some("config/abilities.toml"));
    }

    #[test]
    fn rejects_bad_listen_addr() {
        let cfg = ServerConfig {
            listen_addr: "localhost".to_string(),
            ..ServerConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidListenAddr("localhost".to_string()))
        );
    }

    #[test]
    fn rejects_tick_rate_outside_range() {
        for hz in [0, MAX_TICK_RATE_HZ + 1] {
            let cfg = ServerConfig {
                tick_rate_hz: hz,
                ..ServerConfig::default()
            };
            assert_eq!(cfg.validate(), Err(ConfigError::TickRateOutOfRange(hz)));
        }
    }

    #[test]
    fn rejects_zero_limits() {
        let mut cfg = ServerConfig::default();
        cfg.limits.broadcast_capacity = 0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ZeroLimit("limits.broadcast_capacity"))
        );

        let mut cfg = ServerConfig::default();
        cfg.limits.ws_rate_limit_per_sec = 0.0;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::ZeroLimit("limits.ws_rate_limit_per_sec"))
        );

        let cfg = ServerConfig {
            max_players: 0,
            ..ServerConfig::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroLimit("max_players")));
    }
}
