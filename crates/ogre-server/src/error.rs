use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// A configuration value that cannot be used to start the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidListenAddr(String),
    TickRateOutOfRange(u32),
    /// A limit that must be strictly positive was zero.
    ZeroLimit(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidListenAddr(addr) => {
                write!(f, "listen_addr {addr:?} is not a valid socket address")
            },
            Self::TickRateOutOfRange(hz) => {
                write!(f, "tick_rate_hz must be within 1..=240, got {hz}")
            },
            Self::ZeroLimit(name) => write!(f, "{name} must be > 0"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug)]
pub enum ServerError {
    Config(ConfigError),
    Bind(std::io::Error),
    Serve(std::io::Error),
    /// The arena session task stopped while connections still needed it.
    SessionClosed,
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {e}"),
            Self::Bind(e) => write!(f, "failed to bind listener: {e}"),
            Self::Serve(e) => write!(f, "server error: {e}"),
            Self::SessionClosed => write!(f, "arena session is no longer running"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Bind(e) | Self::Serve(e) => Some(e),
            Self::SessionClosed => None,
        }
    }
}

impl From<ConfigError> for ServerError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::SessionClosed => StatusCode::SERVICE_UNAVAILABLE,
            Self::Config(_) | Self::Bind(_) | Self::Serve(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
