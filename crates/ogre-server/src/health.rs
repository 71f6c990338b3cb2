use std::sync::atomic::Ordering;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub connections: usize,
    pub players: usize,
}

/// Liveness plus connection and player counts.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let status = if state.session_tx.is_closed() {
        "degraded"
    } else {
        "ok"
    };
    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        connections: state.ws_connection_count.load(Ordering::Relaxed),
        players: state.player_count.load(Ordering::Relaxed),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_response_serializes() {
        let resp = HealthResponse {
            status: "ok",
            version: "0.1.0",
            connections: 3,
            players: 2,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["connections"], 3);
        assert_eq!(json["players"], 2);
    }
}
