use tracing_subscriber::EnvFilter;

use ogre_abilities::config::AbilityConfig;
use ogre_server::build_app;
use ogre_server::config::ServerConfig;
use ogre_server::error::ServerError;
use ogre_server::session::SessionCommand;

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "Ogre server exited with an error");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("OGRE_LOG_JSON").is_ok_and(|v| v == "1" || v == "true");
    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn run() -> Result<(), ServerError> {
    let config = ServerConfig::load();
    config.validate()?;

    let abilities = match config.ability_config_path.as_deref() {
        Some(path) => AbilityConfig::load_from(path).unwrap_or_else(|| {
            tracing::warn!(path, "Ability config unusable, falling back to defaults");
            AbilityConfig::default()
        }),
        None => AbilityConfig::load(),
    };

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(ServerError::Bind)?;
    tracing::info!(
        addr = %config.listen_addr,
        tick_rate_hz = config.tick_rate_hz,
        max_players = config.max_players,
        "Ogre server listening"
    );

    let (app, state) = build_app(config, abilities);
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    let _ = state.session_tx.send(SessionCommand::Stop);
    served.map_err(ServerError::Serve)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
