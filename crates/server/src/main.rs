mod api;
mod cli;
mod router;
mod state;

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use cli::{Cli, Command};
use state::AppState;

fn load_config() -> pvguard_core::Config {
    pvguard_core::config::load_dotenv();
    pvguard_core::Config::from_env()
}

async fn serve(config: &pvguard_core::Config) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(config));

    if config.model.preload {
        let warm = state.clone();
        match tokio::task::spawn_blocking(move || warm.engine.warm_up()).await? {
            Ok(()) => info!("Model loaded from {}", state.engine.scorer().source()),
            Err(e) => error!("Model preload failed, /predict will return 503: {}", e),
        }
    } else {
        warn!("Model preload disabled, loading on first request");
    }

    let app = router::build_router(state, &config.server.cors_origin);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .init();

    let cli = Cli::parse();
    let config = load_config();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            config.log_summary();
            serve(&config).await?;
        }
        Command::Predict {
            timestamp,
            temperature,
            humidity,
            power_mw,
            explain,
        } => cli::predict(&config, &timestamp, temperature, humidity, power_mw, explain)?,
    }

    Ok(())
}
