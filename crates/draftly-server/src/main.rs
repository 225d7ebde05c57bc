use anyhow::{Context, Result};
use clap::Parser;
use draftly_core::{Config, Provider};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod error;
mod routes;
mod state;

use state::AppState;

#[derive(Parser)]
#[command(name = "draftly-server")]
#[command(about = "Serves the draftly chat and agent endpoints")]
struct Cli {
    /// Address to listen on, overrides DRAFTLY_LISTEN and the config file
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env.local wins over .env; neither is required
    dotenv::from_filename(".env.local").ok();
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    for provider in Provider::all() {
        if config.api_key(provider).is_none() {
            tracing::warn!(
                provider = provider.as_str(),
                "{} is not set; {} requests will return a setup hint",
                provider.key_env_var(),
                provider.display_name()
            );
        }
    }

    let addr = cli.listen.unwrap_or_else(|| config.listen_addr().to_string());
    let app = routes::router(AppState::from_config(&config)).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
    tracing::info!("shutting down");
}
