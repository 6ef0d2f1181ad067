//! Relay server binary.

use advisor_core::ai::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};
use advisor_relay::config::{RelayConfig, DEFAULT_BIND_ADDR};
use clap::Parser;
use tracing::{info, warn};

/// CLI arguments for the relay.
#[derive(Parser, Debug)]
#[command(name = "advisor-relay", about = "Real estate advisor relay server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind: String,

    /// Generative Language API key.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Model identifier.
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Base URL of the Generative Language API.
    #[arg(long, env = "GEMINI_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,
}

impl From<Args> for RelayConfig {
    fn from(args: Args) -> Self {
        Self {
            bind_addr: args.bind,
            api_key: args.api_key,
            model: args.model,
            api_base: args.api_base,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,advisor_relay=debug,advisor_core=debug")),
        )
        .init();

    let config = RelayConfig::from(Args::parse());

    if config.api_key().is_none() {
        warn!("GEMINI_API_KEY is not set; every request will fail with a configuration error");
    }

    let state = advisor_relay::AppState::from_config(&config);
    let app = advisor_relay::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, model = %config.model, "advisor-relay listening");

    axum::serve(listener, app).await?;
    Ok(())
}
