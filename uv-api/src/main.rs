//! UV banner API server.

use anyhow::Context;
use clap::Parser;
use std::{path::PathBuf, sync::Arc};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uv_api::{AppState, bind, router};
use uv_core::{BannerService, Config, Pipeline};

#[derive(Debug, Parser)]
#[command(name = "uv-api", version, about = "UV API for banner trigger integrations")]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Path to config.toml (defaults to the platform config directory).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uv_api=info,uv_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;
    let pipeline = Pipeline::from_config(&config).context("Failed to initialise pipeline")?;

    let state = AppState {
        banner: BannerService::new(Arc::new(pipeline)),
        default_city: config.default_city.clone(),
    };

    let listener = bind(&args.host, args.port).await?;

    tracing::info!("UV API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;

    Ok(())
}
