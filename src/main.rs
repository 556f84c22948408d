use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use triage_bot::config::{ActionConfig, Cli, Command, Config};
use triage_bot::github::OctocrabClient;
use triage_bot::handlers;
use triage_bot::server::{AppState, build_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "triage_bot=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match Cli::parse().command {
        Command::Serve(args) => {
            let config = Config::try_from(args)?;
            let client =
                OctocrabClient::from_token(&config.token).context("building GitHub client")?;
            if config.secret.is_none() {
                tracing::warn!("GH_SECRET not set; only unsigned deliveries will be accepted");
            }

            let state = AppState::new(
                client,
                handlers::router(),
                config.secret_bytes().map(<[u8]>::to_vec),
                config.consistency_delay,
            );
            let app = build_router(state);

            let listener = tokio::net::TcpListener::bind(config.bind_addr)
                .await
                .with_context(|| format!("binding {}", config.bind_addr))?;
            tracing::info!("listening on {}", config.bind_addr);
            axum::serve(listener, app).await.context("server error")?;
        }
        Command::Action(args) => {
            let config = ActionConfig::try_from(args)?;
            let client =
                OctocrabClient::from_token(&config.token).context("building GitHub client")?;
            triage_bot::action::run(
                &client,
                &handlers::router(),
                &config.event_name,
                &config.event_path,
            )
            .await?;
        }
    }
    Ok(())
}
