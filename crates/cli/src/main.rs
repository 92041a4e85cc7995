mod app;
mod cli;
mod commands;
mod config;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::App;
use crate::cli::Cli;
use crate::config::CliConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "haven_cli=info,haven_session=info,haven_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = CliConfig::resolve(&cli.global)?;

    let mut app = App::start(&config).await?;
    let result = commands::run(&app, cli.command).await;

    if result.is_err() && app.session_was_revoked().await {
        eprintln!("Your session is no longer valid. Run `haven login` to sign in again.");
    }
    app.shutdown().await;
    result
}
