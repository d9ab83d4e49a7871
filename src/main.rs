use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use catalog_kernel::{
    settings::{LoadOptions, Settings},
    InitCtx,
};

#[derive(Debug, Parser)]
#[command(name = "catalog-app", about = "Book catalog HTTP service")]
struct Cli {
    /// Deployment environment (local, staging, production); overrides CATALOG_ENV
    #[arg(long, global = true)]
    env: Option<String>,

    /// Directory holding base.toml and per-environment overlays
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the HTTP API (default)
    Serve,
    /// Print the effective configuration without secrets and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load_with(LoadOptions {
        environment: cli.env,
        config_dir: cli.config_dir,
    })
    .context("failed to load catalog settings")?;

    catalog_telemetry::init(&settings.telemetry)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::CheckConfig => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
        Command::Serve => serve(settings).await,
    }
}

async fn serve(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.database.backend,
        "catalog-app bootstrap starting"
    );

    let gateway = catalog_db::connect(&settings.database).await?;
    let registry = catalog_app::build_registry(&settings, gateway)?;

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_all(&ctx).await?;
    registry.start_all(&ctx).await?;

    tracing::info!("catalog-app bootstrap complete");

    let verifier = catalog_app::token_verifier(&settings.auth);
    let served = catalog_http::start_server(&registry, &settings, verifier).await;

    registry.stop_all().await?;
    served
}
