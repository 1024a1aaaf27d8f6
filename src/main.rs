//! Coursemate CLI entry point.

use anyhow::Result;
use clap::Parser;
use coursemate::cli::{commands, Cli, Commands};
use coursemate::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("coursemate={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config_path = cli
        .config
        .as_deref()
        .map(Settings::expand_path)
        .unwrap_or_else(Settings::default_config_path);
    let settings = Settings::load_from(Some(&config_path))?;

    std::fs::create_dir_all(settings.data_dir())?;

    // Execute command
    match cli.command {
        Commands::Ask { question, model } => {
            commands::run_ask(&question, model, settings).await?;
        }

        Commands::Chat { model } => {
            commands::run_chat(model, settings).await?;
        }

        Commands::Courses => {
            commands::run_courses(settings).await?;
        }

        Commands::Serve { host, port } => {
            commands::run_serve(host, port, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, config_path)?;
        }
    }

    Ok(())
}
