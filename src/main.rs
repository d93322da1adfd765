// Casewise - Clinical Case Summary Pipeline
// Copyright (c) 2025 Casewise Contributors
// Licensed under the MIT License

use casewise::cli::{Cli, Commands};
use casewise::config::LoggingConfig;
use casewise::logging::init_logging;
use clap::Parser;
use std::process;
use tokio::sync::watch;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Console-only logging for the CLI; file logging is configured per deployment
    let log_level = cli.log_level.as_deref().unwrap_or("info");
    let _logging_guard = match init_logging(log_level, &LoggingConfig::default()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(5);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Casewise - Clinical Case Summary Pipeline"
    );

    // Create shutdown signal channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            tracing::info!("Received SIGINT (Ctrl+C), aborting run");
                        }
                        _ = sigterm.recv() => {
                            tracing::info!("Received SIGTERM, aborting run");
                        }
                    }
                    let _ = shutdown_tx.send(true);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("Received SIGINT (Ctrl+C), aborting run");
                        let _ = shutdown_tx.send(true);
                    }
                }
            }
        }

        #[cfg(not(unix))]
        {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            } else {
                tracing::info!("Received SIGINT (Ctrl+C), aborting run");
                let _ = shutdown_tx.send(true);
            }
        }
    });

    let exit_code = match execute_command(&cli, shutdown_rx).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            5
        }
    };

    process::exit(exit_code);
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, shutdown_signal: watch::Receiver<bool>) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Run(args) => args.execute(&cli.config, shutdown_signal).await,
        Commands::Show(args) => args.execute(&cli.config).await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Init(args) => args.execute().await,
    }
}
