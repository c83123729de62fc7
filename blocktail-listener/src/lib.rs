pub mod cli;
pub mod config;

use anyhow::Result;
use blocktail_connector::{
    sink::TracingSink,
    workers::{StopReason, TailManager},
};
use clap::Parser;
use cli::{Cli, Commands};
use config::{load_config, ListenerConfig};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use std::sync::Arc;
use tokio::signal;

/// The main entry point for running the listener.
/// This function handles CLI parsing, configuration, and service startup.
pub async fn run() -> Result<()> {
    let cli = Cli::parse();

    let Commands::Run(run_cmd) = cli.command;
    let config = load_config_from_cli(run_cmd)?;
    blocktail_logger::init(&config.listener.log)?;
    tracing::info!("Configuration loaded: {:#?}", &config);
    run_listener(config).await
}

/// Loads the listener configuration based on the provided CLI command.
pub fn load_config_from_cli(run_cmd: cli::RunCmd) -> Result<ListenerConfig> {
    let mut config = if let Some(config_path) = run_cmd.config {
        println!("Loading configuration from '{}'", &config_path);
        load_config(&config_path)?
    } else {
        println!("No config file provided, using default settings.");
        ListenerConfig::default()
    };

    if let Some(rpc_url) = run_cmd.rpc_url {
        config.connector.solana.rpc_url = rpc_url;
    }

    Ok(config)
}

/// Starts the tail manager and stops it on Ctrl+C.
async fn run_listener(config: ListenerConfig) -> Result<()> {
    let solana = &config.connector.solana;
    tracing::info!("{}", solana.rpc_url);

    let rpc_client = Arc::new(RpcClient::new_with_commitment(
        solana.rpc_url.clone(),
        CommitmentConfig {
            commitment: solana.commitment,
        },
    ));

    let (manager, handle) = TailManager::new(
        Arc::new(config.connector),
        rpc_client,
        Arc::new(TracingSink),
    )?;
    let mut worker = tokio::spawn(manager.run());

    let summary = tokio::select! {
        res = &mut worker => res??,
        res = signal::ctrl_c() => {
            match res {
                Ok(()) => tracing::info!("Received Ctrl+C, initiating graceful shutdown..."),
                Err(err) => tracing::error!(error = %err, "Failed to listen for shutdown signal."),
            }
            handle.stop();
            worker.await??
        }
    };

    match summary.stop_reason {
        StopReason::Shutdown => {
            tracing::info!("Shutdown complete.");
            Ok(())
        }
        StopReason::EndSlotReached => {
            tracing::info!(watermark = summary.watermark, "Reached the configured end slot.");
            Ok(())
        }
    }
}

