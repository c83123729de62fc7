use clap::{Parser, Subcommand};

/// The main CLI structure for the blocktail listener.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Defines the available subcommands for the application.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow the tip of the cluster and index every new block.
    Run(RunCmd),
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug, Default)]
pub struct RunCmd {
    /// Path to the listener configuration TOML file.
    /// If not provided, default values will be used.
    #[arg(short, long)]
    pub config: Option<String>,

    /// RPC endpoint of the node, overrides `connector.solana.rpc-url`.
    #[arg(short, long)]
    pub rpc_url: Option<String>,
}
