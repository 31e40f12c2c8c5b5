//! CLI entry point for parley.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// parley agent CLI
#[derive(Parser, Debug)]
#[command(name = "parley", version, about = "Tool-using agent with peer delegation")]
pub struct Cli {
    /// Optional TOML config file, overridden by `.env` and the environment
    #[arg(short, long, global = true, env = "PARLEY_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the turn endpoint over HTTP
    Serve(ServeArgs),
    /// Run a single turn and print the result
    Chat(ChatArgs),
}

/// Arguments for the `serve` subcommand.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Listen host (overrides PARLEY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port (overrides PARLEY_PORT)
    #[arg(short, long)]
    pub port: Option<u16>,
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Print tool calls and tool results too
    #[arg(long)]
    pub show_intermediate_steps: bool,

    /// User prompt (positional)
    pub prompt: String,
}
