//! Purse CLI - user account API server and admin tools

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{logs, migrate, serve, status, users};
use purse_core::OperationResult;

/// Purse - user accounts and authentication over HTTP
#[derive(Parser)]
#[command(name = "purse", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Address to bind (overrides settings and PURSE_HOST)
        #[arg(long)]
        host: Option<String>,
        /// Port to bind (overrides settings and PURSE_PORT)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Show user and account counts
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List users, optionally filtered by username
    Users {
        /// Case-insensitive username substring
        #[arg(long, short)]
        filter: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },

    /// Apply pending schema migrations
    Migrate {
        /// List pending migrations without applying them
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Serve { .. } => "serve",
            Commands::Status { .. } => "status",
            Commands::Users { .. } => "users",
            Commands::Logs { .. } => "logs",
            Commands::Migrate { .. } => "migrate",
        }
    }

    fn json(&self) -> bool {
        match self {
            Commands::Status { json } | Commands::Users { json, .. } => *json,
            Commands::Migrate { json, .. } => *json,
            Commands::Logs { command } => command.json(),
            Commands::Serve { .. } => false,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    purse_server::logging::init_tracing();

    let cli = Cli::parse();
    let name = cli.command.name();
    let json = cli.command.json();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            commands::log_failure(name, &e);
            if json {
                let result = OperationResult::<()>::fail(format!("{:#}", e));
                match serde_json::to_string_pretty(&result) {
                    Ok(body) => println!("{}", body),
                    Err(_) => output::error(&format!("{:#}", e)),
                }
            } else {
                output::error(&format!("Error: {:#}", e));
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { host, port } => serve::run(host, port).await,
        Commands::Status { json } => status::run(json).await,
        Commands::Users { filter, json } => users::run(filter.as_deref(), json).await,
        Commands::Logs { command } => logs::run(command),
        Commands::Migrate { dry_run, json } => migrate::run(dry_run, json),
    }
}
