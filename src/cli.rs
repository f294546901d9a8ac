//! # Command Line Interface
//!
//! `keytree serve` (the default) runs the RPC server. `keytree tree` performs
//! one full tree request against the configured backend and prints the JSON
//! tree to stdout.

use std::io::Write;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::{start_api_server, ApiState};
use crate::config::{self, AppConfig};
use crate::observability::{init_observability, log_config_info};
use crate::startup::build_service;
use crate::{APP_NAME, VERSION};

#[derive(Parser)]
#[command(name = "keytree")]
#[command(about = "Read-only facade over an environment/service/file secret tree")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the RPC server
    Serve,

    /// Print the full secret tree as JSON
    Tree {
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
}

pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = config::load()?;
    if cli.verbose {
        config.observability.log_level = "debug".to_string();
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve(config).await?,
        Commands::Tree { pretty } => print_tree(config, pretty).await?,
    }

    Ok(())
}

async fn serve(config: AppConfig) -> crate::Result<()> {
    init_observability(&config.observability)?;
    info!(app_name = APP_NAME, version = VERSION, "Starting keytree");
    log_config_info(&config);

    let service = Arc::new(build_service(&config)?);
    start_api_server(config.api.clone(), ApiState::new(service)).await
}

async fn print_tree(mut config: AppConfig, pretty: bool) -> crate::Result<()> {
    // one-shot command; no exporter
    config.observability.enable_metrics = false;
    init_observability(&config.observability)?;

    let service = build_service(&config)?;

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });

    let tree = service.get_full_tree(&cancel).await?;

    let output =
        if pretty { serde_json::to_string_pretty(&tree) } else { serde_json::to_string(&tree) };
    let output = output
        .map_err(|e| crate::Error::internal(format!("Failed to serialize tree: {}", e)))?;
    write_output(&mut std::io::stdout().lock(), &output)?;

    Ok(())
}

/// A closed stdout (e.g. `keytree tree | head`) surfaces as `Error::Io`.
fn write_output(out: &mut impl Write, output: &str) -> crate::Result<()> {
    writeln!(out, "{}", output)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_serve() {
        let cli = Cli::try_parse_from(["keytree"]).unwrap();
        assert!(cli.command.is_none());

        let cli = Cli::try_parse_from(["keytree", "tree", "--pretty", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Some(Commands::Tree { pretty: true })));
    }

    #[test]
    fn test_write_output() {
        let mut buf = Vec::new();
        write_output(&mut buf, "{\"envs\":[]}").unwrap();
        assert_eq!(buf, b"{\"envs\":[]}\n");
    }

    #[test]
    fn test_write_output_to_closed_pipe_is_io_error() {
        struct ClosedPipe;

        impl Write for ClosedPipe {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let err = write_output(&mut ClosedPipe, "{}").unwrap_err();
        match err {
            crate::Error::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe),
            other => panic!("expected Io error, got {:?}", other),
        }
    }
}
