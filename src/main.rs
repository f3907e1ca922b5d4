//! IQPilot binary
//!
//! Run with: cargo run -- <workspace>
//!
//! For help: cargo run -- --help

use std::io::IsTerminal;

use clap::Parser;
use iqpilot::{cli::Cli, run_with_cli, shutdown_otel};
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Hard stop on SIGINT/SIGTERM; stdin EOF drains in-flight calls instead
    let result = tokio::select! {
        result = run_with_cli(&cli) => result,
        _ = signal::ctrl_c() => {
            eprintln!("Received SIGINT, shutting down...");
            Ok(())
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
                    .expect("Failed to register SIGTERM handler");
                sigterm.recv().await
            }
            #[cfg(not(unix))]
            {
                std::future::pending::<()>().await
            }
        } => {
            eprintln!("Received SIGTERM, shutting down...");
            Ok(())
        }
    };

    shutdown_otel();

    if let Err(e) = result {
        // Stdout belongs to the protocol
        eprintln!("Error: {:#}", e);

        if std::io::stdin().is_terminal() {
            eprintln!("\nFor debugging, run with --diagnostic to log to a file.");
            eprintln!("Or use -v/-vv for more verbose logging.");
        }

        std::process::exit(1);
    }

    Ok(())
}
