//! Server runner
//!
//! Entry point for running the IQPilot tool server over stdio.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::RwLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::wiring::Components;
use crate::cli::Cli;
use crate::events::ArticleWatcher;
use crate::mcp::{McpServer, serve};
use crate::settings::{ConfigWatcher, SettingsManager};

#[cfg(feature = "otel")]
use opentelemetry::global;
#[cfg(feature = "otel")]
use opentelemetry::trace::TracerProvider;
#[cfg(feature = "otel")]
use opentelemetry_otlp::WithExportConfig;
#[cfg(feature = "otel")]
use opentelemetry_sdk::trace::SdkTracerProvider;

// Kept for shutdown
#[cfg(feature = "otel")]
static OTEL_PROVIDER: std::sync::OnceLock<SdkTracerProvider> = std::sync::OnceLock::new();

/// Flush and shut down the OpenTelemetry provider
///
/// Call before exiting so pending spans reach the backend.
#[cfg(feature = "otel")]
pub fn shutdown_otel() {
    if let Some(provider) = OTEL_PROVIDER.get() {
        tracing::info!("Shutting down OpenTelemetry provider...");
        if let Err(e) = provider.shutdown() {
            eprintln!("Failed to shutdown OpenTelemetry provider: {:?}", e);
        } else {
            tracing::info!("OpenTelemetry provider shutdown complete");
        }
    }
}

/// Shutdown OpenTelemetry provider (no-op when feature is disabled)
#[cfg(not(feature = "otel"))]
pub fn shutdown_otel() {}

#[cfg(feature = "otel")]
fn init_otel(endpoint: &str, service_name: &str) -> anyhow::Result<SdkTracerProvider> {
    use opentelemetry_sdk::Resource;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(
            Resource::builder()
                .with_service_name(service_name.to_owned())
                .build(),
        )
        .build();

    global::set_tracer_provider(provider.clone());
    Ok(provider)
}

/// Build an EnvFilter from CLI args and RUST_LOG
///
/// Priority: RUST_LOG environment variable > CLI arguments (-v, -vv, -q)
fn build_env_filter(cli: &Cli) -> tracing_subscriber::EnvFilter {
    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        if !rust_log.is_empty() {
            return tracing_subscriber::EnvFilter::new(rust_log);
        }
    }

    let level = cli.log_level();
    tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into())
}

/// Install the subscriber with the given writer, adding the OTLP layer when enabled
fn install_subscriber<W>(cli: &Cli, writer: W) -> anyhow::Result<()>
where
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let filter = build_env_filter(cli);
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false);

    #[cfg(feature = "otel")]
    {
        if let (true, Some(endpoint)) = (cli.is_otel_enabled(), cli.otel_endpoint.as_deref()) {
            let service_name = &cli.otel_service_name;
            eprintln!(
                "OpenTelemetry enabled: endpoint={}, service={}",
                endpoint, service_name
            );

            let provider = init_otel(endpoint, service_name)?;
            let tracer = provider.tracer("iqpilot");
            let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);
            drop(OTEL_PROVIDER.set(provider));

            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .with(otel_layer)
                .try_init()?;
            return Ok(());
        }
    }

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;
    Ok(())
}

/// Initialize logging based on CLI arguments
///
/// Stdout carries the protocol, so logs go to stderr or to a file.
fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    if !cli.is_diagnostic() {
        return install_subscriber(cli, std::io::stderr);
    }

    let log_path = cli.log_path();
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(&log_path)
        .with_context(|| format!("creating log file {}", log_path.display()))?;

    eprintln!("Diagnostic mode: logging to {}", log_path.display());
    install_subscriber(cli, std::sync::Mutex::new(file))
}

/// Run the server with CLI arguments
///
/// Serves JSON-RPC over stdin/stdout until stdin closes.
pub async fn run_with_cli(cli: &Cli) -> anyhow::Result<()> {
    let startup_time = std::time::Instant::now();
    init_logging(cli)?;

    let workspace_root = resolve_workspace(cli.workspace_root())?;
    log_banner(cli, &workspace_root);

    let settings = Arc::new(RwLock::new(SettingsManager::new(&workspace_root)));
    let _config_watcher =
        match ConfigWatcher::start_auto_reload(Arc::clone(&settings), cli.config_debounce_ms) {
            Ok(handle) => Some(handle),
            Err(e) => {
                tracing::warn!(error = %e, "Config watcher unavailable, settings will not reload");
                None
            }
        };

    let components = Components::new(Arc::clone(&settings));
    let registry = components
        .registry()
        .context("building the tool registry")?;

    let _article_watcher = if cli.no_watch {
        tracing::info!("File watching disabled");
        None
    } else {
        Some(
            ArticleWatcher::start(
                &workspace_root,
                Arc::clone(&components.coordinator),
                Arc::clone(&settings),
            )
            .context("starting the file watcher")?,
        )
    };

    let server = Arc::new(McpServer::new(Arc::new(registry)));
    tracing::info!(
        tools = server.registry().len(),
        startup_ms = startup_time.elapsed().as_millis(),
        "Server ready, waiting for messages on stdin"
    );

    let result = serve(server, tokio::io::stdin(), tokio::io::stdout()).await;

    let uptime = startup_time.elapsed();
    match &result {
        Ok(()) => tracing::info!(uptime_secs = uptime.as_secs(), "Input closed, shutting down"),
        Err(e) => tracing::error!(error = %e, uptime_secs = uptime.as_secs(), "Server error"),
    }
    result.map_err(Into::into)
}

/// Canonical absolute workspace root
fn resolve_workspace(root: PathBuf) -> anyhow::Result<PathBuf> {
    let canonical = std::fs::canonicalize(&root)
        .with_context(|| format!("workspace root {} is not accessible", root.display()))?;
    if !canonical.is_dir() {
        anyhow::bail!("workspace root {} is not a directory", canonical.display());
    }
    Ok(canonical)
}

fn log_banner(cli: &Cli, workspace_root: &std::path::Path) {
    let is_tty = std::io::stdin().is_terminal();
    let connection_id = uuid::Uuid::new_v4();
    let start_time = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");

    tracing::info!(
        "================================================================================"
    );
    tracing::info!("  IQPilot - Server Start");
    tracing::info!(
        "--------------------------------------------------------------------------------"
    );
    tracing::info!("  Version:       {}", env!("CARGO_PKG_VERSION"));
    tracing::info!("  Start Time:    {}", start_time);
    tracing::info!("  Connection ID: {}", connection_id);
    tracing::info!("  PID:           {}", std::process::id());
    tracing::info!("  Workspace:     {}", workspace_root.display());
    tracing::info!(
        "  TTY Mode:      {}",
        if is_tty { "interactive" } else { "subprocess" }
    );
    tracing::info!(
        "================================================================================"
    );

    if cli.is_diagnostic() {
        tracing::info!(log_path = %cli.log_path().display(), "Diagnostic mode enabled");
    }

    if is_tty {
        eprintln!("IQPilot is running in interactive mode.");
        eprintln!("It speaks MCP (JSON-RPC) over stdin/stdout.");
        eprintln!("Configure your editor to launch this binary as an MCP server.");
        eprintln!("(Press Ctrl+C to exit)");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_workspace() {
        let dir = TempDir::new().unwrap();
        let resolved = resolve_workspace(dir.path().to_path_buf()).unwrap();
        assert!(resolved.is_absolute());
        assert_eq!(resolved, std::fs::canonicalize(dir.path()).unwrap());

        assert!(resolve_workspace(dir.path().join("missing")).is_err());

        let file = dir.path().join("file.md");
        std::fs::write(&file, "x").unwrap();
        let err = resolve_workspace(file).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }
}
