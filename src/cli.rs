//! Command-line interface definitions
//!
//! Provides CLI argument parsing using clap for the IQPilot tool server.

use std::path::PathBuf;

use clap::Parser;

/// Prefix of generated diagnostic log files
const LOG_FILE_PREFIX: &str = "iqpilot";

/// IQPilot - article metadata and content tools over MCP
#[derive(Parser, Debug, Clone)]
#[command(name = "iqpilot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Documentation repository root (defaults to the current directory)
    #[arg(value_name = "WORKSPACE", env = "IQPILOT_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Do not watch the workspace for file changes
    #[arg(long)]
    pub no_watch: bool,

    /// Debounce for configuration file changes, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 500)]
    pub config_debounce_ms: u64,

    /// Enable diagnostic mode (auto-log to temp file)
    #[arg(short, long)]
    pub diagnostic: bool,

    /// Log directory (implies diagnostic mode)
    #[arg(short = 'l', long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Log file name (implies diagnostic mode)
    #[arg(short = 'f', long, value_name = "FILE")]
    pub log_file: Option<String>,

    /// Increase logging verbosity (-v, -vv)
    /// Note: RUST_LOG env var takes priority over this flag
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (only errors)
    /// Note: RUST_LOG env var takes priority over this flag
    #[arg(short, long)]
    pub quiet: bool,

    /// OpenTelemetry OTLP endpoint (e.g., http://localhost:4317)
    /// Accepted but ignored when built without the otel feature.
    #[arg(long, value_name = "URL", env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otel_endpoint: Option<String>,

    /// OpenTelemetry service name
    #[arg(long, value_name = "NAME", default_value = "iqpilot")]
    pub otel_service_name: String,
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            workspace: None,
            no_watch: false,
            config_debounce_ms: 500,
            diagnostic: false,
            log_dir: None,
            log_file: None,
            verbose: 0,
            quiet: false,
            otel_endpoint: None,
            otel_service_name: "iqpilot".to_string(),
        }
    }
}

impl Cli {
    /// Workspace root as given, else the current directory
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Check if diagnostic mode is enabled (output to file)
    ///
    /// Returns true if `--diagnostic` is set, or if `--log-dir` or `--log-file` is specified.
    pub fn is_diagnostic(&self) -> bool {
        self.diagnostic || self.log_dir.is_some() || self.log_file.is_some()
    }

    /// Check if OpenTelemetry tracing is enabled
    #[cfg(feature = "otel")]
    pub fn is_otel_enabled(&self) -> bool {
        self.otel_endpoint.is_some()
    }

    /// Always false without the otel feature
    #[cfg(not(feature = "otel"))]
    pub fn is_otel_enabled(&self) -> bool {
        if self.otel_endpoint.is_some() {
            tracing::warn!("--otel-endpoint specified but otel feature is not enabled, ignoring");
        }
        false
    }

    /// Get the log level based on CLI arguments
    ///
    /// - `--quiet`: ERROR
    /// - default: INFO
    /// - `-v`: DEBUG
    /// - `-vv` or more: TRACE
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else {
            match self.verbose {
                0 => tracing::Level::INFO,
                1 => tracing::Level::DEBUG,
                _ => tracing::Level::TRACE,
            }
        }
    }

    /// Get the log file path for diagnostic mode
    ///
    /// Defaults to `iqpilot-{timestamp}.log` in the system temp directory.
    pub fn log_path(&self) -> PathBuf {
        let dir = self.log_dir.clone().unwrap_or_else(std::env::temp_dir);

        let filename = self.log_file.clone().unwrap_or_else(|| {
            let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
            format!("{LOG_FILE_PREFIX}-{timestamp}.log")
        });

        dir.join(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const WORKSPACE_ENV: &str = "IQPILOT_WORKSPACE";

    #[test]
    fn test_default_cli() {
        let cli = Cli::default();
        assert!(!cli.is_diagnostic());
        assert!(!cli.no_watch);
        assert_eq!(cli.log_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_log_options_imply_diagnostic() {
        let cli = Cli {
            log_dir: Some(PathBuf::from("/tmp")),
            ..Default::default()
        };
        assert!(cli.is_diagnostic());

        let cli = Cli {
            log_file: Some("test.log".to_string()),
            ..Default::default()
        };
        assert!(cli.is_diagnostic());
    }

    #[test]
    fn test_log_levels() {
        let cli = Cli {
            quiet: true,
            verbose: 2,
            ..Default::default()
        };
        assert_eq!(cli.log_level(), tracing::Level::ERROR);

        let cli = Cli {
            verbose: 1,
            ..Default::default()
        };
        assert_eq!(cli.log_level(), tracing::Level::DEBUG);

        let cli = Cli {
            verbose: 3,
            ..Default::default()
        };
        assert_eq!(cli.log_level(), tracing::Level::TRACE);
    }

    #[test]
    fn test_log_path() {
        let cli = Cli {
            log_dir: Some(PathBuf::from("/var/log")),
            log_file: Some("test.log".to_string()),
            ..Default::default()
        };
        assert_eq!(cli.log_path(), PathBuf::from("/var/log/test.log"));

        let path = Cli::default().log_path();
        assert!(path.starts_with(std::env::temp_dir()));
        let filename = path.file_name().unwrap().to_str().unwrap();
        assert!(filename.starts_with("iqpilot-"));
        assert!(filename.ends_with(".log"));
    }

    #[test]
    #[serial]
    fn test_workspace_positional_wins_over_env() {
        // SAFETY: serialized with every other test touching the environment
        unsafe { std::env::set_var(WORKSPACE_ENV, "/from/env") };
        let cli = Cli::try_parse_from(["iqpilot", "/docs", "--no-watch", "-v"]).unwrap();
        unsafe { std::env::remove_var(WORKSPACE_ENV) };

        assert_eq!(cli.workspace_root(), PathBuf::from("/docs"));
        assert!(cli.no_watch);
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    #[serial]
    fn test_workspace_from_env_then_cwd() {
        unsafe { std::env::set_var(WORKSPACE_ENV, "/from/env") };
        let cli = Cli::try_parse_from(["iqpilot"]).unwrap();
        unsafe { std::env::remove_var(WORKSPACE_ENV) };
        assert_eq!(cli.workspace_root(), PathBuf::from("/from/env"));

        let cli = Cli::try_parse_from(["iqpilot"]).unwrap();
        assert_eq!(cli.workspace, None);
        assert_eq!(cli.workspace_root(), std::env::current_dir().unwrap());
    }
}
