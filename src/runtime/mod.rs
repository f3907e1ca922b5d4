//! Process runtime
//!
//! Logging setup, component wiring and the stdio server loop.

mod runner;
mod wiring;

pub use runner::{run_with_cli, shutdown_otel};
pub use wiring::Components;
