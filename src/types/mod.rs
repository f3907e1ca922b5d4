//! Shared types
//!
//! This module contains the types used across the crate.

mod error;
mod event;

pub use error::{ErrorCode, IqPilotError, Result};
pub use event::{FileEvent, FileEventKind};
pub(crate) use event::{path_key, rename_key};
