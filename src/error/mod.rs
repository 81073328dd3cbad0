//! Error handling for archscan
//!
//! This module provides the error taxonomy, result alias and error context
//! utilities shared by every component.

pub mod context;
pub mod types;

pub use context::{handle_error, try_with_recovery, OptionExt, ResultExt};
pub use types::{ArchscanError, ErrorSeverity, Result};
