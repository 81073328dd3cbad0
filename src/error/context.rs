//! Error context utilities for archscan
//!
//! This module provides utilities for adding context to errors and handling
//! errors in a consistent way throughout the application.

use crate::error::{ArchscanError, Result};
use std::path::Path;
use tracing::{error, warn};

/// Extension trait for Result to add context to errors
pub trait ResultExt<T, E> {
    /// Add context to an error with a custom message
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;

    /// Add file context to an error
    fn with_file_context<P: AsRef<Path>>(self, path: P) -> Result<T>;
}

impl<T, E> ResultExt<T, E> for std::result::Result<T, E>
where
    E: std::error::Error + 'static,
{
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|err| ArchscanError::Analysis {
            message: format!("{}: {}", context(), err),
        })
    }

    fn with_file_context<P: AsRef<Path>>(self, path: P) -> Result<T> {
        self.map_err(|err| {
            if let Some(io_err) = (&err as &dyn std::error::Error).downcast_ref::<std::io::Error>() {
                if io_err.kind() == std::io::ErrorKind::NotFound {
                    return ArchscanError::InvalidPath {
                        path: path.as_ref().to_path_buf(),
                    };
                }
            }

            ArchscanError::Analysis {
                message: format!("{}: {}", path.as_ref().display(), err),
            }
        })
    }
}

/// Handle an error based on its severity
///
/// - Warning: Log the error and return None
/// - Error: Log the error and return None
/// - Critical: Log the error and return Some(error)
pub fn handle_error(err: ArchscanError) -> Option<ArchscanError> {
    let severity = err.severity();
    let message = err.user_message();

    match severity {
        crate::error::types::ErrorSeverity::Warning => {
            warn!("{}", message);
            None
        }
        crate::error::types::ErrorSeverity::Error => {
            error!("{}", message);
            None
        }
        crate::error::types::ErrorSeverity::Critical => {
            error!("critical: {}", message);
            Some(err)
        }
    }
}

/// Try to run a function and handle any errors based on their severity
///
/// Returns Ok(Some(T)) if the function succeeds, Ok(None) for absorbed
/// non-critical errors, or Err for critical ones.
pub fn try_with_recovery<T, F>(f: F) -> Result<Option<T>>
where
    F: FnOnce() -> Result<T>,
{
    match f() {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            if let Some(critical_err) = handle_error(err) {
                Err(critical_err)
            } else {
                Ok(None)
            }
        }
    }
}

/// Extension trait for Option to convert to Result with a custom error
pub trait OptionExt<T> {
    /// Convert Option to Result with a custom error
    fn ok_or_error<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> ArchscanError;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_error<F>(self, err_fn: F) -> Result<T>
    where
        F: FnOnce() -> ArchscanError,
    {
        self.ok_or_else(err_fn)
    }
}
