//! Error types for the ISE engine
//!
//! This module defines the error type shared by the renderer core and its
//! backends, plus the `engine_err!` / `engine_bail!` helpers that log an
//! error and build (or return) it in one step.

use std::fmt;

/// Result type for ISE engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// ISE engine errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, mock device, etc.)
    BackendError(String),

    /// A GPU call returned a non-success status code
    Status {
        /// What was being attempted
        message: String,
        /// Raw status code reported by the graphics API
        code: i32,
    },

    /// Out of GPU memory
    OutOfMemory,

    /// Invalid resource (texture, buffer, render object, etc.)
    InvalidResource(String),

    /// Initialization failed (device, swapchain, pipeline)
    InitializationFailed(String),

    /// A device or configuration limit was exceeded
    ResourceLimitExceeded {
        /// Kind of resource that hit the limit
        resource: String,
        /// Amount that was requested
        requested: u32,
        /// Maximum the device (or configuration) allows
        limit: u32,
    },

    /// Operation called in a lifecycle state that does not allow it
    InvalidState(String),

    /// Model or texture loading failed
    Load(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::Status { message, code } => {
                write!(f, "{}: GPU call failed with status code {}", message, code)
            }
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::ResourceLimitExceeded { resource, requested, limit } => write!(
                f,
                "Resource limit exceeded: {} requested {} (limit {})",
                resource, requested, limit
            ),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
            Error::Load(msg) => write!(f, "Load error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Whether this error should terminate the rendering session
    ///
    /// Resource-level errors (bad keys, limits) are reported to the caller
    /// and leave the renderer usable; everything else is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::InvalidResource(_) | Error::ResourceLimitExceeded { .. } | Error::Load(_)
        )
    }
}

// ===== ERROR MACROS =====

/// Log an ERROR message and build an `Error::BackendError` with the same text
///
/// # Example
///
/// ```no_run
/// # use ise_engine::engine_err;
/// let err = engine_err!("ise::vulkan", "Failed to create fence: {}", -4);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::log::log_detailed(
            $crate::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::error::Error::BackendError(message)
    }};
}

/// Log an ERROR message and return `Err(Error::BackendError)` from the current function
///
/// # Example
///
/// ```no_run
/// # use ise_engine::{engine_bail, ise::Result};
/// fn check(index: u32, count: u32) -> Result<()> {
///     if index >= count {
///         engine_bail!("ise::Renderer", "index {} out of range ({})", index, count);
///     }
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! engine_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::engine_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
