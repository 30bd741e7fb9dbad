//! Error types for thread lifecycle operations.

use std::io;

use thiserror::Error;

/// Errors surfaced by [`Thread`](crate::Thread) construction and joining.
///
/// Both variants carry the raw OS error code returned by the failing
/// `pthread_*` call. Nothing at this layer retries; callers decide.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThreadError {
    #[error("failed to create thread `{name}`: {}", os_error(.code))]
    Creation { code: i32, name: String },

    #[error("failed to join thread `{name}`: {}", os_error(.code))]
    Join { code: i32, name: String },
}

impl ThreadError {
    /// The OS error code reported by the native call.
    pub fn code(&self) -> i32 {
        match self {
            ThreadError::Creation { code, .. } | ThreadError::Join { code, .. } => *code,
        }
    }

    /// Name of the thread the operation was attempted on.
    pub fn thread_name(&self) -> &str {
        match self {
            ThreadError::Creation { name, .. } | ThreadError::Join { name, .. } => name,
        }
    }
}

fn os_error(code: &i32) -> io::Error {
    io::Error::from_raw_os_error(*code)
}

/// Result type for thread lifecycle operations.
pub type ThreadResult<T> = Result<T, ThreadError>;
