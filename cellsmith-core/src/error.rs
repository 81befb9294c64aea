//! Error types for Cellsmith Core
//!
//! Error taxonomy for transaction assembly. Every failure is reported
//! synchronously from `build`; nothing is retried internally.

use std::fmt;

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

/// Cellsmith Core errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Output capacity below the minimum for its shape
    #[error("Invalid output request: {0}")]
    InvalidOutputRequest(String),

    /// Candidate source exhausted before the outputs and fee were covered
    #[error("No enough capacity: {0}")]
    InsufficientCapacity(String),

    /// Leftover too large to burn as fee, too small to form a change cell
    #[error("Unresolvable change: {0}")]
    UnresolvableChange(String),

    /// An extension handler could not be applied
    #[error("Extension handler failure: {0}")]
    ExtensionHandlerFailure(String),

    /// Malformed transaction request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Builder configuration rejected
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Candidate source reported an error
    #[error("Input source error: {0}")]
    InputSource(String),

    /// Capacity arithmetic overflow
    #[error("Amount overflow: {0}")]
    AmountOverflow(String),

    /// Fee re-validation failed after the transaction shape changed
    #[error("Fee mismatch: {0}")]
    FeeMismatch(String),

    /// External signer failure
    #[error("Transaction signing error: {0}")]
    Signing(String),

    /// External submitter failure
    #[error("Transaction submission error: {0}")]
    Submission(String),
}

impl Error {
    /// Check if error is caused by the caller's request or funds (vs internal error)
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidOutputRequest(_)
                | Error::InsufficientCapacity(_)
                | Error::UnresolvableChange(_)
                | Error::InvalidRequest(_)
                | Error::InvalidConfiguration(_)
        )
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InsufficientCapacity(_)
            | Error::UnresolvableChange(_)
            | Error::AmountOverflow(_) => ErrorCategory::Capacity,
            Error::InvalidOutputRequest(_) | Error::InvalidRequest(_) => ErrorCategory::Request,
            Error::InvalidConfiguration(_) => ErrorCategory::Configuration,
            Error::FeeMismatch(_) => ErrorCategory::Fee,
            Error::ExtensionHandlerFailure(_) => ErrorCategory::Handler,
            Error::InputSource(_) | Error::Signing(_) | Error::Submission(_) => {
                ErrorCategory::External
            }
        }
    }
}

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Not enough capacity, or capacity arithmetic failed
    Capacity,
    /// Caller supplied an invalid output or request
    Request,
    /// Configuration rejected
    Configuration,
    /// Fee re-validation
    Fee,
    /// Extension handler
    Handler,
    /// Reported by an external collaborator
    External,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Capacity => write!(f, "Capacity"),
            ErrorCategory::Request => write!(f, "Request"),
            ErrorCategory::Configuration => write!(f, "Configuration"),
            ErrorCategory::Fee => write!(f, "Fee"),
            ErrorCategory::Handler => write!(f, "Handler"),
            ErrorCategory::External => write!(f, "External"),
        }
    }
}
