//! Error types for MailDock

use thiserror::Error;

/// Result type alias for MailDock operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for MailDock
#[derive(Debug, Error)]
pub enum Error {
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    #[error("Invalid UI location: {0}. Must be sidebar, toolbar_start, or toolbar_end")]
    InvalidUiLocation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_offending_value() {
        let err = Error::InvalidUiLocation("diagonal".to_string());
        assert!(err.to_string().contains("diagonal"));
    }
}
