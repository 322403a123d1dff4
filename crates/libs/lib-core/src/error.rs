//! # Centralized Error Handling
//!
//! This module defines the application-wide error type [`AppError`] used by the service
//! layer and the pages. It follows the `thiserror` pattern for ergonomic error handling.
//!
//! ## Error Categories
//!
//! 1. **Wallet Errors** - the wallet itself is missing or declined
//!    - [`WalletUnavailable`](AppError::WalletUnavailable): no supported wallet, persistent message
//!    - [`UserRejected`](AppError::UserRejected): prompt declined (EIP-1193 code 4001)
//!    - [`NotConnected`](AppError::NotConnected): no account or signer yet
//!
//! 2. **Chain Errors** - the call reached the wallet but failed
//!    - [`Rpc`](AppError::Rpc): provider/network failure
//!    - [`Transaction`](AppError::Transaction): reverted or never confirmed
//!    - [`Decoding`](AppError::Decoding): response did not match the contract ABI
//!
//! 3. **Local Errors**
//!    - [`Validation`](AppError::Validation): form input rejected before any call is made
//!    - [`Storage`](AppError::Storage): browser storage unavailable or full
//!    - [`Config`](AppError::Config): invalid build-time configuration
//!
//! ## Usage Example
//!
//! ```rust
//! use lib_core::error::{AppError, Result};
//!
//! fn parse_option_index(raw: &str) -> Result<u64> {
//!     raw.parse()
//!         .map_err(|_| AppError::Validation("Option must be a number".to_string()))
//! }
//!
//! let err = parse_option_index("x").unwrap_err();
//! assert_eq!(err.user_message_or("Voting failed"), "Option must be a number");
//! ```
//!
//! ## User Messages
//!
//! Pages never show raw RPC errors. [`AppError::user_message_or`] returns the variant's
//! own message for errors the user can act on and the call site's generic message
//! ("Voting failed", "Contribution failed") for everything else.

use thiserror::Error;

/// Convenience type alias for `Result<T, AppError>`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Application-wide error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    /// Invalid configuration detected during startup.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No supported wallet extension is usable in this browser.
    #[error("Wallet unavailable: {0}")]
    WalletUnavailable(String),

    /// The user declined a wallet prompt.
    #[error("Request rejected: {0}")]
    UserRejected(String),

    /// An operation needed a connected account or a signer and had none.
    #[error("Wallet not connected")]
    NotConnected,

    /// Provider or node failure (network error, RPC error response).
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Transaction reverted or confirmation never arrived.
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// A contract response could not be decoded against its ABI.
    #[error("Decoding error: {0}")]
    Decoding(String),

    /// Form input failed validation; nothing was sent.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Browser key-value storage failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl AppError {
    /// Whether the user declined the prompt (as opposed to something breaking).
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, AppError::UserRejected(_))
    }

    /// Get a user-friendly error message, using `fallback` for failures the user cannot act on.
    pub fn user_message_or(&self, fallback: &str) -> String {
        match self {
            AppError::Validation(msg) | AppError::WalletUnavailable(msg) => msg.clone(),
            AppError::UserRejected(_) => "Request rejected in wallet".to_string(),
            AppError::NotConnected => "Wallet not connected".to_string(),
            AppError::Rpc(_)
            | AppError::Transaction(_)
            | AppError::Decoding(_)
            | AppError::Storage(_)
            | AppError::Config(_) => fallback.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            AppError::Validation("Need at least 2 options".to_string()).to_string(),
            "Invalid input: Need at least 2 options"
        );
        assert_eq!(AppError::NotConnected.to_string(), "Wallet not connected");
    }

    #[test]
    fn test_user_message_or() {
        let validation = AppError::Validation("Number of options must match number of recipients".to_string());
        assert_eq!(
            validation.user_message_or("Failed to create poll"),
            "Number of options must match number of recipients"
        );

        let rpc = AppError::Rpc("execution reverted: not a member".to_string());
        assert_eq!(rpc.user_message_or("Voting failed"), "Voting failed");

        let rejected = AppError::UserRejected("User denied transaction signature".to_string());
        assert!(rejected.is_user_rejection());
        assert_eq!(rejected.user_message_or("Voting failed"), "Request rejected in wallet");
    }
}
