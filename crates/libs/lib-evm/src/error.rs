//! # EVM Errors
//!
//! Failures talking to the wallet or decoding contract data, and their mapping into
//! the application-wide [`AppError`].

use alloy_primitives::{Address, B256};
use lib_core::AppError;
use thiserror::Error;

use crate::provider::ProviderError;

#[derive(Debug, Error)]
pub enum EvmError {
    /// The wallet answered the request with an error object.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Call data or return data did not match the contract ABI.
    #[error("ABI error: {0}")]
    Abi(#[from] alloy_sol_types::Error),

    /// The wallet answered with JSON of the wrong shape.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// `eth_accounts` came back empty while deriving a signer.
    #[error("no authorized account")]
    NoAuthorizedAccount,

    /// The account being adopted is not among the wallet's authorized accounts.
    #[error("account {0} is not authorized by the wallet")]
    AccountMismatch(Address),

    /// Receipt reported status `0x0`.
    #[error("transaction {0} reverted")]
    Reverted(B256),

    /// No receipt after the configured number of polls.
    #[error("transaction {0} not confirmed")]
    Unconfirmed(B256),
}

impl EvmError {
    pub fn is_user_rejection(&self) -> bool {
        matches!(self, EvmError::Provider(err) if err.is_user_rejection())
    }
}

impl From<serde_json::Error> for EvmError {
    fn from(err: serde_json::Error) -> Self {
        EvmError::InvalidResponse(err.to_string())
    }
}

impl From<EvmError> for AppError {
    fn from(err: EvmError) -> Self {
        match err {
            EvmError::Provider(provider) if provider.is_user_rejection() => {
                AppError::UserRejected(provider.message)
            }
            EvmError::Provider(provider) => AppError::Rpc(provider.to_string()),
            EvmError::Abi(abi) => AppError::Decoding(abi.to_string()),
            EvmError::InvalidResponse(msg) => AppError::Decoding(msg),
            EvmError::NoAuthorizedAccount | EvmError::AccountMismatch(_) => AppError::NotConnected,
            err @ (EvmError::Reverted(_) | EvmError::Unconfirmed(_)) => {
                AppError::Transaction(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_maps_to_user_rejected() {
        let err: AppError = EvmError::Provider(ProviderError::user_rejected()).into();
        assert!(err.is_user_rejection());
    }

    #[test]
    fn test_revert_maps_to_transaction() {
        let err: AppError = EvmError::Reverted(B256::ZERO).into();
        assert!(matches!(err, AppError::Transaction(_)));
    }

    #[test]
    fn test_rpc_failure_maps_to_rpc() {
        let err: AppError = EvmError::Provider(ProviderError::new(-32603, "header not found")).into();
        assert_eq!(err, AppError::Rpc("provider error -32603: header not found".to_string()));
    }
}
