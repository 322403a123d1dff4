//! # Services Layer
//!
//! View-model services the pages call. Each holds a [`ContractGateway`](lib_evm::ContractGateway)
//! and its share of the configuration, and takes the current [`Signer`](lib_evm::Signer)
//! per call, since the signer is replaced whenever the account changes.
//!
//! ```text
//! Pages -> Services -> ContractGateway -> Signer -> window.ethereum
//! ```
//!
//! ## Module Organization
//!
//! - [`membership`] - membership status, registration and contributions
//! - [`community`] - community list, detail, creation and treasury
//! - [`poll`] - poll drafts, validation, creation, voting and the poll list
//!
//! ## Error Handling
//!
//! Services return `Result<T, AppError>`. Validation failures are returned before any
//! wallet request is made; pages pick the text to show with
//! [`AppError::user_message_or`](lib_core::AppError::user_message_or).

pub mod community;
pub mod membership;
pub mod poll;

pub use community::CommunityService;
pub use membership::MembershipService;
pub use poll::{PollDraft, PollService, ValidatedPoll, DEFAULT_DURATION_DAYS, MIN_OPTIONS};

use alloy_primitives::utils::parse_ether;
use alloy_primitives::U256;
use lib_core::{AppError, Result};

/// Parse a user-entered ETH amount that must be strictly positive.
pub fn parse_eth_amount(raw: &str) -> Result<U256> {
    let raw = raw.trim();
    let invalid = || AppError::Validation("Please enter a valid ETH amount".to_string());

    if raw.is_empty() || raw.starts_with('-') || raw.starts_with('+') {
        return Err(invalid());
    }

    let amount = parse_ether(raw).map_err(|_| invalid())?;
    if amount.is_zero() {
        return Err(invalid());
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_eth_amount() {
        assert_eq!(parse_eth_amount("0.01").unwrap(), U256::from(10_000_000_000_000_000u64));
        assert_eq!(parse_eth_amount(" 1 ").unwrap(), U256::from(1_000_000_000_000_000_000u64));
        assert!(parse_eth_amount("0").is_err());
        assert!(parse_eth_amount("0.0").is_err());
        assert!(parse_eth_amount("-1").is_err());
        assert!(parse_eth_amount("").is_err());
        assert!(parse_eth_amount("one").is_err());
    }
}
