//! # Validation Utilities
//!
//! Input validation helpers for the community and poll forms.

use alloy_primitives::Address;

/// Validate that a string is not empty.
pub fn validate_not_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("{} cannot be empty", field_name))
    } else {
        Ok(())
    }
}

/// Validate that a list has at least `min` entries.
pub fn validate_min_count<T>(values: &[T], min: usize, field_name: &str) -> Result<(), String> {
    if values.len() < min {
        Err(format!("Need at least {} {}", min, field_name))
    } else {
        Ok(())
    }
}

/// Check an Ethereum address the way wallets do.
///
/// Accepts 40 hex digits with an optional `0x` prefix. All-lowercase and all-uppercase
/// forms carry no checksum and are accepted; mixed case must match EIP-55.
pub fn is_valid_eth_address(address: &str) -> bool {
    let body = address.strip_prefix("0x").unwrap_or(address);
    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }

    let has_lower = body.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = body.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        return Address::parse_checksummed(format!("0x{}", body), None).is_ok();
    }
    true
}

/// Zero-based positions of non-blank entries that are not valid addresses.
///
/// Blank entries are skipped; the form drops them before submission.
pub fn invalid_address_positions(addresses: &[String]) -> Vec<usize> {
    addresses
        .iter()
        .enumerate()
        .filter(|(_, address)| {
            let trimmed = address.trim();
            !trimmed.is_empty() && !is_valid_eth_address(trimmed)
        })
        .map(|(index, _)| index)
        .collect()
}
