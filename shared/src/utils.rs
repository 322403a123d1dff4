//! # Shared Utility Functions
//!
//! Display formatting used by the services and the pages.
//!
//! ## Address Formatting
//!
//! - [`format_address`] - Format address with ellipsis (first N and last M characters)
//! - [`short_address`] - `0x1234...abcd`, the header badge format
//!
//! ## Amount Formatting
//!
//! - [`format_ether`] - Wei to ETH with trailing zeros trimmed, `formatEther` style
//!
//! ## Usage
//!
//! ```rust
//! use shared::utils::short_address;
//!
//! let address = "0x11a99b229BAc81A3A45A2566Bc0C83AC3d89A30A";
//! assert_eq!(short_address(address), "0x11a9...A30A");
//! ```

use alloy_primitives::U256;

/// Number of decimals in one ether.
const ETHER_DECIMALS: usize = 18;

/// Format a wallet address by showing the first `prefix_len` and last `suffix_len` characters.
///
/// If the address is shorter than `prefix_len + suffix_len`, it is returned as-is.
///
/// # Examples
///
/// ```rust
/// use shared::utils::format_address;
///
/// let addr = "0x801A82d5Fc8050b283197bF3cA6654dAB56e0e60";
/// assert_eq!(format_address(addr, 6, 4), "0x801A...0e60");
/// assert_eq!(format_address("0x12", 6, 4), "0x12");
/// ```
pub fn format_address(address: &str, prefix_len: usize, suffix_len: usize) -> String {
    let address_len = address.len();

    if address_len <= prefix_len + suffix_len || !address.is_ascii() {
        return address.to_string();
    }

    let prefix = &address[..prefix_len];
    let suffix = &address[address_len - suffix_len..];

    format!("{}...{}", prefix, suffix)
}

/// Format an Ethereum address as `0x` plus four characters, an ellipsis and the last four.
pub fn short_address(address: &str) -> String {
    format_address(address, 6, 4)
}

/// Format a wei amount as ETH.
///
/// Trailing zeros of the fraction are dropped but at least one fractional digit is kept,
/// so whole amounts read `1.0`.
///
/// # Examples
///
/// ```rust
/// use alloy_primitives::U256;
/// use shared::utils::format_ether;
///
/// assert_eq!(format_ether(U256::from(10_000_000_000_000_000u64)), "0.01");
/// assert_eq!(format_ether(U256::from(1_000_000_000_000_000_000u64)), "1.0");
/// ```
pub fn format_ether(wei: U256) -> String {
    let digits = wei.to_string();
    let padded = format!("{:0>width$}", digits, width = ETHER_DECIMALS + 1);
    let (whole, fraction) = padded.split_at(padded.len() - ETHER_DECIMALS);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, fraction)
    }
}
