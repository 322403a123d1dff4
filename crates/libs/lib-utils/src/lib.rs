//! # Utilities Library
//!
//! Input validation and time formatting shared by the service layer.

pub mod time;
pub mod validation;

// Re-export commonly used functions
pub use time::{days_to_seconds, format_unix_date, unix_to_utc, SECONDS_PER_DAY};
pub use validation::{
    invalid_address_positions, is_valid_eth_address, validate_min_count, validate_not_empty,
};
