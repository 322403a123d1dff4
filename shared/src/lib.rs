//! # Shared Data Transfer Objects Library
//!
//! Records and formatting helpers shared by the service layer (`lib-web`) and the
//! browser application (`community-web`).
//!
//! ## Structure
//!
//! - **[`dto`]**: View-level records
//!   - **[`dto::member`]**: Membership and voting power
//!   - **[`dto::community`]**: Communities
//!   - **[`dto::poll`]**: Funding polls and cached poll display metadata
//! - **[`utils`]**: Formatting helpers
//!   - **[`utils::short_address`]**: `0x1234...abcd` address badges
//!   - **[`utils::format_ether`]**: Wei amounts as ETH strings
//!
//! ## Usage
//!
//! ```rust
//! use shared::{Community, short_address};
//!
//! let community = Community {
//!     id: 0,
//!     name: "Garden Club".to_string(),
//!     description: "Seeds and soil".to_string(),
//!     creator: "0x11a99b229BAc81A3A45A2566Bc0C83AC3d89A30A".to_string(),
//!     treasury: "1.5".to_string(),
//!     creation_time: "3/14/2025".to_string(),
//! };
//!
//! assert_eq!(short_address(&community.creator), "0x11a9...A30A");
//! ```

pub mod dto;
pub mod utils;

// Wildcard re-exports: everything in this crate is public API
pub use dto::*;
pub use utils::*;
