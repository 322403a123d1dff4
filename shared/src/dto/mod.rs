//! # Data Transfer Objects (DTOs)
//!
//! View-level records shared by the services in `lib-web` and the pages in
//! `community-web`. Contract reads are converted into these types once, so pages
//! never touch raw ABI return structs.
//!
//! ## Module Organization
//!
//! - [`member`] - DAO membership and voting power
//! - [`community`] - Communities and their treasuries
//! - [`poll`] - Funding polls and their locally cached display metadata
//!
//! ## Serialization Format
//!
//! All DTOs derive `Serialize`/`Deserialize`. [`PollDetails`] is the only type that is
//! persisted (browser `localStorage`), and its JSON shape is fixed:
//!
//! ```text
//! {"options":["Option A","Option B"],"recipients":["0xabc...","0xdef..."]}
//! ```

pub mod community;
pub mod member;
pub mod poll;

pub use community::*;
pub use member::*;
pub use poll::*;
