//! # Web Library
//!
//! View-model services for the pages: membership, communities and polls, the bounded
//! scan used to list on-chain collections and the local poll display cache.

pub mod scan;
pub mod services;
pub mod store;

pub use scan::{bounded_scan, ScanOutcome, ScanStop};
pub use services::{
    parse_eth_amount, CommunityService, MembershipService, PollDraft, PollService, ValidatedPoll,
    MIN_OPTIONS,
};
pub use store::{KeyValueStore, MemoryStore, PollDisplayCache};
