use serde::{Deserialize, Serialize};

/// Option labels shown when a poll has no cached display metadata.
pub const PLACEHOLDER_OPTIONS: [&str; 2] = ["Option 1", "Option 2"];

/// Funding poll merged from the contract read and the local display cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Poll {
    pub id: u64,
    pub question: String,
    pub options: Vec<String>,
    pub recipients: Vec<String>,
    /// Creation date, formatted `M/D/YYYY`
    pub creation_time: String,
    /// End date, formatted `M/D/YYYY`
    pub end_time: String,
    pub is_closed: bool,
    pub funds_distributed: bool,
    pub total_votes: u64,
    /// Poll fund, formatted in ETH
    pub total_fund: String,
    /// `false` when `options`/`recipients` are the placeholder, not cached labels
    pub details_cached: bool,
}

/// Display metadata the contract does not hand back in its poll reads.
///
/// Stored in the browser under `poll-{community_id}-{poll_id}`. Best-effort only: a
/// different browser, cleared storage or another front-end instance will not have it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PollDetails {
    pub options: Vec<String>,
    pub recipients: Vec<String>,
}

impl PollDetails {
    /// The fixed two-option placeholder used on a cache miss.
    pub fn placeholder() -> Self {
        Self {
            options: PLACEHOLDER_OPTIONS.iter().map(|s| s.to_string()).collect(),
            recipients: Vec::new(),
        }
    }
}
