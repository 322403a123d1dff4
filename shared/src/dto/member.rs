use serde::{Deserialize, Serialize};

/// Membership record as reported by the membership registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Member {
    pub member_address: String,
    /// Total contribution, formatted in ETH
    pub contribution: String,
    pub profile_nft_id: u64,
    pub voting_power: u64,
    pub exists: bool,
}

/// What the home page needs to know about the connected account.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MembershipStatus {
    pub is_member: bool,
    pub voting_power: u64,
}

impl From<&Member> for MembershipStatus {
    fn from(member: &Member) -> Self {
        Self {
            is_member: member.exists,
            voting_power: member.voting_power,
        }
    }
}
