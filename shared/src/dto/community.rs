use serde::{Deserialize, Serialize};

/// Community as listed on the home page and shown on its detail page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Community {
    pub id: u64,
    pub name: String,
    pub description: String,
    pub creator: String,
    /// Treasury balance, formatted in ETH
    pub treasury: String,
    /// Creation date, formatted `M/D/YYYY`
    pub creation_time: String,
}

/// Form state for the "New Community" form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewCommunity {
    pub name: String,
    pub description: String,
}
