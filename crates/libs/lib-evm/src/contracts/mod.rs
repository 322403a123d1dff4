//! Typed access to the deployed contracts.

pub mod abi;
pub mod gateway;

pub use abi::{ICommunityDao, ICreateCommunity};
pub use gateway::{
    CommunityRecord, CommunityRegistry, ContractGateway, ContractHandle, MemberRecord,
    MembershipRegistry, PollRecord,
};
