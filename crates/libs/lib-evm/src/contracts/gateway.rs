//! # Contract Gateway
//!
//! Stateless factory for typed handles to the two deployed contracts. A handle binds a
//! [`Signer`] to one fixed address and the matching interface; nothing is fetched when
//! it is built, so a deployment that does not match the ABI only shows up when a method
//! is invoked. No retries and no caching happen at this layer.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use lib_core::Config;
use tracing::debug;

use super::abi::{ICommunityDao, ICreateCommunity};
use crate::error::EvmError;
use crate::provider::Eip1193Provider;
use crate::signer::{PendingTransaction, ReceiptPolling, Signer};

/// Builds call handles for the membership registry and the community contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractGateway {
    community_dao: Address,
    create_community: Address,
    polling: ReceiptPolling,
}

impl ContractGateway {
    pub fn new(community_dao: Address, create_community: Address, polling: ReceiptPolling) -> Self {
        Self {
            community_dao,
            create_community,
            polling,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.community_dao_address,
            config.create_community_address,
            ReceiptPolling {
                interval_ms: config.receipt_poll_interval_ms,
                attempts: config.receipt_poll_attempts,
            },
        )
    }

    pub fn community_dao_address(&self) -> Address {
        self.community_dao
    }

    pub fn create_community_address(&self) -> Address {
        self.create_community
    }

    pub fn membership<W: Eip1193Provider>(&self, signer: &Signer<W>) -> MembershipRegistry<W> {
        MembershipRegistry {
            handle: ContractHandle::new(signer.clone(), self.community_dao, self.polling),
        }
    }

    pub fn community_registry<W: Eip1193Provider>(&self, signer: &Signer<W>) -> CommunityRegistry<W> {
        CommunityRegistry {
            handle: ContractHandle::new(signer.clone(), self.create_community, self.polling),
        }
    }
}

/// A signer bound to one contract address.
#[derive(Debug, Clone)]
pub struct ContractHandle<W> {
    signer: Signer<W>,
    address: Address,
    polling: ReceiptPolling,
}

impl<W: Eip1193Provider> ContractHandle<W> {
    pub fn new(signer: Signer<W>, address: Address, polling: ReceiptPolling) -> Self {
        Self {
            signer,
            address,
            polling,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// `eth_call` a view function and decode its return values.
    pub async fn read<C: SolCall>(&self, call: &C) -> Result<C::Return, EvmError> {
        let data = Bytes::from(call.abi_encode());
        let output = self.signer.call(self.address, data).await?;
        Ok(C::abi_decode_returns(&output, true)?)
    }

    /// Send a state-changing call with `value` wei attached.
    pub async fn write<C: SolCall>(
        &self,
        call: &C,
        value: U256,
    ) -> Result<PendingTransaction<W>, EvmError> {
        debug!(contract = %self.address, method = C::SIGNATURE, %value, "sending transaction");
        let data = Bytes::from(call.abi_encode());
        let hash = self.signer.send_transaction(self.address, data, value).await?;
        Ok(PendingTransaction::new(
            self.signer.wallet().clone(),
            hash,
            self.polling,
        ))
    }
}

// region:    --- Records

/// `getMemberStruct` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub member_address: Address,
    pub contribution: U256,
    pub profile_nft_id: U256,
    pub voting_power: U256,
    pub exists: bool,
}

/// `communities(id)` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommunityRecord {
    pub name: String,
    pub description: String,
    pub creator: Address,
    pub creation_time: U256,
    pub treasury: U256,
}

/// `communityPolls(communityId, pollId)` result. Options and recipients are not
/// readable from the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRecord {
    pub question: String,
    pub creation_time: U256,
    pub end_time: U256,
    pub is_closed: bool,
    pub funds_distributed: bool,
    pub total_votes: U256,
    pub total_fund: U256,
}

impl From<ICommunityDao::getMemberStructReturn> for MemberRecord {
    fn from(ret: ICommunityDao::getMemberStructReturn) -> Self {
        Self {
            member_address: ret.memberAddress,
            contribution: ret.contribution,
            profile_nft_id: ret.profileNftId,
            voting_power: ret.votingPower,
            exists: ret.exists,
        }
    }
}

impl From<ICreateCommunity::communitiesReturn> for CommunityRecord {
    fn from(ret: ICreateCommunity::communitiesReturn) -> Self {
        Self {
            name: ret.name,
            description: ret.description,
            creator: ret.creator,
            creation_time: ret.creationTime,
            treasury: ret.treasury,
        }
    }
}

impl From<ICreateCommunity::communityPollsReturn> for PollRecord {
    fn from(ret: ICreateCommunity::communityPollsReturn) -> Self {
        Self {
            question: ret.question,
            creation_time: ret.creationTime,
            end_time: ret.endTime,
            is_closed: ret.isClosed,
            funds_distributed: ret.fundsDistributed,
            total_votes: ret.totalVotes,
            total_fund: ret.totalFund,
        }
    }
}

// endregion: --- Records

// region:    --- Membership registry

/// Handle to the CommunityDAO membership registry.
#[derive(Debug, Clone)]
pub struct MembershipRegistry<W> {
    handle: ContractHandle<W>,
}

impl<W: Eip1193Provider> MembershipRegistry<W> {
    pub fn address(&self) -> Address {
        self.handle.address()
    }

    pub async fn register_member(&self, fee: U256) -> Result<PendingTransaction<W>, EvmError> {
        self.handle
            .write(&ICommunityDao::registerMemberCall {}, fee)
            .await
    }

    pub async fn add_contribution(&self, amount: U256) -> Result<PendingTransaction<W>, EvmError> {
        self.handle
            .write(&ICommunityDao::addContributionCall {}, amount)
            .await
    }

    pub async fn member(&self, member: Address) -> Result<MemberRecord, EvmError> {
        let ret = self
            .handle
            .read(&ICommunityDao::getMemberStructCall { _member: member })
            .await?;
        Ok(ret.into())
    }

    pub async fn total_members(&self) -> Result<U256, EvmError> {
        let ret = self.handle.read(&ICommunityDao::totalMembersCall {}).await?;
        Ok(ret._0)
    }
}

// endregion: --- Membership registry

// region:    --- Community registry

/// Handle to the CreateCommunity contract.
#[derive(Debug, Clone)]
pub struct CommunityRegistry<W> {
    handle: ContractHandle<W>,
}

impl<W: Eip1193Provider> CommunityRegistry<W> {
    pub fn address(&self) -> Address {
        self.handle.address()
    }

    pub async fn create_community(
        &self,
        name: &str,
        description: &str,
    ) -> Result<PendingTransaction<W>, EvmError> {
        let call = ICreateCommunity::createCommunityCall {
            _name: name.to_string(),
            _description: description.to_string(),
        };
        self.handle.write(&call, U256::ZERO).await
    }

    pub async fn community(&self, id: u64) -> Result<CommunityRecord, EvmError> {
        let ret = self
            .handle
            .read(&ICreateCommunity::communitiesCall { _0: U256::from(id) })
            .await?;
        Ok(ret.into())
    }

    pub async fn community_count(&self) -> Result<U256, EvmError> {
        let ret = self.handle.read(&ICreateCommunity::communityCountCall {}).await?;
        Ok(ret._0)
    }

    pub async fn contribute_to_treasury(
        &self,
        community_id: u64,
        amount: U256,
    ) -> Result<PendingTransaction<W>, EvmError> {
        let call = ICreateCommunity::contributeToTreasuryCall {
            _communityId: U256::from(community_id),
        };
        self.handle.write(&call, amount).await
    }

    /// Create a poll; the fund is sent along with the call.
    pub async fn create_poll(
        &self,
        community_id: u64,
        question: &str,
        options: Vec<String>,
        recipients: Vec<Address>,
        duration_secs: u64,
        total_fund: U256,
    ) -> Result<PendingTransaction<W>, EvmError> {
        let call = ICreateCommunity::createPollCall {
            _communityId: U256::from(community_id),
            _question: question.to_string(),
            _options: options,
            _recipients: recipients,
            _duration: U256::from(duration_secs),
            _totalFund: total_fund,
        };
        self.handle.write(&call, total_fund).await
    }

    pub async fn vote(
        &self,
        community_id: u64,
        poll_id: u64,
        option: u64,
    ) -> Result<PendingTransaction<W>, EvmError> {
        let call = ICreateCommunity::voteCall {
            _communityId: U256::from(community_id),
            _pollId: U256::from(poll_id),
            _option: U256::from(option),
        };
        self.handle.write(&call, U256::ZERO).await
    }

    pub async fn close_poll(
        &self,
        community_id: u64,
        poll_id: u64,
    ) -> Result<PendingTransaction<W>, EvmError> {
        let call = ICreateCommunity::closePollCall {
            _communityId: U256::from(community_id),
            _pollId: U256::from(poll_id),
        };
        self.handle.write(&call, U256::ZERO).await
    }

    pub async fn poll(&self, community_id: u64, poll_id: u64) -> Result<PollRecord, EvmError> {
        let call = ICreateCommunity::communityPollsCall {
            _0: U256::from(community_id),
            _1: U256::from(poll_id),
        };
        Ok(self.handle.read(&call).await?.into())
    }

    pub async fn has_voted(
        &self,
        community_id: u64,
        poll_id: u64,
        voter: Address,
    ) -> Result<bool, EvmError> {
        let call = ICreateCommunity::hasVotedCall {
            _0: U256::from(community_id),
            _1: U256::from(poll_id),
            _2: voter,
        };
        Ok(self.handle.read(&call).await?._0)
    }

    pub async fn winning_option(&self, community_id: u64, poll_id: u64) -> Result<U256, EvmError> {
        let call = ICreateCommunity::getWinningOptionCall {
            _communityId: U256::from(community_id),
            _pollId: U256::from(poll_id),
        };
        Ok(self.handle.read(&call).await?._0)
    }
}

// endregion: --- Community registry
