//! # Membership Service
//!
//! Reads and writes against the membership registry: whether the connected account is a
//! member, its voting power, and registration with the fixed fee.

use alloy_primitives::{Address, U256};
use lib_core::{AppError, Config, Result};
use lib_evm::contracts::MemberRecord;
use lib_evm::{ContractGateway, Eip1193Provider, Signer};
use shared::{format_ether, Member, MembershipStatus};
use tracing::{info, instrument, warn};

use super::parse_eth_amount;

pub struct MembershipService {
    gateway: ContractGateway,
    registration_fee: U256,
}

impl MembershipService {
    pub fn new(gateway: ContractGateway, registration_fee: U256) -> Self {
        Self {
            gateway,
            registration_fee,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ContractGateway::from_config(config), config.registration_fee_wei)
    }

    pub fn registration_fee(&self) -> U256 {
        self.registration_fee
    }

    /// Registry entry for `member`.
    #[instrument(skip(self, signer))]
    pub async fn member<W: Eip1193Provider>(
        &self,
        signer: &Signer<W>,
        member: Address,
    ) -> Result<Member> {
        let record = self.gateway.membership(signer).member(member).await?;
        Ok(to_member(record))
    }

    /// Membership of the signer's account. Any read failure counts as "not a member".
    #[instrument(skip(self, signer), fields(account = %signer.address()))]
    pub async fn status<W: Eip1193Provider>(&self, signer: &Signer<W>) -> MembershipStatus {
        match self.member(signer, signer.address()).await {
            Ok(member) => MembershipStatus::from(&member),
            Err(err) => {
                warn!(error = %err, "membership check failed");
                MembershipStatus::default()
            }
        }
    }

    /// Register the signer's account, paying the registration fee, then re-check.
    #[instrument(skip(self, signer), fields(account = %signer.address()))]
    pub async fn register<W: Eip1193Provider>(&self, signer: &Signer<W>) -> Result<MembershipStatus> {
        let pending = self
            .gateway
            .membership(signer)
            .register_member(self.registration_fee)
            .await?;
        pending.wait().await?;
        info!("member registered");

        Ok(self.status(signer).await)
    }

    /// Add to the signer's contribution (raises voting power).
    #[instrument(skip(self, signer))]
    pub async fn add_contribution<W: Eip1193Provider>(
        &self,
        signer: &Signer<W>,
        amount_eth: &str,
    ) -> Result<MembershipStatus> {
        let amount = parse_eth_amount(amount_eth)?;
        let pending = self.gateway.membership(signer).add_contribution(amount).await?;
        pending.wait().await?;
        info!(%amount, "contribution added");

        Ok(self.status(signer).await)
    }

    #[instrument(skip(self, signer))]
    pub async fn total_members<W: Eip1193Provider>(&self, signer: &Signer<W>) -> Result<u64> {
        let total = self.gateway.membership(signer).total_members().await?;
        u64::try_from(total).map_err(|_| AppError::Decoding("member count overflows u64".to_string()))
    }
}

fn to_member(record: MemberRecord) -> Member {
    Member {
        member_address: record.member_address.to_checksum(None),
        contribution: format_ether(record.contribution),
        profile_nft_id: u64::try_from(record.profile_nft_id).unwrap_or(u64::MAX),
        voting_power: u64::try_from(record.voting_power).unwrap_or(u64::MAX),
        exists: record.exists,
    }
}
