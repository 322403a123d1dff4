//! # Community Service
//!
//! Community list, detail, creation and treasury contributions.
//!
//! The list is a bounded scan capped at `min(communityCount, cap)`. Because the count is
//! known, a read that fails below it is a real failure, not the end of the list; the
//! communities read so far are still returned and the failure is logged.

use alloy_primitives::U256;
use lib_core::{AppError, Config, Result};
use lib_evm::contracts::{CommunityRecord, ICreateCommunity};
use lib_evm::{ContractGateway, Eip1193Provider, Signer};
use lib_utils::{format_unix_date, validate_not_empty};
use shared::{format_ether, Community, NewCommunity};
use tracing::{info, instrument, warn};

use super::parse_eth_amount;
use crate::scan::{bounded_scan, ScanStop};

pub struct CommunityService {
    gateway: ContractGateway,
    scan_cap: u64,
}

impl CommunityService {
    pub fn new(gateway: ContractGateway, scan_cap: u64) -> Self {
        Self { gateway, scan_cap }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(ContractGateway::from_config(config), config.community_scan_cap)
    }

    /// Communities `0..min(count, cap)`, stopping at the first failed read.
    #[instrument(skip(self, signer))]
    pub async fn list<W: Eip1193Provider>(&self, signer: &Signer<W>) -> Result<Vec<Community>> {
        let registry = self.gateway.community_registry(signer);
        let count = registry.community_count().await?;
        let limit = u64::try_from(count)
            .unwrap_or(u64::MAX)
            .min(self.scan_cap);

        let registry = &registry;
        let outcome = bounded_scan(limit, |id| async move {
            let record = registry.community(id).await?;
            Ok::<_, AppError>(to_community(id, record))
        })
        .await;

        if let ScanStop::ReadFailed { index, error } = &outcome.stop {
            warn!(index, %error, "community read failed below the reported count");
        }

        Ok(outcome.items)
    }

    #[instrument(skip(self, signer))]
    pub async fn get<W: Eip1193Provider>(&self, signer: &Signer<W>, id: u64) -> Result<Community> {
        let record = self.gateway.community_registry(signer).community(id).await?;
        Ok(to_community(id, record))
    }

    /// Create a community and wait for it to be mined.
    ///
    /// Returns the new id when the `CommunityCreated` event is in the receipt.
    #[instrument(skip(self, signer, form), fields(name = %form.name))]
    pub async fn create<W: Eip1193Provider>(
        &self,
        signer: &Signer<W>,
        form: &NewCommunity,
    ) -> Result<Option<u64>> {
        let name = form.name.trim();
        let description = form.description.trim();
        validate_not_empty(name, "Name").map_err(AppError::Validation)?;
        validate_not_empty(description, "Description").map_err(AppError::Validation)?;

        let registry = self.gateway.community_registry(signer);
        let receipt = registry
            .create_community(name, description)
            .await?
            .wait()
            .await?;

        let id = receipt
            .decode_event::<ICreateCommunity::CommunityCreated>(registry.address())
            .and_then(|event| u64::try_from(event.id).ok());
        info!(?id, "community created");
        Ok(id)
    }

    /// Send `amount_eth` to a community treasury.
    #[instrument(skip(self, signer))]
    pub async fn contribute<W: Eip1193Provider>(
        &self,
        signer: &Signer<W>,
        community_id: u64,
        amount_eth: &str,
    ) -> Result<()> {
        let amount: U256 = parse_eth_amount(amount_eth)?;
        self.gateway
            .community_registry(signer)
            .contribute_to_treasury(community_id, amount)
            .await?
            .wait()
            .await?;
        info!(%amount, "treasury contribution confirmed");
        Ok(())
    }
}

fn to_community(id: u64, record: CommunityRecord) -> Community {
    Community {
        id,
        name: record.name,
        description: record.description,
        creator: record.creator.to_checksum(None),
        treasury: format_ether(record.treasury),
        creation_time: format_unix_date(u64::try_from(record.creation_time).unwrap_or(0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Address;
    use alloy_sol_types::{SolCall, SolValue};
    use lib_evm::testing::MockWallet;
    use lib_evm::ProviderError;

    const ACCOUNT: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";

    async fn signer(wallet: &MockWallet) -> Signer<MockWallet> {
        wallet.set_authorized(&[ACCOUNT]);
        Signer::derive(wallet).await.unwrap()
    }

    fn community_return(name: &str) -> Vec<u8> {
        (
            name.to_string(),
            format!("{} description", name),
            Address::ZERO,
            U256::from(1_741_953_600u64),
            U256::from(1_000_000_000_000_000_000u64),
        )
            .abi_encode_params()
    }

    /// `count` communities, reads at or above `fail_from` revert.
    fn answer_communities(wallet: &MockWallet, count: u64, fail_from: u64) {
        wallet.on_call(ICreateCommunity::communityCountCall::SELECTOR, move |_| {
            Ok(U256::from(count).abi_encode())
        });
        wallet.on_call(ICreateCommunity::communitiesCall::SELECTOR, move |calldata| {
            let call = ICreateCommunity::communitiesCall::abi_decode(calldata, true)
                .map_err(|e| ProviderError::new(-32602, e.to_string()))?;
            let id = u64::try_from(call._0).unwrap_or(u64::MAX);
            if id >= fail_from {
                return Err(ProviderError::new(-32603, "header not found"));
            }
            Ok(community_return(&format!("Community {}", id)))
        });
    }

    #[tokio::test]
    async fn test_list_caps_at_configured_limit() {
        let wallet = MockWallet::metamask();
        let signer = signer(&wallet).await;
        answer_communities(&wallet, 25, u64::MAX);

        let service = CommunityService::from_config(&Config::default());
        let communities = service.list(&signer).await.unwrap();

        assert_eq!(communities.len(), 10);
        assert_eq!(communities[9].id, 9);
        assert_eq!(wallet.request_count("eth_call"), 11);
    }

    #[tokio::test]
    async fn test_list_shorter_than_cap() {
        let wallet = MockWallet::metamask();
        let signer = signer(&wallet).await;
        answer_communities(&wallet, 3, u64::MAX);

        let service = CommunityService::from_config(&Config::default());
        let communities = service.list(&signer).await.unwrap();

        assert_eq!(communities.len(), 3);
        assert_eq!(communities[0].name, "Community 0");
        assert_eq!(communities[0].treasury, "1.0");
        assert_eq!(communities[0].creation_time, "3/14/2025");
    }

    #[tokio::test]
    async fn test_list_keeps_reads_before_failure() {
        let wallet = MockWallet::metamask();
        let signer = signer(&wallet).await;
        answer_communities(&wallet, 8, 5);

        let service = CommunityService::from_config(&Config::default());
        let communities = service.list(&signer).await.unwrap();

        assert_eq!(communities.len(), 5);
    }

    #[tokio::test]
    async fn test_list_empty() {
        let wallet = MockWallet::metamask();
        let signer = signer(&wallet).await;
        answer_communities(&wallet, 0, u64::MAX);

        let service = CommunityService::from_config(&Config::default());
        assert!(service.list(&signer).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_validates_before_sending() {
        let wallet = MockWallet::metamask();
        let signer = signer(&wallet).await;

        let service = CommunityService::from_config(&Config::default());
        let form = NewCommunity {
            name: "  ".to_string(),
            description: "Tools".to_string(),
        };
        let err = service.create(&signer, &form).await.unwrap_err();

        assert_eq!(err, AppError::Validation("Name cannot be empty".to_string()));
        assert!(wallet.sent_transactions().is_empty());
    }

    #[tokio::test]
    async fn test_create_reads_id_from_event() {
        let wallet = MockWallet::metamask();
        let signer = signer(&wallet).await;
        let config = Config::default();
        wallet.emit_log(
            config.create_community_address,
            &ICreateCommunity::CommunityCreated {
                id: U256::from(4u64),
                name: "Gardeners".to_string(),
                creator: signer.address(),
            },
        );

        let service = CommunityService::from_config(&config);
        let form = NewCommunity {
            name: "Gardeners".to_string(),
            description: "Shared tools".to_string(),
        };
        let id = service.create(&signer, &form).await.unwrap();

        assert_eq!(id, Some(4));
        assert_eq!(wallet.sent_transactions().len(), 1);
    }

    #[tokio::test]
    async fn test_contribute_requires_positive_amount() {
        let wallet = MockWallet::metamask();
        let signer = signer(&wallet).await;
        let service = CommunityService::from_config(&Config::default());

        for amount in ["", "abc", "0", "-1"] {
            let err = service.contribute(&signer, 2, amount).await.unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "{:?} accepted", amount);
        }
        assert!(wallet.sent_transactions().is_empty());

        service.contribute(&signer, 2, "0.5").await.unwrap();
        assert_eq!(wallet.sent_transactions()[0]["value"], "0x6f05b59d3b20000");
    }

    #[tokio::test]
    async fn test_contribute_revert_is_transaction_error() {
        let wallet = MockWallet::metamask();
        let signer = signer(&wallet).await;
        wallet.set_receipt_status("0x0");

        let service = CommunityService::from_config(&Config::default());
        let err = service.contribute(&signer, 2, "0.1").await.unwrap_err();

        assert!(matches!(err, AppError::Transaction(_)));
        assert_eq!(err.user_message_or("Contribution failed"), "Contribution failed");
    }
}
