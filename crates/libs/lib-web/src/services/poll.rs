//! # Poll Service
//!
//! Funding polls of one community: the draft form, its validation, creation, voting,
//! closing and the poll list.
//!
//! ## Validation
//!
//! A draft is checked in a fixed order and the first failure is reported; nothing is sent
//! to the wallet unless every check passes:
//!
//! 1. non-blank recipients must be valid addresses (positions reported 1-based)
//! 2. at least two non-blank options
//! 3. as many non-blank options as non-blank recipients
//! 4. a question, a duration of at least a day and a positive fund
//!
//! ## Display metadata
//!
//! Options and recipients are cached locally after creation (see [`crate::store`]) and
//! merged into the list; polls without a cache entry show the placeholder options.

use std::str::FromStr;

use alloy_primitives::{Address, U256};
use lib_core::{AppError, Config, Result};
use lib_evm::contracts::{ICreateCommunity, PollRecord};
use lib_evm::{ContractGateway, Eip1193Provider, Signer};
use lib_utils::{
    days_to_seconds, format_unix_date, invalid_address_positions, is_valid_eth_address,
    validate_min_count, validate_not_empty,
};
use shared::{format_ether, Poll, PollDetails};
use tracing::{debug, info, instrument, warn};

use super::parse_eth_amount;
use crate::scan::{bounded_scan, ScanStop};
use crate::store::{KeyValueStore, PollDisplayCache};

pub const MIN_OPTIONS: usize = 2;
pub const DEFAULT_DURATION_DAYS: u64 = 7;

// region:    --- Draft

/// State of the "Create Poll" form. Options and recipients are paired rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollDraft {
    pub question: String,
    pub options: Vec<String>,
    pub recipients: Vec<String>,
    pub duration_days: u64,
    /// Fund in ETH, as typed
    pub total_fund: String,
}

impl Default for PollDraft {
    fn default() -> Self {
        Self {
            question: String::new(),
            options: vec![String::new(); MIN_OPTIONS],
            recipients: vec![String::new(); MIN_OPTIONS],
            duration_days: DEFAULT_DURATION_DAYS,
            total_fund: String::new(),
        }
    }
}

/// A draft that passed validation, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPoll {
    pub question: String,
    pub options: Vec<String>,
    pub recipients: Vec<Address>,
    /// Recipients as entered, for the display cache
    pub recipient_labels: Vec<String>,
    pub duration_secs: u64,
    pub total_fund: U256,
}

impl PollDraft {
    pub fn rows(&self) -> usize {
        self.options.len()
    }

    pub fn add_row(&mut self) {
        self.options.push(String::new());
        self.recipients.push(String::new());
    }

    /// Remove an option/recipient pair. Never goes below two rows.
    pub fn remove_row(&mut self, index: usize) -> bool {
        if self.rows() <= MIN_OPTIONS || index >= self.rows() {
            return false;
        }
        self.options.remove(index);
        if index < self.recipients.len() {
            self.recipients.remove(index);
        }
        true
    }

    pub fn set_option(&mut self, index: usize, value: impl Into<String>) {
        if let Some(option) = self.options.get_mut(index) {
            *option = value.into();
        }
    }

    pub fn set_recipient(&mut self, index: usize, value: impl Into<String>) {
        if let Some(recipient) = self.recipients.get_mut(index) {
            *recipient = value.into();
        }
    }

    /// Live validity of one recipient field; `None` while it is blank.
    pub fn recipient_validity(&self, index: usize) -> Option<bool> {
        let value = self.recipients.get(index)?.trim();
        (!value.is_empty()).then(|| is_valid_eth_address(value))
    }

    pub fn validate(&self) -> Result<ValidatedPoll> {
        let invalid = invalid_address_positions(&self.recipients);
        if !invalid.is_empty() {
            let positions = invalid
                .iter()
                .map(|index| (index + 1).to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(AppError::Validation(format!(
                "Invalid Ethereum addresses at positions: {}",
                positions
            )));
        }

        let options: Vec<String> = non_blank(&self.options);
        let recipient_labels: Vec<String> = non_blank(&self.recipients);

        validate_min_count(&options, MIN_OPTIONS, "options").map_err(AppError::Validation)?;

        if options.len() != recipient_labels.len() {
            return Err(AppError::Validation(
                "Number of options must match number of recipients".to_string(),
            ));
        }

        let question = self.question.trim();
        validate_not_empty(question, "Question").map_err(AppError::Validation)?;

        if self.duration_days == 0 {
            return Err(AppError::Validation(
                "Duration must be at least 1 day".to_string(),
            ));
        }

        let total_fund = parse_eth_amount(&self.total_fund)?;

        let recipients = recipient_labels
            .iter()
            .map(|label| {
                Address::from_str(label)
                    .map_err(|e| AppError::Validation(format!("Invalid Ethereum address {}: {}", label, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(ValidatedPoll {
            question: question.to_string(),
            options,
            recipients,
            recipient_labels,
            duration_secs: days_to_seconds(self.duration_days),
            total_fund,
        })
    }
}

fn non_blank(values: &[String]) -> Vec<String> {
    values
        .iter()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

// endregion: --- Draft

// region:    --- Service

pub struct PollService<S> {
    gateway: ContractGateway,
    scan_cap: u64,
    cache: PollDisplayCache<S>,
}

impl<S: KeyValueStore> PollService<S> {
    pub fn new(gateway: ContractGateway, scan_cap: u64, store: S) -> Self {
        Self {
            gateway,
            scan_cap,
            cache: PollDisplayCache::new(store),
        }
    }

    pub fn from_config(config: &Config, store: S) -> Self {
        Self::new(ContractGateway::from_config(config), config.poll_scan_cap, store)
    }

    pub fn cache(&self) -> &PollDisplayCache<S> {
        &self.cache
    }

    /// Polls `0..cap` of a community merged with cached display metadata.
    ///
    /// The contract has no poll count, so the first failed read is taken as the end of
    /// the list. A transient failure therefore shortens the list until the next reload.
    #[instrument(skip(self, signer))]
    pub async fn list<W: Eip1193Provider>(
        &self,
        signer: &Signer<W>,
        community_id: u64,
    ) -> Result<Vec<Poll>> {
        let registry = self.gateway.community_registry(signer);
        let registry = &registry;

        let outcome = bounded_scan(self.scan_cap, |poll_id| async move {
            let record = registry.poll(community_id, poll_id).await?;
            Ok::<_, AppError>((poll_id, record))
        })
        .await;

        if let ScanStop::ReadFailed { index, error } = &outcome.stop {
            debug!(index, %error, "end of poll list");
        }

        let polls = outcome
            .items
            .into_iter()
            .map(|(poll_id, record)| {
                let details = self.cache.get(community_id, poll_id);
                to_poll(poll_id, record, details)
            })
            .collect();
        Ok(polls)
    }

    /// Validate and create a poll, then cache its options and recipients.
    ///
    /// `listed_polls` is the number of polls currently shown; it is the poll id used for
    /// the cache when the receipt carries no `PollCreated` event.
    #[instrument(skip(self, signer, draft))]
    pub async fn create<W: Eip1193Provider>(
        &self,
        signer: &Signer<W>,
        community_id: u64,
        draft: &PollDraft,
        listed_polls: u64,
    ) -> Result<u64> {
        let poll = draft.validate()?;

        let registry = self.gateway.community_registry(signer);
        let receipt = registry
            .create_poll(
                community_id,
                &poll.question,
                poll.options.clone(),
                poll.recipients.clone(),
                poll.duration_secs,
                poll.total_fund,
            )
            .await?
            .wait()
            .await?;

        let poll_id = receipt
            .decode_event::<ICreateCommunity::PollCreated>(registry.address())
            .filter(|event| event.communityId == U256::from(community_id))
            .and_then(|event| u64::try_from(event.pollId).ok())
            .unwrap_or_else(|| {
                debug!(listed_polls, "no PollCreated event, using listed poll count");
                listed_polls
            });

        let details = PollDetails {
            options: poll.options,
            recipients: poll.recipient_labels,
        };
        if let Err(err) = self.cache.save(community_id, poll_id, &details) {
            warn!(poll_id, error = %err, "caching poll details failed");
        }

        info!(poll_id, "poll created");
        Ok(poll_id)
    }

    #[instrument(skip(self, signer))]
    pub async fn vote<W: Eip1193Provider>(
        &self,
        signer: &Signer<W>,
        community_id: u64,
        poll_id: u64,
        option: u64,
    ) -> Result<()> {
        self.gateway
            .community_registry(signer)
            .vote(community_id, poll_id, option)
            .await?
            .wait()
            .await?;
        info!("vote confirmed");
        Ok(())
    }

    #[instrument(skip(self, signer))]
    pub async fn close<W: Eip1193Provider>(
        &self,
        signer: &Signer<W>,
        community_id: u64,
        poll_id: u64,
    ) -> Result<()> {
        self.gateway
            .community_registry(signer)
            .close_poll(community_id, poll_id)
            .await?
            .wait()
            .await?;
        info!("poll closed");
        Ok(())
    }

    pub async fn has_voted<W: Eip1193Provider>(
        &self,
        signer: &Signer<W>,
        community_id: u64,
        poll_id: u64,
    ) -> Result<bool> {
        Ok(self
            .gateway
            .community_registry(signer)
            .has_voted(community_id, poll_id, signer.address())
            .await?)
    }

    pub async fn winning_option<W: Eip1193Provider>(
        &self,
        signer: &Signer<W>,
        community_id: u64,
        poll_id: u64,
    ) -> Result<u64> {
        let option = self
            .gateway
            .community_registry(signer)
            .winning_option(community_id, poll_id)
            .await?;
        u64::try_from(option).map_err(|_| AppError::Decoding("winning option overflows u64".to_string()))
    }
}

fn to_poll(id: u64, record: PollRecord, details: Option<PollDetails>) -> Poll {
    let details_cached = details.is_some();
    let details = details.unwrap_or_else(PollDetails::placeholder);

    Poll {
        id,
        question: record.question,
        options: details.options,
        recipients: details.recipients,
        creation_time: format_unix_date(u64::try_from(record.creation_time).unwrap_or(0)),
        end_time: format_unix_date(u64::try_from(record.end_time).unwrap_or(0)),
        is_closed: record.is_closed,
        funds_distributed: record.funds_distributed,
        total_votes: u64::try_from(record.total_votes).unwrap_or(u64::MAX),
        total_fund: format_ether(record.total_fund),
        details_cached,
    }
}

// endregion: --- Service

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use alloy_sol_types::{SolCall, SolValue};
    use lib_evm::testing::MockWallet;
    use lib_evm::ProviderError;
    use std::rc::Rc;

    const ACCOUNT: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
    const RECIPIENT_A: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
    const RECIPIENT_B: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

    async fn signer(wallet: &MockWallet) -> Signer<MockWallet> {
        wallet.set_authorized(&[ACCOUNT]);
        Signer::derive(wallet).await.unwrap()
    }

    fn service(store: Rc<MemoryStore>) -> PollService<Rc<MemoryStore>> {
        PollService::from_config(&Config::default(), store)
    }

    fn valid_draft() -> PollDraft {
        let mut draft = PollDraft {
            question: "Which project gets funded?".to_string(),
            total_fund: "0.5".to_string(),
            ..PollDraft::default()
        };
        draft.set_option(0, "Garden");
        draft.set_option(1, "Library");
        draft.set_recipient(0, RECIPIENT_A);
        draft.set_recipient(1, RECIPIENT_B);
        draft
    }

    fn validation_message(draft: &PollDraft) -> String {
        match draft.validate() {
            Err(AppError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    /// Polls `0..present` exist; later reads revert.
    fn answer_polls(wallet: &MockWallet, present: u64) {
        wallet.on_call(ICreateCommunity::communityPollsCall::SELECTOR, move |calldata| {
            let call = ICreateCommunity::communityPollsCall::abi_decode(calldata, true)
                .map_err(|e| ProviderError::new(-32602, e.to_string()))?;
            let poll_id = u64::try_from(call._1).unwrap_or(u64::MAX);
            if poll_id >= present {
                return Err(ProviderError::new(3, "execution reverted"));
            }
            Ok((
                format!("Question {}", poll_id),
                U256::from(1_741_953_600u64),
                U256::from(1_742_558_400u64),
                false,
                false,
                U256::from(3u64),
                U256::from(500_000_000_000_000_000u64),
            )
                .abi_encode_params())
        });
    }

    #[test]
    fn test_default_draft() {
        let draft = PollDraft::default();
        assert_eq!(draft.rows(), 2);
        assert_eq!(draft.recipients.len(), 2);
        assert_eq!(draft.duration_days, 7);
    }

    #[test]
    fn test_rows_never_below_two() {
        let mut draft = PollDraft::default();
        assert!(!draft.remove_row(0));

        draft.add_row();
        draft.set_option(2, "Third");
        assert_eq!(draft.rows(), 3);
        assert!(draft.remove_row(0));
        assert_eq!(draft.options, vec!["".to_string(), "Third".to_string()]);
        assert_eq!(draft.recipients.len(), 2);
        assert!(!draft.remove_row(1));
    }

    #[test]
    fn test_recipient_validity() {
        let mut draft = PollDraft::default();
        draft.set_recipient(0, RECIPIENT_A);
        draft.set_recipient(1, "0x1234");

        assert_eq!(draft.recipient_validity(0), Some(true));
        assert_eq!(draft.recipient_validity(1), Some(false));
        draft.set_recipient(1, "   ");
        assert_eq!(draft.recipient_validity(1), None);
    }

    #[test]
    fn test_valid_draft() {
        let poll = valid_draft().validate().unwrap();
        assert_eq!(poll.options, vec!["Garden", "Library"]);
        assert_eq!(poll.recipient_labels, vec![RECIPIENT_A, RECIPIENT_B]);
        assert_eq!(poll.duration_secs, 7 * 86_400);
        assert_eq!(poll.total_fund, U256::from(500_000_000_000_000_000u64));
    }

    #[test]
    fn test_invalid_addresses_reported_first() {
        let mut draft = valid_draft();
        draft.add_row();
        draft.set_recipient(0, "0x12");
        draft.set_recipient(2, "not-an-address");
        draft.question.clear();

        assert_eq!(
            validation_message(&draft),
            "Invalid Ethereum addresses at positions: 1, 3"
        );
    }

    #[test]
    fn test_needs_two_options() {
        let mut draft = valid_draft();
        draft.set_option(1, "  ");
        draft.set_recipient(1, "");

        assert_eq!(validation_message(&draft), "Need at least 2 options");
    }

    #[test]
    fn test_question_and_fund_checked_last() {
        let mut draft = valid_draft();
        draft.question = " ".to_string();
        assert_eq!(validation_message(&draft), "Question cannot be empty");

        let mut draft = valid_draft();
        draft.total_fund = "0".to_string();
        assert_eq!(validation_message(&draft), "Please enter a valid ETH amount");
    }

    #[tokio::test]
    async fn test_count_mismatch_blocks_without_calls() {
        let wallet = MockWallet::metamask();
        let signer = signer(&wallet).await;
        let store = Rc::new(MemoryStore::new());
        let requests_before = wallet.chain_request_count();

        let mut draft = valid_draft();
        draft.add_row();
        draft.set_option(2, "Park");

        let err = service(store.clone())
            .create(&signer, 3, &draft, 0)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AppError::Validation("Number of options must match number of recipients".to_string())
        );
        assert_eq!(wallet.chain_request_count(), requests_before);
        assert!(wallet.sent_transactions().is_empty());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_create_caches_under_event_poll_id() {
        let wallet = MockWallet::metamask();
        let signer = signer(&wallet).await;
        let config = Config::default();
        wallet.emit_log(
            config.create_community_address,
            &ICreateCommunity::PollCreated {
                communityId: U256::from(3u64),
                pollId: U256::from(1u64),
                question: "Which project gets funded?".to_string(),
                totalFund: U256::from(500_000_000_000_000_000u64),
            },
        );
        let store = Rc::new(MemoryStore::new());
        let service = service(store);

        let poll_id = service.create(&signer, 3, &valid_draft(), 7).await.unwrap();

        assert_eq!(poll_id, 1);
        let cached = service.cache().get(3, 1).unwrap();
        assert_eq!(cached.options, vec!["Garden", "Library"]);
        assert_eq!(cached.recipients, vec![RECIPIENT_A, RECIPIENT_B]);

        let sent = wallet.sent_transactions();
        assert_eq!(sent[0]["value"], "0x6f05b59d3b20000");
    }

    #[tokio::test]
    async fn test_create_without_event_uses_listed_count() {
        let wallet = MockWallet::metamask();
        let signer = signer(&wallet).await;
        let service = service(Rc::new(MemoryStore::new()));

        let poll_id = service.create(&signer, 3, &valid_draft(), 2).await.unwrap();

        assert_eq!(poll_id, 2);
        assert!(service.cache().get(3, 2).is_some());
    }

    #[tokio::test]
    async fn test_list_stops_at_first_failed_read() {
        let wallet = MockWallet::metamask();
        let signer = signer(&wallet).await;
        answer_polls(&wallet, 5);
        let service = service(Rc::new(MemoryStore::new()));
        service
            .cache()
            .save(
                3,
                1,
                &PollDetails {
                    options: vec!["A".to_string(), "B".to_string()],
                    recipients: vec![RECIPIENT_A.to_string(), RECIPIENT_B.to_string()],
                },
            )
            .unwrap();

        let polls = service.list(&signer, 3).await.unwrap();

        assert_eq!(polls.len(), 5);
        assert_eq!(wallet.request_count("eth_call"), 6);

        assert!(polls[1].details_cached);
        assert_eq!(polls[1].options, vec!["A", "B"]);
        assert!(!polls[0].details_cached);
        assert_eq!(polls[0].options, vec!["Option 1", "Option 2"]);
        assert_eq!(polls[0].total_fund, "0.5");
        assert_eq!(polls[0].creation_time, "3/14/2025");
        assert_eq!(polls[0].end_time, "3/21/2025");
    }

    #[tokio::test]
    async fn test_list_respects_cap() {
        let wallet = MockWallet::metamask();
        let signer = signer(&wallet).await;
        answer_polls(&wallet, 100);

        let polls = service(Rc::new(MemoryStore::new()))
            .list(&signer, 0)
            .await
            .unwrap();
        assert_eq!(polls.len(), 20);
    }

    #[tokio::test]
    async fn test_vote_rejected_in_wallet() {
        let wallet = MockWallet::metamask();
        let signer = signer(&wallet).await;
        wallet.respond_once("eth_sendTransaction", Err(ProviderError::user_rejected()));

        let err = service(Rc::new(MemoryStore::new()))
            .vote(&signer, 3, 0, 1)
            .await
            .unwrap_err();

        assert_eq!(err.user_message_or("Voting failed"), "Request rejected in wallet");
    }

    #[tokio::test]
    async fn test_vote_and_close_send_transactions() {
        let wallet = MockWallet::metamask();
        let signer = signer(&wallet).await;
        let service = service(Rc::new(MemoryStore::new()));

        service.vote(&signer, 3, 0, 1).await.unwrap();
        service.close(&signer, 3, 0).await.unwrap();

        let sent = wallet.sent_transactions();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0]["value"], "0x0");
    }

    #[tokio::test]
    async fn test_has_voted_and_winner() {
        let wallet = MockWallet::metamask();
        let signer = signer(&wallet).await;
        wallet.on_call(ICreateCommunity::hasVotedCall::SELECTOR, |_| Ok(true.abi_encode()));
        wallet.on_call(ICreateCommunity::getWinningOptionCall::SELECTOR, |_| {
            Ok(U256::from(1u64).abi_encode())
        });
        let service = service(Rc::new(MemoryStore::new()));

        assert!(service.has_voted(&signer, 3, 0).await.unwrap());
        assert_eq!(service.winning_option(&signer, 3, 0).await.unwrap(), 1);
    }
}
