//! # Signer and Pending Transactions
//!
//! A [`Signer`] is the signing capability derived from the wallet: the active account
//! plus the handle used to send calls and transactions from it. Transactions are signed
//! by the wallet extension; this side only builds requests and polls for receipts.

use std::str::FromStr;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolEvent;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::EvmError;
use crate::provider::Eip1193Provider;

/// Ask the wallet for its accounts (`eth_accounts` or `eth_requestAccounts`).
pub async fn request_accounts<W: Eip1193Provider>(
    wallet: &W,
    method: &str,
) -> Result<Vec<String>, EvmError> {
    let value = wallet.request(method, json!([])).await?;
    let accounts: Vec<String> = serde_json::from_value(value)?;
    Ok(accounts)
}

/// Signing capability bound to one account.
#[derive(Clone)]
pub struct Signer<W> {
    wallet: W,
    address: Address,
}

impl<W> std::fmt::Debug for Signer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").field("address", &self.address).finish()
    }
}

impl<W: Eip1193Provider> Signer<W> {
    /// Derive a signer for the wallet's active account without prompting the user.
    pub async fn derive(wallet: &W) -> Result<Self, EvmError> {
        let accounts = request_accounts(wallet, "eth_accounts").await?;
        let first = accounts.first().ok_or(EvmError::NoAuthorizedAccount)?;
        let address = Address::from_str(first)
            .map_err(|e| EvmError::InvalidResponse(format!("account {}: {}", first, e)))?;

        Ok(Self {
            wallet: wallet.clone(),
            address,
        })
    }

    /// Derive a signer for `account`, which the wallet must currently authorize.
    ///
    /// Binds the signer to the account already adopted instead of whatever `eth_accounts`
    /// lists first, so the pair cannot disagree.
    pub async fn derive_for(wallet: &W, account: &str) -> Result<Self, EvmError> {
        let address = Address::from_str(account)
            .map_err(|e| EvmError::InvalidResponse(format!("account {}: {}", account, e)))?;

        let accounts = request_accounts(wallet, "eth_accounts").await?;
        let authorized = accounts
            .iter()
            .filter_map(|entry| Address::from_str(entry).ok())
            .any(|entry| entry == address);
        if !authorized {
            return Err(EvmError::AccountMismatch(address));
        }

        Ok(Self {
            wallet: wallet.clone(),
            address,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn wallet(&self) -> &W {
        &self.wallet
    }

    /// `eth_call` against the latest block.
    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, EvmError> {
        let params = json!([{ "from": self.address, "to": to, "data": data }, "latest"]);
        let value = self.wallet.request("eth_call", params).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// `eth_sendTransaction`; the wallet prompts the user to sign.
    pub async fn send_transaction(
        &self,
        to: Address,
        data: Bytes,
        value: U256,
    ) -> Result<B256, EvmError> {
        let params = json!([{
            "from": self.address,
            "to": to,
            "data": data,
            "value": format!("{:#x}", value),
        }]);
        let hash = self.wallet.request("eth_sendTransaction", params).await?;
        let hash: B256 = serde_json::from_value(hash)?;
        debug!(%hash, %to, "transaction submitted");
        Ok(hash)
    }
}

/// How often and how long to poll for a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptPolling {
    pub interval_ms: u32,
    pub attempts: u32,
}

impl Default for ReceiptPolling {
    fn default() -> Self {
        Self {
            interval_ms: 1_500,
            attempts: 400,
        }
    }
}

/// Submitted transaction awaiting confirmation.
pub struct PendingTransaction<W> {
    wallet: W,
    hash: B256,
    polling: ReceiptPolling,
}

impl<W: Eip1193Provider> PendingTransaction<W> {
    pub fn new(wallet: W, hash: B256, polling: ReceiptPolling) -> Self {
        Self {
            wallet,
            hash,
            polling,
        }
    }

    pub fn hash(&self) -> B256 {
        self.hash
    }

    /// Poll `eth_getTransactionReceipt` until the transaction is mined.
    ///
    /// There is no way to abandon a submitted transaction; this only stops waiting.
    pub async fn wait(self) -> Result<TransactionReceipt, EvmError> {
        for attempt in 0..self.polling.attempts {
            let value = self
                .wallet
                .request("eth_getTransactionReceipt", json!([self.hash]))
                .await?;

            if !value.is_null() {
                let receipt: TransactionReceipt = serde_json::from_value(value)?;
                if !receipt.succeeded() {
                    warn!(hash = %self.hash, "transaction reverted");
                    return Err(EvmError::Reverted(self.hash));
                }
                debug!(hash = %self.hash, polls = attempt + 1, "transaction confirmed");
                return Ok(receipt);
            }

            if attempt + 1 < self.polling.attempts {
                self.wallet.pause(self.polling.interval_ms).await;
            }
        }

        warn!(hash = %self.hash, "gave up waiting for receipt");
        Err(EvmError::Unconfirmed(self.hash))
    }
}

/// Subset of the JSON-RPC receipt this front end reads.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<String>,
    /// `0x1` success, `0x0` revert; absent on pre-Byzantium chains
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub logs: Vec<ReceiptLog>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() != Some("0x0")
    }

    /// First log emitted by `emitter` that decodes as `E`.
    pub fn decode_event<E: SolEvent>(&self, emitter: Address) -> Option<E> {
        self.logs
            .iter()
            .filter(|log| log.address == emitter)
            .find_map(|log| E::decode_raw_log(log.topics.iter().copied(), &log.data, true).ok())
    }
}

/// Parse a JSON-RPC quantity (`"0x1a"`).
pub fn parse_quantity(value: &Value) -> Option<u64> {
    let raw = value.as_str()?.strip_prefix("0x")?;
    u64::from_str_radix(raw, 16).ok()
}
