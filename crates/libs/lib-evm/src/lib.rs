//! # EVM Library
//!
//! Wallet and contract plumbing for the browser front end:
//!
//! - [`provider`]: the EIP-1193 seam implemented over `window.ethereum`
//! - [`detector`]: genuine-wallet detection and vendor diagnostics
//! - [`connection`]: the connection lifecycle service
//! - [`signer`]: signing capability, transactions and receipts
//! - [`contracts`]: ABIs and typed handles for the deployed contracts

pub mod connection;
pub mod contracts;
pub mod detector;
pub mod error;
pub mod provider;
pub mod signer;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use connection::{ConnectError, ConnectionEffect, ConnectionPhase, ConnectionService, ConnectionState};
pub use contracts::ContractGateway;
pub use detector::{detect, Detection, WalletIdentity, WalletVendor};
pub use error::EvmError;
pub use provider::{ConnectionEvent, Eip1193Provider, EventSender, EventStream, ProviderError, Subscription};
pub use signer::{PendingTransaction, ReceiptPolling, Signer, TransactionReceipt};
