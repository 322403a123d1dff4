//! # Injected Wallet Provider
//!
//! The seam between this crate and the wallet extension. The browser crate implements
//! [`Eip1193Provider`] over `window.ethereum`; tests implement it with
//! [`MockWallet`](crate::testing::MockWallet).
//!
//! Everything here runs on one event loop, so the trait uses `?Send` futures and
//! implementations are cheap `Clone` handles to the same underlying object.

use async_trait::async_trait;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender};
use serde_json::Value;
use thiserror::Error;

use crate::detector::WalletIdentity;

/// EIP-1193 error code for "the user rejected the request".
pub const USER_REJECTED_REQUEST: i64 = 4001;

/// Error object returned by a wallet `request` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("provider error {code}: {message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn user_rejected() -> Self {
        Self::new(USER_REJECTED_REQUEST, "User rejected the request.")
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == USER_REJECTED_REQUEST
    }
}

/// Notification pushed by the wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// `accountsChanged`: currently authorized accounts, active one first
    AccountsChanged(Vec<String>),
    /// `chainChanged`: the new chain id (hex)
    ChainChanged(String),
}

pub type EventSender = UnboundedSender<ConnectionEvent>;
pub type EventStream = UnboundedReceiver<ConnectionEvent>;

/// Listener registration that is removed from the wallet when dropped.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Remove the listeners now rather than at drop.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

/// An injected EIP-1193 wallet handle.
#[async_trait(?Send)]
pub trait Eip1193Provider: Clone + 'static {
    /// Vendor identity flags the extension advertises.
    fn identity(&self) -> WalletIdentity;

    /// `request({ method, params })`.
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError>;

    /// Register `accountsChanged` and `chainChanged` listeners that forward into `events`.
    fn subscribe(&self, events: EventSender) -> Subscription;

    /// Yield to the event loop for `millis` milliseconds (receipt polling).
    async fn pause(&self, millis: u32);
}
