//! Scripted in-memory wallet for tests.
//!
//! `MockWallet` answers the handful of JSON-RPC methods this application uses, records
//! what it was asked, and lets tests push `accountsChanged`/`chainChanged` events into
//! every live subscription. Clones share state.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use futures::channel::oneshot;
use serde_json::{json, Value};

use crate::detector::WalletIdentity;
use crate::provider::{ConnectionEvent, Eip1193Provider, EventSender, ProviderError, Subscription};

type CallHandler = Rc<dyn Fn(&[u8]) -> Result<Vec<u8>, ProviderError>>;

struct Inner {
    identity: WalletIdentity,
    authorized: RefCell<Vec<String>>,
    /// Accounts granted on `eth_requestAccounts`; `None` rejects with 4001
    grant: RefCell<Option<Vec<String>>>,
    queued: RefCell<HashMap<String, VecDeque<Result<Value, ProviderError>>>>,
    /// Requests parked until the test releases them, per method
    holds: RefCell<HashMap<String, VecDeque<oneshot::Receiver<()>>>>,
    call_handlers: RefCell<HashMap<[u8; 4], CallHandler>>,
    sent: RefCell<Vec<Value>>,
    receipt_status: RefCell<String>,
    receipt_logs: RefCell<Vec<Value>>,
    pending_receipts: Cell<u32>,
    requests: RefCell<Vec<String>>,
    listeners: RefCell<Vec<(u64, EventSender)>>,
    next_listener: Cell<u64>,
}

#[derive(Clone)]
pub struct MockWallet {
    inner: Rc<Inner>,
}

impl std::fmt::Debug for MockWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockWallet")
            .field("identity", &self.inner.identity)
            .field("authorized", &self.inner.authorized.borrow())
            .finish()
    }
}

impl MockWallet {
    pub fn with_identity(identity: WalletIdentity) -> Self {
        Self {
            inner: Rc::new(Inner {
                identity,
                authorized: RefCell::new(Vec::new()),
                grant: RefCell::new(None),
                queued: RefCell::new(HashMap::new()),
                holds: RefCell::new(HashMap::new()),
                call_handlers: RefCell::new(HashMap::new()),
                sent: RefCell::new(Vec::new()),
                receipt_status: RefCell::new("0x1".to_string()),
                receipt_logs: RefCell::new(Vec::new()),
                pending_receipts: Cell::new(0),
                requests: RefCell::new(Vec::new()),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
            }),
        }
    }

    /// A genuine MetaMask with no authorized accounts.
    pub fn metamask() -> Self {
        Self::with_identity(WalletIdentity::metamask())
    }

    /// Accounts returned by `eth_accounts` (the site is already authorized).
    pub fn set_authorized(&self, accounts: &[&str]) {
        *self.inner.authorized.borrow_mut() = accounts.iter().map(|a| a.to_string()).collect();
    }

    /// The user approves the next `eth_requestAccounts` prompt with `accounts`.
    pub fn approve_connection(&self, accounts: &[&str]) {
        *self.inner.grant.borrow_mut() = Some(accounts.iter().map(|a| a.to_string()).collect());
    }

    /// The next response to `method`, ahead of the scripted behavior.
    pub fn respond_once(&self, method: &str, response: Result<Value, ProviderError>) {
        self.inner
            .queued
            .borrow_mut()
            .entry(method.to_string())
            .or_default()
            .push_back(response);
    }

    /// Park the next request for `method` until the returned sender fires (or is dropped).
    ///
    /// The answer is computed after release, so it reflects the wallet as it is then.
    pub fn hold_next(&self, method: &str) -> oneshot::Sender<()> {
        let (release, parked) = oneshot::channel();
        self.inner
            .holds
            .borrow_mut()
            .entry(method.to_string())
            .or_default()
            .push_back(parked);
        release
    }

    /// Answer `eth_call`s whose calldata starts with `selector`.
    pub fn on_call<F>(&self, selector: [u8; 4], handler: F)
    where
        F: Fn(&[u8]) -> Result<Vec<u8>, ProviderError> + 'static,
    {
        self.inner
            .call_handlers
            .borrow_mut()
            .insert(selector, Rc::new(handler));
    }

    pub fn set_receipt_status(&self, status: &str) {
        *self.inner.receipt_status.borrow_mut() = status.to_string();
    }

    /// Return a null receipt for the next `polls` receipt requests.
    pub fn delay_receipts(&self, polls: u32) {
        self.inner.pending_receipts.set(polls);
    }

    /// Include `event` in every receipt, as emitted by `emitter`.
    pub fn emit_log<E: SolEvent>(&self, emitter: Address, event: &E) {
        let log = event.encode_log_data();
        self.inner.receipt_logs.borrow_mut().push(json!({
            "address": emitter,
            "topics": log.topics(),
            "data": log.data,
        }));
    }

    /// Transaction objects passed to `eth_sendTransaction`, in order.
    pub fn sent_transactions(&self) -> Vec<Value> {
        self.inner.sent.borrow().clone()
    }

    pub fn request_count(&self, method: &str) -> usize {
        self.inner
            .requests
            .borrow()
            .iter()
            .filter(|m| m.as_str() == method)
            .count()
    }

    /// Every request except `eth_accounts`/`eth_requestAccounts`.
    pub fn chain_request_count(&self) -> usize {
        self.inner
            .requests
            .borrow()
            .iter()
            .filter(|m| !matches!(m.as_str(), "eth_accounts" | "eth_requestAccounts"))
            .count()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Deliver a wallet notification to every live subscription.
    pub fn emit(&self, event: ConnectionEvent) {
        if let ConnectionEvent::AccountsChanged(accounts) = &event {
            *self.inner.authorized.borrow_mut() = accounts.clone();
        }
        for (_, sender) in self.inner.listeners.borrow().iter() {
            let _ = sender.unbounded_send(event.clone());
        }
    }

    fn respond(&self, method: &str, params: &Value) -> Result<Value, ProviderError> {
        match method {
            "eth_accounts" => Ok(json!(*self.inner.authorized.borrow())),
            "eth_requestAccounts" => {
                let granted = self.inner.grant.borrow_mut().take();
                match granted {
                    Some(accounts) => {
                        *self.inner.authorized.borrow_mut() = accounts.clone();
                        Ok(json!(accounts))
                    }
                    None if !self.inner.authorized.borrow().is_empty() => {
                        Ok(json!(*self.inner.authorized.borrow()))
                    }
                    None => Err(ProviderError::user_rejected()),
                }
            }
            "eth_call" => self.respond_call(params),
            "eth_sendTransaction" => {
                let tx = params.get(0).cloned().unwrap_or(Value::Null);
                let mut sent = self.inner.sent.borrow_mut();
                sent.push(tx);
                let hash = B256::from(U256::from(sent.len() as u64));
                Ok(json!(hash))
            }
            "eth_getTransactionReceipt" => {
                let pending = self.inner.pending_receipts.get();
                if pending > 0 {
                    self.inner.pending_receipts.set(pending - 1);
                    return Ok(Value::Null);
                }
                Ok(json!({
                    "transactionHash": params.get(0).cloned().unwrap_or(Value::Null),
                    "blockNumber": "0x1",
                    "status": *self.inner.receipt_status.borrow(),
                    "logs": *self.inner.receipt_logs.borrow(),
                }))
            }
            other => Err(ProviderError::new(4200, format!("unsupported method {}", other))),
        }
    }

    fn respond_call(&self, params: &Value) -> Result<Value, ProviderError> {
        let data: Bytes = params
            .get(0)
            .and_then(|tx| tx.get("data"))
            .and_then(|data| serde_json::from_value(data.clone()).ok())
            .ok_or_else(|| ProviderError::new(-32602, "missing call data"))?;

        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| ProviderError::new(-32602, "short call data"))?;

        let handler = self.inner.call_handlers.borrow().get(&selector).cloned();
        match handler {
            Some(handler) => Ok(json!(Bytes::from(handler(&data)?))),
            None => Err(ProviderError::new(3, "execution reverted")),
        }
    }
}

#[async_trait(?Send)]
impl Eip1193Provider for MockWallet {
    fn identity(&self) -> WalletIdentity {
        self.inner.identity
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.inner.requests.borrow_mut().push(method.to_string());

        let hold = self
            .inner
            .holds
            .borrow_mut()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        if let Some(parked) = hold {
            let _ = parked.await;
        }

        let queued = self
            .inner
            .queued
            .borrow_mut()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        match queued {
            Some(response) => response,
            None => self.respond(method, &params),
        }
    }

    fn subscribe(&self, events: EventSender) -> Subscription {
        let id = self.inner.next_listener.get();
        self.inner.next_listener.set(id + 1);
        self.inner.listeners.borrow_mut().push((id, events));

        let inner: Weak<Inner> = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.listeners.borrow_mut().retain(|(listener, _)| *listener != id);
            }
        })
    }

    async fn pause(&self, _millis: u32) {}
}
