//! # Connection Service
//!
//! Owns the "connected account + signing capability" lifecycle for one page session.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized -> Scanning -> { Unsupported, Disconnected, Connected }
//!                               Connected <-> Disconnected
//! ```
//!
//! - [`ConnectionService::mount`] runs the detector. An unusable wallet ends in
//!   `Unsupported` for the rest of the session and no chain request is ever made.
//!   A usable one is subscribed to and silently asked for `eth_accounts`.
//! - Wallet notifications arrive on an [`EventStream`] and are folded into state by a
//!   single consumer, [`ConnectionService::drive`].
//! - [`ConnectionService::connect`] is the explicit user action.
//! - [`ConnectionService::dispose`] releases the listeners.
//!
//! ## Consistency
//!
//! The account and the signer are only ever replaced together. Every transition bumps an
//! epoch; work that awaited the wallet re-checks the epoch before writing, so a stale
//! signer derivation can never land on top of a newer account.

use std::cell::{Cell, RefCell};

use futures::channel::mpsc;
use futures::StreamExt;
use lib_core::{AppError, Config};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::detector::{detect, vendor_list, WalletVendor};
use crate::provider::{ConnectionEvent, Eip1193Provider, EventStream, Subscription};
use crate::signer::{request_accounts, Signer};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionPhase {
    #[default]
    Uninitialized,
    Scanning,
    /// No usable wallet this session
    Unsupported,
    Disconnected,
    Connected,
}

/// Snapshot of the connection, safe to hand to the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub phase: ConnectionPhase,
    pub account: Option<String>,
    /// A signer for `account` is installed
    pub signer_ready: bool,
    /// The supported wallet was detected and is usable
    pub vendor_available: bool,
    /// Every vendor flag found on the injected object
    pub detected_vendors: Vec<WalletVendor>,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        self.phase == ConnectionPhase::Connected && self.account.is_some()
    }

    pub fn has_competitor(&self) -> bool {
        self.detected_vendors.iter().any(WalletVendor::is_competitor)
    }
}

/// What the caller must do after an event was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEffect {
    Unchanged,
    /// State changed; re-read it
    Updated,
    /// The network changed; all chain-derived state is stale and the page must reload
    ReloadRequired,
}

/// Failure of the explicit connect action. The display text is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectError {
    #[error("Please install MetaMask to connect your wallet!")]
    WalletNotInstalled { install_url: String },

    #[error("Please disable {} and install MetaMask to continue. This dApp only supports MetaMask.", vendor_list(.competitors))]
    CompetingWallet {
        competitors: Vec<WalletVendor>,
        install_url: String,
    },

    #[error("Detected: {}. This dApp only supports MetaMask. Please install MetaMask.", vendor_list(.detected))]
    UnsupportedWallet {
        detected: Vec<WalletVendor>,
        install_url: String,
    },

    /// Detection passed but the handle is gone.
    #[error("MetaMask is not available. Please refresh the page.")]
    WalletMissing,

    #[error("Please connect your MetaMask wallet to continue")]
    Rejected,

    #[error("Connection failed. Please try again.")]
    Failed(String),
}

impl ConnectError {
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Where to send the user, for the variants that call for an install.
    pub fn install_url(&self) -> Option<&str> {
        match self {
            ConnectError::WalletNotInstalled { install_url }
            | ConnectError::CompetingWallet { install_url, .. }
            | ConnectError::UnsupportedWallet { install_url, .. } => Some(install_url),
            _ => None,
        }
    }
}

impl From<ConnectError> for AppError {
    fn from(err: ConnectError) -> Self {
        match err {
            ConnectError::Rejected => AppError::UserRejected(err.to_string()),
            ConnectError::Failed(reason) => AppError::Rpc(reason),
            other => AppError::WalletUnavailable(other.to_string()),
        }
    }
}

/// Explicitly constructed connection owner for one page session.
pub struct ConnectionService<W: Eip1193Provider> {
    install_url: String,
    wallet: RefCell<Option<W>>,
    state: RefCell<ConnectionState>,
    signer: RefCell<Option<Signer<W>>>,
    subscription: RefCell<Option<Subscription>>,
    epoch: Cell<u64>,
}

impl<W: Eip1193Provider> ConnectionService<W> {
    pub fn new(config: &Config) -> Self {
        Self {
            install_url: config.wallet_install_url.clone(),
            wallet: RefCell::new(None),
            state: RefCell::new(ConnectionState::default()),
            signer: RefCell::new(None),
            subscription: RefCell::new(None),
            epoch: Cell::new(0),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn signer(&self) -> Option<Signer<W>> {
        self.signer.borrow().clone()
    }

    pub fn account(&self) -> Option<String> {
        self.state.borrow().account.clone()
    }

    /// Detect the wallet, subscribe to its notifications and restore an authorized
    /// account without prompting.
    ///
    /// Returns the notification stream to hand to [`drive`](Self::drive), or `None` when
    /// no usable wallet exists.
    pub async fn mount(&self, handle: Option<W>) -> Option<EventStream> {
        let detection = detect(handle);

        {
            let mut state = self.state.borrow_mut();
            state.detected_vendors = detection.detected.clone();
            state.vendor_available = detection.usable;
        }

        let Some(wallet) = detection.wallet else {
            info!(detected = %vendor_list(&detection.detected), "supported wallet unavailable");
            self.state.borrow_mut().phase = ConnectionPhase::Unsupported;
            return None;
        };

        let (sender, events) = mpsc::unbounded();
        *self.subscription.borrow_mut() = Some(wallet.subscribe(sender));
        *self.wallet.borrow_mut() = Some(wallet.clone());
        self.state.borrow_mut().phase = ConnectionPhase::Scanning;

        let epoch = self.advance_epoch();
        let accounts = match request_accounts(&wallet, "eth_accounts").await {
            Ok(accounts) => accounts,
            Err(err) => {
                warn!(error = %err, "checking existing connection failed");
                Vec::new()
            }
        };

        match accounts.into_iter().next() {
            Some(account) => {
                let signer = match Signer::derive_for(&wallet, &account).await {
                    Ok(signer) => Some(signer),
                    Err(err) => {
                        warn!(error = %err, "signer unavailable for restored account");
                        None
                    }
                };
                if self.is_current(epoch) {
                    info!(%account, "restored wallet connection");
                    self.install(account, signer);
                }
            }
            None => {
                if self.is_current(epoch) {
                    debug!("no authorized account");
                    self.state.borrow_mut().phase = ConnectionPhase::Disconnected;
                }
            }
        }

        Some(events)
    }

    /// Fold one wallet notification into the state.
    pub async fn handle_event(&self, event: ConnectionEvent) -> ConnectionEffect {
        match event {
            ConnectionEvent::AccountsChanged(accounts) => self.accounts_changed(accounts).await,
            ConnectionEvent::ChainChanged(chain_id) => {
                info!(%chain_id, "network changed, discarding chain state");
                self.advance_epoch();
                self.clear_session();
                self.state.borrow_mut().phase = ConnectionPhase::Scanning;
                ConnectionEffect::ReloadRequired
            }
        }
    }

    async fn accounts_changed(&self, accounts: Vec<String>) -> ConnectionEffect {
        let Some(first) = accounts.into_iter().next() else {
            info!("wallet reported no accounts");
            self.advance_epoch();
            self.clear_session();
            self.state.borrow_mut().phase = ConnectionPhase::Disconnected;
            return ConnectionEffect::Updated;
        };

        let unchanged = self
            .state
            .borrow()
            .account
            .as_deref()
            .is_some_and(|active| active.eq_ignore_ascii_case(&first));
        if unchanged {
            return ConnectionEffect::Unchanged;
        }

        let Some(wallet) = self.wallet.borrow().clone() else {
            return ConnectionEffect::Unchanged;
        };

        info!(account = %first, "active account changed");
        let epoch = self.advance_epoch();
        self.install(first.clone(), None);

        match Signer::derive_for(&wallet, &first).await {
            Ok(signer) if self.is_current(epoch) => {
                *self.signer.borrow_mut() = Some(signer);
                self.state.borrow_mut().signer_ready = true;
            }
            Ok(_) => debug!("discarding signer for superseded account"),
            Err(err) => warn!(error = %err, "updating signer failed"),
        }

        ConnectionEffect::Updated
    }

    /// Prompt the user to connect. Returns the adopted account.
    ///
    /// The epoch only moves once there is an account and signer to install, so a failed
    /// attempt leaves an in-flight restore from [`mount`](Self::mount) to settle the state.
    pub async fn connect(&self) -> Result<String, ConnectError> {
        let (available, detected) = {
            let state = self.state.borrow();
            (state.vendor_available, state.detected_vendors.clone())
        };

        if !available {
            let competitors: Vec<WalletVendor> = detected
                .iter()
                .copied()
                .filter(WalletVendor::is_competitor)
                .collect();
            let install_url = self.install_url.clone();
            let err = if !competitors.is_empty() {
                ConnectError::CompetingWallet {
                    competitors,
                    install_url,
                }
            } else if !detected.is_empty() {
                ConnectError::UnsupportedWallet {
                    detected,
                    install_url,
                }
            } else {
                ConnectError::WalletNotInstalled { install_url }
            };
            info!(reason = %err, "connect refused");
            return Err(err);
        }

        let Some(wallet) = self.wallet.borrow().clone() else {
            return Err(ConnectError::WalletMissing);
        };

        let epoch = self.epoch.get();
        let accounts = request_accounts(&wallet, "eth_requestAccounts")
            .await
            .map_err(|err| {
                if err.is_user_rejection() {
                    info!("user rejected connection");
                    ConnectError::Rejected
                } else {
                    warn!(error = %err, "connection request failed");
                    ConnectError::Failed(err.to_string())
                }
            })?;

        let account = accounts
            .into_iter()
            .next()
            .ok_or_else(|| ConnectError::Failed("wallet returned no accounts".to_string()))?;

        let signer = Signer::derive_for(&wallet, &account).await.map_err(|err| {
            warn!(error = %err, "deriving signer after connect failed");
            ConnectError::Failed(err.to_string())
        })?;

        if !self.is_current(epoch) {
            // A notification already applied a newer account.
            return self
                .account()
                .ok_or_else(|| ConnectError::Failed("connection superseded".to_string()));
        }

        info!(%account, "wallet connected");
        self.advance_epoch();
        self.install(account.clone(), Some(signer));
        Ok(account)
    }

    /// Apply notifications until the stream closes.
    pub async fn drive<F>(&self, mut events: EventStream, mut on_effect: F)
    where
        F: FnMut(ConnectionEffect),
    {
        while let Some(event) = events.next().await {
            debug!(?event, "wallet notification");
            let effect = self.handle_event(event).await;
            on_effect(effect);
        }
        debug!("wallet notification stream closed");
    }

    /// Release the wallet listeners and forget the session.
    pub fn dispose(&self) {
        self.advance_epoch();
        if let Some(subscription) = self.subscription.borrow_mut().take() {
            subscription.unsubscribe();
        }
        self.wallet.borrow_mut().take();
        self.signer.borrow_mut().take();
        *self.state.borrow_mut() = ConnectionState::default();
    }

    fn advance_epoch(&self) -> u64 {
        let next = self.epoch.get().wrapping_add(1);
        self.epoch.set(next);
        next
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.epoch.get() == epoch
    }

    /// Replace account and signer as one unit.
    fn install(&self, account: String, signer: Option<Signer<W>>) {
        let signer_ready = signer.is_some();
        *self.signer.borrow_mut() = signer;
        let mut state = self.state.borrow_mut();
        state.account = Some(account);
        state.signer_ready = signer_ready;
        state.phase = ConnectionPhase::Connected;
    }

    fn clear_session(&self) {
        self.signer.borrow_mut().take();
        let mut state = self.state.borrow_mut();
        state.account = None;
        state.signer_ready = false;
    }
}

impl<W: Eip1193Provider> Drop for ConnectionService<W> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.get_mut().take() {
            subscription.unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    use alloy_primitives::Address;
    use futures::join;

    use crate::detector::WalletIdentity;
    use crate::provider::ProviderError;
    use crate::testing::MockWallet;

    const ALICE: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
    const BOB: &str = "0xfb6916095ca1df60bb79ce92ce3ea74c37c5d359";
    const CAROL: &str = "0xdbf03b407c01e7cd3cbea99509d93f8dddc8c6fb";

    fn address(account: &str) -> Address {
        Address::from_str(account).unwrap()
    }

    fn service() -> ConnectionService<MockWallet> {
        ConnectionService::new(&Config::default())
    }

    async fn connected(wallet: &MockWallet) -> ConnectionService<MockWallet> {
        wallet.set_authorized(&[ALICE]);
        let service = service();
        service.mount(Some(wallet.clone())).await;
        assert!(service.state().is_connected());
        service
    }

    #[tokio::test]
    async fn test_no_wallet_is_unsupported() {
        let service = service();
        let events = service.mount(None).await;

        assert!(events.is_none());
        let state = service.state();
        assert_eq!(state.phase, ConnectionPhase::Unsupported);
        assert!(!state.vendor_available);
        assert!(state.detected_vendors.is_empty());

        let err = service.connect().await.unwrap_err();
        assert_eq!(err.user_message(), "Please install MetaMask to connect your wallet!");
        assert_eq!(err.install_url(), Some("https://metamask.io/download.html"));
    }

    #[tokio::test]
    async fn test_spoofed_wallet_makes_no_requests() {
        let wallet = MockWallet::with_identity(WalletIdentity {
            is_metamask: true,
            is_rainbow: true,
            has_metamask_internals: true,
            ..WalletIdentity::default()
        });
        let service = service();
        assert!(service.mount(Some(wallet.clone())).await.is_none());

        let err = service.connect().await.unwrap_err();
        assert_eq!(
            err.user_message(),
            "Please disable Rainbow Wallet and install MetaMask to continue. This dApp only supports MetaMask."
        );
        assert_eq!(service.state().phase, ConnectionPhase::Unsupported);
        assert_eq!(wallet.listener_count(), 0);
        assert_eq!(wallet.request_count("eth_accounts"), 0);
        assert_eq!(wallet.chain_request_count(), 0);
    }

    #[tokio::test]
    async fn test_flag_without_internals_lists_detection() {
        let wallet = MockWallet::with_identity(WalletIdentity {
            is_metamask: true,
            ..WalletIdentity::default()
        });
        let service = service();
        service.mount(Some(wallet)).await;

        let err = service.connect().await.unwrap_err();
        assert_eq!(
            err.user_message(),
            "Detected: MetaMask. This dApp only supports MetaMask. Please install MetaMask."
        );
    }

    #[tokio::test]
    async fn test_authorized_account_connects_without_prompt() {
        let wallet = MockWallet::metamask();
        let service = connected(&wallet).await;

        let state = service.state();
        assert_eq!(state.account.as_deref(), Some(ALICE));
        assert!(state.signer_ready);
        assert!(service.signer().is_some());
        assert_eq!(wallet.request_count("eth_requestAccounts"), 0);
        assert_eq!(wallet.listener_count(), 1);
    }

    #[tokio::test]
    async fn test_restored_account_kept_when_signer_fails() {
        let wallet = MockWallet::metamask();
        wallet.set_authorized(&[ALICE]);
        wallet.respond_once("eth_accounts", Ok(serde_json::json!([ALICE])));
        wallet.respond_once("eth_accounts", Err(ProviderError::new(-32603, "internal error")));

        let service = service();
        service.mount(Some(wallet)).await;

        let state = service.state();
        assert_eq!(state.phase, ConnectionPhase::Connected);
        assert_eq!(state.account.as_deref(), Some(ALICE));
        assert!(!state.signer_ready);
        assert!(service.signer().is_none());
    }

    #[tokio::test]
    async fn test_connect_after_approval() {
        let wallet = MockWallet::metamask();
        let service = service();
        service.mount(Some(wallet.clone())).await;
        assert_eq!(service.state().phase, ConnectionPhase::Disconnected);

        wallet.approve_connection(&[ALICE]);
        let account = service.connect().await.unwrap();

        assert_eq!(account, ALICE);
        let state = service.state();
        assert!(state.is_connected());
        assert!(state.signer_ready);
        assert_eq!(wallet.request_count("eth_requestAccounts"), 1);
    }

    #[tokio::test]
    async fn test_connect_rejected() {
        let wallet = MockWallet::metamask();
        let service = service();
        service.mount(Some(wallet)).await;

        let err = service.connect().await.unwrap_err();
        assert_eq!(err, ConnectError::Rejected);
        assert_eq!(err.user_message(), "Please connect your MetaMask wallet to continue");
        assert!(AppError::from(err).is_user_rejection());
        assert_eq!(service.state().phase, ConnectionPhase::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_other_failure_is_generic() {
        let wallet = MockWallet::metamask();
        wallet.respond_once(
            "eth_requestAccounts",
            Err(ProviderError::new(-32002, "Request already pending")),
        );
        let service = service();
        service.mount(Some(wallet)).await;

        let err = service.connect().await.unwrap_err();
        assert_eq!(err.user_message(), "Connection failed. Please try again.");
        assert!(service.account().is_none());
    }

    #[tokio::test]
    async fn test_connect_signer_failure_adopts_nothing() {
        let wallet = MockWallet::metamask();
        let service = service();
        service.mount(Some(wallet.clone())).await;

        wallet.approve_connection(&[ALICE]);
        wallet.respond_once("eth_accounts", Err(ProviderError::new(-32603, "internal error")));

        let err = service.connect().await.unwrap_err();
        assert!(matches!(err, ConnectError::Failed(_)));
        let state = service.state();
        assert!(state.account.is_none());
        assert!(!state.signer_ready);
        assert_eq!(state.phase, ConnectionPhase::Disconnected);
    }

    #[tokio::test]
    async fn test_empty_accounts_disconnects_from_any_state() {
        let wallet = MockWallet::metamask();
        let service = connected(&wallet).await;

        let effect = service
            .handle_event(ConnectionEvent::AccountsChanged(Vec::new()))
            .await;
        assert_eq!(effect, ConnectionEffect::Updated);

        let state = service.state();
        assert_eq!(state.phase, ConnectionPhase::Disconnected);
        assert!(state.account.is_none());
        assert!(!state.is_connected());
        assert!(service.signer().is_none());

        // Already disconnected: still no account, still no signer.
        service
            .handle_event(ConnectionEvent::AccountsChanged(Vec::new()))
            .await;
        assert!(service.account().is_none());
        assert!(service.signer().is_none());
    }

    #[tokio::test]
    async fn test_same_account_is_not_rederived() {
        let wallet = MockWallet::metamask();
        let service = connected(&wallet).await;
        let before = wallet.request_count("eth_accounts");

        let effect = service
            .handle_event(ConnectionEvent::AccountsChanged(vec![ALICE.to_uppercase().replacen("0X", "0x", 1)]))
            .await;

        assert_eq!(effect, ConnectionEffect::Unchanged);
        assert_eq!(wallet.request_count("eth_accounts"), before);
    }

    #[tokio::test]
    async fn test_new_account_rederives_signer() {
        let wallet = MockWallet::metamask();
        let service = connected(&wallet).await;

        wallet.set_authorized(&[BOB, ALICE]);
        let effect = service
            .handle_event(ConnectionEvent::AccountsChanged(vec![BOB.to_string(), ALICE.to_string()]))
            .await;

        assert_eq!(effect, ConnectionEffect::Updated);
        assert_eq!(service.account().as_deref(), Some(BOB));
        let signer = service.signer().unwrap();
        assert_eq!(signer.address().to_string().to_lowercase(), BOB);
    }

    #[tokio::test]
    async fn test_new_account_signer_failure_is_logged_not_fatal() {
        let wallet = MockWallet::metamask();
        let service = connected(&wallet).await;

        wallet.respond_once("eth_accounts", Err(ProviderError::new(-32603, "internal error")));
        service
            .handle_event(ConnectionEvent::AccountsChanged(vec![BOB.to_string()]))
            .await;

        let state = service.state();
        assert_eq!(state.account.as_deref(), Some(BOB));
        assert!(!state.signer_ready);
        assert!(service.signer().is_none());
    }

    #[tokio::test]
    async fn test_chain_change_requires_reload() {
        let wallet = MockWallet::metamask();
        let service = connected(&wallet).await;

        let effect = service
            .handle_event(ConnectionEvent::ChainChanged("0xaa36a7".to_string()))
            .await;

        assert_eq!(effect, ConnectionEffect::ReloadRequired);
        assert!(service.account().is_none());
        assert!(service.signer().is_none());
    }

    #[tokio::test]
    async fn test_drive_folds_events_in_order() {
        let wallet = MockWallet::metamask();
        let service = connected(&wallet).await;

        let (sender, events) = mpsc::unbounded();
        sender
            .unbounded_send(ConnectionEvent::AccountsChanged(vec![ALICE.to_string()]))
            .unwrap();
        sender
            .unbounded_send(ConnectionEvent::AccountsChanged(Vec::new()))
            .unwrap();
        sender
            .unbounded_send(ConnectionEvent::ChainChanged("0x1".to_string()))
            .unwrap();
        drop(sender);

        let mut effects = Vec::new();
        service.drive(events, |effect| effects.push(effect)).await;

        assert_eq!(
            effects,
            vec![
                ConnectionEffect::Unchanged,
                ConnectionEffect::Updated,
                ConnectionEffect::ReloadRequired
            ]
        );
    }

    #[tokio::test]
    async fn test_wallet_events_reach_mounted_stream() {
        let wallet = MockWallet::metamask();
        let service = service();
        let mut events = service.mount(Some(wallet.clone())).await.unwrap();

        wallet.emit(ConnectionEvent::AccountsChanged(vec![ALICE.to_string()]));
        let event = events.next().await.unwrap();
        service.handle_event(event).await;

        assert!(service.state().is_connected());
    }

    #[tokio::test]
    async fn test_dispose_releases_listeners() {
        let wallet = MockWallet::metamask();
        let service = connected(&wallet).await;
        assert_eq!(wallet.listener_count(), 1);

        service.dispose();

        assert_eq!(wallet.listener_count(), 0);
        assert_eq!(service.state(), ConnectionState::default());
    }

    #[tokio::test]
    async fn test_drop_releases_listeners() {
        let wallet = MockWallet::metamask();
        {
            let _service = connected(&wallet).await;
            assert_eq!(wallet.listener_count(), 1);
        }
        assert_eq!(wallet.listener_count(), 0);
    }

    #[tokio::test]
    async fn test_new_account_not_authorized_gets_no_signer() {
        let wallet = MockWallet::metamask();
        let service = connected(&wallet).await;

        // The wallet still only authorizes ALICE.
        service
            .handle_event(ConnectionEvent::AccountsChanged(vec![BOB.to_string()]))
            .await;

        let state = service.state();
        assert_eq!(state.account.as_deref(), Some(BOB));
        assert!(!state.signer_ready);
        assert!(service.signer().is_none());
    }

    #[tokio::test]
    async fn test_connect_signer_for_other_account_adopts_nothing() {
        let wallet = MockWallet::metamask();
        let service = service();
        service.mount(Some(wallet.clone())).await;

        wallet.approve_connection(&[ALICE]);
        wallet.respond_once("eth_accounts", Ok(serde_json::json!([BOB])));

        let err = service.connect().await.unwrap_err();
        assert!(matches!(err, ConnectError::Failed(_)));
        assert!(service.account().is_none());
        assert!(service.signer().is_none());
    }

    #[tokio::test]
    async fn test_failed_connect_keeps_pending_restore() {
        let wallet = MockWallet::metamask();
        wallet.set_authorized(&[ALICE]);
        wallet.respond_once("eth_requestAccounts", Err(ProviderError::user_rejected()));
        let release = wallet.hold_next("eth_accounts");
        let service = service();

        let (events, connect) = join!(service.mount(Some(wallet.clone())), async {
            let outcome = service.connect().await;
            let _ = release.send(());
            outcome
        });

        assert!(events.is_some());
        assert_eq!(connect.unwrap_err(), ConnectError::Rejected);
        let state = service.state();
        assert_eq!(state.phase, ConnectionPhase::Connected);
        assert_eq!(state.account.as_deref(), Some(ALICE));
        assert!(state.signer_ready);
    }

    #[tokio::test]
    async fn test_failed_connect_without_restore_settles_disconnected() {
        let wallet = MockWallet::metamask();
        let release = wallet.hold_next("eth_accounts");
        let service = service();

        let (_, connect) = join!(service.mount(Some(wallet.clone())), async {
            let outcome = service.connect().await;
            let _ = release.send(());
            outcome
        });

        assert_eq!(connect.unwrap_err(), ConnectError::Rejected);
        assert_eq!(service.state().phase, ConnectionPhase::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_during_restore_wins() {
        let wallet = MockWallet::metamask();
        wallet.set_authorized(&[ALICE]);
        wallet.approve_connection(&[BOB]);
        let release = wallet.hold_next("eth_accounts");
        let service = service();

        let (_, connect) = join!(service.mount(Some(wallet.clone())), async {
            let outcome = service.connect().await;
            let _ = release.send(());
            outcome
        });

        assert_eq!(connect.unwrap(), BOB);
        assert_eq!(service.account().as_deref(), Some(BOB));
        assert_eq!(service.signer().unwrap().address(), address(BOB));
    }

    #[tokio::test]
    async fn test_disconnect_during_restore_wins() {
        let wallet = MockWallet::metamask();
        wallet.set_authorized(&[ALICE]);
        let release = wallet.hold_next("eth_accounts");
        let service = service();

        let (_, effect) = join!(service.mount(Some(wallet.clone())), async {
            let effect = service
                .handle_event(ConnectionEvent::AccountsChanged(Vec::new()))
                .await;
            let _ = release.send(());
            effect
        });

        assert_eq!(effect, ConnectionEffect::Updated);
        let state = service.state();
        assert_eq!(state.phase, ConnectionPhase::Disconnected);
        assert!(state.account.is_none());
        assert!(service.signer().is_none());
    }

    #[tokio::test]
    async fn test_newer_account_wins_over_pending_signer() {
        let wallet = MockWallet::metamask();
        let service = connected(&wallet).await;
        wallet.set_authorized(&[CAROL, BOB]);
        let release = wallet.hold_next("eth_accounts");

        join!(
            service.handle_event(ConnectionEvent::AccountsChanged(vec![BOB.to_string()])),
            async {
                let effect = service
                    .handle_event(ConnectionEvent::AccountsChanged(vec![CAROL.to_string()]))
                    .await;
                let _ = release.send(());
                effect
            }
        );

        let state = service.state();
        assert_eq!(state.account.as_deref(), Some(CAROL));
        assert!(state.signer_ready);
        assert_eq!(service.signer().unwrap().address(), address(CAROL));
    }

    #[tokio::test]
    async fn test_notification_during_connect_wins() {
        let wallet = MockWallet::metamask();
        let service = service();
        service.mount(Some(wallet.clone())).await;
        assert_eq!(service.state().phase, ConnectionPhase::Disconnected);

        wallet.set_authorized(&[BOB]);
        wallet.approve_connection(&[ALICE]);
        let release = wallet.hold_next("eth_requestAccounts");

        let (connect, _) = join!(service.connect(), async {
            let effect = service
                .handle_event(ConnectionEvent::AccountsChanged(vec![BOB.to_string()]))
                .await;
            let _ = release.send(());
            effect
        });

        assert_eq!(connect.unwrap(), BOB);
        assert_eq!(service.account().as_deref(), Some(BOB));
        assert_eq!(service.signer().unwrap().address(), address(BOB));
    }
}
