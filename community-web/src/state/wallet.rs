//! Wallet state management

use std::rc::Rc;

use leptos::prelude::*;
use lib_core::core_config;
use lib_evm::{ConnectionEffect, ConnectionService, ConnectionState, Signer};

use crate::services::BrowserWallet;

/// Global wallet context
#[derive(Clone, Copy)]
pub struct WalletContext {
    /// Snapshot of the connection service, refreshed after every transition
    pub connection: RwSignal<ConnectionState>,
    /// Last message from an explicit connect attempt
    pub notice: RwSignal<Option<String>>,
    pub connecting: RwSignal<bool>,
    service: StoredValue<Rc<ConnectionService<BrowserWallet>>, LocalStorage>,
}

impl WalletContext {
    pub fn new() -> Self {
        Self {
            connection: RwSignal::new(ConnectionState::default()),
            notice: RwSignal::new(None),
            connecting: RwSignal::new(false),
            service: StoredValue::new_local(Rc::new(ConnectionService::new(core_config()))),
        }
    }

    fn service(&self) -> Rc<ConnectionService<BrowserWallet>> {
        self.service.get_value()
    }

    /// Copy the service state into the signal.
    fn sync(&self) {
        self.connection.set(self.service().state());
    }

    pub fn is_connected(&self) -> bool {
        self.connection.with(|state| state.is_connected())
    }

    pub fn account(&self) -> Option<String> {
        self.connection.with(|state| state.account.clone())
    }

    /// Current signer. Read `connection` first inside reactive code so it re-runs when
    /// the signer is replaced.
    pub fn signer(&self) -> Option<Signer<BrowserWallet>> {
        self.service().signer()
    }

    /// Detect the wallet, restore an existing connection and follow wallet notifications.
    fn mount(&self) {
        let ctx = *self;
        leptos::task::spawn_local(async move {
            let service = ctx.service();
            let events = service.mount(BrowserWallet::injected()).await;
            ctx.sync();

            let Some(events) = events else {
                return;
            };
            service
                .drive(events, move |effect| match effect {
                    ConnectionEffect::ReloadRequired => reload_page(),
                    ConnectionEffect::Updated => ctx.sync(),
                    ConnectionEffect::Unchanged => {}
                })
                .await;
        });
    }

    /// Explicit "Connect MetaMask" action.
    pub fn connect(&self) {
        let ctx = *self;
        if ctx.connecting.get_untracked() {
            return;
        }
        ctx.connecting.set(true);
        ctx.notice.set(None);

        leptos::task::spawn_local(async move {
            match ctx.service().connect().await {
                Ok(account) => log::info!("[WALLET] connected {}", account),
                Err(err) => {
                    log::warn!("[WALLET] connect failed: {:?}", err);
                    if let Some(url) = err.install_url() {
                        open_in_new_tab(url);
                    }
                    ctx.notice.set(Some(err.user_message()));
                }
            }
            ctx.sync();
            ctx.connecting.set(false);
        });
    }

    pub fn dispose(&self) {
        self.service().dispose();
    }
}

impl Default for WalletContext {
    fn default() -> Self {
        Self::new()
    }
}

fn reload_page() {
    log::info!("[WALLET] network changed, reloading");
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.location().reload() {
            log::error!("[WALLET] reload failed: {:?}", e);
        }
    }
}

pub fn open_in_new_tab(url: &str) {
    if let Some(window) = web_sys::window() {
        if let Err(e) = window.open_with_url_and_target(url, "_blank") {
            log::warn!("[WALLET] could not open {}: {:?}", url, e);
        }
    }
}

pub fn provide_wallet_context() -> WalletContext {
    let context = WalletContext::new();
    provide_context(context);
    context.mount();
    on_cleanup(move || context.dispose());
    context
}

pub fn use_wallet_context() -> WalletContext {
    expect_context::<WalletContext>()
}
