//! `window.ethereum` Integration via wasm-bindgen
//!
//! [`BrowserWallet`] implements the EIP-1193 provider seam over the object the wallet
//! extension injects into the page.

use async_trait::async_trait;
use js_sys::{Function, Reflect};
use lib_evm::{
    ConnectionEvent, Eip1193Provider, EventSender, ProviderError, Subscription, WalletIdentity,
};
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

// ============================================================================
// JAVASCRIPT INTEROP
// ============================================================================

#[wasm_bindgen(inline_js = "
export function injectedEthereum() {
    if (typeof window === 'undefined' || !window.ethereum) {
        return undefined;
    }
    return window.ethereum;
}

export async function ethereumRequest(provider, method, params) {
    try {
        return await provider.request({ method, params });
    } catch (e) {
        const code = (e && typeof e.code === 'number') ? e.code : -32603;
        const message = (e && e.message) ? String(e.message) : String(e);
        throw { code, message };
    }
}

export function addEthereumListener(provider, event, listener) {
    provider.on(event, listener);
}

export function removeEthereumListener(provider, event, listener) {
    if (typeof provider.removeListener === 'function') {
        provider.removeListener(event, listener);
    }
}
")]
extern "C" {
    fn injectedEthereum() -> JsValue;

    #[wasm_bindgen(catch)]
    async fn ethereumRequest(provider: &JsValue, method: &str, params: JsValue) -> Result<JsValue, JsValue>;

    fn addEthereumListener(provider: &JsValue, event: &str, listener: &Function);

    fn removeEthereumListener(provider: &JsValue, event: &str, listener: &Function);
}

/// Error object thrown by `request`, normalized by `ethereumRequest`.
#[derive(Deserialize)]
struct JsProviderError {
    code: i64,
    message: String,
}

// ============================================================================
// BROWSER WALLET
// ============================================================================

/// Handle to the injected wallet object.
#[derive(Clone, Debug)]
pub struct BrowserWallet {
    handle: JsValue,
}

impl BrowserWallet {
    /// The injected object, if the page has one.
    pub fn injected() -> Option<Self> {
        let handle = injectedEthereum();
        if handle.is_undefined() || handle.is_null() {
            log::info!("[WALLET] window.ethereum not present");
            return None;
        }
        Some(Self { handle })
    }

    fn flag(&self, name: &str) -> bool {
        Reflect::get(&self.handle, &JsValue::from_str(name))
            .ok()
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    fn has_object(&self, name: &str) -> bool {
        Reflect::get(&self.handle, &JsValue::from_str(name))
            .map(|value| value.is_object())
            .unwrap_or(false)
    }
}

fn to_js(params: &Value) -> Result<JsValue, ProviderError> {
    params
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| ProviderError::new(-32602, format!("encoding params: {}", e)))
}

fn from_js(value: JsValue) -> Result<Value, ProviderError> {
    if value.is_undefined() {
        return Ok(Value::Null);
    }
    serde_wasm_bindgen::from_value(value)
        .map_err(|e| ProviderError::new(-32603, format!("decoding response: {}", e)))
}

fn provider_error(value: JsValue) -> ProviderError {
    match serde_wasm_bindgen::from_value::<JsProviderError>(value.clone()) {
        Ok(err) => ProviderError::new(err.code, err.message),
        Err(_) => ProviderError::new(
            -32603,
            value.as_string().unwrap_or_else(|| format!("{:?}", value)),
        ),
    }
}

#[async_trait(?Send)]
impl Eip1193Provider for BrowserWallet {
    fn identity(&self) -> WalletIdentity {
        WalletIdentity {
            is_metamask: self.flag("isMetaMask"),
            is_rainbow: self.flag("isRainbow"),
            is_coinbase_wallet: self.flag("isCoinbaseWallet"),
            is_trust: self.flag("isTrust"),
            is_imtoken: self.flag("isImToken"),
            is_token_pocket: self.flag("isTokenPocket"),
            has_metamask_internals: self.has_object("_metamask"),
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let params = to_js(&params)?;
        match ethereumRequest(&self.handle, method, params).await {
            Ok(result) => from_js(result),
            Err(err) => {
                let err = provider_error(err);
                log::warn!("[WALLET] {} failed: {}", method, err);
                Err(err)
            }
        }
    }

    fn subscribe(&self, events: EventSender) -> Subscription {
        let accounts_sender = events.clone();
        let on_accounts = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            match serde_wasm_bindgen::from_value::<Vec<String>>(value) {
                Ok(accounts) => {
                    let _ = accounts_sender.unbounded_send(ConnectionEvent::AccountsChanged(accounts));
                }
                Err(e) => log::warn!("[WALLET] ignoring malformed accountsChanged payload: {}", e),
            }
        });

        let on_chain = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            let chain_id = value.as_string().unwrap_or_default();
            let _ = events.unbounded_send(ConnectionEvent::ChainChanged(chain_id));
        });

        addEthereumListener(&self.handle, "accountsChanged", on_accounts.as_ref().unchecked_ref());
        addEthereumListener(&self.handle, "chainChanged", on_chain.as_ref().unchecked_ref());

        let handle = self.handle.clone();
        Subscription::new(move || {
            removeEthereumListener(&handle, "accountsChanged", on_accounts.as_ref().unchecked_ref());
            removeEthereumListener(&handle, "chainChanged", on_chain.as_ref().unchecked_ref());
            log::info!("[WALLET] listeners removed");
        })
    }

    async fn pause(&self, millis: u32) {
        gloo_timers::future::TimeoutFuture::new(millis).await;
    }
}
