//! # Wallet Detector
//!
//! Decides whether the injected `window.ethereum` object is a genuine MetaMask.
//!
//! Several extensions set `isMetaMask` so that dApps written for MetaMask keep working
//! with them. The supported wallet is recognised only when:
//!
//! 1. `isMetaMask` is set,
//! 2. MetaMask's internal `_metamask` object is present, and
//! 3. no competing vendor flag (`isRainbow`, `isCoinbaseWallet`, ...) is set.
//!
//! Independently of that verdict, every recognised flag is reported so the page can say
//! exactly what was found ("Detected: Rainbow Wallet").

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::provider::Eip1193Provider;

/// Wallet vendors recognised by their identity flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WalletVendor {
    MetaMask,
    Rainbow,
    CoinbaseWallet,
    Trust,
    ImToken,
    TokenPocket,
}

impl WalletVendor {
    /// Every recognised vendor, in diagnostic display order.
    pub const ALL: [WalletVendor; 6] = [
        WalletVendor::MetaMask,
        WalletVendor::Rainbow,
        WalletVendor::CoinbaseWallet,
        WalletVendor::Trust,
        WalletVendor::ImToken,
        WalletVendor::TokenPocket,
    ];

    /// The one vendor this application supports.
    pub const PRIMARY: WalletVendor = WalletVendor::MetaMask;

    pub fn name(&self) -> &'static str {
        match self {
            WalletVendor::MetaMask => "MetaMask",
            WalletVendor::Rainbow => "Rainbow Wallet",
            WalletVendor::CoinbaseWallet => "Coinbase Wallet",
            WalletVendor::Trust => "Trust Wallet",
            WalletVendor::ImToken => "ImToken",
            WalletVendor::TokenPocket => "TokenPocket",
        }
    }

    pub fn is_competitor(&self) -> bool {
        *self != Self::PRIMARY
    }
}

impl std::fmt::Display for WalletVendor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity flags read off the injected object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletIdentity {
    pub is_metamask: bool,
    pub is_rainbow: bool,
    pub is_coinbase_wallet: bool,
    pub is_trust: bool,
    pub is_imtoken: bool,
    pub is_token_pocket: bool,
    /// `_metamask` is an object (only the real extension exposes it)
    pub has_metamask_internals: bool,
}

impl WalletIdentity {
    /// Identity of a genuine MetaMask install.
    pub fn metamask() -> Self {
        Self {
            is_metamask: true,
            has_metamask_internals: true,
            ..Self::default()
        }
    }

    pub fn has(&self, vendor: WalletVendor) -> bool {
        match vendor {
            WalletVendor::MetaMask => self.is_metamask,
            WalletVendor::Rainbow => self.is_rainbow,
            WalletVendor::CoinbaseWallet => self.is_coinbase_wallet,
            WalletVendor::Trust => self.is_trust,
            WalletVendor::ImToken => self.is_imtoken,
            WalletVendor::TokenPocket => self.is_token_pocket,
        }
    }

    /// Every recognised flag that is set.
    pub fn vendors(&self) -> Vec<WalletVendor> {
        WalletVendor::ALL
            .into_iter()
            .filter(|vendor| self.has(*vendor))
            .collect()
    }

    pub fn has_competitor(&self) -> bool {
        WalletVendor::ALL
            .into_iter()
            .any(|vendor| vendor.is_competitor() && self.has(vendor))
    }

    /// Real MetaMask, not an extension borrowing its flag.
    pub fn is_supported(&self) -> bool {
        self.is_metamask && self.has_metamask_internals && !self.has_competitor()
    }
}

/// Outcome of inspecting the injected wallet.
#[derive(Debug, Clone)]
pub struct Detection<W> {
    /// The supported wallet is present and usable
    pub usable: bool,
    /// The handle to use for all further calls, only when usable
    pub wallet: Option<W>,
    /// Every recognised vendor flag found, usable or not
    pub detected: Vec<WalletVendor>,
}

impl<W> Detection<W> {
    pub fn has_competitor(&self) -> bool {
        self.detected.iter().any(WalletVendor::is_competitor)
    }
}

/// Format a vendor list for display: `MetaMask, Rainbow Wallet`.
pub fn vendor_list(vendors: &[WalletVendor]) -> String {
    vendors
        .iter()
        .map(WalletVendor::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Inspect the injected handle, if any.
pub fn detect<W: Eip1193Provider>(handle: Option<W>) -> Detection<W> {
    let Some(handle) = handle else {
        debug!("no injected wallet");
        return Detection {
            usable: false,
            wallet: None,
            detected: Vec::new(),
        };
    };

    let identity = handle.identity();
    let detected = identity.vendors();
    let usable = identity.is_supported();

    debug!(
        usable,
        detected = %vendor_list(&detected),
        internals = identity.has_metamask_internals,
        "injected wallet inspected"
    );

    Detection {
        usable,
        wallet: usable.then_some(handle),
        detected,
    }
}
