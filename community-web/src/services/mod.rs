//! Browser-side services: the injected wallet and local storage.

pub mod ethereum;
pub mod storage;

pub use ethereum::BrowserWallet;
pub use storage::BrowserStore;
