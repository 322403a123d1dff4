//! # Application Configuration
//!
//! Deployment constants for the front end: contract addresses, scan caps, the
//! registration fee and transaction confirmation polling.
//!
//! A browser has no process environment, so overrides are taken at build time
//! (`option_env!`) and layered over the defaults, which point at the deployed contracts.
//! All configuration is validated on startup to fail fast if misconfigured.
//!
//! ## Global Config Access
//!
//! ```rust,no_run
//! use lib_core::config::{core_config, init_config};
//!
//! init_config().expect("invalid build configuration");
//! let config = core_config();
//! let cap = config.poll_scan_cap;
//! ```
//!
//! Services take a `&Config` (or the values they need) explicitly; the global instance
//! exists only so the application root has one place to build it.

use std::str::FromStr;
use std::sync::OnceLock;

use alloy_primitives::utils::parse_ether;
use alloy_primitives::{Address, U256};

use crate::error::AppError;

/// Membership registry (CommunityDAO) deployment.
pub const DEFAULT_COMMUNITY_DAO_ADDRESS: &str = "0x11a99b229BAc81A3A45A2566Bc0C83AC3d89A30A";

/// Community and poll contract (CreateCommunity) deployment.
pub const DEFAULT_CREATE_COMMUNITY_ADDRESS: &str = "0x801A82d5Fc8050b283197bF3cA6654dAB56e0e60";

pub const DEFAULT_WALLET_INSTALL_URL: &str = "https://metamask.io/download.html";

/// Application configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Membership and voting-power registry
    pub community_dao_address: Address,

    /// Community and poll management contract
    pub create_community_address: Address,

    /// Upper bound on communities read for the home page list
    pub community_scan_cap: u64,

    /// Upper bound on polls read for a community page
    pub poll_scan_cap: u64,

    /// Value sent with `registerMember`
    pub registration_fee_wei: U256,

    /// Where users without the supported wallet are sent
    pub wallet_install_url: String,

    /// Delay between `eth_getTransactionReceipt` polls
    pub receipt_poll_interval_ms: u32,

    /// Receipt polls before a pending transaction is reported as unconfirmed
    pub receipt_poll_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            community_dao_address: Address::from_str(DEFAULT_COMMUNITY_DAO_ADDRESS)
                .unwrap_or(Address::ZERO),
            create_community_address: Address::from_str(DEFAULT_CREATE_COMMUNITY_ADDRESS)
                .unwrap_or(Address::ZERO),
            community_scan_cap: 10,
            poll_scan_cap: 20,
            registration_fee_wei: U256::from(10_000_000_000_000_000u64),
            wallet_install_url: DEFAULT_WALLET_INSTALL_URL.to_string(),
            receipt_poll_interval_ms: 1_500,
            receipt_poll_attempts: 400,
        }
    }
}

impl Config {
    /// Load and validate configuration from build-time environment variables.
    pub fn from_env() -> crate::Result<Self> {
        Self::load(build_time_var)
    }

    /// Load configuration from an arbitrary variable source, falling back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("COMMUNITY_DAO_ADDRESS") {
            config.community_dao_address = Address::from_str(value.trim())
                .map_err(|e| format!("COMMUNITY_DAO_ADDRESS must be an address: {}", e))?;
        }

        if let Some(value) = lookup("CREATE_COMMUNITY_ADDRESS") {
            config.create_community_address = Address::from_str(value.trim())
                .map_err(|e| format!("CREATE_COMMUNITY_ADDRESS must be an address: {}", e))?;
        }

        if let Some(value) = lookup("COMMUNITY_SCAN_CAP") {
            config.community_scan_cap = value
                .trim()
                .parse()
                .map_err(|e| format!("COMMUNITY_SCAN_CAP must be a valid number: {}", e))?;
        }

        if let Some(value) = lookup("POLL_SCAN_CAP") {
            config.poll_scan_cap = value
                .trim()
                .parse()
                .map_err(|e| format!("POLL_SCAN_CAP must be a valid number: {}", e))?;
        }

        if let Some(value) = lookup("REGISTRATION_FEE_ETH") {
            config.registration_fee_wei = parse_ether(value.trim())
                .map_err(|e| format!("REGISTRATION_FEE_ETH must be an ETH amount: {}", e))?;
        }

        if let Some(value) = lookup("WALLET_INSTALL_URL") {
            config.wallet_install_url = value;
        }

        Ok(config)
    }

    /// Read overrides from `lookup` and validate the result.
    pub fn load<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::from_lookup(lookup).map_err(AppError::Config)?;
        config.validate().map_err(AppError::Config)?;
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.community_dao_address == Address::ZERO || self.create_community_address == Address::ZERO {
            return Err("Contract addresses must not be the zero address".to_string());
        }

        if self.community_scan_cap == 0 || self.poll_scan_cap == 0 {
            return Err("Scan caps must be at least 1".to_string());
        }

        if self.receipt_poll_attempts == 0 {
            return Err("Receipt poll attempts must be at least 1".to_string());
        }

        if !self.wallet_install_url.starts_with("https://") {
            return Err("WALLET_INSTALL_URL must be an https URL".to_string());
        }

        Ok(())
    }
}

fn build_time_var(name: &str) -> Option<String> {
    let value = match name {
        "COMMUNITY_DAO_ADDRESS" => option_env!("COMMUNITY_DAO_ADDRESS"),
        "CREATE_COMMUNITY_ADDRESS" => option_env!("CREATE_COMMUNITY_ADDRESS"),
        "COMMUNITY_SCAN_CAP" => option_env!("COMMUNITY_SCAN_CAP"),
        "POLL_SCAN_CAP" => option_env!("POLL_SCAN_CAP"),
        "REGISTRATION_FEE_ETH" => option_env!("REGISTRATION_FEE_ETH"),
        "WALLET_INSTALL_URL" => option_env!("WALLET_INSTALL_URL"),
        _ => None,
    };
    value.map(str::to_string)
}

/// Global configuration instance (initialized once at startup).
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Initialize the global configuration.
///
/// # Errors
///
/// Returns an error if a build-time override is malformed, validation fails, or the
/// config has already been initialized.
pub fn init_config() -> crate::Result<()> {
    let config = Config::from_env()?;

    tracing::info!(
        dao = %config.community_dao_address,
        communities = %config.create_community_address,
        "configuration loaded"
    );

    CONFIG
        .set(config)
        .map_err(|_| AppError::Config("already initialized".to_string()))
}

/// Get a reference to the global configuration.
///
/// Falls back to the validated defaults if [`init_config()`] has not been called.
pub fn core_config() -> &'static Config {
    CONFIG.get_or_init(Config::default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.community_scan_cap, 10);
        assert_eq!(config.poll_scan_cap, 20);
        assert_eq!(
            config.community_dao_address,
            Address::from_str(DEFAULT_COMMUNITY_DAO_ADDRESS).unwrap()
        );
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("POLL_SCAN_CAP", "5"),
            ("REGISTRATION_FEE_ETH", "0.02"),
        ]))
        .unwrap();
        assert_eq!(config.poll_scan_cap, 5);
        assert_eq!(config.registration_fee_wei, U256::from(20_000_000_000_000_000u64));
        assert_eq!(config.community_scan_cap, 10);
    }

    #[test]
    fn test_malformed_override() {
        let err = Config::from_lookup(lookup_from(&[("CREATE_COMMUNITY_ADDRESS", "0x12")]))
            .unwrap_err();
        assert!(err.starts_with("CREATE_COMMUNITY_ADDRESS"));
    }

    #[test]
    fn test_validate_rejects_zero_cap() {
        let config = Config {
            poll_scan_cap: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_reports_config_error() {
        let err = Config::load(lookup_from(&[("WALLET_INSTALL_URL", "http://metamask.io")]))
            .unwrap_err();
        assert_eq!(
            err,
            AppError::Config("WALLET_INSTALL_URL must be an https URL".to_string())
        );

        let err = Config::load(lookup_from(&[("COMMUNITY_SCAN_CAP", "ten")])).unwrap_err();
        assert!(matches!(err, AppError::Config(msg) if msg.starts_with("COMMUNITY_SCAN_CAP")));
    }
}
