//! Configuration types for Tidepool

use serde::{Deserialize, Serialize};

use crate::types::constants;
use crate::{Address, Network};

/// Chain-level addresses the orchestrators need
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Chain ID (1 = Ethereum mainnet)
    pub chain_id: u64,

    /// AMM router contract
    pub router: Address,

    /// Wrapped native asset; decides the ETH-paired liquidity entry points
    pub weth: Address,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            router: Address::new(constants::ROUTER_MAINNET),
            weth: Address::new(constants::WETH_MAINNET),
        }
    }
}

/// Confirmation-wait tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxConfig {
    /// Wall-clock budget for the confirmation race (ms). Applies only after
    /// a hash exists, never to the signature prompt.
    #[serde(default = "default_confirmation_timeout_ms")]
    pub confirmation_timeout_ms: u64,

    /// Receipt poll cadence (ms)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Block confirmations required before a receipt counts
    #[serde(default = "default_required_confirmations")]
    pub required_confirmations: u64,
}

fn default_confirmation_timeout_ms() -> u64 {
    30_000
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_required_confirmations() -> u64 {
    1
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout_ms: default_confirmation_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            required_confirmations: default_required_confirmations(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub chain: ChainConfig,

    #[serde(default)]
    pub tx: TxConfig,

    #[serde(default = "default_network")]
    pub network: Network,
}

fn default_network() -> Network {
    Network::Mainnet
}
