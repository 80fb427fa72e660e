//! Core type definitions for Tidepool

use serde::{Deserialize, Serialize};
use std::fmt;

/// EVM account or contract address (20 bytes, 0x-prefixed hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Address identity is case-insensitive: the checksum casing of the hex
    /// body carries no meaning for equality.
    pub fn matches(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }

    /// Check the address is a well-formed 20-byte hex string
    pub fn is_well_formed(&self) -> bool {
        let body = self.0.strip_prefix("0x").unwrap_or(&self.0);
        body.len() == 40 && hex::decode(body).is_ok()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transaction hash (32 bytes, 0x-prefixed hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxHash(pub String);

impl TxHash {
    pub fn new(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token amount in the token's smallest unit.
///
/// Wide enough for uint112 pair reserves and any realistic ERC-20 amount;
/// intermediate products that can exceed this width go through BigUint.
pub type Amount = u128;

/// ERC-20 token reference. Identity is the address, case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRef {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl TokenRef {
    pub fn new(address: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            address: Address::new(address),
            symbol: symbol.into(),
            decimals,
        }
    }

    /// Two refs denote the same token when their addresses match,
    /// regardless of symbol or casing.
    pub fn is_same(&self, other: &TokenRef) -> bool {
        self.address.matches(other.address.as_str())
    }

    pub fn has_address(&self, address: &str) -> bool {
        self.address.matches(address)
    }
}

impl PartialEq for TokenRef {
    fn eq(&self, other: &Self) -> bool {
        self.is_same(other)
    }
}

impl Eq for TokenRef {}

impl fmt::Display for TokenRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.symbol, self.address)
    }
}

/// Network type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Default for Network {
    fn default() -> Self {
        Network::Mainnet
    }
}

/// Block number
pub type BlockNumber = u64;

/// Constants
pub mod constants {
    /// Wrapped native asset (WETH) on Ethereum mainnet
    pub const WETH_MAINNET: &str = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2";

    /// Canonical V2 router on Ethereum mainnet
    pub const ROUTER_MAINNET: &str = "0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D";

    /// On-chain deadline window applied to every value-moving call (seconds)
    pub const DEADLINE_WINDOW_SECS: u64 = 1200;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_match_is_case_insensitive() {
        let addr = Address::new("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");
        assert!(addr.matches("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"));
        assert!(addr.matches("0xC02AAA39B223FE8D0A0E5C4F27EAD9083C756CC2"));
        assert!(!addr.matches("0x7a250d5630B4cF539739dF2C5dAcb4c659F2488D"));
    }

    #[test]
    fn test_address_well_formed() {
        assert!(Address::new(constants::WETH_MAINNET).is_well_formed());
        assert!(!Address::new("0x1234").is_well_formed());
        assert!(!Address::new("not-an-address").is_well_formed());
    }

    #[test]
    fn test_token_identity_ignores_symbol() {
        let a = TokenRef::new("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2", "WETH", 18);
        let b = TokenRef::new("0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2", "weth9", 18);
        assert!(a.is_same(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn test_network_display() {
        assert_eq!(Network::Mainnet.as_str(), "mainnet");
        assert_eq!(Network::Testnet.as_str(), "testnet");
    }
}
