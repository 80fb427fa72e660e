//! Contract call representation
//!
//! A `ContractCall` is the wire-shape handed to the provider: target
//! address, ABI function name, positional arguments, and an optional native
//! value for payable entry points. Integer arguments are encoded as decimal
//! strings so the JSON layer never truncates a uint256.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tidepool_core::{Address, Amount};

/// A single contract invocation, read or write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractCall {
    /// Target contract
    pub to: Address,
    /// ABI function name (e.g. "swapExactTokensForTokens")
    pub function: String,
    /// Positional ABI arguments
    pub args: Vec<Value>,
    /// Native value attached to the call (payable functions only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ContractCall {
    pub fn new(to: Address, function: impl Into<String>) -> Self {
        Self {
            to,
            function: function.into(),
            args: Vec::new(),
            value: None,
        }
    }

    /// Append an address argument
    pub fn address(mut self, addr: &Address) -> Self {
        self.args.push(Value::String(addr.as_str().to_string()));
        self
    }

    /// Append an unsigned integer argument, string-encoded
    pub fn uint(mut self, amount: Amount) -> Self {
        self.args.push(Value::String(amount.to_string()));
        self
    }

    /// Append an address-array argument (swap path)
    pub fn address_array(mut self, addrs: &[&Address]) -> Self {
        self.args.push(Value::Array(
            addrs
                .iter()
                .map(|a| Value::String(a.as_str().to_string()))
                .collect(),
        ));
        self
    }

    /// Attach native value, making the call payable
    pub fn with_value(mut self, amount: Amount) -> Self {
        self.value = Some(amount.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_call_shape() {
        let token = Address::new("0xtoken");
        let spender = Address::new("0xspender");
        let call = ContractCall::new(token.clone(), "approve")
            .address(&spender)
            .uint(1_000_000_000_000_000_000u128);

        assert_eq!(call.to, token);
        assert_eq!(call.function, "approve");
        assert_eq!(call.args, vec![json!("0xspender"), json!("1000000000000000000")]);
        assert!(call.value.is_none());
    }

    #[test]
    fn test_payable_call_carries_value() {
        let call =
            ContractCall::new(Address::new("0xrouter"), "addLiquidityETH").with_value(42);
        assert_eq!(call.value.as_deref(), Some("42"));
    }

    #[test]
    fn test_large_uint_survives_json_round_trip() {
        let call = ContractCall::new(Address::new("0xt"), "approve").uint(u128::MAX);
        let json = serde_json::to_string(&call).unwrap();
        let parsed: ContractCall = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.args[0], json!(u128::MAX.to_string()));
    }
}
