//! Transaction intent data model
//!
//! A transaction intent is the developer's declared desire to call a specific
//! contract function with specific arguments on a specific network. It is
//! created once by the developer flow, serialized into a link, and read back
//! unchanged by the recipient flow - a new intent is a new link.

use serde::{Deserialize, Serialize};

/// A contract call to be shared as a link and executed by a recipient.
///
/// Field order matters: the link codec serializes this struct in declaration
/// order, which keeps encoding deterministic for identical intent values.
/// Wire names use camelCase to match the link payload keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionIntent {
    /// Target contract address (0x-prefixed, 40 hex characters)
    pub contract_address: String,
    /// Chain ID of the network the call must be submitted on
    pub chain_id: u64,
    /// RPC endpoint URL for the target network
    pub rpc_url: String,
    /// Contract ABI as a JSON-encoded function array
    pub abi: String,
    /// Name of the function to call (must exist in `abi`)
    pub function_name: String,
    /// Positional parameter values in human-readable string form
    #[serde(default)]
    pub params: Vec<String>,
}

/// Checks that an address is a 0x-prefixed 20-byte hex string.
///
/// # Arguments
///
/// * `address` - Candidate contract or account address
///
/// # Returns
///
/// * `true` - Address is `0x` followed by exactly 40 hex characters
/// * `false` - Anything else
pub fn is_valid_address(address: &str) -> bool {
    match address.strip_prefix("0x") {
        Some(body) => body.len() == 40 && body.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}
