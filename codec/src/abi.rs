//! Contract ABI parsing
//!
//! Extracts callable function descriptors from a raw contract ABI document.
//! Only entries whose `type` is `"function"` are kept; order is preserved and
//! overloaded names are NOT deduplicated - callers that care about overloads
//! must disambiguate by full signature.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

// ============================================================================
// ABI DATA STRUCTURES
// ============================================================================

/// A single typed input of a contract function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiInput {
    /// Parameter name as declared in the contract
    #[serde(default)]
    pub name: String,
    /// Solidity type of the parameter (e.g. "address", "uint256")
    #[serde(rename = "type")]
    pub kind: String,
}

/// A callable function extracted from a contract ABI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractFunction {
    /// Function name
    pub name: String,
    /// Ordered typed inputs
    #[serde(default)]
    pub inputs: Vec<AbiInput>,
    /// State mutability ("payable", "view", ...) if declared.
    /// Payable functions carry the first uint parameter as the native value.
    #[serde(rename = "stateMutability", default)]
    pub state_mutability: Option<String>,
}

/// Errors from strict ABI parsing.
#[derive(Debug, Error)]
pub enum AbiParseError {
    /// The ABI text is not valid JSON at all
    #[error("ABI is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// The ABI parsed, but the top level is not an array
    #[error("ABI top level is not a JSON array")]
    NotAnArray,
}

// ============================================================================
// PARSING
// ============================================================================

/// Parses an ABI document and extracts function descriptors, strictly.
///
/// Unlike [`parse_abi`], this distinguishes a legitimately empty ABI from a
/// document that failed to parse.
///
/// # Arguments
///
/// * `abi_text` - The contract ABI in JSON string format
///
/// # Returns
///
/// * `Ok(Vec<ContractFunction>)` - Function entries in ABI order (may be empty)
/// * `Err(AbiParseError)` - The document is malformed
pub fn try_parse_abi(abi_text: &str) -> Result<Vec<ContractFunction>, AbiParseError> {
    let value: serde_json::Value = serde_json::from_str(abi_text)?;
    let entries = value.as_array().ok_or(AbiParseError::NotAnArray)?;

    let functions = entries
        .iter()
        .filter(|entry| entry.get("type").and_then(|t| t.as_str()) == Some("function"))
        .filter_map(|entry| serde_json::from_value::<ContractFunction>(entry.clone()).ok())
        .collect();

    Ok(functions)
}

/// Parses an ABI document, returning an empty list on malformed input.
///
/// This is the lenient entry point used by the link flow: a broken ABI and an
/// ABI without functions both render as "no callable functions". Use
/// [`try_parse_abi`] where the distinction matters.
///
/// # Arguments
///
/// * `abi_text` - The contract ABI in JSON string format
///
/// # Returns
///
/// Function entries in ABI order; empty on parse failure
pub fn parse_abi(abi_text: &str) -> Vec<ContractFunction> {
    match try_parse_abi(abi_text) {
        Ok(functions) => functions,
        Err(e) => {
            warn!("Failed to parse contract ABI: {}", e);
            Vec::new()
        }
    }
}

/// Finds a function descriptor by name.
///
/// Overloads are not disambiguated: the first entry with a matching name wins.
pub fn find_function<'a>(
    functions: &'a [ContractFunction],
    name: &str,
) -> Option<&'a ContractFunction> {
    functions.iter().find(|f| f.name == name)
}
