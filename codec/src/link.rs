//! Shareable transaction link codec
//!
//! Serializes a [`TransactionIntent`] into a URL of the form
//! `<origin>/execute?tx=<percent-encoded JSON>` and decodes it back. Encoding
//! is deterministic: the JSON field order is fixed by the intent struct, so
//! the same intent value always produces the same link.
//!
//! This is the only wire shape supported. The payload keys are flat
//! (`contractAddress`, `chainId`, `rpcUrl`, `abi`, `functionName`, `params`);
//! there is no nested `contractDetails` object and no path-segment variant.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;
use url::Url;

use crate::intent::TransactionIntent;

/// Path component of every generated link.
pub const EXECUTE_PATH: &str = "/execute";

/// Query parameter carrying the percent-encoded intent JSON.
pub const TX_PARAM: &str = "tx";

/// Characters escaped the way JavaScript's `encodeURIComponent` escapes them:
/// everything except alphanumerics and `- _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Errors from decoding a transaction link.
///
/// All of these are user-facing and non-retryable: a malformed link can only
/// be fixed by generating a new one.
#[derive(Debug, Error)]
pub enum MalformedLinkError {
    /// The link is not a parseable URL
    #[error("link is not a valid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The link has no `tx` query parameter
    #[error("link is missing the `tx` query parameter")]
    MissingPayload,
    /// The `tx` payload is not valid JSON
    #[error("transaction payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// A required payload field is missing or has the wrong type.
    /// Carries the first offending field name.
    #[error("transaction payload field `{0}` is missing or invalid")]
    MissingField(&'static str),
    /// The `abi` field is present but is not itself a JSON array
    #[error("transaction payload field `abi` is not a JSON array")]
    InvalidAbi,
}

// ============================================================================
// ENCODING
// ============================================================================

/// Generates a shareable transaction execution link.
///
/// # Arguments
///
/// * `origin` - Scheme + host the recipient page is served from
///   (e.g. `https://link.example.org`)
/// * `intent` - The transaction intent to encode
///
/// # Returns
///
/// The complete link, `origin + "/execute?tx=" + <encoded payload>`
pub fn encode_link(origin: &str, intent: &TransactionIntent) -> String {
    // Serialization of a struct cannot fail; field order follows declaration
    // order, which keeps the output canonical.
    let json = serde_json::to_string(intent).expect("intent serializes to JSON");
    let encoded = utf8_percent_encode(&json, COMPONENT);
    format!(
        "{}{}?{}={}",
        origin.trim_end_matches('/'),
        EXECUTE_PATH,
        TX_PARAM,
        encoded
    )
}

// ============================================================================
// DECODING
// ============================================================================

/// Decodes and validates a transaction link.
///
/// Validation covers structural completeness only: `contractAddress` and
/// `functionName` must be non-empty strings and `abi` must be a non-empty
/// string that itself parses as a JSON array. `params` defaults to an empty
/// sequence when absent or not an array. Whether `functionName` exists in the
/// ABI is checked later by the executor.
///
/// # Arguments
///
/// * `link` - The full link URL produced by [`encode_link`]
///
/// # Returns
///
/// * `Ok(TransactionIntent)` - The decoded intent
/// * `Err(MalformedLinkError)` - Naming the first missing or invalid part
pub fn decode_link(link: &str) -> Result<TransactionIntent, MalformedLinkError> {
    let url = Url::parse(link)?;
    let payload = url
        .query_pairs()
        .find(|(key, _)| key == TX_PARAM)
        .map(|(_, value)| value.into_owned())
        .ok_or(MalformedLinkError::MissingPayload)?;

    let value: serde_json::Value = serde_json::from_str(&payload)?;

    let contract_address = require_string(&value, "contractAddress")?;
    let function_name = require_string(&value, "functionName")?;
    let abi = require_string(&value, "abi")?;
    if !serde_json::from_str::<serde_json::Value>(&abi)
        .map(|v| v.is_array())
        .unwrap_or(false)
    {
        return Err(MalformedLinkError::InvalidAbi);
    }

    let params = value
        .get("params")
        .and_then(|p| p.as_array())
        .map(|entries| {
            entries
                .iter()
                .map(|entry| match entry {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(TransactionIntent {
        contract_address,
        chain_id: value.get("chainId").and_then(|c| c.as_u64()).unwrap_or(0),
        rpc_url: value
            .get("rpcUrl")
            .and_then(|r| r.as_str())
            .unwrap_or_default()
            .to_string(),
        abi,
        function_name,
        params,
    })
}

/// Extracts a required non-empty string field from the payload.
fn require_string(
    value: &serde_json::Value,
    field: &'static str,
) -> Result<String, MalformedLinkError> {
    value
        .get(field)
        .and_then(|f| f.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(MalformedLinkError::MissingField(field))
}
