//! EVM calldata encoding
//!
//! Builds the call data for a contract function call: a 4-byte keccak-256
//! selector followed by the ABI-encoded positional parameters. Supports the
//! static types used by link-shared calls (address, uint/int widths, bool,
//! fixed bytes) plus dynamic `string` and `bytes` with head/tail offsets.
//! Arrays and tuples are not supported.

use ethereum_types::U256;
use sha3::{Digest, Keccak256};
use thiserror::Error;

use crate::abi::ContractFunction;

/// Number of decimals in the native token convention (1 token = 10^18 base units).
pub const NATIVE_DECIMALS: u32 = 18;

/// Errors from calldata encoding.
#[derive(Debug, Error)]
pub enum CalldataError {
    /// Parameter count does not match the function's input count
    #[error("function `{name}` expects {expected} parameters, got {actual}")]
    ParamCountMismatch {
        /// Function name
        name: String,
        /// Number of inputs declared in the ABI
        expected: usize,
        /// Number of parameters supplied
        actual: usize,
    },
    /// An address parameter is not a 0x-prefixed 20-byte hex string
    #[error("invalid address parameter: {0}")]
    InvalidAddress(String),
    /// A numeric parameter is not a valid decimal string
    #[error("invalid numeric parameter: {0}")]
    InvalidNumber(String),
    /// A numeric parameter overflows 256 bits after unit scaling
    #[error("numeric parameter overflows uint256: {0}")]
    Overflow(String),
    /// A bool parameter is not true/false
    #[error("invalid bool parameter: {0}")]
    InvalidBool(String),
    /// A bytes parameter is not valid hex of the declared width
    #[error("invalid bytes parameter: {0}")]
    InvalidBytes(String),
    /// The declared Solidity type is not supported by this encoder
    #[error("unsupported parameter type: {0}")]
    UnsupportedType(String),
}

// ============================================================================
// SELECTOR
// ============================================================================

/// Computes the 4-byte function selector for a signature.
///
/// The selector is the first four bytes of the keccak-256 hash of the
/// canonical signature `name(type1,type2,...)`.
///
/// # Arguments
///
/// * `name` - Function name
/// * `input_types` - Declared Solidity types of the inputs, in order
///
/// # Returns
///
/// The 4-byte selector
pub fn function_selector(name: &str, input_types: &[&str]) -> [u8; 4] {
    let signature = format!("{}({})", name, input_types.join(","));
    let digest = Keccak256::digest(signature.as_bytes());
    let mut selector = [0u8; 4];
    selector.copy_from_slice(&digest[..4]);
    selector
}

// ============================================================================
// UNIT PARSING
// ============================================================================

/// Parses a human-readable decimal token amount into base units.
///
/// `"1.5"` with 18 decimals becomes `1500000000000000000`. The fractional
/// part may not exceed `decimals` digits.
///
/// # Arguments
///
/// * `value` - Decimal string, optionally with a fractional part
/// * `decimals` - Number of decimals in the base-unit convention
///
/// # Returns
///
/// * `Ok(U256)` - The scaled integer amount
/// * `Err(CalldataError)` - Not a decimal string, too many fractional digits,
///   or the scaled amount overflows 256 bits
pub fn parse_token_units(value: &str, decimals: u32) -> Result<U256, CalldataError> {
    let value = value.trim();
    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(CalldataError::InvalidNumber(value.to_string()));
    }
    if frac.len() as u32 > decimals {
        return Err(CalldataError::InvalidNumber(format!(
            "{} has more than {} fractional digits",
            value, decimals
        )));
    }

    let whole_part = if whole.is_empty() {
        U256::zero()
    } else {
        U256::from_dec_str(whole).map_err(|_| CalldataError::InvalidNumber(value.to_string()))?
    };
    let frac_part = if frac.is_empty() {
        U256::zero()
    } else {
        let padded = format!("{:0<width$}", frac, width = decimals as usize);
        U256::from_dec_str(&padded).map_err(|_| CalldataError::InvalidNumber(value.to_string()))?
    };

    whole_part
        .checked_mul(U256::exp10(decimals as usize))
        .and_then(|scaled| scaled.checked_add(frac_part))
        .ok_or_else(|| CalldataError::Overflow(value.to_string()))
}

// ============================================================================
// PARAMETER ENCODING
// ============================================================================

/// A parameter encoded either as a single static word or as dynamic tail data.
enum EncodedParam {
    /// One 32-byte ABI word placed directly in the head section
    Static([u8; 32]),
    /// Length-prefixed, 32-byte-padded data placed in the tail section,
    /// referenced from the head by offset
    Dynamic(Vec<u8>),
}

/// Encodes one parameter value according to its declared Solidity type.
fn encode_param(kind: &str, value: &str) -> Result<EncodedParam, CalldataError> {
    match kind {
        "address" => {
            let body = value
                .strip_prefix("0x")
                .filter(|b| b.len() == 40)
                .ok_or_else(|| CalldataError::InvalidAddress(value.to_string()))?;
            let bytes =
                hex::decode(body).map_err(|_| CalldataError::InvalidAddress(value.to_string()))?;
            let mut word = [0u8; 32];
            word[12..].copy_from_slice(&bytes);
            Ok(EncodedParam::Static(word))
        }
        // uint256 values arrive in whole-token human form and are scaled by
        // the 18-decimal native convention, matching the wallet side.
        "uint256" => {
            let amount = parse_token_units(value, NATIVE_DECIMALS)?;
            Ok(EncodedParam::Static(u256_word(amount)))
        }
        "bool" => match value {
            "true" | "1" => {
                let mut word = [0u8; 32];
                word[31] = 1;
                Ok(EncodedParam::Static(word))
            }
            "false" | "0" => Ok(EncodedParam::Static([0u8; 32])),
            _ => Err(CalldataError::InvalidBool(value.to_string())),
        },
        "string" => Ok(EncodedParam::Dynamic(pad_dynamic(value.as_bytes()))),
        "bytes" => {
            let body = value.strip_prefix("0x").unwrap_or(value);
            let bytes =
                hex::decode(body).map_err(|_| CalldataError::InvalidBytes(value.to_string()))?;
            Ok(EncodedParam::Dynamic(pad_dynamic(&bytes)))
        }
        _ => {
            // Remaining numeric widths (uint8..uint248, int8..int256) take the
            // decimal value as-is, without unit scaling.
            if let Some(width) = numeric_width(kind) {
                let amount = U256::from_dec_str(value.trim())
                    .map_err(|_| CalldataError::InvalidNumber(value.to_string()))?;
                if width < 256 && amount >= (U256::one() << width) {
                    return Err(CalldataError::Overflow(value.to_string()));
                }
                return Ok(EncodedParam::Static(u256_word(amount)));
            }
            // Fixed-width bytes1..bytes32, right-padded.
            if let Some(width) = fixed_bytes_width(kind) {
                let body = value.strip_prefix("0x").unwrap_or(value);
                let bytes = hex::decode(body)
                    .map_err(|_| CalldataError::InvalidBytes(value.to_string()))?;
                if bytes.len() != width {
                    return Err(CalldataError::InvalidBytes(format!(
                        "{} is not {} bytes",
                        value, width
                    )));
                }
                let mut word = [0u8; 32];
                word[..width].copy_from_slice(&bytes);
                return Ok(EncodedParam::Static(word));
            }
            Err(CalldataError::UnsupportedType(kind.to_string()))
        }
    }
}

/// Parses `uintN`/`intN` into the bit width N, if `kind` is a numeric type.
fn numeric_width(kind: &str) -> Option<usize> {
    let digits = kind.strip_prefix("uint").or_else(|| kind.strip_prefix("int"))?;
    if digits.is_empty() {
        return Some(256); // bare "uint"/"int" alias
    }
    let width: usize = digits.parse().ok()?;
    (width % 8 == 0 && (8..=256).contains(&width)).then_some(width)
}

/// Parses `bytesN` into the byte width N, if `kind` is a fixed bytes type.
fn fixed_bytes_width(kind: &str) -> Option<usize> {
    let digits = kind.strip_prefix("bytes")?;
    let width: usize = digits.parse().ok()?;
    (1..=32).contains(&width).then_some(width)
}

/// Renders a U256 as a 32-byte big-endian ABI word.
fn u256_word(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

/// Builds the tail section for dynamic data: length word + right-padded bytes.
fn pad_dynamic(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(32 + data.len().div_ceil(32) * 32);
    out.extend_from_slice(&u256_word(U256::from(data.len())));
    out.extend_from_slice(data);
    let padding = (32 - data.len() % 32) % 32;
    out.extend(std::iter::repeat(0u8).take(padding));
    out
}

// ============================================================================
// CALL ENCODING
// ============================================================================

/// Encodes a full function call as 0x-prefixed calldata hex.
///
/// The output is `selector || heads || tails`, where static parameters are
/// placed directly in the head section and dynamic parameters leave an offset
/// word pointing into the tail section.
///
/// # Arguments
///
/// * `function` - The function descriptor (from the intent's own ABI)
/// * `params` - Positional parameter values in human-readable string form
///
/// # Returns
///
/// * `Ok(String)` - 0x-prefixed calldata hex
/// * `Err(CalldataError)` - Count mismatch, unparseable value, or unsupported type
pub fn encode_call(function: &ContractFunction, params: &[String]) -> Result<String, CalldataError> {
    if params.len() != function.inputs.len() {
        return Err(CalldataError::ParamCountMismatch {
            name: function.name.clone(),
            expected: function.inputs.len(),
            actual: params.len(),
        });
    }

    let input_types: Vec<&str> = function.inputs.iter().map(|i| i.kind.as_str()).collect();
    let selector = function_selector(&function.name, &input_types);

    let encoded: Vec<EncodedParam> = function
        .inputs
        .iter()
        .zip(params)
        .map(|(input, value)| encode_param(&input.kind, value))
        .collect::<Result<_, _>>()?;

    let head_len = encoded.len() * 32;
    let mut heads = Vec::with_capacity(head_len);
    let mut tails: Vec<u8> = Vec::new();

    for param in &encoded {
        match param {
            EncodedParam::Static(word) => heads.extend_from_slice(word),
            EncodedParam::Dynamic(tail) => {
                let offset = U256::from(head_len + tails.len());
                heads.extend_from_slice(&u256_word(offset));
                tails.extend_from_slice(tail);
            }
        }
    }

    let mut data = Vec::with_capacity(4 + heads.len() + tails.len());
    data.extend_from_slice(&selector);
    data.extend_from_slice(&heads);
    data.extend_from_slice(&tails);

    Ok(format!("0x{}", hex::encode(data)))
}
