//! Transaction Link Codec Library
//!
//! This crate provides the building blocks for shareable transaction links:
//! the transaction intent data model, contract ABI parsing, EVM calldata
//! encoding, and the URL link codec. It contains no network code - submitting
//! the encoded transaction is handled by the wallet crate.

pub mod abi;
pub mod calldata;
pub mod intent;
pub mod link;

// Re-export commonly used types
pub use abi::{parse_abi, try_parse_abi, AbiInput, AbiParseError, ContractFunction};
pub use calldata::{encode_call, function_selector, CalldataError};
pub use intent::{is_valid_address, TransactionIntent};
pub use link::{decode_link, encode_link, MalformedLinkError};
