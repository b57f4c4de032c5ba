//! Wallet provider capability set
//!
//! The uniform interface every wallet variant must satisfy. The transaction
//! executor only ever talks to this trait; whether the provider is a remote
//! signing SDK or an injected wallet is invisible to it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// SESSION AND TRANSACTION TYPES
// ============================================================================

/// An active wallet session.
///
/// Created on connect, destroyed on disconnect or any connect-time error.
/// Address and chain ID can change underneath the session (account or network
/// switch in the wallet), so callers re-read it per operation and never cache
/// it beyond a single operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    /// Connected account address
    pub address: String,
    /// Chain ID the wallet is currently on
    #[serde(rename = "chainId")]
    pub chain_id: u64,
}

/// Everything the provider needs to switch to a network, including enough
/// information to register it first if the wallet does not know it yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSpec {
    /// Target chain ID
    pub chain_id: u64,
    /// RPC endpoint used when the network has to be registered
    pub rpc_url: String,
}

/// A transaction handed to the wallet for signing and submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRequest {
    /// Target contract address
    pub to: String,
    /// 0x-prefixed calldata hex
    pub data: String,
    /// Native value in hex base units ("0x0" for non-payable calls)
    pub value: String,
}

/// Submission status reported by the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    /// Broadcast, not yet confirmed
    Pending,
    /// Confirmed
    Success,
    /// Reverted or dropped
    Failed,
}

/// Result of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    /// Transaction hash
    pub hash: String,
    /// Submission status
    pub status: TxStatus,
}

// ============================================================================
// ERROR TAXONOMY
// ============================================================================

/// Wallet-adapter errors.
///
/// Connect-layer failures (`SdkUnavailable`, `ConnectTimeout`) are retryable
/// by re-invoking connect. Network-switch failures are retryable through the
/// executor's pending-switch state. `Rejected` carries the wallet's known
/// user-rejection case, distinguished from other submission failures.
#[derive(Debug, Error)]
pub enum WalletError {
    /// An operation requiring a session was called without one
    #[error("no wallet session - connect first")]
    NotConnected,
    /// The signing SDK could not be loaded within the retry budget
    #[error("signing SDK unavailable after {attempts} load attempts: {reason}")]
    SdkUnavailable {
        /// Load attempts made before giving up
        attempts: u32,
        /// Last transport failure
        reason: String,
    },
    /// The wallet did not answer the connect request within the deadline
    #[error("wallet connect timed out after {0:?}")]
    ConnectTimeout(std::time::Duration),
    /// Connecting failed for a non-timeout reason
    #[error("wallet connect failed: {0}")]
    ConnectFailed(String),
    /// The target network could not be registered with the wallet
    #[error("failed to register network {chain_id} with the wallet: {reason}")]
    AddNetworkFailed {
        /// Chain ID that could not be added
        chain_id: u64,
        /// Underlying failure
        reason: String,
    },
    /// The wallet refused or failed to switch to a known network
    #[error("failed to switch wallet to network {chain_id}: {reason}")]
    SwitchNetworkFailed {
        /// Chain ID that could not be switched to
        chain_id: u64,
        /// Underlying failure
        reason: String,
    },
    /// The user rejected the transaction in the wallet
    #[error("transaction rejected by user")]
    Rejected,
    /// The wallet or node rejected the submission for another reason
    #[error("transaction submission failed: {0}")]
    Submission(String),
    /// Transport-level failure talking to the wallet
    #[error("wallet transport error: {0}")]
    Transport(String),
}

// ============================================================================
// CAPABILITY TRAIT
// ============================================================================

/// The capability set every wallet variant exposes.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Connects the wallet and returns the established session.
    async fn connect(&self) -> Result<WalletSession, WalletError>;

    /// Tears down the session. Safe to call when not connected.
    async fn disconnect(&self) -> Result<(), WalletError>;

    /// Returns the live session, re-read from the wallet, or `None` when
    /// not connected.
    async fn session(&self) -> Result<Option<WalletSession>, WalletError>;

    /// Switches the wallet to the given network, registering it first if the
    /// wallet does not know it. Idempotent: switching to the current network
    /// is a no-op success.
    async fn switch_network(&self, network: &NetworkSpec) -> Result<(), WalletError>;

    /// Signs and submits a transaction, returning the hash and status.
    async fn sign_and_send(&self, request: &TxRequest) -> Result<TxReceipt, WalletError>;
}
