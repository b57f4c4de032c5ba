//! Transaction executor
//!
//! Drives a decoded transaction intent through validation, network
//! alignment, and submission over any [`WalletProvider`]:
//!
//! ```text
//! Idle -> Submitting -> { Success | Failed | PendingNetworkSwitch }
//! ```
//!
//! `PendingNetworkSwitch` is re-enterable: calling execute again from that
//! state retries only the network switch and the submission, keeping the
//! already-validated calldata. Once a transaction is broadcast it cannot be
//! revoked; `reset` only discards the UI-side state.

use ethereum_types::U256;
use thiserror::Error;
use tracing::{debug, info};

use txlink_codec::abi::{find_function, parse_abi};
use txlink_codec::calldata::{encode_call, parse_token_units, CalldataError, NATIVE_DECIMALS};
use txlink_codec::intent::{is_valid_address, TransactionIntent};

use crate::provider::{NetworkSpec, TxReceipt, TxRequest, WalletError, WalletProvider};

// ============================================================================
// STATES AND ERRORS
// ============================================================================

/// Observable executor states.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionState {
    /// Nothing in flight
    Idle,
    /// Submission handed to the wallet
    Submitting,
    /// Submission accepted; carries the receipt
    Success(TxReceipt),
    /// Validation or submission failed; carries the rendered error
    Failed(String),
    /// The network switch failed; execute can be retried without
    /// re-validating static fields
    PendingNetworkSwitch,
}

/// Errors from executing a transaction intent.
#[derive(Debug, Error)]
pub enum ExecuteError {
    /// The provider has no active session
    #[error("no wallet session - connect first")]
    NotConnected,
    /// The intent's contract address is not 0x + 40 hex characters
    #[error("invalid contract address: {0}")]
    InvalidAddress(String),
    /// The intent's function name does not appear in its own ABI
    #[error("function `{0}` not found in the provided ABI")]
    FunctionNotFound(String),
    /// A parameter could not be encoded
    #[error(transparent)]
    Calldata(#[from] CalldataError),
    /// Switching the wallet to the intent's network failed (retryable)
    #[error("network switch failed: {0}")]
    NetworkSwitch(#[source] WalletError),
    /// The wallet failed during submission or session access
    #[error(transparent)]
    Wallet(#[from] WalletError),
}

/// A validated call, kept across a pending network switch so the retry
/// does not re-validate static fields.
#[derive(Debug, Clone)]
struct PreparedCall {
    request: TxRequest,
    network: NetworkSpec,
}

// ============================================================================
// EXECUTOR
// ============================================================================

/// State machine executing transaction intents against a wallet provider.
pub struct Executor {
    state: ExecutionState,
    prepared: Option<PreparedCall>,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    /// Creates an idle executor.
    pub fn new() -> Self {
        Self {
            state: ExecutionState::Idle,
            prepared: None,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> &ExecutionState {
        &self.state
    }

    /// Returns to `Idle` and discards any in-flight result. A transaction
    /// that was already broadcast keeps progressing on chain.
    pub fn reset(&mut self) {
        self.state = ExecutionState::Idle;
        self.prepared = None;
    }

    /// Executes a transaction intent through the given provider.
    ///
    /// Called from `PendingNetworkSwitch`, this retries only the network
    /// switch and the submission. From any other state it validates the
    /// intent from scratch first.
    ///
    /// # Arguments
    ///
    /// * `intent` - The decoded transaction intent
    /// * `provider` - Any connected wallet provider
    ///
    /// # Returns
    ///
    /// * `Ok(TxReceipt)` - Hash and status of the accepted submission
    /// * `Err(ExecuteError)` - First failure on the way there
    pub async fn execute<P: WalletProvider + ?Sized>(
        &mut self,
        intent: &TransactionIntent,
        provider: &P,
    ) -> Result<TxReceipt, ExecuteError> {
        let retrying = matches!(self.state, ExecutionState::PendingNetworkSwitch);
        let prepared = match self.prepared.take() {
            Some(prepared) if retrying => {
                debug!("Retrying from pending network switch");
                prepared
            }
            _ => self.prepare(intent, provider).await?,
        };

        // Align the wallet's network with the intent before submitting.
        let session = provider
            .session()
            .await?
            .ok_or(ExecuteError::NotConnected)?;
        if session.chain_id != prepared.network.chain_id {
            debug!(
                "Wallet on chain {}, intent needs chain {}",
                session.chain_id, prepared.network.chain_id
            );
            if let Err(e) = provider.switch_network(&prepared.network).await {
                self.state = ExecutionState::PendingNetworkSwitch;
                self.prepared = Some(prepared);
                return Err(ExecuteError::NetworkSwitch(e));
            }
        }

        self.state = ExecutionState::Submitting;
        match provider.sign_and_send(&prepared.request).await {
            Ok(receipt) => {
                info!("Transaction submitted: {}", receipt.hash);
                self.state = ExecutionState::Success(receipt.clone());
                Ok(receipt)
            }
            Err(e) => {
                self.state = ExecutionState::Failed(e.to_string());
                Err(ExecuteError::Wallet(e))
            }
        }
    }

    /// Validates the static fields of an intent and builds the call.
    ///
    /// All failures here are detectable without touching the network: session
    /// presence, address shape, function membership in the intent's own ABI,
    /// and parameter encoding.
    async fn prepare<P: WalletProvider + ?Sized>(
        &mut self,
        intent: &TransactionIntent,
        provider: &P,
    ) -> Result<PreparedCall, ExecuteError> {
        let result = self.prepare_inner(intent, provider).await;
        if let Err(e) = &result {
            self.state = ExecutionState::Failed(e.to_string());
        }
        result
    }

    async fn prepare_inner<P: WalletProvider + ?Sized>(
        &mut self,
        intent: &TransactionIntent,
        provider: &P,
    ) -> Result<PreparedCall, ExecuteError> {
        if provider.session().await?.is_none() {
            return Err(ExecuteError::NotConnected);
        }

        if !is_valid_address(&intent.contract_address) {
            return Err(ExecuteError::InvalidAddress(
                intent.contract_address.clone(),
            ));
        }

        let functions = parse_abi(&intent.abi);
        let function = find_function(&functions, &intent.function_name)
            .ok_or_else(|| ExecuteError::FunctionNotFound(intent.function_name.clone()))?;

        let data = encode_call(function, &intent.params)?;

        // Payable calls carry the first uint amount as the native value,
        // scaled by the 18-decimal convention like the calldata encoder does.
        let value = if function.state_mutability.as_deref() == Some("payable") {
            match (function.inputs.first(), intent.params.first()) {
                (Some(input), Some(param)) if input.kind == "uint256" => {
                    format!("{:#x}", parse_token_units(param, NATIVE_DECIMALS)?)
                }
                _ => format!("{:#x}", U256::zero()),
            }
        } else {
            format!("{:#x}", U256::zero())
        };

        Ok(PreparedCall {
            request: TxRequest {
                to: intent.contract_address.clone(),
                data,
                value,
            },
            network: NetworkSpec {
                chain_id: intent.chain_id,
                rpc_url: intent.rpc_url.clone(),
            },
        })
    }
}
