//! Signing SDK transport
//!
//! The raw operations of the remote signing SDK, behind a trait so the
//! adapter's state machine can be exercised against test doubles. The real
//! transport talks JSON over HTTP to the signing service; its error payloads
//! follow the wallet-provider convention of numeric error codes, of which two
//! matter here: 4001 (user rejected) and 4902 (unrecognized chain).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::provider::{NetworkSpec, TxReceipt, TxRequest, WalletSession};

/// Wallet error code for a user-rejected request.
pub const CODE_USER_REJECTED: i64 = 4001;

/// Wallet error code for a chain the wallet does not know.
pub const CODE_UNRECOGNIZED_CHAIN: i64 = 4902;

/// Transport-level failures, before mapping into [`crate::WalletError`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The SDK endpoint is unreachable or returned a non-wallet failure
    #[error("signing service unreachable: {0}")]
    Unreachable(String),
    /// The wallet does not know the requested chain (code 4902)
    #[error("chain {0} is not registered with the wallet")]
    UnknownChain(u64),
    /// The user rejected the request in the wallet (code 4001)
    #[error("request rejected by user")]
    Rejected,
    /// The wallet returned a structured error other than the known codes
    #[error("wallet error {code}: {message}")]
    Wallet {
        /// Numeric wallet error code
        code: i64,
        /// Wallet-provided message
        message: String,
    },
    /// The response body did not match the expected shape
    #[error("malformed signing service response: {0}")]
    Protocol(String),
}

// ============================================================================
// TRANSPORT TRAIT
// ============================================================================

/// Raw operations of a signing SDK instance.
#[async_trait]
pub trait SdkTransport: Send + Sync {
    /// Performs the one-time SDK load/handshake. Called again only after a
    /// failed load or a torn-down session.
    async fn load(&self) -> Result<(), TransportError>;

    /// Opens a wallet session.
    async fn connect(&self) -> Result<WalletSession, TransportError>;

    /// Closes the wallet session.
    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Reads the current session state from the wallet, if any.
    async fn active_session(&self) -> Result<Option<WalletSession>, TransportError>;

    /// Switches the wallet to an already-registered chain.
    async fn switch_chain(&self, chain_id: u64) -> Result<(), TransportError>;

    /// Registers a chain with the wallet.
    async fn add_chain(&self, network: &NetworkSpec) -> Result<(), TransportError>;

    /// Signs and submits a transaction.
    async fn sign_and_send(&self, request: &TxRequest) -> Result<TxReceipt, TransportError>;
}

// ============================================================================
// HTTP TRANSPORT
// ============================================================================

/// Error body returned by the signing service.
#[derive(Debug, Deserialize)]
struct SdkErrorBody {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct ConnectRequest<'a> {
    #[serde(rename = "appId")]
    app_id: &'a str,
}

#[derive(Debug, Serialize)]
struct SwitchChainRequest<'a> {
    #[serde(rename = "appId")]
    app_id: &'a str,
    #[serde(rename = "chainId")]
    chain_id: u64,
}

#[derive(Debug, Serialize)]
struct AddChainRequest<'a> {
    #[serde(rename = "appId")]
    app_id: &'a str,
    #[serde(rename = "chainId")]
    chain_id: u64,
    #[serde(rename = "rpcUrl")]
    rpc_url: &'a str,
}

#[derive(Debug, Serialize)]
struct SignRequest<'a> {
    #[serde(rename = "appId")]
    app_id: &'a str,
    #[serde(flatten)]
    tx: &'a TxRequest,
}

/// HTTP transport for the remote signing service.
///
/// This is the Rust rendition of the script-injected browser SDK: one
/// application identifier, one base URL, JSON requests with a fixed timeout.
pub struct HttpSdkTransport {
    client: reqwest::Client,
    base_url: String,
    app_id: String,
}

impl HttpSdkTransport {
    /// Creates a transport for the signing service at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Signing service origin (no trailing slash required)
    /// * `app_id` - Wallet application identifier issued by the service
    /// * `timeout` - Per-request deadline
    ///
    /// # Returns
    ///
    /// * `Ok(HttpSdkTransport)` - Ready transport
    /// * `Err(TransportError)` - HTTP client construction failed
    pub fn new(base_url: &str, app_id: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy() // Avoid macOS system-configuration issues in tests
            .build()
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id: app_id.to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Maps a non-success response into a transport error, decoding the
    /// wallet error body when present.
    async fn map_failure(response: reqwest::Response) -> TransportError {
        let status = response.status();
        match response.json::<SdkErrorBody>().await {
            Ok(body) => match body.code {
                CODE_USER_REJECTED => TransportError::Rejected,
                CODE_UNRECOGNIZED_CHAIN => {
                    // The chain ID is not in the error body; callers that need
                    // it re-tag this variant with the chain they asked for.
                    TransportError::UnknownChain(0)
                }
                code => TransportError::Wallet {
                    code,
                    message: body.message,
                },
            },
            Err(_) => TransportError::Unreachable(format!("signing service returned {}", status)),
        }
    }
}

#[async_trait]
impl SdkTransport for HttpSdkTransport {
    async fn load(&self) -> Result<(), TransportError> {
        let response = self
            .client
            .get(self.endpoint("/v2/sdk/manifest"))
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::map_failure(response).await)
        }
    }

    async fn connect(&self) -> Result<WalletSession, TransportError> {
        let response = self
            .client
            .post(self.endpoint("/v2/connect"))
            .json(&ConnectRequest {
                app_id: &self.app_id,
            })
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::map_failure(response).await);
        }
        response
            .json::<WalletSession>()
            .await
            .map_err(|e| TransportError::Protocol(e.to_string()))
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.endpoint("/v2/disconnect"))
            .json(&ConnectRequest {
                app_id: &self.app_id,
            })
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::map_failure(response).await)
        }
    }

    async fn active_session(&self) -> Result<Option<WalletSession>, TransportError> {
        let response = self
            .client
            .get(self.endpoint("/v2/session"))
            .query(&[("appId", self.app_id.as_str())])
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::map_failure(response).await);
        }
        response
            .json::<WalletSession>()
            .await
            .map(Some)
            .map_err(|e| TransportError::Protocol(e.to_string()))
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.endpoint("/v2/chain/switch"))
            .json(&SwitchChainRequest {
                app_id: &self.app_id,
                chain_id,
            })
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        if response.status().is_success() {
            return Ok(());
        }
        match Self::map_failure(response).await {
            TransportError::UnknownChain(_) => Err(TransportError::UnknownChain(chain_id)),
            other => Err(other),
        }
    }

    async fn add_chain(&self, network: &NetworkSpec) -> Result<(), TransportError> {
        let response = self
            .client
            .post(self.endpoint("/v2/chain/add"))
            .json(&AddChainRequest {
                app_id: &self.app_id,
                chain_id: network.chain_id,
                rpc_url: &network.rpc_url,
            })
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::map_failure(response).await)
        }
    }

    async fn sign_and_send(&self, request: &TxRequest) -> Result<TxReceipt, TransportError> {
        let response = self
            .client
            .post(self.endpoint("/v2/transactions"))
            .json(&SignRequest {
                app_id: &self.app_id,
                tx: request,
            })
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::map_failure(response).await);
        }
        response
            .json::<TxReceipt>()
            .await
            .map_err(|e| TransportError::Protocol(e.to_string()))
    }
}
