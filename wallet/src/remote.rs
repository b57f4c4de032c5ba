//! Remote signing SDK provider
//!
//! Adapter over a [`SdkTransport`] implementing the wallet capability set
//! with the SDK lifecycle the remote variant needs:
//!
//! ```text
//! Uninitialized -> Loading -> Ready -> Connected
//!                     |          ^
//!                     v          |
//!                   Failed ------+  (bounded retries, increasing backoff)
//! ```
//!
//! Any connect-time error tears the session down to `Uninitialized` - a
//! half-initialized session is never left behind. The load phase is memoized
//! per adapter instance: the state lock is held across the load, so
//! concurrent connect attempts share one load instead of racing duplicates.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::provider::{
    NetworkSpec, TxReceipt, TxRequest, WalletError, WalletProvider, WalletSession,
};
use crate::transport::{SdkTransport, TransportError};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Tunables for the remote SDK adapter.
#[derive(Debug, Clone)]
pub struct RemoteSdkConfig {
    /// Deadline for a single connect round-trip
    pub connect_timeout: Duration,
    /// SDK load attempts before giving up with `SdkUnavailable`
    pub load_retries: u32,
    /// Backoff base: attempt N waits N times this before retrying the load
    pub retry_base_delay: Duration,
}

impl Default for RemoteSdkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            load_retries: 5,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

// ============================================================================
// STATE MACHINE
// ============================================================================

/// Persistent adapter states. `Loading` and `Failed` are transient within
/// a single load cycle and never observable between calls.
#[derive(Debug, Clone)]
enum SdkState {
    /// SDK not loaded
    Uninitialized,
    /// SDK loaded, no session
    Ready,
    /// SDK loaded with an active session
    Connected(WalletSession),
}

/// Wallet provider backed by a remote signing SDK.
pub struct RemoteSdkProvider<T> {
    transport: T,
    config: RemoteSdkConfig,
    state: Mutex<SdkState>,
}

impl<T: SdkTransport> RemoteSdkProvider<T> {
    /// Creates an adapter over the given transport with default tunables.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, RemoteSdkConfig::default())
    }

    /// Creates an adapter with explicit tunables.
    pub fn with_config(transport: T, config: RemoteSdkConfig) -> Self {
        Self {
            transport,
            config,
            state: Mutex::new(SdkState::Uninitialized),
        }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Drives the load cycle until the SDK is `Ready` (or better).
    ///
    /// Retries up to the configured budget with increasing backoff; exhausting
    /// the budget fails with `SdkUnavailable` and leaves the state
    /// `Uninitialized` so a later connect starts a fresh cycle.
    async fn ensure_loaded(&self, state: &mut SdkState) -> Result<(), WalletError> {
        if !matches!(state, SdkState::Uninitialized) {
            return Ok(());
        }

        let mut last_error = String::new();
        for attempt in 1..=self.config.load_retries {
            debug!(
                "Loading signing SDK (attempt {}/{})",
                attempt, self.config.load_retries
            );
            match self.transport.load().await {
                Ok(()) => {
                    info!("Signing SDK loaded");
                    *state = SdkState::Ready;
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        "Signing SDK load failed (attempt {}/{}): {}",
                        attempt, self.config.load_retries, e
                    );
                    last_error = e.to_string();
                    if attempt < self.config.load_retries {
                        sleep(self.config.retry_base_delay * attempt).await;
                    }
                }
            }
        }

        Err(WalletError::SdkUnavailable {
            attempts: self.config.load_retries,
            reason: last_error,
        })
    }
}

#[async_trait]
impl<T: SdkTransport> WalletProvider for RemoteSdkProvider<T> {
    async fn connect(&self) -> Result<WalletSession, WalletError> {
        // The lock is held across load + connect: concurrent connects share
        // one load and one wallet prompt.
        let mut state = self.state.lock().await;
        self.ensure_loaded(&mut state).await?;

        match timeout(self.config.connect_timeout, self.transport.connect()).await {
            Ok(Ok(session)) => {
                info!(
                    "Wallet connected: {} on chain {}",
                    session.address, session.chain_id
                );
                *state = SdkState::Connected(session.clone());
                Ok(session)
            }
            Ok(Err(e)) => {
                // Discard the half-initialized session entirely.
                *state = SdkState::Uninitialized;
                Err(WalletError::ConnectFailed(e.to_string()))
            }
            Err(_) => {
                *state = SdkState::Uninitialized;
                Err(WalletError::ConnectTimeout(self.config.connect_timeout))
            }
        }
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        let mut state = self.state.lock().await;
        let was_active = !matches!(*state, SdkState::Uninitialized);
        *state = SdkState::Uninitialized;
        drop(state);

        if was_active {
            self.transport
                .disconnect()
                .await
                .map_err(|e| WalletError::Transport(e.to_string()))?;
        }
        Ok(())
    }

    async fn session(&self) -> Result<Option<WalletSession>, WalletError> {
        let mut state = self.state.lock().await;
        if !matches!(*state, SdkState::Connected(_)) {
            return Ok(None);
        }

        // Re-read from the wallet: the account or network may have changed
        // underneath us since connect.
        match self.transport.active_session().await {
            Ok(Some(session)) => {
                *state = SdkState::Connected(session.clone());
                Ok(Some(session))
            }
            Ok(None) => {
                *state = SdkState::Ready;
                Ok(None)
            }
            Err(e) => Err(WalletError::Transport(e.to_string())),
        }
    }

    async fn switch_network(&self, network: &NetworkSpec) -> Result<(), WalletError> {
        let mut state = self.state.lock().await;
        let session = match &*state {
            SdkState::Connected(session) => session.clone(),
            _ => return Err(WalletError::NotConnected),
        };

        if session.chain_id == network.chain_id {
            debug!("Already on chain {}, skipping switch", network.chain_id);
            return Ok(());
        }

        switch_via_transport(&self.transport, network).await?;
        *state = SdkState::Connected(WalletSession {
            address: session.address,
            chain_id: network.chain_id,
        });
        Ok(())
    }

    async fn sign_and_send(&self, request: &TxRequest) -> Result<TxReceipt, WalletError> {
        {
            let state = self.state.lock().await;
            if !matches!(*state, SdkState::Connected(_)) {
                return Err(WalletError::NotConnected);
            }
        }

        match self.transport.sign_and_send(request).await {
            Ok(receipt) => Ok(receipt),
            Err(TransportError::Rejected) => Err(WalletError::Rejected),
            Err(e) => Err(WalletError::Submission(e.to_string())),
        }
    }
}

// ============================================================================
// SHARED SWITCH LOGIC
// ============================================================================

/// Switches the wallet to `network`, registering it first when the wallet
/// reports the chain as unknown. Add failure and switch failure are reported
/// as distinct errors.
pub(crate) async fn switch_via_transport<T: SdkTransport + ?Sized>(
    transport: &T,
    network: &NetworkSpec,
) -> Result<(), WalletError> {
    match transport.switch_chain(network.chain_id).await {
        Ok(()) => Ok(()),
        Err(TransportError::UnknownChain(_)) => {
            info!(
                "Chain {} unknown to wallet, registering it first",
                network.chain_id
            );
            transport
                .add_chain(network)
                .await
                .map_err(|e| WalletError::AddNetworkFailed {
                    chain_id: network.chain_id,
                    reason: e.to_string(),
                })?;
            transport
                .switch_chain(network.chain_id)
                .await
                .map_err(|e| WalletError::SwitchNetworkFailed {
                    chain_id: network.chain_id,
                    reason: e.to_string(),
                })
        }
        Err(e) => Err(WalletError::SwitchNetworkFailed {
            chain_id: network.chain_id,
            reason: e.to_string(),
        }),
    }
}
