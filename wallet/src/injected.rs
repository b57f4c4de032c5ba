//! Injected wallet provider
//!
//! The second provider variant: a wallet that is already present (the
//! browser-extension style), so there is no load phase and no retry cycle.
//! The transport is resolved once at construction and never looked up again.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::provider::{
    NetworkSpec, TxReceipt, TxRequest, WalletError, WalletProvider, WalletSession,
};
use crate::remote::switch_via_transport;
use crate::transport::{SdkTransport, TransportError};

/// Wallet provider over an already-available wallet.
pub struct InjectedProvider<T> {
    transport: T,
    connect_timeout: Duration,
    session: Mutex<Option<WalletSession>>,
}

impl<T: SdkTransport> InjectedProvider<T> {
    /// Wraps an injected wallet transport with a 30 second connect deadline.
    pub fn new(transport: T) -> Self {
        Self::with_timeout(transport, Duration::from_secs(30))
    }

    /// Wraps an injected wallet transport with an explicit connect deadline.
    pub fn with_timeout(transport: T, connect_timeout: Duration) -> Self {
        Self {
            transport,
            connect_timeout,
            session: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<T: SdkTransport> WalletProvider for InjectedProvider<T> {
    async fn connect(&self) -> Result<WalletSession, WalletError> {
        let mut session = self.session.lock().await;
        match timeout(self.connect_timeout, self.transport.connect()).await {
            Ok(Ok(connected)) => {
                *session = Some(connected.clone());
                Ok(connected)
            }
            Ok(Err(e)) => {
                *session = None;
                Err(WalletError::ConnectFailed(e.to_string()))
            }
            Err(_) => {
                *session = None;
                Err(WalletError::ConnectTimeout(self.connect_timeout))
            }
        }
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        let mut session = self.session.lock().await;
        let was_active = session.take().is_some();
        drop(session);

        if was_active {
            self.transport
                .disconnect()
                .await
                .map_err(|e| WalletError::Transport(e.to_string()))?;
        }
        Ok(())
    }

    async fn session(&self) -> Result<Option<WalletSession>, WalletError> {
        let mut session = self.session.lock().await;
        if session.is_none() {
            return Ok(None);
        }
        let live = self
            .transport
            .active_session()
            .await
            .map_err(|e| WalletError::Transport(e.to_string()))?;
        *session = live.clone();
        Ok(live)
    }

    async fn switch_network(&self, network: &NetworkSpec) -> Result<(), WalletError> {
        let mut session = self.session.lock().await;
        let current = session.clone().ok_or(WalletError::NotConnected)?;
        if current.chain_id == network.chain_id {
            return Ok(());
        }

        switch_via_transport(&self.transport, network).await?;
        *session = Some(WalletSession {
            address: current.address,
            chain_id: network.chain_id,
        });
        Ok(())
    }

    async fn sign_and_send(&self, request: &TxRequest) -> Result<TxReceipt, WalletError> {
        if self.session.lock().await.is_none() {
            return Err(WalletError::NotConnected);
        }
        match self.transport.sign_and_send(request).await {
            Ok(receipt) => Ok(receipt),
            Err(TransportError::Rejected) => Err(WalletError::Rejected),
            Err(e) => Err(WalletError::Submission(e.to_string())),
        }
    }
}
