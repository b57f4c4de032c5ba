//! Wallet Adapter Library
//!
//! This crate wraps third-party wallet connectors behind a uniform capability
//! set (connect, disconnect, switch network, sign-and-send) and drives the
//! transaction executor on top of it. Two provider variants exist: a remote
//! signing SDK reached over HTTP, and an injected provider that is assumed to
//! be present without a load phase. The executor is polymorphic over the
//! capability trait and never depends on which variant is active.

pub mod executor;
pub mod injected;
pub mod provider;
pub mod remote;
pub mod transport;

// Re-export commonly used types
pub use executor::{ExecuteError, ExecutionState, Executor};
pub use injected::InjectedProvider;
pub use provider::{
    NetworkSpec, TxReceipt, TxRequest, TxStatus, WalletError, WalletProvider, WalletSession,
};
pub use remote::{RemoteSdkConfig, RemoteSdkProvider};
pub use transport::{HttpSdkTransport, SdkTransport, TransportError};
