//! Unit tests for the transaction executor state machine
//!
//! Exercises validation ordering, network alignment, the re-enterable
//! pending-switch state, and submission outcomes against a mock provider.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use txlink_codec::intent::TransactionIntent;
use txlink_wallet::{
    ExecuteError, ExecutionState, Executor, NetworkSpec, TxReceipt, TxRequest, TxStatus,
    WalletError, WalletProvider, WalletSession,
};

// ============================================================================
// CONSTANTS AND HELPERS
// ============================================================================

const CONTRACT_ADDR: &str = "0xAbC0000000000000000000000000000000dEaD00";
const RECIPIENT_ADDR: &str = "0x7000000000000000000000000000000000000001";
const WALLET_ADDR: &str = "0x1111111111111111111111111111111111111111";
const SEPOLIA: u64 = 11155111;

const TRANSFER_ABI: &str = r#"[{"type":"function","name":"transfer","stateMutability":"nonpayable","inputs":[{"name":"to","type":"address"},{"name":"amount","type":"uint256"}]}]"#;
const DEPOSIT_ABI: &str = r#"[{"type":"function","name":"deposit","stateMutability":"payable","inputs":[{"name":"amount","type":"uint256"}]}]"#;

fn transfer_intent() -> TransactionIntent {
    TransactionIntent {
        contract_address: CONTRACT_ADDR.to_string(),
        chain_id: SEPOLIA,
        rpc_url: "https://rpc.sepolia.org".to_string(),
        abi: TRANSFER_ABI.to_string(),
        function_name: "transfer".to_string(),
        params: vec![RECIPIENT_ADDR.to_string(), "1000000".to_string()],
    }
}

/// Mock wallet provider with call counters and failure switches.
#[derive(Default)]
struct MockProvider {
    session: Mutex<Option<WalletSession>>,
    fail_switch: AtomicBool,
    reject_sign: AtomicBool,
    switch_calls: AtomicUsize,
    sign_calls: AtomicUsize,
    last_request: Mutex<Option<TxRequest>>,
}

impl MockProvider {
    fn connected_on(chain_id: u64) -> Self {
        Self {
            session: Mutex::new(Some(WalletSession {
                address: WALLET_ADDR.to_string(),
                chain_id,
            })),
            ..Default::default()
        }
    }
}

#[async_trait]
impl WalletProvider for MockProvider {
    async fn connect(&self) -> Result<WalletSession, WalletError> {
        unimplemented!("executor tests start from an established session")
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        *self.session.lock().await = None;
        Ok(())
    }

    async fn session(&self) -> Result<Option<WalletSession>, WalletError> {
        Ok(self.session.lock().await.clone())
    }

    async fn switch_network(&self, network: &NetworkSpec) -> Result<(), WalletError> {
        self.switch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_switch.load(Ordering::SeqCst) {
            return Err(WalletError::SwitchNetworkFailed {
                chain_id: network.chain_id,
                reason: "wallet refused".to_string(),
            });
        }
        if let Some(session) = self.session.lock().await.as_mut() {
            session.chain_id = network.chain_id;
        }
        Ok(())
    }

    async fn sign_and_send(&self, request: &TxRequest) -> Result<TxReceipt, WalletError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().await = Some(request.clone());
        if self.reject_sign.load(Ordering::SeqCst) {
            return Err(WalletError::Rejected);
        }
        Ok(TxReceipt {
            hash: "0xfeed000000000000000000000000000000000000000000000000000000000001"
                .to_string(),
            status: TxStatus::Pending,
        })
    }
}

// ============================================================================
// STATIC VALIDATION TESTS
// ============================================================================

/// Test that executing without a session fails with NotConnected
/// What is tested: Session precondition
/// Why: Submission must never be attempted without a connected wallet
#[tokio::test]
async fn test_execute_without_session() {
    let provider = MockProvider::default();
    let mut executor = Executor::new();

    let err = executor
        .execute(&transfer_intent(), &provider)
        .await
        .unwrap_err();
    assert!(matches!(err, ExecuteError::NotConnected));
    assert!(matches!(executor.state(), ExecutionState::Failed(_)));
}

/// Test that a malformed contract address fails before any provider call
/// What is tested: Static address validation
/// Why: Bad links must be caught before the wallet is bothered
#[tokio::test]
async fn test_execute_invalid_address() {
    let provider = MockProvider::connected_on(SEPOLIA);
    let mut executor = Executor::new();

    let mut intent = transfer_intent();
    intent.contract_address = "0xnothex".to_string();

    let err = executor.execute(&intent, &provider).await.unwrap_err();
    assert!(matches!(err, ExecuteError::InvalidAddress(_)));
    assert_eq!(provider.switch_calls.load(Ordering::SeqCst), 0);
    assert_eq!(provider.sign_calls.load(Ordering::SeqCst), 0);
}

/// Test that a function absent from the intent's own ABI fails before any
/// network call is attempted
/// What is tested: Function membership validation ordering
/// Why: The link carries its own ABI; a mismatch is a bad link, not a
/// network problem
#[tokio::test]
async fn test_function_not_found_fails_before_network() {
    // Wallet is on the wrong chain, so a switch WOULD be needed - but the
    // function lookup must fail first.
    let provider = MockProvider::connected_on(1);
    let mut executor = Executor::new();

    let mut intent = transfer_intent();
    intent.function_name = "approve".to_string();

    let err = executor.execute(&intent, &provider).await.unwrap_err();
    assert!(matches!(err, ExecuteError::FunctionNotFound(name) if name == "approve"));
    assert_eq!(provider.switch_calls.load(Ordering::SeqCst), 0);
    assert_eq!(provider.sign_calls.load(Ordering::SeqCst), 0);
}

/// Test that a parameter count mismatch is rejected during preparation
/// What is tested: Calldata validation ordering
/// Why: The executor must not submit a call it could not encode
#[tokio::test]
async fn test_param_count_mismatch() {
    let provider = MockProvider::connected_on(SEPOLIA);
    let mut executor = Executor::new();

    let mut intent = transfer_intent();
    intent.params.pop();

    let err = executor.execute(&intent, &provider).await.unwrap_err();
    assert!(matches!(err, ExecuteError::Calldata(_)));
    assert_eq!(provider.sign_calls.load(Ordering::SeqCst), 0);
}

// ============================================================================
// SUBMISSION TESTS
// ============================================================================

/// Test the happy path on a matching chain
/// What is tested: No switch, one submission, correct calldata
/// Why: The common case - recipient wallet already on the right network
#[tokio::test]
async fn test_execute_success_on_matching_chain() {
    let provider = MockProvider::connected_on(SEPOLIA);
    let mut executor = Executor::new();

    let receipt = executor
        .execute(&transfer_intent(), &provider)
        .await
        .unwrap();
    assert_eq!(receipt.status, TxStatus::Pending);
    assert!(matches!(executor.state(), ExecutionState::Success(_)));

    assert_eq!(provider.switch_calls.load(Ordering::SeqCst), 0);
    assert_eq!(provider.sign_calls.load(Ordering::SeqCst), 1);

    let request = provider.last_request.lock().await.clone().unwrap();
    assert_eq!(request.to, CONTRACT_ADDR);
    assert_eq!(request.value, "0x0");
    // transfer(address,uint256) selector
    assert!(request.data.starts_with("0xa9059cbb"));
}

/// Test that a chain mismatch triggers exactly one switch before submission
/// What is tested: Network alignment
/// Why: The transaction must land on the intent's chain, not the wallet's
#[tokio::test]
async fn test_execute_switches_network_when_needed() {
    let provider = MockProvider::connected_on(1);
    let mut executor = Executor::new();

    executor
        .execute(&transfer_intent(), &provider)
        .await
        .unwrap();

    assert_eq!(provider.switch_calls.load(Ordering::SeqCst), 1);
    assert_eq!(provider.sign_calls.load(Ordering::SeqCst), 1);
    let session = provider.session().await.unwrap().unwrap();
    assert_eq!(session.chain_id, SEPOLIA);
}

/// Test that payable calls carry the scaled first parameter as native value
/// What is tested: Native-value extraction for payable functions
/// Why: Payable calls move value; the 18-decimal convention applies
#[tokio::test]
async fn test_payable_call_carries_value() {
    let provider = MockProvider::connected_on(SEPOLIA);
    let mut executor = Executor::new();

    let intent = TransactionIntent {
        contract_address: CONTRACT_ADDR.to_string(),
        chain_id: SEPOLIA,
        rpc_url: "https://rpc.sepolia.org".to_string(),
        abi: DEPOSIT_ABI.to_string(),
        function_name: "deposit".to_string(),
        params: vec!["1".to_string()],
    };

    executor.execute(&intent, &provider).await.unwrap();
    let request = provider.last_request.lock().await.clone().unwrap();
    // 1 token = 10^18 base units
    assert_eq!(request.value, "0xde0b6b3a7640000");
}

/// Test that a user rejection lands in the Failed state
/// What is tested: Submission error propagation
/// Why: Rejections are surfaced verbatim, distinguished from node errors
#[tokio::test]
async fn test_rejection_fails_execution() {
    let provider = MockProvider::connected_on(SEPOLIA);
    provider.reject_sign.store(true, Ordering::SeqCst);
    let mut executor = Executor::new();

    let err = executor
        .execute(&transfer_intent(), &provider)
        .await
        .unwrap_err();
    assert!(matches!(err, ExecuteError::Wallet(WalletError::Rejected)));
    assert!(matches!(executor.state(), ExecutionState::Failed(_)));
}

// ============================================================================
// PENDING NETWORK SWITCH TESTS
// ============================================================================

/// Test that a failed switch parks the executor in PendingNetworkSwitch
/// What is tested: Switch failure state transition
/// Why: The user gets a retry affordance without re-entering parameters
#[tokio::test]
async fn test_switch_failure_enters_pending_state() {
    let provider = MockProvider::connected_on(1);
    provider.fail_switch.store(true, Ordering::SeqCst);
    let mut executor = Executor::new();

    let err = executor
        .execute(&transfer_intent(), &provider)
        .await
        .unwrap_err();
    assert!(matches!(err, ExecuteError::NetworkSwitch(_)));
    assert_eq!(*executor.state(), ExecutionState::PendingNetworkSwitch);
    assert_eq!(provider.sign_calls.load(Ordering::SeqCst), 0);
}

/// Test that retrying from PendingNetworkSwitch skips static re-validation
/// What is tested: Re-enterability of the pending state
/// Why: The retry must reuse the already-validated call, switching and
/// submitting only
#[tokio::test]
async fn test_pending_retry_skips_static_validation() {
    let provider = MockProvider::connected_on(1);
    provider.fail_switch.store(true, Ordering::SeqCst);
    let mut executor = Executor::new();

    let intent = transfer_intent();
    executor.execute(&intent, &provider).await.unwrap_err();
    assert_eq!(*executor.state(), ExecutionState::PendingNetworkSwitch);

    // Hand the retry an intent that would fail static validation: the
    // prepared call from the first attempt must be used instead.
    let mut broken = intent.clone();
    broken.function_name = "doesNotExist".to_string();

    provider.fail_switch.store(false, Ordering::SeqCst);
    let receipt = executor.execute(&broken, &provider).await.unwrap();
    assert_eq!(receipt.status, TxStatus::Pending);
    assert!(matches!(executor.state(), ExecutionState::Success(_)));
    assert_eq!(provider.sign_calls.load(Ordering::SeqCst), 1);
}

/// Test that reset returns to Idle and drops the prepared call
/// What is tested: Cancellation semantics
/// Why: After reset, a retry must validate from scratch again
#[tokio::test]
async fn test_reset_discards_pending_call() {
    let provider = MockProvider::connected_on(1);
    provider.fail_switch.store(true, Ordering::SeqCst);
    let mut executor = Executor::new();

    let intent = transfer_intent();
    executor.execute(&intent, &provider).await.unwrap_err();
    executor.reset();
    assert_eq!(*executor.state(), ExecutionState::Idle);

    // With the prepared call discarded, a broken intent now fails validation.
    let mut broken = intent;
    broken.function_name = "doesNotExist".to_string();
    provider.fail_switch.store(false, Ordering::SeqCst);
    let err = executor.execute(&broken, &provider).await.unwrap_err();
    assert!(matches!(err, ExecuteError::FunctionNotFound(_)));
}
