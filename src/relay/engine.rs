// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The relay pipeline.
//!
//! Per request the engine runs a strictly linear state machine:
//!
//! ```text
//! Start -> Decoded -> Validated -> FundingDecided
//!       -> {FundingSent -> BalanceConfirmed}? -> Forwarded -> Receipted
//! ```
//!
//! Any error terminates the request with a failed [`RelayOutcome`]. The
//! signed bytes submitted in the forward step are exactly the bytes the
//! client supplied; the engine never reconstructs, re-signs or re-orders
//! them. On-chain ordering is mandatory: funding completes (including the
//! balance-wait) before the user transaction is forwarded, so the steps
//! are never parallelized.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, B256, U256};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::TenantContext;
use crate::chain::{decode_signed_tx, ChainRpc, DecodedTx, GasPayerFactory};
use crate::gas::{FundingDecision, GasPolicy, ValidationError};
use crate::oracle::PriceOracle;

/// Poll budgets for the two wait loops.
#[derive(Debug, Clone)]
pub struct RelayTiming {
    /// Balance-wait after funding: attempts x interval (default 15 x 2 s).
    pub balance_poll_attempts: u32,
    pub balance_poll_interval: Duration,
    /// Receipt-wait after forwarding: attempts x interval (default 30 x 2 s).
    pub receipt_poll_attempts: u32,
    pub receipt_poll_interval: Duration,
}

impl Default for RelayTiming {
    fn default() -> Self {
        Self {
            balance_poll_attempts: 15,
            balance_poll_interval: Duration::from_secs(2),
            receipt_poll_attempts: 30,
            receipt_poll_interval: Duration::from_secs(2),
        }
    }
}

/// Failure modes of the relay pipeline.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to decode transaction: {0}")]
    Decode(#[from] crate::chain::DecodeError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("tenant has no funding wallet configured")]
    NoTenantWallet,

    #[error("funding failed: {0}")]
    FundingFailed(String),

    #[error("user balance did not reach the required amount within the wait budget")]
    FundingTimeout,

    #[error("transaction rejected by node: {0}")]
    ForwardFailed(String),

    #[error("Transaction failed on blockchain")]
    OnChainFailed,

    #[error("chain RPC error: {0}")]
    ChainRpc(String),
}

/// What the caller gets back for every relay request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub success: bool,
    pub tx_hash: Option<String>,
    pub contract_address: Option<String>,
    pub error: Option<String>,
}

impl RelayOutcome {
    fn ok(tx_hash: B256, contract: Option<Address>) -> Self {
        Self {
            success: true,
            tx_hash: Some(tx_hash.to_string()),
            contract_address: contract.map(|a| a.to_string()),
            error: None,
        }
    }

    fn rejected(contract: Option<Address>, error: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            tx_hash: None,
            contract_address: contract.map(|a| a.to_string()),
            error: Some(error.to_string()),
        }
    }

    fn failed_on_chain(
        tx_hash: B256,
        contract: Option<Address>,
        error: impl std::fmt::Display,
    ) -> Self {
        Self {
            success: false,
            tx_hash: Some(tx_hash.to_string()),
            contract_address: contract.map(|a| a.to_string()),
            error: Some(error.to_string()),
        }
    }
}

/// Orchestrates decode -> validate -> fund -> forward -> receipt.
pub struct RelayEngine {
    chain: Arc<dyn ChainRpc>,
    gas_payer: Arc<dyn GasPayerFactory>,
    policy: GasPolicy,
    timing: RelayTiming,
    oracle: Option<Arc<PriceOracle>>,
}

impl RelayEngine {
    pub fn new(
        chain: Arc<dyn ChainRpc>,
        gas_payer: Arc<dyn GasPayerFactory>,
        policy: GasPolicy,
        timing: RelayTiming,
        oracle: Option<Arc<PriceOracle>>,
    ) -> Self {
        Self {
            chain,
            gas_payer,
            policy,
            timing,
            oracle,
        }
    }

    pub fn policy(&self) -> &GasPolicy {
        &self.policy
    }

    /// Process one relay request. Never panics: every failure collapses
    /// into an outcome with `success == false`.
    pub async fn process(
        &self,
        tenant: &TenantContext,
        user_wallet_hint: &str,
        signed_hex: &str,
        operation_name: &str,
        expected_gas_limit: u64,
    ) -> RelayOutcome {
        let request_id = Uuid::new_v4();

        // Decode and recover the sender from the signature.
        let decoded = match decode_signed_tx(signed_hex) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(%request_id, tenant = %tenant.api_key_name, error = %e, "decode failed");
                return RelayOutcome::rejected(None, RelayError::Decode(e));
            }
        };
        let contract = decoded.to;

        // The recovered sender is authoritative; the client-supplied
        // address is informational only.
        let recovered = decoded.sender.to_string();
        if !user_wallet_hint.is_empty() && !user_wallet_hint.eq_ignore_ascii_case(&recovered) {
            debug!(
                %request_id,
                hint = user_wallet_hint,
                recovered = %recovered,
                "wallet hint differs from recovered sender"
            );
        }

        info!(
            %request_id,
            tenant = %tenant.api_key_name,
            operation = operation_name,
            sender = %decoded.sender,
            gas_limit = decoded.gas_limit,
            gas_price = decoded.effective_gas_price,
            "relay request decoded"
        );

        // Gas limit check is pure; run it before any RPC round-trip.
        if let Err(e) = self
            .policy
            .validate_gas_limit(&decoded, operation_name, expected_gas_limit)
        {
            warn!(%request_id, error = %e, "validation rejected");
            return RelayOutcome::rejected(contract, e);
        }

        let network_gas_price = match self.chain.network_gas_price().await {
            Ok(price) => price,
            Err(e) => return RelayOutcome::rejected(contract, RelayError::ChainRpc(e.to_string())),
        };
        if let Err(e) = self.policy.validate_gas_price(&decoded, network_gas_price) {
            warn!(%request_id, error = %e, "validation rejected");
            return RelayOutcome::rejected(contract, e);
        }
        if let Err(e) = self.policy.validate_total_cost(&decoded, expected_gas_limit) {
            warn!(%request_id, error = %e, "validation rejected");
            return RelayOutcome::rejected(contract, e);
        }

        // Funding decision: compare the sender's balance with the padded
        // cost plus value.
        let needed = self.policy.required_balance(&decoded);
        let balance = match self.chain.balance(decoded.sender).await {
            Ok(balance) => balance,
            Err(e) => return RelayOutcome::rejected(contract, RelayError::ChainRpc(e.to_string())),
        };

        let decision = match self.policy.deficit(&decoded, balance) {
            None => FundingDecision::Skip,
            Some(deficit) => {
                let fee = match self.gas_payer.view().calculate_fee(deficit).await {
                    Ok(fee) => fee,
                    Err(e) => {
                        // Soft failure: substitute the 5% estimate.
                        warn!(%request_id, error = %e, "fee estimate unavailable, using fallback");
                        GasPolicy::fallback_fee(deficit)
                    }
                };
                FundingDecision::Transfer { deficit, fee }
            }
        };

        if let FundingDecision::Transfer { deficit, fee } = decision {
            let Some(binding) = tenant.wallet.as_ref() else {
                warn!(
                    %request_id,
                    tenant = %tenant.api_key_name,
                    "funding required but tenant has no wallet"
                );
                return RelayOutcome::rejected(contract, RelayError::NoTenantWallet);
            };

            let funder = match self.gas_payer.for_wallet(binding) {
                Ok(funder) => funder,
                Err(e) => {
                    return RelayOutcome::rejected(
                        contract,
                        RelayError::FundingFailed(e.to_string()),
                    )
                }
            };

            let total = deficit + fee;
            let amount_description = self.describe_amount(total).await;
            info!(
                %request_id,
                user = %decoded.sender,
                deficit = %deficit,
                fee = %fee,
                amount = %amount_description,
                "funding user wallet"
            );

            match funder.fund_and_relay(decoded.sender, deficit, total).await {
                Ok(receipt) if receipt.status => {
                    info!(%request_id, funding_tx = %receipt.tx_hash, "funding confirmed");
                }
                Ok(receipt) => {
                    return RelayOutcome::rejected(
                        contract,
                        RelayError::FundingFailed(format!(
                            "funding transaction {} reverted",
                            receipt.tx_hash
                        )),
                    );
                }
                Err(e) => {
                    return RelayOutcome::rejected(
                        contract,
                        RelayError::FundingFailed(e.to_string()),
                    );
                }
            }

            if !self.wait_for_balance(decoded.sender, needed).await {
                warn!(%request_id, user = %decoded.sender, "balance wait timed out");
                return RelayOutcome::rejected(contract, RelayError::FundingTimeout);
            }
        } else {
            debug!(%request_id, "balance sufficient, skipping funding");
        }

        // Forward the exact client-supplied bytes.
        let tx_hash = match self.chain.send_raw(&decoded.raw).await {
            Ok(hash) => hash,
            Err(e) => {
                warn!(%request_id, error = %e, "forward failed");
                return RelayOutcome::rejected(contract, RelayError::ForwardFailed(e.to_string()));
            }
        };
        info!(%request_id, tx_hash = %tx_hash, "transaction forwarded");

        let outcome = self.await_receipt(tx_hash, &decoded).await;
        info!(
            %request_id,
            success = outcome.success,
            tx_hash = %tx_hash,
            "relay request finished"
        );
        outcome
    }

    /// Poll the sender's balance until it covers `needed` or the budget is
    /// exhausted. Transient RPC failures count as a normal attempt.
    async fn wait_for_balance(&self, sender: Address, needed: U256) -> bool {
        for attempt in 0..self.timing.balance_poll_attempts {
            match self.chain.balance(sender).await {
                Ok(balance) if balance >= needed => return true,
                Ok(_) => {}
                Err(e) => warn!(user = %sender, error = %e, "balance poll failed"),
            }
            if attempt + 1 < self.timing.balance_poll_attempts {
                tokio::time::sleep(self.timing.balance_poll_interval).await;
            }
        }
        false
    }

    /// Poll for the forwarded transaction's receipt. A mined-but-reverted
    /// transaction and a never-mined one both fail, but the hash is always
    /// surfaced.
    async fn await_receipt(&self, tx_hash: B256, decoded: &DecodedTx) -> RelayOutcome {
        for attempt in 0..self.timing.receipt_poll_attempts {
            match self.chain.receipt(tx_hash).await {
                Ok(Some(receipt)) if receipt.status => {
                    return RelayOutcome::ok(tx_hash, decoded.to);
                }
                Ok(Some(_)) => {
                    return RelayOutcome::failed_on_chain(
                        tx_hash,
                        decoded.to,
                        RelayError::OnChainFailed,
                    );
                }
                Ok(None) => {}
                Err(e) => warn!(tx_hash = %tx_hash, error = %e, "receipt poll failed"),
            }
            if attempt + 1 < self.timing.receipt_poll_attempts {
                tokio::time::sleep(self.timing.receipt_poll_interval).await;
            }
        }
        RelayOutcome::failed_on_chain(
            tx_hash,
            decoded.to,
            "transaction not confirmed within the receipt window",
        )
    }

    async fn describe_amount(&self, amount: U256) -> String {
        match &self.oracle {
            Some(oracle) => oracle.describe(amount).await,
            None => format!("{amount} wei"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use alloy::{
        consensus::{SignableTransaction, TxEnvelope, TxLegacy},
        eips::eip2718::Encodable2718,
        network::TxSignerSync,
        primitives::{address, Bytes, TxKind},
        rpc::types::TransactionRequest,
        signers::local::PrivateKeySigner,
    };
    use async_trait::async_trait;

    use crate::chain::{ChainError, FundingReceipt, GasPayerError, GasPayerOps, ReceiptInfo};
    use crate::config::GasSettings;
    use crate::security::WalletBinding;

    const RECIPIENT: Address = address!("0x2222222222222222222222222222222222222222");
    const TX_HASH: B256 = B256::repeat_byte(0xab);

    const GWEI: u128 = 1_000_000_000;

    /// 100_000 gas * 25 gwei * 1.2 padding.
    const NEEDED: u64 = 3_000_000_000_000_000;

    fn signer() -> PrivateKeySigner {
        "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
            .parse()
            .unwrap()
    }

    fn signed_hex(gas_limit: u64, gas_price: u128) -> String {
        let signer = signer();
        let mut tx = TxLegacy {
            chain_id: Some(1),
            nonce: 0,
            gas_price,
            gas_limit,
            to: TxKind::Call(RECIPIENT),
            value: U256::ZERO,
            input: Bytes::new(),
        };
        let signature = signer.sign_transaction_sync(&mut tx).unwrap();
        let envelope = TxEnvelope::from(tx.into_signed(signature));
        format!("0x{}", alloy::hex::encode(envelope.encoded_2718()))
    }

    struct MockChain {
        /// Balances returned in order; the last one repeats.
        balances: Mutex<Vec<U256>>,
        gas_price: u128,
        balance_calls: AtomicUsize,
        gas_price_calls: AtomicUsize,
        sent: Mutex<Vec<Vec<u8>>>,
        fail_send: bool,
        /// `Some(status)` mines immediately; `None` never mines.
        receipt_status: Option<bool>,
    }

    impl MockChain {
        fn with_balances(balances: Vec<u64>) -> Self {
            Self {
                balances: Mutex::new(balances.into_iter().map(U256::from).collect()),
                gas_price: 25 * GWEI,
                balance_calls: AtomicUsize::new(0),
                gas_price_calls: AtomicUsize::new(0),
                sent: Mutex::new(Vec::new()),
                fail_send: false,
                receipt_status: Some(true),
            }
        }

        fn sent_payloads(&self) -> Vec<Vec<u8>> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChainRpc for MockChain {
        async fn balance(&self, _address: Address) -> Result<U256, ChainError> {
            let mut balances = self.balances.lock().unwrap();
            self.balance_calls.fetch_add(1, Ordering::SeqCst);
            if balances.len() > 1 {
                Ok(balances.remove(0))
            } else {
                Ok(balances.first().copied().unwrap_or(U256::ZERO))
            }
        }

        async fn send_raw(&self, raw: &[u8]) -> Result<B256, ChainError> {
            if self.fail_send {
                return Err(ChainError::Rpc("nonce too low".to_string()));
            }
            self.sent.lock().unwrap().push(raw.to_vec());
            Ok(TX_HASH)
        }

        async fn receipt(&self, tx_hash: B256) -> Result<Option<ReceiptInfo>, ChainError> {
            Ok(self.receipt_status.map(|status| ReceiptInfo {
                tx_hash,
                status,
                block_number: Some(1),
                gas_used: 21_000,
            }))
        }

        async fn network_gas_price(&self) -> Result<u128, ChainError> {
            self.gas_price_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.gas_price)
        }

        async fn chain_id(&self) -> Result<u64, ChainError> {
            Ok(1)
        }

        async fn estimate_gas(&self, _call: TransactionRequest) -> Result<u64, ChainError> {
            Ok(21_000)
        }
    }

    struct MockGasPayerState {
        /// `None` makes `calculate_fee` fail, exercising the 5% fallback.
        fee: Option<U256>,
        fund_status: bool,
        fail_fund: bool,
        fund_calls: Mutex<Vec<(Address, U256, U256)>>,
    }

    #[derive(Clone)]
    struct MockGasPayer(Arc<MockGasPayerState>);

    impl MockGasPayer {
        fn with_fee(fee: u64) -> Self {
            Self(Arc::new(MockGasPayerState {
                fee: Some(U256::from(fee)),
                fund_status: true,
                fail_fund: false,
                fund_calls: Mutex::new(Vec::new()),
            }))
        }

        fn fund_calls(&self) -> Vec<(Address, U256, U256)> {
            self.0.fund_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GasPayerOps for MockGasPayer {
        async fn calculate_fee(&self, _amount: U256) -> Result<U256, GasPayerError> {
            self.0
                .fee
                .ok_or_else(|| GasPayerError::Fee("fee oracle offline".to_string()))
        }

        async fn fund_and_relay(
            &self,
            user: Address,
            gas_amount: U256,
            total_value: U256,
        ) -> Result<FundingReceipt, GasPayerError> {
            if self.0.fail_fund {
                return Err(GasPayerError::Funding("insufficient relayer funds".to_string()));
            }
            self.0
                .fund_calls
                .lock()
                .unwrap()
                .push((user, gas_amount, total_value));
            Ok(FundingReceipt {
                tx_hash: B256::repeat_byte(0xfe),
                status: self.0.fund_status,
            })
        }
    }

    impl GasPayerFactory for MockGasPayer {
        fn view(&self) -> Arc<dyn GasPayerOps> {
            Arc::new(self.clone())
        }

        fn for_wallet(
            &self,
            _binding: &WalletBinding,
        ) -> Result<Arc<dyn GasPayerOps>, GasPayerError> {
            Ok(Arc::new(self.clone()))
        }
    }

    fn engine(chain: Arc<MockChain>, gas_payer: MockGasPayer) -> RelayEngine {
        let timing = RelayTiming {
            balance_poll_attempts: 3,
            balance_poll_interval: Duration::from_millis(1),
            receipt_poll_attempts: 3,
            receipt_poll_interval: Duration::from_millis(1),
        };
        RelayEngine::new(
            chain,
            Arc::new(gas_payer),
            GasPolicy::new(GasSettings::default()),
            timing,
            None,
        )
    }

    fn funded_tenant() -> TenantContext {
        TenantContext {
            api_key_name: "tenant-test".to_string(),
            client_ip: "127.0.0.1".to_string(),
            wallet: Some(WalletBinding {
                private_key:
                    "0x0000000000000000000000000000000000000000000000000000000000000001"
                        .to_string(),
                address: None,
            }),
        }
    }

    fn walletless_tenant() -> TenantContext {
        TenantContext {
            api_key_name: "no-wallet".to_string(),
            client_ip: "127.0.0.1".to_string(),
            wallet: None,
        }
    }

    #[tokio::test]
    async fn sufficient_balance_skips_funding_and_forwards_exact_bytes() {
        let hex = signed_hex(100_000, 25 * GWEI);
        let chain = Arc::new(MockChain::with_balances(vec![NEEDED]));
        let gas_payer = MockGasPayer::with_fee(0);
        let engine = engine(chain.clone(), gas_payer.clone());

        let outcome = engine
            .process(&funded_tenant(), "", &hex, "mint", 130_000)
            .await;

        assert!(outcome.success, "outcome: {outcome:?}");
        assert_eq!(outcome.tx_hash, Some(TX_HASH.to_string()));
        assert!(gas_payer.fund_calls().is_empty(), "fund_and_relay must not run");

        let sent = chain.sent_payloads();
        assert_eq!(sent.len(), 1);
        let expected = alloy::hex::decode(hex.strip_prefix("0x").unwrap()).unwrap();
        assert_eq!(sent[0], expected, "forwarded bytes must equal the client's");
    }

    #[tokio::test]
    async fn zero_balance_funds_deficit_plus_fee_then_forwards() {
        let hex = signed_hex(100_000, 25 * GWEI);
        // Decision sees 0; the balance-wait then observes the funded amount.
        let chain = Arc::new(MockChain::with_balances(vec![0, NEEDED]));
        let fee = 150_000_000_000_000u64; // 1.5e14
        let gas_payer = MockGasPayer::with_fee(fee);
        let engine = engine(chain.clone(), gas_payer.clone());

        let outcome = engine
            .process(&funded_tenant(), "", &hex, "mint", 130_000)
            .await;

        assert!(outcome.success, "outcome: {outcome:?}");

        let calls = gas_payer.fund_calls();
        assert_eq!(calls.len(), 1);
        let (user, gas_amount, total) = &calls[0];
        assert_eq!(*user, signer().address());
        assert_eq!(*gas_amount, U256::from(NEEDED));
        assert_eq!(*total, U256::from(NEEDED) + U256::from(fee));

        let sent = chain.sent_payloads();
        assert_eq!(sent.len(), 1);
        let expected = alloy::hex::decode(hex.strip_prefix("0x").unwrap()).unwrap();
        assert_eq!(sent[0], expected);
    }

    #[tokio::test]
    async fn gas_limit_over_budget_is_rejected_before_any_rpc() {
        let hex = signed_hex(200_000, 25 * GWEI);
        let chain = Arc::new(MockChain::with_balances(vec![NEEDED]));
        let gas_payer = MockGasPayer::with_fee(0);
        let engine = engine(chain.clone(), gas_payer.clone());

        let outcome = engine
            .process(&funded_tenant(), "", &hex, "mint", 130_000)
            .await;

        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap().contains("gas limit"));
        assert_eq!(outcome.contract_address, Some(RECIPIENT.to_string()));
        assert!(outcome.tx_hash.is_none());

        // No RPC beyond decoding for a budget rejection.
        assert_eq!(chain.gas_price_calls.load(Ordering::SeqCst), 0);
        assert_eq!(chain.balance_calls.load(Ordering::SeqCst), 0);
        assert!(chain.sent_payloads().is_empty());
        assert!(gas_payer.fund_calls().is_empty());
    }

    #[tokio::test]
    async fn walletless_tenant_cannot_fund() {
        let hex = signed_hex(100_000, 25 * GWEI);
        let chain = Arc::new(MockChain::with_balances(vec![0]));
        let gas_payer = MockGasPayer::with_fee(0);
        let engine = engine(chain.clone(), gas_payer.clone());

        let outcome = engine
            .process(&walletless_tenant(), "", &hex, "mint", 130_000)
            .await;

        assert!(!outcome.success);
        assert!(outcome
            .error
            .as_deref()
            .unwrap()
            .contains("no funding wallet"));
        assert!(gas_payer.fund_calls().is_empty(), "no on-chain writes");
        assert!(chain.sent_payloads().is_empty());
    }

    #[tokio::test]
    async fn fee_estimate_failure_falls_back_to_five_percent() {
        let hex = signed_hex(100_000, 25 * GWEI);
        let chain = Arc::new(MockChain::with_balances(vec![0, NEEDED]));
        let gas_payer = MockGasPayer(Arc::new(MockGasPayerState {
            fee: None,
            fund_status: true,
            fail_fund: false,
            fund_calls: Mutex::new(Vec::new()),
        }));
        let engine = engine(chain, gas_payer.clone());

        let outcome = engine
            .process(&funded_tenant(), "", &hex, "mint", 130_000)
            .await;
        assert!(outcome.success, "outcome: {outcome:?}");

        let calls = gas_payer.fund_calls();
        let deficit = U256::from(NEEDED);
        let fallback = deficit * U256::from(5u64) / U256::from(100u64);
        assert_eq!(calls[0].2, deficit + fallback);
    }

    #[tokio::test]
    async fn balance_never_updating_times_out() {
        let hex = signed_hex(100_000, 25 * GWEI);
        let chain = Arc::new(MockChain::with_balances(vec![0]));
        let gas_payer = MockGasPayer::with_fee(1);
        let engine = engine(chain.clone(), gas_payer.clone());

        let outcome = engine
            .process(&funded_tenant(), "", &hex, "mint", 130_000)
            .await;

        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap().contains("did not reach"));
        assert_eq!(gas_payer.fund_calls().len(), 1);
        assert!(chain.sent_payloads().is_empty(), "nothing forwarded after timeout");
    }

    #[tokio::test]
    async fn reverted_funding_fails_the_request() {
        let hex = signed_hex(100_000, 25 * GWEI);
        let chain = Arc::new(MockChain::with_balances(vec![0]));
        let gas_payer = MockGasPayer(Arc::new(MockGasPayerState {
            fee: Some(U256::from(1u64)),
            fund_status: false,
            fail_fund: false,
            fund_calls: Mutex::new(Vec::new()),
        }));
        let engine = engine(chain.clone(), gas_payer);

        let outcome = engine
            .process(&funded_tenant(), "", &hex, "mint", 130_000)
            .await;

        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap().contains("reverted"));
        assert!(chain.sent_payloads().is_empty());
    }

    #[tokio::test]
    async fn node_rejection_surfaces_forward_failure() {
        let hex = signed_hex(100_000, 25 * GWEI);
        let mut chain = MockChain::with_balances(vec![NEEDED]);
        chain.fail_send = true;
        let engine = engine(Arc::new(chain), MockGasPayer::with_fee(0));

        let outcome = engine
            .process(&funded_tenant(), "", &hex, "mint", 130_000)
            .await;

        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap().contains("rejected by node"));
        assert_eq!(outcome.contract_address, Some(RECIPIENT.to_string()));
    }

    #[tokio::test]
    async fn reverted_user_transaction_reports_on_chain_failure() {
        let hex = signed_hex(100_000, 25 * GWEI);
        let mut chain = MockChain::with_balances(vec![NEEDED]);
        chain.receipt_status = Some(false);
        let engine = engine(Arc::new(chain), MockGasPayer::with_fee(0));

        let outcome = engine
            .process(&funded_tenant(), "", &hex, "mint", 130_000)
            .await;

        assert!(!outcome.success);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Transaction failed on blockchain")
        );
        assert_eq!(outcome.tx_hash, Some(TX_HASH.to_string()));
        assert_eq!(outcome.contract_address, Some(RECIPIENT.to_string()));
    }

    #[tokio::test]
    async fn unmined_transaction_still_surfaces_the_hash() {
        let hex = signed_hex(100_000, 25 * GWEI);
        let mut chain = MockChain::with_balances(vec![NEEDED]);
        chain.receipt_status = None;
        let engine = engine(Arc::new(chain), MockGasPayer::with_fee(0));

        let outcome = engine
            .process(&funded_tenant(), "", &hex, "mint", 130_000)
            .await;

        assert!(!outcome.success);
        assert_eq!(outcome.tx_hash, Some(TX_HASH.to_string()));
        assert!(outcome.error.as_deref().unwrap().contains("not confirmed"));
    }

    #[tokio::test]
    async fn wallet_hint_never_overrides_recovered_sender() {
        let hex = signed_hex(100_000, 25 * GWEI);
        let chain = Arc::new(MockChain::with_balances(vec![0, NEEDED]));
        let gas_payer = MockGasPayer::with_fee(1);
        let engine = engine(chain, gas_payer.clone());

        // A hint pointing elsewhere changes nothing: funding goes to the
        // recovered sender.
        let outcome = engine
            .process(
                &funded_tenant(),
                "0x9999999999999999999999999999999999999999",
                &hex,
                "mint",
                130_000,
            )
            .await;

        assert!(outcome.success);
        assert_eq!(gas_payer.fund_calls()[0].0, signer().address());
    }

    #[tokio::test]
    async fn price_oracle_failure_does_not_affect_outcome() {
        let hex = signed_hex(100_000, 25 * GWEI);
        let chain = Arc::new(MockChain::with_balances(vec![0, NEEDED]));
        let gas_payer = MockGasPayer::with_fee(1);

        // Oracle pointed at a dead endpoint: every quote fails.
        let oracle = Arc::new(PriceOracle::with_base_url(
            1,
            Duration::from_secs(300),
            "http://127.0.0.1:9",
        ));
        let timing = RelayTiming {
            balance_poll_attempts: 3,
            balance_poll_interval: Duration::from_millis(1),
            receipt_poll_attempts: 3,
            receipt_poll_interval: Duration::from_millis(1),
        };
        let engine = RelayEngine::new(
            chain,
            Arc::new(gas_payer.clone()),
            GasPolicy::new(GasSettings::default()),
            timing,
            Some(oracle),
        );

        let outcome = engine
            .process(&funded_tenant(), "", &hex, "mint", 130_000)
            .await;
        assert!(outcome.success, "outcome: {outcome:?}");
        assert_eq!(gas_payer.fund_calls().len(), 1);
    }

    #[tokio::test]
    async fn malformed_hex_is_a_decode_error() {
        let chain = Arc::new(MockChain::with_balances(vec![NEEDED]));
        let engine = engine(chain.clone(), MockGasPayer::with_fee(0));

        let outcome = engine
            .process(&funded_tenant(), "", "0xzznothex", "mint", 130_000)
            .await;

        assert!(!outcome.success);
        assert!(outcome.error.as_deref().unwrap().contains("decode"));
        assert!(outcome.contract_address.is_none());
        assert_eq!(chain.balance_calls.load(Ordering::SeqCst), 0);
    }
}
