// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gas policy: ceilings and funding amounts.
//!
//! All fractional multipliers arrive as integer percent units (multiply,
//! then divide by 100), so wei-scale arithmetic never touches floats.
//!
//! Validation is split into a pure gas-limit check and network-price-
//! dependent checks, letting the engine reject oversized transactions
//! before any RPC round-trip.

use alloy::primitives::U256;

use crate::chain::DecodedTx;
use crate::config::GasSettings;

/// Buffer applied to an operation's declared gas limit: a declared budget
/// of 130,000 admits user limits up to 156,000.
pub const OPERATION_GAS_BUFFER_PCT: u64 = 120;

/// Fee fallback when the contract's `calculateFee` is unavailable.
pub const FALLBACK_FEE_PCT: u64 = 5;

/// A gas ceiling was violated. Each variant carries the offending and
/// permitted values so the error text is self-explanatory.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("operation {operation}: gas limit {actual} exceeds allowed maximum {ceiling}")]
    GasLimitTooHigh {
        operation: String,
        actual: u64,
        ceiling: u64,
    },

    #[error("gas price {actual} wei exceeds allowed maximum {ceiling} wei")]
    GasPriceTooHigh { actual: u128, ceiling: u128 },

    #[error("transaction cost {actual} wei exceeds allowed maximum {ceiling} wei")]
    TotalCostTooHigh { actual: U256, ceiling: u128 },
}

/// What the engine must do about funding, given the sender's balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundingDecision {
    /// Balance already covers the padded cost plus value.
    Skip,
    /// Transfer `deficit + fee` to the contract; the user receives
    /// `deficit`, the contract keeps `fee`.
    Transfer { deficit: U256, fee: U256 },
}

/// Per-request gas validation and funding arithmetic.
#[derive(Debug, Clone)]
pub struct GasPolicy {
    settings: GasSettings,
}

impl GasPolicy {
    pub fn new(settings: GasSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &GasSettings {
        &self.settings
    }

    /// Observed network gas price, floored by the configured minimum so
    /// ceilings stay meaningful on chains that report 0.
    pub fn effective_network_price(&self, observed: u128) -> u128 {
        observed.max(self.settings.minimum_gas_price_wei)
    }

    /// Check the user's gas limit against the operation budget (buffered by
    /// 20%) or, when no budget applies, the configured maximum. Pure.
    pub fn validate_gas_limit(
        &self,
        tx: &DecodedTx,
        operation: &str,
        expected_gas_limit: u64,
    ) -> Result<(), ValidationError> {
        let ceiling = if expected_gas_limit > 0 {
            buffered_gas_limit(expected_gas_limit)
        } else {
            self.settings.max_gas_limit
        };
        if tx.gas_limit > ceiling {
            return Err(ValidationError::GasLimitTooHigh {
                operation: operation.to_string(),
                actual: tx.gas_limit,
                ceiling,
            });
        }
        Ok(())
    }

    /// Check the user's gas price against the network-relative ceiling.
    pub fn validate_gas_price(
        &self,
        tx: &DecodedTx,
        network_gas_price: u128,
    ) -> Result<(), ValidationError> {
        let ceiling = self
            .effective_network_price(network_gas_price)
            .saturating_mul(u128::from(self.settings.max_gas_price_multiplier_pct))
            / 100;
        if tx.effective_gas_price > ceiling {
            return Err(ValidationError::GasPriceTooHigh {
                actual: tx.effective_gas_price,
                ceiling,
            });
        }
        Ok(())
    }

    /// Check total cost against the configured maximum. Only applies when
    /// no operation budget was declared.
    pub fn validate_total_cost(
        &self,
        tx: &DecodedTx,
        expected_gas_limit: u64,
    ) -> Result<(), ValidationError> {
        if expected_gas_limit > 0 {
            return Ok(());
        }
        let cost = base_cost(tx);
        if cost > U256::from(self.settings.max_total_cost_wei) {
            return Err(ValidationError::TotalCostTooHigh {
                actual: cost,
                ceiling: self.settings.max_total_cost_wei,
            });
        }
        Ok(())
    }

    /// All three checks in one call.
    pub fn validate(
        &self,
        tx: &DecodedTx,
        operation: &str,
        expected_gas_limit: u64,
        network_gas_price: u128,
    ) -> Result<(), ValidationError> {
        self.validate_gas_limit(tx, operation, expected_gas_limit)?;
        self.validate_gas_price(tx, network_gas_price)?;
        self.validate_total_cost(tx, expected_gas_limit)
    }

    /// The balance the sender must hold before forwarding: the gas cost
    /// padded by the configured multiplier, plus the transferred value.
    pub fn required_balance(&self, tx: &DecodedTx) -> U256 {
        let padded = base_cost(tx) * U256::from(self.settings.price_multiplier_pct)
            / U256::from(100u64);
        padded + tx.value
    }

    /// How much the sender is missing, or `None` when the balance already
    /// covers the requirement. Meeting the requirement exactly counts.
    pub fn deficit(&self, tx: &DecodedTx, balance: U256) -> Option<U256> {
        let needed = self.required_balance(tx);
        (balance < needed).then(|| needed - balance)
    }

    /// 5% fallback fee used when the contract's estimate is unavailable.
    pub fn fallback_fee(amount: U256) -> U256 {
        amount * U256::from(FALLBACK_FEE_PCT) / U256::from(100u64)
    }
}

/// `gas_limit * effective_gas_price`, widened to `U256`.
fn base_cost(tx: &DecodedTx) -> U256 {
    U256::from(tx.gas_limit) * U256::from(tx.effective_gas_price)
}

/// `expected * 120 / 100` in integer arithmetic.
pub fn buffered_gas_limit(expected: u64) -> u64 {
    (u128::from(expected) * u128::from(OPERATION_GAS_BUFFER_PCT) / 100) as u64
}
