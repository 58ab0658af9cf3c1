// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Chain Integration
//!
//! EVM-facing code: the JSON-RPC client, the signed-transaction decoder,
//! and the Gas Payer Contract adapter.

pub mod client;
pub mod decoder;
pub mod gas_payer;

pub use client::{ChainClient, ChainError, ChainRpc, ReceiptInfo};
pub use decoder::{decode_signed_tx, DecodeError, DecodedTx, DecodedTxType};
pub use gas_payer::{
    FundingReceipt, GasPayer, GasPayerContract, GasPayerError, GasPayerFactory, GasPayerOps,
};

use alloy::primitives::U256;

/// Format a wei amount as a native-coin decimal string (18 decimals,
/// truncated to 6 fractional digits).
pub fn format_native(amount: U256) -> String {
    format_units(amount, 18)
}

/// Format an integer amount with the given number of decimals.
pub fn format_units(amount: U256, decimals: u8) -> String {
    if amount.is_zero() {
        return "0".to_string();
    }

    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let whole = amount / divisor;
    let remainder = amount % divisor;

    if remainder.is_zero() {
        whole.to_string()
    } else {
        let decimal_str = format!("{:0>width$}", remainder, width = decimals as usize);
        let trimmed = decimal_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, &trimmed[..trimmed.len().min(6)])
        }
    }
}
