// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Gas Policy
//!
//! Per-operation gas limits, price ceilings and funding arithmetic.

pub mod policy;

pub use policy::{
    buffered_gas_limit, FundingDecision, GasPolicy, ValidationError, FALLBACK_FEE_PCT,
    OPERATION_GAS_BUFFER_PCT,
};
