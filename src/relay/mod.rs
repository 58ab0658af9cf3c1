// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Relay Engine
//!
//! The transaction-processing pipeline: decode, validate, fund when the
//! signer cannot pay for gas, forward the original bytes, await the
//! receipt.

pub mod engine;

pub use engine::{RelayEngine, RelayError, RelayOutcome, RelayTiming};
