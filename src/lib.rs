// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Gaslift - Gas-Sponsoring Transaction Relay
//!
//! This crate provides a multi-tenant relay service for EVM chains. End
//! users submit transactions they have already signed; the service checks
//! that the signer can pay for gas, tops up the balance through an on-chain
//! Gas Payer Contract when it cannot, and forwards the original signed
//! bytes to the chain untouched.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - API-key authentication gate
//! - `security` - Hot-reloadable API-key store and IP whitelisting
//! - `chain` - EVM JSON-RPC client, transaction decoder, Gas Payer adapter
//! - `gas` - Gas policy: ceilings, funding amounts
//! - `oracle` - Optional native-coin price oracle for log formatting
//! - `plugins` - Plugin registry for business operations
//! - `relay` - The relay engine (decode, validate, fund, forward)

pub mod api;
pub mod auth;
pub mod chain;
pub mod config;
pub mod error;
pub mod gas;
pub mod models;
pub mod oracle;
pub mod plugins;
pub mod relay;
pub mod security;
pub mod state;
