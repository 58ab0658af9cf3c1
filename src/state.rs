// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Application State
//!
//! Shared state passed to all Axum request handlers via the `State`
//! extractor. `AppState` is `Clone` and `Send + Sync`; everything heavy is
//! behind an `Arc`.

use std::sync::Arc;

use crate::chain::ChainRpc;
use crate::config::RelayConfig;
use crate::plugins::PluginRegistry;
use crate::relay::RelayEngine;
use crate::security::SecurityStore;

/// Shared application state for all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    /// Chain id the service runs against, resolved at startup.
    pub chain_id: u64,
    pub chain: Arc<dyn ChainRpc>,
    pub security: Arc<SecurityStore>,
    /// Populated once at startup; immutable afterwards.
    pub registry: Arc<PluginRegistry>,
    pub engine: Arc<RelayEngine>,
}

impl AppState {
    pub fn new(
        config: Arc<RelayConfig>,
        chain_id: u64,
        chain: Arc<dyn ChainRpc>,
        security: Arc<SecurityStore>,
        registry: Arc<PluginRegistry>,
        engine: Arc<RelayEngine>,
    ) -> Self {
        Self {
            config,
            chain_id,
            chain,
            security,
            registry,
            engine,
        }
    }
}
