// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Plugin Registry
//!
//! Business operations plug into the relay through [`RelayPlugin`]: each
//! plugin declares a name, an API prefix, OpenAPI tags and the gas budgets
//! of its operations, and contributes its own routes. Plugins are
//! registered explicitly at startup (constructor injection, no runtime
//! discovery); initialization runs once in registration order and any
//! failure aborts startup.

pub mod transfer;

use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use serde::Serialize;
use utoipa::ToSchema;

use crate::relay::RelayEngine;
use crate::state::AppState;

pub use transfer::TransferPlugin;

/// A business operation with its declared gas budget.
///
/// `gas_limit` is the *expected* value; the gas policy admits user limits
/// up to 20% above it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct GasOperation {
    pub name: String,
    pub gas_limit: u64,
    /// Solidity-style signature of the underlying call, for documentation.
    pub function_tag: String,
}

impl GasOperation {
    pub fn new(name: &str, gas_limit: u64, function_tag: &str) -> Self {
        Self {
            name: name.to_string(),
            gas_limit,
            function_tag: function_tag.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("plugin {plugin}: operation {operation} is already declared by {existing}")]
    DuplicateOperation {
        plugin: String,
        operation: String,
        existing: String,
    },

    #[error("plugin {plugin} initialization failed: {reason}")]
    Init { plugin: String, reason: String },
}

/// A pluggable business module.
pub trait RelayPlugin: Send + Sync {
    fn name(&self) -> &str;

    /// URL prefix its routes are nested under, e.g. `/api/transfer`.
    fn api_prefix(&self) -> &str;

    /// OpenAPI tags contributed to the service document.
    fn openapi_tags(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Operations with their declared gas budgets.
    fn gas_operations(&self) -> Vec<GasOperation>;

    /// One-time setup, run in registration order at startup.
    fn initialize(&self, engine: &Arc<RelayEngine>) -> Result<(), PluginError> {
        let _ = engine;
        Ok(())
    }

    /// Routes nested under [`api_prefix`](Self::api_prefix).
    fn routes(&self) -> Router<AppState>;
}

/// Registry of all plugins, populated once at startup and immutable after.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<Arc<dyn RelayPlugin>>,
    /// Declaration-ordered operations across all plugins.
    operations: Vec<GasOperation>,
    /// operation name -> (index into `operations`, owning plugin name)
    by_name: HashMap<String, (usize, String)>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin. Fails when one of its operation names is already
    /// taken by an earlier plugin.
    pub fn register(&mut self, plugin: Arc<dyn RelayPlugin>) -> Result<(), PluginError> {
        for op in plugin.gas_operations() {
            if let Some((_, existing)) = self.by_name.get(&op.name) {
                return Err(PluginError::DuplicateOperation {
                    plugin: plugin.name().to_string(),
                    operation: op.name.clone(),
                    existing: existing.clone(),
                });
            }
            self.by_name.insert(
                op.name.clone(),
                (self.operations.len(), plugin.name().to_string()),
            );
            self.operations.push(op);
        }
        tracing::info!(plugin = plugin.name(), prefix = plugin.api_prefix(), "plugin registered");
        self.plugins.push(plugin);
        Ok(())
    }

    /// Initialize every plugin in registration order; the first failure
    /// aborts startup.
    pub fn initialize_all(&self, engine: &Arc<RelayEngine>) -> Result<(), PluginError> {
        for plugin in &self.plugins {
            plugin.initialize(engine)?;
            tracing::info!(plugin = plugin.name(), "plugin initialized");
        }
        Ok(())
    }

    /// Names of the registered plugins, in order.
    pub fn active_plugins(&self) -> Vec<String> {
        self.plugins.iter().map(|p| p.name().to_string()).collect()
    }

    /// All declared operations, in declaration order.
    pub fn all_gas_operations(&self) -> &[GasOperation] {
        &self.operations
    }

    /// Look up one operation's budget by name.
    pub fn find_operation(&self, name: &str) -> Option<&GasOperation> {
        self.by_name
            .get(name)
            .map(|(index, _)| &self.operations[*index])
    }

    pub fn plugins(&self) -> &[Arc<dyn RelayPlugin>] {
        &self.plugins
    }

    /// OpenAPI tags contributed by all plugins.
    pub fn openapi_tags(&self) -> Vec<String> {
        self.plugins
            .iter()
            .flat_map(|p| p.openapi_tags())
            .map(str::to_string)
            .collect()
    }
}
