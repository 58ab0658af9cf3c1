// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Serde model of the security config file.
//!
//! The file is camelCase JSON and may be edited out-of-band while the
//! service runs; the store reloads it on change. When the service itself
//! writes the file (first start), it is pretty-printed.

use serde::{Deserialize, Serialize};

/// Funding wallet bound to an API key.
///
/// Absence means the tenant cannot fund transactions; relays that need
/// funding are refused for such tenants.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletBinding {
    /// Hex-encoded private key (0x-prefixed, 64 hex chars).
    pub private_key: String,
    /// Optional expected address; informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

// Private keys must never reach logs, even through Debug formatting.
impl std::fmt::Debug for WalletBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletBinding")
            .field("private_key", &"<redacted>")
            .field("address", &self.address)
            .finish()
    }
}

/// One API key entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiKeyRecord {
    /// The key value clients present.
    pub key: String,
    /// Tenant name, used in logs and the tenant context.
    pub name: String,
    /// IP patterns allowed for this key: exact IPs, CIDR ranges, `*` globs,
    /// or hostnames. Empty means any IP.
    #[serde(default)]
    pub allowed_ips: Vec<String>,
    /// Disabled keys are not indexed and behave as unknown.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Per-tenant funding wallet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_config: Option<WalletBinding>,
}

/// Global security toggles.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySettings {
    #[serde(default = "default_true")]
    pub require_api_key: bool,
    #[serde(default = "default_true")]
    pub enforce_ip_whitelist: bool,
    #[serde(default = "default_true")]
    pub log_failed_attempts: bool,
    #[serde(default)]
    pub rate_limit_enabled: bool,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_requests_per_minute: u32,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            require_api_key: true,
            enforce_ip_whitelist: true,
            log_failed_attempts: true,
            rate_limit_enabled: false,
            rate_limit_requests_per_minute: default_rate_limit(),
        }
    }
}

/// Top-level file structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SecurityFile {
    #[serde(default)]
    pub api_keys: Vec<ApiKeyRecord>,
    /// IPs allowed regardless of which key is presented.
    #[serde(default)]
    pub global_ip_whitelist: Vec<String>,
    #[serde(default)]
    pub settings: SecuritySettings,
}

impl SecurityFile {
    /// The file written on first start when none exists: one example key
    /// restricted to loopback, no funding wallet.
    pub fn starter() -> Self {
        Self {
            api_keys: vec![ApiKeyRecord {
                key: "example-key-change-me".to_string(),
                name: "example".to_string(),
                allowed_ips: vec!["127.0.0.1".to_string(), "::1".to_string()],
                enabled: true,
                description: Some(
                    "Example key created on first start. Replace before use.".to_string(),
                ),
                wallet_config: None,
            }],
            global_ip_whitelist: vec!["127.0.0.1".to_string(), "::1".to_string()],
            settings: SecuritySettings::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_rate_limit() -> u32 {
    60
}
