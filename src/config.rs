// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment once at startup into a
//! typed [`RelayConfig`]. Fractional multipliers are converted to integer
//! percent units at load time so all downstream arithmetic stays in
//! integers at wei scale.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `RPC_URL` | EVM JSON-RPC endpoint | Required |
//! | `CHAIN_ID` | Chain id override | Derived from RPC |
//! | `GAS_PAYER_CONTRACT_ADDRESS` | Gas Payer Contract address | Required |
//! | `GAS_PRICE_MULTIPLIER` | Funding cost padding | `1.20` |
//! | `GAS_MINIMUM_GAS_PRICE_WEI` | Network gas price floor | `6` |
//! | `GAS_MAX_TOTAL_COST_WEI` | Per-tx cost ceiling | `540000000` |
//! | `GAS_MAX_GAS_LIMIT` | Gas limit ceiling | `1000000` |
//! | `GAS_MAX_GAS_PRICE_MULTIPLIER` | Gas price ceiling multiplier | `3.0` |
//! | `SECURITY_CONFIG_PATH` | API-key store file | `./config/security-config.json` |
//! | `SECURITY_ENABLED` | Auth gate master switch | `true` |
//! | `PRICE_ORACLE_ENABLED` | USD price oracle switch | `true` |
//! | `PRICE_CACHE_TTL_SECS` | Oracle cache TTL | `300` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use alloy::primitives::Address;

/// Default path of the hot-reloadable security config file.
pub const DEFAULT_SECURITY_CONFIG_PATH: &str = "./config/security-config.json";

/// Errors raised while loading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Gas policy settings, in integer units.
///
/// Multipliers are percent values: `1.20` in the environment becomes `120`
/// here, and consumers multiply then divide by 100.
#[derive(Debug, Clone)]
pub struct GasSettings {
    /// Padding applied to the user's gas cost when computing the funding
    /// amount, in percent (default 120 = 1.20x).
    pub price_multiplier_pct: u64,
    /// Floor for the observed network gas price, in wei.
    pub minimum_gas_price_wei: u128,
    /// Maximum `gas_limit * gas_price` accepted when no operation budget
    /// applies, in wei.
    pub max_total_cost_wei: u128,
    /// Maximum gas limit accepted when no operation budget applies.
    pub max_gas_limit: u64,
    /// Ceiling on the user's gas price relative to the network price, in
    /// percent (default 300 = 3.0x).
    pub max_gas_price_multiplier_pct: u64,
}

impl Default for GasSettings {
    fn default() -> Self {
        Self {
            price_multiplier_pct: 120,
            minimum_gas_price_wei: 6,
            max_total_cost_wei: 540_000_000,
            max_gas_limit: 1_000_000,
            max_gas_price_multiplier_pct: 300,
        }
    }
}

/// Security subsystem settings.
#[derive(Debug, Clone)]
pub struct SecuritySetup {
    /// Path of the JSON key store watched for changes.
    pub config_path: PathBuf,
    /// Master switch: when false the auth gate passes every request.
    pub enabled: bool,
}

/// Price oracle settings.
#[derive(Debug, Clone)]
pub struct OracleSetup {
    pub enabled: bool,
    /// How long a fetched spot price stays fresh.
    pub cache_ttl: Duration,
}

/// Top-level service configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub rpc_url: String,
    /// Chain id override; when `None` it is derived from the RPC at startup.
    pub chain_id: Option<u64>,
    pub gas_payer_contract_address: Address,
    pub gas: GasSettings,
    pub security: SecuritySetup,
    pub oracle: OracleSetup,
    pub host: String,
    pub port: u16,
}

impl RelayConfig {
    /// Load the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let rpc_url = env::var("RPC_URL").map_err(|_| ConfigError::Missing("RPC_URL"))?;

        let chain_id = match env::var("CHAIN_ID") {
            Ok(raw) => Some(parse_var::<u64>("CHAIN_ID", &raw)?),
            Err(_) => None,
        };

        let raw_address = env::var("GAS_PAYER_CONTRACT_ADDRESS")
            .map_err(|_| ConfigError::Missing("GAS_PAYER_CONTRACT_ADDRESS"))?;
        let gas_payer_contract_address =
            Address::from_str(&raw_address).map_err(|e| ConfigError::Invalid {
                name: "GAS_PAYER_CONTRACT_ADDRESS",
                reason: e.to_string(),
            })?;

        let gas = GasSettings {
            price_multiplier_pct: multiplier_pct("GAS_PRICE_MULTIPLIER", 120)?,
            minimum_gas_price_wei: optional_var("GAS_MINIMUM_GAS_PRICE_WEI", 6u128)?,
            max_total_cost_wei: optional_var("GAS_MAX_TOTAL_COST_WEI", 540_000_000u128)?,
            max_gas_limit: optional_var("GAS_MAX_GAS_LIMIT", 1_000_000u64)?,
            max_gas_price_multiplier_pct: multiplier_pct("GAS_MAX_GAS_PRICE_MULTIPLIER", 300)?,
        };

        let security = SecuritySetup {
            config_path: PathBuf::from(
                env::var("SECURITY_CONFIG_PATH")
                    .unwrap_or_else(|_| DEFAULT_SECURITY_CONFIG_PATH.to_string()),
            ),
            enabled: bool_var("SECURITY_ENABLED", true)?,
        };

        let oracle = OracleSetup {
            enabled: bool_var("PRICE_ORACLE_ENABLED", true)?,
            cache_ttl: Duration::from_secs(optional_var("PRICE_CACHE_TTL_SECS", 300u64)?),
        };

        Ok(Self {
            rpc_url,
            chain_id,
            gas_payer_contract_address,
            gas,
            security,
            oracle,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: optional_var("PORT", 8080u16)?,
        })
    }
}

fn parse_var<T: FromStr>(name: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        reason: e.to_string(),
    })
}

fn optional_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => parse_var(name, &raw),
        Err(_) => Ok(default),
    }
}

fn bool_var(name: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(name) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::Invalid {
                name,
                reason: format!("expected boolean, got {other:?}"),
            }),
        },
        Err(_) => Ok(default),
    }
}

/// Parse a fractional multiplier env var into percent units.
///
/// `1.20` becomes `120`; the conversion rounds to the nearest percent so
/// wei-scale arithmetic never touches floats.
fn multiplier_pct(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    let raw = match env::var(name) {
        Ok(raw) => raw,
        Err(_) => return Ok(default),
    };
    let value: f64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
        name,
        reason: format!("expected a decimal multiplier, got {raw:?}"),
    })?;
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("multiplier must be positive, got {raw}"),
        });
    }
    Ok((value * 100.0).round() as u64)
}
