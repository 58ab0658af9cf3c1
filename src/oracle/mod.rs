// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Price Oracle
//!
//! Optional native-coin → USD spot prices, used only to make funding
//! amounts readable in logs. Prices are fetched from a CoinGecko-style
//! `simple/price` endpoint and cached with a TTL. Every failure path
//! degrades to `None` and the caller renders plain wei; nothing on the
//! relay hot path ever blocks on this module's errors.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use alloy::primitives::U256;
use lru::LruCache;

use crate::chain::format_native;

const DEFAULT_API_BASE_URL: &str = "https://api.coingecko.com";

/// Request timeout; the oracle must never stall a relay noticeably.
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

const CACHE_CAPACITY: usize = 8;

/// Native coin of a supported chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeAsset {
    pub symbol: &'static str,
    /// CoinGecko coin id.
    pub coin_id: &'static str,
}

/// Map a chain id to its native asset. Unknown chains get no quotes.
pub fn native_asset(chain_id: u64) -> Option<NativeAsset> {
    let asset = match chain_id {
        // Ethereum mainnet and common L2s settle in ETH.
        1 | 8453 | 42161 | 10 | 11155111 | 84532 => NativeAsset {
            symbol: "ETH",
            coin_id: "ethereum",
        },
        137 | 80002 => NativeAsset {
            symbol: "POL",
            coin_id: "polygon-ecosystem-token",
        },
        56 | 97 => NativeAsset {
            symbol: "BNB",
            coin_id: "binancecoin",
        },
        43114 | 43113 => NativeAsset {
            symbol: "AVAX",
            coin_id: "avalanche-2",
        },
        250 => NativeAsset {
            symbol: "FTM",
            coin_id: "fantom",
        },
        _ => return None,
    };
    Some(asset)
}

/// A formatted price quote for a wei amount.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceQuote {
    pub symbol: String,
    /// Amount in native-coin units, e.g. `"0.003"`.
    pub native: String,
    /// Amount in USD, e.g. `"7.52"`.
    pub usd: String,
}

struct CachedPrice {
    usd: f64,
    fetched_at: Instant,
}

/// Cached spot-price client.
pub struct PriceOracle {
    http: reqwest::Client,
    base_url: String,
    asset: Option<NativeAsset>,
    cache: Mutex<LruCache<String, CachedPrice>>,
    ttl: Duration,
}

impl PriceOracle {
    pub fn new(chain_id: u64, ttl: Duration) -> Self {
        Self::with_base_url(chain_id, ttl, DEFAULT_API_BASE_URL)
    }

    pub fn with_base_url(chain_id: u64, ttl: Duration, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
            asset: native_asset(chain_id),
            cache: Mutex::new(LruCache::new(
                NonZeroUsize::new(CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    /// Quote a wei amount in native units and USD. `None` on any failure:
    /// unknown chain, network error, or malformed response.
    pub async fn quote(&self, wei: U256) -> Option<PriceQuote> {
        let asset = self.asset?;
        let usd_per_coin = self.usd_price(asset).await?;

        let native = wei_to_f64(wei) / 1e18;
        Some(PriceQuote {
            symbol: asset.symbol.to_string(),
            native: format_native(wei),
            usd: format!("{:.2}", native * usd_per_coin),
        })
    }

    /// Render a wei amount for logging: `"3000000000000000 wei (~0.003 ETH / $7.52)"`
    /// when a quote is available, plain `"3000000000000000 wei"` otherwise.
    pub async fn describe(&self, wei: U256) -> String {
        match self.quote(wei).await {
            Some(q) => format!("{wei} wei (~{} {} / ${})", q.native, q.symbol, q.usd),
            None => format!("{wei} wei"),
        }
    }

    async fn usd_price(&self, asset: NativeAsset) -> Option<f64> {
        let cache_key = format!("{}:usd", asset.symbol);

        if let Ok(mut cache) = self.cache.lock() {
            if let Some(entry) = cache.get(&cache_key) {
                if entry.fetched_at.elapsed() < self.ttl {
                    return Some(entry.usd);
                }
                cache.pop(&cache_key);
            }
        }

        let usd = self.fetch_usd_price(asset.coin_id).await?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(
                cache_key,
                CachedPrice {
                    usd,
                    fetched_at: Instant::now(),
                },
            );
        }
        Some(usd)
    }

    async fn fetch_usd_price(&self, coin_id: &str) -> Option<f64> {
        let url = format!(
            "{}/api/v3/simple/price?ids={coin_id}&vs_currencies=usd",
            self.base_url
        );
        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(error = %e, coin_id, "price fetch failed");
                return None;
            }
        };
        let body: serde_json::Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, coin_id, "price response was not JSON");
                return None;
            }
        };
        body.get(coin_id)?.get("usd")?.as_f64()
    }

    #[cfg(test)]
    fn prime_cache(&self, symbol: &str, usd: f64) {
        self.cache.lock().unwrap().put(
            format!("{symbol}:usd"),
            CachedPrice {
                usd,
                fetched_at: Instant::now(),
            },
        );
    }
}

/// Lossy conversion for display math only; never used for wei arithmetic.
fn wei_to_f64(wei: U256) -> f64 {
    wei.to_string().parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_chains_map_to_assets() {
        assert_eq!(native_asset(1).unwrap().symbol, "ETH");
        assert_eq!(native_asset(43114).unwrap().symbol, "AVAX");
        assert_eq!(native_asset(137).unwrap().symbol, "POL");
        assert!(native_asset(999_999).is_none());
    }

    #[tokio::test]
    async fn unknown_chain_renders_plain_wei() {
        let oracle = PriceOracle::new(999_999, Duration::from_secs(300));
        let text = oracle.describe(U256::from(1_234u64)).await;
        assert_eq!(text, "1234 wei");
    }

    #[tokio::test]
    async fn unreachable_endpoint_renders_plain_wei() {
        // Nothing listens on this port; every fetch fails fast.
        let oracle =
            PriceOracle::with_base_url(1, Duration::from_secs(300), "http://127.0.0.1:9");
        let text = oracle.describe(U256::from(5_000u64)).await;
        assert_eq!(text, "5000 wei");
        assert!(oracle.quote(U256::from(5_000u64)).await.is_none());
    }

    #[tokio::test]
    async fn cached_price_is_used_for_quotes() {
        let oracle =
            PriceOracle::with_base_url(1, Duration::from_secs(300), "http://127.0.0.1:9");
        oracle.prime_cache("ETH", 2_500.0);

        let wei = U256::from(3_000_000_000_000_000u64); // 0.003 ETH
        let quote = oracle.quote(wei).await.unwrap();
        assert_eq!(quote.symbol, "ETH");
        assert_eq!(quote.native, "0.003");
        assert_eq!(quote.usd, "7.50");

        let text = oracle.describe(wei).await;
        assert_eq!(text, "3000000000000000 wei (~0.003 ETH / $7.50)");
    }

    #[tokio::test]
    async fn expired_cache_entry_is_refetched() {
        let oracle =
            PriceOracle::with_base_url(1, Duration::from_millis(1), "http://127.0.0.1:9");
        oracle.prime_cache("ETH", 2_500.0);
        tokio::time::sleep(Duration::from_millis(5)).await;

        // Entry expired and the refetch fails, so no quote.
        assert!(oracle.quote(U256::from(1u64)).await.is_none());
    }
}
