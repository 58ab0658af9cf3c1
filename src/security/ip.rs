// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! IP whitelist pattern matching.
//!
//! Four pattern kinds are supported, decided once when a pattern string is
//! compiled at snapshot build time:
//!
//! 1. exact IP equality (`192.168.1.7`, `::1`)
//! 2. CIDR ranges (`10.0.0.0/8`, `fd00::/8`)
//! 3. `*` wildcard globs over the textual IP (`192.168.1.*`)
//! 4. hostnames, resolved via DNS at match time (`relay.example.com`)
//!
//! Exact, CIDR and glob matching are pure; only the hostname branch
//! performs I/O. DNS failures are treated as "no match" and logged at
//! debug level.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// A compiled whitelist pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IpPattern {
    Exact(IpAddr),
    Cidr { network: IpAddr, prefix_len: u8 },
    Glob(WildcardPattern),
    Hostname(String),
}

impl IpPattern {
    /// Compile a pattern string. Never fails: anything that is not an IP,
    /// a CIDR range, or a glob is treated as a hostname.
    pub fn compile(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(ip) = raw.parse::<IpAddr>() {
            return IpPattern::Exact(ip);
        }
        if let Some(cidr) = parse_cidr(raw) {
            return cidr;
        }
        if raw.contains('*') {
            return IpPattern::Glob(WildcardPattern::compile(raw));
        }
        IpPattern::Hostname(raw.to_string())
    }

    /// Whether the client IP matches this pattern.
    ///
    /// `ip_text` is the raw textual form the client IP was extracted as;
    /// globs run against it so `192.168.1.*` behaves as written.
    pub async fn matches(&self, ip: IpAddr, ip_text: &str) -> bool {
        match self {
            IpPattern::Exact(expected) => *expected == ip,
            IpPattern::Cidr {
                network,
                prefix_len,
            } => cidr_contains(*network, *prefix_len, ip),
            IpPattern::Glob(pattern) => pattern.matches(ip_text),
            IpPattern::Hostname(host) => resolve_matches(host, ip).await,
        }
    }

}

/// Resolve a hostname and check whether any address equals the client IP.
/// Multiple resolutions are permissive: any match counts.
async fn resolve_matches(host: &str, ip: IpAddr) -> bool {
    match tokio::net::lookup_host((host, 0)).await {
        Ok(addrs) => addrs.map(|a| a.ip()).any(|resolved| resolved == ip),
        Err(e) => {
            tracing::debug!(host = %host, error = %e, "hostname whitelist entry did not resolve");
            false
        }
    }
}

fn parse_cidr(raw: &str) -> Option<IpPattern> {
    let (addr, len) = raw.split_once('/')?;
    let network: IpAddr = addr.trim().parse().ok()?;
    let prefix_len: u8 = len.trim().parse().ok()?;
    let max = match network {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };
    if prefix_len > max {
        return None;
    }
    Some(IpPattern::Cidr {
        network,
        prefix_len,
    })
}

fn cidr_contains(network: IpAddr, prefix_len: u8, ip: IpAddr) -> bool {
    match (network, ip) {
        (IpAddr::V4(net), IpAddr::V4(ip)) => v4_prefix(net, prefix_len) == v4_prefix(ip, prefix_len),
        (IpAddr::V6(net), IpAddr::V6(ip)) => v6_prefix(net, prefix_len) == v6_prefix(ip, prefix_len),
        // Mixed families never match.
        _ => false,
    }
}

fn v4_prefix(addr: Ipv4Addr, prefix_len: u8) -> u32 {
    let bits = u32::from(addr);
    if prefix_len == 0 {
        return 0;
    }
    bits >> (32 - u32::from(prefix_len)) << (32 - u32::from(prefix_len))
}

fn v6_prefix(addr: Ipv6Addr, prefix_len: u8) -> u128 {
    let bits = u128::from(addr);
    if prefix_len == 0 {
        return 0;
    }
    bits >> (128 - u32::from(prefix_len)) << (128 - u32::from(prefix_len))
}

/// A `*`-wildcard pattern compiled into literal segments.
///
/// Matching checks that the segments appear in order, with the first
/// anchored at the start and the last at the end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardPattern {
    segments: Vec<String>,
    anchored_start: bool,
    anchored_end: bool,
}

impl WildcardPattern {
    pub fn compile(raw: &str) -> Self {
        Self {
            segments: raw
                .split('*')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            anchored_start: !raw.starts_with('*'),
            anchored_end: !raw.ends_with('*'),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        if self.segments.is_empty() {
            // Pattern was all wildcards.
            return true;
        }

        let mut rest = text;
        let mut segments: &[String] = &self.segments;

        if self.anchored_start {
            match rest.strip_prefix(segments[0].as_str()) {
                Some(after) => rest = after,
                None => return false,
            }
            segments = &segments[1..];
        }

        if self.anchored_end {
            let Some(last) = segments.last() else {
                // Single segment, both anchors: nothing may remain.
                return rest.is_empty();
            };
            match rest.strip_suffix(last.as_str()) {
                Some(before) => rest = before,
                None => return false,
            }
            segments = &segments[..segments.len() - 1];
        }

        for segment in segments {
            match rest.find(segment.as_str()) {
                Some(pos) => rest = &rest[pos + segment.len()..],
                None => return false,
            }
        }
        true
    }
}
