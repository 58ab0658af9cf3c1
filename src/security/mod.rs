// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Security Store
//!
//! Hot-reloadable API-key configuration: a JSON file on disk holds the
//! tenant keys, their IP whitelists and their funding wallets. The store
//! publishes immutable snapshots; a watcher task reloads the file when it
//! changes, so keys can be rotated without restarting the service.

pub mod ip;
pub mod model;
pub mod store;

pub use ip::IpPattern;
pub use model::{ApiKeyRecord, SecurityFile, SecuritySettings, WalletBinding};
pub use store::{ApiKeyEntry, SecurityError, SecuritySnapshot, SecurityStore};
