// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Hot-reloadable API-key store.
//!
//! The store reads the security config file at startup (writing a starter
//! file when none exists) and publishes an immutable [`SecuritySnapshot`].
//! A background watcher task polls the file's modification time and swaps
//! in a freshly parsed snapshot on change. Readers clone the snapshot
//! `Arc` under a momentary lock and never observe a torn state: a request
//! either sees the old snapshot or the new one, wholesale.

use std::collections::HashMap;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::ip::IpPattern;
use super::model::{ApiKeyRecord, SecurityFile, SecuritySettings};

/// How often the watcher checks the file's modification time.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Grace period after a change is observed, absorbing partial writes.
const DEBOUNCE: Duration = Duration::from_millis(100);

#[derive(Debug, thiserror::Error)]
pub enum SecurityError {
    #[error("failed to read security config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse security config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// An indexed API key with its pre-compiled IP patterns.
#[derive(Debug)]
pub struct ApiKeyEntry {
    pub record: ApiKeyRecord,
    pub patterns: Vec<IpPattern>,
}

/// Immutable view of the security configuration at one point in time.
#[derive(Debug)]
pub struct SecuritySnapshot {
    pub settings: SecuritySettings,
    global_patterns: Vec<IpPattern>,
    /// Only enabled records are indexed; a disabled key behaves as unknown.
    keys: HashMap<String, Arc<ApiKeyEntry>>,
    pub loaded_at: DateTime<Utc>,
}

impl SecuritySnapshot {
    fn build(file: SecurityFile) -> Self {
        let global_patterns = file
            .global_ip_whitelist
            .iter()
            .map(|p| IpPattern::compile(p))
            .collect();

        let mut keys = HashMap::new();
        for record in file.api_keys {
            if !record.enabled {
                continue;
            }
            let patterns = record
                .allowed_ips
                .iter()
                .map(|p| IpPattern::compile(p))
                .collect();
            keys.insert(
                record.key.clone(),
                Arc::new(ApiKeyEntry { record, patterns }),
            );
        }

        Self {
            settings: file.settings,
            global_patterns,
            keys,
            loaded_at: Utc::now(),
        }
    }

    /// Look up an enabled API key.
    pub fn lookup(&self, key: &str) -> Option<Arc<ApiKeyEntry>> {
        self.keys.get(key).cloned()
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Whether `ip` is acceptable for the given key entry.
    ///
    /// True when the IP is globally whitelisted, when the entry declares no
    /// restrictions, or when any of the entry's patterns matches.
    pub async fn is_ip_allowed(&self, ip_text: &str, entry: Option<&ApiKeyEntry>) -> bool {
        let Ok(ip) = ip_text.parse::<IpAddr>() else {
            // Unparseable peer addresses only pass for unrestricted keys.
            return entry.map(|e| e.patterns.is_empty()).unwrap_or(false);
        };

        for pattern in &self.global_patterns {
            if pattern.matches(ip, ip_text).await {
                return true;
            }
        }

        let Some(entry) = entry else {
            return false;
        };
        if entry.patterns.is_empty() {
            return true;
        }
        for pattern in &entry.patterns {
            if pattern.matches(ip, ip_text).await {
                return true;
            }
        }
        false
    }
}

/// The store owning the published snapshot and the config file path.
pub struct SecurityStore {
    path: PathBuf,
    snapshot: RwLock<Arc<SecuritySnapshot>>,
    poll_interval: Duration,
}

impl SecurityStore {
    /// Open the store: load the file, or create the starter file if the
    /// path does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SecurityError> {
        let path = path.into();
        let file = load_or_create(&path)?;
        let snapshot = SecuritySnapshot::build(file);
        info!(
            path = %path.display(),
            keys = snapshot.key_count(),
            "security config loaded"
        );
        Ok(Self {
            path,
            snapshot: RwLock::new(Arc::new(snapshot)),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    #[cfg(test)]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The currently published snapshot.
    ///
    /// The read lock is held only for the duration of the `Arc` clone;
    /// callers keep the snapshot for as long as the request needs it.
    pub fn snapshot(&self) -> Arc<SecuritySnapshot> {
        self.snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Re-read the file and publish a new snapshot.
    ///
    /// On failure the previous snapshot stays in place.
    pub fn reload(&self) -> Result<(), SecurityError> {
        let file = parse_file(&self.path)?;
        let snapshot = Arc::new(SecuritySnapshot::build(file));
        let keys = snapshot.key_count();
        *self
            .snapshot
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = snapshot;
        info!(path = %self.path.display(), keys, "security config reloaded");
        Ok(())
    }

    /// Run the file watcher until the cancellation token is triggered.
    ///
    /// Should be spawned as a background task:
    /// ```rust,ignore
    /// tokio::spawn(store.clone().watch(shutdown.clone()));
    /// ```
    pub async fn watch(self: Arc<Self>, shutdown: CancellationToken) {
        info!(path = %self.path.display(), "security config watcher starting");
        let mut last_seen = modified_at(&self.path);

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = shutdown.cancelled() => {
                    info!("security config watcher shutting down");
                    return;
                }
            }

            let current = modified_at(&self.path);
            if current == last_seen {
                continue;
            }

            // Let in-progress writes finish before parsing.
            tokio::time::sleep(DEBOUNCE).await;
            last_seen = modified_at(&self.path);

            if let Err(e) = self.reload() {
                warn!(error = %e, "security config reload failed, keeping previous snapshot");
            }
        }
    }
}

fn modified_at(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn parse_file(path: &Path) -> Result<SecurityFile, SecurityError> {
    let raw = fs::read_to_string(path).map_err(|source| SecurityError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| SecurityError::Parse {
        path: path.display().to_string(),
        source,
    })
}

fn load_or_create(path: &Path) -> Result<SecurityFile, SecurityError> {
    if path.exists() {
        return parse_file(path);
    }

    let starter = SecurityFile::starter();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| SecurityError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
    }
    let pretty = serde_json::to_string_pretty(&starter).expect("starter config serializes");
    fs::write(path, pretty).map_err(|source| SecurityError::Io {
        path: path.display().to_string(),
        source,
    })?;
    warn!(
        path = %path.display(),
        "security config missing, wrote starter file with an example key"
    );
    Ok(starter)
}
