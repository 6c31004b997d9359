//! Controller and storage configuration
//!
//! Both structs load from environment variables with the `TENDERING_` prefix.
//! Values that are missing or fail to parse fall back to the defaults.

use std::env;
use std::path::PathBuf;

/// What an edit does when a snapshot already exists at the record's current version.
///
/// This happens after a rollback: the restored version was snapshotted by the
/// edit that originally moved past it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Keep the existing snapshot and carry on with the edit.
    #[default]
    Skip,
    /// Fail the edit with `VersionConflict`.
    Reject,
}

impl CollisionPolicy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "skip" => Some(Self::Skip),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Compare-and-swap attempts before giving up with `VersionConflict`.
    pub max_retries: u32,
    /// Enforce the forward status lifecycle instead of plain membership.
    pub strict_transitions: bool,
    pub on_snapshot_collision: CollisionPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            max_retries: 8,
            strict_transitions: false,
            on_snapshot_collision: CollisionPolicy::Skip,
        }
    }
}

impl ControllerConfig {
    /// Environment variables:
    /// - TENDERING_MAX_RETRIES
    /// - TENDERING_STRICT_TRANSITIONS (true/false)
    /// - TENDERING_SNAPSHOT_COLLISION (skip/reject)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            max_retries: env::var("TENDERING_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_retries),
            strict_transitions: env::var("TENDERING_STRICT_TRANSITIONS")
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(defaults.strict_transitions),
            on_snapshot_collision: env::var("TENDERING_SNAPSHOT_COLLISION")
                .ok()
                .and_then(|s| CollisionPolicy::from_str(&s))
                .unwrap_or(defaults.on_snapshot_collision),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    pub fn with_strict_transitions(mut self, strict: bool) -> Self {
        self.strict_transitions = strict;
        self
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.on_snapshot_collision = policy;
        self
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: PathBuf,
    /// Delete the database when the last handle drops.
    pub temporary: bool,
    /// Background flush interval; `None` flushes only on explicit request.
    pub flush_every_ms: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/tendering"),
            temporary: false,
            flush_every_ms: Some(500),
        }
    }
}

impl StoreConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Environment variables:
    /// - TENDERING_DB_PATH
    /// - TENDERING_DB_TEMPORARY (true/false)
    /// - TENDERING_FLUSH_EVERY_MS (0 disables background flushing)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            path: env::var("TENDERING_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.path),
            temporary: env::var("TENDERING_DB_TEMPORARY")
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(defaults.temporary),
            flush_every_ms: match env::var("TENDERING_FLUSH_EVERY_MS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
            {
                Some(0) => None,
                Some(ms) => Some(ms),
                None => defaults.flush_every_ms,
            },
        }
    }

    pub fn open(&self) -> sled::Result<sled::Db> {
        sled::Config::new()
            .path(&self.path)
            .temporary(self.temporary)
            .flush_every_ms(self.flush_every_ms)
            .open()
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
