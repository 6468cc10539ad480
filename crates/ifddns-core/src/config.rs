//! Configuration types for the DDNS notifier
//!
//! This module defines the configuration structures threaded through the
//! daemon, the updater and the engine. There is no process-wide mutable
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default interval between interface checks
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Shortest poll interval accepted
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Provider used when looking up the keyfile
pub const DEFAULT_PROVIDER: &str = "namecheap";

/// Main notifier configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Network interface to watch (e.g., "eth0")
    pub interface: String,

    /// Fully-qualified domain name to keep in sync
    pub fqdn: String,

    /// Path to the keyfile holding the provider secret
    pub keyfile: PathBuf,

    /// Provider name used for the keyfile lookup and the registry
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Interval between interface checks
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Update once and exit instead of polling
    #[serde(default)]
    pub oneshot: bool,

    /// Log the would-be request instead of sending it
    #[serde(default)]
    pub dry_run: bool,
}

impl DdnsConfig {
    /// Create a configuration with defaults for everything but the positionals
    pub fn new(
        interface: impl Into<String>,
        fqdn: impl Into<String>,
        keyfile: impl Into<PathBuf>,
    ) -> Self {
        Self {
            interface: interface.into(),
            fqdn: fqdn.into(),
            keyfile: keyfile.into(),
            provider: default_provider(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            oneshot: false,
            dry_run: false,
        }
    }

    /// Options handed to the updater factory
    pub fn updater_options(&self) -> UpdaterOptions {
        UpdaterOptions {
            dry_run: self.dry_run,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interface.trim().is_empty() {
            return Err(crate::Error::config("interface name cannot be empty"));
        }

        if self.provider.is_empty() {
            return Err(crate::Error::config("provider name cannot be empty"));
        }

        if self.keyfile.as_os_str().is_empty() {
            return Err(crate::Error::config("keyfile path cannot be empty"));
        }

        if self.poll_interval < MIN_POLL_INTERVAL {
            return Err(crate::Error::config(format!(
                "poll interval must be at least {:?}, got {:?}",
                MIN_POLL_INTERVAL, self.poll_interval
            )));
        }

        validate_fqdn(&self.fqdn)
    }
}

/// Options that shape how an updater talks to its provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdaterOptions {
    /// Build and log the request, but perform no network I/O
    #[serde(default)]
    pub dry_run: bool,
}

impl UpdaterOptions {
    /// Options for live updates
    pub fn live() -> Self {
        Self { dry_run: false }
    }

    /// Options for dry-run updates
    pub fn dry_run() -> Self {
        Self { dry_run: true }
    }
}

/// Validate that a string can be split into host and zone
///
/// The only requirement is a dot. Everything before the first dot is the
/// host, which may be `@` for the apex or `*` for a wildcard record.
pub fn validate_fqdn(fqdn: &str) -> Result<(), crate::Error> {
    if fqdn.is_empty() || !fqdn.contains('.') {
        return Err(crate::Error::InvalidDomain(fqdn.to_string()));
    }

    Ok(())
}

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_poll_interval() -> Duration {
    DEFAULT_POLL_INTERVAL
}
