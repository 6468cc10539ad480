//! Plugin-based updater registry
//!
//! The registry maps provider names, as they appear in the keyfile's second
//! column, to updater factories. The daemon never hard-codes a provider.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ifddns_core::{UpdaterOptions, UpdaterRegistry};
//!
//! let registry = UpdaterRegistry::new();
//! ifddns_provider_namecheap::register(&registry);
//!
//! let credential = keyfile.lookup("host.example.com", "namecheap").unwrap();
//! let updater = registry.create_updater("namecheap", credential, UpdaterOptions::live())?;
//! ```

use crate::config::UpdaterOptions;
use crate::credentials::Credential;
use crate::error::{Error, Result};
use crate::traits::{DnsUpdater, DnsUpdaterFactory};
use std::collections::HashMap;
use std::sync::RwLock;

/// Updater registry for plugin-based provider creation
///
/// ## Thread Safety
///
/// The registry uses interior mutability with RwLock, allowing concurrent
/// reads and exclusive writes.
#[derive(Default)]
pub struct UpdaterRegistry {
    /// Registered updater factories
    updaters: RwLock<HashMap<String, Box<dyn DnsUpdaterFactory>>>,
}

impl UpdaterRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an updater factory
    ///
    /// # Parameters
    ///
    /// - `name`: Provider name (e.g., "namecheap")
    /// - `factory`: Factory object for creating updater instances
    ///
    /// Registering the same name twice replaces the earlier factory.
    pub fn register_updater(&self, name: impl Into<String>, factory: Box<dyn DnsUpdaterFactory>) {
        let name = name.into();
        let mut updaters = self
            .updaters
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        updaters.insert(name, factory);
    }

    /// Create an updater for a keyfile credential
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsUpdater>)`: Created updater instance
    /// - `Err(Error)`: If the provider is not registered or creation fails
    pub fn create_updater(
        &self,
        provider: &str,
        credential: &Credential,
        options: UpdaterOptions,
    ) -> Result<Box<dyn DnsUpdater>> {
        let updaters = self
            .updaters
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let factory = updaters.get(provider).ok_or_else(|| {
            Error::config(format!(
                "Unknown provider: {} (registered: {})",
                provider,
                Self::names(&updaters).join(", ")
            ))
        })?;

        factory.create(credential, options)
    }

    /// List all registered provider names, sorted
    pub fn list_updaters(&self) -> Vec<String> {
        let updaters = self
            .updaters
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Self::names(&updaters)
    }

    /// Check if a provider is registered
    pub fn has_updater(&self, name: &str) -> bool {
        let updaters = self
            .updaters
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        updaters.contains_key(name)
    }

    fn names(updaters: &HashMap<String, Box<dyn DnsUpdaterFactory>>) -> Vec<String> {
        let mut names: Vec<String> = updaters.keys().cloned().collect();
        names.sort();
        names
    }
}
